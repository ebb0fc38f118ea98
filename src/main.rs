//! Position-Size Calculator
//!
//! Risk-based share sizing with animated displays, slider inputs and
//! staged price editing, driven from the terminal.

mod animation;
mod editing;
mod models;
mod session;
mod sizing;
mod widget;

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::level_filters::LevelFilter;
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::editing::format;
use crate::models::{FieldKind, SizingInputs};
use crate::session::{parse_script, Session, SessionConfig, SessionUpdate};
use crate::sizing::{CalculatorConfig, PositionSizer};

/// Position-size calculator CLI.
#[derive(Parser)]
#[command(name = "riskcalc")]
#[command(about = "Size positions from account risk, entry and stop", long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, env = "RISKCALC_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate the share count once
    Calc {
        /// Account value in dollars
        #[arg(short, long)]
        account: Decimal,

        /// Risk per trade in percent
        #[arg(short, long)]
        risk: Decimal,

        /// Entry price
        #[arg(short, long)]
        entry: Decimal,

        /// Stop price
        #[arg(short, long)]
        stop: Decimal,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Replay a script of widget interactions (reads stdin without a file)
    Session {
        /// Script file
        script: Option<PathBuf>,

        /// Step the animation clock without sleeping
        #[arg(long)]
        fast: bool,

        /// Print a snapshot for every animation frame
        #[arg(long)]
        frames: bool,

        /// Print snapshots as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Show current configuration
    Config {
        /// Print the configuration as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(LevelFilter::from_level(log_level).into()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = CalculatorConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Calc {
            account,
            risk,
            entry,
            stop,
            json,
        } => {
            let sizer = PositionSizer::new(&config);
            let inputs = SizingInputs::new(account, risk, entry, stop);

            let Some(result) = sizer.calculate(&inputs) else {
                println!("Account value, entry and stop must all be non-zero and within range.");
                return Ok(());
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
                return Ok(());
            }

            println!("\n=== Position Size ===");
            println!("Account Value:   {}", format::currency(account));
            println!("Risk Per Trade:  {}", format::percent(risk));
            println!("Entry:           ${}", format::fixed2(entry));
            println!("Stop:            ${}", format::fixed2(stop));
            println!();
            println!("Risk Amount:     {}", format::currency(result.risk_amount));
            println!("Risk Per Share:  ${}", format::fixed2(result.risk_per_share));
            println!("Shares (exact):  {}", result.shares.round_dp(4).normalize());
            println!(
                "Shares To Buy:   {} ({:?})",
                format::grouped(result.shares_to_buy, 1),
                sizer.rounding()
            );
        }

        Commands::Session {
            script,
            fast,
            frames,
            json,
        } => {
            let text = match &script {
                Some(path) => std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read script {}", path.display()))?,
                None => {
                    let mut text = String::new();
                    std::io::stdin()
                        .read_to_string(&mut text)
                        .context("Failed to read script from stdin")?;
                    text
                }
            };

            let steps = parse_script(&text);
            info!(steps = steps.len(), "Loaded session script");

            let session_config = SessionConfig {
                frame_interval_ms: config.frame_interval_ms,
                realtime: !fast,
                trace_frames: frames,
                ..Default::default()
            };
            let mut session = Session::new(&config, session_config);

            if !json {
                println!("{}\n", session.snapshot());
            }

            let mut emit = |update: &SessionUpdate| {
                if json {
                    match serde_json::to_string(update) {
                        Ok(line) => println!("{}", line),
                        Err(e) => tracing::warn!(error = %e, "Failed to encode snapshot"),
                    }
                    return;
                }
                match &update.step {
                    Some(step) => println!("> {}\n{}\n", step, update.snapshot),
                    None => println!(
                        "[frame {:>4}] shares {:>10}",
                        update.frame, update.snapshot.shares_text
                    ),
                }
            };

            let summary = session.run(&steps, &mut emit).await?;
            if !json {
                println!("{}", summary);
            }
        }

        Commands::Config { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
                return Ok(());
            }

            println!("\n=== Calculator Configuration ===\n");
            println!("Starting Values:");
            for kind in FieldKind::ALL {
                let bounds = config.slider(kind);
                println!(
                    "  {:<16} {:>10}   slider {} to {} step {}",
                    kind.label(),
                    config.initial_value(kind),
                    bounds.min,
                    bounds.max,
                    bounds.step
                );
            }

            println!("\nSizing:");
            println!("  Rounding:             {}", config.rounding);

            println!("\nAnimation:");
            println!("  Slider Decay:         {}", config.slider_decay);
            println!("  Convergence Epsilon:  {}", config.convergence_epsilon);
            println!("  Result Duration:      {}ms", config.result_duration_ms);
            println!("  Result Easing:        {}", config.result_easing);
            println!("  Frame Interval:       {}ms", config.frame_interval_ms);
        }
    }

    Ok(())
}
