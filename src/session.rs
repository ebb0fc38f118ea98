//! Scripted sessions: replay user interactions through the widget and
//! drive its animations frame by frame.
//!
//! Script format, one command per line:
//!
//! ```text
//! type <field> <text>     # whole input text changes (text may be empty)
//! key <field> <char>
//! backspace <field>
//! focus <field>
//! blur <field>
//! slide <field> <value>
//! wait <ms>               # let animations run
//! calculate
//! ```
//!
//! Fields are `account`, `risk`, `entry` and `stop`. Blank lines and `#`
//! comments are ignored.

use std::rc::Rc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Local};
use serde::Serialize;
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::animation::ManualScheduler;
use crate::models::FieldKind;
use crate::sizing::CalculatorConfig;
use crate::widget::{CalculatorWidget, WidgetEvent, WidgetSnapshot};

/// One line of a session script.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptStep {
    Event(WidgetEvent),
    /// Run animation frames for this many milliseconds
    Wait(u64),
}

impl std::fmt::Display for ScriptStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Event(event) => write!(f, "{}", event),
            Self::Wait(ms) => write!(f, "wait {}ms", ms),
        }
    }
}

/// Parse one script line. Blank lines and comments yield `None`.
pub fn parse_line(line: &str) -> Result<Option<ScriptStep>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (command, rest) = split_word(line);
    let step = match command.to_lowercase().as_str() {
        "wait" => ScriptStep::Wait(rest.parse().context("wait expects milliseconds")?),
        "calculate" => ScriptStep::Event(WidgetEvent::Calculate),
        "type" | "key" | "backspace" | "focus" | "blur" | "slide" => {
            let (name, arg) = split_word(rest);
            let field = FieldKind::from_str(name)
                .ok_or_else(|| anyhow!("unknown field '{}'", name))?;

            let event = match command.to_lowercase().as_str() {
                "type" => WidgetEvent::Text {
                    field,
                    text: arg.to_string(),
                },
                "key" => WidgetEvent::Key {
                    field,
                    ch: arg.chars().next().context("key expects a character")?,
                },
                "backspace" => WidgetEvent::Backspace { field },
                "focus" => WidgetEvent::Focus { field },
                "blur" => WidgetEvent::Blur { field },
                _ => WidgetEvent::Slide {
                    field,
                    value: arg.parse().context("slide expects a number")?,
                },
            };
            ScriptStep::Event(event)
        }
        other => bail!("unknown command '{}'", other),
    };

    Ok(Some(step))
}

/// Parse a whole script. Lines that fail to parse are logged and skipped.
pub fn parse_script(text: &str) -> Vec<ScriptStep> {
    text.lines()
        .enumerate()
        .filter_map(|(index, line)| match parse_line(line) {
            Ok(step) => step,
            Err(e) => {
                warn!(line = index + 1, error = %e, "Skipping script line");
                None
            }
        })
        .collect()
}

fn split_word(text: &str) -> (&str, &str) {
    match text.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (text, ""),
    }
}

/// Session runner configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Milliseconds per animation frame
    pub frame_interval_ms: u64,

    /// Sleep between frames instead of stepping the clock immediately
    pub realtime: bool,

    /// Emit a snapshot for every frame, not just every step
    pub trace_frames: bool,

    /// Upper bound on frames spent settling at the end of the script
    pub max_settle_frames: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: 16,
            realtime: false,
            trace_frames: false,
            max_settle_frames: 10_000,
        }
    }
}

/// Emitted after each step (and each frame when tracing).
#[derive(Debug, Clone, Serialize)]
pub struct SessionUpdate {
    /// Step that produced this update; `None` for animation frames
    pub step: Option<String>,
    pub frame: u64,
    pub snapshot: WidgetSnapshot,
}

/// Outcome of a session.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub started_at: DateTime<Local>,
    pub steps: usize,
    pub frames: u64,
    pub recalculations: u32,
    pub skipped_recalculations: u32,
    pub interrupted: bool,
    pub final_snapshot: WidgetSnapshot,
}

impl std::fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n{:=^50}", " SESSION ")?;
        writeln!(f, "Started:          {}", self.started_at.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(f, "Steps:            {}", self.steps)?;
        writeln!(f, "Frames:           {}", self.frames)?;
        writeln!(
            f,
            "Recalculations:   {} ({} skipped)",
            self.recalculations, self.skipped_recalculations
        )?;
        if self.interrupted {
            writeln!(f, "Interrupted:      yes")?;
        }
        writeln!(f)?;
        writeln!(f, "{}", self.final_snapshot)?;
        writeln!(f, "{:=^50}", "")?;
        Ok(())
    }
}

/// Replays scripts through a calculator widget.
pub struct Session {
    config: SessionConfig,
    scheduler: ManualScheduler,
    widget: CalculatorWidget,
    started_at: DateTime<Local>,
}

impl Session {
    pub fn new(calculator: &CalculatorConfig, config: SessionConfig) -> Self {
        let scheduler = ManualScheduler::new();
        let widget = CalculatorWidget::new(calculator, Rc::new(scheduler.clone()));
        Self {
            config,
            scheduler,
            widget,
            started_at: Local::now(),
        }
    }

    /// Current snapshot, stamped with the frame clock.
    pub fn snapshot(&self) -> WidgetSnapshot {
        self.widget.snapshot(self.scheduler.now())
    }

    /// Run every step, then let animations settle.
    ///
    /// `emit` is called after each step. In real-time mode Ctrl+C stops the
    /// session early.
    pub async fn run(
        &mut self,
        steps: &[ScriptStep],
        emit: &mut dyn FnMut(&SessionUpdate),
    ) -> Result<SessionSummary> {
        info!(
            steps = steps.len(),
            frame_interval_ms = self.config.frame_interval_ms,
            realtime = self.config.realtime,
            "Starting session"
        );

        let mut ticker = self.config.realtime.then(|| {
            let mut ticker = interval(Duration::from_millis(self.config.frame_interval_ms.max(1)));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });

        let mut interrupted = false;
        let mut applied = 0;

        for step in steps {
            match step {
                ScriptStep::Event(event) => {
                    let recalculated = self.widget.handle(event);
                    debug!(step = %step, recalculated, "Applied step");
                }
                ScriptStep::Wait(ms) => {
                    let frames = frames_for(*ms, self.config.frame_interval_ms);
                    if self.run_frames(frames, &mut ticker, emit).await {
                        interrupted = true;
                    }
                }
            }
            applied += 1;

            emit(&SessionUpdate {
                step: Some(step.to_string()),
                frame: self.scheduler.frames_run(),
                snapshot: self.snapshot(),
            });

            if interrupted {
                break;
            }
        }

        if !interrupted {
            interrupted = self.settle(&mut ticker, emit).await;
        }

        let (recalculations, skipped) = self.widget.recalculations();
        let summary = SessionSummary {
            started_at: self.started_at,
            steps: applied,
            frames: self.scheduler.frames_run(),
            recalculations,
            skipped_recalculations: skipped,
            interrupted,
            final_snapshot: self.snapshot(),
        };

        info!(
            steps = summary.steps,
            frames = summary.frames,
            interrupted = summary.interrupted,
            "Session finished"
        );

        Ok(summary)
    }

    /// Run frames until nothing is animating.
    async fn settle(
        &mut self,
        ticker: &mut Option<Interval>,
        emit: &mut dyn FnMut(&SessionUpdate),
    ) -> bool {
        if ticker.is_none() && !self.config.trace_frames {
            let dt = self.config.frame_interval_ms as f64;
            self.scheduler.run_until_idle(dt, self.config.max_settle_frames);
        }

        let mut frames = 0;
        while !self.scheduler.is_idle() && frames < self.config.max_settle_frames {
            if self.run_frames(1, ticker, emit).await {
                return true;
            }
            frames += 1;
        }
        if !self.scheduler.is_idle() {
            warn!(
                frames,
                pending = self.scheduler.pending(),
                "Animations did not settle"
            );
        }
        false
    }

    /// Step `count` frames. Returns `true` when interrupted by Ctrl+C.
    async fn run_frames(
        &mut self,
        count: usize,
        ticker: &mut Option<Interval>,
        emit: &mut dyn FnMut(&SessionUpdate),
    ) -> bool {
        let dt = self.config.frame_interval_ms as f64;

        for _ in 0..count {
            if let Some(ticker) = ticker.as_mut() {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        info!("Session interrupted");
                        return true;
                    }
                    _ = ticker.tick() => {}
                }
            }

            self.scheduler.advance(dt);

            if self.config.trace_frames {
                emit(&SessionUpdate {
                    step: None,
                    frame: self.scheduler.frames_run(),
                    snapshot: self.snapshot(),
                });
            }
        }
        false
    }
}

/// Frames needed to cover `ms` at the given interval (rounded up).
fn frames_for(ms: u64, interval_ms: u64) -> usize {
    let interval_ms = interval_ms.max(1);
    ms.div_ceil(interval_ms) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_line_commands() {
        assert_eq!(
            parse_line("type entry 12a3.456").unwrap(),
            Some(ScriptStep::Event(WidgetEvent::Text {
                field: FieldKind::EntryPrice,
                text: "12a3.456".to_string()
            }))
        );
        assert_eq!(
            parse_line("type stop").unwrap(),
            Some(ScriptStep::Event(WidgetEvent::Text {
                field: FieldKind::StopPrice,
                text: String::new()
            }))
        );
        assert_eq!(
            parse_line("  slide account 50000 ").unwrap(),
            Some(ScriptStep::Event(WidgetEvent::Slide {
                field: FieldKind::AccountValue,
                value: 50000.0
            }))
        );
        assert_eq!(parse_line("wait 250").unwrap(), Some(ScriptStep::Wait(250)));
        assert_eq!(parse_line("# comment").unwrap(), None);
        assert_eq!(parse_line("").unwrap(), None);
    }

    #[test]
    fn test_parse_line_errors() {
        assert!(parse_line("jump entry").is_err());
        assert!(parse_line("focus volume").is_err());
        assert!(parse_line("slide risk lots").is_err());
        assert!(parse_line("key entry").is_err());
        assert!(parse_line("wait soon").is_err());
    }

    #[test]
    fn test_parse_script_skips_bad_lines() {
        let steps = parse_script("focus entry\nbogus\n\ntype entry 90\nblur entry\n");
        assert_eq!(steps.len(), 3);
    }

    #[test]
    fn test_frames_for() {
        assert_eq!(frames_for(0, 16), 0);
        assert_eq!(frames_for(16, 16), 1);
        assert_eq!(frames_for(17, 16), 2);
        assert_eq!(frames_for(5, 0), 5);
    }

    #[test]
    fn test_session_replays_script_and_settles() {
        let script = "\
            slide account 50000\n\
            wait 48\n\
            type entry 12a3.456\n\
            blur entry\n";
        let steps = parse_script(script);

        let mut session = Session::new(&CalculatorConfig::default(), SessionConfig::default());
        let mut updates = Vec::new();
        let summary = tokio_test::block_on(session.run(&steps, &mut |u: &SessionUpdate| updates.push(u.clone())))
            .unwrap();

        assert_eq!(updates.len(), 4);
        assert_eq!(updates[1].frame, 3);
        assert!(!updates[1].snapshot.settled);
        assert_eq!(updates[2].snapshot.fields[2].text, "123.45");

        assert!(!summary.interrupted);
        assert_eq!(summary.steps, 4);
        assert!(summary.final_snapshot.settled);
        assert_eq!(summary.final_snapshot.fields[2].text, "$123.45");

        // 50000 * 2.2% = 1100 over 123.45 - 80 = 43.45 -> 25.3 -> 25
        assert_eq!(summary.final_snapshot.shares_to_buy, Some(dec!(25)));
        assert_eq!(summary.final_snapshot.shares_text, "25");
    }

    #[test]
    fn test_trace_frames_emits_every_frame() {
        let steps = vec![ScriptStep::Wait(32)];
        let config = SessionConfig {
            trace_frames: true,
            ..Default::default()
        };
        let mut session = Session::new(&CalculatorConfig::default(), config);
        let mut updates = Vec::new();
        tokio_test::block_on(session.run(&steps, &mut |u: &SessionUpdate| updates.push(u.clone()))).unwrap();

        // two frames, then the step itself
        assert_eq!(updates.len(), 3);
        assert!(updates[0].step.is_none());
        assert_eq!(updates[2].step.as_deref(), Some("wait 32ms"));
    }
}
