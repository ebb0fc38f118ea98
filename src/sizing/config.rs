//! Calculator configuration.

use std::path::Path;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::animation::{AnimationPolicy, Easing};
use crate::models::{FieldKind, SliderBounds};

/// Configuration for the calculator widget: starting values, slider ranges,
/// rounding and animation tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculatorConfig {
    /// Starting account value in dollars
    pub account_value: Decimal,

    /// Starting risk per trade in percent
    pub risk_percent: Decimal,

    /// Starting entry price
    pub entry_price: Decimal,

    /// Starting stop price
    pub stop_price: Decimal,

    pub account_slider: SliderBounds,
    pub risk_slider: SliderBounds,
    pub entry_slider: SliderBounds,
    pub stop_slider: SliderBounds,

    /// How the share count is rounded (floor, one_decimal, none)
    pub rounding: String,

    /// Fraction of the remaining distance a slider moves per frame
    pub slider_decay: f64,

    /// Distance at which a slider snaps onto its target
    pub convergence_epsilon: f64,

    /// Duration of the share-count animation in milliseconds
    pub result_duration_ms: f64,

    /// Easing curve of the share-count animation (ease_out_cubic, linear)
    pub result_easing: String,

    /// Frame interval when driving animations in real time
    pub frame_interval_ms: u64,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            account_value: dec!(100000),
            risk_percent: dec!(2.2),
            entry_price: dec!(100.00),
            stop_price: dec!(80.00),
            account_slider: SliderBounds::new(dec!(0), dec!(120000), dec!(1)),
            risk_slider: SliderBounds::new(dec!(0), dec!(3), dec!(0.1)),
            entry_slider: SliderBounds::new(dec!(0), dec!(120), dec!(0.01)),
            stop_slider: SliderBounds::new(dec!(0), dec!(100), dec!(0.01)),
            rounding: "floor".to_string(),
            slider_decay: 0.08,
            convergence_epsilon: 0.01,
            result_duration_ms: 500.0,
            result_easing: "ease_out_cubic".to_string(),
            frame_interval_ms: 16,
        }
    }
}

impl CalculatorConfig {
    /// Defaults, overlaid with an optional JSON file, then environment
    /// overrides:
    /// - RISKCALC_ROUNDING
    /// - RISKCALC_DECAY
    /// - RISKCALC_DURATION_MS
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Read a JSON config file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(rounding) = lookup("RISKCALC_ROUNDING") {
            self.rounding = rounding;
        }
        if let Some(decay) = lookup("RISKCALC_DECAY") {
            self.slider_decay = decay.parse().context("Invalid RISKCALC_DECAY")?;
        }
        if let Some(duration) = lookup("RISKCALC_DURATION_MS") {
            self.result_duration_ms = duration.parse().context("Invalid RISKCALC_DURATION_MS")?;
        }
        Ok(())
    }

    pub fn initial_value(&self, kind: FieldKind) -> Decimal {
        match kind {
            FieldKind::AccountValue => self.account_value,
            FieldKind::RiskPercent => self.risk_percent,
            FieldKind::EntryPrice => self.entry_price,
            FieldKind::StopPrice => self.stop_price,
        }
    }

    pub fn slider(&self, kind: FieldKind) -> SliderBounds {
        match kind {
            FieldKind::AccountValue => self.account_slider,
            FieldKind::RiskPercent => self.risk_slider,
            FieldKind::EntryPrice => self.entry_slider,
            FieldKind::StopPrice => self.stop_slider,
        }
    }

    /// Policy for slider thumbs: exponential approach.
    pub fn slider_policy(&self) -> AnimationPolicy {
        AnimationPolicy::exponential(self.slider_decay).with_epsilon(self.convergence_epsilon)
    }

    /// Policy for the share count: fixed-duration eased interpolation.
    pub fn result_policy(&self) -> AnimationPolicy {
        AnimationPolicy::fixed(self.result_duration_ms, Easing::from_str(&self.result_easing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_match_widget() {
        let config = CalculatorConfig::default();
        assert_eq!(config.initial_value(FieldKind::RiskPercent), dec!(2.2));
        assert_eq!(config.slider(FieldKind::AccountValue).max, dec!(120000));
        assert_eq!(
            config.slider_policy(),
            AnimationPolicy::Exponential {
                decay: 0.08,
                epsilon: 0.01
            }
        );
        assert_eq!(
            config.result_policy(),
            AnimationPolicy::FixedDuration {
                duration_ms: 500.0,
                easing: Easing::EaseOutCubic
            }
        );
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: CalculatorConfig =
            serde_json::from_str(r#"{ "account_value": "50000", "rounding": "none" }"#).unwrap();
        assert_eq!(config.account_value, dec!(50000));
        assert_eq!(config.rounding, "none");
        assert_eq!(config.stop_price, dec!(80));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [("RISKCALC_ROUNDING", "one_decimal"), ("RISKCALC_DECAY", "0.15")]
            .into_iter()
            .collect();

        let mut config = CalculatorConfig::default();
        config
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.rounding, "one_decimal");
        assert_eq!(config.slider_decay, 0.15);
        assert_eq!(config.result_duration_ms, 500.0);
    }

    #[test]
    fn test_invalid_env_override_is_an_error() {
        let mut config = CalculatorConfig::default();
        let result = config.apply_overrides(|key| {
            (key == "RISKCALC_DURATION_MS").then(|| "soon".to_string())
        });
        assert!(result.is_err());
    }
}
