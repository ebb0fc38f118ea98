//! Easing curves for fixed-duration animations.

use serde::{Deserialize, Serialize};

/// Maps linear progress (0.0 to 1.0) onto an eased progress curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    /// Progress is used as-is
    Linear,
    /// Cubic ease-out: fast start, gentle landing
    #[default]
    EaseOutCubic,
}

impl Easing {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "linear" => Self::Linear,
            _ => Self::EaseOutCubic,
        }
    }

    /// Apply the curve. Input is clamped to [0, 1], so the output is too.
    #[inline]
    pub fn apply(self, progress: f64) -> f64 {
        let t = progress.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints() {
        for easing in [Easing::Linear, Easing::EaseOutCubic] {
            assert_eq!(easing.apply(0.0), 0.0);
            assert_eq!(easing.apply(1.0), 1.0);
        }
    }

    #[test]
    fn test_ease_out_cubic_is_ahead_of_linear() {
        let eased = Easing::EaseOutCubic.apply(0.5);
        assert!((eased - 0.875).abs() < 1e-12);
        assert!(eased > Easing::Linear.apply(0.5));
    }

    #[test]
    fn test_clamps_out_of_range_progress() {
        assert_eq!(Easing::EaseOutCubic.apply(1.7), 1.0);
        assert_eq!(Easing::Linear.apply(-0.3), 0.0);
    }

    #[test]
    fn test_from_str() {
        assert_eq!(Easing::from_str("LINEAR"), Easing::Linear);
        assert_eq!(Easing::from_str("ease_out_cubic"), Easing::EaseOutCubic);
        assert_eq!(Easing::from_str("bogus"), Easing::EaseOutCubic);
    }
}
