//! Animation policies: how a display value advances toward its target.

use serde::{Deserialize, Serialize};

use super::Easing;

/// Distance below which the exponential approach snaps onto the target.
pub const DEFAULT_EPSILON: f64 = 0.01;

/// Transient per-value animation state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnimationState {
    /// Display value captured when the current interpolation started
    pub start_value: f64,

    /// Timestamp of the first tick after a retarget (ms)
    pub start_timestamp: Option<f64>,

    /// Value being approached
    pub target_value: f64,

    /// Value currently shown
    pub display_value: f64,
}

impl AnimationState {
    /// A settled state showing `value`.
    pub fn settled(value: f64) -> Self {
        Self {
            start_value: value,
            start_timestamp: None,
            target_value: value,
            display_value: value,
        }
    }

    /// Show the target immediately.
    pub fn snap(&mut self, target: f64) {
        *self = Self::settled(target);
    }
}

/// Outcome of one animation tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Another frame is needed
    Running,
    /// Display value equals the target; stop scheduling
    Settled,
}

/// Strategy used to advance a display value toward its target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnimationPolicy {
    /// Time-bounded interpolation along an easing curve.
    FixedDuration { duration_ms: f64, easing: Easing },

    /// Move a fixed fraction of the remaining distance every tick.
    Exponential { decay: f64, epsilon: f64 },
}

impl AnimationPolicy {
    pub fn fixed(duration_ms: f64, easing: Easing) -> Self {
        Self::FixedDuration {
            duration_ms: duration_ms.max(0.0),
            easing,
        }
    }

    /// Exponential approach. `decay` is kept within (0, 1] so the value
    /// can never pass the target.
    pub fn exponential(decay: f64) -> Self {
        let decay = if decay.is_finite() && decay > 0.0 {
            decay.min(1.0)
        } else {
            0.08
        };
        Self::Exponential {
            decay,
            epsilon: DEFAULT_EPSILON,
        }
    }

    pub fn with_epsilon(self, epsilon: f64) -> Self {
        match self {
            Self::Exponential { decay, .. } => Self::Exponential {
                decay,
                epsilon: epsilon.abs().max(f64::EPSILON),
            },
            other => other,
        }
    }

    /// Point the animation at a new target.
    ///
    /// Returns `true` when any in-flight frame chain must be restarted.
    /// Fixed-duration interpolations restart from the current display
    /// value; the exponential approach keeps its chain and simply chases
    /// the new target.
    pub fn retarget(&self, state: &mut AnimationState, target: f64) -> bool {
        state.target_value = target;
        match self {
            Self::FixedDuration { .. } => {
                state.start_value = state.display_value;
                state.start_timestamp = None;
                true
            }
            Self::Exponential { .. } => false,
        }
    }

    /// Advance one frame at timestamp `now_ms`.
    pub fn advance(&self, state: &mut AnimationState, now_ms: f64) -> Tick {
        match *self {
            Self::FixedDuration {
                duration_ms,
                easing,
            } => {
                let started = *state.start_timestamp.get_or_insert(now_ms);
                let progress = if duration_ms <= 0.0 {
                    1.0
                } else {
                    ((now_ms - started) / duration_ms).clamp(0.0, 1.0)
                };

                if progress >= 1.0 {
                    state.display_value = state.target_value;
                    return Tick::Settled;
                }

                let eased = easing.apply(progress);
                state.display_value =
                    state.start_value + (state.target_value - state.start_value) * eased;
                Tick::Running
            }
            Self::Exponential { decay, epsilon } => {
                let diff = state.target_value - state.display_value;
                if diff.abs() < epsilon {
                    state.display_value = state.target_value;
                    return Tick::Settled;
                }
                state.display_value += diff * decay;
                Tick::Running
            }
        }
    }
}

impl Default for AnimationPolicy {
    fn default() -> Self {
        Self::fixed(500.0, Easing::EaseOutCubic)
    }
}
