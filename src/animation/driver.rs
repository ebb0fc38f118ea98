//! Animated value driver: eases a display value toward a moving target.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::trace;

use super::policy::{AnimationPolicy, AnimationState, Tick};
use super::scheduler::{FrameHandle, FrameScheduler};

struct DriverState {
    policy: AnimationPolicy,
    animation: AnimationState,
    chain: Option<FrameHandle>,
    /// Bumped on every cancellation so frames already dequeued go stale.
    generation: u64,
}

/// A numeric display value that animates toward its target one frame at
/// a time.
///
/// At most one frame chain is live per driver. The chain re-arms itself
/// until the policy reports convergence and is cancelled when the driver
/// is dropped.
///
/// # Example
///
/// ```ignore
/// let scheduler = ManualScheduler::new();
/// let value = AnimatedValue::new(0.0, AnimationPolicy::exponential(0.08), Rc::new(scheduler.clone()));
///
/// value.set_target(100.0, true);
/// scheduler.run_until_idle(16.0, 1_000);
/// assert_eq!(value.value(), 100.0);
/// ```
pub struct AnimatedValue {
    state: Rc<RefCell<DriverState>>,
    scheduler: Rc<dyn FrameScheduler>,
}

impl AnimatedValue {
    /// Create a settled driver showing `initial` (0.0 if not finite).
    pub fn new(initial: f64, policy: AnimationPolicy, scheduler: Rc<dyn FrameScheduler>) -> Self {
        let initial = if initial.is_finite() { initial } else { 0.0 };
        Self {
            state: Rc::new(RefCell::new(DriverState {
                policy,
                animation: AnimationState::settled(initial),
                chain: None,
                generation: 0,
            })),
            scheduler,
        }
    }

    /// Value to render right now.
    #[inline]
    pub fn value(&self) -> f64 {
        self.state.borrow().animation.display_value
    }

    /// Whether a frame chain is live.
    pub fn is_animating(&self) -> bool {
        self.state.borrow().chain.is_some()
    }

    /// Point the display at a new target.
    ///
    /// Non-finite targets are ignored and the last valid display value is
    /// held. With `animate == false` any live chain is cancelled and the
    /// display jumps to the target.
    pub fn set_target(&self, target: f64, animate: bool) {
        if !target.is_finite() {
            trace!(value = target, "Ignoring non-finite animation target");
            return;
        }

        if !animate {
            self.cancel();
            self.state.borrow_mut().animation.snap(target);
            return;
        }

        let (restart, idle) = {
            let mut state = self.state.borrow_mut();
            if state.chain.is_none() && state.animation.display_value == target {
                state.animation.snap(target);
                return;
            }
            let policy = state.policy;
            let restart = policy.retarget(&mut state.animation, target);
            (restart, state.chain.is_none())
        };

        if restart {
            self.cancel();
            arm(&self.state, &self.scheduler);
        } else if idle {
            arm(&self.state, &self.scheduler);
        }
    }

    /// Stop animating and hold the current display value.
    pub fn cancel(&self) {
        let mut state = self.state.borrow_mut();
        state.generation += 1;
        if let Some(handle) = state.chain.take() {
            self.scheduler.cancel(handle);
        }
    }
}

impl Drop for AnimatedValue {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Request the next frame for this driver.
fn arm(state: &Rc<RefCell<DriverState>>, scheduler: &Rc<dyn FrameScheduler>) {
    let generation = state.borrow().generation;
    let weak_state: Weak<RefCell<DriverState>> = Rc::downgrade(state);
    let weak_scheduler: Weak<dyn FrameScheduler> = Rc::downgrade(scheduler);

    let handle = scheduler.schedule(Box::new(move |now| {
        let Some(state) = weak_state.upgrade() else {
            return;
        };

        let tick = {
            let mut guard = state.borrow_mut();
            if guard.generation != generation {
                return;
            }
            guard.chain = None;
            let policy = guard.policy;
            policy.advance(&mut guard.animation, now)
        };

        if tick == Tick::Running {
            if let Some(scheduler) = weak_scheduler.upgrade() {
                arm(&state, &scheduler);
            }
        }
    }));

    state.borrow_mut().chain = Some(handle);
}
