//! Animated display values: easing curves, policies, the frame-driven
//! driver and the scheduler it runs on.

mod driver;
mod easing;
mod policy;
mod scheduler;

pub use driver::AnimatedValue;
pub use easing::Easing;
pub use policy::AnimationPolicy;
pub use scheduler::{FrameScheduler, ManualScheduler};
