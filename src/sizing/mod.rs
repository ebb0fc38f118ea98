//! Position sizing: configuration and the share-count calculator.

mod config;
mod position_sizer;

pub use config::CalculatorConfig;
pub use position_sizer::{PositionSizer, RoundingPolicy};
