//! Data models for calculator fields, inputs and results.

mod field;
mod inputs;

pub use field::{FieldKind, NumericField, SliderBounds};
pub use inputs::{CalculationResult, SizingInputs};
