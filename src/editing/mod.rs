//! Input editing: keystroke filtering, staged buffers and display formatting.

mod buffer;
mod filter;
pub mod format;

pub use buffer::{EditState, StagedBuffer};
pub use filter::{parse_amount, strip_non_numeric};
