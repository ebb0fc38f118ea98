//! Staged text buffer for price fields.
//!
//! While focused the user owns the text; nothing is reformatted or
//! committed until focus is lost.

use rust_decimal::Decimal;
use serde::Serialize;

use super::filter::{accepts, filter_price, parse_amount};
use super::format::fixed2;

/// Edit state of a staged field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EditState {
    /// Unfocused; text is the formatted committed value
    Idle,
    /// Focused; text is whatever the user has typed
    Editing,
}

/// Text buffer decoupled from the committed value it edits.
#[derive(Debug, Clone)]
pub struct StagedBuffer {
    state: EditState,
    text: String,
}

impl StagedBuffer {
    /// Idle buffer showing `committed`.
    pub fn new(committed: Decimal) -> Self {
        Self {
            state: EditState::Idle,
            text: fixed2(committed),
        }
    }

    #[inline]
    pub fn state(&self) -> EditState {
        self.state
    }

    #[inline]
    pub fn is_editing(&self) -> bool {
        self.state == EditState::Editing
    }

    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Idle -> Editing. The buffer starts from the committed value.
    pub fn focus(&mut self, committed: Decimal) {
        if self.is_editing() {
            return;
        }
        self.state = EditState::Editing;
        self.text = fixed2(committed);
    }

    /// Append one keystroke. Returns `false` (and leaves the buffer alone)
    /// when not editing or when the key would break the price pattern.
    pub fn key(&mut self, ch: char) -> bool {
        if !self.is_editing() || !accepts(&self.text, ch) {
            return false;
        }
        self.text.push(ch);
        true
    }

    pub fn backspace(&mut self) -> bool {
        if !self.is_editing() {
            return false;
        }
        self.text.pop().is_some()
    }

    /// Replace the whole buffer, as when the input reports new text.
    /// Characters that break the pattern are dropped.
    pub fn replace(&mut self, text: &str) {
        if self.is_editing() {
            self.text = filter_price(text);
        }
    }

    /// Editing -> Idle. Parses the buffer and returns the value to commit:
    /// the parsed number, or zero when the text does not parse. The buffer
    /// is reformatted either way. Returns `None` when not editing.
    pub fn blur(&mut self) -> Option<Decimal> {
        if !self.is_editing() {
            return None;
        }
        let committed = parse_amount(&self.text).unwrap_or(Decimal::ZERO);
        self.text = fixed2(committed);
        self.state = EditState::Idle;
        Some(committed)
    }

    /// Reformat from a value committed elsewhere (slider drag).
    /// Ignored while editing so the user's text is never rewritten.
    pub fn sync(&mut self, committed: Decimal) {
        if !self.is_editing() {
            self.text = fixed2(committed);
        }
    }
}
