//! Editable numeric fields of the calculator.

use std::fmt;
use std::rc::Rc;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::animation::{AnimatedValue, AnimationPolicy, FrameScheduler};
use crate::editing::{format, parse_amount, strip_non_numeric, EditState, StagedBuffer};

/// Upper bound for typed risk percentages.
const MAX_RISK_PERCENT: Decimal = dec!(100);

/// Which calculator input a field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    AccountValue,
    RiskPercent,
    EntryPrice,
    StopPrice,
}

impl FieldKind {
    pub const ALL: [FieldKind; 4] = [
        Self::AccountValue,
        Self::RiskPercent,
        Self::EntryPrice,
        Self::StopPrice,
    ];

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "account" | "account_value" => Some(Self::AccountValue),
            "risk" | "risk_percent" => Some(Self::RiskPercent),
            "entry" | "entry_price" => Some(Self::EntryPrice),
            "stop" | "stop_price" => Some(Self::StopPrice),
            _ => None,
        }
    }

    /// Label shown above the input.
    pub fn label(self) -> &'static str {
        match self {
            Self::AccountValue => "Account Value $",
            Self::RiskPercent => "Risk Per Trade",
            Self::EntryPrice => "Entry $",
            Self::StopPrice => "Stop $",
        }
    }

    /// Price fields stage edits in a buffer until focus is lost; the others
    /// commit on every keystroke.
    pub fn is_staged(self) -> bool {
        matches!(self, Self::EntryPrice | Self::StopPrice)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AccountValue => "account",
            Self::RiskPercent => "risk",
            Self::EntryPrice => "entry",
            Self::StopPrice => "stop",
        };
        f.write_str(name)
    }
}

/// Range and granularity of a field's slider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SliderBounds {
    pub min: Decimal,
    pub max: Decimal,
    pub step: Decimal,
}

impl SliderBounds {
    pub fn new(min: Decimal, max: Decimal, step: Decimal) -> Self {
        Self { min, max, step }
    }

    /// Clamp into [min, max] and snap to the nearest step.
    pub fn clamp(&self, value: Decimal) -> Decimal {
        let clamped = value.max(self.min).min(self.max);
        if self.step <= Decimal::ZERO {
            return clamped;
        }
        let steps = ((clamped - self.min) / self.step).round();
        (self.min + steps * self.step).min(self.max)
    }
}

/// A user-editable quantity with its animated slider position.
pub struct NumericField {
    kind: FieldKind,

    /// Committed value; `None` while the field is empty or unparseable
    raw: Option<Decimal>,

    /// Last change came from a slider drag
    animated: bool,

    focused: bool,

    /// Present for staged (price) fields only
    staged: Option<StagedBuffer>,

    /// Stripped text of a direct field as the user left it ("1." stays "1.")
    typed: String,

    bounds: SliderBounds,

    display: AnimatedValue,
}

impl NumericField {
    pub fn new(
        kind: FieldKind,
        initial: Decimal,
        bounds: SliderBounds,
        policy: AnimationPolicy,
        scheduler: Rc<dyn FrameScheduler>,
    ) -> Self {
        let staged = kind.is_staged().then(|| StagedBuffer::new(initial));
        Self {
            kind,
            raw: Some(initial),
            animated: false,
            focused: false,
            staged,
            typed: plain_text(initial),
            bounds,
            display: AnimatedValue::new(initial.to_f64().unwrap_or(0.0), policy, scheduler),
        }
    }

    #[inline]
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Committed value, `None` while empty or invalid.
    #[inline]
    pub fn raw(&self) -> Option<Decimal> {
        self.raw
    }

    /// Animated slider position.
    #[inline]
    pub fn display_value(&self) -> f64 {
        self.display.value()
    }

    #[inline]
    pub fn is_animated(&self) -> bool {
        self.animated
    }

    #[inline]
    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn is_settled(&self) -> bool {
        !self.display.is_animating()
    }

    pub fn edit_state(&self) -> Option<EditState> {
        self.staged.as_ref().map(StagedBuffer::state)
    }

    pub fn bounds(&self) -> SliderBounds {
        self.bounds
    }

    /// Text the input box shows.
    pub fn text(&self) -> String {
        if let Some(buffer) = &self.staged {
            return match buffer.state() {
                EditState::Editing => buffer.text().to_string(),
                EditState::Idle => format!("${}", buffer.text()),
            };
        }
        match self.kind {
            FieldKind::RiskPercent => self.raw.map(format::percent).unwrap_or_default(),
            _ => self.raw.map(format::currency).unwrap_or_default(),
        }
    }

    /// The input reported new text.
    ///
    /// Staged fields only update their buffer (focusing first if needed).
    /// Direct fields strip everything but digits and points and commit.
    /// Returns `true` when a value was committed.
    pub fn input_text(&mut self, text: &str) -> bool {
        if self.kind.is_staged() {
            self.focus();
            if let Some(buffer) = self.staged.as_mut() {
                buffer.replace(text);
            }
            return false;
        }

        let mut cleaned = strip_non_numeric(text);
        let value = match self.kind {
            // An empty or garbled risk reads as zero
            FieldKind::RiskPercent => {
                let parsed = parse_amount(&cleaned).unwrap_or(Decimal::ZERO);
                if parsed > MAX_RISK_PERCENT {
                    cleaned = plain_text(MAX_RISK_PERCENT);
                }
                Some(parsed.min(MAX_RISK_PERCENT))
            }
            _ => parse_amount(&cleaned),
        };
        self.typed = cleaned;
        self.commit(value, false);
        true
    }

    /// A single keystroke. Returns `true` when a value was committed.
    pub fn key(&mut self, ch: char) -> bool {
        if self.kind.is_staged() {
            self.focus();
            if let Some(buffer) = self.staged.as_mut() {
                if !buffer.key(ch) {
                    debug!(field = %self.kind, key = %ch, "Rejected keystroke");
                }
            }
            return false;
        }

        let mut text = self.typed.clone();
        text.push(ch);
        self.input_text(&text)
    }

    /// Delete the last character. Returns `true` when a value was committed.
    pub fn backspace(&mut self) -> bool {
        if self.kind.is_staged() {
            self.focus();
            if let Some(buffer) = self.staged.as_mut() {
                buffer.backspace();
            }
            return false;
        }

        let mut text = self.typed.clone();
        text.pop();
        self.input_text(&text)
    }

    pub fn focus(&mut self) {
        if self.focused {
            return;
        }
        self.focused = true;
        let committed = self.raw.unwrap_or(Decimal::ZERO);
        if let Some(buffer) = self.staged.as_mut() {
            buffer.focus(committed);
        }
    }

    /// Focus lost. Staged fields commit their buffer; returns `true` when a
    /// value was committed.
    pub fn blur(&mut self) -> bool {
        self.focused = false;
        let committed = self.staged.as_mut().and_then(StagedBuffer::blur);
        match committed {
            Some(value) => {
                self.commit(Some(value), false);
                true
            }
            None => false,
        }
    }

    /// Slider drag. The value is clamped and snapped to the slider's step.
    pub fn slide(&mut self, value: f64) -> bool {
        let Ok(value) = Decimal::try_from(value) else {
            debug!(field = %self.kind, value, "Ignoring non-numeric slider value");
            return false;
        };
        let value = self.bounds.clamp(value);
        self.typed = plain_text(value);
        self.commit(Some(value), true);
        true
    }

    fn commit(&mut self, value: Option<Decimal>, animate: bool) {
        self.raw = value;
        self.animated = animate;

        match value {
            Some(v) => {
                debug!(field = %self.kind, value = %v, animated = animate, "Committed value");
                if let Some(target) = v.to_f64() {
                    self.display.set_target(target, animate);
                }
                if let Some(buffer) = self.staged.as_mut() {
                    buffer.sync(v);
                }
            }
            None => debug!(field = %self.kind, "Field cleared"),
        }
    }
}

/// A value as the user would type it, without formatting.
fn plain_text(value: Decimal) -> String {
    value.normalize().to_string()
}
