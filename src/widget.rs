//! Calculator widget: owns the four input fields, recomputes the share
//! count whenever a value is committed and animates the result.
//!
//! Handles:
//! - Text, keystroke, focus and blur events from the inputs
//! - Slider drags (animated)
//! - The manual "calculate" action
//! - Snapshots for the rendering layer

use std::fmt;
use std::rc::Rc;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::animation::{AnimatedValue, FrameScheduler};
use crate::editing::{format, EditState};
use crate::models::{CalculationResult, FieldKind, NumericField, SizingInputs, SliderBounds};
use crate::sizing::{CalculatorConfig, PositionSizer};

/// User interaction delivered to the widget.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetEvent {
    /// The input's whole text changed
    Text { field: FieldKind, text: String },
    /// One character typed
    Key { field: FieldKind, ch: char },
    Backspace { field: FieldKind },
    Focus { field: FieldKind },
    Blur { field: FieldKind },
    /// Slider dragged to a value
    Slide { field: FieldKind, value: f64 },
    /// Calculate button pressed
    Calculate,
}

impl fmt::Display for WidgetEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text { field, text } => write!(f, "type {} {:?}", field, text),
            Self::Key { field, ch } => write!(f, "key {} {:?}", field, ch),
            Self::Backspace { field } => write!(f, "backspace {}", field),
            Self::Focus { field } => write!(f, "focus {}", field),
            Self::Blur { field } => write!(f, "blur {}", field),
            Self::Slide { field, value } => write!(f, "slide {} {}", field, value),
            Self::Calculate => write!(f, "calculate"),
        }
    }
}

/// Position-size calculator widget.
pub struct CalculatorWidget {
    sizer: PositionSizer,
    fields: [NumericField; 4],
    result: Option<CalculationResult>,
    shares_display: AnimatedValue,
    recalculations: u32,
    skipped: u32,
}

impl CalculatorWidget {
    /// Create the widget with the configured starting values and compute
    /// the initial share count.
    pub fn new(config: &CalculatorConfig, scheduler: Rc<dyn FrameScheduler>) -> Self {
        let fields = FieldKind::ALL.map(|kind| {
            NumericField::new(
                kind,
                config.initial_value(kind),
                config.slider(kind),
                config.slider_policy(),
                Rc::clone(&scheduler),
            )
        });

        let sizer = PositionSizer::new(config);
        let inputs = inputs_of(&fields);
        let result = sizer.calculate(&inputs);
        let initial = result
            .and_then(|r| r.shares_to_buy.to_f64())
            .unwrap_or(0.0);

        Self {
            sizer,
            fields,
            result,
            shares_display: AnimatedValue::new(initial, config.result_policy(), scheduler),
            recalculations: 0,
            skipped: 0,
        }
    }

    pub fn field(&self, kind: FieldKind) -> &NumericField {
        &self.fields[slot(kind)]
    }

    /// Current raw values of all four fields.
    pub fn inputs(&self) -> SizingInputs {
        inputs_of(&self.fields)
    }

    /// Rounded share count, if one has ever been computed.
    pub fn shares_to_buy(&self) -> Option<Decimal> {
        self.result.map(|r| r.shares_to_buy)
    }

    /// Animated share count.
    pub fn shares_display(&self) -> f64 {
        self.shares_display.value()
    }

    pub fn shares_text(&self) -> String {
        format::shares(self.shares_display())
    }

    /// Recalculations that produced a result / were skipped for missing inputs.
    pub fn recalculations(&self) -> (u32, u32) {
        (self.recalculations, self.skipped)
    }

    /// No animation is in flight.
    pub fn is_settled(&self) -> bool {
        !self.shares_display.is_animating() && self.fields.iter().all(NumericField::is_settled)
    }

    /// Apply one user interaction. Returns `true` when the share count was
    /// recalculated.
    pub fn handle(&mut self, event: &WidgetEvent) -> bool {
        debug!(event = %event, "Widget event");

        let committed = match event {
            WidgetEvent::Text { field, text } => self.fields[slot(*field)].input_text(text),
            WidgetEvent::Key { field, ch } => self.fields[slot(*field)].key(*ch),
            WidgetEvent::Backspace { field } => self.fields[slot(*field)].backspace(),
            WidgetEvent::Focus { field } => {
                self.fields[slot(*field)].focus();
                false
            }
            WidgetEvent::Blur { field } => self.fields[slot(*field)].blur(),
            WidgetEvent::Slide { field, value } => self.fields[slot(*field)].slide(*value),
            WidgetEvent::Calculate => true,
        };

        if committed {
            self.recalculate()
        } else {
            false
        }
    }

    /// Recompute from the committed values. When an input is missing the
    /// previous result is kept.
    pub fn recalculate(&mut self) -> bool {
        let inputs = self.inputs();
        let Some(result) = self.sizer.calculate(&inputs) else {
            self.skipped += 1;
            debug!(?inputs, "Inputs incomplete, keeping previous result");
            return false;
        };

        self.recalculations += 1;
        if let Some(target) = result.shares_to_buy.to_f64() {
            self.shares_display.set_target(target, true);
        }
        self.result = Some(result);
        true
    }

    /// Everything the rendering layer needs for one frame.
    pub fn snapshot(&self, timestamp_ms: f64) -> WidgetSnapshot {
        WidgetSnapshot {
            timestamp_ms,
            fields: self
                .fields
                .iter()
                .map(|field| FieldSnapshot {
                    kind: field.kind(),
                    label: field.kind().label(),
                    text: field.text(),
                    raw_value: field.raw(),
                    display_value: field.display_value(),
                    animated: field.is_animated(),
                    focused: field.is_focused(),
                    edit_state: field.edit_state(),
                    slider: field.bounds(),
                })
                .collect(),
            shares_to_buy: self.shares_to_buy(),
            result: self.result,
            shares_display: self.shares_display(),
            shares_text: self.shares_text(),
            settled: self.is_settled(),
        }
    }
}

fn slot(kind: FieldKind) -> usize {
    match kind {
        FieldKind::AccountValue => 0,
        FieldKind::RiskPercent => 1,
        FieldKind::EntryPrice => 2,
        FieldKind::StopPrice => 3,
    }
}

fn inputs_of(fields: &[NumericField; 4]) -> SizingInputs {
    SizingInputs {
        account_value: fields[slot(FieldKind::AccountValue)].raw(),
        risk_percent: fields[slot(FieldKind::RiskPercent)].raw(),
        entry_price: fields[slot(FieldKind::EntryPrice)].raw(),
        stop_price: fields[slot(FieldKind::StopPrice)].raw(),
    }
}

/// Rendered state of one field.
#[derive(Debug, Clone, Serialize)]
pub struct FieldSnapshot {
    pub kind: FieldKind,
    pub label: &'static str,
    pub text: String,
    pub raw_value: Option<Decimal>,
    /// Slider position
    pub display_value: f64,
    pub animated: bool,
    pub focused: bool,
    pub edit_state: Option<EditState>,
    pub slider: SliderBounds,
}

/// Rendered state of the whole widget.
#[derive(Debug, Clone, Serialize)]
pub struct WidgetSnapshot {
    pub timestamp_ms: f64,
    pub fields: Vec<FieldSnapshot>,
    pub shares_to_buy: Option<Decimal>,
    pub result: Option<CalculationResult>,
    pub shares_display: f64,
    pub shares_text: String,
    pub settled: bool,
}

impl fmt::Display for WidgetSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<16} {:>14} {:>14}", "FIELD", "INPUT", "SLIDER")?;
        writeln!(f, "{}", "-".repeat(46))?;
        for field in &self.fields {
            let marker = if field.focused { "*" } else { " " };
            writeln!(
                f,
                "{:<16} {:>14}{} {:>13.2}",
                field.label, field.text, marker, field.display_value
            )?;
        }
        write!(
            f,
            "Shares To Buy:   {:>14}{}",
            self.shares_text,
            if self.settled { "" } else { "  ..." }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::ManualScheduler;
    use rust_decimal_macros::dec;

    fn widget() -> (ManualScheduler, CalculatorWidget) {
        let scheduler = ManualScheduler::new();
        let widget = CalculatorWidget::new(&CalculatorConfig::default(), Rc::new(scheduler.clone()));
        (scheduler, widget)
    }

    fn text(field: FieldKind, text: &str) -> WidgetEvent {
        WidgetEvent::Text {
            field,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_initial_result() {
        let (scheduler, widget) = widget();
        assert_eq!(widget.shares_to_buy(), Some(dec!(110)));
        assert_eq!(widget.shares_text(), "110");
        assert!(widget.is_settled());
        assert!(scheduler.is_idle());
    }

    #[test]
    fn test_slide_recalculates_and_animates_result() {
        let (scheduler, mut widget) = widget();
        let slide = WidgetEvent::Slide {
            field: FieldKind::AccountValue,
            value: 50000.0,
        };
        assert!(widget.handle(&slide));
        assert_eq!(widget.shares_to_buy(), Some(dec!(55)));
        assert_eq!(widget.shares_display(), 110.0);
        assert!(!widget.is_settled());

        scheduler.advance(16.0);
        scheduler.advance(16.0);
        let mid = widget.shares_display();
        assert!(mid < 110.0 && mid > 55.0);

        scheduler.run_until_idle(16.0, 10_000);
        assert_eq!(widget.shares_display(), 55.0);
        assert!(widget.is_settled());
    }

    #[test]
    fn test_staged_edit_commits_on_blur_only() {
        let (_, mut widget) = widget();
        assert!(!widget.handle(&WidgetEvent::Focus {
            field: FieldKind::StopPrice
        }));
        assert!(!widget.handle(&text(FieldKind::StopPrice, "90")));
        assert_eq!(widget.shares_to_buy(), Some(dec!(110)));

        assert!(widget.handle(&WidgetEvent::Blur {
            field: FieldKind::StopPrice
        }));
        // 2200 / 10
        assert_eq!(widget.shares_to_buy(), Some(dec!(220)));
    }

    #[test]
    fn test_cleared_price_keeps_previous_result() {
        let (_, mut widget) = widget();
        widget.handle(&text(FieldKind::EntryPrice, ""));
        assert!(!widget.handle(&WidgetEvent::Blur {
            field: FieldKind::EntryPrice
        }));

        let entry = widget.field(FieldKind::EntryPrice);
        assert_eq!(entry.raw(), Some(Decimal::ZERO));
        assert_eq!(entry.text(), "$0.00");
        assert_eq!(widget.shares_to_buy(), Some(dec!(110)));
        assert_eq!(widget.recalculations(), (0, 1));

        widget.handle(&text(FieldKind::EntryPrice, "85"));
        assert!(widget.handle(&WidgetEvent::Blur {
            field: FieldKind::EntryPrice
        }));
        // 2200 / 5
        assert_eq!(widget.shares_to_buy(), Some(dec!(440)));
    }

    #[test]
    fn test_inverted_prices_clamp_to_zero() {
        let (scheduler, mut widget) = widget();
        widget.handle(&WidgetEvent::Slide {
            field: FieldKind::EntryPrice,
            value: 80.0,
        });
        widget.handle(&WidgetEvent::Slide {
            field: FieldKind::StopPrice,
            value: 100.0,
        });
        assert_eq!(widget.shares_to_buy(), Some(Decimal::ZERO));

        scheduler.run_until_idle(16.0, 10_000);
        assert_eq!(widget.shares_text(), "0");
    }

    #[test]
    fn test_cleared_account_skips_recalculation() {
        let (_, mut widget) = widget();
        assert!(!widget.handle(&text(FieldKind::AccountValue, "")));
        assert_eq!(widget.field(FieldKind::AccountValue).text(), "");
        assert_eq!(widget.shares_to_buy(), Some(dec!(110)));

        assert!(widget.handle(&WidgetEvent::Key {
            field: FieldKind::AccountValue,
            ch: '9'
        }));
        assert_eq!(widget.field(FieldKind::AccountValue).raw(), Some(dec!(9)));
    }

    #[test]
    fn test_text_entry_snaps_slider() {
        let (scheduler, mut widget) = widget();
        widget.handle(&text(FieldKind::RiskPercent, "1.1"));

        let risk = widget.field(FieldKind::RiskPercent);
        assert!(!risk.is_animated());
        assert!((risk.display_value() - 1.1).abs() < 1e-9);
        assert_eq!(widget.shares_to_buy(), Some(dec!(55)));

        // Only the result animates.
        assert_eq!(scheduler.pending(), 1);
    }

    #[test]
    fn test_overflow_keeps_previous_result() {
        let (_, mut widget) = widget();
        assert!(!widget.handle(&text(
            FieldKind::AccountValue,
            "79228162514264337593543950335"
        )));
        assert_eq!(widget.field(FieldKind::AccountValue).raw(), Some(Decimal::MAX));
        assert_eq!(widget.shares_to_buy(), Some(dec!(110)));
        assert_eq!(widget.recalculations(), (0, 1));

        assert!(widget.handle(&text(FieldKind::AccountValue, "50000")));
        assert_eq!(widget.shares_to_buy(), Some(dec!(55)));
    }

    #[test]
    fn test_risk_typed_key_by_key() {
        let (_, mut widget) = widget();
        widget.handle(&text(FieldKind::RiskPercent, ""));
        for ch in ['1', '.', '1'] {
            widget.handle(&WidgetEvent::Key {
                field: FieldKind::RiskPercent,
                ch,
            });
        }
        assert_eq!(widget.field(FieldKind::RiskPercent).raw(), Some(dec!(1.1)));
        assert_eq!(widget.shares_to_buy(), Some(dec!(55)));
    }

    #[test]
    fn test_calculate_event_recomputes() {
        let (_, mut widget) = widget();
        assert!(widget.handle(&WidgetEvent::Calculate));
        assert_eq!(widget.recalculations(), (1, 0));
    }

    #[test]
    fn test_snapshot_renders_fields() {
        let (_, widget) = widget();
        let snapshot = widget.snapshot(0.0);
        assert_eq!(snapshot.fields.len(), 4);
        assert_eq!(snapshot.fields[0].text, "$100,000");
        assert_eq!(snapshot.fields[1].text, "2.2%");
        assert_eq!(snapshot.fields[2].text, "$100.00");
        assert_eq!(snapshot.fields[3].edit_state, Some(EditState::Idle));

        let rendered = snapshot.to_string();
        assert!(rendered.contains("Shares To Buy:"));
        assert!(rendered.contains("110"));
    }
}
