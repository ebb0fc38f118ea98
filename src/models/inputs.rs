//! Calculator inputs and the derived result.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The four values the share count is derived from. `None` marks an empty
/// or invalid field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SizingInputs {
    /// Account value in dollars
    pub account_value: Option<Decimal>,

    /// Percent of the account risked on one trade (2.2 means 2.2%)
    pub risk_percent: Option<Decimal>,

    /// Planned entry price per share
    pub entry_price: Option<Decimal>,

    /// Stop price per share
    pub stop_price: Option<Decimal>,
}

impl SizingInputs {
    pub fn new(account_value: Decimal, risk_percent: Decimal, entry_price: Decimal, stop_price: Decimal) -> Self {
        Self {
            account_value: Some(account_value),
            risk_percent: Some(risk_percent),
            entry_price: Some(entry_price),
            stop_price: Some(stop_price),
        }
    }
}

/// Output of one position-size calculation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    /// Dollars lost if the stop is hit
    pub risk_amount: Decimal,

    /// Loss per share if stopped out (entry - stop)
    pub risk_per_share: Decimal,

    /// Unrounded share count
    pub shares: Decimal,

    /// Share count after the configured rounding policy
    pub shares_to_buy: Decimal,
}
