//! Risk-based position sizing.
//!
//! shares = (account * risk% / 100) / (entry - stop)

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use tracing::{debug, warn};

use crate::models::{CalculationResult, SizingInputs};

use super::CalculatorConfig;

/// How the fractional share count is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundingPolicy {
    /// Whole shares, rounded down
    Floor,
    /// Rounded to one decimal place
    OneDecimal,
    /// Fractional count as computed
    None,
}

impl RoundingPolicy {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "one_decimal" | "onedecimal" | "decimal" => Self::OneDecimal,
            "none" | "fractional" => Self::None,
            _ => Self::Floor,
        }
    }

    pub fn apply(self, shares: Decimal) -> Decimal {
        match self {
            Self::Floor => shares.floor(),
            Self::OneDecimal => {
                shares.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
            }
            Self::None => shares,
        }
    }
}

/// Calculator for share quantities.
pub struct PositionSizer {
    rounding: RoundingPolicy,
}

impl PositionSizer {
    /// Create a new position sizer with given config.
    pub fn new(config: &CalculatorConfig) -> Self {
        Self::with_rounding(RoundingPolicy::from_str(&config.rounding))
    }

    pub fn with_rounding(rounding: RoundingPolicy) -> Self {
        Self { rounding }
    }

    pub fn rounding(&self) -> RoundingPolicy {
        self.rounding
    }

    /// Calculate the share count.
    ///
    /// Returns `None` when account value, entry or stop is empty or zero:
    /// the caller keeps whatever result it had. An empty risk reads as 0%.
    /// A stop at or above the entry yields zero shares. Inputs too large to
    /// compute with are treated like missing ones.
    pub fn calculate(&self, inputs: &SizingInputs) -> Option<CalculationResult> {
        let account = inputs.account_value.filter(|v| !v.is_zero())?;
        let entry = inputs.entry_price.filter(|v| !v.is_zero())?;
        let stop = inputs.stop_price.filter(|v| !v.is_zero())?;
        let risk_percent = inputs.risk_percent.unwrap_or(Decimal::ZERO);

        let Some((risk_amount, risk_per_share, shares)) =
            Self::shares(account, risk_percent, entry, stop)
        else {
            warn!(%account, %risk_percent, %entry, %stop, "Position size out of range");
            return None;
        };

        let result = CalculationResult {
            risk_amount,
            risk_per_share,
            shares,
            shares_to_buy: self.rounding.apply(shares),
        };

        debug!(
            risk_amount = %result.risk_amount,
            risk_per_share = %result.risk_per_share,
            shares = %result.shares_to_buy,
            "Calculated position size"
        );

        Some(result)
    }

    /// Risk amount, risk per share and raw share count, or `None` on overflow.
    fn shares(
        account_value: Decimal,
        risk_percent: Decimal,
        entry: Decimal,
        stop: Decimal,
    ) -> Option<(Decimal, Decimal, Decimal)> {
        let risk_amount = account_value
            .checked_mul(risk_percent)?
            .checked_div(dec!(100))?;
        let risk_per_share = entry.checked_sub(stop)?;

        let shares = if risk_per_share <= Decimal::ZERO {
            Decimal::ZERO
        } else {
            risk_amount.checked_div(risk_per_share)?
        };
        Some((risk_amount, risk_per_share, shares))
    }
}
