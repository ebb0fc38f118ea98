//! Display formatting for committed values.

use num_format::{Locale, ToFormattedString};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Canonical two-decimal form used by staged price buffers ("123.45").
pub fn fixed2(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.2}", rounded)
}

/// Group thousands and keep at most `max_fraction` fractional digits,
/// dropping trailing zeros ("1,234.5", "100,000").
pub fn grouped(value: Decimal, max_fraction: u32) -> String {
    let rounded = value
        .round_dp_with_strategy(max_fraction, RoundingStrategy::MidpointAwayFromZero)
        .normalize();

    let whole = rounded.trunc().abs();
    let Some(whole_digits) = whole.to_u128() else {
        return rounded.to_string();
    };

    let mut out = String::new();
    if rounded.is_sign_negative() && !rounded.is_zero() {
        out.push('-');
    }
    out.push_str(&whole_digits.to_formatted_string(&Locale::en));

    let fraction = (rounded - rounded.trunc()).abs().normalize();
    if !fraction.is_zero() {
        // "0.5" -> ".5"
        let text = fraction.to_string();
        out.push_str(text.trim_start_matches('0'));
    }
    out
}

/// Account value as shown in the input: "$100,000".
pub fn currency(value: Decimal) -> String {
    format!("${}", grouped(value, 3))
}

/// Percentage without trailing zeros: "2.2%".
pub fn percent(value: Decimal) -> String {
    format!("{}%", value.normalize())
}

/// Animated share count: grouped, at most one fractional digit.
pub fn shares(value: f64) -> String {
    match Decimal::try_from(value) {
        Ok(d) => grouped(d, 1),
        Err(_) => "0".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_fixed2() {
        assert_eq!(fixed2(dec!(123.45)), "123.45");
        assert_eq!(fixed2(dec!(0)), "0.00");
        assert_eq!(fixed2(dec!(80)), "80.00");
        assert_eq!(fixed2(dec!(1.005)), "1.01");
    }

    #[test]
    fn test_grouped() {
        assert_eq!(grouped(dec!(100000), 3), "100,000");
        assert_eq!(grouped(dec!(1234.56), 1), "1,234.6");
        assert_eq!(grouped(dec!(110.0), 1), "110");
        assert_eq!(grouped(dec!(0.25), 3), "0.25");
        assert_eq!(grouped(dec!(-1500), 0), "-1,500");
    }

    #[test]
    fn test_currency_and_percent() {
        assert_eq!(currency(dec!(100000)), "$100,000");
        assert_eq!(percent(dec!(2.20)), "2.2%");
        assert_eq!(percent(dec!(0)), "0%");
    }

    #[test]
    fn test_shares_from_display_value() {
        assert_eq!(shares(110.0), "110");
        assert_eq!(shares(1234.54), "1,234.5");
        assert_eq!(shares(f64::NAN), "0");
    }
}
