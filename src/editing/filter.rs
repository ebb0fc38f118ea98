//! Keystroke filtering and lenient numeric parsing.

use std::str::FromStr;

use rust_decimal::Decimal;

/// Maximum digits allowed after the decimal point in a staged buffer.
pub const MAX_FRACTION_DIGITS: usize = 2;

/// Keep only digits and decimal points (direct-commit fields).
pub fn strip_non_numeric(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect()
}

/// Whether appending `ch` to `buffer` keeps it a valid price:
/// digits, at most one `.`, at most two fractional digits.
pub fn accepts(buffer: &str, ch: char) -> bool {
    match (ch, buffer.find('.')) {
        ('.', None) => true,
        ('.', Some(_)) => false,
        (c, None) if c.is_ascii_digit() => true,
        (c, Some(dot)) if c.is_ascii_digit() => buffer.len() - dot - 1 < MAX_FRACTION_DIGITS,
        _ => false,
    }
}

/// Feed `text` through [`accepts`] one character at a time, dropping every
/// character that would break the pattern.
pub fn filter_price(text: &str) -> String {
    text.chars().fold(String::with_capacity(text.len()), |mut out, ch| {
        if accepts(&out, ch) {
            out.push(ch);
        }
        out
    })
}

/// Parse user-entered numeric text.
///
/// Accepts a bare trailing or leading point (`"5."`, `".5"`). Returns `None`
/// for empty text, a lone point, or anything else that is not a number.
pub fn parse_amount(text: &str) -> Option<Decimal> {
    let trimmed = text.trim();
    let trimmed = trimmed.strip_suffix('.').unwrap_or(trimmed);
    if trimmed.is_empty() {
        return None;
    }

    let normalized = if trimmed.starts_with('.') {
        format!("0{}", trimmed)
    } else {
        trimmed.to_string()
    };

    Decimal::from_str(&normalized).ok().filter(|d| !d.is_sign_negative())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_filter_price_drops_letters_and_extra_decimals() {
        assert_eq!(filter_price("12a3.456"), "123.45");
    }

    #[test]
    fn test_filter_price_single_point() {
        assert_eq!(filter_price("1.2.3"), "1.23");
        assert_eq!(filter_price("$80.00"), "80.00");
        assert_eq!(filter_price(""), "");
    }

    #[test]
    fn test_accepts() {
        assert!(accepts("", '.'));
        assert!(accepts("12", '3'));
        assert!(accepts("12.3", '4'));
        assert!(!accepts("12.34", '5'));
        assert!(!accepts("12.", '.'));
        assert!(!accepts("12", '-'));
    }

    #[test]
    fn test_strip_non_numeric() {
        assert_eq!(strip_non_numeric("$100,000"), "100000");
        assert_eq!(strip_non_numeric("2.5%"), "2.5");
        assert_eq!(strip_non_numeric("abc"), "");
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("123.45"), Some(dec!(123.45)));
        assert_eq!(parse_amount("5."), Some(dec!(5)));
        assert_eq!(parse_amount(".5"), Some(dec!(0.5)));
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("."), None);
        assert_eq!(parse_amount("1.2.3"), None);
    }
}
