//! Locale-tolerant value parsing for price and contract-length text.
//!
//! Both functions are total: text that cannot be interpreted yields `None`,
//! never an error.

use once_cell::sync::Lazy;
use regex::Regex;

static DURATION_WITH_UNIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+)\s*(?:mesi|mes|months?)").expect("valid duration regex")
});

static FIRST_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("valid number regex"));

fn is_separator(c: char) -> bool {
    c == ',' || c == '.'
}

/// Parse a monthly price such as "€ 1.234,50" or "1234.50 EUR/mese".
///
/// The rightmost `,` or `.` is the decimal separator, every other separator is
/// a grouping mark. The value is rounded half-up on its decimal digits, so
/// "0,50" is 1. Returns `None` unless the result is a positive integer that
/// fits in `u32`.
pub fn parse_price(text: &str) -> Option<u32> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || is_separator(*c))
        .collect();

    let (int_part, frac_part) = match cleaned.rfind(is_separator) {
        Some(idx) => (&cleaned[..idx], &cleaned[idx + 1..]),
        None => (cleaned.as_str(), ""),
    };

    let int_digits: String = int_part.chars().filter(|c| c.is_ascii_digit()).collect();
    let first_frac_digit = frac_part.chars().next();

    if int_digits.is_empty() && first_frac_digit.is_none() {
        return None;
    }

    let mut value: u32 = if int_digits.is_empty() {
        0
    } else {
        int_digits.parse().ok()?
    };

    if matches!(first_frac_digit, Some('5'..='9')) {
        value = value.checked_add(1)?;
    }

    if value == 0 {
        None
    } else {
        Some(value)
    }
}

/// Parse a contract length such as "36 mesi" or "48 months".
///
/// A number followed by a month keyword wins; otherwise the first bare
/// number in the text is used.
pub fn parse_duration(text: &str) -> Option<u32> {
    if let Some(caps) = DURATION_WITH_UNIT.captures(text) {
        if let Some(months) = caps.get(1).and_then(|m| m.as_str().parse().ok()) {
            return Some(months);
        }
    }

    FIRST_NUMBER
        .find(text)
        .and_then(|m| m.as_str().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_price_italian_format_rounds_half_up() {
        assert_eq!(parse_price("€1.234,50"), Some(1235));
        assert_eq!(parse_price("€ 299,49 /mese"), Some(299));
        assert_eq!(parse_price("199,50€"), Some(200));
    }

    #[test]
    fn test_parse_price_international_format() {
        assert_eq!(parse_price("1234.50"), Some(1235));
        assert_eq!(parse_price("1,234.49 EUR"), Some(1234));
        assert_eq!(parse_price("EUR 350"), Some(350));
    }

    #[test]
    fn test_parse_price_trailing_separator() {
        assert_eq!(parse_price("350,-"), Some(350));
        assert_eq!(parse_price("350."), Some(350));
    }

    #[test]
    fn test_parse_price_rejects_garbage_and_zero() {
        assert_eq!(parse_price("abc"), None);
        assert_eq!(parse_price(""), None);
        assert_eq!(parse_price("€"), None);
        assert_eq!(parse_price(",."), None);
        assert_eq!(parse_price("0,00"), None);
        assert_eq!(parse_price("0,49"), None);
        assert_eq!(parse_price("0,50"), Some(1));
    }

    #[test]
    fn test_parse_price_overflow_is_absent() {
        assert_eq!(parse_price("99999999999999999999"), None);
        assert_eq!(parse_price("4294967295,9"), None);
    }

    #[test]
    fn test_parse_duration_with_keyword() {
        assert_eq!(parse_duration("36 mesi"), Some(36));
        assert_eq!(parse_duration("Durata: 48mesi"), Some(48));
        assert_eq!(parse_duration("24 Months"), Some(24));
        assert_eq!(parse_duration("anticipo 0, 60 mesi, 15000 km"), Some(60));
    }

    #[test]
    fn test_parse_duration_falls_back_to_first_number() {
        assert_eq!(parse_duration("durata 36"), Some(36));
        assert_eq!(parse_duration("36/48"), Some(36));
    }

    #[test]
    fn test_parse_duration_overflow_is_absent() {
        assert_eq!(parse_duration("99999999999 mesi"), None);
        assert_eq!(parse_duration("durata 99999999999"), None);
    }

    #[test]
    fn test_parse_duration_absent() {
        assert_eq!(parse_duration("no info"), None);
        assert_eq!(parse_duration(""), None);
    }
}
