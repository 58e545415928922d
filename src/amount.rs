//! Raw-unit to display-unit conversion.
//!
//! The ledger's display unit is exactly 10^30 raw. Amounts routinely exceed
//! what `f64` (and even a 28-digit decimal) can hold, so conversion works
//! on the digit string itself: dividing by a power of ten is a decimal-point
//! shift, which is exact at any length.

/// Decimal places between raw and display units
pub const RAW_DECIMALS: usize = 30;

/// Display unit name appended by the renderer
pub const DISPLAY_UNIT: &str = "NANO";

/// Marker shown when a transaction carries no amount
pub const NOT_APPLICABLE: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("raw amount is not a digit string: {0:?}")]
    NotDigits(String),
}

/// Format an optional raw amount, mapping absence to [`NOT_APPLICABLE`]
pub fn format_amount(raw: Option<&str>) -> String {
    match raw {
        None => NOT_APPLICABLE.to_string(),
        Some(raw) => match raw_to_display(raw) {
            Ok(display) => display,
            Err(e) => {
                log::debug!("Unformattable amount: {}", e);
                NOT_APPLICABLE.to_string()
            }
        },
    }
}

/// Convert a raw digit string into a grouped display-unit decimal.
///
/// `"1500000000000000000000000000000"` becomes `"1.5"`, and
/// `"1234000000000000000000000000000000"` becomes `"1,234"`.
pub fn raw_to_display(raw: &str) -> Result<String, AmountError> {
    let digits = significant_digits(raw)?;

    let (integer, fraction) = if digits.len() > RAW_DECIMALS {
        let split = digits.len() - RAW_DECIMALS;
        (&digits[..split], digits[split..].to_string())
    } else {
        ("0", format!("{:0>width$}", digits, width = RAW_DECIMALS))
    };

    let fraction = fraction.trim_end_matches('0');
    let grouped = group_thousands(integer);

    if fraction.is_empty() {
        Ok(grouped)
    } else {
        Ok(format!("{}.{}", grouped, fraction))
    }
}

/// True when the raw amount is strictly less than one display unit
pub fn is_below_one_unit(raw: &str) -> Result<bool, AmountError> {
    // 10^30 is the smallest 31-digit number
    Ok(significant_digits(raw)?.len() <= RAW_DECIMALS)
}

/// Validate and strip leading zeros; zero itself becomes `""`
fn significant_digits(raw: &str) -> Result<&str, AmountError> {
    if !crate::transaction::is_digit_string(raw) {
        return Err(AmountError::NotDigits(raw.to_string()));
    }
    Ok(raw.trim_start_matches('0'))
}

fn group_thousands(integer: &str) -> String {
    let len = integer.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in integer.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Undo the display formatting back to a raw integer string
    fn display_to_raw(display: &str) -> String {
        let plain: String = display.chars().filter(|c| *c != ',').collect();
        let (integer, fraction) = plain.split_once('.').unwrap_or((&plain, ""));
        let raw = format!("{}{:0<width$}", integer, fraction, width = RAW_DECIMALS);
        let trimmed = raw.trim_start_matches('0');
        if trimmed.is_empty() { "0".to_string() } else { trimmed.to_string() }
    }

    #[test]
    fn test_whole_and_fractional_units() {
        assert_eq!(raw_to_display("1000000000000000000000000000000").unwrap(), "1");
        assert_eq!(raw_to_display("1500000000000000000000000000000").unwrap(), "1.5");
        assert_eq!(raw_to_display("500000000000000000000000000000").unwrap(), "0.5");
        assert_eq!(raw_to_display("1").unwrap(), "0.000000000000000000000000000001");
        assert_eq!(raw_to_display("0").unwrap(), "0");
        assert_eq!(raw_to_display("000").unwrap(), "0");
    }

    #[test]
    fn test_thousands_grouping() {
        assert_eq!(
            raw_to_display("1234567000000000000000000000000000000").unwrap(),
            "1,234,567"
        );
        assert_eq!(
            raw_to_display("133248297920938463463374607431768211455").unwrap(),
            "133,248,297.920938463463374607431768211455"
        );
        assert_eq!(raw_to_display("999000000000000000000000000000000").unwrap(), "999");
    }

    #[test]
    fn test_round_trip_is_exact() {
        let samples = [
            "1",
            "10",
            "999999999999999999999999999999",
            "1000000000000000000000000000000",
            "123456789012345678901234567890123456789",
            // Wider than u128
            "98765432109876543210987654321098765432109876543210",
        ];
        for raw in samples {
            let display = raw_to_display(raw).unwrap();
            assert_eq!(display_to_raw(&display), raw, "round trip of {}", raw);
        }
    }

    #[test]
    fn test_absent_and_invalid() {
        assert_eq!(format_amount(None), NOT_APPLICABLE);
        assert_eq!(format_amount(Some("12a")), NOT_APPLICABLE);
        assert_eq!(raw_to_display(""), Err(AmountError::NotDigits(String::new())));
        assert_eq!(
            raw_to_display("-5"),
            Err(AmountError::NotDigits("-5".to_string()))
        );
    }

    #[test]
    fn test_one_unit_threshold() {
        assert!(is_below_one_unit("500000000000000000000000000000").unwrap());
        assert!(is_below_one_unit("999999999999999999999999999999").unwrap());
        assert!(is_below_one_unit("0").unwrap());
        assert!(!is_below_one_unit("1000000000000000000000000000000").unwrap());
        assert!(!is_below_one_unit("1500000000000000000000000000000").unwrap());
        assert!(!is_below_one_unit("0001000000000000000000000000000000").unwrap());
    }
}
