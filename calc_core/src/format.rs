//! Number formatting for the display

use crate::error::CalcError;

/// Rounds to `decimals` places and strips trailing zeros
///
/// Integers never carry a decimal point and `-0` prints as `0`.
pub fn format_number(value: f64, decimals: usize) -> Result<String, CalcError> {
    if !value.is_finite() {
        return Err(CalcError::Range);
    }
    let mut text = format!("{:.*}", decimals, value);
    if text.contains('.') {
        let trimmed = text.trim_end_matches('0').trim_end_matches('.').len();
        text.truncate(trimmed);
    }
    if text == "-0" {
        text = "0".into();
    }
    Ok(text)
}

/// Rounds half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Inserts thousands separators into every numeric segment
///
/// Returns the grouped text and the cursor re-expressed as an offset into
/// it. Only integer digits are grouped; fractional digits are left alone.
pub fn group_thousands(text: &str, cursor: usize) -> (String, usize) {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + text.len() / 3);
    let mut out_len = 0usize;
    let mut cursor_offset = None;
    let mut i = 0;

    while i < chars.len() {
        if !chars[i].is_ascii_digit() {
            if i == cursor {
                cursor_offset = Some(out_len);
            }
            if chars[i] == '.' {
                // fractional digits follow; copy them verbatim
                out.push('.');
                out_len += 1;
                i += 1;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    if i == cursor {
                        cursor_offset = Some(out_len);
                    }
                    out.push(chars[i]);
                    out_len += 1;
                    i += 1;
                }
                continue;
            }
            out.push(chars[i]);
            out_len += 1;
            i += 1;
            continue;
        }

        let run_end = chars[i..]
            .iter()
            .position(|c| !c.is_ascii_digit())
            .map_or(chars.len(), |p| i + p);
        let run_len = run_end - i;
        for (k, digit) in chars[i..run_end].iter().enumerate() {
            if k > 0 && (run_len - k) % 3 == 0 {
                out.push(',');
                out_len += 1;
            }
            if i + k == cursor {
                cursor_offset = Some(out_len);
            }
            out.push(*digit);
            out_len += 1;
        }
        i = run_end;
    }

    (out, cursor_offset.unwrap_or(out_len))
}

fn gcd(a: i64, b: i64) -> i64 {
    if b == 0 {
        a.abs()
    } else {
        gcd(b, a % b)
    }
}

/// Reduced `(numerator, denominator)` for a terminating decimal
///
/// Uses the decimal places of the 10-place formatted value, so
/// `0.75` gives `(3, 4)` and `0.3333333333` gives `(3333333333, 10000000000)`.
/// Returns `None` when the scaled numerator would not fit in an `i64`.
pub fn decimal_to_fraction(value: f64) -> Option<(i64, i64)> {
    let text = format_number(value, 10).ok()?;
    let places = text.split_once('.').map_or(0, |(_, frac)| frac.len()) as u32;
    let denominator = 10i64.checked_pow(places)?;
    let scaled = (value * denominator as f64).round();
    if scaled.abs() >= i64::MAX as f64 {
        return None;
    }
    let numerator = scaled as i64;
    let divisor = gcd(numerator, denominator).max(1);
    Some((numerator / divisor, denominator / divisor))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_strips_trailing_zeros() {
        assert_eq!(format_number(20.0, 10).unwrap(), "20");
        assert_eq!(format_number(2.5, 10).unwrap(), "2.5");
        assert_eq!(format_number(0.1 + 0.2, 10).unwrap(), "0.3");
        assert_eq!(format_number(1.0 / 3.0, 10).unwrap(), "0.3333333333");
        assert_eq!(format_number(-0.00000000001, 10).unwrap(), "0");
        assert_eq!(format_number(1234.5678, 2).unwrap(), "1234.57");
    }

    #[test]
    fn test_format_rejects_non_finite() {
        assert_eq!(format_number(f64::NAN, 10), Err(CalcError::Range));
        assert_eq!(format_number(f64::INFINITY, 10), Err(CalcError::Range));
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(10.456, 2), 10.46);
        assert_eq!(round_to(2.5, 0), 3.0);
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands("1234567", 7), ("1,234,567".to_string(), 9));
        assert_eq!(
            group_thousands("1234.5678+1000", 14),
            ("1,234.5678+1,000".to_string(), 16)
        );
        assert_eq!(group_thousands("999", 3), ("999".to_string(), 3));
        assert_eq!(group_thousands("Error", 5), ("Error".to_string(), 5));
    }

    #[test]
    fn test_group_thousands_cursor_mapping() {
        // cursor before the "4" in 1234
        assert_eq!(group_thousands("1234", 3).1, 4);
        // cursor at the start
        assert_eq!(group_thousands("1234", 0).1, 0);
        // cursor right after the comma-separated thousands digit
        assert_eq!(group_thousands("1234", 1).1, 2);
    }

    #[test]
    fn test_decimal_to_fraction() {
        assert_eq!(decimal_to_fraction(0.75), Some((3, 4)));
        assert_eq!(decimal_to_fraction(-1.5), Some((-3, 2)));
        assert_eq!(decimal_to_fraction(4.0), Some((4, 1)));
    }
}
