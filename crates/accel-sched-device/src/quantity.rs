//! Integer view of Kubernetes resource quantities.
//!
//! `k8s-openapi` keeps quantities as raw strings. Device resources are
//! plain counts, so all the adapters need is "is this a whole number, and
//! which one".

use k8s_openapi::apimachinery::pkg::api::resource::Quantity;

/// Parse a quantity as a whole `i64`.
///
/// Accepts the Kubernetes quantity grammar: an optionally signed decimal
/// number followed by a binary suffix (`Ki`..`Ei`), a decimal suffix
/// (`n u m k M G T P E`) or an exponent (`e3`, `E-2`). Returns `None` if the
/// value is fractional, overflows `i64`, or does not parse.
#[must_use]
pub fn quantity_as_i64(quantity: &Quantity) -> Option<i64> {
    parse_whole(quantity.0.trim())
}

fn parse_whole(s: &str) -> Option<i64> {
    let (negative, rest) = match s.as_bytes().first()? {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (false, s),
    };

    let number_end = rest
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(rest.len());
    let (number, suffix) = rest.split_at(number_end);
    let (int_part, frac_part) = number.split_once('.').unwrap_or((number, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if frac_part.contains('.') {
        return None;
    }
    let frac_part = frac_part.trim_end_matches('0');

    let digits = format!("{int_part}{frac_part}");
    let digits = digits.trim_start_matches('0');
    let mantissa: i128 = if digits.is_empty() { 0 } else { digits.parse().ok()? };

    let mut exp10 = -i32::try_from(frac_part.len()).ok()?;
    let mut multiplier: i128 = 1;
    match suffix {
        "" => {}
        "n" => exp10 -= 9,
        "u" => exp10 -= 6,
        "m" => exp10 -= 3,
        "k" => exp10 += 3,
        "M" => exp10 += 6,
        "G" => exp10 += 9,
        "T" => exp10 += 12,
        "P" => exp10 += 15,
        "E" => exp10 += 18,
        "Ki" => multiplier = 1 << 10,
        "Mi" => multiplier = 1 << 20,
        "Gi" => multiplier = 1 << 30,
        "Ti" => multiplier = 1 << 40,
        "Pi" => multiplier = 1 << 50,
        "Ei" => multiplier = 1 << 60,
        exp if exp.starts_with(['e', 'E']) => {
            exp10 = exp10.checked_add(exp[1..].parse::<i32>().ok()?)?;
        }
        _ => return None,
    }

    let mut value = mantissa.checked_mul(multiplier)?;
    if value != 0 {
        let scale = 10i128.checked_pow(exp10.unsigned_abs())?;
        if exp10 >= 0 {
            value = value.checked_mul(scale)?;
        } else if value % scale == 0 {
            value /= scale;
        } else {
            return None;
        }
    }
    if negative {
        value = -value;
    }
    i64::try_from(value).ok()
}

/// Narrow to `i32`, saturating at the bounds.
#[must_use]
pub fn saturate_i32(value: i64) -> i32 {
    i32::try_from(value).unwrap_or(if value < 0 { i32::MIN } else { i32::MAX })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(s: &str) -> Option<i64> {
        quantity_as_i64(&Quantity(s.to_string()))
    }

    #[test]
    fn plain_integers() {
        assert_eq!(q("0"), Some(0));
        assert_eq!(q("2"), Some(2));
        assert_eq!(q("4096"), Some(4096));
        assert_eq!(q("+7"), Some(7));
        assert_eq!(q("-3"), Some(-3));
        assert_eq!(q(" 12 "), Some(12));
    }

    #[test]
    fn suffixes() {
        assert_eq!(q("1k"), Some(1000));
        assert_eq!(q("1Ki"), Some(1024));
        assert_eq!(q("2Mi"), Some(2 * 1024 * 1024));
        assert_eq!(q("1.5k"), Some(1500));
        assert_eq!(q("1000m"), Some(1));
        assert_eq!(q("3e2"), Some(300));
        assert_eq!(q("1E"), Some(1_000_000_000_000_000_000));
    }

    #[test]
    fn fractional_values_are_not_integers() {
        assert_eq!(q("500m"), None);
        assert_eq!(q("1.5"), None);
        assert_eq!(q("0.5Ki"), Some(512));
        assert_eq!(q("0.1Ki"), None);
    }

    #[test]
    fn trailing_fraction_zeros() {
        assert_eq!(q(&format!("1.{}", "0".repeat(45))), Some(1));
        assert_eq!(q("5."), Some(5));
        assert_eq!(q("2.500k"), Some(2500));
        assert_eq!(q("1.50"), None);
    }

    #[test]
    fn garbage_does_not_parse() {
        assert_eq!(q(""), None);
        assert_eq!(q("abc"), None);
        assert_eq!(q("1.2.3"), None);
        assert_eq!(q("5X"), None);
        assert_eq!(q("."), None);
        assert_eq!(q("10Ei"), None);
    }

    #[test]
    fn saturating_narrowing() {
        assert_eq!(saturate_i32(10), 10);
        assert_eq!(saturate_i32(i64::MAX), i32::MAX);
        assert_eq!(saturate_i32(i64::MIN), i32::MIN);
    }
}
