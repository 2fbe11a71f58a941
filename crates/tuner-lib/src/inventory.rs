//! Allocatable resource lookup
//!
//! Nodes report allocatable capacity as Kubernetes quantities. SR-IOV
//! device plugins publish virtual function counts this way, so a quantity
//! is only usable here if it reduces to an exact whole number.

use crate::error::{Result, TunerError};
use crate::models::NodeResources;

/// Look up a resource on the node and convert it to an exact count
pub fn allocatable_count(node: &NodeResources, resource: &str) -> Result<u64> {
    let quantity = node
        .allocatable
        .get(resource)
        .ok_or_else(|| TunerError::ResourceNotFound {
            node: node.name.clone(),
            resource: resource.to_string(),
        })?;

    quantity_to_count(&quantity.0).ok_or_else(|| TunerError::NonIntegralResource {
        resource: resource.to_string(),
        quantity: quantity.0.clone(),
    })
}

/// Convert a quantity string to a whole, non-negative count.
///
/// Returns `None` when the quantity is malformed, fractional, negative or
/// larger than a signed 64-bit count.
pub fn quantity_to_count(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    let (negative, rest) = match raw.as_bytes().first()? {
        b'-' => (true, &raw[1..]),
        b'+' => (false, &raw[1..]),
        _ => (false, raw),
    };

    let number_len = rest
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(rest.len());
    let (number, suffix) = rest.split_at(number_len);

    let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if fraction.contains('.') {
        return None;
    }

    let (binary_shift, decimal_exponent) = parse_suffix(suffix)?;

    let digits = format!("{}{}", whole, fraction);
    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return Some(0);
    }
    if digits.len() > 38 {
        return None;
    }
    let mantissa: u128 = digits.parse().ok()?;
    let scaled = mantissa.checked_mul(1u128.checked_shl(binary_shift)?)?;

    let exponent = decimal_exponent.checked_sub(i64::try_from(fraction.len()).ok()?)?;
    let value = if exponent >= 0 {
        scaled.checked_mul(10u128.checked_pow(u32::try_from(exponent).ok()?)?)?
    } else {
        let divisor = 10u128.checked_pow(u32::try_from(exponent.checked_neg()?).ok()?)?;
        if scaled % divisor != 0 {
            return None;
        }
        scaled / divisor
    };

    if negative || value > i64::MAX as u128 {
        return None;
    }
    u64::try_from(value).ok()
}

/// Returns (power of two, power of ten) for a quantity suffix
fn parse_suffix(suffix: &str) -> Option<(u32, i64)> {
    let scale = match suffix {
        "" => (0, 0),
        "n" => (0, -9),
        "u" => (0, -6),
        "m" => (0, -3),
        "k" => (0, 3),
        "M" => (0, 6),
        "G" => (0, 9),
        "T" => (0, 12),
        "P" => (0, 15),
        "E" => (0, 18),
        "Ki" => (10, 0),
        "Mi" => (20, 0),
        "Gi" => (30, 0),
        "Ti" => (40, 0),
        "Pi" => (50, 0),
        "Ei" => (60, 0),
        s if s.starts_with(['e', 'E']) => (0, s[1..].parse::<i64>().ok()?),
        _ => return None,
    };
    Some(scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_integer() {
        let node = NodeResources::new("n1").with_allocatable("example.com/sriov", "4");
        assert_eq!(allocatable_count(&node, "example.com/sriov").unwrap(), 4);
    }

    #[test]
    fn test_missing_resource() {
        let node = NodeResources::new("n1").with_allocatable("example.com/sriov", "4");
        let err = allocatable_count(&node, "missing").unwrap_err();
        match err {
            TunerError::ResourceNotFound { node, resource } => {
                assert_eq!(node, "n1");
                assert_eq!(resource, "missing");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_fractional_resource() {
        let node = NodeResources::new("n1").with_allocatable("example.com/sriov", "4.5");
        let err = allocatable_count(&node, "example.com/sriov").unwrap_err();
        assert!(matches!(err, TunerError::NonIntegralResource { ref quantity, .. } if quantity == "4.5"));
    }

    #[test]
    fn test_scaled_quantities() {
        assert_eq!(quantity_to_count("2k"), Some(2_000));
        assert_eq!(quantity_to_count("1Ki"), Some(1_024));
        assert_eq!(quantity_to_count("3Gi"), Some(3 * 1024 * 1024 * 1024));
        assert_eq!(quantity_to_count("4000m"), Some(4));
        assert_eq!(quantity_to_count("1.5k"), Some(1_500));
        assert_eq!(quantity_to_count("12e2"), Some(1_200));
        assert_eq!(quantity_to_count("1E"), Some(1_000_000_000_000_000_000));
        assert_eq!(quantity_to_count("+8"), Some(8));
        assert_eq!(quantity_to_count("0"), Some(0));
        assert_eq!(quantity_to_count("-0"), Some(0));
    }

    #[test]
    fn test_non_integral_quantities() {
        assert_eq!(quantity_to_count("500m"), None);
        assert_eq!(quantity_to_count("1.25"), None);
        assert_eq!(quantity_to_count("3e-1"), None);
        assert_eq!(quantity_to_count("1n"), None);
    }

    #[test]
    fn test_invalid_quantities() {
        assert_eq!(quantity_to_count(""), None);
        assert_eq!(quantity_to_count("abc"), None);
        assert_eq!(quantity_to_count("4X"), None);
        assert_eq!(quantity_to_count("1.2.3"), None);
        assert_eq!(quantity_to_count("-4"), None);
        assert_eq!(quantity_to_count("."), None);
    }

    #[test]
    fn test_out_of_range_quantities() {
        assert_eq!(quantity_to_count("9223372036854775807"), Some(i64::MAX as u64));
        assert_eq!(quantity_to_count("9223372036854775808"), None);
        assert_eq!(quantity_to_count("100Ei"), None);
        assert_eq!(quantity_to_count("1e-9223372036854775808"), None);
        assert_eq!(quantity_to_count("1.5e-9223372036854775808"), None);
        assert_eq!(quantity_to_count("1e9223372036854775807"), None);
    }
}
