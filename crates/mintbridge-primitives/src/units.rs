//! Ether/wei denomination conversion

use primitive_types::U256;
use thiserror::Error;

/// Decimal places in one ether
pub const ETHER_DECIMALS: usize = 18;

/// 10^18 wei
pub const WEI_PER_ETHER: u64 = 1_000_000_000_000_000_000;

/// Amount parsing error
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UnitsError {
    /// Empty input
    #[error("empty amount")]
    Empty,
    /// Contains something other than digits and one decimal point
    #[error("invalid decimal amount: {0}")]
    InvalidDecimal(String),
    /// More fractional digits than wei can represent
    #[error("too many decimal places: {0} (max 18)")]
    TooPrecise(usize),
    /// Larger than 2^256 - 1 wei
    #[error("amount overflows 256 bits")]
    Overflow,
}

/// Parse a decimal ether amount (e.g. `"0.5"`, `"12"`, `"1.000000000000000001"`)
/// into wei.
pub fn parse_ether(input: &str) -> Result<U256, UnitsError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(UnitsError::Empty);
    }

    let (whole, frac) = match s.split_once('.') {
        Some((w, f)) => (w, f),
        None => (s, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(UnitsError::InvalidDecimal(input.to_string()));
    }
    let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(whole) || !all_digits(frac) {
        return Err(UnitsError::InvalidDecimal(input.to_string()));
    }
    if frac.len() > ETHER_DECIMALS {
        return Err(UnitsError::TooPrecise(frac.len()));
    }

    let whole_wei = if whole.is_empty() {
        U256::zero()
    } else {
        U256::from_dec_str(whole)
            .map_err(|_| UnitsError::Overflow)?
            .checked_mul(U256::from(WEI_PER_ETHER))
            .ok_or(UnitsError::Overflow)?
    };

    let frac_wei = if frac.is_empty() {
        U256::zero()
    } else {
        let padded = format!("{:0<width$}", frac, width = ETHER_DECIMALS);
        U256::from_dec_str(&padded).map_err(|_| UnitsError::Overflow)?
    };

    whole_wei.checked_add(frac_wei).ok_or(UnitsError::Overflow)
}

/// Render a wei amount as a decimal ether string without trailing zeros.
pub fn format_ether(wei: U256) -> String {
    let unit = U256::from(WEI_PER_ETHER);
    let whole = wei / unit;
    let frac = wei % unit;
    if frac.is_zero() {
        return whole.to_string();
    }
    let frac = format!("{:0>width$}", frac.to_string(), width = ETHER_DECIMALS);
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_whole_ether() {
        assert_eq!(parse_ether("1").unwrap(), U256::from(WEI_PER_ETHER));
        assert_eq!(parse_ether("0").unwrap(), U256::zero());
    }

    #[test]
    fn test_parse_fractional_ether() {
        assert_eq!(
            parse_ether("0.5").unwrap(),
            U256::from(500_000_000_000_000_000u64)
        );
        assert_eq!(
            parse_ether(".25").unwrap(),
            U256::from(250_000_000_000_000_000u64)
        );
        assert_eq!(parse_ether("0.000000000000000001").unwrap(), U256::one());
        assert_eq!(
            parse_ether(" 2.5 ").unwrap(),
            U256::from(2_500_000_000_000_000_000u64)
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_ether(""), Err(UnitsError::Empty));
        assert!(matches!(parse_ether("."), Err(UnitsError::InvalidDecimal(_))));
        assert!(matches!(parse_ether("-1"), Err(UnitsError::InvalidDecimal(_))));
        assert!(matches!(parse_ether("1.2.3"), Err(UnitsError::InvalidDecimal(_))));
        assert!(matches!(parse_ether("1e18"), Err(UnitsError::InvalidDecimal(_))));
    }

    #[test]
    fn test_parse_too_precise() {
        assert_eq!(
            parse_ether("0.0000000000000000001"),
            Err(UnitsError::TooPrecise(19))
        );
    }

    #[test]
    fn test_parse_overflow() {
        let huge = "9".repeat(80);
        assert_eq!(parse_ether(&huge), Err(UnitsError::Overflow));
    }

    #[test]
    fn test_format_ether() {
        assert_eq!(format_ether(U256::from(WEI_PER_ETHER)), "1");
        assert_eq!(format_ether(U256::from(1_500_000_000_000_000_000u64)), "1.5");
        assert_eq!(format_ether(U256::one()), "0.000000000000000001");
    }
}
