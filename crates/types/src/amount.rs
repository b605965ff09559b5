//! Integer base-unit amounts and exact decimal conversion
//!
//! On-chain amounts are unsigned integers that routinely exceed 64 bits, so
//! every conversion here is done digit-by-digit on a 256-bit integer. No
//! floating-point value ever participates.

use cosmwasm_std::Uint256;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Largest `decimals` value whose scale factor still fits in 256 bits
pub const MAX_DECIMALS: u8 = 77;

const BIPS_DENOMINATOR: u32 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,

    #[error("invalid character '{0}' in amount")]
    InvalidCharacter(char),

    #[error("amount contains more than one decimal point")]
    MultipleDecimalPoints,

    #[error("amount has {found} fractional digits but token supports {max}")]
    TooManyDecimals { found: usize, max: u8 },

    #[error("unsupported token decimals: {0}")]
    UnsupportedDecimals(u8),

    #[error("amount overflows 256 bits")]
    Overflow,
}

/// Token amount in the smallest indivisible unit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct BaseUnits(Uint256);

impl BaseUnits {
    pub const fn zero() -> Self {
        Self(Uint256::zero())
    }

    pub fn from_u128(value: u128) -> Self {
        Self(Uint256::from(value))
    }

    pub fn from_uint256(value: Uint256) -> Self {
        Self(value)
    }

    pub fn as_uint256(&self) -> Uint256 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn checked_add(&self, other: BaseUnits) -> Result<BaseUnits, AmountError> {
        self.0
            .checked_add(other.0)
            .map(BaseUnits)
            .map_err(|_| AmountError::Overflow)
    }

    /// Portion of this amount expressed in basis points, rounded down
    pub fn mul_bips(&self, bips: u32) -> Result<BaseUnits, AmountError> {
        let scaled = self
            .0
            .checked_mul(Uint256::from(bips))
            .map_err(|_| AmountError::Overflow)?;
        scaled
            .checked_div(Uint256::from(BIPS_DENOMINATOR))
            .map(BaseUnits)
            .map_err(|_| AmountError::Overflow)
    }
}

impl From<u128> for BaseUnits {
    fn from(value: u128) -> Self {
        Self::from_u128(value)
    }
}

impl fmt::Display for BaseUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BaseUnits {
    type Err = AmountError;

    /// Parses a plain digit string; no sign, exponent or decimal point
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(AmountError::Empty);
        }
        accumulate_digits(Uint256::zero(), s).map(BaseUnits)
    }
}

fn accumulate_digits(mut acc: Uint256, digits: &str) -> Result<Uint256, AmountError> {
    let ten = Uint256::from(10u32);
    for c in digits.chars() {
        let digit = c.to_digit(10).ok_or(AmountError::InvalidCharacter(c))?;
        acc = acc
            .checked_mul(ten)
            .and_then(|v| v.checked_add(Uint256::from(digit)))
            .map_err(|_| AmountError::Overflow)?;
    }
    Ok(acc)
}

fn scale_factor(decimals: u8) -> Result<Uint256, AmountError> {
    if decimals > MAX_DECIMALS {
        return Err(AmountError::UnsupportedDecimals(decimals));
    }
    Uint256::from(10u32)
        .checked_pow(decimals as u32)
        .map_err(|_| AmountError::UnsupportedDecimals(decimals))
}

/// Convert a human-entered decimal string (e.g. `"0.01"`) into base units
///
/// Accepts digits with at most one `.`; rejects signs, exponents, separators
/// and fractions finer than `decimals`.
pub fn parse_units(input: &str, decimals: u8) -> Result<BaseUnits, AmountError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AmountError::Empty);
    }

    let (whole, fraction) = match trimmed.split_once('.') {
        Some((w, f)) => {
            if f.contains('.') {
                return Err(AmountError::MultipleDecimalPoints);
            }
            (w, f)
        }
        None => (trimmed, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return Err(AmountError::Empty);
    }
    if let Some(bad) = trimmed.chars().find(|c| !c.is_ascii_digit() && *c != '.') {
        return Err(AmountError::InvalidCharacter(bad));
    }
    if fraction.len() > decimals as usize {
        return Err(AmountError::TooManyDecimals {
            found: fraction.len(),
            max: decimals,
        });
    }

    let scale = scale_factor(decimals)?;
    let whole_units = accumulate_digits(Uint256::zero(), whole)?
        .checked_mul(scale)
        .map_err(|_| AmountError::Overflow)?;

    let padded = format!("{:0<width$}", fraction, width = decimals as usize);
    let fraction_units = accumulate_digits(Uint256::zero(), &padded)?;

    whole_units
        .checked_add(fraction_units)
        .map(BaseUnits)
        .map_err(|_| AmountError::Overflow)
}

/// Render base units as a canonical decimal string: no leading zeros in the
/// whole part, no trailing zeros in the fraction, no dangling point
pub fn format_units(amount: BaseUnits, decimals: u8) -> Result<String, AmountError> {
    let scale = scale_factor(decimals)?;
    let whole = amount
        .0
        .checked_div(scale)
        .map_err(|_| AmountError::Overflow)?;
    let remainder = amount
        .0
        .checked_rem(scale)
        .map_err(|_| AmountError::Overflow)?;

    if remainder.is_zero() {
        return Ok(whole.to_string());
    }

    let fraction = format!("{:0>width$}", remainder.to_string(), width = decimals as usize);
    Ok(format!("{}.{}", whole, fraction.trim_end_matches('0')))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_whole_and_fraction() {
        assert_eq!(
            parse_units("0.01", 18).unwrap(),
            BaseUnits::from_u128(10_000_000_000_000_000)
        );
        assert_eq!(parse_units("10", 6).unwrap(), BaseUnits::from_u128(10_000_000));
        assert_eq!(parse_units("1.5", 6).unwrap(), BaseUnits::from_u128(1_500_000));
        assert_eq!(parse_units(".5", 1).unwrap(), BaseUnits::from_u128(5));
        assert_eq!(parse_units("7", 0).unwrap(), BaseUnits::from_u128(7));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(parse_units("", 18), Err(AmountError::Empty));
        assert_eq!(parse_units(".", 18), Err(AmountError::Empty));
        assert_eq!(parse_units("1.2.3", 18), Err(AmountError::MultipleDecimalPoints));
        assert_eq!(parse_units("-1", 18), Err(AmountError::InvalidCharacter('-')));
        assert_eq!(parse_units("1e18", 18), Err(AmountError::InvalidCharacter('e')));
        assert_eq!(parse_units("1,000", 18), Err(AmountError::InvalidCharacter(',')));
        assert_eq!(
            parse_units("0.1234567", 6),
            Err(AmountError::TooManyDecimals { found: 7, max: 6 })
        );
        assert_eq!(parse_units("1", 78), Err(AmountError::UnsupportedDecimals(78)));
    }

    #[test]
    fn test_parse_beyond_u128() {
        let big = parse_units("1000000000000000000000", 18).unwrap();
        assert_eq!(big.to_string(), "1000000000000000000000000000000000000000");
    }

    #[test]
    fn test_overflow_is_reported() {
        let too_big = format!("1{}", "0".repeat(78));
        assert_eq!(parse_units(&too_big, 0), Err(AmountError::Overflow));
    }

    #[test]
    fn test_format_canonical_round_trip() {
        let cases = [
            ("0.01", 18, "0.01"),
            ("007.500", 6, "7.5"),
            ("10", 6, "10"),
            ("10.000000", 6, "10"),
            ("0", 18, "0"),
            ("0.000001", 6, "0.000001"),
            ("123456789.123456789123456789", 18, "123456789.123456789123456789"),
            ("5.", 2, "5"),
        ];

        for (input, decimals, canonical) in cases {
            let units = parse_units(input, decimals).unwrap();
            assert_eq!(format_units(units, decimals).unwrap(), canonical, "input {input}");
        }
    }

    #[test]
    fn test_base_units_from_str() {
        assert_eq!("42".parse::<BaseUnits>().unwrap(), BaseUnits::from_u128(42));
        assert!("4.2".parse::<BaseUnits>().is_err());
        assert!("".parse::<BaseUnits>().is_err());
    }

    #[test]
    fn test_mul_bips() {
        let amount = BaseUnits::from_u128(1_000_000);
        assert_eq!(amount.mul_bips(25).unwrap(), BaseUnits::from_u128(2_500));
        assert_eq!(BaseUnits::from_u128(3).mul_bips(1).unwrap(), BaseUnits::zero());
    }
}
