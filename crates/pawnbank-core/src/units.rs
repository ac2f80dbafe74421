//! Decimal rendering of base-unit amounts.

use thiserror::Error;

use crate::types::Amount;

/// Fractional digits of one display unit.
pub const DECIMALS: u32 = 18;
/// Base units per display unit.
pub const UNIT: Amount = 1_000_000_000_000_000_000;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum UnitsError {
    #[error("empty amount")]
    Empty,
    #[error("invalid digit in amount {0:?}")]
    InvalidDigit(String),
    #[error("more than {DECIMALS} fractional digits in {0:?}")]
    TooPrecise(String),
    #[error("amount {0:?} overflows")]
    Overflow(String),
}

/// Parses `"1.5"` into `1.5 * UNIT` base units.
pub fn parse_units(input: &str) -> Result<Amount, UnitsError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(UnitsError::Empty);
    }
    let (whole, frac) = match s.split_once('.') {
        Some((w, f)) => (w, f),
        None => (s, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(UnitsError::Empty);
    }
    let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(whole) || !all_digits(frac) {
        return Err(UnitsError::InvalidDigit(s.to_string()));
    }
    if frac.len() > DECIMALS as usize {
        return Err(UnitsError::TooPrecise(s.to_string()));
    }
    let overflow = || UnitsError::Overflow(s.to_string());

    let whole_value: Amount = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| overflow())?
    };
    let mut frac_value: Amount = 0;
    if !frac.is_empty() {
        frac_value = frac.parse().map_err(|_| overflow())?;
        frac_value *= 10u128.pow(DECIMALS - frac.len() as u32);
    }
    whole_value
        .checked_mul(UNIT)
        .and_then(|v| v.checked_add(frac_value))
        .ok_or_else(overflow)
}

/// Renders base units as a decimal string, trimming trailing zeros.
pub fn format_units(amount: Amount) -> String {
    let whole = amount / UNIT;
    let frac = amount % UNIT;
    if frac == 0 {
        return whole.to_string();
    }
    let digits = format!("{:0width$}", frac, width = DECIMALS as usize);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}
