use alloy::primitives::{Bytes, U256};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("enter an amount")]
    Empty,
    #[error("'{0}' is not a number")]
    InvalidDigit(String),
    #[error("at most {0} decimal places")]
    TooPrecise(usize),
    #[error("amount does not fit in 256 bits")]
    Overflow,
}

/// Decimal digits in `U256::MAX`.
const MAX_DIGITS: usize = 78;

/// Renders a fixed-point integer with `decimals` digits after the point,
/// e.g. `1500` at 3 decimals is `1.500`.
/// Zero past 78 decimals prints as `0`.
pub fn format_fixed(value: U256, decimals: usize) -> String {
    let digits = value.to_string();
    if decimals == 0 || (value.is_zero() && decimals > MAX_DIGITS) {
        return digits;
    }
    if digits.len() > decimals {
        let (whole, fraction) = digits.split_at(digits.len() - decimals);
        return format!("{whole}.{fraction}");
    }
    format!("0.{}{digits}", "0".repeat(decimals - digits.len()))
}

/// Parses user text into a fixed-point integer scaled by `10^decimals`.
/// Exact: no float round trip.
pub fn parse_fixed(text: &str, decimals: usize) -> Result<U256, AmountError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(AmountError::Empty);
    }
    let (whole, fraction) = match text.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (text, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return Err(AmountError::InvalidDigit(text.to_string()));
    }
    if !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
        return Err(AmountError::InvalidDigit(text.to_string()));
    }
    if fraction.len() > decimals {
        return Err(AmountError::TooPrecise(decimals));
    }

    let digits = format!("{whole}{fraction}");
    let significant = digits.trim_start_matches('0');
    if significant.is_empty() {
        return Ok(U256::ZERO);
    }
    let padding = decimals - fraction.len();
    if significant.len().saturating_add(padding) > MAX_DIGITS {
        return Err(AmountError::Overflow);
    }
    let scaled = format!("{significant}{}", "0".repeat(padding));
    U256::from_str_radix(&scaled, 10).map_err(|_| AmountError::Overflow)
}

/// ABI encoding of a `uint256` input value: 32 bytes, big-endian.
pub fn encode_uint(value: U256) -> Bytes {
    Bytes::from(value.to_be_bytes::<32>().to_vec())
}

pub fn decode_uint(raw: &[u8]) -> Option<U256> {
    U256::try_from_be_slice(raw)
}
