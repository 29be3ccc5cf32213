//! uint256 result encoding.
//!
//! The on-chain consumer reads a single 32-byte big-endian word. These
//! helpers turn decimal amounts into that word and back.

use alloy_primitives::{hex, U256};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::types::RelayError;

/// Width of an encoded word in bytes.
pub const WORD_LEN: usize = 32;

/// Big-endian 32-byte encoding of `value`.
pub fn encode_uint256(value: U256) -> [u8; WORD_LEN] {
    value.to_be_bytes::<WORD_LEN>()
}

/// Decode a 32-byte big-endian word.
pub fn decode_uint256(bytes: &[u8]) -> Result<U256, RelayError> {
    if bytes.len() != WORD_LEN {
        return Err(RelayError::InvalidInput(format!(
            "expected {WORD_LEN} bytes, got {}",
            bytes.len()
        )));
    }
    U256::try_from_be_slice(bytes)
        .ok_or_else(|| RelayError::InvalidInput("word does not fit in uint256".into()))
}

/// `0x`-prefixed lowercase hex.
pub fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Parse `0x`-prefixed (or bare) hex into a uint256.
pub fn decode_hex(s: &str) -> Result<U256, RelayError> {
    let bytes = hex::decode(s.trim_start_matches("0x"))
        .map_err(|e| RelayError::InvalidInput(format!("invalid hex: {e}")))?;
    decode_uint256(&bytes)
}

/// Convert a non-negative whole decimal into a uint256.
///
/// `100.00` is accepted; `100.5` and negatives are not.
pub fn decimal_to_uint256(value: Decimal) -> Result<U256, RelayError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(RelayError::InvalidInput(format!("negative amount: {value}")));
    }
    let normalized = value.normalize();
    if normalized.scale() != 0 {
        return Err(RelayError::InvalidInput(format!(
            "amount must be a whole number: {value}"
        )));
    }
    let mantissa = u128::try_from(normalized.mantissa())
        .map_err(|_| RelayError::InvalidInput(format!("amount out of range: {value}")))?;
    Ok(U256::from(mantissa))
}

/// Scale `value` by `10^decimals`, rounding half away from zero, into a
/// uint256. Used for fixed-point balances (18 decimals).
pub fn scale_to_uint256(value: Decimal, decimals: u32) -> Result<U256, RelayError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(RelayError::InvalidInput(format!("negative amount: {value}")));
    }
    let rounded = value
        .round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    let mantissa = u128::try_from(rounded.mantissa())
        .map_err(|_| RelayError::InvalidInput(format!("amount out of range: {value}")))?;
    // rounded.scale() <= decimals after round_dp
    let shift = U256::from(decimals - rounded.scale());
    U256::from(10u64)
        .checked_pow(shift)
        .and_then(|factor| U256::from(mantissa).checked_mul(factor))
        .ok_or_else(|| RelayError::InvalidInput(format!("amount overflows uint256: {value}")))
}
