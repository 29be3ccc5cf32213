//! Portfolio balance probe.
//!
//! Reads the account's portfolio value and hands it back as an 18-decimal
//! fixed-point uint256, the same word layout the workflow uses.

use alloy_primitives::U256;
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::info;

use crate::broker::BrokerApi;
use crate::encoding;
use crate::types::RelayError;

/// Fixed-point decimals of the encoded balance.
pub const BALANCE_DECIMALS: u32 = 18;

const ENDPOINT: &str = "GET /v2/account";

/// Current portfolio value as reported by the brokerage.
pub async fn portfolio_value<B: BrokerApi + ?Sized>(broker: &B) -> Result<Decimal, RelayError> {
    let account = broker.account().await?.into_body(ENDPOINT)?;
    let raw = account.portfolio_value.ok_or_else(|| RelayError::Decode {
        endpoint: ENDPOINT.to_string(),
        message: "missing portfolio_value".to_string(),
    })?;
    let value = Decimal::from_str(raw.trim()).map_err(|e| RelayError::Decode {
        endpoint: ENDPOINT.to_string(),
        message: format!("portfolio_value {raw:?} is not a number: {e}"),
    })?;

    info!(portfolio_value = %value, "Portfolio balance");
    Ok(value)
}

/// Portfolio value scaled by 10^18 and rounded.
pub async fn encoded_portfolio_balance<B: BrokerApi + ?Sized>(
    broker: &B,
) -> Result<U256, RelayError> {
    let value = portfolio_value(broker).await?;
    encoding::scale_to_uint256(value, BALANCE_DECIMALS)
}
