//! Brokerage integration.
//!
//! Defines the `BrokerApi` trait and the wire types of the brokerage REST
//! API. The only implementation is Alpaca (paper or live endpoint).

pub mod alpaca;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::types::{ApiResponse, OrderSide, OrderStatus, RelayError, TransferStatus};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Body of `POST /v2/orders`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderRequest {
    pub side: OrderSide,
    #[serde(rename = "type")]
    pub order_type: String,
    pub time_in_force: String,
    pub symbol: String,
    pub qty: String,
}

impl OrderRequest {
    /// A good-till-cancelled market order.
    pub fn market(symbol: &str, qty: Decimal, side: OrderSide) -> Self {
        Self {
            side,
            order_type: "market".to_string(),
            time_in_force: "gtc".to_string(),
            symbol: symbol.to_string(),
            qty: qty.to_string(),
        }
    }
}

/// Response of `POST /v2/orders`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlacedOrder {
    pub client_order_id: String,
    pub status: OrderStatus,
}

/// Response of `GET /v2/orders/{id}`.
///
/// A 200 body without a readable `status` still counts as an answer;
/// the status reads as `Other` and polling carries on.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OrderState {
    #[serde(default, deserialize_with = "status_or_default")]
    pub status: OrderStatus,
}

/// Body of `POST /v2/wallets/transfers`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferRequest {
    pub amount: String,
    pub address: String,
    pub asset: String,
}

/// Response of `POST /v2/wallets/transfers`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreatedTransfer {
    pub id: String,
}

/// Response of `GET /v2/wallets/transfers/{id}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TransferState {
    #[serde(default, deserialize_with = "status_or_default")]
    pub status: TransferStatus,
}

/// Response of `GET /v2/account`. Alpaca reports money as strings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AccountSnapshot {
    #[serde(default)]
    pub portfolio_value: Option<String>,
}

/// Null or non-string status values fall back to the default.
fn status_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(raw).unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Abstraction over the brokerage REST API.
///
/// Every call resolves to the HTTP status plus the decoded body; only
/// transport failures and undecodable 200 bodies are errors here. What a
/// non-200 status means is left to the caller.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BrokerApi: Send + Sync {
    /// `POST /v2/orders`
    async fn place_order(&self, request: &OrderRequest)
        -> Result<ApiResponse<PlacedOrder>, RelayError>;

    /// `GET /v2/orders/{id}`
    async fn order_status(&self, order_id: &str) -> Result<ApiResponse<OrderState>, RelayError>;

    /// `DELETE /v2/orders/{id}`; only the status code is meaningful.
    async fn cancel_order(&self, order_id: &str) -> Result<u16, RelayError>;

    /// `POST /v2/wallets/transfers`
    async fn create_transfer(
        &self,
        request: &TransferRequest,
    ) -> Result<ApiResponse<CreatedTransfer>, RelayError>;

    /// `GET /v2/wallets/transfers/{id}`
    async fn transfer_status(
        &self,
        transfer_id: &str,
    ) -> Result<ApiResponse<TransferState>, RelayError>;

    /// `GET /v2/account`
    async fn account(&self) -> Result<ApiResponse<AccountSnapshot>, RelayError>;
}
