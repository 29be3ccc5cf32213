//! Shared types for the RELAY workflow.
//!
//! Orders and transfers are owned by the brokerage; the local workflow
//! only creates them and reads their status back through polling.

use alloy_primitives::U256;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::encoding;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Order direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "buy"),
            OrderSide::Sell => write!(f, "sell"),
        }
    }
}

/// Parse a side string (case-insensitive).
impl std::str::FromStr for OrderSide {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "buy" => Ok(OrderSide::Buy),
            "sell" => Ok(OrderSide::Sell),
            other => Err(RelayError::InvalidInput(format!("unknown order side: {other}"))),
        }
    }
}

/// Brokerage order status.
///
/// Anything the brokerage reports that we do not act on collapses
/// into `Other`, and so does a missing status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[serde(alias = "new", alias = "pending_new")]
    Pending,
    Accepted,
    Filled,
    Rejected,
    #[serde(alias = "canceled")]
    Cancelled,
    #[default]
    #[serde(other)]
    Other,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "pending"),
            OrderStatus::Accepted => write!(f, "accepted"),
            OrderStatus::Filled => write!(f, "filled"),
            OrderStatus::Rejected => write!(f, "rejected"),
            OrderStatus::Cancelled => write!(f, "cancelled"),
            OrderStatus::Other => write!(f, "other"),
        }
    }
}

/// Wallet transfer status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    Pending,
    Completed,
    #[default]
    #[serde(other)]
    Other,
}

impl TransferStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferStatus::Completed)
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferStatus::Pending => write!(f, "pending"),
            TransferStatus::Completed => write!(f, "completed"),
            TransferStatus::Other => write!(f, "other"),
        }
    }
}

// ---------------------------------------------------------------------------
// Order / Transfer
// ---------------------------------------------------------------------------

/// A market order placed on the brokerage.
#[derive(Debug, Clone)]
pub struct Order {
    /// Client order id returned at placement; used as the polling key.
    pub id: String,
    pub symbol: String,
    pub qty: Decimal,
    pub side: OrderSide,
    pub status: OrderStatus,
    pub placed_at: DateTime<Utc>,
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} [{}] ({})",
            self.side, self.qty, self.symbol, self.status, self.id
        )
    }
}

/// An outbound wallet transfer.
#[derive(Debug, Clone)]
pub struct Transfer {
    pub id: String,
    pub amount: Decimal,
    pub address: String,
    pub asset: String,
    pub status: TransferStatus,
    pub initiated_at: DateTime<Utc>,
}

impl fmt::Display for Transfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} -> {} [{}] ({})",
            self.amount, self.asset, self.address, self.status, self.id
        )
    }
}

// ---------------------------------------------------------------------------
// API response envelope
// ---------------------------------------------------------------------------

/// HTTP status plus decoded body.
///
/// The body is only decoded for a 200 response; callers decide what a
/// non-200 status means for them.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse<T> {
    pub status: u16,
    pub body: Option<T>,
}

impl<T> ApiResponse<T> {
    pub const OK: u16 = 200;

    pub fn new(status: u16, body: Option<T>) -> Self {
        Self { status, body }
    }

    /// A 200 response carrying `body`.
    pub fn ok(body: T) -> Self {
        Self::new(Self::OK, Some(body))
    }

    /// A bodiless response with the given status.
    pub fn status_only(status: u16) -> Self {
        Self::new(status, None)
    }

    pub fn is_ok(&self) -> bool {
        self.status == Self::OK
    }

    /// Take the body of a 200 response, or fail with the status.
    pub fn into_body(self, endpoint: &str) -> Result<T, RelayError> {
        if !self.is_ok() {
            return Err(RelayError::RemoteStatus {
                endpoint: endpoint.to_string(),
                status: self.status,
            });
        }
        self.body.ok_or_else(|| RelayError::Decode {
            endpoint: endpoint.to_string(),
            message: "empty response body".to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Workflow result
// ---------------------------------------------------------------------------

/// The single value handed back to the on-chain consumer.
///
/// Zero means the workflow failed somewhere; any other value is the
/// amount that was transferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowResult(U256);

impl WorkflowResult {
    pub fn failure() -> Self {
        Self(U256::ZERO)
    }

    pub fn success(amount: U256) -> Self {
        Self(amount)
    }

    pub fn is_failure(&self) -> bool {
        self.0.is_zero()
    }

    pub fn value(&self) -> U256 {
        self.0
    }

    /// 32-byte big-endian encoding.
    pub fn encode(&self) -> [u8; encoding::WORD_LEN] {
        encoding::encode_uint256(self.0)
    }

    pub fn to_hex(&self) -> String {
        encoding::to_hex(&self.encode())
    }
}

impl fmt::Display for WorkflowResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Coarse classification of a `RelayError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad credentials, config or input. Raised before any request.
    Configuration,
    /// A remote call failed or answered with something unusable.
    RemoteRequest,
    /// A polling cap ran out.
    Timeout,
}

/// Domain-specific error types for RELAY.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Remote request failed ({endpoint}): HTTP {status}")]
    RemoteStatus { endpoint: String, status: u16 },

    #[error("Remote request failed ({endpoint}): {message}")]
    Transport { endpoint: String, message: String },

    #[error("Unexpected response ({endpoint}): {message}")]
    Decode { endpoint: String, message: String },

    #[error("Order {order_id} not accepted: status {status}")]
    NotAccepted { order_id: String, status: OrderStatus },

    #[error("Timed out waiting for {what} after {attempts} attempts")]
    Timeout { what: String, attempts: u32 },
}

impl RelayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RelayError::Config(_) | RelayError::InvalidInput(_) => ErrorKind::Configuration,
            RelayError::RemoteStatus { .. }
            | RelayError::Transport { .. }
            | RelayError::Decode { .. }
            | RelayError::NotAccepted { .. } => ErrorKind::RemoteRequest,
            RelayError::Timeout { .. } => ErrorKind::Timeout,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
