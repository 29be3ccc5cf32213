//! Alpaca brokerage REST client.
//!
//! API docs: https://docs.alpaca.markets/reference
//! Paper base URL: https://paper-api.alpaca.markets
//! Auth: `APCA-API-KEY-ID` / `APCA-API-SECRET-KEY` headers on every call.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use super::{
    AccountSnapshot, BrokerApi, CreatedTransfer, OrderRequest, OrderState, PlacedOrder,
    TransferRequest, TransferState,
};
use crate::config::{BrokerConfig, Credentials};
use crate::types::{ApiResponse, RelayError};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const KEY_HEADER: &str = "APCA-API-KEY-ID";
const SECRET_HEADER: &str = "APCA-API-SECRET-KEY";

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Alpaca REST client.
pub struct AlpacaClient {
    http: Client,
    base_url: String,
    credentials: Credentials,
}

impl AlpacaClient {
    /// Create a client for `base_url` with the given timeout.
    pub fn new(
        base_url: &str,
        credentials: Credentials,
        timeout: Duration,
    ) -> Result<Self, RelayError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent("RELAY/0.1.0 (order-transfer-workflow)")
            .build()
            .map_err(|e| RelayError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    pub fn from_config(config: &BrokerConfig, credentials: Credentials) -> Result<Self, RelayError> {
        Self::new(
            &config.base_url,
            credentials,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // -- Internal helpers ------------------------------------------------

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("accept", "application/json")
            .header(KEY_HEADER, self.credentials.key())
            .header(SECRET_HEADER, self.credentials.secret())
    }

    /// Send a request and decode the body of a 200 response.
    async fn send<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        endpoint: &str,
    ) -> Result<ApiResponse<T>, RelayError> {
        let resp = self
            .authed(builder)
            .send()
            .await
            .map_err(|e| RelayError::Transport {
                endpoint: endpoint.to_string(),
                message: e.to_string(),
            })?;

        let status = resp.status().as_u16();
        debug!(endpoint, status, "Alpaca response");

        if status != ApiResponse::<T>::OK {
            let body = resp.text().await.unwrap_or_default();
            warn!(endpoint, status, body = %body, "Alpaca returned non-200 status");
            return Ok(ApiResponse::status_only(status));
        }

        let body: T = resp.json().await.map_err(|e| RelayError::Decode {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })?;

        Ok(ApiResponse::ok(body))
    }
}

// ---------------------------------------------------------------------------
// BrokerApi trait implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl BrokerApi for AlpacaClient {
    async fn place_order(
        &self,
        request: &OrderRequest,
    ) -> Result<ApiResponse<PlacedOrder>, RelayError> {
        debug!(
            symbol = %request.symbol,
            qty = %request.qty,
            side = %request.side,
            "Placing Alpaca order"
        );
        let builder = self
            .http
            .post(self.url("/v2/orders"))
            .header("content-type", "application/json")
            .json(request);
        self.send(builder, "POST /v2/orders").await
    }

    async fn order_status(&self, order_id: &str) -> Result<ApiResponse<OrderState>, RelayError> {
        let path = format!("/v2/orders/{}", urlencoding::encode(order_id));
        let builder = self.http.get(self.url(&path));
        self.send(builder, "GET /v2/orders/{id}").await
    }

    async fn cancel_order(&self, order_id: &str) -> Result<u16, RelayError> {
        let path = format!("/v2/orders/{}", urlencoding::encode(order_id));
        let resp = self
            .authed(self.http.delete(self.url(&path)))
            .send()
            .await
            .map_err(|e| RelayError::Transport {
                endpoint: "DELETE /v2/orders/{id}".to_string(),
                message: e.to_string(),
            })?;
        Ok(resp.status().as_u16())
    }

    async fn create_transfer(
        &self,
        request: &TransferRequest,
    ) -> Result<ApiResponse<CreatedTransfer>, RelayError> {
        let builder = self
            .http
            .post(self.url("/v2/wallets/transfers"))
            .header("content-type", "application/json")
            .json(request);
        self.send(builder, "POST /v2/wallets/transfers").await
    }

    async fn transfer_status(
        &self,
        transfer_id: &str,
    ) -> Result<ApiResponse<TransferState>, RelayError> {
        let path = format!("/v2/wallets/transfers/{}", urlencoding::encode(transfer_id));
        let builder = self.http.get(self.url(&path));
        self.send(builder, "GET /v2/wallets/transfers/{id}").await
    }

    async fn account(&self) -> Result<ApiResponse<AccountSnapshot>, RelayError> {
        let builder = self.http.get(self.url("/v2/account"));
        self.send(builder, "GET /v2/account").await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
