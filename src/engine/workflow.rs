//! Sell → buy → transfer workflow.
//!
//! Sells the source asset for cash, buys the intermediate asset with
//! it, then moves the intermediate asset off-platform to a fixed
//! destination. The caller only ever sees the transferred amount or
//! zero; which stage failed goes to the log, not the result.

use alloy_primitives::U256;
use chrono::Utc;
use rust_decimal::Decimal;
use std::time::Duration;
use tracing::{info, warn};

use super::poller::{poll_until, PollPolicy};
use crate::broker::{BrokerApi, OrderRequest, TransferRequest};
use crate::encoding;
use crate::types::{
    ApiResponse, Order, OrderSide, OrderStatus, RelayError, Transfer, TransferStatus,
    WorkflowResult,
};

// ---------------------------------------------------------------------------
// Plan / request
// ---------------------------------------------------------------------------

/// Fixed parameters of the workflow.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowPlan {
    pub source_symbol: String,
    pub intermediate_symbol: String,
    pub transfer_asset: String,
    pub destination_address: String,
    pub order_poll: PollPolicy,
    pub transfer_poll: PollPolicy,
}

impl Default for WorkflowPlan {
    fn default() -> Self {
        Self {
            source_symbol: "TSLA".to_string(),
            intermediate_symbol: "USDCUSD".to_string(),
            transfer_asset: "USDCUSD".to_string(),
            destination_address: "0x7358D4CDF1c468aA018ec41ddD98b44879a10962".to_string(),
            order_poll: PollPolicy::order_fill(),
            transfer_poll: PollPolicy::transfer_completion(),
        }
    }
}

impl WorkflowPlan {
    /// Sell timeout + buy timeout + transfer timeout.
    pub fn worst_case(&self) -> Duration {
        self.order_poll
            .worst_case()
            .saturating_mul(2)
            .saturating_add(self.transfer_poll.worst_case())
    }
}

/// Validated inputs of one workflow run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkflowRequest {
    sell_qty: Decimal,
    transfer_amount: Decimal,
    encoded_amount: U256,
}

impl WorkflowRequest {
    /// Both inputs must be positive and the transfer amount whole, since
    /// it is handed back verbatim as an unsigned integer.
    pub fn new(sell_qty: Decimal, transfer_amount: Decimal) -> Result<Self, RelayError> {
        if sell_qty <= Decimal::ZERO {
            return Err(RelayError::InvalidInput(format!(
                "sell quantity must be positive: {sell_qty}"
            )));
        }
        if transfer_amount <= Decimal::ZERO {
            return Err(RelayError::InvalidInput(format!(
                "transfer amount must be positive: {transfer_amount}"
            )));
        }
        let encoded_amount = encoding::decimal_to_uint256(transfer_amount)?;
        Ok(Self {
            sell_qty,
            transfer_amount,
            encoded_amount,
        })
    }
}

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

pub struct OrderTransferWorkflow<B> {
    broker: B,
    plan: WorkflowPlan,
}

impl<B: BrokerApi> OrderTransferWorkflow<B> {
    pub fn new(broker: B, plan: WorkflowPlan) -> Self {
        Self { broker, plan }
    }

    /// Run the whole workflow. Any failure collapses to the zero result.
    pub async fn run(&self, request: &WorkflowRequest) -> WorkflowResult {
        info!(
            sell_qty = %request.sell_qty,
            transfer_amount = %request.transfer_amount,
            source = %self.plan.source_symbol,
            intermediate = %self.plan.intermediate_symbol,
            "Starting sell/buy/transfer workflow"
        );

        match self.execute(request).await {
            Ok(transfer) => {
                info!(transfer = %transfer, "Workflow complete");
                WorkflowResult::success(request.encoded_amount)
            }
            Err(e) => {
                warn!(error = %e, kind = ?e.kind(), "Workflow failed, returning zero");
                WorkflowResult::failure()
            }
        }
    }

    async fn execute(&self, request: &WorkflowRequest) -> Result<Transfer, RelayError> {
        let sold = self
            .trade(&self.plan.source_symbol, request.sell_qty, OrderSide::Sell)
            .await?;
        info!(order = %sold, "Sell leg filled");

        // The buy leg reuses the sell quantity rather than sizing from
        // the sale proceeds.
        let bought = self
            .trade(&self.plan.intermediate_symbol, request.sell_qty, OrderSide::Buy)
            .await?;
        info!(order = %bought, "Buy leg filled");

        let transfer = self.send_transfer(request.transfer_amount).await?;
        self.wait_for_transfer(transfer).await
    }

    /// Place one order and wait for it to fill, cancelling on timeout.
    async fn trade(
        &self,
        symbol: &str,
        qty: Decimal,
        side: OrderSide,
    ) -> Result<Order, RelayError> {
        let order = self.place_order(symbol, qty, side).await?;
        if order.status != OrderStatus::Accepted {
            return Err(RelayError::NotAccepted {
                order_id: order.id,
                status: order.status,
            });
        }

        match self.wait_for_fill(order.clone()).await {
            Ok(filled) => Ok(filled),
            Err(e @ RelayError::Timeout { .. }) => {
                // Best effort: the result is zero whatever the cancel says.
                match self.cancel_order(&order.id).await {
                    Ok(status) => info!(order_id = %order.id, status, "Cancel requested"),
                    Err(cancel_err) => {
                        warn!(order_id = %order.id, error = %cancel_err, "Cancel failed")
                    }
                }
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    // -- Broker operations -----------------------------------------------

    /// Place a market gtc order. Fails unless the brokerage answers 200.
    pub async fn place_order(
        &self,
        symbol: &str,
        qty: Decimal,
        side: OrderSide,
    ) -> Result<Order, RelayError> {
        let request = OrderRequest::market(symbol, qty, side);
        let placed = self
            .broker
            .place_order(&request)
            .await?
            .into_body("POST /v2/orders")?;

        let order = Order {
            id: placed.client_order_id,
            symbol: symbol.to_string(),
            qty,
            side,
            status: placed.status,
            placed_at: Utc::now(),
        };
        info!(order = %order, "Order placed");
        Ok(order)
    }

    /// Request cancellation; returns the raw HTTP status.
    pub async fn cancel_order(&self, order_id: &str) -> Result<u16, RelayError> {
        self.broker.cancel_order(order_id).await
    }

    /// Poll until the order reports `filled`.
    ///
    /// Only `filled` ends the loop early; a rejected or cancelled order
    /// keeps being polled until the cap.
    pub async fn wait_for_fill(&self, mut order: Order) -> Result<Order, RelayError> {
        let broker = &self.broker;
        let order_id = order.id.as_str();
        let status = poll_until(
            self.plan.order_poll,
            "order fill",
            move |_| async move {
                polled_status(
                    broker.order_status(order_id).await,
                    "GET /v2/orders/{id}",
                    |state| state.status,
                )
            },
            |status| *status == OrderStatus::Filled,
        )
        .await?;

        order.status = status;
        Ok(order)
    }

    /// Start the transfer of `amount` to the plan's destination.
    pub async fn send_transfer(&self, amount: Decimal) -> Result<Transfer, RelayError> {
        let request = TransferRequest {
            amount: amount.to_string(),
            address: self.plan.destination_address.clone(),
            asset: self.plan.transfer_asset.clone(),
        };
        let created = self
            .broker
            .create_transfer(&request)
            .await?
            .into_body("POST /v2/wallets/transfers")?;

        let transfer = Transfer {
            id: created.id,
            amount,
            address: request.address,
            asset: request.asset,
            status: TransferStatus::Pending,
            initiated_at: Utc::now(),
        };
        info!(transfer = %transfer, "Transfer initiated");
        Ok(transfer)
    }

    /// Poll until the transfer reports `completed`. Transfers are never
    /// cancelled; running out of attempts is simply a failure.
    pub async fn wait_for_transfer(&self, mut transfer: Transfer) -> Result<Transfer, RelayError> {
        let broker = &self.broker;
        let transfer_id = transfer.id.as_str();
        let status = poll_until(
            self.plan.transfer_poll,
            "transfer completion",
            move |_| async move {
                // A transfer that completed but then polls non-200 reads
                // as a failure here.
                polled_status(
                    broker.transfer_status(transfer_id).await,
                    "GET /v2/wallets/transfers/{id}",
                    |state| state.status,
                )
            },
            TransferStatus::is_terminal,
        )
        .await?;

        transfer.status = status;
        Ok(transfer)
    }
}

/// Status read by one poll. Only a non-200 answer or a transport error
/// ends the loop; a 200 body that does not decode is an unknown status.
fn polled_status<T, S: Default>(
    answer: Result<ApiResponse<T>, RelayError>,
    endpoint: &str,
    status: impl FnOnce(T) -> S,
) -> Result<S, RelayError> {
    match answer {
        Err(RelayError::Decode { message, .. }) => {
            warn!(endpoint, error = %message, "Unreadable status body, polling on");
            Ok(S::default())
        }
        answer => answer?.into_body(endpoint).map(status),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
