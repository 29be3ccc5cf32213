//! Scripted brokerage for integration testing.
//!
//! Provides a deterministic `BrokerApi` implementation: each endpoint
//! replays a queue of canned responses and every call is recorded so
//! tests can assert on exactly what went over the wire.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use broker_relay::broker::{
    AccountSnapshot, BrokerApi, CreatedTransfer, OrderRequest, OrderState, PlacedOrder,
    TransferRequest, TransferState,
};
use broker_relay::types::{ApiResponse, OrderStatus, RelayError, TransferStatus};

/// One recorded call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    PlaceOrder(OrderRequest),
    OrderStatus(String),
    CancelOrder(String),
    CreateTransfer(TransferRequest),
    TransferStatus(String),
    Account,
}

#[derive(Default)]
struct Script {
    placements: VecDeque<ApiResponse<PlacedOrder>>,
    order_statuses: VecDeque<ApiResponse<OrderState>>,
    cancel_status: Option<u16>,
    transfers: VecDeque<ApiResponse<CreatedTransfer>>,
    transfer_statuses: VecDeque<ApiResponse<TransferState>>,
    account: Option<ApiResponse<AccountSnapshot>>,
}

/// A brokerage whose answers are fully controlled by test code.
///
/// When a status queue runs dry the broker keeps answering 200 with a
/// non-terminal status, so "never fills" needs no scripting at all.
#[derive(Clone, Default)]
pub struct ScriptedBroker {
    script: Arc<Mutex<Script>>,
    calls: Arc<Mutex<Vec<Call>>>,
}

impl ScriptedBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a placement answer: HTTP 200 with the given id and status.
    pub fn place_ok(&self, id: &str, status: OrderStatus) -> &Self {
        self.script.lock().unwrap().placements.push_back(ApiResponse::ok(PlacedOrder {
            client_order_id: id.to_string(),
            status,
        }));
        self
    }

    pub fn place_status(&self, http_status: u16) -> &Self {
        self.script
            .lock()
            .unwrap()
            .placements
            .push_back(ApiResponse::status_only(http_status));
        self
    }

    /// Queue `times` order-status answers of `status`.
    pub fn order_polls(&self, status: OrderStatus, times: usize) -> &Self {
        let mut script = self.script.lock().unwrap();
        for _ in 0..times {
            script.order_statuses.push_back(ApiResponse::ok(OrderState { status }));
        }
        self
    }

    /// Queue `times` HTTP 200 order-status answers carrying a raw JSON body.
    pub fn order_polls_body(&self, body: &str, times: usize) -> &Self {
        let state: OrderState = serde_json::from_str(body).unwrap();
        let mut script = self.script.lock().unwrap();
        for _ in 0..times {
            script.order_statuses.push_back(ApiResponse::ok(state.clone()));
        }
        self
    }

    pub fn order_poll_status(&self, http_status: u16) -> &Self {
        self.script
            .lock()
            .unwrap()
            .order_statuses
            .push_back(ApiResponse::status_only(http_status));
        self
    }

    pub fn cancel_answers(&self, http_status: u16) -> &Self {
        self.script.lock().unwrap().cancel_status = Some(http_status);
        self
    }

    pub fn transfer_ok(&self, id: &str) -> &Self {
        self.script
            .lock()
            .unwrap()
            .transfers
            .push_back(ApiResponse::ok(CreatedTransfer { id: id.to_string() }));
        self
    }

    pub fn transfer_create_status(&self, http_status: u16) -> &Self {
        self.script
            .lock()
            .unwrap()
            .transfers
            .push_back(ApiResponse::status_only(http_status));
        self
    }

    pub fn transfer_polls(&self, status: TransferStatus, times: usize) -> &Self {
        let mut script = self.script.lock().unwrap();
        for _ in 0..times {
            script
                .transfer_statuses
                .push_back(ApiResponse::ok(TransferState { status }));
        }
        self
    }

    pub fn transfer_poll_status(&self, http_status: u16) -> &Self {
        self.script
            .lock()
            .unwrap()
            .transfer_statuses
            .push_back(ApiResponse::status_only(http_status));
        self
    }

    pub fn account_value(&self, value: &str) -> &Self {
        self.script.lock().unwrap().account = Some(ApiResponse::ok(AccountSnapshot {
            portfolio_value: Some(value.to_string()),
        }));
        self
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl BrokerApi for ScriptedBroker {
    async fn place_order(
        &self,
        request: &OrderRequest,
    ) -> Result<ApiResponse<PlacedOrder>, RelayError> {
        self.record(Call::PlaceOrder(request.clone()));
        self.script
            .lock()
            .unwrap()
            .placements
            .pop_front()
            .ok_or_else(|| RelayError::Transport {
                endpoint: "POST /v2/orders".into(),
                message: "no scripted placement".into(),
            })
    }

    async fn order_status(&self, order_id: &str) -> Result<ApiResponse<OrderState>, RelayError> {
        self.record(Call::OrderStatus(order_id.to_string()));
        Ok(self
            .script
            .lock()
            .unwrap()
            .order_statuses
            .pop_front()
            .unwrap_or_else(|| ApiResponse::ok(OrderState { status: OrderStatus::Accepted })))
    }

    async fn cancel_order(&self, order_id: &str) -> Result<u16, RelayError> {
        self.record(Call::CancelOrder(order_id.to_string()));
        Ok(self.script.lock().unwrap().cancel_status.unwrap_or(204))
    }

    async fn create_transfer(
        &self,
        request: &TransferRequest,
    ) -> Result<ApiResponse<CreatedTransfer>, RelayError> {
        self.record(Call::CreateTransfer(request.clone()));
        self.script
            .lock()
            .unwrap()
            .transfers
            .pop_front()
            .ok_or_else(|| RelayError::Transport {
                endpoint: "POST /v2/wallets/transfers".into(),
                message: "no scripted transfer".into(),
            })
    }

    async fn transfer_status(
        &self,
        transfer_id: &str,
    ) -> Result<ApiResponse<TransferState>, RelayError> {
        self.record(Call::TransferStatus(transfer_id.to_string()));
        Ok(self
            .script
            .lock()
            .unwrap()
            .transfer_statuses
            .pop_front()
            .unwrap_or_else(|| ApiResponse::ok(TransferState { status: TransferStatus::Pending })))
    }

    async fn account(&self) -> Result<ApiResponse<AccountSnapshot>, RelayError> {
        self.record(Call::Account);
        Ok(self
            .script
            .lock()
            .unwrap()
            .account
            .clone()
            .unwrap_or_else(|| ApiResponse::status_only(404)))
    }
}
