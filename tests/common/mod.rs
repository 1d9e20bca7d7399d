//! Shared utilities for integration testing.
#![allow(dead_code)]

use async_trait::async_trait;
use axum::extract::{RawQuery, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use chrono::NaiveDate;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::net::TcpListener;

use settlement_relay::accounts::FixedClock;
use settlement_relay::ledger::{
    Checkpoint, Commitment, Confirmation, HoldingAccount, LedgerRpc, Pubkey, RpcError, RpcResult,
    SendOptions, TokenAmount,
};
use settlement_relay::resilience::{ConnectionCache, Connector, HttpConnector};
use settlement_relay::{Relay, RelayConfig, RelayError};
use solana_sdk::signature::Signature;

pub const WALLET: &str = "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM";
pub const MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";
pub const BLOCKHASH: &str = "EkSnNWid2cvwEVnVx9aBqawnmiCNiDgp3gUdkDPTKN1N";
pub const HOLDING: &str = "4Nd1mBQtrMJVYVfKf2PJy9NZUZdTAsp7D4xWLs4gDB4T";

pub fn date(month: u32, day: u32) -> FixedClock {
    FixedClock(NaiveDate::from_ymd_opt(2025, month, day).unwrap())
}

/// Ordinary working day, outside the holiday window.
pub fn workday() -> FixedClock {
    date(3, 14)
}

/// Valid config for tests: 1 ms backoff, short deadlines.
pub fn config(endpoint: &str) -> RelayConfig {
    let mut config = RelayConfig::default();
    config.rpc.endpoint = endpoint.to_string();
    config.rpc.api_key = Some("test-key".to_string());
    config.rpc.request_timeout_ms = 200;
    config.rpc.confirmation_poll_ms = 10;
    config.asset.mint = MINT.to_string();
    config.retries.backoff_unit_ms = 1;
    config.settlement.confirmation_timeout_secs = 2;
    config
}

/// Valid legacy transaction with one signature of `signature_byte`s.
pub fn signed_transaction(signature_byte: u8) -> Vec<u8> {
    let mut tx = vec![1u8];
    tx.extend([signature_byte; 64]);
    tx.extend([1u8, 0, 1]);
    tx.push(3);
    tx.extend([7u8; 32]);
    tx.extend([8u8; 32]);
    tx.extend([9u8; 32]);
    tx.extend([5u8; 32]);
    tx.push(1);
    tx.push(2);
    tx.push(2);
    tx.extend([0u8, 1]);
    tx.push(9);
    tx.extend([8u8, 0, 0, 0, 0, 0, 0, 0, 42]);
    tx
}

pub fn encoded_transaction(signature_byte: u8) -> String {
    use base64::Engine as _;
    base64::engine::general_purpose::STANDARD.encode(signed_transaction(signature_byte))
}

pub fn signature_of(signature_byte: u8) -> String {
    Signature::from([signature_byte; 64]).to_string()
}

// ---------------------------------------------------------------------------
// In-memory ledger
// ---------------------------------------------------------------------------

/// Scripted ledger counting every call.
#[derive(Default)]
pub struct MockLedger {
    holdings: Mutex<Vec<HoldingAccount>>,
    transient_failures: AtomicU32,
    fatal_lists: AtomicU32,
    sends: Mutex<VecDeque<RpcResult<String>>>,
    confirmations: Mutex<VecDeque<RpcResult<Confirmation>>>,
    pub lists: AtomicU32,
    pub checkpoints: AtomicU32,
    pub sent: AtomicU32,
    pub confirms: AtomicU32,
}

impl MockLedger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn hold(&self, ui_amount: f64) {
        let index = self.holdings.lock().unwrap().len() as u8;
        self.holdings.lock().unwrap().push(HoldingAccount {
            address: Pubkey::new_from_array([index + 1; 32]),
            amount: TokenAmount {
                raw: ((ui_amount * 100.0) as u64).to_string(),
                decimals: 2,
                ui_amount,
            },
        });
    }

    /// Next `n` holdings queries fail with a request timeout.
    pub fn fail_transiently(&self, n: u32) {
        self.transient_failures.store(n, Ordering::SeqCst);
    }

    /// Next `n` holdings queries fail with a JSON-RPC error.
    pub fn fail_fatally(&self, n: u32) {
        self.fatal_lists.store(n, Ordering::SeqCst);
    }

    pub fn script_send(&self, result: RpcResult<String>) {
        self.sends.lock().unwrap().push_back(result);
    }

    pub fn script_confirmation(&self, result: RpcResult<Confirmation>) {
        self.confirmations.lock().unwrap().push_back(result);
    }

    pub fn remote_calls(&self) -> u32 {
        self.lists.load(Ordering::SeqCst)
            + self.checkpoints.load(Ordering::SeqCst)
            + self.sent.load(Ordering::SeqCst)
            + self.confirms.load(Ordering::SeqCst)
    }

    pub fn connector(self: &Arc<Self>) -> Arc<dyn Connector> {
        let ledger = self.clone();
        Arc::new(move || -> Result<Arc<dyn LedgerRpc>, RelayError> {
            Ok(ledger.clone() as Arc<dyn LedgerRpc>)
        })
    }

    pub fn cache(self: &Arc<Self>) -> Arc<ConnectionCache> {
        Arc::new(ConnectionCache::new(self.connector()))
    }

    pub fn relay(self: &Arc<Self>, clock: FixedClock) -> Relay {
        Relay::with_parts(&config("http://127.0.0.1:1/"), self.connector(), Arc::new(clock))
            .unwrap()
    }
}

fn take_one(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

#[async_trait]
impl LedgerRpc for MockLedger {
    async fn list_holding_accounts(
        &self,
        _owner: &Pubkey,
        _mint: &Pubkey,
        _commitment: Commitment,
    ) -> RpcResult<Vec<HoldingAccount>> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        if take_one(&self.transient_failures) {
            return Err(RpcError::Timeout(10_000));
        }
        if take_one(&self.fatal_lists) {
            return Err(RpcError::Rpc {
                code: -32602,
                message: "Invalid param: could not find mint".into(),
                data: None,
            });
        }
        Ok(self.holdings.lock().unwrap().clone())
    }

    async fn latest_checkpoint(&self, _commitment: Commitment) -> RpcResult<Checkpoint> {
        self.checkpoints.fetch_add(1, Ordering::SeqCst);
        Ok(Checkpoint {
            blockhash: BLOCKHASH.to_string(),
            last_valid_block_height: 150,
        })
    }

    async fn send_transaction(&self, _wire: &[u8], _options: &SendOptions) -> RpcResult<String> {
        self.sent.fetch_add(1, Ordering::SeqCst);
        self.sends
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(RpcError::Request("unscripted send".into())))
    }

    async fn await_confirmation(
        &self,
        _signature: &str,
        _commitment: Commitment,
    ) -> RpcResult<Confirmation> {
        self.confirms.fetch_add(1, Ordering::SeqCst);
        self.confirmations
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(RpcError::Request("unscripted confirmation".into())))
    }

    async fn health(&self) -> RpcResult<()> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Mock JSON-RPC server
// ---------------------------------------------------------------------------

/// What the mock server answers to one request.
#[derive(Debug, Clone)]
pub struct MockReply {
    status: u16,
    body: MockBody,
    delay: Option<Duration>,
}

#[derive(Debug, Clone)]
enum MockBody {
    Result(Value),
    Error(Value),
    Raw(String),
}

impl MockReply {
    pub fn result(value: Value) -> Self {
        Self {
            status: 200,
            body: MockBody::Result(value),
            delay: None,
        }
    }

    pub fn error(code: i64, message: &str, data: Option<Value>) -> Self {
        let mut error = json!({ "code": code, "message": message });
        if let Some(data) = data {
            error["data"] = data;
        }
        Self {
            status: 200,
            body: MockBody::Error(error),
            delay: None,
        }
    }

    pub fn http(status: u16, body: &str) -> Self {
        Self {
            status,
            body: MockBody::Raw(body.to_string()),
            delay: None,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// One request seen by the mock server.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub params: Value,
    pub query: Option<String>,
    /// When the request arrived.
    pub at: Instant,
}

type Handler = dyn Fn(&str, &Value, usize) -> MockReply + Send + Sync;

struct ServerState {
    handler: Box<Handler>,
    log: Mutex<Vec<Recorded>>,
}

pub struct MockRpcServer {
    pub addr: SocketAddr,
    state: Arc<ServerState>,
}

impl MockRpcServer {
    /// Start a JSON-RPC server on an ephemeral port.
    ///
    /// `handler` receives the method, its params, and how many earlier
    /// requests used the same method.
    pub async fn start<F>(handler: F) -> Self
    where
        F: Fn(&str, &Value, usize) -> MockReply + Send + Sync + 'static,
    {
        let state = Arc::new(ServerState {
            handler: Box::new(handler),
            log: Mutex::new(Vec::new()),
        });
        let app = Router::new()
            .route("/", post(handle))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, state }
    }

    pub fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.log.lock().unwrap().clone()
    }

    pub fn count(&self, method: &str) -> usize {
        self.requests().iter().filter(|r| r.method == method).count()
    }

    /// Relay over this server on the given clock.
    pub fn relay_with(&self, config: &RelayConfig, clock: FixedClock) -> Relay {
        Relay::with_parts(
            config,
            Arc::new(HttpConnector::new(config.rpc.clone())),
            Arc::new(clock),
        )
        .unwrap()
    }

    pub fn relay(&self) -> Relay {
        self.relay_with(&config(&self.url()), workday())
    }
}

async fn handle(
    State(state): State<Arc<ServerState>>,
    RawQuery(query): RawQuery,
    Json(request): Json<Value>,
) -> Response {
    let method = request["method"].as_str().unwrap_or_default().to_string();
    let params = request["params"].clone();
    let id = request["id"].clone();

    let seen = {
        let mut log = state.log.lock().unwrap();
        let seen = log.iter().filter(|r| r.method == method).count();
        log.push(Recorded {
            method: method.clone(),
            params: params.clone(),
            query,
            at: Instant::now(),
        });
        seen
    };

    let reply = (state.handler)(&method, &params, seen);
    if let Some(delay) = reply.delay {
        tokio::time::sleep(delay).await;
    }

    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    match reply.body {
        MockBody::Result(result) => (
            status,
            Json(json!({ "jsonrpc": "2.0", "id": id, "result": result })),
        )
            .into_response(),
        MockBody::Error(error) => (
            status,
            Json(json!({ "jsonrpc": "2.0", "id": id, "error": error })),
        )
            .into_response(),
        MockBody::Raw(body) => (status, body).into_response(),
    }
}

/// Socket address nothing listens on.
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// `getTokenAccountsByOwner` result with one account per amount.
pub fn token_accounts(amounts: &[(&str, f64)]) -> Value {
    let value: Vec<Value> = amounts
        .iter()
        .map(|(pubkey, ui)| {
            json!({
                "pubkey": pubkey,
                "account": {
                    "data": {
                        "program": "spl-token",
                        "parsed": {
                            "type": "account",
                            "info": {
                                "mint": MINT,
                                "owner": WALLET,
                                "tokenAmount": {
                                    "amount": ((ui * 1e6) as u64).to_string(),
                                    "decimals": 6,
                                    "uiAmount": ui,
                                    "uiAmountString": ui.to_string(),
                                }
                            }
                        },
                        "space": 165
                    },
                    "executable": false,
                    "lamports": 2039280,
                    "owner": "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA",
                    "rentEpoch": 0
                }
            })
        })
        .collect();
    json!({ "context": { "slot": 1 }, "value": value })
}

pub fn latest_blockhash() -> Value {
    json!({
        "context": { "slot": 2 },
        "value": { "blockhash": BLOCKHASH, "lastValidBlockHeight": 3090 }
    })
}

pub fn signature_status(status: Option<&str>, err: Value) -> Value {
    let entry = match status {
        None => Value::Null,
        Some(s) => json!({
            "slot": 72,
            "confirmations": 10,
            "err": err,
            "confirmationStatus": s,
        }),
    };
    json!({ "context": { "slot": 82 }, "value": [entry] })
}
