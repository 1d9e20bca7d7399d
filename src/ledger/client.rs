//! Ledger RPC client.
//!
//! # Responsibilities
//! - Define the narrow query interface the relay needs from the ledger
//! - Speak JSON-RPC over HTTP to the provider
//! - Put a deadline on every call and map transport failures onto `RpcError`
//!   kinds the retry classifier understands

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use url::Url;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;

use crate::config::RpcConfig;
use crate::error::RelayError;
use crate::ledger::types::{
    parse_pubkey, Checkpoint, Commitment, Confirmation, HoldingAccount, Pubkey, RpcError,
    RpcResult, SendOptions, TokenAmount,
};
use crate::observability::metrics;
use crate::resilience::timeouts::with_deadline;

/// Remote ledger operations used by the relay.
#[async_trait]
pub trait LedgerRpc: Send + Sync {
    /// Token accounts of `mint` owned by `owner`.
    async fn list_holding_accounts(
        &self,
        owner: &Pubkey,
        mint: &Pubkey,
        commitment: Commitment,
    ) -> RpcResult<Vec<HoldingAccount>>;

    /// Most recent blockhash and the last block height it stays valid for.
    async fn latest_checkpoint(&self, commitment: Commitment) -> RpcResult<Checkpoint>;

    /// Broadcast a signed transaction, returning its signature.
    async fn send_transaction(&self, wire: &[u8], options: &SendOptions) -> RpcResult<String>;

    /// Wait until `signature` reaches `commitment` or fails on-chain.
    ///
    /// Does not bound its own duration; callers wrap it in a deadline.
    async fn await_confirmation(
        &self,
        signature: &str,
        commitment: Commitment,
    ) -> RpcResult<Confirmation>;

    /// Provider liveness probe.
    async fn health(&self) -> RpcResult<()>;
}

/// JSON-RPC over HTTP implementation of [`LedgerRpc`].
pub struct JsonRpcClient {
    http: reqwest::Client,
    url: Url,
    timeout: Duration,
    poll_interval: Duration,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    /// Create a client for `url`.
    ///
    /// # Arguments
    /// * `url` - Full endpoint URL, including any credential query parameter
    /// * `timeout` - Deadline applied to each individual call
    /// * `poll_interval` - Delay between signature status polls
    pub fn new(url: Url, timeout: Duration, poll_interval: Duration) -> RpcResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| RpcError::Request(e.to_string()))?;

        Ok(Self {
            http,
            url,
            timeout,
            poll_interval,
            next_id: AtomicU64::new(1),
        })
    }

    /// Build a client from configuration.
    ///
    /// Fails with [`RelayError::Config`] when the API key is absent or the
    /// endpoint does not parse.
    pub fn from_config(config: &RpcConfig) -> Result<Self, RelayError> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| RelayError::Config("rpc.api_key is not configured".to_string()))?;

        let mut url: Url = config.endpoint.parse().map_err(|e| {
            RelayError::Config(format!("invalid RPC endpoint '{}': {}", config.endpoint, e))
        })?;
        url.query_pairs_mut().append_pair("api-key", api_key);

        Self::new(
            url,
            Duration::from_millis(config.request_timeout_ms),
            Duration::from_millis(config.confirmation_poll_ms),
        )
        .map_err(|e| RelayError::Config(e.to_string()))
    }

    /// Endpoint without query string, safe to log.
    pub fn endpoint(&self) -> String {
        let mut url = self.url.clone();
        url.set_query(None);
        url.to_string()
    }

    async fn call<T: DeserializeOwned>(&self, method: &'static str, params: Value) -> RpcResult<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let result = with_deadline(self.timeout, self.post(&body)).await;
        let result = result.and_then(|bytes| decode_response::<T>(&bytes));

        match &result {
            Ok(_) => metrics::record_rpc_call(method, "ok"),
            Err(e) => {
                tracing::debug!(method, id, error = %e, "RPC call failed");
                metrics::record_rpc_call(method, e.kind());
            }
        }
        result
    }

    async fn post(&self, body: &Value) -> RpcResult<Vec<u8>> {
        let response = self
            .http
            .post(self.url.clone())
            .json(body)
            .send()
            .await
            .map_err(|e| map_transport_error(e, self.timeout))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| map_transport_error(e, self.timeout))?;

        if !status.is_success() {
            let body = String::from_utf8_lossy(&bytes);
            return Err(RpcError::Http {
                status: status.as_u16(),
                body: body.chars().take(256).collect(),
            });
        }
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl LedgerRpc for JsonRpcClient {
    async fn list_holding_accounts(
        &self,
        owner: &Pubkey,
        mint: &Pubkey,
        commitment: Commitment,
    ) -> RpcResult<Vec<HoldingAccount>> {
        let params = json!([
            owner.to_string(),
            { "mint": mint.to_string() },
            { "encoding": "jsonParsed", "commitment": commitment.as_str() },
        ]);
        let response: Contextual<Vec<KeyedTokenAccount>> =
            self.call("getTokenAccountsByOwner", params).await?;

        response.value.into_iter().map(holding_from).collect()
    }

    async fn latest_checkpoint(&self, commitment: Commitment) -> RpcResult<Checkpoint> {
        let params = json!([{ "commitment": commitment.as_str() }]);
        let response: Contextual<LatestBlockhash> =
            self.call("getLatestBlockhash", params).await?;
        Ok(Checkpoint {
            blockhash: response.value.blockhash,
            last_valid_block_height: response.value.last_valid_block_height,
        })
    }

    async fn send_transaction(&self, wire: &[u8], options: &SendOptions) -> RpcResult<String> {
        let params = json!([
            BASE64_STANDARD.encode(wire),
            {
                "encoding": "base64",
                "skipPreflight": !options.preflight,
                "preflightCommitment": options.preflight_commitment.as_str(),
                "maxRetries": options.max_retries,
            },
        ]);
        self.call("sendTransaction", params).await
    }

    async fn await_confirmation(
        &self,
        signature: &str,
        commitment: Commitment,
    ) -> RpcResult<Confirmation> {
        loop {
            let params = json!([[signature], { "searchTransactionHistory": false }]);
            let response: Contextual<Vec<Option<SignatureStatus>>> =
                self.call("getSignatureStatuses", params).await?;

            let status = match response.value.into_iter().next().flatten() {
                Some(s) => s,
                None => {
                    tracing::debug!(signature, "Transaction not yet visible");
                    tokio::time::sleep(self.poll_interval).await;
                    continue;
                }
            };

            if let Some(err) = status.err {
                return Ok(Confirmation::Failed(err));
            }

            // A missing status means the slot is already rooted.
            let reached = status.confirmation_status.unwrap_or(Commitment::Finalized);
            if reached >= commitment {
                return Ok(Confirmation::Succeeded);
            }

            tracing::debug!(
                signature,
                reached = %reached,
                required = %commitment,
                "Waiting for confirmation"
            );
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn health(&self) -> RpcResult<()> {
        let status: String = self.call("getHealth", json!([])).await?;
        if status == "ok" {
            Ok(())
        } else {
            Err(RpcError::Decode(format!("unexpected health status '{}'", status)))
        }
    }
}

impl std::fmt::Debug for JsonRpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonRpcClient")
            .field("endpoint", &self.endpoint())
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Deserialize)]
struct Contextual<T> {
    value: T,
}

#[derive(Deserialize)]
struct KeyedTokenAccount {
    pubkey: String,
    account: ParsedAccount,
}

#[derive(Deserialize)]
struct ParsedAccount {
    data: ParsedData,
}

#[derive(Deserialize)]
struct ParsedData {
    parsed: ParsedToken,
}

#[derive(Deserialize)]
struct ParsedToken {
    info: TokenInfo,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenInfo {
    token_amount: UiTokenAmount,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UiTokenAmount {
    amount: String,
    decimals: u8,
    ui_amount: Option<f64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LatestBlockhash {
    blockhash: String,
    last_valid_block_height: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignatureStatus {
    #[serde(default)]
    err: Option<Value>,
    #[serde(default)]
    confirmation_status: Option<Commitment>,
}

/// Convert one parsed token account, rejecting amounts no token can hold.
fn holding_from(keyed: KeyedTokenAccount) -> RpcResult<HoldingAccount> {
    let address = parse_pubkey(&keyed.pubkey)
        .map_err(|e| RpcError::Decode(format!("token account pubkey: {}", e)))?;
    let amount = keyed.account.data.parsed.info.token_amount;
    let ui_amount = amount.ui_amount.unwrap_or(0.0);
    if !ui_amount.is_finite() || ui_amount < 0.0 {
        return Err(RpcError::Decode(format!(
            "token account {} reports amount {}",
            address, ui_amount
        )));
    }

    Ok(HoldingAccount {
        address,
        amount: TokenAmount {
            raw: amount.amount,
            decimals: amount.decimals,
            ui_amount,
        },
    })
}

fn decode_response<T: DeserializeOwned>(bytes: &[u8]) -> RpcResult<T> {
    let response: RpcResponse<T> =
        serde_json::from_slice(bytes).map_err(|e| RpcError::Decode(e.to_string()))?;

    if let Some(err) = response.error {
        return Err(RpcError::Rpc {
            code: err.code,
            message: err.message,
            data: err.data,
        });
    }
    response
        .result
        .ok_or_else(|| RpcError::Decode("response has neither result nor error".to_string()))
}

/// Map a `reqwest` failure onto the transport error kinds.
fn map_transport_error(err: reqwest::Error, timeout: Duration) -> RpcError {
    if err.is_timeout() {
        if err.is_connect() {
            return RpcError::ConnectTimeout(err.to_string());
        }
        return RpcError::Timeout(timeout.as_millis() as u64);
    }
    if io_timed_out(&err) {
        return RpcError::ConnectTimeout(err.to_string());
    }
    if err.is_connect() || err.is_request() || err.is_body() {
        return RpcError::Transport(describe(&err));
    }
    if err.is_decode() {
        return RpcError::Decode(err.to_string());
    }
    RpcError::Request(err.to_string())
}

/// True when an `io::ErrorKind::TimedOut` (ETIMEDOUT) sits in the source chain.
fn io_timed_out(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut source = Some(err);
    while let Some(e) = source {
        if let Some(io) = e.downcast_ref::<std::io::Error>() {
            if io.kind() == std::io::ErrorKind::TimedOut {
                return true;
            }
        }
        source = e.source();
    }
    false
}

/// Error message including its innermost cause.
fn describe(err: &(dyn std::error::Error + 'static)) -> String {
    let mut root = match err.source() {
        Some(source) => source,
        None => return err.to_string(),
    };
    while let Some(next) = root.source() {
        root = next;
    }
    format!("{}: {}", err, root)
}
