//! Ledger-specific types and error definitions.

use serde::{Deserialize, Serialize};
pub use solana_sdk::pubkey::Pubkey;
use solana_sdk::pubkey::ParsePubkeyError;
use std::fmt;
use thiserror::Error;

/// Reasons an address string fails to parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("address is empty")]
    Empty,

    #[error(transparent)]
    Invalid(#[from] ParsePubkeyError),
}

/// Parse a base58 account address (wallet, mint, token account).
pub fn parse_pubkey(value: &str) -> Result<Pubkey, AddressError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AddressError::Empty);
    }
    Ok(trimmed.parse::<Pubkey>()?)
}

/// Serde adapter writing a [`Pubkey`] as its base58 string.
pub mod pubkey_string {
    use serde::{de, Deserialize, Deserializer, Serializer};
    use solana_sdk::pubkey::Pubkey;

    pub fn serialize<S: Serializer>(key: &Pubkey, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(key)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Pubkey, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::parse_pubkey(&s).map_err(de::Error::custom)
    }
}

/// Commitment level requested when reading or confirming ledger state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    Processed,
    #[default]
    Confirmed,
    Finalized,
}

impl Commitment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Commitment::Processed => "processed",
            Commitment::Confirmed => "confirmed",
            Commitment::Finalized => "finalized",
        }
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token quantity held by an account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenAmount {
    /// Raw integer amount in base units, as reported by the ledger.
    pub raw: String,
    /// Mint decimals.
    pub decimals: u8,
    /// Human-facing amount (`raw / 10^decimals`).
    pub ui_amount: f64,
}

/// An account holding a specific asset on behalf of a wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingAccount {
    #[serde(with = "pubkey_string")]
    pub address: Pubkey,
    pub amount: TokenAmount,
}

/// Recent chain-state marker required to build a transaction.
///
/// Valid only for a provider-defined window; expiry shows up at submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub blockhash: String,
    pub last_valid_block_height: u64,
}

/// Options forwarded to the provider with a transaction submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendOptions {
    /// Run preflight simulation before broadcasting.
    pub preflight: bool,
    /// Commitment used for the preflight simulation.
    pub preflight_commitment: Commitment,
    /// Provider-side rebroadcast budget.
    pub max_retries: u32,
}

impl Default for SendOptions {
    fn default() -> Self {
        Self {
            preflight: true,
            preflight_commitment: Commitment::Confirmed,
            max_retries: 3,
        }
    }
}

/// Result of waiting for a submitted transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum Confirmation {
    /// Landed without error.
    Succeeded,
    /// Landed, but execution failed with the given structured ledger error.
    Failed(serde_json::Value),
}

/// Errors raised by the ledger transport.
#[derive(Debug, Error)]
pub enum RpcError {
    /// The request did not complete before its deadline.
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    /// The TCP/TLS connection could not be established in time.
    #[error("connection timed out: {0}")]
    ConnectTimeout(String),

    /// The request never produced a response.
    #[error("fetch failed: {0}")]
    Transport(String),

    /// The request could not be built or was redirected away.
    #[error("invalid request: {0}")]
    Request(String),

    /// The endpoint answered with a non-success HTTP status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// JSON-RPC error object returned by the provider.
    #[error("RPC error {code}: {message}")]
    Rpc {
        code: i64,
        message: String,
        data: Option<serde_json::Value>,
    },

    /// The response could not be decoded into the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl RpcError {
    /// Short stable name of the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            RpcError::Timeout(_) => "timeout",
            RpcError::ConnectTimeout(_) => "connect_timeout",
            RpcError::Transport(_) => "transport",
            RpcError::Request(_) => "request",
            RpcError::Http { .. } => "http",
            RpcError::Rpc { .. } => "rpc",
            RpcError::Decode(_) => "decode",
        }
    }
}

/// Result type for ledger transport operations.
pub type RpcResult<T> = Result<T, RpcError>;
