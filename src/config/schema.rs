//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::ledger::types::Commitment;

/// Root configuration for the settlement relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Ledger RPC endpoint settings.
    pub rpc: RpcConfig,

    /// Asset the relay checks and burns.
    pub asset: AssetConfig,

    /// Retry configuration for read paths.
    pub retries: RetryConfig,

    /// Transaction submission settings.
    pub settlement: SettlementConfig,

    /// Holiday balance override window.
    pub holiday: HolidayConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Ledger RPC endpoint configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RpcConfig {
    /// JSON-RPC endpoint base URL.
    pub endpoint: String,

    /// Provider API key, appended as the `api-key` query parameter.
    pub api_key: Option<String>,

    /// Commitment used for reads and confirmation.
    pub commitment: Commitment,

    /// Per-call deadline in milliseconds.
    pub request_timeout_ms: u64,

    /// Interval between signature status polls while awaiting confirmation.
    pub confirmation_poll_ms: u64,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://mainnet.helius-rpc.com".to_string(),
            api_key: None,
            commitment: Commitment::Confirmed,
            request_timeout_ms: 10_000,
            confirmation_poll_ms: 500,
        }
    }
}

// Keeps the API key out of logs.
impl std::fmt::Debug for RpcConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("commitment", &self.commitment)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("confirmation_poll_ms", &self.confirmation_poll_ms)
            .finish()
    }
}

/// Asset configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AssetConfig {
    /// Mint address of the token being checked and burned.
    pub mint: String,
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per remote call, including the first.
    pub max_attempts: u32,

    /// Backoff unit in milliseconds; retry `n` waits `n * backoff_unit_ms`.
    pub backoff_unit_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_unit_ms: 1_000,
        }
    }
}

/// Transaction submission configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SettlementConfig {
    /// Custom program error code meaning "insufficient balance".
    pub insufficient_balance_code: u32,

    /// Provider-side rebroadcast budget passed with each submission.
    pub provider_max_retries: u32,

    /// Run preflight simulation before broadcasting.
    pub preflight: bool,

    /// Maximum time to wait for confirmation, in seconds.
    pub confirmation_timeout_secs: u64,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            insufficient_balance_code: 18,
            provider_max_retries: 3,
            preflight: true,
            confirmation_timeout_secs: 60,
        }
    }
}

/// Holiday override: a fixed calendar range during which balance queries
/// report `amount` without touching the ledger.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HolidayConfig {
    pub enabled: bool,

    /// Month of the window (1-12).
    pub month: u32,

    /// First day of the window, inclusive.
    pub start_day: u32,

    /// Last day of the window, inclusive.
    pub end_day: u32,

    /// Balance reported inside the window.
    pub amount: f64,
}

impl Default for HolidayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            month: 12,
            start_day: 23,
            end_day: 25,
            amount: 999_999_999.0,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines instead of human-readable text.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}
