//! Relay error taxonomy.
//!
//! Remote failures are classified once, where the call is made (the retry
//! executor or the settler). Everything that leaves the crate carries an
//! [`ErrorCategory`] plus a human-readable detail.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::ledger::types::{AddressError, RpcError};
use crate::ledger::wire::WireError;
use crate::resilience::retries::{classify_rpc_error, ErrorClass};

/// Errors returned by the relay operations.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Server misconfiguration, e.g. the endpoint credential is absent.
    #[error("configuration error: {0}")]
    Config(String),

    /// A caller-supplied identifier is not a well-formed address.
    #[error("invalid {field} address: {source}")]
    InvalidAddress {
        field: &'static str,
        #[source]
        source: AddressError,
    },

    /// The wallet holds no account for the asset, so nothing can be transferred.
    #[error("no holding account for asset {asset} owned by {wallet}")]
    NoHoldingAccount { wallet: String, asset: String },

    /// A remote call failed and was not retried further.
    #[error("ledger call failed: {0}")]
    Rpc(#[source] RpcError),

    /// Transient failures persisted through every attempt.
    #[error("ledger call failed after {attempts} attempts: {last}")]
    ExhaustedRetries {
        attempts: u32,
        #[source]
        last: RpcError,
    },

    /// The submitted payload is not a decodable signed transaction.
    #[error("malformed transaction: {0}")]
    MalformedTransaction(#[from] WireError),
}

/// Result type for relay operations.
pub type RelayResult<T> = Result<T, RelayError>;

impl RelayError {
    pub fn invalid_address(field: &'static str, source: AddressError) -> Self {
        Self::InvalidAddress { field, source }
    }

    /// Stable category for callers and response bodies.
    pub fn category(&self) -> ErrorCategory {
        match self {
            RelayError::Config(_) => ErrorCategory::ConfigError,
            RelayError::InvalidAddress { .. } => ErrorCategory::InvalidAddress,
            RelayError::NoHoldingAccount { .. } => ErrorCategory::NoHoldingAccount,
            RelayError::Rpc(e) => match classify_rpc_error(e) {
                ErrorClass::Transient => ErrorCategory::TransientNetwork,
                ErrorClass::Fatal => ErrorCategory::RemoteFailure,
            },
            RelayError::ExhaustedRetries { .. } => ErrorCategory::ExhaustedRetries,
            RelayError::MalformedTransaction(_) => ErrorCategory::MalformedTransaction,
        }
    }
}

/// Failure categories exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    ConfigError,
    InvalidAddress,
    NoHoldingAccount,
    TransientNetwork,
    ExhaustedRetries,
    RemoteFailure,
    MalformedTransaction,
    Rejected,
    RetryableFailure,
    UnknownFailure,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::ConfigError => "config_error",
            ErrorCategory::InvalidAddress => "invalid_address",
            ErrorCategory::NoHoldingAccount => "no_holding_account",
            ErrorCategory::TransientNetwork => "transient_network",
            ErrorCategory::ExhaustedRetries => "exhausted_retries",
            ErrorCategory::RemoteFailure => "remote_failure",
            ErrorCategory::MalformedTransaction => "malformed_transaction",
            ErrorCategory::Rejected => "rejected",
            ErrorCategory::RetryableFailure => "retryable_failure",
            ErrorCategory::UnknownFailure => "unknown_failure",
        }
    }

    /// True when the caller can fix the request and try again.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ErrorCategory::InvalidAddress
                | ErrorCategory::NoHoldingAccount
                | ErrorCategory::MalformedTransaction
                | ErrorCategory::Rejected
                | ErrorCategory::RetryableFailure
        )
    }

    /// HTTP status an HTTP front end should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            c if c.is_client_error() => 400,
            ErrorCategory::TransientNetwork
            | ErrorCategory::ExhaustedRetries
            | ErrorCategory::RemoteFailure
            | ErrorCategory::UnknownFailure => 502,
            _ => 500,
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        let err = RelayError::Config("missing api key".into());
        assert_eq!(err.category(), ErrorCategory::ConfigError);
        assert_eq!(err.category().status_code(), 500);

        let err = RelayError::invalid_address("wallet", AddressError::Empty);
        assert_eq!(err.category(), ErrorCategory::InvalidAddress);
        assert_eq!(err.to_string(), "invalid wallet address: address is empty");
        assert_eq!(err.category().status_code(), 400);

        let err = RelayError::Rpc(RpcError::Timeout(10));
        assert_eq!(err.category(), ErrorCategory::TransientNetwork);

        let err = RelayError::Rpc(RpcError::Http {
            status: 401,
            body: "unauthorized".into(),
        });
        assert_eq!(err.category(), ErrorCategory::RemoteFailure);
        assert_eq!(err.category().status_code(), 502);
    }

    #[test]
    fn test_category_serde() {
        let json = serde_json::to_string(&ErrorCategory::NoHoldingAccount).unwrap();
        assert_eq!(json, "\"no_holding_account\"");
        for category in [
            ErrorCategory::ConfigError,
            ErrorCategory::ExhaustedRetries,
            ErrorCategory::UnknownFailure,
        ] {
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json.trim_matches('"'), category.as_str());
        }
    }
}
