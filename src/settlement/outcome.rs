//! Submission outcomes and on-chain error decoding.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use solana_sdk::instruction::InstructionError;
use solana_sdk::transaction::TransactionError;

use crate::error::ErrorCategory;

/// JSON-RPC error code for a failed preflight simulation.
pub const PREFLIGHT_FAILURE_CODE: i64 = -32002;

/// Why the ledger refused a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    InsufficientBalance,
    Other,
}

/// Result of one submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmissionOutcome {
    /// Landed and executed without error.
    Confirmed { signature: String },

    /// Definitely did not land; re-preparing and re-signing may succeed.
    RetryableFailure { reason: String },

    /// Definitely did not succeed.
    Rejected {
        reason: RejectionReason,
        /// Custom program error code, when the failure carried one.
        code: Option<u32>,
        /// Raw ledger error.
        detail: Value,
    },

    /// Whether the transaction landed is not known.
    UnknownFailure { message: String, kind: String },
}

impl SubmissionOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, SubmissionOutcome::Confirmed { .. })
    }

    /// Failure category, `None` when confirmed.
    pub fn category(&self) -> Option<ErrorCategory> {
        match self {
            SubmissionOutcome::Confirmed { .. } => None,
            SubmissionOutcome::RetryableFailure { .. } => Some(ErrorCategory::RetryableFailure),
            SubmissionOutcome::Rejected { .. } => Some(ErrorCategory::Rejected),
            SubmissionOutcome::UnknownFailure { .. } => Some(ErrorCategory::UnknownFailure),
        }
    }

    /// Metric label.
    pub fn label(&self) -> &'static str {
        match self {
            SubmissionOutcome::Confirmed { .. } => "confirmed",
            SubmissionOutcome::RetryableFailure { .. } => "retryable_failure",
            SubmissionOutcome::Rejected {
                reason: RejectionReason::InsufficientBalance,
                ..
            } => "insufficient_balance",
            SubmissionOutcome::Rejected { .. } => "rejected",
            SubmissionOutcome::UnknownFailure { .. } => "unknown_failure",
        }
    }
}

/// Typed form of a ledger error, `None` for shapes this SDK does not know.
pub fn transaction_error(err: &Value) -> Option<TransactionError> {
    TransactionError::deserialize(err).ok()
}

/// Custom program error code of an `InstructionError`, e.g.
/// `{"InstructionError": [0, {"Custom": 18}]}`.
pub fn custom_code(err: &Value) -> Option<u32> {
    match transaction_error(err)? {
        TransactionError::InstructionError(_, InstructionError::Custom(code)) => Some(code),
        _ => None,
    }
}

/// Decode a ledger transaction error into a rejection.
pub fn decode_failure(err: &Value, insufficient_balance_code: u32) -> SubmissionOutcome {
    let code = custom_code(err);
    let reason = if code == Some(insufficient_balance_code) {
        RejectionReason::InsufficientBalance
    } else {
        RejectionReason::Other
    };
    SubmissionOutcome::Rejected {
        reason,
        code,
        detail: err.clone(),
    }
}

/// Decode the structured error of a failed preflight simulation.
///
/// `None` when the error is not a preflight failure or carries no
/// transaction error.
pub fn decode_preflight(
    code: i64,
    data: Option<&Value>,
    insufficient_balance_code: u32,
) -> Option<SubmissionOutcome> {
    if code != PREFLIGHT_FAILURE_CODE {
        return None;
    }
    let err = data?.get("err").filter(|e| !e.is_null())?;

    if transaction_error(err) == Some(TransactionError::BlockhashNotFound) {
        return Some(SubmissionOutcome::RetryableFailure {
            reason: "checkpoint expired before submission (BlockhashNotFound)".to_string(),
        });
    }
    Some(decode_failure(err, insufficient_balance_code))
}
