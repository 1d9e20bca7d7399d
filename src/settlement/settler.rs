//! Transaction submission.
//!
//! # Responsibilities
//! - Structurally decode the signed transaction before anything is sent
//! - Send it exactly once, then wait for confirmation exactly once
//! - Turn the ledger's answer into a [`SubmissionOutcome`]
//!
//! # Design Decisions
//! - Never resubmits: a retried send can double-spend if the first one landed
//! - Uses the connection cache directly, not the retry executor
//! - Network failures after the send leave the outcome unknown, so they are
//!   reported as such rather than as errors

use std::sync::Arc;
use std::time::Duration;

use crate::config::SettlementConfig;
use crate::error::RelayResult;
use crate::ledger::types::{Commitment, Confirmation, RpcError, SendOptions};
use crate::ledger::wire::SignedTransaction;
use crate::observability::metrics;
use crate::resilience::timeouts::with_deadline;
use crate::resilience::{ConnectionCache, Handle};
use crate::settlement::outcome::{decode_failure, decode_preflight, SubmissionOutcome};

pub struct TransactionSettler {
    cache: Arc<ConnectionCache>,
    commitment: Commitment,
    options: SendOptions,
    confirmation_timeout: Duration,
    insufficient_balance_code: u32,
}

impl TransactionSettler {
    pub fn new(cache: Arc<ConnectionCache>, commitment: Commitment, config: &SettlementConfig) -> Self {
        Self {
            cache,
            commitment,
            options: SendOptions {
                preflight: config.preflight,
                preflight_commitment: commitment,
                max_retries: config.provider_max_retries,
            },
            confirmation_timeout: Duration::from_secs(config.confirmation_timeout_secs),
            insufficient_balance_code: config.insufficient_balance_code,
        }
    }

    /// Submit a base64-encoded signed transaction.
    ///
    /// Errors are reserved for failures that happen before anything is sent
    /// (malformed payload, missing credential). Every ledger answer, and every
    /// failure after the send, is a [`SubmissionOutcome`].
    pub async fn submit(&self, serialized: &str) -> RelayResult<SubmissionOutcome> {
        let transaction = SignedTransaction::from_base64(serialized)?;
        self.submit_transaction(&transaction).await
    }

    /// Submit raw signed transaction bytes.
    pub async fn submit_bytes(&self, bytes: Vec<u8>) -> RelayResult<SubmissionOutcome> {
        let transaction = SignedTransaction::from_bytes(bytes)?;
        self.submit_transaction(&transaction).await
    }

    async fn submit_transaction(
        &self,
        transaction: &SignedTransaction,
    ) -> RelayResult<SubmissionOutcome> {
        let rpc = self.cache.get()?;
        let local_signature = transaction.signature();

        tracing::debug!(
            signature = %local_signature,
            version = ?transaction.version(),
            instructions = transaction.instruction_count(),
            "Submitting transaction"
        );

        let outcome = match rpc.send_transaction(transaction.as_bytes(), &self.options).await {
            Ok(signature) => {
                if signature != local_signature {
                    tracing::warn!(
                        expected = %local_signature,
                        returned = %signature,
                        "Provider returned a different signature"
                    );
                }
                tracing::info!(signature = %signature, "Transaction sent");
                self.confirm(&rpc, signature).await
            }
            Err(err) => self.send_failed(err),
        };

        metrics::record_submission(outcome.label());
        match &outcome {
            SubmissionOutcome::Confirmed { signature } => {
                tracing::info!(signature = %signature, "Transaction confirmed")
            }
            other => tracing::warn!(outcome = other.label(), detail = ?other, "Transaction not confirmed"),
        }
        Ok(outcome)
    }

    async fn confirm(&self, rpc: &Handle, signature: String) -> SubmissionOutcome {
        let confirmation = with_deadline(
            self.confirmation_timeout,
            rpc.await_confirmation(&signature, self.commitment),
        )
        .await;

        match confirmation {
            Ok(Confirmation::Succeeded) => SubmissionOutcome::Confirmed { signature },
            Ok(Confirmation::Failed(err)) => decode_failure(&err, self.insufficient_balance_code),
            Err(err) => self.unknown(err),
        }
    }

    fn send_failed(&self, err: RpcError) -> SubmissionOutcome {
        if let RpcError::Rpc { code, data, .. } = &err {
            if let Some(outcome) =
                decode_preflight(*code, data.as_ref(), self.insufficient_balance_code)
            {
                return outcome;
            }
        }
        self.unknown(err)
    }

    fn unknown(&self, err: RpcError) -> SubmissionOutcome {
        self.cache.invalidate();
        SubmissionOutcome::UnknownFailure {
            message: err.to_string(),
            kind: err.kind().to_string(),
        }
    }
}
