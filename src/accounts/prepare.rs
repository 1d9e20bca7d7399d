//! Transfer preparation.
//!
//! Returns what a client needs to build and sign a transfer out of its
//! holding account: the account itself and a fresh checkpoint.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::accounts::holdings::{first_holding, parse_address};
use crate::error::{RelayError, RelayResult};
use crate::ledger::types::{pubkey_string, Checkpoint, Commitment, Pubkey};
use crate::resilience::RetryExecutor;

/// Inputs for building an unsigned transfer.
///
/// The checkpoint expires after a provider-defined window; expiry is only
/// detected when the signed transaction is submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedTransferDescriptor {
    #[serde(with = "pubkey_string")]
    pub holding_account: Pubkey,
    #[serde(flatten)]
    pub checkpoint: Checkpoint,
}

pub struct TransactionPreparer {
    executor: Arc<RetryExecutor>,
    commitment: Commitment,
    asset: Pubkey,
}

impl TransactionPreparer {
    pub fn new(executor: Arc<RetryExecutor>, commitment: Commitment, asset: Pubkey) -> Self {
        Self {
            executor,
            commitment,
            asset,
        }
    }

    /// Look up `wallet`'s holding account for the configured asset and pair
    /// it with the latest checkpoint.
    ///
    /// Fails with [`RelayError::NoHoldingAccount`] before any checkpoint
    /// fetch when the wallet has no account.
    pub async fn prepare_transfer(&self, wallet: &str) -> RelayResult<UnsignedTransferDescriptor> {
        let owner = parse_address("wallet", wallet)?;

        let account = first_holding(&self.executor, owner, self.asset, self.commitment)
            .await?
            .ok_or_else(|| RelayError::NoHoldingAccount {
                wallet: owner.to_string(),
                asset: self.asset.to_string(),
            })?;

        let commitment = self.commitment;
        let checkpoint = self
            .executor
            .call("latest_checkpoint", |rpc| async move {
                rpc.latest_checkpoint(commitment).await
            })
            .await?;

        tracing::info!(
            wallet = %owner,
            holding_account = %account.address,
            last_valid_block_height = checkpoint.last_valid_block_height,
            "Transfer prepared"
        );

        Ok(UnsignedTransferDescriptor {
            holding_account: account.address,
            checkpoint,
        })
    }
}
