//! Holding-account lookup shared by balance and preparation.

use crate::error::{RelayError, RelayResult};
use crate::ledger::types::{parse_pubkey, Commitment, HoldingAccount, Pubkey};
use crate::resilience::RetryExecutor;

/// Parse a caller-supplied address, tagging failures with `field`.
pub fn parse_address(field: &'static str, value: &str) -> RelayResult<Pubkey> {
    parse_pubkey(value).map_err(|source| RelayError::invalid_address(field, source))
}

/// First account of `mint` owned by `owner`, if any.
///
/// The ledger may report several; only the first is considered.
pub async fn first_holding(
    executor: &RetryExecutor,
    owner: Pubkey,
    mint: Pubkey,
    commitment: Commitment,
) -> RelayResult<Option<HoldingAccount>> {
    let accounts = executor
        .call("list_holding_accounts", |rpc| async move {
            rpc.list_holding_accounts(&owner, &mint, commitment).await
        })
        .await?;

    tracing::debug!(owner = %owner, mint = %mint, found = accounts.len(), "Holding accounts fetched");
    Ok(accounts.into_iter().next())
}
