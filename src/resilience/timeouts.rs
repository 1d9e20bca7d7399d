//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap ledger calls with a deadline
//! - Cancel operations cleanly on timeout (the future is dropped)
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Deadline expiry surfaces as `RpcError::Timeout`, which the retry
//!   classifier treats as transient and the settler as an unknown outcome

use std::future::Future;
use std::time::Duration;

use crate::ledger::types::{RpcError, RpcResult};

/// Run `fut` with a deadline, mapping expiry to [`RpcError::Timeout`].
pub async fn with_deadline<T, F>(deadline: Duration, fut: F) -> RpcResult<T>
where
    F: Future<Output = RpcResult<T>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(RpcError::Timeout(deadline.as_millis() as u64)),
    }
}
