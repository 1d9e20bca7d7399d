//! Retry logic.
//!
//! # Responsibilities
//! - Classify failures as transient or fatal
//! - Re-run transient failures with linear backoff, up to a fixed bound
//! - Evict the cached connection before each retry
//!
//! # Design Decisions
//! - Only timeouts, connection timeouts and "fetch failed" transport errors
//!   are transient; malformed input and provider rejections fail immediately
//! - Backoff grows linearly with the attempt number and applies before each
//!   retry, never before the first attempt
//! - Transaction submission never goes through here

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use crate::config::RetryConfig;
use crate::error::{RelayError, RelayResult};
use crate::ledger::types::{RpcError, RpcResult};
use crate::observability::metrics;
use crate::resilience::backoff::linear_backoff;
use crate::resilience::connection::{ConnectionCache, Handle};

/// Outcome of classifying a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Transient,
    Fatal,
}

/// Default classification for ledger transport errors.
///
/// Transient: request timeout, connection timeout (ETIMEDOUT), or a request
/// that never produced a response ("fetch failed"). Everything else is fatal.
pub fn classify_rpc_error(err: &RpcError) -> ErrorClass {
    match err {
        RpcError::Timeout(_) | RpcError::ConnectTimeout(_) | RpcError::Transport(_) => {
            ErrorClass::Transient
        }
        RpcError::Request(_) | RpcError::Http { .. } | RpcError::Rpc { .. } | RpcError::Decode(_) => {
            ErrorClass::Fatal
        }
    }
}

/// Bounds for retried calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Retry `n` waits `n * backoff_unit`.
    pub backoff_unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_unit: Duration::from_secs(1),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            backoff_unit: Duration::from_millis(config.backoff_unit_ms),
        }
    }
}

/// Error returned when a retried operation fails.
#[derive(Debug)]
pub enum RetryError<E> {
    /// The failure classified as fatal and was not retried.
    Fatal {
        error: E,
        attempts: u32,
    },
    /// Every attempt failed transiently.
    Exhausted {
        last: E,
        attempts: u32,
    },
}

impl<E> RetryError<E> {
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::Fatal { attempts, .. } | RetryError::Exhausted { attempts, .. } => *attempts,
        }
    }

    pub fn into_inner(self) -> E {
        match self {
            RetryError::Fatal { error, .. } => error,
            RetryError::Exhausted { last, .. } => last,
        }
    }
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryError::Fatal { error, .. } => write!(f, "{}", error),
            RetryError::Exhausted { last, attempts } => {
                write!(f, "gave up after {} attempts: {}", attempts, last)
            }
        }
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for RetryError<E> {}

/// Runs remote operations with bounded retries against the cached connection.
#[derive(Debug)]
pub struct RetryExecutor {
    cache: Arc<ConnectionCache>,
    policy: RetryPolicy,
}

impl RetryExecutor {
    pub fn new(cache: Arc<ConnectionCache>, policy: RetryPolicy) -> Self {
        Self { cache, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn cache(&self) -> &Arc<ConnectionCache> {
        &self.cache
    }

    /// Run `operation` up to `max_attempts` times.
    ///
    /// Fatal failures propagate immediately. Transient failures invalidate the
    /// cached connection and back off before the next attempt. A bound of 0 is
    /// treated as 1.
    pub async fn run<T, E, F, Fut, C>(
        &self,
        operation: F,
        max_attempts: u32,
        classify: C,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        C: Fn(&E) -> ErrorClass,
        E: fmt::Display,
    {
        self.run_labeled("operation", operation, max_attempts, classify)
            .await
    }

    async fn run_labeled<T, E, F, Fut, C>(
        &self,
        label: &'static str,
        mut operation: F,
        max_attempts: u32,
        classify: C,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        C: Fn(&E) -> ErrorClass,
        E: fmt::Display,
    {
        let max_attempts = max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            let error = match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!(operation = label, attempt, "Recovered after retry");
                    }
                    return Ok(value);
                }
                Err(error) => error,
            };

            if classify(&error) == ErrorClass::Fatal {
                tracing::debug!(operation = label, attempt, error = %error, "Fatal failure, not retrying");
                return Err(RetryError::Fatal {
                    error,
                    attempts: attempt,
                });
            }

            if attempt >= max_attempts {
                tracing::warn!(
                    operation = label,
                    attempts = attempt,
                    error = %error,
                    "Retries exhausted"
                );
                return Err(RetryError::Exhausted {
                    last: error,
                    attempts: attempt,
                });
            }

            let delay = linear_backoff(attempt, self.policy.backoff_unit);
            tracing::warn!(
                operation = label,
                attempt,
                remaining = max_attempts - attempt,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Transient failure, retrying"
            );
            metrics::record_retry(label);
            self.cache.invalidate();
            sleep(delay).await;
        }
    }

    /// Run a ledger call against the cached handle with the default policy.
    ///
    /// The handle is fetched anew for every attempt, so a retry after
    /// invalidation talks to a rebuilt connection. Terminal remote failures
    /// also evict the handle.
    pub async fn call<T, F, Fut>(&self, label: &'static str, mut op: F) -> RelayResult<T>
    where
        F: FnMut(Arc<Handle>) -> Fut,
        Fut: Future<Output = RpcResult<T>>,
    {
        let cache = &self.cache;
        let result = self
            .run_labeled(
                label,
                || {
                    let call = cache.get().map(&mut op);
                    async move {
                        match call {
                            Ok(fut) => fut.await.map_err(CallError::Rpc),
                            Err(e) => Err(CallError::Connect(e)),
                        }
                    }
                },
                self.policy.max_attempts,
                |e| match e {
                    CallError::Rpc(e) => classify_rpc_error(e),
                    CallError::Connect(_) => ErrorClass::Fatal,
                },
            )
            .await;

        match result {
            Ok(value) => Ok(value),
            Err(RetryError::Fatal {
                error: CallError::Connect(e),
                ..
            })
            | Err(RetryError::Exhausted {
                last: CallError::Connect(e),
                ..
            }) => Err(e),
            Err(RetryError::Fatal {
                error: CallError::Rpc(e),
                ..
            }) => {
                self.cache.invalidate();
                Err(RelayError::Rpc(e))
            }
            Err(RetryError::Exhausted {
                last: CallError::Rpc(e),
                attempts,
            }) => {
                self.cache.invalidate();
                Err(RelayError::ExhaustedRetries { attempts, last: e })
            }
        }
    }
}

/// Failure of one attempt inside [`RetryExecutor::call`].
enum CallError {
    Connect(RelayError),
    Rpc(RpcError),
}

impl fmt::Display for CallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallError::Connect(e) => write!(f, "{}", e),
            CallError::Rpc(e) => write!(f, "{}", e),
        }
    }
}
