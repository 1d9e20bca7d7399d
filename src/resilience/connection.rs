//! Cached ledger connection.
//!
//! # Responsibilities
//! - Hold one lazily-built endpoint handle shared by all operations
//! - Drop the handle whenever a consumer reports a failure
//! - Rebuild on the next `get()`
//!
//! # Design Decisions
//! - `ArcSwapOption` slot: readers never block, invalidation never blocks
//! - Concurrent rebuilds may race; building is side-effect free, so the last
//!   store wins and the extra handle is simply dropped
//! - A reader holding a handle that is invalidated afterwards keeps using it
//!   for its in-flight call and sees whatever failure triggered the eviction

use arc_swap::ArcSwapOption;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::config::RpcConfig;
use crate::error::RelayError;
use crate::ledger::client::{JsonRpcClient, LedgerRpc};
use crate::observability::metrics;

/// Builds endpoint handles.
pub trait Connector: Send + Sync {
    fn connect(&self) -> Result<Arc<dyn LedgerRpc>, RelayError>;
}

impl<F> Connector for F
where
    F: Fn() -> Result<Arc<dyn LedgerRpc>, RelayError> + Send + Sync,
{
    fn connect(&self) -> Result<Arc<dyn LedgerRpc>, RelayError> {
        self()
    }
}

/// Connector producing [`JsonRpcClient`]s from configuration.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    config: RpcConfig,
}

impl HttpConnector {
    pub fn new(config: RpcConfig) -> Self {
        Self { config }
    }
}

impl Connector for HttpConnector {
    fn connect(&self) -> Result<Arc<dyn LedgerRpc>, RelayError> {
        let client = JsonRpcClient::from_config(&self.config)?;
        tracing::debug!(endpoint = %client.endpoint(), "Built ledger RPC handle");
        Ok(Arc::new(client) as Arc<dyn LedgerRpc>)
    }
}

/// A memoized endpoint session.
pub struct Handle {
    rpc: Arc<dyn LedgerRpc>,
    generation: u64,
    created_at: Instant,
}

impl Handle {
    /// Sequence number of the build that produced this handle (1-based).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }
}

impl std::fmt::Debug for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handle")
            .field("generation", &self.generation)
            .field("age", &self.created_at.elapsed())
            .finish()
    }
}

impl Deref for Handle {
    type Target = dyn LedgerRpc;

    fn deref(&self) -> &Self::Target {
        self.rpc.as_ref()
    }
}

/// Self-healing cache for the single ledger handle.
pub struct ConnectionCache {
    connector: Arc<dyn Connector>,
    slot: ArcSwapOption<Handle>,
    builds: AtomicU64,
}

impl ConnectionCache {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            slot: ArcSwapOption::empty(),
            builds: AtomicU64::new(0),
        }
    }

    /// Return the cached handle, building one if the slot is empty.
    ///
    /// Fails with [`RelayError::Config`] when the connector cannot build a
    /// handle (e.g. the endpoint credential is absent).
    pub fn get(&self) -> Result<Arc<Handle>, RelayError> {
        if let Some(handle) = self.slot.load_full() {
            return Ok(handle);
        }

        let rpc = self.connector.connect()?;
        let generation = self.builds.fetch_add(1, Ordering::SeqCst) + 1;
        let handle = Arc::new(Handle {
            rpc,
            generation,
            created_at: Instant::now(),
        });
        self.slot.store(Some(handle.clone()));

        metrics::record_connection_rebuild();
        tracing::debug!(generation, "Ledger connection established");
        Ok(handle)
    }

    /// Drop the cached handle so the next `get()` rebuilds it.
    pub fn invalidate(&self) {
        if let Some(old) = self.slot.swap(None) {
            tracing::info!(generation = old.generation, "Ledger connection invalidated");
        }
    }

    /// True when a handle is currently cached.
    pub fn is_cached(&self) -> bool {
        self.slot.load().is_some()
    }

    /// Number of handles built so far.
    pub fn builds(&self) -> u64 {
        self.builds.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for ConnectionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionCache")
            .field("cached", &self.is_cached())
            .field("builds", &self.builds())
            .finish()
    }
}
