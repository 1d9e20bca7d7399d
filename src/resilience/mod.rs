//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Ledger call:
//!     → connection.rs (cached handle, rebuilt after invalidation)
//!     → timeouts.rs (per-call deadline)
//!     → On failure: retries.rs (classify, invalidate, back off, retry)
//!         → backoff.rs (linear delay per attempt)
//! ```
//!
//! # Design Decisions
//! - Every remote call has a deadline
//! - Reads are retried; submissions never are
//! - A failed call always evicts the cached connection

pub mod backoff;
pub mod connection;
pub mod retries;
pub mod timeouts;

pub use connection::{ConnectionCache, Connector, Handle, HttpConnector};
pub use retries::{classify_rpc_error, ErrorClass, RetryError, RetryExecutor, RetryPolicy};
