//! Settlement relay library.
//!
//! A resilience layer between a server and a remote ledger JSON-RPC
//! endpoint: balance queries, transfer preparation, and submission of
//! signed transactions with confirmation.
//!
//! # Architecture Overview
//!
//! ```text
//!   caller ──▶ relay (facade, response bodies)
//!                │
//!                ├──▶ accounts   (holiday override, balances, transfer preparation)
//!                │        │
//!                │        ▼
//!                │    resilience (retries, backoff, deadlines)
//!                │        │
//!                ├──▶ settlement (send once, confirm, decode outcome)
//!                │        │
//!                ▼        ▼
//!           resilience::connection (cached handle, rebuilt on failure)
//!                         │
//!                         ▼
//!                      ledger (JSON-RPC client, wire decoding) ──▶ RPC endpoint
//!
//!   cross-cutting: config, error, observability
//! ```

// Core subsystems
pub mod accounts;
pub mod ledger;
pub mod relay;
pub mod settlement;

// Cross-cutting concerns
pub mod config;
pub mod error;
pub mod observability;
pub mod resilience;

pub use config::RelayConfig;
pub use error::{ErrorCategory, RelayError, RelayResult};
pub use relay::{Relay, Reply};
pub use settlement::SubmissionOutcome;
