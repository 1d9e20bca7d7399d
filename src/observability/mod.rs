//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Ledger calls, retries, rebuilds, submissions:
//!     → logging.rs (structured events, one span per relay operation)
//!     → metrics.rs (counters through the `metrics` facade)
//! ```
//!
//! # Design Decisions
//! - Each relay operation carries a UUID v4 operation id in its span
//! - The library never installs a metrics exporter; the embedding process does

pub mod logging;
pub mod metrics;
