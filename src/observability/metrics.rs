//! Relay metrics.
//!
//! # Metrics
//! - `relay_rpc_calls_total` (counter): ledger calls by method, outcome
//! - `relay_retries_total` (counter): retries scheduled by operation
//! - `relay_connection_rebuilds_total` (counter): ledger handles built
//! - `relay_submissions_total` (counter): submission outcomes by status
//! - `relay_holiday_overrides_total` (counter): balances answered by the override
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op
//! - Label values are static strings, never addresses or signatures

use metrics::counter;

pub fn record_rpc_call(method: &'static str, outcome: &'static str) {
    counter!("relay_rpc_calls_total", "method" => method, "outcome" => outcome).increment(1);
}

pub fn record_retry(operation: &'static str) {
    counter!("relay_retries_total", "operation" => operation).increment(1);
}

pub fn record_connection_rebuild() {
    counter!("relay_connection_rebuilds_total").increment(1);
}

pub fn record_submission(outcome: &'static str) {
    counter!("relay_submissions_total", "outcome" => outcome).increment(1);
}

pub fn record_holiday_override() {
    counter!("relay_holiday_overrides_total").increment(1);
}
