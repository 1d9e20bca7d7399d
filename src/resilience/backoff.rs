//! Linear backoff between retries.

use std::time::Duration;

/// Delay before retry number `attempt` (1-based): `unit * attempt`.
///
/// Attempt 0 is the initial call and never waits.
pub fn linear_backoff(attempt: u32, unit: Duration) -> Duration {
    unit.saturating_mul(attempt)
}
