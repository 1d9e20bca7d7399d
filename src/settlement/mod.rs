//! Settlement subsystem.
//!
//! # Data Flow
//! ```text
//! base64 signed transaction
//!     → ledger::wire (structural decode)
//!     → settler.rs (send once, confirm once under a deadline)
//!     → outcome.rs (decode ledger errors into outcomes)
//! ```

pub mod outcome;
pub mod settler;

pub use outcome::{RejectionReason, SubmissionOutcome};
pub use settler::TransactionSettler;
