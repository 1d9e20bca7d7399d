//! Account-facing operations.
//!
//! # Data Flow
//! ```text
//! wallet (+ asset) identifiers
//!     → holiday.rs (calendar override, balance only)
//!     → holdings.rs (address parsing, holding-account lookup via retries)
//!     → balance.rs (display amount)
//!     → prepare.rs (holding account + checkpoint for an unsigned transfer)
//! ```

pub mod balance;
pub mod holdings;
pub mod holiday;
pub mod prepare;

pub use balance::{BalanceQuery, BalanceReport};
pub use holiday::{Clock, FixedClock, HolidayWindow, SystemClock};
pub use prepare::{TransactionPreparer, UnsignedTransferDescriptor};
