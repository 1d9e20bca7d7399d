//! Ledger integration subsystem.
//!
//! # Data Flow
//! ```text
//! RpcConfig (endpoint, API key, commitment, deadlines)
//!     → client.rs (JSON-RPC over HTTP, per-call deadline)
//!     → types.rs (addresses, holdings, checkpoints, transport errors)
//!     → wire.rs (structural check of signed transactions before submission)
//! ```
//!
//! # Security Constraints
//! - The API key travels only in the endpoint query string
//! - Never log the full endpoint URL
//! - Signed transactions are forwarded byte-for-byte

pub mod client;
pub mod types;
pub mod wire;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{JsonRpcClient, LedgerRpc};
pub use types::{
    parse_pubkey, AddressError, Checkpoint, Commitment, Confirmation, HoldingAccount, Pubkey,
    RpcError, RpcResult, SendOptions, TokenAmount,
};
pub use wire::{SignedTransaction, WireError};
