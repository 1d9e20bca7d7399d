//! Decoding of serialized signed transactions.
//!
//! Payloads are decoded into a [`VersionedTransaction`] and sanitized, so
//! header counts, account indexes and lookup tables are checked the same way
//! the ledger checks them. Signatures themselves are verified by the ledger.

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use bincode::Options;
use solana_sdk::message::VersionedMessage;
use solana_sdk::packet::PACKET_DATA_SIZE;
use solana_sdk::short_vec::decode_shortu16_len;
use solana_sdk::signature::{Signature, SIGNATURE_BYTES};
use solana_sdk::transaction::VersionedTransaction;
use thiserror::Error;

/// Why a transaction blob was rejected before submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    #[error("transaction payload is empty")]
    Empty,

    #[error("transaction is not valid base64: {0}")]
    Base64(String),

    #[error("transaction is {0} bytes, larger than the {max} byte limit", max = PACKET_DATA_SIZE)]
    TooLarge(usize),

    #[error("transaction declares {0} signatures but is too short to hold them")]
    Truncated(usize),

    #[error("transaction carries no signatures")]
    Unsigned,

    #[error("transaction does not decode: {0}")]
    Decode(String),

    #[error("transaction is malformed: {0}")]
    Sanitize(String),

    #[error("fee payer signature is empty")]
    MissingFeePayerSignature,
}

/// Message encoding of a decoded transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageVersion {
    Legacy,
    V0,
}

/// A decoded and sanitized signed transaction.
#[derive(Debug, Clone)]
pub struct SignedTransaction {
    bytes: Vec<u8>,
    transaction: VersionedTransaction,
}

impl SignedTransaction {
    /// Decode a base64 payload as sent by clients.
    pub fn from_base64(encoded: &str) -> Result<Self, WireError> {
        let trimmed = encoded.trim();
        if trimmed.is_empty() {
            return Err(WireError::Empty);
        }
        let bytes = BASE64_STANDARD
            .decode(trimmed)
            .map_err(|e| WireError::Base64(e.to_string()))?;
        Self::from_bytes(bytes)
    }

    /// Decode raw wire bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, WireError> {
        if bytes.is_empty() {
            return Err(WireError::Empty);
        }
        if bytes.len() > PACKET_DATA_SIZE {
            return Err(WireError::TooLarge(bytes.len()));
        }

        // The signature count drives an allocation inside the decoder, so it
        // is checked against the payload before decoding starts.
        let (signature_count, prefix_len) = decode_shortu16_len(&bytes)
            .map_err(|_| WireError::Decode("invalid signature count prefix".to_string()))?;
        if signature_count == 0 {
            return Err(WireError::Unsigned);
        }
        if signature_count.saturating_mul(SIGNATURE_BYTES) > bytes.len() - prefix_len {
            return Err(WireError::Truncated(signature_count));
        }

        let transaction: VersionedTransaction = bincode::options()
            .with_limit(PACKET_DATA_SIZE as u64)
            .with_fixint_encoding()
            .reject_trailing_bytes()
            .deserialize(&bytes)
            .map_err(|e| WireError::Decode(e.to_string()))?;

        transaction
            .sanitize()
            .map_err(|e| WireError::Sanitize(e.to_string()))?;

        if transaction.signatures.first() == Some(&Signature::default()) {
            return Err(WireError::MissingFeePayerSignature);
        }

        Ok(Self { bytes, transaction })
    }

    /// Transaction id: base58 of the fee payer signature.
    pub fn signature(&self) -> String {
        self.transaction
            .signatures
            .first()
            .map(Signature::to_string)
            .unwrap_or_default()
    }

    /// Base58 blockhash the transaction was built against.
    pub fn recent_blockhash(&self) -> String {
        self.transaction.message.recent_blockhash().to_string()
    }

    pub fn version(&self) -> MessageVersion {
        match self.transaction.message {
            VersionedMessage::Legacy(_) => MessageVersion::Legacy,
            VersionedMessage::V0(_) => MessageVersion::V0,
        }
    }

    pub fn signature_count(&self) -> usize {
        self.transaction.signatures.len()
    }

    pub fn instruction_count(&self) -> usize {
        self.transaction.message.instructions().len()
    }

    /// Wire bytes, exactly as received.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}
