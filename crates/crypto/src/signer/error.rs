//! Transaction signer error types

use alloy_primitives::Address;
use thiserror::Error;

/// Result type for signer operations
pub type SignerResult<T> = Result<T, SignerError>;

/// Errors that can occur while building, signing or decoding transactions
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignerError {
    /// Malformed destination or sender address
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Numeric field that is empty, negative, malformed or out of range
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Call data that is not valid hex
    #[error("invalid call data: {0}")]
    InvalidData(String),

    /// Secret is not a usable private key
    #[error("signing failed: {0}")]
    SigningFailed(String),

    /// Skeleton names a sender the secret does not control
    #[error("sender mismatch: transaction from {expected}, key controls {actual}")]
    SenderMismatch { expected: Address, actual: Address },

    /// Raw bytes are not a signed legacy transaction
    #[error("failed to decode transaction: {0}")]
    Decode(String),
}
