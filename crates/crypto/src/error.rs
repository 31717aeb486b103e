//! Cryptographic error types

use thiserror::Error;

/// Elliptic-curve key errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Secret key bytes are not a valid secp256k1 scalar (zero or >= n)
    #[error("invalid secret key bytes")]
    InvalidSecretKey,

    /// Secret key has the wrong length
    #[error("invalid secret key length: expected 32, got {0}")]
    InvalidSecretLength(usize),
}
