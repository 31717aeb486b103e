//! Secret record error types

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur while sealing, opening or storing secret records
#[derive(Error, Debug)]
pub enum KeystoreError {
    /// MAC mismatch. A wrong password and a corrupted record look the same.
    #[error("invalid password or corrupted record: MAC verification failed")]
    InvalidPassword,

    /// Unsupported KDF function
    #[error("unsupported KDF function: {0}")]
    UnsupportedKdf(String),

    /// Unsupported cipher function
    #[error("unsupported cipher function: {0}")]
    UnsupportedCipher(String),

    /// Unsupported record version
    #[error("unsupported record version: {0}")]
    UnsupportedVersion(u32),

    /// Invalid KDF parameters
    #[error("invalid KDF parameters: {0}")]
    InvalidKdfParams(String),

    /// Invalid cipher parameters
    #[error("invalid cipher parameters: {0}")]
    InvalidCipherParams(String),

    /// Key derivation failed
    #[error("key derivation failed: {0}")]
    KdfError(String),

    /// Invalid hex encoding
    #[error("invalid hex encoding: {0}")]
    HexError(String),

    /// Empty secret passed to the record builder
    #[error("secret is required")]
    MissingSecret,

    /// No record with this identifier in the store
    #[error("secret record not found: {0}")]
    RecordNotFound(Uuid),

    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type for keystore operations
pub type KeystoreResult<T> = Result<T, KeystoreError>;
