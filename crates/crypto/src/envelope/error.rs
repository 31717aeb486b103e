//! Cipher envelope error types

use thiserror::Error;

/// Errors from envelope construction, encryption and decryption
#[derive(Error, Debug)]
pub enum EnvelopeError {
    /// Cipher name is not registered
    #[error("unsupported cipher: {0}")]
    UnsupportedCipher(String),

    /// Digest name is not registered
    #[error("unsupported digest: {0}")]
    UnsupportedDigest(String),

    /// Supplied salt is not 8 bytes
    #[error("salt must be exactly 8 bytes, got {0}")]
    SaltLengthInvalid(usize),

    /// Key derivation produced unusable material
    #[error("key derivation failed: {0}")]
    KdfFailure(String),

    /// Unpadding failed: wrong password or corrupted data
    #[error("decryption failed: wrong password or corrupted data")]
    DecryptionFailed,

    /// Input is not valid base64
    #[error("invalid base64 input: {0}")]
    InvalidBase64(String),

    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for envelope operations
pub type EnvelopeResult<T> = Result<T, EnvelopeError>;
