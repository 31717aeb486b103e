//! Registry error types

use std::path::PathBuf;

use alloy_primitives::Address;
use thiserror::Error;
use uuid::Uuid;

use crate::error::CryptoError;
use crate::keystore::KeystoreError;

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors that can occur during registry operations
#[derive(Error, Debug)]
pub enum RegistryError {
    /// No password could be obtained for the account
    #[error("password unknown: no password available")]
    PasswordUnknown,

    /// Wrong password, or a record/registry file that fails MAC verification
    #[error("invalid password")]
    InvalidPassword,

    /// No account with this address
    #[error("address not found: {0}")]
    AddressNotFound(Address),

    /// No account with this identifier
    #[error("identifier not found: {0}")]
    IdentifierNotFound(Uuid),

    /// Import of an address that is already registered
    #[error("address already registered: {0}")]
    DuplicateAddress(Address),

    /// Import of a record whose identifier is already registered
    #[error("identifier already registered: {0}")]
    DuplicateIdentifier(Uuid),

    /// Name, address or identifier text that matches no account
    #[error("no account matches: {0}")]
    UnknownAccount(String),

    /// Display name shared by several accounts
    #[error("name matches more than one account: {0}")]
    AmbiguousName(String),

    /// Existing record without an address, adopted without a password
    #[error("record {0} carries no address and no password was given")]
    MissingAddress(Uuid),

    /// Registry file already present on create
    #[error("registry already exists at path: {0}")]
    AlreadyExists(PathBuf),

    /// Registry file absent on load
    #[error("registry not found at path: {0}")]
    NotFound(PathBuf),

    /// Registry file version not understood
    #[error("unsupported registry version: {0}")]
    UnsupportedVersion(u32),

    /// Secret bytes are not a usable private key
    #[error("invalid secret: {0}")]
    InvalidSecret(#[from] CryptoError),

    /// Underlying record error
    #[error("keystore error: {0}")]
    Keystore(KeystoreError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<KeystoreError> for RegistryError {
    fn from(err: KeystoreError) -> Self {
        match err {
            KeystoreError::InvalidPassword => RegistryError::InvalidPassword,
            other => RegistryError::Keystore(other),
        }
    }
}
