//! Key storage and signing for the keyvault wallet
//!
//! This crate provides:
//! - Cipher envelopes compatible with `openssl enc` (AES-CBC, EVP_BytesToKey)
//! - Web3 Secret Storage (v3) records for per-account key material
//! - A keystore registry indexing accounts under a master password
//! - Legacy/EIP-155 transaction signing with secp256k1 keys

pub mod envelope;
pub mod error;
pub mod fs;
pub mod keystore;
pub mod registry;
pub mod secp256k1;
pub mod secure;
pub mod signer;

// Envelope exports
pub use envelope::{CipherEnvelope, CipherKind, DigestKind, EnvelopeConfig, EnvelopeError};

// Secp256k1 exports (EVM-compatible)
pub use secp256k1::{address_of, Secp256k1PublicKey, Secp256k1SecretKey};

// Error exports
pub use error::CryptoError;

// Secure memory exports
pub use secure::{ExposeSecret, SecretBytes, SecretString};

// Keystore exports
pub use keystore::{KdfConfig, KeystoreError, RecordBuilder, SecretRecord, SecretStore};

// Registry exports
pub use registry::{
    Account, AccountLabel, AccountRef, FixedPassword, NoPassword, PasswordCache,
    PasswordProvider, Registry, RegistryError, RegistryOptions,
};

// Signer exports
pub use signer::{
    decode_raw, DecodedTransaction, SignedTransaction, SignerError, TransactionSigner,
    TransactionSkeleton,
};
