//! Web3 Secret Storage (v3) encrypted secret records
//!
//! Every account secret is stored in its own versioned, self-contained JSON
//! record:
//!
//! - scrypt or PBKDF2-HMAC-SHA256 key derivation with a per-record salt
//! - AES-128-CTR encryption with a per-record IV
//! - keccak256 MAC over the second half of the derived key and the ciphertext
//! - UUID identifier, independent of the account address
//!
//! # Security Properties
//!
//! - A wrong password and a corrupted file both fail MAC verification and are
//!   reported as the same error
//! - Derived keys and decrypted secrets are zeroized on drop
//! - Record files are written atomically with 0600 permissions
//!
//! # Example
//!
//! ```rust,ignore
//! use keyvault_crypto::keystore::{KdfConfig, SecretRecord, SecretStore};
//!
//! let store = SecretStore::new("./keys".as_ref())?;
//! let record = SecretRecord::create(&secret_key_bytes, "my-password", &KdfConfig::default())?;
//! store.write(&record)?;
//!
//! let loaded = store.load(&record.id())?;
//! let secret = loaded.open("my-password")?;
//! ```

mod cipher;
mod error;
mod kdf;
mod mac;
mod record;
mod store;

pub use cipher::{CipherModule, CipherParams, CIPHER_NAME};
pub use error::{KeystoreError, KeystoreResult};
pub use kdf::{KdfConfig, KdfModule, KdfParams};
pub use mac::{compute_mac, verify_mac};
pub use record::{CryptoModule, RecordBuilder, SecretRecord, RECORD_VERSION};
pub use store::SecretStore;
