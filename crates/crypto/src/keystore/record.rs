//! Web3 Secret Storage v3 record
//!
//! A [`SecretRecord`] holds one encrypted secret together with everything
//! needed to decrypt it: KDF parameters, cipher IV and MAC. Records parse and
//! decrypt without the registry.

use std::fs;
use std::path::Path;

use alloy_primitives::Address;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;
use zeroize::Zeroizing;

use super::cipher::CipherModule;
use super::error::{KeystoreError, KeystoreResult};
use super::kdf::{KdfConfig, KdfModule};
use super::mac::{compute_mac, verify_mac};
use crate::secure::SecretBytes;

/// Record format version
pub const RECORD_VERSION: u32 = 3;

/// The `crypto` section: cipher + KDF + MAC, flattened as in the v3 layout
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CryptoModule {
    /// Cipher, IV and ciphertext
    #[serde(flatten)]
    pub cipher: CipherModule,
    /// KDF and its parameters
    #[serde(flatten)]
    pub kdf: KdfModule,
    /// keccak256(dk[16..32] || ciphertext) as hex
    pub mac: String,
}

impl CryptoModule {
    /// Encrypt `plaintext` under a key derived from `password` with a fresh
    /// salt and IV.
    pub fn seal(plaintext: &[u8], password: &[u8], kdf: &KdfConfig) -> KeystoreResult<Self> {
        let kdf = kdf.fresh_module();
        let derived_key = kdf.derive_key(password)?;
        Self::seal_with_key(plaintext, kdf, derived_key.expose_secret())
    }

    /// Encrypt with an already derived key. `kdf` must be the module that
    /// produced `derived_key`; only the IV is fresh.
    pub fn seal_with_key(
        plaintext: &[u8],
        kdf: KdfModule,
        derived_key: &[u8],
    ) -> KeystoreResult<Self> {
        let cipher = CipherModule::seal(plaintext, derived_key)?;
        let mac = compute_mac(derived_key, &cipher.ciphertext()?)?;

        Ok(Self {
            cipher,
            kdf,
            mac: hex::encode(mac),
        })
    }

    /// Run the KDF for `password`
    pub fn derive_key(&self, password: &[u8]) -> KeystoreResult<SecretBytes> {
        self.kdf.derive_key(password)
    }

    /// Derive the key, verify the MAC and decrypt
    pub fn open(&self, password: &[u8]) -> KeystoreResult<SecretBytes> {
        self.cipher.validate()?;
        let derived_key = self.derive_key(password)?;
        self.open_with_key(derived_key.expose_secret())
    }

    /// Verify the MAC and decrypt with an already derived key
    pub fn open_with_key(&self, derived_key: &[u8]) -> KeystoreResult<SecretBytes> {
        self.cipher.validate()?;
        verify_mac(derived_key, &self.cipher.ciphertext()?, &self.mac)?;
        self.cipher.open(derived_key)
    }
}

/// One encrypted account secret
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SecretRecord {
    /// Account address, lowercase hex without 0x
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Crypto parameters (KDF + cipher + MAC)
    #[serde(alias = "Crypto")]
    pub crypto: CryptoModule,
    /// Unique identifier
    pub id: Uuid,
    /// Format version
    pub version: u32,
}

impl SecretRecord {
    /// Encrypt `secret` under `password` with a freshly generated identifier
    pub fn create(secret: &[u8], password: &str, kdf: &KdfConfig) -> KeystoreResult<Self> {
        RecordBuilder::new()
            .secret(secret)
            .password(password)
            .kdf(*kdf)
            .build()
    }

    /// Decrypt the record and return the secret
    pub fn open(&self, password: &str) -> KeystoreResult<SecretBytes> {
        if self.version != RECORD_VERSION {
            return Err(KeystoreError::UnsupportedVersion(self.version));
        }
        self.crypto.open(password.as_bytes())
    }

    /// Re-encrypt under `new_password` with a fresh salt and IV.
    ///
    /// Identifier and address are preserved. `self` is untouched; callers
    /// replace the stored record once the returned one is written.
    pub fn recode(
        &self,
        old_password: &str,
        new_password: &str,
        kdf: &KdfConfig,
    ) -> KeystoreResult<Self> {
        let secret = self.open(old_password)?;

        let crypto = CryptoModule::seal(secret.expose_secret(), new_password.as_bytes(), kdf)?;
        debug!(id = %self.id, "record recoded");

        Ok(Self {
            address: self.address.clone(),
            crypto,
            id: self.id,
            version: RECORD_VERSION,
        })
    }

    /// Identifier
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Parsed address, if the record carries a valid one
    pub fn address(&self) -> Option<Address> {
        self.address.as_deref().and_then(|a| a.parse().ok())
    }

    /// Parse from JSON text
    pub fn from_json(json: &str) -> KeystoreResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to pretty JSON text
    pub fn to_json(&self) -> KeystoreResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Atomically write to `path` with 0600 permissions
    pub fn save<P: AsRef<Path>>(&self, path: P) -> KeystoreResult<()> {
        crate::fs::write_atomic(path.as_ref(), self.to_json()?.as_bytes())?;
        Ok(())
    }

    /// Load from `path`
    pub fn load<P: AsRef<Path>>(path: P) -> KeystoreResult<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }
}

/// Builder for [`SecretRecord`]
#[derive(Default)]
pub struct RecordBuilder {
    secret: Option<Zeroizing<Vec<u8>>>,
    password: Zeroizing<String>,
    kdf: KdfConfig,
    address: Option<Address>,
    id: Option<Uuid>,
}

impl RecordBuilder {
    /// Create a new builder using the standard scrypt profile
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the secret to encrypt
    pub fn secret(mut self, secret: &[u8]) -> Self {
        self.secret = Some(Zeroizing::new(secret.to_vec()));
        self
    }

    /// Set the password. Defaults to empty.
    pub fn password(mut self, password: &str) -> Self {
        self.password = Zeroizing::new(password.to_string());
        self
    }

    /// Select the KDF profile
    pub fn kdf(mut self, kdf: KdfConfig) -> Self {
        self.kdf = kdf;
        self
    }

    /// Record the account address
    pub fn address(mut self, address: Address) -> Self {
        self.address = Some(address);
        self
    }

    /// Set a custom identifier (normally generated)
    pub fn id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    /// Build the record
    pub fn build(self) -> KeystoreResult<SecretRecord> {
        let secret = self.secret.ok_or(KeystoreError::MissingSecret)?;
        if secret.is_empty() {
            return Err(KeystoreError::MissingSecret);
        }

        let crypto = CryptoModule::seal(&secret, self.password.as_bytes(), &self.kdf)?;

        Ok(SecretRecord {
            address: self.address.map(|a| hex::encode(a.as_slice())),
            crypto,
            id: self.id.unwrap_or_else(Uuid::new_v4),
            version: RECORD_VERSION,
        })
    }
}
