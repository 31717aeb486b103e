//! AES-128-CTR encryption of record payloads
//!
//! The first 16 bytes of the derived key are the AES key. CTR mode needs no
//! padding, so ciphertext length equals secret length.

use aes::Aes128;
use cipher::{KeyIvInit, StreamCipher};
use ctr::Ctr128BE;
use serde::{Deserialize, Serialize};

use super::error::{KeystoreError, KeystoreResult};
use crate::secure::SecretBytes;

/// Only cipher written or accepted
pub const CIPHER_NAME: &str = "aes-128-ctr";

/// IV length for AES-128-CTR
pub const IV_LENGTH: usize = 16;

/// AES-128 key length
pub const AES_KEY_LENGTH: usize = 16;

type Aes128Ctr = Ctr128BE<Aes128>;

/// The `cipher` / `cipherparams` / `ciphertext` triple of a v3 crypto section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CipherModule {
    /// Cipher function identifier
    #[serde(rename = "cipher")]
    pub function: String,
    /// Cipher parameters
    #[serde(rename = "cipherparams")]
    pub params: CipherParams,
    /// Encrypted payload as hex string
    pub ciphertext: String,
}

impl CipherModule {
    /// Encrypt `plaintext` under `key[..16]` with a fresh random IV
    pub fn seal(plaintext: &[u8], key: &[u8]) -> KeystoreResult<Self> {
        let iv = generate_iv();
        let ciphertext = apply_keystream(plaintext, key, &iv)?;
        Ok(Self {
            function: CIPHER_NAME.to_string(),
            params: CipherParams {
                iv: hex::encode(iv),
            },
            ciphertext: hex::encode(ciphertext),
        })
    }

    /// Check the cipher name and IV
    pub fn validate(&self) -> KeystoreResult<()> {
        if self.function != CIPHER_NAME {
            return Err(KeystoreError::UnsupportedCipher(self.function.clone()));
        }
        self.iv().map(|_| ())
    }

    /// IV bytes; must be exactly 16
    pub fn iv(&self) -> KeystoreResult<[u8; IV_LENGTH]> {
        let bytes = hex::decode(&self.params.iv)
            .map_err(|e| KeystoreError::InvalidCipherParams(format!("invalid IV hex: {}", e)))?;
        bytes.as_slice().try_into().map_err(|_| {
            KeystoreError::InvalidCipherParams(format!(
                "IV must be {} bytes, got {}",
                IV_LENGTH,
                bytes.len()
            ))
        })
    }

    /// Ciphertext bytes
    pub fn ciphertext(&self) -> KeystoreResult<Vec<u8>> {
        hex::decode(&self.ciphertext)
            .map_err(|e| KeystoreError::HexError(format!("invalid ciphertext hex: {}", e)))
    }

    /// Decrypt with `key[..16]`. No integrity check happens here.
    pub fn open(&self, key: &[u8]) -> KeystoreResult<SecretBytes> {
        self.validate()?;
        let plaintext = apply_keystream(&self.ciphertext()?, key, &self.iv()?)?;
        Ok(SecretBytes::new(Box::new(plaintext)))
    }
}

/// Cipher parameters for AES-128-CTR
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CipherParams {
    /// Initialization vector as hex string
    pub iv: String,
}

/// XOR `data` with the AES-128-CTR keystream. Encryption and decryption are
/// the same operation.
pub fn apply_keystream(data: &[u8], key: &[u8], iv: &[u8]) -> KeystoreResult<Vec<u8>> {
    if key.len() < AES_KEY_LENGTH {
        return Err(KeystoreError::InvalidCipherParams(format!(
            "key must be at least {} bytes, got {}",
            AES_KEY_LENGTH,
            key.len()
        )));
    }

    let mut cipher = Aes128Ctr::new_from_slices(&key[..AES_KEY_LENGTH], iv).map_err(|_| {
        KeystoreError::InvalidCipherParams(format!(
            "IV must be {} bytes, got {}",
            IV_LENGTH,
            iv.len()
        ))
    })?;

    let mut out = data.to_vec();
    cipher.apply_keystream(&mut out);
    Ok(out)
}

/// Generate a random IV
pub fn generate_iv() -> [u8; IV_LENGTH] {
    use rand::RngCore;
    let mut iv = [0u8; IV_LENGTH];
    rand::thread_rng().fill_bytes(&mut iv);
    iv
}
