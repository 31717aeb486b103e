//! Registered cipher and digest names

use cipher::block_padding::Pkcs7;
use cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use sha2::Digest;

use super::error::{EnvelopeError, EnvelopeResult};

/// CBC block length shared by all registered ciphers
pub const BLOCK_LENGTH: usize = 16;

/// Block ciphers the envelope can name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherKind {
    Aes128Cbc,
    Aes192Cbc,
    Aes256Cbc,
}

impl CipherKind {
    /// Look up a cipher by name, ignoring case
    pub fn from_name(name: &str) -> EnvelopeResult<Self> {
        match name.to_ascii_lowercase().as_str() {
            "aes-128-cbc" => Ok(Self::Aes128Cbc),
            "aes-192-cbc" => Ok(Self::Aes192Cbc),
            "aes-256-cbc" => Ok(Self::Aes256Cbc),
            _ => Err(EnvelopeError::UnsupportedCipher(name.to_string())),
        }
    }

    /// Canonical name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Aes128Cbc => "aes-128-cbc",
            Self::Aes192Cbc => "aes-192-cbc",
            Self::Aes256Cbc => "aes-256-cbc",
        }
    }

    /// Key length in bytes
    pub fn key_len(&self) -> usize {
        match self {
            Self::Aes128Cbc => 16,
            Self::Aes192Cbc => 24,
            Self::Aes256Cbc => 32,
        }
    }

    /// IV length in bytes
    pub fn iv_len(&self) -> usize {
        BLOCK_LENGTH
    }

    /// CBC encrypt with PKCS#7 padding
    pub fn encrypt(&self, key: &[u8], iv: &[u8], plaintext: &[u8]) -> EnvelopeResult<Vec<u8>> {
        let bad_key = |_| EnvelopeError::KdfFailure("key or IV length mismatch".to_string());
        let ciphertext = match self {
            Self::Aes128Cbc => cbc::Encryptor::<aes::Aes128>::new_from_slices(key, iv)
                .map_err(bad_key)?
                .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
            Self::Aes192Cbc => cbc::Encryptor::<aes::Aes192>::new_from_slices(key, iv)
                .map_err(bad_key)?
                .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
            Self::Aes256Cbc => cbc::Encryptor::<aes::Aes256>::new_from_slices(key, iv)
                .map_err(bad_key)?
                .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        };
        Ok(ciphertext)
    }

    /// CBC decrypt and strip PKCS#7 padding
    pub fn decrypt(&self, key: &[u8], iv: &[u8], ciphertext: &[u8]) -> EnvelopeResult<Vec<u8>> {
        let bad_key = |_| EnvelopeError::KdfFailure("key or IV length mismatch".to_string());
        let unpadded = match self {
            Self::Aes128Cbc => cbc::Decryptor::<aes::Aes128>::new_from_slices(key, iv)
                .map_err(bad_key)?
                .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
            Self::Aes192Cbc => cbc::Decryptor::<aes::Aes192>::new_from_slices(key, iv)
                .map_err(bad_key)?
                .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
            Self::Aes256Cbc => cbc::Decryptor::<aes::Aes256>::new_from_slices(key, iv)
                .map_err(bad_key)?
                .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        };
        unpadded.map_err(|_| EnvelopeError::DecryptionFailed)
    }
}

/// Message digests usable for key derivation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestKind {
    Md5,
    Sha1,
    Sha256,
    Sha512,
}

impl DigestKind {
    /// Look up a digest by name, ignoring case
    pub fn from_name(name: &str) -> EnvelopeResult<Self> {
        match name.to_ascii_lowercase().as_str() {
            "md5" => Ok(Self::Md5),
            "sha1" => Ok(Self::Sha1),
            "sha256" => Ok(Self::Sha256),
            "sha512" => Ok(Self::Sha512),
            _ => Err(EnvelopeError::UnsupportedDigest(name.to_string())),
        }
    }

    /// Canonical name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
        }
    }

    /// Hash `data`
    pub fn hash(&self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Md5 => md5::Md5::digest(data).to_vec(),
            Self::Sha1 => sha1::Sha1::digest(data).to_vec(),
            Self::Sha256 => sha2::Sha256::digest(data).to_vec(),
            Self::Sha512 => sha2::Sha512::digest(data).to_vec(),
        }
    }
}
