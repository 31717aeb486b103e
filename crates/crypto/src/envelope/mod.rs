//! Password-based cipher envelope, compatible with `openssl enc`
//!
//! Output is base64 of `"Salted__" || salt(8) || AES-CBC ciphertext`, wrapped
//! at 64 columns. Anything produced here decrypts with
//! `openssl enc -d -a -aes-256-cbc -md <digest>` and vice versa.
//!
//! Algorithms are chosen by an explicit [`EnvelopeConfig`]; unknown names are
//! rejected when the envelope is constructed.
//!
//! # Example
//!
//! ```rust
//! use keyvault_crypto::envelope::CipherEnvelope;
//!
//! let envelope = CipherEnvelope::default();
//! let text = envelope.encrypt(b"hello world", "test", &[]).unwrap();
//! let plain = envelope.decrypt(&text, "test", &[]).unwrap();
//! assert_eq!(plain, b"hello world");
//! ```

mod algorithms;
mod error;
mod kdf;

use std::fs;
use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use algorithms::{CipherKind, DigestKind};
pub use error::{EnvelopeError, EnvelopeResult};
pub use kdf::{bytes_to_key, DerivedKey};

/// Marker that precedes an embedded salt
pub const SALTED_MAGIC: &[u8; 8] = b"Salted__";

/// Salt length in bytes
pub const SALT_LENGTH: usize = 8;

/// Key length the envelope requires from the KDF
pub const ENVELOPE_KEY_LENGTH: usize = 32;

/// Substituted when the caller passes an empty password
pub const DEFAULT_PASSWORD: &str = " deFau1t pASsw0rD";

const LINE_WIDTH: usize = 64;

/// Algorithm selection for a [`CipherEnvelope`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct EnvelopeConfig {
    /// Cipher name, e.g. "aes-256-cbc"
    pub cipher: String,
    /// KDF digest name, e.g. "sha256" or "md5"
    pub digest: String,
    /// Digest iterations per KDF block
    pub rounds: u32,
    /// Prefix output with the salt marker and salt
    pub embed_salt: bool,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            cipher: "aes-256-cbc".to_string(),
            digest: "sha256".to_string(),
            rounds: 1,
            embed_salt: true,
        }
    }
}

/// Symmetric password encryption of arbitrary byte blobs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CipherEnvelope {
    cipher: CipherKind,
    digest: DigestKind,
    rounds: u32,
    embed_salt: bool,
}

impl Default for CipherEnvelope {
    fn default() -> Self {
        Self {
            cipher: CipherKind::Aes256Cbc,
            digest: DigestKind::Sha256,
            rounds: 1,
            embed_salt: true,
        }
    }
}

impl CipherEnvelope {
    /// Resolve the configured algorithm names
    pub fn new(config: &EnvelopeConfig) -> EnvelopeResult<Self> {
        if config.rounds == 0 {
            return Err(EnvelopeError::KdfFailure(
                "round count must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            cipher: CipherKind::from_name(&config.cipher)?,
            digest: DigestKind::from_name(&config.digest)?,
            rounds: config.rounds,
            embed_salt: config.embed_salt,
        })
    }

    /// Configured cipher
    pub fn cipher(&self) -> CipherKind {
        self.cipher
    }

    /// Configured digest
    pub fn digest(&self) -> DigestKind {
        self.digest
    }

    /// Encrypt `plaintext` and return base64 text.
    ///
    /// An empty `salt` means generate 8 random bytes; otherwise it must be
    /// exactly 8 bytes. Without an embedded salt the caller must supply one,
    /// since a generated salt would be lost.
    pub fn encrypt(&self, plaintext: &[u8], password: &str, salt: &[u8]) -> EnvelopeResult<String> {
        let salt = match salt.len() {
            0 if !self.embed_salt => return Err(EnvelopeError::SaltLengthInvalid(0)),
            0 => {
                let mut fresh = [0u8; SALT_LENGTH];
                rand::thread_rng().fill_bytes(&mut fresh);
                fresh
            }
            SALT_LENGTH => {
                let mut fixed = [0u8; SALT_LENGTH];
                fixed.copy_from_slice(salt);
                fixed
            }
            len => return Err(EnvelopeError::SaltLengthInvalid(len)),
        };

        let derived = self.derive(password, Some(&salt))?;
        let ciphertext = self.cipher.encrypt(&derived.key, &derived.iv, plaintext)?;

        let mut data = Vec::with_capacity(16 + ciphertext.len());
        if self.embed_salt {
            data.extend_from_slice(SALTED_MAGIC);
            data.extend_from_slice(&salt);
        }
        data.extend_from_slice(&ciphertext);

        Ok(wrap_lines(&STANDARD.encode(&data)))
    }

    /// Decrypt base64 text.
    ///
    /// An embedded salt wins over `salt`. Without either, the key is derived
    /// unsalted.
    pub fn decrypt(&self, text: &str, password: &str, salt: &[u8]) -> EnvelopeResult<Vec<u8>> {
        let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        let data = STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| EnvelopeError::InvalidBase64(e.to_string()))?;

        let (salt, ciphertext) =
            if data.len() >= 2 * SALT_LENGTH && data.starts_with(SALTED_MAGIC) {
                (
                    Some(&data[SALT_LENGTH..2 * SALT_LENGTH]),
                    &data[2 * SALT_LENGTH..],
                )
            } else {
                match salt.len() {
                    0 => (None, &data[..]),
                    SALT_LENGTH => (Some(salt), &data[..]),
                    len => return Err(EnvelopeError::SaltLengthInvalid(len)),
                }
            };

        let derived = self.derive(password, salt)?;
        self.cipher.decrypt(&derived.key, &derived.iv, ciphertext)
    }

    /// Encrypt the file at `input` into base64 text at `output`
    pub fn encrypt_file(
        &self,
        input: &Path,
        output: &Path,
        password: &str,
        salt: &[u8],
    ) -> EnvelopeResult<()> {
        let plaintext = zeroize::Zeroizing::new(fs::read(input)?);
        let mut text = self.encrypt(&plaintext, password, salt)?;
        text.push('\n');
        crate::fs::write_atomic(output, text.as_bytes())?;
        debug!(input = %input.display(), output = %output.display(), "file encrypted");
        Ok(())
    }

    /// Decrypt base64 text at `input` into `output`
    pub fn decrypt_file(
        &self,
        input: &Path,
        output: &Path,
        password: &str,
        salt: &[u8],
    ) -> EnvelopeResult<()> {
        let text = fs::read_to_string(input)?;
        let plaintext = zeroize::Zeroizing::new(self.decrypt(&text, password, salt)?);
        crate::fs::write_atomic(output, &plaintext)?;
        debug!(input = %input.display(), output = %output.display(), "file decrypted");
        Ok(())
    }

    fn derive(&self, password: &str, salt: Option<&[u8]>) -> EnvelopeResult<DerivedKey> {
        let password = if password.is_empty() {
            DEFAULT_PASSWORD
        } else {
            password
        };

        let derived = bytes_to_key(
            self.digest,
            password.as_bytes(),
            salt,
            self.rounds,
            self.cipher.key_len(),
            self.cipher.iv_len(),
        );

        if derived.key.len() != ENVELOPE_KEY_LENGTH {
            return Err(EnvelopeError::KdfFailure(format!(
                "{} yields a {}-byte key, expected {}",
                self.cipher.name(),
                derived.key.len(),
                ENVELOPE_KEY_LENGTH
            )));
        }
        Ok(derived)
    }
}

fn wrap_lines(encoded: &str) -> String {
    let mut out = String::with_capacity(encoded.len() + encoded.len() / LINE_WIDTH);
    for (i, ch) in encoded.chars().enumerate() {
        if i > 0 && i % LINE_WIDTH == 0 {
            out.push('\n');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SALT: [u8; 8] = [1, 2, 3, 4, 5, 6, 7, 8];

    fn envelope(cipher: &str, digest: &str) -> CipherEnvelope {
        CipherEnvelope::new(&EnvelopeConfig {
            cipher: cipher.to_string(),
            digest: digest.to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_hello_world_roundtrip() {
        let env = CipherEnvelope::default();
        let text = env.encrypt(b"hello world", "test", &[]).unwrap();
        assert!(text.starts_with("U2FsdGVkX1"));
        assert_eq!(env.decrypt(&text, "test", &[]).unwrap(), b"hello world");
    }

    #[test]
    fn test_fixed_salt_matches_openssl() {
        let env = CipherEnvelope::default();
        let text = env.encrypt(b"hello world", "test", &SALT).unwrap();
        assert_eq!(text, "U2FsdGVkX18BAgMEBQYHCLbWEKZmZGW12Nw1BOIu7rI=");
    }

    #[test]
    fn test_decrypts_openssl_output() {
        // printf 'hello world' | openssl enc -aes-256-cbc -md sha256 -pass pass:test -a
        let env = CipherEnvelope::default();
        let plain = env
            .decrypt("U2FsdGVkX1+Uv0VjZm5M6i0e7iL8uqH6Fu9SKo/jttE=", "test", &[])
            .unwrap();
        assert_eq!(plain, b"hello world");
    }

    #[test]
    fn test_decrypts_openssl_md5_output() {
        let env = envelope("aes-256-cbc", "md5");
        let plain = env
            .decrypt("U2FsdGVkX18hKxdeLeTrO8vslPTPBd/A4ISgX5oymsE=", "test", &[])
            .unwrap();
        assert_eq!(plain, b"hello world");
    }

    #[test]
    fn test_decrypts_wrapped_openssl_output() {
        let text = "U2FsdGVkX1/tuz0TzVYhajBv6XC7AapJVu4Vbzi8xHw0+gvGDNamXqD5GQaALVmi\n\
                    7uiO+UxI/Svyqa5aRh28H1Chzd0qaGvQO9W+vSVl8iIA7hIv6T7GXHaNPNKxXFl2\n\
                    rWhj3WRr/1QsU1QLcT25OJYHNef0W3ACKRgQTmgKu3d7Z5R3zd6k3r7h+AZ9H8PC\n\
                    6DHQxxQxDSXWseF5JSDIDw==\n";
        let plain = CipherEnvelope::default()
            .decrypt(text, "correct-horse", &[])
            .unwrap();
        assert_eq!(plain, "The quick brown fox jumps over the lazy dog. ".repeat(3).as_bytes());
    }

    #[test]
    fn test_output_wrapped_at_64_columns() {
        let text = CipherEnvelope::default()
            .encrypt(&[b'x'; 100], "test", &SALT)
            .unwrap();
        assert_eq!(
            text,
            "U2FsdGVkX18BAgMEBQYHCOavEaQW6QQ7a7LtHnEZL/lYYqk6OEkGTvFxTviQAObg\n\
             vvGSAvB2NmG9XNs1F0yN+2EFu+0anoaUlCUPhtky1DaYmLZ26LMlut7bLSu15sTP\n\
             6ZLmnCSgUNRpM2AjvXi/a/ASH6XmBykdJIOooBQFDVY="
        );
    }

    #[test]
    fn test_embedded_salt_overrides_argument() {
        let env = CipherEnvelope::default();
        let text = env.encrypt(b"hello world", "test", &SALT).unwrap();
        let plain = env.decrypt(&text, "test", &[9; 8]).unwrap();
        assert_eq!(plain, b"hello world");
    }

    #[test]
    fn test_without_marker_uses_supplied_salt() {
        let env = CipherEnvelope::new(&EnvelopeConfig {
            embed_salt: false,
            ..Default::default()
        })
        .unwrap();

        let text = env.encrypt(b"hello world", "test", &SALT).unwrap();
        assert_eq!(text, "ttYQpmZkZbXY3DUE4i7usg==");
        assert_eq!(env.decrypt(&text, "test", &SALT).unwrap(), b"hello world");
    }

    #[test]
    fn test_without_marker_requires_salt() {
        let env = CipherEnvelope::new(&EnvelopeConfig {
            embed_salt: false,
            ..Default::default()
        })
        .unwrap();

        assert!(matches!(
            env.encrypt(b"hello world", "test", &[]),
            Err(EnvelopeError::SaltLengthInvalid(0))
        ));
    }

    #[test]
    fn test_unsalted_matches_openssl_nosalt() {
        // openssl enc -aes-256-cbc -md sha256 -pass pass:test -nosalt -a
        let plain = CipherEnvelope::default()
            .decrypt("XOIaZtOVHistTZ1NlVQQSg==", "test", &[])
            .unwrap();
        assert_eq!(plain, b"hello world");
    }

    #[test]
    fn test_empty_password_uses_default() {
        let env = CipherEnvelope::default();
        let text = env.encrypt(b"hello world", "", &SALT).unwrap();
        assert_eq!(text, "U2FsdGVkX18BAgMEBQYHCKXBIUROnpbLFMHksLX1Fao=");
        assert_eq!(
            env.decrypt(&text, DEFAULT_PASSWORD, &[]).unwrap(),
            b"hello world"
        );
    }

    #[test]
    fn test_wrong_password_fails() {
        let env = CipherEnvelope::default();
        let text = env.encrypt(b"hello world", "test", &SALT).unwrap();
        assert!(matches!(
            env.decrypt(&text, "nope", &[]),
            Err(EnvelopeError::DecryptionFailed)
        ));
    }

    #[test]
    fn test_salt_length_checked() {
        let env = CipherEnvelope::default();
        assert!(matches!(
            env.encrypt(b"x", "pw", &[1, 2, 3]),
            Err(EnvelopeError::SaltLengthInvalid(3))
        ));
        assert!(matches!(
            env.decrypt("XOIaZtOVHistTZ1NlVQQSg==", "pw", &[0; 9]),
            Err(EnvelopeError::SaltLengthInvalid(9))
        ));
    }

    #[test]
    fn test_unknown_algorithms_rejected_at_construction() {
        let bad_cipher = EnvelopeConfig {
            cipher: "rc4".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            CipherEnvelope::new(&bad_cipher),
            Err(EnvelopeError::UnsupportedCipher(_))
        ));

        let bad_digest = EnvelopeConfig {
            digest: "sha3-256".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            CipherEnvelope::new(&bad_digest),
            Err(EnvelopeError::UnsupportedDigest(_))
        ));

        let zero_rounds = EnvelopeConfig {
            rounds: 0,
            ..Default::default()
        };
        assert!(matches!(
            CipherEnvelope::new(&zero_rounds),
            Err(EnvelopeError::KdfFailure(_))
        ));
    }

    #[test]
    fn test_short_key_cipher_is_kdf_failure() {
        let env = envelope("aes-128-cbc", "sha256");
        assert!(matches!(
            env.encrypt(b"x", "pw", &SALT),
            Err(EnvelopeError::KdfFailure(_))
        ));
    }

    #[test]
    fn test_invalid_base64() {
        assert!(matches!(
            CipherEnvelope::default().decrypt("!!!not base64!!!", "pw", &[]),
            Err(EnvelopeError::InvalidBase64(_))
        ));
    }

    #[test]
    fn test_rounds_change_output() {
        let one = CipherEnvelope::default();
        let many = CipherEnvelope::new(&EnvelopeConfig {
            rounds: 1000,
            ..Default::default()
        })
        .unwrap();

        let a = one.encrypt(b"payload", "pw", &SALT).unwrap();
        let b = many.encrypt(b"payload", "pw", &SALT).unwrap();
        assert_ne!(a, b);
        assert_eq!(many.decrypt(&b, "pw", &[]).unwrap(), b"payload");
    }

    #[test]
    fn test_config_partial_with_defaults() {
        let cfg: EnvelopeConfig =
            serde_json::from_str(r#"{"digest":"MD5","embed-salt":false}"#).unwrap();
        assert_eq!(cfg.cipher, "aes-256-cbc");
        assert_eq!(cfg.rounds, 1);
        assert!(!cfg.embed_salt);
        assert_eq!(CipherEnvelope::new(&cfg).unwrap().digest(), DigestKind::Md5);
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = TempDir::new().unwrap();
        let plain_path = dir.path().join("notes.txt");
        let enc_path = dir.path().join("notes.txt.enc");
        let out_path = dir.path().join("notes.out");
        fs::write(&plain_path, b"seed words go here").unwrap();

        let env = CipherEnvelope::default();
        env.encrypt_file(&plain_path, &enc_path, "pw", &[]).unwrap();
        let text = fs::read_to_string(&enc_path).unwrap();
        assert!(text.starts_with("U2FsdGVkX1"));
        assert!(text.ends_with('\n'));

        env.decrypt_file(&enc_path, &out_path, "pw", &[]).unwrap();
        assert_eq!(fs::read(&out_path).unwrap(), b"seed words go here");
    }
}
