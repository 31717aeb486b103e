//! Password-based key derivation for secret records
//!
//! Two interchangeable KDFs are supported, matching the Web3 Secret Storage
//! definition: memory-hard scrypt and fixed-iteration PBKDF2-HMAC-SHA256.
//! Both always derive a 32-byte key: the first half encrypts, the second half
//! feeds the MAC.

use serde::{Deserialize, Serialize};
use sha2::Sha256;

use super::error::{KeystoreError, KeystoreResult};
use crate::secure::SecretBytes;

/// Derived key length in bytes
pub const DKLEN: u32 = 32;

/// Salt length in bytes
pub const SALT_LENGTH: usize = 32;

/// PRF name recorded for PBKDF2
pub const PBKDF2_PRF: &str = "hmac-sha256";

/// Which KDF to use for new records, and at what cost
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "lowercase")]
pub enum KdfConfig {
    /// scrypt; `n` must be a power of two
    Scrypt { n: u32, r: u32, p: u32 },
    /// PBKDF2-HMAC-SHA256 with `c` iterations
    Pbkdf2 { c: u32 },
}

impl KdfConfig {
    /// scrypt N=2^18, r=8, p=1
    pub const STANDARD_SCRYPT: Self = Self::Scrypt {
        n: 1 << 18,
        r: 8,
        p: 1,
    };

    /// scrypt N=2^12, r=8, p=6
    pub const LIGHT_SCRYPT: Self = Self::Scrypt { n: 1 << 12, r: 8, p: 6 };

    /// PBKDF2 with 262144 iterations
    pub const PBKDF2: Self = Self::Pbkdf2 { c: 262_144 };

    /// Build a KDF module for this configuration with the given salt
    pub fn module(&self, salt: &[u8]) -> KdfModule {
        let salt = hex::encode(salt);
        match *self {
            KdfConfig::Scrypt { n, r, p } => KdfModule {
                function: "scrypt".to_string(),
                params: KdfParams::Scrypt {
                    dklen: DKLEN,
                    n,
                    r,
                    p,
                    salt,
                },
            },
            KdfConfig::Pbkdf2 { c } => KdfModule {
                function: "pbkdf2".to_string(),
                params: KdfParams::Pbkdf2 {
                    c,
                    dklen: DKLEN,
                    prf: PBKDF2_PRF.to_string(),
                    salt,
                },
            },
        }
    }

    /// Build a KDF module with a freshly generated salt
    pub fn fresh_module(&self) -> KdfModule {
        self.module(&generate_salt())
    }
}

impl Default for KdfConfig {
    fn default() -> Self {
        Self::STANDARD_SCRYPT
    }
}

/// The `kdf` / `kdfparams` pair of a v3 crypto section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KdfModule {
    /// KDF function identifier ("scrypt" or "pbkdf2")
    #[serde(rename = "kdf")]
    pub function: String,
    /// KDF parameters
    #[serde(rename = "kdfparams")]
    pub params: KdfParams,
}

impl KdfModule {
    /// Check that the declared function matches the parameter shape and that
    /// the parameters are usable.
    pub fn validate(&self) -> KeystoreResult<()> {
        match (self.function.as_str(), &self.params) {
            ("scrypt", KdfParams::Scrypt { .. }) | ("pbkdf2", KdfParams::Pbkdf2 { .. }) => {
                self.params.validate()
            }
            ("scrypt", _) | ("pbkdf2", _) => Err(KeystoreError::InvalidKdfParams(format!(
                "parameters do not match kdf {}",
                self.function
            ))),
            (other, _) => Err(KeystoreError::UnsupportedKdf(other.to_string())),
        }
    }

    /// Derive a key from the given password
    pub fn derive_key(&self, password: &[u8]) -> KeystoreResult<SecretBytes> {
        self.validate()?;

        match &self.params {
            KdfParams::Scrypt {
                dklen,
                n,
                r,
                p,
                salt,
            } => {
                let salt = decode_salt(salt)?;
                scrypt_derive_key(password, &salt, *n, *r, *p, *dklen as usize)
            }
            KdfParams::Pbkdf2 { c, dklen, salt, .. } => {
                let salt = decode_salt(salt)?;
                Ok(pbkdf2_derive_key(password, &salt, *c, *dklen as usize))
            }
        }
    }
}

/// KDF parameters; the variant is recognised by its field set
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum KdfParams {
    /// scrypt parameters
    Scrypt {
        /// Derived key length in bytes
        dklen: u32,
        /// CPU/memory cost parameter (must be power of 2)
        n: u32,
        /// Block size parameter
        r: u32,
        /// Parallelization parameter
        p: u32,
        /// Salt as hex string
        salt: String,
    },
    /// PBKDF2 parameters
    Pbkdf2 {
        /// Iteration count
        c: u32,
        /// Derived key length in bytes
        dklen: u32,
        /// Pseudo-random function, only "hmac-sha256"
        prf: String,
        /// Salt as hex string
        salt: String,
    },
}

impl KdfParams {
    /// Validate the parameters
    pub fn validate(&self) -> KeystoreResult<()> {
        match self {
            KdfParams::Scrypt {
                dklen, n, r, p, salt,
            } => {
                check_dklen(*dklen)?;
                if *n < 2 || (*n & (*n - 1)) != 0 {
                    return Err(KeystoreError::InvalidKdfParams(
                        "n must be a power of 2 greater than 1".to_string(),
                    ));
                }
                if *r == 0 || *p == 0 {
                    return Err(KeystoreError::InvalidKdfParams(
                        "r and p must be positive".to_string(),
                    ));
                }
                decode_salt(salt).map(|_| ())
            }
            KdfParams::Pbkdf2 { c, dklen, prf, salt } => {
                check_dklen(*dklen)?;
                if *c == 0 {
                    return Err(KeystoreError::InvalidKdfParams(
                        "iteration count must be positive".to_string(),
                    ));
                }
                if prf != PBKDF2_PRF {
                    return Err(KeystoreError::InvalidKdfParams(format!(
                        "unsupported prf: {}",
                        prf
                    )));
                }
                decode_salt(salt).map(|_| ())
            }
        }
    }
}

fn check_dklen(dklen: u32) -> KeystoreResult<()> {
    // The MAC key is dk[16..32], so anything shorter is unusable.
    if dklen < DKLEN {
        return Err(KeystoreError::InvalidKdfParams(format!(
            "dklen must be at least {}",
            DKLEN
        )));
    }
    Ok(())
}

fn decode_salt(salt: &str) -> KeystoreResult<Vec<u8>> {
    hex::decode(salt).map_err(|e| KeystoreError::InvalidKdfParams(format!("invalid salt hex: {}", e)))
}

/// Derive a key using scrypt
pub fn scrypt_derive_key(
    password: &[u8],
    salt: &[u8],
    n: u32,
    r: u32,
    p: u32,
    dklen: usize,
) -> KeystoreResult<SecretBytes> {
    let log_n = n.trailing_zeros() as u8;

    let params = scrypt::Params::new(log_n, r, p, dklen)
        .map_err(|e| KeystoreError::InvalidKdfParams(e.to_string()))?;

    let mut output = vec![0u8; dklen];
    scrypt::scrypt(password, salt, &params, &mut output)
        .map_err(|e| KeystoreError::KdfError(e.to_string()))?;

    Ok(SecretBytes::new(Box::new(output)))
}

/// Derive a key using PBKDF2-HMAC-SHA256
pub fn pbkdf2_derive_key(password: &[u8], salt: &[u8], c: u32, dklen: usize) -> SecretBytes {
    let mut output = vec![0u8; dklen];
    pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, c, &mut output);
    SecretBytes::new(Box::new(output))
}

/// Generate a random salt
pub fn generate_salt() -> Vec<u8> {
    use rand::RngCore;
    let mut salt = vec![0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_scrypt_deterministic() {
        let salt = vec![0xAA; 32];

        let derived = scrypt_derive_key(b"test-password", &salt, 1024, 8, 1, 32).unwrap();
        assert_eq!(derived.expose_secret().len(), 32);

        let again = scrypt_derive_key(b"test-password", &salt, 1024, 8, 1, 32).unwrap();
        assert_eq!(derived.expose_secret(), again.expose_secret());

        let other = scrypt_derive_key(b"different", &salt, 1024, 8, 1, 32).unwrap();
        assert_ne!(derived.expose_secret(), other.expose_secret());
    }

    #[test]
    fn test_pbkdf2_known_vector() {
        // Derived key of the Web3 Secret Storage PBKDF2 test vector.
        let salt =
            hex::decode("ae3cd4e7013836a3df6bd7241b12db061dbe2c6785853cce422d148a624ce0bd")
                .unwrap();
        let module = KdfConfig::Pbkdf2 { c: 262_144 }.module(&salt);
        let dk = module.derive_key(b"testpassword").unwrap();

        assert_eq!(
            hex::encode(&dk.expose_secret()[..16]),
            "f06d69cdc7da0faffb1008270bca38f5"
        );
    }

    #[test]
    fn test_scrypt_params_validation() {
        let valid = KdfParams::Scrypt {
            dklen: 32,
            n: 16384,
            r: 8,
            p: 1,
            salt: hex::encode([0xAA; 32]),
        };
        assert!(valid.validate().is_ok());

        let bad_n = KdfParams::Scrypt {
            dklen: 32,
            n: 12345,
            r: 8,
            p: 1,
            salt: hex::encode([0xAA; 32]),
        };
        assert!(bad_n.validate().is_err());

        let short_dklen = KdfParams::Scrypt {
            dklen: 16,
            n: 16384,
            r: 8,
            p: 1,
            salt: hex::encode([0xAA; 32]),
        };
        assert!(short_dklen.validate().is_err());
    }

    #[test]
    fn test_pbkdf2_params_validation() {
        let wrong_prf = KdfParams::Pbkdf2 {
            c: 10,
            dklen: 32,
            prf: "hmac-sha512".to_string(),
            salt: hex::encode([1u8; 32]),
        };
        assert!(matches!(
            wrong_prf.validate(),
            Err(KeystoreError::InvalidKdfParams(_))
        ));

        let zero_rounds = KdfParams::Pbkdf2 {
            c: 0,
            dklen: 32,
            prf: PBKDF2_PRF.to_string(),
            salt: hex::encode([1u8; 32]),
        };
        assert!(zero_rounds.validate().is_err());
    }

    #[test]
    fn test_unknown_kdf_rejected() {
        let mut module = KdfConfig::Pbkdf2 { c: 10 }.fresh_module();
        module.function = "argon2".to_string();
        assert!(matches!(
            module.derive_key(b"pw"),
            Err(KeystoreError::UnsupportedKdf(name)) if name == "argon2"
        ));
    }

    #[test]
    fn test_mismatched_kdf_name_rejected() {
        let mut module = KdfConfig::Pbkdf2 { c: 10 }.fresh_module();
        module.function = "scrypt".to_string();
        assert!(matches!(
            module.validate(),
            Err(KeystoreError::InvalidKdfParams(_))
        ));
    }

    #[test]
    fn test_untagged_params_parse() {
        let scrypt: KdfParams =
            serde_json::from_str(r#"{"dklen":32,"n":262144,"r":8,"p":1,"salt":"00"}"#).unwrap();
        assert!(matches!(scrypt, KdfParams::Scrypt { n: 262144, .. }));

        let pbkdf2: KdfParams =
            serde_json::from_str(r#"{"c":262144,"dklen":32,"prf":"hmac-sha256","salt":"00"}"#)
                .unwrap();
        assert!(matches!(pbkdf2, KdfParams::Pbkdf2 { c: 262144, .. }));
    }

    #[test]
    fn test_kdf_module_serialization() {
        let module = KdfConfig::LIGHT_SCRYPT.module(&[0xCC; 32]);

        let json = serde_json::to_value(&module).unwrap();
        assert_eq!(json["kdf"], "scrypt");
        assert_eq!(json["kdfparams"]["n"], 4096);
        assert_eq!(json["kdfparams"]["p"], 6);

        let parsed: KdfModule = serde_json::from_value(json).unwrap();
        assert_eq!(module, parsed);
    }

    #[test]
    fn test_kdf_config_toml_shape() {
        let cfg: KdfConfig = serde_json::from_str(r#"{"algorithm":"pbkdf2","c":1000}"#).unwrap();
        assert_eq!(cfg, KdfConfig::Pbkdf2 { c: 1000 });
    }

    #[test]
    fn test_generate_salt() {
        let salt1 = generate_salt();
        let salt2 = generate_salt();

        assert_eq!(salt1.len(), SALT_LENGTH);
        assert_ne!(salt1, salt2);
    }
}
