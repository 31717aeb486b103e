//! On-disk registry file
//!
//! The file is `{version, crypto}` where `crypto` is the same section used by
//! secret records. The plaintext inside is the JSON of [`RegistryContents`].

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::account::Account;
use super::error::{RegistryError, RegistryResult};
use super::password::PasswordHash;
use crate::keystore::{CryptoModule, KdfConfig, KdfModule};
use crate::secure::SecretBytes;

/// Registry file format version
pub const REGISTRY_VERSION: u32 = 1;

/// Encrypted registry file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryFile {
    pub version: u32,
    pub crypto: CryptoModule,
}

/// Decrypted registry payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryContents {
    /// Salt for password hashes, hex
    pub password_salt: String,
    /// Hash of the master password
    pub master_hash: PasswordHash,
    /// Registered accounts
    pub accounts: Vec<Account>,
}

/// Key material that unlocks the registry file without the master password
pub struct FileKey {
    pub kdf: KdfModule,
    pub key: SecretBytes,
}

impl FileKey {
    /// Derive a fresh key (new salt) from the master password
    pub fn derive(master: &str, kdf: &KdfConfig) -> RegistryResult<Self> {
        let kdf = kdf.fresh_module();
        let key = kdf.derive_key(master.as_bytes())?;
        Ok(Self { kdf, key })
    }
}

/// Read the registry file and unlock it with `master`
pub fn read(path: &Path, master: &str) -> RegistryResult<(RegistryContents, FileKey)> {
    let json = match fs::read_to_string(path) {
        Ok(json) => json,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(RegistryError::NotFound(path.to_path_buf()))
        }
        Err(e) => return Err(e.into()),
    };

    let file: RegistryFile = serde_json::from_str(&json)?;
    if file.version != REGISTRY_VERSION {
        return Err(RegistryError::UnsupportedVersion(file.version));
    }

    let key = file.crypto.derive_key(master.as_bytes())?;
    let plaintext = file.crypto.open_with_key(key.expose_secret())?;
    let contents: RegistryContents = serde_json::from_slice(plaintext.expose_secret())?;

    Ok((
        contents,
        FileKey {
            kdf: file.crypto.kdf,
            key,
        },
    ))
}

/// Encrypt `contents` under `key` and atomically replace the file at `path`
pub fn write(path: &Path, contents: &RegistryContents, key: &FileKey) -> RegistryResult<()> {
    let plaintext = Zeroizing::new(serde_json::to_vec(contents)?);
    let crypto = CryptoModule::seal_with_key(&plaintext, key.kdf.clone(), key.key.expose_secret())?;

    let file = RegistryFile {
        version: REGISTRY_VERSION,
        crypto,
    };
    crate::fs::write_atomic(path, serde_json::to_string_pretty(&file)?.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const FAST: KdfConfig = KdfConfig::Scrypt { n: 1024, r: 8, p: 1 };

    #[test]
    fn test_write_read_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("registry.json");

        let contents = RegistryContents {
            password_salt: hex::encode([7u8; 32]),
            ..Default::default()
        };
        let key = FileKey::derive("master", &FAST).unwrap();
        write(&path, &contents, &key).unwrap();

        let (loaded, _) = read(&path, "master").unwrap();
        assert_eq!(loaded.password_salt, contents.password_salt);
        assert!(loaded.accounts.is_empty());
    }

    #[test]
    fn test_wrong_master_password() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("registry.json");
        let key = FileKey::derive("master", &FAST).unwrap();
        write(&path, &RegistryContents::default(), &key).unwrap();

        assert!(matches!(
            read(&path, "not-master"),
            Err(RegistryError::InvalidPassword)
        ));
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            read(&dir.path().join("nope.json"), "pw"),
            Err(RegistryError::NotFound(_))
        ));
    }

    #[test]
    fn test_plaintext_not_on_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("registry.json");
        let contents = RegistryContents {
            password_salt: "feedface".repeat(8),
            ..Default::default()
        };
        write(&path, &contents, &FileKey::derive("m", &FAST).unwrap()).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("feedface"));
        assert!(raw.contains("\"version\": 1"));
    }

    #[test]
    fn test_rewrite_with_same_key_changes_iv_only() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("registry.json");
        let key = FileKey::derive("m", &FAST).unwrap();

        write(&path, &RegistryContents::default(), &key).unwrap();
        let first: RegistryFile = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        write(&path, &RegistryContents::default(), &key).unwrap();
        let second: RegistryFile =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();

        assert_eq!(first.crypto.kdf, second.crypto.kdf);
        assert_ne!(first.crypto.cipher.params, second.crypto.cipher.params);
    }
}
