//! Password providers and the in-process password cache

use std::collections::HashMap;
use std::fmt;

use alloy_primitives::{keccak256, B256};
use parking_lot::RwLock;
use zeroize::Zeroizing;

use crate::secure::{duplicate_password, SecretString};

/// Salted hash identifying a password without storing it
pub type PasswordHash = B256;

/// keccak256(salt || password)
pub fn hash_password(salt: &[u8], password: &str) -> PasswordHash {
    let mut preimage = Zeroizing::new(Vec::with_capacity(salt.len() + password.len()));
    preimage.extend_from_slice(salt);
    preimage.extend_from_slice(password.as_bytes());
    keccak256(&preimage[..])
}

/// Something that may be able to produce a password.
///
/// Implementations may block, e.g. while prompting a user.
pub trait PasswordProvider {
    /// Produce a password, or `None` if none can be obtained
    fn try_get_password(&self) -> Option<SecretString>;
}

/// Provider that never has a password
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPassword;

impl PasswordProvider for NoPassword {
    fn try_get_password(&self) -> Option<SecretString> {
        None
    }
}

/// Provider that always returns the same password
pub struct FixedPassword(SecretString);

impl FixedPassword {
    pub fn new(password: impl Into<String>) -> Self {
        Self(SecretString::from(password.into()))
    }
}

impl PasswordProvider for FixedPassword {
    fn try_get_password(&self) -> Option<SecretString> {
        Some(duplicate_password(&self.0))
    }
}

impl fmt::Debug for FixedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FixedPassword([REDACTED])")
    }
}

impl<F> PasswordProvider for F
where
    F: Fn() -> Option<String>,
{
    fn try_get_password(&self) -> Option<SecretString> {
        self().map(SecretString::from)
    }
}

/// Passwords and hints keyed by password hash.
///
/// Process-scoped and never persisted. Share one instance between registries
/// with `Arc`.
#[derive(Default)]
pub struct PasswordCache {
    passwords: RwLock<HashMap<PasswordHash, SecretString>>,
    hints: RwLock<HashMap<PasswordHash, String>>,
}

impl PasswordCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the cached password for `hash`
    pub fn get(&self, hash: &PasswordHash) -> Option<SecretString> {
        self.passwords.read().get(hash).map(duplicate_password)
    }

    /// Whether a password is cached for `hash`
    pub fn contains(&self, hash: &PasswordHash) -> bool {
        self.passwords.read().contains_key(hash)
    }

    /// Cache `password` under `hash`
    pub fn insert(&self, hash: PasswordHash, password: &SecretString) {
        self.passwords
            .write()
            .insert(hash, duplicate_password(password));
    }

    /// Remember a non-empty hint for `hash`
    pub fn note_hint(&self, hash: PasswordHash, hint: &str) {
        if !hint.is_empty() {
            self.hints.write().insert(hash, hint.to_string());
        }
    }

    /// Hint noted for `hash`
    pub fn hint(&self, hash: &PasswordHash) -> Option<String> {
        self.hints.read().get(hash).cloned()
    }

    /// Drop the cached password for `hash`
    pub fn forget(&self, hash: &PasswordHash) {
        self.passwords.write().remove(hash);
    }

    /// Drop every cached password and hint
    pub fn clear(&self) {
        self.passwords.write().clear();
        self.hints.write().clear();
    }

    /// Number of cached passwords
    pub fn len(&self) -> usize {
        self.passwords.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for PasswordCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordCache")
            .field("passwords", &self.len())
            .field("hints", &self.hints.read().len())
            .finish()
    }
}
