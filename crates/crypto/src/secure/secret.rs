//! Secret wrapper utilities for consistent secret handling
//!
//! Thin aliases over the `secrecy` crate so that passwords, derived keys and
//! decrypted private keys all share one zeroize-on-drop representation.

use secrecy::{ExposeSecret, SecretBox, SecretString as SecrecySecretString};

/// A secret byte buffer that is zeroized on drop.
///
/// Used for derived keys and decrypted private keys. The inner value can
/// only be reached through `expose_secret()`.
///
/// # Example
///
/// ```rust
/// use keyvault_crypto::secure::SecretBytes;
/// use secrecy::ExposeSecret;
///
/// let secret = SecretBytes::new(Box::new(vec![1, 2, 3, 4]));
/// assert_eq!(secret.expose_secret(), &vec![1, 2, 3, 4]);
/// ```
pub type SecretBytes = SecretBox<Vec<u8>>;

/// A secret string (passwords) that is zeroized on drop.
pub type SecretString = SecrecySecretString;

/// Copy a secret string into a fresh, independently owned secret.
///
/// `SecretString` is deliberately not `Clone`; the password cache hands out
/// copies through this instead.
pub fn duplicate_password(secret: &SecretString) -> SecretString {
    SecretString::from(secret.expose_secret().to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_string() {
        let secret: SecretString = "my-passphrase".to_string().into();
        let exposed: &str = secret.expose_secret();
        assert_eq!(exposed, "my-passphrase");
    }

    #[test]
    fn test_duplicate_password_is_independent() {
        let original = SecretString::from("alicepw");
        let copy = duplicate_password(&original);
        drop(original);
        assert_eq!(copy.expose_secret(), "alicepw");
    }

    #[test]
    fn test_debug_does_not_leak() {
        let secret = SecretString::from("hunter2");
        let debug = format!("{:?}", secret);
        assert!(!debug.contains("hunter2"));
    }
}
