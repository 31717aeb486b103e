//! Secure memory handling for key material and passwords
//!
//! - Automatic zeroing on drop via `zeroize`/`secrecy`
//! - Debug output masking to prevent log exposure
//! - No `Clone` on secret containers; copies are explicit

mod secret;

pub use secrecy::ExposeSecret;
pub use secret::{duplicate_password, SecretBytes, SecretString};
