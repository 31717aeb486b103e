//! Keccak-256 MAC for record integrity
//!
//! The MAC is computed over: derived_key[16..32] || ciphertext.
//! A match proves the password derived the right key AND the ciphertext
//! is intact. A mismatch cannot tell the two apart.

use alloy_primitives::keccak256;

use super::error::{KeystoreError, KeystoreResult};

/// Compute the MAC for a derived key and ciphertext
pub fn compute_mac(derived_key: &[u8], ciphertext: &[u8]) -> KeystoreResult<[u8; 32]> {
    if derived_key.len() < 32 {
        return Err(KeystoreError::InvalidKdfParams(format!(
            "derived key must be at least 32 bytes, got {}",
            derived_key.len()
        )));
    }

    let mut preimage = Vec::with_capacity(16 + ciphertext.len());
    preimage.extend_from_slice(&derived_key[16..32]);
    preimage.extend_from_slice(ciphertext);

    Ok(keccak256(&preimage).0)
}

/// Verify a hex-encoded MAC.
///
/// Returns `InvalidPassword` on mismatch, including a MAC that is not valid
/// hex.
pub fn verify_mac(derived_key: &[u8], ciphertext: &[u8], expected_hex: &str) -> KeystoreResult<()> {
    let computed = compute_mac(derived_key, ciphertext)?;
    let expected = hex::decode(expected_hex).map_err(|_| KeystoreError::InvalidPassword)?;

    if constant_time_eq(&computed, &expected) {
        Ok(())
    } else {
        Err(KeystoreError::InvalidPassword)
    }
}

/// Constant-time comparison
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
