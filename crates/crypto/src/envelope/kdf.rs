//! OpenSSL `EVP_BytesToKey` key derivation
//!
//! D_1 = H^rounds(password || salt), D_i = H^rounds(D_{i-1} || password || salt).
//! The concatenation D_1 || D_2 || ... is cut into key then IV.

use zeroize::Zeroizing;

use super::algorithms::DigestKind;

/// Key and IV derived for one encryption or decryption
pub struct DerivedKey {
    /// Cipher key
    pub key: Zeroizing<Vec<u8>>,
    /// Initialization vector
    pub iv: Zeroizing<Vec<u8>>,
}

/// Derive `key_len + iv_len` bytes from `password` and an optional 8-byte
/// salt. `rounds` below 1 is treated as 1.
pub fn bytes_to_key(
    digest: DigestKind,
    password: &[u8],
    salt: Option<&[u8]>,
    rounds: u32,
    key_len: usize,
    iv_len: usize,
) -> DerivedKey {
    let wanted = key_len + iv_len;
    let mut material = Zeroizing::new(Vec::with_capacity(wanted));
    let mut block: Zeroizing<Vec<u8>> = Zeroizing::new(Vec::new());

    while material.len() < wanted {
        let mut input = Zeroizing::new(Vec::with_capacity(block.len() + password.len() + 8));
        input.extend_from_slice(&block);
        input.extend_from_slice(password);
        if let Some(salt) = salt {
            input.extend_from_slice(salt);
        }

        block = Zeroizing::new(digest.hash(&input));
        for _ in 1..rounds.max(1) {
            block = Zeroizing::new(digest.hash(&block));
        }
        material.extend_from_slice(&block);
    }

    DerivedKey {
        key: Zeroizing::new(material[..key_len].to_vec()),
        iv: Zeroizing::new(material[key_len..wanted].to_vec()),
    }
}
