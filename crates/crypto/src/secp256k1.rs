//! Secp256k1 key handling and Ethereum address derivation
//!
//! The keystore only needs two things from the curve: validating that an
//! imported secret is a usable scalar, and deriving the account address
//! (keccak256(uncompressed_pubkey[1..])[12..]). Signing lives in
//! [`crate::signer`].

use crate::error::CryptoError;
use alloy_primitives::{keccak256, Address};
use k256::{elliptic_curve::sec1::ToEncodedPoint, SecretKey as K256SecretKey};
use rand::{CryptoRng, RngCore};

/// Length of a secp256k1 secret scalar in bytes
pub const SECRET_KEY_LENGTH: usize = 32;

/// Secp256k1 secret key (32 bytes scalar), zeroized on drop
pub struct Secp256k1SecretKey(K256SecretKey);

impl Secp256k1SecretKey {
    /// Generate a new random secret key
    pub fn generate<R: CryptoRng + RngCore>(rng: &mut R) -> Self {
        Self(K256SecretKey::random(rng))
    }

    /// Load from raw bytes; the slice must be exactly 32 bytes and encode a
    /// scalar in `[1, n)`.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != SECRET_KEY_LENGTH {
            return Err(CryptoError::InvalidSecretLength(bytes.len()));
        }
        K256SecretKey::from_slice(bytes)
            .map(Self)
            .map_err(|_| CryptoError::InvalidSecretKey)
    }

    /// Serialize to bytes (32 bytes scalar)
    pub fn to_bytes(&self) -> [u8; SECRET_KEY_LENGTH] {
        self.0.to_bytes().into()
    }

    /// Get the corresponding public key
    pub fn public_key(&self) -> Secp256k1PublicKey {
        Secp256k1PublicKey(self.0.public_key())
    }

    /// Address controlled by this key
    pub fn address(&self) -> Address {
        self.public_key().address()
    }
}

impl std::fmt::Debug for Secp256k1SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secp256k1SecretKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Secp256k1 public key
#[derive(Clone, PartialEq, Eq)]
pub struct Secp256k1PublicKey(k256::PublicKey);

impl Secp256k1PublicKey {
    /// Serialize to uncompressed bytes (65 bytes, with 0x04 prefix)
    pub fn to_uncompressed_bytes(&self) -> [u8; 65] {
        let encoded = self.0.to_encoded_point(false);
        let mut result = [0u8; 65];
        result.copy_from_slice(encoded.as_bytes());
        result
    }

    /// Derive the Ethereum-style address from this public key
    pub fn address(&self) -> Address {
        let uncompressed = self.to_uncompressed_bytes();
        let hash = keccak256(&uncompressed[1..]);
        Address::from_slice(&hash[12..])
    }
}

impl std::fmt::Debug for Secp256k1PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bytes = self.to_uncompressed_bytes();
        write!(f, "Secp256k1PublicKey({})", hex::encode(&bytes[1..9]))
    }
}

/// Derive the address for raw secret bytes.
pub fn address_of(secret: &[u8]) -> Result<Address, CryptoError> {
    Secp256k1SecretKey::from_slice(secret).map(|sk| sk.address())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_known_vector() {
        // Private key 1 -> 0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf
        let mut secret = [0u8; 32];
        secret[31] = 1;
        let addr = address_of(&secret).unwrap();

        let expected =
            Address::from_slice(&hex::decode("7E5F4552091A69125d5DfCb7b8C2659029395Bdf").unwrap());
        assert_eq!(addr, expected);
    }

    #[test]
    fn test_address_web3_vector() {
        let secret =
            hex::decode("7a28b5ba57c53603b0b07b56bba752f7784bf506fa95edc395f5cf6c7514fe9d")
                .unwrap();
        let addr = address_of(&secret).unwrap();
        assert_eq!(
            hex::encode(addr.as_slice()),
            "008aeeda4d805471df9b2a5b0f38a0c3bcba786b"
        );
    }

    #[test]
    fn test_zero_scalar_rejected() {
        assert_eq!(
            Secp256k1SecretKey::from_slice(&[0u8; 32]).unwrap_err(),
            CryptoError::InvalidSecretKey
        );
    }

    #[test]
    fn test_scalar_above_order_rejected() {
        assert!(Secp256k1SecretKey::from_slice(&[0xFF; 32]).is_err());
    }

    #[test]
    fn test_wrong_length_rejected() {
        assert_eq!(
            Secp256k1SecretKey::from_slice(&[1u8; 31]).unwrap_err(),
            CryptoError::InvalidSecretLength(31)
        );
    }

    #[test]
    fn test_generate_roundtrip() {
        let sk = Secp256k1SecretKey::generate(&mut rand::thread_rng());
        let restored = Secp256k1SecretKey::from_slice(&sk.to_bytes()).unwrap();
        assert_eq!(sk.address(), restored.address());
    }

    #[test]
    fn test_public_key_uncompressed() {
        let sk = Secp256k1SecretKey::generate(&mut rand::thread_rng());
        let pk = sk.public_key();
        assert_eq!(pk, sk.public_key());
        assert_eq!(pk.to_uncompressed_bytes()[0], 0x04);
        assert_eq!(pk.address(), sk.address());
    }

    #[test]
    fn test_debug_redacted() {
        let sk = Secp256k1SecretKey::generate(&mut rand::thread_rng());
        assert!(format!("{:?}", sk).contains("[REDACTED]"));
    }
}
