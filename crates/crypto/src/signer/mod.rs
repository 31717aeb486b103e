//! Transaction signing
//!
//! `TransactionSkeleton::build` (Built) -> [`TransactionSigner::sign`]
//! (Signed). Broadcasting the raw bytes is left to the caller.
//!
//! Transactions are legacy, EIP-155 protected when a chain id is configured.
//! Signatures are RFC 6979 deterministic: the same skeleton and key always
//! produce the same bytes.

mod error;
mod skeleton;
mod token;

use alloy_consensus::{SignableTransaction, TxEnvelope};
use alloy_eips::eip2718::{Decodable2718, Encodable2718};
use alloy_primitives::{keccak256, Address, Bytes, Signature, TxKind, B256};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use secrecy::ExposeSecret;
use tracing::{debug, error};
use zeroize::Zeroize;

pub use error::{SignerError, SignerResult};
pub use skeleton::{parse_address, parse_amount, parse_data, TransactionSkeleton};
pub use token::{build_token_transfer, transfer_data, TRANSFER_SELECTOR};

use crate::secp256k1::SECRET_KEY_LENGTH;
use crate::secure::SecretBytes;

/// Default chain id (Avalanche C-Chain)
pub const DEFAULT_CHAIN_ID: u64 = 43114;

/// A signed, broadcast-ready transaction
#[derive(Debug, Clone, PartialEq)]
pub struct SignedTransaction {
    /// What was signed
    pub skeleton: TransactionSkeleton,
    /// Address that signed
    pub from: Address,
    /// RLP-encoded signed transaction
    pub raw: Bytes,
    /// keccak256 of `raw`
    pub hash: B256,
    /// ECDSA signature
    pub signature: Signature,
}

impl SignedTransaction {
    /// `raw` as 0x-prefixed hex, as expected by `eth_sendRawTransaction`
    pub fn raw_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.raw))
    }
}

/// A decoded signed transaction with its recovered sender
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedTransaction {
    /// Transaction fields; `from` is the recovered sender
    pub skeleton: TransactionSkeleton,
    /// Chain id, `None` for pre-EIP-155 transactions
    pub chain_id: Option<u64>,
    /// Transaction hash
    pub hash: B256,
}

/// Signs skeletons for one chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionSigner {
    chain_id: Option<u64>,
}

impl Default for TransactionSigner {
    fn default() -> Self {
        Self::new(Some(DEFAULT_CHAIN_ID))
    }
}

impl TransactionSigner {
    /// `None` signs unprotected (pre-EIP-155) transactions
    pub fn new(chain_id: Option<u64>) -> Self {
        Self { chain_id }
    }

    /// Configured chain id
    pub fn chain_id(&self) -> Option<u64> {
        self.chain_id
    }

    /// Sign `skeleton` with `secret`.
    ///
    /// The secret is only borrowed; the signing key built from it is dropped
    /// (and zeroized) before this returns.
    pub fn sign(
        &self,
        skeleton: &TransactionSkeleton,
        secret: &SecretBytes,
    ) -> SignerResult<SignedTransaction> {
        let signer = signing_key(secret)?;
        let from = signer.address();

        if let Some(expected) = skeleton.from {
            if expected != from {
                return Err(SignerError::SenderMismatch {
                    expected,
                    actual: from,
                });
            }
        }

        let tx = skeleton.to_legacy(self.chain_id);
        let signature = signer.sign_hash_sync(&tx.signature_hash()).map_err(|e| {
            error!(from = %from, error = %e, "transaction signing failed");
            SignerError::SigningFailed(e.to_string())
        })?;
        drop(signer);

        let envelope = TxEnvelope::from(tx.into_signed(signature));
        let raw = Bytes::from(envelope.encoded_2718());
        let hash = keccak256(&raw);

        debug!(from = %from, to = %skeleton.to, nonce = skeleton.nonce, hash = %hash, "transaction signed");

        Ok(SignedTransaction {
            skeleton: TransactionSkeleton {
                from: Some(from),
                ..skeleton.clone()
            },
            from,
            raw,
            hash,
            signature,
        })
    }
}

fn signing_key(secret: &SecretBytes) -> SignerResult<PrivateKeySigner> {
    let bytes = secret.expose_secret();
    if bytes.len() != SECRET_KEY_LENGTH {
        error!(length = bytes.len(), "secret has wrong length for signing");
        return Err(SignerError::SigningFailed(format!(
            "secret must be {} bytes, got {}",
            SECRET_KEY_LENGTH,
            bytes.len()
        )));
    }

    let mut key = B256::from_slice(bytes);
    let signer = PrivateKeySigner::from_bytes(&key);
    key.0.zeroize();

    signer.map_err(|e| {
        // Registry-produced secrets are always valid scalars
        error!(error = %e, "secret is not a valid secp256k1 scalar");
        SignerError::SigningFailed(e.to_string())
    })
}

/// Decode a signed legacy transaction and recover its sender
pub fn decode_raw(raw: &[u8]) -> SignerResult<DecodedTransaction> {
    let envelope = TxEnvelope::decode_2718(&mut &raw[..])
        .map_err(|e| SignerError::Decode(e.to_string()))?;

    let signed = envelope
        .as_legacy()
        .ok_or_else(|| SignerError::Decode("not a legacy transaction".to_string()))?;
    let tx = signed.tx();

    let to = match tx.to {
        TxKind::Call(to) => to,
        TxKind::Create => {
            return Err(SignerError::Decode(
                "contract creation is not supported".to_string(),
            ))
        }
    };

    let from = signed
        .signature()
        .recover_address_from_prehash(&signed.signature_hash())
        .map_err(|e| SignerError::Decode(format!("failed to recover sender: {}", e)))?;

    Ok(DecodedTransaction {
        skeleton: TransactionSkeleton {
            from: Some(from),
            to,
            value: tx.value,
            gas: tx.gas_limit,
            gas_price: tx.gas_price,
            nonce: tx.nonce,
            data: tx.input.clone(),
        },
        chain_id: tx.chain_id,
        hash: keccak256(raw),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secp256k1::address_of;
    use alloy_primitives::U256;

    fn secret(bytes: &[u8]) -> SecretBytes {
        SecretBytes::new(Box::new(bytes.to_vec()))
    }

    #[test]
    fn test_eip155_vector() {
        let skeleton = TransactionSkeleton::new(
            Address::repeat_byte(0x35),
            U256::from(1_000_000_000_000_000_000u64),
            21000,
            20_000_000_000,
            9,
        );

        let signed = TransactionSigner::new(Some(1))
            .sign(&skeleton, &secret(&[0x46; 32]))
            .unwrap();

        assert_eq!(
            hex::encode(&signed.raw),
            "f86c098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a76400008025a028ef61340bd939bc2195fe537567866003e1a15d3c71ff63e1590620aa636276a067cbe9d8997f761aecb703304b3800ccf555c9f3dc64214b297fb1966a3b6d83"
        );
        assert_eq!(signed.hash, keccak256(&signed.raw));
        assert_eq!(signed.from, address_of(&[0x46; 32]).unwrap());
        assert!(signed.raw_hex().starts_with("0xf86c09"));
    }

    #[test]
    fn test_signed_recovers_to_key() {
        let key = [0x11; 32];
        let skeleton = TransactionSkeleton::build(
            "0xabcabcabcabcabcabcabcabcabcabcabcabcabca",
            "1000000000000000000",
            "21000",
            "225",
            "5",
            "",
        )
        .unwrap();

        let signed = TransactionSigner::default()
            .sign(&skeleton, &secret(&key))
            .unwrap();
        let decoded = decode_raw(&signed.raw).unwrap();

        assert_eq!(decoded.skeleton.from, Some(address_of(&key).unwrap()));
        assert_eq!(decoded.chain_id, Some(DEFAULT_CHAIN_ID));
        assert_eq!(decoded.hash, signed.hash);
        assert_eq!(decoded.skeleton.nonce, 5);
        assert_eq!(decoded.skeleton.gas_price, 225);
        assert_eq!(decoded.skeleton.to, skeleton.to);
    }

    #[test]
    fn test_signing_is_deterministic() {
        let skeleton = TransactionSkeleton::new(Address::repeat_byte(2), U256::from(1), 21000, 1, 0);
        let signer = TransactionSigner::default();

        let a = signer.sign(&skeleton, &secret(&[0x33; 32])).unwrap();
        let b = signer.sign(&skeleton, &secret(&[0x33; 32])).unwrap();
        assert_eq!(a.raw, b.raw);
    }

    #[test]
    fn test_sender_mismatch() {
        let skeleton = TransactionSkeleton::new(Address::repeat_byte(2), U256::ZERO, 21000, 1, 0)
            .with_from(Address::repeat_byte(0x99));

        assert!(matches!(
            TransactionSigner::default().sign(&skeleton, &secret(&[0x33; 32])),
            Err(SignerError::SenderMismatch { .. })
        ));

        let matching = skeleton.with_from(address_of(&[0x33; 32]).unwrap());
        assert!(TransactionSigner::default()
            .sign(&matching, &secret(&[0x33; 32]))
            .is_ok());
    }

    #[test]
    fn test_invalid_scalar_fails() {
        let skeleton = TransactionSkeleton::new(Address::repeat_byte(2), U256::ZERO, 21000, 1, 0);
        let signer = TransactionSigner::default();

        assert!(matches!(
            signer.sign(&skeleton, &secret(&[0u8; 32])),
            Err(SignerError::SigningFailed(_))
        ));
        assert!(matches!(
            signer.sign(&skeleton, &secret(&[0xFF; 32])),
            Err(SignerError::SigningFailed(_))
        ));
        assert!(matches!(
            signer.sign(&skeleton, &secret(&[1u8; 31])),
            Err(SignerError::SigningFailed(_))
        ));
    }

    #[test]
    fn test_unprotected_signature() {
        let skeleton = TransactionSkeleton::new(Address::repeat_byte(2), U256::ZERO, 21000, 1, 0);
        let signed = TransactionSigner::new(None)
            .sign(&skeleton, &secret(&[0x33; 32]))
            .unwrap();

        let decoded = decode_raw(&signed.raw).unwrap();
        assert_eq!(decoded.chain_id, None);
        assert_eq!(decoded.skeleton.from, Some(signed.from));
    }

    #[test]
    fn test_token_transfer_roundtrip() {
        let skeleton = build_token_transfer(
            "0x1111111111111111111111111111111111111111",
            "0x2222222222222222222222222222222222222222",
            "5000",
            "60000",
            "25",
            "1",
        )
        .unwrap();

        let signed = TransactionSigner::default()
            .sign(&skeleton, &secret(&[0x44; 32]))
            .unwrap();
        let decoded = decode_raw(&signed.raw).unwrap();
        assert_eq!(decoded.skeleton.data, skeleton.data);
        assert_eq!(decoded.skeleton.value, U256::ZERO);
    }

    #[test]
    fn test_decode_garbage() {
        assert!(matches!(
            decode_raw(&[0x01, 0x02, 0x03]),
            Err(SignerError::Decode(_))
        ));
    }
}
