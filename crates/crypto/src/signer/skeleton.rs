//! Unsigned transaction skeleton and field parsing

use alloy_consensus::TxLegacy;
use alloy_primitives::{Address, Bytes, TxKind, U256};

use super::error::{SignerError, SignerResult};

/// Unsigned legacy transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionSkeleton {
    /// Expected sender; checked against the signing key when set
    pub from: Option<Address>,
    /// Destination
    pub to: Address,
    /// Value in wei
    pub value: U256,
    /// Gas limit
    pub gas: u64,
    /// Gas price in wei
    pub gas_price: u128,
    /// Sender nonce
    pub nonce: u64,
    /// Call data
    pub data: Bytes,
}

impl TransactionSkeleton {
    /// Plain value transfer with empty call data
    pub fn new(to: Address, value: U256, gas: u64, gas_price: u128, nonce: u64) -> Self {
        Self {
            from: None,
            to,
            value,
            gas,
            gas_price,
            nonce,
            data: Bytes::new(),
        }
    }

    /// Parse every field from text.
    ///
    /// Numbers are decimal or `0x` hex. `data` is hex with optional `0x` and
    /// may be empty.
    pub fn build(
        to: &str,
        value: &str,
        gas: &str,
        gas_price: &str,
        nonce: &str,
        data: &str,
    ) -> SignerResult<Self> {
        Ok(Self {
            from: None,
            to: parse_address(to)?,
            value: parse_amount(value)?,
            gas: parse_u64(gas)?,
            gas_price: parse_u128(gas_price)?,
            nonce: parse_u64(nonce)?,
            data: parse_data(data)?,
        })
    }

    /// Pin the expected sender
    pub fn with_from(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }

    /// Replace the call data
    pub fn with_data(mut self, data: Bytes) -> Self {
        self.data = data;
        self
    }

    /// Legacy transaction for this skeleton; EIP-155 when `chain_id` is set
    pub fn to_legacy(&self, chain_id: Option<u64>) -> TxLegacy {
        TxLegacy {
            chain_id,
            nonce: self.nonce,
            gas_price: self.gas_price,
            gas_limit: self.gas,
            to: TxKind::Call(self.to),
            value: self.value,
            input: self.data.clone(),
        }
    }
}

/// Parse a 20-byte address, with or without `0x`
pub fn parse_address(text: &str) -> SignerResult<Address> {
    let trimmed = text.trim();
    let digits = strip_hex_prefix(trimmed).unwrap_or(trimmed);

    if digits.len() != 40 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(SignerError::InvalidAddress(text.to_string()));
    }

    let bytes = hex::decode(digits).map_err(|_| SignerError::InvalidAddress(text.to_string()))?;
    Ok(Address::from_slice(&bytes))
}

/// Parse a non-negative 256-bit integer from decimal or `0x` hex
pub fn parse_amount(text: &str) -> SignerResult<U256> {
    let trimmed = text.trim();
    let invalid = || SignerError::InvalidAmount(text.to_string());

    let (digits, radix) = match strip_hex_prefix(trimmed) {
        Some(hex_digits) => (hex_digits, 16),
        None => (trimmed, 10),
    };

    // Rejects signs, separators and the empty string before ruint sees them
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix as u32)) {
        return Err(invalid());
    }

    U256::from_str_radix(digits, radix).map_err(|_| invalid())
}

fn parse_u64(text: &str) -> SignerResult<u64> {
    u64::try_from(parse_amount(text)?).map_err(|_| SignerError::InvalidAmount(text.to_string()))
}

fn parse_u128(text: &str) -> SignerResult<u128> {
    u128::try_from(parse_amount(text)?).map_err(|_| SignerError::InvalidAmount(text.to_string()))
}

/// Parse hex call data; empty input means no data
pub fn parse_data(text: &str) -> SignerResult<Bytes> {
    let trimmed = text.trim();
    let digits = strip_hex_prefix(trimmed).unwrap_or(trimmed);

    hex::decode(digits)
        .map(Bytes::from)
        .map_err(|e| SignerError::InvalidData(e.to_string()))
}

fn strip_hex_prefix(text: &str) -> Option<&str> {
    text.strip_prefix("0x").or_else(|| text.strip_prefix("0X"))
}
