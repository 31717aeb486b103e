//! ERC-20 `transfer(address,uint256)` call data

use alloy_primitives::{Address, Bytes, U256};

use super::error::SignerResult;
use super::skeleton::{parse_address, parse_amount, TransactionSkeleton};

/// First four bytes of keccak256("transfer(address,uint256)")
pub const TRANSFER_SELECTOR: [u8; 4] = [0xa9, 0x05, 0x9c, 0xbb];

/// ABI-encode a `transfer(recipient, amount)` call
pub fn transfer_data(recipient: Address, amount: U256) -> Bytes {
    let mut data = Vec::with_capacity(4 + 32 + 32);
    data.extend_from_slice(&TRANSFER_SELECTOR);
    data.extend_from_slice(&[0u8; 12]);
    data.extend_from_slice(recipient.as_slice());
    data.extend_from_slice(&amount.to_be_bytes::<32>());
    Bytes::from(data)
}

/// Skeleton calling `token.transfer(recipient, amount)` with zero value
pub fn build_token_transfer(
    token: &str,
    recipient: &str,
    amount: &str,
    gas: &str,
    gas_price: &str,
    nonce: &str,
) -> SignerResult<TransactionSkeleton> {
    let recipient = parse_address(recipient)?;
    let amount = parse_amount(amount)?;
    let data = transfer_data(recipient, amount);

    Ok(TransactionSkeleton::build(token, "0", gas, gas_price, nonce, "")?.with_data(data))
}
