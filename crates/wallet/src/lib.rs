//! Wallet service for keyvault
//!
//! Composes the keystore registry and transaction signer from
//! `keyvault-crypto` with the network collaborators a wallet needs
//! (nonce lookup, broadcasting, history). Configuration is a TOML file under
//! the wallet home directory.

pub mod config;
pub mod logging;
pub mod ports;
pub mod wallet;

pub use config::{WalletConfig, WALLET_CONFIG_FILENAME};
pub use logging::init_tracing;
pub use ports::{Broadcaster, HistoryCache, InMemoryHistory, NonceOracle};
pub use wallet::{SendRequest, Wallet};
