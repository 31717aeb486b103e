//! Wallet configuration
//!
//! Stored at `{home}/config/wallet.toml`. Every field has a default, so a
//! missing file or a partial file both load.
//!
//! # Example wallet.toml
//!
//! ```toml
//! # Directory holding the registry and secret records (empty = home)
//! data-dir = ""
//! registry-file = "registry.json"
//! secrets-dir = "secrets"
//!
//! # EIP-155 chain id used when signing
//! chain-id = 43114
//!
//! # Default tracing filter when RUST_LOG is unset
//! log-filter = "info"
//!
//! # KDF for new secret records (scrypt|pbkdf2)
//! [kdf]
//! algorithm = "scrypt"
//! n = 262144
//! r = 8
//! p = 1
//!
//! # Cipher envelope used for backups
//! [envelope]
//! cipher = "aes-256-cbc"
//! digest = "sha256"
//! rounds = 1
//! embed-salt = true
//! ```

use anyhow::{Context, Result};
use keyvault_crypto::envelope::{CipherEnvelope, EnvelopeConfig};
use keyvault_crypto::signer::DEFAULT_CHAIN_ID;
use keyvault_crypto::{KdfConfig, RegistryOptions, TransactionSigner};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default wallet configuration filename.
pub const WALLET_CONFIG_FILENAME: &str = "wallet.toml";

/// Wallet configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WalletConfig {
    /// Directory holding the registry file and secret records.
    ///
    /// If empty, uses the wallet home directory.
    #[serde(default)]
    pub data_dir: String,

    /// Registry file name, relative to the data directory.
    #[serde(default = "default_registry_file")]
    pub registry_file: String,

    /// Secret record directory, relative to the data directory unless
    /// absolute.
    #[serde(default = "default_secrets_dir")]
    pub secrets_dir: String,

    /// Chain id for EIP-155 signing.
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,

    /// Default tracing filter directive.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// KDF for new secret records and the registry file.
    #[serde(default)]
    pub kdf: KdfConfig,

    /// Cipher envelope settings.
    #[serde(default)]
    pub envelope: EnvelopeConfig,
}

fn default_registry_file() -> String {
    "registry.json".to_string()
}

fn default_secrets_dir() -> String {
    "secrets".to_string()
}

fn default_chain_id() -> u64 {
    DEFAULT_CHAIN_ID
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            data_dir: String::new(),
            registry_file: default_registry_file(),
            secrets_dir: default_secrets_dir(),
            chain_id: default_chain_id(),
            log_filter: default_log_filter(),
            kdf: KdfConfig::default(),
            envelope: EnvelopeConfig::default(),
        }
    }
}

impl WalletConfig {
    /// Get the path to the wallet config file.
    pub fn config_path(home: &Path) -> PathBuf {
        home.join("config").join(WALLET_CONFIG_FILENAME)
    }

    /// Load wallet configuration from file.
    ///
    /// If the file doesn't exist, returns default configuration.
    pub fn load(home: &Path) -> Result<Self> {
        let config_path = Self::config_path(home);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read wallet config: {}", config_path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse wallet config: {}", config_path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid wallet config: {}", config_path.display()))?;
        Ok(config)
    }

    /// Save wallet configuration to file.
    pub fn save(&self, home: &Path) -> Result<()> {
        let config_path = Self::config_path(home);

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize wallet config")?;

        std::fs::write(&config_path, content)
            .with_context(|| format!("Failed to write wallet config: {}", config_path.display()))?;

        Ok(())
    }

    /// Check that the KDF and envelope settings are usable.
    pub fn validate(&self) -> Result<()> {
        self.kdf
            .module(&[0u8; 32])
            .validate()
            .context("Unusable kdf settings")?;
        self.cipher_envelope()?;
        Ok(())
    }

    /// Resolve the effective data directory.
    pub fn effective_data_dir(&self, home: &Path) -> PathBuf {
        if self.data_dir.is_empty() {
            home.to_path_buf()
        } else {
            PathBuf::from(&self.data_dir)
        }
    }

    /// Resolve the effective registry file path.
    pub fn effective_registry_path(&self, home: &Path) -> PathBuf {
        let name = if self.registry_file.is_empty() {
            default_registry_file()
        } else {
            self.registry_file.clone()
        };
        self.effective_data_dir(home).join(name)
    }

    /// Resolve the effective secret record directory.
    pub fn effective_secrets_dir(&self, home: &Path) -> PathBuf {
        if self.secrets_dir.is_empty() {
            self.effective_data_dir(home).join(default_secrets_dir())
        } else {
            // join() keeps absolute paths as-is
            self.effective_data_dir(home).join(&self.secrets_dir)
        }
    }

    /// Registry options for this configuration.
    pub fn registry_options(&self, home: &Path) -> RegistryOptions {
        RegistryOptions::new(
            self.effective_registry_path(home),
            self.effective_secrets_dir(home),
        )
        .with_kdf(self.kdf)
    }

    /// Transaction signer for the configured chain.
    pub fn signer(&self) -> TransactionSigner {
        TransactionSigner::new(Some(self.chain_id))
    }

    /// Cipher envelope for the configured algorithms.
    pub fn cipher_envelope(&self) -> Result<CipherEnvelope> {
        CipherEnvelope::new(&self.envelope).context("Unusable envelope settings")
    }
}
