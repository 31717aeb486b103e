//! Wallet facade
//!
//! Ties the registry, the signer and the collaborators together:
//! resolve the sender, ask the oracle for a nonce, unlock the secret, sign,
//! broadcast and record the raw transaction in history.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use alloy_primitives::Address;
use anyhow::{Context, Result};
use keyvault_crypto::envelope::CipherEnvelope;
use keyvault_crypto::signer::{parse_address, parse_amount, transfer_data};
use keyvault_crypto::{
    AccountLabel, PasswordProvider, Registry, SecretRecord, SignedTransaction, TransactionSigner,
    TransactionSkeleton,
};
use tracing::{info, warn};

use crate::config::WalletConfig;
use crate::ports::{Broadcaster, HistoryCache, InMemoryHistory, NonceOracle};

/// What to send; every field is text as entered by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendRequest {
    pub to: String,
    pub value: String,
    pub gas: String,
    pub gas_price: String,
    pub data: String,
}

impl SendRequest {
    /// Plain value transfer
    pub fn transfer(to: &str, value: &str, gas: &str, gas_price: &str) -> Self {
        Self {
            to: to.to_string(),
            value: value.to_string(),
            gas: gas.to_string(),
            gas_price: gas_price.to_string(),
            data: String::new(),
        }
    }

    /// ERC-20 `transfer(recipient, amount)` call on `token`
    pub fn token_transfer(
        token: &str,
        recipient: &str,
        amount: &str,
        gas: &str,
        gas_price: &str,
    ) -> Result<Self> {
        let recipient = parse_address(recipient).context("Invalid token recipient")?;
        let amount = parse_amount(amount).context("Invalid token amount")?;

        Ok(Self {
            to: token.to_string(),
            value: "0".to_string(),
            gas: gas.to_string(),
            gas_price: gas_price.to_string(),
            data: transfer_data(recipient, amount).to_string(),
        })
    }

    fn skeleton(&self, from: Address, nonce: u64) -> Result<TransactionSkeleton> {
        let skeleton = TransactionSkeleton::build(
            &self.to,
            &self.value,
            &self.gas,
            &self.gas_price,
            &nonce.to_string(),
            &self.data,
        )
        .context("Invalid transaction request")?;
        Ok(skeleton.with_from(from))
    }
}

/// A wallet rooted at a home directory
pub struct Wallet {
    home: PathBuf,
    config: WalletConfig,
    registry: Registry,
    signer: TransactionSigner,
    envelope: CipherEnvelope,
    history: Arc<dyn HistoryCache>,
}

impl Wallet {
    /// Initialise a new wallet under `home`
    pub fn create(home: &Path, config: WalletConfig, master: &str) -> Result<Self> {
        config.validate()?;
        let registry = Registry::create(config.registry_options(home), master)
            .context("Failed to create registry")?;
        info!(home = %home.display(), "wallet created");
        Self::assemble(home, config, registry)
    }

    /// Open an existing wallet under `home`
    pub fn open(home: &Path, config: WalletConfig, master: &str) -> Result<Self> {
        config.validate()?;
        let registry = Registry::load(config.registry_options(home), master)
            .context("Failed to open registry")?;
        info!(home = %home.display(), accounts = registry.accounts().len(), "wallet opened");
        Self::assemble(home, config, registry)
    }

    fn assemble(home: &Path, config: WalletConfig, registry: Registry) -> Result<Self> {
        let envelope = config.cipher_envelope()?;
        Ok(Self {
            home: home.to_path_buf(),
            signer: config.signer(),
            config,
            registry,
            envelope,
            history: Arc::new(InMemoryHistory::new()),
        })
    }

    /// Record sent transactions in `history` instead of process memory
    pub fn with_history(mut self, history: Arc<dyn HistoryCache>) -> Self {
        self.history = history;
        self
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn config(&self) -> &WalletConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn history(&self) -> &Arc<dyn HistoryCache> {
        &self.history
    }

    /// Generate a new account protected by `password`
    pub fn create_account(&self, label: &str, password: &str, hint: &str) -> Result<Address> {
        let (_, address) = self
            .registry
            .new_account(AccountLabel::from(label), password, hint)
            .context("Failed to create account")?;
        Ok(address)
    }

    /// Build, sign and broadcast a transaction from the account named by
    /// `from` (address, identifier or label).
    ///
    /// The raw transaction is stored in history under its hash once the
    /// broadcaster accepts it.
    pub fn send(
        &self,
        from: &str,
        request: &SendRequest,
        provider: &dyn PasswordProvider,
        oracle: &dyn NonceOracle,
        broadcaster: &dyn Broadcaster,
    ) -> Result<SignedTransaction> {
        let address = self
            .registry
            .resolve(from)
            .with_context(|| format!("Unknown sender: {}", from))?;

        let nonce = oracle
            .get_nonce(&address)
            .with_context(|| format!("Failed to fetch nonce for {}", address))?;
        let skeleton = request.skeleton(address, nonce)?;

        let signed = {
            let secret = self
                .registry
                .secret(address.into(), provider, true)
                .with_context(|| format!("Failed to unlock {}", address))?;
            self.signer
                .sign(&skeleton, &secret)
                .context("Failed to sign transaction")?
        };

        let reported = broadcaster
            .broadcast(&signed.raw)
            .with_context(|| format!("Failed to broadcast {}", signed.hash))?;
        if reported != signed.hash {
            warn!(local = %signed.hash, reported = %reported, "node reported a different transaction hash");
        }

        self.history
            .put(&signed.hash.to_string(), &signed.raw)
            .context("Failed to record transaction history")?;

        info!(from = %address, to = %skeleton.to, nonce, hash = %signed.hash, "transaction sent");
        Ok(signed)
    }

    /// Write the account's secret record to `path`, wrapped in a cipher
    /// envelope under `backup_password`.
    pub fn export_backup(&self, account: &str, path: &Path, backup_password: &str) -> Result<()> {
        let address = self
            .registry
            .resolve(account)
            .with_context(|| format!("Unknown account: {}", account))?;
        let id = self.registry.identifier(&address)?;
        let record = self.registry.store().load(&id)?;

        let json = record.to_json()?;
        let mut text = self.envelope.encrypt(json.as_bytes(), backup_password, &[])?;
        text.push('\n');
        keyvault_crypto::fs::write_atomic(path, text.as_bytes())
            .with_context(|| format!("Failed to write backup: {}", path.display()))?;

        info!(address = %address, path = %path.display(), "backup exported");
        Ok(())
    }

    /// Adopt the record in an envelope backup produced by
    /// [`Wallet::export_backup`].
    ///
    /// With `record_password` the record is opened to confirm its address;
    /// without it, the address stored in the record is trusted.
    pub fn import_backup(
        &self,
        path: &Path,
        backup_password: &str,
        label: &str,
        record_password: Option<&str>,
    ) -> Result<Address> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read backup: {}", path.display()))?;
        let json = self
            .envelope
            .decrypt(&text, backup_password, &[])
            .context("Failed to decrypt backup")?;
        let json = std::str::from_utf8(&json).context("Backup is not a secret record")?;
        let record = SecretRecord::from_json(json).context("Backup is not a secret record")?;

        let address = self
            .registry
            .import_existing(&record, AccountLabel::from(label), record_password, "")
            .context("Failed to import backup")?;
        info!(address = %address, path = %path.display(), "backup imported");
        Ok(address)
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("home", &self.home)
            .field("chain_id", &self.config.chain_id)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
