//! Keystore registry: the account index over the secret record store
//!
//! The registry maps address <-> identifier <-> metadata for every account and
//! persists that index as one encrypted file protected by a master password.
//! Key material itself stays in per-account [`SecretRecord`]s.
//!
//! # Locking
//!
//! All mutations of the index, the registry file and the record directory
//! happen under one mutex. Password providers are always invoked with the lock
//! released, so a provider that blocks on user input never stalls other
//! threads. KDF work for new records is also done outside the lock.
//!
//! # Example
//!
//! ```rust,ignore
//! use keyvault_crypto::registry::{FixedPassword, Registry, RegistryOptions};
//!
//! let options = RegistryOptions::new("./wallet/registry.json", "./wallet/secrets");
//! let registry = Registry::create(options, "master-password")?;
//! let id = registry.import(&secret, "Alice".into(), "alicepw", "pet name")?;
//! let address = registry.address(&id)?;
//! let secret = registry.secret(address.into(), &FixedPassword::new("alicepw"), true)?;
//! ```

mod account;
mod error;
mod file;
mod password;

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use alloy_primitives::Address;
use parking_lot::Mutex;
use rand::RngCore;
use secrecy::ExposeSecret;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub use account::{Account, AccountLabel, AccountRef};
pub use error::{RegistryError, RegistryResult};
pub use file::{RegistryContents, RegistryFile, REGISTRY_VERSION};
pub use password::{
    hash_password, FixedPassword, NoPassword, PasswordCache, PasswordHash, PasswordProvider,
};

use crate::keystore::{KdfConfig, RecordBuilder, SecretRecord, SecretStore};
use crate::secp256k1::{address_of, Secp256k1SecretKey};
use crate::secure::{SecretBytes, SecretString};
use file::FileKey;

/// Where the registry lives and how new records are protected
#[derive(Debug, Clone)]
pub struct RegistryOptions {
    /// Registry file
    pub path: PathBuf,
    /// Directory of secret records
    pub secrets_dir: PathBuf,
    /// KDF for new records and for the registry file
    pub kdf: KdfConfig,
}

impl RegistryOptions {
    pub fn new(path: impl Into<PathBuf>, secrets_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            secrets_dir: secrets_dir.into(),
            kdf: KdfConfig::default(),
        }
    }

    pub fn with_kdf(mut self, kdf: KdfConfig) -> Self {
        self.kdf = kdf;
        self
    }
}

struct RegistryState {
    accounts: BTreeMap<Address, Account>,
    ids: HashMap<Uuid, Address>,
    password_salt: Vec<u8>,
    master_hash: PasswordHash,
    file_key: FileKey,
}

impl RegistryState {
    fn lookup(&self, account: AccountRef) -> RegistryResult<&Account> {
        match account {
            AccountRef::Address(address) => self
                .accounts
                .get(&address)
                .ok_or(RegistryError::AddressNotFound(address)),
            AccountRef::Id(id) => self
                .ids
                .get(&id)
                .and_then(|address| self.accounts.get(address))
                .ok_or(RegistryError::IdentifierNotFound(id)),
        }
    }

    fn lookup_mut(&mut self, address: &Address) -> RegistryResult<&mut Account> {
        self.accounts
            .get_mut(address)
            .ok_or(RegistryError::AddressNotFound(*address))
    }

    fn ensure_vacant(&self, address: &Address, id: &Uuid) -> RegistryResult<()> {
        if self.accounts.contains_key(address) {
            return Err(RegistryError::DuplicateAddress(*address));
        }
        if self.ids.contains_key(id) {
            return Err(RegistryError::DuplicateIdentifier(*id));
        }
        Ok(())
    }

    fn insert(&mut self, account: Account) {
        self.ids.insert(account.id, account.address);
        self.accounts.insert(account.address, account);
    }

    fn remove(&mut self, address: &Address) -> Option<Account> {
        let account = self.accounts.remove(address)?;
        self.ids.remove(&account.id);
        Some(account)
    }

    fn contents(&self) -> RegistryContents {
        RegistryContents {
            password_salt: hex::encode(&self.password_salt),
            master_hash: self.master_hash,
            accounts: self.accounts.values().cloned().collect(),
        }
    }
}

/// Encrypted account registry
pub struct Registry {
    options: RegistryOptions,
    store: SecretStore,
    cache: Arc<PasswordCache>,
    state: Mutex<RegistryState>,
}

impl Registry {
    /// Whether a registry file exists at `path`
    pub fn exists(path: &Path) -> bool {
        path.is_file()
    }

    /// Create an empty registry protected by `master`.
    ///
    /// Fails if a registry file already exists at the configured path.
    pub fn create(options: RegistryOptions, master: &str) -> RegistryResult<Self> {
        if Self::exists(&options.path) {
            return Err(RegistryError::AlreadyExists(options.path.clone()));
        }

        let store = SecretStore::new(&options.secrets_dir)?;

        let mut password_salt = vec![0u8; 32];
        rand::thread_rng().fill_bytes(&mut password_salt);

        let state = RegistryState {
            accounts: BTreeMap::new(),
            ids: HashMap::new(),
            master_hash: hash_password(&password_salt, master),
            password_salt,
            file_key: FileKey::derive(master, &options.kdf)?,
        };

        let registry = Self {
            options,
            store,
            cache: Arc::new(PasswordCache::new()),
            state: Mutex::new(state),
        };

        {
            let state = registry.state.lock();
            registry.persist(&state)?;
            registry.cache_password(state.master_hash, master);
        }

        info!(path = %registry.options.path.display(), "registry created");
        Ok(registry)
    }

    /// Unlock an existing registry with `master`
    pub fn load(options: RegistryOptions, master: &str) -> RegistryResult<Self> {
        let (contents, file_key) = file::read(&options.path, master)?;
        let store = SecretStore::new(&options.secrets_dir)?;

        let password_salt = hex::decode(&contents.password_salt)
            .map_err(|e| crate::keystore::KeystoreError::HexError(e.to_string()))?;

        let mut state = RegistryState {
            accounts: BTreeMap::new(),
            ids: HashMap::new(),
            password_salt,
            master_hash: contents.master_hash,
            file_key,
        };

        for account in contents.accounts {
            if !store.contains(&account.id) {
                warn!(
                    address = %account.address,
                    id = %account.id,
                    "secret record missing for registered account"
                );
            }
            state.insert(account);
        }

        let registry = Self {
            options,
            store,
            cache: Arc::new(PasswordCache::new()),
            state: Mutex::new(state),
        };
        {
            let state = registry.state.lock();
            registry.cache_password(state.master_hash, master);
            info!(
                path = %registry.options.path.display(),
                accounts = state.accounts.len(),
                "registry loaded"
            );
        }
        Ok(registry)
    }

    /// Share a password cache with other components
    pub fn with_cache(mut self, cache: Arc<PasswordCache>) -> Self {
        {
            let state = self.state.lock();
            if let Some(master) = self.cache.get(&state.master_hash) {
                cache.insert(state.master_hash, &master);
            }
        }
        self.cache = cache;
        self
    }

    /// The password cache in use
    pub fn cache(&self) -> &Arc<PasswordCache> {
        &self.cache
    }

    /// Configured options
    pub fn options(&self) -> &RegistryOptions {
        &self.options
    }

    /// Secret record store backing this registry
    pub fn store(&self) -> &SecretStore {
        &self.store
    }

    /// Re-encrypt the registry file under `master` with a fresh salt.
    ///
    /// Passing a different password than the current one changes the master
    /// password.
    pub fn save(&self, master: &str) -> RegistryResult<()> {
        let file_key = FileKey::derive(master, &self.options.kdf)?;

        let mut state = self.state.lock();
        let master_hash = hash_password(&state.password_salt, master);
        let previous = std::mem::replace(&mut state.file_key, file_key);
        let previous_hash = std::mem::replace(&mut state.master_hash, master_hash);

        if let Err(e) = self.persist(&state) {
            state.file_key = previous;
            state.master_hash = previous_hash;
            return Err(e);
        }

        self.cache_password(master_hash, master);
        debug!(path = %self.options.path.display(), "registry saved");
        Ok(())
    }

    /// Import `secret` under its own password. Returns the new identifier.
    pub fn import(
        &self,
        secret: &[u8],
        label: AccountLabel,
        password: &str,
        hint: &str,
    ) -> RegistryResult<Uuid> {
        let address = address_of(secret)?;
        {
            let state = self.state.lock();
            if state.accounts.contains_key(&address) {
                return Err(RegistryError::DuplicateAddress(address));
            }
        }

        let record = RecordBuilder::new()
            .secret(secret)
            .password(password)
            .kdf(self.options.kdf)
            .address(address)
            .build()?;

        let id = record.id();
        let hash = {
            let mut state = self.state.lock();
            let hash = hash_password(&state.password_salt, password);
            self.adopt(
                &mut state,
                &record,
                Account {
                    address,
                    id,
                    label,
                    password_hash: Some(hash),
                    password_hint: hint.to_string(),
                },
            )?;
            hash
        };

        self.cache_password(hash, password);
        self.cache.note_hint(hash, hint);
        info!(address = %address, id = %id, "account imported");
        Ok(id)
    }

    /// Import `secret` protected by the master password
    pub fn import_with_master(&self, secret: &[u8], label: AccountLabel) -> RegistryResult<Uuid> {
        let master_hash = self.state.lock().master_hash;
        let master = self
            .cache
            .get(&master_hash)
            .ok_or(RegistryError::PasswordUnknown)?;
        self.import(secret, label, master.expose_secret(), "")
    }

    /// Generate a fresh key and import it
    pub fn new_account(
        &self,
        label: AccountLabel,
        password: &str,
        hint: &str,
    ) -> RegistryResult<(Uuid, Address)> {
        let key = Secp256k1SecretKey::generate(&mut rand::thread_rng());
        let secret = zeroize::Zeroizing::new(key.to_bytes());
        let id = self.import(&secret[..], label, password, hint)?;
        Ok((id, key.address()))
    }

    /// Adopt an existing record file.
    ///
    /// With a password the record is opened to derive and check the address.
    /// Without one, the record's own address is trusted and the password hash
    /// is unknown.
    pub fn import_existing(
        &self,
        record: &SecretRecord,
        label: AccountLabel,
        password: Option<&str>,
        hint: &str,
    ) -> RegistryResult<Address> {
        let address = match password {
            Some(password) => {
                let secret = record.open(password)?;
                address_of(secret.expose_secret())?
            }
            None => record
                .address()
                .ok_or(RegistryError::MissingAddress(record.id()))?,
        };

        let hash = {
            let mut state = self.state.lock();
            let hash = password.map(|p| hash_password(&state.password_salt, p));
            self.adopt(
                &mut state,
                record,
                Account {
                    address,
                    id: record.id(),
                    label,
                    password_hash: hash,
                    password_hint: hint.to_string(),
                },
            )?;
            hash
        };

        if let (Some(hash), Some(password)) = (hash, password) {
            self.cache_password(hash, password);
            self.cache.note_hint(hash, hint);
        }
        info!(address = %address, id = %record.id(), "existing record imported");
        Ok(address)
    }

    /// Decrypt the secret of an account.
    ///
    /// With `use_cache`, a cached password for the account's hash is tried
    /// first; otherwise `provider` is asked once. No retries.
    pub fn secret(
        &self,
        account: AccountRef,
        provider: &dyn PasswordProvider,
        use_cache: bool,
    ) -> RegistryResult<SecretBytes> {
        // Recode replaces hash and record under the lock; read both together.
        let (hash, record) = {
            let state = self.state.lock();
            let found = state.lookup(account)?;
            (found.password_hash, self.store.load(&found.id)?)
        };

        let password = self.resolve_password(hash, provider, use_cache)?;
        let secret = record.open(password.expose_secret())?;

        let known = match hash {
            Some(hash) => hash,
            None => hash_password(&self.state.lock().password_salt, password.expose_secret()),
        };
        self.cache.insert(known, &password);

        debug!(account = %account, "secret unlocked");
        Ok(secret)
    }

    /// Re-encrypt an account's record under `new_password`
    pub fn recode(
        &self,
        address: &Address,
        new_password: &str,
        hint: &str,
        provider: &dyn PasswordProvider,
    ) -> RegistryResult<()> {
        let (id, hash) = {
            let state = self.state.lock();
            let found = state.lookup((*address).into())?;
            (found.id, found.password_hash)
        };

        let old_password = self.resolve_password(hash, provider, true)?;
        let record = self.store.load(&id)?;
        let recoded = record.recode(old_password.expose_secret(), new_password, &self.options.kdf)?;

        let new_hash = {
            let mut state = self.state.lock();
            let new_hash = hash_password(&state.password_salt, new_password);
            let previous = {
                let account = state.lookup_mut(address)?;
                (account.password_hash, account.password_hint.clone())
            };

            self.store.write(&recoded)?;
            {
                let account = state.lookup_mut(address)?;
                account.password_hash = Some(new_hash);
                account.password_hint = hint.to_string();
            }

            if let Err(e) = self.persist(&state) {
                // Registry still names the old hash; put the old record back.
                if let Err(restore) = self.store.write(&record) {
                    warn!(id = %id, error = %restore, "failed to restore record after recode");
                }
                if let Ok(account) = state.lookup_mut(address) {
                    account.password_hash = previous.0;
                    account.password_hint = previous.1;
                }
                return Err(e);
            }
            new_hash
        };

        self.cache_password(new_hash, new_password);
        self.cache.note_hint(new_hash, hint);
        info!(address = %address, id = %id, "account recoded");
        Ok(())
    }

    /// Change the display name of an account
    pub fn rename(&self, address: &Address, label: AccountLabel) -> RegistryResult<()> {
        let mut state = self.state.lock();
        let account = state.lookup_mut(address)?;
        let previous = std::mem::replace(&mut account.label, label);

        if let Err(e) = self.persist(&state) {
            if let Ok(account) = state.lookup_mut(address) {
                account.label = previous;
            }
            return Err(e);
        }
        debug!(address = %address, "account renamed");
        Ok(())
    }

    /// Remove an account and delete its record. Irreversible.
    ///
    /// Persisting the registry is the commit point: once it succeeds the
    /// account is gone, even if the record file cannot be deleted.
    pub fn kill(&self, address: &Address) -> RegistryResult<()> {
        let mut state = self.state.lock();
        let account = state
            .remove(address)
            .ok_or(RegistryError::AddressNotFound(*address))?;

        if let Err(e) = self.persist(&state) {
            state.insert(account);
            return Err(e);
        }

        match self.store.remove(&account.id) {
            Ok(()) => {}
            Err(crate::keystore::KeystoreError::RecordNotFound(id)) => {
                warn!(address = %address, id = %id, "record already missing on kill");
            }
            Err(e) => {
                warn!(address = %address, id = %account.id, error = %e, "failed to remove record on kill");
            }
        }

        info!(address = %address, id = %account.id, "account killed");
        Ok(())
    }

    /// Addresses of all accounts, sorted
    pub fn accounts(&self) -> Vec<Address> {
        self.state.lock().accounts.keys().copied().collect()
    }

    /// Full metadata of an account
    pub fn account(&self, address: &Address) -> RegistryResult<Account> {
        self.state.lock().lookup((*address).into()).cloned()
    }

    /// Whether `address` is registered
    pub fn has_account(&self, address: &Address) -> bool {
        self.state.lock().accounts.contains_key(address)
    }

    /// Address for an identifier
    pub fn address(&self, id: &Uuid) -> RegistryResult<Address> {
        self.state
            .lock()
            .lookup((*id).into())
            .map(|account| account.address)
    }

    /// Identifier for an address
    pub fn identifier(&self, address: &Address) -> RegistryResult<Uuid> {
        self.state
            .lock()
            .lookup((*address).into())
            .map(|account| account.id)
    }

    /// Display label of an account
    pub fn label(&self, address: &Address) -> RegistryResult<AccountLabel> {
        self.state
            .lock()
            .lookup((*address).into())
            .map(|account| account.label.clone())
    }

    /// Password hint of an account
    pub fn password_hint(&self, address: &Address) -> RegistryResult<String> {
        self.state
            .lock()
            .lookup((*address).into())
            .map(|account| account.password_hint.clone())
    }

    /// Find an account by hex address, identifier, or unique display name
    pub fn resolve(&self, text: &str) -> RegistryResult<Address> {
        let text = text.trim();
        let state = self.state.lock();

        if let Ok(address) = text.parse::<Address>() {
            if state.accounts.contains_key(&address) {
                return Ok(address);
            }
        }
        if let Ok(id) = Uuid::parse_str(text) {
            if let Some(address) = state.ids.get(&id) {
                return Ok(*address);
            }
        }

        let mut named = state
            .accounts
            .values()
            .filter(|account| account.label.display_name() == text);
        match (named.next(), named.next()) {
            (Some(account), None) => Ok(account.address),
            (Some(_), Some(_)) => Err(RegistryError::AmbiguousName(text.to_string())),
            (None, _) => Err(RegistryError::UnknownAccount(text.to_string())),
        }
    }

    fn resolve_password(
        &self,
        hash: Option<PasswordHash>,
        provider: &dyn PasswordProvider,
        use_cache: bool,
    ) -> RegistryResult<SecretString> {
        if use_cache {
            if let Some(cached) = hash.and_then(|h| self.cache.get(&h)) {
                return Ok(cached);
            }
        }

        let password = provider
            .try_get_password()
            .ok_or(RegistryError::PasswordUnknown)?;

        if let Some(expected) = hash {
            let salt = self.state.lock().password_salt.clone();
            if hash_password(&salt, password.expose_secret()) != expected {
                return Err(RegistryError::InvalidPassword);
            }
        }
        Ok(password)
    }

    /// Write `record`, insert `account` and persist, all under `state`.
    /// Rolls back on failure so no orphan record or account remains.
    fn adopt(
        &self,
        state: &mut RegistryState,
        record: &SecretRecord,
        account: Account,
    ) -> RegistryResult<()> {
        state.ensure_vacant(&account.address, &account.id)?;
        self.store.write(record)?;

        let address = account.address;
        state.insert(account);

        if let Err(e) = self.persist(state) {
            state.remove(&address);
            if let Err(cleanup) = self.store.remove(&record.id()) {
                warn!(id = %record.id(), error = %cleanup, "failed to remove orphaned record");
            }
            return Err(e);
        }
        Ok(())
    }

    fn persist(&self, state: &RegistryState) -> RegistryResult<()> {
        file::write(&self.options.path, &state.contents(), &state.file_key)
    }

    fn cache_password(&self, hash: PasswordHash, password: &str) {
        self.cache.insert(hash, &SecretString::from(password));
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("path", &self.options.path)
            .field("accounts", &self.state.lock().accounts.len())
            .finish()
    }
}
