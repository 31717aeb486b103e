//! Directory-backed store of secret records
//!
//! Each record lives in `<dir>/<uuid>.json`. Writes are atomic, so a reader
//! sees either the old record or the new one.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;
use uuid::Uuid;

use super::error::{KeystoreError, KeystoreResult};
use super::record::SecretRecord;

/// Secret records on disk, one file per identifier
#[derive(Debug, Clone)]
pub struct SecretStore {
    dir: PathBuf,
}

impl SecretStore {
    /// Open (creating if needed) a store rooted at `dir`
    pub fn new(dir: &Path) -> KeystoreResult<Self> {
        crate::fs::ensure_private_dir(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    /// Store directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path for a record identifier
    pub fn path(&self, id: &Uuid) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    /// Write or replace a record
    pub fn write(&self, record: &SecretRecord) -> KeystoreResult<()> {
        let path = self.path(&record.id);
        record.save(&path)?;
        debug!(id = %record.id, path = %path.display(), "secret record written");
        Ok(())
    }

    /// Load a record by identifier
    pub fn load(&self, id: &Uuid) -> KeystoreResult<SecretRecord> {
        match fs::read_to_string(self.path(id)) {
            Ok(json) => SecretRecord::from_json(&json),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(KeystoreError::RecordNotFound(*id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a record
    pub fn remove(&self, id: &Uuid) -> KeystoreResult<()> {
        match fs::remove_file(self.path(id)) {
            Ok(()) => {
                debug!(id = %id, "secret record removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(KeystoreError::RecordNotFound(*id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Whether a record file exists for `id`
    pub fn contains(&self, id: &Uuid) -> bool {
        self.path(id).is_file()
    }

    /// Identifiers of all record files, sorted
    pub fn ids(&self) -> KeystoreResult<Vec<Uuid>> {
        let mut ids = Vec::new();

        if !self.dir.exists() {
            return Ok(ids);
        }

        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();

            if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                if let Some(id) = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .and_then(|s| Uuid::parse_str(s).ok())
                {
                    ids.push(id);
                }
            }
        }

        ids.sort();
        Ok(ids)
    }
}
