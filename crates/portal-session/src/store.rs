//! # Credential Store
//!
//! Durable key-value persistence of the bearer credential across restarts.
//! The store never inspects the token; a blank value reads back as absent.
//!
//! Two implementations:
//!
//! - [`MemoryCredentialStore`]: process-local, for tests and embedding.
//! - [`FileCredentialStore`]: a JSON object on disk. The credential lives
//!   under [`CREDENTIAL_KEY`]; other keys written by the host application
//!   are preserved. Writes go to a sibling temp file and are renamed into
//!   place.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use portal_core::Credential;

use crate::error::CredentialStoreError;

/// Key reserved for the bearer credential.
pub const CREDENTIAL_KEY: &str = "auth_token";

/// File name used by [`FileCredentialStore::in_dir`].
pub const DEFAULT_FILE_NAME: &str = "credentials.json";

/// Durable storage for the bearer credential.
pub trait CredentialStore: Send + Sync {
    /// Read the stored credential, if any.
    fn get(&self) -> Result<Option<Credential>, CredentialStoreError>;
    /// Replace the stored credential.
    fn set(&self, credential: &Credential) -> Result<(), CredentialStoreError>;
    /// Remove the stored credential. Clearing an empty store is not an error.
    fn clear(&self) -> Result<(), CredentialStoreError>;
}

// -- In-memory ------------------------------------------------------------------

/// Process-local credential store.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    slot: Mutex<Option<Credential>>,
}

impl MemoryCredentialStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with `credential`, as if persisted by an
    /// earlier run.
    pub fn with_credential(credential: Credential) -> Self {
        Self {
            slot: Mutex::new(Some(credential)),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> Result<Option<Credential>, CredentialStoreError> {
        Ok(self.slot.lock().clone().filter(|c| !c.is_blank()))
    }

    fn set(&self, credential: &Credential) -> Result<(), CredentialStoreError> {
        *self.slot.lock() = Some(credential.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), CredentialStoreError> {
        *self.slot.lock() = None;
        Ok(())
    }
}

// -- File-backed ----------------------------------------------------------------

/// JSON-file credential store.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    // Serialises read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileCredentialStore {
    /// Store backed by the file at `path`. The file need not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Store backed by `credentials.json` inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(DEFAULT_FILE_NAME))
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: std::io::Error) -> CredentialStoreError {
        CredentialStoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn read_map(&self) -> Result<BTreeMap<String, serde_json::Value>, CredentialStoreError> {
        let raw = match std::fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(self.io_err(e)),
        };
        if raw.iter().all(u8::is_ascii_whitespace) {
            return Ok(BTreeMap::new());
        }
        serde_json::from_slice(&raw).map_err(|source| CredentialStoreError::Json {
            path: self.path.clone(),
            source,
        })
    }

    fn write_map(
        &self,
        map: &BTreeMap<String, serde_json::Value>,
    ) -> Result<(), CredentialStoreError> {
        if map.is_empty() {
            return match std::fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(self.io_err(e)),
            };
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
        }

        let bytes = serde_json::to_vec_pretty(map).map_err(|source| CredentialStoreError::Json {
            path: self.path.clone(),
            source,
        })?;

        let tmp = self.path.with_extension("json.tmp");
        {
            let mut file = open_private(&tmp).map_err(|e| self.io_err(e))?;
            file.write_all(&bytes).map_err(|e| self.io_err(e))?;
            file.sync_all().map_err(|e| self.io_err(e))?;
        }
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_err(e))
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self) -> Result<Option<Credential>, CredentialStoreError> {
        let _guard = self.lock.lock();
        let map = self.read_map()?;
        Ok(map
            .get(CREDENTIAL_KEY)
            .and_then(serde_json::Value::as_str)
            .map(Credential::new)
            .filter(|c| !c.is_blank()))
    }

    fn set(&self, credential: &Credential) -> Result<(), CredentialStoreError> {
        let _guard = self.lock.lock();
        let mut map = self.read_map()?;
        map.insert(
            CREDENTIAL_KEY.to_string(),
            serde_json::Value::String(credential.expose().to_string()),
        );
        self.write_map(&map)
    }

    fn clear(&self) -> Result<(), CredentialStoreError> {
        let _guard = self.lock.lock();
        let (mut map, corrupt) = match self.read_map() {
            Ok(map) => (map, false),
            // A corrupt file cannot hold a usable credential; start over.
            Err(CredentialStoreError::Json { .. }) => (BTreeMap::new(), true),
            Err(e) => return Err(e),
        };
        if map.remove(CREDENTIAL_KEY).is_none() && !corrupt {
            return Ok(());
        }
        self.write_map(&map)
    }
}

#[cfg(unix)]
fn open_private(path: &Path) -> std::io::Result<std::fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> std::io::Result<std::fs::File> {
    std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}
