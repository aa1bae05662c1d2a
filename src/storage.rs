use crate::errors::PersistError;
use crate::models::{AppData, STORAGE_KEY};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::{fs, io};
use tracing::error;

/// String key-value storage with a snapshot layer on top.
///
/// Implementors only supply `get_item` / `set_item`; the snapshot is kept as
/// one serialized JSON string under [`STORAGE_KEY`].
pub trait Persistence {
    fn get_item(&self, key: &str) -> Result<Option<String>, PersistError>;

    fn set_item(&mut self, key: &str, value: String) -> Result<(), PersistError>;

    /// Reads the snapshot. Missing or unreadable data yields `None`.
    fn load(&self) -> Option<AppData> {
        let raw = match self.get_item(STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                error!("failed to read snapshot: {err}");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(data) => Some(data),
            Err(err) => {
                error!("failed to parse snapshot: {err}");
                None
            }
        }
    }

    fn save(&mut self, data: &AppData) -> Result<(), PersistError> {
        let payload = serde_json::to_string(data)?;
        self.set_item(STORAGE_KEY, payload)
    }
}

/// File-backed key-value store. The file holds a JSON object mapping keys to
/// string values.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    path: PathBuf,
}

impl LocalStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_items(&self) -> Result<BTreeMap<String, String>, PersistError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(err.into()),
        }
    }

    fn write_items(&self, items: &BTreeMap<String, String>) -> Result<(), PersistError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let payload = serde_json::to_vec_pretty(items)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, payload)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl Persistence for LocalStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, PersistError> {
        Ok(self.read_items()?.remove(key))
    }

    fn set_item(&mut self, key: &str, value: String) -> Result<(), PersistError> {
        let mut items = items_for_write(&self.path, self.read_items())?;
        items.insert(key.to_string(), value);
        self.write_items(&items)
    }
}

/// Existing items to merge a write into. A file that is not valid JSON is
/// replaced; I/O failures abort the write so other keys are not lost.
fn items_for_write(
    path: &Path,
    read: Result<BTreeMap<String, String>, PersistError>,
) -> Result<BTreeMap<String, String>, PersistError> {
    match read {
        Ok(items) => Ok(items),
        Err(PersistError::Serialize(err)) => {
            error!("discarding unreadable storage file {}: {err}", path.display());
            Ok(BTreeMap::new())
        }
        Err(err) => Err(err),
    }
}

/// In-process storage, used by tests and ephemeral runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: BTreeMap<String, String>,
    fail_writes: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent write fail, simulating a full or locked store.
    pub fn fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }
}

impl Persistence for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, PersistError> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: String) -> Result<(), PersistError> {
        if self.fail_writes {
            return Err(PersistError::Unavailable("writes disabled".into()));
        }
        self.items.insert(key.to_string(), value);
        Ok(())
    }
}
