use crate::error::StoreError;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Persistent string-keyed storage, the contract of the browser's localStorage
///
/// Methods take `&self`: the store is a shared handle, like the page-global
/// storage object it stands in for.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// In-memory store, lost when dropped
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every entry, for assertions
    pub fn entries(&self) -> BTreeMap<String, String> {
        self.entries.borrow().clone()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// Store backed by one JSON object on disk, rewritten atomically on every change
///
/// Every write re-reads the file and changes only its own key, so several
/// handles on the same file (one per running command) never undo each other.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: RefCell<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store file, treating a missing or empty file as an empty store
    ///
    /// A file that is not a JSON object of strings is moved aside and the
    /// store starts empty.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
            entries: RefCell::new(BTreeMap::new()),
        };
        let entries = store.read_or_recover()?;
        *store.entries.borrow_mut() = entries;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn read_or_recover(&self) -> Result<BTreeMap<String, String>, StoreError> {
        match self.read_entries() {
            Err(StoreError::Encoding(e)) => {
                let moved = self.quarantine()?;
                tracing::warn!(
                    error = %e,
                    moved_to = %moved.display(),
                    "storage file is malformed, starting empty"
                );
                Ok(BTreeMap::new())
            }
            result => result,
        }
    }

    /// Rename the current file to `<name>.corrupt-<timestamp>`
    fn quarantine(&self) -> Result<PathBuf, StoreError> {
        let stamp = chrono::Local::now().format("%Y%m%d%H%M%S");
        let mut name = self.path.clone().into_os_string();
        name.push(format!(".corrupt-{}", stamp));
        let target = PathBuf::from(name);
        fs::rename(&self.path, &target)?;
        Ok(target)
    }

    /// Apply one change to the latest on-disk state and write it back
    fn update<F>(&self, change: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let mut next = self.read_or_recover()?;
        change(&mut next);
        self.flush(&next)?;
        // Only adopt the change once it is on disk
        *self.entries.borrow_mut() = next;
        Ok(())
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let dir = self.path.parent().ok_or_else(|| {
            StoreError::Unavailable(format!("no parent directory: {}", self.path.display()))
        })?;
        let json = serde_json::to_string_pretty(entries)?;

        let mut temp_file = NamedTempFile::new_in(dir)?;
        temp_file.write_all(json.as_bytes())?;
        temp_file.as_file().sync_all()?;
        temp_file.persist(&self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.update(|entries| {
            entries.remove(key);
        })
    }
}
