use super::store::{KeyValueStore, MemoryStore};
use crate::domain::{
    DailyFocusLog, PomodoroSettings, SearchHistoryEntry, StickyNote, TodoItem, Website,
};
use crate::error::StoreError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::cell::Cell;
use std::rc::Rc;

/// Every key the start page writes to storage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKey {
    TodoItems,
    Websites,
    SearchHistory,
    StickyNotes,
    PomodoroSettings,
    PomodoroFocusTime,
    Theme,
    IsUserSelectedTheme,
    CurrentEngine,
}

/// Key older releases kept todos under
pub const LEGACY_TODOS_KEY: &str = "todos";

impl StorageKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TodoItems => "todoItems",
            Self::Websites => "websites",
            Self::SearchHistory => "searchHistory",
            Self::StickyNotes => "stickyNotes",
            Self::PomodoroSettings => "pomodoroSettings",
            Self::PomodoroFocusTime => "pomodoroFocusTime",
            Self::Theme => "theme",
            Self::IsUserSelectedTheme => "isUserSelectedTheme",
            Self::CurrentEngine => "currentEngine",
        }
    }

    pub fn all() -> &'static [StorageKey] {
        &[
            Self::TodoItems,
            Self::Websites,
            Self::SearchHistory,
            Self::StickyNotes,
            Self::PomodoroSettings,
            Self::PomodoroFocusTime,
            Self::Theme,
            Self::IsUserSelectedTheme,
            Self::CurrentEngine,
        ]
    }
}

/// A JSON-encoded collection with a known key and a fallback value
pub trait Collection {
    const KEY: StorageKey;
    type Value: Serialize + DeserializeOwned;

    /// Value used when the key is absent or does not parse
    fn default_value() -> Self::Value;
}

pub struct Todos;
pub struct Websites;
pub struct SearchHistory;
pub struct StickyNotes;
pub struct PomodoroConfig;
pub struct FocusLog;

impl Collection for Todos {
    const KEY: StorageKey = StorageKey::TodoItems;
    type Value = Vec<TodoItem>;

    fn default_value() -> Self::Value {
        Vec::new()
    }
}

impl Collection for Websites {
    const KEY: StorageKey = StorageKey::Websites;
    type Value = Vec<Website>;

    fn default_value() -> Self::Value {
        Website::defaults()
    }
}

impl Collection for SearchHistory {
    const KEY: StorageKey = StorageKey::SearchHistory;
    type Value = Vec<SearchHistoryEntry>;

    fn default_value() -> Self::Value {
        Vec::new()
    }
}

impl Collection for StickyNotes {
    const KEY: StorageKey = StorageKey::StickyNotes;
    type Value = Vec<StickyNote>;

    fn default_value() -> Self::Value {
        Vec::new()
    }
}

impl Collection for PomodoroConfig {
    const KEY: StorageKey = StorageKey::PomodoroSettings;
    type Value = PomodoroSettings;

    fn default_value() -> Self::Value {
        PomodoroSettings::default()
    }
}

impl Collection for FocusLog {
    const KEY: StorageKey = StorageKey::PomodoroFocusTime;
    type Value = DailyFocusLog;

    fn default_value() -> Self::Value {
        DailyFocusLog::new()
    }
}

/// Typed access to every collection, layered over a shared key-value store
///
/// Clones share the same store and the same save-failure flag.
#[derive(Clone)]
pub struct Document {
    store: Rc<dyn KeyValueStore>,
    save_failed: Rc<Cell<bool>>,
}

impl Document {
    pub fn new(store: Rc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            save_failed: Rc::new(Cell::new(false)),
        }
    }

    /// Document over a fresh in-memory store
    pub fn in_memory() -> Self {
        Self::new(Rc::new(MemoryStore::new()))
    }

    /// Load a collection, falling back to its default when absent or malformed
    pub fn load<C: Collection>(&self) -> C::Value {
        self.load_stored::<C>().unwrap_or_else(C::default_value)
    }

    /// Load a collection only if it is stored and parses
    pub fn load_stored<C: Collection>(&self) -> Option<C::Value> {
        let raw = self.get_raw(C::KEY)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key = C::KEY.as_str(), error = %e, "stored value is malformed, using default");
                None
            }
        }
    }

    /// Serialize and write a collection
    pub fn save<C: Collection>(&self, value: &C::Value) -> Result<(), StoreError> {
        let json = serde_json::to_string(value)?;
        self.set_raw(C::KEY, &json)
    }

    /// Save a collection, recording a failure instead of returning it
    ///
    /// In-memory state stays authoritative after a failed write; the view is
    /// expected to show a notice when `take_save_failure` reports one.
    pub fn persist<C: Collection>(&self, value: &C::Value) -> bool {
        let result = self.save::<C>(value);
        self.record(C::KEY, result)
    }

    /// Read a plain string entry; store failures read as absent
    pub fn get_raw(&self, key: StorageKey) -> Option<String> {
        match self.store.get(key.as_str()) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key = key.as_str(), error = %e, "failed to read from storage");
                None
            }
        }
    }

    pub fn set_raw(&self, key: StorageKey, value: &str) -> Result<(), StoreError> {
        tracing::debug!(key = key.as_str(), bytes = value.len(), "writing to storage");
        self.store.set(key.as_str(), value)
    }

    /// Write a plain string entry, recording a failure instead of returning it
    pub fn persist_raw(&self, key: StorageKey, value: &str) -> bool {
        let result = self.set_raw(key, value);
        self.record(key, result)
    }

    pub fn remove(&self, key: StorageKey) -> Result<(), StoreError> {
        self.remove_key(key.as_str())
    }

    pub(crate) fn remove_key(&self, key: &str) -> Result<(), StoreError> {
        tracing::debug!(key, "removing from storage");
        self.store.remove(key)
    }

    /// Remove an entry, recording a failure instead of returning it
    pub fn persist_remove(&self, key: StorageKey) -> bool {
        let result = self.remove(key);
        self.record(key, result)
    }

    /// Whether a save failed since the last call; clears the flag
    pub fn take_save_failure(&self) -> bool {
        self.save_failed.replace(false)
    }

    fn record(&self, key: StorageKey, result: Result<(), StoreError>) -> bool {
        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(key = key.as_str(), error = %e, "save failed");
                self.save_failed.set(true);
                false
            }
        }
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("save_failed", &self.save_failed.get())
            .finish_non_exhaustive()
    }
}
