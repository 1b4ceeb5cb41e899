use super::document::{
    Document, PomodoroConfig, SearchHistory, StickyNotes, StorageKey, Todos, Websites,
    LEGACY_TODOS_KEY,
};
use crate::error::{Result, StartpageError, StoreError};
use crate::ticker::Clock;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::rc::Rc;

/// Format version written into every export
pub const EXPORT_FORMAT_VERSION: &str = "1.2.0";

/// A full export of the start page's state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub version: String,
    /// ISO-8601 UTC timestamp of the export
    pub export_date: String,
    pub data: SnapshotData,
}

/// Collections carried by a snapshot; `None` means "not in the snapshot"
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotData {
    #[serde(default)]
    pub websites: Option<Value>,
    #[serde(default)]
    pub todo_items: Option<Value>,
    #[serde(default)]
    pub search_history: Option<Value>,
    #[serde(default)]
    pub sticky_notes: Option<Value>,
    #[serde(default)]
    pub pomodoro_settings: Option<Value>,
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub is_user_selected_theme: Option<String>,
}

impl Snapshot {
    /// Parse and validate an exported file
    pub fn parse(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| StartpageError::InvalidFormat(format!("not valid JSON: {}", e)))?;

        let version = match value.get("version") {
            Some(Value::String(v)) if !v.is_empty() => v.clone(),
            Some(Value::Number(n)) if n.as_f64() != Some(0.0) => n.to_string(),
            _ => return Err(StartpageError::InvalidFormat("missing `version`".to_string())),
        };

        let mut data = match value.get("data") {
            Some(Value::Object(data)) => data.clone(),
            _ => return Err(StartpageError::InvalidFormat("missing `data`".to_string())),
        };
        // Backups from older releases call the todo list `todos`
        if let Some(legacy) = data.remove(LEGACY_TODOS_KEY) {
            data.entry("todoItems").or_insert(legacy);
        }
        let data: SnapshotData = serde_json::from_value(Value::Object(data))
            .map_err(|e| StartpageError::InvalidFormat(format!("malformed `data`: {}", e)))?;

        let export_date = value
            .get("exportDate")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Ok(Self {
            version,
            export_date,
            data,
        })
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| StoreError::from(e).into())
    }
}

/// Export, import and wipe of every stored collection
///
/// Import and reset are destructive and cannot be undone; callers confirm
/// with the user before invoking them.
pub struct BackupEngine {
    document: Document,
    clock: Rc<dyn Clock>,
}

impl BackupEngine {
    pub fn new(document: Document, clock: Rc<dyn Clock>) -> Self {
        Self { document, clock }
    }

    /// Gather every collection, read fresh from storage
    pub fn export_all(&self) -> Result<Snapshot> {
        let doc = &self.document;
        let data = SnapshotData {
            websites: Some(serde_json::to_value(doc.load::<Websites>()).map_err(StoreError::from)?),
            todo_items: Some(serde_json::to_value(doc.load::<Todos>()).map_err(StoreError::from)?),
            search_history: Some(
                serde_json::to_value(doc.load::<SearchHistory>()).map_err(StoreError::from)?,
            ),
            sticky_notes: Some(
                serde_json::to_value(doc.load::<StickyNotes>()).map_err(StoreError::from)?,
            ),
            pomodoro_settings: Some(
                serde_json::to_value(doc.load::<PomodoroConfig>()).map_err(StoreError::from)?,
            ),
            theme: doc.get_raw(StorageKey::Theme),
            is_user_selected_theme: doc.get_raw(StorageKey::IsUserSelectedTheme),
        };

        Ok(Snapshot {
            version: EXPORT_FORMAT_VERSION.to_string(),
            export_date: self
                .clock
                .now()
                .with_timezone(&Utc)
                .to_rfc3339_opts(SecondsFormat::Millis, true),
            data,
        })
    }

    /// Validate `raw` and write every collection it carries
    ///
    /// Nothing is written when validation fails. Collections missing from the
    /// snapshot are left untouched. Returns the keys that were written.
    pub fn import_all(&self, raw: &str) -> Result<Vec<StorageKey>> {
        let snapshot = Snapshot::parse(raw)?;
        self.apply(&snapshot)
    }

    /// Write every collection present in an already-parsed snapshot
    pub fn apply(&self, snapshot: &Snapshot) -> Result<Vec<StorageKey>> {
        let data = &snapshot.data;
        let json_fields = [
            (StorageKey::Websites, &data.websites),
            (StorageKey::TodoItems, &data.todo_items),
            (StorageKey::SearchHistory, &data.search_history),
            (StorageKey::StickyNotes, &data.sticky_notes),
            (StorageKey::PomodoroSettings, &data.pomodoro_settings),
        ];
        let plain_fields = [
            (StorageKey::Theme, &data.theme),
            (StorageKey::IsUserSelectedTheme, &data.is_user_selected_theme),
        ];

        let mut written = Vec::new();
        for (key, value) in json_fields {
            if let Some(value) = value {
                self.document.set_raw(key, &value.to_string())?;
                written.push(key);
            }
        }
        for (key, value) in plain_fields {
            if let Some(value) = value {
                self.document.set_raw(key, value)?;
                written.push(key);
            }
        }

        tracing::info!(version = %snapshot.version, collections = written.len(), "imported backup");
        Ok(written)
    }

    /// Remove every key the start page uses, including the legacy todo key
    ///
    /// Keeps going past a failed removal and reports the first failure.
    pub fn reset_all(&self) -> Result<()> {
        let keys = StorageKey::all()
            .iter()
            .map(StorageKey::as_str)
            .chain(std::iter::once(LEGACY_TODOS_KEY));

        let mut first_error = None;
        for key in keys {
            if let Err(e) = self.document.remove_key(key) {
                tracing::error!(key, error = %e, "failed to remove key during reset");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e.into()),
            None => {
                tracing::info!("all start page data removed");
                Ok(())
            }
        }
    }
}
