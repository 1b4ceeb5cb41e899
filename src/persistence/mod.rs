pub mod backup;
pub mod document;
pub mod files;
pub mod store;

pub use backup::{BackupEngine, Snapshot, SnapshotData, EXPORT_FORMAT_VERSION};
pub use document::{
    Collection, Document, FocusLog, PomodoroConfig, SearchHistory, StickyNotes, StorageKey,
    Todos, Websites, LEGACY_TODOS_KEY,
};
pub use files::{
    atomic_write, backup_file_name, ensure_data_dir, get_data_dir, init_local_data_dir,
    read_file, storage_file,
};
pub use store::{FileStore, KeyValueStore, MemoryStore};
