pub mod enums;
pub mod item;
pub mod views;

pub use enums::{NoteColor, PomodoroMode, Priority, RunStatus, SearchEngine, ThemeMode};
pub use item::{
    normalize_url, DailyFocusLog, PomodoroSettings, SearchHistoryEntry, StickyNote,
    ThemePreference, TodoItem, Website, BREAK_MINUTES_RANGE, DEFAULT_WEBSITE_ICON,
    WORK_MINUTES_RANGE,
};
pub use views::{todo_window, visible_range, TodoRow, TodoWindow, Viewport};
