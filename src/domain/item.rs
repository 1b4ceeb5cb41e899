use super::enums::{NoteColor, PomodoroMode, Priority, SearchEngine, ThemeMode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Icon used for a website when none was given
pub const DEFAULT_WEBSITE_ICON: &str = "🌐";

/// Allowed range for the work countdown, in minutes
pub const WORK_MINUTES_RANGE: (u32, u32) = (1, 60);
/// Allowed range for the break countdown, in minutes
pub const BREAK_MINUTES_RANGE: (u32, u32) = (1, 30);

/// A todo list entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    /// Items saved before priorities existed load as medium
    #[serde(default)]
    pub priority: Priority,
}

impl TodoItem {
    pub fn new(text: String, priority: Priority) -> Self {
        Self {
            text,
            completed: false,
            priority,
        }
    }
}

/// A bookmark tile in the website grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Website {
    pub name: String,
    pub url: String,
    #[serde(default = "default_icon")]
    pub icon: String,
}

fn default_icon() -> String {
    DEFAULT_WEBSITE_ICON.to_string()
}

impl Website {
    /// Build a website, normalizing the url and falling back to the default icon
    pub fn new(name: &str, url: &str, icon: &str) -> Self {
        let icon = icon.trim();
        Self {
            name: name.trim().to_string(),
            url: normalize_url(url),
            icon: if icon.is_empty() {
                default_icon()
            } else {
                icon.to_string()
            },
        }
    }

    /// The list shown before the user has saved any websites
    pub fn defaults() -> Vec<Website> {
        [
            ("Kimi", "https://www.kimi.com/", "🔍"),
            ("DeepSeek", "https://chat.deepseek.com/", "🌐"),
            ("B站", "https://www.bilibili.com", "📺"),
            ("GitHub", "https://github.com/", "💻"),
            ("抖音", "https://www.douyin.com", "🎵"),
            ("小红书", "https://www.xiaohongshu.com", "🛒"),
            ("网易邮箱", "https://mail.163.com/", "📱"),
            ("思霖的诗词格律学习手册", "https://silinsgh.github.io/Silinsweb/", "❓"),
        ]
        .into_iter()
        .map(|(name, url, icon)| Website {
            name: name.to_string(),
            url: url.to_string(),
            icon: icon.to_string(),
        })
        .collect()
    }
}

/// Prefix `https://` unless the url already names http or https
pub fn normalize_url(url: &str) -> String {
    let url = url.trim();
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

/// One remembered search, most recent first in the history list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHistoryEntry {
    pub query: String,
    pub engine: SearchEngine,
    /// Epoch milliseconds
    pub timestamp: i64,
}

/// A colored sticky note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StickyNote {
    #[serde(default)]
    pub content: String,
    /// Epoch milliseconds
    pub created_at: i64,
    #[serde(default)]
    pub color: NoteColor,
}

/// Persisted pomodoro configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PomodoroSettings {
    pub work_minutes: u32,
    pub break_minutes: u32,
    pub current_mode: PomodoroMode,
}

impl Default for PomodoroSettings {
    fn default() -> Self {
        Self {
            work_minutes: 25,
            break_minutes: 5,
            current_mode: PomodoroMode::Work,
        }
    }
}

impl PomodoroSettings {
    /// Clamp both durations into their allowed ranges
    pub fn clamped(self) -> Self {
        Self {
            work_minutes: clamp_minutes(self.work_minutes, WORK_MINUTES_RANGE),
            break_minutes: clamp_minutes(self.break_minutes, BREAK_MINUTES_RANGE),
            current_mode: self.current_mode,
        }
    }

    /// Configured duration of a mode in seconds
    pub fn duration_secs(&self, mode: PomodoroMode) -> u32 {
        match mode {
            PomodoroMode::Work => self.work_minutes * 60,
            PomodoroMode::Break => self.break_minutes * 60,
        }
    }
}

pub fn clamp_minutes(minutes: u32, (min, max): (u32, u32)) -> u32 {
    minutes.clamp(min, max)
}

/// Focused seconds per local calendar day, keyed `YYYY-MM-DD`
pub type DailyFocusLog = BTreeMap<String, u64>;

/// Current color scheme and whether the user picked it by hand
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThemePreference {
    pub mode: ThemeMode,
    /// When set, the time-of-day auto switch leaves the mode alone
    pub user_overridden: bool,
}
