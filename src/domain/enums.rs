use serde::{Deserialize, Serialize};

/// Priority of a todo item
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    /// Parse priority from its stored id like "high"
    pub fn from_id(id: &str) -> Option<Self> {
        match id.to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "urgent" => Some(Self::Urgent),
            _ => None,
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }

    /// Label shown next to the todo text
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low priority",
            Self::Medium => "Medium priority",
            Self::High => "High priority",
            Self::Urgent => "Urgent",
        }
    }
}

/// Search provider a query is dispatched to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchEngine {
    #[default]
    Baidu,
    Google,
    Bing,
}

impl SearchEngine {
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "baidu" => Some(Self::Baidu),
            "google" => Some(Self::Google),
            "bing" => Some(Self::Bing),
            _ => None,
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            Self::Baidu => "baidu",
            Self::Google => "google",
            Self::Bing => "bing",
        }
    }

    /// Display name for the engine picker
    pub fn name(&self) -> &'static str {
        match self {
            Self::Baidu => "百度",
            Self::Google => "Google",
            Self::Bing => "Bing",
        }
    }

    pub fn all() -> &'static [SearchEngine] {
        &[Self::Baidu, Self::Google, Self::Bing]
    }
}

/// Background color of a sticky note
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteColor {
    #[default]
    Yellow,
    Blue,
    Green,
    Pink,
    Purple,
}

impl NoteColor {
    pub fn from_id(id: &str) -> Option<Self> {
        match id.to_lowercase().as_str() {
            "yellow" => Some(Self::Yellow),
            "blue" => Some(Self::Blue),
            "green" => Some(Self::Green),
            "pink" => Some(Self::Pink),
            "purple" => Some(Self::Purple),
            _ => None,
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            Self::Yellow => "yellow",
            Self::Blue => "blue",
            Self::Green => "green",
            Self::Pink => "pink",
            Self::Purple => "purple",
        }
    }
}

/// Which countdown the pomodoro timer is running
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PomodoroMode {
    #[default]
    Work,
    Break,
}

impl PomodoroMode {
    /// The other mode
    pub fn flipped(&self) -> Self {
        match self {
            Self::Work => Self::Break,
            Self::Break => Self::Work,
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            Self::Work => "work",
            Self::Break => "break",
        }
    }
}

/// Runtime status of the pomodoro countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Idle,
    Running,
    Paused,
}

/// Light or dark color scheme
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl ThemeMode {
    /// Parse the plain string stored under the `theme` key
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}
