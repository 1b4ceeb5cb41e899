//! Desktop notifications and opening URLs in the user's browser
//! Notifications are only implemented on macOS

use crate::domain::PomodoroMode;
use std::process::Command;

/// Capability to open a URL in a new browsing context
pub trait UrlOpener {
    fn open(&self, url: &str);
}

/// Opens URLs with the platform's default handler
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemOpener;

impl UrlOpener for SystemOpener {
    fn open(&self, url: &str) {
        #[cfg(target_os = "macos")]
        let result = Command::new("open").arg(url).spawn();

        #[cfg(target_os = "windows")]
        let result = Command::new("cmd").args(["/C", "start", "", url]).spawn();

        #[cfg(not(any(target_os = "macos", target_os = "windows")))]
        let result = Command::new("xdg-open").arg(url).spawn();

        if let Err(e) = result {
            tracing::warn!(url, error = %e, "failed to open url");
        }
    }
}

/// Send a notification when a pomodoro countdown runs out
pub fn notify_pomodoro_finished(finished: PomodoroMode) {
    let message = match finished {
        PomodoroMode::Work => "Work session done. Time for a break.",
        PomodoroMode::Break => "Break is over. Back to work.",
    };

    #[cfg(target_os = "macos")]
    {
        let script = format!(
            r#"display notification "{}" with title "Start Page - Pomodoro""#,
            message
        );

        let _ = Command::new("osascript").arg("-e").arg(&script).output();
    }

    #[cfg(not(target_os = "macos"))]
    {
        tracing::info!(notice = message, "pomodoro finished");
    }
}
