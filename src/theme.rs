use crate::domain::{ThemeMode, ThemePreference};
use crate::persistence::{Document, StorageKey};
use crate::ticker::{Clock, Scheduler, TickHandle, THEME_CHECK_INTERVAL};
use chrono::{DateTime, Local, Timelike};
use std::rc::Rc;

/// Dark from 18:00 until 06:00
pub fn is_dark_hour(hour: u32) -> bool {
    hour >= 18 || hour < 6
}

/// Light/dark preference with a time-of-day auto switch
pub struct ThemeEngine {
    document: Document,
    clock: Rc<dyn Clock>,
    preference: ThemePreference,
    ticker: TickHandle,
}

impl ThemeEngine {
    /// Load the stored preference, then apply the auto switch once
    ///
    /// Without a stored theme the system preference decides the initial mode.
    pub fn new(
        document: Document,
        clock: Rc<dyn Clock>,
        scheduler: &dyn Scheduler,
        system_prefers_dark: bool,
    ) -> Self {
        let preference = load_preference(&document, system_prefers_dark);
        let ticker = scheduler.every(THEME_CHECK_INTERVAL);

        let mut engine = Self {
            document,
            clock,
            preference,
            ticker,
        };
        engine.check();
        engine
    }

    pub fn preference(&self) -> ThemePreference {
        self.preference
    }

    pub fn mode(&self) -> ThemeMode {
        self.preference.mode
    }

    /// Handle of the hourly re-check
    pub fn ticker(&self) -> &TickHandle {
        &self.ticker
    }

    /// Flip the mode by hand; freezes it against the auto switch
    pub fn toggle(&mut self) -> ThemeMode {
        self.preference = ThemePreference {
            mode: self.preference.mode.toggled(),
            user_overridden: true,
        };
        self.document.persist_raw(StorageKey::Theme, self.preference.mode.id());
        self.document.persist_raw(StorageKey::IsUserSelectedTheme, "true");
        self.preference.mode
    }

    /// Hand control back to the time-of-day switch
    pub fn clear_override(&mut self) {
        self.preference.user_overridden = false;
        self.document.persist_remove(StorageKey::IsUserSelectedTheme);
        self.check();
    }

    /// Hourly check; returns true when the mode changed
    pub fn check(&mut self) -> bool {
        let now = self.clock.now();
        self.auto_switch(now)
    }

    /// Follow the time of day unless the user picked a mode
    pub fn auto_switch(&mut self, now: DateTime<Local>) -> bool {
        if self.preference.user_overridden {
            return false;
        }

        let wanted = if is_dark_hour(now.hour()) {
            ThemeMode::Dark
        } else {
            ThemeMode::Light
        };
        if wanted == self.preference.mode {
            return false;
        }

        self.preference.mode = wanted;
        // Stored, but not marked as a user choice
        self.document.persist_raw(StorageKey::Theme, wanted.id());
        tracing::debug!(mode = wanted.id(), "theme switched by time of day");
        true
    }
}

fn load_preference(document: &Document, system_prefers_dark: bool) -> ThemePreference {
    let user_overridden = document
        .get_raw(StorageKey::IsUserSelectedTheme)
        .is_some_and(|v| v == "true");
    let mode = document
        .get_raw(StorageKey::Theme)
        .and_then(|id| ThemeMode::from_id(&id))
        .unwrap_or(if system_prefers_dark {
            ThemeMode::Dark
        } else {
            ThemeMode::Light
        });

    ThemePreference {
        mode,
        user_overridden,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticker::{ManualClock, ManualScheduler};

    fn theme_at(doc: &Document, clock: &ManualClock, system_dark: bool) -> ThemeEngine {
        ThemeEngine::new(
            doc.clone(),
            Rc::new(clock.clone()),
            &ManualScheduler::new(),
            system_dark,
        )
    }

    #[test]
    fn test_dark_hours() {
        assert!(is_dark_hour(18));
        assert!(is_dark_hour(23));
        assert!(is_dark_hour(0));
        assert!(is_dark_hour(5));
        assert!(!is_dark_hour(6));
        assert!(!is_dark_hour(17));
    }

    #[test]
    fn test_auto_switch_on_load_persists_theme_only() {
        let doc = Document::in_memory();
        let clock = ManualClock::at(2024, 3, 1, 21, 0);
        let engine = theme_at(&doc, &clock, false);

        assert_eq!(engine.mode(), ThemeMode::Dark);
        assert_eq!(doc.get_raw(StorageKey::Theme).as_deref(), Some("dark"));
        assert_eq!(doc.get_raw(StorageKey::IsUserSelectedTheme), None);
    }

    #[test]
    fn test_system_preference_used_when_nothing_stored() {
        let doc = Document::in_memory();
        let clock = ManualClock::at(2024, 3, 1, 3, 0);
        let engine = theme_at(&doc, &clock, true);
        // Already dark at 03:00, so nothing is written
        assert_eq!(engine.mode(), ThemeMode::Dark);
        assert_eq!(doc.get_raw(StorageKey::Theme), None);
    }

    #[test]
    fn test_hourly_check_follows_time() {
        let doc = Document::in_memory();
        let clock = ManualClock::at(2024, 3, 1, 17, 0);
        let mut engine = theme_at(&doc, &clock, false);
        assert_eq!(engine.mode(), ThemeMode::Light);

        clock.advance(chrono::Duration::hours(1));
        assert!(engine.check());
        assert_eq!(engine.mode(), ThemeMode::Dark);
        assert!(!engine.check());
    }

    #[test]
    fn test_toggle_freezes_mode() {
        let doc = Document::in_memory();
        let clock = ManualClock::at(2024, 3, 1, 12, 0);
        let mut engine = theme_at(&doc, &clock, false);

        assert_eq!(engine.toggle(), ThemeMode::Dark);
        assert_eq!(doc.get_raw(StorageKey::IsUserSelectedTheme).as_deref(), Some("true"));

        // Still noon: auto switch would pick light, but the user chose dark
        assert!(!engine.check());
        assert_eq!(engine.mode(), ThemeMode::Dark);

        let reloaded = theme_at(&doc, &clock, false);
        assert_eq!(reloaded.preference(), engine.preference());
    }

    #[test]
    fn test_clear_override_resumes_auto() {
        let doc = Document::in_memory();
        let clock = ManualClock::at(2024, 3, 1, 12, 0);
        let mut engine = theme_at(&doc, &clock, false);
        engine.toggle();
        engine.clear_override();

        assert_eq!(engine.mode(), ThemeMode::Light);
        assert!(!engine.preference().user_overridden);
        assert_eq!(doc.get_raw(StorageKey::IsUserSelectedTheme), None);
    }

    #[test]
    fn test_dropping_engine_cancels_hourly_check() {
        let doc = Document::in_memory();
        let clock = ManualClock::at(2024, 3, 1, 12, 0);
        let scheduler = ManualScheduler::new();
        let engine = ThemeEngine::new(doc, Rc::new(clock), &scheduler, false);
        assert_eq!(scheduler.active_count(), 1);
        assert_eq!(engine.ticker().interval(), THEME_CHECK_INTERVAL);

        drop(engine);
        assert_eq!(scheduler.active_count(), 0);
    }
}
