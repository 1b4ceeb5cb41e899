use crate::error::Result;
use crate::notes::NoteBoard;
use crate::notifications::{self, UrlOpener};
use crate::persistence::{BackupEngine, Document, KeyValueStore, Snapshot, StorageKey};
use crate::pomodoro::{PomodoroEngine, TickOutcome};
use crate::search::SearchBox;
use crate::theme::ThemeEngine;
use crate::ticker::{Clock, Scheduler, THEME_CHECK_INTERVAL};
use crate::todos::TodoEngine;
use crate::websites::WebsiteEngine;
use chrono::{DateTime, Local};
use std::rc::Rc;

/// Shown when a write to storage failed since the last check
pub const SAVE_FAILED_NOTICE: &str = "Save failed: changes are kept for this session only";

/// Every engine of the start page, sharing one document
pub struct StartPage {
    document: Document,
    clock: Rc<dyn Clock>,
    scheduler: Rc<dyn Scheduler>,
    opener: Rc<dyn UrlOpener>,
    system_prefers_dark: bool,
    last_theme_check: DateTime<Local>,

    pub todos: TodoEngine,
    pub pomodoro: PomodoroEngine,
    pub websites: WebsiteEngine,
    pub search: SearchBox,
    pub notes: NoteBoard,
    pub theme: ThemeEngine,
}

impl StartPage {
    pub fn new(
        store: Rc<dyn KeyValueStore>,
        clock: Rc<dyn Clock>,
        scheduler: Rc<dyn Scheduler>,
        opener: Rc<dyn UrlOpener>,
        system_prefers_dark: bool,
    ) -> Self {
        let document = Document::new(store);
        let now = clock.now();

        Self {
            todos: TodoEngine::new(document.clone()),
            pomodoro: PomodoroEngine::new(document.clone(), clock.clone(), scheduler.clone()),
            websites: WebsiteEngine::new(document.clone(), opener.clone()),
            search: SearchBox::new(document.clone(), clock.clone(), opener.clone()),
            notes: NoteBoard::new(document.clone(), clock.clone()),
            theme: ThemeEngine::new(
                document.clone(),
                clock.clone(),
                scheduler.as_ref(),
                system_prefers_dark,
            ),
            document,
            clock,
            scheduler,
            opener,
            system_prefers_dark,
            last_theme_check: now,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn backup(&self) -> BackupEngine {
        BackupEngine::new(self.document.clone(), self.clock.clone())
    }

    /// Notice to show if any write failed since the last call
    pub fn take_notice(&self) -> Option<&'static str> {
        self.document.take_save_failure().then_some(SAVE_FAILED_NOTICE)
    }

    /// Host loop tick: advances the countdown and runs the hourly theme check
    pub fn tick(&mut self) -> TickOutcome {
        let outcome = self.pomodoro.tick();
        if let TickOutcome::Expired { finished } = outcome {
            notifications::notify_pomodoro_finished(finished);
        }

        let now = self.clock.now();
        let since_check = (now - self.last_theme_check).to_std().unwrap_or_default();
        if self.theme.ticker().is_active() && since_check >= THEME_CHECK_INTERVAL {
            self.last_theme_check = now;
            self.theme.check();
        }

        outcome
    }

    pub fn export_backup(&self) -> Result<Snapshot> {
        self.backup().export_all()
    }

    /// Replace stored collections with a backup, then reload every engine
    ///
    /// Nothing is written when the backup does not validate.
    pub fn import_backup(&mut self, raw: &str) -> Result<Vec<StorageKey>> {
        let snapshot = Snapshot::parse(raw)?;
        // Flush focus time first so the old engine has nothing left to write
        self.pomodoro.pause();
        let written = self.backup().apply(&snapshot)?;
        self.reload();
        Ok(written)
    }

    /// Remove all start page data, then reload every engine with defaults
    pub fn reset_all(&mut self) -> Result<()> {
        self.pomodoro.pause();
        let result = self.backup().reset_all();
        self.reload();
        result
    }

    /// Rebuild every engine from what is currently stored
    pub fn reload(&mut self) {
        let doc = &self.document;
        self.todos = TodoEngine::new(doc.clone());
        self.pomodoro = PomodoroEngine::new(doc.clone(), self.clock.clone(), self.scheduler.clone());
        self.websites = WebsiteEngine::new(doc.clone(), self.opener.clone());
        self.search = SearchBox::new(doc.clone(), self.clock.clone(), self.opener.clone());
        self.notes = NoteBoard::new(doc.clone(), self.clock.clone());
        self.theme = ThemeEngine::new(
            doc.clone(),
            self.clock.clone(),
            self.scheduler.as_ref(),
            self.system_prefers_dark,
        );
        self.last_theme_check = self.clock.now();
    }
}
