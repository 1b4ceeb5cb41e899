use crate::domain::{
    item::clamp_minutes, DailyFocusLog, PomodoroMode, PomodoroSettings, RunStatus,
    BREAK_MINUTES_RANGE, WORK_MINUTES_RANGE,
};
use crate::persistence::{Document, FocusLog, PomodoroConfig};
use crate::ticker::{tick_duration, Clock, Scheduler, TickHandle};
use chrono::{DateTime, Local};
use std::rc::Rc;

/// What a tick observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The countdown is not running
    Stopped,
    Running { time_left: u32 },
    /// The countdown reached zero and the timer switched to the other mode
    Expired { finished: PomodoroMode },
}

/// Work/break countdown anchored to wall-clock time, with daily focus accounting
///
/// `time_left` is always derived from the elapsed wall-clock time since the
/// countdown started, never from the number of ticks observed, so delayed or
/// skipped ticks cannot make it drift.
pub struct PomodoroEngine {
    document: Document,
    clock: Rc<dyn Clock>,
    scheduler: Rc<dyn Scheduler>,
    settings: PomodoroSettings,
    status: RunStatus,
    time_left: u32,
    total_time: u32,
    /// Wall-clock start of the countdown, shifted forward by any paused time
    anchor: Option<DateTime<Local>>,
    /// Countdown milliseconds consumed before the current run segment
    elapsed_before_ms: i64,
    /// Instant up to which work time is already in the focus log
    focus_checkpoint: Option<DateTime<Local>>,
    focus_log: DailyFocusLog,
    ticker: Option<TickHandle>,
}

impl PomodoroEngine {
    pub fn new(document: Document, clock: Rc<dyn Clock>, scheduler: Rc<dyn Scheduler>) -> Self {
        let settings = document.load::<PomodoroConfig>().clamped();
        let focus_log = document.load::<FocusLog>();
        let total_time = settings.duration_secs(settings.current_mode);

        Self {
            document,
            clock,
            scheduler,
            settings,
            status: RunStatus::Idle,
            time_left: total_time,
            total_time,
            anchor: None,
            elapsed_before_ms: 0,
            focus_checkpoint: None,
            focus_log,
            ticker: None,
        }
    }

    pub fn settings(&self) -> PomodoroSettings {
        self.settings
    }

    pub fn mode(&self) -> PomodoroMode {
        self.settings.current_mode
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == RunStatus::Running
    }

    /// Seconds remaining, as of the last tick or state change
    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    pub fn total_time(&self) -> u32 {
        self.total_time
    }

    /// The tick handle while running, for hosts that drive the loop
    pub fn ticker(&self) -> Option<&TickHandle> {
        self.ticker.as_ref()
    }

    /// Remaining time as "MM:SS"
    pub fn formatted_time(&self) -> String {
        format!("{:02}:{:02}", self.time_left / 60, self.time_left % 60)
    }

    /// Share of the countdown already elapsed, 0.0 to 100.0
    pub fn progress_percentage(&self) -> f64 {
        if self.total_time == 0 {
            return 0.0;
        }
        f64::from(self.total_time - self.time_left) / f64::from(self.total_time) * 100.0
    }

    pub fn focus_log(&self) -> &DailyFocusLog {
        &self.focus_log
    }

    /// Focused seconds recorded for the clock's current day
    pub fn today_focus_seconds(&self) -> u64 {
        let today = day_key(self.clock.now());
        self.focus_log.get(&today).copied().unwrap_or(0)
    }

    /// Start or resume the countdown; no-op while already running
    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }

        let now = self.clock.now();
        self.anchor = Some(now - chrono::Duration::milliseconds(self.elapsed_before_ms));
        if self.mode() == PomodoroMode::Work {
            self.focus_checkpoint = Some(now);
        }
        self.status = RunStatus::Running;
        self.ticker = Some(self.scheduler.every(tick_duration()));
        tracing::debug!(mode = self.mode().id(), time_left = self.time_left, "pomodoro started");
    }

    /// Start when stopped, pause when running
    pub fn toggle(&mut self) {
        if self.is_running() {
            self.pause();
        } else {
            self.start();
        }
    }

    /// Recompute the countdown from wall-clock time and account focus time
    pub fn tick(&mut self) -> TickOutcome {
        if !self.is_running() {
            return TickOutcome::Stopped;
        }

        let now = self.clock.now();
        self.record_focus(now);
        self.refresh_time_left(now);

        if self.time_left == 0 {
            let finished = self.mode();
            self.switch_mode();
            return TickOutcome::Expired { finished };
        }

        TickOutcome::Running {
            time_left: self.time_left,
        }
    }

    /// Freeze the countdown; focus time up to now is persisted before returning
    pub fn pause(&mut self) {
        if !self.is_running() {
            return;
        }

        let now = self.clock.now();
        self.record_focus(now);
        self.refresh_time_left(now);
        if let Some(anchor) = self.anchor.take() {
            self.elapsed_before_ms = (now - anchor).num_milliseconds().max(0);
        }
        self.focus_checkpoint = None;
        self.status = RunStatus::Paused;
        self.stop_ticker();
        tracing::debug!(mode = self.mode().id(), time_left = self.time_left, "pomodoro paused");
    }

    /// Back to the full duration of the current mode, without changing mode
    pub fn reset(&mut self) {
        self.pause();
        self.status = RunStatus::Idle;
        self.restart_countdown();
    }

    /// Pause, flip work/break, reset to the new mode's duration and persist
    pub fn switch_mode(&mut self) {
        self.pause();
        self.settings.current_mode = self.mode().flipped();
        self.reset();
        self.save_settings();
        tracing::info!(mode = self.mode().id(), "pomodoro switched mode");
    }

    /// Change the work duration, clamped to 1..=60 minutes
    ///
    /// A running work countdown keeps its current length; the new duration
    /// applies from the next reset.
    pub fn set_work_minutes(&mut self, minutes: u32) {
        self.settings.work_minutes = clamp_minutes(minutes, WORK_MINUTES_RANGE);
        if self.mode() == PomodoroMode::Work && !self.is_running() {
            self.restart_countdown();
        }
        self.save_settings();
    }

    /// Change the break duration, clamped to 1..=30 minutes
    pub fn set_break_minutes(&mut self, minutes: u32) {
        self.settings.break_minutes = clamp_minutes(minutes, BREAK_MINUTES_RANGE);
        if self.mode() == PomodoroMode::Break && !self.is_running() {
            self.restart_countdown();
        }
        self.save_settings();
    }

    /// The host is about to go away: make focus time durable now
    pub fn on_unload(&mut self) {
        let now = self.clock.now();
        self.record_focus(now);
    }

    fn restart_countdown(&mut self) {
        self.total_time = self.settings.duration_secs(self.mode());
        self.time_left = self.total_time;
        self.elapsed_before_ms = 0;
    }

    fn refresh_time_left(&mut self, now: DateTime<Local>) {
        if let Some(anchor) = self.anchor {
            let elapsed_secs = (now - anchor).num_seconds().max(0);
            let left = i64::from(self.total_time) - elapsed_secs;
            self.time_left = left.max(0) as u32;
        }
    }

    /// Add work time since the checkpoint to today's bucket and persist it
    fn record_focus(&mut self, now: DateTime<Local>) {
        if !self.is_running() || self.mode() != PomodoroMode::Work {
            return;
        }
        let (Some(checkpoint), Some(anchor)) = (self.focus_checkpoint, self.anchor) else {
            return;
        };

        // Time after the countdown ran out is not focus time
        let countdown_end = anchor + chrono::Duration::seconds(i64::from(self.total_time));
        let until = now.min(countdown_end);
        let secs = (until - checkpoint).num_seconds();
        if secs <= 0 {
            return;
        }

        *self.focus_log.entry(day_key(now)).or_insert(0) += secs as u64;
        self.focus_checkpoint = Some(checkpoint + chrono::Duration::seconds(secs));
        self.document.persist::<FocusLog>(&self.focus_log);
    }

    fn stop_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.cancel();
        }
    }

    fn save_settings(&self) {
        self.document.persist::<PomodoroConfig>(&self.settings);
    }
}

impl Drop for PomodoroEngine {
    fn drop(&mut self) {
        self.on_unload();
        self.stop_ticker();
    }
}

/// Local calendar day key of the focus log
pub fn day_key(at: DateTime<Local>) -> String {
    at.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{MemoryStore, StorageKey};
    use crate::ticker::{ManualClock, ManualScheduler};
    use chrono::Duration;

    struct Harness {
        doc: Document,
        clock: ManualClock,
        scheduler: Rc<ManualScheduler>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                doc: Document::new(Rc::new(MemoryStore::new())),
                clock: ManualClock::at(2024, 6, 3, 9, 0),
                scheduler: Rc::new(ManualScheduler::new()),
            }
        }

        fn engine(&self) -> PomodoroEngine {
            PomodoroEngine::new(
                self.doc.clone(),
                Rc::new(self.clock.clone()),
                self.scheduler.clone(),
            )
        }

        fn stored_focus(&self) -> u64 {
            self.doc
                .load::<FocusLog>()
                .get("2024-06-03")
                .copied()
                .unwrap_or(0)
        }
    }

    #[test]
    fn test_new_uses_defaults() {
        let h = Harness::new();
        let engine = h.engine();
        assert_eq!(engine.mode(), PomodoroMode::Work);
        assert_eq!(engine.status(), RunStatus::Idle);
        assert_eq!(engine.time_left(), 1500);
        assert_eq!(engine.formatted_time(), "25:00");
    }

    #[test]
    fn test_new_clamps_stored_settings() {
        let h = Harness::new();
        h.doc
            .set_raw(
                StorageKey::PomodoroSettings,
                r#"{"workMinutes":120,"breakMinutes":10,"currentMode":"break"}"#,
            )
            .unwrap();
        let engine = h.engine();
        assert_eq!(engine.settings().work_minutes, 60);
        assert_eq!(engine.mode(), PomodoroMode::Break);
        assert_eq!(engine.time_left(), 600);
    }

    #[test]
    fn test_time_left_is_wall_clock_derived() {
        let h = Harness::new();
        let mut engine = h.engine();
        engine.start();

        // A throttled tab: a minute passes with no tick at all
        h.clock.advance(Duration::seconds(60));
        assert_eq!(engine.tick(), TickOutcome::Running { time_left: 1440 });
    }

    #[test]
    fn test_irregular_ticks_do_not_drift() {
        let h = Harness::new();
        let mut engine = h.engine();
        engine.start();

        for step_ms in [250, 1700, 30, 4020, 999, 1] {
            h.clock.advance(Duration::milliseconds(step_ms));
            engine.tick();
        }
        // 7000ms elapsed in total
        assert_eq!(engine.time_left(), 1493);
    }

    #[test]
    fn test_pause_freezes_and_resume_continues() {
        let h = Harness::new();
        let mut engine = h.engine();
        engine.start();
        h.clock.advance(Duration::milliseconds(10_500));
        engine.pause();
        assert_eq!(engine.status(), RunStatus::Paused);
        assert_eq!(engine.time_left(), 1490);

        h.clock.advance(Duration::minutes(5));
        assert_eq!(engine.tick(), TickOutcome::Stopped);
        assert_eq!(engine.time_left(), 1490);

        engine.start();
        h.clock.advance(Duration::milliseconds(500));
        // The half second before the pause is not lost
        assert_eq!(engine.tick(), TickOutcome::Running { time_left: 1489 });
    }

    #[test]
    fn test_expiry_switches_to_break() {
        let h = Harness::new();
        let mut engine = h.engine();
        engine.start();

        h.clock.advance(Duration::minutes(25));
        assert_eq!(
            engine.tick(),
            TickOutcome::Expired {
                finished: PomodoroMode::Work
            }
        );
        assert_eq!(engine.mode(), PomodoroMode::Break);
        assert!(!engine.is_running());
        assert_eq!(engine.time_left(), 5 * 60);
        assert_eq!(h.doc.load::<PomodoroConfig>().current_mode, PomodoroMode::Break);
    }

    #[test]
    fn test_focus_recorded_before_pause_returns() {
        let h = Harness::new();
        let mut engine = h.engine();
        engine.start();

        h.clock.advance(Duration::seconds(90));
        engine.pause();
        assert!(h.stored_focus() >= 90);
        assert_eq!(engine.today_focus_seconds(), 90);
    }

    #[test]
    fn test_focus_accumulates_per_tick_without_double_counting() {
        let h = Harness::new();
        let mut engine = h.engine();
        engine.start();

        for _ in 0..10 {
            h.clock.advance(Duration::milliseconds(1500));
            engine.tick();
            assert_eq!(h.stored_focus(), engine.today_focus_seconds());
        }
        engine.pause();
        assert_eq!(h.stored_focus(), 15);
    }

    #[test]
    fn test_focus_capped_at_countdown_end() {
        let h = Harness::new();
        let mut engine = h.engine();
        engine.set_work_minutes(1);
        engine.start();

        // Tab asleep for an hour
        h.clock.advance(Duration::hours(1));
        engine.tick();
        assert_eq!(h.stored_focus(), 60);
    }

    #[test]
    fn test_break_time_is_not_focus_time() {
        let h = Harness::new();
        let mut engine = h.engine();
        engine.switch_mode();
        engine.start();
        h.clock.advance(Duration::seconds(120));
        engine.pause();
        assert_eq!(h.stored_focus(), 0);
    }

    #[test]
    fn test_manual_switch_flushes_focus() {
        let h = Harness::new();
        let mut engine = h.engine();
        engine.start();

        // No tick between start and the switch
        h.clock.advance(Duration::seconds(40));
        engine.switch_mode();
        assert_eq!(h.stored_focus(), 40);
        assert_eq!(engine.mode(), PomodoroMode::Break);
        assert_eq!(engine.status(), RunStatus::Idle);
    }

    #[test]
    fn test_unload_and_drop_flush_focus() {
        let h = Harness::new();
        let mut engine = h.engine();
        engine.start();
        h.clock.advance(Duration::seconds(30));
        engine.on_unload();
        assert_eq!(h.stored_focus(), 30);
        assert!(engine.is_running());

        h.clock.advance(Duration::seconds(12));
        drop(engine);
        assert_eq!(h.stored_focus(), 42);
        assert_eq!(h.scheduler.active_count(), 0);
    }

    #[test]
    fn test_focus_log_adds_to_previous_sessions() {
        let h = Harness::new();
        h.doc
            .save::<FocusLog>(&DailyFocusLog::from([
                ("2024-06-02".to_string(), 600),
                ("2024-06-03".to_string(), 100),
            ]))
            .unwrap();
        let mut engine = h.engine();
        engine.start();
        h.clock.advance(Duration::seconds(20));
        engine.pause();

        let log = h.doc.load::<FocusLog>();
        assert_eq!(log["2024-06-03"], 120);
        assert_eq!(log["2024-06-02"], 600);
    }

    #[test]
    fn test_ticker_lifecycle() {
        let h = Harness::new();
        let mut engine = h.engine();
        engine.start();
        engine.start();
        assert_eq!(h.scheduler.active_count(), 1);
        assert!(engine.ticker().is_some());

        engine.pause();
        engine.pause();
        assert_eq!(h.scheduler.active_count(), 0);
        assert!(engine.ticker().is_none());
    }

    #[test]
    fn test_reset_keeps_mode() {
        let h = Harness::new();
        let mut engine = h.engine();
        engine.switch_mode();
        engine.start();
        h.clock.advance(Duration::seconds(100));
        engine.tick();
        engine.reset();

        assert_eq!(engine.mode(), PomodoroMode::Break);
        assert_eq!(engine.status(), RunStatus::Idle);
        assert_eq!(engine.time_left(), 300);
        assert_eq!(engine.total_time(), 300);
    }

    #[test]
    fn test_settings_change_applies_when_not_running() {
        let h = Harness::new();
        let mut engine = h.engine();
        engine.set_work_minutes(50);
        assert_eq!(engine.time_left(), 3000);
        assert_eq!(engine.total_time(), 3000);

        // Break duration does not touch the work countdown
        engine.set_break_minutes(45);
        assert_eq!(engine.settings().break_minutes, 30);
        assert_eq!(engine.time_left(), 3000);

        let stored = h.doc.load::<PomodoroConfig>();
        assert_eq!(stored.work_minutes, 50);
        assert_eq!(stored.break_minutes, 30);
    }

    #[test]
    fn test_settings_change_deferred_while_running() {
        let h = Harness::new();
        let mut engine = h.engine();
        engine.start();
        h.clock.advance(Duration::seconds(10));
        engine.set_work_minutes(10);

        assert_eq!(engine.total_time(), 1500);
        assert_eq!(engine.tick(), TickOutcome::Running { time_left: 1490 });

        engine.reset();
        assert_eq!(engine.time_left(), 600);
    }

    #[test]
    fn test_progress_percentage() {
        let h = Harness::new();
        let mut engine = h.engine();
        engine.set_work_minutes(10);
        engine.start();
        h.clock.advance(Duration::seconds(150));
        engine.tick();
        assert_eq!(engine.progress_percentage(), 25.0);
        assert_eq!(engine.formatted_time(), "07:30");
    }

    #[test]
    fn test_day_key() {
        let clock = ManualClock::at(2024, 1, 9, 23, 59);
        assert_eq!(day_key(clock.now()), "2024-01-09");
    }
}
