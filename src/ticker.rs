use chrono::{DateTime, Local, TimeZone};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

/// Default tick interval in milliseconds
pub const DEFAULT_TICK_MS: u64 = 250;

/// How often the time-of-day theme is re-evaluated
pub const THEME_CHECK_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Get tick duration
pub fn tick_duration() -> Duration {
    Duration::from_millis(DEFAULT_TICK_MS)
}

/// Source of wall-clock time
pub trait Clock {
    fn now(&self) -> DateTime<Local>;

    fn now_millis(&self) -> i64 {
        self.now().timestamp_millis()
    }
}

/// The operating system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Clock that only moves when told to; clones share the same time
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<DateTime<Local>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Local>) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    /// Clock set to a local date and time; panics on nonexistent local times
    pub fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> Self {
        let start = Local
            .with_ymd_and_hms(year, month, day, hour, minute, 0)
            .earliest()
            .unwrap_or_else(|| panic!("invalid local time {year}-{month}-{day} {hour}:{minute}"));
        Self::new(start)
    }

    pub fn advance(&self, by: chrono::Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        self.now.get()
    }
}

/// Cancellation token for a periodic callback
///
/// The host keeps delivering ticks while the handle is active. Cancelling is
/// idempotent and dropping the handle cancels it, so a destroyed owner never
/// keeps receiving ticks.
#[derive(Debug)]
pub struct TickHandle {
    active: Rc<Cell<bool>>,
    interval: Duration,
}

impl TickHandle {
    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn cancel(&self) {
        self.active.set(false);
    }
}

impl Drop for TickHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Read-only view of a handle's state, kept by schedulers
#[derive(Debug, Clone)]
pub struct TickStatus {
    active: Rc<Cell<bool>>,
    interval: Duration,
}

impl TickStatus {
    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

fn new_tick(interval: Duration) -> (TickHandle, TickStatus) {
    let active = Rc::new(Cell::new(true));
    let status = TickStatus {
        active: Rc::clone(&active),
        interval,
    };
    (TickHandle { active, interval }, status)
}

/// Capability to register a periodic callback
pub trait Scheduler {
    fn every(&self, interval: Duration) -> TickHandle;
}

/// Scheduler for a host loop that sleeps `interval` between ticks itself
#[derive(Debug, Clone, Copy, Default)]
pub struct LoopScheduler;

impl Scheduler for LoopScheduler {
    fn every(&self, interval: Duration) -> TickHandle {
        new_tick(interval).0
    }
}

/// Scheduler that remembers every handle it issued
#[derive(Debug, Default)]
pub struct ManualScheduler {
    issued: RefCell<Vec<TickStatus>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of handles still active
    pub fn active_count(&self) -> usize {
        self.issued.borrow().iter().filter(|t| t.is_active()).count()
    }

    pub fn issued(&self) -> Vec<TickStatus> {
        self.issued.borrow().clone()
    }
}

impl Scheduler for ManualScheduler {
    fn every(&self, interval: Duration) -> TickHandle {
        let (handle, status) = new_tick(interval);
        self.issued.borrow_mut().push(status);
        handle
    }
}
