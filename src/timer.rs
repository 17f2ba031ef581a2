//! Timer Module - one-shot timeouts behind a trait
//!
//! Components never sleep. They ask a [`Scheduler`] to run a callback later
//! and keep the returned [`TimerId`] to cancel it.
//!
//! # API
//!
//! - [`Scheduler`] - `set_timeout` / `clear_timeout`
//! - [`ManualScheduler`] - virtual clock advanced explicitly (tests, headless)
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use pagesync::timer::{ManualScheduler, Scheduler};
//!
//! let scheduler = ManualScheduler::new();
//! scheduler.set_timeout(Duration::from_millis(10), Box::new(|| println!("fired")));
//! scheduler.advance(Duration::from_millis(10)); // prints "fired"
//! ```

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::time::Duration;

/// Handle to a scheduled timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Callback run once when a timeout elapses.
pub type TimerCallback = Box<dyn FnOnce()>;

/// Source of one-shot timeouts on the UI timeline.
pub trait Scheduler {
    /// Run `callback` once after `delay`.
    fn set_timeout(&self, delay: Duration, callback: TimerCallback) -> TimerId;

    /// Cancel a pending timeout. Unknown or already-fired ids are ignored.
    fn clear_timeout(&self, id: TimerId);
}

// =============================================================================
// MANUAL SCHEDULER
// =============================================================================

/// Deterministic scheduler driven by [`advance`](Self::advance).
///
/// Timers due at the same instant fire in the order they were scheduled.
/// Callbacks may schedule or clear timers; new timers that fall due within
/// the same `advance` window fire in that call too.
#[derive(Default)]
pub struct ManualScheduler {
    now: Cell<Duration>,
    next_id: Cell<u64>,
    queue: RefCell<BTreeMap<(Duration, TimerId), TimerCallback>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time elapsed since creation.
    pub fn now(&self) -> Duration {
        self.now.get()
    }

    /// Number of timers waiting to fire.
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Move the clock forward by `by`, firing every timer that falls due.
    ///
    /// Returns how many callbacks ran.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now.get() + by;
        let mut fired = 0;

        loop {
            // Borrow released before the callback runs: it may reschedule.
            let next = {
                let mut queue = self.queue.borrow_mut();
                match queue.first_key_value() {
                    Some((&(deadline, _), _)) if deadline <= target => queue.pop_first(),
                    _ => None,
                }
            };
            let Some(((deadline, _), callback)) = next else {
                break;
            };
            self.now.set(deadline.max(self.now.get()));
            callback();
            fired += 1;
        }

        self.now.set(target);
        fired
    }

    /// Fire timers until none remain, jumping the clock as needed.
    ///
    /// Stops after `limit` callbacks so a self-rescheduling timer cannot spin
    /// forever. Returns how many callbacks ran.
    pub fn run_until_idle(&self, limit: usize) -> usize {
        let mut fired = 0;
        while fired < limit {
            let deadline = match self.queue.borrow().first_key_value() {
                Some((&(deadline, _), _)) => deadline,
                None => break,
            };
            let wait = deadline.saturating_sub(self.now.get());
            fired += self.advance(wait);
        }
        fired
    }
}

impl Scheduler for ManualScheduler {
    fn set_timeout(&self, delay: Duration, callback: TimerCallback) -> TimerId {
        let id = TimerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.queue
            .borrow_mut()
            .insert((self.now.get() + delay, id), callback);
        id
    }

    fn clear_timeout(&self, id: TimerId) {
        self.queue.borrow_mut().retain(|&(_, queued), _| queued != id);
    }
}
