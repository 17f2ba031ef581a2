//! Debounce - collapse bursts of calls into one trailing invocation
//!
//! Every call restarts the timer; only the last call of a burst runs, with
//! that call's arguments, once the burst has been quiet for `wait`.
//!
//! # Example
//!
//! ```ignore
//! let tick = debounce(scheduler.clone(), Duration::from_millis(10), move |()| {
//!     tracker.on_scroll(&nav)?;
//!     Ok(())
//! });
//! tick.call(()); // per scroll event
//! ```

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::time::Duration;

use log::{error, trace};

use crate::error::Result;
use crate::timer::{Scheduler, TimerId};

struct Inner<A> {
    action: Box<dyn Fn(A) -> Result<()>>,
    wait: Duration,
    scheduler: Rc<dyn Scheduler>,
    timer: Cell<Option<TimerId>>,
    latest: RefCell<Option<A>>,
}

impl<A> Inner<A> {
    fn run_pending(&self) -> Result<()> {
        self.timer.set(None);
        // Take before running: the action may call back into the debouncer.
        let args = self.latest.borrow_mut().take();
        match args {
            Some(args) => (self.action)(args),
            None => Ok(()),
        }
    }
}

/// Trailing-edge debounced wrapper around an action.
///
/// Clones share the same pending call. Once the last clone is dropped a
/// pending timer fires into nothing.
pub struct Debounced<A> {
    inner: Rc<Inner<A>>,
}

impl<A> Clone for Debounced<A> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

/// Wrap `action` so calls within `wait` of each other collapse into one.
pub fn debounce<A, F>(scheduler: Rc<dyn Scheduler>, wait: Duration, action: F) -> Debounced<A>
where
    A: 'static,
    F: Fn(A) -> Result<()> + 'static,
{
    Debounced {
        inner: Rc::new(Inner {
            action: Box::new(action),
            wait,
            scheduler,
            timer: Cell::new(None),
            latest: RefCell::new(None),
        }),
    }
}

impl<A: 'static> Debounced<A> {
    /// Record a call. Supersedes any pending call and restarts the window.
    pub fn call(&self, args: A) {
        *self.inner.latest.borrow_mut() = Some(args);
        if let Some(previous) = self.inner.timer.take() {
            self.inner.scheduler.clear_timeout(previous);
        }

        let weak: Weak<Inner<A>> = Rc::downgrade(&self.inner);
        let id = self.inner.scheduler.set_timeout(
            self.inner.wait,
            Box::new(move || {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                if let Err(err) = inner.run_pending() {
                    error!("debounced action failed: {err}");
                }
            }),
        );
        trace!("debounce restarted ({:?})", self.inner.wait);
        self.inner.timer.set(Some(id));
    }

    /// Drop the pending call, if any.
    pub fn cancel(&self) {
        if let Some(id) = self.inner.timer.take() {
            self.inner.scheduler.clear_timeout(id);
        }
        self.inner.latest.borrow_mut().take();
    }

    /// Run the pending call now instead of waiting.
    ///
    /// # Errors
    ///
    /// Whatever the action returns.
    pub fn flush(&self) -> Result<()> {
        if let Some(id) = self.inner.timer.take() {
            self.inner.scheduler.clear_timeout(id);
        }
        self.inner.run_pending()
    }

    pub fn is_pending(&self) -> bool {
        self.inner.latest.borrow().is_some()
    }

    pub fn wait(&self) -> Duration {
        self.inner.wait
    }
}
