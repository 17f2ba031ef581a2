//! Events Module - page events and the named subscription table
//!
//! Host events are translated into [`PageEvent`]s and dispatched through an
//! [`EventBus`]. Every subscription carries a name, so the wiring done at
//! mount time can be listed and inspected.
//!
//! # API
//!
//! - `subscribe(name, topic, handler)` - register, returns the subscription id
//! - `unsubscribe(id)` - remove one subscription
//! - `dispatch(event)` - run every handler for the event's topic, in
//!   registration order
//!
//! # Example
//!
//! ```ignore
//! use pagesync::pipeline::{EventBus, PageEvent, Topic};
//!
//! let bus = EventBus::new();
//! bus.subscribe("log.scroll", Topic::Scroll, |_ctx| {
//!     log::trace!("scrolled");
//!     Ok(())
//! });
//! let outcome = bus.dispatch(PageEvent::Scroll);
//! assert_eq!(outcome.handled, 1);
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use log::error;

use crate::error::Result;
use crate::state::IntersectionEntry;
use crate::types::ElementId;

// =============================================================================
// TYPES
// =============================================================================

/// An event delivered by the host.
#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    Scroll,
    Resize,
    /// Click anywhere; `target` is the innermost element hit.
    Click { target: ElementId },
    TouchStart { client_y: f64 },
    TouchMove { client_y: f64 },
    TouchEnd,
    /// A batch of visibility notifications.
    Intersections(Vec<IntersectionEntry>),
}

impl PageEvent {
    pub fn topic(&self) -> Topic {
        match self {
            Self::Scroll => Topic::Scroll,
            Self::Resize => Topic::Resize,
            Self::Click { .. } => Topic::Click,
            Self::TouchStart { .. } => Topic::TouchStart,
            Self::TouchMove { .. } => Topic::TouchMove,
            Self::TouchEnd => Topic::TouchEnd,
            Self::Intersections(_) => Topic::Intersections,
        }
    }
}

/// Event kind a subscription listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Scroll,
    Resize,
    Click,
    TouchStart,
    TouchMove,
    TouchEnd,
    Intersections,
}

/// What a handler sees while an event is dispatched.
#[derive(Debug)]
pub struct EventContext<'a> {
    pub event: &'a PageEvent,
    default_prevented: bool,
}

impl EventContext<'_> {
    /// Suppress the host's native handling of this event.
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// Handler for one subscription.
pub type EventHandler = Rc<dyn Fn(&mut EventContext<'_>) -> Result<()>>;

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(usize);

/// A registered subscription, without its handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub name: &'static str,
    pub topic: Topic,
}

/// Result of dispatching one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchOutcome {
    pub default_prevented: bool,
    /// Handlers that ran and succeeded.
    pub handled: usize,
    /// Handlers that returned an error (logged, not propagated).
    pub failed: usize,
}

// =============================================================================
// EVENT BUS
// =============================================================================

struct Entry {
    subscription: Subscription,
    handler: EventHandler,
}

#[derive(Default)]
struct Registry {
    entries: Vec<Entry>,
    next_id: usize,
}

/// Named subscription table.
#[derive(Default)]
pub struct EventBus {
    registry: RefCell<Registry>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `topic` under `name`.
    pub fn subscribe<F>(&self, name: &'static str, topic: Topic, handler: F) -> SubscriptionId
    where
        F: Fn(&mut EventContext<'_>) -> Result<()> + 'static,
    {
        let mut registry = self.registry.borrow_mut();
        let id = SubscriptionId(registry.next_id);
        registry.next_id += 1;
        registry.entries.push(Entry {
            subscription: Subscription { id, name, topic },
            handler: Rc::new(handler),
        });
        id
    }

    /// Remove a subscription. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut registry = self.registry.borrow_mut();
        let before = registry.entries.len();
        registry.entries.retain(|entry| entry.subscription.id != id);
        registry.entries.len() != before
    }

    /// Every subscription in registration order.
    pub fn subscriptions(&self) -> Vec<Subscription> {
        self.registry
            .borrow()
            .entries
            .iter()
            .map(|entry| entry.subscription.clone())
            .collect()
    }

    /// Remove every subscription.
    pub fn clear(&self) {
        self.registry.borrow_mut().entries.clear();
    }

    /// Run the handlers subscribed to the event's topic, in registration order.
    ///
    /// A failing handler is logged and does not stop the others.
    pub fn dispatch(&self, event: PageEvent) -> DispatchOutcome {
        let topic = event.topic();
        // Snapshot: handlers may subscribe or unsubscribe while running.
        let handlers: Vec<(&'static str, EventHandler)> = self
            .registry
            .borrow()
            .entries
            .iter()
            .filter(|entry| entry.subscription.topic == topic)
            .map(|entry| (entry.subscription.name, entry.handler.clone()))
            .collect();

        let mut ctx = EventContext {
            event: &event,
            default_prevented: false,
        };
        let mut outcome = DispatchOutcome::default();
        for (name, handler) in handlers {
            match handler(&mut ctx) {
                Ok(()) => outcome.handled += 1,
                Err(err) => {
                    error!("handler `{name}` failed on {topic:?}: {err}");
                    outcome.failed += 1;
                }
            }
        }
        outcome.default_prevented = ctx.default_prevented;
        outcome
    }
}
