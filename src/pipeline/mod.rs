//! Event Pipeline
//!
//! Connects host events to the components.
//!
//! ```text
//! host event → PageEvent → EventBus (named subscriptions) → component method
//!                                   └─ scroll/resize → Debounced tick → ScrollTracker → NavSync
//! ```
//!
//! - **events** - `PageEvent`, `Topic`, `EventBus`
//! - **mount** - one-time construction and wiring, `MountHandle`

pub mod events;
pub mod mount;

pub use events::{
    DispatchOutcome, EventBus, EventContext, EventHandler, PageEvent, Subscription,
    SubscriptionId, Topic,
};
pub use mount::{mount, MountHandle};
