//! # pagesync
//!
//! Scroll-synchronized navigation for single-page sites.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals) for
//! observable component state.
//!
//! ## Architecture
//!
//! Components are explicit instances, each owning its slice of state and
//! reaching the page only through the [`Document`] trait and time only
//! through the [`Scheduler`] trait:
//!
//! ```text
//! host events → MountHandle::dispatch → EventBus → components → Document writes
//! ```
//!
//! Two hosts implement those traits:
//!
//! - [`MemoryDocument`] + [`ManualScheduler`] - in-memory page with Taffy
//!   block layout and a virtual clock (tests, headless drivers)
//! - `web` feature - a real browser document via `web-sys` and `gloo`
//!
//! ## Modules
//!
//! - [`types`] - Element handles, rects, state classes
//! - [`config`] - Tunables and selectors (serde)
//! - [`dom`] - The `Document` contract and the memory document
//! - [`timer`] - The `Scheduler` contract and the manual scheduler
//! - [`state`] - The components
//! - [`pipeline`] - Events, subscriptions, `mount`

pub mod config;
pub mod dom;
pub mod error;
pub mod pipeline;
pub mod state;
pub mod timer;
pub mod types;

#[cfg(feature = "web")]
pub mod web;

// Re-export commonly used items
pub use types::*;

pub use config::{
    Config, HeaderStyle, RevealConfig, RevealStrategy, ScrollConfig, Selectors, TypingConfig,
};

pub use dom::{Document, ElementSpec, MemoryDocument, ScrollCall};

pub use error::{Error, Result};

pub use pipeline::{
    mount, DispatchOutcome, EventBus, EventContext, MountHandle, PageEvent, Subscription,
    SubscriptionId, Topic,
};

pub use state::{
    // Debounce
    debounce, Debounced,
    // Scroll
    current_section, header_state, HeaderState, ScrollState, ScrollTick, ScrollTracker, Section,
    // Navigation
    fragment_target, NavLink, NavSync, NavigateOutcome, SmoothScrollNavigator,
    // Reveal
    intersection_ratio, IntersectionEntry, RevealObserver, RevealTarget,
    // Menu, touch, extras
    should_suppress, Disclosure, MobileMenu, TouchGuard, Typewriter,
};

pub use timer::{ManualScheduler, Scheduler, TimerId};
