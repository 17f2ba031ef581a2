//! State Module - the page's interactive components
//!
//! Each component owns its own state slice and reaches the page only
//! through a [`Document`](crate::dom::Document):
//!
//! - **Debounce** - trailing-edge call collapsing
//! - **Scroll** - current section and header state
//! - **Nav** - exclusive nav link activation
//! - **Navigate** - smooth scrolling for in-page anchors
//! - **Reveal** - one-shot entrance animations
//! - **Menu** - collapsible mobile navigation
//! - **Touch** - overscroll guard
//! - **Disclosure** - resume show/hide
//! - **Typewriter** - hero subtitle typing

mod debounce;
mod disclosure;
mod menu;
mod nav;
mod navigate;
mod reveal;
mod scroll;
mod touch;
mod typewriter;

pub use debounce::*;
pub use disclosure::*;
pub use menu::*;
pub use nav::*;
pub use navigate::*;
pub use reveal::*;
pub use scroll::*;
pub use touch::*;
pub use typewriter::*;
