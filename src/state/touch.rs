//! Touch overscroll guard
//!
//! Dragging past either end of the page would rubber-band the whole
//! viewport on touch devices. The guard remembers where a touch started and
//! suppresses the move's default when it would push beyond the top or the
//! bottom.

use std::cell::Cell;
use std::rc::Rc;

use log::trace;

use crate::dom::Document;
use crate::state::scroll::ScrollState;

/// Whether a drag of `delta_y` (start minus current) overscrolls.
///
/// Negative deltas pull the page down (toward its top), positive push it up.
pub fn should_suppress(scroll: &ScrollState, delta_y: f64) -> bool {
    (scroll.at_top() && delta_y < 0.0) || (scroll.at_bottom() && delta_y > 0.0)
}

pub struct TouchGuard {
    document: Rc<dyn Document>,
    start_y: Cell<Option<f64>>,
}

impl TouchGuard {
    pub fn new(document: Rc<dyn Document>) -> Self {
        Self {
            document,
            start_y: Cell::new(None),
        }
    }

    pub fn on_touch_start(&self, client_y: f64) {
        self.start_y.set(Some(client_y));
    }

    /// Returns `true` if the move's default must be suppressed.
    ///
    /// A move without a preceding start is never suppressed.
    pub fn on_touch_move(&self, client_y: f64) -> bool {
        let Some(start_y) = self.start_y.get() else {
            return false;
        };
        let delta_y = start_y - client_y;
        let suppress = should_suppress(&ScrollState::read(self.document.as_ref()), delta_y);
        trace!("touch move delta {delta_y} suppress={suppress}");
        suppress
    }

    pub fn on_touch_end(&self) {
        self.start_y.set(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{ElementSpec, MemoryDocument};

    fn setup() -> (Rc<MemoryDocument>, TouchGuard) {
        let doc = Rc::new(MemoryDocument::new(400.0, 800.0));
        doc.append(doc.body(), ElementSpec::new("section").height(2000.0))
            .unwrap();
        let guard = TouchGuard::new(doc.clone());
        (doc, guard)
    }

    #[test]
    fn test_pull_down_at_top_suppressed() {
        let (_doc, guard) = setup();
        guard.on_touch_start(100.0);
        assert!(guard.on_touch_move(140.0));
        // Pushing up at the top scrolls normally.
        assert!(!guard.on_touch_move(60.0));
    }

    #[test]
    fn test_pull_down_mid_page_allowed() {
        let (doc, guard) = setup();
        doc.set_scroll_y(300.0);
        guard.on_touch_start(100.0);
        assert!(!guard.on_touch_move(140.0));
        assert!(!guard.on_touch_move(60.0));
    }

    #[test]
    fn test_push_up_at_bottom_suppressed() {
        let (doc, guard) = setup();
        doc.set_scroll_y(1200.0);
        guard.on_touch_start(300.0);
        assert!(guard.on_touch_move(250.0));
        assert!(!guard.on_touch_move(350.0));
    }

    #[test]
    fn test_move_without_start() {
        let (_doc, guard) = setup();
        assert!(!guard.on_touch_move(140.0));
        guard.on_touch_start(100.0);
        guard.on_touch_end();
        assert!(!guard.on_touch_move(140.0));
    }
}
