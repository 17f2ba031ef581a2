//! Core types for pagesync.
//!
//! Element handles, vertical geometry and the state classes written to the
//! page. Everything else builds on these.

// =============================================================================
// ElementId
// =============================================================================

/// Opaque handle to an element owned by a [`Document`](crate::dom::Document).
///
/// Handles are only meaningful for the document that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(usize);

impl ElementId {
    /// Create a handle from a document-specific index.
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// The document-specific index behind this handle.
    pub const fn index(self) -> usize {
        self.0
    }
}

// =============================================================================
// Rect - vertical geometry
// =============================================================================

/// Vertical geometry of an element, in CSS pixels from the document top.
///
/// Only the vertical axis matters for scroll synchronization.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub top: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }

    /// Bottom edge (exclusive).
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Half-open containment: `[top, top + height)`.
    pub fn contains_y(&self, y: f64) -> bool {
        y >= self.top && y < self.bottom()
    }
}

// =============================================================================
// ScrollBehavior
// =============================================================================

/// How a programmatic scroll should move the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollBehavior {
    /// Jump straight to the target.
    #[default]
    Instant,
    /// Animate to the target. Fire-and-forget: nothing waits for it.
    Smooth,
}

// =============================================================================
// State classes (bitflags)
// =============================================================================

bitflags::bitflags! {
    /// State classes this crate toggles on page elements.
    ///
    /// Combine with bitwise OR: `Classes::ACTIVE | Classes::OPEN`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Classes: u8 {
        const NONE = 0;
        /// Active nav link, open menu toggle/panel.
        const ACTIVE = 1 << 0;
        /// Revealed animatable element.
        const VISIBLE = 1 << 1;
        /// Header past the scroll threshold.
        const SCROLLED = 1 << 2;
        /// Expanded disclosure panel.
        const OPEN = 1 << 3;
    }
}

impl Classes {
    const NAMES: [(Classes, &'static str); 4] = [
        (Classes::ACTIVE, "active"),
        (Classes::VISIBLE, "visible"),
        (Classes::SCROLLED, "scrolled"),
        (Classes::OPEN, "open"),
    ];

    /// CSS class names for every flag set in `self`, in flag order.
    pub fn class_names(self) -> Vec<&'static str> {
        Self::NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect()
    }

    /// All known flags paired with their class names.
    pub fn known() -> &'static [(Classes, &'static str)] {
        &Self::NAMES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_half_open() {
        let rect = Rect::new(100.0, 50.0);
        assert!(rect.contains_y(100.0));
        assert!(rect.contains_y(149.9));
        assert!(!rect.contains_y(150.0));
        assert!(!rect.contains_y(99.9));
        assert_eq!(rect.bottom(), 150.0);
    }

    #[test]
    fn test_class_names() {
        assert!(Classes::NONE.class_names().is_empty());
        assert_eq!(Classes::ACTIVE.class_names(), vec!["active"]);
        assert_eq!(
            (Classes::OPEN | Classes::ACTIVE).class_names(),
            vec!["active", "open"]
        );
    }
}
