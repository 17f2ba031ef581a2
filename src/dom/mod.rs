//! DOM Module - the page contract every component talks through
//!
//! Components never touch a concrete page. They hold an `Rc<dyn Document>`
//! and read layout, toggle classes and write inline styles through it.
//!
//! - [`Document`] - lookup, attributes, classes, styles, geometry, scrolling
//! - [`MemoryDocument`] - in-memory page with real block layout (tests, headless)
//! - [`SelectorList`] - the selector subset understood by `MemoryDocument`
//!
//! All methods take `&self`: the page is one shared mutable structure,
//! written without synchronization on a single event timeline.

mod layout;
mod memory;
mod selector;

pub use layout::{compute_page_layout, Block, PageLayout};
pub use memory::{ElementSpec, MemoryDocument, ScrollCall};
pub use selector::{SelectorList, SelectorTarget};

use crate::types::{Classes, ElementId, Rect, ScrollBehavior};

/// The page as seen by pagesync.
///
/// Lookups that find nothing return `None`/empty; writes to handles the
/// document does not know are ignored.
pub trait Document {
    // -------------------------------------------------------------------------
    // Lookup
    // -------------------------------------------------------------------------

    /// Every element matching `selector`, in document order.
    fn query_all(&self, selector: &str) -> Vec<ElementId>;

    /// Element with the given `id` attribute.
    fn element_by_id(&self, id: &str) -> Option<ElementId>;

    /// First element matching `selector`.
    fn query(&self, selector: &str) -> Option<ElementId> {
        self.query_all(selector).into_iter().next()
    }

    /// True if `node` is `ancestor` or one of its descendants.
    fn contains(&self, ancestor: ElementId, node: ElementId) -> bool;

    // -------------------------------------------------------------------------
    // Attributes, classes, styles, text
    // -------------------------------------------------------------------------

    fn attribute(&self, element: ElementId, name: &str) -> Option<String>;
    fn set_attribute(&self, element: ElementId, name: &str, value: &str);

    fn has_class(&self, element: ElementId, class: &str) -> bool;
    fn add_class(&self, element: ElementId, class: &str);
    fn remove_class(&self, element: ElementId, class: &str);

    /// Write one inline style property (kebab-case name).
    fn set_style(&self, element: ElementId, property: &str, value: &str);

    fn text(&self, element: ElementId) -> String;
    fn set_text(&self, element: ElementId, text: &str);

    /// Add or remove every state class in `classes`.
    fn set_classes(&self, element: ElementId, classes: Classes, enabled: bool) {
        for name in classes.class_names() {
            if enabled {
                self.add_class(element, name);
            } else {
                self.remove_class(element, name);
            }
        }
    }

    /// State classes currently present on `element`.
    fn classes(&self, element: ElementId) -> Classes {
        Classes::known()
            .iter()
            .filter(|(_, name)| self.has_class(element, name))
            .fold(Classes::NONE, |acc, (flag, _)| acc | *flag)
    }

    // -------------------------------------------------------------------------
    // Geometry & scrolling
    // -------------------------------------------------------------------------

    /// Live geometry of `element`, read from current layout (never cached by callers).
    fn rect(&self, element: ElementId) -> Rect;

    fn scroll_y(&self) -> f64;
    fn viewport_height(&self) -> f64;
    fn document_height(&self) -> f64;

    /// Move the viewport so its top sits at `top`.
    fn scroll_to(&self, top: f64, behavior: ScrollBehavior);
}
