//! MemoryDocument - an in-memory page with real block layout
//!
//! Drives every component without a browser: build the page with
//! [`ElementSpec`], scroll it with [`MemoryDocument::set_scroll_y`], and
//! inspect classes, inline styles and programmatic scrolls afterwards.
//!
//! # Example
//!
//! ```ignore
//! use pagesync::dom::{ElementSpec, MemoryDocument};
//!
//! let doc = MemoryDocument::new(1280.0, 800.0);
//! let body = doc.body();
//! let about = doc.append(body, ElementSpec::new("section").id("about").height(600.0))?;
//! doc.set_scroll_y(250.0);
//! assert_eq!(doc.rect(about).top, 0.0);
//! ```

use std::cell::RefCell;
use std::collections::BTreeMap;

use log::error;

use super::layout::{compute_page_layout, Block, PageLayout};
use super::selector::{SelectorList, SelectorTarget};
use super::Document;
use crate::error::{Error, Result};
use crate::types::{ElementId, Rect, ScrollBehavior};

// =============================================================================
// ELEMENT SPEC (builder)
// =============================================================================

/// Description of an element to append.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementSpec {
    tag: String,
    attributes: BTreeMap<String, String>,
    classes: Vec<String>,
    text: String,
    block: Block,
}

impl ElementSpec {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            ..Self::default()
        }
    }

    pub fn id(self, id: impl Into<String>) -> Self {
        self.attr("id", id)
    }

    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    /// Shorthand for an anchor's `href`.
    pub fn href(self, href: impl Into<String>) -> Self {
        self.attr("href", href)
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn height(mut self, height: f64) -> Self {
        self.block.height = Some(height);
        self
    }

    pub fn margin_top(mut self, margin: f64) -> Self {
        self.block.margin_top = margin;
        self
    }

    pub fn margin_bottom(mut self, margin: f64) -> Self {
        self.block.margin_bottom = margin;
        self
    }

    /// Take the element out of flow and pin it to the viewport top.
    pub fn fixed(mut self) -> Self {
        self.block.fixed = true;
        self
    }
}

// =============================================================================
// SCROLL LOG
// =============================================================================

/// A programmatic scroll requested through [`Document::scroll_to`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollCall {
    /// Requested top, before clamping.
    pub top: f64,
    pub behavior: ScrollBehavior,
}

// =============================================================================
// TREE
// =============================================================================

#[derive(Debug, Clone)]
struct Node {
    tag: String,
    attributes: BTreeMap<String, String>,
    classes: Vec<String>,
    styles: BTreeMap<String, String>,
    text: String,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    block: Block,
}

#[derive(Debug)]
struct Tree {
    nodes: Vec<Node>,
    viewport_width: f64,
    viewport_height: f64,
    scroll_y: f64,
    scroll_log: Vec<ScrollCall>,
    /// `None` after any change that can move elements.
    layout: Option<PageLayout>,
}

const BODY: ElementId = ElementId::new(0);

impl Tree {
    fn node(&self, element: ElementId) -> Option<&Node> {
        self.nodes.get(element.index())
    }

    fn node_mut(&mut self, element: ElementId) -> Option<&mut Node> {
        self.nodes.get_mut(element.index())
    }

    fn layout(&mut self) -> Result<&PageLayout> {
        if self.layout.is_none() {
            let blocks: Vec<Block> = self.nodes.iter().map(|n| n.block).collect();
            let children: Vec<Vec<ElementId>> =
                self.nodes.iter().map(|n| n.children.clone()).collect();
            let computed = compute_page_layout(
                BODY,
                &blocks,
                &children,
                self.viewport_width,
                self.viewport_height,
            )?;
            self.layout = Some(computed);
        }
        self.layout
            .as_ref()
            .ok_or_else(|| Error::Layout("layout unavailable".to_string()))
    }

    fn max_scroll(&mut self) -> f64 {
        let viewport = self.viewport_height;
        match self.layout() {
            Ok(layout) => (layout.document_height - viewport).max(0.0),
            Err(err) => {
                error!("memory document layout failed: {err}");
                0.0
            }
        }
    }

    fn ids_in_order(&self) -> Vec<ElementId> {
        // Pre-order walk from the body: document order.
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![BODY];
        while let Some(element) = stack.pop() {
            order.push(element);
            if let Some(node) = self.node(element) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        order
    }
}

impl SelectorTarget for Tree {
    fn tag_name(&self, element: ElementId) -> Option<&str> {
        self.node(element).map(|n| n.tag.as_str())
    }

    fn attribute_value(&self, element: ElementId, name: &str) -> Option<&str> {
        let node = self.node(element)?;
        if name == "class" {
            return None;
        }
        node.attributes.get(name).map(String::as_str)
    }

    fn has_class_name(&self, element: ElementId, class: &str) -> bool {
        self.node(element)
            .is_some_and(|n| n.classes.iter().any(|c| c == class))
    }

    fn parent_of(&self, element: ElementId) -> Option<ElementId> {
        self.node(element)?.parent
    }
}

// =============================================================================
// MEMORY DOCUMENT
// =============================================================================

/// In-memory [`Document`] with Taffy block layout.
#[derive(Debug)]
pub struct MemoryDocument {
    inner: RefCell<Tree>,
}

impl MemoryDocument {
    /// Empty page (just a `<body>`) with the given viewport size.
    pub fn new(viewport_width: f64, viewport_height: f64) -> Self {
        let body = Node {
            tag: "body".to_string(),
            attributes: BTreeMap::new(),
            classes: Vec::new(),
            styles: BTreeMap::new(),
            text: String::new(),
            parent: None,
            children: Vec::new(),
            block: Block::default(),
        };
        Self {
            inner: RefCell::new(Tree {
                nodes: vec![body],
                viewport_width,
                viewport_height,
                scroll_y: 0.0,
                scroll_log: Vec::new(),
                layout: None,
            }),
        }
    }

    pub fn body(&self) -> ElementId {
        BODY
    }

    /// Append a new element as the last child of `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownElement`] if `parent` is not in this document.
    pub fn append(&self, parent: ElementId, spec: ElementSpec) -> Result<ElementId> {
        let mut tree = self.inner.borrow_mut();
        if tree.node(parent).is_none() {
            return Err(Error::UnknownElement(parent));
        }

        let element = ElementId::new(tree.nodes.len());
        tree.nodes.push(Node {
            tag: spec.tag,
            attributes: spec.attributes,
            classes: spec.classes,
            styles: BTreeMap::new(),
            text: spec.text,
            parent: Some(parent),
            children: Vec::new(),
            block: spec.block,
        });
        if let Some(node) = tree.node_mut(parent) {
            node.children.push(element);
        }
        tree.layout = None;
        Ok(element)
    }

    /// Change an element's explicit height (simulates content reflow).
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownElement`] for foreign handles.
    pub fn set_height(&self, element: ElementId, height: Option<f64>) -> Result<()> {
        let mut tree = self.inner.borrow_mut();
        let node = tree
            .node_mut(element)
            .ok_or(Error::UnknownElement(element))?;
        node.block.height = height;
        tree.layout = None;
        Ok(())
    }

    pub fn set_viewport(&self, width: f64, height: f64) {
        let mut tree = self.inner.borrow_mut();
        tree.viewport_width = width;
        tree.viewport_height = height;
        tree.layout = None;
    }

    /// Scroll like a user would: clamped to the scrollable range, not logged.
    pub fn set_scroll_y(&self, scroll_y: f64) {
        let mut tree = self.inner.borrow_mut();
        let max = tree.max_scroll();
        tree.scroll_y = scroll_y.clamp(0.0, max);
    }

    /// Live geometry, reporting layout failures instead of hiding them.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownElement`] for foreign handles and
    /// [`Error::Layout`] if layout could not be computed.
    pub fn try_rect(&self, element: ElementId) -> Result<Rect> {
        let mut tree = self.inner.borrow_mut();
        tree.layout()?
            .rect(element)
            .ok_or(Error::UnknownElement(element))
    }

    /// Inline style value previously written with [`Document::set_style`].
    pub fn style(&self, element: ElementId, property: &str) -> Option<String> {
        self.inner
            .borrow()
            .node(element)?
            .styles
            .get(property)
            .cloned()
    }

    /// Every programmatic scroll so far, oldest first.
    pub fn scroll_log(&self) -> Vec<ScrollCall> {
        self.inner.borrow().scroll_log.clone()
    }

    pub fn last_scroll(&self) -> Option<ScrollCall> {
        self.inner.borrow().scroll_log.last().copied()
    }
}

impl Document for MemoryDocument {
    fn query_all(&self, selector: &str) -> Vec<ElementId> {
        let list = match SelectorList::parse(selector) {
            Ok(list) => list,
            Err(err) => {
                error!("{err}");
                return Vec::new();
            }
        };
        let tree = self.inner.borrow();
        tree.ids_in_order()
            .into_iter()
            .filter(|&element| element != BODY && list.matches(&*tree, element))
            .collect()
    }

    fn element_by_id(&self, id: &str) -> Option<ElementId> {
        let tree = self.inner.borrow();
        tree.ids_in_order()
            .into_iter()
            .find(|&element| tree.attribute_value(element, "id") == Some(id))
    }

    fn contains(&self, ancestor: ElementId, node: ElementId) -> bool {
        let tree = self.inner.borrow();
        let mut cursor = tree.node(node).map(|_| node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = tree.parent_of(current);
        }
        false
    }

    fn attribute(&self, element: ElementId, name: &str) -> Option<String> {
        let tree = self.inner.borrow();
        let node = tree.node(element)?;
        if name == "class" {
            return Some(node.classes.join(" "));
        }
        node.attributes.get(name).cloned()
    }

    fn set_attribute(&self, element: ElementId, name: &str, value: &str) {
        if let Some(node) = self.inner.borrow_mut().node_mut(element) {
            node.attributes
                .insert(name.to_ascii_lowercase(), value.to_string());
        }
    }

    fn has_class(&self, element: ElementId, class: &str) -> bool {
        self.inner.borrow().has_class_name(element, class)
    }

    fn add_class(&self, element: ElementId, class: &str) {
        if let Some(node) = self.inner.borrow_mut().node_mut(element) {
            if !node.classes.iter().any(|c| c == class) {
                node.classes.push(class.to_string());
            }
        }
    }

    fn remove_class(&self, element: ElementId, class: &str) {
        if let Some(node) = self.inner.borrow_mut().node_mut(element) {
            node.classes.retain(|c| c != class);
        }
    }

    fn set_style(&self, element: ElementId, property: &str, value: &str) {
        if let Some(node) = self.inner.borrow_mut().node_mut(element) {
            node.styles.insert(property.to_string(), value.to_string());
        }
    }

    fn text(&self, element: ElementId) -> String {
        self.inner
            .borrow()
            .node(element)
            .map(|n| n.text.clone())
            .unwrap_or_default()
    }

    fn set_text(&self, element: ElementId, text: &str) {
        if let Some(node) = self.inner.borrow_mut().node_mut(element) {
            node.text = text.to_string();
        }
    }

    fn rect(&self, element: ElementId) -> Rect {
        match self.try_rect(element) {
            Ok(rect) => rect,
            Err(err) => {
                error!("rect unavailable for {element:?}: {err}");
                Rect::default()
            }
        }
    }

    fn scroll_y(&self) -> f64 {
        self.inner.borrow().scroll_y
    }

    fn viewport_height(&self) -> f64 {
        self.inner.borrow().viewport_height
    }

    fn document_height(&self) -> f64 {
        let mut tree = self.inner.borrow_mut();
        let viewport = tree.viewport_height;
        match tree.layout() {
            Ok(layout) => layout.document_height,
            Err(err) => {
                error!("memory document layout failed: {err}");
                viewport
            }
        }
    }

    /// Smooth scrolls land immediately; the request is logged either way.
    fn scroll_to(&self, top: f64, behavior: ScrollBehavior) {
        let mut tree = self.inner.borrow_mut();
        tree.scroll_log.push(ScrollCall { top, behavior });
        let max = tree.max_scroll();
        tree.scroll_y = top.clamp(0.0, max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> (MemoryDocument, ElementId, ElementId, ElementId) {
        let doc = MemoryDocument::new(1280.0, 800.0);
        let body = doc.body();
        let nav = doc
            .append(body, ElementSpec::new("nav").class("navbar").height(70.0).fixed())
            .unwrap();
        let home = doc
            .append(body, ElementSpec::new("section").id("home").height(900.0))
            .unwrap();
        let about = doc
            .append(body, ElementSpec::new("section").id("about").height(700.0))
            .unwrap();
        (doc, nav, home, about)
    }

    #[test]
    fn test_query_in_document_order() {
        let (doc, nav, home, about) = page();
        assert_eq!(doc.query_all("section[id]"), vec![home, about]);
        assert_eq!(doc.query(".navbar"), Some(nav));
        assert_eq!(doc.element_by_id("about"), Some(about));
        assert_eq!(doc.element_by_id("missing"), None);
        assert!(doc.query_all("a:hover").is_empty());
    }

    #[test]
    fn test_live_rects_follow_reflow() {
        let (doc, _nav, home, about) = page();
        assert_eq!(doc.rect(about), Rect::new(900.0, 700.0));

        doc.set_height(home, Some(1000.0)).unwrap();
        assert_eq!(doc.rect(about), Rect::new(1000.0, 700.0));
        assert_eq!(doc.document_height(), 1700.0);
    }

    #[test]
    fn test_scroll_clamped_to_range() {
        let (doc, ..) = page();
        doc.set_scroll_y(-20.0);
        assert_eq!(doc.scroll_y(), 0.0);

        // 1600 content - 800 viewport
        doc.set_scroll_y(5000.0);
        assert_eq!(doc.scroll_y(), 800.0);

        doc.scroll_to(300.0, ScrollBehavior::Smooth);
        assert_eq!(doc.scroll_y(), 300.0);
        assert_eq!(
            doc.last_scroll(),
            Some(ScrollCall { top: 300.0, behavior: ScrollBehavior::Smooth })
        );
    }

    #[test]
    fn test_classes_styles_and_containment() {
        let (doc, nav, home, _about) = page();
        let link = doc
            .append(nav, ElementSpec::new("a").class("nav-link").href("#home"))
            .unwrap();

        doc.add_class(link, "active");
        doc.add_class(link, "active");
        assert_eq!(doc.attribute(link, "class").as_deref(), Some("nav-link active"));
        doc.remove_class(link, "active");
        assert!(!doc.has_class(link, "active"));

        doc.set_style(home, "opacity", "0");
        assert_eq!(doc.style(home, "opacity").as_deref(), Some("0"));

        assert!(doc.contains(nav, link));
        assert!(doc.contains(link, link));
        assert!(!doc.contains(home, link));
    }

    #[test]
    fn test_append_to_unknown_parent() {
        let doc = MemoryDocument::new(800.0, 600.0);
        let err = doc
            .append(ElementId::new(42), ElementSpec::new("div"))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownElement(_)));
    }
}
