//! Mobile menu - collapsible navigation panel
//!
//! `closed` ⇄ `open`. The toggle flips it, choosing a link inside the panel
//! closes it, and so does any click outside both the toggle and the panel.

use std::rc::Rc;

use log::debug;
use spark_signals::{signal, Signal};

use crate::dom::Document;
use crate::types::{Classes, ElementId};

pub struct MobileMenu {
    document: Rc<dyn Document>,
    toggle: ElementId,
    panel: ElementId,
    /// Nav links that live inside the panel.
    links: Vec<ElementId>,
    open: Signal<bool>,
}

impl MobileMenu {
    /// Bind to the first toggle and panel found. `None` if either is missing.
    pub fn new(
        document: Rc<dyn Document>,
        toggle_selector: &str,
        panel_selector: &str,
        link_selector: &str,
    ) -> Option<Self> {
        let toggle = document.query(toggle_selector)?;
        let panel = document.query(panel_selector)?;
        let links = document
            .query_all(link_selector)
            .into_iter()
            .filter(|&link| document.contains(panel, link))
            .collect();

        let menu = Self {
            document,
            toggle,
            panel,
            links,
            open: signal(false),
        };
        menu.render();
        Some(menu)
    }

    pub fn is_open(&self) -> bool {
        self.open.get()
    }

    pub fn open_signal(&self) -> Signal<bool> {
        self.open.clone()
    }

    pub fn toggle_element(&self) -> ElementId {
        self.toggle
    }

    pub fn panel_element(&self) -> ElementId {
        self.panel
    }

    /// Flip open/closed. Returns the new state.
    pub fn toggle(&self) -> bool {
        self.set_open(!self.is_open());
        self.is_open()
    }

    pub fn close(&self) {
        if self.is_open() {
            self.set_open(false);
        }
    }

    /// Click on or inside the toggle flips the menu. Returns whether it did.
    pub fn on_toggle_click(&self, target: ElementId) -> bool {
        if !self.document.contains(self.toggle, target) {
            return false;
        }
        self.toggle();
        true
    }

    /// Click on an in-menu link closes the menu. Returns whether it did.
    pub fn on_link_selected(&self, target: ElementId) -> bool {
        let selected = self
            .links
            .iter()
            .any(|&link| self.document.contains(link, target));
        if selected {
            self.close();
        }
        selected
    }

    /// Click anywhere: outside both toggle and panel closes an open menu.
    pub fn on_document_click(&self, target: ElementId) -> bool {
        if !self.is_open()
            || self.document.contains(self.toggle, target)
            || self.document.contains(self.panel, target)
        {
            return false;
        }
        self.close();
        true
    }

    fn set_open(&self, open: bool) {
        self.open.set(open);
        self.render();
        debug!("menu {}", if open { "opened" } else { "closed" });
    }

    fn render(&self) {
        let open = self.is_open();
        self.document.set_classes(self.toggle, Classes::ACTIVE, open);
        self.document.set_classes(self.panel, Classes::ACTIVE, open);
        self.document
            .set_attribute(self.toggle, "aria-expanded", if open { "true" } else { "false" });
    }
}
