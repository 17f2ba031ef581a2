//! Disclosure - a button that shows and hides a panel (resume section)

use std::rc::Rc;

use log::debug;
use spark_signals::{signal, Signal};

use crate::dom::Document;
use crate::types::{Classes, ElementId};

pub struct Disclosure {
    document: Rc<dyn Document>,
    button: ElementId,
    panel: ElementId,
    open: Signal<bool>,
}

impl Disclosure {
    /// `None` unless both the button and the panel exist.
    pub fn new(document: Rc<dyn Document>, button_selector: &str, panel_selector: &str) -> Option<Self> {
        let button = document.query(button_selector)?;
        let panel = document.query(panel_selector)?;
        let disclosure = Self {
            document,
            button,
            panel,
            open: signal(false),
        };
        disclosure.render();
        Some(disclosure)
    }

    pub fn is_open(&self) -> bool {
        self.open.get()
    }

    pub fn open_signal(&self) -> Signal<bool> {
        self.open.clone()
    }

    pub fn button(&self) -> ElementId {
        self.button
    }

    /// Flip the panel. Returns the new state.
    pub fn toggle(&self) -> bool {
        let open = !self.is_open();
        self.open.set(open);
        self.render();
        debug!("disclosure {}", if open { "opened" } else { "closed" });
        open
    }

    /// Toggle if `target` is the button or inside it.
    pub fn on_click(&self, target: ElementId) -> bool {
        if !self.document.contains(self.button, target) {
            return false;
        }
        self.toggle();
        true
    }

    fn render(&self) {
        let open = self.is_open();
        self.document.set_classes(self.panel, Classes::OPEN, open);
        self.document.set_classes(self.button, Classes::ACTIVE, open);
        self.document
            .set_attribute(self.button, "aria-expanded", if open { "true" } else { "false" });
    }
}
