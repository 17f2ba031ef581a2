//! Typewriter - types the hero subtitle one character at a time
//!
//! Purely decorative. The subtitle's text is captured and cleared at start,
//! the first character appears immediately, then one more per interval.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::time::Duration;

use log::debug;

use crate::dom::Document;
use crate::timer::{Scheduler, TimerId};
use crate::types::ElementId;

struct Inner {
    document: Rc<dyn Document>,
    scheduler: Rc<dyn Scheduler>,
    element: ElementId,
    chars: Vec<char>,
    written: Cell<usize>,
    interval: Duration,
    timer: Cell<Option<TimerId>>,
    /// Back-reference for rescheduling from inside timer callbacks.
    this: RefCell<Weak<Inner>>,
}

impl Inner {
    fn step(&self) {
        self.timer.set(None);
        let written = (self.written.get() + 1).min(self.chars.len());
        self.written.set(written);
        let text: String = self.chars[..written].iter().collect();
        self.document.set_text(self.element, &text);

        if written < self.chars.len() {
            let weak = self.this.borrow().clone();
            let id = self.scheduler.set_timeout(
                self.interval,
                Box::new(move || {
                    if let Some(inner) = weak.upgrade() {
                        inner.step();
                    }
                }),
            );
            self.timer.set(Some(id));
        } else {
            debug!("typewriter finished ({} chars)", written);
        }
    }
}

pub struct Typewriter {
    inner: Rc<Inner>,
}

impl Typewriter {
    /// Start typing the first element matching `selector`.
    ///
    /// `None` if there is no such element. Empty text finishes immediately.
    pub fn start(
        document: Rc<dyn Document>,
        scheduler: Rc<dyn Scheduler>,
        selector: &str,
        interval: Duration,
    ) -> Option<Self> {
        let element = document.query(selector)?;
        let chars: Vec<char> = document.text(element).chars().collect();
        document.set_text(element, "");

        let inner = Rc::new(Inner {
            document,
            scheduler,
            element,
            chars,
            written: Cell::new(0),
            interval,
            timer: Cell::new(None),
            this: RefCell::new(Weak::new()),
        });
        *inner.this.borrow_mut() = Rc::downgrade(&inner);

        if !inner.chars.is_empty() {
            inner.step();
        }
        Some(Self { inner })
    }

    pub fn full_text(&self) -> String {
        self.inner.chars.iter().collect()
    }

    pub fn written(&self) -> usize {
        self.inner.written.get()
    }

    pub fn is_done(&self) -> bool {
        self.written() == self.inner.chars.len()
    }

    /// Stop typing where it is.
    pub fn cancel(&self) {
        if let Some(id) = self.inner.timer.take() {
            self.inner.scheduler.clear_timeout(id);
        }
    }
}

impl Drop for Typewriter {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{ElementSpec, MemoryDocument};
    use crate::timer::ManualScheduler;

    fn setup(text: &str) -> (Rc<MemoryDocument>, Rc<ManualScheduler>, ElementId) {
        let doc = Rc::new(MemoryDocument::new(1280.0, 800.0));
        let subtitle = doc
            .append(doc.body(), ElementSpec::new("p").class("hero-subtitle").text(text))
            .unwrap();
        (doc, Rc::new(ManualScheduler::new()), subtitle)
    }

    #[test]
    fn test_types_one_char_per_interval() {
        let (doc, scheduler, subtitle) = setup("Rust dev");
        let typewriter =
            Typewriter::start(doc.clone(), scheduler.clone(), ".hero-subtitle", Duration::from_millis(50))
                .unwrap();

        assert_eq!(doc.text(subtitle), "R");
        scheduler.advance(Duration::from_millis(50));
        assert_eq!(doc.text(subtitle), "Ru");
        scheduler.advance(Duration::from_millis(49));
        assert_eq!(doc.text(subtitle), "Ru");

        scheduler.run_until_idle(100);
        assert_eq!(doc.text(subtitle), "Rust dev");
        assert!(typewriter.is_done());
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_multibyte_text() {
        let (doc, scheduler, subtitle) = setup("héllo");
        let _typewriter =
            Typewriter::start(doc.clone(), scheduler.clone(), ".hero-subtitle", Duration::from_millis(10))
                .unwrap();
        scheduler.advance(Duration::from_millis(10));
        assert_eq!(doc.text(subtitle), "hé");
    }

    #[test]
    fn test_cancel_and_missing() {
        let (doc, scheduler, subtitle) = setup("abc");
        let typewriter =
            Typewriter::start(doc.clone(), scheduler.clone(), ".hero-subtitle", Duration::from_millis(10))
                .unwrap();
        typewriter.cancel();
        scheduler.run_until_idle(10);
        assert_eq!(doc.text(subtitle), "a");

        assert!(Typewriter::start(doc, scheduler, ".missing", Duration::from_millis(10)).is_none());
    }
}
