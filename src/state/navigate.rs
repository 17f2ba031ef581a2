//! Smooth scrolling for in-page anchors
//!
//! A click on an `href="#id"` anchor is taken over: the native jump is
//! suppressed, the page scrolls smoothly so the target sits just below the
//! fixed header, and the matching nav link is activated right away instead
//! of waiting for the scroll to settle.

use std::rc::Rc;

use log::{debug, warn};

use crate::dom::Document;
use crate::state::nav::{fragment_target, NavSync};
use crate::types::{ElementId, ScrollBehavior};

/// What happened to one click.
#[derive(Debug, Clone, PartialEq)]
pub enum NavigateOutcome {
    /// Not an in-page anchor: the browser handles it.
    Passthrough,
    /// Scrolled toward `target`; `offset` is the requested scroll top.
    Scrolled { target: String, offset: f64 },
    /// In-page anchor whose target does not exist. Nothing moved.
    MissingTarget { target: String },
}

impl NavigateOutcome {
    /// Whether the native navigation must be suppressed.
    pub fn prevents_default(&self) -> bool {
        !matches!(self, Self::Passthrough)
    }
}

/// Intercepts in-page anchor clicks.
pub struct SmoothScrollNavigator {
    document: Rc<dyn Document>,
    /// Anchors with a fragment target, in document order.
    anchors: Vec<(ElementId, String)>,
    header: Option<ElementId>,
}

impl SmoothScrollNavigator {
    pub fn new(document: Rc<dyn Document>, anchor_selector: &str, header: Option<ElementId>) -> Self {
        let anchors = document
            .query_all(anchor_selector)
            .into_iter()
            .filter_map(|element| {
                let href = document.attribute(element, "href")?;
                let target = fragment_target(&href)?.to_string();
                Some((element, target))
            })
            .collect::<Vec<_>>();
        debug!("smooth scroll bound to {} anchor(s)", anchors.len());

        Self {
            document,
            anchors,
            header,
        }
    }

    pub fn anchors(&self) -> &[(ElementId, String)] {
        &self.anchors
    }

    /// Fragment target of the anchor at or around `clicked`.
    pub fn anchor_target(&self, clicked: ElementId) -> Option<&str> {
        self.anchors
            .iter()
            .find(|(anchor, _)| self.document.contains(*anchor, clicked))
            .map(|(_, target)| target.as_str())
    }

    /// Scroll top that puts `rect_top` right under the header.
    pub fn target_offset(&self, rect_top: f64) -> f64 {
        let header_height = self
            .header
            .map_or(0.0, |header| self.document.rect(header).height);
        (rect_top - header_height).max(0.0)
    }

    /// Handle a click whose target is `clicked`.
    pub fn on_click(&self, clicked: ElementId, nav: &NavSync) -> NavigateOutcome {
        match self.anchor_target(clicked) {
            Some(target) => self.navigate(target, nav),
            None => NavigateOutcome::Passthrough,
        }
    }

    /// Smooth-scroll to the section with id `target` and activate its link.
    pub fn navigate(&self, target: &str, nav: &NavSync) -> NavigateOutcome {
        let Some(element) = self.document.element_by_id(target) else {
            warn!("anchor points at missing section #{target}");
            return NavigateOutcome::MissingTarget {
                target: target.to_string(),
            };
        };

        let offset = self.target_offset(self.document.rect(element).top);
        self.document.scroll_to(offset, ScrollBehavior::Smooth);
        nav.activate(target);
        debug!("navigate #{target} -> {offset}");

        NavigateOutcome::Scrolled {
            target: target.to_string(),
            offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{ElementSpec, MemoryDocument, ScrollCall};

    struct Page {
        doc: Rc<MemoryDocument>,
        navigator: SmoothScrollNavigator,
        nav: NavSync,
        about_link: ElementId,
        about_icon: ElementId,
        broken: ElementId,
        external: ElementId,
    }

    fn setup() -> Page {
        let doc = Rc::new(MemoryDocument::new(1280.0, 800.0));
        let body = doc.body();
        let header = doc
            .append(body, ElementSpec::new("nav").class("navbar").height(70.0).fixed())
            .unwrap();
        let about_link = doc
            .append(header, ElementSpec::new("a").class("nav-link").href("#about"))
            .unwrap();
        let about_icon = doc.append(about_link, ElementSpec::new("span")).unwrap();
        let broken = doc
            .append(header, ElementSpec::new("a").href("#nowhere"))
            .unwrap();
        let external = doc
            .append(header, ElementSpec::new("a").class("nav-link").href("https://example.com"))
            .unwrap();
        doc.append(body, ElementSpec::new("section").id("home").height(900.0))
            .unwrap();
        doc.append(body, ElementSpec::new("section").id("about").height(900.0))
            .unwrap();

        let navigator = SmoothScrollNavigator::new(doc.clone(), "a[href^=\"#\"]", Some(header));
        let nav = NavSync::new(doc.clone(), ".nav-link");
        Page {
            doc,
            navigator,
            nav,
            about_link,
            about_icon,
            broken,
            external,
        }
    }

    #[test]
    fn test_in_page_anchor_scrolls_below_header() {
        let page = setup();
        let outcome = page.navigator.on_click(page.about_link, &page.nav);

        assert_eq!(
            outcome,
            NavigateOutcome::Scrolled {
                target: "about".to_string(),
                offset: 830.0
            }
        );
        assert!(outcome.prevents_default());
        assert_eq!(
            page.doc.last_scroll(),
            Some(ScrollCall { top: 830.0, behavior: ScrollBehavior::Smooth })
        );
        assert!(page.nav.is_active(page.about_link));
    }

    #[test]
    fn test_click_inside_anchor() {
        let page = setup();
        let outcome = page.navigator.on_click(page.about_icon, &page.nav);
        assert!(matches!(outcome, NavigateOutcome::Scrolled { .. }));
    }

    #[test]
    fn test_external_link_passes_through() {
        let page = setup();
        page.nav.activate("home");
        let outcome = page.navigator.on_click(page.external, &page.nav);

        assert_eq!(outcome, NavigateOutcome::Passthrough);
        assert!(!outcome.prevents_default());
        assert_eq!(page.doc.last_scroll(), None);
        assert_eq!(page.nav.active_target().as_deref(), Some("home"));
    }

    #[test]
    fn test_missing_target_suppresses_and_does_nothing() {
        let page = setup();
        let outcome = page.navigator.on_click(page.broken, &page.nav);

        assert!(outcome.prevents_default());
        assert!(matches!(outcome, NavigateOutcome::MissingTarget { .. }));
        assert_eq!(page.doc.last_scroll(), None);
        assert_eq!(page.nav.active_target(), None);
    }

    #[test]
    fn test_offset_clamped_at_top() {
        let page = setup();
        let outcome = page.navigator.navigate("home", &page.nav);
        assert_eq!(
            outcome,
            NavigateOutcome::Scrolled {
                target: "home".to_string(),
                offset: 0.0
            }
        );
    }
}
