//! NavSync - keeps exactly one in-page navigation link active
//!
//! Links are discovered once at start-up. Activation always clears every
//! link first, then marks the ones pointing at the requested section, so the
//! "at most one active target" invariant holds after every call.
//!
//! # API
//!
//! - `activate(id)` - make `id`'s link(s) active, everything else inactive
//! - `active_target()` - section id of the active link
//! - `active_signal()` - reactive view of the same

use std::rc::Rc;

use log::debug;
use spark_signals::{signal, Signal};

use crate::dom::Document;
use crate::types::{Classes, ElementId};

/// Section id referenced by an in-page `href`.
///
/// `"#about"` → `Some("about")`. A bare `"#"` and every other href (absolute
/// URLs, relative paths, `mailto:`) → `None`.
pub fn fragment_target(href: &str) -> Option<&str> {
    href.strip_prefix('#').filter(|id| !id.is_empty())
}

/// A navigation link and the section it points to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavLink {
    pub element: ElementId,
    /// `None` for external links, which are never activated.
    pub target_id: Option<String>,
}

/// Navigation link activation.
pub struct NavSync {
    document: Rc<dyn Document>,
    links: Vec<NavLink>,
    active: Signal<Option<String>>,
}

impl NavSync {
    /// Collect every element matching `selector` as a nav link.
    pub fn new(document: Rc<dyn Document>, selector: &str) -> Self {
        let links = document
            .query_all(selector)
            .into_iter()
            .map(|element| NavLink {
                element,
                target_id: document
                    .attribute(element, "href")
                    .and_then(|href| fragment_target(&href).map(str::to_string)),
            })
            .collect::<Vec<_>>();
        debug!("nav sync tracking {} link(s)", links.len());

        Self {
            document,
            links,
            active: signal(None),
        }
    }

    pub fn links(&self) -> &[NavLink] {
        &self.links
    }

    /// First link pointing at `section_id`.
    pub fn link_for(&self, section_id: &str) -> Option<&NavLink> {
        self.links
            .iter()
            .find(|link| link.target_id.as_deref() == Some(section_id))
    }

    /// Mark the link(s) targeting `section_id` active and clear all others.
    ///
    /// Returns how many links were activated. Calling it again with the same
    /// id leaves the page unchanged.
    pub fn activate(&self, section_id: &str) -> usize {
        for link in &self.links {
            self.document.set_classes(link.element, Classes::ACTIVE, false);
        }

        let mut activated = 0;
        for link in &self.links {
            if link.target_id.as_deref() == Some(section_id) {
                self.document.set_classes(link.element, Classes::ACTIVE, true);
                activated += 1;
            }
        }

        let next = Some(section_id.to_string());
        if self.active.get() != next {
            debug!("active section -> {section_id}");
            self.active.set(next);
        }
        activated
    }

    /// Section id most recently activated.
    pub fn active_target(&self) -> Option<String> {
        self.active.get()
    }

    pub fn active_signal(&self) -> Signal<Option<String>> {
        self.active.clone()
    }

    /// True if `element` is a tracked link currently carrying `active`.
    pub fn is_active(&self, element: ElementId) -> bool {
        self.links.iter().any(|link| link.element == element)
            && self.document.classes(element).contains(Classes::ACTIVE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{ElementSpec, MemoryDocument};

    struct Page {
        doc: Rc<MemoryDocument>,
        home: ElementId,
        about: ElementId,
        external: ElementId,
    }

    fn setup() -> Page {
        let doc = Rc::new(MemoryDocument::new(1280.0, 800.0));
        let nav = doc.append(doc.body(), ElementSpec::new("nav")).unwrap();
        let link = |href: &str| {
            doc.append(nav, ElementSpec::new("a").class("nav-link").href(href))
                .unwrap()
        };
        let home = link("#home");
        let about = link("#about");
        let external = link("https://example.com/blog");
        Page {
            doc,
            home,
            about,
            external,
        }
    }

    #[test]
    fn test_fragment_target() {
        assert_eq!(fragment_target("#about"), Some("about"));
        assert_eq!(fragment_target("#"), None);
        assert_eq!(fragment_target("/about#team"), None);
        assert_eq!(fragment_target("https://example.com"), None);
    }

    #[test]
    fn test_links_discovered_with_targets() {
        let page = setup();
        let nav = NavSync::new(page.doc.clone(), ".nav-link");
        assert_eq!(nav.links().len(), 3);
        assert_eq!(nav.link_for("about").map(|l| l.element), Some(page.about));
        assert_eq!(nav.links()[2].target_id, None);
    }

    #[test]
    fn test_activate_is_exclusive_and_idempotent() {
        let page = setup();
        let nav = NavSync::new(page.doc.clone(), ".nav-link");

        assert_eq!(nav.activate("home"), 1);
        assert!(nav.is_active(page.home));

        assert_eq!(nav.activate("about"), 1);
        assert!(!nav.is_active(page.home));
        assert!(nav.is_active(page.about));

        nav.activate("about");
        assert!(nav.is_active(page.about));
        assert!(!nav.is_active(page.home));
        assert!(!nav.is_active(page.external));
        assert_eq!(nav.active_target().as_deref(), Some("about"));
    }

    #[test]
    fn test_activate_unknown_clears_all() {
        let page = setup();
        let nav = NavSync::new(page.doc.clone(), ".nav-link");
        nav.activate("home");
        assert_eq!(nav.activate("contact"), 0);
        assert!(!nav.is_active(page.home));
    }
}
