//! Scroll Module - current section detection and header state
//!
//! Section geometry is read from the document on every tick and never
//! cached, so content that reflows (images loading, panels opening) is
//! picked up on the next scroll.
//!
//! # API
//!
//! - `ScrollState::read(doc)` - scroll metrics snapshot
//! - `current_section(sections, probe_y)` - pure containment search
//! - `header_state(scroll_y, threshold)` - pure header rule
//! - `ScrollTracker::on_scroll(nav)` - one debounced tick

use std::rc::Rc;

use log::{debug, trace};
use spark_signals::{signal, Signal};

use crate::config::{HeaderStyle, ScrollConfig};
use crate::dom::Document;
use crate::state::nav::NavSync;
use crate::types::{Classes, ElementId, Rect};

// =============================================================================
// SCROLL STATE
// =============================================================================

/// Scroll metrics for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollState {
    pub scroll_y: f64,
    pub viewport_height: f64,
    pub document_height: f64,
}

impl ScrollState {
    pub fn read(document: &dyn Document) -> Self {
        Self {
            scroll_y: document.scroll_y(),
            viewport_height: document.viewport_height(),
            document_height: document.document_height(),
        }
    }

    pub fn at_top(&self) -> bool {
        self.scroll_y <= 0.0
    }

    /// Viewport bottom has reached the end of the document.
    pub fn at_bottom(&self) -> bool {
        self.scroll_y + self.viewport_height >= self.document_height
    }
}

// =============================================================================
// SECTIONS
// =============================================================================

/// A page section as measured on this tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub id: String,
    pub top_offset: f64,
    pub height: f64,
}

impl Section {
    pub fn new(id: impl Into<String>, rect: Rect) -> Self {
        Self {
            id: id.into(),
            top_offset: rect.top,
            height: rect.height,
        }
    }

    /// `probe_y` in `[top_offset, top_offset + height)`.
    pub fn contains(&self, probe_y: f64) -> bool {
        Rect::new(self.top_offset, self.height).contains_y(probe_y)
    }
}

/// The section containing `probe_y`; first in document order if several do.
pub fn current_section(sections: &[Section], probe_y: f64) -> Option<&Section> {
    sections.iter().find(|section| section.contains(probe_y))
}

// =============================================================================
// HEADER
// =============================================================================

/// Visual state of the fixed header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderState {
    /// Translucent, no shadow.
    #[default]
    Resting,
    /// Opaque with a drop shadow.
    Scrolled,
}

/// `Scrolled` strictly past `threshold`. No hysteresis.
pub fn header_state(scroll_y: f64, threshold: f64) -> HeaderState {
    if scroll_y > threshold {
        HeaderState::Scrolled
    } else {
        HeaderState::Resting
    }
}

// =============================================================================
// SCROLL TRACKER
// =============================================================================

/// What one tick found.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollTick {
    pub scroll: ScrollState,
    /// `None` when the probe sits in a gap (nothing was changed).
    pub section: Option<String>,
    pub header: HeaderState,
}

/// Derives the current section and header state from scroll position.
pub struct ScrollTracker {
    document: Rc<dyn Document>,
    sections: Vec<(ElementId, String)>,
    header: Option<ElementId>,
    probe_offset: f64,
    header_threshold: f64,
    header_style: HeaderStyle,
    current: Signal<Option<String>>,
    header_state: Signal<HeaderState>,
}

impl ScrollTracker {
    /// Track every element matching `section_selector` that carries an id.
    pub fn new(
        document: Rc<dyn Document>,
        section_selector: &str,
        header: Option<ElementId>,
        config: &ScrollConfig,
        header_style: HeaderStyle,
    ) -> Self {
        let sections = document
            .query_all(section_selector)
            .into_iter()
            .filter_map(|element| {
                let id = document.attribute(element, "id")?;
                (!id.is_empty()).then_some((element, id))
            })
            .collect::<Vec<_>>();
        debug!("scroll tracker watching {} section(s)", sections.len());

        Self {
            document,
            sections,
            header,
            probe_offset: config.probe_offset,
            header_threshold: config.header_threshold,
            header_style,
            current: signal(None),
            header_state: signal(HeaderState::Resting),
        }
    }

    /// Sections with geometry read live from the document.
    pub fn sections(&self) -> Vec<Section> {
        self.sections
            .iter()
            .map(|(element, id)| Section::new(id.as_str(), self.document.rect(*element)))
            .collect()
    }

    /// Section under `scroll_y + probe_offset`, if any.
    pub fn detect(&self, scroll_y: f64) -> Option<String> {
        let probe_y = scroll_y + self.probe_offset;
        let sections = self.sections();
        let found = current_section(&sections, probe_y).map(|s| s.id.clone());
        trace!("probe {probe_y} -> {found:?}");
        found
    }

    /// Apply the header rule for `scroll_y` and write it to the page.
    pub fn update_header(&self, scroll_y: f64) -> HeaderState {
        let state = header_state(scroll_y, self.header_threshold);

        if let Some(header) = self.header {
            let (background, shadow) = match state {
                HeaderState::Scrolled => (
                    &self.header_style.scrolled_background,
                    &self.header_style.scrolled_shadow,
                ),
                HeaderState::Resting => (
                    &self.header_style.resting_background,
                    &self.header_style.resting_shadow,
                ),
            };
            self.document.set_style(header, "background", background);
            self.document.set_style(header, "box-shadow", shadow);
            self.document
                .set_classes(header, Classes::SCROLLED, state == HeaderState::Scrolled);
        }

        if self.header_state.get() != state {
            debug!("header -> {state:?}");
            self.header_state.set(state);
        }
        state
    }

    /// One scroll tick: sync the active nav link and the header.
    ///
    /// A probe that falls between sections leaves the active link alone.
    pub fn on_scroll(&self, nav: &NavSync) -> ScrollTick {
        let scroll = ScrollState::read(self.document.as_ref());
        let section = self.detect(scroll.scroll_y);

        if let Some(id) = &section {
            nav.activate(id);
            if self.current.get().as_ref() != Some(id) {
                self.current.set(Some(id.clone()));
            }
        }
        let header = self.update_header(scroll.scroll_y);

        ScrollTick {
            scroll,
            section,
            header,
        }
    }

    /// Last section found by [`on_scroll`](Self::on_scroll).
    pub fn current(&self) -> Option<String> {
        self.current.get()
    }

    pub fn current_signal(&self) -> Signal<Option<String>> {
        self.current.clone()
    }

    pub fn header(&self) -> HeaderState {
        self.header_state.get()
    }

    pub fn header_signal(&self) -> Signal<HeaderState> {
        self.header_state.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{ElementSpec, MemoryDocument};

    struct Page {
        doc: Rc<MemoryDocument>,
        header: ElementId,
        tracker: ScrollTracker,
        nav: NavSync,
    }

    // header (fixed, 70) | home 0..800 | gap 800..900 | about 900..1500 | contact 1500..2100
    fn setup() -> Page {
        let doc = Rc::new(MemoryDocument::new(1280.0, 800.0));
        let body = doc.body();
        let header = doc
            .append(body, ElementSpec::new("nav").class("navbar").height(70.0).fixed())
            .unwrap();
        for id in ["home", "about", "contact"] {
            doc.append(
                header,
                ElementSpec::new("a").class("nav-link").href(format!("#{id}")),
            )
            .unwrap();
        }
        doc.append(body, ElementSpec::new("section").id("home").height(800.0))
            .unwrap();
        doc.append(body, ElementSpec::new("div").height(100.0)).unwrap();
        doc.append(body, ElementSpec::new("section").id("about").height(600.0))
            .unwrap();
        doc.append(body, ElementSpec::new("section").id("contact").height(600.0))
            .unwrap();
        // Sections without an id are ignored.
        doc.append(body, ElementSpec::new("section").height(10.0)).unwrap();

        let tracker = ScrollTracker::new(
            doc.clone(),
            "section",
            Some(header),
            &ScrollConfig::default(),
            HeaderStyle::default(),
        );
        let nav = NavSync::new(doc.clone(), ".nav-link");
        Page {
            doc,
            header,
            tracker,
            nav,
        }
    }

    #[test]
    fn test_header_rule() {
        assert_eq!(header_state(0.0, 50.0), HeaderState::Resting);
        assert_eq!(header_state(50.0, 50.0), HeaderState::Resting);
        assert_eq!(header_state(50.5, 50.0), HeaderState::Scrolled);
        assert_eq!(header_state(51.0, 50.0), header_state(51.0, 50.0));
    }

    #[test]
    fn test_current_section_half_open() {
        let sections = vec![
            Section::new("a", Rect::new(0.0, 100.0)),
            Section::new("b", Rect::new(100.0, 100.0)),
        ];
        assert_eq!(current_section(&sections, 99.9).map(|s| s.id.as_str()), Some("a"));
        assert_eq!(current_section(&sections, 100.0).map(|s| s.id.as_str()), Some("b"));
        assert_eq!(current_section(&sections, 200.0), None);
    }

    #[test]
    fn test_sections_read_live() {
        let page = setup();
        assert_eq!(page.tracker.sections().len(), 3);
        assert_eq!(page.tracker.sections()[1].top_offset, 900.0);

        let home = page.doc.element_by_id("home").unwrap();
        page.doc.set_height(home, Some(1000.0)).unwrap();
        assert_eq!(page.tracker.sections()[1].top_offset, 1100.0);
    }

    #[test]
    fn test_tick_activates_section_under_probe() {
        let page = setup();
        page.doc.set_scroll_y(850.0);
        let tick = page.tracker.on_scroll(&page.nav);

        assert_eq!(tick.section.as_deref(), Some("about"));
        assert_eq!(page.nav.active_target().as_deref(), Some("about"));
        assert_eq!(page.tracker.current().as_deref(), Some("about"));
        assert_eq!(tick.header, HeaderState::Scrolled);
    }

    #[test]
    fn test_gap_keeps_previous_link() {
        let page = setup();
        page.doc.set_scroll_y(600.0);
        page.tracker.on_scroll(&page.nav);
        assert_eq!(page.nav.active_target().as_deref(), Some("home"));

        // probe 810: inside the 800..900 gap
        page.doc.set_scroll_y(710.0);
        let tick = page.tracker.on_scroll(&page.nav);
        assert_eq!(tick.section, None);
        assert_eq!(page.nav.active_target().as_deref(), Some("home"));
        let home_link = page.nav.link_for("home").unwrap().element;
        assert!(page.nav.is_active(home_link));
    }

    #[test]
    fn test_header_styles_written() {
        let page = setup();
        page.tracker.update_header(120.0);
        assert_eq!(
            page.doc.style(page.header, "box-shadow").as_deref(),
            Some("0 2px 20px rgba(0, 0, 0, 0.1)")
        );
        assert!(page.doc.has_class(page.header, "scrolled"));

        page.tracker.update_header(10.0);
        assert_eq!(
            page.doc.style(page.header, "background").as_deref(),
            Some("rgba(255, 255, 255, 0.95)")
        );
        assert_eq!(page.doc.style(page.header, "box-shadow").as_deref(), Some("none"));
        assert!(!page.doc.has_class(page.header, "scrolled"));
        assert_eq!(page.tracker.header(), HeaderState::Resting);
    }
}
