//! Reveal Module - one-shot entrance animations
//!
//! Every animatable element starts hidden. The first time enough of it is
//! visible it is revealed and stays revealed: the transition is one-way and
//! guarded, so repeated notifications, a second strategy, or scrolling back
//! up never undo it.
//!
//! Two ways to learn about visibility:
//!
//! - **Observer** - the host delivers [`IntersectionEntry`] batches
//! - **Poll** - [`RevealObserver::poll`] measures live rects on each tick

use std::rc::Rc;

use log::debug;

use crate::config::RevealConfig;
use crate::dom::Document;
use crate::types::{Classes, ElementId, Rect};

/// One visibility notification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntersectionEntry {
    pub element: ElementId,
    /// Visible fraction of the element, `0.0..=1.0`.
    pub ratio: f64,
    pub is_intersecting: bool,
}

/// An element waiting to be (or already) revealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealTarget {
    pub element: ElementId,
    pub revealed: bool,
}

impl RevealTarget {
    pub fn new(element: ElementId) -> Self {
        Self {
            element,
            revealed: false,
        }
    }

    /// `false -> true`. Returns whether this call made the change.
    pub fn reveal(&mut self) -> bool {
        if self.revealed {
            return false;
        }
        self.revealed = true;
        true
    }
}

/// Fraction of `rect` inside the band `[band_top, band_bottom)`.
///
/// A zero-height element counts as fully visible when its top is inside.
pub fn intersection_ratio(rect: Rect, band_top: f64, band_bottom: f64) -> f64 {
    if rect.height <= 0.0 {
        return if rect.top >= band_top && rect.top < band_bottom {
            1.0
        } else {
            0.0
        };
    }
    let visible = rect.bottom().min(band_bottom) - rect.top.max(band_top);
    (visible / rect.height).clamp(0.0, 1.0)
}

/// Watches the animatable elements and reveals each one once.
pub struct RevealObserver {
    document: Rc<dyn Document>,
    targets: Vec<RevealTarget>,
    threshold: f64,
    bottom_margin: f64,
    hidden_offset: f64,
}

impl RevealObserver {
    /// Collect the elements matching `selector` and put them in the hidden state.
    pub fn new(document: Rc<dyn Document>, selector: &str, config: &RevealConfig) -> Self {
        let targets = document
            .query_all(selector)
            .into_iter()
            .map(RevealTarget::new)
            .collect::<Vec<_>>();

        let hidden_transform = format!("translateY({}px)", config.hidden_offset);
        for target in &targets {
            document.set_style(target.element, "opacity", "0");
            document.set_style(target.element, "transform", &hidden_transform);
            document.set_style(target.element, "transition", &config.transition);
        }
        debug!("reveal observing {} element(s)", targets.len());

        Self {
            document,
            targets,
            threshold: config.threshold,
            bottom_margin: config.bottom_margin,
            hidden_offset: config.hidden_offset,
        }
    }

    /// Root margin string for a host intersection primitive.
    pub fn root_margin(&self) -> String {
        format!("0px 0px -{}px 0px", self.bottom_margin)
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Elements still waiting to be revealed.
    pub fn observed(&self) -> Vec<ElementId> {
        self.targets
            .iter()
            .filter(|target| !target.revealed)
            .map(|target| target.element)
            .collect()
    }

    pub fn is_revealed(&self, element: ElementId) -> bool {
        self.targets
            .iter()
            .any(|target| target.element == element && target.revealed)
    }

    pub fn hidden_offset(&self) -> f64 {
        self.hidden_offset
    }

    /// Process one batch of notifications. Returns the newly revealed elements.
    pub fn on_intersections(&mut self, entries: &[IntersectionEntry]) -> Vec<ElementId> {
        let mut revealed = Vec::new();
        for entry in entries {
            if entry.is_intersecting
                && entry.ratio >= self.threshold
                && self.reveal(entry.element)
            {
                revealed.push(entry.element);
            }
        }
        revealed
    }

    /// Measure every unrevealed element against the viewport (minus the
    /// bottom margin) and reveal the ones past the threshold.
    pub fn poll(&mut self) -> Vec<ElementId> {
        let band_top = self.document.scroll_y();
        let band_bottom = band_top + self.document.viewport_height() - self.bottom_margin;

        let entries = self
            .observed()
            .into_iter()
            .map(|element| {
                let rect = self.document.rect(element);
                let ratio = intersection_ratio(rect, band_top, band_bottom);
                IntersectionEntry {
                    element,
                    ratio,
                    is_intersecting: ratio > 0.0,
                }
            })
            .collect::<Vec<_>>();
        self.on_intersections(&entries)
    }

    /// The guarded transition. Unknown elements are ignored.
    fn reveal(&mut self, element: ElementId) -> bool {
        let Some(target) = self.targets.iter_mut().find(|t| t.element == element) else {
            return false;
        };
        if !target.reveal() {
            return false;
        }

        self.document.set_style(element, "opacity", "1");
        self.document.set_style(element, "transform", "translateY(0)");
        self.document.set_classes(element, Classes::VISIBLE, true);
        debug!("revealed {element:?}");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{ElementSpec, MemoryDocument};

    struct Page {
        doc: Rc<MemoryDocument>,
        first: ElementId,
        second: ElementId,
        observer: RevealObserver,
    }

    // viewport 800; first card 0..400, spacer 400..1400, second card 1400..1800
    fn setup() -> Page {
        let doc = Rc::new(MemoryDocument::new(1280.0, 800.0));
        let body = doc.body();
        let first = doc
            .append(body, ElementSpec::new("div").class("project-card").height(400.0))
            .unwrap();
        doc.append(body, ElementSpec::new("div").height(1000.0)).unwrap();
        let second = doc
            .append(body, ElementSpec::new("div").class("project-card").height(400.0))
            .unwrap();
        let observer = RevealObserver::new(doc.clone(), ".project-card", &RevealConfig::default());
        Page {
            doc,
            first,
            second,
            observer,
        }
    }

    fn entry(element: ElementId, ratio: f64) -> IntersectionEntry {
        IntersectionEntry {
            element,
            ratio,
            is_intersecting: ratio > 0.0,
        }
    }

    #[test]
    fn test_setup_hides_targets() {
        let page = setup();
        assert_eq!(page.doc.style(page.first, "opacity").as_deref(), Some("0"));
        assert_eq!(
            page.doc.style(page.second, "transform").as_deref(),
            Some("translateY(30px)")
        );
        assert_eq!(page.observer.observed(), vec![page.first, page.second]);
        assert_eq!(page.observer.root_margin(), "0px 0px -50px 0px");
    }

    #[test]
    fn test_threshold_gates_reveal() {
        let mut page = setup();
        assert!(page.observer.on_intersections(&[entry(page.first, 0.05)]).is_empty());
        assert!(!page.observer.is_revealed(page.first));

        let revealed = page.observer.on_intersections(&[entry(page.first, 0.1)]);
        assert_eq!(revealed, vec![page.first]);
        assert!(page.doc.has_class(page.first, "visible"));
        assert_eq!(page.doc.style(page.first, "opacity").as_deref(), Some("1"));
        assert_eq!(page.observer.observed(), vec![page.second]);
    }

    #[test]
    fn test_reveal_never_reverts() {
        let mut page = setup();
        page.observer.on_intersections(&[entry(page.first, 0.5)]);
        assert!(page.observer.on_intersections(&[entry(page.first, 0.9)]).is_empty());
        page.observer.on_intersections(&[entry(page.first, 0.0)]);
        assert!(page.observer.is_revealed(page.first));
        assert!(page.doc.has_class(page.first, "visible"));
    }

    #[test]
    fn test_batch_entries_independent() {
        let mut page = setup();
        let revealed = page
            .observer
            .on_intersections(&[entry(page.first, 0.3), entry(page.second, 0.02)]);
        assert_eq!(revealed, vec![page.first]);
        assert!(!page.observer.is_revealed(page.second));
    }

    #[test]
    fn test_poll_respects_bottom_margin() {
        let mut page = setup();
        assert_eq!(page.observer.poll(), vec![page.first]);

        // band 650..1400: second card (1400..1800) not visible at all
        page.doc.set_scroll_y(650.0);
        assert!(page.observer.poll().is_empty());

        // band 690..1440: 40 of 400 visible = exactly the 0.1 threshold
        page.doc.set_scroll_y(690.0);
        assert_eq!(page.observer.poll(), vec![page.second]);
    }

    #[test]
    fn test_intersection_ratio() {
        assert_eq!(intersection_ratio(Rect::new(0.0, 100.0), 0.0, 50.0), 0.5);
        assert_eq!(intersection_ratio(Rect::new(200.0, 100.0), 0.0, 50.0), 0.0);
        assert_eq!(intersection_ratio(Rect::new(10.0, 0.0), 0.0, 50.0), 1.0);
    }
}
