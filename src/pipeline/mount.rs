//! Mount API - build every component once and wire it to page events.
//!
//! `mount()` is the single start-up routine. It looks up the page's
//! collaborators, creates each component with the slice of state it owns,
//! registers the fixed table of named subscriptions, runs one scroll tick so
//! the page starts consistent, and hands back a [`MountHandle`] whose
//! [`dispatch`](MountHandle::dispatch) is the only entry point for host
//! events.
//!
//! # Example
//!
//! ```ignore
//! use std::rc::Rc;
//! use pagesync::{mount, Config, ManualScheduler, MemoryDocument, PageEvent};
//!
//! let handle = mount(Rc::new(page), Rc::new(ManualScheduler::new()), Config::default())?;
//! handle.dispatch(PageEvent::Scroll);
//!
//! for sub in handle.subscriptions() {
//!     println!("{} -> {:?}", sub.name, sub.topic);
//! }
//!
//! handle.unmount();
//! ```

use std::cell::{Ref, RefCell};
use std::rc::Rc;
use std::time::Duration;

use log::{debug, info};

use super::events::{DispatchOutcome, EventBus, PageEvent, Subscription, Topic};
use crate::config::{Config, RevealStrategy};
use crate::dom::Document;
use crate::error::Result;
use crate::state::{
    debounce, Debounced, Disclosure, MobileMenu, NavSync, RevealObserver, ScrollTick,
    ScrollTracker, SmoothScrollNavigator, TouchGuard, Typewriter,
};
use crate::timer::Scheduler;
use crate::types::ElementId;

// =============================================================================
// Components
// =============================================================================

/// Every component of a mounted page. Each owns its own state.
struct Components {
    document: Rc<dyn Document>,
    nav: NavSync,
    tracker: ScrollTracker,
    navigator: SmoothScrollNavigator,
    reveal: RefCell<RevealObserver>,
    strategy: RevealStrategy,
    touch: TouchGuard,
    menu: Option<MobileMenu>,
    disclosure: Option<Disclosure>,
}

impl Components {
    fn build(document: Rc<dyn Document>, config: &Config) -> Self {
        let selectors = &config.selectors;
        let header = document.query(&selectors.header);
        if header.is_none() {
            debug!("no header matches `{}`; offsets ignore it", selectors.header);
        }

        let menu = MobileMenu::new(
            document.clone(),
            &selectors.menu_toggle,
            &selectors.menu_panel,
            &selectors.nav_links,
        );
        if menu.is_none() {
            debug!("mobile menu skipped");
        }
        let disclosure = Disclosure::new(
            document.clone(),
            &selectors.resume_toggle,
            &selectors.resume_panel,
        );
        if disclosure.is_none() {
            debug!("resume toggle skipped");
        }

        Self {
            nav: NavSync::new(document.clone(), &selectors.nav_links),
            tracker: ScrollTracker::new(
                document.clone(),
                &selectors.sections,
                header,
                &config.scroll,
                config.header.clone(),
            ),
            navigator: SmoothScrollNavigator::new(document.clone(), &selectors.anchors, header),
            reveal: RefCell::new(RevealObserver::new(
                document.clone(),
                &selectors.animatable,
                &config.reveal,
            )),
            strategy: config.reveal.strategy,
            touch: TouchGuard::new(document.clone()),
            menu,
            disclosure,
            document,
        }
    }

    /// One scroll tick: active section, header, and polled reveals.
    fn tick(&self) -> ScrollTick {
        let tick = self.tracker.on_scroll(&self.nav);
        if self.strategy == RevealStrategy::Poll {
            self.reveal.borrow_mut().poll();
        }
        tick
    }
}

// =============================================================================
// Mount Handle
// =============================================================================

/// A mounted page.
///
/// Dropping the handle leaves the page as it is; [`unmount`](Self::unmount)
/// also detaches every subscription and cancels pending timers.
pub struct MountHandle {
    components: Rc<Components>,
    bus: EventBus,
    tick: Debounced<()>,
    typewriter: Option<Typewriter>,
    config: Config,
}

impl MountHandle {
    /// Feed one host event through the subscription table.
    pub fn dispatch(&self, event: PageEvent) -> DispatchOutcome {
        self.bus.dispatch(event)
    }

    /// The named subscriptions, in registration order.
    pub fn subscriptions(&self) -> Vec<Subscription> {
        self.bus.subscriptions()
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn document(&self) -> Rc<dyn Document> {
        self.components.document.clone()
    }

    pub fn nav(&self) -> &NavSync {
        &self.components.nav
    }

    pub fn tracker(&self) -> &ScrollTracker {
        &self.components.tracker
    }

    pub fn navigator(&self) -> &SmoothScrollNavigator {
        &self.components.navigator
    }

    pub fn reveal(&self) -> Ref<'_, RevealObserver> {
        self.components.reveal.borrow()
    }

    pub fn is_revealed(&self, element: ElementId) -> bool {
        self.components.reveal.borrow().is_revealed(element)
    }

    pub fn menu(&self) -> Option<&MobileMenu> {
        self.components.menu.as_ref()
    }

    pub fn disclosure(&self) -> Option<&Disclosure> {
        self.components.disclosure.as_ref()
    }

    pub fn typewriter(&self) -> Option<&Typewriter> {
        self.typewriter.as_ref()
    }

    pub fn touch(&self) -> &TouchGuard {
        &self.components.touch
    }

    /// Whether a debounced scroll tick is waiting to run.
    pub fn tick_pending(&self) -> bool {
        self.tick.is_pending()
    }

    /// Run a pending scroll tick now.
    ///
    /// # Errors
    ///
    /// Whatever the tick returns.
    pub fn flush(&self) -> Result<()> {
        self.tick.flush()
    }

    /// Detach every subscription and cancel pending work.
    pub fn unmount(self) {
        self.bus.clear();
        self.tick.cancel();
        if let Some(typewriter) = &self.typewriter {
            typewriter.cancel();
        }
        info!("pagesync unmounted");
    }
}

// =============================================================================
// Mount
// =============================================================================

/// Build every component for `document` and wire the subscription table.
///
/// # Errors
///
/// Returns [`Error::InvalidConfig`](crate::Error::InvalidConfig) if `config`
/// does not validate. Missing optional elements are not errors.
pub fn mount(
    document: Rc<dyn Document>,
    scheduler: Rc<dyn Scheduler>,
    config: Config,
) -> Result<MountHandle> {
    config.validate()?;

    let components = Rc::new(Components::build(document.clone(), &config));
    let bus = EventBus::new();

    let tick = {
        let components = components.clone();
        debounce(
            scheduler.clone(),
            Duration::from_millis(config.scroll.debounce_ms),
            move |()| {
                components.tick();
                Ok(())
            },
        )
    };

    // Scroll & resize -> debounced tick
    for (name, topic) in [
        ("scroll.debounced-tick", Topic::Scroll),
        ("resize.debounced-tick", Topic::Resize),
    ] {
        let tick = tick.clone();
        bus.subscribe(name, topic, move |_| {
            tick.call(());
            Ok(())
        });
    }

    // In-page anchors. Registered before the menu so a link's own handling
    // runs before the menu closes.
    {
        let c = components.clone();
        bus.subscribe("navigate.anchor-click", Topic::Click, move |ctx| {
            if let PageEvent::Click { target } = *ctx.event {
                if c.navigator.on_click(target, &c.nav).prevents_default() {
                    ctx.prevent_default();
                }
            }
            Ok(())
        });
    }

    if components.menu.is_some() {
        let c = components.clone();
        bus.subscribe("menu.toggle-click", Topic::Click, move |ctx| {
            if let (PageEvent::Click { target }, Some(menu)) = (ctx.event, &c.menu) {
                menu.on_toggle_click(*target);
            }
            Ok(())
        });
        let c = components.clone();
        bus.subscribe("menu.link-click", Topic::Click, move |ctx| {
            if let (PageEvent::Click { target }, Some(menu)) = (ctx.event, &c.menu) {
                menu.on_link_selected(*target);
            }
            Ok(())
        });
        let c = components.clone();
        bus.subscribe("menu.outside-click", Topic::Click, move |ctx| {
            if let (PageEvent::Click { target }, Some(menu)) = (ctx.event, &c.menu) {
                menu.on_document_click(*target);
            }
            Ok(())
        });
    }

    if components.disclosure.is_some() {
        let c = components.clone();
        bus.subscribe("disclosure.toggle-click", Topic::Click, move |ctx| {
            if let (PageEvent::Click { target }, Some(disclosure)) = (ctx.event, &c.disclosure) {
                disclosure.on_click(*target);
            }
            Ok(())
        });
    }

    // Touch overscroll guard
    {
        let c = components.clone();
        bus.subscribe("touch.start", Topic::TouchStart, move |ctx| {
            if let PageEvent::TouchStart { client_y } = *ctx.event {
                c.touch.on_touch_start(client_y);
            }
            Ok(())
        });
        let c = components.clone();
        bus.subscribe("touch.move", Topic::TouchMove, move |ctx| {
            if let PageEvent::TouchMove { client_y } = *ctx.event {
                if c.touch.on_touch_move(client_y) {
                    ctx.prevent_default();
                }
            }
            Ok(())
        });
        let c = components.clone();
        bus.subscribe("touch.end", Topic::TouchEnd, move |_| {
            c.touch.on_touch_end();
            Ok(())
        });
    }

    {
        let c = components.clone();
        bus.subscribe("reveal.intersections", Topic::Intersections, move |ctx| {
            if let PageEvent::Intersections(entries) = ctx.event {
                c.reveal.borrow_mut().on_intersections(entries);
            }
            Ok(())
        });
    }

    // Start consistent with wherever the page already is.
    components.tick();

    let typewriter = Typewriter::start(
        document,
        scheduler,
        &config.selectors.subtitle,
        Duration::from_millis(config.typing.interval_ms),
    );

    info!(
        "pagesync mounted: {} subscription(s), {} nav link(s), {} reveal target(s)",
        bus.subscriptions().len(),
        components.nav.links().len(),
        components.reveal.borrow().observed().len(),
    );

    Ok(MountHandle {
        components,
        bus,
        tick,
        typewriter,
        config,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{ElementSpec, MemoryDocument};
    use crate::timer::ManualScheduler;

    fn setup(doc: &MemoryDocument) {
        let body = doc.body();
        let header = doc
            .append(body, ElementSpec::new("nav").class("navbar").height(70.0).fixed())
            .unwrap();
        doc.append(header, ElementSpec::new("a").class("nav-link").href("#home"))
            .unwrap();
        doc.append(body, ElementSpec::new("section").id("home").height(900.0))
            .unwrap();
    }

    #[test]
    fn test_minimal_page_subscriptions() {
        let doc = Rc::new(MemoryDocument::new(1280.0, 800.0));
        setup(&doc);
        let handle = mount(doc, Rc::new(ManualScheduler::new()), Config::default()).unwrap();

        let names: Vec<_> = handle.subscriptions().iter().map(|s| s.name).collect();
        assert_eq!(
            names,
            vec![
                "scroll.debounced-tick",
                "resize.debounced-tick",
                "navigate.anchor-click",
                "touch.start",
                "touch.move",
                "touch.end",
                "reveal.intersections",
            ]
        );
        assert!(handle.menu().is_none());
        assert!(handle.disclosure().is_none());
        assert!(handle.typewriter().is_none());
    }

    #[test]
    fn test_initial_tick_activates_first_section() {
        let doc = Rc::new(MemoryDocument::new(1280.0, 800.0));
        setup(&doc);
        let handle = mount(doc, Rc::new(ManualScheduler::new()), Config::default()).unwrap();
        assert_eq!(handle.nav().active_target().as_deref(), Some("home"));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let doc = Rc::new(MemoryDocument::new(1280.0, 800.0));
        let mut config = Config::default();
        config.reveal.threshold = 2.0;
        assert!(mount(doc, Rc::new(ManualScheduler::new()), config).is_err());
    }

    #[test]
    fn test_unmount_detaches() {
        let doc = Rc::new(MemoryDocument::new(1280.0, 800.0));
        setup(&doc);
        let scheduler = Rc::new(ManualScheduler::new());
        let handle = mount(doc, scheduler.clone(), Config::default()).unwrap();
        handle.dispatch(PageEvent::Scroll);
        assert!(handle.tick_pending());

        handle.unmount();
        assert_eq!(scheduler.advance(Duration::from_millis(20)), 0);
    }
}
