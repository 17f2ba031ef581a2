//! Web host - binds a mounted page to the browser (feature `web`)
//!
//! [`WebDocument`] implements the `Document` contract over `web-sys`,
//! [`WebScheduler`] implements `Scheduler` with `gloo` timeouts, and
//! [`start`] wires window/document listeners and an `IntersectionObserver`
//! into [`MountHandle::dispatch`].
//!
//! ```ignore
//! // JavaScript
//! import init, { start } from "./pagesync.js";
//! await init();
//! start();
//! ```

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use std::time::Duration;

use gloo::events::{EventListener, EventListenerOptions, EventListenerPhase};
use gloo::timers::callback::Timeout;
use log::{debug, error, info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    Element, Event, HtmlElement, IntersectionObserver, IntersectionObserverEntry,
    IntersectionObserverInit, ScrollToOptions, TouchEvent, Window,
};

use crate::config::{Config, RevealStrategy};
use crate::dom::Document;
use crate::error::{Error, Result};
use crate::pipeline::{mount, MountHandle, PageEvent};
use crate::state::IntersectionEntry;
use crate::timer::{Scheduler, TimerCallback, TimerId};
use crate::types::{ElementId, Rect, ScrollBehavior};

/// Attribute on `<html>` holding JSON configuration overrides.
pub const CONFIG_ATTRIBUTE: &str = "data-pagesync";

fn host_error(context: &str, value: JsValue) -> Error {
    Error::Host(format!("{context}: {value:?}"))
}

// =============================================================================
// WEB DOCUMENT
// =============================================================================

/// The browser document behind the `Document` contract.
///
/// Elements get stable handles on first sight; the same DOM node always maps
/// to the same [`ElementId`].
pub struct WebDocument {
    window: Window,
    document: web_sys::Document,
    elements: RefCell<Vec<Element>>,
}

impl WebDocument {
    /// Bind to the current window.
    ///
    /// # Errors
    ///
    /// [`Error::Host`] outside a browser window.
    pub fn new() -> Result<Self> {
        let window = web_sys::window().ok_or_else(|| Error::Host("no window".to_string()))?;
        let document = window
            .document()
            .ok_or_else(|| Error::Host("no document".to_string()))?;
        Ok(Self {
            window,
            document,
            elements: RefCell::new(Vec::new()),
        })
    }

    /// Handle for `element`, registering it on first use.
    pub fn id_for(&self, element: &Element) -> ElementId {
        let mut elements = self.elements.borrow_mut();
        if let Some(index) = elements.iter().position(|known| known == element) {
            return ElementId::new(index);
        }
        elements.push(element.clone());
        ElementId::new(elements.len() - 1)
    }

    pub fn element(&self, element: ElementId) -> Option<Element> {
        self.elements.borrow().get(element.index()).cloned()
    }

    /// JSON overrides from `<html data-pagesync="...">`, or defaults.
    ///
    /// # Errors
    ///
    /// Parse and validation errors from [`Config::from_json`].
    pub fn config(&self) -> Result<Config> {
        match self
            .document
            .document_element()
            .and_then(|root| root.get_attribute(CONFIG_ATTRIBUTE))
        {
            Some(json) => Config::from_json(&json),
            None => Ok(Config::default()),
        }
    }

    pub fn supports_intersection_observer(&self) -> bool {
        js_sys::Reflect::has(&self.window, &JsValue::from_str("IntersectionObserver"))
            .unwrap_or(false)
    }

    fn with_element<T>(&self, element: ElementId, f: impl FnOnce(&Element) -> T) -> Option<T> {
        self.element(element).map(|el| f(&el))
    }

    fn report(&self, context: &str, result: std::result::Result<(), JsValue>) {
        if let Err(value) = result {
            error!("{}", host_error(context, value));
        }
    }
}

impl Document for WebDocument {
    fn query_all(&self, selector: &str) -> Vec<ElementId> {
        let list = match self.document.query_selector_all(selector) {
            Ok(list) => list,
            Err(value) => {
                error!("{}", host_error(selector, value));
                return Vec::new();
            }
        };
        (0..list.length())
            .filter_map(|i| list.get(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .map(|element| self.id_for(&element))
            .collect()
    }

    fn element_by_id(&self, id: &str) -> Option<ElementId> {
        self.document
            .get_element_by_id(id)
            .map(|element| self.id_for(&element))
    }

    fn contains(&self, ancestor: ElementId, node: ElementId) -> bool {
        match (self.element(ancestor), self.element(node)) {
            (Some(ancestor), Some(node)) => {
                let node: &web_sys::Node = &node;
                ancestor.contains(Some(node))
            }
            _ => false,
        }
    }

    fn attribute(&self, element: ElementId, name: &str) -> Option<String> {
        self.element(element)?.get_attribute(name)
    }

    fn set_attribute(&self, element: ElementId, name: &str, value: &str) {
        if let Some(result) = self.with_element(element, |el| el.set_attribute(name, value)) {
            self.report(name, result);
        }
    }

    fn has_class(&self, element: ElementId, class: &str) -> bool {
        self.with_element(element, |el| el.class_list().contains(class))
            .unwrap_or(false)
    }

    fn add_class(&self, element: ElementId, class: &str) {
        if let Some(result) = self.with_element(element, |el| el.class_list().add_1(class)) {
            self.report(class, result);
        }
    }

    fn remove_class(&self, element: ElementId, class: &str) {
        if let Some(result) = self.with_element(element, |el| el.class_list().remove_1(class)) {
            self.report(class, result);
        }
    }

    fn set_style(&self, element: ElementId, property: &str, value: &str) {
        let result = self.with_element(element, |el| {
            el.dyn_ref::<HtmlElement>()
                .map(|html| html.style().set_property(property, value))
        });
        if let Some(Some(result)) = result {
            self.report(property, result);
        }
    }

    fn text(&self, element: ElementId) -> String {
        self.with_element(element, |el| el.text_content())
            .flatten()
            .unwrap_or_default()
    }

    fn set_text(&self, element: ElementId, text: &str) {
        self.with_element(element, |el| el.set_text_content(Some(text)));
    }

    fn rect(&self, element: ElementId) -> Rect {
        let scroll_y = self.scroll_y();
        self.with_element(element, |el| {
            let client = el.get_bounding_client_rect();
            Rect::new(client.top() + scroll_y, client.height())
        })
        .unwrap_or_default()
    }

    fn scroll_y(&self) -> f64 {
        self.window.scroll_y().unwrap_or(0.0)
    }

    fn viewport_height(&self) -> f64 {
        self.window
            .inner_height()
            .ok()
            .and_then(|value| value.as_f64())
            .unwrap_or(0.0)
    }

    fn document_height(&self) -> f64 {
        self.document
            .document_element()
            .map_or(0.0, |root| f64::from(root.scroll_height()))
    }

    fn scroll_to(&self, top: f64, behavior: ScrollBehavior) {
        let options = ScrollToOptions::new();
        options.set_top(top);
        options.set_behavior(match behavior {
            ScrollBehavior::Instant => web_sys::ScrollBehavior::Instant,
            ScrollBehavior::Smooth => web_sys::ScrollBehavior::Smooth,
        });
        self.window.scroll_to_with_scroll_to_options(&options);
    }
}

// =============================================================================
// WEB SCHEDULER
// =============================================================================

#[derive(Default)]
struct Timers {
    next_id: Cell<u64>,
    live: RefCell<HashMap<TimerId, Timeout>>,
    /// Fired timers, removed later: a `Timeout` must not be dropped from
    /// inside its own callback.
    fired: RefCell<Vec<TimerId>>,
}

impl Timers {
    fn purge_fired(&self) {
        let fired: Vec<TimerId> = self.fired.borrow_mut().drain(..).collect();
        let mut live = self.live.borrow_mut();
        for id in fired {
            live.remove(&id);
        }
    }
}

/// `Scheduler` backed by `setTimeout` through `gloo`.
#[derive(Default)]
pub struct WebScheduler {
    timers: Rc<Timers>,
}

impl WebScheduler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Scheduler for WebScheduler {
    fn set_timeout(&self, delay: Duration, callback: TimerCallback) -> TimerId {
        self.timers.purge_fired();

        let id = TimerId::new(self.timers.next_id.get());
        self.timers.next_id.set(id.raw() + 1);

        let weak: Weak<Timers> = Rc::downgrade(&self.timers);
        let millis = u32::try_from(delay.as_millis()).unwrap_or(u32::MAX);
        let timeout = Timeout::new(millis, move || {
            callback();
            if let Some(timers) = weak.upgrade() {
                timers.fired.borrow_mut().push(id);
            }
        });
        self.timers.live.borrow_mut().insert(id, timeout);
        id
    }

    fn clear_timeout(&self, id: TimerId) {
        self.timers.purge_fired();
        // Dropping a gloo Timeout cancels it.
        self.timers.live.borrow_mut().remove(&id);
    }
}

// =============================================================================
// APP
// =============================================================================

struct WebApp {
    handle: Rc<MountHandle>,
    _listeners: Vec<EventListener>,
    observer: Option<IntersectionObserver>,
    _observer_callback: Option<Closure<dyn FnMut(js_sys::Array, IntersectionObserver)>>,
}

thread_local! {
    static APP: RefCell<Option<WebApp>> = const { RefCell::new(None) };
}

fn active_listener<F>(target: &web_sys::EventTarget, event: &'static str, callback: F) -> EventListener
where
    F: FnMut(&Event) + 'static,
{
    EventListener::new_with_options(
        target,
        event,
        EventListenerOptions {
            phase: EventListenerPhase::Bubble,
            passive: false,
        },
        callback,
    )
}

fn install_listeners(document: &Rc<WebDocument>, handle: &Rc<MountHandle>) -> Vec<EventListener> {
    let mut listeners = Vec::new();

    for name in ["scroll", "resize"] {
        let h = handle.clone();
        let event = if name == "scroll" { PageEvent::Scroll } else { PageEvent::Resize };
        listeners.push(EventListener::new(&document.window, name, move |_| {
            h.dispatch(event.clone());
        }));
    }

    let (h, doc) = (handle.clone(), document.clone());
    listeners.push(active_listener(&document.document, "click", move |event| {
        let Some(target) = event.target().and_then(|t| t.dyn_into::<Element>().ok()) else {
            return;
        };
        let outcome = h.dispatch(PageEvent::Click {
            target: doc.id_for(&target),
        });
        if outcome.default_prevented {
            event.prevent_default();
        }
    }));

    let first_touch_y = |event: &Event| {
        event
            .dyn_ref::<TouchEvent>()
            .and_then(|touch| touch.touches().get(0))
            .map(|touch| f64::from(touch.client_y()))
    };

    let h = handle.clone();
    listeners.push(active_listener(&document.document, "touchstart", move |event| {
        if let Some(client_y) = first_touch_y(event) {
            h.dispatch(PageEvent::TouchStart { client_y });
        }
    }));

    let h = handle.clone();
    listeners.push(active_listener(&document.document, "touchmove", move |event| {
        if let Some(client_y) = first_touch_y(event) {
            if h.dispatch(PageEvent::TouchMove { client_y }).default_prevented {
                event.prevent_default();
            }
        }
    }));

    let h = handle.clone();
    listeners.push(EventListener::new(&document.document, "touchend", move |_| {
        h.dispatch(PageEvent::TouchEnd);
    }));

    listeners
}

fn install_observer(
    document: &Rc<WebDocument>,
    handle: &Rc<MountHandle>,
) -> Result<(IntersectionObserver, Closure<dyn FnMut(js_sys::Array, IntersectionObserver)>)> {
    let (h, doc) = (handle.clone(), document.clone());
    let callback = Closure::<dyn FnMut(js_sys::Array, IntersectionObserver)>::new(
        move |entries: js_sys::Array, observer: IntersectionObserver| {
            let batch: Vec<(Element, IntersectionEntry)> = entries
                .iter()
                .filter_map(|value| value.dyn_into::<IntersectionObserverEntry>().ok())
                .map(|entry| {
                    let target = entry.target();
                    let element = doc.id_for(&target);
                    (
                        target,
                        IntersectionEntry {
                            element,
                            ratio: entry.intersection_ratio(),
                            is_intersecting: entry.is_intersecting(),
                        },
                    )
                })
                .collect();

            h.dispatch(PageEvent::Intersections(
                batch.iter().map(|(_, entry)| *entry).collect(),
            ));
            for (target, entry) in &batch {
                if h.is_revealed(entry.element) {
                    observer.unobserve(target);
                }
            }
        },
    );

    let (margin, threshold, observed) = {
        let reveal = handle.reveal();
        (reveal.root_margin(), reveal.threshold(), reveal.observed())
    };
    let init = IntersectionObserverInit::new();
    init.set_root_margin(&margin);
    init.set_threshold(&JsValue::from_f64(threshold));

    let observer = IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init)
        .map_err(|value| host_error("IntersectionObserver", value))?;
    for element in observed {
        if let Some(el) = document.element(element) {
            observer.observe(&el);
        }
    }
    debug!("intersection observer installed ({margin}, {threshold})");
    Ok((observer, callback))
}

/// Mount pagesync on the current page and keep it running.
///
/// Calling it again replaces the previous instance.
///
/// # Errors
///
/// Configuration and host errors, as strings.
#[wasm_bindgen]
pub fn start() -> std::result::Result<(), JsValue> {
    stop();
    start_app().map_err(|err| JsValue::from_str(&err.to_string()))
}

fn start_app() -> Result<()> {
    let document = Rc::new(WebDocument::new()?);
    let mut config = document.config()?;
    if config.reveal.strategy == RevealStrategy::Observer && !document.supports_intersection_observer() {
        warn!("IntersectionObserver unavailable; polling for reveals");
        config.reveal.strategy = RevealStrategy::Poll;
    }
    let strategy = config.reveal.strategy;

    let handle = Rc::new(mount(document.clone(), Rc::new(WebScheduler::new()), config)?);
    let listeners = install_listeners(&document, &handle);
    let (observer, callback) = match strategy {
        RevealStrategy::Observer => {
            let (observer, callback) = install_observer(&document, &handle)?;
            (Some(observer), Some(callback))
        }
        RevealStrategy::Poll => (None, None),
    };

    APP.with(|app| {
        *app.borrow_mut() = Some(WebApp {
            handle,
            _listeners: listeners,
            observer,
            _observer_callback: callback,
        });
    });
    info!("pagesync started");
    Ok(())
}

/// Detach every listener and unmount.
#[wasm_bindgen]
pub fn stop() {
    let Some(app) = APP.with(|app| app.borrow_mut().take()) else {
        return;
    };
    let WebApp {
        handle,
        _listeners: listeners,
        observer,
        _observer_callback: callback,
    } = app;
    if let Some(observer) = observer {
        observer.disconnect();
    }
    // Listeners and the observer callback hold handle clones.
    drop(listeners);
    drop(callback);
    match Rc::try_unwrap(handle) {
        Ok(handle) => handle.unmount(),
        Err(_) => warn!("pagesync handle still shared; listeners detached only"),
    }
}
