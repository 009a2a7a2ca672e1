use std::cell::RefCell;
use std::rc::{Rc, Weak};

use gloo::console;
use js_sys::Reflect;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Event, EventTarget};

use magnifier_core::{
    AttachOutcome, Dispatcher, ImageRole, MagnifierError, MagnifierOptions, ThumbId, ThumbOptions,
};

use crate::dom::{DomSurface, SurfaceHooks};
use crate::events::{self, AttachedListener, EventAdapter};
use crate::options;

struct Shared {
    dispatcher: RefCell<Dispatcher<DomSurface>>,
    document: Document,
    events: Rc<EventAdapter>,
    /// Document, window and thumbnail listeners; unregistered when dropped.
    listeners: RefCell<Vec<AttachedListener>>,
}

fn busy() -> JsValue {
    JsValue::from_str("magnifier is busy dispatching an event")
}

impl Shared {
    fn new(options: MagnifierOptions, document: Document) -> Rc<Self> {
        let events = Rc::new(EventAdapter::detect());
        let surface = DomSurface::new(document.clone(), events.clone());
        let shared = Rc::new(Self {
            dispatcher: RefCell::new(Dispatcher::new(options, surface)),
            document,
            events,
            listeners: RefCell::new(Vec::new()),
        });

        let on_loaded = Rc::downgrade(&shared);
        let on_wheel = Rc::downgrade(&shared);
        shared
            .dispatcher
            .borrow_mut()
            .surface_mut()
            .set_hooks(SurfaceHooks {
                on_image_loaded: Rc::new(move |id: ThumbId, role: ImageRole| {
                    if let Some(shared) = on_loaded.upgrade() {
                        shared.image_loaded(id, role);
                    }
                }),
                on_wheel: Rc::new(move |event: &Event| {
                    if let Some(shared) = on_wheel.upgrade() {
                        shared.wheel(event);
                    }
                }),
            });
        shared
    }

    fn listen<F>(
        self: &Rc<Self>,
        name: &str,
        target: &EventTarget,
        capture: bool,
        handler: F,
    ) -> Result<(), JsValue>
    where
        F: Fn(&Rc<Self>, &Event, &EventTarget) + 'static,
    {
        let weak: Weak<Self> = Rc::downgrade(self);
        let listener = self.events.attach(name, target, capture, move |event, source| {
            if let Some(shared) = weak.upgrade() {
                handler(&shared, event, source);
            }
        })?;
        self.listeners.borrow_mut().push(listener);
        Ok(())
    }

    fn image_loaded(&self, id: ThumbId, role: ImageRole) {
        let Ok(mut dispatcher) = self.dispatcher.try_borrow_mut() else {
            console::warn!("magnifier: image load arrived during dispatch", id.to_string());
            return;
        };
        match dispatcher.image_loaded(&id, role) {
            Ok(stage) => console::log!("magnifier:", id.to_string(), format!("{stage:?}")),
            Err(err) => console::warn!("magnifier:", err.to_string()),
        }
    }

    fn pointer_over(&self, captured: &ThumbId, event: &Event, source: &EventTarget) {
        let Some((x, y)) = events::client_position(event) else {
            return;
        };
        let Ok(mut dispatcher) = self.dispatcher.try_borrow_mut() else {
            return;
        };
        let id = source
            .dyn_ref::<Element>()
            .map(|element| ThumbId::new(element.id()))
            .filter(|id| dispatcher.registry().contains(id))
            .unwrap_or_else(|| captured.clone());
        let result = dispatcher.pointer_enter(id, x, y);
        drop(dispatcher);
        match result {
            Ok(notes) => notes.deliver(),
            Err(err) => console::warn!("magnifier:", err.to_string()),
        }
    }

    fn pointer_move(&self, event: &Event) {
        let Some((x, y)) = events::client_position(event) else {
            return;
        };
        let Ok(mut dispatcher) = self.dispatcher.try_borrow_mut() else {
            return;
        };
        let notes = dispatcher.pointer_move(x, y);
        drop(dispatcher);
        notes.deliver();
    }

    fn wheel(&self, event: &Event) {
        let direction = events::wheel_direction(event);
        let Ok(mut dispatcher) = self.dispatcher.try_borrow_mut() else {
            return;
        };
        let consumed = dispatcher.wheel(direction);
        drop(dispatcher);
        if let Some(notes) = consumed {
            events::prevent(event);
            events::stop(event);
            notes.deliver();
        }
    }

    fn viewport_scroll(&self) {
        if let Ok(mut dispatcher) = self.dispatcher.try_borrow_mut() {
            dispatcher.viewport_scroll();
        }
    }

    /// Returns whether the element was newly attached.
    fn set_element(
        self: &Rc<Self>,
        element: &Element,
        thumb: &ThumbOptions,
    ) -> Result<bool, JsValue> {
        let mut dispatcher = self.dispatcher.try_borrow_mut().map_err(|_| busy())?;
        let id = if element.id().is_empty() {
            let id = dispatcher.allocate_id();
            element.set_id(id.as_str());
            id
        } else {
            ThumbId::new(element.id())
        };
        if dispatcher.registry().contains(&id) {
            dispatcher.set_current(id);
            return Ok(false);
        }

        let attrs = options::thumb_attributes(element);
        let document = self.document.clone();
        let config = thumb
            .resolve(&attrs, dispatcher.options(), |wrapper| {
                options::measure_wrapper(&document, wrapper)
            })
            .map_err(|err| options::js_error(&err))?;
        dispatcher
            .surface_mut()
            .track_thumb(&id, element.clone(), config.thumb_src.clone());
        let outcome = dispatcher
            .attach(id.clone(), config)
            .map_err(|err| options::js_error(&err))?;
        drop(dispatcher);
        if outcome == AttachOutcome::AlreadyAttached {
            return Ok(false);
        }

        let captured = id.clone();
        self.listen("mouseover", element, false, move |shared, event, source| {
            shared.pointer_over(&captured, event, source);
        })?;
        console::log!("magnifier: attached", id.to_string());
        Ok(true)
    }

    fn thumbs(&self, config: &JsValue) -> Result<Vec<Element>, JsValue> {
        let missing = || options::js_error(&MagnifierError::MissingThumbnail);
        let thumb = Reflect::get(config, &JsValue::from_str("thumb")).map_err(|_| missing())?;
        let elements = if let Some(selector) = thumb.as_string() {
            let nodes = self.document.query_selector_all(&selector)?;
            (0..nodes.length())
                .filter_map(|index| nodes.item(index))
                .filter_map(|node| node.dyn_into::<Element>().ok())
                .collect()
        } else if let Some(element) = thumb.dyn_ref::<Element>() {
            vec![element.clone()]
        } else if thumb.is_object() {
            let length = options::number_field(&thumb, "length").unwrap_or(0.0) as u32;
            (0..length)
                .filter_map(|index| Reflect::get_u32(&thumb, index).ok())
                .filter_map(|value| value.dyn_into::<Element>().ok())
                .collect()
        } else {
            Vec::new()
        };
        if elements.is_empty() {
            return Err(missing());
        }
        Ok(elements)
    }
}

/// Magnifying-glass effect for a set of thumbnails.
#[wasm_bindgen]
pub struct Magnifier {
    shared: Rc<Shared>,
}

#[wasm_bindgen]
impl Magnifier {
    /// Accepts the instance defaults: `zoom`, `mode`, `zoomable`,
    /// `largeWrapper` and the `onthumb*`/`onzoom` callbacks.
    #[wasm_bindgen(constructor)]
    pub fn new(options: JsValue) -> Result<Magnifier, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let options = options::magnifier_options(&options, &document);
        let shared = Shared::new(options, document.clone());

        shared.listen("mousemove", &document, false, |shared, event, _| {
            shared.pointer_move(event);
        })?;
        shared.listen("scroll", &window, false, |shared, _, _| {
            shared.viewport_scroll();
        })?;
        Ok(Magnifier { shared })
    }

    /// Attaches every thumbnail named by `config.thumb`: a selector, an
    /// element, or a collection of elements.
    pub fn attach(&self, config: JsValue) -> Result<(), JsValue> {
        let elements = self.shared.thumbs(&config)?;
        let thumb = options::thumb_options(&config, &self.shared.document);
        for element in &elements {
            self.shared.set_element(element, &thumb)?;
        }
        Ok(())
    }

    /// Attaches the first thumbnail of `config.thumb`. Returns `false` when
    /// it was already attached, in which case only the current thumbnail
    /// changes.
    pub fn set(&self, config: JsValue) -> Result<bool, JsValue> {
        let elements = self.shared.thumbs(&config)?;
        let thumb = options::thumb_options(&config, &self.shared.document);
        match elements.first() {
            Some(element) => self.shared.set_element(element, &thumb),
            None => Err(options::js_error(&MagnifierError::MissingThumbnail)),
        }
    }

    /// Makes an attached thumbnail the one re-measured on scroll.
    #[wasm_bindgen(js_name = setThumb)]
    pub fn set_thumb(&self, thumb: &Element) -> bool {
        let id = ThumbId::new(thumb.id());
        let Ok(mut dispatcher) = self.shared.dispatcher.try_borrow_mut() else {
            return false;
        };
        if !dispatcher.registry().contains(&id) {
            return false;
        }
        dispatcher.set_current(id);
        true
    }

    /// Number of attached thumbnails.
    #[wasm_bindgen(getter)]
    pub fn size(&self) -> usize {
        self.shared
            .dispatcher
            .try_borrow()
            .map(|dispatcher| dispatcher.registry().len())
            .unwrap_or(0)
    }
}
