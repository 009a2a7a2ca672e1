//! Cross-browser event plumbing.
//!
//! Listener registration goes through one of two strategies picked once per
//! adapter: the `addEventListener` family, or the legacy handler-property
//! model (`attachEvent`, falling back to assigning `on<name>`). Either way the
//! listener receives a non-null event and the element it originated from.

use std::rc::Rc;

use js_sys::{Function, Reflect};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Event, EventTarget, MouseEvent, UiEvent, WheelEvent};

use magnifier_core::WheelDirection;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventModel {
    Modern,
    Legacy,
}

trait EventStrategy {
    fn model(&self) -> EventModel;

    fn event_name(&self, name: &str) -> String;

    fn register(
        &self,
        target: &EventTarget,
        event: &str,
        handler: &Function,
        capture: bool,
    ) -> Result<(), JsValue>;

    fn unregister(
        &self,
        target: &EventTarget,
        event: &str,
        handler: &Function,
        capture: bool,
    ) -> Result<(), JsValue>;
}

struct ModernEvents;

impl EventStrategy for ModernEvents {
    fn model(&self) -> EventModel {
        EventModel::Modern
    }

    fn event_name(&self, name: &str) -> String {
        name.to_string()
    }

    fn register(
        &self,
        target: &EventTarget,
        event: &str,
        handler: &Function,
        capture: bool,
    ) -> Result<(), JsValue> {
        target.add_event_listener_with_callback_and_bool(event, handler, capture)
    }

    fn unregister(
        &self,
        target: &EventTarget,
        event: &str,
        handler: &Function,
        capture: bool,
    ) -> Result<(), JsValue> {
        target.remove_event_listener_with_callback_and_bool(event, handler, capture)
    }
}

/// Bubble-only; the capture flag is ignored.
struct LegacyEvents;

impl EventStrategy for LegacyEvents {
    fn model(&self) -> EventModel {
        EventModel::Legacy
    }

    fn event_name(&self, name: &str) -> String {
        format!("on{name}")
    }

    fn register(
        &self,
        target: &EventTarget,
        event: &str,
        handler: &Function,
        _capture: bool,
    ) -> Result<(), JsValue> {
        if let Some(attach) = method(target, "attachEvent") {
            attach.call2(target, &JsValue::from_str(event), handler)?;
            return Ok(());
        }
        Reflect::set(target, &JsValue::from_str(event), handler)?;
        Ok(())
    }

    fn unregister(
        &self,
        target: &EventTarget,
        event: &str,
        handler: &Function,
        _capture: bool,
    ) -> Result<(), JsValue> {
        if let Some(detach) = method(target, "detachEvent") {
            detach.call2(target, &JsValue::from_str(event), handler)?;
            return Ok(());
        }
        let key = JsValue::from_str(event);
        let current = Reflect::get(target, &key)?;
        let handler: &JsValue = handler.as_ref();
        if &current == handler {
            Reflect::set(target, &key, &JsValue::NULL)?;
        }
        Ok(())
    }
}

/// Listener handed back by [`EventAdapter::attach`]. Dropping it removes the
/// registration with the name and capture flag it was attached with.
pub struct AttachedListener {
    closure: Closure<dyn FnMut(JsValue)>,
    target: EventTarget,
    event: String,
    capture: bool,
    strategy: Rc<dyn EventStrategy>,
}

impl AttachedListener {
    pub fn function(&self) -> &Function {
        self.closure.as_ref().unchecked_ref()
    }
}

impl Drop for AttachedListener {
    fn drop(&mut self) {
        let _ = self
            .strategy
            .unregister(&self.target, &self.event, self.function(), self.capture);
    }
}

pub struct EventAdapter {
    strategy: Rc<dyn EventStrategy>,
}

impl EventAdapter {
    /// Picks the strategy the current environment supports.
    pub fn detect() -> Self {
        let modern = web_sys::window()
            .map(|window| {
                Reflect::has(&window, &JsValue::from_str("addEventListener")).unwrap_or(false)
            })
            .unwrap_or(false);
        if modern {
            Self::modern()
        } else {
            Self::legacy()
        }
    }

    pub fn modern() -> Self {
        Self {
            strategy: Rc::new(ModernEvents),
        }
    }

    pub fn legacy() -> Self {
        Self {
            strategy: Rc::new(LegacyEvents),
        }
    }

    pub fn model(&self) -> EventModel {
        self.strategy.model()
    }

    pub fn attach<F>(
        &self,
        name: &str,
        target: &EventTarget,
        capture: bool,
        mut listener: F,
    ) -> Result<AttachedListener, JsValue>
    where
        F: FnMut(&Event, &EventTarget) + 'static,
    {
        let owner = target.clone();
        let closure = Closure::<dyn FnMut(JsValue)>::new(move |value: JsValue| {
            let Some(event) = normalize_event(value) else {
                return;
            };
            let source = source_element(&event).unwrap_or_else(|| owner.clone());
            listener(&event, &source);
        });
        let event = self.strategy.event_name(name);
        let function: &Function = closure.as_ref().unchecked_ref();
        self.strategy.register(target, &event, function, capture)?;
        Ok(AttachedListener {
            closure,
            target: target.clone(),
            event,
            capture,
            strategy: self.strategy.clone(),
        })
    }

    /// Removal only takes effect with the same name and capture flag that
    /// were used to attach.
    pub fn detach(
        &self,
        name: &str,
        target: &EventTarget,
        listener: &AttachedListener,
        capture: bool,
    ) -> Result<(), JsValue> {
        self.strategy.unregister(
            target,
            &self.strategy.event_name(name),
            listener.function(),
            capture,
        )
    }
}

fn method(target: &JsValue, name: &str) -> Option<Function> {
    Reflect::get(target, &JsValue::from_str(name))
        .ok()?
        .dyn_into::<Function>()
        .ok()
}

fn number_field(target: &JsValue, name: &str) -> Option<f64> {
    Reflect::get(target, &JsValue::from_str(name)).ok()?.as_f64()
}

/// Legacy handlers get no argument and read `window.event` instead.
fn normalize_event(value: JsValue) -> Option<Event> {
    let value = if value.is_undefined() || value.is_null() {
        let window = web_sys::window()?;
        Reflect::get(&window, &JsValue::from_str("event")).ok()?
    } else {
        value
    };
    if !value.is_object() {
        return None;
    }
    Some(value.unchecked_into::<Event>())
}

pub fn source_element(event: &Event) -> Option<EventTarget> {
    let legacy = Reflect::get(event, &JsValue::from_str("srcElement")).ok();
    if let Some(source) = legacy.filter(|value| value.is_object()) {
        return Some(source.unchecked_into::<EventTarget>());
    }
    event.target()
}

/// Halts bubbling in both event models.
pub fn stop(event: &Event) {
    let _ = Reflect::set(event, &JsValue::from_str("cancelBubble"), &JsValue::TRUE);
    if method(event, "stopPropagation").is_some() {
        event.stop_propagation();
    }
}

/// Suppresses the default action in both event models.
pub fn prevent(event: &Event) {
    if method(event, "preventDefault").is_some() {
        event.prevent_default();
    } else {
        let _ = Reflect::set(event, &JsValue::from_str("returnValue"), &JsValue::FALSE);
    }
}

pub fn client_position(event: &Event) -> Option<(f64, f64)> {
    if let Some(mouse) = event.dyn_ref::<MouseEvent>() {
        return Some((mouse.client_x() as f64, mouse.client_y() as f64));
    }
    Some((number_field(event, "clientX")?, number_field(event, "clientY")?))
}

/// Zoom-in when any of `wheelDelta`, `detail` or `deltaY` points up.
pub fn wheel_direction(event: &Event) -> WheelDirection {
    let wheel_delta = number_field(event, "wheelDelta").unwrap_or(0.0);
    let detail = event
        .dyn_ref::<UiEvent>()
        .map(|event| event.detail() as f64)
        .or_else(|| number_field(event, "detail"))
        .unwrap_or(0.0);
    let delta_y = event
        .dyn_ref::<WheelEvent>()
        .map(|event| event.delta_y())
        .unwrap_or(0.0);
    if wheel_delta > 0.0 || detail < 0.0 || delta_y < 0.0 {
        WheelDirection::In
    } else {
        WheelDirection::Out
    }
}
