//! Reading plain JS option objects and element attributes into the core
//! configuration types, and reporting core errors back as JS errors.

use std::cell::Cell;
use std::rc::Rc;

use gloo::console;
use js_sys::{Function, Object, Reflect};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlElement, HtmlImageElement};

use magnifier_core::config::{
    ATTR_LARGE_URL, ATTR_LARGE_WRAPPER, ATTR_MODE, ATTR_ZOOM, ATTR_ZOOMABLE,
};
use magnifier_core::{
    Callbacks, DisplayMode, HoverCallback, HoverSnapshot, MagnifierError, MagnifierOptions, Size,
    ThumbAttributes, ThumbOptions,
};

thread_local! {
    static NEXT_WRAPPER_ID: Cell<u32> = Cell::new(0);
}

fn field(source: &JsValue, name: &str) -> Option<JsValue> {
    if !source.is_object() {
        return None;
    }
    Reflect::get(source, &JsValue::from_str(name))
        .ok()
        .filter(|value| !value.is_undefined() && !value.is_null())
}

pub(crate) fn string_field(source: &JsValue, name: &str) -> Option<String> {
    field(source, name)?.as_string()
}

pub(crate) fn number_field(source: &JsValue, name: &str) -> Option<f64> {
    let value = field(source, name)?;
    value
        .as_f64()
        .or_else(|| value.as_string().and_then(|text| text.trim().parse().ok()))
}

fn bool_field(source: &JsValue, name: &str) -> Option<bool> {
    field(source, name)?.as_bool()
}

fn mode_field(source: &JsValue) -> Option<DisplayMode> {
    let mode = string_field(source, "mode")?;
    let parsed = DisplayMode::parse(&mode);
    if parsed.is_none() {
        console::warn!("magnifier: unknown mode", mode);
    }
    parsed
}

/// `largeWrapper` may be an element id or the element itself. Elements
/// without an id get one so the core can refer to them by name.
fn wrapper_field(source: &JsValue) -> Option<String> {
    let value = field(source, "largeWrapper")?;
    if let Some(id) = value.as_string() {
        return Some(id);
    }
    let element = value.dyn_into::<Element>().ok()?;
    if element.id().is_empty() {
        let n = NEXT_WRAPPER_ID.with(|next| {
            let n = next.get() + 1;
            next.set(n);
            n
        });
        element.set_id(&format!("magnifier-wrapper-{n}"));
    }
    Some(element.id())
}

pub(crate) fn magnifier_options(source: &JsValue, document: &Document) -> MagnifierOptions {
    let defaults = MagnifierOptions::default();
    MagnifierOptions {
        zoom: number_field(source, "zoom")
            .filter(|zoom| zoom.is_finite() && *zoom > 0.0)
            .unwrap_or(defaults.zoom),
        mode: mode_field(source).unwrap_or(defaults.mode),
        zoomable: bool_field(source, "zoomable").unwrap_or(defaults.zoomable),
        large_wrapper: wrapper_field(source),
        callbacks: callbacks(source, document),
    }
}

pub(crate) fn thumb_options(source: &JsValue, document: &Document) -> ThumbOptions {
    ThumbOptions {
        large: string_field(source, "large"),
        large_wrapper: wrapper_field(source),
        zoom: number_field(source, "zoom"),
        mode: mode_field(source),
        zoomable: bool_field(source, "zoomable"),
        callbacks: callbacks(source, document),
    }
}

fn callbacks(source: &JsValue, document: &Document) -> Callbacks {
    Callbacks {
        on_enter: callback(source, "onthumbenter", document),
        on_move: callback(source, "onthumbmove", document),
        on_leave: callback(source, "onthumbleave", document),
        on_zoom: callback(source, "onzoom", document),
    }
}

fn callback(source: &JsValue, name: &str, document: &Document) -> Option<HoverCallback> {
    let function = field(source, name)?.dyn_into::<Function>().ok()?;
    let document = document.clone();
    let name = name.to_string();
    Some(Rc::new(move |snapshot: &HoverSnapshot| {
        let data = snapshot_object(snapshot, &document);
        if let Err(err) = function.call1(&JsValue::NULL, &data) {
            console::warn!("magnifier: callback threw", name.clone(), err);
        }
    }))
}

fn element_or_null(document: &Document, id: &str) -> JsValue {
    document
        .get_element_by_id(id)
        .map(JsValue::from)
        .unwrap_or(JsValue::NULL)
}

fn snapshot_object(snapshot: &HoverSnapshot, document: &Document) -> JsValue {
    let data = Object::new();
    let set = |key: &str, value: &JsValue| {
        let _ = Reflect::set(&data, &JsValue::from_str(key), value);
    };
    set("thumb", &element_or_null(document, snapshot.thumb.as_str()));
    set("lens", &element_or_null(document, &snapshot.lens));
    let large = snapshot
        .large
        .as_deref()
        .map(|id| element_or_null(document, id))
        .unwrap_or(JsValue::NULL);
    set("large", &large);
    set("x", &JsValue::from_f64(snapshot.x));
    set("y", &JsValue::from_f64(snapshot.y));
    if let Some(zoom) = snapshot.zoom {
        set("zoom", &JsValue::from_f64(zoom.zoom));
        set("w", &JsValue::from_f64(zoom.lens_width));
        set("h", &JsValue::from_f64(zoom.lens_height));
    }
    data.into()
}

pub(crate) fn thumb_attributes(thumb: &Element) -> ThumbAttributes {
    let src = match thumb.dyn_ref::<HtmlImageElement>() {
        Some(image) => image.src(),
        None => thumb.get_attribute("src").unwrap_or_default(),
    };
    ThumbAttributes {
        src,
        zoom: thumb.get_attribute(ATTR_ZOOM),
        mode: thumb.get_attribute(ATTR_MODE),
        zoomable: thumb.get_attribute(ATTR_ZOOMABLE),
        large_url: thumb.get_attribute(ATTR_LARGE_URL),
        large_wrapper: thumb.get_attribute(ATTR_LARGE_WRAPPER),
    }
}

/// Layout size of a wrapper element, or `None` when the id is unknown.
pub(crate) fn measure_wrapper(document: &Document, id: &str) -> Option<Size> {
    let wrapper = document
        .get_element_by_id(id)?
        .dyn_into::<HtmlElement>()
        .ok()?;
    Some(Size::new(
        wrapper.offset_width() as f64,
        wrapper.offset_height() as f64,
    ))
}

pub(crate) fn js_error(err: &MagnifierError) -> JsValue {
    let error = js_sys::Error::new(&err.to_string());
    error.set_name(err.name());
    error.into()
}
