use std::collections::HashMap;
use std::rc::Rc;

use gloo::console;
use gloo::events::EventListener;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, Event, HtmlElement, HtmlImageElement};

use magnifier_core::{
    ImageRole, LargePlacement, LensFrame, LensStyle, RenderSurface, Size, ThumbId, ThumbRect,
};

use crate::events::{AttachedListener, EventAdapter, EventModel};

const LOADER_CLASS: &str = "magnifier-loader";
const LOADER_TEXT_CLASS: &str = "magnifier-loader-text";
const LENS_CLASS: &str = "magnifier-lens";
const LARGE_CLASS: &str = "magnifier-large";
const HIDDEN_CLASS: &str = "hidden";
const OPAQUE_CLASS: &str = "opaque";
const LOADING_TEXT: &str = "Loading...";

/// Signals the surface forwards to whoever drives the dispatcher.
pub(crate) struct SurfaceHooks {
    pub(crate) on_image_loaded: Rc<dyn Fn(ThumbId, ImageRole)>,
    pub(crate) on_wheel: Rc<dyn Fn(&Event)>,
}

struct ThumbElements {
    thumb: Element,
    src: String,
    base_class: String,
    lens: Option<HtmlElement>,
    large: Option<HtmlImageElement>,
    wheel: Option<AttachedListener>,
}

struct PendingImage {
    image: HtmlImageElement,
    _load: AttachedListener,
    _error: EventListener,
}

pub(crate) struct DomSurface {
    document: Document,
    events: Rc<EventAdapter>,
    thumbs: HashMap<ThumbId, ThumbElements>,
    images: HashMap<(ThumbId, ImageRole), PendingImage>,
    hooks: Option<SurfaceHooks>,
}

fn report<T>(result: Result<T, JsValue>, what: &str) {
    if let Err(err) = result {
        console::warn!("magnifier:", what, err);
    }
}

fn class_with(base: &str, extra: &str, enabled: bool) -> String {
    if enabled {
        format!("{base} {extra}")
    } else {
        base.to_string()
    }
}

fn set_style(element: &HtmlElement, property: &str, value: &str) {
    report(element.style().set_property(property, value), property);
}

fn set_size(element: &HtmlElement, size: Size) {
    set_style(element, "width", &format!("{}px", size.width));
    set_style(element, "height", &format!("{}px", size.height));
}

impl DomSurface {
    pub(crate) fn new(document: Document, events: Rc<EventAdapter>) -> Self {
        Self {
            document,
            events,
            thumbs: HashMap::new(),
            images: HashMap::new(),
            hooks: None,
        }
    }

    pub(crate) fn set_hooks(&mut self, hooks: SurfaceHooks) {
        self.hooks = Some(hooks);
    }

    pub(crate) fn track_thumb(&mut self, id: &ThumbId, thumb: Element, src: String) {
        let base_class = thumb.class_name();
        self.thumbs.insert(
            id.clone(),
            ThumbElements {
                thumb,
                src,
                base_class,
                lens: None,
                large: None,
                wheel: None,
            },
        );
    }

    fn lens(&self, id: &ThumbId) -> Option<&HtmlElement> {
        self.thumbs.get(id).and_then(|entry| entry.lens.as_ref())
    }

    fn large(&self, id: &ThumbId) -> Option<&HtmlImageElement> {
        self.thumbs.get(id).and_then(|entry| entry.large.as_ref())
    }

    fn create_div(&self, class: &str) -> Option<HtmlElement> {
        match self.document.create_element("div") {
            Ok(element) => {
                element.set_class_name(class);
                element.dyn_into::<HtmlElement>().ok()
            }
            Err(err) => {
                console::warn!("magnifier: create element failed", err);
                None
            }
        }
    }
}

impl RenderSurface for DomSurface {
    fn bounding_rect(&self, thumb: &ThumbId) -> Option<ThumbRect> {
        let rect = self.thumbs.get(thumb)?.thumb.get_bounding_client_rect();
        Some(ThumbRect {
            left: rect.left(),
            top: rect.top(),
            right: rect.right(),
            bottom: rect.bottom(),
        })
    }

    fn create_lens(&mut self, thumb: &ThumbId) {
        let Some(lens) = self.create_div(&class_with(LOADER_CLASS, HIDDEN_CLASS, true)) else {
            return;
        };
        let Some(entry) = self.thumbs.get_mut(thumb) else {
            console::warn!("magnifier: no element for", thumb.to_string());
            return;
        };
        lens.set_id(&thumb.lens_id());
        if let Some(parent) = entry.thumb.parent_node() {
            report(parent.append_child(&lens), "lens insert");
        }
        entry.lens = Some(lens);
    }

    fn request_image(&mut self, thumb: &ThumbId, role: ImageRole, url: &str) {
        let Some(hooks) = self.hooks.as_ref() else {
            console::warn!("magnifier: image requested before hooks were installed");
            return;
        };
        let image = match HtmlImageElement::new() {
            Ok(image) => image,
            Err(err) => {
                console::warn!("magnifier: image element failed", err);
                return;
            }
        };

        let on_loaded = hooks.on_image_loaded.clone();
        let loaded_id = thumb.clone();
        let load = match self.events.attach("load", &image, true, move |_, _| {
            on_loaded(loaded_id.clone(), role);
        }) {
            Ok(listener) => listener,
            Err(err) => {
                console::warn!("magnifier: load listener failed", err);
                return;
            }
        };
        let failed_id = thumb.to_string();
        let failed_url = url.to_string();
        let error = EventListener::new(&image, "error", move |_| {
            console::warn!(
                "magnifier: image failed to load",
                failed_id.clone(),
                failed_url.clone()
            );
        });

        image.set_src(url);
        self.images.insert(
            (thumb.clone(), role),
            PendingImage {
                image,
                _load: load,
                _error: error,
            },
        );
    }

    fn show_loading(&mut self, thumb: &ThumbId, lens_size: Size) {
        let Some(text) = self.create_div(LOADER_TEXT_CLASS) else {
            return;
        };
        let Some(lens) = self.lens(thumb) else {
            return;
        };
        text.set_text_content(Some(LOADING_TEXT));
        report(lens.append_child(&text), "loader text insert");
        lens.set_class_name(&class_with(LOADER_CLASS, HIDDEN_CLASS, true));
        set_size(lens, lens_size);
    }

    fn install_large(
        &mut self,
        thumb: &ThumbId,
        placement: &LargePlacement,
        lens_size: Size,
        large_size: Size,
    ) {
        // The image stays registered; its load listener may still be running.
        let Some(large) = self
            .images
            .get(&(thumb.clone(), ImageRole::Large))
            .map(|pending| pending.image.clone())
        else {
            return;
        };
        let Some(entry) = self.thumbs.get_mut(thumb) else {
            return;
        };
        let Some(lens) = entry.lens.as_ref() else {
            return;
        };

        lens.set_class_name(&class_with(LENS_CLASS, HIDDEN_CLASS, true));
        if let Some(child) = lens.first_child() {
            report(lens.remove_child(&child), "loader text removal");
        }
        set_style(
            lens,
            "background",
            &format!("url({}) no-repeat 0 0 scroll", entry.src),
        );

        large.set_id(&thumb.large_id());
        set_size(&large, large_size);
        large.set_class_name(&class_with(LARGE_CLASS, HIDDEN_CLASS, true));
        match placement {
            LargePlacement::Lens => report(lens.append_child(&large), "large insert"),
            LargePlacement::Wrapper(wrapper_id) => {
                match self.document.get_element_by_id(wrapper_id) {
                    Some(wrapper) => report(wrapper.append_child(&large), "large insert"),
                    None => console::warn!("magnifier: wrapper disappeared", wrapper_id.clone()),
                }
            }
        }
        set_size(lens, lens_size);
        entry.large = Some(large);
    }

    fn set_lens_style(&mut self, thumb: &ThumbId, style: LensStyle, hidden: bool) {
        let base = match style {
            LensStyle::Loader => LOADER_CLASS,
            LensStyle::Lens => LENS_CLASS,
        };
        if let Some(lens) = self.lens(thumb) {
            lens.set_class_name(&class_with(base, HIDDEN_CLASS, hidden));
        }
    }

    fn set_large_hidden(&mut self, thumb: &ThumbId, hidden: bool) {
        if let Some(large) = self.large(thumb) {
            large.set_class_name(&class_with(LARGE_CLASS, HIDDEN_CLASS, hidden));
        }
    }

    fn set_thumb_active(&mut self, thumb: &ThumbId, active: bool) {
        if let Some(entry) = self.thumbs.get(thumb) {
            let class = match (entry.base_class.is_empty(), active) {
                (true, true) => OPAQUE_CLASS.to_string(),
                (true, false) => String::new(),
                (false, _) => class_with(&entry.base_class, OPAQUE_CLASS, active),
            };
            entry.thumb.set_class_name(&class);
        }
    }

    fn place_lens(&mut self, thumb: &ThumbId, frame: LensFrame) {
        let Some(lens) = self.lens(thumb) else {
            return;
        };
        set_style(lens, "left", &format!("{}px", frame.left));
        set_style(lens, "top", &format!("{}px", frame.top));
        set_style(
            lens,
            "background-position",
            &format!("-{}px -{}px", frame.background_x, frame.background_y),
        );
    }

    fn resize_lens(&mut self, thumb: &ThumbId, size: Size) {
        if let Some(lens) = self.lens(thumb) {
            set_size(lens, size);
        }
    }

    fn place_large(&mut self, thumb: &ThumbId, left: f64, top: f64) {
        let Some(large) = self.large(thumb) else {
            return;
        };
        set_style(large, "left", &format!("-{left}px"));
        set_style(large, "top", &format!("-{top}px"));
    }

    fn resize_large(&mut self, thumb: &ThumbId, size: Size) {
        if let Some(large) = self.large(thumb) {
            set_size(large, size);
        }
    }

    fn attach_zoom_listener(&mut self, thumb: &ThumbId) {
        let Some(on_wheel) = self.hooks.as_ref().map(|hooks| hooks.on_wheel.clone()) else {
            return;
        };
        let name = match self.events.model() {
            EventModel::Modern => "wheel",
            EventModel::Legacy => "mousewheel",
        };
        let Some(entry) = self.thumbs.get_mut(thumb) else {
            return;
        };
        let Some(lens) = entry.lens.as_ref() else {
            return;
        };
        if entry.wheel.is_some() {
            return;
        }
        match self
            .events
            .attach(name, lens, true, move |event, _| on_wheel(event))
        {
            Ok(listener) => entry.wheel = Some(listener),
            Err(err) => console::warn!("magnifier: wheel listener failed", err),
        }
    }
}
