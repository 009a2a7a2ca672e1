use std::fmt;
use std::rc::Rc;

use serde::Deserialize;

use crate::error::MagnifierError;
use crate::geometry::{Size, DEFAULT_ZOOM};
use crate::registry::ThumbId;

pub const ATTR_ZOOM: &str = "data-zoom";
pub const ATTR_MODE: &str = "data-mode";
pub const ATTR_ZOOMABLE: &str = "data-zoomable";
pub const ATTR_LARGE_URL: &str = "data-large-img-url";
pub const ATTR_LARGE_WRAPPER: &str = "data-large-img-wrapper";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
pub enum DisplayMode {
    /// Magnified view rendered inside the lens.
    #[serde(rename = "inside")]
    Inline,
    /// Magnified view rendered in a separate wrapper surface.
    #[default]
    #[serde(rename = "outside")]
    External,
}

impl DisplayMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "inside" => Some(DisplayMode::Inline),
            "outside" => Some(DisplayMode::External),
            _ => None,
        }
    }
}

/// Extra values reported to `on_zoom` callbacks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoomSnapshot {
    pub zoom: f64,
    pub lens_width: f64,
    pub lens_height: f64,
}

/// Read-only view handed to user callbacks.
#[derive(Clone, Debug, PartialEq)]
pub struct HoverSnapshot {
    pub thumb: ThumbId,
    pub lens: String,
    pub large: Option<String>,
    pub x: f64,
    pub y: f64,
    pub zoom: Option<ZoomSnapshot>,
}

pub type HoverCallback = Rc<dyn Fn(&HoverSnapshot)>;

#[derive(Clone, Default)]
pub struct Callbacks {
    pub on_enter: Option<HoverCallback>,
    pub on_move: Option<HoverCallback>,
    pub on_leave: Option<HoverCallback>,
    pub on_zoom: Option<HoverCallback>,
}

impl Callbacks {
    /// Fills every unset callback from `fallback`.
    pub fn or(&self, fallback: &Callbacks) -> Callbacks {
        Callbacks {
            on_enter: self.on_enter.clone().or_else(|| fallback.on_enter.clone()),
            on_move: self.on_move.clone().or_else(|| fallback.on_move.clone()),
            on_leave: self.on_leave.clone().or_else(|| fallback.on_leave.clone()),
            on_zoom: self.on_zoom.clone().or_else(|| fallback.on_zoom.clone()),
        }
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_enter", &self.on_enter.is_some())
            .field("on_move", &self.on_move.is_some())
            .field("on_leave", &self.on_leave.is_some())
            .field("on_zoom", &self.on_zoom.is_some())
            .finish()
    }
}

/// Instance-wide defaults.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MagnifierOptions {
    pub zoom: f64,
    pub mode: DisplayMode,
    pub zoomable: bool,
    pub large_wrapper: Option<String>,
    #[serde(skip)]
    pub callbacks: Callbacks,
}

impl Default for MagnifierOptions {
    fn default() -> Self {
        Self {
            zoom: DEFAULT_ZOOM,
            mode: DisplayMode::External,
            zoomable: false,
            large_wrapper: None,
            callbacks: Callbacks::default(),
        }
    }
}

/// Per-call overrides passed to `attach`/`set`.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ThumbOptions {
    pub large: Option<String>,
    pub large_wrapper: Option<String>,
    pub zoom: Option<f64>,
    pub mode: Option<DisplayMode>,
    pub zoomable: Option<bool>,
    #[serde(skip)]
    pub callbacks: Callbacks,
}

/// What the thumbnail element itself carries: its image source and the
/// `data-*` overrides.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ThumbAttributes {
    pub src: String,
    pub zoom: Option<String>,
    pub mode: Option<String>,
    pub zoomable: Option<String>,
    pub large_url: Option<String>,
    pub large_wrapper: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WrapperInfo {
    pub id: String,
    pub size: Size,
}

/// Fully resolved configuration of one attached thumbnail.
#[derive(Clone, Debug)]
pub struct ThumbConfig {
    pub thumb_src: String,
    pub large_url: String,
    pub zoom: f64,
    pub mode: DisplayMode,
    pub zoomable: bool,
    pub wrapper: Option<WrapperInfo>,
    pub callbacks: Callbacks,
}

fn parse_zoom(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|zoom| zoom.is_finite() && *zoom > 0.0)
}

impl ThumbOptions {
    /// Resolves every field as explicit option, then element attribute,
    /// then instance default. `locate_wrapper` measures a wrapper by id and
    /// returns `None` when no such element exists.
    pub fn resolve(
        &self,
        attrs: &ThumbAttributes,
        defaults: &MagnifierOptions,
        locate_wrapper: impl Fn(&str) -> Option<Size>,
    ) -> Result<ThumbConfig, MagnifierError> {
        let zoom = self
            .zoom
            .filter(|zoom| zoom.is_finite() && *zoom > 0.0)
            .or_else(|| attrs.zoom.as_deref().and_then(parse_zoom))
            .unwrap_or(defaults.zoom);
        let mode = self
            .mode
            .or_else(|| attrs.mode.as_deref().and_then(DisplayMode::parse))
            .unwrap_or(defaults.mode);
        let zoomable = self
            .zoomable
            .or_else(|| attrs.zoomable.as_deref().map(|value| value == "true"))
            .unwrap_or(defaults.zoomable);
        let large_url = self
            .large
            .clone()
            .or_else(|| attrs.large_url.clone())
            .unwrap_or_else(|| attrs.src.clone());

        let wrapper = [
            self.large_wrapper.as_deref(),
            attrs.large_wrapper.as_deref(),
            defaults.large_wrapper.as_deref(),
        ]
        .into_iter()
        .flatten()
        .find_map(|id| {
            locate_wrapper(id).map(|size| WrapperInfo {
                id: id.to_string(),
                size,
            })
        });

        let wrapper = match mode {
            DisplayMode::Inline => None,
            DisplayMode::External => Some(wrapper.ok_or(MagnifierError::MissingLargeWrapper)?),
        };

        Ok(ThumbConfig {
            thumb_src: attrs.src.clone(),
            large_url,
            zoom,
            mode,
            zoomable,
            wrapper,
            callbacks: self.callbacks.or(&defaults.callbacks),
        })
    }
}
