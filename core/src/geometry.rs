use crate::config::DisplayMode;

pub const DEFAULT_ZOOM: f64 = 2.0;
pub const MIN_ZOOM: f64 = 1.1;
pub const ZOOM_STEP: f64 = 0.1;
/// Lens border width in px; the background offset skips it.
pub const LENS_BORDER_PX: f64 = 1.0;

/// Rounds halves towards positive infinity, the way layout code in the
/// browser rounds pixel values.
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Quantizes a zoom factor to one decimal place.
pub fn quantize_zoom(value: f64) -> f64 {
    round_half_up(value * 10.0) / 10.0
}

/// Viewport-relative bounding box, as reported by `getBoundingClientRect`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ThumbRect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl ThumbRect {
    pub fn from_origin_size(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            right: left + width,
            bottom: top + height,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WheelDirection {
    In,
    Out,
}

impl WheelDirection {
    pub fn delta(self) -> f64 {
        match self {
            WheelDirection::In => ZOOM_STEP,
            WheelDirection::Out => -ZOOM_STEP,
        }
    }
}

/// Cursor position relative to the thumbnail origin.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CursorOffset {
    pub x: f64,
    pub y: f64,
    pub in_bounds: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LensPosition {
    pub left: f64,
    pub top: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ZoomOutcome {
    /// Zoom changed; geometry was recomputed. Carries the zoom as shown to
    /// the user (scaled by the wrapper/thumbnail ratio in external mode).
    Applied {
        reported_zoom: f64,
        lens: LensPosition,
    },
    /// The step would have gone under the floor; zoom pinned to `MIN_ZOOM`.
    /// `lens` is set when pinning changed the zoom and geometry was
    /// recomputed.
    Floored { lens: Option<LensPosition> },
}

/// Live lens/large-image geometry of one thumbnail.
#[derive(Clone, Debug, PartialEq)]
pub struct Geometry {
    pub zoom: f64,
    pub mode: DisplayMode,
    pub wrapper: Option<Size>,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub lens_width: f64,
    pub lens_height: f64,
    pub lens_bg_x: f64,
    pub lens_bg_y: f64,
    pub large_width: f64,
    pub large_height: f64,
    pub large_left: f64,
    pub large_top: f64,
}

impl Geometry {
    pub fn new(zoom: f64, mode: DisplayMode, wrapper: Option<Size>) -> Self {
        Self {
            zoom,
            mode,
            wrapper,
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            lens_width: 0.0,
            lens_height: 0.0,
            lens_bg_x: 0.0,
            lens_bg_y: 0.0,
            large_width: 0.0,
            large_height: 0.0,
            large_left: 0.0,
            large_top: 0.0,
        }
    }

    pub fn lens_size(&self) -> Size {
        Size::new(self.lens_width, self.lens_height)
    }

    pub fn large_size(&self) -> Size {
        Size::new(self.large_width, self.large_height)
    }

    /// Box the large image is scaled against: the thumbnail itself inline,
    /// the wrapper surface otherwise.
    fn zoom_target(&self) -> Size {
        match (self.mode, self.wrapper) {
            (DisplayMode::External, Some(wrapper)) => wrapper,
            _ => Size::new(self.width, self.height),
        }
    }

    /// Ratio between the wrapper and the thumbnail; 1 for inline mode.
    pub fn multiplier(&self) -> f64 {
        match (self.mode, self.wrapper) {
            (DisplayMode::External, Some(wrapper)) => wrapper.width / self.width,
            _ => 1.0,
        }
    }

    pub fn set_bounds(&mut self, rect: ThumbRect) {
        self.x = rect.left;
        self.y = rect.top;
        self.width = round_half_up(rect.right - self.x);
        self.height = round_half_up(rect.bottom - self.y);
        self.update_zoomed_sizes();
    }

    fn update_zoomed_sizes(&mut self) {
        self.lens_width = round_half_up(self.width / self.zoom);
        self.lens_height = round_half_up(self.height / self.zoom);
        let target = self.zoom_target();
        self.large_width = round_half_up(self.zoom * target.width);
        self.large_height = round_half_up(self.zoom * target.height);
    }

    pub fn cursor_offset(&self, cursor_x: f64, cursor_y: f64) -> CursorOffset {
        let x = cursor_x - self.x;
        let y = cursor_y - self.y;
        let in_bounds = !(x < 0.0 || y < 0.0 || x > self.width || y > self.height);
        CursorOffset { x, y, in_bounds }
    }

    pub fn lens_position(&mut self, offset: CursorOffset) -> LensPosition {
        let half_w = self.lens_width / 2.0;
        let half_h = self.lens_height / 2.0;
        let mut left = offset.x - half_w;
        let mut top = offset.y - half_h;

        // The lens may overhang the thumbnail only when it carries the
        // magnified view itself.
        if self.mode != DisplayMode::Inline {
            let max_left = self.width - (self.lens_width + 2.0 * LENS_BORDER_PX);
            let max_top = self.height - (self.lens_height + 2.0 * LENS_BORDER_PX);
            if offset.x < half_w {
                left = 0.0;
            }
            if offset.y < half_h {
                top = 0.0;
            }
            if left > max_left {
                left = max_left;
            }
            if top > max_top {
                top = max_top;
            }
        }

        let position = LensPosition {
            left: round_half_up(left),
            top: round_half_up(top),
        };
        self.lens_bg_x = position.left + LENS_BORDER_PX;
        self.lens_bg_y = position.top + LENS_BORDER_PX;
        position
    }

    /// Must run after `lens_position`, external mode follows the lens
    /// background offset.
    pub fn large_position(&mut self, offset: CursorOffset) {
        match (self.mode, self.wrapper) {
            (DisplayMode::External, Some(wrapper)) => {
                self.large_left =
                    round_half_up(self.lens_bg_x * self.zoom * (wrapper.width / self.width));
                self.large_top =
                    round_half_up(self.lens_bg_y * self.zoom * (wrapper.height / self.height));
            }
            _ => {
                self.large_left =
                    round_half_up(offset.x * (self.zoom - self.lens_width / self.width));
                self.large_top =
                    round_half_up(offset.y * (self.zoom - self.lens_height / self.height));
            }
        }
    }

    /// Offset, lens and large-image positions for a cursor in viewport space.
    pub fn track(&mut self, cursor_x: f64, cursor_y: f64) -> (CursorOffset, LensPosition) {
        let offset = self.cursor_offset(cursor_x, cursor_y);
        let lens = self.lens_position(offset);
        self.large_position(offset);
        (offset, lens)
    }

    /// Steps the zoom one notch and re-tracks the cursor under the new lens.
    pub fn adjust_zoom(
        &mut self,
        direction: WheelDirection,
        cursor_x: f64,
        cursor_y: f64,
    ) -> ZoomOutcome {
        let next = quantize_zoom(self.zoom + direction.delta());
        if next < MIN_ZOOM {
            if self.zoom == MIN_ZOOM {
                return ZoomOutcome::Floored { lens: None };
            }
            self.zoom = MIN_ZOOM;
            self.update_zoomed_sizes();
            let (_, lens) = self.track(cursor_x, cursor_y);
            return ZoomOutcome::Floored { lens: Some(lens) };
        }
        self.zoom = next;
        self.update_zoomed_sizes();
        let (_, lens) = self.track(cursor_x, cursor_y);
        ZoomOutcome::Applied {
            reported_zoom: quantize_zoom(self.zoom * self.multiplier()),
            lens,
        }
    }
}
