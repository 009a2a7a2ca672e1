use crate::geometry::{LensPosition, Size, ThumbRect};
use crate::load::ImageRole;
use crate::registry::ThumbId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LensStyle {
    /// Placeholder shown while the large image is loading.
    Loader,
    /// Magnifying lens.
    Lens,
}

/// Where the large image is inserted once it has loaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LargePlacement {
    Lens,
    Wrapper(String),
}

/// Lens placement plus the background offset of the thumbnail crop it shows.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LensFrame {
    pub left: f64,
    pub top: f64,
    pub background_x: f64,
    pub background_y: f64,
}

impl LensFrame {
    pub fn new(position: LensPosition, background_x: f64, background_y: f64) -> Self {
        Self {
            left: position.left,
            top: position.top,
            background_x,
            background_y,
        }
    }
}

/// Layout reads and rendering writes the dispatcher needs from its host.
/// Writes are synchronous and idempotent.
pub trait RenderSurface {
    fn bounding_rect(&self, thumb: &ThumbId) -> Option<ThumbRect>;

    fn create_lens(&mut self, thumb: &ThumbId);

    /// Starts loading an image. Completion is reported back through
    /// `Dispatcher::image_loaded`.
    fn request_image(&mut self, thumb: &ThumbId, role: ImageRole, url: &str);

    fn show_loading(&mut self, thumb: &ThumbId, lens: Size);

    fn install_large(
        &mut self,
        thumb: &ThumbId,
        placement: &LargePlacement,
        lens: Size,
        large: Size,
    );

    fn set_lens_style(&mut self, thumb: &ThumbId, style: LensStyle, hidden: bool);

    fn set_large_hidden(&mut self, thumb: &ThumbId, hidden: bool);

    fn set_thumb_active(&mut self, thumb: &ThumbId, active: bool);

    fn place_lens(&mut self, thumb: &ThumbId, frame: LensFrame);

    fn resize_lens(&mut self, thumb: &ThumbId, size: Size);

    fn place_large(&mut self, thumb: &ThumbId, left: f64, top: f64);

    fn resize_large(&mut self, thumb: &ThumbId, size: Size);

    fn attach_zoom_listener(&mut self, thumb: &ThumbId);
}
