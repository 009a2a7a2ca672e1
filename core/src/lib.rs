pub mod config;
pub mod dispatcher;
pub mod error;
pub mod geometry;
pub mod load;
pub mod registry;
pub mod surface;

pub use config::{
    Callbacks, DisplayMode, HoverCallback, HoverSnapshot, MagnifierOptions, ThumbAttributes,
    ThumbConfig, ThumbOptions, WrapperInfo, ZoomSnapshot,
};
pub use dispatcher::{AttachOutcome, Dispatcher, HoverKind, Notification, Notifications, Session};
pub use error::{MagnifierError, ERROR_NAME};
pub use geometry::{
    CursorOffset, Geometry, LensPosition, Size, ThumbRect, WheelDirection, ZoomOutcome,
    DEFAULT_ZOOM, MIN_ZOOM,
};
pub use load::{ImageRole, LoadStage};
pub use registry::{Registry, ThumbId, ThumbnailState};
pub use surface::{LargePlacement, LensFrame, LensStyle, RenderSurface};
