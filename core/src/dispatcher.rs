use crate::config::{
    DisplayMode, HoverCallback, HoverSnapshot, MagnifierOptions, ThumbConfig, ZoomSnapshot,
};
use crate::error::MagnifierError;
use crate::geometry::{LensPosition, WheelDirection, ZoomOutcome};
use crate::load::{ImageRole, LoadStage};
use crate::registry::{Registry, ThumbId, ThumbnailState};
use crate::surface::{LargePlacement, LensFrame, LensStyle, RenderSurface};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HoverKind {
    Enter,
    Move,
    Leave,
    Zoom,
}

/// A user callback bound to the snapshot it should receive.
pub struct Notification {
    pub kind: HoverKind,
    pub snapshot: HoverSnapshot,
    callback: HoverCallback,
}

impl Notification {
    pub fn deliver(self) {
        (self.callback)(&self.snapshot);
    }
}

/// Callbacks produced by one dispatch. They are handed back to the caller
/// instead of being run inline so a callback may re-enter the magnifier.
#[must_use = "notifications do nothing unless delivered"]
#[derive(Default)]
pub struct Notifications(Vec<Notification>);

impl Notifications {
    fn push(&mut self, kind: HoverKind, callback: Option<&HoverCallback>, snapshot: HoverSnapshot) {
        if let Some(callback) = callback {
            self.0.push(Notification {
                kind,
                snapshot,
                callback: callback.clone(),
            });
        }
    }

    fn extend(&mut self, other: Notifications) {
        self.0.extend(other.0);
    }

    pub fn kinds(&self) -> Vec<HoverKind> {
        self.0.iter().map(|note| note.kind).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn deliver(self) {
        for note in self.0 {
            note.deliver();
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttachOutcome {
    Attached,
    /// The thumbnail was known; only the current reference moved.
    AlreadyAttached,
}

/// Pointer session shared by every thumbnail of one magnifier.
#[derive(Clone, Debug, Default)]
pub struct Session {
    /// Thumbnail under the pointer. Always a registry key when set.
    pub active: Option<ThumbId>,
    /// Thumbnail re-measured on viewport scroll.
    pub current: Option<ThumbId>,
    pub cursor_x: f64,
    pub cursor_y: f64,
    pub in_bounds: bool,
    pub lens_shown: bool,
    pub last_stage: LoadStage,
    pub lens: LensPosition,
}

pub struct Dispatcher<S> {
    options: MagnifierOptions,
    registry: Registry,
    session: Session,
    surface: S,
}

impl<S: RenderSurface> Dispatcher<S> {
    pub fn new(options: MagnifierOptions, surface: S) -> Self {
        Self {
            options,
            registry: Registry::new(),
            session: Session::default(),
            surface,
        }
    }

    pub fn options(&self) -> &MagnifierOptions {
        &self.options
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn state(&self, id: &ThumbId) -> Option<&ThumbnailState> {
        self.registry.get(id)
    }

    pub fn allocate_id(&mut self) -> ThumbId {
        self.registry.allocate_id()
    }

    /// Registers a thumbnail and starts its thumbnail image load. A known id
    /// keeps its state, load stage included.
    pub fn attach(
        &mut self,
        id: ThumbId,
        config: ThumbConfig,
    ) -> Result<AttachOutcome, MagnifierError> {
        if self.registry.contains(&id) {
            self.session.current = Some(id);
            return Ok(AttachOutcome::AlreadyAttached);
        }
        let thumb_src = config.thumb_src.clone();
        self.registry.register(id.clone(), config)?;
        self.surface.create_lens(&id);
        self.surface.request_image(&id, ImageRole::Thumbnail, &thumb_src);
        self.session.current = Some(id);
        Ok(AttachOutcome::Attached)
    }

    pub fn set_current(&mut self, id: ThumbId) {
        self.session.current = Some(id);
    }

    pub fn image_loaded(
        &mut self,
        id: &ThumbId,
        role: ImageRole,
    ) -> Result<LoadStage, MagnifierError> {
        let state = self
            .registry
            .get_mut(id)
            .ok_or_else(|| MagnifierError::UnknownThumbnail(id.clone()))?;
        let stage = state.advance(id, role)?;
        match stage {
            LoadStage::ThumbnailLoaded => {
                if let Some(rect) = self.surface.bounding_rect(id) {
                    state.geometry.set_bounds(rect);
                }
                self.surface.show_loading(id, state.geometry.lens_size());
                let large_url = state.config.large_url.clone();
                self.surface.request_image(id, ImageRole::Large, &large_url);
            }
            LoadStage::LargeLoaded => {
                let placement = match (&state.config.mode, &state.config.wrapper) {
                    (DisplayMode::External, Some(wrapper)) => {
                        LargePlacement::Wrapper(wrapper.id.clone())
                    }
                    _ => LargePlacement::Lens,
                };
                self.surface.install_large(
                    id,
                    &placement,
                    state.geometry.lens_size(),
                    state.geometry.large_size(),
                );
            }
            LoadStage::NotLoaded => {}
        }
        Ok(stage)
    }

    pub fn pointer_enter(
        &mut self,
        id: ThumbId,
        cursor_x: f64,
        cursor_y: f64,
    ) -> Result<Notifications, MagnifierError> {
        if !self.registry.contains(&id) {
            return Err(MagnifierError::UnknownThumbnail(id));
        }
        let mut notes = Notifications::default();
        if self.session.active.as_ref().is_some_and(|active| *active != id) {
            notes.extend(self.pointer_leave());
        }
        self.session.active = Some(id.clone());
        self.session.current = Some(id.clone());
        self.session.cursor_x = cursor_x;
        self.session.cursor_y = cursor_y;

        self.show_stage(&id);
        if let Some(rect) = self.surface.bounding_rect(&id) {
            if let Some(state) = self.registry.get_mut(&id) {
                state.geometry.set_bounds(rect);
            }
        }
        self.track(&id);
        self.render(&id);

        if let Some(state) = self.registry.get(&id) {
            let snapshot = snapshot(&id, state, &self.session, None);
            notes.push(HoverKind::Enter, state.config.callbacks.on_enter.as_ref(), snapshot);
        }
        Ok(notes)
    }

    pub fn pointer_move(&mut self, cursor_x: f64, cursor_y: f64) -> Notifications {
        self.session.cursor_x = cursor_x;
        self.session.cursor_y = cursor_y;
        let Some(id) = self.session.active.clone() else {
            return Notifications::default();
        };
        if !self.track(&id) {
            return self.pointer_leave();
        }
        self.render(&id);

        let mut notes = Notifications::default();
        if let Some(state) = self.registry.get(&id) {
            if state.stage.is_loaded() {
                let snapshot = snapshot(&id, state, &self.session, None);
                notes.push(HoverKind::Move, state.config.callbacks.on_move.as_ref(), snapshot);
            }
        }
        notes
    }

    /// Hides the lens of the active thumbnail. Does nothing when it is
    /// already hidden, so repeated out-of-bounds moves report one leave.
    pub fn pointer_leave(&mut self) -> Notifications {
        let mut notes = Notifications::default();
        let Some(id) = self.session.active.clone() else {
            return notes;
        };
        let Some(state) = self.registry.get(&id) else {
            return notes;
        };
        if !state.stage.is_loaded() || !self.session.lens_shown {
            return notes;
        }
        let snapshot = snapshot(&id, state, &self.session, None);
        notes.push(HoverKind::Leave, state.config.callbacks.on_leave.as_ref(), snapshot);

        if state.stage == LoadStage::LargeLoaded {
            self.surface.set_lens_style(&id, LensStyle::Lens, true);
            self.surface.set_large_hidden(&id, true);
        } else {
            self.surface.set_lens_style(&id, LensStyle::Loader, true);
        }
        self.surface.set_thumb_active(&id, false);
        self.session.lens_shown = false;
        notes
    }

    /// Steps the zoom of the visible lens. `None` means the wheel input was
    /// not consumed and the host should keep its default action.
    pub fn wheel(&mut self, direction: WheelDirection) -> Option<Notifications> {
        let id = self.session.active.clone()?;
        let state = self.registry.get_mut(&id)?;
        if state.stage != LoadStage::LargeLoaded
            || !state.config.zoomable
            || !self.session.lens_shown
        {
            return None;
        }

        let mut notes = Notifications::default();
        let outcome = state
            .geometry
            .adjust_zoom(direction, self.session.cursor_x, self.session.cursor_y);
        let (lens, reported_zoom) = match outcome {
            ZoomOutcome::Applied { reported_zoom, lens } => (lens, Some(reported_zoom)),
            ZoomOutcome::Floored { lens: Some(lens) } => (lens, None),
            ZoomOutcome::Floored { lens: None } => return Some(notes),
        };

        let geometry = &state.geometry;
        self.session.lens = lens;
        self.session.in_bounds = geometry
            .cursor_offset(self.session.cursor_x, self.session.cursor_y)
            .in_bounds;
        self.surface.resize_lens(&id, geometry.lens_size());
        self.surface
            .place_lens(&id, LensFrame::new(lens, geometry.lens_bg_x, geometry.lens_bg_y));
        self.surface.resize_large(&id, geometry.large_size());
        self.surface.place_large(&id, geometry.large_left, geometry.large_top);

        // Pinning to the floor resizes without reporting a zoom change.
        if let Some(zoom) = reported_zoom {
            let zoom = ZoomSnapshot {
                zoom,
                lens_width: geometry.lens_width,
                lens_height: geometry.lens_height,
            };
            let snapshot = snapshot(&id, state, &self.session, Some(zoom));
            notes.push(HoverKind::Zoom, state.config.callbacks.on_zoom.as_ref(), snapshot);
        }
        Some(notes)
    }

    /// Bounding boxes are viewport-relative; re-measure the current thumbnail.
    pub fn viewport_scroll(&mut self) {
        let Some(id) = self.session.current.clone() else {
            return;
        };
        let Some(rect) = self.surface.bounding_rect(&id) else {
            return;
        };
        let Some(state) = self.registry.get_mut(&id) else {
            return;
        };
        state.geometry.set_bounds(rect);
        if self.session.active.as_ref() != Some(&id) {
            return;
        }
        self.track(&id);
        if self.session.lens_shown {
            self.place(&id);
        }
    }

    /// Render state for the thumbnail's load stage: loading indicator or lens.
    fn show_stage(&mut self, id: &ThumbId) {
        let Some(state) = self.registry.get_mut(id) else {
            return;
        };
        match state.stage {
            LoadStage::LargeLoaded => {
                self.surface.set_lens_style(id, LensStyle::Lens, false);
                if !state.zoom_listener_attached {
                    if state.config.zoomable {
                        self.surface.attach_zoom_listener(id);
                    }
                    state.zoom_listener_attached = true;
                }
                self.surface.set_large_hidden(id, false);
            }
            LoadStage::ThumbnailLoaded => {
                self.surface.set_lens_style(id, LensStyle::Loader, false);
            }
            LoadStage::NotLoaded => {}
        }
    }

    /// Recomputes cursor-dependent geometry; returns whether the cursor is
    /// inside the thumbnail.
    fn track(&mut self, id: &ThumbId) -> bool {
        let Some(state) = self.registry.get_mut(id) else {
            self.session.in_bounds = false;
            return false;
        };
        let (offset, lens) = state
            .geometry
            .track(self.session.cursor_x, self.session.cursor_y);
        self.session.in_bounds = offset.in_bounds;
        self.session.lens = lens;
        offset.in_bounds
    }

    fn render(&mut self, id: &ThumbId) {
        let Some(stage) = self.registry.get(id).map(|state| state.stage) else {
            return;
        };
        if stage != self.session.last_stage || !self.session.lens_shown {
            self.show_stage(id);
        }
        if stage.is_loaded() {
            self.surface.set_thumb_active(id, true);
            self.place(id);
            self.session.lens_shown = true;
        }
        self.session.last_stage = stage;
    }

    fn place(&mut self, id: &ThumbId) {
        let Some(state) = self.registry.get(id) else {
            return;
        };
        let geometry = &state.geometry;
        self.surface.place_lens(
            id,
            LensFrame::new(self.session.lens, geometry.lens_bg_x, geometry.lens_bg_y),
        );
        if state.stage == LoadStage::LargeLoaded {
            self.surface.place_large(id, geometry.large_left, geometry.large_top);
        }
    }
}

fn snapshot(
    id: &ThumbId,
    state: &ThumbnailState,
    session: &Session,
    zoom: Option<ZoomSnapshot>,
) -> HoverSnapshot {
    HoverSnapshot {
        thumb: id.clone(),
        lens: id.lens_id(),
        large: (state.stage == LoadStage::LargeLoaded).then(|| id.large_id()),
        x: session.cursor_x,
        y: session.cursor_y,
        zoom,
    }
}
