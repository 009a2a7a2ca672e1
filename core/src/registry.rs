use std::collections::HashMap;
use std::fmt;

use crate::config::ThumbConfig;
use crate::error::MagnifierError;
use crate::geometry::Geometry;
use crate::load::{ImageRole, LoadStage};

pub const AUTO_ID_PREFIX: &str = "magnifier-item-";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ThumbId(String);

impl ThumbId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn lens_id(&self) -> String {
        format!("{}-lens", self.0)
    }

    pub fn large_id(&self) -> String {
        format!("{}-large", self.0)
    }
}

impl fmt::Display for ThumbId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for ThumbId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone)]
pub struct ThumbnailState {
    pub config: ThumbConfig,
    pub geometry: Geometry,
    pub stage: LoadStage,
    pub zoom_listener_attached: bool,
}

impl ThumbnailState {
    pub fn new(config: ThumbConfig) -> Self {
        let geometry = Geometry::new(
            config.zoom,
            config.mode,
            config.wrapper.as_ref().map(|wrapper| wrapper.size),
        );
        Self {
            config,
            geometry,
            stage: LoadStage::NotLoaded,
            zoom_listener_attached: false,
        }
    }

    /// Records the load of `role`'s image. Stages never regress or skip.
    pub fn advance(&mut self, id: &ThumbId, role: ImageRole) -> Result<LoadStage, MagnifierError> {
        let target = LoadStage::reached_by(role);
        if !self.stage.can_advance_to(target) {
            return Err(MagnifierError::StageOutOfOrder {
                id: id.clone(),
                from: self.stage,
                to: target,
            });
        }
        self.stage = target;
        Ok(target)
    }
}

/// Attached thumbnails of one magnifier. Entries live as long as the registry.
#[derive(Debug, Default)]
pub struct Registry {
    entries: HashMap<ThumbId, ThumbnailState>,
    next_auto_id: u32,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        id: ThumbId,
        config: ThumbConfig,
    ) -> Result<&mut ThumbnailState, MagnifierError> {
        if self.entries.contains_key(&id) {
            return Err(MagnifierError::AlreadyRegistered(id));
        }
        Ok(self
            .entries
            .entry(id)
            .or_insert_with(|| ThumbnailState::new(config)))
    }

    pub fn get(&self, id: &ThumbId) -> Option<&ThumbnailState> {
        self.entries.get(id)
    }

    pub fn get_mut(&mut self, id: &ThumbId) -> Option<&mut ThumbnailState> {
        self.entries.get_mut(id)
    }

    pub fn contains(&self, id: &ThumbId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Next `magnifier-item-N` id for thumbnails that have none.
    pub fn allocate_id(&mut self) -> ThumbId {
        let id = ThumbId::new(format!("{AUTO_ID_PREFIX}{}", self.next_auto_id));
        self.next_auto_id += 1;
        id
    }
}
