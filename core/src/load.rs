/// Loading lifecycle of one thumbnail. Ordering follows the lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LoadStage {
    #[default]
    NotLoaded,
    ThumbnailLoaded,
    LargeLoaded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageRole {
    Thumbnail,
    Large,
}

impl LoadStage {
    pub fn next(self) -> Option<LoadStage> {
        match self {
            LoadStage::NotLoaded => Some(LoadStage::ThumbnailLoaded),
            LoadStage::ThumbnailLoaded => Some(LoadStage::LargeLoaded),
            LoadStage::LargeLoaded => None,
        }
    }

    /// Stage reached once the image of `role` has finished loading.
    pub fn reached_by(role: ImageRole) -> LoadStage {
        match role {
            ImageRole::Thumbnail => LoadStage::ThumbnailLoaded,
            ImageRole::Large => LoadStage::LargeLoaded,
        }
    }

    pub fn is_loaded(self) -> bool {
        self > LoadStage::NotLoaded
    }

    pub fn can_advance_to(self, target: LoadStage) -> bool {
        self.next() == Some(target)
    }
}
