use crate::load::LoadStage;
use crate::registry::ThumbId;

pub const ERROR_NAME: &str = "Magnifier error";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MagnifierError {
    #[error("Please set thumbnail")]
    MissingThumbnail,
    #[error("Please specify large image wrapper DOM element")]
    MissingLargeWrapper,
    #[error("thumbnail {0} is already attached")]
    AlreadyRegistered(ThumbId),
    #[error("thumbnail {0} is not attached")]
    UnknownThumbnail(ThumbId),
    #[error("thumbnail {id} cannot move from {from:?} to {to:?}")]
    StageOutOfOrder {
        id: ThumbId,
        from: LoadStage,
        to: LoadStage,
    },
}

impl MagnifierError {
    /// Structured name reported alongside the message.
    pub fn name(&self) -> &'static str {
        ERROR_NAME
    }

    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            MagnifierError::MissingThumbnail | MagnifierError::MissingLargeWrapper
        )
    }
}
