use thiserror::Error;

use super::album::AlbumId;
use crate::model::{ItemId, PhotoId};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GalleryError {
    #[error("Photo not found: {0}")]
    NotFound(PhotoId),
    #[error("Album not found: {0}")]
    AlbumNotFound(AlbumId),
    #[error("Invalid response (status {status}) {when}")]
    InvalidResponse { status: u16, when: String },
    #[error("Misaligned sequence in merge: expected {expected:?}, got {got:?}")]
    MergeMisalignment {
        expected: Option<ItemId>,
        got: Option<ItemId>,
    },
    #[error("Invalid layout: {0}")]
    InvalidLayout(String),
    #[error("Placeholder run underflowed")]
    PlaceholderUnderflow,
    #[error("Source failed: {0}")]
    Source(String),
}

pub type Result<T, E = GalleryError> = std::result::Result<T, E>;
