pub mod gallery_seq;
pub mod image_cache;
pub mod item;
pub mod measure;
pub mod sequence;

pub use gallery_seq::{Gap, GallerySequence, MergeResult, Side};
pub use image_cache::{
    ImageCache, ImageHandle, MediaKind, PhotoDescription, Progress, SizedImage, ideal_image_size,
};
pub use item::{Item, PhotoItem, Placeholder, Row, TextItem};
pub use measure::{ItemId, Measure, PhotoId};
pub use sequence::{AnnotatedSequence, Measured, Summary};
