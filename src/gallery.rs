//! Gallery models: windows over a photo source that load, merge and lay out
//! on demand.

pub mod album;
pub mod error;
pub mod events;
pub mod library;
pub mod model;
pub mod source;

pub use album::{AlbumContent, AlbumEntry, AlbumId, AlbumModel};
pub use error::{GalleryError, Result};
pub use events::GalleryEvent;
pub use library::Library;
pub use model::{DropTarget, GalleryModel, ModelOptions, Neighborhood, Window, WindowEntry};
pub use source::{
    Anchor, Catalog, Cursor, GallerySource, InMemorySource, Page, PageRequest, PointFetch,
    StoredAlbum,
};

#[cfg(test)]
mod tests;
