use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::{Deserialize, Serialize};

use super::measure::PhotoId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Photo,
    Video,
}

/// Transcoding progress reported by the upload pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub total: f64,
    pub complete: f64,
}

/// Display metadata for a photo or video, possibly partial.
///
/// Fetch responses and local edits are folded in with [`ImageCache::update`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PhotoDescription {
    pub id: PhotoId,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub modified: Option<DateTime<Utc>>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default, rename = "type")]
    pub kind: Option<MediaKind>,
    #[serde(default)]
    pub progress: Option<Progress>,
    #[serde(default)]
    pub formats: Option<Vec<String>>,
    #[serde(skip)]
    pub image: Option<ImageHandle>,
}

impl PartialEq for PhotoDescription {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.description == other.description
            && self.created == other.created
            && self.modified == other.modified
            && self.width == other.width
            && self.height == other.height
            && self.kind == other.kind
            && self.progress == other.progress
            && self.formats == other.formats
    }
}

impl PhotoDescription {
    pub fn new(id: impl Into<PhotoId>) -> Self {
        Self { id: id.into(), ..Default::default() }
    }

    /// Width over height, rounded to two decimals. Unknown dimensions count as square.
    pub fn aspect_ratio(&self) -> f64 {
        match (self.width, self.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => {
                (f64::from(w) / f64::from(h) * 100.0).round() / 100.0
            }
            _ => 1.0,
        }
    }
}

/// A sized rendition of an image, addressed relative to the photo service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SizedImage {
    pub size: u32,
    pub path: Arc<str>,
}

/// Per-photo memo of the renditions requested so far.
#[derive(Clone, Debug)]
pub struct ImageHandle {
    id: PhotoId,
    sizes: Arc<DashMap<u32, SizedImage>>,
}

impl ImageHandle {
    fn new(id: PhotoId) -> Self { Self { id, sizes: Arc::default() } }

    pub fn at_size(&self, size: u32) -> SizedImage {
        self.sizes
            .entry(size)
            .or_insert_with(|| SizedImage {
                size,
                path: Arc::from(format!("image/{}?size={size}", self.id)),
            })
            .clone()
    }

    pub fn requested_sizes(&self) -> Vec<u32> {
        let mut sizes: Vec<u32> = self.sizes.iter().map(|e| *e.key()).collect();
        sizes.sort_unstable();
        sizes
    }
}

/// Rounds a display box up to the next power-of-two rendition, at least 100px.
pub fn ideal_image_size(width: f64, height: f64) -> u32 {
    let size = width.max(height).ceil().max(1.0);
    let bucket = 2f64.powf(size.log2().ceil()).round();
    bucket.max(100.0) as u32
}

/// Shared, identity-keyed store of photo descriptions.
///
/// Cloning yields another handle to the same store. Updates are monotonic
/// upserts, so concurrently completing fetches can write without an outer lock.
#[derive(Clone, Default, Debug)]
pub struct ImageCache(Arc<DashMap<PhotoId, PhotoDescription>>);

static_assertions::assert_impl_all!(ImageCache: Send, Sync);

impl ImageCache {
    pub fn new() -> Self { Self::default() }

    /// Folds a partial description into the stored one.
    ///
    /// Caption and formats overwrite; creation/modification dates, dimensions
    /// and media kind only fill fields that are still unknown; progress follows
    /// the latest patch, including its absence.
    pub fn update(&self, patch: &PhotoDescription) {
        match self.0.entry(patch.id.clone()) {
            Entry::Occupied(mut entry) => merge_into(entry.get_mut(), patch),
            Entry::Vacant(entry) => {
                let mut fresh = PhotoDescription::new(patch.id.clone());
                merge_into(&mut fresh, patch);
                entry.insert(fresh);
            }
        }
    }

    pub fn get(&self, id: &PhotoId) -> Option<PhotoDescription> {
        self.0.get(id).map(|entry| entry.clone())
    }

    pub fn contains(&self, id: &PhotoId) -> bool { self.0.contains_key(id) }

    pub fn aspect_ratio(&self, id: &PhotoId) -> f64 {
        self.0.get(id).map(|entry| entry.aspect_ratio()).unwrap_or(1.0)
    }

    pub fn image(&self, id: &PhotoId) -> Option<ImageHandle> {
        self.0.get(id).and_then(|entry| entry.image.clone())
    }

    pub fn remove(&self, id: &PhotoId) -> Option<PhotoDescription> {
        self.0.remove(id).map(|(_, desc)| desc)
    }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

fn merge_into(stored: &mut PhotoDescription, patch: &PhotoDescription) {
    if patch.description.is_some() {
        stored.description = patch.description.clone();
    }
    if stored.created.is_none() {
        stored.created = patch.created;
    }
    if stored.modified.is_none() {
        stored.modified = patch.modified;
    }
    if stored.width.is_none() {
        stored.width = patch.width;
    }
    if stored.height.is_none() {
        stored.height = patch.height;
    }
    if stored.kind.is_none() {
        stored.kind = patch.kind;
    }
    stored.progress = patch.progress;
    if patch.formats.is_some() {
        stored.formats = patch.formats.clone();
    }
    if stored.image.is_none() && stored.kind == Some(MediaKind::Photo) {
        stored.image = Some(ImageHandle::new(stored.id.clone()));
    }
}
