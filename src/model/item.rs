use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::image_cache::{ImageCache, PhotoDescription};
use super::measure::{ItemId, Measure, PhotoId};
use super::sequence::Measured;

/// Height given to text blocks until the layout engine measures them.
pub const DEFAULT_TEXT_HEIGHT: f64 = 100.0;

#[derive(Clone, Debug, PartialEq)]
pub enum Item {
    Photo(PhotoItem),
    Text(TextItem),
    Placeholder(Placeholder),
    Row(Row),
}

impl Item {
    /// Identity used for positional addressing. Placeholders and rows have none.
    pub fn item_id(&self) -> Option<ItemId> {
        match self {
            Item::Photo(photo) => Some(photo.item_id()),
            Item::Text(text) => Some(text.id.clone()),
            Item::Placeholder(_) | Item::Row(_) => None,
        }
    }

    pub fn photo_id(&self) -> Option<&PhotoId> {
        match self {
            Item::Photo(photo) => Some(&photo.id),
            _ => None,
        }
    }

    pub fn as_placeholder(&self) -> Option<&Placeholder> {
        match self {
            Item::Placeholder(ph) => Some(ph),
            _ => None,
        }
    }

    pub fn is_placeholder(&self) -> bool { matches!(self, Item::Placeholder(_)) }

    pub fn is_row(&self) -> bool { matches!(self, Item::Row(_)) }

    pub fn is_concrete(&self) -> bool { matches!(self, Item::Photo(_) | Item::Text(_)) }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Item::Photo(photo) => photo.created_at,
            Item::Text(text) => text.created_at,
            Item::Placeholder(_) | Item::Row(_) => None,
        }
    }
}

impl From<PhotoItem> for Item {
    fn from(photo: PhotoItem) -> Self { Item::Photo(photo) }
}

impl From<TextItem> for Item {
    fn from(text: TextItem) -> Self { Item::Text(text) }
}

impl From<Placeholder> for Item {
    fn from(ph: Placeholder) -> Self { Item::Placeholder(ph) }
}

impl From<Row> for Item {
    fn from(row: Row) -> Self { Item::Row(row) }
}

impl Measured for Item {
    type Measure = Measure;

    fn measure(&self) -> Measure {
        match self {
            Item::Photo(photo) => photo.measure(),
            Item::Text(text) => text.measure(),
            Item::Placeholder(ph) => Measure {
                count: ph.count,
                height: ph.height,
                last_row_height: Some(ph.height),
                ..Measure::default()
            },
            Item::Row(row) => Measure {
                height: row.height,
                last_row_height: Some(row.height),
                ..Measure::default()
            },
        }
    }
}

/// A photo or video whose metadata lives in the shared [`ImageCache`].
#[derive(Clone)]
pub struct PhotoItem {
    pub id: PhotoId,
    /// Membership id when the photo is addressed as part of an album ordering.
    pub album_item_id: Option<ItemId>,
    pub created_at: Option<DateTime<Utc>>,
    /// Width assigned by the last layout pass.
    pub display_width: Option<f64>,
    cache: ImageCache,
}

impl PhotoItem {
    pub fn new(id: PhotoId, cache: &ImageCache) -> Self {
        let created_at = cache.get(&id).and_then(|desc| desc.created);
        Self {
            id,
            album_item_id: None,
            created_at,
            display_width: None,
            cache: cache.clone(),
        }
    }

    /// An album member; ordering dates come from the membership, not the photo.
    pub fn album_member(
        id: PhotoId,
        album_item_id: ItemId,
        added_at: Option<DateTime<Utc>>,
        cache: &ImageCache,
    ) -> Self {
        Self {
            id,
            album_item_id: Some(album_item_id),
            created_at: added_at,
            display_width: None,
            cache: cache.clone(),
        }
    }

    pub fn item_id(&self) -> ItemId {
        self.album_item_id.clone().unwrap_or_else(|| ItemId::from(&self.id))
    }

    pub fn description(&self) -> Option<PhotoDescription> { self.cache.get(&self.id) }

    pub fn aspect_ratio(&self) -> f64 { self.cache.aspect_ratio(&self.id) }

    pub fn cache(&self) -> &ImageCache { &self.cache }

    pub fn with_display_width(&self, width: f64) -> Self {
        Self { display_width: Some(width), ..self.clone() }
    }

    fn measure(&self) -> Measure {
        let mut measure = Measure {
            count: 1,
            loaded_count: 1,
            images: im::HashSet::unit(self.id.clone()),
            first_date: self.created_at,
            last_date: self.created_at,
            first_image: Some(self.id.clone()),
            last_image: Some(self.id.clone()),
            ..Measure::default()
        };
        if let Some(album_item_id) = &self.album_item_id {
            measure.items = im::HashSet::unit(album_item_id.clone());
            measure.first_item = Some(album_item_id.clone());
            measure.last_item = Some(album_item_id.clone());
        }
        measure
    }
}

impl fmt::Debug for PhotoItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("PhotoItem");
        s.field("id", &self.id);
        if let Some(album_item_id) = &self.album_item_id {
            s.field("album_item_id", album_item_id);
        }
        if let Some(width) = self.display_width {
            s.field("display_width", &width);
        }
        s.finish()
    }
}

impl PartialEq for PhotoItem {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.album_item_id == other.album_item_id
            && self.created_at == other.created_at
            && self.display_width == other.display_width
    }
}

/// A user-authored block of text inside an album.
#[derive(Clone, Debug, PartialEq)]
pub struct TextItem {
    pub id: ItemId,
    /// Id the block was created under, kept across server-side renames.
    pub origin_id: ItemId,
    pub created_at: Option<DateTime<Utc>>,
    pub text: Arc<str>,
    pub height: f64,
    pub saved: bool,
}

impl TextItem {
    pub fn new(id: ItemId, text: impl Into<Arc<str>>, created_at: Option<DateTime<Utc>>) -> Self {
        Self {
            origin_id: id.clone(),
            id,
            created_at,
            text: text.into(),
            height: DEFAULT_TEXT_HEIGHT,
            saved: true,
        }
    }

    /// A block that exists only locally until the server assigns it an id.
    pub fn unsaved(id: ItemId, text: impl Into<Arc<str>>, created_at: DateTime<Utc>) -> Self {
        Self { saved: false, ..Self::new(id, text, Some(created_at)) }
    }

    pub fn with_height(&self, height: f64) -> Self { Self { height, ..self.clone() } }

    pub fn with_text(&self, text: impl Into<Arc<str>>) -> Self {
        Self { text: text.into(), ..self.clone() }
    }

    pub fn with_id(&self, id: ItemId) -> Self { Self { id, ..self.clone() } }

    fn measure(&self) -> Measure {
        Measure {
            count: 1,
            loaded_count: 1,
            height: self.height,
            items: im::HashSet::unit(self.id.clone()),
            first_date: self.created_at,
            last_date: self.created_at,
            first_item: Some(self.id.clone()),
            last_item: Some(self.id.clone()),
            last_row_height: Some(self.height),
            ..Measure::default()
        }
    }
}

/// Stand-in for `count` items that have not been fetched yet.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placeholder {
    pub count: usize,
    /// Estimated total height of the whole run.
    pub height: f64,
}

impl Placeholder {
    pub fn new(count: usize, height: f64) -> Self {
        debug_assert!(count > 0, "zero-length placeholder");
        Self { count, height }
    }

    /// Folds two runs describing the same gap.
    ///
    /// The result keeps the smaller count and the larger height; each side's
    /// surplus units come back as a remainder with that side's own height.
    pub fn combine(&self, other: &Self) -> (Self, Option<Self>, Option<Self>) {
        let count = self.count.min(other.count);
        let combined = Self { count, height: self.height.max(other.height) };
        let rest_self = (self.count > count).then(|| Self::new(self.count - count, self.height));
        let rest_other =
            (other.count > count).then(|| Self::new(other.count - count, other.height));
        (combined, rest_self, rest_other)
    }

    /// The run with one unit consumed, or `None` when it was the last one.
    pub fn remove_one(&self) -> Option<Self> {
        (self.count > 1).then(|| Self { count: self.count - 1, height: self.height })
    }

    /// Divides the run after `left` units, sharing the height proportionally.
    pub(crate) fn split(&self, left: usize) -> (Option<Self>, Option<Self>) {
        if left == 0 {
            return (None, Some(*self));
        }
        if left >= self.count {
            return (Some(*self), None);
        }
        let left_height = self.height * left as f64 / self.count as f64;
        (
            Some(Self::new(left, left_height)),
            Some(Self::new(self.count - left, self.height - left_height)),
        )
    }

    /// The run with one more unit at its average height.
    pub fn grow_one(&self) -> Self {
        Self {
            count: self.count + 1,
            height: self.height + self.height / self.count.max(1) as f64,
        }
    }

    /// Two halves of one run re-joined at a seam.
    pub(crate) fn join(&self, other: &Self) -> Self {
        Self {
            count: self.count + other.count,
            height: self.height + other.height,
        }
    }
}

/// Line break emitted by the layout engine; the height is that of the row it starts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Row {
    pub height: f64,
}

impl Row {
    pub fn new(height: f64) -> Self { Self { height } }
}
