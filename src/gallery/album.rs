//! Albums: hand-ordered galleries of photo memberships and text blocks.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::error::Result;
use super::events::GalleryEvent;
use super::model::{DropTarget, GalleryModel};
use super::source::GallerySource;
use crate::common::config::Config;
use crate::model::measure::string_id;
use crate::model::{
    GallerySequence, ImageCache, Item, ItemId, MergeResult, PhotoDescription, PhotoId, PhotoItem,
    Side, TextItem,
};

string_id! {
    /// Identity of an album.
    AlbumId
}

/// Text given to blocks created with [`AlbumModel::add_text_around`].
pub const NEW_TEXT: &str = "New Text";

static NEXT_LOCAL_TEXT: AtomicU64 = AtomicU64::new(1);

/// One album member as stored by the photo service.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AlbumEntry {
    pub id: ItemId,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub photo: Option<PhotoDescription>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AlbumContent {
    pub name: String,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub content: Vec<AlbumEntry>,
}

#[derive(Default)]
struct AlbumMeta {
    name: String,
    created: Option<DateTime<Utc>>,
}

/// Where a moved item ends up.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Placement {
    BeforeItem(ItemId),
    End,
}

/// A gallery whose items are addressed by album item id.
pub struct AlbumModel<S> {
    id: AlbumId,
    model: GalleryModel<S>,
    meta: Arc<Mutex<AlbumMeta>>,
}

impl<S> Clone for AlbumModel<S> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            model: self.model.clone(),
            meta: self.meta.clone(),
        }
    }
}

impl<S: GallerySource> AlbumModel<S> {
    pub fn new(id: AlbumId, source: Arc<S>, cache: ImageCache, config: &Config) -> Self {
        Self {
            id,
            model: GalleryModel::new(source, cache, config),
            meta: Arc::default(),
        }
    }

    pub fn id(&self) -> &AlbumId { &self.id }

    pub fn gallery(&self) -> &GalleryModel<S> { &self.model }

    pub fn name(&self) -> String { self.meta.lock().name.clone() }

    pub fn created(&self) -> Option<DateTime<Utc>> { self.meta.lock().created }

    /// Replaces the album's metadata and items with `content`.
    pub fn load_content(&self, content: AlbumContent) {
        {
            let mut meta = self.meta.lock();
            meta.name = content.name;
            meta.created = content.created;
        }
        let cache = self.model.cache();
        let mut items: Vec<Item> = Vec::with_capacity(content.content.len());
        for entry in content.content {
            if let Some(photo) = &entry.photo {
                cache.update(photo);
                items.push(
                    PhotoItem::album_member(photo.id.clone(), entry.id, entry.created, cache).into(),
                );
            } else if let Some(text) = entry.text {
                items.push(TextItem::new(entry.id, text, entry.created).into());
            } else {
                warn!(album = %self.id, item = %entry.id, "ignoring album item with no photo or text");
            }
        }
        debug!(album = %self.id, items = items.len(), "album loaded");
        self.model.start(items);
    }

    #[instrument(skip_all, fields(album = %self.id))]
    pub async fn start_from_source(&self) -> Result<()> {
        let content = self.model.report(self.model.source().fetch_album(&self.id).await)?;
        self.load_content(content);
        Ok(())
    }

    /// Resolves a drop position to the item the moved one should precede.
    /// `None` when the move would leave the order as it is.
    fn placement(&self, item: &ItemId, target: &DropTarget) -> Option<Placement> {
        let gallery = self.model.snapshot();
        match target {
            DropTarget::Before(id) | DropTarget::After(id) if id == item => None,
            DropTarget::Before(id) => {
                let (before, _, _) = gallery.search_for_item(id)?;
                if before.measure().last_item.as_ref() == Some(item) {
                    None
                } else {
                    Some(Placement::BeforeItem(id.clone()))
                }
            }
            DropTarget::After(id) => {
                let (_, _, after) = gallery.search_for_item(id)?;
                match after.measure().first_item {
                    Some(next) if next == *item => None,
                    Some(next) => Some(Placement::BeforeItem(next)),
                    None => Some(Placement::End),
                }
            }
        }
    }

    /// Moves `item` to `target`, locally first and then in the source.
    #[instrument(skip_all, fields(album = %self.id, %item, ?target))]
    pub async fn reorder(&self, item: &ItemId, target: DropTarget) -> Result<()> {
        let Some(placement) = self.placement(item, &target) else {
            debug!("reorder leaves the order unchanged");
            return Ok(());
        };

        let moved = self.model.mutate(|gallery, relayout| {
            let (before, moved, after) = gallery.search_for_item(item)?;
            let rest = GallerySequence::concat(before, after);
            let reordered = match &placement {
                Placement::End => {
                    let mut rest = rest;
                    rest.push_back(moved);
                    rest
                }
                Placement::BeforeItem(anchor) => {
                    let (before, after) = rest.split_at_item(anchor, Side::Before);
                    GallerySequence::concat3(before, GallerySequence::from_items([moved]), after)
                }
            };
            *gallery = relayout.apply(&reordered);
            Some(())
        });
        if moved.is_none() {
            return Ok(());
        }
        self.model.emit(GalleryEvent::Load);

        let before = match &placement {
            Placement::BeforeItem(anchor) => Some(anchor),
            Placement::End => None,
        };
        let source = self.model.source();
        self.model.report(source.reorder_album_item(&self.id, item, before).await)
    }

    /// Changes a text block's content and saves it.
    #[instrument(skip_all, fields(album = %self.id, %id))]
    pub async fn set_text(&self, id: &ItemId, text: &str) -> Result<()> {
        let changed = self.model.mutate(|gallery, relayout| {
            let (before, item, after) = gallery.search_for_item(id)?;
            let Item::Text(block) = item else {
                return None;
            };
            let middle = GallerySequence::from_items([Item::from(block.with_text(text))]);
            *gallery = relayout.concat(MergeResult { before, middle, after });
            Some(())
        });
        if changed.is_none() {
            return Ok(());
        }
        self.model.emit(GalleryEvent::Load);
        let source = self.model.source();
        self.model.report(source.update_album_text(&self.id, id, text).await)
    }

    /// Inserts a new text block at the row boundary nearest `y`, saves it, and
    /// returns the id the source assigned.
    #[instrument(skip(self), fields(album = %self.id))]
    pub async fn add_text_around(&self, y: f64) -> Result<ItemId> {
        let local_id =
            ItemId::from(format!("local-{}", NEXT_LOCAL_TEXT.fetch_add(1, Ordering::Relaxed)));
        let block = TextItem::unsaved(local_id.clone(), NEW_TEXT, Utc::now());

        let next = self.model.mutate(|gallery, relayout| {
            let (before, after) = gallery.split_at_height(y, Side::Before);
            let next = after.measure().first_item;
            let middle = GallerySequence::from_items([Item::from(block)]);
            *gallery = relayout.concat(MergeResult { before, middle, after });
            next
        });
        self.model.emit(GalleryEvent::Load);

        let source = self.model.source();
        let id = self.model.report(source.add_album_text(&self.id, next.as_ref(), NEW_TEXT).await)?;
        self.change_item_id(&local_id, &id);
        Ok(id)
    }

    /// Renames a text block once the source has assigned it an id.
    fn change_item_id(&self, old: &ItemId, new: &ItemId) {
        let changed = self.model.mutate(|gallery, _| {
            let (before, item, after) = gallery.search_for_item(old)?;
            let Item::Text(block) = item else {
                return None;
            };
            let renamed = GallerySequence::from_items([Item::from(block.with_id(new.clone()))]);
            *gallery = GallerySequence::concat3(before, renamed, after);
            Some(())
        });
        if changed.is_some() {
            self.model.emit(GalleryEvent::Load);
        }
    }

    #[instrument(skip_all, fields(album = %self.id, %id))]
    pub async fn remove_album_item(&self, id: &ItemId) -> Result<()> {
        if self.model.remove_by_item_id(id).is_none() {
            return Ok(());
        }
        let source = self.model.source();
        self.model.report(source.remove_album_item(&self.id, id).await)
    }

    /// Drops every membership of a photo deleted elsewhere, without touching
    /// the source.
    pub(crate) fn forget_photo(&self, id: &PhotoId) {
        while self.model.remove_by_photo_id(id).is_some() {}
    }

    pub async fn set_name(&self, name: &str) -> Result<String> {
        let source = self.model.source();
        let name = self.model.report(source.set_album_name(&self.id, name).await)?;
        self.meta.lock().name = name.clone();
        Ok(name)
    }

    pub async fn update_description(&self, id: &PhotoId, description: &str) -> Result<()> {
        self.model.update_description(id, description).await
    }
}
