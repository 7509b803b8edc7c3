//! The fetch contract gallery models load through, and an in-memory catalog
//! implementing it.

use std::future::Future;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::album::{AlbumContent, AlbumEntry, AlbumId};
use super::error::{GalleryError, Result};
use crate::common::collections::HashMap;
use crate::model::{ItemId, PhotoDescription, PhotoId};

/// Reference point for a count-to figure.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    Beginning,
    End,
    Photo(PhotoId),
}

/// Position of a known photo in the ordering (creation date, then id).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    pub id: PhotoId,
    pub created: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page starts right after this photo.
    pub after: Option<Cursor>,
    /// Page ends right before this photo.
    pub before: Option<Cursor>,
    pub limit: usize,
    /// `count_before` counts the items between this anchor and the page.
    pub count_from: Anchor,
    /// `count_after` counts the items between the page and this anchor.
    pub count_until: Anchor,
    pub query: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub images: Vec<PhotoDescription>,
    pub total: usize,
    pub count_before: usize,
    pub count_after: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointFetch {
    pub image: PhotoDescription,
    pub count_from_start: usize,
    pub count_to_end: usize,
}

/// Upstream photo service as seen by the gallery models.
pub trait GallerySource: Send + Sync + 'static {
    fn fetch_page(&self, request: PageRequest) -> impl Future<Output = Result<Page>> + Send;

    /// Fails with [`GalleryError::NotFound`] for unknown ids.
    fn fetch_photo(
        &self,
        id: &PhotoId,
        query: Option<&str>,
    ) -> impl Future<Output = Result<PointFetch>> + Send;

    fn update_description(
        &self,
        id: &PhotoId,
        description: &str,
    ) -> impl Future<Output = Result<()>> + Send;

    fn delete_photo(&self, id: &PhotoId) -> impl Future<Output = Result<()>> + Send;

    fn fetch_album(&self, album: &AlbumId) -> impl Future<Output = Result<AlbumContent>> + Send;

    /// Moves `item` in front of `before`, or to the end when `before` is `None`.
    fn reorder_album_item(
        &self,
        album: &AlbumId,
        item: &ItemId,
        before: Option<&ItemId>,
    ) -> impl Future<Output = Result<()>> + Send;

    fn update_album_text(
        &self,
        album: &AlbumId,
        item: &ItemId,
        text: &str,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Stores a new text block and returns the id the service assigned to it.
    fn add_album_text(
        &self,
        album: &AlbumId,
        before: Option<&ItemId>,
        text: &str,
    ) -> impl Future<Output = Result<ItemId>> + Send;

    fn remove_album_item(
        &self,
        album: &AlbumId,
        item: &ItemId,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Renames an album and returns the name as stored.
    fn set_album_name(
        &self,
        album: &AlbumId,
        name: &str,
    ) -> impl Future<Output = Result<String>> + Send;
}

/// Serialized form of an [`InMemorySource`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Catalog {
    #[serde(default)]
    pub photos: Vec<PhotoDescription>,
    #[serde(default)]
    pub albums: Vec<StoredAlbum>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredAlbum {
    pub id: AlbumId,
    #[serde(flatten)]
    pub content: AlbumContent,
}

#[derive(Default)]
struct SourceState {
    /// Sorted by [`order_key`].
    photos: Vec<PhotoDescription>,
    albums: HashMap<AlbumId, AlbumContent>,
    failures: usize,
    requests: Vec<PageRequest>,
    next_item: u64,
}

/// A [`GallerySource`] over a date-ordered in-memory catalog.
#[derive(Default)]
pub struct InMemorySource {
    state: RwLock<SourceState>,
}

fn order_key(created: Option<DateTime<Utc>>, id: &PhotoId) -> (DateTime<Utc>, &PhotoId) {
    (created.unwrap_or(DateTime::<Utc>::MIN_UTC), id)
}

fn matches_query(photo: &PhotoDescription, query: Option<&str>) -> bool {
    let Some(query) = query.filter(|q| !q.is_empty()) else {
        return true;
    };
    let query = query.to_lowercase();
    photo.id.as_str().to_lowercase().contains(&query)
        || photo.description.as_deref().is_some_and(|d| d.to_lowercase().contains(&query))
}

impl SourceState {
    fn take_failure(&mut self, when: &str) -> Result<()> {
        if self.failures == 0 {
            return Ok(());
        }
        self.failures -= 1;
        Err(GalleryError::InvalidResponse { status: 503, when: when.to_string() })
    }

    fn visible(&self, query: Option<&str>) -> Vec<&PhotoDescription> {
        self.photos.iter().filter(|p| matches_query(p, query)).collect()
    }

    fn album_mut(&mut self, album: &AlbumId) -> Result<&mut AlbumContent> {
        self.albums.get_mut(album).ok_or_else(|| GalleryError::AlbumNotFound(album.clone()))
    }
}

fn position_of(list: &[&PhotoDescription], id: &PhotoId) -> Option<usize> {
    list.iter().position(|p| p.id == *id)
}

impl InMemorySource {
    pub fn new() -> Self { Self::default() }

    pub fn from_catalog(catalog: Catalog) -> Self {
        let source = Self::new();
        {
            let mut state = source.state.write();
            for album in catalog.albums {
                state.albums.insert(album.id, album.content);
            }
        }
        for photo in catalog.photos {
            source.insert_photo(photo);
        }
        source
    }

    /// Adds or replaces a photo, keeping the catalog ordered.
    pub fn insert_photo(&self, photo: PhotoDescription) {
        let mut state = self.state.write();
        state.photos.retain(|p| p.id != photo.id);
        let key = order_key(photo.created, &photo.id);
        let at = state.photos.partition_point(|p| order_key(p.created, &p.id) < key);
        state.photos.insert(at, photo);
    }

    pub fn len(&self) -> usize { self.state.read().photos.len() }

    pub fn is_empty(&self) -> bool { self.state.read().photos.is_empty() }

    /// Makes the next `count` calls fail with an invalid response.
    pub fn fail_next(&self, count: usize) { self.state.write().failures = count; }

    /// Every page request received so far, oldest first.
    pub fn page_requests(&self) -> Vec<PageRequest> { self.state.read().requests.clone() }

    pub fn album_content(&self, album: &AlbumId) -> Option<AlbumContent> {
        self.state.read().albums.get(album).cloned()
    }
}

impl GallerySource for InMemorySource {
    async fn fetch_page(&self, request: PageRequest) -> Result<Page> {
        let mut state = self.state.write();
        state.requests.push(request.clone());
        state.take_failure("while loading photos")?;

        let list = state.visible(request.query.as_deref());
        let len = list.len();
        let (start, end) = if let Some(after) = &request.after {
            let key = order_key(after.created, &after.id);
            let start = list.partition_point(|p| order_key(p.created, &p.id) <= key);
            (start, (start + request.limit).min(len))
        } else if let Some(before) = &request.before {
            let key = order_key(before.created, &before.id);
            let end = list.partition_point(|p| order_key(p.created, &p.id) < key);
            (end.saturating_sub(request.limit), end)
        } else {
            (0, request.limit.min(len))
        };

        let count_before = match &request.count_from {
            Anchor::Beginning => start,
            Anchor::End => 0,
            Anchor::Photo(id) => match position_of(&list, id) {
                Some(at) => start.saturating_sub(at + 1),
                None => start,
            },
        };
        let count_after = match &request.count_until {
            Anchor::End => len - end,
            Anchor::Beginning => 0,
            Anchor::Photo(id) => match position_of(&list, id) {
                Some(at) => at.saturating_sub(end),
                None => len - end,
            },
        };
        trace!(start, end, count_before, count_after, "served page");

        Ok(Page {
            images: list[start..end].iter().map(|p| (*p).clone()).collect(),
            total: len,
            count_before,
            count_after,
        })
    }

    async fn fetch_photo(&self, id: &PhotoId, query: Option<&str>) -> Result<PointFetch> {
        let mut state = self.state.write();
        state.take_failure("while loading photo")?;
        let list = state.visible(query);
        let at = position_of(&list, id).ok_or_else(|| GalleryError::NotFound(id.clone()))?;
        Ok(PointFetch {
            image: list[at].clone(),
            count_from_start: at,
            count_to_end: list.len() - at - 1,
        })
    }

    async fn update_description(&self, id: &PhotoId, description: &str) -> Result<()> {
        let mut state = self.state.write();
        state.take_failure("while updating description")?;
        let photo = state
            .photos
            .iter_mut()
            .find(|p| p.id == *id)
            .ok_or_else(|| GalleryError::NotFound(id.clone()))?;
        photo.description = Some(description.to_string());
        Ok(())
    }

    async fn delete_photo(&self, id: &PhotoId) -> Result<()> {
        let mut state = self.state.write();
        state.take_failure("while deleting photo")?;
        let before = state.photos.len();
        state.photos.retain(|p| p.id != *id);
        if state.photos.len() == before {
            return Err(GalleryError::NotFound(id.clone()));
        }
        for album in state.albums.values_mut() {
            album.content.retain(|entry| entry.photo.as_ref().is_none_or(|p| p.id != *id));
        }
        Ok(())
    }

    async fn fetch_album(&self, album: &AlbumId) -> Result<AlbumContent> {
        let mut state = self.state.write();
        state.take_failure("while loading album")?;
        state.albums.get(album).cloned().ok_or_else(|| GalleryError::AlbumNotFound(album.clone()))
    }

    async fn reorder_album_item(
        &self,
        album: &AlbumId,
        item: &ItemId,
        before: Option<&ItemId>,
    ) -> Result<()> {
        let mut state = self.state.write();
        state.take_failure("while reordering album")?;
        let content = &mut state.album_mut(album)?.content;
        let from = content
            .iter()
            .position(|entry| entry.id == *item)
            .ok_or_else(|| GalleryError::Source(format!("no item {item} in album {album}")))?;
        let entry = content.remove(from);
        let to = match before {
            Some(target) => content
                .iter()
                .position(|entry| entry.id == *target)
                .ok_or_else(|| GalleryError::Source(format!("no item {target} in album {album}")))?,
            None => content.len(),
        };
        content.insert(to, entry);
        Ok(())
    }

    async fn update_album_text(&self, album: &AlbumId, item: &ItemId, text: &str) -> Result<()> {
        let mut state = self.state.write();
        state.take_failure("while updating text")?;
        let entry = state
            .album_mut(album)?
            .content
            .iter_mut()
            .find(|entry| entry.id == *item && entry.text.is_some())
            .ok_or_else(|| GalleryError::Source(format!("no text {item} in album {album}")))?;
        entry.text = Some(text.to_string());
        Ok(())
    }

    async fn add_album_text(
        &self,
        album: &AlbumId,
        before: Option<&ItemId>,
        text: &str,
    ) -> Result<ItemId> {
        let mut state = self.state.write();
        state.take_failure("while adding text")?;
        state.next_item += 1;
        let id = ItemId::from(format!("text-{}", state.next_item));
        let content = &mut state.album_mut(album)?.content;
        let at = before
            .and_then(|target| content.iter().position(|entry| entry.id == *target))
            .unwrap_or(content.len());
        content.insert(
            at,
            AlbumEntry {
                id: id.clone(),
                created: Some(Utc::now()),
                photo: None,
                text: Some(text.to_string()),
            },
        );
        Ok(id)
    }

    async fn remove_album_item(&self, album: &AlbumId, item: &ItemId) -> Result<()> {
        let mut state = self.state.write();
        state.take_failure("while deleting album item")?;
        state.album_mut(album)?.content.retain(|entry| entry.id != *item);
        Ok(())
    }

    async fn set_album_name(&self, album: &AlbumId, name: &str) -> Result<String> {
        let mut state = self.state.write();
        state.take_failure("while renaming album")?;
        let content = state.album_mut(album)?;
        content.name = name.to_string();
        Ok(content.name.clone())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;

    fn catalog(n: u32) -> InMemorySource {
        let source = InMemorySource::new();
        for i in 0..n {
            source.insert_photo(PhotoDescription {
                created: Some(Utc.with_ymd_and_hms(2020, 1, 1 + i, 0, 0, 0).unwrap()),
                ..PhotoDescription::new(format!("p{i:02}"))
            });
        }
        source
    }

    fn cursor(source: &InMemorySource, id: &str) -> Cursor {
        let created = source.state.read().photos.iter().find(|p| p.id.as_str() == id).and_then(|p| p.created);
        Cursor { id: id.into(), created }
    }

    fn ids(page: &Page) -> Vec<&str> { page.images.iter().map(|p| p.id.as_str()).collect() }

    #[tokio::test]
    async fn pages_after_a_cursor_count_to_both_anchors() {
        let source = catalog(20);
        let page = source
            .fetch_page(PageRequest {
                after: Some(cursor(&source, "p04")),
                before: None,
                limit: 3,
                count_from: Anchor::Photo("p01".into()),
                count_until: Anchor::Photo("p15".into()),
                query: None,
            })
            .await
            .unwrap();
        assert_eq!(ids(&page), vec!["p05", "p06", "p07"]);
        assert_eq!(page.count_before, 3);
        assert_eq!(page.count_after, 7);
        assert_eq!(page.total, 20);
    }

    #[tokio::test]
    async fn pages_before_a_cursor() {
        let source = catalog(20);
        let page = source
            .fetch_page(PageRequest {
                after: None,
                before: Some(cursor(&source, "p02")),
                limit: 5,
                count_from: Anchor::Beginning,
                count_until: Anchor::End,
                query: None,
            })
            .await
            .unwrap();
        assert_eq!(ids(&page), vec!["p00", "p01"]);
        assert_eq!(page.count_before, 0);
        assert_eq!(page.count_after, 18);
    }

    #[tokio::test]
    async fn point_fetch_and_not_found() {
        let source = catalog(5);
        let point = source.fetch_photo(&"p03".into(), None).await.unwrap();
        assert_eq!((point.count_from_start, point.count_to_end), (3, 1));
        assert_eq!(
            source.fetch_photo(&"nope".into(), None).await,
            Err(GalleryError::NotFound("nope".into()))
        );
    }

    #[tokio::test]
    async fn injected_failures_run_out() {
        let source = catalog(3);
        source.fail_next(1);
        assert!(matches!(
            source.fetch_photo(&"p00".into(), None).await,
            Err(GalleryError::InvalidResponse { status: 503, .. })
        ));
        assert!(source.fetch_photo(&"p00".into(), None).await.is_ok());
    }

    #[test]
    fn catalog_json() {
        let catalog: Catalog = serde_json::from_str(
            r#"{
                "photos": [{"id": "b", "created": "2020-01-02T00:00:00Z", "type": "photo", "width": 4, "height": 3},
                           {"id": "a", "created": "2020-01-01T00:00:00Z"}],
                "albums": [{"id": "trip", "name": "Trip", "content": [{"id": "m1", "text": "day one"}]}]
            }"#,
        )
        .unwrap();
        let source = InMemorySource::from_catalog(catalog);
        assert_eq!(source.len(), 2);
        assert_eq!(source.state.read().photos[0].id, PhotoId::from("a"));
        let album = source.album_content(&"trip".into()).unwrap();
        assert_eq!(album.name, "Trip");
        assert_eq!(album.content[0].text.as_deref(), Some("day one"));
    }
}
