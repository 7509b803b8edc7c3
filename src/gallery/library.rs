//! The set of galleries open against one source.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::Mutex;
use tracing::{debug, info};

use super::album::{AlbumId, AlbumModel};
use super::error::Result;
use super::model::{GalleryModel, ModelOptions};
use super::source::GallerySource;
use crate::common::collections::VecDeque;
use crate::common::config::Config;
use crate::model::{ImageCache, PhotoDescription, PhotoId};

/// Owns the main gallery, open albums and recent searches, all sharing one
/// [`ImageCache`].
pub struct Library<S> {
    source: Arc<S>,
    cache: ImageCache,
    config: Config,
    main: Mutex<Option<GalleryModel<S>>>,
    albums: DashMap<AlbumId, AlbumModel<S>>,
    /// Most recently used first.
    searches: Mutex<VecDeque<(String, GalleryModel<S>)>>,
}

impl<S: GallerySource> Library<S> {
    pub fn new(source: Arc<S>, config: Config) -> Self {
        Self {
            source,
            cache: ImageCache::new(),
            config,
            main: Mutex::new(None),
            albums: DashMap::new(),
            searches: Mutex::new(VecDeque::new()),
        }
    }

    pub fn cache(&self) -> &ImageCache { &self.cache }

    pub fn source(&self) -> &Arc<S> { &self.source }

    pub fn config(&self) -> &Config { &self.config }

    /// The date-ordered gallery of every photo, started on first use.
    pub async fn main_gallery(&self) -> Result<GalleryModel<S>> {
        let (model, fresh) = {
            let mut main = self.main.lock();
            match &*main {
                Some(model) => (model.clone(), false),
                None => {
                    let model = GalleryModel::new(self.source.clone(), self.cache.clone(), &self.config);
                    *main = Some(model.clone());
                    (model, true)
                }
            }
        };
        if fresh {
            info!("starting main gallery");
            if let Err(err) = model.start_from_source(None).await {
                *self.main.lock() = None;
                return Err(err);
            }
        }
        Ok(model)
    }

    /// A gallery restricted to `query`. An empty query is the main gallery.
    pub async fn search_gallery(&self, query: &str) -> Result<GalleryModel<S>> {
        if query.is_empty() {
            return self.main_gallery().await;
        }
        let (model, fresh) = {
            let mut searches = self.searches.lock();
            let hit = searches.iter().position(|(q, _)| q == query);
            match hit.and_then(|at| searches.remove(at)) {
                Some(entry) => {
                    let model = entry.1.clone();
                    searches.push_front(entry);
                    (model, false)
                }
                None => {
                    let options = ModelOptions {
                        query: Some(query.to_string()),
                        ..ModelOptions::default()
                    };
                    let model = GalleryModel::with_options(
                        self.source.clone(),
                        self.cache.clone(),
                        &self.config,
                        options,
                    );
                    searches.push_front((query.to_string(), model.clone()));
                    let retained = self.config.loader.max_searches_retained;
                    if searches.len() > retained {
                        debug!(evicted = searches.len() - retained, "dropping old searches");
                        searches.truncate(retained);
                    }
                    (model, true)
                }
            }
        };
        if fresh {
            info!(query, "starting search gallery");
            if let Err(err) = model.start_from_source(None).await {
                self.searches.lock().retain(|(q, _)| q != query);
                return Err(err);
            }
        }
        Ok(model)
    }

    /// Queries currently retained, most recently used first.
    pub fn retained_searches(&self) -> Vec<String> {
        self.searches.lock().iter().map(|(q, _)| q.clone()).collect()
    }

    pub async fn album(&self, id: &AlbumId) -> Result<AlbumModel<S>> {
        let (album, fresh) = match self.albums.entry(id.clone()) {
            Entry::Occupied(entry) => (entry.get().clone(), false),
            Entry::Vacant(entry) => {
                let album =
                    AlbumModel::new(id.clone(), self.source.clone(), self.cache.clone(), &self.config);
                entry.insert(album.clone());
                (album, true)
            }
        };
        if fresh {
            info!(album = %id, "opening album");
            if let Err(err) = album.start_from_source().await {
                self.albums.remove(id);
                return Err(err);
            }
        }
        Ok(album)
    }

    /// Deletes a photo at the source, then from every open gallery and the cache.
    pub async fn delete_photo(&self, id: &PhotoId) -> Result<()> {
        self.source.delete_photo(id).await?;
        let main = self.main.lock().clone();
        if let Some(main) = main {
            main.remove_by_photo_id(id);
        }
        for album in self.albums.iter() {
            album.forget_photo(id);
        }
        let searches: Vec<GalleryModel<S>> =
            self.searches.lock().iter().map(|(_, model)| model.clone()).collect();
        for search in searches {
            search.remove_by_photo_id(id);
        }
        self.cache.remove(id);
        info!(%id, "photo deleted");
        Ok(())
    }

    /// Announces a freshly uploaded photo to the main gallery.
    pub fn photo_uploaded(&self, desc: &PhotoDescription) -> bool {
        let main = self.main.lock().clone();
        match main {
            Some(main) => main.add_photo(desc),
            None => {
                self.cache.update(desc);
                false
            }
        }
    }
}
