//! A windowed, lazily loaded gallery over a [`GallerySource`].
//!
//! The model keeps one [`GallerySequence`] in which unfetched stretches are
//! placeholder runs. Loads fetch a page next to a known photo, bracket it with
//! the neighbours and counts the service reports, and merge it by identity, so
//! overlapping or out-of-order completions converge on the same sequence.
//! Every change is laid out again under the current [`LayoutConfig`] and
//! announced on the model's event channel.

use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tracing::{debug, instrument, trace, warn};

use super::error::{GalleryError, Result};
use super::events::{EVENT_CAPACITY, GalleryEvent};
use super::source::{Anchor, Cursor, GallerySource, Page, PageRequest};
use crate::common::config::{Config, LayoutSettings, LoaderSettings};
use crate::layout_engine::{EstimatedTextMeasure, LayoutConfig, TextMeasure, justified_layout};
use crate::model::{
    Gap, GallerySequence, ImageCache, Item, ItemId, Measure, Measured, MergeResult,
    PhotoDescription, PhotoId, PhotoItem, Placeholder, Side, Summary,
};

/// Share of the container width at either edge of a text block that counts
/// as a drop before or after it.
const TEXT_DROP_BAND: f64 = 0.20;

/// Optional knobs for [`GalleryModel::with_options`].
#[derive(Clone, Default)]
pub struct ModelOptions {
    /// Restricts every fetch to photos matching this search.
    pub query: Option<String>,
    /// Defaults to [`EstimatedTextMeasure`].
    pub text_measure: Option<Arc<dyn TextMeasure>>,
}

/// What surrounds a photo opened with [`GalleryModel::load_around`].
#[derive(Clone, Debug, PartialEq)]
pub struct Neighborhood {
    pub before_id: Option<PhotoId>,
    pub after_id: Option<PhotoId>,
    pub current: Option<PhotoDescription>,
    pub context: Vec<Item>,
}

/// One visible entry with the measures of everything above and below it.
#[derive(Clone, Debug, PartialEq)]
pub struct WindowEntry {
    pub before: Measure,
    pub after: Measure,
    pub item: Item,
}

/// The slice of the gallery between two vertical offsets.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Window {
    pub entries: Vec<WindowEntry>,
    pub before_height: f64,
    pub after_height: f64,
    pub after_start: f64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropTarget {
    Before(ItemId),
    After(ItemId),
}

/// Layout applied to a sequence after it changes.
pub(crate) struct Relayout<'a> {
    config: Option<LayoutConfig>,
    text: &'a dyn TextMeasure,
}

impl Relayout<'_> {
    /// Lays out `items`, or returns them as they are before the first
    /// [`GalleryModel::layout`] call.
    pub(crate) fn apply(&self, items: &GallerySequence) -> GallerySequence {
        match &self.config {
            Some(config) => justified_layout(items, config, self.text),
            None => items.clone(),
        }
    }

    /// Reassembles a merge, laying out only the span whose rows it disturbed.
    ///
    /// A placeholder on either side of `middle` is a row boundary, so layout
    /// stops there; without one it extends over the neighbouring run.
    pub(crate) fn concat(&self, merged: MergeResult) -> GallerySequence {
        let MergeResult { before, middle, after } = merged;
        let bounded_before = before.last().is_some_and(Item::is_placeholder)
            || middle.first().is_some_and(Item::is_placeholder);
        let bounded_after = after.first().is_some_and(Item::is_placeholder)
            || middle.last().is_some_and(Item::is_placeholder);
        trace!(bounded_before, bounded_after, middle = middle.len(), "relayout concat");

        match (bounded_before, bounded_after) {
            (true, true) => GallerySequence::concat3(before, self.apply(&middle), after),
            (true, false) => {
                GallerySequence::concat(before, self.apply(&GallerySequence::concat(middle, after)))
            }
            (false, true) => {
                GallerySequence::concat(self.apply(&GallerySequence::concat(before, middle)), after)
            }
            (false, false) => self.apply(&GallerySequence::concat3(before, middle, after)),
        }
    }
}

#[derive(Default)]
struct ModelState {
    gallery: GallerySequence,
    layout: Option<LayoutConfig>,
    hit_beginning: bool,
    hit_end: bool,
    loads_in_progress: usize,
    /// A load finished successfully since the counter was last at zero.
    dirty: bool,
}

struct Shared<S> {
    source: Arc<S>,
    cache: ImageCache,
    loader: LoaderSettings,
    layout_settings: LayoutSettings,
    query: Option<String>,
    text: Arc<dyn TextMeasure>,
    state: Mutex<ModelState>,
    events: broadcast::Sender<GalleryEvent>,
    started: watch::Sender<bool>,
}

/// Handle to a gallery. Clones share the same sequence and event channel.
pub struct GalleryModel<S> {
    shared: Arc<Shared<S>>,
}

impl<S> Clone for GalleryModel<S> {
    fn clone(&self) -> Self { Self { shared: self.shared.clone() } }
}

impl<S: GallerySource> GalleryModel<S> {
    pub fn new(source: Arc<S>, cache: ImageCache, config: &Config) -> Self {
        Self::with_options(source, cache, config, ModelOptions::default())
    }

    pub fn with_options(
        source: Arc<S>,
        cache: ImageCache,
        config: &Config,
        options: ModelOptions,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let (started, _) = watch::channel(false);
        let text = options.text_measure.unwrap_or_else(|| Arc::new(EstimatedTextMeasure::default()));
        Self {
            shared: Arc::new(Shared {
                source,
                cache,
                loader: config.loader,
                layout_settings: config.layout,
                query: options.query.filter(|q| !q.is_empty()),
                text,
                state: Mutex::new(ModelState::default()),
                events,
                started,
            }),
        }
    }

    pub fn source(&self) -> &Arc<S> { &self.shared.source }

    pub fn cache(&self) -> &ImageCache { &self.shared.cache }

    pub fn query(&self) -> Option<&str> { self.shared.query.as_deref() }

    pub fn loader_settings(&self) -> &LoaderSettings { &self.shared.loader }

    pub fn subscribe(&self) -> broadcast::Receiver<GalleryEvent> { self.shared.events.subscribe() }

    pub fn snapshot(&self) -> GallerySequence { self.shared.state.lock().gallery.clone() }

    pub fn height(&self) -> f64 { self.shared.state.lock().gallery.height() }

    /// Number of items, loaded or not.
    pub fn len(&self) -> usize { self.shared.state.lock().gallery.len() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    pub fn loaded_count(&self) -> usize { self.shared.state.lock().gallery.loaded_count() }

    pub fn is_started(&self) -> bool { *self.shared.started.borrow() }

    pub fn hit_beginning(&self) -> bool { self.shared.state.lock().hit_beginning }

    pub fn hit_end(&self) -> bool { self.shared.state.lock().hit_end }

    pub fn loads_in_progress(&self) -> usize { self.shared.state.lock().loads_in_progress }

    pub fn layout_config(&self) -> Option<LayoutConfig> { self.shared.state.lock().layout }

    pub(crate) fn emit(&self, event: GalleryEvent) {
        trace!(event = event.as_ref(), "gallery event");
        // No receivers is fine.
        _ = self.shared.events.send(event);
    }

    /// Broadcasts a failed operation as `Error` and hands the result back.
    pub(crate) fn report<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            warn!(%err, "gallery operation failed");
            self.emit(GalleryEvent::Error { message: err.to_string() });
        }
        result
    }

    /// Runs `f` on the sequence under the state lock.
    pub(crate) fn mutate<R>(&self, f: impl FnOnce(&mut GallerySequence, &Relayout<'_>) -> R) -> R {
        let mut state = self.shared.state.lock();
        let relayout = Relayout {
            config: state.layout,
            text: &*self.shared.text,
        };
        f(&mut state.gallery, &relayout)
    }

    fn mark_started(&self) {
        let first = self.shared.started.send_if_modified(|started| !std::mem::replace(started, true));
        if first {
            debug!("gallery started");
            self.emit(GalleryEvent::Starts);
        }
    }

    async fn wait_started(&self) -> Result<()> {
        let mut started = self.shared.started.subscribe();
        started
            .wait_for(|started| *started)
            .await
            .map(|_| ())
            .map_err(|_| GalleryError::Source("gallery closed before it started".into()))
    }

    /// Counts `op` as an in-flight load. Failures are broadcast as `Error`; a
    /// single `Load` follows once every load in flight has finished.
    async fn tracked<T>(&self, op: impl Future<Output = Result<T>>) -> Result<T> {
        self.shared.state.lock().loads_in_progress += 1;
        let result = op.await;
        let idle_and_dirty = {
            let mut state = self.shared.state.lock();
            state.loads_in_progress -= 1;
            state.dirty |= result.is_ok();
            let fire = state.loads_in_progress == 0 && state.dirty;
            if state.loads_in_progress == 0 {
                state.dirty = false;
            }
            fire
        };
        let result = self.report(result);
        if idle_and_dirty {
            self.emit(GalleryEvent::Load);
        }
        result
    }

    fn placeholder(&self, count: usize) -> Option<Item> {
        (count > 0).then(|| Placeholder::new(count, self.shared.loader.placeholder_height).into())
    }

    fn photo(&self, id: &PhotoId) -> Item { PhotoItem::new(id.clone(), &self.shared.cache).into() }

    fn cursor(&self, id: &PhotoId) -> Cursor {
        Cursor {
            id: id.clone(),
            created: self.shared.cache.get(id).and_then(|desc| desc.created),
        }
    }

    /// Replaces the whole sequence, then announces `Starts` (once) and `Load`.
    pub fn start(&self, items: impl IntoIterator<Item = Item>) {
        let items = GallerySequence::from_items(items);
        self.mutate(|gallery, relayout| *gallery = relayout.apply(&items));
        self.mark_started();
        self.emit(GalleryEvent::Load);
    }

    /// Seeds the gallery from the source: the first page, or the given photo
    /// surrounded by placeholders for everything else.
    #[instrument(skip_all, fields(?anchor))]
    pub async fn start_from_source(&self, anchor: Option<PhotoId>) -> Result<()> {
        self.tracked(async {
            let (items, hit_beginning, hit_end) = match &anchor {
                None => {
                    let page = self.fetch_page(None, None, Anchor::Beginning, Anchor::End).await?;
                    let mut items: Vec<Item> = page.images.iter().map(|desc| self.photo(&desc.id)).collect();
                    items.extend(self.placeholder(page.count_after));
                    (items, true, page.count_after == 0)
                }
                Some(id) => {
                    let point = self.shared.source.fetch_photo(id, self.query()).await?;
                    self.shared.cache.update(&point.image);
                    let mut items: Vec<Item> = self.placeholder(point.count_from_start).into_iter().collect();
                    items.push(self.photo(&point.image.id));
                    items.extend(self.placeholder(point.count_to_end));
                    (items, point.count_from_start == 0, point.count_to_end == 0)
                }
            };
            debug!(items = items.len(), hit_beginning, hit_end, "seeded gallery");
            let items = GallerySequence::from_items(items);
            {
                let mut state = self.shared.state.lock();
                let relayout = Relayout { config: state.layout, text: &*self.shared.text };
                state.gallery = relayout.apply(&items);
                state.hit_beginning = hit_beginning;
                state.hit_end = hit_end;
            }
            self.mark_started();
            Ok(())
        })
        .await
    }

    async fn fetch_page(
        &self,
        after: Option<Cursor>,
        before: Option<Cursor>,
        count_from: Anchor,
        count_until: Anchor,
    ) -> Result<Page> {
        let request = PageRequest {
            after,
            before,
            limit: self.shared.loader.load_increment,
            count_from,
            count_until,
            query: self.shared.query.clone(),
        };
        debug!(?request, "fetching page");
        let page = self.shared.source.fetch_page(request).await?;
        for image in &page.images {
            self.shared.cache.update(image);
        }
        Ok(page)
    }

    /// Fetches the page following a loaded photo and merges it.
    #[instrument(skip_all, fields(%id))]
    pub async fn load_after(&self, id: &PhotoId) -> Result<()> {
        self.tracked(self.load_after_inner(id)).await
    }

    /// Fetches the page preceding a loaded photo and merges it.
    #[instrument(skip_all, fields(%id))]
    pub async fn load_before(&self, id: &PhotoId) -> Result<()> {
        self.tracked(self.load_before_inner(id)).await
    }

    /// Fills the first unloaded stretch after `id`'s run of loaded photos.
    async fn load_after_inner(&self, id: &PhotoId) -> Result<()> {
        self.wait_started().await?;
        let Some(Gap { prev: Some(anchor), next }) = self.gap(id, GallerySequence::gap_after)? else {
            trace!("nothing unloaded after");
            return Ok(());
        };
        let until = next.clone().map(Anchor::Photo).unwrap_or(Anchor::End);
        let mut page =
            self.fetch_page(Some(self.cursor(&anchor)), None, Anchor::Photo(anchor.clone()), until).await?;
        clamp_page(&mut page, Some(&anchor), next.as_ref());
        self.merge_page(Some(anchor), next, &page)
    }

    /// Fills the last unloaded stretch before `id`'s run of loaded photos.
    async fn load_before_inner(&self, id: &PhotoId) -> Result<()> {
        self.wait_started().await?;
        let Some(Gap { prev, next: Some(anchor) }) = self.gap(id, GallerySequence::gap_before)? else {
            trace!("nothing unloaded before");
            return Ok(());
        };
        let from = prev.clone().map(Anchor::Photo).unwrap_or(Anchor::Beginning);
        let mut page =
            self.fetch_page(None, Some(self.cursor(&anchor)), from, Anchor::Photo(anchor.clone())).await?;
        clamp_page(&mut page, prev.as_ref(), Some(&anchor));
        self.merge_page(prev, Some(anchor), &page)
    }

    fn gap(
        &self,
        id: &PhotoId,
        find: impl FnOnce(&GallerySequence, &PhotoId) -> Option<Gap>,
    ) -> Result<Option<Gap>> {
        let state = self.shared.state.lock();
        if !state.gallery.is_photo_loaded(id) {
            return Err(GalleryError::NotFound(id.clone()));
        }
        let gap = find(&state.gallery, id);
        debug!(?gap, "loading into gap");
        Ok(gap)
    }

    fn merge_page(&self, prev: Option<PhotoId>, next: Option<PhotoId>, page: &Page) -> Result<()> {
        let fetched = self.prepare_merge(prev.as_ref(), next.as_ref(), page);
        self.merge(&fetched)?;
        let mut state = self.shared.state.lock();
        if prev.is_none() && page.count_before == 0 {
            state.hit_beginning = true;
        }
        if next.is_none() && page.count_after == 0 {
            state.hit_end = true;
        }
        Ok(())
    }

    /// Brackets a fetched page with the loaded neighbours it was requested
    /// between, and with placeholders for whatever still separates them.
    fn prepare_merge(
        &self,
        prev: Option<&PhotoId>,
        next: Option<&PhotoId>,
        page: &Page,
    ) -> GallerySequence {
        let fetched = |id: &PhotoId| page.images.iter().any(|desc| desc.id == *id);
        let mut items: Vec<Item> = Vec::new();

        match prev {
            Some(prev) if page.count_before > 0 => {
                items.push(self.photo(prev));
                items.extend(self.placeholder(page.count_before));
            }
            Some(prev) if !fetched(prev) => items.push(self.photo(prev)),
            Some(_) => {}
            None => items.extend(self.placeholder(page.count_before)),
        }

        items.extend(page.images.iter().map(|desc| self.photo(&desc.id)));

        match next {
            Some(next) if page.count_after > 0 => {
                items.extend(self.placeholder(page.count_after));
                items.push(self.photo(next));
            }
            Some(next) if !fetched(next) => items.push(self.photo(next)),
            Some(_) => {}
            None => items.extend(self.placeholder(page.count_after)),
        }

        GallerySequence::from_items(items)
    }

    /// Merges a fetched run into the sequence. On error nothing changes.
    pub(crate) fn merge(&self, fetched: &GallerySequence) -> Result<()> {
        self.mutate(|gallery, relayout| {
            let merged = gallery.merge(fetched)?;
            trace!(
                before = merged.before.len(),
                middle = merged.middle.len(),
                after = merged.after.len(),
                "merged run"
            );
            *gallery = relayout.concat(merged);
            Ok(())
        })
    }

    /// Makes sure `context` items on each side of `id` are loaded, fetching
    /// the photo itself first when it is not, and describes its surroundings.
    #[instrument(skip_all, fields(%id))]
    pub async fn load_around(&self, id: &PhotoId) -> Result<Neighborhood> {
        self.tracked(async {
            self.wait_started().await?;
            let loaded = self.shared.state.lock().gallery.is_photo_loaded(id);
            if loaded {
                let (need_after, need_before) = self.context_needs_load(id)?;
                let after = async {
                    if need_after { self.load_after_inner(id).await } else { Ok(()) }
                };
                let before = async {
                    if need_before { self.load_before_inner(id).await } else { Ok(()) }
                };
                let (after, before) = tokio::join!(after, before);
                after?;
                before?;
            } else {
                let point = self.shared.source.fetch_photo(id, self.query()).await?;
                self.shared.cache.update(&point.image);
                let mut items: Vec<Item> = self.placeholder(point.count_from_start).into_iter().collect();
                items.push(self.photo(id));
                items.extend(self.placeholder(point.count_to_end));
                self.merge(&GallerySequence::from_items(items))?;
                self.load_after_inner(id).await?;
                self.load_before_inner(id).await?;
            }
            self.neighborhood(id)
        })
        .await
    }

    fn context_needs_load(&self, id: &PhotoId) -> Result<(bool, bool)> {
        let context = self.shared.loader.context as isize;
        let state = self.shared.state.lock();
        let (before, _, after) =
            state.gallery.search_for_photo(id).ok_or_else(|| GalleryError::NotFound(id.clone()))?;
        let (near_after, _) = after.split_at_index(context);
        let (_, near_before) = before.split_at_index(-context);
        Ok((near_after.needs_load(), near_before.needs_load()))
    }

    fn neighborhood(&self, id: &PhotoId) -> Result<Neighborhood> {
        let gallery = self.snapshot();
        let (before, _, after) =
            gallery.search_for_photo(id).ok_or_else(|| GalleryError::NotFound(id.clone()))?;
        Ok(Neighborhood {
            before_id: before.measure().last_image,
            after_id: after.measure().first_image,
            current: self.shared.cache.get(id),
            context: self.get_all_around(id),
        })
    }

    /// The photo with up to `context` items on either side, rows excluded.
    pub fn get_all_around(&self, id: &PhotoId) -> Vec<Item> {
        let context = self.shared.loader.context as isize;
        let gallery = self.snapshot();
        let Some((before, current, after)) = gallery.search_for_photo(id) else {
            return Vec::new();
        };
        let (_, near_before) = before.split_at_index(-context);
        let (near_after, _) = after.split_at_index(context);
        near_before
            .iter()
            .chain(std::iter::once(&current))
            .chain(near_after.iter())
            .filter(|item| !item.is_row())
            .cloned()
            .collect()
    }

    /// Items intersecting the vertical range `[min_y, max_y)`.
    pub fn get_between(&self, min_y: f64, max_y: f64) -> Window {
        let gallery = self.snapshot();
        let (above, rest) = gallery.split_at_height(min_y, Side::Before);
        let before_height = above.height();
        let (visible, below) = rest.split_at_height(max_y - before_height, Side::After);

        let items = visible.to_vec();
        let below_measure = below.measure();
        let mut suffixes = Vec::with_capacity(items.len());
        let mut acc = below_measure.clone();
        for item in items.iter().rev() {
            suffixes.push(acc.clone());
            acc = item.measure().combine(&acc);
        }
        suffixes.reverse();

        let mut prefix = above.measure();
        let mut entries = Vec::with_capacity(items.len());
        for (item, after) in items.into_iter().zip(suffixes) {
            let next = prefix.combine(&item.measure());
            entries.push(WindowEntry { before: prefix, after, item });
            prefix = next;
        }

        Window {
            entries,
            before_height,
            after_height: below_measure.height,
            after_start: before_height + visible.height(),
        }
    }

    /// Resolves a point in laid-out coordinates to a drop position.
    pub fn get_item_at(&self, x: f64, y: f64) -> Option<DropTarget> {
        let config = self.layout_config()?;
        let gallery = self.snapshot();
        let (before, rest) = gallery.split_at_height(y, Side::Before);
        let mut rest = rest.iter();

        match rest.next() {
            None => last_item_id(&before).map(DropTarget::After),
            Some(Item::Row(row)) => {
                let mut left = config.margin;
                for item in rest {
                    let Item::Photo(photo) = item else {
                        return None;
                    };
                    let width = photo.display_width.unwrap_or(row.height * photo.aspect_ratio());
                    if x < left + width / 2.0 {
                        return Some(DropTarget::Before(photo.item_id()));
                    }
                    left += width;
                    if x < left {
                        return Some(DropTarget::After(photo.item_id()));
                    }
                    left += config.margin * 2.0;
                }
                None
            }
            Some(Item::Text(text)) => {
                let band = (config.width * TEXT_DROP_BAND).ceil();
                if x <= band {
                    Some(DropTarget::Before(text.id.clone()))
                } else if x >= config.width - band {
                    Some(DropTarget::After(text.id.clone()))
                } else {
                    None
                }
            }
            Some(_) => None,
        }
    }

    /// Lays the gallery out at `width` with the configured row height and margin.
    pub fn layout(&self, width: f64) -> Result<()> {
        self.layout_with(LayoutConfig::new(width, &self.shared.layout_settings))
    }

    /// Switches to `config`; does nothing when it is already in effect.
    pub fn layout_with(&self, config: LayoutConfig) -> Result<()> {
        let issues = config.validate();
        if !issues.is_empty() {
            return Err(GalleryError::InvalidLayout(issues.join("; ")));
        }
        {
            let mut state = self.shared.state.lock();
            if state.layout == Some(config) {
                return Ok(());
            }
            state.layout = Some(config);
        }
        debug!(?config, "layout changed");
        self.relayout();
        Ok(())
    }

    pub fn relayout(&self) {
        self.mutate(|gallery, relayout| *gallery = relayout.apply(gallery));
        self.emit(GalleryEvent::Load);
    }

    fn remove_found(
        &self,
        search: impl FnOnce(&GallerySequence) -> Option<(GallerySequence, Item, GallerySequence)>,
    ) -> Option<Item> {
        let removed = self.mutate(|gallery, relayout| {
            let (before, item, after) = search(gallery)?;
            *gallery = relayout.concat(MergeResult {
                before,
                middle: GallerySequence::new(),
                after,
            });
            Some(item)
        });
        if removed.is_some() {
            self.emit(GalleryEvent::Load);
        }
        removed
    }

    pub fn remove_by_photo_id(&self, id: &PhotoId) -> Option<Item> {
        self.remove_found(|gallery| gallery.search_for_photo(id))
    }

    pub fn remove_by_item_id(&self, id: &ItemId) -> Option<Item> {
        self.remove_found(|gallery| gallery.search_for_item(id))
    }

    /// Inserts a newly uploaded photo at its place in date order. A photo
    /// whose place lies in an unloaded stretch is counted into that stretch
    /// and arrives with the load that covers it. Returns false when the photo
    /// is already loaded.
    pub fn add_photo(&self, desc: &PhotoDescription) -> bool {
        if self.shared.state.lock().gallery.is_photo_loaded(&desc.id) {
            return false;
        }
        self.shared.cache.update(desc);
        let photo = self.photo(&desc.id);
        let loaded = self.mutate(|gallery, relayout| {
            let (merged, loaded) = gallery.insert_by_date(photo, desc.created, &desc.id);
            *gallery = relayout.concat(merged);
            loaded
        });
        debug!(id = %desc.id, loaded, "photo added");
        self.emit(GalleryEvent::Load);
        true
    }

    /// Saves a caption through the source, then updates the shared cache.
    pub async fn update_description(&self, id: &PhotoId, description: &str) -> Result<()> {
        self.report(self.shared.source.update_description(id, description).await)?;
        let mut desc = self.shared.cache.get(id).unwrap_or_else(|| PhotoDescription::new(id.clone()));
        desc.description = Some(description.to_string());
        self.shared.cache.update(&desc);
        self.emit(GalleryEvent::Load);
        Ok(())
    }
}

/// Drops anything a page returned at or beyond the loaded photos bracketing
/// the stretch it was requested for.
fn clamp_page(page: &mut Page, prev: Option<&PhotoId>, next: Option<&PhotoId>) {
    if let Some(at) = next.and_then(|next| page.images.iter().position(|desc| desc.id == *next)) {
        page.images.truncate(at);
        page.count_after = 0;
    }
    if let Some(at) = prev.and_then(|prev| page.images.iter().position(|desc| desc.id == *prev)) {
        page.images.drain(..=at);
        page.count_before = 0;
    }
}

fn last_item_id(seq: &GallerySequence) -> Option<ItemId> {
    let mut seq = seq.clone();
    while let Some(item) = seq.pop_back() {
        if let Some(id) = item.item_id() {
            return Some(id);
        }
    }
    None
}
