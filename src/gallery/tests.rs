use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use tokio::sync::broadcast;

use crate::common::collections::HashSet;
use crate::common::config::{Config, LoaderSettings};
use crate::gallery::album::NEW_TEXT;
use crate::gallery::{
    AlbumContent, AlbumEntry, AlbumId, AlbumModel, Catalog, DropTarget, GalleryError,
    GalleryEvent, GalleryModel, GallerySource, InMemorySource, Library, StoredAlbum,
};
use crate::layout_engine::LayoutConfig;
use crate::model::{
    GallerySequence, ImageCache, Item, ItemId, MediaKind, PhotoDescription, PhotoId, PhotoItem,
    Placeholder,
};

fn day(i: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 1, 1, 12, 0, 0).unwrap() + Duration::days(i64::from(i))
}

fn described(i: u32) -> PhotoDescription {
    PhotoDescription {
        created: Some(day(i)),
        kind: Some(MediaKind::Photo),
        width: Some(300),
        height: Some(300),
        description: Some(if i % 2 == 0 { "a cat".into() } else { "a dog".into() }),
        ..PhotoDescription::new(format!("p{i:03}"))
    }
}

fn source(n: u32) -> Arc<InMemorySource> {
    let source = InMemorySource::new();
    for i in 0..n {
        source.insert_photo(described(i));
    }
    Arc::new(source)
}

fn config() -> Config {
    Config {
        loader: LoaderSettings {
            load_increment: 10,
            context: 5,
            placeholder_height: 100.0,
            max_searches_retained: 2,
        },
        ..Config::default()
    }
}

fn gallery(source: &Arc<InMemorySource>) -> GalleryModel<InMemorySource> {
    GalleryModel::new(source.clone(), ImageCache::new(), &config())
}

fn id(i: u32) -> PhotoId { PhotoId::from(format!("p{i:03}")) }

fn shape(seq: &GallerySequence) -> Vec<String> {
    seq.iter()
        .filter(|item| !item.is_row())
        .map(|item| match item {
            Item::Photo(p) => p.id.to_string(),
            Item::Text(t) => format!("text:{}", t.id),
            Item::Placeholder(p) => format!("ph:{}", p.count),
            Item::Row(_) => unreachable!(),
        })
        .collect()
}

fn item_ids(seq: &GallerySequence) -> Vec<String> {
    seq.iter().filter_map(Item::item_id).map(|id| id.to_string()).collect()
}

fn assert_no_duplicates(seq: &GallerySequence) {
    let mut seen = HashSet::default();
    for photo in seq.iter().filter_map(Item::photo_id) {
        assert!(seen.insert(photo.clone()), "{photo} appears twice");
    }
}

fn drain(rx: &mut broadcast::Receiver<GalleryEvent>) -> Vec<GalleryEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn square_layout() -> LayoutConfig {
    LayoutConfig { width: 300.0, target_row_height: 100.0, margin: 0.0 }
}

mod loading {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test_log::test(tokio::test)]
    async fn first_page_is_followed_by_a_placeholder() {
        let source = source(50);
        let model = gallery(&source);
        let mut events = model.subscribe();

        model.start_from_source(None).await.unwrap();

        let seq = model.snapshot();
        assert_eq!(seq.len(), 50);
        assert_eq!(model.loaded_count(), 10);
        assert_eq!(shape(&seq).last().map(String::as_str), Some("ph:40"));
        assert!(model.is_started());
        assert!(model.hit_beginning());
        assert!(!model.hit_end());
        assert_eq!(drain(&mut events), vec![GalleryEvent::Starts, GalleryEvent::Load]);
    }

    #[test_log::test(tokio::test)]
    async fn loading_forward_fills_placeholders_until_the_end() {
        let source = source(50);
        let model = gallery(&source);
        model.start_from_source(None).await.unwrap();

        model.load_after(&id(9)).await.unwrap();
        let seq = model.snapshot();
        assert_eq!(seq.len(), 50);
        assert_eq!(model.loaded_count(), 20);
        assert_eq!(shape(&seq)[19], "p019");
        assert_eq!(shape(&seq)[20], "ph:30");
        assert!(!model.hit_end());

        for last in [19, 29, 39] {
            model.load_after(&id(last)).await.unwrap();
        }
        let seq = model.snapshot();
        assert_eq!(seq.len(), 50);
        assert_eq!(model.loaded_count(), 50);
        assert!(!seq.needs_load());
        assert!(model.hit_end());
        assert_no_duplicates(&seq);
    }

    #[test_log::test(tokio::test)]
    async fn repeated_and_overlapping_loads_do_not_duplicate() {
        let source = source(40);
        let model = gallery(&source);
        model.start_from_source(None).await.unwrap();

        let edge = id(9);
        let (a, b) = tokio::join!(model.load_after(&edge), model.load_after(&edge));
        a.unwrap();
        b.unwrap();
        assert_eq!(model.loaded_count(), 30);
        model.load_after(&id(5)).await.unwrap();

        let seq = model.snapshot();
        assert_no_duplicates(&seq);
        assert_eq!(seq.len(), 40);
        assert_eq!(model.loaded_count(), 40);
        assert!(model.hit_end());
        assert_eq!(model.loads_in_progress(), 0);
    }

    #[test_log::test(tokio::test)]
    async fn loading_before_an_interior_photo_fills_the_nearest_gap() {
        let source = source(40);
        let model = gallery(&source);
        model.start_from_source(Some(id(30))).await.unwrap();
        model.load_before(&id(30)).await.unwrap();
        assert_eq!(shape(&model.snapshot())[..2].to_vec(), vec!["ph:20", "p020"]);

        model.load_before(&id(25)).await.unwrap();
        let seq = model.snapshot();
        assert_eq!(shape(&seq)[..2].to_vec(), vec!["ph:10", "p010"]);
        assert_eq!(seq.len(), 40);
        assert_eq!(model.loaded_count(), 21);
        assert_no_duplicates(&seq);
    }

    #[test_log::test(tokio::test)]
    async fn gaps_shorter_than_a_page_fill_exactly() {
        let source = source(40);
        let model = gallery(&source);
        model.start_from_source(None).await.unwrap();
        model.load_around(&id(25)).await.unwrap();
        let seq = model.snapshot();
        assert_eq!(shape(&seq)[9..12].to_vec(), vec!["p009", "ph:5", "p015"]);
        assert_eq!(shape(&seq).last().map(String::as_str), Some("ph:4"));

        model.load_before(&id(20)).await.unwrap();
        let seq = model.snapshot();
        assert_eq!(shape(&seq)[9..16].to_vec(), (9..16).map(|i| id(i).to_string()).collect::<Vec<_>>());
        assert_eq!(model.loaded_count(), 36);
        assert_no_duplicates(&seq);

        model.load_after(&id(3)).await.unwrap();
        let seq = model.snapshot();
        assert_eq!(shape(&seq), (0..40).map(|i| id(i).to_string()).collect::<Vec<_>>());
        assert!(model.hit_end());
    }

    #[test_log::test(tokio::test)]
    async fn mixed_loads_keep_every_photo_once_and_in_order() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        const TOTAL: u32 = 120;
        for seed in 0..4 {
            let source = source(TOTAL);
            let model = gallery(&source);
            model.start_from_source(None).await.unwrap();
            let mut rng = StdRng::seed_from_u64(seed);

            for _ in 0..30 {
                let target = id(rng.gen_range(0..TOTAL));
                let loaded = model.snapshot().is_photo_loaded(&target);
                let result = match rng.gen_range(0..3) {
                    0 => model.load_around(&target).await.map(drop),
                    1 => model.load_after(&target).await,
                    _ => model.load_before(&target).await,
                };
                match result {
                    Err(GalleryError::NotFound(missing)) if !loaded => assert_eq!(missing, target),
                    other => other.unwrap(),
                }

                let seq = model.snapshot();
                assert_eq!(seq.len(), TOTAL as usize, "seed {seed}");
                assert_no_duplicates(&seq);
                let photos: Vec<_> = seq.iter().filter_map(Item::photo_id).cloned().collect();
                assert!(photos.windows(2).all(|pair| pair[0] < pair[1]), "seed {seed}: {photos:?}");
                assert_eq!(model.loads_in_progress(), 0);
            }
        }
    }

    #[test_log::test(tokio::test)]
    async fn loads_wait_for_the_gallery_to_start() {
        let source = source(30);
        let model = gallery(&source);
        let cache = model.cache().clone();
        cache.update(&described(0));

        let first = id(0);
        let (loaded, ()) = tokio::join!(model.load_after(&first), async {
            tokio::task::yield_now().await;
            model.start([
                Item::from(PhotoItem::new(id(0), &cache)),
                Placeholder::new(29, 100.0).into(),
            ]);
        });
        loaded.unwrap();
        assert_eq!(model.loaded_count(), 11);
        assert_eq!(model.len(), 30);
    }

    #[test_log::test(tokio::test)]
    async fn starting_at_a_photo_surrounds_it_with_placeholders() {
        let source = source(30);
        let model = gallery(&source);
        model.start_from_source(Some(id(12))).await.unwrap();

        assert_eq!(shape(&model.snapshot()), vec!["ph:12", "p012", "ph:17"]);
        assert!(!model.hit_beginning());
        assert!(!model.hit_end());

        model.load_before(&id(12)).await.unwrap();
        assert_eq!(shape(&model.snapshot())[..3].to_vec(), vec!["ph:2", "p002", "p003"]);
        assert!(!model.hit_beginning());

        model.load_before(&id(2)).await.unwrap();
        assert_eq!(shape(&model.snapshot())[..2].to_vec(), vec!["p000", "p001"]);
        assert!(model.hit_beginning());
        assert_eq!(model.len(), 30);
    }

    #[test_log::test(tokio::test)]
    async fn failed_load_reports_and_leaves_the_window() {
        let source = source(30);
        let model = gallery(&source);
        model.start_from_source(None).await.unwrap();
        let before = model.snapshot();
        let mut events = model.subscribe();

        source.fail_next(1);
        let err = model.load_after(&id(9)).await.unwrap_err();

        assert!(matches!(err, GalleryError::InvalidResponse { status: 503, .. }));
        assert_eq!(model.snapshot(), before);
        assert_eq!(model.loads_in_progress(), 0);
        assert_eq!(drain(&mut events), vec![GalleryEvent::Error { message: err.to_string() }]);

        model.load_after(&id(9)).await.unwrap();
        assert_eq!(model.loaded_count(), 20);
    }

    #[test_log::test(tokio::test)]
    async fn loading_after_an_unloaded_photo_is_not_found() {
        let source = source(30);
        let model = gallery(&source);
        model.start_from_source(None).await.unwrap();
        assert_eq!(model.load_after(&id(20)).await, Err(GalleryError::NotFound(id(20))));
    }
}

mod around {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test_log::test(tokio::test)]
    async fn jumping_to_an_unloaded_photo_loads_its_context() {
        let source = source(100);
        let model = gallery(&source);
        model.start_from_source(None).await.unwrap();

        let around = model.load_around(&id(50)).await.unwrap();

        let seq = model.snapshot();
        assert_eq!(seq.len(), 100);
        assert_eq!(model.loaded_count(), 31);
        assert_no_duplicates(&seq);
        assert_eq!(around.before_id, Some(id(49)));
        assert_eq!(around.after_id, Some(id(51)));
        assert_eq!(around.current.map(|desc| desc.id), Some(id(50)));
        let context: Vec<_> = around.context.iter().filter_map(Item::photo_id).cloned().collect();
        assert_eq!(context, (45..=55).map(id).collect::<Vec<_>>());
    }

    #[test_log::test(tokio::test)]
    async fn loaded_photo_with_context_fetches_nothing() {
        let source = source(100);
        let model = gallery(&source);
        model.start_from_source(None).await.unwrap();
        model.load_around(&id(50)).await.unwrap();
        let requests = source.page_requests().len();

        let around = model.load_around(&id(50)).await.unwrap();
        assert_eq!(source.page_requests().len(), requests);
        assert_eq!(around.context.len(), 11);
    }

    #[test_log::test(tokio::test)]
    async fn loaded_photo_near_a_gap_loads_that_side() {
        let source = source(100);
        let model = gallery(&source);
        model.start_from_source(None).await.unwrap();
        let requests = source.page_requests().len();

        let around = model.load_around(&id(8)).await.unwrap();
        assert_eq!(source.page_requests().len(), requests + 1);
        assert_eq!(around.after_id, Some(id(9)));
        assert_eq!(model.loaded_count(), 20);
        assert_no_duplicates(&model.snapshot());
    }

    #[test_log::test(tokio::test)]
    async fn unknown_photo_surfaces_not_found() {
        let source = source(10);
        let model = gallery(&source);
        model.start_from_source(None).await.unwrap();
        let mut events = model.subscribe();

        let missing = PhotoId::from("missing");
        assert_eq!(model.load_around(&missing).await, Err(GalleryError::NotFound(missing.clone())));
        assert!(matches!(drain(&mut events).as_slice(), [GalleryEvent::Error { .. }]));
    }
}

mod window {
    use pretty_assertions::assert_eq;

    use super::*;

    fn nine_squares() -> GalleryModel<InMemorySource> {
        let model = gallery(&source(0));
        let cache = model.cache().clone();
        let items: Vec<Item> = (0..9)
            .map(|i| {
                cache.update(&described(i));
                PhotoItem::new(id(i), &cache).into()
            })
            .collect();
        model.layout_with(square_layout()).unwrap();
        model.start(items);
        model
    }

    #[test]
    fn rows_of_three_squares() {
        let model = nine_squares();
        assert_eq!(model.height(), 300.0);
        assert_eq!(model.snapshot().iter().filter(|item| item.is_row()).count(), 3);
    }

    #[test]
    fn between_returns_whole_rows_with_measures() {
        let model = nine_squares();
        let window = model.get_between(150.0, 190.0);

        assert_eq!(window.entries.len(), 4);
        assert!(window.entries[0].item.is_row());
        assert_eq!(window.entries[1].item.photo_id(), Some(&id(3)));
        assert_eq!(window.before_height, 100.0);
        assert_eq!(window.after_height, 100.0);
        assert_eq!(window.after_start, 200.0);

        assert_eq!(window.entries[0].before.height, 100.0);
        assert_eq!(window.entries[0].after.height, 100.0);
        assert_eq!(window.entries[1].before.height, 200.0);
        assert_eq!(window.entries[1].before.count, 3);
        assert_eq!(window.entries[3].after.count, 3);
    }

    #[test]
    fn between_past_the_end_is_empty() {
        let model = nine_squares();
        let window = model.get_between(400.0, 500.0);
        assert!(window.entries.is_empty());
        assert_eq!(window.before_height, 300.0);
    }

    #[test]
    fn item_at_splits_photos_in_halves() {
        let model = nine_squares();
        let item = |i: u32| ItemId::from(&id(i));
        assert_eq!(model.get_item_at(10.0, 150.0), Some(DropTarget::Before(item(3))));
        assert_eq!(model.get_item_at(60.0, 150.0), Some(DropTarget::After(item(3))));
        assert_eq!(model.get_item_at(120.0, 150.0), Some(DropTarget::Before(item(4))));
        assert_eq!(model.get_item_at(299.0, 250.0), Some(DropTarget::After(item(8))));
        assert_eq!(model.get_item_at(10.0, 900.0), Some(DropTarget::After(item(8))));
    }

    #[test]
    fn item_at_needs_a_layout() {
        let model = gallery(&source(0));
        assert_eq!(model.get_item_at(0.0, 0.0), None);
    }

    #[test]
    fn removing_relays_out_the_rest() {
        let model = nine_squares();
        let mut events = model.subscribe();

        let removed = model.remove_by_photo_id(&id(4)).unwrap();
        assert_eq!(removed.photo_id(), Some(&id(4)));
        assert!(!model.snapshot().is_photo_loaded(&id(4)));
        assert_eq!(model.loaded_count(), 8);
        assert_eq!(drain(&mut events), vec![GalleryEvent::Load]);

        assert_eq!(model.remove_by_photo_id(&id(4)), None);
        assert!(drain(&mut events).is_empty());
    }

    #[test]
    fn layout_with_same_config_is_a_no_op() {
        let model = nine_squares();
        let mut events = model.subscribe();
        model.layout_with(square_layout()).unwrap();
        assert!(drain(&mut events).is_empty());

        model.layout_with(LayoutConfig { width: 450.0, ..square_layout() }).unwrap();
        assert_eq!(drain(&mut events), vec![GalleryEvent::Load]);
        assert_eq!(model.height(), 112.5 + 90.0);
    }
}

mod edits {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test_log::test(tokio::test)]
    async fn new_photos_land_in_date_order() {
        let source = source(20);
        let model = gallery(&source);
        model.start_from_source(None).await.unwrap();

        let upload = PhotoDescription {
            created: Some(day(3) + Duration::hours(1)),
            kind: Some(MediaKind::Photo),
            ..PhotoDescription::new("new")
        };
        assert!(model.add_photo(&upload));
        assert!(!model.add_photo(&upload));

        let shape = shape(&model.snapshot());
        assert_eq!(shape[..6].to_vec(), vec!["p000", "p001", "p002", "p003", "new", "p004"]);
        assert_eq!(model.len(), 21);
    }

    #[test_log::test(tokio::test)]
    async fn upload_into_an_unloaded_stretch_arrives_with_its_load() {
        let source = source(50);
        let model = gallery(&source);
        model.start_from_source(None).await.unwrap();

        let upload = PhotoDescription {
            created: Some(day(30) - Duration::hours(1)),
            kind: Some(MediaKind::Photo),
            ..PhotoDescription::new("new")
        };
        source.insert_photo(upload.clone());
        assert!(model.add_photo(&upload));
        assert!(!model.snapshot().is_photo_loaded(&upload.id));
        assert_eq!(shape(&model.snapshot()).last().map(String::as_str), Some("ph:41"));

        for _ in 0..6 {
            model.load_after(&id(9)).await.unwrap();
        }
        let seq = model.snapshot();
        assert!(!seq.needs_load());
        assert_eq!(seq.len(), 51);
        assert_no_duplicates(&seq);
        assert_eq!(shape(&seq)[29..32].to_vec(), vec!["p029", "new", "p030"]);
    }

    #[test_log::test(tokio::test)]
    async fn upload_ahead_of_the_loaded_run_loads_in_place() {
        let source = source(40);
        let model = gallery(&source);
        model.start_from_source(Some(id(30))).await.unwrap();
        model.load_before(&id(30)).await.unwrap();

        let upload = PhotoDescription {
            created: Some(day(5) + Duration::hours(1)),
            kind: Some(MediaKind::Photo),
            ..PhotoDescription::new("new")
        };
        source.insert_photo(upload.clone());
        assert!(model.add_photo(&upload));
        assert_eq!(shape(&model.snapshot())[..2].to_vec(), vec!["ph:21", "p020"]);

        for first in [20, 10, 1] {
            model.load_before(&id(first)).await.unwrap();
        }
        let seq = model.snapshot();
        assert!(model.hit_beginning());
        assert_eq!(seq.len(), 41);
        assert_no_duplicates(&seq);
        assert_eq!(shape(&seq)[..8].to_vec(), vec!["p000", "p001", "p002", "p003", "p004", "p005", "new", "p006"]);
    }

    #[test_log::test(tokio::test)]
    async fn description_updates_write_through() {
        let source = source(5);
        let model = gallery(&source);
        model.start_from_source(None).await.unwrap();

        model.update_description(&id(1), "a cow").await.unwrap();
        let cached = model.cache().get(&id(1)).unwrap();
        assert_eq!(cached.description.as_deref(), Some("a cow"));
        assert_eq!(cached.created, Some(day(1)));

        let point = source.fetch_photo(&id(1), Some("cow")).await.unwrap();
        assert_eq!(point.image.id, id(1));
    }
}

mod albums {
    use pretty_assertions::assert_eq;

    use super::*;

    fn album_source() -> Arc<InMemorySource> {
        let entry = |id: &str, photo: Option<u32>, text: Option<&str>| AlbumEntry {
            id: id.into(),
            created: Some(day(0)),
            photo: photo.map(described),
            text: text.map(str::to_string),
        };
        Arc::new(InMemorySource::from_catalog(Catalog {
            photos: (0..3).map(described).collect(),
            albums: vec![StoredAlbum {
                id: "trip".into(),
                content: AlbumContent {
                    name: "Trip".into(),
                    created: Some(day(0)),
                    content: vec![
                        entry("m1", Some(0), None),
                        entry("t1", None, Some("hello")),
                        entry("m2", Some(1), None),
                        entry("m3", Some(2), None),
                        entry("junk", None, None),
                    ],
                },
            }],
        }))
    }

    async fn open(source: &Arc<InMemorySource>) -> AlbumModel<InMemorySource> {
        let album = AlbumModel::new("trip".into(), source.clone(), ImageCache::new(), &config());
        album.start_from_source().await.unwrap();
        album
    }

    fn stored_order(source: &InMemorySource) -> Vec<String> {
        let content = source.album_content(&"trip".into()).unwrap();
        content.content.iter().map(|entry| entry.id.to_string()).collect()
    }

    #[test_log::test(tokio::test)]
    async fn content_becomes_items_addressed_by_membership() {
        let source = album_source();
        let album = open(&source).await;
        assert_eq!(album.name(), "Trip");
        assert_eq!(item_ids(&album.gallery().snapshot()), vec!["m1", "t1", "m2", "m3"]);
        assert!(album.gallery().snapshot().is_photo_loaded(&id(2)));
    }

    #[test_log::test(tokio::test)]
    async fn reorder_moves_locally_and_in_the_source() {
        let source = album_source();
        let album = open(&source).await;

        album.reorder(&"m3".into(), DropTarget::Before("m1".into())).await.unwrap();
        assert_eq!(item_ids(&album.gallery().snapshot()), vec!["m3", "m1", "t1", "m2"]);
        assert_eq!(stored_order(&source), vec!["m3", "m1", "t1", "m2", "junk"]);

        let mut events = album.gallery().subscribe();
        album.reorder(&"m1".into(), DropTarget::After("m3".into())).await.unwrap();
        album.reorder(&"t1".into(), DropTarget::Before("m2".into())).await.unwrap();
        assert!(drain(&mut events).is_empty());

        album.reorder(&"m3".into(), DropTarget::After("m2".into())).await.unwrap();
        assert_eq!(item_ids(&album.gallery().snapshot()), vec!["m1", "t1", "m2", "m3"]);
        assert_eq!(stored_order(&source), vec!["m1", "t1", "m2", "junk", "m3"]);
    }

    #[test_log::test(tokio::test)]
    async fn text_blocks_are_edited_added_and_removed() {
        let source = album_source();
        let album = open(&source).await;

        album.set_text(&"t1".into(), "bye").await.unwrap();
        let stored = source.album_content(&"trip".into()).unwrap();
        assert_eq!(stored.content[1].text.as_deref(), Some("bye"));

        let added = album.add_text_around(f64::MAX).await.unwrap();
        let ids = item_ids(&album.gallery().snapshot());
        assert_eq!(ids.last(), Some(&added.to_string()));
        assert!(ids.iter().all(|id| !id.starts_with("local-")));
        let stored = source.album_content(&"trip".into()).unwrap();
        let last = stored.content.last().and_then(|entry| entry.text.as_deref());
        assert_eq!(last, Some(NEW_TEXT));

        album.remove_album_item(&"t1".into()).await.unwrap();
        assert!(!album.gallery().snapshot().is_item_loaded(&"t1".into()));
        assert!(stored_order(&source).iter().all(|id| id != "t1"));
    }

    #[test_log::test(tokio::test)]
    async fn renaming_and_failures() {
        let source = album_source();
        let album = open(&source).await;

        assert_eq!(album.set_name("Holiday").await.unwrap(), "Holiday");
        assert_eq!(album.name(), "Holiday");

        let mut events = album.gallery().subscribe();
        source.fail_next(1);
        assert!(album.set_name("Nope").await.is_err());
        assert_eq!(album.name(), "Holiday");
        assert!(matches!(drain(&mut events).as_slice(), [GalleryEvent::Error { .. }]));

        let missing = AlbumModel::new("gone".into(), source.clone(), ImageCache::new(), &config());
        assert_eq!(
            missing.start_from_source().await,
            Err(GalleryError::AlbumNotFound(AlbumId::from("gone")))
        );
        assert!(source.fetch_album(&"trip".into()).await.is_ok());
    }
}

mod library {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test_log::test(tokio::test)]
    async fn searches_are_kept_most_recent_first() {
        let library = Library::new(source(30), config());

        let cats = library.search_gallery("cat").await.unwrap();
        assert_eq!(cats.len(), 15);
        library.search_gallery("dog").await.unwrap();
        library.search_gallery("cat").await.unwrap();
        assert_eq!(library.retained_searches(), vec!["cat", "dog"]);

        library.search_gallery("p01").await.unwrap();
        assert_eq!(library.retained_searches(), vec!["p01", "cat"]);

        let main = library.search_gallery("").await.unwrap();
        assert_eq!(main.len(), 30);
        assert_eq!(library.retained_searches(), vec!["p01", "cat"]);
    }

    #[test_log::test(tokio::test)]
    async fn deleting_a_photo_reaches_every_gallery() {
        let source = source(30);
        let library = Library::new(source.clone(), config());
        let main = library.main_gallery().await.unwrap();
        let cats = library.search_gallery("cat").await.unwrap();
        assert!(cats.snapshot().is_photo_loaded(&id(0)));

        library.delete_photo(&id(0)).await.unwrap();

        assert!(!main.snapshot().is_photo_loaded(&id(0)));
        assert!(!cats.snapshot().is_photo_loaded(&id(0)));
        assert!(!library.cache().contains(&id(0)));
        assert_eq!(source.len(), 29);
        assert_eq!(
            library.delete_photo(&id(0)).await,
            Err(GalleryError::NotFound(id(0)))
        );
    }

    #[test_log::test(tokio::test)]
    async fn galleries_share_one_cache() {
        let library = Library::new(source(30), config());
        let main = library.main_gallery().await.unwrap();
        let again = library.main_gallery().await.unwrap();
        assert_eq!(again.len(), main.len());
        assert!(library.cache().contains(&id(0)));

        let upload = PhotoDescription { created: Some(day(40)), ..described(99) };
        library.source().insert_photo(upload.clone());
        assert!(library.photo_uploaded(&upload));
        assert!(!main.snapshot().is_photo_loaded(&upload.id));
        assert_eq!(main.len(), 31);

        for _ in 0..5 {
            main.load_after(&id(9)).await.unwrap();
        }
        let seq = main.snapshot();
        assert!(seq.is_photo_loaded(&upload.id));
        assert_eq!(seq.len(), 31);
        assert_no_duplicates(&seq);
    }

    #[test_log::test(tokio::test)]
    async fn missing_albums_are_not_retained() {
        let library = Library::new(source(3), config());
        assert!(matches!(
            library.album(&"nope".into()).await,
            Err(GalleryError::AlbumNotFound(_))
        ));
    }
}
