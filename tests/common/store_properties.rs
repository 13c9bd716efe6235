//! Behaviour every `AlbumStore` backend must show.
//!
//! Each check takes a store with the schema already ensured and uses its own
//! artist names, so the checks can share one PostgreSQL database.

use super::constants::*;
use super::fixtures::{background, price, sample_albums, unique_name};
use album_catalog::{AlbumStore, ErrorKind, NewAlbum, StoreError};
use std::collections::BTreeSet;
use std::sync::{Arc, Barrier};
use std::thread;

pub fn by_artist_returns_exactly_their_albums(store: &dyn AlbumStore) {
    let coltrane = unique_name("John Coltrane");
    let mulligan = unique_name("Gerry Mulligan");
    let ctx = background();

    let mut ids = Vec::new();
    for album in sample_albums(&coltrane, &mulligan) {
        ids.push(store.add_album(&ctx, &album).unwrap());
    }

    let found = store.albums_by_artist(&ctx, &coltrane).unwrap();
    let titles: Vec<&str> = found.iter().map(|a| a.title.as_str()).collect();
    assert_eq!(titles, vec!["Blue Train", "Giant Steps"]);
    assert_eq!(found[0].id, ids[0]);
    assert_eq!(found[1].id, ids[1]);
    assert!(found.iter().all(|a| a.artist == coltrane));
    assert!(found[0].id < found[1].id);

    let found = store.albums_by_artist(&ctx, &mulligan).unwrap();
    assert_eq!(found.len(), 2);
    assert_eq!(found[1].price, price("34.98"));
}

pub fn unknown_artist_yields_empty_list(store: &dyn AlbumStore) {
    let albums = store
        .albums_by_artist(&background(), &unique_name("Nobody"))
        .unwrap();
    assert!(albums.is_empty());
}

pub fn artist_match_is_exact(store: &dyn AlbumStore) {
    let artist = unique_name("Sarah Vaughan");
    let ctx = background();
    store
        .add_album(&ctx, &NewAlbum::new("Sassy", artist.clone(), price("20.00")))
        .unwrap();

    assert!(store
        .albums_by_artist(&ctx, &artist.to_lowercase())
        .unwrap()
        .is_empty());
    assert!(store
        .albums_by_artist(&ctx, &format!("{} ", artist))
        .unwrap()
        .is_empty());
    assert_eq!(store.albums_by_artist(&ctx, &artist).unwrap().len(), 1);
}

pub fn unknown_id_is_not_found(store: &dyn AlbumStore) {
    for id in [-1, 0, i64::MAX] {
        let err = store.album_by_id(&background(), id).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { id: missing } if missing == id));
        assert_eq!(err.to_string(), format!("album_by_id {}: no such album", id));
    }
}

pub fn duplicate_is_rejected_with_existing_id(store: &dyn AlbumStore) {
    let artist = unique_name("Gerry Mulligan");
    let ctx = background();

    let first = store
        .add_album(&ctx, &NewAlbum::new("Jeru", artist.clone(), price("9.99")))
        .unwrap();
    let err = store
        .add_album(&ctx, &NewAlbum::new("Jeru", artist.clone(), price("12.50")))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    assert_eq!(err.existing_id(), Some(first));

    let albums = store.albums_by_artist(&ctx, &artist).unwrap();
    assert_eq!(albums.len(), 1);
    assert_eq!(albums[0].price, price("9.99"));
}

pub fn same_title_by_other_artist_is_distinct(store: &dyn AlbumStore) {
    let ctx = background();
    let first = store
        .add_album(
            &ctx,
            &NewAlbum::new("Standards", unique_name("Artist A"), price("10.00")),
        )
        .unwrap();
    let second = store
        .add_album(
            &ctx,
            &NewAlbum::new("Standards", unique_name("Artist B"), price("10.00")),
        )
        .unwrap();
    assert_ne!(first, second);
}

pub fn round_trip_is_exact(store: &dyn AlbumStore, artist: &str) {
    let ctx = background();
    let id = store
        .add_album(&ctx, &NewAlbum::new(DEMO_TITLE, artist, price(DEMO_PRICE)))
        .unwrap();

    let album = store.album_by_id(&ctx, id).unwrap();
    assert_eq!(album.id, id);
    assert_eq!(album.title, DEMO_TITLE);
    assert_eq!(album.artist, artist);
    assert_eq!(album.price.to_string(), "49.99");
    assert_eq!(album.price.cents(), 4999);
}

pub fn prices_survive_storage_exactly(store: &dyn AlbumStore) {
    let artist = unique_name("Price Check");
    let ctx = background();
    let prices = ["0.00", "0.01", "0.10", "1.05", "17.99", "99999999.99"];

    for (n, text) in prices.iter().enumerate() {
        let id = store
            .add_album(
                &ctx,
                &NewAlbum::new(format!("Album {}", n), artist.clone(), price(text)),
            )
            .unwrap();
        assert_eq!(store.album_by_id(&ctx, id).unwrap().price, price(text));
    }
}

pub fn concurrent_adds_have_one_winner(store: Arc<dyn AlbumStore>) {
    let artist = unique_name("Betty Carter");
    let barrier = Arc::new(Barrier::new(CONCURRENT_WRITERS));

    let handles: Vec<_> = (0..CONCURRENT_WRITERS)
        .map(|n| {
            let store = store.clone();
            let barrier = barrier.clone();
            let album = NewAlbum::new("Inside Betty Carter", artist.clone(), price("20.00"));
            thread::spawn(move || {
                barrier.wait();
                (n, store.add_album(&background(), &album))
            })
        })
        .collect();

    let mut winners = Vec::new();
    let mut existing = BTreeSet::new();
    for handle in handles {
        match handle.join().unwrap() {
            (_, Ok(id)) => winners.push(id),
            (n, Err(err)) => {
                assert_eq!(
                    err.kind(),
                    ErrorKind::AlreadyExists,
                    "writer {} failed: {}",
                    n,
                    err
                );
                existing.insert(err.existing_id().unwrap());
            }
        }
    }

    assert_eq!(winners.len(), 1);
    assert!(existing.len() <= 1);
    if let Some(id) = existing.first() {
        assert_eq!(*id, winners[0]);
    }

    let albums = store.albums_by_artist(&background(), &artist).unwrap();
    assert_eq!(albums.len(), 1);
    assert_eq!(albums[0].id, winners[0]);
}

pub fn ensure_schema_is_idempotent(store: &dyn AlbumStore) {
    let ctx = background();
    let artist = unique_name("Schema Check");
    let id = store
        .add_album(&ctx, &NewAlbum::new("Kept", artist.clone(), price("1.00")))
        .unwrap();

    store.ensure_schema(&ctx).unwrap();
    store.ensure_schema(&ctx).unwrap();

    assert_eq!(store.album_by_id(&ctx, id).unwrap().artist, artist);
}

pub fn ping_succeeds(store: &dyn AlbumStore) {
    store.ping(&background()).unwrap();
}
