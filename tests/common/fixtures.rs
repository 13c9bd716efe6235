//! Test data.

use album_catalog::{CallContext, NewAlbum, Price};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static NAME_COUNTER: AtomicUsize = AtomicUsize::new(0);

pub fn background() -> CallContext {
    CallContext::background()
}

pub fn price(text: &str) -> Price {
    text.parse().expect("valid test price")
}

/// A name no other test (or earlier run against the same database) uses.
pub fn unique_name(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!(
        "{} {}-{}-{}",
        prefix,
        std::process::id(),
        nanos,
        NAME_COUNTER.fetch_add(1, Ordering::SeqCst)
    )
}

/// Albums by two artists, with `coltrane` and `mulligan` substituted for the
/// artist names so runs against a shared database stay isolated.
pub fn sample_albums(coltrane: &str, mulligan: &str) -> Vec<NewAlbum> {
    vec![
        NewAlbum::new("Blue Train", coltrane, price("56.99")),
        NewAlbum::new("Giant Steps", coltrane, price("63.99")),
        NewAlbum::new("Jeru", mulligan, price("17.99")),
        NewAlbum::new("Sarah Vaughan", mulligan, price("34.98")),
    ]
}
