//! AlbumStore trait definition.
//!
//! The trait abstracts album persistence so callers hold an explicitly
//! constructed store (`Arc<dyn AlbumStore>`) instead of a global handle, and
//! tests can run against an in-memory SQLite store.

use super::context::CallContext;
use super::error::StoreError;
use super::models::{Album, NewAlbum};

/// Trait for album storage backends.
///
/// Every call borrows one pooled connection for its whole duration and
/// returns it before completing, on success and on error alike.
pub trait AlbumStore: Send + Sync {
    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Round-trip to the store to prove it is reachable.
    fn ping(&self, ctx: &CallContext) -> Result<(), StoreError>;

    /// Create the album relation and its indices when missing. Idempotent.
    fn ensure_schema(&self, ctx: &CallContext) -> Result<(), StoreError>;

    // =========================================================================
    // Reads
    // =========================================================================

    /// All albums whose artist is exactly `name`, ordered by id.
    /// An empty vector when there are none.
    fn albums_by_artist(&self, ctx: &CallContext, name: &str) -> Result<Vec<Album>, StoreError>;

    /// The album with surrogate key `id`, or [`StoreError::NotFound`].
    fn album_by_id(&self, ctx: &CallContext, id: i64) -> Result<Album, StoreError>;

    // =========================================================================
    // Writes
    // =========================================================================

    /// Insert `candidate` unless an album with the same title and artist
    /// exists, returning the new surrogate key.
    ///
    /// The check and the insert are a single atomic statement, so concurrent
    /// callers with the same title and artist see exactly one success; every
    /// other caller gets [`StoreError::AlreadyExists`] with the existing key.
    fn add_album(&self, ctx: &CallContext, candidate: &NewAlbum) -> Result<i64, StoreError>;
}
