mod context;
mod error;
mod models;
mod postgres_store;
mod row_mapper;
mod schema;
mod sqlite_store;
mod target;
mod trait_def;

pub use context::CallContext;
pub use error::{ErrorKind, StoreError};
pub use models::{Album, NewAlbum, Price, PriceError, MAX_PRICE_CENTS};
pub use postgres_store::PostgresAlbumStore;
pub use schema::{SqlDialect, ALBUM_TABLE};
pub use sqlite_store::SqliteAlbumStore;
pub use target::{open_store, StoreSettings, StoreTarget, TargetError};
pub use trait_def::AlbumStore;
