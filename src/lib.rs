//! Album Catalog Library
//!
//! This library exposes the album store, configuration and HTTP front
//! modules to the binaries and to integration tests.

pub mod album_store;
pub mod config;
pub mod server;

// Re-export commonly used types for convenience
pub use album_store::{
    open_store, Album, AlbumStore, CallContext, ErrorKind, NewAlbum, PostgresAlbumStore, Price,
    SqliteAlbumStore, StoreError, StoreSettings, StoreTarget,
};
pub use server::{run_server, RequestsLoggingLevel, ServerConfig};
