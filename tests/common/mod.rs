//! Common test infrastructure
//!
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::store_properties;
//!
//! #[test]
//! fn test_round_trip() {
//!     let store = album_catalog::open_store(&"sqlite::memory:".parse().unwrap(), &Default::default()).unwrap();
//!     store_properties::round_trip_is_exact(store.as_ref(), "Betty Carter");
//! }
//! ```
#![allow(dead_code)]

mod constants;
mod fixtures;
mod server;
pub mod store_properties;

pub use constants::*;
pub use fixtures::{background, price, sample_albums, unique_name};
pub use server::TestServer;
