//! Connection-string resolution and store construction.

use super::error::StoreError;
use super::postgres_store::PostgresAlbumStore;
use super::sqlite_store::SqliteAlbumStore;
use super::trait_def::AlbumStore;
use postgres::config::SslMode;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const SQLITE_MEMORY: &str = "sqlite::memory:";
const SQLITE_PREFIX: &str = "sqlite:";

#[derive(Debug, Error)]
pub enum TargetError {
    #[error("empty connection string")]
    Empty,

    #[error("empty SQLite path in {0:?}")]
    EmptySqlitePath(String),

    #[error("invalid PostgreSQL connection string: {0}")]
    Postgres(#[from] postgres::Error),

    #[error("sslmode=require is not supported: connections are made without TLS")]
    TlsRequired,
}

/// Where the album store lives.
#[derive(Clone, Debug)]
pub enum StoreTarget {
    SqliteMemory,
    SqliteFile(PathBuf),
    Postgres(Box<postgres::Config>),
}

impl FromStr for StoreTarget {
    type Err = TargetError;

    /// Accepts `sqlite::memory:`, `sqlite:<path>`, or a PostgreSQL connection
    /// string in key/value (`user=postgres dbname=recordings`) or URL form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(TargetError::Empty);
        }
        if s == SQLITE_MEMORY {
            return Ok(StoreTarget::SqliteMemory);
        }
        if let Some(path) = s.strip_prefix(SQLITE_PREFIX) {
            if path.is_empty() {
                return Err(TargetError::EmptySqlitePath(s.to_string()));
            }
            return Ok(StoreTarget::SqliteFile(PathBuf::from(path)));
        }

        let config = s.parse::<postgres::Config>()?;
        if config.get_ssl_mode() == SslMode::Require {
            return Err(TargetError::TlsRequired);
        }
        Ok(StoreTarget::Postgres(Box::new(config)))
    }
}

impl fmt::Display for StoreTarget {
    // Never prints the password.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreTarget::SqliteMemory => write!(f, "in-memory SQLite"),
            StoreTarget::SqliteFile(path) => write!(f, "SQLite file {:?}", path),
            StoreTarget::Postgres(config) => write!(
                f,
                "PostgreSQL database {:?} as {:?}",
                config.get_dbname().unwrap_or_default(),
                config.get_user().unwrap_or_default()
            ),
        }
    }
}

/// Pool settings shared by all backends.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreSettings {
    /// Upper bound on pooled connections.
    pub max_connections: u32,
    /// How long to wait for a new connection or a free pooled one.
    pub connect_timeout: Duration,
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            max_connections: 4,
            connect_timeout: Duration::from_millis(5_000),
        }
    }
}

/// Opens the store `target` points at.
pub fn open_store(
    target: &StoreTarget,
    settings: &StoreSettings,
) -> Result<Arc<dyn AlbumStore>, StoreError> {
    Ok(match target {
        StoreTarget::SqliteMemory => Arc::new(SqliteAlbumStore::open_in_memory(settings)?),
        StoreTarget::SqliteFile(path) => Arc::new(SqliteAlbumStore::open(path, settings)?),
        StoreTarget::Postgres(config) => {
            Arc::new(PostgresAlbumStore::connect((**config).clone(), settings)?)
        }
    })
}
