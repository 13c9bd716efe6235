//! SQLite-backed album store.
//!
//! Connections come from an r2d2 pool. File databases run in WAL mode with a
//! busy timeout so pooled writers queue instead of failing. An in-memory
//! database lives only as long as its single connection, so that pool is
//! pinned to one connection that is never recycled.

use super::context::CallContext;
use super::error::{OpLabel, StoreError};
use super::models::{Album, NewAlbum};
use super::row_mapper::{encode_price, AlbumRow};
use super::schema::{SqlDialect, ALBUM_TABLE};
use super::target::StoreSettings;
use super::trait_def::AlbumStore;
use r2d2::{ManageConnection, Pool};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SELECT_BY_ARTIST: &str =
    "SELECT id, title, artist, price FROM album WHERE artist = ?1 ORDER BY id";
const SELECT_BY_ID: &str = "SELECT id, title, artist, price FROM album WHERE id = ?1";
const INSERT_IF_ABSENT: &str = "INSERT INTO album (title, artist, price) VALUES (?1, ?2, ?3) \
     ON CONFLICT (title, artist) DO NOTHING RETURNING id";
const SELECT_ID_BY_NATURAL_KEY: &str = "SELECT id FROM album WHERE title = ?1 AND artist = ?2";

#[derive(Clone, Debug)]
enum SqliteLocation {
    Memory,
    File(PathBuf),
}

/// r2d2 connection manager for rusqlite connections.
#[derive(Debug)]
pub struct SqliteConnectionManager {
    location: SqliteLocation,
}

impl ManageConnection for SqliteConnectionManager {
    type Connection = Connection;
    type Error = rusqlite::Error;

    fn connect(&self) -> Result<Connection, rusqlite::Error> {
        let conn = match &self.location {
            SqliteLocation::Memory => Connection::open_in_memory()?,
            SqliteLocation::File(path) => {
                let conn = Connection::open_with_flags(
                    path,
                    OpenFlags::SQLITE_OPEN_READ_WRITE
                        | OpenFlags::SQLITE_OPEN_CREATE
                        | OpenFlags::SQLITE_OPEN_URI
                        | OpenFlags::SQLITE_OPEN_NO_MUTEX,
                )?;
                conn.busy_timeout(BUSY_TIMEOUT)?;
                conn.pragma_update(None, "journal_mode", "WAL")?;
                conn
            }
        };
        Ok(conn)
    }

    fn is_valid(&self, conn: &mut Connection) -> Result<(), rusqlite::Error> {
        conn.query_row("SELECT 1", [], |_| Ok(()))
    }

    fn has_broken(&self, _conn: &mut Connection) -> bool {
        false
    }
}

/// SQLite-backed album store.
#[derive(Clone)]
pub struct SqliteAlbumStore {
    pool: Pool<SqliteConnectionManager>,
    acquire_timeout: Duration,
}

impl SqliteAlbumStore {
    /// Open (creating if needed) the SQLite database at `db_path`.
    pub fn open<P: AsRef<Path>>(db_path: P, settings: &StoreSettings) -> Result<Self, StoreError> {
        let path = db_path.as_ref().to_path_buf();
        info!("Opening SQLite album store at {:?}", path);
        let manager = SqliteConnectionManager {
            location: SqliteLocation::File(path),
        };
        let pool = Pool::builder()
            .max_size(settings.max_connections)
            .connection_timeout(settings.connect_timeout)
            .build(manager)
            .map_err(|err| OpLabel::new("open", "").connection(err))?;
        Ok(SqliteAlbumStore {
            pool,
            acquire_timeout: settings.connect_timeout,
        })
    }

    /// Open a private in-memory database. `max_connections` is ignored.
    pub fn open_in_memory(settings: &StoreSettings) -> Result<Self, StoreError> {
        info!("Opening in-memory SQLite album store");
        let manager = SqliteConnectionManager {
            location: SqliteLocation::Memory,
        };
        let pool = Pool::builder()
            .max_size(1)
            .min_idle(Some(1))
            .idle_timeout(None)
            .max_lifetime(None)
            .test_on_check_out(false)
            .connection_timeout(settings.connect_timeout)
            .build(manager)
            .map_err(|err| OpLabel::new("open", "").connection(err))?;
        Ok(SqliteAlbumStore {
            pool,
            acquire_timeout: settings.connect_timeout,
        })
    }

    /// Run `f` on a pooled connection under `ctx`. The watcher interrupts the
    /// running statement if `ctx` aborts, and any error raised after an abort
    /// is reported as the abort.
    fn run<T>(
        &self,
        ctx: &CallContext,
        op: &OpLabel,
        f: impl FnOnce(&Connection) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let conn = ctx.checkout(&self.pool, op, self.acquire_timeout)?;
        let interrupt = conn.get_interrupt_handle();
        let watcher = ctx.watch(op, move || interrupt.interrupt());
        let result = f(&conn);
        drop(watcher);
        result.map_err(|err| ctx.resolve(op, err))
    }
}

impl AlbumStore for SqliteAlbumStore {
    fn ping(&self, ctx: &CallContext) -> Result<(), StoreError> {
        let op = OpLabel::new("ping", "");
        self.run(ctx, &op, |conn| {
            conn.query_row("SELECT 1", [], |_| Ok(()))
                .map_err(|err| op.connection(err))
        })
    }

    fn ensure_schema(&self, ctx: &CallContext) -> Result<(), StoreError> {
        let op = OpLabel::new("ensure_schema", "");
        self.run(ctx, &op, |conn| {
            conn.execute_batch(&ALBUM_TABLE.create_batch(SqlDialect::Sqlite))
                .map_err(|err| op.schema(err))
        })?;
        info!("Album schema ready");
        Ok(())
    }

    fn albums_by_artist(&self, ctx: &CallContext, name: &str) -> Result<Vec<Album>, StoreError> {
        let op = OpLabel::quoted("albums_by_artist", name);
        debug!("Querying albums by artist {:?}", name);
        self.run(ctx, &op, |conn| {
            let mut stmt = conn
                .prepare_cached(SELECT_BY_ARTIST)
                .map_err(|err| op.query(err))?;
            // Dropping `rows` on any early return resets the statement.
            let mut rows = stmt.query(params![name]).map_err(|err| op.query(err))?;

            let mut albums = Vec::new();
            while let Some(row) = rows.next().map_err(|err| op.query(err))? {
                let raw = AlbumRow::from_sqlite(row).map_err(|err| op.decode(err))?;
                albums.push(Album::try_from(raw).map_err(|err| op.decode(err))?);
            }
            Ok(albums)
        })
    }

    fn album_by_id(&self, ctx: &CallContext, id: i64) -> Result<Album, StoreError> {
        let op = OpLabel::new("album_by_id", id.to_string());
        debug!("Querying album by id {}", id);
        self.run(ctx, &op, |conn| {
            let mut stmt = conn
                .prepare_cached(SELECT_BY_ID)
                .map_err(|err| op.query(err))?;
            let mut rows = stmt.query(params![id]).map_err(|err| op.query(err))?;
            let row = rows
                .next()
                .map_err(|err| op.query(err))?
                .ok_or(StoreError::NotFound { id })?;
            let raw = AlbumRow::from_sqlite(row).map_err(|err| op.decode(err))?;
            Album::try_from(raw).map_err(|err| op.decode(err))
        })
    }

    fn add_album(&self, ctx: &CallContext, candidate: &NewAlbum) -> Result<i64, StoreError> {
        let op = OpLabel::new(
            "add_album",
            format!("{:?} by {:?}", candidate.title, candidate.artist),
        );
        let price = encode_price(candidate.price);

        let id = self.run(ctx, &op, |conn| {
            let inserted: Option<i64> = conn
                .query_row(
                    INSERT_IF_ABSENT,
                    params![candidate.title, candidate.artist, price],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|err| op.insert(err))?;
            if let Some(id) = inserted {
                return Ok(id);
            }

            let existing: Option<i64> = conn
                .query_row(
                    SELECT_ID_BY_NATURAL_KEY,
                    params![candidate.title, candidate.artist],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|err| op.query(err))?;
            match existing {
                Some(id) => Err(StoreError::AlreadyExists {
                    id,
                    title: candidate.title.clone(),
                    artist: candidate.artist.clone(),
                }),
                None => Err(op.insert("insert skipped but no conflicting album was found")),
            }
        });

        match &id {
            Ok(id) => info!("Inserted album with ID {}", id),
            Err(StoreError::AlreadyExists { id, .. }) => warn!(
                "Album {:?} by {:?} already exists with ID {}",
                candidate.title, candidate.artist, id
            ),
            Err(_) => {}
        }
        id
    }
}
