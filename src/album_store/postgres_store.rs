//! PostgreSQL-backed album store.
//!
//! Uses a bounded r2d2 pool of synchronous `postgres` clients without TLS.
//! Prices travel as text and are cast to and from `NUMERIC(10, 2)` on the
//! server, so no binary floating point ever touches them.

use super::context::CallContext;
use super::error::{OpLabel, StoreError};
use super::models::{Album, NewAlbum};
use super::row_mapper::{encode_price, AlbumRow};
use super::schema::{SqlDialect, ALBUM_TABLE};
use super::target::StoreSettings;
use super::trait_def::AlbumStore;
use postgres::{Client, NoTls};
use r2d2::Pool;
use r2d2_postgres::PostgresConnectionManager;
use tracing::{debug, info, warn};

// `id` is cast to BIGINT both ways so tables created with a 32-bit SERIAL key
// still decode as `i64`.
const SELECT_BY_ARTIST: &str = "SELECT id::BIGINT, title, artist, price::TEXT FROM album \
     WHERE artist = $1 ORDER BY id";
const SELECT_BY_ID: &str =
    "SELECT id::BIGINT, title, artist, price::TEXT FROM album WHERE id = $1::BIGINT";
const INSERT_IF_ABSENT: &str = "INSERT INTO album (title, artist, price) \
     VALUES ($1, $2, CAST($3::TEXT AS NUMERIC(10, 2))) \
     ON CONFLICT (title, artist) DO NOTHING RETURNING id::BIGINT";
const SELECT_ID_BY_NATURAL_KEY: &str =
    "SELECT id::BIGINT FROM album WHERE title = $1 AND artist = $2";

/// PostgreSQL-backed album store.
#[derive(Clone)]
pub struct PostgresAlbumStore {
    pool: Pool<PostgresConnectionManager<NoTls>>,
    acquire_timeout: std::time::Duration,
}

impl PostgresAlbumStore {
    /// Connect to the database described by `config`.
    ///
    /// Fails with [`StoreError::Connection`] when the pool cannot establish
    /// its connections within `settings.connect_timeout`.
    pub fn connect(
        mut config: postgres::Config,
        settings: &StoreSettings,
    ) -> Result<Self, StoreError> {
        info!(
            "Connecting to PostgreSQL album store {:?}",
            config.get_dbname().unwrap_or_default()
        );
        config.connect_timeout(settings.connect_timeout);
        let manager = PostgresConnectionManager::new(config, NoTls);
        let pool = Pool::builder()
            .max_size(settings.max_connections)
            .connection_timeout(settings.connect_timeout)
            .build(manager)
            .map_err(|err| OpLabel::new("connect", "").connection(err))?;
        Ok(PostgresAlbumStore {
            pool,
            acquire_timeout: settings.connect_timeout,
        })
    }

    /// Run `f` on a pooled client under `ctx`. When `ctx` aborts mid-call the
    /// watcher asks the server to cancel the running statement.
    fn run<T>(
        &self,
        ctx: &CallContext,
        op: &OpLabel,
        f: impl FnOnce(&mut Client) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut conn = ctx.checkout(&self.pool, op, self.acquire_timeout)?;
        let cancel_token = conn.cancel_token();
        let watcher = ctx.watch(op, move || {
            if let Err(err) = cancel_token.cancel_query(NoTls) {
                warn!("Failed to cancel running query: {}", err);
            }
        });
        let result = f(&mut conn);
        drop(watcher);
        result.map_err(|err| ctx.resolve(op, err))
    }
}

impl AlbumStore for PostgresAlbumStore {
    fn ping(&self, ctx: &CallContext) -> Result<(), StoreError> {
        let op = OpLabel::new("ping", "");
        self.run(ctx, &op, |client| {
            client
                .batch_execute("SELECT 1")
                .map_err(|err| op.connection(err))
        })
    }

    fn ensure_schema(&self, ctx: &CallContext) -> Result<(), StoreError> {
        let op = OpLabel::new("ensure_schema", "");
        self.run(ctx, &op, |client| {
            client
                .batch_execute(&ALBUM_TABLE.create_batch(SqlDialect::Postgres))
                .map_err(|err| op.schema(err))
        })?;
        info!("Album schema ready");
        Ok(())
    }

    fn albums_by_artist(&self, ctx: &CallContext, name: &str) -> Result<Vec<Album>, StoreError> {
        let op = OpLabel::quoted("albums_by_artist", name);
        debug!("Querying albums by artist {:?}", name);
        self.run(ctx, &op, |client| {
            // `query` drains the portal before returning.
            let rows = client
                .query(SELECT_BY_ARTIST, &[&name])
                .map_err(|err| op.query(err))?;
            rows.iter()
                .map(|row| {
                    let raw = AlbumRow::from_postgres(row).map_err(|err| op.decode(err))?;
                    Album::try_from(raw).map_err(|err| op.decode(err))
                })
                .collect()
        })
    }

    fn album_by_id(&self, ctx: &CallContext, id: i64) -> Result<Album, StoreError> {
        let op = OpLabel::new("album_by_id", id.to_string());
        debug!("Querying album by id {}", id);
        self.run(ctx, &op, |client| {
            let row = client
                .query_opt(SELECT_BY_ID, &[&id])
                .map_err(|err| op.query(err))?
                .ok_or(StoreError::NotFound { id })?;
            let raw = AlbumRow::from_postgres(&row).map_err(|err| op.decode(err))?;
            Album::try_from(raw).map_err(|err| op.decode(err))
        })
    }

    fn add_album(&self, ctx: &CallContext, candidate: &NewAlbum) -> Result<i64, StoreError> {
        let op = OpLabel::new(
            "add_album",
            format!("{:?} by {:?}", candidate.title, candidate.artist),
        );
        let price = encode_price(candidate.price);

        let id = self.run(ctx, &op, |client| {
            let inserted = client
                .query_opt(
                    INSERT_IF_ABSENT,
                    &[&candidate.title, &candidate.artist, &price],
                )
                .map_err(|err| op.insert(err))?;
            if let Some(row) = inserted {
                return row.try_get::<_, i64>(0).map_err(|err| op.decode(err));
            }

            let existing = client
                .query_opt(
                    SELECT_ID_BY_NATURAL_KEY,
                    &[&candidate.title, &candidate.artist],
                )
                .map_err(|err| op.query(err))?;
            match existing {
                Some(row) => Err(StoreError::AlreadyExists {
                    id: row.try_get(0).map_err(|err| op.decode(err))?,
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
