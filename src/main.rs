use album_catalog::config::{AppConfig, CliConfig, FileConfig};
use album_catalog::{open_store, Album, AlbumStore, NewAlbum, Price, StoreError};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEMO_ARTIST: &str = "Betty Carter";
const DEMO_ALBUM_ID: i64 = 2;
const DEMO_TITLE: &str = "The Modern Sound of Betty Carter";
const DEMO_PRICE_CENTS: i64 = 4999;

#[derive(Parser, Debug)]
#[command(about = "Query and populate the album catalog")]
struct CliArgs {
    /// Store connection string: `sqlite::memory:`, `sqlite:<path>` or a
    /// PostgreSQL connection string.
    #[clap(long, env = "ALBUM_STORE_DB")]
    pub db: Option<String>,

    /// Path to a TOML config file. Values in the file override CLI flags.
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Upper bound on pooled store connections.
    #[clap(long, default_value_t = 4)]
    pub max_connections: u32,

    /// How long to wait for a store connection, in milliseconds.
    #[clap(long, default_value_t = 5000)]
    pub connect_timeout_ms: u64,

    /// Deadline for every store call in milliseconds, 0 for none.
    #[clap(long, default_value_t = 0)]
    pub call_timeout_ms: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the album schema and exit.
    Init,
    /// Print the albums of an artist as JSON.
    ByArtist { name: String },
    /// Print one album as JSON.
    ById { id: i64 },
    /// Add an album unless one with the same title and artist exists.
    Add {
        #[clap(long)]
        title: String,
        #[clap(long)]
        artist: String,
        /// Decimal price with at most two fractional digits, e.g. 49.99.
        #[clap(long)]
        price: Price,
    },
    /// Walk through listing, lookup and insertion against the store.
    Demo,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            db: self.db.clone(),
            max_connections: self.max_connections,
            connect_timeout_ms: self.connect_timeout_ms,
            call_timeout_ms: self.call_timeout_ms,
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config from {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    let shutdown = CancellationToken::new();
    let ctrlc_token = shutdown.clone();
    ctrlc::set_handler(move || {
        warn!("Interrupted, cancelling store call");
        ctrlc_token.cancel();
    })
    .context("Failed to install Ctrl-C handler")?;

    info!("Opening {}...", config.target);
    let store = open_store(&config.target, &config.store)
        .with_context(|| format!("Failed to open {}", config.target))?;
    store
        .ping(&config.call_context(&shutdown))
        .context("Store is not reachable")?;
    println!("Connected!");
    store
        .ensure_schema(&config.call_context(&shutdown))
        .context("Failed to create album schema")?;

    let ctx = config.call_context(&shutdown);
    match cli_args.command {
        Command::Init => Ok(()),
        Command::ByArtist { name } => {
            let albums = store.albums_by_artist(&ctx, &name)?;
            print_json(&albums)
        }
        Command::ById { id } => {
            let album = store.album_by_id(&ctx, id)?;
            print_json(&album)
        }
        Command::Add {
            title,
            artist,
            price,
        } => match store.add_album(&ctx, &NewAlbum::new(title, artist, price)) {
            Ok(id) => {
                println!("{}", id);
                Ok(())
            }
            Err(StoreError::AlreadyExists { id, .. }) => {
                bail!("Album already exists with ID {}", id)
            }
            Err(err) => Err(err.into()),
        },
        Command::Demo => run_demo(store.as_ref(), &config, &shutdown),
    }
}

fn run_demo(store: &dyn AlbumStore, config: &AppConfig, shutdown: &CancellationToken) -> Result<()> {
    let albums: Vec<Album> = store.albums_by_artist(&config.call_context(shutdown), DEMO_ARTIST)?;
    println!("Albums found: {}", serde_json::to_string(&albums)?);

    match store.album_by_id(&config.call_context(shutdown), DEMO_ALBUM_ID) {
        Ok(album) => println!("Album found: {}", serde_json::to_string(&album)?),
        Err(err) if err.is_not_found() => println!("{}", err),
        Err(err) => return Err(err.into()),
    }

    let price = Price::from_cents(DEMO_PRICE_CENTS)?;
    let candidate = NewAlbum::new(DEMO_TITLE, DEMO_ARTIST, price);
    match store.add_album(&config.call_context(shutdown), &candidate) {
        Ok(id) => println!("ID of added album: {}", id),
        Err(err @ StoreError::AlreadyExists { .. }) => println!("{}", err),
        Err(err) => return Err(err.into()),
    }
    Ok(())
}
