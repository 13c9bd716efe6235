mod file_config;

pub use file_config::{FileConfig, StoreFileConfig};

use crate::album_store::{CallContext, StoreSettings, StoreTarget};
use anyhow::{bail, Context, Result};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// CLI arguments that can be overridden by the TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub db: Option<String>,
    pub max_connections: u32,
    pub connect_timeout_ms: u64,
    pub call_timeout_ms: u64,
}

impl Default for CliConfig {
    fn default() -> Self {
        let store = StoreSettings::default();
        Self {
            db: None,
            max_connections: store.max_connections,
            connect_timeout_ms: store.connect_timeout.as_millis() as u64,
            call_timeout_ms: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub target: StoreTarget,
    pub store: StoreSettings,
    /// Deadline applied to every store call, if any.
    pub call_timeout: Option<Duration>,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default().store.unwrap_or_default();

        let connection = file
            .connection
            .or_else(|| cli.db.clone())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "connection string must be specified via --db, ALBUM_STORE_DB or [store] connection"
                )
            })?;
        let target = connection
            .parse::<StoreTarget>()
            .context("Invalid store connection string")?;

        let max_connections = file.max_connections.unwrap_or(cli.max_connections);
        if max_connections == 0 {
            bail!("max_connections must be at least 1");
        }

        let connect_timeout_ms = file.connect_timeout_ms.unwrap_or(cli.connect_timeout_ms);
        if connect_timeout_ms == 0 {
            bail!("connect_timeout_ms must be at least 1");
        }

        let call_timeout_ms = file.call_timeout_ms.unwrap_or(cli.call_timeout_ms);
        let call_timeout = (call_timeout_ms > 0).then(|| Duration::from_millis(call_timeout_ms));

        Ok(Self {
            target,
            store: StoreSettings {
                max_connections,
                connect_timeout: Duration::from_millis(connect_timeout_ms),
            },
            call_timeout,
        })
    }

    /// Context for one store call, cancelled through `token`.
    pub fn call_context(&self, token: &CancellationToken) -> CallContext {
        let ctx = match self.call_timeout {
            Some(timeout) => CallContext::with_timeout(timeout),
            None => CallContext::background(),
        };
        ctx.with_cancellation(token.clone())
    }
}
