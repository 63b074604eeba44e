use std::{str::FromStr, time::Duration};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tokio::fs;
use tracing::info;

use super::{
    error::{SqlDaoError, SqlResult},
    schema::ensure_schema,
};
use crate::dao::scoped_store::DEFAULT_DATABASE_URL;

const MAX_CONNECTIONS: u32 = 5;

/// Runtime configuration describing how to reach the relational store.
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    pub url: String,
}

impl SqliteConfig {
    /// Construct a configuration from an explicit connection string.
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DATABASE_URL)
    }
}

/// Open a connection pool and make sure the comment and record tables exist.
pub async fn connect(config: &SqliteConfig) -> SqlResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.url)
        .map_err(|source| SqlDaoError::InvalidUrl {
            url: config.url.clone(),
            source,
        })?
        .create_if_missing(true);

    let pool_options = if config.is_in_memory() {
        // An in-memory database lives only as long as its connection.
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
    } else {
        if let Some(parent) = options
            .get_filename()
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
        {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| SqlDaoError::PrepareDirectory {
                    url: config.url.clone(),
                    source,
                })?;
        }
        SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(Duration::from_secs(5))
    };

    let pool = pool_options
        .connect_with(options)
        .await
        .map_err(|source| SqlDaoError::Connect {
            url: config.url.clone(),
            source,
        })?;

    ensure_schema(&pool).await?;
    info!(url = %config.url, "connected to relational store");
    Ok(pool)
}
