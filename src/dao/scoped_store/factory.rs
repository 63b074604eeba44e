use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{CommentStore, RecordStore, json::JsonStore, memory::MemoryStore};
use crate::{
    dao::{
        models::{CommentEntity, RecordEntity, Scope},
        storage::{StorageError, StorageResult},
    },
    state::category::ItemCategory,
};

#[cfg(feature = "sqlite-store")]
use super::sqlite::{SqliteCommentStore, SqliteConfig, SqliteRecordStore, connect};

/// Filesystem root used by the JSON backend when no `path` option is configured.
pub const DEFAULT_DATA_PATH: &str = "./data";
/// Connection string used by the database backend when no `url` option is configured.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://./data/database.db?mode=rwc";

/// Which concrete implementation backs every scope of the process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackendKind {
    #[default]
    Memory,
    Json,
    Database,
}

impl StorageBackendKind {
    /// Configuration name of the backend.
    pub fn as_str(self) -> &'static str {
        match self {
            StorageBackendKind::Memory => "memory",
            StorageBackendKind::Json => "json",
            StorageBackendKind::Database => "database",
        }
    }
}

impl fmt::Display for StorageBackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageBackendKind {
    type Err = StorageError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageBackendKind::Memory),
            "json" => Ok(StorageBackendKind::Json),
            "database" => Ok(StorageBackendKind::Database),
            _ => Err(StorageError::unsupported(value)),
        }
    }
}

/// Per-kind options; keys irrelevant to the selected kind are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BackendOptions {
    /// Filesystem root of the JSON backend.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Connection string of the database backend.
    #[serde(default)]
    pub url: Option<String>,
}

impl BackendOptions {
    /// Configured JSON root, or [`DEFAULT_DATA_PATH`].
    pub fn path(&self) -> &Path {
        self.path
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_DATA_PATH))
    }

    /// Configured connection string, or [`DEFAULT_DATABASE_URL`].
    pub fn url(&self) -> &str {
        self.url.as_deref().unwrap_or(DEFAULT_DATABASE_URL)
    }
}

enum Backend {
    Memory,
    Json {
        root: PathBuf,
    },
    #[cfg(feature = "sqlite-store")]
    Database {
        pool: sqlx::SqlitePool,
    },
}

/// Hands out scoped comment and record stores for the backend chosen at startup.
///
/// Stores are opened lazily on first access to a scope and cached for the lifetime of the
/// factory, so every caller of one scope shares a single instance and its lock.
pub struct StoreFactory {
    backend: Backend,
    comments: DashMap<Scope, Arc<CommentStore>>,
    records: DashMap<Scope, Arc<RecordStore>>,
}

impl StoreFactory {
    /// Build the factory for `kind`, connecting to the database when needed.
    ///
    /// Fails with [`StorageError::UnsupportedBackend`] when the kind is not compiled in.
    pub async fn select(kind: StorageBackendKind, options: &BackendOptions) -> StorageResult<Self> {
        let backend = match kind {
            StorageBackendKind::Memory => Backend::Memory,
            StorageBackendKind::Json => Backend::Json {
                root: options.path().to_owned(),
            },
            #[cfg(feature = "sqlite-store")]
            StorageBackendKind::Database => {
                let pool = connect(&SqliteConfig::new(options.url())).await?;
                Backend::Database { pool }
            }
            #[cfg(not(feature = "sqlite-store"))]
            StorageBackendKind::Database => return Err(StorageError::unsupported(kind.as_str())),
        };

        info!(backend = %kind, "storage backend selected");
        Ok(Self::with_backend(backend))
    }

    /// Factory over process memory only.
    pub fn memory() -> Self {
        Self::with_backend(Backend::Memory)
    }

    fn with_backend(backend: Backend) -> Self {
        Self {
            backend,
            comments: DashMap::new(),
            records: DashMap::new(),
        }
    }

    /// Kind of the selected backend.
    pub fn kind(&self) -> StorageBackendKind {
        match self.backend {
            Backend::Memory => StorageBackendKind::Memory,
            Backend::Json { .. } => StorageBackendKind::Json,
            #[cfg(feature = "sqlite-store")]
            Backend::Database { .. } => StorageBackendKind::Database,
        }
    }

    /// Comment store of one item.
    pub async fn comments(
        &self,
        category: ItemCategory,
        item_name: &str,
    ) -> StorageResult<Arc<CommentStore>> {
        let scope = Scope::item(category, item_name);
        let cached = self.comments.get(&scope).map(|entry| Arc::clone(entry.value()));
        if let Some(store) = cached {
            return Ok(store);
        }

        let created: Arc<CommentStore> = match &self.backend {
            Backend::Memory => Arc::new(MemoryStore::<CommentEntity>::new()),
            Backend::Json { root } => Arc::new(JsonStore::<CommentEntity>::open(root, &scope).await?),
            #[cfg(feature = "sqlite-store")]
            Backend::Database { pool } => {
                Arc::new(SqliteCommentStore::new(pool.clone(), scope.clone()))
            }
        };
        debug!(category = %category, item = item_name, "opened comment scope");

        // A concurrent opener may have won the race; keep whichever instance landed first.
        Ok(Arc::clone(self.comments.entry(scope).or_insert(created).value()))
    }

    /// Record store of one leaderboard attached to an item.
    pub async fn records(
        &self,
        category: ItemCategory,
        item_name: &str,
        leaderboard_name: &str,
    ) -> StorageResult<Arc<RecordStore>> {
        let scope = Scope::leaderboard(category, item_name, leaderboard_name);
        let cached = self.records.get(&scope).map(|entry| Arc::clone(entry.value()));
        if let Some(store) = cached {
            return Ok(store);
        }

        let created: Arc<RecordStore> = match &self.backend {
            Backend::Memory => Arc::new(MemoryStore::<RecordEntity>::new()),
            Backend::Json { root } => Arc::new(JsonStore::<RecordEntity>::open(root, &scope).await?),
            #[cfg(feature = "sqlite-store")]
            Backend::Database { pool } => {
                Arc::new(SqliteRecordStore::new(pool.clone(), scope.clone()))
            }
        };
        debug!(
            category = %category,
            item = item_name,
            leaderboard = leaderboard_name,
            "opened record scope"
        );

        Ok(Arc::clone(self.records.entry(scope).or_insert(created).value()))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Map;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn kinds_parse_from_configuration_names() {
        assert_eq!("memory".parse::<StorageBackendKind>().unwrap(), StorageBackendKind::Memory);
        assert_eq!("JSON".parse::<StorageBackendKind>().unwrap(), StorageBackendKind::Json);
        assert_eq!(
            "database".parse::<StorageBackendKind>().unwrap(),
            StorageBackendKind::Database
        );

        let err = "redis".parse::<StorageBackendKind>().unwrap_err();
        assert!(matches!(err, StorageError::UnsupportedBackend { kind } if kind == "redis"));
    }

    #[test]
    fn options_fall_back_to_defaults() {
        let options = BackendOptions::default();
        assert_eq!(options.path(), Path::new(DEFAULT_DATA_PATH));
        assert_eq!(options.url(), DEFAULT_DATABASE_URL);
    }

    #[tokio::test]
    async fn same_scope_shares_one_store() {
        let factory = StoreFactory::memory();
        let first = factory.comments(ItemCategory::Post, "p1").await.unwrap();
        let again = factory.comments(ItemCategory::Post, "p1").await.unwrap();
        let other = factory.comments(ItemCategory::Level, "p1").await.unwrap();

        assert!(Arc::ptr_eq(&first, &again));
        assert!(!Arc::ptr_eq(&first, &other));
    }

    #[tokio::test]
    async fn memory_scopes_live_for_the_factory_lifetime() {
        let factory = StoreFactory::memory();
        let store = factory
            .records(ItemCategory::Level, "lv", "top")
            .await
            .unwrap();
        store
            .add(RecordEntity {
                name: "r1".into(),
                rank: "1".into(),
                player: "alice".into(),
                value: "100".into(),
                payload: Map::new(),
            })
            .await
            .unwrap();
        drop(store);

        let reopened = factory
            .records(ItemCategory::Level, "lv", "top")
            .await
            .unwrap();
        assert_eq!(reopened.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn json_backend_writes_under_configured_root() {
        let tmp = TempDir::new().unwrap();
        let options = BackendOptions {
            path: Some(tmp.path().to_owned()),
            url: None,
        };
        let factory = StoreFactory::select(StorageBackendKind::Json, &options)
            .await
            .unwrap();
        assert_eq!(factory.kind(), StorageBackendKind::Json);

        let store = factory.comments(ItemCategory::Post, "p1").await.unwrap();
        store
            .add(CommentEntity {
                name: "c1".into(),
                author: "bob".into(),
                time: 1,
                content: "hi".into(),
                payload: Map::new(),
            })
            .await
            .unwrap();

        assert!(tmp.path().join("comments/post/p1.json").exists());
    }

    #[cfg(feature = "sqlite-store")]
    #[tokio::test]
    async fn database_backend_connects_to_in_memory_pool() {
        let options = BackendOptions {
            path: None,
            url: Some("sqlite::memory:".into()),
        };
        let factory = StoreFactory::select(StorageBackendKind::Database, &options)
            .await
            .unwrap();
        assert_eq!(factory.kind(), StorageBackendKind::Database);

        let store = factory.comments(ItemCategory::Post, "p1").await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[cfg(not(feature = "sqlite-store"))]
    #[tokio::test]
    async fn database_backend_requires_feature() {
        let err = StoreFactory::select(StorageBackendKind::Database, &BackendOptions::default())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, StorageError::UnsupportedBackend { .. }));
    }
}
