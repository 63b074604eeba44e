use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use futures::future::BoxFuture;
use indexmap::IndexMap;
use tokio::{fs, sync::Mutex};
use tracing::debug;

use super::{
    error::{JsonDaoError, JsonResult},
    path::scope_file,
};
use crate::dao::{
    models::{Scope, StoredEntity},
    scoped_store::{ScopedStore, check_fields, paginate},
    storage::StorageResult,
};

/// File-backed store for one scope.
///
/// The whole table is read when the store is opened and rewritten on every mutation. All
/// access goes through one mutex so concurrent writers to the same scope cannot lose updates;
/// callers must share one instance per scope (the [`StoreFactory`] cache does this).
///
/// [`StoreFactory`]: crate::dao::scoped_store::StoreFactory
pub struct JsonStore<E> {
    inner: Arc<JsonInner<E>>,
}

struct JsonInner<E> {
    path: PathBuf,
    entries: Mutex<IndexMap<String, E>>,
}

impl<E> Clone for JsonStore<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: StoredEntity> JsonStore<E> {
    /// Open the scope file under `root`, starting empty when it does not exist yet.
    pub async fn open(root: &Path, scope: &Scope) -> JsonResult<Self> {
        let path = scope_file::<E>(root, scope);
        let entries = load(&path).await?;
        debug!(path = %path.display(), count = entries.len(), "opened JSON scope");

        Ok(Self {
            inner: Arc::new(JsonInner {
                path,
                entries: Mutex::new(entries),
            }),
        })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    async fn upsert(&self, entity: E) -> JsonResult<()> {
        let mut entries = self.inner.entries.lock().await;
        let mut next = entries.clone();
        next.insert(entity.name().to_owned(), entity);
        persist(&self.inner.path, &next).await?;
        *entries = next;
        Ok(())
    }

    async fn remove(&self, name: &str) -> JsonResult<()> {
        let mut entries = self.inner.entries.lock().await;
        if !entries.contains_key(name) {
            return Ok(());
        }

        let mut next = entries.clone();
        next.shift_remove(name);
        persist(&self.inner.path, &next).await?;
        *entries = next;
        Ok(())
    }
}

async fn load<E: StoredEntity>(path: &Path) -> JsonResult<IndexMap<String, E>> {
    match fs::read(path).await {
        Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| JsonDaoError::Decode {
            path: path.to_owned(),
            source,
        }),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(IndexMap::new()),
        Err(source) => Err(JsonDaoError::Read {
            path: path.to_owned(),
            source,
        }),
    }
}

/// Rewrite the full table through a sibling temp file so readers never observe a torn write.
async fn persist<E: StoredEntity>(path: &Path, entries: &IndexMap<String, E>) -> JsonResult<()> {
    let write_err = |source| JsonDaoError::Write {
        path: path.to_owned(),
        source,
    };

    let bytes = serde_json::to_vec_pretty(entries).map_err(|source| JsonDaoError::Encode {
        path: path.to_owned(),
        source,
    })?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, bytes).await.map_err(write_err)?;
    fs::rename(&tmp, path).await.map_err(write_err)?;
    Ok(())
}

impl<E: StoredEntity> ScopedStore<E> for JsonStore<E> {
    fn get(&self, name: &str) -> BoxFuture<'static, StorageResult<Option<E>>> {
        let store = self.clone();
        let name = name.to_owned();
        Box::pin(async move {
            let entries = store.inner.entries.lock().await;
            Ok(entries.get(&name).cloned())
        })
    }

    fn list(&self, limit: usize, offset: usize) -> BoxFuture<'static, StorageResult<Vec<E>>> {
        let store = self.clone();
        Box::pin(async move {
            let snapshot: Vec<E> = {
                let entries = store.inner.entries.lock().await;
                entries.values().cloned().collect()
            };
            Ok(paginate(snapshot, limit, offset))
        })
    }

    fn add(&self, entity: E) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            check_fields(&entity)?;
            store.upsert(entity).await.map_err(Into::into)
        })
    }

    fn update(&self, entity: E) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            check_fields(&entity)?;
            store.upsert(entity).await.map_err(Into::into)
        })
    }

    fn delete(&self, name: &str) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let name = name.to_owned();
        Box::pin(async move { store.remove(&name).await.map_err(Into::into) })
    }

    fn count(&self) -> BoxFuture<'static, StorageResult<usize>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.inner.entries.lock().await.len()) })
    }
}
