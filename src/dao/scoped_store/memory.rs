//! Process-local backend: each scope is an insertion-ordered map guarded by its own mutex.

use std::sync::Arc;

use futures::future::BoxFuture;
use indexmap::IndexMap;
use tokio::sync::Mutex;

use super::{ScopedStore, check_fields, paginate};
use crate::dao::{models::StoredEntity, storage::StorageResult};

/// In-memory store for one scope. Clones share the same table.
pub struct MemoryStore<E> {
    entries: Arc<Mutex<IndexMap<String, E>>>,
}

impl<E> Clone for MemoryStore<E> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<E> Default for MemoryStore<E> {
    fn default() -> Self {
        Self {
            entries: Arc::new(Mutex::new(IndexMap::new())),
        }
    }
}

impl<E: StoredEntity> MemoryStore<E> {
    /// Create an empty scope table.
    pub fn new() -> Self {
        Self::default()
    }

    async fn upsert(&self, entity: E) {
        let mut entries = self.entries.lock().await;
        entries.insert(entity.name().to_owned(), entity);
    }
}

impl<E: StoredEntity> ScopedStore<E> for MemoryStore<E> {
    fn get(&self, name: &str) -> BoxFuture<'static, StorageResult<Option<E>>> {
        let store = self.clone();
        let name = name.to_owned();
        Box::pin(async move {
            let entries = store.entries.lock().await;
            Ok(entries.get(&name).cloned())
        })
    }

    fn list(&self, limit: usize, offset: usize) -> BoxFuture<'static, StorageResult<Vec<E>>> {
        let store = self.clone();
        Box::pin(async move {
            let snapshot: Vec<E> = {
                let entries = store.entries.lock().await;
                entries.values().cloned().collect()
            };
            Ok(paginate(snapshot, limit, offset))
        })
    }

    fn add(&self, entity: E) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            check_fields(&entity)?;
            store.upsert(entity).await;
            Ok(())
        })
    }

    fn update(&self, entity: E) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            check_fields(&entity)?;
            store.upsert(entity).await;
            Ok(())
        })
    }

    fn delete(&self, name: &str) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let name = name.to_owned();
        Box::pin(async move {
            let mut entries = store.entries.lock().await;
            entries.shift_remove(&name);
            Ok(())
        })
    }

    fn count(&self) -> BoxFuture<'static, StorageResult<usize>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.entries.lock().await.len()) })
    }
}
