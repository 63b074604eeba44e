use std::sync::Arc;

use indexmap::IndexMap;
use tokio::sync::RwLock;

/// Anything that can be stored in an [`ItemCatalog`].
pub trait CatalogItem: Clone + Send + Sync + 'static {
    /// Unique name of the item within its category.
    fn name(&self) -> &str;
}

/// Insertion-ordered set of items of one category, keyed by name.
///
/// Clones share the same contents.
pub struct ItemCatalog<T> {
    items: Arc<RwLock<IndexMap<String, T>>>,
}

impl<T> Clone for ItemCatalog<T> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
        }
    }
}

impl<T> Default for ItemCatalog<T> {
    fn default() -> Self {
        Self {
            items: Arc::new(RwLock::new(IndexMap::new())),
        }
    }
}

impl<T: CatalogItem> ItemCatalog<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from an initial set of items.
    pub fn seeded(items: impl IntoIterator<Item = T>) -> Self {
        let map = items
            .into_iter()
            .map(|item| (item.name().to_owned(), item))
            .collect();
        Self {
            items: Arc::new(RwLock::new(map)),
        }
    }

    /// Insert or replace the item carrying the same name. Replacements keep their position.
    pub async fn push(&self, item: T) {
        self.items
            .write()
            .await
            .insert(item.name().to_owned(), item);
    }

    pub async fn get(&self, name: &str) -> Option<T> {
        self.items.read().await.get(name).cloned()
    }

    /// Items in insertion order, filtered by `keep`.
    pub async fn list(&self, keep: impl Fn(&T) -> bool) -> Vec<T> {
        self.items
            .read()
            .await
            .values()
            .filter(|item| keep(item))
            .cloned()
            .collect()
    }

    pub async fn remove(&self, name: &str) -> Option<T> {
        self.items.write().await.shift_remove(name)
    }

    pub async fn clear(&self) {
        self.items.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }
}
