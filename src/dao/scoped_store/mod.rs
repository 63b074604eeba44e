mod factory;
pub mod json;
pub mod memory;
#[cfg(feature = "sqlite-store")]
pub mod sqlite;

pub use factory::{
    BackendOptions, DEFAULT_DATA_PATH, DEFAULT_DATABASE_URL, StorageBackendKind, StoreFactory,
};

use futures::future::BoxFuture;

use crate::dao::{
    models::{CommentEntity, RecordEntity, StoredEntity},
    storage::{StorageError, StorageResult},
};

/// Upper bound applied to every `list` call, whatever limit the caller asked for.
pub const MAX_PAGE_SIZE: usize = 20;

/// CRUD and pagination over the entities of a single scope.
///
/// Every backend honours the same contract: `add` and `update` upsert by name, `delete` of an
/// absent name is a no-op, and `list` returns at most [`MAX_PAGE_SIZE`] entities ordered by
/// [`StoredEntity::listing_order`] with `offset` applied after ordering.
///
/// Entities whose payload shadows a fixed field are rejected with
/// [`StorageError::ReservedField`] before anything is written.
pub trait ScopedStore<E: StoredEntity>: Send + Sync {
    fn get(&self, name: &str) -> BoxFuture<'static, StorageResult<Option<E>>>;
    fn list(&self, limit: usize, offset: usize) -> BoxFuture<'static, StorageResult<Vec<E>>>;
    fn add(&self, entity: E) -> BoxFuture<'static, StorageResult<()>>;
    fn update(&self, entity: E) -> BoxFuture<'static, StorageResult<()>>;
    fn delete(&self, name: &str) -> BoxFuture<'static, StorageResult<()>>;
    fn count(&self) -> BoxFuture<'static, StorageResult<usize>>;
}

/// Store of community comments for one item.
pub type CommentStore = dyn ScopedStore<CommentEntity>;
/// Store of records for one item leaderboard.
pub type RecordStore = dyn ScopedStore<RecordEntity>;

/// Clamp a requested page size to [`MAX_PAGE_SIZE`].
pub fn clamp_limit(limit: usize) -> usize {
    limit.min(MAX_PAGE_SIZE)
}

/// Refuse entities whose flattened payload would shadow a fixed field.
pub(crate) fn check_fields<E: StoredEntity>(entity: &E) -> StorageResult<()> {
    match entity.shadowed_field() {
        Some(field) => Err(StorageError::ReservedField {
            entity: entity.name().to_owned(),
            field: field.to_owned(),
        }),
        None => Ok(()),
    }
}

/// Order a full scope table and cut the requested page out of it.
pub(crate) fn paginate<E: StoredEntity>(mut entities: Vec<E>, limit: usize, offset: usize) -> Vec<E> {
    entities.sort_by(|a, b| a.listing_order(b));
    entities
        .into_iter()
        .skip(offset)
        .take(clamp_limit(limit))
        .collect()
}
