mod config;
mod error;
mod schema;
mod store;

pub use config::{SqliteConfig, connect};
pub use error::SqlDaoError;
pub use store::{SqliteCommentStore, SqliteRecordStore};

use crate::dao::storage::StorageError;

impl From<SqlDaoError> for StorageError {
    fn from(err: SqlDaoError) -> Self {
        StorageError::unavailable(err.to_string(), err)
    }
}
