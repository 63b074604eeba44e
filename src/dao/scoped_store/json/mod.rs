mod error;
mod path;
mod store;

pub use error::JsonDaoError;
pub use path::scope_file;
pub use store::JsonStore;

use crate::dao::storage::StorageError;

impl From<JsonDaoError> for StorageError {
    fn from(err: JsonDaoError) -> Self {
        StorageError::unavailable(err.to_string(), err)
    }
}
