//! Error types raised by the JSON file storage implementation.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Convenient result alias returning [`JsonDaoError`] failures.
pub type JsonResult<T> = Result<T, JsonDaoError>;

/// Failures that can occur while reading or rewriting a scope file.
#[derive(Debug, Error)]
pub enum JsonDaoError {
    /// The scope file exists but could not be read.
    #[error("failed to read scope file `{}`", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The scope file content is not a valid entity table.
    #[error("failed to decode scope file `{}`", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// The entity table could not be serialized.
    #[error("failed to encode entity table for `{}`", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// Creating the scope directory or rewriting the file failed.
    #[error("failed to write scope file `{}`", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
