//! Error types shared by the SQLite storage implementation.

use thiserror::Error;

/// Convenient result alias returning [`SqlDaoError`] failures.
pub type SqlResult<T> = Result<T, SqlDaoError>;

/// Failures that can occur while interacting with the relational store.
#[derive(Debug, Error)]
pub enum SqlDaoError {
    /// The connection string could not be parsed.
    #[error("invalid database url `{url}`")]
    InvalidUrl {
        url: String,
        #[source]
        source: sqlx::Error,
    },
    /// The directory holding the database file could not be created.
    #[error("failed to prepare database directory for `{url}`")]
    PrepareDirectory {
        url: String,
        #[source]
        source: std::io::Error,
    },
    /// Opening the connection pool failed.
    #[error("failed to connect to database `{url}`")]
    Connect {
        url: String,
        #[source]
        source: sqlx::Error,
    },
    /// Creating a table or index failed.
    #[error("failed to ensure schema object `{object}`")]
    EnsureSchema {
        object: &'static str,
        #[source]
        source: sqlx::Error,
    },
    /// A statement against a scope failed.
    #[error("failed to {operation} in table `{table}`")]
    Query {
        operation: &'static str,
        table: &'static str,
        #[source]
        source: sqlx::Error,
    },
    /// The stored JSON payload could not be decoded or encoded.
    #[error("invalid stored payload in table `{table}`")]
    Payload {
        table: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
