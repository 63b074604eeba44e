use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying medium.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// An entity payload key collides with one of the entity's fixed fields.
    #[error("payload of `{entity}` reuses the reserved field `{field}`")]
    ReservedField { entity: String, field: String },
    /// The configured backend kind has no implementation in this build.
    #[error("unsupported storage backend `{kind}`")]
    UnsupportedBackend { kind: String },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    /// Construct an unsupported-backend error for the given kind name.
    pub fn unsupported(kind: impl Into<String>) -> Self {
        StorageError::UnsupportedBackend { kind: kind.into() }
    }
}
