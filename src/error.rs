use axum::{
    Json,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::JsonRejection,
    },
    http::StatusCode,
    response::IntoResponse,
};
use axum_valid::{ValidRejection, ValidationRejection};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::{
    dao::storage::StorageError,
    state::category::{ItemCategory, OperationKind},
};

/// Errors that can occur while dispatching one operation.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// No handler is registered for the requested category and operation.
    #[error("no handler registered for {}", describe_target(.category, .kind))]
    HandlerNotImplemented {
        category: Option<ItemCategory>,
        kind: OperationKind,
    },
    /// A handler returned data that does not satisfy its response contract.
    #[error("handler for {} returned an invalid response: {source}", describe_target(.category, .kind))]
    ResponseValidationFailed {
        category: Option<ItemCategory>,
        kind: OperationKind,
        #[source]
        source: ValidationErrors,
    },
    /// A named entity the caller asked for does not exist.
    #[error("not found: {0}")]
    EntityNotFound(String),
    /// Storage backend failed.
    #[error("storage unavailable")]
    StorageUnavailable(#[source] StorageError),
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The caller is not allowed to perform the action.
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// Unexpected failure inside the server.
    #[error("internal error: {0}")]
    Internal(String),
}

fn describe_target(category: &Option<ItemCategory>, kind: &OperationKind) -> String {
    match category {
        Some(category) => format!("{category} {kind}"),
        None => format!("server {kind}"),
    }
}

impl ServiceError {
    /// Shorthand for a missing entity of the given kind, e.g. `not_found("post", name)`.
    pub fn not_found(what: &str, name: &str) -> Self {
        ServiceError::EntityNotFound(format!("{what} `{name}`"))
    }
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::ReservedField { .. } => ServiceError::InvalidInput(err.to_string()),
            other => ServiceError::StorageUnavailable(other),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<ValidRejection<JsonRejection>> for AppError {
    fn from(rejection: ValidRejection<JsonRejection>) -> Self {
        match rejection {
            ValidationRejection::Valid(errors) => errors.into(),
            ValidationRejection::Inner(inner) => inner.into(),
        }
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::BadRequest(err.body_text())
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Requested resource or handler not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// The caller lacks permission for the action.
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::HandlerNotImplemented { .. } | ServiceError::EntityNotFound(_) => {
                AppError::NotFound(err.to_string())
            }
            ServiceError::StorageUnavailable(source) => {
                AppError::ServiceUnavailable(source.to_string())
            }
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::Forbidden(message) => AppError::Forbidden(message),
            ServiceError::ResponseValidationFailed { .. } => {
                AppError::Internal("response contract violated".into())
            }
            ServiceError::Internal(message) => AppError::Internal(message),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}
