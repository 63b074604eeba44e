use std::time::SystemTime;

use serde::Serialize;
use utoipa::ToSchema;

use crate::dto::format_system_time;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Storage backend serving comments and records.
    pub storage: String,
    /// RFC 3339 time the check ran.
    pub checked_at: String,
}

impl HealthResponse {
    /// Create a health response indicating the system is operational.
    pub fn ok(storage: impl Into<String>) -> Self {
        Self::with_status("ok", storage)
    }

    /// Create a health response indicating storage did not answer.
    pub fn degraded(storage: impl Into<String>) -> Self {
        Self::with_status("degraded", storage)
    }

    fn with_status(status: &str, storage: impl Into<String>) -> Self {
        Self {
            status: status.to_string(),
            storage: storage.into(),
            checked_at: format_system_time(SystemTime::now()),
        }
    }
}
