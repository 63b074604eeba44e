use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState, state::category::ItemCategory};

/// Item name of the scope counted to probe the storage backend.
const PROBE_ITEM: &str = "healthcheck";

/// Probe the storage backend and report whether it answers.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let stores = state.stores();
    let backend = stores.kind().as_str();

    let probe = match stores.comments(ItemCategory::Post, PROBE_ITEM).await {
        Ok(store) => store.count().await.map(|_| ()),
        Err(err) => Err(err),
    };

    match probe {
        Ok(()) => HealthResponse::ok(backend),
        Err(err) => {
            warn!(error = %err, backend, "storage health check failed");
            HealthResponse::degraded(backend)
        }
    }
}
