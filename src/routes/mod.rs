use axum::{
    Router,
    http::{HeaderName, HeaderValue},
};
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::warn;

use crate::{config::DEFAULT_SONOLUS_VERSION, state::SharedState};

pub mod docs;
pub mod health;
pub mod sonolus;

/// Response header advertising the protocol version the server speaks.
pub const SONOLUS_VERSION_HEADER: HeaderName = HeaderName::from_static("sonolus-version");

/// Compose all route trees, wiring in shared state, documentation and the version header.
pub fn router(state: SharedState) -> Router<()> {
    let version = version_header(&state.config().version);
    let api_router = health::router().merge(sonolus::router());
    let docs_router = docs::router();

    api_router
        .merge(docs_router)
        .with_state(state)
        .layer(SetResponseHeaderLayer::overriding(
            SONOLUS_VERSION_HEADER,
            version,
        ))
}

fn version_header(version: &str) -> HeaderValue {
    HeaderValue::from_str(version).unwrap_or_else(|err| {
        warn!(%version, error = %err, "configured version is not a valid header value");
        HeaderValue::from_static(DEFAULT_SONOLUS_VERSION)
    })
}
