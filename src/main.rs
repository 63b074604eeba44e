//! Sonolus server binary: loads configuration, selects the storage backend and serves the routes.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use sonolus_back::{
    config::AppConfig,
    dao::scoped_store::StoreFactory,
    dto::server::{ServerConfiguration, ServerInfo, ServerInfoButton},
    error::ServiceError,
    routes,
    services::{
        context::ContextBuilder,
        dispatcher::Dispatcher,
        posts::{PostService, example_catalog, now_millis},
        registry::HandlerRegistry,
    },
    state::{AppState, SharedState},
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let kind = config
        .storage
        .kind()
        .context("resolving storage backend")?;
    let stores = Arc::new(
        StoreFactory::select(kind, &config.storage.options)
            .await
            .context("initializing storage backend")?,
    );

    let mut registry = HandlerRegistry::new();
    register_server_info(&mut registry, &config);
    PostService::new(example_catalog(now_millis()), Arc::clone(&stores)).register(&mut registry);
    info!(handlers = registry.len(), "handlers registered");

    let dispatcher = Dispatcher::new(registry, ContextBuilder::from_config(&config));
    let port = config.port;
    let enable_cors = config.enable_cors;
    let app_state = AppState::new(config, stores, dispatcher);
    let app = build_router(app_state, enable_cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Landing page advertising the categories this binary serves.
fn register_server_info(registry: &mut HandlerRegistry, config: &AppConfig) {
    let title = config.title.clone();
    let description = config.description.clone();
    registry.register_server_info(move |_ctx| {
        let info = ServerInfo {
            title: title.clone(),
            description: description.clone(),
            buttons: vec![
                ServerInfoButton::new("authentication"),
                ServerInfoButton::new("post"),
                ServerInfoButton::new("configuration"),
            ],
            configuration: ServerConfiguration::default(),
            banner: None,
        };
        async move { Ok::<_, ServiceError>(info) }
    });
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState, enable_cors: bool) -> Router<()> {
    let router = routes::router(state);
    let router = if enable_cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    };
    router.layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
