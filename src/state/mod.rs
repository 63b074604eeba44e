pub mod catalog;
pub mod category;

use std::sync::Arc;

use crate::{
    config::AppConfig, dao::scoped_store::StoreFactory, services::dispatcher::Dispatcher,
};

pub type SharedState = Arc<AppState>;

/// Central application state: configuration, storage and the handler dispatcher.
pub struct AppState {
    config: AppConfig,
    stores: Arc<StoreFactory>,
    dispatcher: Dispatcher,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(config: AppConfig, stores: Arc<StoreFactory>, dispatcher: Dispatcher) -> SharedState {
        Arc::new(Self {
            config,
            stores,
            dispatcher,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Factory handing out comment and record stores.
    pub fn stores(&self) -> &Arc<StoreFactory> {
        &self.stores
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}
