use std::sync::Arc;

use diagen_persist::{AutosaveCoordinator, DocumentStore, Stores, VersionStore};
use diagen_relay::Relay;

use crate::config::Config;

/// Shared application state passed to all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub documents: Arc<dyn DocumentStore>,
    pub versions: Arc<dyn VersionStore>,
    pub autosave: AutosaveCoordinator,
    pub relay: Arc<Relay>,
}

impl AppState {
    pub fn new(config: Config, stores: Stores, autosave: AutosaveCoordinator, relay: Relay) -> Self {
        Self {
            config: Arc::new(config),
            documents: stores.documents,
            versions: stores.versions,
            autosave,
            relay: Arc::new(relay),
        }
    }
}
