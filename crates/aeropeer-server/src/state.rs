//! Application state shared across handlers.

use std::sync::Arc;

use aeropeer_session::ValidityCache;

use crate::config::GateConfig;
use crate::error::{Result, ServerError};
use crate::validator::{HttpSessionStore, SessionStore, SessionValidator};

/// Application state shared by the gate and all handlers.
///
/// Owns the single process-wide validity cache; constructing the state
/// is the cache's one creation point, so its TTL and ceiling are fixed
/// here from the config.
#[derive(Clone)]
pub struct AppState {
    /// Gate configuration.
    pub config: Arc<GateConfig>,

    /// Session validator over the shared validity cache.
    pub validator: SessionValidator,
}

impl AppState {
    /// Create state over the HTTP session store from config.
    pub fn from_config(config: GateConfig) -> Result<Self> {
        if config.credential_secret.is_empty() {
            return Err(ServerError::Config(
                "credential secret must not be empty".to_string(),
            ));
        }

        let store =
            HttpSessionStore::from_config(&config).map_err(|e| ServerError::StoreClient(e.to_string()))?;

        Ok(Self::with_store(config, Arc::new(store)))
    }

    /// Create state over an explicit session store implementation.
    pub fn with_store(config: GateConfig, store: Arc<dyn SessionStore>) -> Self {
        let cache = ValidityCache::new(config.cache.clone());

        Self {
            config: Arc::new(config),
            validator: SessionValidator::new(cache, store),
        }
    }
}
