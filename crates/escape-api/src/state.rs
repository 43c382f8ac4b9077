//! Shared application state
use crate::catalog::Catalog;
use crate::config::ApiConfig;
use crate::metrics::Metrics;
use crate::store::{InMemoryProgressStore, ProgressStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub store: Arc<dyn ProgressStore>,
    pub metrics: Metrics,
    pub config: ApiConfig,
}

impl AppState {
    pub fn new(
        catalog: Catalog,
        store: Arc<dyn ProgressStore>,
        config: ApiConfig,
    ) -> Result<Self, prometheus::Error> {
        Ok(Self {
            catalog: Arc::new(catalog),
            store,
            metrics: Metrics::new()?,
            config,
        })
    }

    /// State backed by a fresh in-memory store.
    pub fn in_memory(catalog: Catalog, config: ApiConfig) -> Result<Self, prometheus::Error> {
        Self::new(catalog, Arc::new(InMemoryProgressStore::new()), config)
    }
}
