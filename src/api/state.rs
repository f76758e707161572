//! Application state for the Timesheet Normalization Engine API.
//!
//! This module defines the shared application state that is available
//! to all request handlers.

use std::sync::Arc;

use crate::config::{ConfigLoader, EngineConfig};
use crate::identity::{
    EmployeeIdentityIndex, RosterRegistry, SimilarityStrategy, WeightedSimilarity,
};
use crate::normalization::Normalizer;
use crate::store::{InMemoryTimesheetStore, TimesheetStore};

/// Shared application state.
///
/// Contains resources that are shared across all request handlers: the
/// loaded policies, the timesheet store and every organization's roster.
#[derive(Debug, Clone)]
pub struct AppState {
    config: Arc<ConfigLoader>,
    normalizer: Arc<Normalizer>,
    store: Arc<dyn TimesheetStore>,
    rosters: Arc<RosterRegistry>,
    strategy: Arc<dyn SimilarityStrategy>,
}

impl AppState {
    /// Creates a new application state backed by an in-memory store.
    pub fn new(config: ConfigLoader) -> Self {
        Self::with_store(config, Arc::new(InMemoryTimesheetStore::new()))
    }

    /// Creates a new application state backed by the given store.
    pub fn with_store(config: ConfigLoader, store: Arc<dyn TimesheetStore>) -> Self {
        let normalizer = Normalizer::from_config(config.config());
        let strategy = WeightedSimilarity::from_weights(&config.config().identity().similarity);

        Self {
            config: Arc::new(config),
            normalizer: Arc::new(normalizer),
            store,
            rosters: Arc::new(RosterRegistry::new()),
            strategy: Arc::new(strategy),
        }
    }

    /// Returns the loaded engine configuration.
    pub fn config(&self) -> &EngineConfig {
        self.config.config()
    }

    /// Returns the normalization pipeline.
    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Returns the timesheet store.
    pub fn store(&self) -> &dyn TimesheetStore {
        self.store.as_ref()
    }

    /// Returns the identity index of one organization.
    pub fn index_for(&self, organization_id: &str) -> EmployeeIdentityIndex {
        self.rosters.index_for(
            organization_id,
            self.store.clone(),
            self.strategy.clone(),
            self.config().identity().default_search_limit,
        )
    }
}
