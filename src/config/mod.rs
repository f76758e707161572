//! Configuration loading and management for the Timesheet Normalization Engine.
//!
//! This module loads the engine's policy files: the two-digit-year pivot,
//! the AM/PM heuristic, the billing unit size, similarity weights, the
//! default geofence radius and the default billing-code catalog.
//!
//! # Example
//!
//! ```no_run
//! use timesheet_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/default").unwrap();
//! println!("Geofence radius: {} ft", config.config().geofence().default_allowed_radius_feet);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    DatePolicy, DurationPolicy, EngineConfig, EngineFile, EngineMetadata, GeofencePolicy,
    IdentityPolicy, ServiceCodeCatalog, ServiceCodeDefinition, SimilarityWeights, TimePolicy,
};
