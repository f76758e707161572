//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading engine
//! policies and the default billing catalog from YAML files.

use std::fs;
use std::path::Path;

use crate::error::{EngineError, EngineResult};

use super::types::{EngineConfig, EngineFile, ServiceCodeCatalog};

/// Loads and provides access to engine configuration.
///
/// # Directory Structure
///
/// ```text
/// config/default/
/// ├── engine.yaml         # Metadata and date/time/duration/identity/geofence policies
/// └── service_codes.yaml  # Default billing-code catalog
/// ```
///
/// # Example
///
/// ```no_run
/// use timesheet_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/default").unwrap();
/// println!("Loaded policies: {}", loader.config().metadata().name);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    config: EngineConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// Returns an error if either file is missing or contains invalid YAML.
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let file = Self::load_yaml::<EngineFile>(&path.join("engine.yaml"))?;
        let catalog = Self::load_yaml::<ServiceCodeCatalog>(&path.join("service_codes.yaml"))?;

        Ok(Self {
            config: EngineConfig::new(file, catalog),
        })
    }

    /// Wraps an already-built configuration.
    pub fn from_config(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Returns the underlying engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_path() -> &'static str {
        "./config/default"
    }

    #[test]
    fn test_load_valid_configuration() {
        let result = ConfigLoader::load(config_path());
        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());

        let loader = result.unwrap();
        assert_eq!(loader.config().metadata().name, "Home Health Timesheets");
    }

    #[test]
    fn test_shipped_files_match_built_in_defaults() {
        let loader = ConfigLoader::load(config_path()).unwrap();
        let config = loader.config();

        assert_eq!(config.dates().two_digit_year_pivot, 30);
        assert_eq!(config.dates().fallback_year, None);
        assert_eq!(config.times().am_hours, vec![7, 8, 9, 10, 11]);
        assert_eq!(config.times().pm_hours, vec![12, 1, 2, 3, 4, 5, 6]);
        assert_eq!(config.durations().minutes_per_unit, 15);
        assert_eq!(config.identity().default_search_limit, 5);
        assert_eq!(config.geofence().default_allowed_radius_feet, 500.0);
        assert_eq!(config.catalog(), &ServiceCodeCatalog::default());
    }

    #[test]
    fn test_load_missing_directory_returns_error() {
        let result = ConfigLoader::load("/nonexistent/path");

        match result {
            Err(EngineError::ConfigNotFound { path }) => {
                assert!(path.contains("engine.yaml"));
            }
            other => panic!("Expected ConfigNotFound error, got {:?}", other),
        }
    }

    #[test]
    fn test_partial_engine_file_uses_defaults() {
        let yaml = r#"
engine:
  name: "Night Shift Agency"
  version: "2026-01"
times:
  am_hours: [1, 2, 3, 4, 5, 6, 7]
  pm_hours: [8, 9, 10, 11]
"#;
        let file: EngineFile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(file.engine.name, "Night Shift Agency");
        assert_eq!(file.times.am_hours, vec![1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(file.dates.two_digit_year_pivot, 30);
        assert_eq!(file.geofence.default_allowed_radius_feet, 500.0);
        assert_eq!(file.identity.similarity.token, 0.6);
    }

    #[test]
    fn test_invalid_yaml_reports_parse_error() {
        let result: Result<EngineFile, _> = serde_yaml::from_str("engine: [unclosed");
        assert!(result.is_err());
    }
}
