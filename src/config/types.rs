//! Configuration types for timesheet normalization.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files. Every policy has a
//! `Default` that matches the shipped `config/default/` files, so the pure
//! resolvers can be used without touching the filesystem.

use serde::{Deserialize, Serialize};

/// Metadata about the engine deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineMetadata {
    /// The deployment name (e.g., "Home Health Timesheets").
    pub name: String,
    /// The version of the policy set.
    pub version: String,
}

impl Default for EngineMetadata {
    fn default() -> Self {
        Self {
            name: "Home Health Timesheets".to_string(),
            version: "default".to_string(),
        }
    }
}

/// Date resolution policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatePolicy {
    /// Two-digit years at or below this value expand to 20yy, above it to 19yy.
    #[serde(default = "default_two_digit_year_pivot")]
    pub two_digit_year_pivot: u32,
    /// Year assigned to partial `MM/DD` dates. `None` means the current
    /// processing year.
    #[serde(default)]
    pub fallback_year: Option<i32>,
}

fn default_two_digit_year_pivot() -> u32 {
    30
}

impl Default for DatePolicy {
    fn default() -> Self {
        Self {
            two_digit_year_pivot: default_two_digit_year_pivot(),
            fallback_year: None,
        }
    }
}

/// AM/PM inference policy for clock times written without a marker.
///
/// The default reflects typical day-shift visit windows: 7-11 read as
/// morning, 12 and 1-6 read as afternoon. It is known to be wrong for
/// night-shift and 24-hour care and is meant to be overridden per
/// organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimePolicy {
    /// Unmarked 12-hour values read as AM.
    #[serde(default = "default_am_hours")]
    pub am_hours: Vec<u8>,
    /// Unmarked 12-hour values read as PM.
    #[serde(default = "default_pm_hours")]
    pub pm_hours: Vec<u8>,
}

fn default_am_hours() -> Vec<u8> {
    vec![7, 8, 9, 10, 11]
}

fn default_pm_hours() -> Vec<u8> {
    vec![12, 1, 2, 3, 4, 5, 6]
}

impl Default for TimePolicy {
    fn default() -> Self {
        Self {
            am_hours: default_am_hours(),
            pm_hours: default_pm_hours(),
        }
    }
}

/// Billing unit policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationPolicy {
    /// Minutes in one billing unit.
    #[serde(default = "default_minutes_per_unit")]
    pub minutes_per_unit: u32,
}

fn default_minutes_per_unit() -> u32 {
    15
}

impl Default for DurationPolicy {
    fn default() -> Self {
        Self {
            minutes_per_unit: default_minutes_per_unit(),
        }
    }
}

/// Weights of the composite name-similarity strategy.
///
/// Components with a zero weight are not evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityWeights {
    /// Weight of the token-level score.
    #[serde(default = "default_token_weight")]
    pub token: f64,
    /// Weight of the character-level (Jaro-Winkler) score.
    #[serde(default = "default_character_weight")]
    pub character: f64,
    /// Weight of the phonetic (Soundex) score.
    #[serde(default)]
    pub phonetic: f64,
}

fn default_token_weight() -> f64 {
    0.6
}

fn default_character_weight() -> f64 {
    0.4
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        Self {
            token: default_token_weight(),
            character: default_character_weight(),
            phonetic: 0.0,
        }
    }
}

/// Employee identity matching policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityPolicy {
    /// Maximum number of suggestions returned by a search when the caller
    /// does not specify one.
    #[serde(default = "default_search_limit")]
    pub default_search_limit: usize,
    /// Similarity strategy weights.
    #[serde(default)]
    pub similarity: SimilarityWeights,
}

fn default_search_limit() -> usize {
    5
}

impl Default for IdentityPolicy {
    fn default() -> Self {
        Self {
            default_search_limit: default_search_limit(),
            similarity: SimilarityWeights::default(),
        }
    }
}

/// Visit-verification geofence policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeofencePolicy {
    /// Radius used when an organization has not configured its own.
    #[serde(default = "default_allowed_radius_feet")]
    pub default_allowed_radius_feet: f64,
}

fn default_allowed_radius_feet() -> f64 {
    500.0
}

impl Default for GeofencePolicy {
    fn default() -> Self {
        Self {
            default_allowed_radius_feet: default_allowed_radius_feet(),
        }
    }
}

/// Structure of `engine.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineFile {
    /// Deployment metadata.
    pub engine: EngineMetadata,
    /// Date policy.
    #[serde(default)]
    pub dates: DatePolicy,
    /// Time policy.
    #[serde(default)]
    pub times: TimePolicy,
    /// Duration policy.
    #[serde(default)]
    pub durations: DurationPolicy,
    /// Identity policy.
    #[serde(default)]
    pub identity: IdentityPolicy,
    /// Geofence policy.
    #[serde(default)]
    pub geofence: GeofencePolicy,
}

/// One entry of the default billing-code catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCodeDefinition {
    /// The billing code (e.g., "T1019").
    pub code: String,
    /// Human-readable label.
    pub label: String,
}

/// Structure of `service_codes.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCodeCatalog {
    /// The default catalog, in display order.
    pub service_codes: Vec<ServiceCodeDefinition>,
}

impl Default for ServiceCodeCatalog {
    fn default() -> Self {
        let entries = [
            ("T1019", "Personal care services, per 15 minutes"),
            ("S5125", "Attendant care services, per 15 minutes"),
            ("S5130", "Homemaker service, per 15 minutes"),
            ("S5150", "Unskilled respite care, per 15 minutes"),
            ("G0156", "Home health aide services, per 15 minutes"),
            ("G0299", "Registered nurse services, per 15 minutes"),
            ("G0300", "Licensed practical nurse services, per 15 minutes"),
        ];
        Self {
            service_codes: entries
                .iter()
                .map(|(code, label)| ServiceCodeDefinition {
                    code: code.to_string(),
                    label: label.to_string(),
                })
                .collect(),
        }
    }
}

/// The complete engine configuration loaded from YAML files.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineConfig {
    file: EngineFile,
    catalog: ServiceCodeCatalog,
}

impl EngineConfig {
    /// Creates a new EngineConfig from its component parts.
    pub fn new(file: EngineFile, catalog: ServiceCodeCatalog) -> Self {
        Self { file, catalog }
    }

    /// Returns the deployment metadata.
    pub fn metadata(&self) -> &EngineMetadata {
        &self.file.engine
    }

    /// Returns the date policy.
    pub fn dates(&self) -> &DatePolicy {
        &self.file.dates
    }

    /// Returns the time policy.
    pub fn times(&self) -> &TimePolicy {
        &self.file.times
    }

    /// Returns the duration policy.
    pub fn durations(&self) -> &DurationPolicy {
        &self.file.durations
    }

    /// Returns the identity policy.
    pub fn identity(&self) -> &IdentityPolicy {
        &self.file.identity
    }

    /// Returns the geofence policy.
    pub fn geofence(&self) -> &GeofencePolicy {
        &self.file.geofence
    }

    /// Returns the default service-code catalog.
    pub fn catalog(&self) -> &ServiceCodeCatalog {
        &self.catalog
    }
}
