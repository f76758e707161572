//! Per-organization rosters.
//!
//! A [`Roster`] holds one organization's canonical employees and its
//! correction log. Rosters are only reachable through
//! [`RosterRegistry::index_for`], which hands out an
//! [`EmployeeIdentityIndex`] bound to a single organization.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::index::EmployeeIdentityIndex;
use super::similarity::SimilarityStrategy;
use crate::models::{CanonicalEmployee, NameCorrectionRecord};
use crate::store::TimesheetStore;

/// One organization's canonical employees and correction history.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    pub(crate) organization_id: String,
    pub(crate) employees: Vec<CanonicalEmployee>,
    pub(crate) corrections: Vec<NameCorrectionRecord>,
}

impl Roster {
    /// Creates an empty roster for an organization.
    pub fn new(organization_id: impl Into<String>) -> Self {
        Self {
            organization_id: organization_id.into(),
            employees: Vec::new(),
            corrections: Vec::new(),
        }
    }

    /// The owning organization.
    pub fn organization_id(&self) -> &str {
        &self.organization_id
    }

    /// Number of canonical employees, including deactivated ones.
    pub fn len(&self) -> usize {
        self.employees.len()
    }

    /// Returns true if the roster has no employees.
    pub fn is_empty(&self) -> bool {
        self.employees.is_empty()
    }
}

/// Owns every organization's roster.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use timesheet_engine::identity::{RosterRegistry, WeightedSimilarity};
/// use timesheet_engine::store::InMemoryTimesheetStore;
///
/// let registry = RosterRegistry::new();
/// let store = Arc::new(InMemoryTimesheetStore::new());
/// let strategy = Arc::new(WeightedSimilarity::default());
///
/// let org_a = registry.index_for("org_a", store.clone(), strategy.clone(), 5);
/// org_a.resolve_or_create("Jon Smith").unwrap();
///
/// let org_b = registry.index_for("org_b", store, strategy, 5);
/// assert!(org_b.find_by_alias("Jon Smith").is_none());
/// ```
#[derive(Debug, Default)]
pub struct RosterRegistry {
    rosters: RwLock<HashMap<String, Arc<RwLock<Roster>>>>,
}

impl RosterRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the organization's roster, creating an empty one on first use.
    pub fn roster(&self, organization_id: &str) -> Arc<RwLock<Roster>> {
        if let Some(roster) = self.rosters.read().get(organization_id) {
            return roster.clone();
        }

        self.rosters
            .write()
            .entry(organization_id.to_string())
            .or_insert_with(|| Arc::new(RwLock::new(Roster::new(organization_id))))
            .clone()
    }

    /// Builds an identity index bound to one organization.
    pub fn index_for(
        &self,
        organization_id: &str,
        store: Arc<dyn TimesheetStore>,
        strategy: Arc<dyn SimilarityStrategy>,
        default_limit: usize,
    ) -> EmployeeIdentityIndex {
        EmployeeIdentityIndex::new(
            organization_id,
            self.roster(organization_id),
            store,
            strategy,
            default_limit,
        )
    }

    /// Ids of every organization with a roster.
    pub fn organization_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.rosters.read().keys().cloned().collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roster_is_created_once() {
        let registry = RosterRegistry::new();
        let first = registry.roster("org_a");
        let second = registry.roster("org_a");

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.read().organization_id(), "org_a");
    }

    #[test]
    fn test_rosters_are_separate_per_organization() {
        let registry = RosterRegistry::new();
        let a = registry.roster("org_a");
        let b = registry.roster("org_b");

        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(registry.organization_ids(), vec!["org_a", "org_b"]);
    }
}
