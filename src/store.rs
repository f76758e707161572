//! Timesheet storage.
//!
//! [`TimesheetStore`] is the seam between the engine and whatever persists
//! normalized timesheets. Every operation takes the organization id and a
//! timesheet belonging to another organization is reported as not found, so
//! a caller can never read or write across tenants by guessing an id.
//!
//! Writes use optimistic concurrency: [`TimesheetStore::update`] succeeds
//! only if the caller's `expected_version` matches the stored version, and
//! every successful write increments it.

use std::collections::BTreeMap;
use std::fmt::Debug;

use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{Timesheet, name_key};

/// Persistence for normalized timesheets.
pub trait TimesheetStore: Send + Sync + Debug {
    /// Stores a new timesheet at version 1.
    fn insert(&self, timesheet: Timesheet) -> EngineResult<Timesheet>;

    /// Reads a timesheet of the organization.
    fn get(&self, organization_id: &str, timesheet_id: Uuid) -> EngineResult<Timesheet>;

    /// Lists the ids of every timesheet of the organization.
    fn list_ids(&self, organization_id: &str) -> EngineResult<Vec<Uuid>>;

    /// Replaces a timesheet if `expected_version` is current.
    ///
    /// Returns the stored timesheet with its new version, or
    /// [`EngineError::VersionConflict`] without writing anything.
    fn update(&self, timesheet: Timesheet, expected_version: u64) -> EngineResult<Timesheet>;

    /// Rewrites every employee entry of one timesheet whose name equals
    /// `incorrect_name` (ignoring case and spacing) to `correct_name`,
    /// resolved to `employee_id`.
    ///
    /// Returns the number of entries rewritten. The write is atomic per
    /// timesheet.
    fn rewrite_employee_name(
        &self,
        organization_id: &str,
        timesheet_id: Uuid,
        incorrect_name: &str,
        correct_name: &str,
        employee_id: &str,
    ) -> EngineResult<usize>;
}

/// A thread-safe in-memory [`TimesheetStore`].
#[derive(Debug, Default)]
pub struct InMemoryTimesheetStore {
    timesheets: RwLock<BTreeMap<Uuid, Timesheet>>,
}

impl InMemoryTimesheetStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored timesheets across all organizations.
    pub fn len(&self) -> usize {
        self.timesheets.read().len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.timesheets.read().is_empty()
    }
}

fn not_found(organization_id: &str, timesheet_id: Uuid) -> EngineError {
    EngineError::TimesheetNotFound {
        organization_id: organization_id.to_string(),
        timesheet_id,
    }
}

impl TimesheetStore for InMemoryTimesheetStore {
    fn insert(&self, mut timesheet: Timesheet) -> EngineResult<Timesheet> {
        let mut timesheets = self.timesheets.write();
        if timesheets.contains_key(&timesheet.id) {
            return Err(EngineError::DuplicateTimesheet {
                timesheet_id: timesheet.id,
            });
        }

        timesheet.version = 1;
        timesheet.updated_at = Utc::now();
        timesheets.insert(timesheet.id, timesheet.clone());
        Ok(timesheet)
    }

    fn get(&self, organization_id: &str, timesheet_id: Uuid) -> EngineResult<Timesheet> {
        self.timesheets
            .read()
            .get(&timesheet_id)
            .filter(|t| t.organization_id == organization_id)
            .cloned()
            .ok_or_else(|| not_found(organization_id, timesheet_id))
    }

    fn list_ids(&self, organization_id: &str) -> EngineResult<Vec<Uuid>> {
        Ok(self
            .timesheets
            .read()
            .values()
            .filter(|t| t.organization_id == organization_id)
            .map(|t| t.id)
            .collect())
    }

    fn update(&self, mut timesheet: Timesheet, expected_version: u64) -> EngineResult<Timesheet> {
        let mut timesheets = self.timesheets.write();
        let stored = timesheets
            .get_mut(&timesheet.id)
            .filter(|t| t.organization_id == timesheet.organization_id)
            .ok_or_else(|| not_found(&timesheet.organization_id, timesheet.id))?;

        if stored.version != expected_version {
            return Err(EngineError::VersionConflict {
                timesheet_id: timesheet.id,
                expected: expected_version,
                actual: stored.version,
            });
        }

        timesheet.version = stored.version + 1;
        timesheet.updated_at = Utc::now();
        *stored = timesheet.clone();
        Ok(timesheet)
    }

    fn rewrite_employee_name(
        &self,
        organization_id: &str,
        timesheet_id: Uuid,
        incorrect_name: &str,
        correct_name: &str,
        employee_id: &str,
    ) -> EngineResult<usize> {
        let mut timesheets = self.timesheets.write();
        let stored = timesheets
            .get_mut(&timesheet_id)
            .filter(|t| t.organization_id == organization_id)
            .ok_or_else(|| not_found(organization_id, timesheet_id))?;

        let key = name_key(incorrect_name);
        let mut rewritten = 0;
        for entry in stored
            .employees
            .iter_mut()
            .filter(|e| name_key(&e.employee_name) == key)
        {
            entry.employee_name = correct_name.trim().to_string();
            entry.resolved_employee_id = Some(employee_id.to_string());
            entry.suggestions.clear();
            rewritten += 1;
        }

        if rewritten > 0 {
            stored.version += 1;
            stored.updated_at = Utc::now();
        }
        Ok(rewritten)
    }
}
