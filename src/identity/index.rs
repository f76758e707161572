//! The employee identity index for one organization.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::roster::Roster;
use super::similarity::SimilarityStrategy;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    CanonicalEmployee, CorrectionScope, EmployeeSuggestion, MIN_SIMILARITY, MatchConfidence,
    NameCorrectionRecord, name_key,
};
use crate::store::TimesheetStore;

/// A roster candidate returned by [`EmployeeIdentityIndex::search`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeMatch {
    /// The matched employee.
    pub employee: CanonicalEmployee,
    /// Best score over the employee's full name and aliases.
    pub similarity_score: f64,
    /// Confidence bucket of the score.
    pub confidence: MatchConfidence,
}

impl EmployeeMatch {
    /// The reviewer-facing suggestion for this match.
    pub fn to_suggestion(&self) -> EmployeeSuggestion {
        EmployeeSuggestion {
            employee_id: self.employee.id.clone(),
            full_name: self.employee.full_name.clone(),
            similarity_score: self.similarity_score,
            confidence: self.confidence,
        }
    }
}

/// The result of a fully applied name correction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionOutcome {
    /// Employee entries rewritten.
    pub updated_count: usize,
    /// The canonical employee the corrected entries resolve to.
    pub employee: CanonicalEmployee,
    /// The audit record appended for this correction.
    pub record: NameCorrectionRecord,
}

/// Fuzzy lookup, identity resolution and correction propagation for one
/// organization's roster.
///
/// The organization is fixed when the index is built, so no operation can
/// read or write another organization's employees or timesheets.
#[derive(Debug, Clone)]
pub struct EmployeeIdentityIndex {
    organization_id: String,
    roster: Arc<RwLock<Roster>>,
    store: Arc<dyn TimesheetStore>,
    strategy: Arc<dyn SimilarityStrategy>,
    default_limit: usize,
}

impl EmployeeIdentityIndex {
    pub(crate) fn new(
        organization_id: &str,
        roster: Arc<RwLock<Roster>>,
        store: Arc<dyn TimesheetStore>,
        strategy: Arc<dyn SimilarityStrategy>,
        default_limit: usize,
    ) -> Self {
        Self {
            organization_id: organization_id.to_string(),
            roster,
            store,
            strategy,
            default_limit,
        }
    }

    /// The organization this index is bound to.
    pub fn organization_id(&self) -> &str {
        &self.organization_id
    }

    /// Finds active employees whose name or any alias resembles
    /// `partial_name`.
    ///
    /// Results score at least [`MIN_SIMILARITY`], are sorted by descending
    /// score (ties by name) and truncated to `limit`, or to the configured
    /// default limit when `None`.
    pub fn search(&self, partial_name: &str, limit: Option<usize>) -> Vec<EmployeeMatch> {
        if name_key(partial_name).is_empty() {
            return Vec::new();
        }
        let limit = limit.unwrap_or(self.default_limit);

        let roster = self.roster.read();
        let mut matches: Vec<EmployeeMatch> = roster
            .employees
            .iter()
            .filter(|employee| employee.active)
            .filter_map(|employee| {
                let score = employee
                    .names()
                    .map(|name| self.strategy.score(partial_name, name))
                    .fold(0.0, f64::max);
                (score >= MIN_SIMILARITY).then(|| EmployeeMatch {
                    employee: employee.clone(),
                    similarity_score: score,
                    confidence: MatchConfidence::from_score(score),
                })
            })
            .collect();

        matches.sort_by(|a, b| {
            b.similarity_score
                .total_cmp(&a.similarity_score)
                .then_with(|| a.employee.full_name.cmp(&b.employee.full_name))
        });
        matches.truncate(limit);

        debug!(
            organization_id = %self.organization_id,
            query = partial_name,
            strategy = self.strategy.name(),
            results = matches.len(),
            "Roster search"
        );
        matches
    }

    /// Returns the employee one of whose names equals `name`, ignoring case
    /// and spacing. Active employees are preferred over deactivated ones.
    pub fn find_by_alias(&self, name: &str) -> Option<CanonicalEmployee> {
        let roster = self.roster.read();
        find_alias(&roster, name).map(|i| roster.employees[i].clone())
    }

    /// Returns the active employee matching `name` exactly, or creates an
    /// incomplete one with `name` as its only alias.
    pub fn resolve_or_create(&self, name: &str) -> EngineResult<CanonicalEmployee> {
        let name = validate_name(name)?;
        let mut roster = self.roster.write();
        if let Some(index) = find_alias(&roster, name).filter(|&i| roster.employees[i].active) {
            return Ok(roster.employees[index].clone());
        }

        let employee = new_employee(&self.organization_id, name, false);
        info!(
            organization_id = %self.organization_id,
            employee_id = %employee.id,
            name = name,
            "Created incomplete employee"
        );
        roster.employees.push(employee.clone());
        Ok(employee)
    }

    /// Adds an operator-entered employee.
    ///
    /// If one of the employee's names is already known the existing record
    /// is completed instead of creating a duplicate.
    pub fn register(
        &self,
        full_name: &str,
        qualified_service_codes: Vec<String>,
    ) -> EngineResult<CanonicalEmployee> {
        let full_name = validate_name(full_name)?;
        let mut roster = self.roster.write();

        let index = match find_alias(&roster, full_name) {
            Some(index) => index,
            None => {
                roster
                    .employees
                    .push(new_employee(&self.organization_id, full_name, true));
                roster.employees.len() - 1
            }
        };

        let employee = &mut roster.employees[index];
        employee.is_complete = true;
        for code in qualified_service_codes.iter().rev() {
            employee.add_service_code(code);
        }
        Ok(employee.clone())
    }

    /// Completes an employee record, optionally renaming it and replacing
    /// its qualified codes. A previous full name is kept as an alias.
    pub fn enrich(
        &self,
        employee_id: &str,
        full_name: Option<&str>,
        qualified_service_codes: Option<Vec<String>>,
    ) -> EngineResult<CanonicalEmployee> {
        let full_name = full_name.map(validate_name).transpose()?;
        self.update_employee(employee_id, |employee| {
            if let Some(full_name) = full_name {
                employee.add_alias(full_name);
                employee.full_name = full_name.to_string();
            }
            if let Some(codes) = qualified_service_codes {
                employee.qualified_service_codes.clear();
                for code in codes.iter().rev() {
                    employee.add_service_code(code);
                }
            }
            employee.is_complete = true;
        })
    }

    /// Deactivates an employee. Records are never deleted.
    pub fn deactivate(&self, employee_id: &str) -> EngineResult<CanonicalEmployee> {
        self.update_employee(employee_id, |employee| employee.active = false)
    }

    /// Adds an alias to an employee. Returns true if it was new.
    pub fn add_alias(&self, employee_id: &str, alias: &str) -> EngineResult<bool> {
        let alias = validate_name(alias)?;
        let mut added = false;
        self.update_employee(employee_id, |employee| added = employee.add_alias(alias))?;
        Ok(added)
    }

    /// Moves a billing code the employee is qualified for to the front of
    /// their qualified codes. Returns false, changing nothing, for any
    /// other code.
    pub fn record_service_code_use(&self, employee_id: &str, code: &str) -> EngineResult<bool> {
        let mut used = false;
        self.update_employee(employee_id, |employee| {
            used = employee.record_service_code_use(code)
        })?;
        Ok(used)
    }

    /// Looks up an employee by id.
    pub fn get(&self, employee_id: &str) -> Option<CanonicalEmployee> {
        self.roster
            .read()
            .employees
            .iter()
            .find(|e| e.id == employee_id)
            .cloned()
    }

    /// Every employee of the organization, including deactivated ones.
    pub fn employees(&self) -> Vec<CanonicalEmployee> {
        self.roster.read().employees.clone()
    }

    /// The organization's correction log, oldest first.
    pub fn corrections(&self) -> Vec<NameCorrectionRecord> {
        self.roster.read().corrections.clone()
    }

    /// Propagates a name correction across the organization's timesheets.
    ///
    /// 1. `correct_name` becomes an alias of the employee already known by
    ///    either spelling, or of a newly created employee. `incorrect_name`
    ///    is kept as an alias so future timesheets resolve directly.
    /// 2. Every stored employee entry in scope named `incorrect_name` is
    ///    rewritten to `correct_name` and resolved to that employee.
    /// 3. One [`NameCorrectionRecord`] is appended, even on failure.
    ///
    /// Re-applying the same correction adds no aliases and rewrites nothing,
    /// returning `updated_count = 0`. If the store fails part-way,
    /// [`EngineError::PartialCorrection`] carries the exact number of
    /// entries rewritten before the failure; retrying resumes where it
    /// stopped.
    pub fn apply_correction(
        &self,
        incorrect_name: &str,
        correct_name: &str,
        scope: CorrectionScope,
    ) -> EngineResult<CorrectionOutcome> {
        let incorrect_name = validate_correction_name(incorrect_name, "incorrect_name")?;
        let correct_name = validate_correction_name(correct_name, "correct_name")?;
        if name_key(incorrect_name) == name_key(correct_name) {
            return Err(EngineError::InvalidCorrection {
                message: format!(
                    "'{}' and '{}' are the same name",
                    incorrect_name, correct_name
                ),
            });
        }

        let timesheet_ids = match scope {
            CorrectionScope::AllTimesheets => self.store.list_ids(&self.organization_id)?,
            CorrectionScope::Timesheet { timesheet_id } => {
                self.store.get(&self.organization_id, timesheet_id)?;
                vec![timesheet_id]
            }
        };

        // Held for the whole propagation so concurrent corrections in the
        // same organization apply one after another.
        let mut roster = self.roster.write();
        let employee = self.target_employee(&mut roster, incorrect_name, correct_name);

        let mut updated_count = 0;
        let mut failure = None;
        for timesheet_id in timesheet_ids {
            match self.store.rewrite_employee_name(
                &self.organization_id,
                timesheet_id,
                incorrect_name,
                correct_name,
                &employee.id,
            ) {
                Ok(rewritten) => updated_count += rewritten,
                Err(error) => {
                    failure = Some((timesheet_id, error));
                    break;
                }
            }
        }

        let record = NameCorrectionRecord {
            id: Uuid::new_v4(),
            incorrect_name: incorrect_name.to_string(),
            correct_name: correct_name.to_string(),
            organization_id: self.organization_id.clone(),
            employee_id: employee.id.clone(),
            scope,
            applied_count: updated_count,
            complete: failure.is_none(),
            applied_at: Utc::now(),
        };
        roster.corrections.push(record.clone());

        if let Some((timesheet_id, error)) = failure {
            warn!(
                organization_id = %self.organization_id,
                incorrect_name = incorrect_name,
                correct_name = correct_name,
                updated_count = updated_count,
                timesheet_id = %timesheet_id,
                error = %error,
                "Name correction stopped part-way"
            );
            return Err(EngineError::PartialCorrection {
                updated_count,
                message: format!("timesheet {}: {}", timesheet_id, error),
            });
        }

        info!(
            organization_id = %self.organization_id,
            incorrect_name = incorrect_name,
            correct_name = correct_name,
            employee_id = %employee.id,
            updated_count = updated_count,
            "Name correction applied"
        );

        Ok(CorrectionOutcome {
            updated_count,
            employee,
            record,
        })
    }

    /// Finds or creates the employee a correction resolves to and records
    /// both spellings as its aliases.
    fn target_employee(
        &self,
        roster: &mut Roster,
        incorrect_name: &str,
        correct_name: &str,
    ) -> CanonicalEmployee {
        // An active employee known by either spelling wins over a
        // deactivated one known by the correct spelling.
        let known: &Roster = roster;
        let existing = [true, false].into_iter().find_map(|active| {
            find_alias_with(known, correct_name, active)
                .or_else(|| find_alias_with(known, incorrect_name, active))
        });
        let index = match existing {
            Some(index) => index,
            None => {
                roster
                    .employees
                    .push(new_employee(&self.organization_id, correct_name, false));
                roster.employees.len() - 1
            }
        };

        let employee = &mut roster.employees[index];
        if !employee.is_complete && name_key(&employee.full_name) == name_key(incorrect_name) {
            employee.full_name = correct_name.to_string();
        }
        employee.add_alias(correct_name);
        employee.add_alias(incorrect_name);
        let target = employee.clone();

        // An employee auto-created from the misspelling is a duplicate of
        // the target; it is retired rather than deleted.
        let incorrect_key = name_key(incorrect_name);
        for duplicate in roster.employees.iter_mut().filter(|e| {
            e.id != target.id
                && e.active
                && !e.is_complete
                && e.names().all(|n| name_key(n) == incorrect_key)
        }) {
            duplicate.active = false;
            info!(
                organization_id = %self.organization_id,
                employee_id = %duplicate.id,
                merged_into = %target.id,
                "Deactivated duplicate employee"
            );
        }

        target
    }

    fn update_employee(
        &self,
        employee_id: &str,
        change: impl FnOnce(&mut CanonicalEmployee),
    ) -> EngineResult<CanonicalEmployee> {
        let mut roster = self.roster.write();
        let employee = roster
            .employees
            .iter_mut()
            .find(|e| e.id == employee_id)
            .ok_or_else(|| EngineError::EmployeeNotFound {
                employee_id: employee_id.to_string(),
            })?;
        change(employee);
        Ok(employee.clone())
    }
}

fn find_alias(roster: &Roster, name: &str) -> Option<usize> {
    find_alias_with(roster, name, true).or_else(|| find_alias_with(roster, name, false))
}

fn find_alias_with(roster: &Roster, name: &str, active: bool) -> Option<usize> {
    roster
        .employees
        .iter()
        .position(|e| e.active == active && e.has_alias(name))
}

fn new_employee(organization_id: &str, name: &str, is_complete: bool) -> CanonicalEmployee {
    CanonicalEmployee {
        id: format!("emp_{}", Uuid::new_v4().simple()),
        organization_id: organization_id.to_string(),
        full_name: name.to_string(),
        aliases: BTreeSet::from([name.to_string()]),
        qualified_service_codes: Vec::new(),
        is_complete,
        active: true,
    }
}

fn validate_name(name: &str) -> EngineResult<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidEmployeeName {
            name: name.to_string(),
            message: "name is empty".to_string(),
        });
    }
    Ok(trimmed)
}

fn validate_correction_name<'a>(name: &'a str, field: &str) -> EngineResult<&'a str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidCorrection {
            message: format!("{} is empty", field),
        });
    }
    Ok(trimmed)
}
