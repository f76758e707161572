//! Reviewer edits against stored timesheets.
//!
//! Every edit names the version the reviewer last read. If the stored
//! timesheet has moved on, the edit is rejected with
//! [`EngineError::VersionConflict`] and nothing is merged; the reviewer must
//! reload and retry.
//!
//! Time edits never modify an entry in place. The old entry is marked
//! superseded and a recomputed replacement is appended, so the billed
//! history stays traceable.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use super::timesheet::Normalizer;
use crate::error::{EngineError, EngineResult};
use crate::identity::EmployeeIdentityIndex;
use crate::models::{AuditTrace, DateContext, EmployeeEntry, ResolvedTime, TimeEntry, Timesheet};
use crate::store::TimesheetStore;

/// A single reviewer change to a stored timesheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimesheetEdit {
    /// Re-enter the date of a visit line.
    Date {
        /// Employee line item index.
        employee_index: usize,
        /// The time entry to change.
        entry_id: Uuid,
        /// The new raw date.
        raw: String,
    },
    /// Re-enter the clock-in time of a visit line.
    TimeIn {
        /// Employee line item index.
        employee_index: usize,
        /// The time entry to supersede.
        entry_id: Uuid,
        /// The new raw time.
        raw: String,
    },
    /// Re-enter the clock-out time of a visit line.
    TimeOut {
        /// Employee line item index.
        employee_index: usize,
        /// The time entry to supersede.
        entry_id: Uuid,
        /// The new raw time.
        raw: String,
    },
    /// Change the billing code of an employee line item.
    ServiceCode {
        /// Employee line item index.
        employee_index: usize,
        /// The new code, accepted verbatim.
        code: String,
    },
    /// Resolve an employee line item to a roster employee.
    SelectEmployee {
        /// Employee line item index.
        employee_index: usize,
        /// The chosen employee.
        employee_id: String,
    },
    /// Enter a visit line by hand, optionally replacing a rejected line.
    AddTimeEntry {
        /// Employee line item index.
        employee_index: usize,
        /// Raw date.
        date: String,
        /// Raw clock-in time.
        time_in: String,
        /// Raw clock-out time.
        time_out: String,
        /// Index into `rejected_lines` of the line this entry replaces.
        #[serde(default)]
        replaces_rejected: Option<usize>,
    },
}

/// A roster change an edit implies, made only once the edited timesheet
/// has been stored.
#[derive(Debug)]
enum RosterChange {
    Alias {
        employee_id: String,
        alias: String,
    },
    ServiceCodeUse {
        employee_id: String,
        code: String,
    },
}

impl RosterChange {
    fn apply(&self, index: &EmployeeIdentityIndex) -> EngineResult<()> {
        match self {
            RosterChange::Alias { employee_id, alias } => {
                index.add_alias(employee_id, alias)?;
            }
            RosterChange::ServiceCodeUse { employee_id, code } => {
                index.record_service_code_use(employee_id, code)?;
            }
        }
        Ok(())
    }
}

impl TimesheetEdit {
    fn employee_index(&self) -> usize {
        match self {
            TimesheetEdit::Date { employee_index, .. }
            | TimesheetEdit::TimeIn { employee_index, .. }
            | TimesheetEdit::TimeOut { employee_index, .. }
            | TimesheetEdit::ServiceCode { employee_index, .. }
            | TimesheetEdit::SelectEmployee { employee_index, .. }
            | TimesheetEdit::AddTimeEntry { employee_index, .. } => *employee_index,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            TimesheetEdit::Date { .. } => "date",
            TimesheetEdit::TimeIn { .. } => "time_in",
            TimesheetEdit::TimeOut { .. } => "time_out",
            TimesheetEdit::ServiceCode { .. } => "service_code",
            TimesheetEdit::SelectEmployee { .. } => "select_employee",
            TimesheetEdit::AddTimeEntry { .. } => "add_time_entry",
        }
    }
}

/// Applies one reviewer edit to a stored timesheet of the index's
/// organization and returns the stored result.
pub fn apply_edit(
    store: &dyn TimesheetStore,
    normalizer: &Normalizer,
    index: &EmployeeIdentityIndex,
    timesheet_id: Uuid,
    expected_version: u64,
    edit: TimesheetEdit,
    context: &DateContext,
) -> EngineResult<Timesheet> {
    let organization_id = index.organization_id();
    let mut timesheet = store.get(organization_id, timesheet_id)?;

    if timesheet.version != expected_version {
        warn!(
            organization_id = organization_id,
            timesheet_id = %timesheet_id,
            expected = expected_version,
            actual = timesheet.version,
            "Rejected stale edit"
        );
        return Err(EngineError::VersionConflict {
            timesheet_id,
            expected: expected_version,
            actual: timesheet.version,
        });
    }

    let kind = edit.kind();
    let roster_change = apply_to(&mut timesheet, normalizer, index, &edit, context)?;
    timesheet.audit_trace.record(
        "review_edit",
        "Reviewer Edit",
        json!(edit),
        json!({ "version": expected_version + 1 }),
        format!("{} edit applied to version {}", kind, expected_version),
    );

    let stored = store.update(timesheet, expected_version)?;
    if let Some(change) = roster_change {
        if let Err(error) = change.apply(index) {
            warn!(
                organization_id = organization_id,
                timesheet_id = %timesheet_id,
                error = %error,
                "Roster not updated after reviewer edit"
            );
        }
    }
    info!(
        organization_id = organization_id,
        timesheet_id = %timesheet_id,
        edit = kind,
        version = stored.version,
        "Applied reviewer edit"
    );
    Ok(stored)
}

fn apply_to(
    timesheet: &mut Timesheet,
    normalizer: &Normalizer,
    index: &EmployeeIdentityIndex,
    edit: &TimesheetEdit,
    context: &DateContext,
) -> EngineResult<Option<RosterChange>> {
    let employee_index = edit.employee_index();
    let Timesheet {
        employees,
        rejected_lines,
        audit_trace: trace,
        ..
    } = timesheet;
    let employee = employees
        .get_mut(employee_index)
        .ok_or_else(|| invalid(format!("no employee line at index {}", employee_index)))?;

    match edit {
        TimesheetEdit::Date { entry_id, raw, .. } => {
            let date = normalizer.resolve_date_audited(raw, context, trace);
            active_entry(employee, *entry_id)?.date = date;
        }
        TimesheetEdit::TimeIn { entry_id, raw, .. }
        | TimesheetEdit::TimeOut { entry_id, raw, .. } => {
            let field = edit.kind();
            let time = normalizer
                .resolve_time_audited(raw, field, trace)
                .ok_or_else(|| EngineError::UnrecognizedTime {
                    field: field.to_string(),
                    raw: raw.clone(),
                })?;

            let old = active_entry(employee, *entry_id)?;
            let (time_in, time_out) = match edit {
                TimesheetEdit::TimeIn { .. } => (time, old.time_out),
                _ => (old.time_in, time),
            };
            let replacement =
                normalizer.build_entry_audited(old.date.clone(), time_in, time_out, trace);
            old.superseded_by = Some(replacement.id);
            employee.time_entries.push(replacement);
        }
        TimesheetEdit::ServiceCode { code, .. } => {
            employee.service_code = normalizer.service_codes().accept_custom(code);
            if let Some(employee_id) = &employee.resolved_employee_id {
                return Ok(Some(RosterChange::ServiceCodeUse {
                    employee_id: employee_id.clone(),
                    code: employee.service_code.clone(),
                }));
            }
        }
        TimesheetEdit::SelectEmployee { employee_id, .. } => {
            let selected = index
                .get(employee_id)
                .ok_or_else(|| EngineError::EmployeeNotFound {
                    employee_id: employee_id.clone(),
                })?;
            employee.resolved_employee_id = Some(selected.id.clone());
            employee.suggestions.clear();
            if !employee.employee_name.trim().is_empty() {
                return Ok(Some(RosterChange::Alias {
                    employee_id: selected.id,
                    alias: employee.employee_name.clone(),
                }));
            }
        }
        TimesheetEdit::AddTimeEntry {
            date,
            time_in,
            time_out,
            replaces_rejected,
            ..
        } => {
            if let Some(rejected_index) = replaces_rejected {
                let rejected = rejected_lines.get(*rejected_index).ok_or_else(|| {
                    invalid(format!("no rejected line at index {}", rejected_index))
                })?;
                if rejected.employee_index != employee_index {
                    return Err(invalid(format!(
                        "rejected line {} belongs to employee line {}",
                        rejected_index, rejected.employee_index
                    )));
                }
            }

            let date = normalizer.resolve_date_audited(date, context, trace);
            let time_in = require_time(normalizer, time_in, "time_in", trace)?;
            let time_out = require_time(normalizer, time_out, "time_out", trace)?;
            let entry = normalizer.build_entry_audited(date, time_in, time_out, trace);
            employee.time_entries.push(entry);

            if let Some(rejected_index) = replaces_rejected {
                let line_index = rejected_lines[*rejected_index].line_index;
                rejected_lines.retain(|r| {
                    !(r.employee_index == employee_index && r.line_index == line_index)
                });
            }
        }
    }

    Ok(None)
}

fn require_time(
    normalizer: &Normalizer,
    raw: &str,
    field: &str,
    trace: &mut AuditTrace,
) -> EngineResult<ResolvedTime> {
    normalizer
        .resolve_time_audited(raw, field, trace)
        .ok_or_else(|| EngineError::UnrecognizedTime {
            field: field.to_string(),
            raw: raw.to_string(),
        })
}

fn active_entry(employee: &mut EmployeeEntry, entry_id: Uuid) -> EngineResult<&mut TimeEntry> {
    let entry = employee
        .time_entries
        .iter_mut()
        .find(|e| e.id == entry_id)
        .ok_or_else(|| invalid(format!("no time entry {}", entry_id)))?;
    if !entry.is_active() {
        return Err(invalid(format!("time entry {} has been superseded", entry_id)));
    }
    Ok(entry)
}

fn invalid(message: String) -> EngineError {
    EngineError::InvalidEdit { message }
}
