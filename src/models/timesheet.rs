//! Timesheet models: the raw extraction record and the stored normalized
//! record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AuditTrace, EmployeeEntry};

/// One raw `{date, time_in, time_out}` triple as extracted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTimeLine {
    /// Raw date text.
    #[serde(default)]
    pub date: String,
    /// Raw clock-in text.
    #[serde(default)]
    pub time_in: String,
    /// Raw clock-out text.
    #[serde(default)]
    pub time_out: String,
}

/// One raw employee line item as extracted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEmployeeLine {
    /// Raw employee name.
    pub employee_name: String,
    /// Raw billing code.
    #[serde(default)]
    pub service_code: String,
    /// Whether a signature was detected.
    #[serde(default)]
    pub signature_present: bool,
    /// Raw visit lines.
    #[serde(default)]
    pub entries: Vec<RawTimeLine>,
}

/// A raw timesheet as produced by the extraction collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTimesheet {
    /// Client/patient name.
    #[serde(default)]
    pub client_name: String,
    /// Employee line items.
    #[serde(default)]
    pub employees: Vec<RawEmployeeLine>,
}

/// A visit line that could not be normalized.
///
/// Clock times are never defaulted; a line whose time cannot be resolved is
/// kept here for manual entry instead of being dropped or guessed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedLine {
    /// Index of the employee line item.
    pub employee_index: usize,
    /// Index of the visit line within the employee line item.
    pub line_index: usize,
    /// The field that failed ("time_in" or "time_out").
    pub field: String,
    /// The raw value.
    pub raw: String,
    /// Why it was rejected.
    pub reason: String,
}

/// A normalized timesheet ready for review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timesheet {
    /// Unique identifier for the timesheet.
    pub id: Uuid,
    /// The owning organization.
    pub organization_id: String,
    /// Client/patient name.
    pub client_name: String,
    /// Optimistic-concurrency version, incremented on every write.
    pub version: u64,
    /// When the timesheet was last written.
    pub updated_at: DateTime<Utc>,
    /// Employee line items.
    pub employees: Vec<EmployeeEntry>,
    /// Visit lines that need manual entry.
    #[serde(default)]
    pub rejected_lines: Vec<RejectedLine>,
    /// Normalization decisions and warnings.
    #[serde(default)]
    pub audit_trace: AuditTrace,
}

impl Timesheet {
    /// Returns true if a reviewer must act before the timesheet can be
    /// billed: an unresolved employee, a rejected line, or a date that is
    /// ambiguous or carries an inferred year.
    pub fn requires_review(&self) -> bool {
        !self.rejected_lines.is_empty()
            || self.employees.iter().any(|employee| {
                employee.resolved_employee_id.is_none()
                    || employee
                        .active_time_entries()
                        .any(|e| !e.date.is_billable() || e.date.inferred_year)
            })
    }

    /// Total billing units across all employees.
    pub fn total_units(&self) -> u32 {
        self.employees.iter().map(EmployeeEntry::total_units).sum()
    }
}
