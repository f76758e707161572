//! Name correction audit records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which stored timesheets a name correction rewrites.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum CorrectionScope {
    /// Every timesheet of the organization.
    #[default]
    AllTimesheets,
    /// A single timesheet of the organization.
    Timesheet {
        /// The timesheet to rewrite.
        timesheet_id: Uuid,
    },
}

/// An append-only audit entry written once per propagation action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameCorrectionRecord {
    /// Unique identifier for the record.
    pub id: Uuid,
    /// The spelling that was replaced.
    pub incorrect_name: String,
    /// The spelling written in its place.
    pub correct_name: String,
    /// The organization the propagation was confined to.
    pub organization_id: String,
    /// The canonical employee the corrected entries now resolve to.
    pub employee_id: String,
    /// Which timesheets were considered.
    pub scope: CorrectionScope,
    /// Employee entries rewritten by this action.
    pub applied_count: usize,
    /// False if the rewrite stopped part-way through.
    pub complete: bool,
    /// When the propagation ran.
    pub applied_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_serialization() {
        assert_eq!(
            serde_json::to_value(CorrectionScope::AllTimesheets).unwrap(),
            serde_json::json!({"kind": "all_timesheets"})
        );

        let id = Uuid::nil();
        let scope: CorrectionScope = serde_json::from_value(serde_json::json!({
            "kind": "timesheet",
            "timesheet_id": id
        }))
        .unwrap();
        assert_eq!(scope, CorrectionScope::Timesheet { timesheet_id: id });
    }

    #[test]
    fn test_scope_defaults_to_all_timesheets() {
        assert_eq!(CorrectionScope::default(), CorrectionScope::AllTimesheets);
    }
}
