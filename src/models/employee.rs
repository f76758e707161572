//! Employee identity models.
//!
//! [`CanonicalEmployee`] is the deduplicated identity record owned by the
//! roster; [`EmployeeEntry`] is a timesheet line item that refers to it.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::TimeEntry;

/// Score at or above which a match is labelled high confidence.
pub const HIGH_CONFIDENCE_THRESHOLD: f64 = 0.95;

/// Score at or above which a match is labelled probable.
pub const PROBABLE_THRESHOLD: f64 = 0.85;

/// Minimum score for a candidate to be returned at all.
pub const MIN_SIMILARITY: f64 = 0.70;

/// Normalizes a free-text name for exact comparison.
///
/// Trims, collapses internal whitespace and lowercases, so `" Jon  SMITH "`
/// and `"jon smith"` compare equal.
///
/// # Example
///
/// ```
/// use timesheet_engine::models::name_key;
///
/// assert_eq!(name_key("  Jon   SMITH "), "jon smith");
/// ```
pub fn name_key(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Confidence bucket for a fuzzy name match.
///
/// The buckets are part of the search contract: only
/// [`MatchConfidence::HighConfidence`] matches are ever applied without a
/// reviewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchConfidence {
    /// Score >= 0.95.
    HighConfidence,
    /// 0.85 <= score < 0.95.
    Probable,
    /// 0.70 <= score < 0.85; shown but never auto-applied.
    Possible,
}

impl MatchConfidence {
    /// Buckets a similarity score.
    pub fn from_score(score: f64) -> Self {
        if score >= HIGH_CONFIDENCE_THRESHOLD {
            MatchConfidence::HighConfidence
        } else if score >= PROBABLE_THRESHOLD {
            MatchConfidence::Probable
        } else {
            MatchConfidence::Possible
        }
    }

    /// The display label for the bucket.
    pub fn label(&self) -> &'static str {
        match self {
            MatchConfidence::HighConfidence => "high confidence",
            MatchConfidence::Probable => "probable",
            MatchConfidence::Possible => "possible",
        }
    }
}

/// The canonical identity record for one employee of one organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalEmployee {
    /// Unique identifier for the employee.
    pub id: String,
    /// The organization that owns this record.
    pub organization_id: String,
    /// The preferred spelling of the employee's name.
    pub full_name: String,
    /// Every spelling known to refer to this employee.
    pub aliases: BTreeSet<String>,
    /// Billing codes the employee may use, most recently used first.
    #[serde(default)]
    pub qualified_service_codes: Vec<String>,
    /// False until the record has been enriched by an operator.
    pub is_complete: bool,
    /// False once the employee has been deactivated.
    pub active: bool,
}

impl CanonicalEmployee {
    /// Returns true if `name` equals the full name or an alias, ignoring
    /// case and whitespace differences.
    pub fn has_alias(&self, name: &str) -> bool {
        let key = name_key(name);
        self.names().any(|n| name_key(n) == key)
    }

    /// Adds an alias unless an equivalent spelling is already known.
    ///
    /// Returns true if the alias set changed.
    pub fn add_alias(&mut self, name: &str) -> bool {
        if self.has_alias(name) {
            return false;
        }
        self.aliases.insert(name.trim().to_string())
    }

    /// The full name followed by every alias.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.full_name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    /// Qualifies the employee for `code` and moves it to the front.
    pub fn add_service_code(&mut self, code: &str) {
        let code = code.trim();
        if code.is_empty() {
            return;
        }
        self.qualified_service_codes.retain(|c| c != code);
        self.qualified_service_codes.insert(0, code.to_string());
    }

    /// Moves an already-qualified `code` to the front.
    ///
    /// A code the employee is not qualified for is ignored, so codes read
    /// off a timesheet never widen the qualified set. Returns true if the
    /// code was found.
    pub fn record_service_code_use(&mut self, code: &str) -> bool {
        let code = code.trim();
        match self.qualified_service_codes.iter().position(|c| c == code) {
            Some(position) => {
                let code = self.qualified_service_codes.remove(position);
                self.qualified_service_codes.insert(0, code);
                true
            }
            None => false,
        }
    }
}

/// A roster candidate offered for an unresolved name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeSuggestion {
    /// The candidate's employee id.
    pub employee_id: String,
    /// The candidate's full name.
    pub full_name: String,
    /// Similarity score, 0.0-1.0.
    pub similarity_score: f64,
    /// Confidence bucket of the score.
    pub confidence: MatchConfidence,
}

/// One employee's line item within a timesheet.
///
/// `resolved_employee_id` is `None` only while the name is unresolved or
/// ambiguous. Once set by a correction or a reviewer selection it is never
/// cleared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeEntry {
    /// The employee name as currently recorded.
    pub employee_name: String,
    /// The canonical employee this entry resolves to.
    pub resolved_employee_id: Option<String>,
    /// The billing code, verbatim.
    pub service_code: String,
    /// Whether the employee signed the timesheet.
    pub signature_present: bool,
    /// Visit lines, including superseded ones.
    pub time_entries: Vec<TimeEntry>,
    /// Roster candidates found during normalization.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<EmployeeSuggestion>,
}

impl EmployeeEntry {
    /// Entries that have not been superseded by an edit.
    pub fn active_time_entries(&self) -> impl Iterator<Item = &TimeEntry> {
        self.time_entries.iter().filter(|e| e.is_active())
    }

    /// Total billing units across active entries.
    pub fn total_units(&self) -> u32 {
        self.active_time_entries().map(|e| e.units).sum()
    }

    /// Total minutes across active entries.
    pub fn total_minutes(&self) -> u32 {
        self.active_time_entries().map(|e| e.minutes_worked).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_employee() -> CanonicalEmployee {
        CanonicalEmployee {
            id: "emp_001".to_string(),
            organization_id: "org_a".to_string(),
            full_name: "Jon Smith".to_string(),
            aliases: BTreeSet::from(["Jon Smith".to_string()]),
            qualified_service_codes: vec![],
            is_complete: false,
            active: true,
        }
    }

    #[test]
    fn test_confidence_buckets() {
        assert_eq!(MatchConfidence::from_score(1.0), MatchConfidence::HighConfidence);
        assert_eq!(MatchConfidence::from_score(0.95), MatchConfidence::HighConfidence);
        assert_eq!(MatchConfidence::from_score(0.949), MatchConfidence::Probable);
        assert_eq!(MatchConfidence::from_score(0.85), MatchConfidence::Probable);
        assert_eq!(MatchConfidence::from_score(0.84), MatchConfidence::Possible);
        assert_eq!(MatchConfidence::HighConfidence.label(), "high confidence");
    }

    #[test]
    fn test_has_alias_ignores_case_and_spacing() {
        let employee = create_test_employee();
        assert!(employee.has_alias("jon   smith"));
        assert!(employee.has_alias(" JON SMITH "));
        assert!(!employee.has_alias("Jon Smtih"));
    }

    #[test]
    fn test_add_alias_does_not_duplicate() {
        let mut employee = create_test_employee();
        assert!(!employee.add_alias("JON SMITH"));
        assert!(employee.add_alias("Johnny Smith"));
        assert!(!employee.add_alias("johnny smith"));
        assert_eq!(employee.aliases.len(), 2);
    }

    #[test]
    fn test_add_service_code_moves_to_front() {
        let mut employee = create_test_employee();
        employee.add_service_code("T1019");
        employee.add_service_code("S5125");
        employee.add_service_code("T1019");
        employee.add_service_code("  ");

        assert_eq!(employee.qualified_service_codes, vec!["T1019", "S5125"]);
    }

    #[test]
    fn test_record_service_code_use_only_reorders_qualified_codes() {
        let mut employee = create_test_employee();
        employee.add_service_code("T1019");
        employee.add_service_code("S5125");

        assert!(employee.record_service_code_use(" T1019 "));
        assert_eq!(employee.qualified_service_codes, vec!["T1019", "S5125"]);

        assert!(!employee.record_service_code_use("T1O19 ??"));
        assert!(!employee.record_service_code_use(""));
        assert_eq!(employee.qualified_service_codes, vec!["T1019", "S5125"]);
    }

    #[test]
    fn test_employee_serialization_round_trip() {
        let employee = create_test_employee();
        let json = serde_json::to_string(&employee).unwrap();
        let deserialized: CanonicalEmployee = serde_json::from_str(&json).unwrap();
        assert_eq!(employee, deserialized);
    }
}
