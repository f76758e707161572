//! Audit trace models.
//!
//! Every normalization decision that changes or interprets a raw value
//! (two-digit year expansion, minute carry, AM/PM inference, fuzzy employee
//! match) is recorded as an [`AuditStep`], so a billed record can always be
//! traced back to the text it came from.

use serde::{Deserialize, Serialize};

/// A single step in the audit trace recording a normalization decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The unique identifier of the rule that was applied.
    pub rule_id: String,
    /// The human-readable name of the rule.
    pub rule_name: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// A warning generated during normalization.
///
/// Warnings indicate values a reviewer must confirm before billing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditWarning {
    /// A code identifying the type of warning.
    pub code: String,
    /// A human-readable description of the warning.
    pub message: String,
    /// The severity level ("low", "medium", "high").
    pub severity: String,
}

/// The complete audit trace for a normalized timesheet.
///
/// # Example
///
/// ```
/// use timesheet_engine::models::AuditTrace;
///
/// let mut trace = AuditTrace::default();
/// trace.record(
///     "time_minute_carry",
///     "Minute Overflow Carry",
///     serde_json::json!({"raw": "6.70"}),
///     serde_json::json!({"time": "07:10"}),
///     "minute 70 carried into the hour",
/// );
/// trace.warn("DATE_NEEDS_MONTH", "date '14' has no month", "high");
///
/// assert_eq!(trace.steps[0].step_number, 1);
/// assert_eq!(trace.warnings.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTrace {
    /// The sequence of normalization steps.
    pub steps: Vec<AuditStep>,
    /// Any warnings generated during normalization.
    pub warnings: Vec<AuditWarning>,
    /// The total normalization duration in microseconds.
    pub duration_us: u64,
}

impl AuditTrace {
    /// Appends a step, numbering it after the last recorded step.
    pub fn record(
        &mut self,
        rule_id: &str,
        rule_name: &str,
        input: serde_json::Value,
        output: serde_json::Value,
        reasoning: impl Into<String>,
    ) {
        let step_number = self.steps.len() as u32 + 1;
        self.steps.push(AuditStep {
            step_number,
            rule_id: rule_id.to_string(),
            rule_name: rule_name.to_string(),
            input,
            output,
            reasoning: reasoning.into(),
        });
    }

    /// Appends a warning.
    pub fn warn(&mut self, code: &str, message: impl Into<String>, severity: &str) {
        self.warnings.push(AuditWarning {
            code: code.to_string(),
            message: message.into(),
            severity: severity.to_string(),
        });
    }

    /// Returns true if any warning has the given code.
    pub fn has_warning(&self, code: &str) -> bool {
        self.warnings.iter().any(|w| w.code == code)
    }
}
