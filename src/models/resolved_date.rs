//! Resolved date model.
//!
//! A [`ResolvedDate`] is the output of date resolution. Ambiguity is an
//! explicit tagged enum rather than a nullable date, so every consumer has
//! to decide what a non-`None` ambiguity means for billing.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Why a date could not be resolved to billable truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DateAmbiguity {
    /// The date is fully resolved.
    None,
    /// A weekday name was given without a week to anchor it.
    NeedsWeekContext,
    /// Only a day of month was given.
    NeedsMonth,
    /// The text is not recognizable as a date.
    InvalidFormat,
}

/// Optional context supplied by the caller when resolving dates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateContext {
    /// First day of the week the timesheet covers.
    #[serde(default)]
    pub week_start: Option<NaiveDate>,
}

/// A canonicalized date.
///
/// If `ambiguity` is not [`DateAmbiguity::None`], `iso_date` is absent and
/// must not be billed without operator confirmation.
///
/// # Example
///
/// ```
/// use timesheet_engine::models::{DateAmbiguity, ResolvedDate};
/// use chrono::NaiveDate;
///
/// let date = ResolvedDate::resolved(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(), false);
/// assert_eq!(date.display, "03/05/2024");
/// assert!(date.is_billable());
///
/// let unknown = ResolvedDate::unresolved(DateAmbiguity::NeedsMonth, "14");
/// assert!(!unknown.is_billable());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedDate {
    /// The resolved calendar date, if any.
    pub iso_date: Option<NaiveDate>,
    /// Ambiguity classification.
    pub ambiguity: DateAmbiguity,
    /// Display text: `MM/DD/YYYY` when resolved, the trimmed input otherwise.
    pub display: String,
    /// True when the year was not written and came from the fallback policy.
    #[serde(default)]
    pub inferred_year: bool,
}

impl ResolvedDate {
    /// Builds a resolved date.
    pub fn resolved(date: NaiveDate, inferred_year: bool) -> Self {
        Self {
            iso_date: Some(date),
            ambiguity: DateAmbiguity::None,
            display: date.format("%m/%d/%Y").to_string(),
            inferred_year,
        }
    }

    /// Builds an unresolved date that preserves the original text.
    pub fn unresolved(ambiguity: DateAmbiguity, original: &str) -> Self {
        Self {
            iso_date: None,
            ambiguity,
            display: original.trim().to_string(),
            inferred_year: false,
        }
    }

    /// Returns true if the date can be billed without confirmation.
    pub fn is_billable(&self) -> bool {
        self.ambiguity == DateAmbiguity::None && self.iso_date.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ambiguity_serializes_screaming_snake_case() {
        assert_eq!(
            serde_json::to_string(&DateAmbiguity::NeedsWeekContext).unwrap(),
            "\"NEEDS_WEEK_CONTEXT\""
        );
        assert_eq!(
            serde_json::to_string(&DateAmbiguity::None).unwrap(),
            "\"NONE\""
        );
    }

    #[test]
    fn test_unresolved_keeps_trimmed_original() {
        let date = ResolvedDate::unresolved(DateAmbiguity::InvalidFormat, "  not a date ");
        assert_eq!(date.display, "not a date");
        assert_eq!(date.iso_date, None);
    }

    #[test]
    fn test_resolved_serializes_iso_date() {
        let date = ResolvedDate::resolved(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(), false);
        let json = serde_json::to_value(&date).unwrap();
        assert_eq!(json["iso_date"], "2024-03-05");
        assert_eq!(json["ambiguity"], "NONE");
    }
}
