//! The normalization pipeline for a whole raw timesheet.
//!
//! Each visit line has its date and times resolved independently, then its
//! duration computed from the resolved pair. Each employee line item is
//! resolved against the organization's roster:
//!
//! 1. an exact alias match resolves the entry;
//! 2. otherwise a single high-confidence fuzzy match resolves it;
//! 3. otherwise, if there are any candidates, the entry is left unresolved
//!    with the candidates attached as suggestions;
//! 4. otherwise a new incomplete employee is created.
//!
//! A line whose clock time cannot be recognized is never defaulted. It is
//! moved to `rejected_lines` for manual entry.

use std::time::Instant;

use chrono::{Datelike, Utc};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use super::date_resolver::{DateResolver, DateRule};
use super::duration::build_time_entry;
use super::service_codes::ServiceCodeResolver;
use super::time_resolver::{MeridiemSource, TimeResolution, TimeResolver};
use crate::config::{DurationPolicy, EngineConfig};
use crate::error::EngineResult;
use crate::identity::EmployeeIdentityIndex;
use crate::models::{
    AuditTrace, DateAmbiguity, DateContext, EmployeeEntry, EmployeeSuggestion, MatchConfidence,
    RawEmployeeLine, RawTimeLine, RawTimesheet, RejectedLine, ResolvedDate, ResolvedTime,
    TimeEntry, Timesheet,
};

/// Applies the resolvers to raw timesheets and reviewer edits.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    dates: DateResolver,
    times: TimeResolver,
    durations: DurationPolicy,
    service_codes: ServiceCodeResolver,
}

impl Normalizer {
    /// Builds a normalizer from the loaded configuration.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            dates: DateResolver::new(config.dates().clone()),
            times: TimeResolver::new(config.times().clone()),
            durations: config.durations().clone(),
            service_codes: ServiceCodeResolver::new(config.catalog()),
        }
    }

    /// The date resolver.
    pub fn dates(&self) -> &DateResolver {
        &self.dates
    }

    /// The time resolver.
    pub fn times(&self) -> &TimeResolver {
        &self.times
    }

    /// The duration policy.
    pub fn durations(&self) -> &DurationPolicy {
        &self.durations
    }

    /// The service-code resolver.
    pub fn service_codes(&self) -> &ServiceCodeResolver {
        &self.service_codes
    }

    /// Normalizes a raw timesheet for the index's organization.
    ///
    /// The returned timesheet has version 0 and is not stored.
    pub fn normalize_timesheet(
        &self,
        raw: &RawTimesheet,
        context: &DateContext,
        index: &EmployeeIdentityIndex,
    ) -> EngineResult<Timesheet> {
        let start_time = Instant::now();
        let mut trace = AuditTrace::default();
        let mut rejected_lines = Vec::new();
        let mut employees = Vec::with_capacity(raw.employees.len());

        for (employee_index, line) in raw.employees.iter().enumerate() {
            let entry = self.normalize_employee_line(
                employee_index,
                line,
                context,
                index,
                &mut trace,
                &mut rejected_lines,
            )?;
            employees.push(entry);
        }

        trace.duration_us = start_time.elapsed().as_micros() as u64;

        let timesheet = Timesheet {
            id: Uuid::new_v4(),
            organization_id: index.organization_id().to_string(),
            client_name: raw.client_name.trim().to_string(),
            version: 0,
            updated_at: Utc::now(),
            employees,
            rejected_lines,
            audit_trace: trace,
        };

        info!(
            organization_id = %timesheet.organization_id,
            timesheet_id = %timesheet.id,
            employees = timesheet.employees.len(),
            rejected_lines = timesheet.rejected_lines.len(),
            warnings = timesheet.audit_trace.warnings.len(),
            total_units = timesheet.total_units(),
            "Timesheet normalized"
        );

        Ok(timesheet)
    }

    /// Resolves a date and records the decision in the trace.
    pub fn resolve_date_audited(
        &self,
        raw: &str,
        context: &DateContext,
        trace: &mut AuditTrace,
    ) -> ResolvedDate {
        let (date, rule) = self.dates.resolve_with_rule(raw, context);

        match rule {
            DateRule::TwoDigitYear
            | DateRule::FallbackYear
            | DateRule::Weekday { .. }
            | DateRule::Generic => {
                trace.record(
                    rule.rule_id(),
                    date_rule_name(rule),
                    json!({ "raw": raw, "week_start": context.week_start }),
                    json!({ "date": date.iso_date, "display": date.display }),
                    format!("'{}' resolved to '{}'", raw.trim(), date.display),
                );
            }
            _ => {}
        }

        match date.ambiguity {
            DateAmbiguity::None => {}
            DateAmbiguity::NeedsWeekContext => trace.warn(
                "DATE_NEEDS_WEEK_CONTEXT",
                format!("'{}' names a weekday but no week was supplied", raw.trim()),
                "high",
            ),
            DateAmbiguity::NeedsMonth => trace.warn(
                "DATE_NEEDS_MONTH",
                format!("'{}' has no month", raw.trim()),
                "high",
            ),
            DateAmbiguity::InvalidFormat => trace.warn(
                "DATE_INVALID_FORMAT",
                format!("'{}' is not a recognizable date", raw.trim()),
                "high",
            ),
        }

        if date.inferred_year {
            trace.warn(
                "DATE_INFERRED_YEAR",
                format!("'{}' has no year; {} was assumed", raw.trim(), date.display),
                "medium",
            );
        }

        if let (DateRule::Weekday { stated_day: Some(day) }, Some(resolved)) =
            (rule, date.iso_date)
        {
            if resolved.day() != day {
                trace.warn(
                    "DATE_WEEKDAY_MISMATCH",
                    format!(
                        "'{}' resolved to {} but the written day is {}",
                        raw.trim(),
                        date.display,
                        day
                    ),
                    "medium",
                );
            }
        }

        date
    }

    /// Resolves a clock time and records any repair or inference.
    ///
    /// Returns `None` when the value is unrecognizable; the caller decides
    /// how to reject the line.
    pub fn resolve_time_audited(
        &self,
        raw: &str,
        field: &str,
        trace: &mut AuditTrace,
    ) -> Option<ResolvedTime> {
        let TimeResolution {
            time,
            repairs,
            meridiem,
        } = self.times.resolve_detailed(raw)?;

        if !repairs.is_empty() {
            trace.record(
                "time_repair",
                "OCR Time Repair",
                json!({ "field": field, "raw": raw }),
                json!({ "time": time.canonical(), "repairs": repairs }),
                format!("'{}' repaired to {}", raw.trim(), time),
            );
            trace.warn(
                "TIME_CORRECTED",
                format!("{} '{}' was read as {}", field, raw.trim(), time),
                "low",
            );
        }

        if meridiem == MeridiemSource::Heuristic {
            trace.record(
                "time_meridiem_heuristic",
                "AM/PM Heuristic",
                json!({ "field": field, "raw": raw }),
                json!({ "time": time.canonical() }),
                format!("no AM/PM marker on '{}'; read as {}", raw.trim(), time),
            );
        }

        Some(time)
    }

    /// Builds a time entry and records an overnight wrap.
    pub fn build_entry_audited(
        &self,
        date: ResolvedDate,
        time_in: ResolvedTime,
        time_out: ResolvedTime,
        trace: &mut AuditTrace,
    ) -> TimeEntry {
        let entry = build_time_entry(date, time_in, time_out, &self.durations);
        if entry.overnight {
            trace.record(
                "duration_overnight",
                "Overnight Shift",
                json!({ "time_in": time_in.canonical(), "time_out": time_out.canonical() }),
                json!({ "minutes_worked": entry.minutes_worked, "units": entry.units }),
                "clock-out is earlier than clock-in; 24 hours added",
            );
            trace.warn(
                "OVERNIGHT_SHIFT",
                format!("{} to {} crosses midnight", time_in, time_out),
                "low",
            );
        }
        entry
    }

    fn normalize_employee_line(
        &self,
        employee_index: usize,
        line: &RawEmployeeLine,
        context: &DateContext,
        index: &EmployeeIdentityIndex,
        trace: &mut AuditTrace,
        rejected_lines: &mut Vec<RejectedLine>,
    ) -> EngineResult<EmployeeEntry> {
        let employee_name = line.employee_name.trim().to_string();
        let (resolved_employee_id, suggestions) =
            self.resolve_employee(&employee_name, index, trace)?;

        let service_code = self.service_codes.accept_custom(&line.service_code);
        match (&resolved_employee_id, service_code.is_empty()) {
            (_, true) => trace.warn(
                "SERVICE_CODE_MISSING",
                format!("no service code for '{}'", employee_name),
                "medium",
            ),
            (Some(employee_id), false) => {
                index.record_service_code_use(employee_id, &service_code)?;
            }
            (None, false) => {}
        }

        if !line.signature_present {
            trace.warn(
                "SIGNATURE_MISSING",
                format!("no signature for '{}'", employee_name),
                "medium",
            );
        }

        let mut time_entries = Vec::with_capacity(line.entries.len());
        for (line_index, raw_line) in line.entries.iter().enumerate() {
            if let Some(entry) = self.normalize_time_line(
                employee_index,
                line_index,
                raw_line,
                context,
                trace,
                rejected_lines,
            ) {
                time_entries.push(entry);
            }
        }

        Ok(EmployeeEntry {
            employee_name,
            resolved_employee_id,
            service_code,
            signature_present: line.signature_present,
            time_entries,
            suggestions,
        })
    }

    fn normalize_time_line(
        &self,
        employee_index: usize,
        line_index: usize,
        raw: &RawTimeLine,
        context: &DateContext,
        trace: &mut AuditTrace,
        rejected_lines: &mut Vec<RejectedLine>,
    ) -> Option<TimeEntry> {
        let date = self.resolve_date_audited(&raw.date, context, trace);
        let time_in = self.resolve_time_audited(&raw.time_in, "time_in", trace);
        let time_out = self.resolve_time_audited(&raw.time_out, "time_out", trace);

        for (field, value, resolved) in [
            ("time_in", &raw.time_in, time_in.is_some()),
            ("time_out", &raw.time_out, time_out.is_some()),
        ] {
            if resolved {
                continue;
            }
            warn!(
                employee_index = employee_index,
                line_index = line_index,
                field = field,
                raw = %value,
                "Rejected unrecognized time"
            );
            trace.warn(
                "TIME_UNRECOGNIZED",
                format!("{} '{}' could not be read; manual entry required", field, value.trim()),
                "high",
            );
            rejected_lines.push(RejectedLine {
                employee_index,
                line_index,
                field: field.to_string(),
                raw: value.clone(),
                reason: format!("unrecognized time '{}'", value.trim()),
            });
        }

        Some(self.build_entry_audited(date, time_in?, time_out?, trace))
    }

    fn resolve_employee(
        &self,
        name: &str,
        index: &EmployeeIdentityIndex,
        trace: &mut AuditTrace,
    ) -> EngineResult<(Option<String>, Vec<EmployeeSuggestion>)> {
        if name.is_empty() {
            trace.warn("EMPLOYEE_NAME_MISSING", "an employee line has no name", "high");
            return Ok((None, Vec::new()));
        }

        if let Some(employee) = index.find_by_alias(name).filter(|e| e.active) {
            return Ok((Some(employee.id), Vec::new()));
        }

        let matches = index.search(name, None);
        let high: Vec<_> = matches
            .iter()
            .filter(|m| m.confidence == MatchConfidence::HighConfidence)
            .collect();

        if let [only] = high.as_slice() {
            trace.record(
                "employee_auto_match",
                "High-Confidence Employee Match",
                json!({ "name": name }),
                json!({
                    "employee_id": only.employee.id,
                    "full_name": only.employee.full_name,
                    "similarity_score": only.similarity_score,
                }),
                format!(
                    "'{}' matched '{}' with {} ({:.3})",
                    name,
                    only.employee.full_name,
                    only.confidence.label(),
                    only.similarity_score
                ),
            );
            trace.warn(
                "EMPLOYEE_AUTO_MATCHED",
                format!("'{}' was matched to '{}'", name, only.employee.full_name),
                "low",
            );
            return Ok((Some(only.employee.id.clone()), Vec::new()));
        }

        if !matches.is_empty() {
            trace.warn(
                "EMPLOYEE_UNRESOLVED",
                format!(
                    "'{}' has {} possible roster matches; reviewer must select one",
                    name,
                    matches.len()
                ),
                "high",
            );
            return Ok((None, matches.iter().map(|m| m.to_suggestion()).collect()));
        }

        let employee = index.resolve_or_create(name)?;
        if !employee.is_complete {
            trace.record(
                "employee_created",
                "New Employee",
                json!({ "name": name }),
                json!({ "employee_id": employee.id }),
                format!("no roster match for '{}'; incomplete employee created", name),
            );
            trace.warn(
                "EMPLOYEE_INCOMPLETE",
                format!("'{}' is a new employee and needs enrichment", name),
                "medium",
            );
        }
        Ok((Some(employee.id), Vec::new()))
    }
}

fn date_rule_name(rule: DateRule) -> &'static str {
    match rule {
        DateRule::Iso => "ISO Date",
        DateRule::UsFull => "US Date",
        DateRule::TwoDigitYear => "Two-Digit Year Expansion",
        DateRule::FallbackYear => "Fallback Year",
        DateRule::Weekday { .. } => "Weekday In Week",
        DateRule::DayOnly => "Day Of Month Only",
        DateRule::Generic => "Generic Date Parse",
        DateRule::Unrecognized => "Unrecognized Date",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatePolicy;
    use crate::identity::{RosterRegistry, WeightedSimilarity};
    use crate::store::InMemoryTimesheetStore;
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn make_date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn index() -> (RosterRegistry, EmployeeIdentityIndex) {
        let registry = RosterRegistry::new();
        let index = registry.index_for(
            "org_a",
            Arc::new(InMemoryTimesheetStore::new()),
            Arc::new(WeightedSimilarity::default()),
            5,
        );
        (registry, index)
    }

    fn normalizer() -> Normalizer {
        let mut normalizer = Normalizer::default();
        normalizer.dates = DateResolver::new(DatePolicy {
            two_digit_year_pivot: 30,
            fallback_year: Some(2024),
        });
        normalizer
    }

    fn line(date: &str, time_in: &str, time_out: &str) -> RawTimeLine {
        RawTimeLine {
            date: date.to_string(),
            time_in: time_in.to_string(),
            time_out: time_out.to_string(),
        }
    }

    fn normalize_line(
        index: &EmployeeIdentityIndex,
        entry: RawTimeLine,
        context: &DateContext,
    ) -> Timesheet {
        normalizer()
            .normalize_timesheet(&raw("Jon Smith", vec![entry]), context, index)
            .unwrap()
    }

    fn raw(name: &str, entries: Vec<RawTimeLine>) -> RawTimesheet {
        RawTimesheet {
            client_name: " Mary Jones ".to_string(),
            employees: vec![RawEmployeeLine {
                employee_name: name.to_string(),
                service_code: "T1019".to_string(),
                signature_present: true,
                entries,
            }],
        }
    }

    #[test]
    fn test_normalizes_clean_timesheet() {
        let (_registry, index) = index();
        let known = index
            .register("Jon Smith", vec!["S5130".to_string(), "T1019".to_string()])
            .unwrap();

        let timesheet = normalizer()
            .normalize_timesheet(
                &raw("Jon Smith", vec![line("03/05/2024", "8:00", "4:30")]),
                &DateContext::default(),
                &index,
            )
            .unwrap();

        assert_eq!(timesheet.client_name, "Mary Jones");
        assert_eq!(timesheet.organization_id, "org_a");
        let employee = &timesheet.employees[0];
        assert_eq!(employee.resolved_employee_id.as_deref(), Some(known.id.as_str()));

        let entry = &employee.time_entries[0];
        assert_eq!(entry.date.iso_date, Some(make_date(2024, 3, 5)));
        assert_eq!(entry.time_in.canonical(), "08:00");
        assert_eq!(entry.time_out.canonical(), "16:30");
        assert_eq!(entry.units, 34);
        assert!(!timesheet.requires_review());
        assert_eq!(
            index.get(&known.id).unwrap().qualified_service_codes,
            vec!["T1019", "S5130"]
        );
    }

    #[test]
    fn test_unqualified_code_does_not_join_qualified_set() {
        let (_registry, index) = index();
        let known = index.register("Jon Smith", vec!["T1019".to_string()]).unwrap();
        let mut sheet = raw("Jon Smtih", vec![line("3/5/24", "9:00", "11:00")]);
        sheet.employees[0].service_code = "T1O19 ??".to_string();

        let timesheet = normalizer()
            .normalize_timesheet(&sheet, &DateContext::default(), &index)
            .unwrap();

        assert_eq!(timesheet.employees[0].service_code, "T1O19 ??");
        assert_eq!(
            timesheet.employees[0].resolved_employee_id.as_deref(),
            Some(known.id.as_str())
        );
        let employee = index.get(&known.id).unwrap();
        assert_eq!(employee.qualified_service_codes, vec!["T1019"]);
        let codes = ServiceCodeResolver::default().codes_for(Some(&employee));
        assert_eq!(codes[0].code, "T1019");
    }

    #[test]
    fn test_unrecognized_time_is_rejected_not_defaulted() {
        let (_registry, index) = index();

        let timesheet = normalizer()
            .normalize_timesheet(
                &raw(
                    "Jon Smith",
                    vec![line("3/5/24", "??", "4:30"), line("3/6/24", "9:00", "11:00")],
                ),
                &DateContext::default(),
                &index,
            )
            .unwrap();

        assert_eq!(timesheet.employees[0].time_entries.len(), 1);
        assert_eq!(timesheet.rejected_lines.len(), 1);
        assert_eq!(timesheet.rejected_lines[0].field, "time_in");
        assert_eq!(timesheet.rejected_lines[0].raw, "??");
        assert_eq!(timesheet.rejected_lines[0].line_index, 0);
        assert!(timesheet.audit_trace.has_warning("TIME_UNRECOGNIZED"));
        assert!(timesheet.requires_review());
    }

    #[test]
    fn test_both_times_unrecognized_rejects_both_fields() {
        let (_registry, index) = index();

        let timesheet = normalize_line(&index, line("3/5/24", "", "x"), &DateContext::default());

        let fields: Vec<&str> = timesheet.rejected_lines.iter().map(|r| r.field.as_str()).collect();
        assert_eq!(fields, vec!["time_in", "time_out"]);
        assert!(timesheet.employees[0].time_entries.is_empty());
    }

    #[test]
    fn test_weekday_resolved_with_week_context() {
        let (_registry, index) = index();
        let context = DateContext {
            week_start: Some(make_date(2024, 3, 4)),
        };

        let timesheet = normalize_line(&index, line("Tue", "9:00", "11:00"), &context);

        let entry = &timesheet.employees[0].time_entries[0];
        assert_eq!(entry.date.iso_date, Some(make_date(2024, 3, 5)));
        assert!(
            timesheet
                .audit_trace
                .steps
                .iter()
                .any(|s| s.rule_id == "date_weekday")
        );
    }

    #[test]
    fn test_weekday_without_context_needs_review() {
        let (_registry, index) = index();

        let timesheet = normalize_line(
            &index,
            line("Tuesday", "9:00", "11:00"),
            &DateContext::default(),
        );

        let entry = &timesheet.employees[0].time_entries[0];
        assert_eq!(entry.date.ambiguity, DateAmbiguity::NeedsWeekContext);
        assert_eq!(entry.date.iso_date, None);
        assert!(timesheet.audit_trace.has_warning("DATE_NEEDS_WEEK_CONTEXT"));
        assert!(timesheet.requires_review());
    }

    #[test]
    fn test_weekday_number_mismatch_is_flagged() {
        let (_registry, index) = index();
        let context = DateContext {
            week_start: Some(make_date(2024, 3, 4)),
        };

        let timesheet = normalize_line(&index, line("Tue 9", "9:00", "11:00"), &context);

        assert!(timesheet.audit_trace.has_warning("DATE_WEEKDAY_MISMATCH"));
    }

    #[test]
    fn test_inferred_year_is_flagged() {
        let (_registry, index) = index();

        let timesheet = normalize_line(
            &index,
            line("3/5", "9:00", "11:00"),
            &DateContext::default(),
        );

        let entry = &timesheet.employees[0].time_entries[0];
        assert_eq!(entry.date.display, "03/05/2024");
        assert!(entry.date.inferred_year);
        assert!(timesheet.audit_trace.has_warning("DATE_INFERRED_YEAR"));
        assert!(timesheet.requires_review());
    }

    #[test]
    fn test_repaired_time_is_audited() {
        let (_registry, index) = index();

        let timesheet = normalize_line(
            &index,
            line("3/5/24", "6.70", "9:10"),
            &DateContext::default(),
        );

        let entry = &timesheet.employees[0].time_entries[0];
        assert_eq!(entry.time_in.canonical(), "07:10");
        assert!(entry.time_in.corrected);
        assert_eq!(entry.units, 8);
        assert!(timesheet.audit_trace.has_warning("TIME_CORRECTED"));
        assert!(timesheet.audit_trace.steps.iter().any(|s| s.rule_id == "time_repair"));
    }

    #[test]
    fn test_overnight_visit_is_audited() {
        let (_registry, index) = index();

        let timesheet = normalize_line(
            &index,
            line("3/5/24", "22:00", "06:00"),
            &DateContext::default(),
        );

        let entry = &timesheet.employees[0].time_entries[0];
        assert!(entry.overnight);
        assert_eq!(entry.units, 32);
        assert!(timesheet.audit_trace.has_warning("OVERNIGHT_SHIFT"));
    }

    #[test]
    fn test_high_confidence_typo_is_auto_matched() {
        let (_registry, index) = index();
        let known = index.register("Jon Smith", vec![]).unwrap();

        let timesheet = normalizer()
            .normalize_timesheet(&raw("Jon Smtih", vec![]), &DateContext::default(), &index)
            .unwrap();

        let employee = &timesheet.employees[0];
        assert_eq!(employee.resolved_employee_id.as_deref(), Some(known.id.as_str()));
        assert_eq!(employee.employee_name, "Jon Smtih");
        assert!(timesheet.audit_trace.has_warning("EMPLOYEE_AUTO_MATCHED"));
        assert_eq!(index.employees().len(), 1);
    }

    #[test]
    fn test_ambiguous_name_is_left_unresolved_with_suggestions() {
        let (_registry, index) = index();
        index.register("Jon Smith", vec![]).unwrap();
        index.register("Jon Smyth", vec![]).unwrap();

        let timesheet = normalizer()
            .normalize_timesheet(&raw("Jon Smoth", vec![]), &DateContext::default(), &index)
            .unwrap();

        let employee = &timesheet.employees[0];
        assert!(employee.resolved_employee_id.is_none());
        assert!(employee.suggestions.len() >= 2);
        assert!(timesheet.audit_trace.has_warning("EMPLOYEE_UNRESOLVED"));
        assert!(timesheet.requires_review());
    }

    #[test]
    fn test_unknown_name_creates_incomplete_employee() {
        let (_registry, index) = index();

        let timesheet = normalizer()
            .normalize_timesheet(&raw("Maria Garcia", vec![]), &DateContext::default(), &index)
            .unwrap();

        let employee_id = timesheet.employees[0].resolved_employee_id.clone().unwrap();
        let created = index.get(&employee_id).unwrap();
        assert!(!created.is_complete);
        assert!(timesheet.audit_trace.has_warning("EMPLOYEE_INCOMPLETE"));
    }

    #[test]
    fn test_missing_name_and_signature_are_flagged() {
        let (_registry, index) = index();
        let mut sheet = raw("  ", vec![]);
        sheet.employees[0].signature_present = false;

        let timesheet = normalizer()
            .normalize_timesheet(&sheet, &DateContext::default(), &index)
            .unwrap();

        assert!(timesheet.employees[0].resolved_employee_id.is_none());
        assert!(timesheet.audit_trace.has_warning("EMPLOYEE_NAME_MISSING"));
        assert!(timesheet.audit_trace.has_warning("SIGNATURE_MISSING"));
        assert!(index.employees().is_empty());
    }
}
