//! Date resolution for raw extracted date strings.
//!
//! Date resolution is soft-fail: every input produces a [`ResolvedDate`],
//! and anything that cannot be pinned to a calendar day carries an explicit
//! [`DateAmbiguity`] with the original text preserved for the reviewer.
//!
//! Rules are tried in a fixed order and the first match wins:
//!
//! 1. strict ISO `YYYY-MM-DD`
//! 2. `MM/DD/YYYY` (trailing punctuation stripped)
//! 3. `MM/DD/YY` or `MM-DD-YY`, expanding the year around the pivot
//! 4. partial `MM/DD` or `MM.DD`, using the fallback year
//! 5. weekday name, optionally followed by a day number
//! 6. bare day of month
//! 7. generic calendar formats bounded to 1900-2099

use std::sync::LazyLock;

use chrono::{Datelike, Duration, NaiveDate, Utc, Weekday};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::DatePolicy;
use crate::models::{DateAmbiguity, DateContext, ResolvedDate};

static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").expect("valid ISO date pattern"));

static US_FULL_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})$").expect("valid MM/DD/YYYY pattern")
});

static TWO_DIGIT_YEAR_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})([/-])(\d{1,2})([/-])(\d{2})$").expect("valid MM/DD/YY pattern")
});

static PARTIAL_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})[/.](\d{1,2})$").expect("valid MM/DD pattern"));

static WEEKDAY_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(monday|mon|tuesday|tues|tue|wednesday|wed|thursday|thurs|thur|thu|friday|fri|saturday|sat|sunday|sun)\.?,?(?:\s+(\d{1,2})(?:st|nd|rd|th)?)?$",
    )
    .expect("valid weekday pattern")
});

static DAY_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,2}$").expect("valid day-only pattern"));

static ORDINAL_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d)(st|nd|rd|th)\b").expect("valid ordinal pattern"));

/// Formats tried by the generic calendar parse, in order.
const GENERIC_FORMATS: &[&str] = &[
    "%B %d, %Y",
    "%B %d %Y",
    "%b. %d, %Y",
    "%d %B %Y",
    "%A, %B %d, %Y",
    "%a, %b %d, %Y",
    "%Y/%m/%d",
    "%m-%d-%Y",
    "%m.%d.%Y",
    "%Y.%m.%d",
];

const MIN_YEAR: i32 = 1900;
const MAX_YEAR: i32 = 2099;

/// Which resolution rule produced a [`ResolvedDate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateRule {
    /// Rule 1: strict ISO.
    Iso,
    /// Rule 2: `MM/DD/YYYY`.
    UsFull,
    /// Rule 3: two-digit year expanded around the pivot.
    TwoDigitYear,
    /// Rule 4: partial date with the fallback year.
    FallbackYear,
    /// Rule 5: weekday name. `stated_day` is the trailing number, if any.
    Weekday {
        /// The day number written after the weekday name.
        stated_day: Option<u32>,
    },
    /// Rule 6: bare day of month.
    DayOnly,
    /// Rule 7: generic calendar parse.
    Generic,
    /// Nothing matched.
    Unrecognized,
}

impl DateRule {
    /// Stable identifier used in audit steps.
    pub fn rule_id(&self) -> &'static str {
        match self {
            DateRule::Iso => "date_iso",
            DateRule::UsFull => "date_us_full",
            DateRule::TwoDigitYear => "date_two_digit_year",
            DateRule::FallbackYear => "date_fallback_year",
            DateRule::Weekday { .. } => "date_weekday",
            DateRule::DayOnly => "date_day_only",
            DateRule::Generic => "date_generic",
            DateRule::Unrecognized => "date_unrecognized",
        }
    }
}

/// Canonicalizes ambiguous date strings according to a [`DatePolicy`].
#[derive(Debug, Clone, Default)]
pub struct DateResolver {
    policy: DatePolicy,
}

impl DateResolver {
    /// Creates a resolver for the given policy.
    pub fn new(policy: DatePolicy) -> Self {
        Self { policy }
    }

    /// Resolves a raw date string. Never fails.
    pub fn resolve(&self, raw: &str, context: &DateContext) -> ResolvedDate {
        self.resolve_with_rule(raw, context).0
    }

    /// Resolves a raw date string and reports which rule matched.
    pub fn resolve_with_rule(&self, raw: &str, context: &DateContext) -> (ResolvedDate, DateRule) {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return (
                ResolvedDate::unresolved(DateAmbiguity::InvalidFormat, raw),
                DateRule::Unrecognized,
            );
        }

        if let Some(date) = ISO_DATE.captures(trimmed).and_then(|c| {
            ymd(number(&c[1]), number(&c[2]), number(&c[3]))
        }) {
            return (ResolvedDate::resolved(date, false), DateRule::Iso);
        }

        let stripped = trimmed.trim_end_matches(['.', ',', ';', ':', '!', '?']);

        if let Some(date) = US_FULL_DATE.captures(stripped).and_then(|c| {
            ymd(number(&c[3]), number(&c[1]), number(&c[2]))
        }) {
            return (ResolvedDate::resolved(date, false), DateRule::UsFull);
        }

        if let Some(c) = TWO_DIGIT_YEAR_DATE.captures(stripped) {
            if c[2] == c[4] {
                let year = self.expand_two_digit_year(number(&c[5]));
                if let Some(date) = ymd(year, number(&c[1]), number(&c[3])) {
                    return (ResolvedDate::resolved(date, false), DateRule::TwoDigitYear);
                }
            }
        }

        if let Some(c) = PARTIAL_DATE.captures(stripped) {
            let year = self.fallback_year();
            if let Some(date) = ymd(year, number(&c[1]), number(&c[2])) {
                return (ResolvedDate::resolved(date, true), DateRule::FallbackYear);
            }
        }

        if let Some(c) = WEEKDAY_NAME.captures(trimmed) {
            let weekday = parse_weekday(&c[1]);
            let stated_day = c.get(2).map(|m| number(m.as_str()) as u32);
            let rule = DateRule::Weekday { stated_day };
            return match (weekday, context.week_start) {
                (Some(weekday), Some(week_start)) => {
                    (ResolvedDate::resolved(date_in_week(week_start, weekday), false), rule)
                }
                _ => (
                    ResolvedDate::unresolved(DateAmbiguity::NeedsWeekContext, trimmed),
                    rule,
                ),
            };
        }

        if DAY_ONLY.is_match(stripped) {
            let day = number(stripped);
            return if (1..=31).contains(&day) {
                (
                    ResolvedDate::unresolved(DateAmbiguity::NeedsMonth, trimmed),
                    DateRule::DayOnly,
                )
            } else {
                (
                    ResolvedDate::unresolved(DateAmbiguity::InvalidFormat, trimmed),
                    DateRule::Unrecognized,
                )
            };
        }

        if let Some(date) = parse_generic(stripped) {
            return (ResolvedDate::resolved(date, false), DateRule::Generic);
        }

        (
            ResolvedDate::unresolved(DateAmbiguity::InvalidFormat, trimmed),
            DateRule::Unrecognized,
        )
    }

    /// Expands a two-digit year: at or below the pivot is 20yy, above is 19yy.
    pub fn expand_two_digit_year(&self, yy: i32) -> i32 {
        if yy <= self.policy.two_digit_year_pivot as i32 {
            2000 + yy
        } else {
            1900 + yy
        }
    }

    fn fallback_year(&self) -> i32 {
        self.policy
            .fallback_year
            .unwrap_or_else(|| Utc::now().year())
    }
}

/// Resolves a raw date string with the default policy.
///
/// # Examples
///
/// ```
/// use timesheet_engine::normalization::resolve_date;
/// use timesheet_engine::models::{DateAmbiguity, DateContext};
/// use chrono::NaiveDate;
///
/// let date = resolve_date("3/5/24", &DateContext::default());
/// assert_eq!(date.iso_date, NaiveDate::from_ymd_opt(2024, 3, 5));
/// assert_eq!(date.ambiguity, DateAmbiguity::None);
///
/// let monday = resolve_date("Monday", &DateContext::default());
/// assert_eq!(monday.ambiguity, DateAmbiguity::NeedsWeekContext);
/// assert_eq!(monday.iso_date, None);
/// ```
pub fn resolve_date(raw: &str, context: &DateContext) -> ResolvedDate {
    DateResolver::default().resolve(raw, context)
}

fn number(digits: &str) -> i32 {
    digits.parse().unwrap_or(0)
}

fn ymd(year: i32, month: i32, day: i32) -> Option<NaiveDate> {
    if month < 1 || day < 1 {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
}

fn parse_weekday(name: &str) -> Option<Weekday> {
    let prefix: String = name.to_lowercase().chars().take(3).collect();
    match prefix.as_str() {
        "mon" => Some(Weekday::Mon),
        "tue" => Some(Weekday::Tue),
        "wed" => Some(Weekday::Wed),
        "thu" => Some(Weekday::Thu),
        "fri" => Some(Weekday::Fri),
        "sat" => Some(Weekday::Sat),
        "sun" => Some(Weekday::Sun),
        _ => None,
    }
}

/// The date of `weekday` in the seven days starting at `week_start`.
fn date_in_week(week_start: NaiveDate, weekday: Weekday) -> NaiveDate {
    let start = week_start.weekday().num_days_from_monday() as i64;
    let target = weekday.num_days_from_monday() as i64;
    week_start + Duration::days((target - start).rem_euclid(7))
}

fn parse_generic(text: &str) -> Option<NaiveDate> {
    let cleaned = ORDINAL_SUFFIX.replace_all(text, "$1");
    GENERIC_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(&cleaned, format).ok())
        .filter(|date| (MIN_YEAR..=MAX_YEAR).contains(&date.year()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_date(date_str: &str) -> NaiveDate {
        NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
    }

    fn no_context() -> DateContext {
        DateContext::default()
    }

    fn week_of(date_str: &str) -> DateContext {
        DateContext {
            week_start: Some(make_date(date_str)),
        }
    }

    fn resolver_with_fallback(year: i32) -> DateResolver {
        DateResolver::new(DatePolicy {
            two_digit_year_pivot: 30,
            fallback_year: Some(year),
        })
    }

    #[test]
    fn test_iso_passes_through() {
        let date = resolve_date("2024-03-05", &no_context());
        assert_eq!(date.iso_date, Some(make_date("2024-03-05")));
        assert_eq!(date.ambiguity, DateAmbiguity::None);
        assert!(!date.inferred_year);
    }

    #[test]
    fn test_explicit_years_are_not_bounded() {
        let (date, rule) = DateResolver::default().resolve_with_rule("2150-01-01", &no_context());
        assert_eq!(date.iso_date, Some(make_date("2150-01-01")));
        assert_eq!(rule, DateRule::Iso);

        let (date, rule) = DateResolver::default().resolve_with_rule("01/02/1850", &no_context());
        assert_eq!(date.iso_date, Some(make_date("1850-01-02")));
        assert_eq!(rule, DateRule::UsFull);
    }

    #[test]
    fn test_us_full_date_with_trailing_punctuation() {
        let (date, rule) = DateResolver::default().resolve_with_rule("03/05/2024.", &no_context());
        assert_eq!(date.iso_date, Some(make_date("2024-03-05")));
        assert_eq!(date.display, "03/05/2024");
        assert_eq!(rule, DateRule::UsFull);
    }

    #[test]
    fn test_two_digit_year_expands_to_2000s_at_or_below_pivot() {
        assert_eq!(
            resolve_date("3/5/24", &no_context()).iso_date,
            Some(make_date("2024-03-05"))
        );
        assert_eq!(
            resolve_date("03-05-30", &no_context()).iso_date,
            Some(make_date("2030-03-05"))
        );
    }

    #[test]
    fn test_two_digit_year_expands_to_1900s_above_pivot() {
        assert_eq!(
            resolve_date("3/5/95", &no_context()).iso_date,
            Some(make_date("1995-03-05"))
        );
        assert_eq!(
            resolve_date("03-05-31", &no_context()).iso_date,
            Some(make_date("1931-03-05"))
        );
    }

    #[test]
    fn test_mixed_separators_are_not_two_digit_year_dates() {
        let date = resolve_date("3/5-24", &no_context());
        assert_eq!(date.ambiguity, DateAmbiguity::InvalidFormat);
    }

    #[test]
    fn test_partial_date_uses_fallback_year() {
        let resolver = resolver_with_fallback(2025);

        let (date, rule) = resolver.resolve_with_rule("3/5", &no_context());
        assert_eq!(date.iso_date, Some(make_date("2025-03-05")));
        assert_eq!(date.ambiguity, DateAmbiguity::None);
        assert!(date.inferred_year);
        assert_eq!(date.display, "03/05/2025");
        assert_eq!(rule, DateRule::FallbackYear);

        let dotted = resolver.resolve("12.31", &no_context());
        assert_eq!(dotted.iso_date, Some(make_date("2025-12-31")));
    }

    #[test]
    fn test_partial_date_defaults_to_current_year() {
        let date = resolve_date("3/5", &no_context());
        assert_eq!(date.iso_date.unwrap().year(), Utc::now().year());
    }

    #[test]
    fn test_weekday_with_week_context() {
        let context = week_of("2024-03-04");
        assert_eq!(
            resolve_date("Monday", &context).iso_date,
            Some(make_date("2024-03-04"))
        );
        assert_eq!(
            resolve_date("wed", &context).iso_date,
            Some(make_date("2024-03-06"))
        );
        assert_eq!(
            resolve_date("Sunday", &context).iso_date,
            Some(make_date("2024-03-10"))
        );
    }

    #[test]
    fn test_weekday_in_week_starting_midweek() {
        // 2024-03-06 is a Wednesday, so Monday falls in the following calendar week.
        let context = week_of("2024-03-06");
        assert_eq!(
            resolve_date("Monday", &context).iso_date,
            Some(make_date("2024-03-11"))
        );
    }

    #[test]
    fn test_weekday_with_trailing_number() {
        let (date, rule) =
            DateResolver::default().resolve_with_rule("Tue 5th", &week_of("2024-03-04"));
        assert_eq!(date.iso_date, Some(make_date("2024-03-05")));
        assert_eq!(rule, DateRule::Weekday { stated_day: Some(5) });
    }

    #[test]
    fn test_weekday_without_context_needs_week() {
        let date = resolve_date("Monday", &no_context());
        assert_eq!(date.ambiguity, DateAmbiguity::NeedsWeekContext);
        assert_eq!(date.iso_date, None);
        assert_eq!(date.display, "Monday");
    }

    #[test]
    fn test_bare_day_needs_month() {
        let date = resolve_date("14", &no_context());
        assert_eq!(date.ambiguity, DateAmbiguity::NeedsMonth);
        assert_eq!(date.iso_date, None);
        assert_eq!(date.display, "14");
    }

    #[test]
    fn test_bare_day_out_of_range_is_invalid() {
        assert_eq!(
            resolve_date("0", &no_context()).ambiguity,
            DateAmbiguity::InvalidFormat
        );
        assert_eq!(
            resolve_date("45", &no_context()).ambiguity,
            DateAmbiguity::InvalidFormat
        );
    }

    #[test]
    fn test_generic_month_name_formats() {
        assert_eq!(
            resolve_date("March 5, 2024", &no_context()).iso_date,
            Some(make_date("2024-03-05"))
        );
        assert_eq!(
            resolve_date("Mar 5th 2024", &no_context()).iso_date,
            Some(make_date("2024-03-05"))
        );
        assert_eq!(
            resolve_date("5 March 2024", &no_context()).iso_date,
            Some(make_date("2024-03-05"))
        );
        assert_eq!(
            resolve_date("2024/03/05", &no_context()).iso_date,
            Some(make_date("2024-03-05"))
        );
    }

    #[test]
    fn test_generic_parse_rejects_out_of_range_years() {
        let date = resolve_date("June 1, 1850", &no_context());
        assert_eq!(date.ambiguity, DateAmbiguity::InvalidFormat);
        assert_eq!(date.display, "June 1, 1850");
    }

    #[test]
    fn test_impossible_calendar_dates_are_invalid() {
        assert_eq!(
            resolve_date("2024-02-30", &no_context()).ambiguity,
            DateAmbiguity::InvalidFormat
        );
        assert_eq!(
            resolve_date("13/45/2024", &no_context()).ambiguity,
            DateAmbiguity::InvalidFormat
        );
    }

    #[test]
    fn test_garbage_preserves_original() {
        let date = resolve_date("  smudge ", &no_context());
        assert_eq!(date.ambiguity, DateAmbiguity::InvalidFormat);
        assert_eq!(date.display, "smudge");
        assert_eq!(date.iso_date, None);
    }

    #[test]
    fn test_empty_is_invalid() {
        assert_eq!(
            resolve_date("", &no_context()).ambiguity,
            DateAmbiguity::InvalidFormat
        );
    }

    #[test]
    fn test_custom_pivot() {
        let resolver = DateResolver::new(DatePolicy {
            two_digit_year_pivot: 10,
            fallback_year: None,
        });
        assert_eq!(resolver.expand_two_digit_year(10), 2010);
        assert_eq!(resolver.expand_two_digit_year(24), 1924);
    }
}
