//! Clock-time resolution and OCR repair.
//!
//! Unlike dates, clock times are hard-fail: an unrecognizable value yields
//! `None` (or [`EngineError::UnrecognizedTime`] through [`TimeResolver::require`])
//! because a visit time cannot be defaulted.
//!
//! Repairs applied before interpretation, each of which sets
//! `corrected = true`:
//!
//! - a decimal point, semicolon or comma used as the separator (`6.70`)
//! - a minute value of 60 or more, carried into the hour (`6.70` → `7:10`).
//!   With an explicit marker the carry happens after the marker is applied
//!   (`11:75 am` → `12:15`); a carry past `23:59` is unrecognizable.
//! - letters OCR commonly confuses with digits (`O` → `0`, `l`/`I`/`|` → `1`)
//!
//! AM/PM heuristic for values written without a marker (policy default):
//! hour 7-11 is AM, hour 1-6 is PM, hour 12 is PM (midday), because visit
//! care is typically delivered on day shifts. Hour 0 without a marker is
//! invalid. An explicit `am`/`pm` marker always wins over the heuristic. A
//! zero-padded two-digit hour (`02:00`) or an hour of 13-23 is read as
//! 24-hour notation, so every canonical `HH:MM` string resolves to itself.
//!
//! The heuristic is a guess from day-shift visit windows and is known to be
//! wrong for night-shift and 24-hour care; organizations with those
//! schedules should override [`TimePolicy`].

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::TimePolicy;
use crate::error::{EngineError, EngineResult};
use crate::models::ResolvedTime;

static WITH_MERIDIEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<body>[0-9oil|:;.,]+?)(?P<meridiem>[ap])\.?(?:m\.?)?$")
        .expect("valid meridiem pattern")
});

static WITHOUT_MERIDIEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<body>[0-9oil|:;.,]+)$").expect("valid time pattern"));

/// A repair applied to a raw clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeRepair {
    /// A `.`, `;` or `,` was read as the hour/minute separator.
    SeparatorCorrected,
    /// Minutes of 60 or more were carried into the hour.
    MinuteCarry,
    /// Letters were read as digits.
    LetterDigit,
}

/// How the half of day was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeridiemSource {
    /// An explicit AM/PM marker was present.
    Explicit,
    /// The hour was already in 24-hour notation.
    TwentyFourHour,
    /// The AM/PM heuristic was applied.
    Heuristic,
    /// A keyword such as "noon" was used.
    Keyword,
}

/// A resolved time together with how it was reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeResolution {
    /// The resolved time.
    pub time: ResolvedTime,
    /// Repairs applied to the raw text.
    pub repairs: Vec<TimeRepair>,
    /// How AM/PM was decided.
    pub meridiem: MeridiemSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Meridiem {
    Am,
    Pm,
}

/// Canonicalizes raw clock-time strings.
#[derive(Debug, Clone, Default)]
pub struct TimeResolver {
    policy: TimePolicy,
}

impl TimeResolver {
    /// Creates a resolver for the given AM/PM policy.
    pub fn new(policy: TimePolicy) -> Self {
        Self { policy }
    }

    /// Resolves a raw time, or `None` if it is unrecognizable.
    pub fn resolve(&self, raw: &str) -> Option<ResolvedTime> {
        self.resolve_detailed(raw).map(|r| r.time)
    }

    /// Resolves a raw time, turning an unrecognizable value into an error
    /// naming the field it came from.
    pub fn require(&self, raw: &str, field: &str) -> EngineResult<ResolvedTime> {
        self.resolve(raw).ok_or_else(|| EngineError::UnrecognizedTime {
            field: field.to_string(),
            raw: raw.to_string(),
        })
    }

    /// Resolves a raw time and reports the repairs and AM/PM decision.
    pub fn resolve_detailed(&self, raw: &str) -> Option<TimeResolution> {
        let lowered = raw.trim().to_lowercase();
        let compact: String = lowered.chars().filter(|c| !c.is_whitespace()).collect();
        if compact.is_empty() {
            return None;
        }

        match compact.as_str() {
            "noon" | "12noon" | "midday" => return keyword_time(12),
            "midnight" | "12midnight" => return keyword_time(0),
            _ => {}
        }

        let (body, meridiem) = if let Some(c) = WITH_MERIDIEM.captures(&compact) {
            let meridiem = if &c["meridiem"] == "a" {
                Meridiem::Am
            } else {
                Meridiem::Pm
            };
            (c["body"].to_string(), Some(meridiem))
        } else if let Some(c) = WITHOUT_MERIDIEM.captures(&compact) {
            (c["body"].to_string(), None)
        } else {
            return None;
        };

        let mut repairs = Vec::new();
        let body = body.trim_end_matches(['.', ',', ';', ':']);
        let digits = repair_letters(body, &mut repairs);
        let (hour_text, minute_text) = split_clock(&digits, &mut repairs)?;

        let padded_hour = hour_text.len() == 2 && hour_text.starts_with('0');
        let written_hour: u32 = hour_text.parse().ok()?;
        let written_minute: u32 = minute_text.parse().ok()?;
        if written_minute >= 60 {
            repairs.push(TimeRepair::MinuteCarry);
        }

        // A marker qualifies the written hour, so it is applied before the
        // carry. Unmarked values carry first and are then interpreted.
        let (hour, minute, source) = match meridiem {
            Some(meridiem) => {
                let total = apply_meridiem(written_hour, meridiem)? * 60 + written_minute;
                (total / 60, total % 60, MeridiemSource::Explicit)
            }
            None => {
                let hour = written_hour + written_minute / 60;
                let minute = written_minute % 60;
                let (hour, source) = if padded_hour || (13..=23).contains(&hour) {
                    (hour, MeridiemSource::TwentyFourHour)
                } else {
                    self.apply_heuristic(hour)?
                };
                (hour, minute, source)
            }
        };

        let time = ResolvedTime {
            hour: u8::try_from(hour).ok().filter(|h| *h < 24)?,
            minute: minute as u8,
            corrected: !repairs.is_empty(),
        };

        Some(TimeResolution {
            time,
            repairs,
            meridiem: source,
        })
    }

    /// Applies the AM/PM heuristic to an unmarked hour of 1-12.
    fn apply_heuristic(&self, hour: u32) -> Option<(u32, MeridiemSource)> {
        if hour == 0 || hour > 12 {
            return None;
        }
        let hour_u8 = hour as u8;
        if self.policy.am_hours.contains(&hour_u8) {
            Some((apply_meridiem(hour, Meridiem::Am)?, MeridiemSource::Heuristic))
        } else if self.policy.pm_hours.contains(&hour_u8) {
            Some((apply_meridiem(hour, Meridiem::Pm)?, MeridiemSource::Heuristic))
        } else {
            Some((hour, MeridiemSource::TwentyFourHour))
        }
    }
}

/// Resolves a raw time with the default policy.
///
/// # Examples
///
/// ```
/// use timesheet_engine::normalization::resolve_time;
///
/// let carried = resolve_time("6.70").unwrap();
/// assert_eq!((carried.hour, carried.minute, carried.corrected), (7, 10, true));
///
/// assert_eq!(resolve_time("9:00").unwrap().hour, 9);
/// assert_eq!(resolve_time("2:00").unwrap().hour, 14);
/// assert_eq!(resolve_time("2:00 am").unwrap().hour, 2);
/// assert!(resolve_time("lunch").is_none());
/// ```
pub fn resolve_time(raw: &str) -> Option<ResolvedTime> {
    TimeResolver::default().resolve(raw)
}

fn keyword_time(hour: u8) -> Option<TimeResolution> {
    Some(TimeResolution {
        time: ResolvedTime::new(hour, 0)?,
        repairs: Vec::new(),
        meridiem: MeridiemSource::Keyword,
    })
}

fn repair_letters(body: &str, repairs: &mut Vec<TimeRepair>) -> String {
    let mut repaired = false;
    let digits = body
        .chars()
        .map(|c| match c {
            'o' => {
                repaired = true;
                '0'
            }
            'i' | 'l' | '|' => {
                repaired = true;
                '1'
            }
            other => other,
        })
        .collect();
    if repaired {
        repairs.push(TimeRepair::LetterDigit);
    }
    digits
}

/// Splits a digit string into hour and minute text.
fn split_clock<'a>(text: &'a str, repairs: &mut Vec<TimeRepair>) -> Option<(&'a str, &'a str)> {
    let separators: Vec<(usize, char)> = text
        .char_indices()
        .filter(|(_, c)| matches!(c, ':' | '.' | ';' | ','))
        .collect();

    let (hour, minute) = match separators.as_slice() {
        [] => match text.len() {
            1 | 2 => (text, "0"),
            3 | 4 => text.split_at(text.len() - 2),
            _ => return None,
        },
        [(index, separator)] => {
            if *separator != ':' {
                repairs.push(TimeRepair::SeparatorCorrected);
            }
            let (hour, minute) = (&text[..*index], &text[index + 1..]);
            if minute.len() != 2 {
                return None;
            }
            (hour, minute)
        }
        _ => return None,
    };

    let all_digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    (all_digits(hour) && hour.len() <= 2 && all_digits(minute)).then_some((hour, minute))
}

fn apply_meridiem(hour: u32, meridiem: Meridiem) -> Option<u32> {
    if !(1..=12).contains(&hour) {
        return None;
    }
    Some(match (meridiem, hour) {
        (Meridiem::Am, 12) => 0,
        (Meridiem::Am, h) => h,
        (Meridiem::Pm, 12) => 12,
        (Meridiem::Pm, h) => h + 12,
    })
}
