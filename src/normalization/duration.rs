//! Duration and billing-unit calculation.
//!
//! Durations are computed on minutes since midnight. When the clock-out is
//! earlier than the clock-in the visit is treated as crossing midnight and
//! 24 hours are added. Units use half-up rounding on exact decimals, so a
//! duration exactly halfway between two units always rounds up.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::DurationPolicy;
use crate::models::{ResolvedDate, ResolvedTime, TimeEntry};

const MINUTES_PER_DAY: u32 = 24 * 60;

/// The derived duration of one visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationResult {
    /// Minutes worked, 0-1439.
    pub minutes_worked: u32,
    /// Billing units.
    pub units: u32,
    /// Hours worked, rounded to two decimal places.
    pub hours: Decimal,
    /// Whether the visit crossed midnight.
    pub overnight: bool,
}

/// Computes the duration between two clock times using 15-minute units.
///
/// # Examples
///
/// ```
/// use timesheet_engine::models::ResolvedTime;
/// use timesheet_engine::normalization::compute_duration;
///
/// let day = compute_duration(
///     &ResolvedTime::new(8, 0).unwrap(),
///     &ResolvedTime::new(16, 30).unwrap(),
/// );
/// assert_eq!((day.minutes_worked, day.units), (510, 34));
///
/// let night = compute_duration(
///     &ResolvedTime::new(22, 0).unwrap(),
///     &ResolvedTime::new(6, 0).unwrap(),
/// );
/// assert_eq!((night.minutes_worked, night.units, night.overnight), (480, 32, true));
/// ```
pub fn compute_duration(time_in: &ResolvedTime, time_out: &ResolvedTime) -> DurationResult {
    compute_duration_with_policy(time_in, time_out, &DurationPolicy::default())
}

/// Computes the duration between two clock times under the given policy.
pub fn compute_duration_with_policy(
    time_in: &ResolvedTime,
    time_out: &ResolvedTime,
    policy: &DurationPolicy,
) -> DurationResult {
    let start = time_in.minutes_since_midnight();
    let end = time_out.minutes_since_midnight();

    let overnight = end < start;
    let minutes_worked = if overnight {
        end + MINUTES_PER_DAY - start
    } else {
        end - start
    };

    let hours = (Decimal::from(minutes_worked) / Decimal::from(60)).round_dp(2);

    DurationResult {
        minutes_worked,
        units: billing_units(minutes_worked, policy.minutes_per_unit),
        hours,
        overnight,
    }
}

/// Converts minutes into billing units, rounding half up.
///
/// # Examples
///
/// ```
/// use timesheet_engine::normalization::billing_units;
///
/// assert_eq!(billing_units(7, 15), 0);
/// assert_eq!(billing_units(8, 15), 1);
/// assert_eq!(billing_units(510, 15), 34);
/// ```
pub fn billing_units(minutes: u32, minutes_per_unit: u32) -> u32 {
    let per_unit = Decimal::from(minutes_per_unit.max(1));
    (Decimal::from(minutes) / per_unit)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u32()
        .unwrap_or(0)
}

/// Builds a fresh time entry for a resolved date and time pair.
pub fn build_time_entry(
    date: ResolvedDate,
    time_in: ResolvedTime,
    time_out: ResolvedTime,
    policy: &DurationPolicy,
) -> TimeEntry {
    let duration = compute_duration_with_policy(&time_in, &time_out, policy);
    TimeEntry {
        id: Uuid::new_v4(),
        date,
        time_in,
        time_out,
        minutes_worked: duration.minutes_worked,
        units: duration.units,
        hours: duration.hours,
        overnight: duration.overnight,
        superseded_by: None,
    }
}
