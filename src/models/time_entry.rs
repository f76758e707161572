//! Time entry model.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ResolvedDate, ResolvedTime};

/// One normalized visit line: a date and a clock-in/clock-out pair with the
/// derived duration.
///
/// Invariants: `units` is `minutes_worked / 15` rounded half-up, and
/// `minutes_worked` is never negative (an overnight wrap adds 24 hours).
/// When a reviewer changes a time field the entry is not modified in place;
/// a replacement entry is appended and `superseded_by` points at it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeEntry {
    /// Unique identifier for the entry.
    pub id: Uuid,
    /// The visit date.
    pub date: ResolvedDate,
    /// Clock-in time.
    pub time_in: ResolvedTime,
    /// Clock-out time.
    pub time_out: ResolvedTime,
    /// Minutes worked, 0-1439.
    pub minutes_worked: u32,
    /// Billing units.
    pub units: u32,
    /// Hours worked as an exact decimal.
    pub hours: Decimal,
    /// Whether the visit crossed midnight.
    pub overnight: bool,
    /// The entry that replaced this one, if it was edited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superseded_by: Option<Uuid>,
}

impl TimeEntry {
    /// Returns true if this entry has not been superseded.
    pub fn is_active(&self) -> bool {
        self.superseded_by.is_none()
    }
}
