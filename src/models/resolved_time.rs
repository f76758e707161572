//! Resolved clock time model.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A canonical 24-hour clock time.
///
/// `corrected` is set when the raw text had to be repaired (separator
/// corruption, minute overflow, OCR letter-for-digit confusion) to get here.
///
/// # Example
///
/// ```
/// use timesheet_engine::models::ResolvedTime;
///
/// let time = ResolvedTime::new(7, 10).unwrap();
/// assert_eq!(time.canonical(), "07:10");
/// assert_eq!(time.minutes_since_midnight(), 430);
/// assert!(ResolvedTime::new(24, 0).is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedTime {
    /// Hour of day, 0-23.
    pub hour: u8,
    /// Minute of hour, 0-59.
    pub minute: u8,
    /// Whether the raw value was repaired.
    #[serde(default)]
    pub corrected: bool,
}

impl ResolvedTime {
    /// Builds an uncorrected time, or `None` if out of range.
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        (hour < 24 && minute < 60).then_some(Self {
            hour,
            minute,
            corrected: false,
        })
    }

    /// Minutes elapsed since midnight.
    pub fn minutes_since_midnight(&self) -> u32 {
        u32::from(self.hour) * 60 + u32::from(self.minute)
    }

    /// The canonical `HH:MM` rendering.
    pub fn canonical(&self) -> String {
        format!("{:02}:{:02}", self.hour, self.minute)
    }
}

impl fmt::Display for ResolvedTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}
