//! Attendance (timer card) records.

use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// One working day read from a timer card row.
///
/// Built and validated by the timer card grammar, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub work_date: NaiveDate,
    pub clock_in: NaiveTime,
    pub clock_out: NaiveTime,
    pub break_minutes: i32,
    pub is_night_shift: bool,
    /// Validation problems, errors and warnings alike.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validation_errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_match: Option<EmployeeMatch>,
}

impl DailyRecord {
    /// Whether a shift crosses midnight.
    ///
    /// True when the exit hour is before the entry hour, or the entry is at or
    /// after 20:00 and the exit is at or before 08:00.
    pub fn detect_night_shift(clock_in: NaiveTime, clock_out: NaiveTime) -> bool {
        clock_out.hour() < clock_in.hour() || (clock_in.hour() >= 20 && clock_out.hour() <= 8)
    }

    /// Minutes worked, net of breaks, handling overnight shifts.
    pub fn worked_minutes(&self) -> i64 {
        let mut span = (self.clock_out - self.clock_in).num_minutes();
        if span < 0 && self.is_night_shift {
            span += 24 * 60;
        }
        (span - self.break_minutes as i64).max(0)
    }

    pub fn is_valid(&self) -> bool {
        self.validation_errors.is_empty()
    }
}

/// Best roster candidate for an OCR-recognized name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeMatch {
    /// Absent when no roster entry cleared the threshold.
    pub candidate_id: Option<i64>,
    pub matched_name: String,
    /// Similarity in `[0, 1]`.
    pub confidence: f32,
}

impl EmployeeMatch {
    pub fn none() -> Self {
        Self {
            candidate_id: None,
            matched_name: String::new(),
            confidence: 0.0,
        }
    }

    pub fn is_match(&self) -> bool {
        self.candidate_id.is_some()
    }
}

/// A page that could not be turned into records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageError {
    pub page: u32,
    pub error: String,
}

/// Result of processing a multi-page attendance PDF.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttendanceReport {
    pub pages_processed: u32,
    pub records: Vec<DailyRecord>,
    pub processing_errors: Vec<PageError>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_night_shift_detection() {
        assert!(!DailyRecord::detect_night_shift(t(8, 0), t(17, 0)));
        assert!(DailyRecord::detect_night_shift(t(22, 0), t(6, 0)));
        assert!(DailyRecord::detect_night_shift(t(20, 0), t(5, 0)));
        assert!(DailyRecord::detect_night_shift(t(17, 0), t(1, 30)));
        assert!(!DailyRecord::detect_night_shift(t(20, 0), t(23, 0)));
    }

    #[test]
    fn test_worked_minutes_overnight() {
        let record = DailyRecord {
            work_date: NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(),
            clock_in: t(22, 0),
            clock_out: t(6, 0),
            break_minutes: 60,
            is_night_shift: true,
            validation_errors: Vec::new(),
            employee_match: None,
        };
        assert_eq!(record.worked_minutes(), 7 * 60);
    }
}
