//! Sanity checks applied to every daily record.

use chrono::NaiveDate;

use crate::models::attendance::DailyRecord;

/// Breaks above this many minutes are an error.
pub const MAX_BREAK_MINUTES: i32 = 180;

/// Breaks above this many minutes (up to the maximum) are flagged as a warning.
pub const LONG_BREAK_MINUTES: i32 = 120;

/// Collect every validation problem of `record` as of `today`.
pub fn validate(record: &DailyRecord, today: NaiveDate) -> Vec<String> {
    let mut errors = Vec::new();

    if record.work_date > today {
        errors.push(format!("work date {} is in the future", record.work_date));
    }

    if !record.is_night_shift && record.clock_out <= record.clock_in {
        errors.push(format!(
            "clock-out {} is not after clock-in {}",
            record.clock_out.format("%H:%M"),
            record.clock_in.format("%H:%M")
        ));
    }

    if record.break_minutes < 0 {
        errors.push(format!("break of {} minutes is negative", record.break_minutes));
    } else if record.break_minutes > MAX_BREAK_MINUTES {
        errors.push(format!(
            "break of {} minutes exceeds {} minutes",
            record.break_minutes, MAX_BREAK_MINUTES
        ));
    } else if record.break_minutes > LONG_BREAK_MINUTES {
        errors.push(format!(
            "warning: break of {} minutes is unusually long",
            record.break_minutes
        ));
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn record(in_h: u32, out_h: u32, break_minutes: i32, night: bool) -> DailyRecord {
        DailyRecord {
            work_date: NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(),
            clock_in: NaiveTime::from_hms_opt(in_h, 0, 0).unwrap(),
            clock_out: NaiveTime::from_hms_opt(out_h, 0, 0).unwrap(),
            break_minutes,
            is_night_shift: night,
            validation_errors: Vec::new(),
            employee_match: None,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 31).unwrap()
    }

    #[test]
    fn test_valid_day_shift() {
        assert!(validate(&record(8, 17, 60, false), today()).is_empty());
    }

    #[test]
    fn test_future_date() {
        let errors = validate(&record(8, 17, 60, false), NaiveDate::from_ymd_opt(2025, 9, 30).unwrap());
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("future"));
    }

    #[test]
    fn test_clock_out_before_clock_in() {
        let errors = validate(&record(17, 8, 60, false), today());
        assert_eq!(errors, vec!["clock-out 08:00 is not after clock-in 17:00".to_string()]);
        assert!(validate(&record(22, 6, 60, true), today()).is_empty());
        assert_eq!(validate(&record(9, 9, 0, false), today()).len(), 1);
    }

    #[test]
    fn test_break_thresholds() {
        assert!(validate(&record(8, 17, 120, false), today()).is_empty());

        let warning = validate(&record(8, 17, 150, false), today());
        assert_eq!(warning.len(), 1);
        assert!(warning[0].starts_with("warning:"));

        let error = validate(&record(8, 17, 181, false), today());
        assert_eq!(error.len(), 1);
        assert!(error[0].contains("exceeds 180"));

        let negative = validate(&record(8, 17, -5, false), today());
        assert!(negative[0].contains("negative"));
    }
}
