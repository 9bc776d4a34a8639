//! Timer card (attendance sheet) extraction.
//!
//! Turns the raw text of one sheet into a period, an employee name and a
//! list of validated daily records. Each concern (header period, name, row
//! layout) is an ordered table of rules; the first matching rule wins.

pub mod header;
pub mod name;
pub mod patterns;
pub mod rows;
pub mod validate;

use std::collections::HashSet;

use chrono::{Local, NaiveDate};
use tracing::{debug, info, trace, warn};

use crate::error::ExtractionError;
use crate::models::attendance::DailyRecord;

pub use header::{parse_period, resolve_period};
pub use name::{find_employee_name, resolve_employee_name, UNKNOWN_NAME};
pub use rows::{extract_rows, RawRow};
pub use validate::validate;

/// Everything read from one timer card sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct TimecardSheet {
    pub year: i32,
    pub month: u32,
    /// False when the period fell back to the current month.
    pub period_detected: bool,
    pub employee_name: String,
    pub records: Vec<DailyRecord>,
}

/// Timer card extractor.
#[derive(Debug, Clone, Default)]
pub struct TimecardExtractor {
    today: Option<NaiveDate>,
}

impl TimecardExtractor {
    pub fn new() -> Self {
        Self { today: None }
    }

    /// Pin the reference date used for fallback periods and future checks.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    /// Extract a sheet from raw OCR text.
    ///
    /// Fails with `MalformedDocument` only when no valid row is found.
    pub fn extract(&self, raw_text: &str) -> Result<TimecardSheet, ExtractionError> {
        let today = self.today();
        let text = normalize_text(raw_text);

        let detected = parse_period(&text);
        let (year, month) = detected.unwrap_or_else(|| resolve_period("", today));
        let employee_name = resolve_employee_name(&text);

        let mut seen = HashSet::new();
        let mut records = Vec::new();

        for raw in extract_rows(&text) {
            let Some(work_date) = NaiveDate::from_ymd_opt(year, month, raw.day) else {
                trace!("Dropped row for nonexistent date {}-{:02}-{:02}", year, month, raw.day);
                continue;
            };
            if raw.month.is_some_and(|m| m != month) {
                debug!(
                    "Row month {:?} differs from header month {}, using header",
                    raw.month, month
                );
            }
            if !seen.insert(work_date) {
                debug!("Dropped duplicate row for {}", work_date);
                continue;
            }

            let mut record = DailyRecord {
                work_date,
                clock_in: raw.clock_in,
                clock_out: raw.clock_out,
                break_minutes: raw.break_minutes,
                is_night_shift: DailyRecord::detect_night_shift(raw.clock_in, raw.clock_out),
                validation_errors: Vec::new(),
                employee_match: None,
            };
            record.validation_errors = validate(&record, today);

            if work_date > today {
                warn!("Dropped future-dated row {}", work_date);
                continue;
            }

            records.push(record);
        }

        // Merged OCR text does not keep line order.
        records.sort_by_key(|r| r.work_date);

        if records.is_empty() {
            return Err(ExtractionError::MalformedDocument(
                "no valid attendance rows found".to_string(),
            ));
        }

        info!(
            "Timer card {}-{:02} for {}: {} records",
            year,
            month,
            employee_name,
            records.len()
        );

        Ok(TimecardSheet {
            year,
            month,
            period_detected: detected.is_some(),
            employee_name,
            records,
        })
    }
}

/// Fold full-width digits and punctuation to ASCII.
pub fn normalize_text(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '０'..='９' => char::from(b'0' + (c as u32 - '０' as u32) as u8),
            '：' => ':',
            '／' => '/',
            '｜' => '|',
            _ => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn extractor() -> TimecardExtractor {
        TimecardExtractor::new().with_today(NaiveDate::from_ymd_opt(2025, 10, 20).unwrap())
    }

    #[test]
    fn test_extract_sheet() {
        let text = "タイムカード 2025年10月\n\
                    氏名: 田中太郎\n\
                    10/01 08:00 17:00 60\n\
                    10/02 22:00 06:00 45\n\
                    10/03 08:00 17:00 150";

        let sheet = extractor().extract(text).unwrap();

        assert_eq!((sheet.year, sheet.month), (2025, 10));
        assert!(sheet.period_detected);
        assert_eq!(sheet.employee_name, "田中太郎");
        assert_eq!(sheet.records.len(), 3);

        let first = &sheet.records[0];
        assert_eq!(first.work_date, NaiveDate::from_ymd_opt(2025, 10, 1).unwrap());
        assert_eq!(first.clock_in, NaiveTime::from_hms_opt(8, 0, 0).unwrap());
        assert!(first.is_valid());

        assert!(sheet.records[1].is_night_shift);
        assert!(sheet.records[1].is_valid());

        assert_eq!(sheet.records[2].validation_errors.len(), 1);
    }

    #[test]
    fn test_malformed_row_is_dropped() {
        let text = "2025年10月\n10/01 08:00 17:00 60\n10/02 08:00 17:00 invalid";
        let sheet = extractor().extract(text).unwrap();
        assert_eq!(sheet.records.len(), 1);
        assert_eq!(sheet.records[0].work_date.to_string(), "2025-10-01");
    }

    #[test]
    fn test_no_rows_is_malformed() {
        let err = extractor().extract("2025年10月\n氏名: 田中太郎").unwrap_err();
        assert!(matches!(err, ExtractionError::MalformedDocument(_)));
    }

    #[test]
    fn test_future_rows_are_never_returned() {
        let text = "2025年10月\n10/19 08:00 17:00 60\n10/21 08:00 17:00 60\n10/31 08:00 17:00 60";
        let sheet = extractor().extract(text).unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 10, 20).unwrap();
        assert_eq!(sheet.records.len(), 1);
        assert!(sheet.records.iter().all(|r| r.work_date <= today));
    }

    #[test]
    fn test_fallback_period_and_unknown_name() {
        let sheet = extractor().extract("01 (水) 08:00 17:00 60").unwrap();
        assert!(!sheet.period_detected);
        assert_eq!((sheet.year, sheet.month), (2025, 10));
        assert_eq!(sheet.employee_name, UNKNOWN_NAME);
    }

    #[test]
    fn test_full_width_digits() {
        let text = "２０２５年１０月\n１０／０１ ０８：００ １７：００ ６０";
        let sheet = extractor().extract(text).unwrap();
        assert_eq!(sheet.records.len(), 1);
        assert_eq!(sheet.records[0].break_minutes, 60);
    }

    #[test]
    fn test_records_sorted_by_date() {
        let text = "2025年10月\n10/03 08:00 17:00 60\n10/01 08:00 17:00 60";
        let sheet = extractor().extract(text).unwrap();
        assert_eq!(sheet.records[0].work_date.to_string(), "2025-10-01");
        assert_eq!(sheet.records[1].work_date.to_string(), "2025-10-03");
    }

    #[test]
    fn test_nonexistent_date_and_duplicates_dropped() {
        let text = "2025年9月\n9/31 08:00 17:00 60\n9/01 08:00 17:00 60\n9/01 09:00 18:00 60";
        let sheet = extractor().extract(text).unwrap();
        assert_eq!(sheet.records.len(), 1);
        assert_eq!(sheet.records[0].clock_in, NaiveTime::from_hms_opt(8, 0, 0).unwrap());
    }
}
