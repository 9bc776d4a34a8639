//! Date normalisation for identity documents.
//!
//! Accepts Gregorian (`1990年1月1日`, `1990/01/01`, `1990-01-01`) and Japanese
//! era (`平成2年1月1日`, `令和元年5月1日`) dates and renders them as
//! `YYYY年MM月DD日`.

use chrono::{Datelike, NaiveDate};

use super::patterns::{DATE_ERA, DATE_KANJI, DATE_NUMERIC};

/// Parse the first date found in `text`.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    if let Some(caps) = DATE_ERA.captures(text) {
        let offset = era_offset(&caps[1])?;
        let era_year: i32 = if &caps[2] == "元" {
            1
        } else {
            caps[2].parse().ok()?
        };
        let month: u32 = caps[3].parse().ok()?;
        let day: u32 = caps[4].parse().ok()?;
        if let Some(date) = NaiveDate::from_ymd_opt(offset + era_year, month, day) {
            return Some(date);
        }
    }

    if let Some(caps) = DATE_KANJI.captures(text) {
        let year: i32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let day: u32 = caps[3].parse().ok()?;
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some(date);
        }
    }

    if let Some(caps) = DATE_NUMERIC.captures(text) {
        let year: i32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let day: u32 = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    None
}

/// Render a date the way documents print it.
pub fn format_date(date: NaiveDate) -> String {
    format!("{:04}年{:02}月{:02}日", date.year(), date.month(), date.day())
}

/// Parse and render in one step.
pub fn normalize_date(text: &str) -> Option<String> {
    parse_date(text).map(format_date)
}

/// Whether a value carries year, month and day markers.
pub fn is_full_date(value: &str) -> bool {
    DATE_KANJI.is_match(value) || DATE_ERA.is_match(value) || DATE_NUMERIC.is_match(value)
}

fn era_offset(era: &str) -> Option<i32> {
    match era {
        "昭和" => Some(1925),
        "平成" => Some(1988),
        "令和" => Some(2018),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kanji_date() {
        assert_eq!(normalize_date("1990年1月1日"), Some("1990年01月01日".to_string()));
    }

    #[test]
    fn test_numeric_date() {
        assert_eq!(normalize_date("1985/12/31"), Some("1985年12月31日".to_string()));
        assert_eq!(normalize_date("2001-02-03"), Some("2001年02月03日".to_string()));
    }

    #[test]
    fn test_era_dates() {
        assert_eq!(normalize_date("平成2年3月4日生"), Some("1990年03月04日".to_string()));
        assert_eq!(normalize_date("令和元年5月1日"), Some("2019年05月01日".to_string()));
        assert_eq!(normalize_date("昭和60年 1月 15日"), Some("1985年01月15日".to_string()));
    }

    #[test]
    fn test_invalid_dates() {
        assert_eq!(normalize_date("1990年13月01日"), None);
        assert_eq!(normalize_date("no date here"), None);
    }

    #[test]
    fn test_full_date_markers() {
        assert!(is_full_date("1990年01月01日"));
        assert!(!is_full_date("1990年01月"));
        assert!(!is_full_date("1990"));
    }
}
