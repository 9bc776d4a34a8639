//! Header period (year/month) resolution.

use chrono::{Datelike, NaiveDate};
use regex::{Captures, Regex};
use tracing::debug;

use super::patterns::*;

/// Years accepted from a header. Anything else is a misread.
const YEAR_RANGE: std::ops::RangeInclusive<i32> = 2020..=2030;

/// One way a sheet can print its period.
pub struct PeriodRule {
    pub name: &'static str,
    pub pattern: &'static Regex,
    pub extract: fn(&Captures<'_>) -> Option<(i32, u32)>,
}

/// Period rules in priority order. The first rule yielding a valid period wins.
pub fn period_rules() -> [PeriodRule; 5] {
    [
        PeriodRule {
            name: "english_month",
            pattern: &PERIOD_ENGLISH,
            extract: |c| Some((c[2].parse().ok()?, english_month(&c[1])?)),
        },
        PeriodRule {
            name: "kanji_year_month",
            pattern: &PERIOD_KANJI,
            extract: |c| Some((c[1].parse().ok()?, c[2].parse().ok()?)),
        },
        PeriodRule {
            name: "numeric_year_month",
            pattern: &PERIOD_NUMERIC,
            extract: |c| Some((c[1].parse().ok()?, c[2].parse().ok()?)),
        },
        PeriodRule {
            name: "getsudo",
            pattern: &PERIOD_GETSUDO,
            extract: |c| Some((c[2].parse().ok()?, c[1].parse().ok()?)),
        },
        PeriodRule {
            name: "getsubun",
            pattern: &PERIOD_GETSUBUN,
            extract: |c| Some((c[2].parse().ok()?, c[1].parse().ok()?)),
        },
    ]
}

impl PeriodRule {
    /// First valid period this rule finds in `text`.
    pub fn apply(&self, text: &str) -> Option<(i32, u32)> {
        self.pattern
            .captures_iter(text)
            .filter_map(|c| (self.extract)(&c))
            .find(|&(year, month)| YEAR_RANGE.contains(&year) && (1..=12).contains(&month))
    }
}

/// Parse the sheet period, if the text carries one.
pub fn parse_period(text: &str) -> Option<(i32, u32)> {
    period_rules().iter().find_map(|rule| {
        let found = rule.apply(text);
        if let Some((year, month)) = found {
            debug!("Header period {}-{:02} via {}", year, month, rule.name);
        }
        found
    })
}

/// Parse the sheet period, falling back to the month of `today`.
pub fn resolve_period(text: &str, today: NaiveDate) -> (i32, u32) {
    parse_period(text).unwrap_or_else(|| {
        debug!("No header period found, using {}-{:02}", today.year(), today.month());
        (today.year(), today.month())
    })
}

fn english_month(name: &str) -> Option<u32> {
    let lower = name.to_lowercase();
    let month = match lower.get(..3)? {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}
