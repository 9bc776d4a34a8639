//! Daily row extraction.

use chrono::NaiveTime;
use regex::{Captures, Regex};
use tracing::trace;

use super::patterns::*;

/// A table row as read, before it is tied to a calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawRow {
    /// Month column, when the layout prints one.
    pub month: Option<u32>,
    pub day: u32,
    pub clock_in: NaiveTime,
    pub clock_out: NaiveTime,
    pub break_minutes: i32,
}

/// One supported row layout.
pub struct RowRule {
    pub name: &'static str,
    pub pattern: &'static Regex,
    pub extract: fn(&Captures<'_>) -> Option<RawRow>,
}

/// Row layouts in priority order. The first layout matching a line wins.
pub fn row_rules() -> [RowRule; 6] {
    [
        RowRule {
            name: "slash_date_minutes",
            pattern: &ROW_SLASH_MINUTES,
            extract: |c| {
                row(
                    Some(num(c, 1)?),
                    num(c, 2)?,
                    (num(c, 3)?, num(c, 4)?),
                    (num(c, 5)?, num(c, 6)?),
                    num(c, 7)? as i32,
                )
            },
        },
        RowRule {
            name: "slash_date_hhmm_break",
            pattern: &ROW_SLASH_HHMM_BREAK,
            extract: |c| {
                let (break_h, break_m) = (num(c, 7)?, num(c, 8)?);
                if break_m > 59 {
                    return None;
                }
                row(
                    Some(num(c, 1)?),
                    num(c, 2)?,
                    (num(c, 3)?, num(c, 4)?),
                    (num(c, 5)?, num(c, 6)?),
                    (break_h * 60 + break_m) as i32,
                )
            },
        },
        RowRule {
            name: "kanji_day",
            pattern: &ROW_KANJI_DAY,
            extract: |c| {
                row(
                    None,
                    num(c, 1)?,
                    (num(c, 2)?, num(c, 3)?),
                    (num(c, 4)?, num(c, 5)?),
                    opt_num(c, 6)? as i32,
                )
            },
        },
        RowRule {
            name: "delimited",
            pattern: &ROW_DELIMITED,
            extract: |c| {
                row(
                    None,
                    num(c, 1)?,
                    (num(c, 2)?, num(c, 3)?),
                    (num(c, 4)?, num(c, 5)?),
                    num(c, 6)? as i32,
                )
            },
        },
        RowRule {
            name: "day_weekday",
            pattern: &ROW_DAY_WEEKDAY,
            extract: |c| {
                row(
                    None,
                    num(c, 1)?,
                    (num(c, 2)?, num(c, 3)?),
                    (num(c, 4)?, num(c, 5)?),
                    opt_num(c, 6)? as i32,
                )
            },
        },
        RowRule {
            name: "kanji_time",
            pattern: &ROW_KANJI_TIME,
            extract: |c| {
                row(
                    Some(num(c, 1)?),
                    num(c, 2)?,
                    (num(c, 3)?, num(c, 4)?),
                    (num(c, 5)?, num(c, 6)?),
                    opt_num(c, 7)? as i32,
                )
            },
        },
    ]
}

impl RowRule {
    pub fn apply(&self, line: &str) -> Option<RawRow> {
        self.pattern.captures(line).and_then(|c| (self.extract)(&c))
    }
}

/// Extract every row that matches a layout and passes range checks.
///
/// Lines that match no layout, or match with an out-of-range day or clock
/// value, are dropped without error.
pub fn extract_rows(text: &str) -> Vec<RawRow> {
    let rules = row_rules();
    let mut rows = Vec::new();

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let Some(rule) = rules.iter().find(|r| r.pattern.is_match(line)) else {
            continue;
        };
        match rule.apply(line) {
            Some(raw) => {
                trace!("Row {:?} via {}", line, rule.name);
                rows.push(raw);
            }
            None => trace!("Dropped out-of-range row {:?} ({})", line, rule.name),
        }
    }

    rows
}

fn row(
    month: Option<u32>,
    day: u32,
    clock_in: (u32, u32),
    clock_out: (u32, u32),
    break_minutes: i32,
) -> Option<RawRow> {
    if !(1..=31).contains(&day) {
        return None;
    }
    if month.is_some_and(|m| !(1..=12).contains(&m)) {
        return None;
    }
    Some(RawRow {
        month,
        day,
        clock_in: NaiveTime::from_hms_opt(clock_in.0, clock_in.1, 0)?,
        clock_out: NaiveTime::from_hms_opt(clock_out.0, clock_out.1, 0)?,
        break_minutes,
    })
}

fn num(c: &Captures<'_>, i: usize) -> Option<u32> {
    c.get(i)?.as_str().parse().ok()
}

/// Optional numeric column, zero when absent.
fn opt_num(c: &Captures<'_>, i: usize) -> Option<u32> {
    match c.get(i) {
        Some(m) => m.as_str().parse().ok(),
        None => Some(0),
    }
}
