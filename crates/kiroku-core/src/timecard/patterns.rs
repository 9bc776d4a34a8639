//! Regex patterns for timer card sheets.
//!
//! Row patterns are anchored to a whole line so that a row with a trailing
//! unparseable column does not partially match a shorter layout.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Header period
    pub static ref PERIOD_ENGLISH: Regex = Regex::new(
        r"(?i)\b(January|February|March|April|May|June|July|August|September|October|November|December|Jan|Feb|Mar|Apr|Jun|Jul|Aug|Sept|Sep|Oct|Nov|Dec)\.?,?\s+(\d{4})\b"
    ).unwrap();

    pub static ref PERIOD_KANJI: Regex = Regex::new(
        r"(\d{4})\s*年\s*(\d{1,2})\s*月"
    ).unwrap();

    pub static ref PERIOD_NUMERIC: Regex = Regex::new(
        r"\b(\d{4})[/\-.](\d{1,2})\b"
    ).unwrap();

    pub static ref PERIOD_GETSUDO: Regex = Regex::new(
        r"(\d{1,2})\s*月度.*?(\d{4})"
    ).unwrap();

    pub static ref PERIOD_GETSUBUN: Regex = Regex::new(
        r"(\d{1,2})\s*月分.*?(\d{4})"
    ).unwrap();

    // Employee name
    // English labels only at line start or after Employee/Staff, so
    // "Company Name:" and "Filename:" are not read as the employee.
    pub static ref NAME_LABELED: Regex = Regex::new(
        r"(?mi)(?:氏[ \t\u{3000}]*名|社員名|従業員名|名[ \t\u{3000}]*前|(?:^[ \t\u{3000}]*|\b(?:employee|staff)[ \t]+)name\b)(?:[ \t\u{3000}]*[:：][ \t\u{3000}]*|[ \t\u{3000}]+)(.+?)[ \t\u{3000}]*$"
    ).unwrap();

    pub static ref NAME_TRAILING_ID: Regex = Regex::new(
        r"[\s(（\[【#№]*(?:No\.?\s*)?\d+[)）\]】]?\s*$"
    ).unwrap();

    pub static ref NAME_SEPARATORS: Regex = Regex::new(
        r"^[\s:：,、/|・\-]+|[\s:：,、/|・\-]+$"
    ).unwrap();

    pub static ref NAME_JAPANESE_TWO_TOKEN: Regex = Regex::new(
        r"(?m)^[ \t\u{3000}]*(\p{Han}{1,4})[ \t\u{3000}]+([\p{Han}\p{Hiragana}\p{Katakana}ー]{1,4})[ \t\u{3000}]*$"
    ).unwrap();

    pub static ref NAME_ENGLISH: Regex = Regex::new(
        r"\b([A-Z][a-z]+)[ \t]+([A-Z][a-z]+)\b"
    ).unwrap();

    pub static ref NAME_KANJI_RUN: Regex = Regex::new(
        r"[\p{Han}\p{Hiragana}\p{Katakana}ー]{2,8}"
    ).unwrap();

    // Daily rows
    pub static ref ROW_SLASH_MINUTES: Regex = Regex::new(
        r"^(\d{1,2})/(\d{1,2})\s+(\d{1,2}):(\d{2})\s+(\d{1,2}):(\d{2})\s+(\d{1,3})\s*分?$"
    ).unwrap();

    pub static ref ROW_SLASH_HHMM_BREAK: Regex = Regex::new(
        r"^(\d{1,2})/(\d{1,2})\s+(\d{1,2}):(\d{2})\s+(\d{1,2}):(\d{2})\s+(\d{1,2}):(\d{2})$"
    ).unwrap();

    pub static ref ROW_KANJI_DAY: Regex = Regex::new(
        r"^(\d{1,2})\s*日\s*(?:[(（][月火水木金土日][)）])?\s+(\d{1,2}):(\d{2})\s*[-~〜～]?\s*(\d{1,2}):(\d{2})(?:\s+(\d{1,3})\s*分?)?$"
    ).unwrap();

    pub static ref ROW_DELIMITED: Regex = Regex::new(
        r"^(\d{1,2})\s*[|\t,]\s*(\d{1,2}):(\d{2})\s*[|\t,]\s*(\d{1,2}):(\d{2})\s*[|\t,]\s*(\d{1,3})$"
    ).unwrap();

    pub static ref ROW_DAY_WEEKDAY: Regex = Regex::new(
        r"^(\d{1,2})\s*[(（]?[月火水木金土日][)）]?\s+(\d{1,2}):(\d{2})\s+(\d{1,2}):(\d{2})(?:\s+(\d{1,3}))?$"
    ).unwrap();

    pub static ref ROW_KANJI_TIME: Regex = Regex::new(
        r"^(\d{1,2})/(\d{1,2})\s+(\d{1,2})時(\d{2})分\s+(\d{1,2})時(\d{2})分(?:\s+(\d{1,3})分)?$"
    ).unwrap();
}
