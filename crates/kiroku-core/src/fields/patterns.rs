//! Common regex patterns for identity document field extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Names
    pub static ref NAME_LABEL: Regex = Regex::new(
        r"(?mi)^\s*(?:氏\s*名|名\s*前|NAME)\s*[:：]?\s*(.+?)\s*$"
    ).unwrap();

    pub static ref KANA_LABEL: Regex = Regex::new(
        r"(?m)^\s*(?:ふりがな|フリガナ)\s*[:：]?\s*(.+?)\s*$"
    ).unwrap();

    // Dates
    pub static ref BIRTHDAY_LABEL: Regex = Regex::new(
        r"(?mi)(?:生年月日|DATE\s+OF\s+BIRTH|誕生日)\s*[:：]?\s*(.+?)\s*$"
    ).unwrap();

    pub static ref BIRTHDAY_SUFFIX: Regex = Regex::new(
        r"((?:昭和|平成|令和|\d{4})\s*(?:\d{1,2}|元)?\s*年\s*\d{1,2}\s*月\s*\d{1,2}\s*日)\s*生"
    ).unwrap();

    pub static ref EXPIRY_LABEL: Regex = Regex::new(
        r"(?mi)(?:満了日|有効期限|PERIOD\s+OF\s+STAY)[^:：\n\d昭平令]*[:：]?\s*(.+?)\s*$"
    ).unwrap();

    pub static ref EXPIRY_SUFFIX: Regex = Regex::new(
        r"((?:昭和|平成|令和|\d{4})\s*(?:\d{1,2}|元)?\s*年\s*\d{1,2}\s*月\s*\d{1,2}\s*日)\s*まで"
    ).unwrap();

    pub static ref ISSUE_LABEL: Regex = Regex::new(
        r"(?m)(?:交付|発行日)\s*[:：]?\s*(.+?)\s*$"
    ).unwrap();

    pub static ref DATE_KANJI: Regex = Regex::new(
        r"(\d{4})\s*年\s*(\d{1,2})\s*月\s*(\d{1,2})\s*日"
    ).unwrap();

    pub static ref DATE_ERA: Regex = Regex::new(
        r"(昭和|平成|令和)\s*(\d{1,2}|元)\s*年\s*(\d{1,2})\s*月\s*(\d{1,2})\s*日"
    ).unwrap();

    pub static ref DATE_NUMERIC: Regex = Regex::new(
        r"\b(\d{4})[./\-](\d{1,2})[./\-](\d{1,2})\b"
    ).unwrap();

    // Nationality, gender, status
    pub static ref NATIONALITY_LABEL: Regex = Regex::new(
        r"(?mi)(?:国籍[・･]?地域|国籍|NATIONALITY(?:\s*/\s*REGION)?)\s*[:：]?\s*(.+?)\s*$"
    ).unwrap();

    pub static ref GENDER_LABEL: Regex = Regex::new(
        r"(?i)(?:性別|SEX)\s*[:：]?\s*(男性?|女性?|M\b|F\b)"
    ).unwrap();

    pub static ref VISA_LABEL: Regex = Regex::new(
        r"(?mi)(?:在留資格|STATUS)\s*[:：]?\s*(.+?)\s*$"
    ).unwrap();

    // Address
    pub static ref ADDRESS_LABEL: Regex = Regex::new(
        r"(?mi)(?:住居地|現住所|住\s*所|ADDRESS)\s*[:：]?\s*(.+?)\s*$"
    ).unwrap();

    // Document numbers
    pub static ref RESIDENCE_CARD_NUMBER: Regex = Regex::new(
        r"\b([A-Z]{2})\s?(\d{8})\s?([A-Z]{2})\b"
    ).unwrap();

    pub static ref RESIDENCE_CARD_NUMBER_EXACT: Regex = Regex::new(
        r"^[A-Z]{2}\d{8}[A-Z]{2}$"
    ).unwrap();

    pub static ref LICENSE_NUMBER: Regex = Regex::new(
        r"第\s*(\d{12})\s*号"
    ).unwrap();

    pub static ref LICENSE_NUMBER_STANDALONE: Regex = Regex::new(
        r"\b(\d{12})\b"
    ).unwrap();

    pub static ref LICENSE_NUMBER_EXACT: Regex = Regex::new(
        r"^\d{12}$"
    ).unwrap();

    pub static ref LICENSE_TYPE_LABEL: Regex = Regex::new(
        r"(?m)種\s*類\s*[:：]?\s*(.+?)\s*$"
    ).unwrap();

    // Contact
    pub static ref PHONE: Regex = Regex::new(
        r"\b(0\d{1,3}-\d{2,4}-\d{3,4}|0[789]0\d{8})\b"
    ).unwrap();

    pub static ref EMAIL: Regex = Regex::new(
        r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}"
    ).unwrap();

    // Trailing content on a name line (birthday or era marker)
    pub static ref NAME_TAIL: Regex = Regex::new(
        r"\s*(?:昭和|平成|令和|\d).*$"
    ).unwrap();
}
