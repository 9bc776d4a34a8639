//! Rule-based field extraction from raw OCR text.
//!
//! Every provider hands its raw text to [`extract_fields`], so the field map
//! of two providers differs only by what each backend managed to read.

pub mod dates;
pub mod patterns;

use std::collections::BTreeMap;

use tracing::debug;

use crate::models::document::DocumentType;
use crate::timecard;

use patterns::*;

/// Extract the field map for `document_type` from raw text.
///
/// Every known field of the document type is present as a key; fields that
/// could not be read are `None`.
pub fn extract_fields(
    document_type: DocumentType,
    text: &str,
) -> BTreeMap<String, Option<String>> {
    let mut fields: BTreeMap<String, Option<String>> = document_type
        .known_fields()
        .iter()
        .map(|f| (f.to_string(), None))
        .collect();

    let found = match document_type {
        DocumentType::ResidenceCard => residence_card(text),
        DocumentType::Resume => resume(text),
        DocumentType::DriverLicense => driver_license(text),
        DocumentType::TimerCard => timer_card(text),
    };

    for (key, value) in found {
        if let Some(slot) = fields.get_mut(key) {
            *slot = Some(value);
        }
    }

    debug!(
        "Extracted {}/{} {} fields",
        fields.values().filter(|v| v.is_some()).count(),
        fields.len(),
        document_type
    );

    fields
}

type Found = Vec<(&'static str, String)>;

fn residence_card(text: &str) -> Found {
    let mut found = Found::new();
    push(&mut found, "name", extract_name(text));
    push(&mut found, "birthday", extract_birthday(text));
    push(&mut found, "nationality", extract_nationality(text));
    push(&mut found, "gender", extract_gender(text));
    push(&mut found, "address", labeled(&ADDRESS_LABEL, text));
    push(&mut found, "card_number", extract_card_number(text));
    push(&mut found, "visa_type", labeled(&VISA_LABEL, text));
    push(&mut found, "expiry_date", extract_expiry(text));
    found
}

fn resume(text: &str) -> Found {
    let mut found = Found::new();
    push(&mut found, "name", extract_name(text));
    push(&mut found, "name_kana", labeled(&KANA_LABEL, text));
    push(&mut found, "birthday", extract_birthday(text));
    push(&mut found, "gender", extract_gender(text));
    push(&mut found, "nationality", extract_nationality(text));
    push(&mut found, "address", labeled(&ADDRESS_LABEL, text));
    push(
        &mut found,
        "phone",
        PHONE.captures(text).map(|c| c[1].to_string()),
    );
    push(
        &mut found,
        "email",
        EMAIL.find(text).map(|m| m.as_str().to_string()),
    );
    found
}

fn driver_license(text: &str) -> Found {
    let mut found = Found::new();
    push(&mut found, "name", extract_name(text));
    push(&mut found, "birthday", extract_birthday(text));
    push(&mut found, "address", labeled(&ADDRESS_LABEL, text));
    push(&mut found, "license_number", extract_license_number(text));
    push(
        &mut found,
        "issue_date",
        labeled(&ISSUE_LABEL, text).and_then(|v| dates::normalize_date(&v)),
    );
    push(&mut found, "expiry_date", extract_expiry(text));
    push(&mut found, "license_type", labeled(&LICENSE_TYPE_LABEL, text));
    found
}

fn timer_card(text: &str) -> Found {
    let mut found = Found::new();
    push(&mut found, "employee_name", timecard::find_employee_name(text));
    push(
        &mut found,
        "period",
        timecard::parse_period(text).map(|(y, m)| format!("{:04}-{:02}", y, m)),
    );
    found
}

fn push(found: &mut Found, key: &'static str, value: Option<String>) {
    if let Some(v) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        found.push((key, v));
    }
}

fn labeled(pattern: &regex::Regex, text: &str) -> Option<String> {
    pattern
        .captures(text)
        .map(|c| c[1].trim().to_string())
        .filter(|v| !v.is_empty())
}

fn extract_name(text: &str) -> Option<String> {
    let raw = labeled(&NAME_LABEL, text)?;
    // License name lines continue with the birthday.
    let name = NAME_TAIL.replace(&raw, "");
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}

fn extract_birthday(text: &str) -> Option<String> {
    if let Some(date) = labeled(&BIRTHDAY_LABEL, text).and_then(|v| dates::normalize_date(&v)) {
        return Some(date);
    }
    BIRTHDAY_SUFFIX
        .captures(text)
        .and_then(|c| dates::normalize_date(&c[1]))
}

fn extract_expiry(text: &str) -> Option<String> {
    if let Some(date) = labeled(&EXPIRY_LABEL, text).and_then(|v| dates::normalize_date(&v)) {
        return Some(date);
    }
    EXPIRY_SUFFIX
        .captures(text)
        .and_then(|c| dates::normalize_date(&c[1]))
}

fn extract_nationality(text: &str) -> Option<String> {
    labeled(&NATIONALITY_LABEL, text).map(|v| normalize_nationality(&v))
}

fn extract_gender(text: &str) -> Option<String> {
    let caps = GENDER_LABEL.captures(text)?;
    let value = caps[1].to_uppercase();
    if value.starts_with('男') || value == "M" {
        Some("男".to_string())
    } else if value.starts_with('女') || value == "F" {
        Some("女".to_string())
    } else {
        None
    }
}

fn extract_card_number(text: &str) -> Option<String> {
    RESIDENCE_CARD_NUMBER
        .captures(text)
        .map(|c| format!("{}{}{}", &c[1], &c[2], &c[3]))
}

fn extract_license_number(text: &str) -> Option<String> {
    LICENSE_NUMBER
        .captures(text)
        .or_else(|| LICENSE_NUMBER_STANDALONE.captures(text))
        .map(|c| c[1].to_string())
}

/// Map Japanese country names to English; unknown values pass through.
pub fn normalize_nationality(value: &str) -> String {
    let trimmed = value.trim();
    let english = match trimmed {
        "ベトナム" | "VIETNAM" | "VIET NAM" => "Vietnam",
        "中国" | "CHINA" => "China",
        "フィリピン" | "PHILIPPINES" => "Philippines",
        "ブラジル" | "BRAZIL" => "Brazil",
        "インドネシア" | "INDONESIA" => "Indonesia",
        "ネパール" | "NEPAL" => "Nepal",
        "ペルー" | "PERU" => "Peru",
        "韓国" | "KOREA" => "Korea",
        "タイ" | "THAILAND" => "Thailand",
        "ミャンマー" | "MYANMAR" => "Myanmar",
        "日本" | "JAPAN" => "Japan",
        _ => return trimmed.to_string(),
    };
    english.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_residence_card_fields() {
        let text = "在留カード\n\
                    氏名 NGUYEN VAN AN\n\
                    生年月日 1995年04月12日 性別 男 M\n\
                    国籍・地域 ベトナム\n\
                    住居地 愛知県名古屋市中区栄1-2-3\n\
                    在留資格 技能実習\n\
                    在留期間(満了日) 3年 (2027年03月31日)\n\
                    番号 AB12345678CD";

        let fields = extract_fields(DocumentType::ResidenceCard, text);

        assert_eq!(fields["name"].as_deref(), Some("NGUYEN VAN AN"));
        assert_eq!(fields["birthday"].as_deref(), Some("1995年04月12日"));
        assert_eq!(fields["nationality"].as_deref(), Some("Vietnam"));
        assert_eq!(fields["gender"].as_deref(), Some("男"));
        assert_eq!(fields["address"].as_deref(), Some("愛知県名古屋市中区栄1-2-3"));
        assert_eq!(fields["card_number"].as_deref(), Some("AB12345678CD"));
        assert_eq!(fields["visa_type"].as_deref(), Some("技能実習"));
        assert_eq!(fields["expiry_date"].as_deref(), Some("2027年03月31日"));
    }

    #[test]
    fn test_missing_fields_are_null() {
        let fields = extract_fields(DocumentType::ResidenceCard, "nothing useful");
        assert_eq!(fields.len(), DocumentType::ResidenceCard.known_fields().len());
        assert!(fields.values().all(|v| v.is_none()));
    }

    #[test]
    fn test_driver_license_fields() {
        let text = "氏名 田中 太郎 昭和60年1月15日生\n\
                    住所 東京都新宿区西新宿2-8-1\n\
                    交付 令和03年02月10日\n\
                    令和08年02月15日まで有効\n\
                    第 123456789012 号\n\
                    種類 普通";

        let fields = extract_fields(DocumentType::DriverLicense, text);

        assert_eq!(fields["name"].as_deref(), Some("田中 太郎"));
        assert_eq!(fields["birthday"].as_deref(), Some("1985年01月15日"));
        assert_eq!(fields["license_number"].as_deref(), Some("123456789012"));
        assert_eq!(fields["issue_date"].as_deref(), Some("2021年02月10日"));
        assert_eq!(fields["expiry_date"].as_deref(), Some("2026年02月15日"));
        assert_eq!(fields["license_type"].as_deref(), Some("普通"));
    }

    #[test]
    fn test_resume_contact_fields() {
        let text = "履歴書\n\
                    ふりがな たなか はなこ\n\
                    氏名 田中 花子\n\
                    生年月日 平成10年7月7日\n\
                    性別 女\n\
                    現住所 大阪府大阪市北区梅田1-1\n\
                    電話 090-1234-5678\n\
                    hanako@example.jp";

        let fields = extract_fields(DocumentType::Resume, text);

        assert_eq!(fields["name"].as_deref(), Some("田中 花子"));
        assert_eq!(fields["name_kana"].as_deref(), Some("たなか はなこ"));
        assert_eq!(fields["birthday"].as_deref(), Some("1998年07月07日"));
        assert_eq!(fields["gender"].as_deref(), Some("女"));
        assert_eq!(fields["phone"].as_deref(), Some("090-1234-5678"));
        assert_eq!(fields["email"].as_deref(), Some("hanako@example.jp"));
    }

    #[test]
    fn test_timer_card_fields() {
        let text = "タイムカード 2025年10月\n氏名: 佐藤 次郎\n10/01 08:00 17:00 60";
        let fields = extract_fields(DocumentType::TimerCard, text);
        assert_eq!(fields["period"].as_deref(), Some("2025-10"));
        assert_eq!(fields["employee_name"].as_deref(), Some("佐藤 次郎"));
    }

    #[test]
    fn test_nationality_passthrough() {
        assert_eq!(normalize_nationality(" ベトナム "), "Vietnam");
        assert_eq!(normalize_nationality("Mongolia"), "Mongolia");
    }
}
