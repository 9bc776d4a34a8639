//! Employee name resolution.

use regex::Regex;
use tracing::debug;

use super::patterns::*;

/// Name used when no rule finds one.
pub const UNKNOWN_NAME: &str = "不明";

/// Words that appear on sheets but are never a person's name.
const STOP_WORDS: &[&str] = &[
    "タイムカード",
    "カード",
    "出勤",
    "退勤",
    "休憩",
    "合計",
    "勤務",
    "勤怠",
    "時間",
    "日付",
    "曜日",
    "備考",
    "残業",
    "深夜",
    "所属",
    "部署",
    "工場",
    "会社",
    "月度",
    "月分",
    "氏名",
    "社員",
    "年月",
];

const ENGLISH_STOP_WORDS: &[&str] = &[
    "Time", "Card", "Total", "Name", "Date", "Break", "Clock", "Employee", "Sheet", "Attendance",
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

/// One way a sheet can carry the employee's name.
pub struct NameRule {
    pub name: &'static str,
    pub apply: fn(&str) -> Option<String>,
}

/// Name rules in priority order.
pub fn name_rules() -> [NameRule; 4] {
    [
        NameRule {
            name: "labeled",
            apply: labeled,
        },
        NameRule {
            name: "japanese_two_token",
            apply: japanese_two_token,
        },
        NameRule {
            name: "english_two_word",
            apply: english_two_word,
        },
        NameRule {
            name: "kanji_kana_run",
            apply: kanji_kana_run,
        },
    ]
}

/// Find the employee name, if any rule matches.
pub fn find_employee_name(text: &str) -> Option<String> {
    name_rules().iter().find_map(|rule| {
        let found = (rule.apply)(text);
        if let Some(ref name) = found {
            debug!("Employee name {:?} via {}", name, rule.name);
        }
        found
    })
}

/// Find the employee name, or the placeholder `不明`.
pub fn resolve_employee_name(text: &str) -> String {
    find_employee_name(text).unwrap_or_else(|| UNKNOWN_NAME.to_string())
}

fn labeled(text: &str) -> Option<String> {
    NAME_LABELED.captures_iter(text).find_map(|c| {
        let without_id = NAME_TRAILING_ID.replace(&c[1], "");
        let cleaned = NAME_SEPARATORS.replace_all(&without_id, "");
        let cleaned = cleaned.trim();
        let has_letters = cleaned.chars().any(char::is_alphabetic);
        (has_letters && !is_stop_word(cleaned)).then(|| cleaned.to_string())
    })
}

fn japanese_two_token(text: &str) -> Option<String> {
    NAME_JAPANESE_TWO_TOKEN
        .captures_iter(text)
        .map(|c| format!("{} {}", &c[1], &c[2]))
        .find(|name| !is_stop_word(name))
}

fn english_two_word(text: &str) -> Option<String> {
    NAME_ENGLISH
        .captures_iter(text)
        .filter(|c| {
            !ENGLISH_STOP_WORDS.contains(&&c[1]) && !ENGLISH_STOP_WORDS.contains(&&c[2])
        })
        .map(|c| format!("{} {}", &c[1], &c[2]))
        .next()
}

fn kanji_kana_run(text: &str) -> Option<String> {
    first_unstopped(&NAME_KANJI_RUN, text)
}

fn first_unstopped(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .find_iter(text)
        .map(|m| m.as_str())
        .find(|s| !is_stop_word(s))
        .map(str::to_string)
}

fn is_stop_word(candidate: &str) -> bool {
    STOP_WORDS.iter().any(|w| candidate.contains(w))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labeled_names() {
        assert_eq!(find_employee_name("氏名: 田中太郎"), Some("田中太郎".to_string()));
        assert_eq!(find_employee_name("社員名：佐藤 次郎"), Some("佐藤 次郎".to_string()));
        assert_eq!(find_employee_name("Name: John Smith"), Some("John Smith".to_string()));
    }

    #[test]
    fn test_labeled_name_strips_trailing_id() {
        assert_eq!(find_employee_name("氏名: 田中太郎 12345"), Some("田中太郎".to_string()));
        assert_eq!(find_employee_name("氏名：田中太郎（No.0042）"), Some("田中太郎".to_string()));
        assert_eq!(find_employee_name("社員名: 鈴木一郎 / "), Some("鈴木一郎".to_string()));
    }

    #[test]
    fn test_empty_label_does_not_take_next_line() {
        let text = "2025年10月\n氏名:\n10/01 08:00 17:00 60";
        assert_eq!(find_employee_name(text), None);
        assert_eq!(resolve_employee_name(text), UNKNOWN_NAME);

        let text = "氏名：\n山田　花子\n10/01 08:00 17:00 60";
        assert_eq!(find_employee_name(text), Some("山田 花子".to_string()));
    }

    #[test]
    fn test_label_value_without_letters_is_ignored() {
        assert_eq!(find_employee_name("氏名: 12:30 - 15"), None);
    }

    #[test]
    fn test_other_name_labels_are_not_employee_names() {
        assert_eq!(find_employee_name("Company Name: ACME\nFilename: scan"), None);
        assert_eq!(
            find_employee_name("Company Name: ACME\nEmployee Name: John Smith"),
            Some("John Smith".to_string())
        );
    }

    #[test]
    fn test_japanese_two_token_heuristic() {
        let text = "タイムカード\n山田　花子\n10/01 08:00 17:00 60";
        assert_eq!(find_employee_name(text), Some("山田 花子".to_string()));
    }

    #[test]
    fn test_english_heuristic_skips_header_words() {
        let text = "Time Card October 2025\nMaria Santos\n";
        assert_eq!(find_employee_name(text), Some("Maria Santos".to_string()));
    }

    #[test]
    fn test_kanji_run_fallback() {
        let text = "タイムカード 2025年10月度\n高橋健\n";
        assert_eq!(find_employee_name(text), Some("高橋健".to_string()));
    }

    #[test]
    fn test_unknown_placeholder() {
        assert_eq!(resolve_employee_name("10/01 08:00 17:00 60"), UNKNOWN_NAME);
        assert_eq!(resolve_employee_name(""), UNKNOWN_NAME);
    }
}
