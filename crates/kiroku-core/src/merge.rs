//! Field-by-field merge of two provider results.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use regex::Regex;
use tracing::debug;

use crate::fields::dates::is_full_date;
use crate::fields::patterns::{LICENSE_NUMBER_EXACT, RESIDENCE_CARD_NUMBER_EXACT};
use crate::models::document::{ExtractionMethod, ExtractionResult, ProviderResult};
use crate::provider::BackendKind;

/// Confidence of a merged result. Models a cross-check, not per-field agreement.
pub const MERGED_CONFIDENCE: f32 = 0.95;

/// How conflicting values of a field are resolved.
#[derive(Debug, Clone, Copy)]
pub enum FieldCategory {
    /// Longer value wins.
    Name,
    /// Value with year, month and day wins.
    Date,
    /// Local engine wins over the cloud backend.
    Nationality,
    /// Value matching the number format wins.
    DocumentNumber(&'static Regex),
    /// Primary wins.
    Other,
}

impl FieldCategory {
    pub fn of(field: &str) -> Self {
        match field {
            "name" | "name_kana" | "employee_name" => Self::Name,
            "birthday" | "expiry_date" | "issue_date" => Self::Date,
            "nationality" => Self::Nationality,
            "card_number" => Self::DocumentNumber(&RESIDENCE_CARD_NUMBER_EXACT),
            "license_number" => Self::DocumentNumber(&LICENSE_NUMBER_EXACT),
            _ => Self::Other,
        }
    }

    /// Pick between two differing non-empty values.
    fn resolve<'a>(&self, primary: &'a str, secondary: &'a str, primary_backend: BackendKind) -> &'a str {
        match self {
            Self::Name => {
                if secondary.chars().count() > primary.chars().count() {
                    secondary
                } else {
                    primary
                }
            }
            Self::Date => {
                if !is_full_date(primary) && is_full_date(secondary) {
                    secondary
                } else {
                    primary
                }
            }
            Self::Nationality => match primary_backend {
                BackendKind::Cloud => secondary,
                BackendKind::Local => primary,
            },
            Self::DocumentNumber(format) => {
                if !format.is_match(primary) && format.is_match(secondary) {
                    secondary
                } else {
                    primary
                }
            }
            Self::Other => primary,
        }
    }
}

/// Merge two successful results into one hybrid result.
///
/// `primary` is the configured-primary provider's result regardless of which
/// finished first, so ties resolve the same way on every run.
pub fn merge(
    primary: &ProviderResult,
    secondary: &ProviderResult,
    primary_backend: BackendKind,
) -> ExtractionResult {
    let a = primary.present_fields();
    let b = secondary.present_fields();
    let keys: BTreeSet<&String> = a.keys().chain(b.keys()).collect();

    let mut fields = BTreeMap::new();
    let mut replaced = 0;

    for key in keys {
        let value = match (a.get(key), b.get(key)) {
            (Some(p), Some(s)) if p == s => p.clone(),
            (Some(p), Some(s)) => {
                let chosen = FieldCategory::of(key).resolve(p, s, primary_backend);
                if chosen != p.as_str() {
                    replaced += 1;
                }
                chosen.to_string()
            }
            (Some(p), None) => p.clone(),
            (None, Some(s)) => {
                replaced += 1;
                s.clone()
            }
            (None, None) => continue,
        };
        fields.insert(key.clone(), value);
    }

    debug!("Merged {} fields, {} taken from secondary", fields.len(), replaced);

    ExtractionResult {
        success: true,
        method_used: ExtractionMethod::Hybrid,
        confidence: MERGED_CONFIDENCE,
        fields,
        raw_text: merge_raw_text(&primary.raw_text, &secondary.raw_text),
        failure: None,
    }
}

/// Union of both texts' lines, deduplicated, longest first.
pub fn merge_raw_text(primary: &str, secondary: &str) -> String {
    let mut seen = HashSet::new();
    let mut lines: Vec<&str> = primary
        .lines()
        .chain(secondary.lines())
        .map(str::trim)
        .filter(|l| !l.is_empty() && seen.insert(*l))
        .collect();
    lines.sort_by_key(|l| std::cmp::Reverse(l.chars().count()));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn result(pairs: &[(&str, &str)]) -> ProviderResult {
        ProviderResult::success(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), Some(v.to_string())))
                .collect(),
            pairs.iter().map(|(_, v)| *v).collect::<Vec<_>>().join("\n"),
        )
    }

    #[test]
    fn test_merge_is_idempotent() {
        let r = result(&[("name", "田中太郎"), ("birthday", "1990年01月01日")]);
        let merged = merge(&r, &r, BackendKind::Cloud);
        assert_eq!(merged.fields, r.present_fields());
        assert_eq!(merged.confidence, MERGED_CONFIDENCE);
        assert_eq!(merged.method_used, ExtractionMethod::Hybrid);
    }

    #[test]
    fn test_missing_field_taken_from_secondary() {
        let primary = result(&[("name", "田中太郎")]);
        let secondary = result(&[("nationality", "Vietnam")]);
        let merged = merge(&primary, &secondary, BackendKind::Cloud);
        assert_eq!(merged.field("nationality"), Some("Vietnam"));
        assert_eq!(merged.field("name"), Some("田中太郎"));
    }

    #[test]
    fn test_longer_name_wins() {
        let merged = merge(
            &result(&[("name", "NGUYEN VAN")]),
            &result(&[("name", "NGUYEN VAN AN")]),
            BackendKind::Local,
        );
        assert_eq!(merged.field("name"), Some("NGUYEN VAN AN"));
    }

    #[test]
    fn test_full_date_wins() {
        let merged = merge(
            &result(&[("birthday", "1990年01月")]),
            &result(&[("birthday", "1990年01月01日")]),
            BackendKind::Local,
        );
        assert_eq!(merged.field("birthday"), Some("1990年01月01日"));
    }

    #[test]
    fn test_nationality_depends_on_primary_backend() {
        let cloud = result(&[("nationality", "VIET NAM")]);
        let local = result(&[("nationality", "Vietnam")]);
        assert_eq!(
            merge(&cloud, &local, BackendKind::Cloud).field("nationality"),
            Some("Vietnam")
        );
        assert_eq!(
            merge(&cloud, &local, BackendKind::Local).field("nationality"),
            Some("VIET NAM")
        );
    }

    #[test]
    fn test_card_number_format_wins() {
        let merged = merge(
            &result(&[("card_number", "AB1234567BCD")]),
            &result(&[("card_number", "AB12345678CD")]),
            BackendKind::Local,
        );
        assert_eq!(merged.field("card_number"), Some("AB12345678CD"));

        let neither = merge(
            &result(&[("license_number", "1234")]),
            &result(&[("license_number", "5678")]),
            BackendKind::Local,
        );
        assert_eq!(neither.field("license_number"), Some("1234"));
    }

    #[test]
    fn test_other_fields_keep_primary() {
        let merged = merge(
            &result(&[("visa_type", "技能実習")]),
            &result(&[("visa_type", "特定技能")]),
            BackendKind::Cloud,
        );
        assert_eq!(merged.field("visa_type"), Some("技能実習"));
    }

    #[test]
    fn test_raw_text_union() {
        let text = merge_raw_text("ab\nabcd\n", "abcd\nabc\n\n");
        assert_eq!(text, "abcd\nabc\nab");
    }
}
