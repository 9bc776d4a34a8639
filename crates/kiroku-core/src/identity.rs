//! Fuzzy matching of OCR-recognized names against an employee roster.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{KirokuError, Result};
use crate::models::attendance::EmployeeMatch;
use crate::models::config::IdentityConfig;

/// One employee known to the roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub id: i64,
    #[serde(default)]
    pub name_kanji: Option<String>,
    #[serde(default)]
    pub name_kana: Option<String>,
    #[serde(default)]
    pub name_roman: Option<String>,
    #[serde(default)]
    pub org_unit: Option<String>,
}

impl RosterEntry {
    /// Every non-empty name form of this entry.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        [&self.name_kanji, &self.name_kana, &self.name_roman]
            .into_iter()
            .filter_map(|n| n.as_deref())
            .filter(|n| !n.trim().is_empty())
    }
}

/// Source of roster members.
pub trait Roster: Send + Sync {
    /// Members of `org_unit`, or every member when `org_unit` is `None`.
    ///
    /// The unit identifier passed in is already normalised.
    fn members(&self, org_unit: Option<&str>) -> Vec<RosterEntry>;
}

/// Roster held in memory, typically loaded from a JSON file.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRoster {
    entries: Vec<RosterEntry>,
}

impl InMemoryRoster {
    pub fn new(entries: Vec<RosterEntry>) -> Self {
        Self { entries }
    }

    /// Load a roster from a JSON array of entries.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let entries: Vec<RosterEntry> = serde_json::from_str(&content)
            .map_err(|e| KirokuError::Config(format!("invalid roster {}: {}", path.display(), e)))?;
        Ok(Self::new(entries))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Roster for InMemoryRoster {
    fn members(&self, org_unit: Option<&str>) -> Vec<RosterEntry> {
        self.entries
            .iter()
            .filter(|e| match org_unit {
                None => true,
                Some(unit) => e
                    .org_unit
                    .as_deref()
                    .is_some_and(|u| normalize_org_unit(u) == unit),
            })
            .cloned()
            .collect()
    }
}

/// Strip leading zeros from purely numeric unit identifiers.
///
/// `"007"` becomes `"7"` and `"000"` becomes `"0"`; anything with a
/// non-digit character is only trimmed.
pub fn normalize_org_unit(unit: &str) -> String {
    let unit = unit.trim();
    if !unit.is_empty() && unit.chars().all(|c| c.is_ascii_digit()) {
        let stripped = unit.trim_start_matches('0');
        if stripped.is_empty() {
            "0".to_string()
        } else {
            stripped.to_string()
        }
    } else {
        unit.to_string()
    }
}

/// Edit-distance similarity in `[0, 1]`: `1 - distance / max_len`.
///
/// Whitespace is ignored and latin letters compare case-insensitively.
pub fn similarity(a: &str, b: &str) -> f32 {
    let a: Vec<char> = fold(a);
    let b: Vec<char> = fold(b);
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 0.0;
    }
    1.0 - levenshtein(&a, &b) as f32 / longest as f32
}

fn fold(s: &str) -> Vec<char> {
    s.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

fn levenshtein(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Resolves recognized names to roster members.
pub struct IdentityResolver {
    roster: Box<dyn Roster>,
    threshold: f32,
}

impl IdentityResolver {
    pub fn new(roster: impl Roster + 'static, config: &IdentityConfig) -> Self {
        Self {
            roster: Box::new(roster),
            threshold: config.match_threshold,
        }
    }

    /// Best roster match for `name` within `org_unit`.
    ///
    /// An empty roster or no candidate at or above the threshold yields
    /// [`EmployeeMatch::none`].
    pub fn match_name(&self, name: &str, org_unit: Option<&str>) -> EmployeeMatch {
        if name.trim().is_empty() {
            return EmployeeMatch::none();
        }

        let unit = org_unit.map(normalize_org_unit);
        let members = self.roster.members(unit.as_deref());

        let best = members
            .iter()
            .flat_map(|entry| entry.names().map(move |n| (entry, n, similarity(name, n))))
            .fold(None::<(&RosterEntry, &str, f32)>, |best, candidate| match best {
                Some(b) if b.2 >= candidate.2 => Some(b),
                _ => Some(candidate),
            });

        match best {
            Some((entry, matched, ratio)) if ratio >= self.threshold => {
                debug!("Matched {:?} to {:?} (id {}, {:.2})", name, matched, entry.id, ratio);
                EmployeeMatch {
                    candidate_id: Some(entry.id),
                    matched_name: matched.to_string(),
                    confidence: ratio,
                }
            }
            Some((_, matched, ratio)) => {
                debug!(
                    "No roster match for {:?}: best {:?} at {:.2} below {:.2}",
                    name, matched, ratio, self.threshold
                );
                EmployeeMatch::none()
            }
            None => {
                debug!("No roster members for unit {:?}", unit);
                EmployeeMatch::none()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry(id: i64, kanji: &str, unit: &str) -> RosterEntry {
        RosterEntry {
            id,
            name_kanji: Some(kanji.to_string()),
            name_kana: None,
            name_roman: None,
            org_unit: Some(unit.to_string()),
        }
    }

    fn resolver(entries: Vec<RosterEntry>) -> IdentityResolver {
        IdentityResolver::new(InMemoryRoster::new(entries), &IdentityConfig::default())
    }

    #[test]
    fn test_one_character_ocr_error_matches() {
        let resolver = resolver(vec![entry(1, "田中太郎", "10"), entry(2, "佐藤次郎", "10")]);
        let found = resolver.match_name("田中太朗", Some("10"));
        assert_eq!(found.candidate_id, Some(1));
        assert_eq!(found.matched_name, "田中太郎");
        assert!(found.confidence >= 0.70);
    }

    #[test]
    fn test_zero_padded_unit() {
        let resolver = resolver(vec![entry(1, "田中太郎", "007")]);
        assert!(resolver.match_name("田中太郎", Some("7")).is_match());
        assert!(resolver.match_name("田中太郎", Some("0007")).is_match());
        assert!(!resolver.match_name("田中太郎", Some("8")).is_match());
    }

    #[test]
    fn test_empty_roster_is_no_match() {
        let found = resolver(Vec::new()).match_name("田中太郎", Some("1"));
        assert_eq!(found, EmployeeMatch::none());
    }

    #[test]
    fn test_below_threshold_is_no_match() {
        let resolver = resolver(vec![entry(1, "田中太郎", "1")]);
        let found = resolver.match_name("鈴木花子", None);
        assert_eq!(found.candidate_id, None);
        assert_eq!(found.confidence, 0.0);
    }

    #[test]
    fn test_romanized_names() {
        let mut e = entry(5, "グエン", "1");
        e.name_roman = Some("NGUYEN VAN AN".to_string());
        let found = resolver(vec![e]).match_name("Nguyen Van An", None);
        assert_eq!(found.candidate_id, Some(5));
        assert_eq!(found.confidence, 1.0);
    }

    #[test]
    fn test_normalize_org_unit() {
        assert_eq!(normalize_org_unit("0012"), "12");
        assert_eq!(normalize_org_unit("000"), "0");
        assert_eq!(normalize_org_unit(" A01 "), "A01");
    }

    #[test]
    fn test_similarity() {
        assert_eq!(similarity("abc", "abc"), 1.0);
        assert_eq!(similarity("田中太郎", "田中太朗"), 0.75);
        assert_eq!(similarity("", ""), 0.0);
        assert_eq!(similarity("abc", ""), 0.0);
    }

    #[test]
    fn test_roster_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.json");
        std::fs::write(
            &path,
            r#"[{"id": 1, "name_kanji": "田中太郎", "org_unit": "01"}, {"id": 2, "name_kana": "サトウ"}]"#,
        )
        .unwrap();
        let roster = InMemoryRoster::from_file(&path).unwrap();
        assert_eq!(roster.len(), 2);
        assert_eq!(roster.members(Some("1")).len(), 1);
    }
}
