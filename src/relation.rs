//! Relation labels: synonym folding and the strength order between
//! categories.
//!
//! A category's strength is its index in the hierarchy, lower being more
//! favorable. Categories outside the hierarchy are unranked and lose against
//! any ranked one.

use indexmap::IndexMap;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Lowercased free-text variant -> canonical category.
#[derive(Debug, Clone, Default)]
pub struct SynonymTable {
    variants: HashMap<String, String>,
}

impl SynonymTable {
    /// Builds the table from `canonical -> variants` groups. A variant listed
    /// under several groups maps to the last one.
    pub fn from_groups(groups: &IndexMap<String, Vec<String>>) -> Self {
        let mut variants = HashMap::new();
        for (canonical, group) in groups {
            for variant in group {
                variants.insert(variant.trim().to_lowercase(), canonical.clone());
            }
        }
        Self { variants }
    }

    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.variants.get(key).map(String::as_str)
    }
}

/// Maps a raw cell to its canonical category.
///
/// `None` means no answer. Unknown labels come back lowercased and trimmed,
/// forming their own unranked category.
pub fn normalize_relation(raw: Option<&str>, synonyms: &SynonymTable) -> Option<String> {
    let raw = raw?;
    if raw.is_empty() {
        return None;
    }
    let key = raw.trim().to_lowercase();
    match synonyms.lookup(&key) {
        Some(canonical) => Some(canonical.to_string()),
        None => Some(key),
    }
}

pub fn rank(hierarchy: &[String], category: &str) -> Option<usize> {
    hierarchy.iter().position(|entry| entry == category)
}

/// Which side of a comparison wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pick {
    Current,
    Candidate,
}

/// Decides between the value already held for a pair and a new response.
///
/// Equal ranks go to the candidate, so later responses overwrite earlier ones
/// on a tie. Two unranked values keep the current one.
pub fn pick_stronger(current: Option<&str>, candidate: Option<&str>, hierarchy: &[String]) -> Pick {
    let Some(current) = current else {
        return Pick::Candidate;
    };
    let Some(candidate) = candidate else {
        return Pick::Current;
    };
    match (rank(hierarchy, current), rank(hierarchy, candidate)) {
        (None, None) => Pick::Current,
        (None, Some(_)) => Pick::Candidate,
        (Some(_), None) => Pick::Current,
        (Some(cur), Some(cand)) if cur < cand => Pick::Current,
        (Some(_), Some(_)) => Pick::Candidate,
    }
}

pub fn stronger_relation<'a>(
    current: Option<&'a str>,
    candidate: Option<&'a str>,
    hierarchy: &[String],
) -> Option<&'a str> {
    match pick_stronger(current, candidate, hierarchy) {
        Pick::Current => current,
        Pick::Candidate => candidate,
    }
}

/// Sort key approximating a base-sensitivity locale comparison: case and
/// Latin diacritics are ignored.
pub fn collation_key(label: &str) -> String {
    let mut key = String::with_capacity(label.len());
    for c in label.chars().flat_map(char::to_lowercase) {
        match c {
            'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => key.push('a'),
            'æ' => key.push_str("ae"),
            'ç' => key.push('c'),
            'è' | 'é' | 'ê' | 'ë' => key.push('e'),
            'ì' | 'í' | 'î' | 'ï' => key.push('i'),
            'ñ' => key.push('n'),
            'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => key.push('o'),
            'œ' => key.push_str("oe"),
            'ù' | 'ú' | 'û' | 'ü' => key.push('u'),
            'ý' | 'ÿ' => key.push('y'),
            'ß' => key.push_str("ss"),
            other => key.push(other),
        }
    }
    key
}

/// Labels differing only by case or accents compare equal, so a stable sort
/// keeps them in their incoming order.
pub fn compare_labels(a: &str, b: &str) -> Ordering {
    collation_key(a).cmp(&collation_key(b))
}
