use once_cell::sync::Lazy;
use regex::Regex;

/// Instructional prefix of the survey's "how do you relate to X" columns.
static QUESTION_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Votre relation vis-à-vis de\s*:?").unwrap());
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// One header cell, kept both as exported and as a plain person name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Position in the header row; rows are addressed by it.
    pub index: usize,
    /// Header exactly as read.
    pub raw: String,
    pub cleaned: String,
}

pub fn clean_header<S: AsRef<str>>(header: &[S]) -> Vec<Column> {
    header
        .iter()
        .enumerate()
        .map(|(index, raw)| {
            let raw = raw.as_ref();
            Column {
                index,
                raw: raw.to_string(),
                cleaned: clean_header_cell(raw),
            }
        })
        .collect()
}

pub fn clean_header_cell(raw: &str) -> String {
    if QUESTION_PREFIX_RE.is_match(raw) {
        let stripped = QUESTION_PREFIX_RE.replace(raw, "");
        let flattened: String = stripped
            .chars()
            .filter(|c| *c != '"')
            .map(|c| if matches!(c, '\n' | '\r') { ' ' } else { c })
            .collect();
        return WHITESPACE_RE.replace_all(&flattened, " ").trim().to_string();
    }
    raw.replace('"', "").trim().to_string()
}
