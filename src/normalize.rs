//! Text normalization shared by the filename parser and the resolver.
//!
//! Titles typed into a setlist and titles read off disk must compare equal after
//! going through the same function, so both sides call `normalize_text`.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Separator between filename segments: "Song - Trumpet 2".
pub const SEGMENT_DELIMITER: &str = " - ";

/// "maj" anywhere in a key label: "Bbmaj", "C Maj".
static MAJOR_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\s*maj(?:or)?").unwrap());

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

fn normalize_punctuation(s: &str) -> String {
    s.replace(['\u{2018}', '\u{2019}'], "'")
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace(['\u{00B4}', '\u{0060}'], "'")
}

/// Compose, fold quotes, collapse whitespace, trim and lower-case.
pub fn normalize_text(s: &str) -> String {
    let composed: String = s.nfc().collect();
    let folded = normalize_punctuation(&composed);
    WHITESPACE_RUN
        .replace_all(folded.trim(), " ")
        .to_lowercase()
}

/// Title-case a key label and strip any "maj" marker.
///
/// Returns `None` for labels that are empty once stripped, so an absent key is
/// never stored as an empty string.
pub fn normalize_key(raw: &str) -> Option<String> {
    let stripped = MAJOR_SUFFIX.replace_all(raw.trim(), "");
    let stripped = stripped.trim();
    let mut chars = stripped.chars();
    let first = chars.next()?;
    let mut key: String = first.to_uppercase().collect();
    key.push_str(&chars.as_str().to_lowercase());
    Some(key)
}

/// Split a name on " - " and trim each segment.
pub fn split_segments(s: &str) -> Vec<&str> {
    s.split(SEGMENT_DELIMITER).map(str::trim).collect()
}

/// Strip a case-insensitive extension, returning `None` when it is missing.
pub fn strip_extension<'a>(file_name: &'a str, extension: &str) -> Option<&'a str> {
    let split_at = file_name.len().checked_sub(extension.len())?;
    if !file_name.is_char_boundary(split_at) {
        return None;
    }
    let (stem, ext) = file_name.split_at(split_at);
    ext.eq_ignore_ascii_case(extension).then_some(stem)
}
