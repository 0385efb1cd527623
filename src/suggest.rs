//! "Did you mean" suggestions for titles that matched nothing.

use rustc_hash::FxHashSet;
use strsim::jaro_winkler;

use crate::catalog::Catalog;
use crate::normalize::normalize_text;

/// Minimum Jaro-Winkler similarity for a title to be suggested
pub const SUGGESTION_THRESHOLD: f64 = 0.85;

/// Up to `limit` distinct catalog titles closest to `wanted`, best first.
pub fn suggest_titles(catalog: &Catalog, wanted: &str, limit: usize) -> Vec<String> {
    let wanted = normalize_text(wanted);
    if wanted.is_empty() {
        return Vec::new();
    }

    let mut seen: FxHashSet<&str> = FxHashSet::default();
    let mut scored: Vec<(f64, &str)> = catalog
        .songs
        .iter()
        .map(|s| s.short_name.as_str())
        .filter(|name| !name.is_empty() && seen.insert(*name))
        .map(|name| (jaro_winkler(&wanted, name), name))
        .filter(|(score, _)| *score >= SUGGESTION_THRESHOLD)
        .collect();

    scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    scored
        .into_iter()
        .take(limit)
        .map(|(_, name)| name.to_string())
        .collect()
}
