//! Fuzzy scoring used by the file and window providers.
//!
//! Tiers: case-insensitive containment scores 1.0, a prefix 0.9, and
//! anything else gets partial credit for the query characters found in order
//! in the target, scaled to at most 0.7. A prefix is always also contained,
//! so in practice the 0.9 tier only documents the ordering.

/// Score `target` against `query` in `[0.0, 1.0]`.
pub fn fuzzy_score(target: &str, query: &str) -> f64 {
    if query.is_empty() {
        return 0.0;
    }

    let target = target.to_lowercase();
    let query = query.to_lowercase();

    if target.contains(&query) {
        return 1.0;
    }
    if target.starts_with(&query) {
        return 0.9;
    }

    let query_len = query.chars().count();
    let mut remaining = target.chars();
    let mut matched = 0usize;

    for qc in query.chars() {
        // A character that cannot be found ends the walk
        if remaining.by_ref().any(|tc| tc == qc) {
            matched += 1;
        } else {
            break;
        }
    }

    if matched == 0 {
        return 0.0;
    }
    (matched as f64 / query_len as f64) * 0.7
}
