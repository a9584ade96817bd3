//! Tolerant path reconciliation.
//!
//! Detector output, git history, and directory listings may use different
//! relative roots or separators. A match succeeds when normalized paths are
//! equal, when one is a component-boundary suffix of the other, or when both
//! basenames are equal and both sides classify as test files. Total and
//! deterministic: never raises, same inputs always give the same answer.

use crate::classify::{classify, FileKind};

/// Normalize: lowercase, unify separators, strip leading `./` and
/// leading/trailing slashes.
pub fn normalize(path: &str) -> String {
    let mut normalized = path.replace('\\', "/").to_lowercase();
    while let Some(rest) = normalized.strip_prefix("./") {
        normalized = rest.to_string();
    }
    normalized.trim_matches('/').to_string()
}

/// Tolerant equality between paths from different subsystems.
pub fn paths_match(a: &str, b: &str) -> bool {
    let a = normalize(a);
    let b = normalize(b);
    if a.is_empty() || b.is_empty() {
        return false;
    }
    if a == b || is_component_suffix(&a, &b) || is_component_suffix(&b, &a) {
        return true;
    }
    basename(&a) == basename(&b)
        && classify(&a) == FileKind::Test
        && classify(&b) == FileKind::Test
}

/// `shorter` is a suffix of `longer` at a path component boundary
/// (`b/c.py` matches `a/b/c.py`, not `xb/c.py`).
fn is_component_suffix(longer: &str, shorter: &str) -> bool {
    longer.len() > shorter.len()
        && longer.ends_with(shorter)
        && longer.as_bytes()[longer.len() - shorter.len() - 1] == b'/'
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// First key in `keys` that tolerantly matches `path`, if any. Callers pass
/// ordered (sorted) key collections so the lookup is deterministic.
pub fn find_match<'a, I>(path: &str, keys: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    keys.into_iter().find(|k| paths_match(path, k))
}
