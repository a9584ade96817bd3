//! File classification shared by the detector, the co-change mapper, the
//! vectorizer, and run statistics.
//!
//! Classification is total and mutually exclusive: every path is exactly one
//! of test, production, or other. It operates on normalized paths so that
//! git history paths and on-disk paths classify identically.

use crate::prioritize::paths::normalize;

/// Mutually exclusive file categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Python test file (pytest/unittest naming conventions)
    Test,
    /// Python source file that is not a test and not an `__init__.py`
    Production,
    /// Everything else (non-Python, package markers, assets)
    Other,
}

/// Classify a path from any subsystem (git history, directory walk, detector
/// output).
pub fn classify(path: &str) -> FileKind {
    let normalized = normalize(path);
    if is_test_path(&normalized) {
        FileKind::Test
    } else if is_production_path(&normalized) {
        FileKind::Production
    } else {
        FileKind::Other
    }
}

/// True for paths following pytest/unittest test naming conventions.
/// Expects an already-normalized (lowercase, `/`-separated) path.
fn is_test_path(normalized: &str) -> bool {
    if !normalized.ends_with(".py") {
        return false;
    }
    let basename = normalized.rsplit('/').next().unwrap_or(normalized);
    basename.starts_with("test")
        || basename.contains("_test.")
        || normalized.contains("/tests/")
        || normalized.starts_with("tests/")
}

fn is_production_path(normalized: &str) -> bool {
    normalized.ends_with(".py") && !normalized.ends_with("__init__.py")
}
