//! Metric vectorizer: per-test-file combined change/fault signals.
//!
//! Each signal is a production-side ratio plus a test-side ratio. The
//! production side sums metrics over the test file's co-changed production
//! set; the test side is the file's own metrics. Both sides are normalized
//! by their population-wide change-count totals, computed once per run.

use super::paths::find_match;
use crate::classify::{classify, FileKind};
use crate::history::FileMetrics;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// The four combined signals for one test file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedVector {
    pub chg_freq: f64,
    pub chg_ext: f64,
    pub fault_freq: f64,
    pub fault_ext: f64,
}

/// Population-wide normalization denominators, one per side of the
/// test/production split.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SideTotals {
    pub production_changes: u64,
    pub test_changes: u64,
}

impl SideTotals {
    /// Ratios are only meaningful when both sides saw at least one change.
    pub fn usable(&self) -> bool {
        self.production_changes > 0 && self.test_changes > 0
    }
}

/// Sum total_changes across all production-classified and all
/// test-classified files in history. Computed once per run.
pub fn side_totals(metrics: &BTreeMap<String, FileMetrics>) -> SideTotals {
    let mut totals = SideTotals::default();
    for (path, file_metrics) in metrics {
        match classify(path) {
            FileKind::Production => totals.production_changes += file_metrics.total_changes,
            FileKind::Test => totals.test_changes += file_metrics.total_changes,
            FileKind::Other => {}
        }
    }
    totals
}

/// Combined signals for one test file.
///
/// `test_file` may come from the detector or from history; both sides are
/// resolved through the tolerant path matcher. A file with no history on
/// either side gets a zero vector, not an error.
///
/// Callers must check [`SideTotals::usable`] first; with a zero denominator
/// the ratios are undefined and this function is never reached.
pub fn combined_vector(
    test_file: &str,
    metrics: &BTreeMap<String, FileMetrics>,
    cochange: &BTreeMap<String, BTreeSet<String>>,
    totals: SideTotals,
) -> CombinedVector {
    let production_sum = cochanged_production_sum(test_file, metrics, cochange);
    let test_own = find_match(test_file, metrics.keys().map(String::as_str))
        .and_then(|key| metrics.get(key).copied())
        .unwrap_or_default();

    let production_total = totals.production_changes as f64;
    let test_total = totals.test_changes as f64;

    let signal = |production: u64, test: u64| {
        production as f64 / production_total + test as f64 / test_total
    };

    CombinedVector {
        chg_freq: signal(production_sum.total_changes, test_own.total_changes),
        chg_ext: signal(production_sum.total_churn, test_own.total_churn),
        fault_freq: signal(production_sum.faulty_changes, test_own.faulty_changes),
        fault_ext: signal(production_sum.faulty_churn, test_own.faulty_churn),
    }
}

/// Metrics summed over the test file's co-changed production footprint.
fn cochanged_production_sum(
    test_file: &str,
    metrics: &BTreeMap<String, FileMetrics>,
    cochange: &BTreeMap<String, BTreeSet<String>>,
) -> FileMetrics {
    let mut sum = FileMetrics::default();
    let Some(key) = find_match(test_file, cochange.keys().map(String::as_str)) else {
        return sum;
    };
    for production_path in &cochange[key] {
        // Co-change sets and metrics share the git path namespace; a direct
        // lookup suffices, with a tolerant fallback for safety.
        let file_metrics = metrics
            .get(production_path)
            .copied()
            .or_else(|| {
                find_match(production_path, metrics.keys().map(String::as_str))
                    .and_then(|k| metrics.get(k).copied())
            })
            .unwrap_or_default();
        sum.total_changes += file_metrics.total_changes;
        sum.total_churn += file_metrics.total_churn;
        sum.faulty_changes += file_metrics.faulty_changes;
        sum.faulty_churn += file_metrics.faulty_churn;
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics_fixture() -> BTreeMap<String, FileMetrics> {
        let mut metrics = BTreeMap::new();
        metrics.insert(
            "src/app.py".to_string(),
            FileMetrics {
                total_changes: 3,
                total_churn: 30,
                faulty_changes: 1,
                faulty_churn: 12,
            },
        );
        metrics.insert(
            "src/util.py".to_string(),
            FileMetrics {
                total_changes: 1,
                total_churn: 5,
                faulty_changes: 0,
                faulty_churn: 0,
            },
        );
        metrics.insert(
            "tests/test_app.py".to_string(),
            FileMetrics {
                total_changes: 2,
                total_churn: 8,
                faulty_changes: 1,
                faulty_churn: 4,
            },
        );
        metrics
    }

    #[test]
    fn totals_split_by_classification() {
        let totals = side_totals(&metrics_fixture());
        assert_eq!(totals.production_changes, 4);
        assert_eq!(totals.test_changes, 2);
        assert!(totals.usable());
    }

    #[test]
    fn totals_unusable_without_one_side() {
        let mut metrics = metrics_fixture();
        metrics.remove("tests/test_app.py");
        assert!(!side_totals(&metrics).usable());
    }

    #[test]
    fn combined_vector_sums_both_sides() {
        let metrics = metrics_fixture();
        let totals = side_totals(&metrics);
        let mut cochange = BTreeMap::new();
        cochange.insert(
            "tests/test_app.py".to_string(),
            BTreeSet::from(["src/app.py".to_string()]),
        );

        let v = combined_vector("tests/test_app.py", &metrics, &cochange, totals);
        // Production side: app.py over production total (4 changes).
        // Test side: own metrics over test total (2 changes).
        assert!((v.chg_freq - (3.0 / 4.0 + 2.0 / 2.0)).abs() < 1e-12);
        assert!((v.chg_ext - (30.0 / 4.0 + 8.0 / 2.0)).abs() < 1e-12);
        assert!((v.fault_freq - (1.0 / 4.0 + 1.0 / 2.0)).abs() < 1e-12);
        assert!((v.fault_ext - (12.0 / 4.0 + 4.0 / 2.0)).abs() < 1e-12);
    }

    #[test]
    fn detector_path_resolves_through_tolerant_matching() {
        let metrics = metrics_fixture();
        let totals = side_totals(&metrics);
        let mut cochange = BTreeMap::new();
        cochange.insert(
            "tests/test_app.py".to_string(),
            BTreeSet::from(["src/app.py".to_string()]),
        );

        // Detector emits a different root prefix than git history uses.
        let direct = combined_vector("tests/test_app.py", &metrics, &cochange, totals);
        let prefixed = combined_vector("checkout/tests/test_app.py", &metrics, &cochange, totals);
        assert_eq!(direct, prefixed);
    }

    #[test]
    fn unknown_file_gets_zero_vector() {
        let metrics = metrics_fixture();
        let totals = side_totals(&metrics);
        let v = combined_vector("tests/test_brand_new.py", &metrics, &BTreeMap::new(), totals);
        assert_eq!(v, CombinedVector::default());
    }
}
