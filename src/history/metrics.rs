//! File metric aggregation: folds the commit list into per-file cumulative
//! metrics. Pure function of the commit list; no I/O.

use super::{Commit, FileMetrics};
use std::collections::BTreeMap;

/// One entry per file ever touched in history, including files no longer
/// present on disk. Each file touch counts one change and that commit's
/// churn for the file; fault-fixing commits additionally count toward the
/// faulty metrics.
pub fn aggregate_file_metrics(commits: &[Commit]) -> BTreeMap<String, FileMetrics> {
    let mut metrics: BTreeMap<String, FileMetrics> = BTreeMap::new();
    for commit in commits {
        for (path, changes) in &commit.files_changed {
            let entry = metrics.entry(path.clone()).or_default();
            entry.total_changes += 1;
            entry.total_churn += changes.churn();
            if commit.is_faulty {
                entry.faulty_changes += 1;
                entry.faulty_churn += changes.churn();
            }
        }
    }
    metrics
}
