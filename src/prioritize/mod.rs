//! History-based smell prioritization.
//!
//! Joins the detector output with mined git history: builds per-smell-type
//! presence vectors over the test-file population, correlates them against
//! the four combined change/fault signals, and ranks smell types by the
//! resulting prioritization score. Degenerate conditions (no history, no
//! smells, unusable denominators) are structured results, never errors.

pub mod paths;
pub mod spearman;
pub mod vectors;

use crate::classify::{classify, FileKind};
use crate::config::Config;
use crate::detector::Detection;
use crate::history::{self, Commit};
use crate::SmellType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

pub use vectors::CombinedVector;

/// Two-sided p-value threshold for flagging a correlation as significant.
pub const SIGNIFICANCE_LEVEL: f64 = 0.05;

/// Outcome category for one prioritization run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HistoryStatus {
    /// Ranking computed
    Ok,
    /// No version-control metadata or zero commits
    NoHistory,
    /// Valid history but zero smell instances to prioritize
    NoSmells,
    /// History exists but one population side saw no changes, so the
    /// normalization denominators are zero
    UnusableHistory,
}

/// Correlation of one presence vector against one combined signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalCorrelation {
    /// Spearman coefficient, rounded to 4 decimals
    pub rho: f64,
    /// Two-sided p-value, rounded to 4 decimals
    pub p_value: f64,
    pub significant: bool,
}

/// Per-smell-type prioritization record. Re-derived each run, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrioritizationResult {
    #[serde(rename = "type")]
    pub smell_type: SmellType,
    pub name: String,
    /// Stable cross-system key, e.g. `AR`
    pub abbreviation: String,
    pub chg_freq: SignalCorrelation,
    pub chg_ext: SignalCorrelation,
    pub fault_freq: SignalCorrelation,
    pub fault_ext: SignalCorrelation,
    /// Change-Proneness: rho(presence, chg_freq) + rho(presence, chg_ext)
    pub cp_score: f64,
    /// Fault-Proneness: rho(presence, fault_freq) + rho(presence, fault_ext)
    pub fp_score: f64,
    /// (CP + FP) / 2
    pub prioritization_score: f64,
    pub instance_count: usize,
    pub affected_file_count: usize,
    /// 1-based, assigned after the descending sort on prioritization score
    pub rank: usize,
}

/// Run-level history statistics.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStatistics {
    pub total_commits: usize,
    pub faulty_commits: usize,
    /// Percentage of commits classified fault-fixing, rounded to 2 decimals
    pub fault_percentage: f64,
    /// Distinct files ever touched in history
    pub total_files: usize,
    pub test_files: usize,
    pub production_files: usize,
}

/// Result of the history pipeline for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryAnalysis {
    pub status: HistoryStatus,
    /// Explanation for every non-Ok status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Ranked per-smell-type records; empty for non-Ok statuses
    pub metrics: Vec<PrioritizationResult>,
    pub statistics: RunStatistics,
}

impl HistoryAnalysis {
    fn degenerate(status: HistoryStatus, note: String, statistics: RunStatistics) -> Self {
        Self {
            status,
            note: Some(note),
            metrics: Vec::new(),
            statistics,
        }
    }
}

/// Mine history for the repository at `root` and rank the detected smell
/// types. Mining failures degrade to a no-history result so the caller's
/// smell report survives.
pub fn prioritize(root: &Path, detection: &Detection, config: &Config) -> HistoryAnalysis {
    let timeout = Duration::from_secs(config.history.timeout_secs);
    let commits = match history::extract_history(root, timeout) {
        Ok(commits) => commits,
        Err(error) => {
            return HistoryAnalysis::degenerate(
                HistoryStatus::NoHistory,
                format!("History mining failed: {error:#}"),
                RunStatistics::default(),
            );
        }
    };
    rank_smell_types(&commits, detection)
}

/// Pure ranking over an already-mined commit list.
pub fn rank_smell_types(commits: &[Commit], detection: &Detection) -> HistoryAnalysis {
    let statistics = run_statistics(commits);

    if commits.is_empty() {
        return HistoryAnalysis::degenerate(
            HistoryStatus::NoHistory,
            "No version-control history available; smell detection results are unaffected"
                .to_string(),
            statistics,
        );
    }

    let instances = detection.all_instances();
    if instances.is_empty() {
        return HistoryAnalysis::degenerate(
            HistoryStatus::NoSmells,
            "No test smells detected; nothing to prioritize".to_string(),
            statistics,
        );
    }

    let metrics = history::aggregate_file_metrics(commits);
    let totals = vectors::side_totals(&metrics);
    if !totals.usable() {
        return HistoryAnalysis::degenerate(
            HistoryStatus::UnusableHistory,
            "History has no production-side or no test-side changes; metrics cannot be normalized"
                .to_string(),
            statistics,
        );
    }

    let cochange = history::build_cochange_map(commits);
    let population = test_population(&instances, commits);

    // One combined vector per population file, in population order.
    let combined: Vec<CombinedVector> = population
        .iter()
        .map(|file| vectors::combined_vector(file, &metrics, &cochange, totals))
        .collect();
    let chg_freq: Vec<f64> = combined.iter().map(|v| v.chg_freq).collect();
    let chg_ext: Vec<f64> = combined.iter().map(|v| v.chg_ext).collect();
    let fault_freq: Vec<f64> = combined.iter().map(|v| v.fault_freq).collect();
    let fault_ext: Vec<f64> = combined.iter().map(|v| v.fault_ext).collect();

    // Smell files per type, keeping first-encountered type order for the
    // tie-break policy.
    let mut type_order: Vec<SmellType> = Vec::new();
    let mut files_by_type: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    let mut counts_by_type: BTreeMap<&str, usize> = BTreeMap::new();
    for instance in &instances {
        if !type_order.contains(&instance.smell_type) {
            type_order.push(instance.smell_type);
        }
        let key = instance.smell_type.abbreviation();
        let files = files_by_type.entry(key).or_default();
        if !files.iter().any(|f| paths::paths_match(f, &instance.file)) {
            files.push(instance.file.as_str());
        }
        *counts_by_type.entry(key).or_default() += 1;
    }

    let mut results: Vec<PrioritizationResult> = type_order
        .iter()
        .map(|&smell_type| {
            let key = smell_type.abbreviation();
            let smell_files = &files_by_type[key];
            let presence: Vec<f64> = population
                .iter()
                .map(|file| {
                    let hit = smell_files.iter().any(|s| paths::paths_match(s, file));
                    if hit {
                        1.0
                    } else {
                        0.0
                    }
                })
                .collect();

            let cf = correlate(&presence, &chg_freq);
            let ce = correlate(&presence, &chg_ext);
            let ff = correlate(&presence, &fault_freq);
            let fe = correlate(&presence, &fault_ext);

            let cp_score = round4(cf.rho + ce.rho);
            let fp_score = round4(ff.rho + fe.rho);
            let prioritization_score = round4((cp_score + fp_score) / 2.0);

            PrioritizationResult {
                smell_type,
                name: smell_type.name().to_string(),
                abbreviation: key.to_string(),
                chg_freq: cf,
                chg_ext: ce,
                fault_freq: ff,
                fault_ext: fe,
                cp_score,
                fp_score,
                prioritization_score,
                instance_count: counts_by_type[key],
                affected_file_count: smell_files.len(),
                rank: 0,
            }
        })
        .collect();

    // Stable sort keeps first-encountered order on score ties.
    results.sort_by(|a, b| {
        b.prioritization_score
            .partial_cmp(&a.prioritization_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    for (index, result) in results.iter_mut().enumerate() {
        result.rank = index + 1;
    }

    HistoryAnalysis {
        status: HistoryStatus::Ok,
        note: None,
        metrics: results,
        statistics,
    }
}

fn correlate(presence: &[f64], signal: &[f64]) -> SignalCorrelation {
    let (rho, p) = spearman::spearman(presence, signal);
    SignalCorrelation {
        rho: round4(rho),
        p_value: round4(p),
        significant: p < SIGNIFICANCE_LEVEL,
    }
}

/// Ordered test-file population: files carrying at least one smell instance
/// (detection order) followed by files classified as tests anywhere in
/// history (commit order), deduplicated through the tolerant matcher.
/// Smelly files with no commits keep zero-valued vectors rather than being
/// dropped.
fn test_population(instances: &[crate::SmellInstance], commits: &[Commit]) -> Vec<String> {
    let mut population: Vec<String> = Vec::new();
    let push_unique = |population: &mut Vec<String>, path: &str| {
        if !population.iter().any(|p| paths::paths_match(p, path)) {
            population.push(path.to_string());
        }
    };

    for instance in instances {
        push_unique(&mut population, &instance.file);
    }
    for commit in commits {
        for path in commit.files_changed.keys() {
            if classify(path) == FileKind::Test {
                push_unique(&mut population, path);
            }
        }
    }
    population
}

fn run_statistics(commits: &[Commit]) -> RunStatistics {
    let faulty_commits = commits.iter().filter(|c| c.is_faulty).count();
    let fault_percentage = if commits.is_empty() {
        0.0
    } else {
        round2(100.0 * faulty_commits as f64 / commits.len() as f64)
    };

    let mut test_files = 0;
    let mut production_files = 0;
    let mut seen: std::collections::BTreeSet<&str> = std::collections::BTreeSet::new();
    for commit in commits {
        for path in commit.files_changed.keys() {
            if seen.insert(path.as_str()) {
                match classify(path) {
                    FileKind::Test => test_files += 1,
                    FileKind::Production => production_files += 1,
                    FileKind::Other => {}
                }
            }
        }
    }

    RunStatistics {
        total_commits: commits.len(),
        faulty_commits,
        fault_percentage,
        total_files: seen.len(),
        test_files,
        production_files,
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::LineChanges;
    use crate::{FileSmells, SmellInstance};

    fn instance(smell_type: SmellType, file: &str) -> SmellInstance {
        SmellInstance {
            smell_type,
            file: file.to_string(),
            line: 1,
            message: String::new(),
        }
    }

    fn detection(instances: Vec<SmellInstance>) -> Detection {
        let mut files: Vec<FileSmells> = Vec::new();
        for instance in instances {
            match files.iter_mut().find(|f| f.file == instance.file) {
                Some(file) => {
                    file.smells.push(instance);
                    file.smell_count += 1;
                }
                None => files.push(FileSmells {
                    file: instance.file.clone(),
                    smells: vec![instance],
                    smell_count: 1,
                }),
            }
        }
        Detection {
            total_files: files.len(),
            files,
            skipped: Vec::new(),
        }
    }

    fn commit(hash: &str, faulty: bool, files: &[(&str, u64, u64)]) -> Commit {
        Commit {
            hash: hash.to_string(),
            message: String::new(),
            timestamp: "2024-01-01T00:00:00+00:00".to_string(),
            is_faulty: faulty,
            files_changed: files
                .iter()
                .map(|(path, additions, deletions)| {
                    (
                        path.to_string(),
                        LineChanges {
                            additions: *additions,
                            deletions: *deletions,
                        },
                    )
                })
                .collect(),
        }
    }

    fn busy_history() -> Vec<Commit> {
        vec![
            commit(
                "a",
                true,
                &[("src/app.py", 10, 2), ("tests/test_app.py", 4, 1)],
            ),
            commit("b", false, &[("src/app.py", 3, 3)]),
            commit(
                "c",
                false,
                &[("src/util.py", 5, 0), ("tests/test_util.py", 2, 0)],
            ),
            commit("d", true, &[("src/export.py", 7, 7), ("tests/test_export.py", 1, 1)]),
        ]
    }

    fn busy_detection() -> Detection {
        detection(vec![
            instance(SmellType::AssertionRoulette, "tests/test_app.py"),
            instance(SmellType::AssertionRoulette, "tests/test_export.py"),
            instance(SmellType::SleepyTest, "tests/test_util.py"),
            instance(SmellType::EmptyTest, "tests/test_never_committed.py"),
        ])
    }

    #[test]
    fn empty_history_reports_no_history() {
        let analysis = rank_smell_types(&[], &busy_detection());
        assert_eq!(analysis.status, HistoryStatus::NoHistory);
        assert!(analysis.metrics.is_empty());
        assert!(analysis.note.as_deref().unwrap().contains("history"));
        assert_eq!(analysis.statistics.total_commits, 0);
    }

    #[test]
    fn no_smells_is_distinct_from_no_history() {
        let analysis = rank_smell_types(&busy_history(), &detection(Vec::new()));
        assert_eq!(analysis.status, HistoryStatus::NoSmells);
        assert!(analysis.metrics.is_empty());
        assert!(analysis.note.is_some());
        assert_eq!(analysis.statistics.total_commits, 4);
    }

    #[test]
    fn one_sided_history_is_unusable() {
        let commits = vec![commit("a", false, &[("src/app.py", 1, 1)])];
        let analysis = rank_smell_types(&commits, &busy_detection());
        assert_eq!(analysis.status, HistoryStatus::UnusableHistory);
        assert!(analysis.metrics.is_empty());
        assert!(analysis.note.is_some());
    }

    #[test]
    fn ranking_covers_all_detected_types() {
        let analysis = rank_smell_types(&busy_history(), &busy_detection());
        assert_eq!(analysis.status, HistoryStatus::Ok);
        assert_eq!(analysis.metrics.len(), 3);

        let ranks: Vec<usize> = analysis.metrics.iter().map(|m| m.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
        for window in analysis.metrics.windows(2) {
            assert!(window[0].prioritization_score >= window[1].prioritization_score);
        }
    }

    #[test]
    fn scores_obey_the_mean_formula() {
        let analysis = rank_smell_types(&busy_history(), &busy_detection());
        for metric in &analysis.metrics {
            let mean = round4((metric.cp_score + metric.fp_score) / 2.0);
            assert_eq!(metric.prioritization_score, mean);
            assert!((-2.0..=2.0).contains(&metric.cp_score));
            assert!((-2.0..=2.0).contains(&metric.fp_score));
        }
    }

    #[test]
    fn reruns_are_idempotent() {
        let first = rank_smell_types(&busy_history(), &busy_detection());
        let second = rank_smell_types(&busy_history(), &busy_detection());
        let summary = |analysis: &HistoryAnalysis| {
            analysis
                .metrics
                .iter()
                .map(|m| (m.abbreviation.clone(), m.rank, m.prioritization_score))
                .collect::<Vec<_>>()
        };
        assert_eq!(summary(&first), summary(&second));
    }

    #[test]
    fn ties_keep_first_encountered_type_order() {
        // Two smell types on the same single file produce identical presence
        // vectors, hence identical scores.
        let detection = detection(vec![
            instance(SmellType::SleepyTest, "tests/test_app.py"),
            instance(SmellType::RedundantPrint, "tests/test_app.py"),
        ]);
        let analysis = rank_smell_types(&busy_history(), &detection);
        assert_eq!(analysis.metrics[0].abbreviation, "ST");
        assert_eq!(analysis.metrics[1].abbreviation, "RP");
        assert_eq!(
            analysis.metrics[0].prioritization_score,
            analysis.metrics[1].prioritization_score
        );
    }

    #[test]
    fn instance_and_file_counts_are_reported() {
        let analysis = rank_smell_types(&busy_history(), &busy_detection());
        let roulette = analysis
            .metrics
            .iter()
            .find(|m| m.abbreviation == "AR")
            .unwrap();
        assert_eq!(roulette.instance_count, 2);
        assert_eq!(roulette.affected_file_count, 2);
    }

    #[test]
    fn statistics_summarize_the_commit_list() {
        let statistics = run_statistics(&busy_history());
        assert_eq!(statistics.total_commits, 4);
        assert_eq!(statistics.faulty_commits, 2);
        assert_eq!(statistics.fault_percentage, 50.0);
        assert_eq!(statistics.total_files, 6);
        assert_eq!(statistics.test_files, 3);
        assert_eq!(statistics.production_files, 3);
    }

    #[test]
    fn smelly_files_without_commits_stay_in_the_population() {
        let population = test_population(
            &busy_detection().all_instances(),
            &busy_history(),
        );
        assert!(population
            .iter()
            .any(|p| p.contains("test_never_committed")));
        // Detector-first ordering
        assert_eq!(population[0], "tests/test_app.py");
    }
}
