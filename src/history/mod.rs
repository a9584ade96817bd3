//! Commit history mining and per-file metric aggregation.

pub mod cochange;
pub mod metrics;
pub mod miner;

pub use cochange::build_cochange_map;
pub use metrics::aggregate_file_metrics;
pub use miner::{extract_history, is_faulty_message, parse_numstat, FAULT_KEYWORDS};

use serde::Serialize;
use std::collections::BTreeMap;

/// Line additions and deletions for one file in one commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineChanges {
    pub additions: u64,
    pub deletions: u64,
}

impl LineChanges {
    /// Churn: added plus deleted lines.
    pub fn churn(&self) -> u64 {
        self.additions + self.deletions
    }
}

/// One non-merge commit with per-file diff statistics. Built once per mining
/// pass and read-only afterward.
#[derive(Debug, Clone)]
pub struct Commit {
    pub hash: String,
    pub message: String,
    /// Author date, as emitted by git (`%aI`, RFC 3339)
    pub timestamp: String,
    /// Classified from the message by the fault-keyword heuristic
    pub is_faulty: bool,
    /// Sorted for deterministic iteration across runs
    pub files_changed: BTreeMap<String, LineChanges>,
}

/// Cumulative per-file metrics folded from the commit list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetrics {
    pub total_changes: u64,
    pub total_churn: u64,
    pub faulty_changes: u64,
    pub faulty_churn: u64,
}
