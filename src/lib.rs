//! Smellrank: test smell detection and history-based prioritization for
//! Python test suites.
//!
//! The library runs two independent pipelines over a project checkout and
//! joins them at the ranking stage:
//!
//! 1. A structural smell detector parses each test file with tree-sitter and
//!    emits typed [`SmellInstance`]s for 15 well-known test smells.
//! 2. A history correlator mines the git log, builds per-file change/fault
//!    metrics and test-to-production co-change associations, and ranks smell
//!    types by how strongly their presence correlates with change and fault
//!    proneness.

pub mod classify;
pub mod config;
pub mod detector;
pub mod history;
pub mod parser;
pub mod prioritize;
pub mod reporter;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use prioritize::{HistoryAnalysis, HistoryStatus, PrioritizationResult, RunStatistics};

/// The 15 test smell categories the detector recognizes.
///
/// Each category carries a stable short code (e.g. `AR` for Assertion
/// Roulette) used as a cross-system key by downstream consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SmellType {
    /// Test class uses `__init__` instead of a setup hook
    ConstructorInitialization,
    /// Setup hook initializes more objects than any single test needs
    GeneralFixture,
    /// Test class exposing exactly one test method
    TestMaverick,
    /// Test methods share no common instance attributes
    LackOfCohesion,
    /// Test body is empty, pass-only, or docstring-only
    EmptyTest,
    /// Multiple assertions without explanatory messages
    AssertionRoulette,
    /// Assertion that always passes (literal true or tautology)
    RedundantAssertion,
    /// Assertion comparing against a boolean literal
    SuboptimalAssert,
    /// Textually identical assertion repeated in one test
    DuplicateAssert,
    /// Unexplained numeric literal used as an assertion comparator
    MagicNumberTest,
    /// Heavy inline setup before the first assertion
    ObscureInlineSetup,
    /// Conditional or loop construct inside a test body
    ConditionalTestLogic,
    /// Generic or bare try/except in a test body
    ExceptionHandling,
    /// Sleep call inside a test body
    SleepyTest,
    /// Print call inside a test body
    RedundantPrint,
}

impl SmellType {
    /// Canonical human-readable name, matching the research literature.
    pub fn name(&self) -> &'static str {
        match self {
            SmellType::ConstructorInitialization => "Constructor Initialization",
            SmellType::GeneralFixture => "General Fixture",
            SmellType::TestMaverick => "Test Maverick",
            SmellType::LackOfCohesion => "Lack of Cohesion of Test Cases",
            SmellType::EmptyTest => "Empty Test",
            SmellType::AssertionRoulette => "Assertion Roulette",
            SmellType::RedundantAssertion => "Redundant Assertion",
            SmellType::SuboptimalAssert => "Suboptimal Assert",
            SmellType::DuplicateAssert => "Duplicate Assert",
            SmellType::MagicNumberTest => "Magic Number Test",
            SmellType::ObscureInlineSetup => "Obscure In-Line Setup",
            SmellType::ConditionalTestLogic => "Conditional Test Logic",
            SmellType::ExceptionHandling => "Exception Handling",
            SmellType::SleepyTest => "Sleepy Test",
            SmellType::RedundantPrint => "Redundant Print",
        }
    }

    /// Stable abbreviation used as a cross-system key (survey consumers join
    /// on this).
    pub fn abbreviation(&self) -> &'static str {
        match self {
            SmellType::ConstructorInitialization => "CI",
            SmellType::GeneralFixture => "GF",
            SmellType::TestMaverick => "TM",
            SmellType::LackOfCohesion => "LCTC",
            SmellType::EmptyTest => "ET",
            SmellType::AssertionRoulette => "AR",
            SmellType::RedundantAssertion => "RA",
            SmellType::SuboptimalAssert => "SA",
            SmellType::DuplicateAssert => "DA",
            SmellType::MagicNumberTest => "MNT",
            SmellType::ObscureInlineSetup => "OS",
            SmellType::ConditionalTestLogic => "CTL",
            SmellType::ExceptionHandling => "EH",
            SmellType::SleepyTest => "ST",
            SmellType::RedundantPrint => "RP",
        }
    }
}

impl std::fmt::Display for SmellType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A single detected smell occurrence. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmellInstance {
    /// Smell category
    #[serde(rename = "type")]
    pub smell_type: SmellType,
    /// Path of the test file, relative to the project root
    pub file: String,
    /// Line number (1-indexed)
    pub line: usize,
    /// Human-readable diagnostic
    pub message: String,
}

/// Per-file grouping of detected smells
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSmells {
    /// Path relative to the project root
    pub file: String,
    /// Smells found in this file, in detection order
    pub smells: Vec<SmellInstance>,
    /// Convenience count
    pub smell_count: usize,
}

/// A test file that could not be analyzed (parse failure, unreadable)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedFile {
    pub file: String,
    pub reason: String,
}

/// The full result of one analysis run over a project checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectReport {
    /// Analyzed project root
    pub project_root: PathBuf,
    /// RFC 3339 timestamp of the run
    #[serde(default)]
    pub generated_at: String,
    /// Number of test files matched by the selection pattern (including
    /// files that failed to parse)
    pub total_files: usize,
    /// Total smell instances across all files
    pub total_smells: usize,
    /// Per-file detection results
    pub files: Vec<FileSmells>,
    /// Files skipped with a diagnostic
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedFile>,
    /// History-based prioritization (None when disabled)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<HistoryAnalysis>,
}

impl ProjectReport {
    /// Flatten the per-file groupings into one instance list, in detection
    /// order. This is the atomic unit handed to the correlator.
    pub fn all_instances(&self) -> Vec<SmellInstance> {
        self.files.iter().flat_map(|f| f.smells.clone()).collect()
    }
}

/// Analyze a whole project: detect smells in every test file under `root`,
/// then (unless disabled in `config`) mine git history and compute the
/// prioritization ranking.
pub fn analyze_project(root: &Path, config: &config::Config) -> anyhow::Result<ProjectReport> {
    let detection = detector::detect_project(root, config)?;

    let history = if config.history.enabled {
        Some(prioritize::prioritize(root, &detection, config))
    } else {
        None
    };

    Ok(ProjectReport {
        project_root: root.to_path_buf(),
        generated_at: chrono::Utc::now().to_rfc3339(),
        total_files: detection.total_files,
        total_smells: detection.total_smells(),
        files: detection.files,
        skipped: detection.skipped,
        history,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abbreviations_are_unique() {
        let all = [
            SmellType::ConstructorInitialization,
            SmellType::GeneralFixture,
            SmellType::TestMaverick,
            SmellType::LackOfCohesion,
            SmellType::EmptyTest,
            SmellType::AssertionRoulette,
            SmellType::RedundantAssertion,
            SmellType::SuboptimalAssert,
            SmellType::DuplicateAssert,
            SmellType::MagicNumberTest,
            SmellType::ObscureInlineSetup,
            SmellType::ConditionalTestLogic,
            SmellType::ExceptionHandling,
            SmellType::SleepyTest,
            SmellType::RedundantPrint,
        ];
        let mut codes: Vec<&str> = all.iter().map(|s| s.abbreviation()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), all.len());
    }

    #[test]
    fn smell_type_serializes_kebab_case() {
        let json = serde_json::to_string(&SmellType::AssertionRoulette).unwrap();
        assert_eq!(json, "\"assertion-roulette\"");
    }
}
