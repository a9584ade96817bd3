//! Structural smell detector.
//!
//! Walks the syntax tree of each test file and runs a fixed battery of
//! pattern checks. Each check is a pure function from a tree node to zero or
//! more [`SmellInstance`]s, executed in a fixed order; there is no dynamic
//! dispatch over smell categories. Detection is independent of history and
//! the two pipelines only join at the ranking stage.

pub mod class_checks;
pub mod function_checks;

use crate::config::{Config, Thresholds};
use crate::parser::{descendants, node_text, PythonParser};
use crate::{FileSmells, SkippedFile, SmellInstance};
use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use rayon::prelude::*;
use std::fs;
use std::path::Path;
use tree_sitter::Node;

/// Shared read-only inputs for every check.
pub struct CheckContext<'a> {
    /// Path relative to the project root
    pub file: &'a str,
    /// Original source text (line-indexed lookups and node text)
    pub source: &'a str,
    pub thresholds: &'a Thresholds,
}

/// Method names treated as dedicated setup hooks rather than tests.
pub const SETUP_HOOKS: &[&str] = &["setUp", "setup", "setup_method", "setUpClass"];

/// Test functions and methods are identified by name prefix.
pub fn is_test_name(name: &str) -> bool {
    name.starts_with("test")
}

/// Result of detecting over a whole project tree.
#[derive(Debug)]
pub struct Detection {
    /// Files matched by the selection pattern, including unparseable ones
    pub total_files: usize,
    pub files: Vec<FileSmells>,
    pub skipped: Vec<SkippedFile>,
}

impl Detection {
    pub fn total_smells(&self) -> usize {
        self.files.iter().map(|f| f.smells.len()).sum()
    }

    /// Flat instance list in detection order.
    pub fn all_instances(&self) -> Vec<SmellInstance> {
        self.files.iter().flat_map(|f| f.smells.clone()).collect()
    }
}

fn test_file_globs() -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in ["**/test_*.py", "**/*_test.py"] {
        // Patterns are literals; building them cannot fail.
        if let Ok(glob) = Glob::new(pattern) {
            builder.add(glob);
        }
    }
    builder.build().unwrap_or_else(|_| GlobSet::empty())
}

/// Detect smells in every test file under `root`. Individual parse failures
/// are absorbed into `skipped`; only I/O errors on the root itself are fatal.
pub fn detect_project(root: &Path, config: &Config) -> Result<Detection> {
    let globs = test_file_globs();

    let mut test_files: Vec<String> = Vec::new();
    for entry in walkdir::WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.file_name() != ".git")
    {
        let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .replace('\\', "/");
        if globs.is_match(&rel) {
            test_files.push(rel);
        }
    }

    let total_files = test_files.len();

    // Per-file detection is pure over (path, source, thresholds), so files
    // can be analyzed in parallel. Order is restored by collecting into the
    // same order as the sorted walk.
    let outcomes: Vec<(String, std::result::Result<Vec<SmellInstance>, String>)> = test_files
        .par_iter()
        .map(|rel| {
            let outcome = match fs::read_to_string(root.join(rel)) {
                Ok(source) => detect_source(rel, &source, &config.thresholds)
                    .map_err(|e| format!("{e:#}")),
                Err(e) => Err(format!("unreadable: {e}")),
            };
            (rel.clone(), outcome)
        })
        .collect();

    let mut files = Vec::new();
    let mut skipped = Vec::new();
    for (rel, outcome) in outcomes {
        match outcome {
            Ok(smells) => {
                let smell_count = smells.len();
                files.push(FileSmells {
                    file: rel,
                    smells,
                    smell_count,
                });
            }
            Err(reason) => skipped.push(SkippedFile { file: rel, reason }),
        }
    }

    Ok(Detection {
        total_files,
        files,
        skipped,
    })
}

/// Detect smells in a single file's source. `file` is the path recorded on
/// each emitted instance.
pub fn detect_source(
    file: &str,
    source: &str,
    thresholds: &Thresholds,
) -> Result<Vec<SmellInstance>> {
    let mut parser = PythonParser::new()?;
    let tree = parser.parse(source)?;
    let root = tree.root_node();
    if root.has_error() {
        anyhow::bail!("syntax error in {file}");
    }

    let ctx = CheckContext {
        file,
        source,
        thresholds,
    };

    let mut smells = Vec::new();
    for node in descendants(root) {
        match node.kind() {
            "class_definition" => smells.extend(class_checks::analyze_class(node, &ctx)),
            "function_definition" => {
                if function_name(node, source).is_some_and(is_test_name) {
                    smells.extend(function_checks::analyze_function(node, &ctx));
                }
            }
            _ => {}
        }
    }
    Ok(smells)
}

/// Name of a function or class definition node.
pub fn function_name<'a>(definition: Node<'_>, source: &'a str) -> Option<&'a str> {
    definition
        .child_by_field_name("name")
        .map(|n| node_text(n, source))
}
