//! Configuration loading for smellrank

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const CONFIG_FILENAME: &str = ".smellrankrc.json";

/// Heuristic thresholds used by the detector. Exposed as named configuration
/// so suites can pin and vary them without touching detection logic.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Thresholds {
    /// General Fixture: setup hooks with more bindings than this are flagged
    pub general_fixture_max_bindings: usize,
    /// Assertion Roulette: more unexplained assertions than this are flagged
    pub assertion_roulette_max_unexplained: usize,
    /// Obscure In-Line Setup: assignments before the first assertion
    pub inline_setup_max_assignments: usize,
    /// Obscure In-Line Setup: capitalized constructor calls before the first
    /// assertion
    pub inline_setup_max_constructor_calls: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            general_fixture_max_bindings: 5,
            assertion_roulette_max_unexplained: 3,
            inline_setup_max_assignments: 3,
            inline_setup_max_constructor_calls: 2,
        }
    }
}

/// History mining options
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HistoryConfig {
    /// Mine git history and compute the prioritization ranking
    pub enabled: bool,
    /// Upper bound on the one-shot `git log` invocation, in seconds
    pub timeout_secs: u64,
    /// Weight for CP when combining CP and FP. Accepted for compatibility
    /// with callers that pass it, but the prioritization score applies the
    /// documented equal-weight mean regardless of this value.
    pub cp_weight: f64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_secs: 60,
            cp_weight: 0.5,
        }
    }
}

/// Top-level configuration, loaded from `.smellrankrc.json` when present.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub thresholds: Thresholds,
    pub history: HistoryConfig,
}

/// Load config from an explicit path, or search `work_dir` and its parents
/// for the default filename. Missing config is not an error: defaults apply.
pub fn load_config(work_dir: &Path, custom_path: Option<&Path>) -> Result<Config> {
    let path = if let Some(p) = custom_path {
        let path = if p.is_absolute() {
            p.to_path_buf()
        } else {
            work_dir.join(p)
        };
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        Some(path)
    } else {
        find_config_in_parents(work_dir)
    };

    match path {
        Some(path) => {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Invalid JSON in config: {}", path.display()))
        }
        None => Ok(Config::default()),
    }
}

fn find_config_in_parents(start: &Path) -> Option<std::path::PathBuf> {
    let mut dir = if start.is_file() { start.parent()? } else { start };
    loop {
        let candidate = dir.join(CONFIG_FILENAME);
        if candidate.exists() {
            return Some(candidate);
        }
        dir = dir.parent()?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_thresholds() {
        let config = Config::default();
        assert_eq!(config.thresholds.general_fixture_max_bindings, 5);
        assert_eq!(config.thresholds.assertion_roulette_max_unexplained, 3);
        assert_eq!(config.thresholds.inline_setup_max_assignments, 3);
        assert_eq!(config.thresholds.inline_setup_max_constructor_calls, 2);
        assert!(config.history.enabled);
        assert_eq!(config.history.cp_weight, 0.5);
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"thresholds": {"generalFixtureMaxBindings": 8}}"#).unwrap();
        assert_eq!(config.thresholds.general_fixture_max_bindings, 8);
        assert_eq!(config.thresholds.assertion_roulette_max_unexplained, 3);
        assert!(config.history.enabled);
    }

    #[test]
    fn load_config_finds_file_in_parent() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        fs::create_dir_all(&nested).unwrap();
        fs::write(
            dir.path().join(CONFIG_FILENAME),
            r#"{"history": {"enabled": false}}"#,
        )
        .unwrap();
        let config = load_config(&nested, None).unwrap();
        assert!(!config.history.enabled);
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config(dir.path(), Some(Path::new("nope.json")));
        assert!(result.is_err());
    }
}
