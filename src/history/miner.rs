//! Commit history miner.
//!
//! Retrieves the linear non-merge commit log with per-file numstat in a
//! single `git log` invocation (one history scan per run, not one per
//! commit) and classifies each commit as fault-fixing from its message.

use super::{Commit, LineChanges};
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Recall-biased keyword heuristic for fault-fixing commits; intentionally
/// over-inclusive.
pub const FAULT_KEYWORDS: &[&str] = &[
    "bug", "fix", "error", "defect", "issue", "fault", "crash", "patch", "repair", "correct",
    "resolve",
];

/// Field separator for the commit header line. Unit separator is about as
/// unlikely to appear in a subject line as anything.
const HEADER_SEP: char = '\u{1f}';

/// Pure classification of a commit message (case-insensitive substring).
pub fn is_faulty_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    FAULT_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Extract the full non-merge commit history of the repository at `root`.
///
/// A missing repository or empty log is a reported, non-fatal condition:
/// the result is an empty list, which downstream stages accept as "no
/// usable history". Only a spawn failure or timeout is an error.
pub fn extract_history(root: &Path, timeout: Duration) -> Result<Vec<Commit>> {
    if !is_git_repository(root, timeout) {
        return Ok(Vec::new());
    }

    let format = format!("--format=%H{HEADER_SEP}%s{HEADER_SEP}%aI");
    let output = run_with_timeout(
        Command::new("git")
            .args(["log", "--numstat", "--no-merges"])
            .arg(&format)
            .current_dir(root),
        timeout,
    )
    .context("Failed to run git log")?;

    match output {
        Some(stdout) => Ok(parse_numstat(&stdout)),
        // git log fails on a repository with zero commits; same as no history
        None => Ok(Vec::new()),
    }
}

fn is_git_repository(root: &Path, timeout: Duration) -> bool {
    matches!(
        run_with_timeout(
            Command::new("git")
                .args(["rev-parse", "--git-dir"])
                .current_dir(root),
            timeout,
        ),
        Ok(Some(_))
    )
}

/// Run a command, killing it if it exceeds `timeout`. Returns `Ok(None)` on
/// non-zero exit status.
fn run_with_timeout(command: &mut Command, timeout: Duration) -> Result<Option<String>> {
    let mut child = command
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .stdin(Stdio::null())
        .spawn()
        .context("Failed to spawn git")?;

    // Drain stdout on a helper thread so a large log cannot fill the pipe
    // and deadlock the wait loop.
    let mut stdout = child.stdout.take().context("Missing child stdout")?;
    let reader = std::thread::spawn(move || {
        use std::io::Read;
        let mut buf = String::new();
        let _ = stdout.read_to_string(&mut buf);
        buf
    });

    let deadline = Instant::now() + timeout;
    let status = loop {
        if let Some(status) = child.try_wait().context("Failed to wait for git")? {
            break status;
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            anyhow::bail!("git invocation exceeded {}s timeout", timeout.as_secs());
        }
        std::thread::sleep(Duration::from_millis(20));
    };

    let stdout = reader.join().unwrap_or_default();
    if status.success() {
        Ok(Some(stdout))
    } else {
        Ok(None)
    }
}

/// Parse `git log --numstat --format=%H<US>%s<US>%aI` output. Pure function,
/// tested against captured log text.
pub fn parse_numstat(log: &str) -> Vec<Commit> {
    let mut commits = Vec::new();
    let mut current: Option<Commit> = None;

    for line in log.lines() {
        if let Some((hash, message, timestamp)) = split_header(line) {
            if let Some(done) = current.take() {
                commits.push(done);
            }
            current = Some(Commit {
                hash: hash.to_string(),
                message: message.to_string(),
                timestamp: timestamp.to_string(),
                is_faulty: is_faulty_message(message),
                files_changed: BTreeMap::new(),
            });
        } else if let Some(commit) = current.as_mut() {
            if let Some((path, changes)) = split_numstat(line) {
                commit.files_changed.insert(path.to_string(), changes);
            }
        }
    }
    if let Some(done) = current.take() {
        commits.push(done);
    }
    commits
}

fn split_header(line: &str) -> Option<(&str, &str, &str)> {
    let mut parts = line.splitn(3, HEADER_SEP);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(hash), Some(message), Some(timestamp)) => Some((hash, message, timestamp)),
        _ => None,
    }
}

/// Numstat line: `<additions>\t<deletions>\t<path>`. Binary diffs carry `-`
/// for both counts and contribute zero churn.
fn split_numstat(line: &str) -> Option<(&str, LineChanges)> {
    let mut parts = line.splitn(3, '\t');
    let additions = parts.next()?;
    let deletions = parts.next()?;
    let path = parts.next()?;
    if path.is_empty() {
        return None;
    }
    Some((
        path,
        LineChanges {
            additions: additions.parse().unwrap_or(0),
            deletions: deletions.parse().unwrap_or(0),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fault_keywords_case_insensitive() {
        assert!(is_faulty_message("Fix crash on empty input"));
        assert!(is_faulty_message("HOTFIX: resolve login issue"));
        assert!(is_faulty_message("Repair the build"));
        assert!(!is_faulty_message("Add pagination to user list"));
        assert!(!is_faulty_message("Refactor settings module"));
    }

    #[test]
    fn keyword_matches_inside_words() {
        // Substring matching is deliberately recall-biased.
        assert!(is_faulty_message("prefixes and suffixes"));
        assert!(is_faulty_message("Correctly handle unicode"));
    }

    fn sample_log() -> String {
        let sep = '\u{1f}';
        format!(
            "abc123{sep}Fix crash in parser{sep}2024-05-01T10:00:00+00:00\n\
             10\t2\tsrc/app/parser.py\n\
             3\t1\ttests/test_parser.py\n\
             \n\
             def456{sep}Add export feature{sep}2024-05-02T10:00:00+00:00\n\
             20\t0\tsrc/app/export.py\n\
             -\t-\tassets/logo.png\n"
        )
    }

    #[test]
    fn parses_commits_and_numstat() {
        let commits = parse_numstat(&sample_log());
        assert_eq!(commits.len(), 2);

        let first = &commits[0];
        assert_eq!(first.hash, "abc123");
        assert!(first.is_faulty);
        assert_eq!(first.files_changed.len(), 2);
        let parser = &first.files_changed["src/app/parser.py"];
        assert_eq!(parser.additions, 10);
        assert_eq!(parser.deletions, 2);
        assert_eq!(parser.churn(), 12);

        let second = &commits[1];
        assert!(!second.is_faulty);
        assert_eq!(second.files_changed["assets/logo.png"].churn(), 0);
    }

    #[test]
    fn empty_log_yields_no_commits() {
        assert!(parse_numstat("").is_empty());
        assert!(parse_numstat("\n\n").is_empty());
    }

    #[test]
    fn numstat_lines_without_header_are_ignored() {
        let commits = parse_numstat("5\t3\torphan.py\n");
        assert!(commits.is_empty());
    }

    #[test]
    fn missing_repository_is_empty_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let commits = extract_history(dir.path(), Duration::from_secs(5)).unwrap();
        assert!(commits.is_empty());
    }
}
