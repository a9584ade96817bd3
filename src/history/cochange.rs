//! Test-to-production co-change mapping.
//!
//! For every test file, collects the set of production files committed
//! together with it across history. The association set is the proxy for
//! "what this test exercises" in the absence of an explicit test-to-subject
//! mapping.

use super::Commit;
use crate::classify::{classify, FileKind};
use std::collections::{BTreeMap, BTreeSet};

/// Build the co-change map from the commit list. Keys and values are git
/// history paths; lookups from other subsystems go through the tolerant
/// path matcher.
pub fn build_cochange_map(commits: &[Commit]) -> BTreeMap<String, BTreeSet<String>> {
    let mut map: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for commit in commits {
        let mut test_files = Vec::new();
        let mut production_files = Vec::new();
        for path in commit.files_changed.keys() {
            match classify(path) {
                FileKind::Test => test_files.push(path),
                FileKind::Production => production_files.push(path),
                FileKind::Other => {}
            }
        }
        // A commit touching only one side of the split contributes nothing.
        if test_files.is_empty() || production_files.is_empty() {
            continue;
        }
        for test in &test_files {
            map.entry((*test).clone())
                .or_default()
                .extend(production_files.iter().map(|p| (*p).clone()));
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::LineChanges;

    fn commit(files: &[&str]) -> Commit {
        Commit {
            hash: "h".to_string(),
            message: String::new(),
            timestamp: "2024-01-01T00:00:00+00:00".to_string(),
            is_faulty: false,
            files_changed: files
                .iter()
                .map(|f| (f.to_string(), LineChanges::default()))
                .collect(),
        }
    }

    #[test]
    fn associates_tests_with_co_committed_production() {
        let commits = vec![
            commit(&["tests/test_login.py", "src/auth/login.py", "src/auth/session.py"]),
            commit(&["tests/test_login.py", "src/auth/login.py"]),
            commit(&["tests/test_export.py", "src/export.py"]),
        ];
        let map = build_cochange_map(&commits);

        let login = &map["tests/test_login.py"];
        assert_eq!(login.len(), 2);
        assert!(login.contains("src/auth/login.py"));
        assert!(login.contains("src/auth/session.py"));
        assert_eq!(map["tests/test_export.py"].len(), 1);
    }

    #[test]
    fn one_sided_commits_contribute_nothing() {
        let commits = vec![
            commit(&["tests/test_a.py", "tests/test_b.py"]),
            commit(&["src/app.py", "src/util.py"]),
            commit(&["README.md"]),
        ];
        assert!(build_cochange_map(&commits).is_empty());
    }

    #[test]
    fn non_source_files_are_ignored() {
        let commits = vec![commit(&["tests/test_a.py", "docs/guide.md", "src/app.py"])];
        let map = build_cochange_map(&commits);
        assert_eq!(map["tests/test_a.py"].len(), 1);
    }
}
