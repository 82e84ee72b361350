//! Drop (`spec.md` §4.8): free blobs once replication makes it safe.
//!
//! Grounded on `original_source/huge/repo/drop.py`, whose
//! `get_removable_commits`/`get_removable_files` this mirrors; unlike the
//! original (which never implements the actual deletion, only the
//! eligibility math — `drop_commit_files` there just raises
//! `NotImplementedError`), `spec.md` §4.8 requires drop to actually free
//! the blobs, so `drop_commits` here carries that out too.

use std::collections::BTreeSet;
use std::path::Path;

use crate::commit_store::CommitStore;
use crate::content_store::ContentStore;
use crate::coverage::analyze_commit_coverage;
use crate::{Error, Result};

/// The coverage floor a commit must clear before `drop` will touch it
/// without `--force`: total coverage must exceed local coverage by at
/// least this much (`spec.md` §4.8).
pub const DROP_COVERAGE_THRESHOLD: f64 = 2.0;

/// Delete blobs referenced only by `commit_ids`, provided each has enough
/// coverage elsewhere. Commit directories themselves are never removed.
pub fn drop_commits(root: &Path, commit_ids: &[String], force: bool) -> Result<BTreeSet<String>> {
    if !force {
        for commit_id in commit_ids {
            let analysis = analyze_commit_coverage(root, commit_id)?;
            let coverage = analysis.coverage();
            if coverage < DROP_COVERAGE_THRESHOLD {
                return Err(Error::DropBlocked { commit_id: commit_id.clone(), coverage });
            }
        }
    }

    let removable = removable_digests(root, commit_ids)?;

    let content_store = ContentStore::open(root);
    for digest in &removable {
        content_store.remove(digest)?;
    }
    Ok(removable)
}

/// The set of digests referenced only by `commit_ids` and by no other
/// commit — the blobs `drop` may physically delete.
fn removable_digests(root: &Path, commit_ids: &[String]) -> Result<BTreeSet<String>> {
    let commit_store = CommitStore::open(root);
    let target: BTreeSet<String> = commit_ids.iter().cloned().collect();

    let mut to_drop: BTreeSet<String> = BTreeSet::new();
    let mut retained: BTreeSet<String> = BTreeSet::new();

    for id in commit_store.list_ids()? {
        let digests: BTreeSet<String> = commit_store.read_files(&id)?.into_values().collect();
        if target.contains(&id) {
            to_drop.extend(digests);
        } else {
            retained.extend(digests);
        }
    }

    Ok(to_drop.difference(&retained).cloned().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ignore::IgnoreEngine;
    use crate::pipeline::commit;
    use crate::progress::NoopProgress;
    use crate::stage::add;

    #[test]
    fn removable_digests_excludes_ones_shared_with_a_retained_commit() {
        let dir = tempfile::tempdir().unwrap();
        crate::repo::create_repository(dir.path()).unwrap();
        let ignore = IgnoreEngine::empty();

        std::fs::write(dir.path().join("shared.txt"), b"Shared").unwrap();
        std::fs::write(dir.path().join("only_first.txt"), b"First").unwrap();
        add(dir.path(), &ignore, &["shared.txt".to_string(), "only_first.txt".to_string()]).unwrap();
        let first = commit(dir.path(), &ignore, None, &NoopProgress).unwrap();

        std::fs::remove_file(dir.path().join("only_first.txt")).unwrap();
        add(dir.path(), &ignore, &["only_first.txt".to_string()]).unwrap();
        let second = commit(dir.path(), &ignore, None, &NoopProgress).unwrap();

        let removable = removable_digests(dir.path(), &[first.clone()]).unwrap();
        let store = CommitStore::open(dir.path());
        let first_digests: BTreeSet<String> = store.read_files(&first).unwrap().into_values().collect();
        let second_digests: BTreeSet<String> = store.read_files(&second).unwrap().into_values().collect();

        // "shared.txt"'s digest is referenced by both commits, so it must
        // not be removable even though we're dropping `first`.
        for digest in first_digests.intersection(&second_digests) {
            assert!(!removable.contains(digest));
        }
        // "only_first.txt"'s digest is referenced only by `first`.
        assert!(!removable.is_empty());
    }

    #[test]
    fn drop_without_force_refuses_below_threshold_coverage() {
        let dir = tempfile::tempdir().unwrap();
        crate::repo::create_repository(dir.path()).unwrap();
        let ignore = IgnoreEngine::empty();

        std::fs::write(dir.path().join("a.txt"), b"A").unwrap();
        add(dir.path(), &ignore, &["a.txt".to_string()]).unwrap();
        let first = commit(dir.path(), &ignore, None, &NoopProgress).unwrap();

        // No peers, so coverage is exactly 1.0 (us alone) — below the 2.0
        // threshold `drop` requires without --force.
        let err = drop_commits(dir.path(), &[first], false).unwrap_err();
        assert!(matches!(err, Error::DropBlocked { .. }));
    }
}
