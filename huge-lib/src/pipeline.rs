//! The commit pipeline (`spec.md` §4.5): assembling a new commit from the
//! stage plus inherited unchanged entries.
//!
//! Grounded on `original_source/huge/repo/commit.py::create_commit`.

use std::collections::BTreeMap;

use chrono::Utc;

use crate::commit_store::{format_files, CommitStore};
use crate::content_store::ContentStore;
use crate::digest::hash_workspace;
use crate::ignore::IgnoreEngine;
use crate::paths::stage_file;
use crate::progress::ProgressReporter;
use crate::repo::{current_commit, set_current_commit};
use crate::stage::staged_paths;
use crate::Result;
use std::path::Path;

/// Create a new commit from the current stage and workspace.
///
/// Follows the step order in `spec.md` §4.5 exactly: hash workspace, load
/// prior commit's files, read stage, copy staged blobs, allocate a commit
/// directory, write `files` as the union of staged-and-present entries and
/// inherited-untouched entries, write `parents`/`timestamp`/`message`,
/// flip the current-commit pointer, then truncate the stage. If interrupted
/// before the pointer flip, the new commit directory is an orphan — this is
/// acceptable because nothing references it yet, and a second `commit`
/// invocation with nothing further staged simply recomputes the same
/// `files` union (the idempotency property verified in `spec.md` §8).
pub fn commit(
    root: &Path,
    ignore: &IgnoreEngine,
    message: Option<&str>,
    reporter: &dyn ProgressReporter,
) -> Result<String> {
    let commit_store = CommitStore::open(root);
    let content_store = ContentStore::open(root);

    let prior_commit_id = current_commit(root)?;
    let prior_files: BTreeMap<String, String> = match &prior_commit_id {
        Some(id) => commit_store.read_files(id)?,
        None => BTreeMap::new(),
    };

    let workspace = hash_workspace(root, ignore, reporter)?;
    let staged = staged_paths(root)?;

    // Copy every workspace blob whose path is staged into the content
    // store, skipping already-present digests (`ContentStore::insert` is
    // itself idempotent).
    for (path, digest) in &workspace {
        if staged.contains(path) {
            let absolute = root.join(path);
            content_store.insert(&absolute, digest)?;
        }
    }

    let mut files = BTreeMap::new();
    for (path, digest) in &workspace {
        if staged.contains(path) {
            files.insert(path.clone(), digest.clone());
        }
    }
    for (path, digest) in &prior_files {
        if !staged.contains(path) {
            files.insert(path.clone(), digest.clone());
        }
    }

    let commit_id = commit_store.create_dir()?;
    let dir = commit_store.dir(&commit_id);

    std::fs::write(dir.join("files"), format_files(&files))?;

    let parents_contents = match &prior_commit_id {
        Some(id) => format!("{id}\n"),
        None => String::new(),
    };
    std::fs::write(dir.join("parents"), parents_contents)?;

    std::fs::write(dir.join("timestamp"), Utc::now().to_rfc3339())?;

    if let Some(message) = message {
        if !message.trim().is_empty() {
            std::fs::write(dir.join("message"), message)?;
        }
    }

    set_current_commit(root, &commit_id)?;

    let stage = stage_file(root);
    if stage.is_file() {
        std::fs::remove_file(stage)?;
    }

    Ok(commit_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoopProgress;
    use crate::stage::add;

    fn init(dir: &Path) {
        crate::repo::create_repository(dir).unwrap();
    }

    #[test]
    fn commit_is_idempotent_against_a_clean_stage() {
        let dir = tempfile::tempdir().unwrap();
        init(dir.path());
        std::fs::write(dir.path().join("a.txt"), b"Content").unwrap();
        let ignore = IgnoreEngine::empty();
        add(dir.path(), &ignore, &["a.txt".to_string()]).unwrap();
        let first = commit(dir.path(), &ignore, None, &NoopProgress).unwrap();

        // Nothing staged, nothing changed in the workspace.
        let second = commit(dir.path(), &ignore, None, &NoopProgress).unwrap();

        let store = CommitStore::open(dir.path());
        assert_ne!(first, second);
        assert_eq!(store.read_files(&first).unwrap(), store.read_files(&second).unwrap());
    }

    #[test]
    fn staged_but_absent_paths_are_deleted_by_omission() {
        let dir = tempfile::tempdir().unwrap();
        init(dir.path());
        std::fs::write(dir.path().join("a.txt"), b"Content").unwrap();
        let ignore = IgnoreEngine::empty();
        add(dir.path(), &ignore, &["a.txt".to_string()]).unwrap();
        commit(dir.path(), &ignore, None, &NoopProgress).unwrap();

        std::fs::remove_file(dir.path().join("a.txt")).unwrap();
        add(dir.path(), &ignore, &["a.txt".to_string()]).unwrap();
        let second = commit(dir.path(), &ignore, None, &NoopProgress).unwrap();

        let store = CommitStore::open(dir.path());
        assert!(store.read_files(&second).unwrap().is_empty());
    }
}
