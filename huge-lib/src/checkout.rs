//! Checkout (`spec.md` §4.6): materialising a commit into the workspace.
//!
//! Grounded on `original_source/huge/repo/commit.py::checkout_commit` and
//! `checkout_files`.

use std::collections::BTreeSet;
use std::path::Path;

use crate::commit_store::CommitStore;
use crate::content_store::ContentStore;
use crate::ignore::IgnoreEngine;
use crate::progress::ProgressReporter;
use crate::repo::{current_commit, set_current_commit};
use crate::stage::workspace_diff;
use crate::{Error, Result};

/// Switch the active commit to `commit_id`, refusing if the workspace has
/// any change outside the target's file set.
pub fn checkout_commit(
    root: &Path,
    ignore: &IgnoreEngine,
    commit_id: &str,
    reporter: &dyn ProgressReporter,
) -> Result<()> {
    let commit_store = CommitStore::open(root);
    let content_store = ContentStore::open(root);
    let target = commit_store.read(commit_id)?;

    // Diff the workspace against the *active* commit: any changed or
    // deleted entry means there is uncommitted work that checkout would
    // clobber, regardless of what the target commit happens to contain.
    let diff = workspace_diff(root, ignore, &commit_store, None, reporter)?;
    if !diff.changed.is_empty() || !diff.deleted.is_empty() {
        return Err(Error::WorkspaceDirty);
    }

    for digest in target.files.values() {
        if !content_store.contains(digest) {
            return Err(Error::MissingBlobs { commit_id: commit_id.to_string() });
        }
    }

    let prior_commit_id = current_commit(root)?;
    let prior_files = match &prior_commit_id {
        Some(id) => commit_store.read_files(id)?,
        None => Default::default(),
    };

    let to_remove: BTreeSet<&String> = prior_files.keys().filter(|p| !target.files.contains_key(*p)).collect();
    for path in &to_remove {
        let absolute = root.join(path);
        if absolute.is_file() {
            std::fs::remove_file(&absolute)?;
        }
    }
    for path in &to_remove {
        remove_empty_ancestors(root, Path::new(path));
    }

    for (path, digest) in &target.files {
        let absolute = root.join(path);
        if let Some(parent) = absolute.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(content_store.path_for(digest), &absolute)?;
    }

    set_current_commit(root, commit_id)?;
    Ok(())
}

/// Overlay specific files from `commit_id` onto the workspace, without
/// moving the current-commit pointer. Fails if any named path isn't in the
/// target commit.
pub fn checkout_files(root: &Path, commit_id: &str, paths: &[String]) -> Result<()> {
    let commit_store = CommitStore::open(root);
    let content_store = ContentStore::open(root);
    let target = commit_store.read(commit_id)?;

    let not_found: Vec<String> = paths.iter().filter(|p| !target.files.contains_key(p.as_str())).cloned().collect();
    if !not_found.is_empty() {
        return Err(Error::FilesNotInCommit { commit_id: commit_id.to_string(), paths: not_found });
    }

    for path in paths {
        let digest = &target.files[path];
        let absolute = root.join(path);
        if let Some(parent) = absolute.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(content_store.path_for(digest), &absolute)?;
    }
    Ok(())
}

/// Remove now-empty directories on the way up from a removed file's path,
/// stopping at the repository root or the first non-empty ancestor.
fn remove_empty_ancestors(root: &Path, relative_path: &Path) {
    let mut current = relative_path.parent();
    while let Some(dir) = current {
        if dir.as_os_str().is_empty() {
            break;
        }
        let absolute = root.join(dir);
        if absolute.is_dir() {
            match std::fs::read_dir(&absolute) {
                Ok(mut entries) if entries.next().is_none() => {
                    let _ = std::fs::remove_dir(&absolute);
                }
                _ => break,
            }
        }
        current = dir.parent();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::commit;
    use crate::progress::NoopProgress;
    use crate::stage::add;

    #[test]
    fn checkout_restores_previous_content_and_refuses_when_dirty() {
        let dir = tempfile::tempdir().unwrap();
        crate::repo::create_repository(dir.path()).unwrap();
        let ignore = IgnoreEngine::empty();

        std::fs::create_dir_all(dir.path().join("folder")).unwrap();
        std::fs::write(dir.path().join("folder/first_file.txt"), b"Content").unwrap();
        add(dir.path(), &ignore, &["folder".to_string()]).unwrap();
        let first = commit(dir.path(), &ignore, None, &NoopProgress).unwrap();

        std::fs::write(dir.path().join("folder/first_file.txt"), b"ContentChanged").unwrap();
        add(dir.path(), &ignore, &["folder".to_string()]).unwrap();
        let _second = commit(dir.path(), &ignore, Some("change"), &NoopProgress).unwrap();

        checkout_commit(dir.path(), &ignore, &first, &NoopProgress).unwrap();
        assert_eq!(std::fs::read_to_string(dir.path().join("folder/first_file.txt")).unwrap(), "Content");

        std::fs::write(dir.path().join("folder/first_file.txt"), b"dirty").unwrap();
        let err = checkout_commit(dir.path(), &ignore, &_second, &NoopProgress).unwrap_err();
        assert!(matches!(err, Error::WorkspaceDirty));
    }
}
