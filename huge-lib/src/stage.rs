//! The stage: workspace diff and staged set (`spec.md` §4.4).
//!
//! Grounded on `original_source/huge/repo/stage.py`. Two derived views:
//! the workspace diff (new/changed/deleted/unchanged, vs. the active
//! commit) and the staged set (the contents of the stage file).

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::commit_store::CommitStore;
use crate::digest::{hash_workspace, normalize_relative};
use crate::ignore::IgnoreEngine;
use crate::paths::stage_file;
use crate::progress::ProgressReporter;
use crate::repo::current_commit;
use crate::Result;

/// The four-way partition of the workspace relative to the active commit.
#[derive(Debug, Default, Clone)]
pub struct WorkspaceDiff {
    /// Path only in the workspace.
    pub new: BTreeMap<String, String>,
    /// Path in both, digest differs.
    pub changed: BTreeMap<String, String>,
    /// Path only in the active commit.
    pub deleted: BTreeSet<String>,
    /// Path in both, digest identical.
    pub unchanged: BTreeMap<String, String>,
}

impl WorkspaceDiff {
    /// Every path touched by this diff, in any of the four buckets.
    pub fn all_paths(&self) -> BTreeSet<String> {
        let mut result: BTreeSet<String> = BTreeSet::new();
        result.extend(self.new.keys().cloned());
        result.extend(self.changed.keys().cloned());
        result.extend(self.deleted.iter().cloned());
        result.extend(self.unchanged.keys().cloned());
        result
    }

    /// `true` if there is nothing to report: no new, changed, or deleted
    /// paths.
    pub fn is_clean(&self) -> bool {
        self.new.is_empty() && self.changed.is_empty() && self.deleted.is_empty()
    }
}

/// Compare the current workspace against `commit_files` (the active
/// commit's `files` map, or empty if there is none).
pub fn diff_workspace(
    workspace: &BTreeMap<String, String>,
    commit_files: &BTreeMap<String, String>,
) -> WorkspaceDiff {
    let mut diff = WorkspaceDiff::default();
    for (path, digest) in workspace {
        match commit_files.get(path) {
            Some(commit_digest) if commit_digest == digest => {
                diff.unchanged.insert(path.clone(), digest.clone());
            }
            Some(_) => {
                diff.changed.insert(path.clone(), digest.clone());
            }
            None => {
                diff.new.insert(path.clone(), digest.clone());
            }
        }
    }
    for path in commit_files.keys() {
        if !workspace.contains_key(path) {
            diff.deleted.insert(path.clone());
        }
    }
    diff
}

/// Hash the workspace and diff it against the currently active commit (or
/// an explicit commit, if given — used by `checkout` to validate against a
/// target other than the active one).
pub fn workspace_diff(
    root: &Path,
    ignore: &IgnoreEngine,
    commit_store: &CommitStore,
    against: Option<&str>,
    reporter: &dyn ProgressReporter,
) -> Result<WorkspaceDiff> {
    let commit_id = match against {
        Some(id) => Some(id.to_string()),
        None => current_commit(root)?,
    };
    let commit_files = match &commit_id {
        Some(id) => commit_store.read_files(id)?,
        None => BTreeMap::new(),
    };
    let workspace = hash_workspace(root, ignore, reporter)?;
    Ok(diff_workspace(&workspace, &commit_files))
}

/// Read the staged set from disk, normalized.
pub fn staged_paths(root: &Path) -> Result<BTreeSet<String>> {
    let path = stage_file(root);
    if !path.is_file() {
        return Ok(BTreeSet::new());
    }
    let contents = std::fs::read_to_string(path)?;
    Ok(contents
        .lines()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect())
}

fn write_staged_paths(root: &Path, paths: &BTreeSet<String>) -> Result<()> {
    let path = stage_file(root);
    if paths.is_empty() {
        if path.is_file() {
            std::fs::remove_file(path)?;
        }
        return Ok(());
    }
    let contents: String = paths.iter().map(|p| format!("{p}\n")).collect();
    std::fs::write(path, contents)?;
    Ok(())
}

/// Mark `paths` as staged for the next commit. Directory arguments are
/// expanded by walking the filesystem; both direct files and expanded
/// directory entries are filtered through the ignore engine. Deduplicates
/// against the existing stage.
pub fn add(root: &Path, ignore: &IgnoreEngine, paths: &[String]) -> Result<()> {
    let mut to_add: BTreeSet<String> = staged_paths(root)?;

    for raw in paths {
        let path = Path::new(raw);
        let absolute = if path.is_absolute() { path.to_path_buf() } else { root.join(path) };

        if absolute.is_file() {
            let relative = normalize_relative(root, &absolute);
            if !ignore.is_ignored(&relative) {
                to_add.insert(relative);
            }
        } else if absolute.is_dir() {
            expand_directory(root, &absolute, ignore, &mut to_add)?;
        }
        // Paths naming neither a file nor a directory (already-removed
        // files) are intentionally still accepted: staging a deletion is
        // how a removed file gets committed (`spec.md` §4.4).
        else {
            let relative = normalize_relative(root, &absolute);
            if !relative.is_empty() && !ignore.is_ignored(&relative) {
                to_add.insert(relative);
            }
        }
    }

    write_staged_paths(root, &to_add)
}

fn expand_directory(
    root: &Path,
    dir: &Path,
    ignore: &IgnoreEngine,
    into: &mut BTreeSet<String>,
) -> Result<()> {
    let mut stack = vec![dir.to_path_buf()];
    while let Some(current) = stack.pop() {
        for entry in std::fs::read_dir(&current)? {
            let entry = entry?;
            let path = entry.path();
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                stack.push(path);
            } else if file_type.is_file() {
                let relative = normalize_relative(root, &path);
                if !ignore.is_ignored(&relative) {
                    into.insert(relative);
                }
            }
        }
    }
    Ok(())
}

/// Remove `paths` from the stage. `.` clears everything.
pub fn reset(root: &Path, paths: &[String]) -> Result<()> {
    let mut staged = staged_paths(root)?;

    let mut sorted_paths = paths.to_vec();
    sorted_paths.sort();

    for raw in &sorted_paths {
        if raw == "." {
            staged.clear();
            break;
        }
        let normalized = normalize_relative(root, &root.join(raw));
        let prefix = format!("{normalized}/");
        staged.retain(|p| p != &normalized && !p.starts_with(&prefix));
    }

    write_staged_paths(root, &staged)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_classifies_all_four_buckets() {
        let mut workspace = BTreeMap::new();
        workspace.insert("new.txt".to_string(), "aaa".to_string());
        workspace.insert("changed.txt".to_string(), "bbb".to_string());
        workspace.insert("same.txt".to_string(), "ccc".to_string());

        let mut commit = BTreeMap::new();
        commit.insert("changed.txt".to_string(), "old".to_string());
        commit.insert("same.txt".to_string(), "ccc".to_string());
        commit.insert("deleted.txt".to_string(), "ddd".to_string());

        let diff = diff_workspace(&workspace, &commit);
        assert_eq!(diff.new.len(), 1);
        assert_eq!(diff.changed.len(), 1);
        assert_eq!(diff.unchanged.len(), 1);
        assert_eq!(diff.deleted.len(), 1);
    }

    #[test]
    fn add_then_reset_removes_stage_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".huge")).unwrap();
        std::fs::write(dir.path().join("a.txt"), b"a").unwrap();
        let ignore = IgnoreEngine::empty();

        add(dir.path(), &ignore, &["a.txt".to_string()]).unwrap();
        assert!(crate::paths::stage_file(dir.path()).is_file());

        reset(dir.path(), &[".".to_string()]).unwrap();
        assert!(!crate::paths::stage_file(dir.path()).is_file());
    }

    #[test]
    fn directory_of_entirely_ignored_files_contributes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/second.txt"), b"x").unwrap();
        let ignore = IgnoreEngine::from_patterns(vec![".*second.*".to_string()]).unwrap();

        add(dir.path(), &ignore, &["sub".to_string()]).unwrap();
        assert!(!crate::paths::stage_file(dir.path()).is_file());
    }
}
