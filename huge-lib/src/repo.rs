//! Repository identity, creation, and the current-commit pointer
//! (`spec.md` §3 "Repository", §9 "Global state").
//!
//! Grounded on `original_source/huge/repo/__init__.py`. Operations take an
//! explicit repository root rather than relying on the process working
//! directory; only `find_repository_root` walks upward from a starting
//! point, the one "entry-point concession" `spec.md` §9 permits.

use std::path::{Path, PathBuf};

use crate::commit_store::generate_commit_id;
use crate::paths::{
    commits_dir, current_commit_file, huge_dir, ignore_file, is_repository as paths_is_repository, remotes_dir,
    repo_id_file, storage_dir, DEFAULT_IGNORE_CONTENTS,
};
use crate::{Error, Result};

/// Returns `true` if `root` is the root of an initialized repository.
pub fn is_repository(root: &Path) -> bool {
    paths_is_repository(root)
}

/// Walk upward from `start` looking for a `.huge` directory, returning the
/// first ancestor (inclusive of `start`) that is a repository root.
pub fn find_repository_root(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start.to_path_buf());
    while let Some(dir) = current {
        if is_repository(&dir) {
            return Some(dir);
        }
        current = dir.parent().map(Path::to_path_buf);
    }
    None
}

/// Create the on-disk skeleton (`commits/`, `storage/`, `remotes/`) under
/// `root`, without the identity file, current-commit pointer, or ignore
/// file. Used both by `init` and as the first step of `clone`/`send`,
/// which populate identity differently.
pub fn create_repository_structure(root: &Path) -> Result<()> {
    if huge_dir(root).exists() {
        return Err(Error::AlreadyInitialized { path: root.to_path_buf() });
    }
    std::fs::create_dir_all(huge_dir(root))?;
    std::fs::create_dir_all(commits_dir(root))?;
    std::fs::create_dir_all(storage_dir(root))?;
    std::fs::create_dir_all(remotes_dir(root))?;
    Ok(())
}

/// Fully initialize a new, empty repository at `root`: skeleton directories,
/// an empty current-commit pointer, a fresh identity, and a default ignore
/// file (`spec.md` §6 `init`).
pub fn create_repository(root: &Path) -> Result<()> {
    create_repository_structure(root)?;
    std::fs::write(current_commit_file(root), "")?;
    std::fs::write(repo_id_file(root), generate_commit_id())?;
    std::fs::write(ignore_file(root), DEFAULT_IGNORE_CONTENTS)?;
    Ok(())
}

/// Read the repository's identity token.
pub fn read_identity(root: &Path) -> Result<String> {
    Ok(std::fs::read_to_string(repo_id_file(root))?.trim().to_string())
}

/// Read the current-commit pointer. `None` means no active commit.
pub fn current_commit(root: &Path) -> Result<Option<String>> {
    let contents = std::fs::read_to_string(current_commit_file(root))?;
    let trimmed = contents.trim();
    if trimmed.is_empty() {
        Ok(None)
    } else {
        Ok(Some(trimmed.to_string()))
    }
}

/// Overwrite the current-commit pointer.
pub fn set_current_commit(root: &Path, commit_id: &str) -> Result<()> {
    std::fs::write(current_commit_file(root), commit_id)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_repository_then_find_it_from_subdirectory() {
        let dir = tempfile::tempdir().unwrap();
        create_repository(dir.path()).unwrap();
        assert!(is_repository(dir.path()));
        assert_eq!(read_identity(dir.path()).unwrap().len(), 32);
        assert_eq!(current_commit(dir.path()).unwrap(), None);

        let sub = dir.path().join("a/b/c");
        std::fs::create_dir_all(&sub).unwrap();
        assert_eq!(find_repository_root(&sub), Some(dir.path().to_path_buf()));
    }

    #[test]
    fn double_init_fails() {
        let dir = tempfile::tempdir().unwrap();
        create_repository(dir.path()).unwrap();
        assert!(create_repository(dir.path()).is_err());
    }
}
