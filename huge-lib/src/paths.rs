//! File and directory path constants within a repository.
//!
//! Grounded on `original_source/huge/repo/paths.py`: the repository's own
//! state never lives anywhere but under a single hidden top-level
//! directory, so every other module resolves paths through here rather
//! than hard-coding fragments of this layout.

use std::path::{Path, PathBuf};

/// The special directory where huge's data is stored.
pub const HUGE_DIRECTORY: &str = ".huge";

/// Textfile containing regular expressions that exclude paths from hashing and staging.
pub const IGNORE_FILE: &str = ".hugeignore";

/// Default contents written for a freshly initialized ignore file.
pub const DEFAULT_IGNORE_CONTENTS: &str = "\
# Files that should be ignored.
# Use regular expressions.
# Examples:
#   \\.dat$   <-- Ignore any paths that end with \".dat\"
#   my_folder/ignore_this_file.txt$
#   .*/ignore.txt$  <-- Ignore all paths ending with \"/ignore.txt\"
#   top/.*  <-- Ignore top-level \"top\" folder
";

/// Repository root, the `.huge` directory joined onto a workspace root.
pub fn huge_dir(root: &Path) -> PathBuf {
    root.join(HUGE_DIRECTORY)
}

/// Path to the ignore file (lives at the workspace root, next to `.huge`).
pub fn ignore_file(root: &Path) -> PathBuf {
    root.join(IGNORE_FILE)
}

/// The file holding the empty string or the identifier of the active commit.
pub fn current_commit_file(root: &Path) -> PathBuf {
    huge_dir(root).join("current")
}

/// Directory whose entries are commit directories keyed by commit id.
pub fn commits_dir(root: &Path) -> PathBuf {
    huge_dir(root).join("commits")
}

/// The directory for a single commit.
pub fn commit_dir(root: &Path, commit_id: &str) -> PathBuf {
    commits_dir(root).join(commit_id)
}

/// Where all blobs are stored, keyed by digest.
pub fn storage_dir(root: &Path) -> PathBuf {
    huge_dir(root).join("storage")
}

/// Path to a single blob.
pub fn blob_path(root: &Path, digest: &str) -> PathBuf {
    storage_dir(root).join(digest)
}

/// The repository identity file.
pub fn repo_id_file(root: &Path) -> PathBuf {
    huge_dir(root).join("id")
}

/// Directory whose entries are peer directories keyed by remote id.
pub fn remotes_dir(root: &Path) -> PathBuf {
    huge_dir(root).join("remotes")
}

/// Directory for a single peer entry.
pub fn remote_dir(root: &Path, remote_id: &str) -> PathBuf {
    remotes_dir(root).join(remote_id)
}

/// File holding a newline-separated list of staged paths.
pub fn stage_file(root: &Path) -> PathBuf {
    huge_dir(root).join("stage")
}

/// Returns `true` if `root/.huge` looks like a complete repository skeleton.
pub fn is_repository(root: &Path) -> bool {
    commits_dir(root).is_dir() && storage_dir(root).is_dir() && repo_id_file(root).is_file()
}
