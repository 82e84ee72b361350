//! Digests and workspace hashing (`spec.md` §4.1).
//!
//! A digest is the 128-bit MD5 checksum of a file's raw bytes, rendered as
//! lowercase hex — the same choice `original_source/huge` makes
//! (`hashlib.md5`), kept here for on-disk compatibility of the scheme
//! described in `spec.md` §3 ("32-hex-character").

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use md5::{Digest as _, Md5};

use crate::ignore::IgnoreEngine;
use crate::paths::HUGE_DIRECTORY;
use crate::progress::ProgressReporter;
use crate::Result;

/// 1 MiB streaming read buffer, per `spec.md` §4.1.
const READ_BUFFER_SIZE: usize = 1 << 20;

/// Compute the digest of a single file's contents, streaming it through a
/// fixed-size buffer so large files never need to be loaded whole.
pub fn hash_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Md5::new();
    let mut buf = vec![0u8; READ_BUFFER_SIZE];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Walk `root`, excluding the repository's own `.huge` directory and any
/// path the ignore engine matches, hashing every regular file.
///
/// The returned map is keyed by path normalized relative to `root`, using
/// forward slashes (`spec.md` §3 "Commit" invariant on path form). Ordering
/// of entries is irrelevant to callers, per `spec.md` §4.1.
pub fn hash_workspace(
    root: &Path,
    ignore: &IgnoreEngine,
    reporter: &dyn ProgressReporter,
) -> Result<BTreeMap<String, String>> {
    let mut result = BTreeMap::new();
    let mut bytes_hashed = 0u64;
    let mut file_count = 0u64;

    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            let file_type = entry.file_type()?;

            if file_type.is_symlink() {
                // Symbolic links are refused at the path level; callers
                // assert non-symlink (`spec.md` §4.1). Skip rather than
                // hash link targets.
                continue;
            }

            if file_type.is_dir() {
                if path.file_name().map(|n| n == HUGE_DIRECTORY).unwrap_or(false) && path.parent() == Some(root) {
                    continue;
                }
                stack.push(path);
                continue;
            }

            if !file_type.is_file() {
                continue;
            }

            let relative = normalize_relative(root, &path);
            if ignore.is_ignored(&relative) {
                continue;
            }

            let digest = hash_file(&path)?;
            bytes_hashed += std::fs::metadata(&path)?.len();
            file_count += 1;
            reporter.report_hashing(bytes_hashed, file_count);

            result.insert(relative, digest);
        }
    }

    reporter.finish();
    Ok(result)
}

/// Normalize `path` to a forward-slash path relative to `root`.
pub fn normalize_relative(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative.to_string_lossy().replace(std::path::MAIN_SEPARATOR, "/")
}

/// Resolve a relative, forward-slash path back to an absolute `PathBuf`
/// under `root`.
pub fn resolve(root: &Path, relative: &str) -> PathBuf {
    root.join(relative)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ignore::IgnoreEngine;
    use crate::progress::NoopProgress;

    #[test]
    fn hash_file_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, b"Content").unwrap();
        let first = hash_file(&path).unwrap();
        let second = hash_file(&path).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 32);
    }

    #[test]
    fn hash_workspace_excludes_huge_dir_and_ignored_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(".huge")).unwrap();
        std::fs::write(dir.path().join(".huge").join("current"), "").unwrap();
        std::fs::write(dir.path().join("keep.txt"), b"keep").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub").join("second.txt"), b"ignored").unwrap();

        let ignore = IgnoreEngine::from_patterns(vec![".*second.*".to_string()]).unwrap();
        let map = hash_workspace(dir.path(), &ignore, &NoopProgress).unwrap();

        assert_eq!(map.len(), 1);
        assert!(map.contains_key("keep.txt"));
    }
}
