//! The content-addressed blob directory (`spec.md` §4.3).
//!
//! No naming collisions are possible by construction: a blob's filename
//! *is* its digest. `insert` is crash-safe — it copies to a temporary file
//! on the same device (inside `storage/`) and renames into place, so a
//! partially-written file never appears under its final digest name.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::paths::{blob_path, storage_dir};
use crate::Result;

/// A handle onto a repository's blob directory.
pub struct ContentStore {
    root: PathBuf,
}

impl ContentStore {
    /// Open the content store rooted at the repository `root`.
    pub fn open(root: &Path) -> Self {
        Self { root: root.to_path_buf() }
    }

    /// Returns `true` if a blob with this digest already exists.
    pub fn contains(&self, digest: &str) -> bool {
        blob_path(&self.root, digest).is_file()
    }

    /// Copy the file at `source_path` into the store under `digest`,
    /// unless it is already present.
    pub fn insert(&self, source_path: &Path, digest: &str) -> Result<()> {
        if self.contains(digest) {
            return Ok(());
        }
        let dir = storage_dir(&self.root);
        let tmp = tempfile::NamedTempFile::new_in(&dir)?;
        std::fs::copy(source_path, tmp.path())?;
        tmp.persist(blob_path(&self.root, digest))
            .map_err(|e| e.error)?;
        Ok(())
    }

    /// Move an already-staged temporary file into place under `digest`.
    /// Used by replication pull, which stages downloads to a scratch
    /// directory before committing them (`spec.md` §4.11).
    pub fn adopt(&self, staged_path: &Path, digest: &str) -> Result<()> {
        if self.contains(digest) {
            std::fs::remove_file(staged_path).ok();
            return Ok(());
        }
        std::fs::rename(staged_path, blob_path(&self.root, digest))?;
        Ok(())
    }

    /// List every digest present in the store.
    pub fn list(&self) -> Result<BTreeSet<String>> {
        let dir = storage_dir(&self.root);
        let mut result = BTreeSet::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                if let Some(name) = entry.file_name().to_str() {
                    result.insert(name.to_string());
                }
            }
        }
        Ok(result)
    }

    /// Remove a blob. Used only by `drop`, and only after the coverage
    /// invariant has been checked by the caller.
    pub fn remove(&self, digest: &str) -> Result<()> {
        let path = blob_path(&self.root, digest);
        if path.is_file() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Path to the blob's underlying file, for callers that need to read
    /// or copy it directly (checkout, push).
    pub fn path_for(&self, digest: &str) -> PathBuf {
        blob_path(&self.root, digest)
    }
}
