//! The commit store (`spec.md` §3 "Commit", §4.5-§4.6).
//!
//! A commit directory holds `files`, `parents`, `timestamp`, `message`.
//! Commits are immutable once written; nothing else is stored. Grounded on
//! `original_source/huge/repo/commit.py`.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rand::RngCore;

use crate::paths::{commit_dir, commits_dir};
use crate::{Error, Result};

/// A fully-materialized commit, read from disk.
#[derive(Debug, Clone)]
pub struct Commit {
    /// The 32-hex commit identifier.
    pub id: String,
    /// Path -> digest, the tree this commit represents.
    pub files: BTreeMap<String, String>,
    /// Zero (root), one (ordinary), or two (merge) parent ids.
    pub parents: Vec<String>,
    /// UTC creation time.
    pub timestamp: DateTime<Utc>,
    /// Free-form commit message, if any.
    pub message: Option<String>,
}

impl Commit {
    /// The set of distinct digests this commit references.
    pub fn digests(&self) -> BTreeSet<String> {
        self.files.values().cloned().collect()
    }
}

/// A handle onto a repository's commit directory.
pub struct CommitStore {
    root: PathBuf,
}

impl CommitStore {
    /// Open the commit store rooted at the repository `root`.
    pub fn open(root: &Path) -> Self {
        Self { root: root.to_path_buf() }
    }

    /// List every commit id present on disk.
    pub fn list_ids(&self) -> Result<BTreeSet<String>> {
        let dir = commits_dir(&self.root);
        let mut result = BTreeSet::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    result.insert(name.to_string());
                }
            }
        }
        Ok(result)
    }

    /// Returns `true` if a commit directory exists for `commit_id`.
    pub fn exists(&self, commit_id: &str) -> bool {
        commit_dir(&self.root, commit_id).is_dir()
    }

    /// Read a commit's `files` map only, the cheap path used by diffing
    /// and coverage analysis.
    pub fn read_files(&self, commit_id: &str) -> Result<BTreeMap<String, String>> {
        let path = commit_dir(&self.root, commit_id).join("files");
        if !path.is_file() {
            return Ok(BTreeMap::new());
        }
        let contents = std::fs::read_to_string(path)?;
        Ok(parse_files(&contents))
    }

    /// Read a commit in full.
    pub fn read(&self, commit_id: &str) -> Result<Commit> {
        if !self.exists(commit_id) {
            return Err(Error::CommitNotFound { commit_id: commit_id.to_string() });
        }
        let dir = commit_dir(&self.root, commit_id);

        let files = self.read_files(commit_id)?;

        let parents = match std::fs::read_to_string(dir.join("parents")) {
            Ok(contents) => contents.lines().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        let timestamp = match std::fs::read_to_string(dir.join("timestamp")) {
            Ok(contents) => DateTime::parse_from_rfc3339(contents.trim())
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Utc::now(),
            Err(e) => return Err(e.into()),
        };

        let message = match std::fs::read_to_string(dir.join("message")) {
            Ok(contents) => Some(contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        Ok(Commit { id: commit_id.to_string(), files, parents, timestamp, message })
    }

    /// Read every commit on disk.
    pub fn read_all(&self) -> Result<Vec<Commit>> {
        let mut result = Vec::new();
        for id in self.list_ids()? {
            result.push(self.read(&id)?);
        }
        Ok(result)
    }

    /// Create a new, empty commit directory with a freshly generated id.
    /// Returns the id. The caller is responsible for writing `files`,
    /// `parents`, `timestamp`, `message` (see `pipeline::commit`).
    pub fn create_dir(&self) -> Result<String> {
        loop {
            let id = generate_commit_id();
            let dir = commit_dir(&self.root, &id);
            match std::fs::create_dir(&dir) {
                Ok(()) => return Ok(id),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Path to a commit's directory, for writers that need direct access.
    pub fn dir(&self, commit_id: &str) -> PathBuf {
        commit_dir(&self.root, commit_id)
    }
}

/// Format the `files` list: a sorted set of `<digest>\t<path>` lines.
pub fn format_files(files: &BTreeMap<String, String>) -> String {
    let mut lines: Vec<String> = files.iter().map(|(path, digest)| format!("{digest}\t{path}\n")).collect();
    lines.sort();
    lines.concat()
}

fn parse_files(contents: &str) -> BTreeMap<String, String> {
    let mut result = BTreeMap::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some((digest, path)) = line.split_once('\t') {
            result.insert(path.to_string(), digest.to_string());
        }
    }
    result
}

/// Generate a fresh, randomly-generated 32-hex identifier. Used for both
/// commit ids and remote ids (`spec.md` §3: "randomly generated, not
/// derived").
pub fn generate_commit_id() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_store() -> (tempfile::TempDir, CommitStore) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(crate::paths::commits_dir(dir.path())).unwrap();
        let store = CommitStore::open(dir.path());
        (dir, store)
    }

    #[test]
    fn round_trips_files_parents_message() {
        let (_dir, store) = new_store();
        let id = store.create_dir().unwrap();
        let mut files = BTreeMap::new();
        files.insert("a.txt".to_string(), "deadbeef".to_string());
        std::fs::write(store.dir(&id).join("files"), format_files(&files)).unwrap();
        std::fs::write(store.dir(&id).join("parents"), "").unwrap();
        std::fs::write(store.dir(&id).join("timestamp"), Utc::now().to_rfc3339()).unwrap();
        std::fs::write(store.dir(&id).join("message"), "hello").unwrap();

        let commit = store.read(&id).unwrap();
        assert_eq!(commit.files, files);
        assert!(commit.parents.is_empty());
        assert_eq!(commit.message.as_deref(), Some("hello"));
    }

    #[test]
    fn commit_id_is_32_hex_chars() {
        let id = generate_commit_id();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
