//! Transports: the two peer-reachability mechanisms named in `spec.md` §1 —
//! local filesystem and remote shell — offering *list-directory* and
//! *recursive-copy with resume*.
//!
//! Grounded on `original_source/huge/repo/fetch.py`, `push.py`, `pull.py`
//! (the `rsync`/`ssh` subprocess invocations) and on `git-branchless-lib`'s
//! `git::run::GitRunInfo`, which wraps `std::process::Command` the same way.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::address::Address;
use crate::{Error, Result};

/// Remote-shell transfers are chunked at this many names per `rsync`
/// invocation, matching the batching in `original_source/huge/repo/pull.py`.
pub const BATCH_SIZE: usize = 500;

/// A peer reachable either directly on the filesystem or over `ssh`/`rsync`.
pub trait Transport {
    /// A label for error messages and progress output.
    fn label(&self) -> String;

    /// Read a small text file relative to the peer's repository root.
    fn read_file(&self, relative: &str) -> Result<String>;

    /// List the names of entries in a directory relative to the peer's
    /// repository root.
    fn list_dir(&self, relative: &str) -> Result<BTreeSet<String>>;

    /// Recursively copy `names` found under `relative` (peer-side) down
    /// into `dest_dir` (local). Already-transferred entries are left alone
    /// on retry — a resumed copy is idempotent.
    fn copy_from_peer(&self, relative: &str, names: &[String], dest_dir: &Path) -> Result<()>;

    /// Recursively copy `names` found under `source_dir` (local) up to
    /// `relative` (peer-side).
    fn copy_to_peer(&self, source_dir: &Path, names: &[String], relative: &str) -> Result<()>;
}

/// Build the transport appropriate for a parsed address.
pub fn open(address: &Address) -> Box<dyn Transport> {
    match address {
        Address::Path(path) => Box::new(LocalTransport { root: PathBuf::from(path) }),
        Address::RemoteShell { login, server, path } => Box::new(RemoteShellTransport {
            login: login.clone(),
            server: server.clone(),
            path: path.clone(),
        }),
    }
}

/// A peer that is simply another directory on the same filesystem.
pub struct LocalTransport {
    root: PathBuf,
}

impl Transport for LocalTransport {
    fn label(&self) -> String {
        self.root.display().to_string()
    }

    fn read_file(&self, relative: &str) -> Result<String> {
        Ok(std::fs::read_to_string(self.root.join(relative))?)
    }

    fn list_dir(&self, relative: &str) -> Result<BTreeSet<String>> {
        let dir = self.root.join(relative);
        if !dir.is_dir() {
            return Ok(BTreeSet::new());
        }
        let mut names = BTreeSet::new();
        for entry in std::fs::read_dir(&dir)? {
            names.insert(entry?.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }

    fn copy_from_peer(&self, relative: &str, names: &[String], dest_dir: &Path) -> Result<()> {
        let source_dir = self.root.join(relative);
        for name in names {
            copy_entry_recursive(&source_dir.join(name), &dest_dir.join(name))?;
        }
        Ok(())
    }

    fn copy_to_peer(&self, source_dir: &Path, names: &[String], relative: &str) -> Result<()> {
        let dest_dir = self.root.join(relative);
        std::fs::create_dir_all(&dest_dir)?;
        for name in names {
            copy_entry_recursive(&source_dir.join(name), &dest_dir.join(name))?;
        }
        Ok(())
    }
}

/// Copy a file or directory tree, overwriting any existing destination —
/// the "idempotent whole-directory copy" semantics `spec.md` §4.9 requires
/// of commit-directory replication.
fn copy_entry_recursive(source: &Path, dest: &Path) -> Result<()> {
    if source.is_dir() {
        std::fs::create_dir_all(dest)?;
        for entry in std::fs::read_dir(source)? {
            let entry = entry?;
            copy_entry_recursive(&entry.path(), &dest.join(entry.file_name()))?;
        }
    } else if source.is_file() {
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(source, dest)?;
    }
    Ok(())
}

/// A peer reached over `ssh login@server`, using `rsync` for bulk transfer.
pub struct RemoteShellTransport {
    login: String,
    server: String,
    path: String,
}

impl RemoteShellTransport {
    fn destination(&self) -> String {
        format!("{}@{}:{}", self.login, self.server, self.path)
    }

    fn run_ssh(&self, args: &[&str]) -> Result<String> {
        let output = Command::new("ssh")
            .arg(format!("{}@{}", self.login, self.server))
            .args(args)
            .output()
            .map_err(|e| Error::TransportFailure { address: self.label(), reason: e.to_string() })?;
        if !output.status.success() {
            return Err(Error::TransportFailure {
                address: self.label(),
                reason: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn run_rsync(&self, args: &[String]) -> Result<()> {
        let status = Command::new("rsync")
            .arg("-ah")
            .arg("--info=progress2")
            .args(args)
            .status()
            .map_err(|e| Error::TransportFailure { address: self.label(), reason: e.to_string() })?;
        if !status.success() {
            return Err(Error::TransportFailure {
                address: self.label(),
                reason: "rsync exited with a non-zero status".to_string(),
            });
        }
        Ok(())
    }
}

impl Transport for RemoteShellTransport {
    fn label(&self) -> String {
        self.destination()
    }

    fn read_file(&self, relative: &str) -> Result<String> {
        self.run_ssh(&["cat", &format!("{}/{relative}", self.path)])
    }

    fn list_dir(&self, relative: &str) -> Result<BTreeSet<String>> {
        let listing = self.run_ssh(&["ls", &format!("{}/{relative}", self.path)])?;
        Ok(listing.lines().map(|l| l.trim().to_string()).filter(|l| !l.is_empty()).collect())
    }

    fn copy_from_peer(&self, relative: &str, names: &[String], dest_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dest_dir)?;
        for chunk in names.chunks(BATCH_SIZE) {
            let mut args: Vec<String> = chunk
                .iter()
                .map(|name| format!("{}@{}:{}/{relative}/{name}", self.login, self.server, self.path))
                .collect();
            args.push(format!("{}/", dest_dir.display()));
            self.run_rsync(&args)?;
        }
        Ok(())
    }

    fn copy_to_peer(&self, source_dir: &Path, names: &[String], relative: &str) -> Result<()> {
        self.run_ssh(&["mkdir", "-p", &format!("{}/{relative}", self.path)])?;
        for chunk in names.chunks(BATCH_SIZE) {
            let mut args: Vec<String> = chunk.iter().map(|name| source_dir.join(name).display().to_string()).collect();
            args.push(format!("{}@{}:{}/{relative}/", self.login, self.server, self.path));
            self.run_rsync(&args)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_transport_lists_and_copies_directory_entries() {
        let peer_dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(peer_dir.path().join("commits/abc")).unwrap();
        std::fs::write(peer_dir.path().join("commits/abc/files"), "deadbeef\tfoo.txt\n").unwrap();

        let transport = LocalTransport { root: peer_dir.path().to_path_buf() };
        let names = transport.list_dir("commits").unwrap();
        assert!(names.contains("abc"));

        let dest = tempfile::tempdir().unwrap();
        transport.copy_from_peer("commits", &["abc".to_string()], dest.path()).unwrap();
        assert!(dest.path().join("abc/files").is_file());
    }

    #[test]
    fn local_transport_list_dir_on_missing_directory_is_empty() {
        let peer_dir = tempfile::tempdir().unwrap();
        let transport = LocalTransport { root: peer_dir.path().to_path_buf() };
        assert!(transport.list_dir("nope").unwrap().is_empty());
    }
}
