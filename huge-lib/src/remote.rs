//! The remote registry (`spec.md` §3 "Remote entry", §4.? peer directory).
//!
//! Grounded on `original_source/huge/repo/remote.py`. Each peer is a
//! directory under `remotes/<id>/` holding an `address` file, an optional
//! `coverage` snapshot, and an optional `disabled` marker.

use std::collections::BTreeSet;
use std::path::Path;

use chrono::{DateTime, Local};

use crate::commit_store::generate_commit_id;
use crate::paths::remote_dir;
use crate::Result;

/// A single entry in the remote registry.
#[derive(Debug, Clone)]
pub struct RemoteInfo {
    pub address: String,
    pub remote_id: String,
    /// Local time of the peer's last coverage refresh, if it has one.
    pub last_coverage_update: Option<DateTime<Local>>,
    /// `false` when a `disabled` marker is present.
    pub enabled: bool,
}

/// Register a new peer address. Silently a no-op if `address` (after
/// trimming) already names a known remote — mirrors the original's
/// deliberate idempotency.
pub fn add_remote(root: &Path, address: &str) -> Result<String> {
    let address = address.trim();
    for remote in list_all_remotes(root)? {
        if remote.address.trim() == address {
            return Ok(remote.remote_id);
        }
    }

    let remotes_dir = crate::paths::remotes_dir(root);
    std::fs::create_dir_all(&remotes_dir)?;

    let remote_id = generate_commit_id();
    let dir = remote_dir(root, &remote_id);
    std::fs::create_dir_all(&dir)?;
    std::fs::write(dir.join("address"), format!("{address}\n"))?;
    Ok(remote_id)
}

/// List every enabled remote (used by fetch/push/pull).
pub fn list_remotes(root: &Path) -> Result<Vec<RemoteInfo>> {
    Ok(list_all_remotes(root)?.into_iter().filter(|r| r.enabled).collect())
}

/// List every remote, including disabled ones (used by `remote` listings).
pub fn list_all_remotes(root: &Path) -> Result<Vec<RemoteInfo>> {
    let remotes_dir = crate::paths::remotes_dir(root);
    if !remotes_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut result = Vec::new();
    for entry in std::fs::read_dir(&remotes_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let remote_id = entry.file_name().to_string_lossy().into_owned();
        let dir = entry.path();

        let address = std::fs::read_to_string(dir.join("address"))?.trim().to_string();
        let enabled = !dir.join("disabled").is_file();

        let coverage_file = dir.join("coverage");
        let last_coverage_update = if coverage_file.is_file() {
            std::fs::metadata(&coverage_file)?.modified().ok().map(DateTime::<Local>::from)
        } else {
            None
        };

        result.push(RemoteInfo { address, remote_id, last_coverage_update, enabled });
    }
    result.sort_by(|a, b| a.remote_id.cmp(&b.remote_id));
    Ok(result)
}

/// Exclude a peer from fetch/push/pull without forgetting it.
pub fn disable_remote(root: &Path, remote_id: &str) -> Result<()> {
    std::fs::write(remote_dir(root, remote_id).join("disabled"), "")?;
    Ok(())
}

/// Reinstate a previously disabled peer.
pub fn enable_remote(root: &Path, remote_id: &str) -> Result<()> {
    let marker = remote_dir(root, remote_id).join("disabled");
    if marker.is_file() {
        std::fs::remove_file(marker)?;
    }
    Ok(())
}

/// Read a peer's last-known coverage snapshot, or `None` if it has never
/// been fetched.
pub fn read_coverage(root: &Path, remote_id: &str) -> Result<Option<BTreeSet<String>>> {
    let path = remote_dir(root, remote_id).join("coverage");
    if !path.is_file() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(path)?;
    Ok(Some(contents.lines().map(|l| l.trim().to_string()).filter(|l| !l.is_empty()).collect()))
}

/// Overwrite a peer's coverage snapshot wholesale (used by fetch).
pub fn write_coverage(root: &Path, remote_id: &str, digests: &BTreeSet<String>) -> Result<()> {
    let contents: String = digests.iter().map(|d| format!("{d}\n")).collect();
    std::fs::write(remote_dir(root, remote_id).join("coverage"), contents)?;
    Ok(())
}

/// Extend a peer's coverage snapshot with newly pushed digests (used by
/// push, which appends rather than re-fetching the peer's whole listing).
pub fn append_coverage(root: &Path, remote_id: &str, digests: &BTreeSet<String>) -> Result<()> {
    if digests.is_empty() {
        return Ok(());
    }
    let mut existing = read_coverage(root, remote_id)?.unwrap_or_default();
    existing.extend(digests.iter().cloned());
    write_coverage(root, remote_id, &existing)
}
