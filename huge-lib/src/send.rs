//! Send (`spec.md` §4.12): bootstrap a new peer repository from ours, the
//! inverse of clone.
//!
//! Grounded on `original_source/huge/repo/send.py`.

use std::path::Path;

use crate::address::{parse_address, Address};
use crate::commit_store::CommitStore;
use crate::paths::HUGE_DIRECTORY;
use crate::remote::add_remote;
use crate::replication::fetch::fetch_repositories;
use crate::repo::{create_repository_structure, read_identity};
use crate::transport;
use crate::{Error, Result};

/// Create the repository skeleton at `address`, upload our identity,
/// remote registry, and commit metadata, register the peer on our end,
/// then run a fetch so coverage is up to date on both sides.
pub fn send_repository(root: &Path, address: &str) -> Result<()> {
    let parsed = parse_address(address);

    match &parsed {
        Address::Path(path) => send_local(root, Path::new(path))?,
        Address::RemoteShell { .. } => send_remote(root, &parsed)?,
    }

    add_remote(root, address)?;
    fetch_repositories(root)?;
    Ok(())
}

fn send_local(root: &Path, destination: &Path) -> Result<()> {
    if destination.exists() {
        return Err(Error::AlreadyInitialized { path: destination.to_path_buf() });
    }
    std::fs::create_dir(destination)?;
    create_repository_structure(destination)?;
    std::fs::write(destination.join(HUGE_DIRECTORY).join("id"), read_identity(root)?)?;
    std::fs::write(destination.join(HUGE_DIRECTORY).join("current"), "")?;

    let commit_store = CommitStore::open(root);
    let commit_ids: Vec<String> = commit_store.list_ids()?.into_iter().collect();
    let peer = transport::open(&Address::Path(destination.display().to_string()));
    if !commit_ids.is_empty() {
        peer.copy_to_peer(&crate::paths::commits_dir(root), &commit_ids, &format!("{HUGE_DIRECTORY}/commits"))?;
    }

    let remote_ids: Vec<String> = std::fs::read_dir(crate::paths::remotes_dir(root))?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    if !remote_ids.is_empty() {
        peer.copy_to_peer(&crate::paths::remotes_dir(root), &remote_ids, &format!("{HUGE_DIRECTORY}/remotes"))?;
    }
    Ok(())
}

fn send_remote(root: &Path, address: &Address) -> Result<()> {
    let peer = transport::open(address);
    let commit_store = CommitStore::open(root);
    let commit_ids: Vec<String> = commit_store.list_ids()?.into_iter().collect();

    // Creates `<path>/.huge/storage` on the far side in one shot, which
    // also brings `<path>/.huge` and `<path>` into existence.
    peer.copy_to_peer(&crate::paths::storage_dir(root), &[], &format!("{HUGE_DIRECTORY}/storage"))?;

    let tmp = tempfile::tempdir()?;
    std::fs::write(tmp.path().join("id"), read_identity(root)?)?;
    peer.copy_to_peer(tmp.path(), &["id".to_string()], HUGE_DIRECTORY)?;

    if !commit_ids.is_empty() {
        peer.copy_to_peer(&crate::paths::commits_dir(root), &commit_ids, &format!("{HUGE_DIRECTORY}/commits"))?;
    }

    let remote_ids: Vec<String> = std::fs::read_dir(crate::paths::remotes_dir(root))?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    if !remote_ids.is_empty() {
        peer.copy_to_peer(&crate::paths::remotes_dir(root), &remote_ids, &format!("{HUGE_DIRECTORY}/remotes"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_local_creates_a_peer_sharing_our_identity() {
        let dir = tempfile::tempdir().unwrap();
        crate::repo::create_repository(dir.path()).unwrap();

        let destination_parent = tempfile::tempdir().unwrap();
        let destination = destination_parent.path().join("peer");

        send_repository(dir.path(), &destination.display().to_string()).unwrap();

        assert!(crate::repo::is_repository(&destination));
        assert_eq!(crate::repo::read_identity(&destination).unwrap(), crate::repo::read_identity(dir.path()).unwrap());
        assert_eq!(crate::remote::list_all_remotes(dir.path()).unwrap().len(), 1);
    }
}
