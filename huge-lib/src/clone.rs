//! Clone (`spec.md` §4.12): bootstrap a new local repository from a peer.
//!
//! Grounded on `original_source/huge/repo/clone.py`.

use std::path::Path;

use crate::address::{parse_address, Address};
use crate::paths::HUGE_DIRECTORY;
use crate::remote::add_remote;
use crate::replication::fetch::fetch_repositories;
use crate::repo::create_repository_structure;
use crate::transport;
use crate::{Error, Result};

/// Create a new repository in a freshly made subdirectory named after the
/// peer's basename, seed it with the peer's identity and remote registry
/// (but not commits or blobs), register the peer, and run a full fetch.
/// `cwd` is the directory the new repository's folder is created under.
pub fn clone_repository(cwd: &Path, address: &str) -> Result<()> {
    let parsed = parse_address(address);
    let basename = basename_of(&parsed)?;
    let destination = cwd.join(&basename);

    if destination.exists() {
        return Err(Error::AlreadyInitialized { path: destination });
    }
    std::fs::create_dir(&destination)?;

    create_repository_structure(&destination)?;

    let peer = transport::open(&parsed);
    let identity = peer.read_file(&format!("{HUGE_DIRECTORY}/id"))?;
    std::fs::write(destination.join(HUGE_DIRECTORY).join("id"), identity.trim())?;
    std::fs::write(destination.join(HUGE_DIRECTORY).join("current"), "")?;

    // Seed the remote registry the peer already has, so we inherit its
    // known peers too (best-effort: a fresh peer may not have one yet).
    if let Ok(names) = peer.list_dir(&format!("{HUGE_DIRECTORY}/remotes")) {
        let names: Vec<String> = names.into_iter().collect();
        if !names.is_empty() {
            peer.copy_from_peer(
                &format!("{HUGE_DIRECTORY}/remotes"),
                &names,
                &destination.join(HUGE_DIRECTORY).join("remotes"),
            )?;
        }
    }

    add_remote(&destination, address)?;
    fetch_repositories(&destination)?;
    Ok(())
}

fn basename_of(address: &Address) -> Result<String> {
    let path_part = match address {
        Address::Path(path) => path.as_str(),
        Address::RemoteShell { path, .. } => path.as_str(),
    };
    Path::new(path_part)
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .ok_or_else(|| Error::InvalidAddress { address: path_part.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clone_seeds_identity_and_registers_the_source_as_a_remote() {
        let origin_parent = tempfile::tempdir().unwrap();
        let origin = origin_parent.path().join("origin");
        std::fs::create_dir(&origin).unwrap();
        crate::repo::create_repository(&origin).unwrap();

        let workdir = tempfile::tempdir().unwrap();
        clone_repository(workdir.path(), &origin.display().to_string()).unwrap();

        let cloned = workdir.path().join("origin");
        assert!(crate::repo::is_repository(&cloned));
        assert_eq!(crate::repo::read_identity(&cloned).unwrap(), crate::repo::read_identity(&origin).unwrap());

        let remotes = crate::remote::list_all_remotes(&cloned).unwrap();
        assert_eq!(remotes.len(), 1);
        assert_eq!(remotes[0].address, origin.display().to_string());
    }
}
