//! Content pull (`spec.md` §4.11): download the blobs a set of commits
//! needs from whichever enabled peer has them.
//!
//! Grounded on `original_source/huge/repo/pull.py`. Downloads are staged to
//! a temporary directory under the repository before being adopted into
//! the content store, preserving the same crash-safety property as a
//! direct blob insert.

use std::collections::BTreeSet;
use std::path::Path;

use tracing::info;

use crate::address::parse_address;
use crate::commit_store::CommitStore;
use crate::content_store::ContentStore;
use crate::paths::{huge_dir, HUGE_DIRECTORY};
use crate::remote::RemoteInfo;
use crate::transport;
use crate::{Error, Result};

/// Pull every blob referenced by `commit_ids` that we don't already have,
/// trying each of `remotes` in turn until nothing remains. Surfaces
/// `Error::PullIncomplete` if any digest can't be found anywhere.
pub fn pull_commits(root: &Path, commit_ids: &[String], remotes: &[RemoteInfo]) -> Result<()> {
    let commit_store = CommitStore::open(root);
    let content_store = ContentStore::open(root);

    let mut needed: BTreeSet<String> = BTreeSet::new();
    for commit_id in commit_ids {
        needed.extend(commit_store.read_files(commit_id)?.into_values());
    }
    needed.retain(|digest| !content_store.contains(digest));

    if needed.is_empty() {
        return Ok(());
    }

    let staging = tempfile::tempdir_in(huge_dir(root))?;

    for remote in remotes {
        if needed.is_empty() {
            break;
        }
        let address = parse_address(&remote.address);
        info!(address = %address, "pulling");

        let peer = transport::open(&address);
        let peer_storage = match peer.list_dir(&format!("{HUGE_DIRECTORY}/storage")) {
            Ok(names) => names,
            Err(_) => continue,
        };

        let available: Vec<String> = needed.intersection(&peer_storage).cloned().collect();
        if available.is_empty() {
            continue;
        }

        if peer.copy_from_peer(&format!("{HUGE_DIRECTORY}/storage"), &available, staging.path()).is_err() {
            continue;
        }

        for digest in &available {
            let staged_path = staging.path().join(digest);
            if staged_path.is_file() {
                content_store.adopt(&staged_path, digest)?;
                needed.remove(digest);
            }
        }
    }

    if !needed.is_empty() {
        return Err(Error::PullIncomplete { digests: needed.into_iter().collect() });
    }
    Ok(())
}
