//! Content push (`spec.md` §4.10): upload the blobs a set of commits needs
//! to a chosen set of peers.
//!
//! Grounded on `original_source/huge/repo/push.py`.

use std::collections::BTreeSet;
use std::path::Path;

use tracing::{info, warn};

use crate::address::parse_address;
use crate::commit_store::CommitStore;
use crate::paths::{storage_dir, HUGE_DIRECTORY};
use crate::remote::{append_coverage, RemoteInfo};
use crate::repo::read_identity;
use crate::transport;
use crate::{Error, Result};

/// Push every blob referenced by `commit_ids` to each of `remotes` that
/// doesn't already have it, recording what landed in the peer's cached
/// coverage snapshot. A peer with an invalid address, mismatched identity,
/// or a failing transport is logged and skipped, never fatal to the rest
/// of the push (`spec.md` §4.10, matching `fetch_repositories`).
pub fn push_commits(root: &Path, commit_ids: &[String], remotes: &[RemoteInfo]) -> Result<()> {
    let local_id = read_identity(root)?;
    let commit_store = CommitStore::open(root);
    let mut needed: BTreeSet<String> = BTreeSet::new();
    for commit_id in commit_ids {
        needed.extend(commit_store.read_files(commit_id)?.into_values());
    }

    for remote in remotes {
        let address = parse_address(&remote.address);
        info!(address = %address, "pushing");

        let peer = transport::open(&address);

        let remote_id = match peer.read_file(&format!("{HUGE_DIRECTORY}/id")) {
            Ok(id) => id.trim().to_string(),
            Err(e) => {
                warn!(address = %address, error = %e, "invalid remote address, skipped");
                continue;
            }
        };
        if remote_id != local_id {
            let err = Error::IdentityMismatch { address: remote.address.clone() };
            warn!(error = %err, "skipped");
            continue;
        }

        let peer_storage = match peer.list_dir(&format!("{HUGE_DIRECTORY}/storage")) {
            Ok(names) => names,
            Err(e) => {
                warn!(address = %address, error = %e, "could not list remote storage, skipped");
                continue;
            }
        };

        let to_send: Vec<String> = needed.difference(&peer_storage).cloned().collect();
        if !to_send.is_empty() {
            if let Err(e) = peer.copy_to_peer(&storage_dir(root), &to_send, &format!("{HUGE_DIRECTORY}/storage")) {
                warn!(address = %address, error = %e, "could not push blobs, skipped");
                continue;
            }
        }

        append_coverage(root, &remote.remote_id, &to_send.into_iter().collect())?;
    }

    Ok(())
}
