//! Metadata fetch (`spec.md` §4.9): bidirectional commit-directory
//! reconciliation plus a peer coverage-snapshot refresh.
//!
//! Grounded on `original_source/huge/repo/fetch.py`.

use std::collections::BTreeSet;
use std::path::Path;

use tracing::{info, warn};

use crate::address::parse_address;
use crate::paths::{commits_dir, HUGE_DIRECTORY};
use crate::remote::{list_remotes, write_coverage};
use crate::replication::looks_like_digest;
use crate::repo::read_identity;
use crate::transport;
use crate::{Error, Result};

/// Reconcile commit metadata with every enabled peer, refreshing each
/// peer's cached coverage snapshot along the way. A peer with an invalid
/// address or mismatched identity is logged and skipped, never fatal
/// (`spec.md` §4.9).
pub fn fetch_repositories(root: &Path) -> Result<()> {
    let local_id = read_identity(root)?;
    let local_commits: BTreeSet<String> = std::fs::read_dir(commits_dir(root))?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();

    for remote in list_remotes(root)? {
        let address = parse_address(&remote.address);
        info!(address = %address, "fetching");

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

        let peer_commits = match peer.list_dir(&format!("{HUGE_DIRECTORY}/commits")) {
            Ok(names) => names,
            Err(e) => {
                warn!(address = %address, error = %e, "could not list remote commits, skipped");
                continue;
            }
        };

        let missing_locally: Vec<String> = peer_commits.difference(&local_commits).cloned().collect();
        if !missing_locally.is_empty() {
            peer.copy_from_peer(&format!("{HUGE_DIRECTORY}/commits"), &missing_locally, &commits_dir(root))?;
        }

        let missing_on_peer: Vec<String> = local_commits.difference(&peer_commits).cloned().collect();
        if !missing_on_peer.is_empty() {
            peer.copy_to_peer(&commits_dir(root), &missing_on_peer, &format!("{HUGE_DIRECTORY}/commits"))?;
        }

        let peer_storage = match peer.list_dir(&format!("{HUGE_DIRECTORY}/storage")) {
            Ok(names) => names,
            Err(e) => {
                warn!(address = %address, error = %e, "could not list remote storage, skipped coverage refresh");
                continue;
            }
        };
        if let Some(bad) = peer_storage.iter().find(|d| !looks_like_digest(d)) {
            let err = Error::CorruptPeerData { address: remote.address.clone(), digest: bad.clone() };
            warn!(error = %err, "skipped coverage refresh");
            continue;
        }

        write_coverage(root, &remote.remote_id, &peer_storage)?;
    }

    Ok(())
}
