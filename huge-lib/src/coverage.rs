//! The coverage analyser (`spec.md` §4.7).
//!
//! Grounded on `original_source/huge/repo/coverage.py`. Computes per-peer
//! coverage for a single commit and the aggregate "coverage number" that
//! drives drop decisions.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::commit_store::CommitStore;
use crate::content_store::ContentStore;
use crate::remote::{list_remotes, read_coverage};
use crate::Result;

/// A single peer's (or the local repository's) coverage of one commit.
#[derive(Debug, Clone)]
pub struct RepositoryCoverage {
    /// The peer's address, or `"."` for the local repository.
    pub address: String,
    /// Digests from the commit that this peer is known to hold.
    pub files_available: BTreeSet<String>,
    /// Digests from the commit that this peer does not hold (or that we
    /// have no coverage information for at all).
    pub files_unavailable: BTreeSet<String>,
    /// `false` if this peer has never reported a coverage snapshot.
    pub available: bool,
}

impl RepositoryCoverage {
    /// Coverage for a single commit on a single peer: the fraction of the
    /// commit's digests this peer is known to hold. An empty commit is
    /// fully covered by definition.
    pub fn coverage(&self) -> f64 {
        let total = self.files_available.len() + self.files_unavailable.len();
        if total == 0 {
            1.0
        } else {
            self.files_available.len() as f64 / total as f64
        }
    }
}

/// The full picture across every known repository for one commit.
#[derive(Debug, Clone)]
pub struct CoverageAnalysis {
    /// One entry per peer, plus one for the local repository.
    pub repositories: Vec<RepositoryCoverage>,
}

impl CoverageAnalysis {
    /// The commit coverage number (`spec.md` §4.7):
    ///
    /// ```text
    /// floor  = min_d c(d)
    /// bonus  = (1/|D|) * sum_d min(1, c(d) - floor)
    /// coverage = floor + bonus
    /// ```
    ///
    /// where `c(d)` is the number of repositories (including self) holding
    /// digest `d`. Empty commits yield `1.0`.
    pub fn coverage(&self) -> f64 {
        let mut required: BTreeSet<&str> = BTreeSet::new();
        for repo in &self.repositories {
            required.extend(repo.files_available.iter().map(String::as_str));
            required.extend(repo.files_unavailable.iter().map(String::as_str));
        }
        if required.is_empty() {
            return 1.0;
        }

        let mut counts: BTreeMap<&str, u64> = required.iter().map(|d| (*d, 0)).collect();
        for repo in &self.repositories {
            for digest in &repo.files_available {
                *counts.get_mut(digest.as_str()).unwrap() += 1;
            }
        }

        let floor = *counts.values().min().unwrap();
        let bonus: f64 = counts.values().map(|&c| (c - floor).min(1) as f64).sum::<f64>() / counts.len() as f64;
        floor as f64 + bonus
    }
}

/// Compute coverage for `commit_id` across every enabled remote plus the
/// local repository. Callers should have run `fetch` recently so that peer
/// coverage snapshots are current.
pub fn analyze_commit_coverage(root: &Path, commit_id: &str) -> Result<CoverageAnalysis> {
    let commit_store = CommitStore::open(root);
    let commit_files = commit_store.read_files(commit_id)?;
    let commit_digests: BTreeSet<String> = commit_files.values().cloned().collect();

    let mut repositories = Vec::new();

    for remote in list_remotes(root)? {
        match read_coverage(root, &remote.remote_id)? {
            Some(peer_digests) => {
                let files_available: BTreeSet<String> = peer_digests.intersection(&commit_digests).cloned().collect();
                let files_unavailable: BTreeSet<String> = commit_digests.difference(&files_available).cloned().collect();
                repositories.push(RepositoryCoverage {
                    address: remote.address,
                    files_available,
                    files_unavailable,
                    available: true,
                });
            }
            None => {
                repositories.push(RepositoryCoverage {
                    address: remote.address,
                    files_available: BTreeSet::new(),
                    files_unavailable: commit_digests.clone(),
                    available: false,
                });
            }
        }
    }

    let content_store = ContentStore::open(root);
    let local_files = content_store.list()?;
    let local_available: BTreeSet<String> = local_files.intersection(&commit_digests).cloned().collect();
    let local_unavailable: BTreeSet<String> = commit_digests.difference(&local_available).cloned().collect();
    repositories.push(RepositoryCoverage {
        address: ".".to_string(),
        files_available: local_available,
        files_unavailable: local_unavailable,
        available: true,
    });

    Ok(CoverageAnalysis { repositories })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo(available: &[&str], unavailable: &[&str]) -> RepositoryCoverage {
        RepositoryCoverage {
            address: String::new(),
            files_available: available.iter().map(|s| s.to_string()).collect(),
            files_unavailable: unavailable.iter().map(|s| s.to_string()).collect(),
            available: true,
        }
    }

    #[test]
    fn two_peers_disjoint_halves_of_four() {
        let analysis = CoverageAnalysis {
            repositories: vec![repo(&["a", "b"], &["c", "d"]), repo(&["c", "d"], &["a", "b"])],
        };
        assert_eq!(analysis.coverage(), 1.0);
    }

    #[test]
    fn one_peer_all_one_peer_half() {
        let analysis = CoverageAnalysis {
            repositories: vec![repo(&["a", "b", "c", "d"], &[]), repo(&["a", "b"], &["c", "d"])],
        };
        assert_eq!(analysis.coverage(), 1.5);
    }

    #[test]
    fn two_peers_all_one_peer_quarter() {
        let analysis = CoverageAnalysis {
            repositories: vec![
                repo(&["a", "b", "c", "d"], &[]),
                repo(&["a", "b", "c", "d"], &[]),
                repo(&["a"], &["b", "c", "d"]),
            ],
        };
        assert_eq!(analysis.coverage(), 2.25);
    }

    #[test]
    fn all_peers_missing_half() {
        let analysis = CoverageAnalysis {
            repositories: vec![repo(&["a", "b"], &["c"]), repo(&["a", "b"], &["c", "d"])],
        };
        assert_eq!(analysis.coverage(), 0.5);
    }

    #[test]
    fn empty_commit_is_fully_covered() {
        let analysis = CoverageAnalysis { repositories: vec![repo(&[], &[])] };
        assert_eq!(analysis.coverage(), 1.0);
    }

    #[test]
    fn adding_a_digest_to_any_peer_never_decreases_coverage() {
        let before = CoverageAnalysis { repositories: vec![repo(&["a"], &["b"]), repo(&[], &["a", "b"])] };
        let c0 = before.coverage();
        let after = CoverageAnalysis { repositories: vec![repo(&["a"], &["b"]), repo(&["a"], &["b"])] };
        assert!(after.coverage() >= c0);
    }
}
