//! Error kinds shared across the core library.

use std::path::PathBuf;

use thiserror::Error;

/// The result type returned by all fallible `huge-lib` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error kinds, independent of which operation raised them.
///
/// These correspond one-to-one with the error kinds in `spec.md` §7.
#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum Error {
    #[error("not a .huge repository, or you are not in the root level of it")]
    NotARepository,

    #[error("huge already initialized at {path}")]
    AlreadyInitialized { path: PathBuf },

    #[error("invalid address: {address}")]
    InvalidAddress { address: String },

    #[error("remote repository at {address} is a different repository")]
    IdentityMismatch { address: String },

    #[error("commit not found: {commit_id}")]
    CommitNotFound { commit_id: String },

    #[error("Workspace has changes. Aborted.")]
    WorkspaceDirty,

    #[error(
        "missing one or more files locally for commit {commit_id}\n\nTry:\n  huge pull {commit_id}\n\n\
         ...which will try to retrieve the data from any of the known remotes."
    )]
    MissingBlobs { commit_id: String },

    #[error("transport failure talking to {address}: {reason}")]
    TransportFailure { address: String, reason: String },

    #[error("invalid digest reported by peer {address}: {digest:?}")]
    CorruptPeerData { address: String, digest: String },

    #[error(
        "commit {commit_id} has coverage {coverage:.2}, below the 2.0 threshold required to drop; pass --force to override"
    )]
    DropBlocked { commit_id: String, coverage: f64 },

    #[error("files not found in commit {commit_id}: {paths:?}")]
    FilesNotInCommit { commit_id: String, paths: Vec<String> },

    #[error("not all required files could be retrieved: {digests:?} still missing")]
    PullIncomplete { digests: Vec<String> },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
