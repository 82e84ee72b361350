//! Command-line options for `huge`.
//!
//! Grounded on `git-branchless-opts`'s `clap`-derive style: one `Opts`
//! struct carrying global flags plus a `Command` subcommand enum, each
//! variant holding its own argument struct inline.

#![warn(missing_docs)]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level options parsed from `argv`.
#[derive(Debug, Parser)]
#[clap(name = "huge", about = "A distributed content-addressed version-control system for large files")]
pub struct Opts {
    /// The command to run.
    #[clap(subcommand)]
    pub command: Command,
}

/// Every verb in the command surface (`spec.md` §6).
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a `.huge` repository in the current directory.
    Init,

    /// Print the current commit and the staged/unstaged file groups.
    Status,

    /// Mark files (or expanded directories) for the next commit.
    Add {
        /// Paths to stage.
        #[clap(required = true)]
        paths: Vec<String>,
    },

    /// Unmark files. `.` clears the whole stage.
    Reset {
        /// Paths to unstage, or `.` for everything.
        #[clap(required = true)]
        paths: Vec<String>,
    },

    /// Write a new commit from the current stage.
    Commit {
        /// The commit message.
        #[clap(short = 'm', long = "message")]
        message: Option<String>,
    },

    /// List commits in reverse-chronological order.
    Log,

    /// Switch to a commit, or overlay specific files from it.
    Checkout {
        /// The commit to check out.
        commit_id: String,

        /// Restrict the checkout to these paths, leaving the
        /// current-commit pointer untouched.
        files: Vec<String>,
    },

    /// List registered peers.
    Remotes,

    /// Register a new peer address.
    #[clap(name = "remote-add")]
    RemoteAdd {
        /// The peer address (local path, `host:path`, or `user@host:path`).
        address: String,
    },

    /// Exclude a registered peer from fetch/push/pull without forgetting it.
    #[clap(name = "remote-disable")]
    RemoteDisable {
        /// The remote's 32-hex id, as shown by `remotes`.
        remote_id: String,
    },

    /// Reinstate a previously disabled peer.
    #[clap(name = "remote-enable")]
    RemoteEnable {
        /// The remote's 32-hex id, as shown by `remotes`.
        remote_id: String,
    },

    /// Bootstrap a new local repository from a peer.
    Clone {
        /// The peer address to clone from.
        address: String,
    },

    /// Bootstrap a new peer repository from ours.
    Send {
        /// The destination address.
        address: String,
    },

    /// Reconcile commit metadata with every enabled peer.
    Fetch,

    /// Upload blobs for given (or current) commits to given (or all) peers.
    Push {
        /// Commits to push; defaults to the current commit.
        commits: Vec<String>,

        /// Restrict to these peer ids; defaults to every enabled peer.
        #[clap(short = 'r', long = "remote")]
        remotes: Vec<String>,
    },

    /// Download blobs for given commits from any enabled peer.
    Pull {
        /// Commits to pull.
        #[clap(required = true)]
        commits: Vec<String>,

        /// Restrict to these peer ids; defaults to every enabled peer.
        #[clap(short = 'r', long = "remote")]
        remotes: Vec<String>,
    },

    /// Free blobs for commits of sufficient coverage.
    Drop {
        /// Commits to drop.
        #[clap(required = true)]
        commits: Vec<String>,

        /// Ignore the coverage threshold.
        #[clap(short = 'f', long = "force")]
        force: bool,
    },

    /// Show the coverage analysis for a single commit without mutating
    /// anything.
    #[clap(name = "coverage-show")]
    CoverageShow {
        /// The commit to analyze.
        commit_id: String,
    },
}

/// Resolve the repository root from the current working directory,
/// overridable for tests.
pub fn working_directory() -> std::io::Result<PathBuf> {
    std::env::current_dir()
}
