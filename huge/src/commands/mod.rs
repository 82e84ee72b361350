//! Command implementations: one function per verb in `huge-opts::Command`.
//! Renders to stdout/stderr; `huge-lib` itself never touches either.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::Local;
use itertools::Itertools;

use huge_lib::checkout::{checkout_commit, checkout_files};
use huge_lib::commit_store::CommitStore;
use huge_lib::coverage::analyze_commit_coverage;
use huge_lib::graph::CommitGraph;
use huge_lib::ignore::IgnoreEngine;
use huge_lib::paths::ignore_file;
use huge_lib::pipeline::commit;
use huge_lib::progress::NoopProgress;
use huge_lib::remote::{
    add_remote, disable_remote, enable_remote, list_all_remotes, list_remotes, RemoteInfo,
};
use huge_lib::repo::{create_repository, current_commit, find_repository_root};
use huge_lib::replication::fetch::fetch_repositories;
use huge_lib::replication::pull::pull_commits;
use huge_lib::replication::push::push_commits;
use huge_lib::send::send_repository;
use huge_lib::stage::{self, staged_paths, workspace_diff};
use huge_lib::{clone, drop as drop_mod, Error};
use huge_opts::Command;

pub fn dispatch(cwd: &Path, command: Command) -> eyre::Result<()> {
    match command {
        Command::Init => cmd_init(cwd),
        Command::Status => cmd_status(&repo_root(cwd)?),
        Command::Add { paths } => cmd_add(&repo_root(cwd)?, &paths),
        Command::Reset { paths } => cmd_reset(&repo_root(cwd)?, &paths),
        Command::Commit { message } => cmd_commit(&repo_root(cwd)?, message.as_deref()),
        Command::Log => cmd_log(&repo_root(cwd)?),
        Command::Checkout { commit_id, files } => cmd_checkout(&repo_root(cwd)?, &commit_id, &files),
        Command::Remotes => cmd_remotes(&repo_root(cwd)?),
        Command::RemoteAdd { address } => cmd_remote_add(&repo_root(cwd)?, &address),
        Command::RemoteDisable { remote_id } => cmd_remote_disable(&repo_root(cwd)?, &remote_id),
        Command::RemoteEnable { remote_id } => cmd_remote_enable(&repo_root(cwd)?, &remote_id),
        Command::Clone { address } => cmd_clone(cwd, &address),
        Command::Send { address } => cmd_send(&repo_root(cwd)?, &address),
        Command::Fetch => cmd_fetch(&repo_root(cwd)?),
        Command::Push { commits, remotes } => cmd_push(&repo_root(cwd)?, &commits, &remotes),
        Command::Pull { commits, remotes } => cmd_pull(&repo_root(cwd)?, &commits, &remotes),
        Command::Drop { commits, force } => cmd_drop(&repo_root(cwd)?, &commits, force),
        Command::CoverageShow { commit_id } => cmd_coverage_show(&repo_root(cwd)?, &commit_id),
    }
}

fn repo_root(cwd: &Path) -> eyre::Result<PathBuf> {
    find_repository_root(cwd).ok_or_else(|| Error::NotARepository.into())
}

fn load_ignore(root: &Path) -> eyre::Result<IgnoreEngine> {
    Ok(IgnoreEngine::load(&ignore_file(root))?)
}

fn cmd_init(cwd: &Path) -> eyre::Result<()> {
    create_repository(cwd)?;
    Ok(())
}

fn cmd_status(root: &Path) -> eyre::Result<()> {
    let ignore = load_ignore(root)?;
    let commit_store = CommitStore::open(root);

    if let Some(commit_id) = current_commit(root)? {
        println!("Commit: {commit_id}");
    }

    let diff = workspace_diff(root, &ignore, &commit_store, None, &NoopProgress)?;
    let staged = staged_paths(root)?;

    let lines = render_status(&diff, &staged);
    if !lines.is_empty() {
        println!("{}", lines.iter().join("\n"));
    }
    Ok(())
}

/// Build the `status` body: staged group (A/C/D, each sorted by path) then
/// a blank-line-separated unstaged group, matching the original's
/// three-pass grouping (`spec.md` §6, §8 scenario 1).
fn render_status(diff: &stage::WorkspaceDiff, staged: &BTreeSet<String>) -> Vec<String> {
    let mut staged_lines = Vec::new();
    let mut unstaged_lines = Vec::new();

    for (bucket, marker) in [(&diff.new, 'A'), (&diff.changed, 'C')] {
        for path in bucket.keys() {
            let line = format!("  {marker} {path}");
            if staged.contains(path) {
                staged_lines.push(line);
            } else {
                unstaged_lines.push(line);
            }
        }
    }
    for path in &diff.deleted {
        let line = format!("  D {path}");
        if staged.contains(path) {
            staged_lines.push(line);
        } else {
            unstaged_lines.push(line);
        }
    }

    let mut result = Vec::new();
    if !staged_lines.is_empty() {
        result.push("Staged for commit:".to_string());
        result.extend(staged_lines);
    }
    if !unstaged_lines.is_empty() {
        if !result.is_empty() {
            result.push(String::new());
        }
        result.push("Not staged for commit:".to_string());
        result.extend(unstaged_lines);
    }
    result
}

fn cmd_add(root: &Path, paths: &[String]) -> eyre::Result<()> {
    let ignore = load_ignore(root)?;
    stage::add(root, &ignore, paths)?;
    Ok(())
}

fn cmd_reset(root: &Path, paths: &[String]) -> eyre::Result<()> {
    stage::reset(root, paths)?;
    Ok(())
}

fn cmd_commit(root: &Path, message: Option<&str>) -> eyre::Result<()> {
    let ignore = load_ignore(root)?;
    commit(root, &ignore, message, &NoopProgress)?;
    Ok(())
}

fn cmd_log(root: &Path) -> eyre::Result<()> {
    let commit_store = CommitStore::open(root);
    let graph = CommitGraph::build(&commit_store)?;

    let mut commits: Vec<_> = graph.commits().collect();
    commits.sort_by_key(|c| c.timestamp);

    for entry in commits.into_iter().rev() {
        let branch = graph.branch_of(&entry.id);
        let analysis = analyze_commit_coverage(root, &entry.id)?;
        let local = analysis
            .repositories
            .iter()
            .find(|r| r.address == ".")
            .map(|r| r.coverage())
            .unwrap_or(1.0);
        let total = analysis.coverage();

        let mut line = format!(
            "{} {} B={} L={}%/R={}%",
            entry.id,
            entry.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
            branch,
            (local * 100.0).round() as i64,
            (total * 100.0).round() as i64,
        );
        if let Some(message) = &entry.message {
            line.push(' ');
            line.push_str(message);
        }
        println!("{line}");
    }
    Ok(())
}

fn cmd_checkout(root: &Path, commit_id: &str, files: &[String]) -> eyre::Result<()> {
    if !files.is_empty() {
        checkout_files(root, commit_id, files)?;
        return Ok(());
    }
    let ignore = load_ignore(root)?;
    checkout_commit(root, &ignore, commit_id, &NoopProgress)?;
    Ok(())
}

fn cmd_remotes(root: &Path) -> eyre::Result<()> {
    for remote in list_all_remotes(root)? {
        let timestamp = remote
            .last_coverage_update
            .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| " ".repeat(16));
        println!("{} {} {}", remote.remote_id, timestamp, remote.address);
    }
    Ok(())
}

fn cmd_remote_add(root: &Path, address: &str) -> eyre::Result<()> {
    add_remote(root, address)?;
    Ok(())
}

fn cmd_remote_disable(root: &Path, remote_id: &str) -> eyre::Result<()> {
    disable_remote(root, remote_id)?;
    Ok(())
}

fn cmd_remote_enable(root: &Path, remote_id: &str) -> eyre::Result<()> {
    enable_remote(root, remote_id)?;
    Ok(())
}

fn cmd_clone(cwd: &Path, address: &str) -> eyre::Result<()> {
    clone::clone_repository(cwd, address)?;
    Ok(())
}

fn cmd_send(root: &Path, address: &str) -> eyre::Result<()> {
    send_repository(root, address)?;
    Ok(())
}

fn cmd_fetch(root: &Path) -> eyre::Result<()> {
    fetch_repositories(root)?;
    Ok(())
}

fn cmd_push(root: &Path, commits: &[String], remote_ids: &[String]) -> eyre::Result<()> {
    fetch_repositories(root)?;

    let commit_ids: Vec<String> = if !commits.is_empty() {
        commits.to_vec()
    } else {
        match current_commit(root)? {
            Some(id) => vec![id],
            None => eyre::bail!("Nothing to push"),
        }
    };

    let remotes = resolve_remotes(root, remote_ids)?;
    if remotes.is_empty() {
        eyre::bail!("No remotes found");
    }

    push_commits(root, &commit_ids, &remotes)?;
    Ok(())
}

fn cmd_pull(root: &Path, commits: &[String], remote_ids: &[String]) -> eyre::Result<()> {
    let remotes = resolve_remotes(root, remote_ids)?;
    pull_commits(root, commits, &remotes)?;
    Ok(())
}

fn cmd_drop(root: &Path, commits: &[String], force: bool) -> eyre::Result<()> {
    if !force {
        fetch_repositories(root)?;
    }
    drop_mod::drop_commits(root, commits, force)?;
    Ok(())
}

fn cmd_coverage_show(root: &Path, commit_id: &str) -> eyre::Result<()> {
    let analysis = analyze_commit_coverage(root, commit_id)?;
    for repo in &analysis.repositories {
        println!(
            "{} available={} unavailable={} coverage={:.2}",
            repo.address,
            repo.files_available.len(),
            repo.files_unavailable.len(),
            repo.coverage(),
        );
    }
    println!("total coverage={:.2}", analysis.coverage());
    Ok(())
}

/// Resolve `-r/--remote` ids against the enabled remote registry. An empty
/// filter means "every enabled remote".
fn resolve_remotes(root: &Path, remote_ids: &[String]) -> eyre::Result<Vec<RemoteInfo>> {
    let enabled = list_remotes(root)?;
    if remote_ids.is_empty() {
        return Ok(enabled);
    }
    let wanted: BTreeSet<&str> = remote_ids.iter().map(String::as_str).collect();
    Ok(enabled.into_iter().filter(|r| wanted.contains(r.remote_id.as_str())).collect())
}
