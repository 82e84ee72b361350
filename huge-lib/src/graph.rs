//! The in-memory commit graph (`spec.md` §9 "Cycles & references", and the
//! `log`/`heads`/`branches` command surface in §6).
//!
//! `spec.md` §9 leaves the head/branch algorithm underspecified beyond one
//! sentence each ("head = commit with no children", "branch = oldest
//! commit whose descendant set diverges"); `original_source/huge/cli.py`
//! references a `CommitInfo.branch` field that `commit.py` never actually
//! defines. We implement the stated definitions directly: a commit is a
//! *branch root* if it has no parent, or if its parent has more than one
//! child (a fork); `branch_of` walks a commit back along first parents to
//! the nearest branch root and reports that root's id as the marker.
//! Merge commits (two parents) are walked via their first parent only.

use std::collections::BTreeMap;

use crate::commit_store::{Commit, CommitStore};
use crate::Result;

/// The commit DAG, keyed by id, with a precomputed child index.
pub struct CommitGraph {
    nodes: BTreeMap<String, Commit>,
    children: BTreeMap<String, Vec<String>>,
}

impl CommitGraph {
    /// Load every commit from the store and index parent/child edges.
    pub fn build(commit_store: &CommitStore) -> Result<Self> {
        let commits = commit_store.read_all()?;
        let mut nodes = BTreeMap::new();
        let mut children: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for commit in &commits {
            children.entry(commit.id.clone()).or_default();
        }
        for commit in commits {
            for parent in &commit.parents {
                children.entry(parent.clone()).or_default().push(commit.id.clone());
            }
            nodes.insert(commit.id.clone(), commit);
        }

        Ok(Self { nodes, children })
    }

    /// All commits, by id.
    pub fn commits(&self) -> impl Iterator<Item = &Commit> {
        self.nodes.values()
    }

    /// Heads: commits with no children, the tips of each branch.
    pub fn heads(&self) -> Vec<&str> {
        self.nodes
            .keys()
            .filter(|id| self.children.get(id.as_str()).map(|c| c.is_empty()).unwrap_or(true))
            .map(String::as_str)
            .collect()
    }

    /// Branch roots: commits with no parent, or whose parent forks (has
    /// more than one child).
    pub fn branch_roots(&self) -> Vec<&str> {
        self.nodes
            .values()
            .filter(|commit| self.is_branch_root(&commit.id))
            .map(|commit| commit.id.as_str())
            .collect()
    }

    fn is_branch_root(&self, commit_id: &str) -> bool {
        let commit = match self.nodes.get(commit_id) {
            Some(c) => c,
            None => return true,
        };
        match commit.parents.first() {
            None => true,
            Some(parent) => self.children.get(parent).map(|c| c.len() > 1).unwrap_or(false),
        }
    }

    /// The branch marker for `commit_id`: the id of the nearest branch root
    /// reached by walking first parents. Falls back to `commit_id` itself
    /// if the commit is unknown or has no recorded parents.
    pub fn branch_of(&self, commit_id: &str) -> String {
        let mut current = commit_id.to_string();
        loop {
            if self.is_branch_root(&current) {
                return current;
            }
            match self.nodes.get(&current).and_then(|c| c.parents.first()) {
                Some(parent) => current = parent.clone(),
                None => return current,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ignore::IgnoreEngine;
    use crate::pipeline::commit;
    use crate::progress::NoopProgress;
    use crate::stage::add;

    #[test]
    fn a_fork_makes_both_children_their_own_branch_root() {
        let dir = tempfile::tempdir().unwrap();
        crate::repo::create_repository(dir.path()).unwrap();
        let ignore = IgnoreEngine::empty();

        std::fs::write(dir.path().join("a.txt"), b"A").unwrap();
        add(dir.path(), &ignore, &["a.txt".to_string()]).unwrap();
        let root_commit = commit(dir.path(), &ignore, None, &NoopProgress).unwrap();

        std::fs::write(dir.path().join("a.txt"), b"B").unwrap();
        add(dir.path(), &ignore, &["a.txt".to_string()]).unwrap();
        let child_b = commit(dir.path(), &ignore, None, &NoopProgress).unwrap();

        crate::checkout::checkout_commit(dir.path(), &ignore, &root_commit, &NoopProgress).unwrap();
        std::fs::write(dir.path().join("a.txt"), b"C").unwrap();
        add(dir.path(), &ignore, &["a.txt".to_string()]).unwrap();
        let child_c = commit(dir.path(), &ignore, None, &NoopProgress).unwrap();

        let store = CommitStore::open(dir.path());
        let graph = CommitGraph::build(&store).unwrap();

        let roots = graph.branch_roots();
        assert!(roots.contains(&root_commit.as_str()));
        assert!(roots.contains(&child_b.as_str()));
        assert!(roots.contains(&child_c.as_str()));

        let mut heads = graph.heads();
        heads.sort();
        let mut expected = vec![child_b.as_str(), child_c.as_str()];
        expected.sort();
        assert_eq!(heads, expected);
    }
}
