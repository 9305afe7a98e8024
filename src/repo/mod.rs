//! repo
//!
//! Lifecycle operations on one local working copy.
//!
//! # Design
//!
//! A [`RepositoryHandle`] is bound to exactly one path for its lifetime. It is
//! created per sync operation - opened against an existing directory or
//! produced by a clone - mutated through fetch/checkout/pull/merge, and
//! discarded afterwards. The handle tracks the `just_updated` flag: true iff
//! the commit id changed during this handle's lifetime (fresh clones count as
//! updated).
//!
//! The handle does not manage directories. Creating the target directory
//! before a clone and rolling it back on failure belongs to the engine, which
//! keeps the "no partially-created directory" invariant in one place.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::core::types::CommitId;
use crate::git::{GitBackend, GitError, PullOptions, WorkingCopy};

/// Strips the remote prefix from a remote-tracking name
/// (`origin/feature-x` -> `feature-x`).
static REMOTE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.*?/(.*)$").expect("static pattern"));

/// Observable state of a working copy.
#[derive(Debug, Clone)]
pub struct RepositoryState {
    /// Working-copy path.
    pub path: PathBuf,
    /// Current branch name, or `HEAD` when detached.
    pub branch: String,
    /// Current commit id.
    pub commit: CommitId,
    /// Uncommitted local changes present.
    pub dirty: bool,
    /// Commit id changed during this handle's lifetime.
    pub just_updated: bool,
}

/// One local working copy and its sync-visible state.
pub struct RepositoryHandle {
    path: PathBuf,
    copy: Box<dyn WorkingCopy>,
    just_updated: bool,
}

impl std::fmt::Debug for RepositoryHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositoryHandle")
            .field("path", &self.path)
            .field("just_updated", &self.just_updated)
            .finish()
    }
}

impl RepositoryHandle {
    /// Bind to an existing working copy.
    pub fn open(backend: &dyn GitBackend, path: &Path) -> Result<Self, GitError> {
        let copy = backend.open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            copy,
            just_updated: false,
        })
    }

    /// Clone `url` into `path` and bind to the result.
    ///
    /// The caller owns directory rollback if the clone fails.
    pub fn create(backend: &dyn GitBackend, url: &str, path: &Path) -> Result<Self, GitError> {
        let copy = backend.clone_repo(url, path)?;
        Ok(Self {
            path: path.to_path_buf(),
            copy,
            just_updated: false,
        })
    }

    /// Initialize an empty repository at `path` and bind to it.
    pub fn init(backend: &dyn GitBackend, path: &Path) -> Result<Self, GitError> {
        let copy = backend.init(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            copy,
            just_updated: false,
        })
    }

    /// Working-copy path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True iff the commit id changed during this handle's lifetime.
    pub fn just_updated(&self) -> bool {
        self.just_updated
    }

    /// Record that this sync changed (or created) the working copy.
    ///
    /// Sticky for the handle's lifetime: a fresh clone stays "just updated"
    /// even when a later pull moves nothing.
    pub(crate) fn mark_updated(&mut self, updated: bool) {
        self.just_updated = self.just_updated || updated;
    }

    /// Update remote-tracking refs.
    pub fn fetch(&mut self, with_tags: bool) -> Result<(), GitError> {
        self.copy.fetch(with_tags)
    }

    /// Switch the working copy to `refname`.
    pub fn checkout(&mut self, refname: &str) -> Result<(), GitError> {
        self.copy.checkout(refname)
    }

    /// Integrate remote changes into the current branch.
    pub fn pull(&mut self, opts: &PullOptions) -> Result<(), GitError> {
        self.copy.pull(opts)
    }

    /// Merge `commit` into the current branch.
    pub fn merge(&mut self, commit: &CommitId) -> Result<(), GitError> {
        self.copy.merge(commit)
    }

    /// True when the working tree has uncommitted changes.
    pub fn has_local_changes(&self) -> Result<bool, GitError> {
        self.copy.has_local_changes()
    }

    /// Current branch name, or `HEAD` when detached.
    pub fn current_branch(&self) -> Result<String, GitError> {
        self.copy.current_branch()
    }

    /// Commit id of the current HEAD.
    pub fn commit_id(&self) -> Result<CommitId, GitError> {
        self.copy.commit_id()
    }

    /// True when HEAD is detached.
    pub fn is_detached(&self) -> Result<bool, GitError> {
        self.copy.is_detached()
    }

    /// Local branch names.
    pub fn local_branches(&self) -> Result<Vec<String>, GitError> {
        self.copy.local_branches()
    }

    /// Remote-tracking branch names, in remote-tracking order.
    ///
    /// With `normalize` the remote prefix is stripped (`origin/feature-x` ->
    /// `feature-x`). Symbolic aliases keep their `->` marker either way, so
    /// the resolver can skip them.
    pub fn remote_branches(&self, normalize: bool) -> Result<Vec<String>, GitError> {
        let branches = self.copy.remote_branches()?;
        if !normalize {
            return Ok(branches);
        }
        Ok(branches
            .into_iter()
            .map(|name| REMOTE_PREFIX.replace(&name, "$1").into_owned())
            .collect())
    }

    /// Tag names.
    pub fn tags(&self) -> Result<Vec<String>, GitError> {
        self.copy.tags()
    }

    /// Aggregate snapshot of the working copy.
    pub fn state(&self) -> Result<RepositoryState, GitError> {
        Ok(RepositoryState {
            path: self.path.clone(),
            branch: self.current_branch()?,
            commit: self.commit_id()?,
            dirty: self.has_local_changes()?,
            just_updated: self.just_updated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::mock::{MockGit, MockOrigin};

    fn cid(s: &str) -> CommitId {
        CommitId::new(s).unwrap()
    }

    fn backend() -> MockGit {
        let origin = MockOrigin::new("master", cid("aaaa1111"))
            .branch("feature-x", cid("bbbb2222"))
            .tag("v1.0.0", cid("cccc3333"));
        MockGit::new(origin)
    }

    #[test]
    fn normalization_strips_remote_prefix() {
        let backend = backend();
        let handle =
            RepositoryHandle::create(&backend, "https://example.com/shop.git", Path::new("/m/shop"))
                .unwrap();

        let raw = handle.remote_branches(false).unwrap();
        assert!(raw.contains(&"origin/feature-x".to_string()));

        let normalized = handle.remote_branches(true).unwrap();
        assert!(normalized.contains(&"feature-x".to_string()));
        assert!(normalized.contains(&"master".to_string()));
        // The alias keeps its marker so the resolver can exclude it.
        assert_eq!(normalized[0], "HEAD -> origin/master");
    }

    #[test]
    fn just_updated_is_sticky() {
        let backend = backend();
        let mut handle =
            RepositoryHandle::create(&backend, "https://example.com/shop.git", Path::new("/m/shop"))
                .unwrap();
        assert!(!handle.just_updated());

        handle.mark_updated(true);
        handle.mark_updated(false);
        assert!(handle.just_updated());
    }

    #[test]
    fn state_snapshot_reflects_working_copy() {
        let backend = backend();
        let mut handle =
            RepositoryHandle::create(&backend, "https://example.com/shop.git", Path::new("/m/shop"))
                .unwrap();
        handle.checkout("v1.0.0").unwrap();

        let state = handle.state().unwrap();
        assert_eq!(state.branch, "HEAD");
        assert_eq!(state.commit, cid("cccc3333"));
        assert!(!state.dirty);
    }

    #[test]
    fn open_fails_for_missing_repository() {
        let backend = backend();
        assert!(RepositoryHandle::open(&backend, Path::new("/m/missing")).is_err());
    }
}
