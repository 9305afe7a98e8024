//! git::capability
//!
//! Capability traits and typed errors for git operations.
//!
//! # Design
//!
//! The engine depends on git abstractly. [`GitBackend`] produces working
//! copies (clone, open, init); [`WorkingCopy`] mutates and inspects one local
//! checkout. Any operation may fail, and failures are represented as a
//! distinguishable [`GitError`] value rather than a panic, so the sync state
//! machine can branch on the error category.
//!
//! # Example
//!
//! ```ignore
//! use modsync::git::{GitBackend, PullOptions, SystemGit};
//! use std::path::Path;
//!
//! let backend = SystemGit::new();
//! let mut copy = backend.open(Path::new("/var/modules/shop"))?;
//! copy.fetch(true)?;
//! copy.pull(&PullOptions::default())?;
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::types::CommitId;

/// Errors from git operations.
///
/// The categorization lets the engine distinguish expected git-state
/// conditions (a pull against a tag checkout) from real faults.
#[derive(Debug, Error)]
pub enum GitError {
    /// Path is not a valid git working copy.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was opened
        path: PathBuf,
    },

    /// Clone from the remote failed.
    #[error("clone of '{url}' failed: {message}")]
    CloneFailed {
        /// The remote URL
        url: String,
        /// Failure detail from the backend
        message: String,
    },

    /// Repository initialization failed.
    #[error("init failed at {path}: {message}")]
    InitFailed {
        /// The target path
        path: PathBuf,
        /// Failure detail from the backend
        message: String,
    },

    /// Remote-tracking refs could not be updated.
    #[error("fetch failed: {message}")]
    FetchFailed {
        /// Failure detail from the backend
        message: String,
    },

    /// Switching the working copy to a ref failed.
    #[error("checkout of '{refname}' failed: {message}")]
    CheckoutFailed {
        /// The requested branch or tag
        refname: String,
        /// Failure detail from the backend
        message: String,
    },

    /// Integrating remote changes failed.
    ///
    /// `detached` is true when the working copy was on a detached (tag)
    /// checkout, where a pull legitimately errors while the repository stays
    /// in a valid, intentional state.
    #[error("pull failed: {message}")]
    PullFailed {
        /// Failure detail from the backend
        message: String,
        /// Whether HEAD was detached when the pull ran
        detached: bool,
    },

    /// Merging a commit into the current branch failed.
    #[error("merge of {commit} failed: {message}")]
    MergeFailed {
        /// The commit being merged
        commit: String,
        /// Failure detail from the backend
        message: String,
    },

    /// Permission or filesystem error.
    #[error("repository access error: {message}")]
    AccessError {
        /// Description of the error
        message: String,
    },

    /// Uncategorized backend error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl GitError {
    /// True for conditions the engine may log and continue past.
    ///
    /// Fetch and pull failures do not abort a sync: the engine proceeds to
    /// re-evaluate the commit-id delta. Everything else is fatal for the
    /// operation that produced it.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            GitError::FetchFailed { .. } | GitError::PullFailed { .. }
        )
    }
}

/// Flags for a pull operation.
#[derive(Debug, Clone, Copy)]
pub struct PullOptions {
    /// Rebase local commits on top of the fetched branch.
    pub rebase: bool,
    /// Prune remote-tracking refs that no longer exist.
    pub prune: bool,
    /// Refresh tags from the remote.
    pub tags: bool,
}

impl Default for PullOptions {
    fn default() -> Self {
        Self {
            rebase: true,
            prune: true,
            tags: true,
        }
    }
}

/// Factory capability: produce working copies.
pub trait GitBackend {
    /// Clone `url` into `path` and return the resulting working copy.
    ///
    /// The backend does not create or remove parent directories; directory
    /// rollback on failure belongs to the caller.
    fn clone_repo(&self, url: &str, path: &Path) -> Result<Box<dyn WorkingCopy>, GitError>;

    /// Open an existing working copy at `path`.
    fn open(&self, path: &Path) -> Result<Box<dyn WorkingCopy>, GitError>;

    /// Initialize an empty repository at `path`.
    fn init(&self, path: &Path) -> Result<Box<dyn WorkingCopy>, GitError>;
}

/// Operations on one local working copy bound to a remote.
pub trait WorkingCopy {
    /// Path of the working copy.
    fn path(&self) -> &Path;

    /// Update remote-tracking refs; does not alter the working tree.
    fn fetch(&mut self, with_tags: bool) -> Result<(), GitError>;

    /// Switch the working copy to `refname` (branch or tag).
    fn checkout(&mut self, refname: &str) -> Result<(), GitError>;

    /// Integrate remote changes into the current branch.
    fn pull(&mut self, opts: &PullOptions) -> Result<(), GitError>;

    /// Merge `commit` into the current branch.
    fn merge(&mut self, commit: &CommitId) -> Result<(), GitError>;

    /// True when the working tree has uncommitted changes (untracked included).
    fn has_local_changes(&self) -> Result<bool, GitError>;

    /// Name of the current branch, or `HEAD` when detached.
    fn current_branch(&self) -> Result<String, GitError>;

    /// Commit id of the current HEAD.
    fn commit_id(&self) -> Result<CommitId, GitError>;

    /// True when HEAD is detached (tag or raw-commit checkout).
    fn is_detached(&self) -> Result<bool, GitError>;

    /// Local branch names.
    fn local_branches(&self) -> Result<Vec<String>, GitError>;

    /// Remote-tracking branch names as the remote reports them
    /// (`origin/master`, symbolic aliases like `origin/HEAD -> origin/master`
    /// included), in remote-tracking order.
    fn remote_branches(&self) -> Result<Vec<String>, GitError>;

    /// Tag names.
    fn tags(&self) -> Result<Vec<String>, GitError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recoverable_classification() {
        assert!(GitError::FetchFailed {
            message: "offline".into()
        }
        .is_recoverable());
        assert!(GitError::PullFailed {
            message: "detached".into(),
            detached: true
        }
        .is_recoverable());

        assert!(!GitError::CheckoutFailed {
            refname: "v1.0.0".into(),
            message: "conflict".into()
        }
        .is_recoverable());
        assert!(!GitError::NotARepo {
            path: PathBuf::from("/tmp/x")
        }
        .is_recoverable());
    }

    #[test]
    fn pull_options_default_to_full_refresh() {
        let opts = PullOptions::default();
        assert!(opts.rebase);
        assert!(opts.prune);
        assert!(opts.tags);
    }
}
