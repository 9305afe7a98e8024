//! git::mock
//!
//! Mock git backend for deterministic testing.
//!
//! # Design
//!
//! The mock holds an in-memory origin (branches and tags with their commit
//! ids) plus the set of cloned working copies. It records every mutating
//! operation so tests can assert the exact sequence a sync performed, and it
//! can be configured to fail a specific operation to exercise error paths.
//!
//! The mock never touches the filesystem; directory creation and rollback
//! stay observable as the engine's own responsibility.
//!
//! # Example
//!
//! ```
//! use modsync::core::types::CommitId;
//! use modsync::git::mock::{MockGit, MockOrigin};
//! use modsync::git::GitBackend;
//! use std::path::Path;
//!
//! let origin = MockOrigin::new("master", CommitId::new("aaaa1111").unwrap())
//!     .tag("v1.0.0", CommitId::new("bbbb2222").unwrap());
//! let backend = MockGit::new(origin);
//!
//! let copy = backend
//!     .clone_repo("https://example.com/shop.git", Path::new("/tmp/shop"))
//!     .unwrap();
//! assert_eq!(copy.tags().unwrap(), vec!["v1.0.0".to_string()]);
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::core::types::CommitId;

use super::capability::{GitBackend, GitError, PullOptions, WorkingCopy};

/// The remote repository the mock clones from.
#[derive(Debug, Clone)]
pub struct MockOrigin {
    /// Branch checked out after a clone.
    pub default_branch: String,
    /// Branch names with their tips, in remote-tracking order.
    pub branches: Vec<(String, CommitId)>,
    /// Tag names with their commits.
    pub tags: Vec<(String, CommitId)>,
}

impl MockOrigin {
    /// Create an origin with a single default branch at `head`.
    pub fn new(default_branch: impl Into<String>, head: CommitId) -> Self {
        let default_branch = default_branch.into();
        Self {
            branches: vec![(default_branch.clone(), head)],
            default_branch,
            tags: Vec::new(),
        }
    }

    /// Add a branch.
    pub fn branch(mut self, name: impl Into<String>, tip: CommitId) -> Self {
        self.branches.push((name.into(), tip));
        self
    }

    /// Add a tag.
    pub fn tag(mut self, name: impl Into<String>, commit: CommitId) -> Self {
        self.tags.push((name.into(), commit));
        self
    }

    fn branch_tip(&self, name: &str) -> Option<CommitId> {
        self.branches
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c.clone())
    }

    fn tag_commit(&self, name: &str) -> Option<CommitId> {
        self.tags
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c.clone())
    }
}

/// Configuration for which operation should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOn {
    /// Fail `clone_repo`.
    Clone,
    /// Fail `open`.
    Open,
    /// Fail `fetch`.
    Fetch,
    /// Fail `checkout`.
    Checkout,
    /// Fail `pull` (also on attached checkouts).
    Pull,
    /// Fail `merge`.
    Merge,
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOp {
    Clone { url: String, path: PathBuf },
    Open { path: PathBuf },
    Init { path: PathBuf },
    Fetch { tags: bool },
    Checkout { refname: String },
    Pull { rebase: bool, prune: bool, tags: bool },
    Merge { commit: String },
}

/// One cloned working copy.
#[derive(Debug, Clone)]
struct MockRepo {
    branch: String,
    commit: Option<CommitId>,
    detached: bool,
    dirty: bool,
}

#[derive(Debug)]
struct MockState {
    origin: MockOrigin,
    repos: HashMap<PathBuf, MockRepo>,
    fail_on: Option<FailOn>,
    operations: Vec<MockOp>,
}

/// Mock git backend.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state,
/// so tests keep one handle for assertions while the engine owns another.
#[derive(Debug, Clone)]
pub struct MockGit {
    inner: Arc<Mutex<MockState>>,
}

impl MockGit {
    /// Create a backend cloning from the given origin.
    pub fn new(origin: MockOrigin) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockState {
                origin,
                repos: HashMap::new(),
                fail_on: None,
                operations: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.inner.lock().expect("mock state lock poisoned")
    }

    /// Configure one operation to fail.
    pub fn fail_on(&self, op: FailOn) {
        self.lock().fail_on = Some(op);
    }

    /// Clear a configured failure.
    pub fn clear_failure(&self) {
        self.lock().fail_on = None;
    }

    /// Pre-seed an existing working copy, as if cloned earlier.
    pub fn seed_repo(&self, path: &Path, branch: impl Into<String>, commit: CommitId) {
        self.lock().repos.insert(
            path.to_path_buf(),
            MockRepo {
                branch: branch.into(),
                commit: Some(commit),
                detached: false,
                dirty: false,
            },
        );
    }

    /// Mark a working copy as having uncommitted changes.
    pub fn set_dirty(&self, path: &Path, dirty: bool) {
        if let Some(repo) = self.lock().repos.get_mut(path) {
            repo.dirty = dirty;
        }
    }

    /// Move an origin branch tip, simulating new remote commits.
    pub fn advance_branch(&self, name: &str, tip: CommitId) {
        let mut state = self.lock();
        if let Some(entry) = state.origin.branches.iter_mut().find(|(n, _)| n == name) {
            entry.1 = tip;
        } else {
            state.origin.branches.push((name.to_string(), tip));
        }
    }

    /// Publish a new origin tag.
    pub fn add_tag(&self, name: &str, commit: CommitId) {
        self.lock().origin.tags.push((name.to_string(), commit));
    }

    /// Snapshot of all recorded operations.
    pub fn operations(&self) -> Vec<MockOp> {
        self.lock().operations.clone()
    }

    /// Current commit of a working copy, if it exists.
    pub fn commit_at(&self, path: &Path) -> Option<CommitId> {
        self.lock().repos.get(path).and_then(|r| r.commit.clone())
    }

    /// True when a working copy exists at `path`.
    pub fn has_repo(&self, path: &Path) -> bool {
        self.lock().repos.contains_key(path)
    }

    fn record(&self, op: MockOp) {
        self.lock().operations.push(op);
    }

    fn should_fail(&self, op: FailOn) -> bool {
        self.lock().fail_on == Some(op)
    }
}

impl GitBackend for MockGit {
    fn clone_repo(&self, url: &str, path: &Path) -> Result<Box<dyn WorkingCopy>, GitError> {
        self.record(MockOp::Clone {
            url: url.to_string(),
            path: path.to_path_buf(),
        });
        if self.should_fail(FailOn::Clone) {
            return Err(GitError::CloneFailed {
                url: url.to_string(),
                message: "mock clone failure".to_string(),
            });
        }
        let mut state = self.lock();
        let default_branch = state.origin.default_branch.clone();
        let head = state.origin.branch_tip(&default_branch);
        state.repos.insert(
            path.to_path_buf(),
            MockRepo {
                branch: default_branch,
                commit: head,
                detached: false,
                dirty: false,
            },
        );
        drop(state);
        Ok(Box::new(MockWorkingCopy {
            backend: self.clone(),
            path: path.to_path_buf(),
        }))
    }

    fn open(&self, path: &Path) -> Result<Box<dyn WorkingCopy>, GitError> {
        self.record(MockOp::Open {
            path: path.to_path_buf(),
        });
        if self.should_fail(FailOn::Open) || !self.has_repo(path) {
            return Err(GitError::NotARepo {
                path: path.to_path_buf(),
            });
        }
        Ok(Box::new(MockWorkingCopy {
            backend: self.clone(),
            path: path.to_path_buf(),
        }))
    }

    fn init(&self, path: &Path) -> Result<Box<dyn WorkingCopy>, GitError> {
        self.record(MockOp::Init {
            path: path.to_path_buf(),
        });
        let mut state = self.lock();
        let default_branch = state.origin.default_branch.clone();
        state.repos.insert(
            path.to_path_buf(),
            MockRepo {
                branch: default_branch,
                commit: None,
                detached: false,
                dirty: false,
            },
        );
        drop(state);
        Ok(Box::new(MockWorkingCopy {
            backend: self.clone(),
            path: path.to_path_buf(),
        }))
    }
}

/// A working copy bound to mock state.
pub struct MockWorkingCopy {
    backend: MockGit,
    path: PathBuf,
}

impl MockWorkingCopy {
    fn with_repo<T>(&self, f: impl FnOnce(&mut MockRepo, &MockOrigin) -> T) -> T {
        let mut state = self.backend.lock();
        let origin = state.origin.clone();
        let repo = state
            .repos
            .get_mut(&self.path)
            .expect("working copy no longer bound to mock state");
        f(repo, &origin)
    }
}

impl WorkingCopy for MockWorkingCopy {
    fn path(&self) -> &Path {
        &self.path
    }

    fn fetch(&mut self, with_tags: bool) -> Result<(), GitError> {
        self.backend.record(MockOp::Fetch { tags: with_tags });
        if self.backend.should_fail(FailOn::Fetch) {
            return Err(GitError::FetchFailed {
                message: "mock fetch failure".to_string(),
            });
        }
        Ok(())
    }

    fn checkout(&mut self, refname: &str) -> Result<(), GitError> {
        self.backend.record(MockOp::Checkout {
            refname: refname.to_string(),
        });
        if self.backend.should_fail(FailOn::Checkout) {
            return Err(GitError::CheckoutFailed {
                refname: refname.to_string(),
                message: "mock checkout failure".to_string(),
            });
        }
        self.with_repo(|repo, origin| {
            if let Some(commit) = origin.tag_commit(refname) {
                repo.commit = Some(commit);
                repo.detached = true;
                return Ok(());
            }
            if let Some(tip) = origin.branch_tip(refname) {
                repo.branch = refname.to_string();
                repo.commit = Some(tip);
                repo.detached = false;
                return Ok(());
            }
            Err(GitError::CheckoutFailed {
                refname: refname.to_string(),
                message: "unknown ref".to_string(),
            })
        })
    }

    fn pull(&mut self, opts: &PullOptions) -> Result<(), GitError> {
        self.backend.record(MockOp::Pull {
            rebase: opts.rebase,
            prune: opts.prune,
            tags: opts.tags,
        });
        if self.with_repo(|repo, _| repo.detached) {
            return Err(GitError::PullFailed {
                message: "you are not currently on a branch".to_string(),
                detached: true,
            });
        }
        if self.backend.should_fail(FailOn::Pull) {
            return Err(GitError::PullFailed {
                message: "mock pull failure".to_string(),
                detached: false,
            });
        }
        self.with_repo(|repo, origin| {
            if let Some(tip) = origin.branch_tip(&repo.branch) {
                repo.commit = Some(tip);
            }
        });
        Ok(())
    }

    fn merge(&mut self, commit: &CommitId) -> Result<(), GitError> {
        self.backend.record(MockOp::Merge {
            commit: commit.to_string(),
        });
        if self.backend.should_fail(FailOn::Merge) {
            return Err(GitError::MergeFailed {
                commit: commit.to_string(),
                message: "mock merge failure".to_string(),
            });
        }
        self.with_repo(|repo, _| {
            repo.commit = Some(commit.clone());
            Ok(())
        })
    }

    fn has_local_changes(&self) -> Result<bool, GitError> {
        Ok(self.with_repo(|repo, _| repo.dirty))
    }

    fn current_branch(&self) -> Result<String, GitError> {
        Ok(self.with_repo(|repo, _| {
            if repo.detached {
                "HEAD".to_string()
            } else {
                repo.branch.clone()
            }
        }))
    }

    fn commit_id(&self) -> Result<CommitId, GitError> {
        self.with_repo(|repo, _| {
            repo.commit.clone().ok_or_else(|| GitError::Internal {
                message: "unborn HEAD".to_string(),
            })
        })
    }

    fn is_detached(&self) -> Result<bool, GitError> {
        Ok(self.with_repo(|repo, _| repo.detached))
    }

    fn local_branches(&self) -> Result<Vec<String>, GitError> {
        Ok(self.with_repo(|repo, _| vec![repo.branch.clone()]))
    }

    fn remote_branches(&self) -> Result<Vec<String>, GitError> {
        let state = self.backend.lock();
        let mut listing = vec![format!(
            "origin/HEAD -> origin/{}",
            state.origin.default_branch
        )];
        listing.extend(
            state
                .origin
                .branches
                .iter()
                .map(|(name, _)| format!("origin/{name}")),
        );
        Ok(listing)
    }

    fn tags(&self) -> Result<Vec<String>, GitError> {
        let state = self.backend.lock();
        Ok(state
            .origin
            .tags
            .iter()
            .map(|(name, _)| name.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cid(s: &str) -> CommitId {
        CommitId::new(s).unwrap()
    }

    fn backend() -> MockGit {
        let origin = MockOrigin::new("master", cid("aaaa1111"))
            .branch("develop", cid("bbbb2222"))
            .tag("v1.0.0", cid("cccc3333"));
        MockGit::new(origin)
    }

    #[test]
    fn clone_lands_on_default_branch() {
        let backend = backend();
        let copy = backend
            .clone_repo("https://example.com/shop.git", Path::new("/tmp/shop"))
            .unwrap();
        assert_eq!(copy.current_branch().unwrap(), "master");
        assert_eq!(copy.commit_id().unwrap(), cid("aaaa1111"));
        assert!(!copy.is_detached().unwrap());
    }

    #[test]
    fn checkout_tag_detaches_head() {
        let backend = backend();
        let mut copy = backend
            .clone_repo("https://example.com/shop.git", Path::new("/tmp/shop"))
            .unwrap();
        copy.checkout("v1.0.0").unwrap();
        assert!(copy.is_detached().unwrap());
        assert_eq!(copy.commit_id().unwrap(), cid("cccc3333"));
        assert_eq!(copy.current_branch().unwrap(), "HEAD");
    }

    #[test]
    fn pull_on_detached_head_errors() {
        let backend = backend();
        let mut copy = backend
            .clone_repo("https://example.com/shop.git", Path::new("/tmp/shop"))
            .unwrap();
        copy.checkout("v1.0.0").unwrap();
        let err = copy.pull(&PullOptions::default()).unwrap_err();
        assert!(matches!(err, GitError::PullFailed { detached: true, .. }));
    }

    #[test]
    fn pull_advances_to_remote_tip() {
        let backend = backend();
        let mut copy = backend
            .clone_repo("https://example.com/shop.git", Path::new("/tmp/shop"))
            .unwrap();
        backend.advance_branch("master", cid("dddd4444"));
        copy.pull(&PullOptions::default()).unwrap();
        assert_eq!(copy.commit_id().unwrap(), cid("dddd4444"));
    }

    #[test]
    fn remote_listing_includes_symbolic_alias() {
        let backend = backend();
        let copy = backend
            .clone_repo("https://example.com/shop.git", Path::new("/tmp/shop"))
            .unwrap();
        let branches = copy.remote_branches().unwrap();
        assert_eq!(branches[0], "origin/HEAD -> origin/master");
        assert!(branches.contains(&"origin/master".to_string()));
        assert!(branches.contains(&"origin/develop".to_string()));
    }

    #[test]
    fn operations_are_recorded_in_order() {
        let backend = backend();
        let mut copy = backend
            .clone_repo("https://example.com/shop.git", Path::new("/tmp/shop"))
            .unwrap();
        copy.fetch(true).unwrap();
        copy.checkout("develop").unwrap();

        let ops = backend.operations();
        assert!(matches!(ops[0], MockOp::Clone { .. }));
        assert_eq!(ops[1], MockOp::Fetch { tags: true });
        assert_eq!(
            ops[2],
            MockOp::Checkout {
                refname: "develop".to_string()
            }
        );
    }

    #[test]
    fn open_of_unknown_path_fails() {
        let backend = backend();
        assert!(matches!(
            backend.open(Path::new("/tmp/nope")),
            Err(GitError::NotARepo { .. })
        ));
    }
}
