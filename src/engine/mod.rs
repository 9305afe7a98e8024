//! engine
//!
//! Orchestrates repository synchronization: ensure -> fetch -> resolve ->
//! checkout -> integrate.
//!
//! # Architecture
//!
//! The engine is the policy layer on top of [`crate::repo::RepositoryHandle`].
//! Every sync walks the same state machine:
//!
//! ```text
//! ABSENT -> CLONING -> OPEN -> FETCHED -> RESOLVED -> CHECKED_OUT -> INTEGRATED -> DONE
//! ```
//!
//! with an ERROR terminal state reachable from any step. Which steps actually
//! mutate the working copy is decided by the configured [`Strategy`]; the
//! engine itself never branches on anything else.
//!
//! # Error policy
//!
//! Fetch failures and pull failures are recoverable: they are logged and the
//! engine proceeds to re-evaluate the commit-id delta. Open, clone, checkout
//! and merge failures - plus "dirty when cleanliness required" and
//! "constraint matched nothing" - fail the operation. A failed clone removes
//! the directory the engine created, so no partial state survives.
//!
//! # Concurrency
//!
//! Fully synchronous, one repository at a time. Each engine owns its
//! [`OperationLog`], so independent engines may run on independent
//! repositories in parallel; concurrent syncs of the *same* path must be
//! serialized externally.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::config::{ModuleSpec, SyncConfig};
use crate::core::types::{CommitId, Constraint, Strategy};
use crate::git::{GitBackend, GitError, PullOptions};
use crate::oplog::OperationLog;
use crate::repo::RepositoryHandle;
use crate::resolver;

/// Errors that fail a sync operation.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Target directory could not be created.
    #[error("unable to create directory {path}: {source}")]
    CreateDir {
        /// The directory
        path: PathBuf,
        /// The underlying io error
        source: std::io::Error,
    },

    /// Clone failed; the created directory has been removed.
    #[error("unable to create git repository '{url}' at '{path}'")]
    Clone {
        /// The remote URL
        url: String,
        /// The target path
        path: PathBuf,
        /// The backend failure
        #[source]
        source: GitError,
    },

    /// Existing directory is not an openable repository.
    #[error("failed to open git repository: {path}")]
    Open {
        /// The repository path
        path: PathBuf,
        /// The backend failure
        #[source]
        source: GitError,
    },

    /// Cleanliness was required but the working copy is dirty.
    #[error("git repository has changes: {path}")]
    LocalChanges {
        /// The repository path
        path: PathBuf,
    },

    /// No tag or branch satisfied the constraint.
    #[error("nothing matched to checkout with: {constraint}")]
    NoMatch {
        /// The unsatisfied constraint
        constraint: String,
    },

    /// Checkout of the resolved target failed.
    #[error("failed to checkout: {refname}")]
    Checkout {
        /// The resolved target
        refname: String,
        /// The backend failure
        #[source]
        source: GitError,
    },

    /// Merge failed.
    #[error("unable to merge commit {commit}")]
    Merge {
        /// The merge target
        commit: String,
        /// The backend failure
        #[source]
        source: GitError,
    },

    /// Unclassified backend failure (commit-id queries and similar).
    #[error(transparent)]
    Git(#[from] GitError),
}

/// Result of one successful sync.
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    /// The commit id changed (or the repository was just created).
    pub just_updated: bool,
    /// Commit id after the sync; `None` for files-only modules.
    pub commit: Option<CommitId>,
    /// The checkout target the constraint resolved to, if any.
    pub target: Option<String>,
}

impl SyncOutcome {
    /// Outcome for a sync that touched nothing.
    pub fn unchanged() -> Self {
        Self {
            just_updated: false,
            commit: None,
            target: None,
        }
    }
}

/// Per-module result of a batch sync.
#[derive(Debug)]
pub struct ModuleResult {
    /// Module name from the manifest.
    pub name: String,
    /// The sync outcome or failure.
    pub outcome: Result<SyncOutcome, SyncError>,
}

/// Results of a whole-manifest sync.
#[derive(Debug, Default)]
pub struct SyncReport {
    /// Per-module results, in manifest order.
    pub results: Vec<ModuleResult>,
}

impl SyncReport {
    /// Number of modules whose commit actually changed.
    pub fn updated(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(&r.outcome, Ok(o) if o.just_updated))
            .count()
    }

    /// Number of failed modules.
    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_err()).count()
    }

    /// True when every module synced successfully.
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}

/// The synchronization engine.
///
/// Owns a git backend and an [`OperationLog`]; create one engine per batch of
/// sync operations.
pub struct SyncEngine {
    backend: Box<dyn GitBackend>,
    log: OperationLog,
}

impl SyncEngine {
    /// Create an engine over a backend, logging through `log`.
    pub fn new(backend: Box<dyn GitBackend>, log: OperationLog) -> Self {
        Self { backend, log }
    }

    /// Open the repository at `path`, cloning it from `remote_url` first if
    /// the path does not exist.
    ///
    /// On a clone failure the directory created for it is removed, leaving no
    /// partial state. With `must_be_clean`, an existing working copy with
    /// uncommitted changes fails without being mutated.
    pub fn ensure_repository(
        &mut self,
        path: &Path,
        remote_url: &str,
        must_be_clean: bool,
    ) -> Result<RepositoryHandle, SyncError> {
        let backend = self.backend.as_ref();
        self.log
            .scoped(|log| ensure_repository_inner(backend, log, path, remote_url, must_be_clean))
    }

    /// Update an open repository to satisfy `constraint` under `strategy`.
    pub fn repository_update(
        &mut self,
        handle: &mut RepositoryHandle,
        constraint: &Constraint,
        strategy: Strategy,
        allow_remote_integration: bool,
    ) -> Result<SyncOutcome, SyncError> {
        self.log.scoped(|log| {
            repository_update_inner(log, handle, constraint, strategy, allow_remote_integration)
        })
    }

    /// Ensure and update one configured module under a single log scope.
    pub fn sync(&mut self, spec: &ModuleSpec) -> Result<SyncOutcome, SyncError> {
        let backend = self.backend.as_ref();
        let log = &mut self.log;
        log.debug(format!("syncing module '{}'", spec.name));
        log.scoped(|log| {
            if spec.strategy == Strategy::NoGit {
                log.debug("files-only module, git sync skipped");
                return Ok(SyncOutcome::unchanged());
            }
            let mut handle =
                ensure_repository_inner(backend, log, &spec.path, &spec.url, spec.must_be_clean)?;
            log.scoped(|log| {
                repository_update_inner(
                    log,
                    &mut handle,
                    &spec.constraint,
                    spec.strategy,
                    spec.allow_remote_integration,
                )
            })
        })
    }

    /// Sync every module in the manifest, continuing past per-module failures.
    pub fn sync_all(&mut self, config: &SyncConfig) -> SyncReport {
        let mut report = SyncReport::default();
        for spec in &config.modules {
            let outcome = self.sync(spec);
            if let Err(err) = &outcome {
                self.log
                    .error(format!("module '{}' failed: {err}", spec.name));
            }
            report.results.push(ModuleResult {
                name: spec.name.clone(),
                outcome,
            });
        }
        report
    }
}

fn ensure_repository_inner(
    backend: &dyn GitBackend,
    log: &mut OperationLog,
    path: &Path,
    remote_url: &str,
    must_be_clean: bool,
) -> Result<RepositoryHandle, SyncError> {
    if !path.exists() {
        log.debug(format!(
            "cloning '{remote_url}' into {}",
            path.display()
        ));
        std::fs::create_dir_all(path).map_err(|source| SyncError::CreateDir {
            path: path.to_path_buf(),
            source,
        })?;

        return match RepositoryHandle::create(backend, remote_url, path) {
            Ok(mut handle) => {
                handle.mark_updated(true);
                Ok(handle)
            }
            Err(source) => {
                log.error(format!(
                    "unable to create git repository '{remote_url}' at '{}': {source}",
                    path.display()
                ));
                // Remove the directory created for this clone so a retry
                // starts from ABSENT again.
                if let Err(err) = std::fs::remove_dir_all(path) {
                    log.warn(format!(
                        "could not remove {} after failed clone: {err}",
                        path.display()
                    ));
                }
                Err(SyncError::Clone {
                    url: remote_url.to_string(),
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
    }

    match RepositoryHandle::open(backend, path) {
        Ok(handle) => {
            if must_be_clean && handle.has_local_changes()? {
                log.error(format!("git repository has changes: {}", path.display()));
                return Err(SyncError::LocalChanges {
                    path: path.to_path_buf(),
                });
            }
            Ok(handle)
        }
        Err(source) => {
            log.error(format!("failed to open git repository: {}", path.display()));
            Err(SyncError::Open {
                path: path.to_path_buf(),
                source,
            })
        }
    }
}

fn repository_update_inner(
    log: &mut OperationLog,
    handle: &mut RepositoryHandle,
    constraint: &Constraint,
    strategy: Strategy,
    allow_remote_integration: bool,
) -> Result<SyncOutcome, SyncError> {
    let previous = handle.commit_id()?;
    log.debug(format!("commit id: {previous}"));

    // Recoverable: without fresh remote-tracking refs the sync still has the
    // local state to work against.
    if let Err(err) = handle.fetch(true) {
        log.warn(format!("fetch failed, continuing with local refs: {err}"));
    }

    let mut target = None;
    if !constraint.is_empty() {
        let tags = handle.tags()?;
        let branches = handle.remote_branches(true)?;
        target = resolver::find_best_tag_or_branch(&tags, &branches, constraint.as_str());

        match target.as_deref() {
            None => {
                log.error(format!("nothing matched to checkout with: {constraint}"));
                return Err(SyncError::NoMatch {
                    constraint: constraint.to_string(),
                });
            }
            Some(refname) if strategy.performs_checkout() => {
                log.debug(format!(
                    "trying to checkout '{}': '{refname}'",
                    handle.path().display()
                ));
                if let Err(source) = handle.checkout(refname) {
                    log.error(format!("failed to checkout: {refname}"));
                    return Err(SyncError::Checkout {
                        refname: refname.to_string(),
                        source,
                    });
                }
                log.debug("checkout ok");
            }
            Some(refname) => {
                log.debug(format!("checkout of '{refname}' skipped ({strategy})"));
            }
        }
    }

    match strategy {
        Strategy::Default | Strategy::Pull => {
            if allow_remote_integration {
                if let Err(err) = handle.pull(&PullOptions::default()) {
                    // A pull against a detached (tag) checkout is expected;
                    // anything else is logged loudly but still does not abort,
                    // the commit-id delta below decides what happened.
                    if matches!(err, GitError::PullFailed { detached: true, .. }) {
                        log.warn(format!("pull skipped on detached checkout: {err}"));
                    } else {
                        log.error(format!("pull failed: {err}"));
                    }
                }
            } else {
                log.debug("remote integration not allowed, pull skipped");
            }
        }
        Strategy::Merge => {
            let merge_commit = handle.commit_id()?;
            log.debug(format!("merging commit id: {merge_commit}"));
            if let Err(source) = handle.merge(&merge_commit) {
                log.error(format!("unable to merge commit {merge_commit}"));
                return Err(SyncError::Merge {
                    commit: merge_commit.to_string(),
                    source,
                });
            }
        }
        Strategy::None | Strategy::NoGit => {
            log.debug("no integration step for this strategy");
        }
    }

    let current = handle.commit_id()?;
    handle.mark_updated(current != previous);

    Ok(SyncOutcome {
        just_updated: handle.just_updated(),
        commit: Some(current),
        target,
    })
}
