//! git::system
//!
//! Production git backend.
//!
//! # Design
//!
//! Local inspection (status, branches, tags, HEAD queries) goes through
//! `git2`. Operations that touch the network or the porcelain layer (clone,
//! fetch, pull, merge, checkout) delegate to the system git binary: libgit2
//! exposes no porcelain pull/rebase, and the binary already owns transport
//! configuration and credentials, which are out of scope for this crate.
//!
//! Each subprocess call blocks until completion; callers wanting deadlines
//! wrap the engine in their own scheduler.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::core::types::CommitId;

use super::capability::{GitBackend, GitError, PullOptions, WorkingCopy};

/// The production backend. Stateless; working copies carry all state.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemGit;

impl SystemGit {
    /// Create the backend.
    pub fn new() -> Self {
        Self
    }
}

/// Run a prepared git command, returning trimmed stdout or stderr.
fn run(cmd: &mut Command) -> Result<String, String> {
    let output = cmd
        .output()
        .map_err(|e| format!("failed to execute git: {e}"))?;
    if !output.status.success() {
        return Err(String::from_utf8_lossy(&output.stderr).trim().to_string());
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Build a git command running inside `cwd`.
fn git_in(cwd: &Path) -> Command {
    let mut cmd = Command::new("git");
    cmd.current_dir(cwd);
    cmd
}

impl GitBackend for SystemGit {
    fn clone_repo(&self, url: &str, path: &Path) -> Result<Box<dyn WorkingCopy>, GitError> {
        let mut cmd = Command::new("git");
        cmd.arg("clone").arg(url).arg(path);
        run(&mut cmd).map_err(|message| GitError::CloneFailed {
            url: url.to_string(),
            message,
        })?;
        self.open(path)
    }

    fn open(&self, path: &Path) -> Result<Box<dyn WorkingCopy>, GitError> {
        let repo = git2::Repository::open(path).map_err(|err| match err.code() {
            git2::ErrorCode::NotFound => GitError::NotARepo {
                path: path.to_path_buf(),
            },
            _ => GitError::Internal {
                message: err.message().to_string(),
            },
        })?;
        Ok(Box::new(SystemWorkingCopy {
            path: path.to_path_buf(),
            repo,
        }))
    }

    fn init(&self, path: &Path) -> Result<Box<dyn WorkingCopy>, GitError> {
        git2::Repository::init(path).map_err(|err| GitError::InitFailed {
            path: path.to_path_buf(),
            message: err.message().to_string(),
        })?;
        self.open(path)
    }
}

/// A working copy backed by the filesystem.
pub struct SystemWorkingCopy {
    path: PathBuf,
    repo: git2::Repository,
}

impl SystemWorkingCopy {
    fn internal(err: git2::Error) -> GitError {
        GitError::Internal {
            message: err.message().to_string(),
        }
    }
}

impl WorkingCopy for SystemWorkingCopy {
    fn path(&self) -> &Path {
        &self.path
    }

    fn fetch(&mut self, with_tags: bool) -> Result<(), GitError> {
        let mut cmd = git_in(&self.path);
        cmd.arg("fetch");
        if with_tags {
            cmd.arg("--tags");
        }
        run(&mut cmd)
            .map(|_| ())
            .map_err(|message| GitError::FetchFailed { message })
    }

    fn checkout(&mut self, refname: &str) -> Result<(), GitError> {
        let mut cmd = git_in(&self.path);
        cmd.arg("checkout").arg(refname);
        run(&mut cmd)
            .map(|_| ())
            .map_err(|message| GitError::CheckoutFailed {
                refname: refname.to_string(),
                message,
            })
    }

    fn pull(&mut self, opts: &PullOptions) -> Result<(), GitError> {
        let detached = self.repo.head_detached().unwrap_or(false);
        let mut cmd = git_in(&self.path);
        cmd.arg("pull");
        if opts.rebase {
            cmd.arg("--rebase");
        }
        if opts.prune {
            cmd.arg("--prune");
        }
        if opts.tags {
            cmd.arg("--tags");
        }
        run(&mut cmd)
            .map(|_| ())
            .map_err(|message| GitError::PullFailed { message, detached })
    }

    fn merge(&mut self, commit: &CommitId) -> Result<(), GitError> {
        let mut cmd = git_in(&self.path);
        cmd.arg("merge").arg(commit.as_str());
        run(&mut cmd)
            .map(|_| ())
            .map_err(|message| GitError::MergeFailed {
                commit: commit.to_string(),
                message,
            })
    }

    fn has_local_changes(&self) -> Result<bool, GitError> {
        let mut opts = git2::StatusOptions::new();
        opts.include_untracked(true).include_ignored(false);
        let statuses = self
            .repo
            .statuses(Some(&mut opts))
            .map_err(Self::internal)?;
        Ok(!statuses.is_empty())
    }

    fn current_branch(&self) -> Result<String, GitError> {
        if self.repo.head_detached().map_err(Self::internal)? {
            return Ok("HEAD".to_string());
        }
        let head = self.repo.head().map_err(Self::internal)?;
        Ok(head.shorthand().unwrap_or("HEAD").to_string())
    }

    fn commit_id(&self) -> Result<CommitId, GitError> {
        let head = self.repo.head().map_err(Self::internal)?;
        let commit = head.peel_to_commit().map_err(Self::internal)?;
        CommitId::new(commit.id().to_string()).map_err(|err| GitError::Internal {
            message: err.to_string(),
        })
    }

    fn is_detached(&self) -> Result<bool, GitError> {
        self.repo.head_detached().map_err(Self::internal)
    }

    fn local_branches(&self) -> Result<Vec<String>, GitError> {
        let branches = self
            .repo
            .branches(Some(git2::BranchType::Local))
            .map_err(Self::internal)?;
        let mut names = Vec::new();
        for entry in branches {
            let (branch, _) = entry.map_err(Self::internal)?;
            if let Some(name) = branch.name().map_err(Self::internal)? {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }

    fn remote_branches(&self) -> Result<Vec<String>, GitError> {
        // `git branch -r` keeps symbolic aliases like `origin/HEAD -> origin/master`
        // in the listing; the resolver relies on seeing and skipping them.
        let mut cmd = git_in(&self.path);
        cmd.args(["branch", "-r", "--no-color"]);
        let listing = run(&mut cmd).map_err(|message| GitError::Internal { message })?;
        Ok(listing
            .lines()
            .map(|line| line.trim().trim_start_matches("* ").to_string())
            .filter(|line| !line.is_empty())
            .collect())
    }

    fn tags(&self) -> Result<Vec<String>, GitError> {
        let tags = self.repo.tag_names(None).map_err(Self::internal)?;
        Ok(tags.iter().flatten().map(|t| t.to_string()).collect())
    }
}
