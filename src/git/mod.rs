//! git
//!
//! Single doorway to git operations.
//!
//! # Architecture
//!
//! All git interactions flow through the [`GitBackend`] / [`WorkingCopy`]
//! capability traits. No other module touches `git2` or spawns the git binary
//! directly. This keeps the sync state machine fully unit-testable: the
//! [`mock`] backend records the exact operation sequence a sync performed.
//!
//! # Backends
//!
//! - [`SystemGit`] - the production backend. Local inspection goes through
//!   `git2`; clone/fetch/pull/merge delegate to the system git binary, which
//!   owns transport and authentication (both are out of scope here).
//! - [`mock::MockGit`] - deterministic in-memory backend for tests.
//!
//! # Error Handling
//!
//! Every operation returns a typed [`GitError`]. Errors are values, never
//! process termination; [`GitError::is_recoverable`] marks the conditions the
//! engine is allowed to continue past (fetch failures, pull failures).

pub mod capability;
pub mod mock;
pub mod system;

pub use capability::{GitBackend, GitError, PullOptions, WorkingCopy};
pub use system::SystemGit;
