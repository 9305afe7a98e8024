//! Modsync - Git-backed module repository synchronization.
//!
//! Modsync keeps a set of module working copies in the git state demanded by a
//! version constraint. For each configured module it decides which tag or
//! branch satisfies the constraint, transitions the working copy into that
//! state under a configured update strategy, and reports whether the commit
//! actually changed. Repeated runs are idempotent, which makes the engine safe
//! to drive from scheduled deployment jobs.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - The ensure/update state machine and strategy policy
//! - [`core`] - Domain types and manifest configuration
//! - [`git`] - Single doorway to git: capability traits and backends
//! - [`repo`] - Lifecycle operations on one working copy
//! - [`resolver`] - Pure version/branch constraint matching
//! - [`oplog`] - Indentation-scoped diagnostic logging
//!
//! # Correctness Invariants
//!
//! 1. A failed clone leaves no partially-created directory behind
//! 2. `just_updated` is reported only when the commit id actually changed
//! 3. Expected git-state conditions are values, never panics
//! 4. Update strategies are validated at configuration load, not execution

pub mod cli;
pub mod core;
pub mod engine;
pub mod git;
pub mod oplog;
pub mod repo;
pub mod resolver;
