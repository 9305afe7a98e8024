//! core
//!
//! Domain types and configuration for module synchronization.
//!
//! # Responsibilities
//!
//! - Strong types for commits, constraints, and update strategies
//! - Manifest loading and load-time validation
//!
//! # Invariants
//!
//! - Invalid strategy values cannot be represented after deserialization
//! - A `CommitId` is always a plausible, normalized git object id

pub mod config;
pub mod types;

pub use config::{ConfigError, ModuleSpec, SyncConfig};
pub use types::{CommitId, Constraint, Strategy, TypeError, BRANCH_MARKER};
