//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`CommitId`] - Validated git object id (SHA)
//! - [`Constraint`] - Version range or `dev-` branch selector
//! - [`Strategy`] - Closed enumeration of update policies
//!
//! # Validation
//!
//! These types enforce validity at construction time. An unknown strategy
//! string fails at configuration load, never during a sync run.
//!
//! # Examples
//!
//! ```
//! use modsync::core::types::{CommitId, Constraint, Strategy};
//!
//! let commit = CommitId::new("ABC123DEF4567890ABC123DEF4567890ABC12345").unwrap();
//! assert_eq!(commit.short(7), "abc123d");
//!
//! let constraint = Constraint::new("dev-master");
//! assert!(constraint.is_branch_selector());
//!
//! assert_eq!("no-git".parse::<Strategy>().unwrap(), Strategy::NoGit);
//! assert!("yolo".parse::<Strategy>().is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Prefix marking a constraint as a branch selector rather than a version range.
pub const BRANCH_MARKER: &str = "dev-";

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid commit id: {0}")]
    InvalidCommitId(String),

    #[error("unknown strategy: {0}")]
    UnknownStrategy(String),
}

/// A validated git object id.
///
/// Commit ids are normalized to lowercase. Abbreviated ids are accepted (the
/// mock backend and `git rev-parse --short` both produce them), full SHA-1 and
/// SHA-256 ids included.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CommitId(String);

impl CommitId {
    /// Create a new validated commit id.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidCommitId` if the value is not a hex string
    /// of 4 to 64 characters.
    pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into().to_lowercase();
        if id.len() < 4 || id.len() > 64 {
            return Err(TypeError::InvalidCommitId(format!(
                "expected 4-64 hex characters, got {} in '{id}'",
                id.len()
            )));
        }
        if !id.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidCommitId(id));
        }
        Ok(Self(id))
    }

    /// Get the commit id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get an abbreviated form of the commit id.
    pub fn short(&self, len: usize) -> &str {
        &self.0[..len.min(self.0.len())]
    }
}

impl TryFrom<String> for CommitId {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<CommitId> for String {
    fn from(id: CommitId) -> Self {
        id.0
    }
}

impl std::fmt::Display for CommitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A checkout-target constraint expression.
///
/// Either a semantic-version range (`^1.1.0`, `*`) matched against tags, or a
/// branch selector prefixed with [`BRANCH_MARKER`] (`dev-master`) matched
/// against remote branches. An empty constraint means "keep the current
/// checkout as-is".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Constraint(String);

impl Constraint {
    /// Create a constraint from an expression string.
    pub fn new(expr: impl Into<String>) -> Self {
        Self(expr.into())
    }

    /// Get the raw expression.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if the constraint is empty (keep current checkout).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True if the expression carries the branch marker prefix.
    pub fn is_branch_selector(&self) -> bool {
        self.0.starts_with(BRANCH_MARKER)
    }
}

impl std::fmt::Display for Constraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Constraint {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Update policy for one sync call.
///
/// Exactly one strategy is active per sync call. It comes from external
/// configuration and is validated when the configuration is loaded; an
/// unexpected value is a deserialization error, not a runtime branch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// No checkout, no integration. The repository is left pinned as-is.
    None,

    /// Checkout the resolved target, then pull.
    #[default]
    Default,

    /// Pull only; checkout is skipped.
    Pull,

    /// Checkout the resolved target, then merge instead of pull.
    Merge,

    /// Plain file drop with no version control; all git operations skipped.
    NoGit,
}

impl Strategy {
    /// Stable configuration name of the strategy.
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::None => "none",
            Strategy::Default => "default",
            Strategy::Pull => "pull",
            Strategy::Merge => "merge",
            Strategy::NoGit => "no-git",
        }
    }

    /// True if the strategy performs a checkout of the resolved target.
    pub fn performs_checkout(&self) -> bool {
        matches!(self, Strategy::Default | Strategy::Merge)
    }

    /// True if the strategy pulls from the remote.
    pub fn performs_pull(&self) -> bool {
        matches!(self, Strategy::Default | Strategy::Pull)
    }
}

impl std::str::FromStr for Strategy {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Strategy::None),
            "default" => Ok(Strategy::Default),
            "pull" => Ok(Strategy::Pull),
            "merge" => Ok(Strategy::Merge),
            "no-git" => Ok(Strategy::NoGit),
            other => Err(TypeError::UnknownStrategy(other.to_string())),
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod commit_id {
        use super::*;

        #[test]
        fn normalizes_to_lowercase() {
            let id = CommitId::new("ABC123DEF4567890ABC123DEF4567890ABC12345").unwrap();
            assert_eq!(id.as_str(), "abc123def4567890abc123def4567890abc12345");
        }

        #[test]
        fn accepts_abbreviated_ids() {
            assert!(CommitId::new("abc123d").is_ok());
        }

        #[test]
        fn rejects_non_hex() {
            assert!(CommitId::new("not-a-sha").is_err());
            assert!(CommitId::new("").is_err());
            assert!(CommitId::new("abc").is_err());
        }

        #[test]
        fn short_clamps_to_length() {
            let id = CommitId::new("abcd12").unwrap();
            assert_eq!(id.short(4), "abcd");
            assert_eq!(id.short(40), "abcd12");
        }
    }

    mod constraint {
        use super::*;

        #[test]
        fn branch_marker_detection() {
            assert!(Constraint::new("dev-master").is_branch_selector());
            assert!(!Constraint::new("^1.1.0").is_branch_selector());
            assert!(!Constraint::new("*").is_branch_selector());
        }

        #[test]
        fn default_is_empty() {
            assert!(Constraint::default().is_empty());
        }
    }

    mod strategy {
        use super::*;

        #[test]
        fn round_trips_through_names() {
            for s in [
                Strategy::None,
                Strategy::Default,
                Strategy::Pull,
                Strategy::Merge,
                Strategy::NoGit,
            ] {
                assert_eq!(s.as_str().parse::<Strategy>().unwrap(), s);
            }
        }

        #[test]
        fn unknown_value_is_rejected() {
            let err = "rebase".parse::<Strategy>().unwrap_err();
            assert_eq!(err, TypeError::UnknownStrategy("rebase".to_string()));
        }

        #[test]
        fn deserialization_rejects_unknown_strategy() {
            let result: Result<Strategy, _> = serde_json::from_str("\"fast-forward\"");
            assert!(result.is_err());
        }

        #[test]
        fn checkout_and_pull_policy() {
            assert!(Strategy::Default.performs_checkout());
            assert!(Strategy::Merge.performs_checkout());
            assert!(!Strategy::Pull.performs_checkout());
            assert!(!Strategy::None.performs_checkout());
            assert!(!Strategy::NoGit.performs_checkout());

            assert!(Strategy::Default.performs_pull());
            assert!(Strategy::Pull.performs_pull());
            assert!(!Strategy::Merge.performs_pull());
        }
    }
}
