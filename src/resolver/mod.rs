//! resolver
//!
//! Pure constraint matching against tag and branch lists.
//!
//! # Design
//!
//! These functions are side-effect free. They receive the tag and branch lists
//! from a [`crate::repo::RepositoryHandle`] and decide which name, if any,
//! satisfies a constraint:
//!
//! - Version constraints (`*`, `^1.1.0`) are matched against tags under
//!   standard semver range rules; the highest satisfying tag wins.
//! - Branch selectors (`dev-master`) are matched against branches as an
//!   unanchored regular expression; the *first* match in input order wins, so
//!   callers must supply branches in a stable, meaningful order
//!   (remote-tracking order).
//!
//! Symbolic aliases such as `HEAD -> origin/master` never match.
//!
//! # Example
//!
//! ```
//! use modsync::resolver;
//!
//! let tags = vec!["v1.0.0".to_string(), "v1.2.0".to_string(), "v2.0.0".to_string()];
//! assert_eq!(
//!     resolver::find_satisfied_version(&tags, "^1.1.0"),
//!     Some("v1.2.0".to_string())
//! );
//! ```

use regex::Regex;
use semver::{Version, VersionReq};

use crate::core::types::BRANCH_MARKER;

/// Marker for symbolic branch aliases (`HEAD -> origin/master`).
const SYMBOLIC_REF_MARKER: &str = "->";

/// Parse a tag as a version, tolerating a leading `v`/`V` prefix.
fn parse_version_loose(tag: &str) -> Option<Version> {
    let trimmed = tag.trim();
    let bare = trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed);
    Version::parse(bare).ok()
}

/// Find the highest tag satisfying a semver range constraint.
///
/// Tags are sorted in descending version order; the first one satisfying the
/// constraint is returned. Malformed tags are skipped rather than raising an
/// error. Returns `None` when no tag satisfies or the constraint itself does
/// not parse as a version range.
pub fn find_satisfied_version(tags: &[String], constraint: &str) -> Option<String> {
    let req = VersionReq::parse(constraint.trim()).ok()?;

    let mut candidates: Vec<(Version, &String)> = tags
        .iter()
        .filter_map(|tag| parse_version_loose(tag).map(|v| (v, tag)))
        .collect();
    candidates.sort_by(|a, b| b.0.cmp(&a.0));

    candidates
        .into_iter()
        .find(|(version, _)| req.matches(version))
        .map(|(_, tag)| tag.clone())
}

/// Find the first branch matching a branch-selector constraint.
///
/// A leading `dev-` marker is stripped before matching. The remainder is
/// treated as an unanchored regular expression against each branch, in input
/// order. Entries containing `->` are symbolic aliases and are skipped.
/// Returns `None` when nothing matches or the pattern does not compile.
pub fn find_satisfied_branch(branches: &[String], constraint: &str) -> Option<String> {
    let pattern = constraint.strip_prefix(BRANCH_MARKER).unwrap_or(constraint);
    let re = Regex::new(pattern).ok()?;

    branches
        .iter()
        .find(|branch| !branch.contains(SYMBOLIC_REF_MARKER) && re.is_match(branch))
        .cloned()
}

/// Find the best checkout target for a constraint: tags first, then branches.
///
/// `None` means "no match"; callers treat it as "no checkout performed", not
/// as an error mid-pipeline.
pub fn find_best_tag_or_branch(
    tags: &[String],
    branches: &[String],
    constraint: &str,
) -> Option<String> {
    if let Some(tag) = find_satisfied_version(tags, constraint) {
        return Some(tag);
    }
    find_satisfied_branch(branches, constraint)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    mod find_satisfied_version {
        use super::*;

        #[test]
        fn wildcard_picks_highest() {
            let tags = list(&["v1.0.0", "v1.2.0", "v1.0.0", "v2.0.0", "v5.0.1"]);
            assert_eq!(
                find_satisfied_version(&tags, "*"),
                Some("v5.0.1".to_string())
            );
        }

        #[test]
        fn caret_range_picks_highest_in_range() {
            let tags = list(&["v1.0.0", "v1.2.0", "v1.0.0", "v2.0.0", "v5.0.1"]);
            assert_eq!(
                find_satisfied_version(&tags, "^1.1.0"),
                Some("v1.2.0".to_string())
            );
        }

        #[test]
        fn malformed_tags_are_skipped() {
            let tags = list(&["not-a-version", "v1.4.0", "release-candidate", "v1.3.0"]);
            assert_eq!(
                find_satisfied_version(&tags, "^1.0"),
                Some("v1.4.0".to_string())
            );
        }

        #[test]
        fn none_when_nothing_satisfies() {
            let tags = list(&["v1.0.0", "v1.2.0"]);
            assert_eq!(find_satisfied_version(&tags, "^3.0"), None);
            assert_eq!(find_satisfied_version(&[], "*"), None);
        }

        #[test]
        fn unparseable_constraint_is_none() {
            let tags = list(&["v1.0.0"]);
            assert_eq!(find_satisfied_version(&tags, "dev-master"), None);
        }
    }

    mod find_satisfied_branch {
        use super::*;

        #[test]
        fn branch_marker_is_stripped() {
            let branches = list(&[
                "v1.0.0",
                "v1.2.0",
                "master",
                "test_branch",
                "v1.0.0",
                "v2.0.0",
                "v5.0.1",
            ]);
            assert_eq!(
                find_satisfied_branch(&branches, "dev-master"),
                Some("master".to_string())
            );
        }

        #[test]
        fn symbolic_aliases_never_match() {
            let branches = list(&["HEAD -> origin/master", "master"]);
            assert_eq!(
                find_satisfied_branch(&branches, "dev-master"),
                Some("master".to_string())
            );

            let only_alias = list(&["HEAD -> origin/master"]);
            assert_eq!(find_satisfied_branch(&only_alias, "dev-master"), None);
        }

        #[test]
        fn first_match_wins_in_input_order() {
            let branches = list(&["feature-one", "feature-two"]);
            assert_eq!(
                find_satisfied_branch(&branches, "dev-feature"),
                Some("feature-one".to_string())
            );
        }

        #[test]
        fn pattern_is_a_regular_expression() {
            let branches = list(&["release/2024", "release/2025"]);
            assert_eq!(
                find_satisfied_branch(&branches, r"dev-release/\d+"),
                Some("release/2024".to_string())
            );
        }

        #[test]
        fn invalid_pattern_is_none() {
            let branches = list(&["master"]);
            assert_eq!(find_satisfied_branch(&branches, "dev-["), None);
        }
    }

    mod find_best_tag_or_branch {
        use super::*;

        #[test]
        fn tags_take_precedence_over_branches() {
            let tags = list(&["v1.0.0", "v1.5.0"]);
            let branches = list(&["master"]);
            assert_eq!(
                find_best_tag_or_branch(&tags, &branches, "^1.0"),
                Some("v1.5.0".to_string())
            );
        }

        #[test]
        fn falls_back_to_branches() {
            let tags = list(&["v1.0.0"]);
            let branches = list(&["master"]);
            assert_eq!(
                find_best_tag_or_branch(&tags, &branches, "dev-master"),
                Some("master".to_string())
            );
        }

        #[test]
        fn none_when_neither_matches() {
            let tags = list(&["v1.0.0"]);
            let branches = list(&["master"]);
            assert_eq!(find_best_tag_or_branch(&tags, &branches, "^9.0"), None);
        }
    }
}
