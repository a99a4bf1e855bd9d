//! Materialized Path Primitives
//!
//! Every node stores its full slash-separated path (`relative_path`) so that a
//! whole subtree can be found with a single prefix query. The functions here
//! are the only place paths are composed or rewritten; `NodeService` calls
//! them before every create, rename and move.
//!
//! # Examples
//!
//! ```rust
//! use manuscript_core::models::path::{build_path, rebase_path};
//!
//! assert_eq!(build_path("", "Vol1").unwrap(), "Vol1");
//! assert_eq!(build_path("Vol1", "Ch1").unwrap(), "Vol1/Ch1");
//!
//! let moved = rebase_path("Vol1/Ch1/Scene", "Vol1", "Book/VolumeOne");
//! assert_eq!(moved.as_deref(), Some("Book/VolumeOne/Ch1/Scene"));
//! ```

use crate::models::ValidationError;

/// Separator between path components
pub const PATH_SEPARATOR: char = '/';

/// Parent path callers may pass to mean "project root"
pub const ROOT_SENTINEL: &str = "/";

/// Compute a node's materialized path from its parent's path and its own name.
///
/// An empty `parent_path` (or the root sentinel `/`) yields the bare name.
///
/// # Errors
///
/// Returns `ValidationError::EmptyName` when `name` is empty.
pub fn build_path(parent_path: &str, name: &str) -> Result<String, ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }

    if parent_path.is_empty() || parent_path == ROOT_SENTINEL {
        Ok(name.to_string())
    } else {
        Ok(format!("{}{}{}", parent_path, PATH_SEPARATOR, name))
    }
}

/// Validate a node name before it is used as a path component.
///
/// Names must be non-empty, must not consist only of whitespace and must not
/// contain the path separator (it would split into two components).
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if name.trim().is_empty() {
        return Err(ValidationError::InvalidName {
            name: name.to_string(),
            reason: "name cannot be only whitespace".to_string(),
        });
    }
    if name.contains(PATH_SEPARATOR) {
        return Err(ValidationError::InvalidName {
            name: name.to_string(),
            reason: format!("name cannot contain '{}'", PATH_SEPARATOR),
        });
    }
    Ok(())
}

/// Prefix shared by every strict descendant of `path`.
pub fn descendant_prefix(path: &str) -> String {
    format!("{}{}", path, PATH_SEPARATOR)
}

/// Whether `candidate` lies strictly below `ancestor_path`.
pub fn is_descendant_path(candidate: &str, ancestor_path: &str) -> bool {
    candidate.starts_with(&descendant_prefix(ancestor_path))
}

/// Replace the leading `old_prefix` of `path` with `new_prefix`.
///
/// Only whole components are replaced: `"Vol10/Ch1"` is not under `"Vol1"`.
/// Returns `None` when `path` is neither `old_prefix` nor one of its descendants.
pub fn rebase_path(path: &str, old_prefix: &str, new_prefix: &str) -> Option<String> {
    if path == old_prefix {
        return Some(new_prefix.to_string());
    }
    let rest = path.strip_prefix(old_prefix)?;
    let rest = rest.strip_prefix(PATH_SEPARATOR)?;
    Some(format!("{}{}{}", new_prefix, PATH_SEPARATOR, rest))
}

/// Number of components in a materialized path (`0` for the empty path).
pub fn path_depth(path: &str) -> usize {
    if path.is_empty() {
        0
    } else {
        path.split(PATH_SEPARATOR).count()
    }
}
