//! Service Layer Error Types
//!
//! This module defines the error type shared by `NodeService` and
//! `VersionService`. Callers branch on the variant: `VersionConflict` is the
//! only one worth retrying (after re-fetching), the rest are final.

use crate::models::{PatchStatus, ValidationError};
use thiserror::Error;

/// Service operation errors
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Entity not found by id (or it belongs to another project)
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Input rejected before touching the store
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Move would make a node its own ancestor
    #[error("Circular reference detected: {context}")]
    Cycle { context: String },

    /// Optimistic concurrency check failed
    #[error("Version conflict for document {document_id}: expected version {expected_version}, found {actual_version}")]
    VersionConflict {
        document_id: String,
        expected_version: i64,
        actual_version: i64,
    },

    /// Patch already reached a terminal status
    #[error("Patch {patch_id} already resolved ({status})")]
    AlreadyResolved {
        patch_id: String,
        status: PatchStatus,
    },

    /// Persistence failure; opaque to callers
    #[error("Store operation failed: {0}")]
    Store(#[source] anyhow::Error),
}

impl ServiceError {
    /// Create a node not found error
    pub fn node_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "Node",
            id: id.into(),
        }
    }

    pub fn document_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "Document",
            id: id.into(),
        }
    }

    pub fn revision_not_found(document_id: &str, version: i64) -> Self {
        Self::NotFound {
            entity: "Revision",
            id: format!("{}@{}", document_id, version),
        }
    }

    pub fn patch_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "Patch",
            id: id.into(),
        }
    }

    pub fn commit_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "Commit",
            id: id.into(),
        }
    }

    /// Create a circular reference error
    pub fn cycle(context: impl Into<String>) -> Self {
        Self::Cycle {
            context: context.into(),
        }
    }

    /// Create a version conflict error
    pub fn version_conflict(
        document_id: impl Into<String>,
        expected_version: i64,
        actual_version: i64,
    ) -> Self {
        Self::VersionConflict {
            document_id: document_id.into(),
            expected_version,
            actual_version,
        }
    }

    pub fn already_resolved(patch_id: impl Into<String>, status: PatchStatus) -> Self {
        Self::AlreadyResolved {
            patch_id: patch_id.into(),
            status,
        }
    }

    /// Wrap a store failure
    pub fn store(err: anyhow::Error) -> Self {
        Self::Store(err)
    }

    /// Only version conflicts can succeed on a retry with fresh data
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::VersionConflict { .. })
    }

    /// True for the empty-name rejection raised by path building
    pub fn is_empty_name(&self) -> bool {
        matches!(self, Self::Validation(ValidationError::EmptyName))
    }
}

impl From<anyhow::Error> for ServiceError {
    fn from(err: anyhow::Error) -> Self {
        Self::Store(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_version_conflicts_are_retryable() {
        assert!(ServiceError::version_conflict("d1", 1, 2).is_retryable());
        assert!(!ServiceError::node_not_found("n1").is_retryable());
        assert!(!ServiceError::cycle("loop").is_retryable());
        assert!(!ServiceError::store(anyhow::anyhow!("disk full")).is_retryable());
    }

    #[test]
    fn test_error_messages() {
        let err = ServiceError::version_conflict("d1", 3, 5);
        assert_eq!(
            err.to_string(),
            "Version conflict for document d1: expected version 3, found 5"
        );

        let err: ServiceError = ValidationError::EmptyName.into();
        assert!(err.is_empty_name());
        assert_eq!(ServiceError::patch_not_found("x").to_string(), "Patch not found: x");
    }
}
