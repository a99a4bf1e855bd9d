//! Document, Revision and Commit Structures
//!
//! A `Document` holds the live content of a file node together with its
//! `current_version`. Every successful mutation appends exactly one immutable
//! `Revision` snapshot and bumps the version by one. Revisions created by a
//! multi-document `Commit` carry the commit's id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Version assigned to a newly created document
pub const INITIAL_VERSION: i64 = 1;

/// Message recorded on the first revision of every document
pub const INITIAL_REVISION_MESSAGE: &str = "initial version";

/// Live content of a document and its optimistic-concurrency counter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub project_id: String,
    pub content: String,
    /// Monotonic version, starts at 1, bumped by exactly 1 per mutation
    pub current_version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub fn new(id: String, project_id: String, content: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            project_id,
            content,
            current_version: INITIAL_VERSION,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Immutable content snapshot in a document's append-only history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Revision {
    pub id: String,
    pub document_id: String,
    pub project_id: String,
    pub version_num: i64,
    pub content: String,
    /// Version this revision was derived from (`None` for the initial revision)
    pub parent_version: Option<i64>,
    pub author_id: String,
    pub message: String,
    /// Commit that produced this revision, if it was part of a batch
    pub commit_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Revision {
    /// The version-1 revision recorded when a document is created
    pub fn initial(document: &Document, author_id: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            document_id: document.id.clone(),
            project_id: document.project_id.clone(),
            version_num: document.current_version,
            content: document.content.clone(),
            parent_version: None,
            author_id,
            message: INITIAL_REVISION_MESSAGE.to_string(),
            commit_id: None,
            created_at: document.created_at,
        }
    }
}

/// Group of revisions created atomically across several documents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commit {
    pub id: String,
    pub project_id: String,
    pub author_id: String,
    pub message: String,
    pub file_count: usize,
    pub created_at: DateTime<Utc>,
}

impl Commit {
    pub fn new(project_id: String, author_id: String, message: String, file_count: usize) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            project_id,
            author_id,
            message,
            file_count,
            created_at: Utc::now(),
        }
    }
}

/// One document's contribution to a batch commit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitFile {
    pub document_id: String,
    pub expected_version: i64,
    pub content: String,
}

/// Result of comparing a caller's expected version to the stored one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictInfo {
    pub document_id: String,
    pub has_conflict: bool,
    pub current_version: i64,
    pub expected_version: i64,
    /// Revisions in `(expected_version, current_version]`, oldest first
    pub conflicting_revisions: Vec<Revision>,
    pub last_modified: DateTime<Utc>,
}

/// Conflict report for several documents of one project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchConflictResult {
    pub project_id: String,
    pub has_conflicts: bool,
    pub conflicts: BTreeMap<String, ConflictInfo>,
}

/// How the caller produced the content that settles a conflict
///
/// Every strategy commits the caller-supplied `merged_content`; the
/// strategy is recorded for auditing and log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionStrategy {
    /// Content produced by an automatic merge tool
    Auto,
    /// Content merged by hand
    Manual,
    /// Caller's content overwrites whatever is stored
    Force,
}

impl ResolutionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionStrategy::Auto => "auto",
            ResolutionStrategy::Manual => "manual",
            ResolutionStrategy::Force => "force",
        }
    }
}

/// Resolution of one document that drifted from the version the caller edited
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictResolution {
    pub document_id: String,
    /// Version the caller's edit was based on
    pub expected_version: i64,
    pub strategy: ResolutionStrategy,
    pub merged_content: String,
}
