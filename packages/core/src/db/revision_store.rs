//! RevisionStore Trait - Document Versions and History
//!
//! The store owns every document's `current_version` and its append-only
//! revision log. The only way to change content is [`RevisionStore::commit_version`],
//! which performs the compare-and-swap on the version field, the version bump,
//! the revision append and (optionally) the resolution of the patch being
//! applied as ONE atomic unit. A revision can therefore never be recorded
//! without the matching content update, or the other way around.

use crate::models::{Commit, Document, PatchStatus, Revision};
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

/// A conditional content update for one document
#[derive(Debug, Clone, PartialEq)]
pub struct VersionCommit {
    pub document_id: String,
    /// Commit only if the stored `current_version` equals this
    pub expected_version: i64,
    pub new_content: String,
    pub author_id: String,
    pub message: String,
    /// Patch to move from `Pending` to `Applied` in the same atomic unit
    pub resolves_patch: Option<String>,
}

impl VersionCommit {
    /// Build the revision this commit appends once the version matched
    pub fn to_revision(&self, project_id: &str, commit_id: Option<&str>) -> Revision {
        Revision {
            id: Uuid::new_v4().to_string(),
            document_id: self.document_id.clone(),
            project_id: project_id.to_string(),
            version_num: self.expected_version + 1,
            content: self.new_content.clone(),
            parent_version: Some(self.expected_version),
            author_id: self.author_id.clone(),
            message: self.message.clone(),
            commit_id: commit_id.map(str::to_string),
            created_at: Utc::now(),
        }
    }
}

/// Result of a single-document conditional commit
#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    /// Version matched; content updated, version bumped, revision appended
    Committed(Revision),
    /// Stored version differs from the expected one; nothing changed
    VersionMismatch { actual_version: i64 },
    /// No such document; nothing changed
    DocumentMissing,
    /// `resolves_patch` was set but the patch is not pending (`None` = absent); nothing changed
    PatchNotPending { status: Option<PatchStatus> },
}

/// Result of an atomic multi-document commit
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutcome {
    /// Every document advanced by one version
    Committed(Vec<Revision>),
    /// First document whose version did not match; nothing changed
    VersionMismatch {
        document_id: String,
        expected_version: i64,
        actual_version: i64,
    },
    /// First document that doesn't exist; nothing changed
    DocumentMissing { document_id: String },
}

/// Persistence operations for documents, revisions and commits
#[async_trait]
pub trait RevisionStore: Send + Sync {
    /// Insert a new document together with its initial revision
    ///
    /// # Errors
    ///
    /// Returns error if a document with the same id already exists.
    async fn create_document(&self, document: Document, initial: Revision) -> Result<Document>;

    async fn get_document(&self, document_id: &str) -> Result<Option<Document>>;

    /// Compare-and-swap on `current_version` fused with the revision append
    async fn commit_version(&self, commit: VersionCommit) -> Result<CommitOutcome>;

    async fn get_revision(&self, document_id: &str, version: i64) -> Result<Option<Revision>>;

    /// Revisions newest first
    async fn list_revisions(
        &self,
        document_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Revision>>;

    /// Revisions with `after < version_num <= up_to`, oldest first
    async fn revisions_in_range(
        &self,
        document_id: &str,
        after: i64,
        up_to: i64,
    ) -> Result<Vec<Revision>>;

    /// Apply several `VersionCommit`s and record `commit`, all or nothing
    ///
    /// `resolves_patch` is ignored for batch entries.
    async fn commit_batch(&self, commit: Commit, files: Vec<VersionCommit>)
        -> Result<BatchOutcome>;

    /// Commits of a project newest first, optionally filtered by author
    async fn list_commits(
        &self,
        project_id: &str,
        author_id: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Commit>>;

    async fn get_commit(&self, project_id: &str, commit_id: &str) -> Result<Option<Commit>>;

    /// Revisions produced by a commit, ordered by document id
    async fn revisions_for_commit(&self, commit_id: &str) -> Result<Vec<Revision>>;
}
