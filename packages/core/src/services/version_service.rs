//! Version Service - Optimistic Concurrency for Document Content
//!
//! Every content change goes through one conditional store commit
//! ([`RevisionStore::commit_version`]) that only succeeds if the document is
//! still at the version the caller read. A stale caller gets
//! [`ServiceError::VersionConflict`] and is expected to re-fetch and retry;
//! nothing is ever merged silently.
//!
//! On top of that primitive the service offers rollback (a forward commit of
//! an old snapshot), patches (proposed diffs applied at most once), conflict
//! detection and atomic multi-document commits.
//!
//! # Version Invariants
//!
//! - Documents start at version 1
//! - Each successful mutation (edit, rollback, patch apply, batch commit)
//!   bumps the version by exactly 1 and appends exactly one revision
//! - Versions never decrease or skip; history is never rewritten

use crate::config::CoreConfig;
use crate::db::{BatchOutcome, CommitOutcome, DomainEvent, PatchStore, RevisionStore, VersionCommit};
use crate::models::{
    BatchConflictResult, Commit, CommitFile, ConflictInfo, ConflictResolution, Document, Patch,
    PatchDiff, PatchStatus, Revision, ValidationError,
};
use crate::services::error::ServiceError;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Service for document versions, patches and commits
///
/// # Examples
///
/// ```no_run
/// use manuscript_core::config::CoreConfig;
/// use manuscript_core::db::MemoryStore;
/// use manuscript_core::services::VersionService;
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = Arc::new(MemoryStore::new());
///     let service = VersionService::new(store.clone(), store, CoreConfig::default());
///
///     let doc = service
///         .create_document("project-1", None, "Once upon a time", "alice")
///         .await?;
///     let rev = service
///         .update_content_with_version(&doc.id, "alice", "edit", "Once upon a midnight", 1)
///         .await?;
///     assert_eq!(rev.version_num, 2);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct VersionService {
    revisions: Arc<dyn RevisionStore>,
    patches: Arc<dyn PatchStore>,
    event_tx: broadcast::Sender<DomainEvent>,
    config: CoreConfig,
}

impl VersionService {
    pub fn new(
        revisions: Arc<dyn RevisionStore>,
        patches: Arc<dyn PatchStore>,
        config: CoreConfig,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(config.event_channel_capacity.max(1));
        Self {
            revisions,
            patches,
            event_tx,
            config,
        }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Subscribe to domain events emitted after successful mutations
    pub fn subscribe_to_events(&self) -> broadcast::Receiver<DomainEvent> {
        self.event_tx.subscribe()
    }

    fn emit_event(&self, event: DomainEvent) {
        let _ = self.event_tx.send(event);
    }

    fn ensure_version(version: i64) -> Result<(), ServiceError> {
        if version < 1 {
            return Err(ValidationError::InvalidVersion(version).into());
        }
        Ok(())
    }

    fn ensure_present(field: &str, value: &str) -> Result<(), ServiceError> {
        if value.is_empty() {
            return Err(ValidationError::MissingField(field.to_string()).into());
        }
        Ok(())
    }

    /// Fetch a document or fail `NotFound`
    pub async fn get_document(&self, document_id: &str) -> Result<Document, ServiceError> {
        self.revisions
            .get_document(document_id)
            .await?
            .ok_or_else(|| ServiceError::document_not_found(document_id))
    }

    /// Run one conditional commit and translate the store's outcome
    async fn commit(&self, commit: VersionCommit) -> Result<Revision, ServiceError> {
        let document_id = commit.document_id.clone();
        let expected_version = commit.expected_version;
        let patch_id = commit.resolves_patch.clone();

        match self.revisions.commit_version(commit).await? {
            CommitOutcome::Committed(revision) => {
                tracing::info!(
                    "Document {} advanced to version {}",
                    revision.document_id,
                    revision.version_num
                );
                self.emit_event(DomainEvent::VersionCommitted(revision.clone()));
                Ok(revision)
            }
            CommitOutcome::VersionMismatch { actual_version } => {
                tracing::warn!(
                    "Version conflict on {}: expected {}, found {}",
                    document_id,
                    expected_version,
                    actual_version
                );
                Err(ServiceError::version_conflict(
                    document_id,
                    expected_version,
                    actual_version,
                ))
            }
            CommitOutcome::DocumentMissing => Err(ServiceError::document_not_found(document_id)),
            CommitOutcome::PatchNotPending { status } => {
                let patch_id = patch_id.unwrap_or_default();
                match status {
                    Some(status) => Err(ServiceError::already_resolved(patch_id, status)),
                    None => Err(ServiceError::patch_not_found(patch_id)),
                }
            }
        }
    }

    /// Create a document at version 1 together with its initial revision
    ///
    /// A UUID v4 is generated when `document_id` is `None`.
    pub async fn create_document(
        &self,
        project_id: &str,
        document_id: Option<String>,
        content: &str,
        author_id: &str,
    ) -> Result<Document, ServiceError> {
        Self::ensure_present("project_id", project_id)?;

        let id = document_id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let document = Document::new(id, project_id.to_string(), content.to_string());
        let initial = Revision::initial(&document, author_id.to_string());

        let created = self
            .revisions
            .create_document(document, initial.clone())
            .await?;

        tracing::info!("Created document {} in project {}", created.id, project_id);
        self.emit_event(DomainEvent::VersionCommitted(initial));
        Ok(created)
    }

    /// Replace the content if the document is still at `expected_version`
    ///
    /// # Errors
    ///
    /// - `VersionConflict` if another writer got there first (re-fetch and retry)
    /// - `NotFound` if the document doesn't exist
    /// - `Validation(InvalidVersion)` if `expected_version < 1`
    pub async fn update_content_with_version(
        &self,
        document_id: &str,
        author_id: &str,
        message: &str,
        new_content: &str,
        expected_version: i64,
    ) -> Result<Revision, ServiceError> {
        Self::ensure_version(expected_version)?;

        self.commit(VersionCommit {
            document_id: document_id.to_string(),
            expected_version,
            new_content: new_content.to_string(),
            author_id: author_id.to_string(),
            message: message.to_string(),
            resolves_patch: None,
        })
        .await
    }

    /// Restore the content of `target_version` as a new version
    ///
    /// History is never rewritten: rolling back from version `v` produces
    /// version `v + 1` whose content equals the target snapshot.
    pub async fn rollback_to_version(
        &self,
        document_id: &str,
        target_version: i64,
        author_id: &str,
        message: &str,
    ) -> Result<Revision, ServiceError> {
        Self::ensure_version(target_version)?;

        let target = self
            .revisions
            .get_revision(document_id, target_version)
            .await?
            .ok_or_else(|| ServiceError::revision_not_found(document_id, target_version))?;
        let current = self.get_document(document_id).await?;

        let message = if message.is_empty() {
            format!("rollback to version {}", target_version)
        } else {
            message.to_string()
        };

        tracing::debug!(
            "Rolling back {} from version {} to snapshot {}",
            document_id,
            current.current_version,
            target_version
        );

        self.commit(VersionCommit {
            document_id: document_id.to_string(),
            expected_version: current.current_version,
            new_content: target.content,
            author_id: author_id.to_string(),
            message,
            resolves_patch: None,
        })
        .await
    }

    /// Record a pending patch against `base_version`
    ///
    /// The base version is not compared to the current one here; that
    /// happens when the patch is applied.
    pub async fn create_patch(
        &self,
        document_id: &str,
        base_version: i64,
        diff: PatchDiff,
        author_id: &str,
        message: &str,
    ) -> Result<Patch, ServiceError> {
        Self::ensure_version(base_version)?;
        let document = self.get_document(document_id).await?;

        let patch = Patch::new(
            document.id,
            document.project_id,
            base_version,
            diff,
            author_id.to_string(),
            message.to_string(),
        );
        let saved = self.patches.save_patch(patch).await?;

        tracing::debug!(
            "Created {} patch {} on {}@{}",
            saved.diff.format(),
            saved.id,
            saved.document_id,
            saved.base_version
        );
        Ok(saved)
    }

    /// Move a pending patch to `Conflicted`
    ///
    /// Fails `AlreadyResolved` (or `NotFound`) when another caller resolved
    /// the patch after it was read; the caller's own failure is then moot.
    async fn mark_conflicted(&self, patch: &Patch) -> Result<(), ServiceError> {
        let transitioned = self
            .patches
            .update_patch_status(&patch.id, PatchStatus::Pending, PatchStatus::Conflicted)
            .await?;

        if !transitioned {
            return Err(self.resolved_elsewhere(&patch.id).await?);
        }

        tracing::warn!("Patch {} on {} is conflicted", patch.id, patch.document_id);
        let mut resolved = patch.clone();
        resolved.status = PatchStatus::Conflicted;
        self.emit_event(DomainEvent::PatchResolved(resolved));
        Ok(())
    }

    /// Error for a patch whose status changed under us
    async fn resolved_elsewhere(&self, patch_id: &str) -> Result<ServiceError, ServiceError> {
        let error = match self.patches.get_patch(patch_id).await? {
            Some(current) => ServiceError::already_resolved(patch_id, current.status),
            None => ServiceError::patch_not_found(patch_id),
        };
        tracing::debug!("Patch {} was resolved concurrently: {}", patch_id, error);
        Ok(error)
    }

    /// Apply a pending patch if the document is still at the patch's base version
    ///
    /// The content update, the revision append and the `Pending -> Applied`
    /// transition happen in one atomic store commit. The revision carries the
    /// patch message and the applier as author.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the patch doesn't exist or belongs to another document
    /// - `AlreadyResolved` if the patch is no longer pending, including when a
    ///   concurrent caller resolved it after this call read it
    /// - `VersionConflict` if the document moved past the base version (the
    ///   patch becomes `Conflicted`)
    /// - `Validation(InvalidLineEdit)` if the line edits don't fit the content
    ///   (the patch becomes `Conflicted`)
    pub async fn apply_patch(
        &self,
        document_id: &str,
        patch_id: &str,
        applier_id: &str,
    ) -> Result<Revision, ServiceError> {
        let patch = self
            .patches
            .get_patch(patch_id)
            .await?
            .filter(|p| p.document_id == document_id)
            .ok_or_else(|| ServiceError::patch_not_found(patch_id))?;

        if patch.status != PatchStatus::Pending {
            return Err(ServiceError::already_resolved(patch_id, patch.status));
        }

        let document = self.get_document(document_id).await?;
        if document.current_version != patch.base_version {
            self.mark_conflicted(&patch).await?;
            return Err(ServiceError::version_conflict(
                document_id,
                patch.base_version,
                document.current_version,
            ));
        }

        let new_content = match patch.diff.apply(&document.content) {
            Ok(content) => content,
            Err(e) => {
                self.mark_conflicted(&patch).await?;
                return Err(e.into());
            }
        };

        let result = self
            .commit(VersionCommit {
                document_id: document_id.to_string(),
                expected_version: patch.base_version,
                new_content,
                author_id: applier_id.to_string(),
                message: patch.message.clone(),
                resolves_patch: Some(patch.id.clone()),
            })
            .await;

        match result {
            Ok(revision) => {
                let mut applied = patch;
                applied.status = PatchStatus::Applied;
                applied.updated_at = revision.created_at;
                self.emit_event(DomainEvent::PatchResolved(applied));
                Ok(revision)
            }
            Err(err @ ServiceError::VersionConflict { .. }) => {
                // Lost the race between the version read and the commit
                self.mark_conflicted(&patch).await?;
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Revisions newest first; `limit = 0` uses the default page size
    pub async fn list_revisions(
        &self,
        document_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Revision>, ServiceError> {
        self.get_document(document_id).await?;
        let limit = self.config.revision_page_size(limit);
        Ok(self
            .revisions
            .list_revisions(document_id, limit, offset)
            .await?)
    }

    pub async fn get_revision(
        &self,
        document_id: &str,
        version: i64,
    ) -> Result<Revision, ServiceError> {
        self.revisions
            .get_revision(document_id, version)
            .await?
            .ok_or_else(|| ServiceError::revision_not_found(document_id, version))
    }

    pub async fn get_current_version(&self, document_id: &str) -> Result<i64, ServiceError> {
        Ok(self.get_document(document_id).await?.current_version)
    }

    /// Patches newest first, optionally only those in `status`
    pub async fn list_patches(
        &self,
        document_id: &str,
        status: Option<PatchStatus>,
    ) -> Result<Vec<Patch>, ServiceError> {
        self.get_document(document_id).await?;
        Ok(self.patches.list_patches(document_id, status).await?)
    }

    /// Compare a caller's expected version with the stored one
    ///
    /// On a mismatch the report lists the revisions in
    /// `(expected_version, current_version]`, oldest first.
    pub async fn detect_conflicts(
        &self,
        document_id: &str,
        expected_version: i64,
    ) -> Result<ConflictInfo, ServiceError> {
        let document = self.get_document(document_id).await?;
        self.conflict_info(document, expected_version).await
    }

    async fn conflict_info(
        &self,
        document: Document,
        expected_version: i64,
    ) -> Result<ConflictInfo, ServiceError> {
        let has_conflict = document.current_version != expected_version;
        let conflicting_revisions = if has_conflict {
            self.revisions
                .revisions_in_range(&document.id, expected_version, document.current_version)
                .await?
        } else {
            Vec::new()
        };

        Ok(ConflictInfo {
            document_id: document.id,
            has_conflict,
            current_version: document.current_version,
            expected_version,
            conflicting_revisions,
            last_modified: document.updated_at,
        })
    }

    /// Load a document and check it belongs to `project_id`
    async fn project_document(
        &self,
        project_id: &str,
        document_id: &str,
    ) -> Result<Document, ServiceError> {
        let document = self.get_document(document_id).await?;
        if document.project_id != project_id {
            return Err(ValidationError::ProjectMismatch {
                entity: "document".to_string(),
                id: document_id.to_string(),
                project_id: project_id.to_string(),
            }
            .into());
        }
        Ok(document)
    }

    /// Conflict reports for several documents of one project, keyed by document id
    pub async fn batch_detect_conflicts(
        &self,
        project_id: &str,
        files: &[(String, i64)],
    ) -> Result<BatchConflictResult, ServiceError> {
        Self::ensure_present("project_id", project_id)?;
        if files.is_empty() {
            return Err(ValidationError::MissingField("files".to_string()).into());
        }

        let mut conflicts = BTreeMap::new();
        for (document_id, expected_version) in files {
            let document = self.project_document(project_id, document_id).await?;
            let info = self.conflict_info(document, *expected_version).await?;
            conflicts.insert(document_id.clone(), info);
        }

        Ok(BatchConflictResult {
            project_id: project_id.to_string(),
            has_conflicts: conflicts.values().any(|c| c.has_conflict),
            conflicts,
        })
    }

    /// Commit new content for several documents atomically
    ///
    /// Either every document advances by one version (each new revision
    /// carries the commit id) or nothing changes.
    ///
    /// # Errors
    ///
    /// - `Validation(EmptyCommit)` for an empty file list
    /// - `Validation(ProjectMismatch)` if a document belongs to another project
    /// - `NotFound` if a document doesn't exist
    /// - `VersionConflict` for the first document whose version moved
    pub async fn create_commit(
        &self,
        project_id: &str,
        author_id: &str,
        message: &str,
        files: Vec<CommitFile>,
    ) -> Result<Commit, ServiceError> {
        Self::ensure_present("project_id", project_id)?;
        Self::ensure_present("author_id", author_id)?;
        if files.is_empty() {
            return Err(ValidationError::EmptyCommit.into());
        }

        for file in &files {
            Self::ensure_version(file.expected_version)?;
            self.project_document(project_id, &file.document_id).await?;
        }

        let commit = Commit::new(
            project_id.to_string(),
            author_id.to_string(),
            message.to_string(),
            files.len(),
        );
        let version_commits = files
            .into_iter()
            .map(|file| VersionCommit {
                document_id: file.document_id,
                expected_version: file.expected_version,
                new_content: file.content,
                author_id: author_id.to_string(),
                message: message.to_string(),
                resolves_patch: None,
            })
            .collect();

        match self
            .revisions
            .commit_batch(commit.clone(), version_commits)
            .await?
        {
            BatchOutcome::Committed(revisions) => {
                tracing::info!(
                    "Commit {} advanced {} document(s) in project {}",
                    commit.id,
                    revisions.len(),
                    project_id
                );
                for revision in revisions {
                    self.emit_event(DomainEvent::VersionCommitted(revision));
                }
                self.emit_event(DomainEvent::CommitCreated(commit.clone()));
                Ok(commit)
            }
            BatchOutcome::VersionMismatch {
                document_id,
                expected_version,
                actual_version,
            } => {
                tracing::warn!(
                    "Commit rejected: {} expected version {}, found {}",
                    document_id,
                    expected_version,
                    actual_version
                );
                Err(ServiceError::version_conflict(
                    document_id,
                    expected_version,
                    actual_version,
                ))
            }
            BatchOutcome::DocumentMissing { document_id } => {
                Err(ServiceError::document_not_found(document_id))
            }
        }
    }

    /// Settle drifted documents with caller-merged content in one commit
    ///
    /// Each resolution is re-checked against the stored version first.
    /// Documents still at `expected_version` no longer conflict and are
    /// skipped; the rest are committed at their current version with the
    /// message `"Resolve conflicts: {message}"`.
    ///
    /// # Errors
    ///
    /// - `Validation(MissingField)` for an empty resolution list
    /// - `Validation(DuplicateDocument)` if a document is listed twice
    /// - `Validation(NoConflictsToResolve)` if every document was skipped
    /// - `NotFound` / `Validation(ProjectMismatch)` as for `create_commit`
    /// - `VersionConflict` if a document moved again during the call
    pub async fn resolve_batch_conflicts(
        &self,
        project_id: &str,
        author_id: &str,
        message: &str,
        resolutions: Vec<ConflictResolution>,
    ) -> Result<Commit, ServiceError> {
        Self::ensure_present("project_id", project_id)?;
        if resolutions.is_empty() {
            return Err(ValidationError::MissingField("resolutions".to_string()).into());
        }

        let mut seen = HashSet::new();
        let mut files = Vec::with_capacity(resolutions.len());
        for resolution in resolutions {
            if !seen.insert(resolution.document_id.clone()) {
                return Err(ValidationError::DuplicateDocument {
                    document_id: resolution.document_id,
                }
                .into());
            }

            let document = self
                .project_document(project_id, &resolution.document_id)
                .await?;
            if document.current_version == resolution.expected_version {
                tracing::debug!(
                    "Skipping {}: still at version {}",
                    document.id,
                    document.current_version
                );
                continue;
            }

            tracing::debug!(
                "Resolving {} ({}) at version {}",
                document.id,
                resolution.strategy.as_str(),
                document.current_version
            );
            files.push(CommitFile {
                document_id: document.id,
                expected_version: document.current_version,
                content: resolution.merged_content,
            });
        }

        if files.is_empty() {
            return Err(ValidationError::NoConflictsToResolve.into());
        }

        self.create_commit(
            project_id,
            author_id,
            &format!("Resolve conflicts: {}", message),
            files,
        )
        .await
    }

    /// Commits of a project newest first, optionally filtered by author
    pub async fn list_commits(
        &self,
        project_id: &str,
        author_id: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Commit>, ServiceError> {
        Self::ensure_present("project_id", project_id)?;
        let author_id = author_id.filter(|a| !a.is_empty());
        let limit = self.config.revision_page_size(limit);
        Ok(self
            .revisions
            .list_commits(project_id, author_id, limit, offset)
            .await?)
    }

    /// A commit and the revisions it produced, ordered by document id
    pub async fn get_commit_details(
        &self,
        project_id: &str,
        commit_id: &str,
    ) -> Result<(Commit, Vec<Revision>), ServiceError> {
        let commit = self
            .revisions
            .get_commit(project_id, commit_id)
            .await?
            .ok_or_else(|| ServiceError::commit_not_found(commit_id))?;
        let revisions = self.revisions.revisions_for_commit(&commit.id).await?;
        Ok((commit, revisions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn create_test_service() -> VersionService {
        let store = Arc::new(MemoryStore::new());
        VersionService::new(store.clone(), store, CoreConfig::default())
    }

    #[tokio::test]
    async fn test_create_document_starts_at_version_one() {
        let service = create_test_service();

        let doc = service
            .create_document("p1", Some("d1".to_string()), "hello", "alice")
            .await
            .unwrap();

        assert_eq!(doc.current_version, 1);
        let initial = service.get_revision("d1", 1).await.unwrap();
        assert_eq!(initial.parent_version, None);
        assert_eq!(initial.message, "initial version");
        assert_eq!(initial.content, "hello");
    }

    #[tokio::test]
    async fn test_generated_document_id() {
        let service = create_test_service();
        let doc = service
            .create_document("p1", None, "", "alice")
            .await
            .unwrap();
        assert!(Uuid::parse_str(&doc.id).is_ok());
    }

    #[tokio::test]
    async fn test_update_bumps_version_by_one() {
        let service = create_test_service();
        service
            .create_document("p1", Some("d1".to_string()), "v1", "alice")
            .await
            .unwrap();

        let rev = service
            .update_content_with_version("d1", "alice", "edit", "v2", 1)
            .await
            .unwrap();

        assert_eq!(rev.version_num, 2);
        assert_eq!(rev.parent_version, Some(1));
        assert_eq!(service.get_current_version("d1").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_stale_update_conflicts() {
        let service = create_test_service();
        service
            .create_document("p1", Some("d1".to_string()), "v1", "alice")
            .await
            .unwrap();
        service
            .update_content_with_version("d1", "alice", "edit", "v2", 1)
            .await
            .unwrap();

        let err = service
            .update_content_with_version("d1", "bob", "edit", "other", 1)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ServiceError::VersionConflict {
                expected_version: 1,
                actual_version: 2,
                ..
            }
        ));
        assert!(err.is_retryable());
        let doc = service.get_document("d1").await.unwrap();
        assert_eq!(doc.content, "v2");
    }

    #[tokio::test]
    async fn test_update_missing_document_is_not_found() {
        let service = create_test_service();
        let err = service
            .update_content_with_version("nope", "alice", "edit", "x", 1)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { entity: "Document", .. }));
    }

    #[tokio::test]
    async fn test_invalid_versions_are_rejected() {
        let service = create_test_service();
        service
            .create_document("p1", Some("d1".to_string()), "v1", "alice")
            .await
            .unwrap();

        let err = service
            .rollback_to_version("d1", 0, "alice", "")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::InvalidVersion(0))
        ));

        let err = service
            .create_patch("d1", -1, PatchDiff::full("x"), "bob", "")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::InvalidVersion(-1))
        ));
    }

    #[tokio::test]
    async fn test_list_revisions_pages_newest_first() {
        let service = create_test_service();
        service
            .create_document("p1", Some("d1".to_string()), "v1", "alice")
            .await
            .unwrap();
        for version in 1..5 {
            service
                .update_content_with_version("d1", "alice", "edit", &format!("v{}", version + 1), version)
                .await
                .unwrap();
        }

        let all = service.list_revisions("d1", 0, 0).await.unwrap();
        assert_eq!(
            all.iter().map(|r| r.version_num).collect::<Vec<_>>(),
            vec![5, 4, 3, 2, 1]
        );

        let page = service.list_revisions("d1", 2, 1).await.unwrap();
        assert_eq!(
            page.iter().map(|r| r.version_num).collect::<Vec<_>>(),
            vec![4, 3]
        );
    }
}

// Patch, rollback, conflict and commit workflows in a separate module
#[cfg(test)]
#[path = "version_service_patch_test.rs"]
mod version_service_patch_test;
