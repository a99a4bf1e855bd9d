//! Workflow tests for VersionService
//!
//! Tests cover:
//! - Rollback as a forward commit
//! - Patch application, conflicts and terminal states
//! - Conflict detection ranges
//! - Atomic multi-document commits

#[cfg(test)]
mod tests {
    use crate::config::CoreConfig;
    use crate::db::{DomainEvent, MemoryStore, PatchStore};
    use crate::models::{
        CommitFile, ConflictResolution, LineEdit, Patch, PatchDiff, PatchStatus,
        ResolutionStrategy, ValidationError,
    };
    use crate::services::{ServiceError, VersionService};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    fn create_test_service() -> VersionService {
        let store = Arc::new(MemoryStore::new());
        VersionService::new(store.clone(), store, CoreConfig::default())
    }

    /// Patch store that hands out one held-back snapshot on the next read,
    /// as a caller would see it if it read just before another caller resolved it
    struct StalePatchReads {
        inner: Arc<MemoryStore>,
        held: Mutex<Option<Patch>>,
    }

    impl StalePatchReads {
        fn hold(&self, patch: Patch) {
            *self.held.lock().unwrap() = Some(patch);
        }
    }

    #[async_trait]
    impl PatchStore for StalePatchReads {
        async fn save_patch(&self, patch: Patch) -> anyhow::Result<Patch> {
            self.inner.save_patch(patch).await
        }

        async fn get_patch(&self, patch_id: &str) -> anyhow::Result<Option<Patch>> {
            let held = self.held.lock().unwrap().take();
            match held {
                Some(patch) => Ok(Some(patch)),
                None => self.inner.get_patch(patch_id).await,
            }
        }

        async fn update_patch_status(
            &self,
            patch_id: &str,
            from: PatchStatus,
            to: PatchStatus,
        ) -> anyhow::Result<bool> {
            self.inner.update_patch_status(patch_id, from, to).await
        }

        async fn list_patches(
            &self,
            document_id: &str,
            status: Option<PatchStatus>,
        ) -> anyhow::Result<Vec<Patch>> {
            self.inner.list_patches(document_id, status).await
        }
    }

    fn create_stale_read_service() -> (VersionService, Arc<StalePatchReads>) {
        let store = Arc::new(MemoryStore::new());
        let patches = Arc::new(StalePatchReads {
            inner: store.clone(),
            held: Mutex::new(None),
        });
        let service = VersionService::new(store, patches.clone(), CoreConfig::default());
        (service, patches)
    }

    fn resolution(document_id: &str, expected_version: i64, content: &str) -> ConflictResolution {
        ConflictResolution {
            document_id: document_id.to_string(),
            expected_version,
            strategy: ResolutionStrategy::Manual,
            merged_content: content.to_string(),
        }
    }

    /// Document "d1" in project "p1" edited up to `versions`
    async fn seed_document(service: &VersionService, versions: i64) {
        service
            .create_document("p1", Some("d1".to_string()), "A", "alice")
            .await
            .unwrap();
        let contents = ["A", "B", "C", "D", "E", "F"];
        for v in 1..versions {
            service
                .update_content_with_version("d1", "alice", "edit", contents[v as usize], v)
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_rollback_creates_new_version_with_old_content() {
        let service = create_test_service();
        seed_document(&service, 3).await;

        let rev = service
            .rollback_to_version("d1", 1, "bob", "")
            .await
            .unwrap();

        assert_eq!(rev.version_num, 4);
        assert_eq!(rev.parent_version, Some(3));
        assert_eq!(rev.content, "A");
        assert_eq!(rev.message, "rollback to version 1");

        let history = service.list_revisions("d1", 0, 0).await.unwrap();
        assert_eq!(
            history.iter().map(|r| r.content.as_str()).collect::<Vec<_>>(),
            vec!["A", "C", "B", "A"]
        );
    }

    #[tokio::test]
    async fn test_rollback_to_missing_version_is_not_found() {
        let service = create_test_service();
        seed_document(&service, 2).await;

        let err = service
            .rollback_to_version("d1", 9, "bob", "")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { entity: "Revision", .. }));
        assert_eq!(service.get_current_version("d1").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_apply_patch_at_base_version() {
        let service = create_test_service();
        seed_document(&service, 2).await;
        let mut events = service.subscribe_to_events();

        let patch = service
            .create_patch("d1", 2, PatchDiff::full("patched"), "bob", "suggestion")
            .await
            .unwrap();
        assert_eq!(patch.status, PatchStatus::Pending);

        let rev = service.apply_patch("d1", &patch.id, "carol").await.unwrap();

        assert_eq!(rev.version_num, 3);
        assert_eq!(rev.content, "patched");
        assert_eq!(rev.author_id, "carol");
        assert_eq!(rev.message, "suggestion");

        let applied = service
            .list_patches("d1", Some(PatchStatus::Applied))
            .await
            .unwrap();
        assert_eq!(applied.len(), 1);

        assert!(matches!(events.recv().await.unwrap(), DomainEvent::VersionCommitted(_)));
        match events.recv().await.unwrap() {
            DomainEvent::PatchResolved(p) => assert_eq!(p.status, PatchStatus::Applied),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_apply_stale_patch_conflicts() {
        let service = create_test_service();
        seed_document(&service, 3).await;

        let patch = service
            .create_patch("d1", 2, PatchDiff::full("late"), "bob", "late idea")
            .await
            .unwrap();

        let err = service.apply_patch("d1", &patch.id, "carol").await.unwrap_err();

        assert!(matches!(
            err,
            ServiceError::VersionConflict {
                expected_version: 2,
                actual_version: 3,
                ..
            }
        ));
        let conflicted = service
            .list_patches("d1", Some(PatchStatus::Conflicted))
            .await
            .unwrap();
        assert_eq!(conflicted.len(), 1);
        assert_eq!(service.get_current_version("d1").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_reapplying_resolved_patch_fails() {
        let service = create_test_service();
        seed_document(&service, 1).await;

        let patch = service
            .create_patch("d1", 1, PatchDiff::full("once"), "bob", "")
            .await
            .unwrap();
        service.apply_patch("d1", &patch.id, "carol").await.unwrap();

        let err = service.apply_patch("d1", &patch.id, "carol").await.unwrap_err();

        assert!(matches!(
            err,
            ServiceError::AlreadyResolved {
                status: PatchStatus::Applied,
                ..
            }
        ));
        assert_eq!(service.get_current_version("d1").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_patch_of_other_document_is_not_found() {
        let service = create_test_service();
        seed_document(&service, 1).await;
        service
            .create_document("p1", Some("d2".to_string()), "other", "alice")
            .await
            .unwrap();

        let patch = service
            .create_patch("d1", 1, PatchDiff::full("x"), "bob", "")
            .await
            .unwrap();

        let err = service.apply_patch("d2", &patch.id, "carol").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { entity: "Patch", .. }));
    }

    #[tokio::test]
    async fn test_line_edit_patch() {
        let service = create_test_service();
        service
            .create_document("p1", Some("d1".to_string()), "one\ntwo\nthree", "alice")
            .await
            .unwrap();

        let diff = PatchDiff::LineEdits {
            edits: vec![
                LineEdit::Replace {
                    line: 2,
                    text: "TWO".to_string(),
                },
                LineEdit::Insert {
                    line: 4,
                    text: "four".to_string(),
                },
                LineEdit::Delete { line: 1 },
            ],
        };
        let patch = service.create_patch("d1", 1, diff, "bob", "").await.unwrap();

        let rev = service.apply_patch("d1", &patch.id, "bob").await.unwrap();
        assert_eq!(rev.content, "TWO\nthree\nfour");
    }

    #[tokio::test]
    async fn test_unappliable_line_edit_marks_patch_conflicted() {
        let service = create_test_service();
        seed_document(&service, 1).await;

        let diff = PatchDiff::LineEdits {
            edits: vec![LineEdit::Delete { line: 5 }],
        };
        let patch = service.create_patch("d1", 1, diff, "bob", "").await.unwrap();

        let err = service.apply_patch("d1", &patch.id, "bob").await.unwrap_err();

        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::InvalidLineEdit { line: 5, .. })
        ));
        let conflicted = service
            .list_patches("d1", Some(PatchStatus::Conflicted))
            .await
            .unwrap();
        assert_eq!(conflicted.len(), 1);
        assert_eq!(service.get_current_version("d1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_detect_conflicts_lists_intervening_revisions() {
        let service = create_test_service();
        seed_document(&service, 4).await;

        let clean = service.detect_conflicts("d1", 4).await.unwrap();
        assert!(!clean.has_conflict);
        assert!(clean.conflicting_revisions.is_empty());

        let stale = service.detect_conflicts("d1", 2).await.unwrap();
        assert!(stale.has_conflict);
        assert_eq!(stale.current_version, 4);
        assert_eq!(
            stale
                .conflicting_revisions
                .iter()
                .map(|r| r.version_num)
                .collect::<Vec<_>>(),
            vec![3, 4]
        );
    }

    #[tokio::test]
    async fn test_batch_detect_conflicts() {
        let service = create_test_service();
        seed_document(&service, 2).await;
        service
            .create_document("p1", Some("d2".to_string()), "x", "alice")
            .await
            .unwrap();

        let result = service
            .batch_detect_conflicts("p1", &[("d1".to_string(), 1), ("d2".to_string(), 1)])
            .await
            .unwrap();

        assert!(result.has_conflicts);
        assert!(result.conflicts["d1"].has_conflict);
        assert!(!result.conflicts["d2"].has_conflict);
    }

    #[tokio::test]
    async fn test_create_commit_advances_all_documents() {
        let service = create_test_service();
        for id in ["a", "b"] {
            service
                .create_document("p1", Some(id.to_string()), "base", "alice")
                .await
                .unwrap();
        }

        let commit = service
            .create_commit(
                "p1",
                "alice",
                "chapter pass",
                vec![
                    CommitFile {
                        document_id: "a".to_string(),
                        expected_version: 1,
                        content: "a2".to_string(),
                    },
                    CommitFile {
                        document_id: "b".to_string(),
                        expected_version: 1,
                        content: "b2".to_string(),
                    },
                ],
            )
            .await
            .unwrap();

        assert_eq!(commit.file_count, 2);
        let (found, revisions) = service.get_commit_details("p1", &commit.id).await.unwrap();
        assert_eq!(found, commit);
        assert_eq!(revisions.len(), 2);
        assert!(revisions
            .iter()
            .all(|r| r.version_num == 2 && r.commit_id.as_deref() == Some(commit.id.as_str())));

        let listed = service.list_commits("p1", Some("alice"), 0, 0).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(service
            .list_commits("p1", Some("bob"), 0, 0)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_create_commit_is_all_or_nothing() {
        let service = create_test_service();
        for id in ["a", "b"] {
            service
                .create_document("p1", Some(id.to_string()), "base", "alice")
                .await
                .unwrap();
        }
        service
            .update_content_with_version("b", "bob", "edit", "b2", 1)
            .await
            .unwrap();

        let err = service
            .create_commit(
                "p1",
                "alice",
                "stale pass",
                vec![
                    CommitFile {
                        document_id: "a".to_string(),
                        expected_version: 1,
                        content: "a2".to_string(),
                    },
                    CommitFile {
                        document_id: "b".to_string(),
                        expected_version: 1,
                        content: "b3".to_string(),
                    },
                ],
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::VersionConflict { .. }));
        let a = service.get_document("a").await.unwrap();
        assert_eq!(a.current_version, 1);
        assert_eq!(a.content, "base");
        assert!(service.list_commits("p1", None, 0, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_commit_validates_input() {
        let service = create_test_service();
        service
            .create_document("p2", Some("foreign".to_string()), "x", "alice")
            .await
            .unwrap();

        let empty = service.create_commit("p1", "alice", "nothing", vec![]).await;
        assert!(matches!(
            empty,
            Err(ServiceError::Validation(ValidationError::EmptyCommit))
        ));

        let foreign = service
            .create_commit(
                "p1",
                "alice",
                "wrong project",
                vec![CommitFile {
                    document_id: "foreign".to_string(),
                    expected_version: 1,
                    content: "y".to_string(),
                }],
            )
            .await;
        assert!(matches!(
            foreign,
            Err(ServiceError::Validation(ValidationError::ProjectMismatch { .. }))
        ));
    }

    #[tokio::test]
    async fn test_apply_racing_a_completed_apply_is_already_resolved() {
        let (service, patches) = create_stale_read_service();
        seed_document(&service, 1).await;
        let pending = service
            .create_patch("d1", 1, PatchDiff::full("winner"), "bob", "")
            .await
            .unwrap();

        service.apply_patch("d1", &pending.id, "alice").await.unwrap();

        // The second caller read the patch while it was still pending
        patches.hold(pending.clone());
        let err = service.apply_patch("d1", &pending.id, "carol").await.unwrap_err();

        assert!(matches!(
            err,
            ServiceError::AlreadyResolved {
                status: PatchStatus::Applied,
                ..
            }
        ));
        assert!(!err.is_retryable());
        let stored = patches.inner.get_patch(&pending.id).await.unwrap().unwrap();
        assert_eq!(stored.status, PatchStatus::Applied);
        let doc = service.get_document("d1").await.unwrap();
        assert_eq!(doc.current_version, 2);
        assert_eq!(doc.content, "winner");
    }

    #[tokio::test]
    async fn test_line_edit_failure_racing_a_conflict_is_already_resolved() {
        let (service, patches) = create_stale_read_service();
        seed_document(&service, 1).await;
        let diff = PatchDiff::LineEdits {
            edits: vec![LineEdit::Delete { line: 9 }],
        };
        let pending = service.create_patch("d1", 1, diff, "bob", "").await.unwrap();

        let first = service.apply_patch("d1", &pending.id, "alice").await;
        assert!(matches!(
            first,
            Err(ServiceError::Validation(ValidationError::InvalidLineEdit { .. }))
        ));

        patches.hold(pending.clone());
        let second = service.apply_patch("d1", &pending.id, "carol").await;
        assert!(matches!(
            second,
            Err(ServiceError::AlreadyResolved {
                status: PatchStatus::Conflicted,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_list_patches_of_missing_document_is_not_found() {
        let service = create_test_service();

        let err = service.list_patches("ghost", None).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { entity: "Document", .. }));
    }

    #[tokio::test]
    async fn test_resolve_batch_conflicts_skips_documents_without_drift() {
        let service = create_test_service();
        for id in ["a", "b"] {
            service
                .create_document("p1", Some(id.to_string()), "base", "alice")
                .await
                .unwrap();
        }
        service
            .update_content_with_version("a", "bob", "edit", "bob's a", 1)
            .await
            .unwrap();

        let commit = service
            .resolve_batch_conflicts(
                "p1",
                "alice",
                "merge chapter pass",
                vec![resolution("a", 1, "merged a"), resolution("b", 1, "unused")],
            )
            .await
            .unwrap();

        assert_eq!(commit.message, "Resolve conflicts: merge chapter pass");
        assert_eq!(commit.file_count, 1);

        let a = service.get_document("a").await.unwrap();
        assert_eq!(a.current_version, 3);
        assert_eq!(a.content, "merged a");
        let b = service.get_document("b").await.unwrap();
        assert_eq!(b.current_version, 1);
        assert_eq!(b.content, "base");

        let (_, revisions) = service.get_commit_details("p1", &commit.id).await.unwrap();
        assert_eq!(revisions.len(), 1);
        assert_eq!(revisions[0].parent_version, Some(2));
    }

    #[tokio::test]
    async fn test_resolve_batch_conflicts_with_nothing_to_resolve() {
        let service = create_test_service();
        seed_document(&service, 2).await;

        let clean = service
            .resolve_batch_conflicts("p1", "alice", "noop", vec![resolution("d1", 2, "x")])
            .await;
        assert!(matches!(
            clean,
            Err(ServiceError::Validation(ValidationError::NoConflictsToResolve))
        ));

        let empty = service.resolve_batch_conflicts("p1", "alice", "noop", vec![]).await;
        assert!(matches!(
            empty,
            Err(ServiceError::Validation(ValidationError::MissingField(_)))
        ));

        let twice = service
            .resolve_batch_conflicts(
                "p1",
                "alice",
                "dup",
                vec![resolution("d1", 1, "x"), resolution("d1", 1, "y")],
            )
            .await;
        assert!(matches!(
            twice,
            Err(ServiceError::Validation(ValidationError::DuplicateDocument { .. }))
        ));

        assert_eq!(service.get_current_version("d1").await.unwrap(), 2);
        assert!(service.list_commits("p1", None, 0, 0).await.unwrap().is_empty());
    }
}
