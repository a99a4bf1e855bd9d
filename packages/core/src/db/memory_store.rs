//! In-Memory Store
//!
//! `MemoryStore` implements [`TreeStore`], [`RevisionStore`] and [`PatchStore`]
//! over plain collections behind a single `tokio::sync::RwLock`. Every trait
//! method takes the lock once, so each call (including batches and the fused
//! version commit) is atomic with respect to every other call.
//!
//! Used by the test suites and by embedders that don't need durability.
//!
//! # Examples
//!
//! ```rust
//! use manuscript_core::db::{MemoryStore, RevisionStore, TreeStore};
//! use std::sync::Arc;
//!
//! let store = Arc::new(MemoryStore::new());
//! let tree: Arc<dyn TreeStore> = store.clone();
//! let revisions: Arc<dyn RevisionStore> = store;
//! ```

use crate::db::patch_store::PatchStore;
use crate::db::revision_store::{BatchOutcome, CommitOutcome, RevisionStore, VersionCommit};
use crate::db::tree_store::TreeStore;
use crate::models::{Commit, Document, Node, Patch, PatchStatus, Revision};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct MemoryState {
    nodes: HashMap<String, Node>,
    documents: HashMap<String, Document>,
    /// Per document, ordered by ascending `version_num`
    revisions: HashMap<String, Vec<Revision>>,
    patches: HashMap<String, Patch>,
    commits: Vec<Commit>,
}

impl MemoryState {
    fn sorted_by_path(mut nodes: Vec<Node>) -> Vec<Node> {
        nodes.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        nodes
    }

    fn apply_commit(&mut self, commit: &VersionCommit, commit_id: Option<&str>) -> Result<Revision> {
        let document = self
            .documents
            .get_mut(&commit.document_id)
            .ok_or_else(|| anyhow!("Document {} vanished during commit", commit.document_id))?;

        let revision = commit.to_revision(&document.project_id, commit_id);
        document.content = commit.new_content.clone();
        document.current_version = revision.version_num;
        document.updated_at = revision.created_at;

        self.revisions
            .entry(commit.document_id.clone())
            .or_default()
            .push(revision.clone());

        Ok(revision)
    }
}

/// Store keeping all data in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TreeStore for MemoryStore {
    async fn create_node(&self, node: Node) -> Result<Node> {
        let mut state = self.state.write().await;
        if state.nodes.contains_key(&node.id) {
            return Err(anyhow!("Node {} already exists", node.id));
        }
        state.nodes.insert(node.id.clone(), node.clone());
        Ok(node)
    }

    async fn get_node(&self, project_id: &str, node_id: &str) -> Result<Option<Node>> {
        let state = self.state.read().await;
        Ok(state
            .nodes
            .get(node_id)
            .filter(|node| node.project_id == project_id)
            .cloned())
    }

    async fn find_by_path_prefix(&self, project_id: &str, prefix: &str) -> Result<Vec<Node>> {
        let state = self.state.read().await;
        let matches = state
            .nodes
            .values()
            .filter(|node| node.project_id == project_id && node.relative_path.starts_with(prefix))
            .cloned()
            .collect();
        Ok(MemoryState::sorted_by_path(matches))
    }

    async fn get_children(&self, project_id: &str, parent_id: Option<&str>) -> Result<Vec<Node>> {
        let state = self.state.read().await;
        let mut children: Vec<Node> = state
            .nodes
            .values()
            .filter(|node| node.project_id == project_id && node.parent_id.as_deref() == parent_id)
            .cloned()
            .collect();
        children.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.name.cmp(&b.name)));
        Ok(children)
    }

    async fn list_project_nodes(&self, project_id: &str) -> Result<Vec<Node>> {
        let state = self.state.read().await;
        let nodes = state
            .nodes
            .values()
            .filter(|node| node.project_id == project_id)
            .cloned()
            .collect();
        Ok(MemoryState::sorted_by_path(nodes))
    }

    async fn save_node(&self, node: Node) -> Result<()> {
        self.save_nodes(vec![node]).await
    }

    async fn save_nodes(&self, nodes: Vec<Node>) -> Result<()> {
        let mut state = self.state.write().await;

        // Validate the whole batch before touching anything
        if let Some(missing) = nodes.iter().find(|n| !state.nodes.contains_key(&n.id)) {
            return Err(anyhow!("Node {} does not exist", missing.id));
        }

        for node in nodes {
            state.nodes.insert(node.id.clone(), node);
        }
        Ok(())
    }

    async fn delete_nodes(&self, project_id: &str, node_ids: &[String]) -> Result<usize> {
        let mut state = self.state.write().await;
        let mut removed = 0;
        for id in node_ids {
            let belongs = state
                .nodes
                .get(id)
                .is_some_and(|node| node.project_id == project_id);
            if belongs {
                state.nodes.remove(id);
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[async_trait]
impl RevisionStore for MemoryStore {
    async fn create_document(&self, document: Document, initial: Revision) -> Result<Document> {
        let mut state = self.state.write().await;
        if state.documents.contains_key(&document.id) {
            return Err(anyhow!("Document {} already exists", document.id));
        }
        state
            .revisions
            .insert(document.id.clone(), vec![initial]);
        state.documents.insert(document.id.clone(), document.clone());
        Ok(document)
    }

    async fn get_document(&self, document_id: &str) -> Result<Option<Document>> {
        let state = self.state.read().await;
        Ok(state.documents.get(document_id).cloned())
    }

    async fn commit_version(&self, commit: VersionCommit) -> Result<CommitOutcome> {
        let mut state = self.state.write().await;

        let actual_version = match state.documents.get(&commit.document_id) {
            Some(document) => document.current_version,
            None => return Ok(CommitOutcome::DocumentMissing),
        };

        if let Some(patch_id) = &commit.resolves_patch {
            let status = state
                .patches
                .get(patch_id)
                .filter(|p| p.document_id == commit.document_id)
                .map(|p| p.status);
            if status != Some(PatchStatus::Pending) {
                return Ok(CommitOutcome::PatchNotPending { status });
            }
        }

        if actual_version != commit.expected_version {
            return Ok(CommitOutcome::VersionMismatch { actual_version });
        }

        let revision = state.apply_commit(&commit, None)?;

        if let Some(patch_id) = &commit.resolves_patch {
            if let Some(patch) = state.patches.get_mut(patch_id) {
                patch.status = PatchStatus::Applied;
                patch.updated_at = revision.created_at;
            }
        }

        Ok(CommitOutcome::Committed(revision))
    }

    async fn get_revision(&self, document_id: &str, version: i64) -> Result<Option<Revision>> {
        let state = self.state.read().await;
        Ok(state
            .revisions
            .get(document_id)
            .and_then(|revs| revs.iter().find(|r| r.version_num == version))
            .cloned())
    }

    async fn list_revisions(
        &self,
        document_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Revision>> {
        let state = self.state.read().await;
        Ok(state
            .revisions
            .get(document_id)
            .map(|revs| revs.iter().rev().skip(offset).take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn revisions_in_range(
        &self,
        document_id: &str,
        after: i64,
        up_to: i64,
    ) -> Result<Vec<Revision>> {
        let state = self.state.read().await;
        Ok(state
            .revisions
            .get(document_id)
            .map(|revs| {
                revs.iter()
                    .filter(|r| r.version_num > after && r.version_num <= up_to)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn commit_batch(
        &self,
        commit: Commit,
        files: Vec<VersionCommit>,
    ) -> Result<BatchOutcome> {
        let mut state = self.state.write().await;

        // Dry run: track versions as the batch would advance them, so the same
        // document listed twice must expect the bumped version the second time.
        let mut projected: HashMap<&str, i64> = HashMap::new();
        for file in &files {
            let current = match projected.get(file.document_id.as_str()) {
                Some(version) => *version,
                None => match state.documents.get(&file.document_id) {
                    Some(document) => document.current_version,
                    None => {
                        return Ok(BatchOutcome::DocumentMissing {
                            document_id: file.document_id.clone(),
                        })
                    }
                },
            };
            if current != file.expected_version {
                return Ok(BatchOutcome::VersionMismatch {
                    document_id: file.document_id.clone(),
                    expected_version: file.expected_version,
                    actual_version: current,
                });
            }
            projected.insert(file.document_id.as_str(), current + 1);
        }

        let mut revisions = Vec::with_capacity(files.len());
        for file in &files {
            revisions.push(state.apply_commit(file, Some(&commit.id))?);
        }
        state.commits.push(commit);

        Ok(BatchOutcome::Committed(revisions))
    }

    async fn list_commits(
        &self,
        project_id: &str,
        author_id: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Commit>> {
        let state = self.state.read().await;
        let mut commits: Vec<Commit> = state
            .commits
            .iter()
            .rev()
            .filter(|c| c.project_id == project_id)
            .filter(|c| author_id.map_or(true, |author| c.author_id == author))
            .cloned()
            .collect();
        commits.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(commits.into_iter().skip(offset).take(limit).collect())
    }

    async fn get_commit(&self, project_id: &str, commit_id: &str) -> Result<Option<Commit>> {
        let state = self.state.read().await;
        Ok(state
            .commits
            .iter()
            .find(|c| c.id == commit_id && c.project_id == project_id)
            .cloned())
    }

    async fn revisions_for_commit(&self, commit_id: &str) -> Result<Vec<Revision>> {
        let state = self.state.read().await;
        let mut revisions: Vec<Revision> = state
            .revisions
            .values()
            .flatten()
            .filter(|r| r.commit_id.as_deref() == Some(commit_id))
            .cloned()
            .collect();
        revisions.sort_by(|a, b| a.document_id.cmp(&b.document_id));
        Ok(revisions)
    }
}

#[async_trait]
impl PatchStore for MemoryStore {
    async fn save_patch(&self, patch: Patch) -> Result<Patch> {
        let mut state = self.state.write().await;
        if state.patches.contains_key(&patch.id) {
            return Err(anyhow!("Patch {} already exists", patch.id));
        }
        state.patches.insert(patch.id.clone(), patch.clone());
        Ok(patch)
    }

    async fn get_patch(&self, patch_id: &str) -> Result<Option<Patch>> {
        let state = self.state.read().await;
        Ok(state.patches.get(patch_id).cloned())
    }

    async fn update_patch_status(
        &self,
        patch_id: &str,
        from: PatchStatus,
        to: PatchStatus,
    ) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.patches.get_mut(patch_id) {
            Some(patch) if patch.status == from => {
                patch.status = to;
                patch.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_patches(
        &self,
        document_id: &str,
        status: Option<PatchStatus>,
    ) -> Result<Vec<Patch>> {
        let state = self.state.read().await;
        let mut patches: Vec<Patch> = state
            .patches
            .values()
            .filter(|p| p.document_id == document_id)
            .filter(|p| status.map_or(true, |s| p.status == s))
            .cloned()
            .collect();
        patches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(patches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NodeKind;

    fn node(project: &str, parent: Option<&str>, name: &str, path: &str) -> Node {
        Node::new(
            project.to_string(),
            parent.map(str::to_string),
            name.to_string(),
            path.to_string(),
            NodeKind::Folder,
            0,
        )
    }

    #[tokio::test]
    async fn test_prefix_query_is_project_scoped() -> Result<()> {
        let store = MemoryStore::new();
        store.create_node(node("p1", None, "Vol1", "Vol1")).await?;
        store.create_node(node("p1", None, "Vol1", "Vol1/Ch1")).await?;
        store.create_node(node("p2", None, "Vol1", "Vol1/Ch1")).await?;
        store.create_node(node("p1", None, "Vol10", "Vol10/Ch1")).await?;

        let found = store.find_by_path_prefix("p1", "Vol1/").await?;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].relative_path, "Vol1/Ch1");
        assert_eq!(found[0].project_id, "p1");
        Ok(())
    }

    #[tokio::test]
    async fn test_save_nodes_is_all_or_nothing() -> Result<()> {
        let store = MemoryStore::new();
        let mut existing = store.create_node(node("p1", None, "A", "A")).await?;
        existing.name = "B".to_string();
        existing.relative_path = "B".to_string();
        let ghost = node("p1", None, "Ghost", "Ghost");

        assert!(store.save_nodes(vec![existing.clone(), ghost]).await.is_err());

        let reloaded = store.get_node("p1", &existing.id).await?.unwrap();
        assert_eq!(reloaded.name, "A");
        Ok(())
    }

    #[tokio::test]
    async fn test_commit_version_compare_and_swap() -> Result<()> {
        let store = MemoryStore::new();
        let doc = Document::new("d1".to_string(), "p1".to_string(), "v1".to_string());
        let initial = Revision::initial(&doc, "alice".to_string());
        store.create_document(doc, initial).await?;

        let commit = VersionCommit {
            document_id: "d1".to_string(),
            expected_version: 1,
            new_content: "v2".to_string(),
            author_id: "alice".to_string(),
            message: "edit".to_string(),
            resolves_patch: None,
        };

        let first = store.commit_version(commit.clone()).await?;
        assert!(matches!(first, CommitOutcome::Committed(ref r) if r.version_num == 2));

        let second = store.commit_version(commit).await?;
        assert_eq!(second, CommitOutcome::VersionMismatch { actual_version: 2 });

        let doc = store.get_document("d1").await?.unwrap();
        assert_eq!(doc.current_version, 2);
        assert_eq!(doc.content, "v2");
        assert_eq!(store.list_revisions("d1", 10, 0).await?.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_patch_status_transition_happens_once() -> Result<()> {
        let store = MemoryStore::new();
        let patch = store
            .save_patch(Patch::new(
                "d1".to_string(),
                "p1".to_string(),
                1,
                crate::models::PatchDiff::full("x"),
                "bob".to_string(),
                "msg".to_string(),
            ))
            .await?;

        assert!(
            store
                .update_patch_status(&patch.id, PatchStatus::Pending, PatchStatus::Conflicted)
                .await?
        );
        assert!(
            !store
                .update_patch_status(&patch.id, PatchStatus::Pending, PatchStatus::Applied)
                .await?
        );
        let stored = store.get_patch(&patch.id).await?.unwrap();
        assert_eq!(stored.status, PatchStatus::Conflicted);
        Ok(())
    }
}
