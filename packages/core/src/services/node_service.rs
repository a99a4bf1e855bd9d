//! Node Service - Content Tree Business Logic
//!
//! This module provides the core business logic layer for a project's
//! content tree:
//!
//! - Node creation under folders with unique sibling names
//! - Rename and move with cascaded materialized-path rewrites
//! - Cycle detection by walking the new parent's ancestor chain
//! - Sibling reordering, subtree deletion and tree reads
//!
//! # Path Consistency
//!
//! Every node's `relative_path` equals its parent's path joined with its own
//! name. A rename or move changes the path of the node and of every node
//! below it; the service collects all of those rewrites and hands them to
//! [`TreeStore::save_nodes`] as one atomic batch, so readers never observe a
//! half-applied cascade.
//!
//! # Concurrency
//!
//! Structural mutations hold the project's [`ProjectLocks`] entry from the
//! first read to the final write. Reads don't take the lock.

use crate::config::CoreConfig;
use crate::db::{DomainEvent, TreeStore};
use crate::models::path::{build_path, descendant_prefix, rebase_path, validate_name};
use crate::models::{normalize_parent_id, NewNode, Node, TreeEntry, ValidationError};
use crate::services::error::ServiceError;
use crate::services::project_locks::ProjectLocks;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Core service for content tree operations
///
/// # Examples
///
/// ```no_run
/// use manuscript_core::config::CoreConfig;
/// use manuscript_core::db::MemoryStore;
/// use manuscript_core::models::NewNode;
/// use manuscript_core::services::NodeService;
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let service = NodeService::new(Arc::new(MemoryStore::new()), CoreConfig::default());
///
///     let volume = service.create_node(NewNode::folder("project-1", "Vol1")).await?;
///     let chapter = service
///         .create_node(NewNode::file("project-1", "Ch1").under(&volume.id))
///         .await?;
///     assert_eq!(chapter.relative_path, "Vol1/Ch1");
///
///     service.rename_node("project-1", &volume.id, "Book").await?;
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct NodeService {
    store: Arc<dyn TreeStore>,
    locks: Arc<ProjectLocks>,
    event_tx: broadcast::Sender<DomainEvent>,
    config: CoreConfig,
}

impl NodeService {
    /// Service with its own project locks
    ///
    /// Mutations are only serialized against clones of this service. Use
    /// [`NodeService::with_locks`] when several services write one store.
    pub fn new(store: Arc<dyn TreeStore>, config: CoreConfig) -> Self {
        Self::with_locks(store, Arc::new(ProjectLocks::new()), config)
    }

    /// Service sharing `locks` with other services over the same store
    pub fn with_locks(
        store: Arc<dyn TreeStore>,
        locks: Arc<ProjectLocks>,
        config: CoreConfig,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(config.event_channel_capacity.max(1));
        Self {
            store,
            locks,
            event_tx,
            config,
        }
    }

    /// Get access to the underlying store
    pub fn store(&self) -> &Arc<dyn TreeStore> {
        &self.store
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Subscribe to domain events emitted after successful mutations
    pub fn subscribe_to_events(&self) -> broadcast::Receiver<DomainEvent> {
        self.event_tx.subscribe()
    }

    /// Ignores errors if there are no subscribers
    fn emit_event(&self, event: DomainEvent) {
        let _ = self.event_tx.send(event);
    }

    async fn load_node(&self, project_id: &str, node_id: &str) -> Result<Node, ServiceError> {
        self.store
            .get_node(project_id, node_id)
            .await?
            .ok_or_else(|| ServiceError::node_not_found(node_id))
    }

    /// Path of the given parent, or `""` at the project root
    async fn parent_path(
        &self,
        project_id: &str,
        parent_id: Option<&str>,
    ) -> Result<String, ServiceError> {
        match parent_id {
            Some(id) => Ok(self.load_node(project_id, id).await?.relative_path),
            None => Ok(String::new()),
        }
    }

    /// Reject `name` if another child of `parent_id` (other than `exclude_id`) already uses it
    async fn ensure_unique_name(
        &self,
        project_id: &str,
        parent_id: Option<&str>,
        name: &str,
        exclude_id: Option<&str>,
    ) -> Result<(), ServiceError> {
        let siblings = self.store.get_children(project_id, parent_id).await?;
        let taken = siblings
            .iter()
            .any(|s| s.name == name && Some(s.id.as_str()) != exclude_id);

        if taken {
            return Err(ValidationError::DuplicateName {
                name: name.to_string(),
                parent: parent_id.unwrap_or("project root").to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// One past the highest sibling order, 0 for an empty parent
    async fn next_order(&self, project_id: &str, parent_id: Option<&str>) -> Result<i64, ServiceError> {
        let siblings = self.store.get_children(project_id, parent_id).await?;
        Ok(siblings.iter().map(|s| s.order + 1).max().unwrap_or(0))
    }

    /// Load a prospective parent and check it can hold children
    async fn load_folder(&self, project_id: &str, parent_id: &str) -> Result<Node, ServiceError> {
        let parent = self.load_node(project_id, parent_id).await?;
        if !parent.can_have_children() {
            return Err(ValidationError::ParentNotFolder {
                parent_id: parent_id.to_string(),
            }
            .into());
        }
        Ok(parent)
    }

    /// Every strict descendant of `old_path` with its path rebased onto `new_path`
    async fn rewrite_descendants(
        &self,
        project_id: &str,
        old_path: &str,
        new_path: &str,
    ) -> Result<Vec<Node>, ServiceError> {
        let descendants = self
            .store
            .find_by_path_prefix(project_id, &descendant_prefix(old_path))
            .await?;

        let mut rewritten = Vec::with_capacity(descendants.len());
        for mut node in descendants {
            if let Some(path) = rebase_path(&node.relative_path, old_path, new_path) {
                node.relative_path = path;
                node.touch();
                rewritten.push(node);
            }
        }

        tracing::debug!(
            "Cascading '{}' -> '{}' over {} descendant(s)",
            old_path,
            new_path,
            rewritten.len()
        );
        Ok(rewritten)
    }

    /// Fail with `Cycle` if `node_id` is `start` or one of its ancestors
    ///
    /// Walks parent links upward from `start`, at most `max_tree_depth` steps.
    async fn ensure_not_ancestor(
        &self,
        project_id: &str,
        node_id: &str,
        start: &Node,
    ) -> Result<(), ServiceError> {
        let mut current = start.clone();

        for _ in 0..self.config.max_tree_depth {
            if current.id == node_id {
                return Err(ServiceError::cycle(format!(
                    "cannot move node '{}' into its own descendant '{}'",
                    node_id, start.id
                )));
            }

            match current.parent_id.as_deref() {
                None => return Ok(()),
                Some(parent_id) => match self.store.get_node(project_id, parent_id).await? {
                    Some(parent) => current = parent,
                    None => return Ok(()),
                },
            }
        }

        Err(ValidationError::TreeTooDeep {
            max_depth: self.config.max_tree_depth,
        }
        .into())
    }

    /// Create a node under a folder (or at the project root)
    ///
    /// # Errors
    ///
    /// - `Validation` for an invalid or duplicate name, or a file parent
    /// - `NotFound` if the parent doesn't exist in this project
    pub async fn create_node(&self, new_node: NewNode) -> Result<Node, ServiceError> {
        validate_name(&new_node.name)?;

        let project_id = new_node.project_id.as_str();
        let _guard = self.locks.lock(project_id).await;

        let parent_id = normalize_parent_id(new_node.parent_id.as_deref());
        let parent_path = match parent_id {
            Some(id) => self.load_folder(project_id, id).await?.relative_path,
            None => String::new(),
        };

        self.ensure_unique_name(project_id, parent_id, &new_node.name, None)
            .await?;

        let relative_path = build_path(&parent_path, &new_node.name)?;
        let order = match new_node.order {
            Some(order) => order,
            None => self.next_order(project_id, parent_id).await?,
        };

        let node = Node::new(
            new_node.project_id.clone(),
            parent_id.map(str::to_string),
            new_node.name.clone(),
            relative_path,
            new_node.kind,
            order,
        );
        let created = self.store.create_node(node).await?;

        tracing::info!(
            "Created {} '{}' in project {}",
            created.kind.as_str(),
            created.relative_path,
            created.project_id
        );
        self.emit_event(DomainEvent::NodeCreated(created.clone()));
        Ok(created)
    }

    /// Rename a node and rewrite the paths of everything below it
    ///
    /// Renaming to the current name is a no-op that returns the node unchanged.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the node doesn't exist in this project
    /// - `Validation(EmptyName)` / `Validation(InvalidName)` for a bad name
    /// - `Validation(DuplicateName)` if a sibling already has the name
    /// - `Store` if the batch write fails (nothing is changed)
    pub async fn rename_node(
        &self,
        project_id: &str,
        node_id: &str,
        new_name: &str,
    ) -> Result<Node, ServiceError> {
        let _guard = self.locks.lock(project_id).await;

        let mut node = self.load_node(project_id, node_id).await?;
        let parent_path = self
            .parent_path(project_id, node.parent_id.as_deref())
            .await?;

        validate_name(new_name)?;
        let new_path = build_path(&parent_path, new_name)?;

        if node.name == new_name {
            return Ok(node);
        }
        self.ensure_unique_name(project_id, node.parent_id.as_deref(), new_name, Some(node_id))
            .await?;

        let old_path = std::mem::replace(&mut node.relative_path, new_path.clone());
        node.name = new_name.to_string();
        node.touch();

        let descendants = self
            .rewrite_descendants(project_id, &old_path, &new_path)
            .await?;
        let descendants_updated = descendants.len();

        let mut batch = Vec::with_capacity(descendants_updated + 1);
        batch.push(node.clone());
        batch.extend(descendants);
        self.store.save_nodes(batch).await?;

        tracing::info!(
            "Renamed '{}' -> '{}' ({} descendant path(s) updated)",
            old_path,
            new_path,
            descendants_updated
        );
        self.emit_event(DomainEvent::NodeRenamed {
            node: node.clone(),
            old_path,
            descendants_updated,
        });
        Ok(node)
    }

    /// Move a node under a new parent (`None` = project root)
    ///
    /// The node is appended after its new siblings. Moving to the current
    /// parent is a no-op that returns the node unchanged.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the node or new parent doesn't exist in this project
    /// - `Cycle` if the new parent is the node itself or one of its descendants
    /// - `Validation(ParentNotFolder)` if the new parent is a file
    /// - `Validation(TreeTooDeep)` if the ancestor walk exceeds `max_tree_depth`
    /// - `Validation(DuplicateName)` if the new parent already has a child with this name
    pub async fn move_node(
        &self,
        project_id: &str,
        node_id: &str,
        new_parent_id: Option<&str>,
    ) -> Result<Node, ServiceError> {
        let _guard = self.locks.lock(project_id).await;

        let mut node = self.load_node(project_id, node_id).await?;
        let new_parent_id = normalize_parent_id(new_parent_id);

        if new_parent_id == Some(node_id) {
            return Err(ServiceError::cycle(format!(
                "cannot move node '{}' into itself",
                node_id
            )));
        }

        let new_parent_path = match new_parent_id {
            Some(parent_id) => {
                let parent = self.load_folder(project_id, parent_id).await?;
                self.ensure_not_ancestor(project_id, node_id, &parent).await?;
                parent.relative_path
            }
            None => String::new(),
        };

        if node.parent_id.as_deref() == new_parent_id {
            return Ok(node);
        }

        self.ensure_unique_name(project_id, new_parent_id, &node.name, Some(node_id))
            .await?;

        let new_path = build_path(&new_parent_path, &node.name)?;
        let order = self.next_order(project_id, new_parent_id).await?;

        let old_parent_id = node.parent_id.take();
        let old_path = std::mem::replace(&mut node.relative_path, new_path.clone());
        node.parent_id = new_parent_id.map(str::to_string);
        node.order = order;
        node.touch();

        let descendants = self
            .rewrite_descendants(project_id, &old_path, &new_path)
            .await?;
        let descendants_updated = descendants.len();

        let mut batch = Vec::with_capacity(descendants_updated + 1);
        batch.push(node.clone());
        batch.extend(descendants);
        self.store.save_nodes(batch).await?;

        tracing::info!(
            "Moved '{}' -> '{}' ({} descendant path(s) updated)",
            old_path,
            new_path,
            descendants_updated
        );
        self.emit_event(DomainEvent::NodeMoved {
            node: node.clone(),
            old_parent_id,
            old_path,
            descendants_updated,
        });
        Ok(node)
    }

    /// Assign `order = index` to each listed child of `parent_id`
    ///
    /// Children not listed keep their order. Returns the updated children.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the parent doesn't exist in this project
    /// - `Validation(NotAChild)` if an id is not a direct child of the parent
    pub async fn reorder_children(
        &self,
        project_id: &str,
        parent_id: Option<&str>,
        ordered_ids: &[String],
    ) -> Result<Vec<Node>, ServiceError> {
        let _guard = self.locks.lock(project_id).await;

        let parent_id = normalize_parent_id(parent_id);
        if let Some(id) = parent_id {
            self.load_node(project_id, id).await?;
        }

        let mut children: HashMap<String, Node> = self
            .store
            .get_children(project_id, parent_id)
            .await?
            .into_iter()
            .map(|n| (n.id.clone(), n))
            .collect();

        let mut batch = Vec::with_capacity(ordered_ids.len());
        for (index, id) in ordered_ids.iter().enumerate() {
            let mut child = children.remove(id).ok_or_else(|| ValidationError::NotAChild {
                node_id: id.clone(),
                parent: parent_id.unwrap_or("project root").to_string(),
            })?;
            child.order = index as i64;
            child.touch();
            batch.push(child);
        }

        self.store.save_nodes(batch.clone()).await?;

        tracing::debug!("Reordered {} child(ren) of {:?}", batch.len(), parent_id);
        self.emit_event(DomainEvent::NodesReordered {
            project_id: project_id.to_string(),
            parent_id: parent_id.map(str::to_string),
            ordered_ids: ordered_ids.to_vec(),
        });
        Ok(batch)
    }

    /// Delete a node and its whole subtree; returns the number of nodes removed
    pub async fn delete_node(&self, project_id: &str, node_id: &str) -> Result<usize, ServiceError> {
        let _guard = self.locks.lock(project_id).await;

        let node = self.load_node(project_id, node_id).await?;
        let descendants = self
            .store
            .find_by_path_prefix(project_id, &descendant_prefix(&node.relative_path))
            .await?;

        let mut ids = Vec::with_capacity(descendants.len() + 1);
        ids.push(node.id.clone());
        ids.extend(descendants.into_iter().map(|n| n.id));

        let removed = self.store.delete_nodes(project_id, &ids).await?;

        tracing::info!("Deleted '{}' ({} node(s))", node.relative_path, removed);
        self.emit_event(DomainEvent::NodeDeleted {
            project_id: project_id.to_string(),
            id: node.id,
            removed,
        });
        Ok(removed)
    }

    pub async fn get_node(&self, project_id: &str, node_id: &str) -> Result<Node, ServiceError> {
        self.load_node(project_id, node_id).await
    }

    /// Direct children ordered by `(order, name)`; `None` lists the project root
    pub async fn get_children(
        &self,
        project_id: &str,
        parent_id: Option<&str>,
    ) -> Result<Vec<Node>, ServiceError> {
        let parent_id = normalize_parent_id(parent_id);
        if let Some(id) = parent_id {
            self.load_node(project_id, id).await?;
        }
        Ok(self.store.get_children(project_id, parent_id).await?)
    }

    /// The whole project as nested entries, siblings ordered by `(order, name)`
    pub async fn get_tree(&self, project_id: &str) -> Result<Vec<TreeEntry>, ServiceError> {
        let nodes = self.store.list_project_nodes(project_id).await?;

        let mut by_parent: HashMap<Option<String>, Vec<Node>> = HashMap::new();
        for node in nodes {
            by_parent.entry(node.parent_id.clone()).or_default().push(node);
        }
        for siblings in by_parent.values_mut() {
            siblings.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.name.cmp(&b.name)));
        }

        Ok(build_entries(&mut by_parent, None))
    }
}

fn build_entries(
    by_parent: &mut HashMap<Option<String>, Vec<Node>>,
    parent_id: Option<String>,
) -> Vec<TreeEntry> {
    let siblings = by_parent.remove(&parent_id).unwrap_or_default();
    siblings
        .into_iter()
        .map(|node| {
            let children = build_entries(by_parent, Some(node.id.clone()));
            TreeEntry { node, children }
        })
        .collect()
}


// Cascade and cycle scenarios in a separate module
#[cfg(test)]
#[path = "node_service_tree_test.rs"]
mod node_service_tree_test;
