//! TreeStore Trait - Node Persistence Abstraction
//!
//! This module defines the `TreeStore` trait that abstracts persistence of a
//! project's content tree. `NodeService` holds an `Arc<dyn TreeStore>` and
//! never reaches a database handle directly, so the in-memory store used in
//! tests and the libsql store are interchangeable.
//!
//! # Design Decisions
//!
//! 1. **Async-First**: All methods are async so network-backed stores fit the same trait
//! 2. **Project Scoping**: Reads take a `project_id`; a node of another project is "absent"
//! 3. **Atomic Batches**: `save_nodes` and `delete_nodes` are all-or-nothing, which is
//!    what keeps cascaded path rewrites consistent
//! 4. **Error Handling**: Uses `anyhow::Result`; the service layer wraps failures as
//!    opaque store errors

use crate::models::Node;
use anyhow::Result;
use async_trait::async_trait;

/// Persistence operations for the content tree
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to allow usage in async contexts where
/// futures may be moved between threads.
#[async_trait]
pub trait TreeStore: Send + Sync {
    /// Insert a new node
    ///
    /// # Errors
    ///
    /// Returns error if a node with the same id already exists.
    async fn create_node(&self, node: Node) -> Result<Node>;

    /// Get a node by id within a project
    ///
    /// - `Ok(Some(node))` if the node exists in this project
    /// - `Ok(None)` if it doesn't exist (or belongs to another project)
    async fn get_node(&self, project_id: &str, node_id: &str) -> Result<Option<Node>>;

    /// All nodes of the project whose `relative_path` starts with `prefix`,
    /// ordered by path
    ///
    /// Callers pass `path + "/"` to select strict descendants. The result
    /// must be exhaustive; cascades rely on it.
    async fn find_by_path_prefix(&self, project_id: &str, prefix: &str) -> Result<Vec<Node>>;

    /// Direct children of `parent_id` (`None` = project root), ordered by `(order, name)`
    async fn get_children(&self, project_id: &str, parent_id: Option<&str>) -> Result<Vec<Node>>;

    /// Every node of the project, ordered by path
    async fn list_project_nodes(&self, project_id: &str) -> Result<Vec<Node>>;

    /// Overwrite an existing node
    ///
    /// # Errors
    ///
    /// Returns error if the node doesn't exist.
    async fn save_node(&self, node: Node) -> Result<()>;

    /// Overwrite several existing nodes as one atomic unit
    ///
    /// Either every node is written or none is. Used for a structural change
    /// together with all of its descendant path rewrites.
    ///
    /// # Errors
    ///
    /// Returns error (and writes nothing) if any node doesn't exist.
    async fn save_nodes(&self, nodes: Vec<Node>) -> Result<()>;

    /// Delete the given nodes of a project as one atomic unit
    ///
    /// Returns the number of nodes actually removed; unknown ids are skipped.
    async fn delete_nodes(&self, project_id: &str, node_ids: &[String]) -> Result<usize>;
}
