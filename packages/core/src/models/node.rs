//! Node Data Structures
//!
//! A project's content hierarchy is a tree of folders (volumes, parts) and
//! files (chapters, scenes). Each node carries its materialized
//! `relative_path`, which is derived from the parent's path and the node's
//! name and is kept consistent by `NodeService`.
//!
//! # Examples
//!
//! ```rust
//! use manuscript_core::models::{Node, NodeKind};
//!
//! let volume = Node::new(
//!     "project-1".to_string(),
//!     None,
//!     "Vol1".to_string(),
//!     "Vol1".to_string(),
//!     NodeKind::Folder,
//!     0,
//! );
//! assert!(volume.is_root());
//! assert!(volume.can_have_children());
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Validation errors for tree and revision input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Name cannot be empty")]
    EmptyName,

    #[error("Invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("A node named '{name}' already exists under {parent}")]
    DuplicateName { name: String, parent: String },

    #[error("Node '{parent_id}' is a file and cannot have children")]
    ParentNotFolder { parent_id: String },

    #[error("Node '{node_id}' is not a child of {parent}")]
    NotAChild { node_id: String, parent: String },

    #[error("Tree depth exceeds the limit of {max_depth}")]
    TreeTooDeep { max_depth: usize },

    #[error("Invalid version number: {0}")]
    InvalidVersion(i64),

    #[error("Line edit cannot be applied at line {line}: {reason}")]
    InvalidLineEdit { line: usize, reason: String },

    #[error("Commit must contain at least one file")]
    EmptyCommit,

    #[error("{entity} '{id}' does not belong to project '{project_id}'")]
    ProjectMismatch {
        entity: String,
        id: String,
        project_id: String,
    },

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Document '{document_id}' appears more than once")]
    DuplicateDocument { document_id: String },

    #[error("No conflicts to resolve")]
    NoConflictsToResolve,
}

/// Whether a node groups other nodes or holds content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Folder,
    File,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Folder => "folder",
            NodeKind::File => "file",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "folder" => Some(NodeKind::Folder),
            "file" => Some(NodeKind::File),
            _ => None,
        }
    }
}

/// A folder or file within a project's content hierarchy.
///
/// # Fields
///
/// - `id`: Unique identifier (UUID v4)
/// - `project_id`: Owning project
/// - `parent_id`: Parent node (`None` means the node sits at the project root)
/// - `name`: Display name, also the last component of `relative_path`
/// - `relative_path`: Materialized path, derived, never written by callers
/// - `kind`: Folder or file
/// - `order`: Position among siblings (ascending)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,

    pub project_id: String,

    pub parent_id: Option<String>,

    pub name: String,

    pub relative_path: String,

    pub kind: NodeKind,

    pub order: i64,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Node {
    /// Create a node with a fresh UUID and current timestamps.
    ///
    /// The caller is responsible for passing a `relative_path` computed with
    /// [`crate::models::path::build_path`].
    pub fn new(
        project_id: String,
        parent_id: Option<String>,
        name: String,
        relative_path: String,
        kind: NodeKind,
        order: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            project_id,
            parent_id,
            name,
            relative_path,
            kind,
            order,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn can_have_children(&self) -> bool {
        self.kind == NodeKind::Folder
    }

    /// Refresh `updated_at`
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Parameters for creating a node through `NodeService::create_node`
#[derive(Debug, Clone)]
pub struct NewNode {
    pub project_id: String,
    /// Parent node; `None` (or an empty string) places the node at the root
    pub parent_id: Option<String>,
    pub name: String,
    pub kind: NodeKind,
    /// Sibling position; `None` appends after the last sibling
    pub order: Option<i64>,
}

impl NewNode {
    pub fn folder(project_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            parent_id: None,
            name: name.into(),
            kind: NodeKind::Folder,
            order: None,
        }
    }

    pub fn file(project_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            parent_id: None,
            name: name.into(),
            kind: NodeKind::File,
            order: None,
        }
    }

    pub fn under(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn at_order(mut self, order: i64) -> Self {
        self.order = Some(order);
        self
    }
}

/// A node together with its ordered children, as returned by `NodeService::get_tree`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeEntry {
    pub node: Node,
    pub children: Vec<TreeEntry>,
}

impl TreeEntry {
    /// Total number of nodes in this subtree, including the entry itself
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(TreeEntry::size).sum::<usize>()
    }
}

/// Treat an empty parent id the same as "no parent"
pub(crate) fn normalize_parent_id(parent_id: Option<&str>) -> Option<&str> {
    parent_id.filter(|id| !id.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_kind_round_trip() {
        assert_eq!(NodeKind::parse("folder"), Some(NodeKind::Folder));
        assert_eq!(NodeKind::parse(NodeKind::File.as_str()), Some(NodeKind::File));
        assert_eq!(NodeKind::parse("chapter"), None);
    }

    #[test]
    fn test_node_serializes_camel_case() {
        let node = Node::new(
            "p1".to_string(),
            Some("parent".to_string()),
            "Ch1".to_string(),
            "Vol1/Ch1".to_string(),
            NodeKind::File,
            3,
        );
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["relativePath"], "Vol1/Ch1");
        assert_eq!(json["projectId"], "p1");
        assert_eq!(json["kind"], "file");
        assert!(!node.can_have_children());
        assert!(!node.is_root());
    }

    #[test]
    fn test_normalize_parent_id() {
        assert_eq!(normalize_parent_id(Some("")), None);
        assert_eq!(normalize_parent_id(None), None);
        assert_eq!(normalize_parent_id(Some("abc")), Some("abc"));
    }
}
