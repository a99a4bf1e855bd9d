//! Data Models
//!
//! This module contains the core data structures used throughout Manuscript:
//!
//! - `Node` - Folder or file in a project's content tree
//! - `Document` / `Revision` / `Commit` - Live content and its append-only history
//! - `Patch` / `PatchDiff` - Deferred changes against a base version
//! - [`path`] - Materialized path primitives shared by all tree operations

mod document;
mod node;
mod patch;
pub mod path;

pub use document::{
    BatchConflictResult, Commit, CommitFile, ConflictInfo, ConflictResolution, Document,
    ResolutionStrategy, Revision, INITIAL_VERSION,
};
pub use node::{NewNode, Node, NodeKind, TreeEntry, ValidationError};
pub(crate) use node::normalize_parent_id;
pub use patch::{LineEdit, Patch, PatchDiff, PatchStatus};
