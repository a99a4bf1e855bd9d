//! Manuscript Core Business Logic Layer
//!
//! This crate provides the content tree and document versioning core for the
//! Manuscript writing platform.
//!
//! # Architecture
//!
//! - **Materialized paths**: Every node stores its full `relative_path`; renames
//!   and moves rewrite a whole subtree in one atomic batch
//! - **Optimistic concurrency**: Document edits are compare-and-swap on
//!   `current_version`, fused with the revision append
//! - **Pluggable stores**: Services depend on async store traits; an in-memory
//!   store and a libsql/SQLite store are provided
//!
//! # Modules
//!
//! - [`models`] - Data structures (Node, Document, Revision, Patch, Commit) and path helpers
//! - [`services`] - Business services (NodeService, VersionService)
//! - [`db`] - Store traits and their in-memory and libsql implementations
//! - [`config`] - Runtime configuration

pub mod config;
pub mod db;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use config::CoreConfig;
pub use db::{DatabaseService, DomainEvent, MemoryStore, SqliteStore};
pub use models::*;
pub use services::*;
