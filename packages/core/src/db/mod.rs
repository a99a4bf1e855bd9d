//! Database Layer
//!
//! Persistence for the content tree and the document version history:
//!
//! - Store traits (`TreeStore`, `RevisionStore`, `PatchStore`) that the
//!   services depend on
//! - `MemoryStore`: in-process implementation used by tests and embedders
//! - `SqliteStore` + `DatabaseService`: libsql-backed implementation
//! - `DomainEvent`: notifications broadcast after successful mutations
//!
//! # Architecture
//!
//! Services hold `Arc<dyn Trait>` handles and never touch a connection
//! directly. Every operation that must be atomic (cascaded path rewrites,
//! the version compare-and-swap with its revision append, multi-document
//! commits) is a single trait call, so each backend decides how to make it
//! atomic: one write lock for `MemoryStore`, one `BEGIN IMMEDIATE`
//! transaction for `SqliteStore`.

mod database;
mod error;
pub mod events;
mod memory_store;
mod patch_store;
mod revision_store;
mod sqlite_store;
mod tree_store;

pub use database::{DatabaseService, TABLES};
pub use error::DatabaseError;
pub use events::DomainEvent;
pub use memory_store::MemoryStore;
pub use patch_store::PatchStore;
pub use revision_store::{BatchOutcome, CommitOutcome, RevisionStore, VersionCommit};
pub use sqlite_store::SqliteStore;
pub use tree_store::TreeStore;
