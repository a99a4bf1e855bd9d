//! Business Services
//!
//! This module contains the core business logic services:
//!
//! - `NodeService` - Content tree operations with cascaded path maintenance
//! - `VersionService` - Optimistic-concurrency edits, rollback, patches and commits
//! - `VersionRetryQueue` - Re-fetch and retry wrapper for conflicting edits
//!
//! Services coordinate between the store traits and callers, implementing
//! business rules and emitting domain events.

pub mod error;
pub mod node_service;
mod project_locks;
pub mod retry;
pub mod version_service;

pub use error::ServiceError;
pub use node_service::NodeService;
pub use project_locks::ProjectLocks;
pub use retry::VersionRetryQueue;
pub use version_service::VersionService;
