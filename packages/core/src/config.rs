//! Runtime configuration for the manuscript services
//!
//! Every field has a sensible default. `CoreConfig::from_env()` starts from
//! the defaults and applies the `MANUSCRIPT_*` overrides that parse.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Upper bound for the ancestor walk during moves
pub const DEFAULT_MAX_TREE_DEPTH: usize = 1000;

/// Revisions returned by `list_revisions` when the caller passes `limit = 0`
pub const DEFAULT_REVISION_PAGE_SIZE: usize = 50;

/// Hard cap on a single `list_revisions` page
pub const MAX_REVISION_PAGE_SIZE: usize = 500;

/// Configuration shared by `NodeService`, `VersionService` and the SQLite store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreConfig {
    /// SQLite database file
    pub database_path: PathBuf,

    /// Maximum ancestor chain length walked when checking for cycles
    pub max_tree_depth: usize,

    pub default_revision_page_size: usize,
    pub max_revision_page_size: usize,

    /// `PRAGMA busy_timeout` applied to every SQLite connection
    pub busy_timeout_ms: u64,

    /// First backoff delay of the version retry queue (doubled per attempt)
    pub retry_base_delay_ms: u64,

    /// Capacity of the domain event broadcast channel
    pub event_channel_capacity: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            max_tree_depth: DEFAULT_MAX_TREE_DEPTH,
            default_revision_page_size: DEFAULT_REVISION_PAGE_SIZE,
            max_revision_page_size: MAX_REVISION_PAGE_SIZE,
            busy_timeout_ms: 5000,
            retry_base_delay_ms: 10,
            event_channel_capacity: 128,
        }
    }
}

impl CoreConfig {
    /// Defaults overridden by environment variables
    ///
    /// - `MANUSCRIPT_DB_PATH`: database file
    /// - `MANUSCRIPT_MAX_TREE_DEPTH`: ancestor walk bound
    /// - `MANUSCRIPT_REVISION_PAGE_SIZE`: default revision page size
    /// - `MANUSCRIPT_BUSY_TIMEOUT_MS`: SQLite busy timeout
    ///
    /// Values that fail to parse are ignored with a warning.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("MANUSCRIPT_DB_PATH") {
            tracing::info!("Using database path from MANUSCRIPT_DB_PATH: {}", path);
            config.database_path = PathBuf::from(path);
        }
        if let Some(depth) = parse_env("MANUSCRIPT_MAX_TREE_DEPTH") {
            config.max_tree_depth = depth;
        }
        if let Some(page) = parse_env("MANUSCRIPT_REVISION_PAGE_SIZE") {
            config.default_revision_page_size = page;
        }
        if let Some(timeout) = parse_env("MANUSCRIPT_BUSY_TIMEOUT_MS") {
            config.busy_timeout_ms = timeout;
        }

        config
    }

    /// Same configuration pointed at another database file
    pub fn with_database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.database_path = path.into();
        self
    }

    /// Resolve a caller-supplied page size: 0 means default, anything above the cap is clamped
    pub fn revision_page_size(&self, requested: usize) -> usize {
        let size = if requested == 0 {
            self.default_revision_page_size
        } else {
            requested
        };
        size.min(self.max_revision_page_size)
    }
}

/// `~/.manuscript/database/manuscript.db`, or a relative path when there is no home directory
fn default_database_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_default()
        .join(".manuscript")
        .join("database")
        .join("manuscript.db")
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring {}={:?}: not a valid number", key, raw);
            None
        }
    }
}
