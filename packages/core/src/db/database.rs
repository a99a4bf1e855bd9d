//! Database Connection Management
//!
//! This module provides the database connection and schema initialization
//! for the libsql-backed store.
//!
//! # Architecture
//!
//! - **Path-agnostic**: Accepts any valid PathBuf
//! - **WAL mode**: Write-Ahead Logging so readers don't block the writer
//! - **Idempotent schema**: `CREATE TABLE IF NOT EXISTS`, no migrations
//! - **Foreign keys**: Enabled; revisions and patches reference their document
//!
//! # Database Connection Patterns
//!
//! **Always use `connect_with_timeout()` in async functions.** It applies the
//! configured busy timeout, so concurrent writers wait for the lock instead of
//! failing immediately with `SQLITE_BUSY`. This matters for
//! `BEGIN IMMEDIATE` transactions, which take the write lock up front.
//!
//! ```no_run
//! # use manuscript_core::db::DatabaseService;
//! # use std::path::PathBuf;
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let db_service = DatabaseService::new(PathBuf::from("./data/manuscript.db")).await?;
//! let conn = db_service.connect_with_timeout().await?;
//! # Ok(())
//! # }
//! ```

use crate::config::CoreConfig;
use crate::db::error::DatabaseError;
use libsql::{Builder, Database};
use std::path::PathBuf;
use std::sync::Arc;

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;

/// Tables created by [`DatabaseService::new`]
pub const TABLES: [&str; 5] = ["nodes", "documents", "revisions", "patches", "commits"];

/// Database service for managing the libsql connection and schema
#[derive(Debug, Clone)]
pub struct DatabaseService {
    /// libsql database handle (wrapped in Arc for sharing)
    pub db: Arc<Database>,

    /// Path to the database file
    pub db_path: PathBuf,

    busy_timeout_ms: u64,
}

impl DatabaseService {
    /// Open (or create) the database at `db_path` with the default busy timeout
    ///
    /// This will:
    /// 1. Ensure the parent directory exists (create if needed)
    /// 2. Open/create the database file
    /// 3. Enable WAL mode and foreign keys
    /// 4. Initialize the schema (CREATE TABLE IF NOT EXISTS)
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if:
    /// - Parent directory cannot be created
    /// - Database connection fails
    /// - Schema initialization fails
    pub async fn new(db_path: PathBuf) -> Result<Self, DatabaseError> {
        Self::with_busy_timeout(db_path, DEFAULT_BUSY_TIMEOUT_MS).await
    }

    /// Open the database named by `config.database_path` with `config.busy_timeout_ms`
    pub async fn from_config(config: &CoreConfig) -> Result<Self, DatabaseError> {
        Self::with_busy_timeout(config.database_path.clone(), config.busy_timeout_ms).await
    }

    pub async fn with_busy_timeout(
        db_path: PathBuf,
        busy_timeout_ms: u64,
    ) -> Result<Self, DatabaseError> {
        let is_new_database = !db_path.exists();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    if e.kind() == std::io::ErrorKind::PermissionDenied {
                        DatabaseError::permission_denied(db_path.clone())
                    } else {
                        DatabaseError::DirectoryCreationFailed(e)
                    }
                })?;
            }
        }

        let db = Builder::new_local(&db_path)
            .build()
            .await
            .map_err(|e| DatabaseError::connection_failed(db_path.clone(), e))?;

        let service = Self {
            db: Arc::new(db),
            db_path,
            busy_timeout_ms,
        };

        service.initialize_schema(is_new_database).await?;

        tracing::debug!("Opened database at {}", service.db_path.display());
        Ok(service)
    }

    /// Execute a PRAGMA statement
    ///
    /// PRAGMA statements return rows, so they go through `query()` rather
    /// than `execute()`.
    pub(crate) async fn execute_pragma(
        &self,
        conn: &libsql::Connection,
        pragma: &str,
    ) -> Result<(), DatabaseError> {
        let mut stmt = conn.prepare(pragma).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        let _ = stmt.query(()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        Ok(())
    }

    /// Create tables and indexes; safe to call on an existing database
    ///
    /// # Schema
    ///
    /// - `nodes`: content tree with materialized `relative_path`
    /// - `documents`: current content and `current_version`
    /// - `revisions`: append-only history, unique per `(document_id, version_num)`
    /// - `patches`: proposed changes, diff stored as JSON text
    /// - `commits`: multi-document commit records
    async fn initialize_schema(&self, is_new_database: bool) -> Result<(), DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        self.execute_pragma(&conn, "PRAGMA journal_mode = WAL")
            .await?;
        self.execute_pragma(&conn, "PRAGMA foreign_keys = ON")
            .await?;

        let statements = [
            (
                "nodes",
                "CREATE TABLE IF NOT EXISTS nodes (
                    id TEXT PRIMARY KEY,
                    project_id TEXT NOT NULL,
                    parent_id TEXT,
                    name TEXT NOT NULL,
                    relative_path TEXT NOT NULL,
                    kind TEXT NOT NULL,
                    sort_order INTEGER NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                )",
            ),
            (
                "documents",
                "CREATE TABLE IF NOT EXISTS documents (
                    id TEXT PRIMARY KEY,
                    project_id TEXT NOT NULL,
                    content TEXT NOT NULL,
                    current_version INTEGER NOT NULL,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                )",
            ),
            (
                "revisions",
                "CREATE TABLE IF NOT EXISTS revisions (
                    id TEXT PRIMARY KEY,
                    document_id TEXT NOT NULL,
                    project_id TEXT NOT NULL,
                    version_num INTEGER NOT NULL,
                    content TEXT NOT NULL,
                    parent_version INTEGER,
                    author_id TEXT NOT NULL,
                    message TEXT NOT NULL,
                    commit_id TEXT,
                    created_at TEXT NOT NULL,
                    UNIQUE (document_id, version_num),
                    FOREIGN KEY (document_id) REFERENCES documents(id) ON DELETE CASCADE
                )",
            ),
            (
                "patches",
                "CREATE TABLE IF NOT EXISTS patches (
                    id TEXT PRIMARY KEY,
                    document_id TEXT NOT NULL,
                    project_id TEXT NOT NULL,
                    base_version INTEGER NOT NULL,
                    diff TEXT NOT NULL,
                    status TEXT NOT NULL,
                    created_by TEXT NOT NULL,
                    message TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL,
                    FOREIGN KEY (document_id) REFERENCES documents(id) ON DELETE CASCADE
                )",
            ),
            (
                "commits",
                "CREATE TABLE IF NOT EXISTS commits (
                    id TEXT PRIMARY KEY,
                    project_id TEXT NOT NULL,
                    author_id TEXT NOT NULL,
                    message TEXT NOT NULL,
                    file_count INTEGER NOT NULL,
                    created_at TEXT NOT NULL
                )",
            ),
        ];

        for (table, sql) in statements {
            conn.execute(sql, ()).await.map_err(|e| {
                DatabaseError::initialization_failed(format!("Failed to create {} table: {}", table, e))
            })?;
        }

        self.create_indexes(&conn).await?;

        // Flush the fresh schema so a second connection opened right away sees it
        if is_new_database {
            self.execute_pragma(&conn, "PRAGMA wal_checkpoint(TRUNCATE)")
                .await?;
        }

        Ok(())
    }

    async fn create_indexes(&self, conn: &libsql::Connection) -> Result<(), DatabaseError> {
        let indexes = [
            (
                "idx_nodes_project_path",
                "CREATE INDEX IF NOT EXISTS idx_nodes_project_path ON nodes(project_id, relative_path)",
            ),
            (
                "idx_nodes_project_parent",
                "CREATE INDEX IF NOT EXISTS idx_nodes_project_parent ON nodes(project_id, parent_id)",
            ),
            (
                "idx_documents_project",
                "CREATE INDEX IF NOT EXISTS idx_documents_project ON documents(project_id)",
            ),
            (
                "idx_revisions_commit",
                "CREATE INDEX IF NOT EXISTS idx_revisions_commit ON revisions(commit_id)",
            ),
            (
                "idx_patches_document",
                "CREATE INDEX IF NOT EXISTS idx_patches_document ON patches(document_id, status)",
            ),
            (
                "idx_commits_project",
                "CREATE INDEX IF NOT EXISTS idx_commits_project ON commits(project_id, created_at)",
            ),
        ];

        for (name, sql) in indexes {
            conn.execute(sql, ()).await.map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to create index '{}': {}", name, e))
            })?;
        }

        Ok(())
    }

    /// Get a connection without the busy timeout
    ///
    /// Only for synchronous, single-threaded contexts. Async code should use
    /// [`connect_with_timeout`](Self::connect_with_timeout).
    pub fn connect(&self) -> Result<libsql::Connection, DatabaseError> {
        self.db.connect().map_err(DatabaseError::LibsqlError)
    }

    /// Get a connection with the configured `busy_timeout` applied
    pub async fn connect_with_timeout(&self) -> Result<libsql::Connection, DatabaseError> {
        let conn = self.connect()?;

        self.execute_pragma(&conn, &format!("PRAGMA busy_timeout = {}", self.busy_timeout_ms))
            .await?;

        Ok(conn)
    }

    /// Checkpoint the WAL so all writes are in the main database file
    pub async fn close(&self) -> Result<(), DatabaseError> {
        let conn = self.connect_with_timeout().await?;
        self.execute_pragma(&conn, "PRAGMA wal_checkpoint(TRUNCATE)")
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_database_creation() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("test.db");

        let db_service = DatabaseService::new(db_path.clone()).await.unwrap();

        assert_eq!(db_service.db_path, db_path);
        assert!(db_path.exists());
    }

    #[tokio::test]
    async fn test_schema_initialization() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let db_service = DatabaseService::new(db_path).await.unwrap();
        let conn = db_service.connect().unwrap();

        for table in TABLES {
            let mut rows = conn
                .query(
                    "SELECT name FROM sqlite_master WHERE type='table' AND name = ?",
                    [table],
                )
                .await
                .unwrap();
            let row = rows.next().await.unwrap().unwrap();
            let table_name: String = row.get(0).unwrap();
            assert_eq!(table_name, table);
        }
    }

    #[tokio::test]
    async fn test_reopen_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        DatabaseService::new(db_path.clone()).await.unwrap();
        let reopened = DatabaseService::new(db_path).await;

        assert!(reopened.is_ok());
    }
}
