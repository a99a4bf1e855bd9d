//! SqliteStore - libsql implementation of the store traits
//!
//! Wraps a [`DatabaseService`] and implements [`TreeStore`], [`RevisionStore`]
//! and [`PatchStore`] on top of it.
//!
//! # Atomicity
//!
//! Every multi-statement write runs inside `BEGIN IMMEDIATE ... COMMIT`.
//! IMMEDIATE takes the write lock before the first read, so the version
//! check in `commit_version` and the update that follows cannot interleave
//! with another writer. Any failure inside the transaction issues `ROLLBACK`
//! and leaves the database as it was.
//!
//! Timestamps are stored as fixed-width RFC 3339 text (microseconds, `Z`),
//! which keeps lexical and chronological order identical.

use crate::db::database::DatabaseService;
use crate::db::error::DatabaseError;
use crate::db::patch_store::PatchStore;
use crate::db::revision_store::{BatchOutcome, CommitOutcome, RevisionStore, VersionCommit};
use crate::db::tree_store::TreeStore;
use crate::models::{Commit, Document, Node, NodeKind, Patch, PatchDiff, PatchStatus, Revision};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use libsql::{Connection, Row};
use std::sync::Arc;

const NODE_COLUMNS: &str =
    "id, project_id, parent_id, name, relative_path, kind, sort_order, created_at, updated_at";
const DOCUMENT_COLUMNS: &str = "id, project_id, content, current_version, created_at, updated_at";
const REVISION_COLUMNS: &str = "id, document_id, project_id, version_num, content, parent_version, author_id, message, commit_id, created_at";
const PATCH_COLUMNS: &str = "id, document_id, project_id, base_version, diff, status, created_by, message, created_at, updated_at";
const COMMIT_COLUMNS: &str = "id, project_id, author_id, message, file_count, created_at";

/// libsql-backed store for nodes, documents, revisions, patches and commits
pub struct SqliteStore {
    db: Arc<DatabaseService>,
}

impl SqliteStore {
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self { db }
    }

    /// Underlying database service
    pub fn database(&self) -> &Arc<DatabaseService> {
        &self.db
    }

    async fn connect(&self) -> Result<Connection> {
        self.db
            .connect_with_timeout()
            .await
            .context("Failed to open database connection")
    }

    async fn begin(conn: &Connection) -> Result<()> {
        conn.execute("BEGIN IMMEDIATE", ())
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to begin transaction: {}", e)))?;
        Ok(())
    }

    /// COMMIT on success, ROLLBACK on error
    async fn finish<T>(conn: &Connection, result: Result<T>) -> Result<T> {
        match result {
            Ok(value) => {
                if let Err(e) = conn.execute("COMMIT", ()).await {
                    Self::rollback(conn).await;
                    return Err(DatabaseError::sql_execution(format!(
                        "Failed to commit transaction: {}",
                        e
                    ))
                    .into());
                }
                Ok(value)
            }
            Err(e) => {
                Self::rollback(conn).await;
                Err(e)
            }
        }
    }

    async fn rollback(conn: &Connection) {
        if let Err(e) = conn.execute("ROLLBACK", ()).await {
            tracing::warn!("ROLLBACK failed: {}", e);
        }
    }

    /// LIMIT/OFFSET value; saturates instead of wrapping negative
    fn sql_count(n: usize) -> i64 {
        i64::try_from(n).unwrap_or(i64::MAX)
    }

    fn format_timestamp(ts: &DateTime<Utc>) -> String {
        ts.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    /// Parse a timestamp in RFC 3339 or SQLite's `YYYY-MM-DD HH:MM:SS` format
    fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(dt.with_timezone(&Utc));
        }

        if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
            return Ok(naive.and_utc());
        }

        Err(anyhow::anyhow!(
            "Unable to parse timestamp '{}' as RFC3339 or SQLite format",
            s
        ))
    }

    fn row_to_node(row: &Row) -> Result<Node> {
        let id: String = row.get(0).context("Failed to get id")?;
        let project_id: String = row.get(1).context("Failed to get project_id")?;
        let parent_id: Option<String> = row.get(2).context("Failed to get parent_id")?;
        let name: String = row.get(3).context("Failed to get name")?;
        let relative_path: String = row.get(4).context("Failed to get relative_path")?;
        let kind_str: String = row.get(5).context("Failed to get kind")?;
        let order: i64 = row.get(6).context("Failed to get sort_order")?;
        let created_at_str: String = row.get(7).context("Failed to get created_at")?;
        let updated_at_str: String = row.get(8).context("Failed to get updated_at")?;

        let kind = NodeKind::parse(&kind_str).ok_or_else(|| {
            DatabaseError::corrupt_row("nodes", format!("unknown kind '{}' on {}", kind_str, id))
        })?;

        Ok(Node {
            id,
            project_id,
            parent_id,
            name,
            relative_path,
            kind,
            order,
            created_at: Self::parse_timestamp(&created_at_str)
                .context("Failed to parse created_at")?,
            updated_at: Self::parse_timestamp(&updated_at_str)
                .context("Failed to parse updated_at")?,
        })
    }

    fn row_to_document(row: &Row) -> Result<Document> {
        let created_at_str: String = row.get(4).context("Failed to get created_at")?;
        let updated_at_str: String = row.get(5).context("Failed to get updated_at")?;

        Ok(Document {
            id: row.get(0).context("Failed to get id")?,
            project_id: row.get(1).context("Failed to get project_id")?,
            content: row.get(2).context("Failed to get content")?,
            current_version: row.get(3).context("Failed to get current_version")?,
            created_at: Self::parse_timestamp(&created_at_str)?,
            updated_at: Self::parse_timestamp(&updated_at_str)?,
        })
    }

    fn row_to_revision(row: &Row) -> Result<Revision> {
        let created_at_str: String = row.get(9).context("Failed to get created_at")?;

        Ok(Revision {
            id: row.get(0).context("Failed to get id")?,
            document_id: row.get(1).context("Failed to get document_id")?,
            project_id: row.get(2).context("Failed to get project_id")?,
            version_num: row.get(3).context("Failed to get version_num")?,
            content: row.get(4).context("Failed to get content")?,
            parent_version: row.get(5).context("Failed to get parent_version")?,
            author_id: row.get(6).context("Failed to get author_id")?,
            message: row.get(7).context("Failed to get message")?,
            commit_id: row.get(8).context("Failed to get commit_id")?,
            created_at: Self::parse_timestamp(&created_at_str)?,
        })
    }

    fn row_to_patch(row: &Row) -> Result<Patch> {
        let id: String = row.get(0).context("Failed to get id")?;
        let diff_json: String = row.get(4).context("Failed to get diff")?;
        let status_str: String = row.get(5).context("Failed to get status")?;
        let created_at_str: String = row.get(8).context("Failed to get created_at")?;
        let updated_at_str: String = row.get(9).context("Failed to get updated_at")?;

        let diff: PatchDiff =
            serde_json::from_str(&diff_json).context("Failed to parse patch diff JSON")?;
        let status = PatchStatus::parse(&status_str).ok_or_else(|| {
            DatabaseError::corrupt_row("patches", format!("unknown status '{}' on {}", status_str, id))
        })?;

        Ok(Patch {
            id,
            document_id: row.get(1).context("Failed to get document_id")?,
            project_id: row.get(2).context("Failed to get project_id")?,
            base_version: row.get(3).context("Failed to get base_version")?,
            diff,
            status,
            created_by: row.get(6).context("Failed to get created_by")?,
            message: row.get(7).context("Failed to get message")?,
            created_at: Self::parse_timestamp(&created_at_str)?,
            updated_at: Self::parse_timestamp(&updated_at_str)?,
        })
    }

    fn row_to_commit(row: &Row) -> Result<Commit> {
        let file_count: i64 = row.get(4).context("Failed to get file_count")?;
        let created_at_str: String = row.get(5).context("Failed to get created_at")?;

        Ok(Commit {
            id: row.get(0).context("Failed to get id")?,
            project_id: row.get(1).context("Failed to get project_id")?,
            author_id: row.get(2).context("Failed to get author_id")?,
            message: row.get(3).context("Failed to get message")?,
            file_count: usize::try_from(file_count)
                .map_err(|_| DatabaseError::corrupt_row("commits", "negative file_count"))?,
            created_at: Self::parse_timestamp(&created_at_str)?,
        })
    }

    /// Run a query and decode every row
    async fn query_all<T>(
        conn: &Connection,
        sql: &str,
        params: impl libsql::params::IntoParams,
        decode: fn(&Row) -> Result<T>,
    ) -> Result<Vec<T>> {
        let mut rows = conn
            .query(sql, params)
            .await
            .with_context(|| format!("Failed to run query: {}", sql))?;

        let mut items = Vec::new();
        while let Some(row) = rows.next().await.context("Failed to read row")? {
            items.push(decode(&row)?);
        }
        Ok(items)
    }

    async fn query_one<T>(
        conn: &Connection,
        sql: &str,
        params: impl libsql::params::IntoParams,
        decode: fn(&Row) -> Result<T>,
    ) -> Result<Option<T>> {
        let mut rows = conn
            .query(sql, params)
            .await
            .with_context(|| format!("Failed to run query: {}", sql))?;

        match rows.next().await.context("Failed to read row")? {
            Some(row) => Ok(Some(decode(&row)?)),
            None => Ok(None),
        }
    }

    async fn current_version(conn: &Connection, document_id: &str) -> Result<Option<i64>> {
        Self::query_one(
            conn,
            "SELECT current_version FROM documents WHERE id = ?",
            [document_id],
            |row| row.get::<i64>(0).context("Failed to get current_version"),
        )
        .await
    }

    async fn insert_revision(conn: &Connection, revision: &Revision) -> Result<()> {
        conn.execute(
            &format!(
                "INSERT INTO revisions ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                REVISION_COLUMNS
            ),
            (
                revision.id.as_str(),
                revision.document_id.as_str(),
                revision.project_id.as_str(),
                revision.version_num,
                revision.content.as_str(),
                revision.parent_version,
                revision.author_id.as_str(),
                revision.message.as_str(),
                revision.commit_id.as_deref(),
                Self::format_timestamp(&revision.created_at),
            ),
        )
        .await
        .with_context(|| {
            format!(
                "Failed to insert revision {} of {}",
                revision.version_num, revision.document_id
            )
        })?;
        Ok(())
    }

    /// Conditional content update plus revision append, inside an open transaction
    ///
    /// Returns `None` when the stored version no longer matches.
    async fn apply_version_commit(
        conn: &Connection,
        commit: &VersionCommit,
        commit_id: Option<&str>,
    ) -> Result<Option<Revision>> {
        let project_id = Self::query_one(
            conn,
            "SELECT project_id FROM documents WHERE id = ?",
            [commit.document_id.as_str()],
            |row| row.get::<String>(0).context("Failed to get project_id"),
        )
        .await?;
        let Some(project_id) = project_id else {
            return Ok(None);
        };

        let revision = commit.to_revision(&project_id, commit_id);
        let updated = conn
            .execute(
                "UPDATE documents SET content = ?, current_version = ?, updated_at = ?
                 WHERE id = ? AND current_version = ?",
                (
                    commit.new_content.as_str(),
                    revision.version_num,
                    Self::format_timestamp(&revision.created_at),
                    commit.document_id.as_str(),
                    commit.expected_version,
                ),
            )
            .await
            .with_context(|| format!("Failed to update document {}", commit.document_id))?;

        if updated == 0 {
            return Ok(None);
        }

        Self::insert_revision(conn, &revision).await?;
        Ok(Some(revision))
    }

    async fn commit_version_in_tx(
        conn: &Connection,
        commit: &VersionCommit,
    ) -> Result<CommitOutcome> {
        let Some(actual_version) = Self::current_version(conn, &commit.document_id).await? else {
            return Ok(CommitOutcome::DocumentMissing);
        };

        if let Some(patch_id) = &commit.resolves_patch {
            let status = Self::query_one(
                conn,
                "SELECT status FROM patches WHERE id = ? AND document_id = ?",
                [patch_id.as_str(), commit.document_id.as_str()],
                |row| row.get::<String>(0).context("Failed to get status"),
            )
            .await?
            .and_then(|s| PatchStatus::parse(&s));

            if status != Some(PatchStatus::Pending) {
                return Ok(CommitOutcome::PatchNotPending { status });
            }
        }

        if actual_version != commit.expected_version {
            return Ok(CommitOutcome::VersionMismatch { actual_version });
        }

        let Some(revision) = Self::apply_version_commit(conn, commit, None).await? else {
            return Err(DatabaseError::sql_execution(format!(
                "Version of {} changed inside an immediate transaction",
                commit.document_id
            ))
            .into());
        };

        if let Some(patch_id) = &commit.resolves_patch {
            conn.execute(
                "UPDATE patches SET status = ?, updated_at = ? WHERE id = ? AND status = ?",
                (
                    PatchStatus::Applied.as_str(),
                    Self::format_timestamp(&revision.created_at),
                    patch_id.as_str(),
                    PatchStatus::Pending.as_str(),
                ),
            )
            .await
            .with_context(|| format!("Failed to mark patch {} applied", patch_id))?;
        }

        Ok(CommitOutcome::Committed(revision))
    }
}

#[async_trait]
impl TreeStore for SqliteStore {
    async fn create_node(&self, node: Node) -> Result<Node> {
        let conn = self.connect().await?;
        conn.execute(
            &format!(
                "INSERT INTO nodes ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
                NODE_COLUMNS
            ),
            (
                node.id.as_str(),
                node.project_id.as_str(),
                node.parent_id.as_deref(),
                node.name.as_str(),
                node.relative_path.as_str(),
                node.kind.as_str(),
                node.order,
                Self::format_timestamp(&node.created_at),
                Self::format_timestamp(&node.updated_at),
            ),
        )
        .await
        .with_context(|| format!("Failed to insert node {}", node.id))?;
        Ok(node)
    }

    async fn get_node(&self, project_id: &str, node_id: &str) -> Result<Option<Node>> {
        let conn = self.connect().await?;
        Self::query_one(
            &conn,
            &format!(
                "SELECT {} FROM nodes WHERE id = ? AND project_id = ?",
                NODE_COLUMNS
            ),
            [node_id, project_id],
            Self::row_to_node,
        )
        .await
    }

    async fn find_by_path_prefix(&self, project_id: &str, prefix: &str) -> Result<Vec<Node>> {
        let conn = self.connect().await?;
        // substr() instead of LIKE: names may contain '%' and '_'
        Self::query_all(
            &conn,
            &format!(
                "SELECT {} FROM nodes
                 WHERE project_id = ? AND substr(relative_path, 1, ?) = ?
                 ORDER BY relative_path",
                NODE_COLUMNS
            ),
            (project_id, prefix.chars().count() as i64, prefix),
            Self::row_to_node,
        )
        .await
    }

    async fn get_children(&self, project_id: &str, parent_id: Option<&str>) -> Result<Vec<Node>> {
        let conn = self.connect().await?;
        Self::query_all(
            &conn,
            &format!(
                "SELECT {} FROM nodes
                 WHERE project_id = ? AND parent_id IS ?
                 ORDER BY sort_order, name",
                NODE_COLUMNS
            ),
            (project_id, parent_id),
            Self::row_to_node,
        )
        .await
    }

    async fn list_project_nodes(&self, project_id: &str) -> Result<Vec<Node>> {
        let conn = self.connect().await?;
        Self::query_all(
            &conn,
            &format!(
                "SELECT {} FROM nodes WHERE project_id = ? ORDER BY relative_path",
                NODE_COLUMNS
            ),
            [project_id],
            Self::row_to_node,
        )
        .await
    }

    async fn save_node(&self, node: Node) -> Result<()> {
        self.save_nodes(vec![node]).await
    }

    async fn save_nodes(&self, nodes: Vec<Node>) -> Result<()> {
        if nodes.is_empty() {
            return Ok(());
        }

        let conn = self.connect().await?;
        Self::begin(&conn).await?;

        let mut result = Ok(());
        for node in &nodes {
            let updated = conn
                .execute(
                    "UPDATE nodes SET parent_id = ?, name = ?, relative_path = ?, kind = ?,
                        sort_order = ?, updated_at = ?
                     WHERE id = ? AND project_id = ?",
                    (
                        node.parent_id.as_deref(),
                        node.name.as_str(),
                        node.relative_path.as_str(),
                        node.kind.as_str(),
                        node.order,
                        Self::format_timestamp(&node.updated_at),
                        node.id.as_str(),
                        node.project_id.as_str(),
                    ),
                )
                .await
                .with_context(|| format!("Failed to update node {}", node.id));

            match updated {
                Ok(0) => {
                    result = Err(anyhow::anyhow!("Node {} does not exist", node.id));
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }

        Self::finish(&conn, result).await?;
        tracing::debug!("Saved {} nodes in one transaction", nodes.len());
        Ok(())
    }

    async fn delete_nodes(&self, project_id: &str, node_ids: &[String]) -> Result<usize> {
        if node_ids.is_empty() {
            return Ok(0);
        }

        let conn = self.connect().await?;
        Self::begin(&conn).await?;

        let mut result: Result<usize> = Ok(0);
        for id in node_ids {
            match conn
                .execute(
                    "DELETE FROM nodes WHERE id = ? AND project_id = ?",
                    [id.as_str(), project_id],
                )
                .await
            {
                Ok(n) => {
                    if let Ok(total) = result.as_mut() {
                        *total += n as usize;
                    }
                }
                Err(e) => {
                    result = Err(e).with_context(|| format!("Failed to delete node {}", id));
                    break;
                }
            }
        }

        Self::finish(&conn, result).await
    }
}

#[async_trait]
impl RevisionStore for SqliteStore {
    async fn create_document(&self, document: Document, initial: Revision) -> Result<Document> {
        let conn = self.connect().await?;
        Self::begin(&conn).await?;

        let inserted = conn
            .execute(
                &format!(
                    "INSERT INTO documents ({}) VALUES (?, ?, ?, ?, ?, ?)",
                    DOCUMENT_COLUMNS
                ),
                (
                    document.id.as_str(),
                    document.project_id.as_str(),
                    document.content.as_str(),
                    document.current_version,
                    Self::format_timestamp(&document.created_at),
                    Self::format_timestamp(&document.updated_at),
                ),
            )
            .await
            .with_context(|| format!("Failed to insert document {}", document.id));

        let result = match inserted {
            Ok(_) => Self::insert_revision(&conn, &initial).await,
            Err(e) => Err(e),
        };

        Self::finish(&conn, result).await?;
        Ok(document)
    }

    async fn get_document(&self, document_id: &str) -> Result<Option<Document>> {
        let conn = self.connect().await?;
        Self::query_one(
            &conn,
            &format!("SELECT {} FROM documents WHERE id = ?", DOCUMENT_COLUMNS),
            [document_id],
            Self::row_to_document,
        )
        .await
    }

    async fn commit_version(&self, commit: VersionCommit) -> Result<CommitOutcome> {
        let conn = self.connect().await?;
        Self::begin(&conn).await?;

        let result = Self::commit_version_in_tx(&conn, &commit).await;
        Self::finish(&conn, result).await
    }

    async fn get_revision(&self, document_id: &str, version: i64) -> Result<Option<Revision>> {
        let conn = self.connect().await?;
        Self::query_one(
            &conn,
            &format!(
                "SELECT {} FROM revisions WHERE document_id = ? AND version_num = ?",
                REVISION_COLUMNS
            ),
            (document_id, version),
            Self::row_to_revision,
        )
        .await
    }

    async fn list_revisions(
        &self,
        document_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Revision>> {
        let conn = self.connect().await?;
        Self::query_all(
            &conn,
            &format!(
                "SELECT {} FROM revisions WHERE document_id = ?
                 ORDER BY version_num DESC LIMIT ? OFFSET ?",
                REVISION_COLUMNS
            ),
            (document_id, Self::sql_count(limit), Self::sql_count(offset)),
            Self::row_to_revision,
        )
        .await
    }

    async fn revisions_in_range(
        &self,
        document_id: &str,
        after: i64,
        up_to: i64,
    ) -> Result<Vec<Revision>> {
        let conn = self.connect().await?;
        Self::query_all(
            &conn,
            &format!(
                "SELECT {} FROM revisions
                 WHERE document_id = ? AND version_num > ? AND version_num <= ?
                 ORDER BY version_num",
                REVISION_COLUMNS
            ),
            (document_id, after, up_to),
            Self::row_to_revision,
        )
        .await
    }

    async fn commit_batch(
        &self,
        commit: Commit,
        files: Vec<VersionCommit>,
    ) -> Result<BatchOutcome> {
        let conn = self.connect().await?;
        Self::begin(&conn).await?;

        let mut revisions = Vec::with_capacity(files.len());
        for file in &files {
            let applied = match Self::apply_version_commit(&conn, file, Some(&commit.id)).await {
                Ok(applied) => applied,
                Err(e) => {
                    Self::rollback(&conn).await;
                    return Err(e);
                }
            };

            if let Some(revision) = applied {
                revisions.push(revision);
                continue;
            }

            // Find out why the conditional update matched nothing, then undo the batch
            let actual = Self::current_version(&conn, &file.document_id).await;
            Self::rollback(&conn).await;
            return Ok(match actual? {
                Some(actual_version) => BatchOutcome::VersionMismatch {
                    document_id: file.document_id.clone(),
                    expected_version: file.expected_version,
                    actual_version,
                },
                None => BatchOutcome::DocumentMissing {
                    document_id: file.document_id.clone(),
                },
            });
        }

        let inserted = conn
            .execute(
                &format!(
                    "INSERT INTO commits ({}) VALUES (?, ?, ?, ?, ?, ?)",
                    COMMIT_COLUMNS
                ),
                (
                    commit.id.as_str(),
                    commit.project_id.as_str(),
                    commit.author_id.as_str(),
                    commit.message.as_str(),
                    commit.file_count as i64,
                    Self::format_timestamp(&commit.created_at),
                ),
            )
            .await
            .with_context(|| format!("Failed to insert commit {}", commit.id))
            .map(|_| BatchOutcome::Committed(revisions));

        Self::finish(&conn, inserted).await
    }

    async fn list_commits(
        &self,
        project_id: &str,
        author_id: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Commit>> {
        let conn = self.connect().await?;
        Self::query_all(
            &conn,
            &format!(
                "SELECT {} FROM commits
                 WHERE project_id = ? AND (? IS NULL OR author_id = ?)
                 ORDER BY created_at DESC, rowid DESC LIMIT ? OFFSET ?",
                COMMIT_COLUMNS
            ),
            (
                project_id,
                author_id,
                author_id,
                Self::sql_count(limit),
                Self::sql_count(offset),
            ),
            Self::row_to_commit,
        )
        .await
    }

    async fn get_commit(&self, project_id: &str, commit_id: &str) -> Result<Option<Commit>> {
        let conn = self.connect().await?;
        Self::query_one(
            &conn,
            &format!(
                "SELECT {} FROM commits WHERE id = ? AND project_id = ?",
                COMMIT_COLUMNS
            ),
            [commit_id, project_id],
            Self::row_to_commit,
        )
        .await
    }

    async fn revisions_for_commit(&self, commit_id: &str) -> Result<Vec<Revision>> {
        let conn = self.connect().await?;
        Self::query_all(
            &conn,
            &format!(
                "SELECT {} FROM revisions WHERE commit_id = ? ORDER BY document_id",
                REVISION_COLUMNS
            ),
            [commit_id],
            Self::row_to_revision,
        )
        .await
    }
}

#[async_trait]
impl PatchStore for SqliteStore {
    async fn save_patch(&self, patch: Patch) -> Result<Patch> {
        let diff_json =
            serde_json::to_string(&patch.diff).context("Failed to serialize patch diff")?;

        let conn = self.connect().await?;
        conn.execute(
            &format!(
                "INSERT INTO patches ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                PATCH_COLUMNS
            ),
            (
                patch.id.as_str(),
                patch.document_id.as_str(),
                patch.project_id.as_str(),
                patch.base_version,
                diff_json,
                patch.status.as_str(),
                patch.created_by.as_str(),
                patch.message.as_str(),
                Self::format_timestamp(&patch.created_at),
                Self::format_timestamp(&patch.updated_at),
            ),
        )
        .await
        .with_context(|| format!("Failed to insert patch {}", patch.id))?;
        Ok(patch)
    }

    async fn get_patch(&self, patch_id: &str) -> Result<Option<Patch>> {
        let conn = self.connect().await?;
        Self::query_one(
            &conn,
            &format!("SELECT {} FROM patches WHERE id = ?", PATCH_COLUMNS),
            [patch_id],
            Self::row_to_patch,
        )
        .await
    }

    async fn update_patch_status(
        &self,
        patch_id: &str,
        from: PatchStatus,
        to: PatchStatus,
    ) -> Result<bool> {
        let conn = self.connect().await?;
        let updated = conn
            .execute(
                "UPDATE patches SET status = ?, updated_at = ? WHERE id = ? AND status = ?",
                (
                    to.as_str(),
                    Self::format_timestamp(&Utc::now()),
                    patch_id,
                    from.as_str(),
                ),
            )
            .await
            .with_context(|| format!("Failed to update status of patch {}", patch_id))?;
        Ok(updated == 1)
    }

    async fn list_patches(
        &self,
        document_id: &str,
        status: Option<PatchStatus>,
    ) -> Result<Vec<Patch>> {
        let conn = self.connect().await?;
        let status = status.map(|s| s.as_str());
        Self::query_all(
            &conn,
            &format!(
                "SELECT {} FROM patches
                 WHERE document_id = ? AND (? IS NULL OR status = ?)
                 ORDER BY created_at DESC, rowid DESC",
                PATCH_COLUMNS
            ),
            (document_id, status, status),
            Self::row_to_patch,
        )
        .await
    }
}
