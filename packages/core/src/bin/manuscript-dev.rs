//! Development Walkthrough Binary
//!
//! Opens (or creates) the local database and runs a short scripted session
//! against the real services: builds a small tree, renames and moves it,
//! then edits, rolls back and patches a document. Useful for eyeballing the
//! logs and the resulting database with any SQLite client.
//!
//! # Usage
//!
//! ```bash
//! # Default database (~/.manuscript/database/manuscript.db)
//! cargo run --bin manuscript-dev
//!
//! # Throwaway database with verbose logs
//! MANUSCRIPT_DB_PATH=/tmp/manuscript-dev.db RUST_LOG=debug cargo run --bin manuscript-dev
//! ```
//!
//! # Environment Variables
//!
//! - `MANUSCRIPT_DB_PATH`: Database file
//! - `MANUSCRIPT_PROJECT`: Project id to write into (default: a fresh UUID)
//! - `RUST_LOG`: Logging level (e.g., "info", "debug", "trace")

use std::env;
use std::sync::Arc;

use manuscript_core::models::path::path_depth;
use manuscript_core::models::{NewNode, PatchDiff, TreeEntry};
use manuscript_core::{CoreConfig, DatabaseService, NodeService, SqliteStore, VersionService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Manuscript dev walkthrough");

    let config = CoreConfig::from_env();
    let project = env::var("MANUSCRIPT_PROJECT")
        .ok()
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    tracing::info!("Database: {}", config.database_path.display());
    tracing::info!("Project: {}", project);

    let db = Arc::new(DatabaseService::from_config(&config).await?);
    let store = Arc::new(SqliteStore::new(db.clone()));
    let nodes = NodeService::new(store.clone(), config.clone());
    let versions = VersionService::new(store.clone(), store, config);

    // Tree
    let vol = nodes.create_node(NewNode::folder(&project, "Vol1")).await?;
    let ch = nodes
        .create_node(NewNode::folder(&project, "Ch1").under(&vol.id))
        .await?;
    let scene = nodes
        .create_node(NewNode::file(&project, "Opening").under(&ch.id))
        .await?;
    let archive = nodes
        .create_node(NewNode::folder(&project, "Archive"))
        .await?;

    nodes.rename_node(&project, &vol.id, "VolumeOne").await?;
    nodes.move_node(&project, &ch.id, Some(&archive.id)).await?;

    if let Err(e) = nodes.move_node(&project, &archive.id, Some(&ch.id)).await {
        tracing::info!("Rejected cyclic move as expected: {}", e);
    }

    for entry in nodes.get_tree(&project).await? {
        log_tree(&entry);
    }

    // Versions; the scene node doubles as the document id
    versions
        .create_document(&project, Some(scene.id.clone()), "It was a dark night.", "dev")
        .await?;
    versions
        .update_content_with_version(
            &scene.id,
            "dev",
            "more drama",
            "It was a dark and stormy night.",
            1,
        )
        .await?;

    if let Err(e) = versions
        .update_content_with_version(&scene.id, "dev", "stale", "lost edit", 1)
        .await
    {
        tracing::info!("Rejected stale edit as expected: {}", e);
    }

    versions.rollback_to_version(&scene.id, 1, "dev", "").await?;

    let patch = versions
        .create_patch(
            &scene.id,
            3,
            PatchDiff::full("It was a bright cold day in April."),
            "editor",
            "new opening",
        )
        .await?;
    versions.apply_patch(&scene.id, &patch.id, "dev").await?;

    for revision in versions.list_revisions(&scene.id, 0, 0).await? {
        tracing::info!(
            "v{} by {}: {:?} ({})",
            revision.version_num,
            revision.author_id,
            revision.content,
            revision.message
        );
    }

    db.close().await?;
    tracing::info!("Done");
    Ok(())
}

fn log_tree(entry: &TreeEntry) {
    let depth = path_depth(&entry.node.relative_path).saturating_sub(1);
    tracing::info!(
        "{}{} ({:?})",
        "  ".repeat(depth),
        entry.node.relative_path,
        entry.node.kind
    );
    for child in &entry.children {
        log_tree(child);
    }
}
