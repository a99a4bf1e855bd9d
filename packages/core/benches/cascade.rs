//! Performance benchmarks for Manuscript core operations
//!
//! Run with: `cargo bench -p manuscript-core`
//!
//! These benchmarks measure critical path performance:
//! - Cascaded rename of a populated subtree (in-memory and SQLite)
//! - OCC (Optimistic Concurrency Control) edit cycle

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use manuscript_core::db::{DatabaseService, MemoryStore, SqliteStore, TreeStore};
use manuscript_core::models::NewNode;
use manuscript_core::{CoreConfig, NodeService, VersionService};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::runtime::Runtime;

/// Build `Vol/Ch {i}/Scene {j}` with `chapters * scenes` leaves; returns the volume id
async fn seed_volume(service: &NodeService, chapters: usize, scenes: usize) -> String {
    let vol = service
        .create_node(NewNode::folder("bench", "Vol"))
        .await
        .unwrap();
    for i in 0..chapters {
        let ch = service
            .create_node(NewNode::folder("bench", format!("Ch {}", i)).under(&vol.id))
            .await
            .unwrap();
        for j in 0..scenes {
            service
                .create_node(NewNode::file("bench", format!("Scene {}", j)).under(&ch.id))
                .await
                .unwrap();
        }
    }
    vol.id
}

/// Benchmark renaming a volume whose subtree must be rewritten
///
/// Each iteration flips the name back and forth so every rename cascades.
fn bench_cascade_rename(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let mut group = c.benchmark_group("cascade_rename");
    group.sample_size(20);

    for subtree in [10usize, 100, 1000] {
        group.bench_with_input(BenchmarkId::new("memory", subtree), &subtree, |b, &subtree| {
            b.iter_custom(|iters| {
                rt.block_on(async {
                    let store: Arc<dyn TreeStore> = Arc::new(MemoryStore::new());
                    let service = NodeService::new(store, CoreConfig::default());
                    let vol = seed_volume(&service, 10, subtree / 10).await;

                    let start = std::time::Instant::now();
                    for i in 0..iters {
                        let name = if i % 2 == 0 { "Volume" } else { "Vol" };
                        black_box(service.rename_node("bench", &vol, name).await.unwrap());
                    }
                    start.elapsed()
                })
            });
        });
    }

    group.bench_function("sqlite/100", |b| {
        b.iter_custom(|iters| {
            rt.block_on(async {
                let temp = TempDir::new().unwrap();
                let db = Arc::new(DatabaseService::new(temp.path().join("bench.db")).await.unwrap());
                let service = NodeService::new(Arc::new(SqliteStore::new(db)), CoreConfig::default());
                let vol = seed_volume(&service, 10, 10).await;

                let start = std::time::Instant::now();
                for i in 0..iters {
                    let name = if i % 2 == 0 { "Volume" } else { "Vol" };
                    black_box(service.rename_node("bench", &vol, name).await.unwrap());
                }
                start.elapsed()
            })
        });
    });

    group.finish();
}

/// Benchmark the read-version-then-commit cycle against SQLite
fn bench_occ_update(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    c.bench_function("occ_update_cycle", |b| {
        b.iter_custom(|iters| {
            rt.block_on(async {
                let temp = TempDir::new().unwrap();
                let db = Arc::new(DatabaseService::new(temp.path().join("bench.db")).await.unwrap());
                let store = Arc::new(SqliteStore::new(db));
                let service = VersionService::new(store.clone(), store, CoreConfig::default());
                service
                    .create_document("bench", Some("doc".to_string()), "start", "bench")
                    .await
                    .unwrap();

                let start = std::time::Instant::now();
                for i in 0..iters {
                    let version = service.get_current_version("doc").await.unwrap();
                    service
                        .update_content_with_version(
                            "doc",
                            "bench",
                            "edit",
                            &format!("content {}", i),
                            version,
                        )
                        .await
                        .unwrap();
                }
                start.elapsed()
            })
        });
    });
}

criterion_group!(benches, bench_cascade_rename, bench_occ_update);
criterion_main!(benches);
