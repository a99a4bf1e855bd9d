//! PatchStore Trait - Pending Patch Persistence

use crate::models::{Patch, PatchStatus};
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait PatchStore: Send + Sync {
    /// Insert a new patch
    async fn save_patch(&self, patch: Patch) -> Result<Patch>;

    async fn get_patch(&self, patch_id: &str) -> Result<Option<Patch>>;

    /// Move a patch from `from` to `to` only if it is currently in `from`
    ///
    /// Returns `false` when the patch is absent or in another state, which is
    /// how a terminal status is guaranteed to be reached exactly once.
    async fn update_patch_status(
        &self,
        patch_id: &str,
        from: PatchStatus,
        to: PatchStatus,
    ) -> Result<bool>;

    /// Patches of a document newest first, optionally filtered by status
    async fn list_patches(
        &self,
        document_id: &str,
        status: Option<PatchStatus>,
    ) -> Result<Vec<Patch>>;
}
