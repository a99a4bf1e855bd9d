//! Version retry queue for optimistic concurrency control
//!
//! Wraps [`VersionService`] for callers that compute new content from the
//! current content (append a paragraph, apply a find/replace). Instead of
//! failing on the first `VersionConflict`, the queue re-fetches the document,
//! recomputes the edit against the fresh content and tries again with
//! exponential backoff.
//!
//! # Example
//!
//! ```no_run
//! use manuscript_core::services::{VersionRetryQueue, VersionService};
//! use std::sync::Arc;
//!
//! # async fn example(service: Arc<VersionService>) -> Result<(), Box<dyn std::error::Error>> {
//! let queue = VersionRetryQueue::new(service);
//!
//! // Retry up to 3 times with exponential backoff (10ms, 20ms, 40ms)
//! queue
//!     .update_with_retry("doc-1", "alice", "append", |content| format!("{}\nTHE END", content), 3)
//!     .await?;
//! # Ok(())
//! # }
//! ```

use crate::models::Revision;
use crate::services::error::ServiceError;
use crate::services::version_service::VersionService;
use std::sync::Arc;
use tokio::time::Duration;

/// Retries content edits on version conflicts
pub struct VersionRetryQueue {
    service: Arc<VersionService>,
    base_delay: Duration,
}

impl VersionRetryQueue {
    /// Backoff starts at the service's `retry_base_delay_ms`
    pub fn new(service: Arc<VersionService>) -> Self {
        let base_delay = Duration::from_millis(service.config().retry_base_delay_ms);
        Self {
            service,
            base_delay,
        }
    }

    /// Apply `edit` to the freshest content, retrying on version conflicts
    ///
    /// # Retry Behavior
    ///
    /// - **Retry on**: `ServiceError::VersionConflict` only
    /// - **Backoff**: Exponential from the base delay (10ms, 20ms, 40ms, ...)
    /// - **Fresh data**: Each attempt re-reads content and version
    /// - **Other errors**: Fail immediately without retry
    ///
    /// `max_retries = 0` makes a single attempt.
    pub async fn update_with_retry<F>(
        &self,
        document_id: &str,
        author_id: &str,
        message: &str,
        edit: F,
        max_retries: usize,
    ) -> Result<Revision, ServiceError>
    where
        F: Fn(&str) -> String + Send + Sync,
    {
        let mut attempt = 0;

        loop {
            let document = self.service.get_document(document_id).await?;
            let new_content = edit(&document.content);

            match self
                .service
                .update_content_with_version(
                    document_id,
                    author_id,
                    message,
                    &new_content,
                    document.current_version,
                )
                .await
            {
                Ok(revision) => {
                    if attempt > 0 {
                        tracing::debug!(
                            "Update of '{}' succeeded after {} retry(ies)",
                            document_id,
                            attempt
                        );
                    }
                    return Ok(revision);
                }

                Err(ServiceError::VersionConflict {
                    expected_version,
                    actual_version,
                    ..
                }) if attempt < max_retries => {
                    tracing::debug!(
                        "Version conflict on attempt {}/{} for '{}': expected v{}, got v{}. Retrying...",
                        attempt + 1,
                        max_retries + 1,
                        document_id,
                        expected_version,
                        actual_version
                    );

                    let backoff = self.base_delay * (1u32 << attempt.min(16));
                    tokio::time::sleep(backoff).await;

                    attempt += 1;
                }

                Err(e) => return Err(e),
            }
        }
    }
}
