//! Collaborator seams for the job tracker.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tracing::info;

use tiksight_client::{ApiClient, ClientResult};
use tiksight_models::{JobId, ProgressResponse};

/// Per-job progress source, polled once per cycle for every non-terminal
/// job.
#[async_trait]
pub trait ProgressSource: Send + Sync {
    /// Fetch the latest status for one job.
    async fn poll_progress(&self, job_id: &JobId) -> ClientResult<ProgressResponse>;
}

#[async_trait]
impl ProgressSource for ApiClient {
    async fn poll_progress(&self, job_id: &JobId) -> ClientResult<ProgressResponse> {
        ApiClient::poll_progress(self, job_id).await
    }
}

/// Owner of the video collection, asked to refresh when imports complete.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait VideoLibrary: Send + Sync {
    /// Re-fetch the collection; returns once the refreshed list is loaded.
    async fn refresh(&self) -> ClientResult<()>;
}

#[async_trait]
impl VideoLibrary for ApiClient {
    async fn refresh(&self) -> ClientResult<()> {
        let videos = self.fetch_videos().await?;
        info!(count = videos.len(), "Video library refreshed");
        Ok(())
    }
}
