//! Backend API client.

use reqwest::Client;
use tracing::{debug, info};
use url::Url;

use tiksight_models::{ImportRequest, ImportResponse, JobId, ProgressResponse, Video};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// HTTP client for the TikSight backend.
///
/// Wraps a connection-pooled `reqwest::Client` with the backend base URL
/// and a per-request timeout. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new client from configuration.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        // Parse to reject junk early; endpoints are joined as strings.
        let base_url = Url::parse(&config.base_url)?;

        let http = Client::builder().timeout(config.request_timeout).build()?;

        Ok(Self {
            http,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Submit a video URL for import.
    ///
    /// A non-success status or an application-level `error` payload (e.g.
    /// the backend's duplicate-submission guard) maps to an error; the
    /// caller gets a job descriptor only for an accepted submission.
    pub async fn submit_import(&self, url: &str) -> ClientResult<ImportResponse> {
        debug!(url, "Submitting video import");

        let response = self
            .http
            .post(self.endpoint("import_video"))
            .json(&ImportRequest {
                url: url.to_string(),
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::UnexpectedStatus { status, body });
        }

        let body: ImportResponse = response.json().await?;
        if let Some(error) = &body.error {
            return Err(ClientError::api(error.clone()));
        }

        info!(job_id = %body.job_id, url, "Import accepted");
        Ok(body)
    }

    /// Fetch the current status of one import job.
    ///
    /// An `error` field in the body is reported as `ClientError::Api` so
    /// callers treat it exactly like a transport failure.
    pub async fn poll_progress(&self, job_id: &JobId) -> ClientResult<ProgressResponse> {
        let response = self
            .http
            .get(self.endpoint(&format!("progress/{job_id}")))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::UnexpectedStatus { status, body });
        }

        let body: ProgressResponse = response.json().await?;
        if let Some(error) = &body.error {
            return Err(ClientError::api(error.clone()));
        }

        Ok(body)
    }

    /// Fetch the user's full video library.
    pub async fn fetch_videos(&self) -> ClientResult<Vec<Video>> {
        let response = self.http.post(self.endpoint("videos")).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::UnexpectedStatus { status, body });
        }

        let videos: Vec<Video> = response.json().await?;
        debug!(count = videos.len(), "Fetched video library");
        Ok(videos)
    }
}
