//! Headless video importer binary.
//!
//! Submits one or more URLs to the backend, then tracks the import jobs to
//! completion the same way the dashboard does in a browser session.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use url::Url;

use tiksight_client::{ApiClient, ClientConfig};
use tiksight_tracker::{JobTracker, ProgressSource, TrackerConfig, VideoLibrary};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    init_tracing();

    let urls: Vec<String> = std::env::args().skip(1).collect();
    if urls.is_empty() {
        anyhow::bail!("usage: tiksight-importer <video-url>...");
    }

    let config = ClientConfig::from_env();
    info!(base_url = %config.base_url, "Starting tiksight-importer");

    let client = Arc::new(ApiClient::new(config).context("Failed to build API client")?);
    let source: Arc<dyn ProgressSource> = client.clone();
    let library: Arc<dyn VideoLibrary> = client.clone();
    let tracker = Arc::new(JobTracker::new(source, library, TrackerConfig::from_env()));

    for raw_url in &urls {
        if let Err(error) = Url::parse(raw_url) {
            error!(url = %raw_url, %error, "Skipping invalid URL");
            continue;
        }

        match client.submit_import(raw_url).await {
            Ok(response) => tracker.register(response.into_job(raw_url)),
            Err(error) => error!(url = %raw_url, %error, "Import submission rejected"),
        }
    }

    if tracker.is_empty() {
        anyhow::bail!("No imports were accepted");
    }

    let run_handle = tokio::spawn({
        let tracker = Arc::clone(&tracker);
        async move { tracker.run().await }
    });

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted; stopping tracker");
                break;
            }
            _ = tokio::time::sleep(Duration::from_secs(1)) => {
                let jobs = tracker.snapshot();
                for job in &jobs {
                    info!(
                        job_id = %job.job_id,
                        stage = %job.stage,
                        progress = job.progress,
                        "{}", job.message
                    );
                }
                if jobs.iter().all(|job| job.is_terminal()) {
                    info!("All imports finished");
                    break;
                }
            }
        }
    }

    tracker.stop();
    run_handle.await.ok();

    Ok(())
}

fn init_tracing() {
    // Colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}
