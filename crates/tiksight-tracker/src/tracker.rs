//! The job tracker: poll, merge, completion trigger, prune.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::future::join_all;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use tiksight_client::ClientResult;
use tiksight_models::{ImportJob, ImportStage, JobId, ProgressResponse};

use crate::config::TrackerConfig;
use crate::source::{ProgressSource, VideoLibrary};

/// One tracked job plus tracker-side bookkeeping.
#[derive(Debug)]
struct TrackedJob {
    job: ImportJob,
    /// Last merge time; drives pruning of terminal jobs
    updated_at: Instant,
    /// Failed polls since the last successful one
    consecutive_failures: u32,
}

impl TrackedJob {
    fn new(job: ImportJob) -> Self {
        Self {
            job,
            updated_at: Instant::now(),
            consecutive_failures: 0,
        }
    }
}

/// Maintains the local view of all active import jobs and keeps it
/// synchronized with backend-reported status.
///
/// The tracker owns its job set; callers interact through [`register`],
/// [`snapshot`] and the run/stop lifecycle. One cycle polls every
/// non-terminal job concurrently, merges the responses, asks the
/// [`VideoLibrary`] to refresh when at least one job newly completed, and
/// prunes terminal jobs that have outlived their retention window. The
/// next cycle is scheduled a fixed delay after the previous one finishes,
/// so cycles never overlap.
///
/// [`register`]: JobTracker::register
/// [`snapshot`]: JobTracker::snapshot
pub struct JobTracker {
    source: Arc<dyn ProgressSource>,
    library: Arc<dyn VideoLibrary>,
    config: TrackerConfig,
    jobs: Mutex<HashMap<JobId, TrackedJob>>,
    cancel: CancellationToken,
}

impl JobTracker {
    /// Create a new tracker with an empty job set.
    pub fn new(
        source: Arc<dyn ProgressSource>,
        library: Arc<dyn VideoLibrary>,
        config: TrackerConfig,
    ) -> Self {
        Self {
            source,
            library,
            config,
            jobs: Mutex::new(HashMap::new()),
            cancel: CancellationToken::new(),
        }
    }

    fn lock_jobs(&self) -> MutexGuard<'_, HashMap<JobId, TrackedJob>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start tracking a newly submitted job.
    ///
    /// Registering a job ID that is already tracked leaves the existing
    /// record in place; an empty job ID is ignored. The job becomes
    /// eligible for polling on the next cycle.
    pub fn register(&self, job: ImportJob) {
        if job.job_id.is_empty() {
            warn!(url = %job.url, "Ignoring job registration with empty job ID");
            return;
        }

        let mut jobs = self.lock_jobs();
        if jobs.contains_key(&job.job_id) {
            debug!(job_id = %job.job_id, "Job already tracked; registration ignored");
            return;
        }

        info!(job_id = %job.job_id, url = %job.url, "Tracking import job");
        jobs.insert(job.job_id.clone(), TrackedJob::new(job));
    }

    /// Current view of all tracked jobs, ordered by job ID.
    pub fn snapshot(&self) -> Vec<ImportJob> {
        let jobs = self.lock_jobs();
        let mut out: Vec<ImportJob> = jobs.values().map(|t| t.job.clone()).collect();
        out.sort_by(|a, b| a.job_id.as_str().cmp(b.job_id.as_str()));
        out
    }

    /// True when no jobs are tracked.
    pub fn is_empty(&self) -> bool {
        self.lock_jobs().is_empty()
    }

    /// Run the polling loop until [`stop`] is called.
    ///
    /// Each cycle runs to completion before the next one is scheduled,
    /// measured from the end of the previous cycle. The loop keeps
    /// rescheduling while the job set is empty so jobs registered between
    /// cycles are picked up promptly.
    ///
    /// [`stop`]: JobTracker::stop
    pub async fn run(&self) {
        info!(interval = ?self.config.poll_interval, "Starting import job tracker");

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = self.poll_once() => {}
            }
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }

        debug!("Import job tracker stopped");
    }

    /// Stop the tracker.
    ///
    /// No further cycle runs after this returns; a cycle in flight is
    /// abandoned and its poll responses are discarded rather than merged.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Run a single poll → merge → completion-trigger → prune cycle.
    ///
    /// Exposed for manual invocation; [`run`] calls this on a timer.
    ///
    /// [`run`]: JobTracker::run
    pub async fn poll_once(&self) {
        let pollable: Vec<JobId> = {
            let jobs = self.lock_jobs();
            jobs.values()
                .filter(|t| !t.job.is_terminal())
                .map(|t| t.job.job_id.clone())
                .collect()
        };

        if !pollable.is_empty() {
            // Fan out all polls, fan in before merging; one cycle costs the
            // slowest request, not the sum.
            let polls = pollable.iter().map(|job_id| async move {
                (job_id.clone(), self.source.poll_progress(job_id).await)
            });
            let results = join_all(polls).await;

            if self.merge_results(results) {
                if let Err(error) = self.library.refresh().await {
                    warn!(%error, "Video library refresh failed");
                }
            }
        }

        self.prune();
    }

    /// Merge one cycle's poll results into the job set.
    ///
    /// Returns true when at least one job newly reached `Completed`.
    fn merge_results(&self, results: Vec<(JobId, ClientResult<ProgressResponse>)>) -> bool {
        let mut jobs = self.lock_jobs();
        let mut any_newly_completed = false;

        for (polled_id, result) in results {
            match result {
                Ok(update) => {
                    // The backend is expected to echo the job ID; fall back
                    // to the ID we polled with so a sparse response is not
                    // silently dropped.
                    let job_id = update.job_id.clone().unwrap_or_else(|| polled_id.clone());
                    let tracked = match jobs.get_mut(&job_id) {
                        Some(tracked) => tracked,
                        None => {
                            debug!(%job_id, "Dropping update for unknown job");
                            continue;
                        }
                    };

                    let was_completed = tracked.job.stage == ImportStage::Completed;
                    tracked.job.apply_update(&update);
                    tracked.updated_at = Instant::now();
                    tracked.consecutive_failures = 0;

                    if !was_completed && tracked.job.stage == ImportStage::Completed {
                        info!(job_id = %tracked.job.job_id, url = %tracked.job.url, "Import completed");
                        any_newly_completed = true;
                    } else if tracked.job.stage == ImportStage::Failed {
                        warn!(
                            job_id = %tracked.job.job_id,
                            message = %tracked.job.message,
                            "Import failed"
                        );
                    }
                }
                Err(error) => {
                    let tracked = match jobs.get_mut(&polled_id) {
                        Some(tracked) => tracked,
                        None => continue,
                    };

                    tracked.consecutive_failures += 1;
                    debug!(
                        job_id = %polled_id,
                        %error,
                        "Progress poll failed; keeping previous state"
                    );
                    if tracked.consecutive_failures == self.config.failure_warn_threshold {
                        warn!(
                            job_id = %polled_id,
                            polls = tracked.consecutive_failures,
                            "Job has not reported progress for several polls"
                        );
                    }
                }
            }
        }

        any_newly_completed
    }

    /// Drop terminal jobs that have outlived their retention window.
    ///
    /// Completed jobs linger briefly so the user sees the confirmation,
    /// failed jobs a little longer; non-terminal jobs are never pruned by
    /// age.
    fn prune(&self) {
        let now = Instant::now();
        let mut jobs = self.lock_jobs();
        let before = jobs.len();

        jobs.retain(|_, tracked| {
            let age = now.duration_since(tracked.updated_at);
            match tracked.job.stage {
                ImportStage::Completed => age < self.config.completed_retention,
                ImportStage::Failed => age < self.config.failed_retention,
                _ => true,
            }
        });

        let removed = before - jobs.len();
        if removed > 0 {
            debug!(removed, remaining = jobs.len(), "Pruned finished import jobs");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MockVideoLibrary;
    use std::collections::HashSet;

    use async_trait::async_trait;
    use tiksight_client::ClientError;

    /// Test source returning a fixed response (or failure) per job ID.
    #[derive(Default)]
    struct StubSource {
        responses: HashMap<JobId, ProgressResponse>,
        failing: HashSet<JobId>,
    }

    impl StubSource {
        fn respond(mut self, job_id: &str, response: ProgressResponse) -> Self {
            self.responses.insert(JobId::from(job_id), response);
            self
        }

        fn fail(mut self, job_id: &str) -> Self {
            self.failing.insert(JobId::from(job_id));
            self
        }
    }

    #[async_trait]
    impl ProgressSource for StubSource {
        async fn poll_progress(&self, job_id: &JobId) -> ClientResult<ProgressResponse> {
            if self.failing.contains(job_id) {
                return Err(ClientError::api("injected failure"));
            }
            self.responses
                .get(job_id)
                .cloned()
                .ok_or_else(|| ClientError::api("no response scripted"))
        }
    }

    fn progress(job_id: Option<&str>, status: &str, progress: u8) -> ProgressResponse {
        ProgressResponse {
            job_id: job_id.map(JobId::from),
            status: Some(status.to_string()),
            progress: Some(progress),
            message: None,
            error: None,
        }
    }

    fn quiet_library() -> Arc<MockVideoLibrary> {
        let mut library = MockVideoLibrary::new();
        library.expect_refresh().returning(|| Ok(()));
        Arc::new(library)
    }

    fn job(id: &str) -> ImportJob {
        ImportJob::new(JobId::from(id), format!("https://example.com/{id}"))
    }

    #[tokio::test]
    async fn test_duplicate_registration_is_a_no_op() {
        let tracker = JobTracker::new(
            Arc::new(StubSource::default()),
            quiet_library(),
            TrackerConfig::default(),
        );

        let mut first = job("abc123");
        first.message = "original".to_string();
        tracker.register(first);

        let mut second = job("abc123");
        second.message = "duplicate".to_string();
        tracker.register(second);

        let jobs = tracker.snapshot();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].message, "original");
    }

    #[tokio::test]
    async fn test_empty_job_id_is_rejected() {
        let tracker = JobTracker::new(
            Arc::new(StubSource::default()),
            quiet_library(),
            TrackerConfig::default(),
        );

        tracker.register(ImportJob::new(JobId::from(""), "https://example.com"));
        assert!(tracker.is_empty());
    }

    #[tokio::test]
    async fn test_refresh_fires_once_for_many_completions() {
        let source = StubSource::default()
            .respond("a", progress(Some("a"), "Completed", 100))
            .respond("b", progress(Some("b"), "Completed", 100))
            .respond("c", progress(Some("c"), "Completed", 100));

        let mut library = MockVideoLibrary::new();
        library.expect_refresh().times(1).returning(|| Ok(()));

        let tracker = JobTracker::new(
            Arc::new(source),
            Arc::new(library),
            TrackerConfig::default(),
        );
        tracker.register(job("a"));
        tracker.register(job("b"));
        tracker.register(job("c"));

        tracker.poll_once().await;

        assert!(tracker.snapshot().iter().all(|j| j.stage == ImportStage::Completed));
    }

    #[tokio::test]
    async fn test_missing_job_id_falls_back_to_polled_id() {
        let source = StubSource::default().respond("abc123", progress(None, "Saving", 90));

        let tracker = JobTracker::new(
            Arc::new(source),
            quiet_library(),
            TrackerConfig::default(),
        );
        tracker.register(job("abc123"));

        tracker.poll_once().await;

        let jobs = tracker.snapshot();
        assert_eq!(jobs[0].stage, ImportStage::Saving);
        assert_eq!(jobs[0].progress, 90);
    }

    #[tokio::test]
    async fn test_update_for_unknown_job_is_dropped() {
        // Backend echoes an ID the tracker has never seen
        let source = StubSource::default().respond("abc123", progress(Some("zzz999"), "Saving", 90));

        let tracker = JobTracker::new(
            Arc::new(source),
            quiet_library(),
            TrackerConfig::default(),
        );
        tracker.register(job("abc123"));

        tracker.poll_once().await;

        let jobs = tracker.snapshot();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].stage, ImportStage::Queued);
        assert_eq!(jobs[0].progress, 0);
    }

    #[tokio::test]
    async fn test_failed_poll_keeps_previous_state() {
        let source = StubSource::default().fail("abc123");

        let tracker = JobTracker::new(
            Arc::new(source),
            quiet_library(),
            TrackerConfig::default(),
        );
        tracker.register(job("abc123"));

        tracker.poll_once().await;
        tracker.poll_once().await;

        let jobs = tracker.snapshot();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].stage, ImportStage::Queued);
        assert_eq!(jobs[0].progress, 0);
    }

    #[tokio::test]
    async fn test_refresh_failure_is_swallowed() {
        let source = StubSource::default().respond("a", progress(Some("a"), "Completed", 100));

        let mut library = MockVideoLibrary::new();
        library
            .expect_refresh()
            .times(1)
            .returning(|| Err(ClientError::api("library down")));

        let tracker = JobTracker::new(
            Arc::new(source),
            Arc::new(library),
            TrackerConfig::default(),
        );
        tracker.register(job("a"));

        // Must not panic or abort the cycle
        tracker.poll_once().await;
        assert_eq!(tracker.snapshot()[0].stage, ImportStage::Completed);
    }
}
