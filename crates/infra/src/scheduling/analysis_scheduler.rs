//! Cron scheduler for periodic behaviour analysis
//!
//! Triggers an [`AnalysisJob`] on a cron schedule (seconds field included).
//! The default job, [`PatternDetectionJob`], mines the previous local day's
//! app sessions for usage patterns and stores them. Join handles are
//! tracked, cancellation is explicit and every asynchronous step runs under a
//! timeout.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use deskpulse_infra::scheduling::{
//!     AnalysisJob, AnalysisScheduler, AnalysisSchedulerConfig, SchedulerResult,
//! };
//!
//! # async fn example(job: Arc<dyn AnalysisJob>) -> SchedulerResult<()> {
//! let mut scheduler = AnalysisScheduler::with_config(
//!     AnalysisSchedulerConfig {
//!         cron_expression: "0 5 0 * * *".into(), // 00:05:00 every day
//!         ..Default::default()
//!     },
//!     job,
//! )
//! .await?;
//!
//! scheduler.start().await?;
//! // ... application runs ...
//! scheduler.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use deskpulse_core::BehaviorAnalyzer;
use deskpulse_domain::{AnalysisConfig, DeskPulseError};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::errors::InfraError;
use crate::scheduling::error::{SchedulerError, SchedulerResult};

/// A unit of batch analysis work.
#[async_trait]
pub trait AnalysisJob: Send + Sync {
    /// Execute the job.
    async fn run(&self) -> Result<(), InfraError>;
}

/// Detects and stores usage patterns for the previous local day.
pub struct PatternDetectionJob {
    analyzer: Arc<BehaviorAnalyzer>,
}

impl PatternDetectionJob {
    pub fn new(analyzer: Arc<BehaviorAnalyzer>) -> Self {
        Self { analyzer }
    }

    /// The day before today in the analyzer's offset.
    pub fn target_date(&self) -> Result<NaiveDate, InfraError> {
        let today = Utc::now().with_timezone(&self.analyzer.offset()).date_naive();
        today
            .pred_opt()
            .ok_or_else(|| InfraError(DeskPulseError::Internal("no previous day".to_string())))
    }
}

#[async_trait]
impl AnalysisJob for PatternDetectionJob {
    async fn run(&self) -> Result<(), InfraError> {
        let date = self.target_date()?;
        let patterns = self.analyzer.detect_and_store_patterns(date).await?;
        info!(%date, patterns = patterns.len(), "usage patterns stored");
        Ok(())
    }
}

/// Configuration for the analysis scheduler.
#[derive(Debug, Clone)]
pub struct AnalysisSchedulerConfig {
    /// Cron expression describing the execution schedule.
    pub cron_expression: String,
    /// Timeout applied to a single job execution.
    pub job_timeout: Duration,
    /// Timeout for starting the underlying scheduler.
    pub start_timeout: Duration,
    /// Timeout for stopping the scheduler.
    pub stop_timeout: Duration,
    /// Timeout for awaiting the monitor task join handle.
    pub join_timeout: Duration,
}

impl Default for AnalysisSchedulerConfig {
    fn default() -> Self {
        Self::from(&AnalysisConfig::default())
    }
}

impl From<&AnalysisConfig> for AnalysisSchedulerConfig {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            cron_expression: config.pattern_cron.clone(),
            job_timeout: Duration::from_secs(config.job_timeout_secs),
            start_timeout: Duration::from_secs(5),
            stop_timeout: Duration::from_secs(5),
            join_timeout: Duration::from_secs(5),
        }
    }
}

/// Outcome counters for scheduled runs
#[derive(Debug, Default)]
struct RunCounters {
    succeeded: AtomicU64,
    failed: AtomicU64,
    timed_out: AtomicU64,
}

/// Snapshot of scheduled run outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct AnalysisRunStats {
    pub succeeded: u64,
    pub failed: u64,
    pub timed_out: u64,
}

/// Analysis scheduler with explicit lifecycle management.
pub struct AnalysisScheduler {
    scheduler: Arc<RwLock<JobScheduler>>,
    config: AnalysisSchedulerConfig,
    job_id: Uuid,
    monitor_handle: Option<JoinHandle<()>>,
    cancellation: CancellationToken,
    counters: Arc<RunCounters>,
    job: Arc<dyn AnalysisJob>,
}

impl AnalysisScheduler {
    /// Create a scheduler with the default timeouts.
    pub async fn new(cron_expression: String, job: Arc<dyn AnalysisJob>) -> SchedulerResult<Self> {
        let config = AnalysisSchedulerConfig { cron_expression, ..Default::default() };
        Self::with_config(config, job).await
    }

    /// Create a scheduler with a custom configuration.
    ///
    /// # Errors
    /// `JobRegistrationFailed` if the cron expression is invalid.
    pub async fn with_config(
        config: AnalysisSchedulerConfig,
        job: Arc<dyn AnalysisJob>,
    ) -> SchedulerResult<Self> {
        let raw_scheduler =
            JobScheduler::new().await.map_err(|source| SchedulerError::CreationFailed { source })?;

        let mut scheduler = Self {
            scheduler: Arc::new(RwLock::new(raw_scheduler)),
            config,
            job_id: Uuid::nil(),
            monitor_handle: None,
            cancellation: CancellationToken::new(),
            counters: Arc::new(RunCounters::default()),
            job,
        };

        scheduler.job_id = scheduler.register_job().await?;
        Ok(scheduler)
    }

    /// Start the scheduler, spawning the monitoring task.
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        self.cancellation = CancellationToken::new();

        let scheduler = self.scheduler.clone();
        let start_timeout = self.config.start_timeout;
        let start_result = tokio::time::timeout(start_timeout, async move {
            let guard = scheduler.write().await;
            guard.start().await
        })
        .await
        .map_err(|source| SchedulerError::Timeout { duration: start_timeout, source })?;

        start_result.map_err(|source| SchedulerError::StartFailed { source })?;

        let cancel = self.cancellation.clone();
        let handle = tokio::spawn(async move {
            cancel.cancelled().await;
            debug!("Analysis scheduler monitor cancelled");
        });

        self.monitor_handle = Some(handle);
        info!(cron = %self.config.cron_expression, "Analysis scheduler started");
        Ok(())
    }

    /// Stop the scheduler and wait for the monitor task to finish.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        if !self.is_running() {
            return Err(SchedulerError::NotRunning);
        }

        self.cancellation.cancel();

        let scheduler = self.scheduler.clone();
        let stop_timeout = self.config.stop_timeout;
        let stop_result = tokio::time::timeout(stop_timeout, async move {
            let mut guard = scheduler.write().await;
            guard.shutdown().await
        })
        .await
        .map_err(|source| SchedulerError::Timeout { duration: stop_timeout, source })?;

        stop_result.map_err(|source| SchedulerError::StopFailed { source })?;

        if let Some(handle) = self.monitor_handle.take() {
            let join_timeout = self.config.join_timeout;
            tokio::time::timeout(join_timeout, handle)
                .await
                .map_err(|source| SchedulerError::Timeout { duration: join_timeout, source })??
        }

        info!("Analysis scheduler stopped");
        self.cancellation = CancellationToken::new();
        Ok(())
    }

    /// Returns true when the monitor task is active.
    pub fn is_running(&self) -> bool {
        self.monitor_handle.as_ref().map_or(false, |handle| !handle.is_finished())
    }

    /// Outcomes of the scheduled runs so far.
    pub fn stats(&self) -> AnalysisRunStats {
        AnalysisRunStats {
            succeeded: self.counters.succeeded.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            timed_out: self.counters.timed_out.load(Ordering::Relaxed),
        }
    }

    /// Run the job once, outside the schedule, under the job timeout.
    pub async fn run_now(&self) -> Result<(), InfraError> {
        run_guarded(self.job.as_ref(), self.config.job_timeout, &self.counters).await
    }

    async fn register_job(&mut self) -> SchedulerResult<Uuid> {
        if self.job_id != Uuid::nil() {
            return Ok(self.job_id);
        }

        let cron_expr = self.config.cron_expression.clone();
        let counters = self.counters.clone();
        let job = self.job.clone();
        let job_timeout = self.config.job_timeout;

        let job_definition = Job::new_async(cron_expr.as_str(), move |_id, _lock| {
            let counters = counters.clone();
            let job = job.clone();

            Box::pin(async move {
                if let Err(err) = run_guarded(job.as_ref(), job_timeout, &counters).await {
                    debug!(error = ?err, "Scheduled analysis run did not complete");
                }
            })
        })
        .map_err(|source| SchedulerError::JobRegistrationFailed { source })?;

        let job_id = job_definition.guid();
        let scheduler = self.scheduler.write().await;
        scheduler
            .add(job_definition)
            .await
            .map_err(|source| SchedulerError::JobRegistrationFailed { source })?;

        debug!(cron = %self.config.cron_expression, job_id = %job_id, "Registered analysis job");
        Ok(job_id)
    }
}

async fn run_guarded(
    job: &dyn AnalysisJob,
    job_timeout: Duration,
    counters: &RunCounters,
) -> Result<(), InfraError> {
    let started = Instant::now();
    match tokio::time::timeout(job_timeout, job.run()).await {
        Ok(Ok(())) => {
            counters.succeeded.fetch_add(1, Ordering::Relaxed);
            debug!(duration_ms = started.elapsed().as_millis() as u64, "Analysis job finished");
            Ok(())
        }
        Ok(Err(err)) => {
            counters.failed.fetch_add(1, Ordering::Relaxed);
            error!(error = ?err, duration_ms = started.elapsed().as_millis() as u64, "Analysis job failed");
            Err(err)
        }
        Err(elapsed) => {
            counters.timed_out.fetch_add(1, Ordering::Relaxed);
            warn!(timeout_secs = job_timeout.as_secs(), "Analysis job timed out");
            Err(InfraError::from(elapsed))
        }
    }
}

impl Drop for AnalysisScheduler {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("AnalysisScheduler dropped while running; cancelling tasks");
            self.cancellation.cancel();
        }
    }
}
