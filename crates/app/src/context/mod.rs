//! Application context - dependency injection container
//!
//! Owns one session store and wires it into the capture pipeline, the
//! browser ingestion server and the nightly analysis scheduler. Components
//! with background tasks are stopped explicitly by [`AppContext::shutdown`]
//! so open sessions and hourly buckets are flushed before exit.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use deskpulse_core::tracking::ports::{AppResolver, InputSource};
use deskpulse_core::{BehaviorAnalyzer, CategoryClassifier, IngestionService, TrackingConfig, TrackingService};
use deskpulse_domain::{Config, DailyReport, DeskPulseError, Result};
use deskpulse_infra::scheduling::{AnalysisJob, AnalysisSchedulerConfig};
use deskpulse_infra::{
    default_input_source, default_resolver, AnalysisScheduler, CaptureMetrics, CaptureMonitor,
    CaptureMonitorConfig, InMemorySessionStore, IngestionMetrics, IngestionServer,
    PatternDetectionJob,
};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::utils::health::{ComponentHealth, HealthStatus};

const SCHEDULER_START_TIMEOUT: Duration = Duration::from_secs(10);

/// Application context - holds all services and their lifecycles
pub struct AppContext {
    pub config: Config,
    pub store: Arc<InMemorySessionStore>,
    pub classifier: Arc<CategoryClassifier>,
    pub analyzer: Arc<BehaviorAnalyzer>,
    pub ingestion: Arc<IngestionService>,
    pub capture_metrics: Arc<CaptureMetrics>,
    pub ingestion_metrics: Arc<IngestionMetrics>,

    capture: Mutex<CaptureMonitor>,
    ingestion_server: Mutex<Option<IngestionServer>>,
    analysis_scheduler: Mutex<AnalysisScheduler>,
}

impl AppContext {
    /// Create the context with the platform's input source and resolver
    pub async fn new(config: Config) -> Result<Self> {
        Self::with_platform(config, default_input_source(), default_resolver()).await
    }

    /// Create the context with explicit platform adapters.
    ///
    /// Capture that fails to start (for example, hooks unavailable on this
    /// platform) is logged and reported by [`Self::health_check`]; the rest
    /// of the process keeps running. A failure to bind the ingestion server
    /// or start the scheduler is returned.
    pub async fn with_platform(
        config: Config,
        input_source: Arc<dyn InputSource>,
        resolver: Arc<dyn AppResolver>,
    ) -> Result<Self> {
        let offset = config.capture.offset();
        let store = Arc::new(InMemorySessionStore::new());
        let classifier = Arc::new(CategoryClassifier::default());

        let capture_metrics = Arc::new(CaptureMetrics::new());
        let tracking = TrackingService::new(
            resolver,
            store.clone(),
            classifier.clone(),
            TrackingConfig::with_offset(offset),
        )
        .with_observer(capture_metrics.clone());
        let mut capture = CaptureMonitor::new(
            input_source,
            tracking,
            capture_metrics.clone(),
            CaptureMonitorConfig::from(&config.capture),
        );
        if config.capture.enabled {
            match capture.start().await {
                Ok(()) => info!("input capture started"),
                Err(err) => warn!(error = %err, "input capture unavailable; continuing without it"),
            }
        } else {
            info!("input capture disabled by configuration");
        }

        let ingestion = Arc::new(IngestionService::new(classifier.clone(), store.clone()));
        let ingestion_metrics = Arc::new(IngestionMetrics::new());
        let ingestion_server = if config.ingestion.enabled {
            Some(IngestionServer::start(&config.ingestion, ingestion.clone(), ingestion_metrics.clone()).await?)
        } else {
            info!("browser ingestion disabled by configuration");
            None
        };

        let analyzer = Arc::new(
            BehaviorAnalyzer::new(store.clone(), store.clone(), offset)
                .with_peak_hours(config.analysis.peak_hours),
        );
        let analysis_scheduler = create_analysis_scheduler(&config, analyzer.clone()).await?;

        info!(utc_offset = %offset, "application context initialized");
        Ok(Self {
            config,
            store,
            classifier,
            analyzer,
            ingestion,
            capture_metrics,
            ingestion_metrics,
            capture: Mutex::new(capture),
            ingestion_server: Mutex::new(ingestion_server),
            analysis_scheduler: Mutex::new(analysis_scheduler),
        })
    }

    /// WebSocket URL the browser extension connects to, while serving.
    pub async fn ingestion_url(&self) -> Option<String> {
        self.ingestion_server.lock().await.as_ref().map(IngestionServer::url)
    }

    pub async fn is_capturing(&self) -> bool {
        self.capture.lock().await.is_running()
    }

    /// Behaviour report for `date` from everything stored so far.
    pub async fn daily_report(&self, date: NaiveDate) -> Result<DailyReport> {
        self.analyzer.daily_report(date).await
    }

    /// Today's report in the configured offset.
    pub async fn today_report(&self) -> Result<DailyReport> {
        let today = Utc::now().with_timezone(&self.analyzer.offset()).date_naive();
        self.daily_report(today).await
    }

    /// Check component health
    pub async fn health_check(&self) -> HealthStatus {
        let mut status = HealthStatus::new();

        let capture = if !self.config.capture.enabled {
            ComponentHealth::disabled("capture")
        } else if self.is_capturing().await {
            ComponentHealth::healthy("capture")
        } else {
            let failures = self.capture_metrics.stats().hook_failures;
            ComponentHealth::unhealthy("capture", format!("not running ({failures} hook failures)"))
        };
        status = status.add_component(capture);

        let ingestion = if !self.config.ingestion.enabled {
            ComponentHealth::disabled("ingestion")
        } else {
            match self.ingestion_server.lock().await.as_ref() {
                Some(server) if server.is_running() => ComponentHealth::healthy("ingestion"),
                Some(_) => ComponentHealth::unhealthy("ingestion", "server task exited"),
                None => ComponentHealth::unhealthy("ingestion", "server stopped"),
            }
        };
        status = status.add_component(ingestion);

        let scheduler = if self.analysis_scheduler.lock().await.is_running() {
            ComponentHealth::healthy("analysis_scheduler")
        } else {
            ComponentHealth::unhealthy("analysis_scheduler", "not running")
        };
        status = status.add_component(scheduler);

        status = status.add_component(ComponentHealth::healthy("storage"));

        status.calculate_score();
        status
    }

    /// Shutdown the application context gracefully. Idempotent.
    ///
    /// Stops capture first (draining queued input and flushing the open app
    /// session and buckets), then the ingestion server (closing connections
    /// and their web sessions), then the scheduler. Every component is
    /// attempted; the first error is returned.
    pub async fn shutdown(&self) -> Result<()> {
        info!("shutdown called on AppContext");
        let mut first_error: Option<DeskPulseError> = None;

        if let Err(err) = self.capture.lock().await.stop().await {
            error!(component = "CaptureMonitor", error = %err, "shutdown failed");
            first_error.get_or_insert(err);
        }

        if let Some(mut server) = self.ingestion_server.lock().await.take() {
            if let Err(err) = server.shutdown().await {
                error!(component = "IngestionServer", error = %err, "shutdown failed");
                first_error.get_or_insert(err);
            }
        }

        let mut scheduler = self.analysis_scheduler.lock().await;
        if scheduler.is_running() {
            if let Err(err) = scheduler.stop().await {
                error!(component = "AnalysisScheduler", error = %err, "shutdown failed");
                first_error.get_or_insert(err.into());
            }
        }

        let capture = self.capture_metrics.stats();
        let ingestion = self.ingestion_metrics.stats();
        info!(
            events_processed = capture.events_processed,
            events_drained = capture.events_drained,
            connections_opened = ingestion.connections_opened,
            frames_received = ingestion.frames_received,
            app_sessions = self.store.app_session_count(),
            web_sessions = self.store.web_session_count(),
            "shutdown complete"
        );

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

async fn create_analysis_scheduler(
    config: &Config,
    analyzer: Arc<BehaviorAnalyzer>,
) -> Result<AnalysisScheduler> {
    let job: Arc<dyn AnalysisJob> = Arc::new(PatternDetectionJob::new(analyzer));
    let scheduler_config = AnalysisSchedulerConfig::from(&config.analysis);

    let mut scheduler = AnalysisScheduler::with_config(scheduler_config, job).await.map_err(|err| {
        error!(error = %err, "failed to construct AnalysisScheduler");
        DeskPulseError::from(err)
    })?;

    // Fail-fast initialization
    tokio::time::timeout(SCHEDULER_START_TIMEOUT, scheduler.start())
        .await
        .map_err(|_| {
            error!(timeout_secs = SCHEDULER_START_TIMEOUT.as_secs(), "AnalysisScheduler start timed out");
            DeskPulseError::Internal(format!(
                "AnalysisScheduler start timed out after {}s",
                SCHEDULER_START_TIMEOUT.as_secs()
            ))
        })?
        .map_err(|err| {
            error!(error = %err, "failed to start AnalysisScheduler");
            DeskPulseError::from(err)
        })?;

    Ok(scheduler)
}
