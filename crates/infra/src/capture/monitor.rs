//! Capture monitor: input source lifecycle plus the single consumer task
//!
//! Hook callbacks only enqueue. The consumer task is the sole owner of the
//! tracking state: it applies queued events in arrival order, runs the idle
//! ticker, and on stop drains whatever is still queued before force-closing
//! every open aggregate.
//!
//! Stop sequence:
//! 1. stop the input source (no new events)
//! 2. cancel the consumer
//! 3. consumer drains the queue and closes the open app session, burst,
//!    trail, click cluster and hourly buckets
//! 4. join the consumer within `stop_timeout`, aborting it on timeout

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use deskpulse_core::tracking::ports::{EventSink, InputSource};
use deskpulse_core::{TrackingEvent, TrackingService};
use deskpulse_domain::{CaptureConfig, CaptureEvent, DeskPulseError, Result};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::errors::InfraError;
use crate::observability::log_metric;
use crate::observability::metrics::CaptureMetrics;

/// Timing for the consumer task
#[derive(Debug, Clone, Copy)]
pub struct CaptureMonitorConfig {
    /// Period of the idle ticker that closes bursts, trails and buckets.
    pub idle_tick: Duration,
    /// Upper bound on drain + close + join during stop.
    pub stop_timeout: Duration,
}

impl Default for CaptureMonitorConfig {
    fn default() -> Self {
        Self::from(&CaptureConfig::default())
    }
}

impl From<&CaptureConfig> for CaptureMonitorConfig {
    fn from(config: &CaptureConfig) -> Self {
        Self {
            idle_tick: Duration::from_millis(config.idle_tick_ms.max(1)),
            stop_timeout: Duration::from_millis(config.stop_timeout_ms),
        }
    }
}

/// Capture monitor with explicit lifecycle management.
///
/// The tracking service moves into the consumer task on start and is handed
/// back on a clean stop, so the monitor can be restarted.
pub struct CaptureMonitor {
    source: Arc<dyn InputSource>,
    tracking: Option<TrackingService>,
    events: broadcast::Sender<TrackingEvent>,
    metrics: Arc<CaptureMetrics>,
    config: CaptureMonitorConfig,
    cancellation: CancellationToken,
    consumer: Option<JoinHandle<TrackingService>>,
}

impl CaptureMonitor {
    pub fn new(
        source: Arc<dyn InputSource>,
        tracking: TrackingService,
        metrics: Arc<CaptureMetrics>,
        config: CaptureMonitorConfig,
    ) -> Self {
        Self {
            source,
            events: tracking.event_sender(),
            tracking: Some(tracking),
            metrics,
            config,
            cancellation: CancellationToken::new(),
            consumer: None,
        }
    }

    /// Subscribe to tracking notifications. Valid before and after start.
    pub fn subscribe(&self) -> broadcast::Receiver<TrackingEvent> {
        self.events.subscribe()
    }

    pub fn metrics(&self) -> &Arc<CaptureMetrics> {
        &self.metrics
    }

    /// Returns true while the consumer task is active.
    pub fn is_running(&self) -> bool {
        self.consumer.as_ref().map_or(false, |handle| !handle.is_finished())
    }

    /// Register the input source and spawn the consumer task.
    ///
    /// # Errors
    /// - `InvalidInput` if already running
    /// - `Internal` if a previous stop timed out and the tracking state was lost
    /// - the input source's error if hook registration fails; the monitor
    ///   stays stopped and `start` may be retried
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> Result<()> {
        if self.is_running() {
            return Err(DeskPulseError::InvalidInput("Capture monitor already running".to_string()));
        }
        let tracking = self.tracking.take().ok_or_else(|| {
            DeskPulseError::Internal("Tracking state was lost by an aborted stop".to_string())
        })?;

        let (sender, receiver) = mpsc::unbounded_channel();
        if let Err(err) = self.source.start(EventSink::new(sender)) {
            log_metric(self.metrics.record_hook_failure(&err.to_string()), "capture.hook_failures");
            self.tracking = Some(tracking);
            return Err(err);
        }

        self.cancellation = CancellationToken::new();
        let cancel = self.cancellation.clone();
        let metrics = Arc::clone(&self.metrics);
        let idle_tick = self.config.idle_tick;
        self.consumer = Some(tokio::spawn(async move {
            consume(tracking, receiver, cancel, idle_tick, metrics).await
        }));

        info!(idle_tick_ms = idle_tick.as_millis() as u64, "capture monitor started");
        Ok(())
    }

    /// Stop capturing and flush all open state. Idempotent.
    ///
    /// # Errors
    /// Returns `Internal` if the consumer did not finish within the stop
    /// timeout (it is aborted) or panicked.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> Result<()> {
        let Some(mut handle) = self.consumer.take() else {
            debug!("capture monitor already stopped");
            return Ok(());
        };

        if let Err(err) = self.source.stop() {
            warn!(error = %err, "failed to stop input source; continuing shutdown");
        }
        self.cancellation.cancel();

        let stop_timeout = self.config.stop_timeout;
        match tokio::time::timeout(stop_timeout, &mut handle).await {
            Ok(Ok(tracking)) => {
                self.tracking = Some(tracking);
                info!("capture monitor stopped");
                Ok(())
            }
            Ok(Err(join_err)) => Err(InfraError::from(join_err).into()),
            Err(_) => {
                handle.abort();
                warn!(timeout_ms = stop_timeout.as_millis() as u64, "capture consumer aborted");
                Err(DeskPulseError::Internal(format!(
                    "Capture consumer did not stop within {}ms",
                    stop_timeout.as_millis()
                )))
            }
        }
    }
}

impl Drop for CaptureMonitor {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("CaptureMonitor dropped while running; cancelling consumer");
            if let Err(err) = self.source.stop() {
                warn!(error = %err, "failed to stop input source on drop");
            }
            self.cancellation.cancel();
        }
    }
}

async fn consume(
    mut tracking: TrackingService,
    mut receiver: mpsc::UnboundedReceiver<CaptureEvent>,
    cancel: CancellationToken,
    idle_tick: Duration,
    metrics: Arc<CaptureMetrics>,
) -> TrackingService {
    let mut ticker = tokio::time::interval(idle_tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            event = receiver.recv() => match event {
                Some(event) => tracking.handle(event).await,
                None => break,
            },
            _ = ticker.tick() => tracking.tick(Utc::now()).await,
        }
    }

    receiver.close();
    let mut drained = 0u64;
    while let Ok(event) = receiver.try_recv() {
        tracking.handle(event).await;
        drained += 1;
    }
    log_metric(metrics.record_drained(drained), "capture.events_drained");
    debug!(drained, "capture queue drained");

    tracking.shutdown(Utc::now()).await;
    tracking
}
