//! Capture pipeline metrics
//!
//! Counts what flows through the input queue and the tracking service, and
//! how often the platform layer degraded. Implements [`CaptureObserver`] so
//! the tracking service reports into it directly.
//!
//! ## Design
//! - **Simple atomic counters** - No locking needed
//! - **Relaxed ordering** - Independent counters, no derived metrics

use std::sync::atomic::{AtomicU64, Ordering};

use deskpulse_core::CaptureObserver;

use crate::observability::{log_metric, MetricsResult};

/// Snapshot of capture statistics at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct CaptureStats {
    /// Events applied by the tracking service
    pub events_processed: u64,
    /// Foreground-change notifications resolved
    pub foreground_changes: u64,
    /// Resolutions that fell back to partial or placeholder data
    pub degraded_resolutions: u64,
    /// Hook registration attempts that failed
    pub hook_failures: u64,
    /// Events stamped before the open bucket and counted in it
    pub late_events_rerouted: u64,
    /// Events drained from the queue during stop
    pub events_drained: u64,
    /// Closed aggregates the storage collaborator rejected
    pub storage_failures: u64,
}

/// Metrics for the capture pipeline
#[derive(Debug, Default)]
pub struct CaptureMetrics {
    events_processed: AtomicU64,
    foreground_changes: AtomicU64,
    degraded_resolutions: AtomicU64,
    hook_failures: AtomicU64,
    late_events_rerouted: AtomicU64,
    events_drained: AtomicU64,
    storage_failures: AtomicU64,
}

impl CaptureMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_event(&self) -> MetricsResult<()> {
        self.events_processed.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    pub fn record_foreground_change(&self) -> MetricsResult<()> {
        self.foreground_changes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    pub fn record_degraded_resolution(&self) -> MetricsResult<()> {
        self.degraded_resolutions.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Record a failed hook registration
    ///
    /// The error message is logged via tracing but not stored in metrics.
    pub fn record_hook_failure(&self, error: &str) -> MetricsResult<()> {
        let total = self.hook_failures.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::warn!(error = %error, total_failures = total, "Input hook registration failed");
        Ok(())
    }

    pub fn record_late_event(&self) -> MetricsResult<()> {
        self.late_events_rerouted.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Record events drained from the queue during stop
    pub fn record_drained(&self, count: u64) -> MetricsResult<()> {
        self.events_drained.fetch_add(count, Ordering::Relaxed);
        Ok(())
    }

    pub fn record_storage_failure(&self) -> MetricsResult<()> {
        self.storage_failures.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Get capture statistics as a structured snapshot
    pub fn stats(&self) -> CaptureStats {
        CaptureStats {
            events_processed: self.events_processed.load(Ordering::Relaxed),
            foreground_changes: self.foreground_changes.load(Ordering::Relaxed),
            degraded_resolutions: self.degraded_resolutions.load(Ordering::Relaxed),
            hook_failures: self.hook_failures.load(Ordering::Relaxed),
            late_events_rerouted: self.late_events_rerouted.load(Ordering::Relaxed),
            events_drained: self.events_drained.load(Ordering::Relaxed),
            storage_failures: self.storage_failures.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters to zero
    pub fn reset(&self) -> MetricsResult<()> {
        for counter in [
            &self.events_processed,
            &self.foreground_changes,
            &self.degraded_resolutions,
            &self.hook_failures,
            &self.late_events_rerouted,
            &self.events_drained,
            &self.storage_failures,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
        Ok(())
    }
}

impl CaptureObserver for CaptureMetrics {
    fn event_processed(&self) {
        log_metric(self.record_event(), "capture.events_processed");
    }

    fn foreground_changed(&self) {
        log_metric(self.record_foreground_change(), "capture.foreground_changes");
    }

    fn resolution_degraded(&self) {
        log_metric(self.record_degraded_resolution(), "capture.degraded_resolutions");
    }

    fn late_event_rerouted(&self) {
        log_metric(self.record_late_event(), "capture.late_events_rerouted");
    }

    fn storage_failed(&self) {
        log_metric(self.record_storage_failure(), "capture.storage_failures");
    }
}
