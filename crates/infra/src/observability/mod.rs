//! Observability infrastructure for logging and metrics
//!
//! - [`logging`]: `tracing-subscriber` setup (env filter, human or JSON
//!   output, optional daily-rolling file)
//! - [`metrics`]: lock-free counters for the capture pipeline and the
//!   ingestion server
//!
//! ## Error Handling
//!
//! Record methods return `MetricsResult<()>` but currently always succeed.
//! Callers log and continue when a metric cannot be recorded:
//!
//! ```rust
//! use deskpulse_infra::observability::metrics::IngestionMetrics;
//!
//! let metrics = IngestionMetrics::new();
//! if let Err(e) = metrics.record_frame_received() {
//!     tracing::warn!("Failed to record metric: {}", e);
//! }
//! ```

pub mod logging;
pub mod metrics;

pub use logging::init_tracing;

/// Metrics error type
///
/// All metrics recording methods return `MetricsResult<()>` for consistency,
/// but **currently always succeed** (return `Ok(())`).
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Counter would overflow
    #[error("Counter overflow for metric '{metric}'")]
    Overflow {
        /// Metric name
        metric: &'static str,
    },
}

/// Result type for metrics operations
pub type MetricsResult<T> = Result<T, MetricsError>;

/// Log a metric that could not be recorded and continue.
pub(crate) fn log_metric(result: MetricsResult<()>, metric: &'static str) {
    if let Err(err) = result {
        tracing::warn!(metric = metric, error = ?err, "Failed to record metric");
    }
}
