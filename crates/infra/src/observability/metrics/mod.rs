//! Metrics collection modules
//!
//! Thread-safe counters for the capture pipeline and the ingestion server.

pub mod capture;
pub mod ingestion;

// Re-export metric types for convenience
pub use capture::{CaptureMetrics, CaptureStats};
pub use ingestion::{IngestionMetrics, IngestionStats};
