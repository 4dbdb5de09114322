//! Capture pipeline runtime
//!
//! Owns the platform input source, the event queue and the consumer task that
//! drives the [`TrackingService`](deskpulse_core::TrackingService).

pub mod monitor;

pub use monitor::{CaptureMonitor, CaptureMonitorConfig};
