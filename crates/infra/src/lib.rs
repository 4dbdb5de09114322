//! # DeskPulse Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - Platform input adapter and app resolver (Win32 hooks; stubs elsewhere)
//! - Capture monitor (event queue + consumer task lifecycle)
//! - WebSocket ingestion server for the browser extension
//! - In-memory storage adapter
//! - Configuration loading, logging and metrics
//! - Cron scheduling of batch analysis
//!
//! ## Architecture
//! - Implements traits defined in `deskpulse-core`
//! - Contains all "impure" code (I/O, platform APIs, network)

pub mod capture;
pub mod config;
pub mod errors;
pub mod ingestion;
pub mod observability;
pub mod platform;
pub mod scheduling;
pub mod storage;

// Re-export commonly used items
pub use capture::{CaptureMonitor, CaptureMonitorConfig};
pub use errors::InfraError;
pub use ingestion::IngestionServer;
pub use observability::metrics::{CaptureMetrics, IngestionMetrics};
pub use platform::{default_input_source, default_resolver};
pub use scheduling::{AnalysisScheduler, PatternDetectionJob};
pub use storage::InMemorySessionStore;
