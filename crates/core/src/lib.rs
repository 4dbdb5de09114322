//! # DeskPulse Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Capture-side detectors and session aggregators
//! - Browser activity ingestion (transport independent)
//! - Activity classification
//! - Batch behaviour analysis
//! - Port/adapter interfaces (traits)
//!
//! ## Architecture Principles
//! - Only depends on `deskpulse-domain`
//! - No OS hook, socket, or storage code
//! - All external dependencies via traits

pub mod analysis;
pub mod classification;
pub mod ingestion;
pub mod tracking;

// Re-export specific items to avoid ambiguity
pub use analysis::BehaviorAnalyzer;
pub use classification::CategoryClassifier;
pub use ingestion::{FrameOutcome, IngestionEvent, IngestionService, WebSessionRegistry};
pub use tracking::ports::{
    AppResolver, CaptureObserver, EventSink, GoalRepository, InputSource, NoopCaptureObserver,
    SessionRepository,
};
pub use tracking::{TrackingConfig, TrackingEvent, TrackingService};
