//! Capture-side tracking: detectors, aggregators and the tracking service

pub mod app_session;
pub mod buckets;
pub mod burst;
pub mod mouse;
pub mod ports;
pub mod service;
pub mod shortcut;

pub use app_session::{AppSessionTracker, ForegroundTransition};
pub use buckets::{BucketAdvance, BucketAggregator, FlushedBuckets, OpenBuckets};
pub use burst::{BurstConfig, BurstDetector};
pub use mouse::{ClickClusterer, MouseConfig, MoveOutcome, TrailSampler};
pub use service::{TrackingConfig, TrackingEvent, TrackingService};
pub use shortcut::{KeyRoute, ModifierState, ShortcutDetector, ShortcutTable};
