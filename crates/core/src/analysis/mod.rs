//! Batch behaviour analysis over stored sessions
//!
//! Every function here is pure over its inputs; [`BehaviorAnalyzer`] adds the
//! repository reads and the per-day windowing.

pub mod efficiency;
pub mod focus;
pub mod hourly;
pub mod insights;
pub mod patterns;
pub mod service;

use chrono::{DateTime, Utc};

pub use efficiency::{calculate_efficiency, calculate_with_focus};
pub use focus::{segment_focus_sessions, segment_with, FocusConfig};
pub use hourly::{hourly_distribution, peak_hours};
pub use insights::generate_insights;
pub use patterns::detect_patterns;
pub use service::{summarize_input, BehaviorAnalyzer};

/// Fractional minutes from `start` to `end`; negative if `end` is earlier.
pub(crate) fn minutes_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_milliseconds() as f64 / 60_000.0
}

pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
