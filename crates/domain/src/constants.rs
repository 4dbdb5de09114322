//! Application constants
//!
//! Centralized location for all domain-level thresholds used by the capture
//! pipeline and the behaviour analyzers.

// Typing bursts
pub const BURST_IDLE_GAP_MS: i64 = 2_000;
pub const BURST_MIN_DURATION_MS: i64 = 500;
pub const BURST_MIN_KEYS: u32 = 5;
pub const IDLE_TICK_MS: u64 = 1_000;

// Mouse trails and click clusters
pub const TRAIL_SAMPLE_INTERVAL_MS: i64 = 50;
pub const TRAIL_IDLE_GAP_MS: i64 = 1_000;
pub const TRAIL_MAX_POINTS: usize = 200;
pub const TRAIL_MIN_POINTS: usize = 2;
pub const CLUSTER_RADIUS_PX: f64 = 40.0;
pub const CLUSTER_WINDOW_MS: i64 = 1_500;
pub const CLUSTER_MIN_CLICKS: u32 = 3;

// Focus segmentation
pub const FOCUS_MAX_SWITCH_RATE: f64 = 0.5;
pub const FOCUS_MIN_ELAPSED_MINUTES: f64 = 15.0;
pub const FOCUS_MIN_DURATION_MINUTES: f64 = 10.0;
pub const DEEP_WORK_MIN_MINUTES: f64 = 25.0;
pub const DEEP_WORK_MIN_INTENSITY: f64 = 0.7;

// Efficiency scoring
pub const IDEAL_BREAK_RATIO: f64 = 0.15;
pub const DEEP_WORK_TARGET_MINUTES: f64 = 120.0;
pub const NEUTRAL_GOAL_SCORE: f64 = 70.0;
pub const PRODUCTIVE_WEIGHT_THRESHOLD: f64 = 0.7;

// Pattern mining
pub const FREQUENT_APP_MIN_SHARE: f64 = 0.30;
pub const FREQUENT_APP_MIN_SESSIONS: u32 = 3;
pub const PEAK_HOUR_FACTOR: f64 = 1.5;
pub const APP_SEQUENCE_MIN_OCCURRENCES: u32 = 2;
pub const CONTEXT_SWITCH_MIN_PER_HOUR: u32 = 12;
pub const LONG_SESSION_MIN_MINUTES: f64 = 60.0;

// Fallback labels
pub const DEFAULT_CATEGORY: &str = "Other";
pub const UNKNOWN_PROCESS: &str = "Unknown";
