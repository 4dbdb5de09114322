//! Outputs of the batch behaviour analyzers

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::impl_domain_status_conversions;

/// A span of sustained attention derived from ordered app sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusSession {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_minutes: f64,
    pub primary_app: String,
    pub switch_count: u32,
    pub intensity_score: f64,
    pub is_deep_work: bool,
}

/// Kind of mined usage pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsagePatternType {
    FrequentApp,
    PeakHour,
    AppSequence,
    ContextSwitch,
    LongSession,
}

impl_domain_status_conversions!(UsagePatternType {
    FrequentApp => "frequent_app",
    PeakHour => "peak_hour",
    AppSequence => "app_sequence",
    ContextSwitch => "context_switch",
    LongSession => "long_session",
});

/// Immutable record of a detected pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsagePattern {
    pub id: Uuid,
    pub pattern_type: UsagePatternType,
    pub process_name: Option<String>,
    pub hour: Option<u32>,
    pub frequency: u32,
    pub total_duration_secs: i64,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
    pub detected_at: DateTime<Utc>,
}

impl UsagePattern {
    pub fn new(pattern_type: UsagePatternType, frequency: u32, confidence: f64) -> Self {
        Self {
            id: Uuid::now_v7(),
            pattern_type,
            process_name: None,
            hour: None,
            frequency,
            total_duration_secs: 0,
            confidence: confidence.clamp(0.0, 1.0),
            detected_at: Utc::now(),
        }
    }

    pub fn with_process(mut self, process_name: impl Into<String>) -> Self {
        self.process_name = Some(process_name.into());
        self
    }

    pub fn with_hour(mut self, hour: u32) -> Self {
        self.hour = Some(hour);
        self
    }

    pub fn with_duration(mut self, total_duration_secs: i64) -> Self {
        self.total_duration_secs = total_duration_secs;
        self
    }
}

/// Five-component efficiency score for one day. All values in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EfficiencyBreakdown {
    pub focus_score: f64,
    pub task_completion_score: f64,
    pub balance_score: f64,
    pub interruption_score: f64,
    pub goal_score: f64,
    pub total_score: f64,
}

/// Minutes of activity in one hour of the day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HourlyUsage {
    pub hour: u32,
    pub minutes: f64,
    /// Share of the busiest hour, 0-100.
    pub intensity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    Focus,
    Distraction,
    Balance,
    Goal,
    PeakTime,
}

impl_domain_status_conversions!(InsightKind {
    Focus => "focus",
    Distraction => "distraction",
    Balance => "balance",
    Goal => "goal",
    PeakTime => "peak_time",
});

/// Ordering: `High` sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightPriority {
    High,
    Medium,
    Low,
}

/// Human-readable observation derived from a daily report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub kind: InsightKind,
    pub priority: InsightPriority,
    pub title: String,
    pub message: String,
}

/// Keyboard and mouse totals for a day
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InputSummary {
    pub total_key_presses: u64,
    pub top_keys: Vec<(String, u64)>,
    pub typing_bursts: usize,
    pub shortcuts_used: usize,
    pub total_clicks: u64,
    pub scroll_count: u64,
    pub move_distance: f64,
}

/// Everything the analyzer knows about one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyReport {
    pub date: NaiveDate,
    pub total_minutes: f64,
    pub session_count: usize,
    pub efficiency: EfficiencyBreakdown,
    pub focus_sessions: Vec<FocusSession>,
    pub hourly: Vec<HourlyUsage>,
    pub peak_hours: Vec<u32>,
    pub patterns: Vec<UsagePattern>,
    pub insights: Vec<Insight>,
    pub input: InputSummary,
}
