//! Behaviour analyzer - per-day analysis over stored sessions

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Days, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use deskpulse_domain::{
    AppSession, DailyReport, DeskPulseError, EfficiencyBreakdown, FocusSession, HourlyUsage,
    InputSummary, KeyboardSession, MouseSession, Result, UsagePattern, UserGoal,
};
use tracing::{debug, info, instrument, warn};

use super::efficiency::calculate_with_focus;
use super::focus::segment_focus_sessions;
use super::hourly::{hourly_distribution, peak_hours};
use super::insights::generate_insights;
use super::patterns::detect_patterns;
use crate::tracking::ports::{GoalRepository, SessionRepository};

const DEFAULT_PEAK_HOURS: usize = 3;
const TOP_KEYS: usize = 10;

/// Day-scoped analysis service
pub struct BehaviorAnalyzer {
    repository: Arc<dyn SessionRepository>,
    goals: Arc<dyn GoalRepository>,
    offset: FixedOffset,
    peak_hours: usize,
}

impl BehaviorAnalyzer {
    /// Create an analyzer; dates are interpreted in `offset`.
    pub fn new(
        repository: Arc<dyn SessionRepository>,
        goals: Arc<dyn GoalRepository>,
        offset: FixedOffset,
    ) -> Self {
        Self { repository, goals, offset, peak_hours: DEFAULT_PEAK_HOURS }
    }

    /// Number of peak hours reported by [`Self::daily_report`].
    pub fn with_peak_hours(mut self, count: usize) -> Self {
        self.peak_hours = count;
        self
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// `[local midnight, next local midnight)` of `date`, in UTC.
    pub fn day_bounds(&self, date: NaiveDate) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        let start = self.local_midnight(date)?;
        let next = date
            .checked_add_days(Days::new(1))
            .ok_or_else(|| DeskPulseError::InvalidInput(format!("date out of range: {date}")))?;
        Ok((start, self.local_midnight(next)?))
    }

    /// App sessions started on `date`, ordered by start.
    pub async fn sessions_for(&self, date: NaiveDate) -> Result<Vec<AppSession>> {
        let (start, end) = self.day_bounds(date)?;
        let mut sessions = self.repository.app_sessions_between(start, end).await?;
        sessions.sort_by_key(|s| s.start_time);
        Ok(sessions)
    }

    pub async fn focus_sessions(&self, date: NaiveDate) -> Result<Vec<FocusSession>> {
        let sessions = self.sessions_for(date).await?;
        Ok(segment_focus_sessions(&sessions))
    }

    pub async fn efficiency(&self, date: NaiveDate) -> Result<EfficiencyBreakdown> {
        let sessions = self.sessions_for(date).await?;
        let focus = segment_focus_sessions(&sessions);
        let goals = self.active_goals().await;
        Ok(calculate_with_focus(&sessions, &focus, &goals))
    }

    pub async fn hourly(&self, date: NaiveDate) -> Result<Vec<HourlyUsage>> {
        let sessions = self.sessions_for(date).await?;
        Ok(hourly_distribution(&sessions, self.offset))
    }

    /// The `count` busiest hours of `date`.
    pub async fn peak_hours(&self, date: NaiveDate, count: usize) -> Result<Vec<u32>> {
        let distribution = self.hourly(date).await?;
        Ok(peak_hours(&distribution, count))
    }

    pub async fn detect_patterns(&self, date: NaiveDate) -> Result<Vec<UsagePattern>> {
        let sessions = self.sessions_for(date).await?;
        Ok(detect_patterns(&sessions, self.offset))
    }

    /// Mine patterns for `date` and persist them.
    #[instrument(skip(self), fields(%date))]
    pub async fn detect_and_store_patterns(&self, date: NaiveDate) -> Result<Vec<UsagePattern>> {
        let patterns = self.detect_patterns(date).await?;
        self.repository.save_usage_patterns(date, patterns.clone()).await?;
        info!(patterns = patterns.len(), "usage patterns stored");
        Ok(patterns)
    }

    /// Full report for one day, insights included.
    #[instrument(skip(self), fields(%date))]
    pub async fn daily_report(&self, date: NaiveDate) -> Result<DailyReport> {
        let sessions = self.sessions_for(date).await?;
        let focus_sessions = segment_focus_sessions(&sessions);
        let goals = self.active_goals().await;
        let efficiency = calculate_with_focus(&sessions, &focus_sessions, &goals);
        let hourly = hourly_distribution(&sessions, self.offset);
        let peak = peak_hours(&hourly, self.peak_hours);
        let patterns = detect_patterns(&sessions, self.offset);

        let keyboard = self.repository.keyboard_sessions_between(date, date).await?;
        let mouse = self.repository.mouse_sessions_between(date, date).await?;

        let mut report = DailyReport {
            date,
            total_minutes: sessions.iter().map(AppSession::duration_minutes).sum(),
            session_count: sessions.len(),
            efficiency,
            focus_sessions,
            hourly,
            peak_hours: peak,
            patterns,
            insights: Vec::new(),
            input: summarize_input(&keyboard, &mouse),
        };
        report.insights = generate_insights(&report);

        debug!(
            sessions = report.session_count,
            total_score = report.efficiency.total_score,
            insights = report.insights.len(),
            "daily report built"
        );
        Ok(report)
    }

    async fn active_goals(&self) -> Vec<UserGoal> {
        match self.goals.active_goals().await {
            Ok(goals) => goals,
            Err(err) => {
                warn!(error = %err, "goal lookup failed; scoring without goals");
                Vec::new()
            }
        }
    }

    fn local_midnight(&self, date: NaiveDate) -> Result<DateTime<Utc>> {
        self.offset
            .from_local_datetime(&date.and_time(NaiveTime::MIN))
            .single()
            .map(|local| local.with_timezone(&Utc))
            .ok_or_else(|| DeskPulseError::InvalidInput(format!("no local midnight for {date}")))
    }
}

/// Fold a day's hourly buckets into totals.
pub fn summarize_input(keyboard: &[KeyboardSession], mouse: &[MouseSession]) -> InputSummary {
    let mut frequency: BTreeMap<&str, u64> = BTreeMap::new();
    for bucket in keyboard {
        for (key, count) in &bucket.key_frequency {
            *frequency.entry(key.as_str()).or_insert(0) += count;
        }
    }
    let mut top_keys: Vec<(String, u64)> = frequency.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
    top_keys.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    top_keys.truncate(TOP_KEYS);

    InputSummary {
        total_key_presses: keyboard.iter().map(|k| k.total_key_presses).sum(),
        top_keys,
        typing_bursts: keyboard.iter().map(|k| k.typing_bursts.len()).sum(),
        shortcuts_used: keyboard.iter().map(|k| k.shortcuts.len()).sum(),
        total_clicks: mouse.iter().map(MouseSession::total_clicks).sum(),
        scroll_count: mouse.iter().map(|m| m.scroll_count).sum(),
        move_distance: mouse.iter().map(|m| m.total_move_distance).sum(),
    }
}

#[cfg(test)]
mod tests {
    use deskpulse_domain::BucketKey;

    use super::*;

    #[test]
    fn test_summarize_merges_buckets() {
        let date = NaiveDate::from_ymd_opt(2024, 4, 2).unwrap();
        let mut nine = KeyboardSession::empty(BucketKey::new(date, 9));
        nine.total_key_presses = 5;
        nine.key_frequency.insert("A".into(), 3);
        nine.key_frequency.insert("B".into(), 2);
        let mut ten = KeyboardSession::empty(BucketKey::new(date, 10));
        ten.total_key_presses = 4;
        ten.key_frequency.insert("B".into(), 4);

        let mut clicks = MouseSession::empty(BucketKey::new(date, 9));
        clicks.left_clicks = 3;
        clicks.right_clicks = 1;
        clicks.total_move_distance = 120.5;

        let summary = summarize_input(&[nine, ten], &[clicks]);
        assert_eq!(summary.total_key_presses, 9);
        assert_eq!(summary.top_keys[0], ("B".to_string(), 6));
        assert_eq!(summary.total_clicks, 4);
        assert!((summary.move_distance - 120.5).abs() < 1e-9);
    }

    #[test]
    fn test_summarize_empty() {
        assert_eq!(summarize_input(&[], &[]), InputSummary::default());
    }
}
