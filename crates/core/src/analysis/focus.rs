//! Focus-session segmentation
//!
//! Walks a day's app sessions in start order, counting app switches inside
//! the current candidate segment. A segment closes (including the session
//! that triggered the close) once its switch rate exceeds the limit after the
//! minimum elapsed time; the last segment closes at the last session's end.

use ahash::AHashMap;
use chrono::{DateTime, Utc};
use deskpulse_domain::constants::{
    DEEP_WORK_MIN_INTENSITY, DEEP_WORK_MIN_MINUTES, FOCUS_MAX_SWITCH_RATE,
    FOCUS_MIN_DURATION_MINUTES, FOCUS_MIN_ELAPSED_MINUTES,
};
use deskpulse_domain::{AppSession, FocusSession};

use super::minutes_between;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FocusConfig {
    /// Switches per minute above which a segment closes.
    pub max_switch_rate: f64,
    pub min_elapsed_minutes: f64,
    pub min_duration_minutes: f64,
    pub deep_work_min_minutes: f64,
    pub deep_work_min_intensity: f64,
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            max_switch_rate: FOCUS_MAX_SWITCH_RATE,
            min_elapsed_minutes: FOCUS_MIN_ELAPSED_MINUTES,
            min_duration_minutes: FOCUS_MIN_DURATION_MINUTES,
            deep_work_min_minutes: DEEP_WORK_MIN_MINUTES,
            deep_work_min_intensity: DEEP_WORK_MIN_INTENSITY,
        }
    }
}

/// Segment with the default thresholds.
pub fn segment_focus_sessions(sessions: &[AppSession]) -> Vec<FocusSession> {
    segment_with(sessions, &FocusConfig::default())
}

pub fn segment_with(sessions: &[AppSession], config: &FocusConfig) -> Vec<FocusSession> {
    let mut ordered: Vec<&AppSession> = sessions.iter().collect();
    ordered.sort_by_key(|s| s.start_time);

    let mut focus = Vec::new();
    let mut segment: Vec<&AppSession> = Vec::new();
    let mut switches = 0u32;

    for session in ordered {
        if let Some(previous) = segment.last() {
            if previous.process_name != session.process_name {
                switches += 1;
            }
        }
        segment.push(session);

        let segment_start = segment[0].start_time;
        let elapsed = minutes_between(segment_start, session.start_time);
        let rate = f64::from(switches) / elapsed.max(1.0);
        if rate > config.max_switch_rate && elapsed > config.min_elapsed_minutes {
            focus.extend(close_segment(&segment, switches, session.effective_end(), config));
            segment.clear();
            switches = 0;
        }
    }

    if let Some(last) = segment.last() {
        let end = last.effective_end();
        focus.extend(close_segment(&segment, switches, end, config));
    }
    focus
}

fn close_segment(
    segment: &[&AppSession],
    switch_count: u32,
    end: DateTime<Utc>,
    config: &FocusConfig,
) -> Option<FocusSession> {
    let start = segment.first()?.start_time;
    let duration_minutes = minutes_between(start, end);
    if duration_minutes < config.min_duration_minutes {
        return None;
    }
    let intensity_score = (1.0 - f64::from(switch_count) / duration_minutes).max(0.0);
    Some(FocusSession {
        start_time: start,
        end_time: end,
        duration_minutes,
        primary_app: primary_app(segment),
        switch_count,
        intensity_score,
        is_deep_work: duration_minutes >= config.deep_work_min_minutes
            && intensity_score > config.deep_work_min_intensity,
    })
}

/// Process with the most time in the segment; ties go to the name sorting first.
fn primary_app(segment: &[&AppSession]) -> String {
    let mut totals: AHashMap<&str, i64> = AHashMap::new();
    for session in segment {
        *totals.entry(session.process_name.as_str()).or_insert(0) += session.duration_secs;
    }
    totals
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(name, _)| name.to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use deskpulse_domain::{Classification, ResolvedApp};

    use super::*;

    fn session(process: &str, start_min: i64, len_min: i64) -> AppSession {
        let start = Utc.with_ymd_and_hms(2024, 4, 2, 9, 0, 0).unwrap() + Duration::minutes(start_min);
        let mut s = AppSession::open(&ResolvedApp::named(process, ""), &Classification::default(), start);
        s.close(start + Duration::minutes(len_min));
        s
    }

    #[test]
    fn test_single_long_session_is_deep_work() {
        let focus = segment_focus_sessions(&[session("code.exe", 0, 45)]);
        assert_eq!(focus.len(), 1);
        assert!((focus[0].duration_minutes - 45.0).abs() < 1e-9);
        assert_eq!(focus[0].switch_count, 0);
        assert!((focus[0].intensity_score - 1.0).abs() < 1e-9);
        assert!(focus[0].is_deep_work);
        assert_eq!(focus[0].primary_app, "code.exe");
    }

    #[test]
    fn test_short_day_is_not_emitted() {
        let focus = segment_focus_sessions(&[session("code.exe", 0, 5), session("slack.exe", 5, 3)]);
        assert!(focus.is_empty());
    }

    #[test]
    fn test_rapid_switching_closes_segment() {
        // 20 min of focused work, then one-minute hops between two apps
        let mut sessions = vec![session("code.exe", 0, 20)];
        for i in 0..20 {
            let process = if i % 2 == 0 { "slack.exe" } else { "chrome.exe" };
            sessions.push(session(process, 20 + i, 1));
        }
        sessions.push(session("code.exe", 40, 30));

        let focus = segment_focus_sessions(&sessions);
        assert_eq!(focus.len(), 2);

        let first = &focus[0];
        assert_eq!(first.primary_app, "code.exe");
        assert!(first.switch_count > 0);
        assert!(!first.is_deep_work, "switch-heavy segment is not deep work");

        // the trailing code.exe block forms its own segment
        let last = &focus[1];
        assert_eq!(last.end_time, sessions[21].effective_end());
        assert!(last.intensity_score >= 0.0);
    }

    #[test]
    fn test_segmentation_is_deterministic() {
        let sessions = vec![
            session("code.exe", 0, 12),
            session("chrome.exe", 12, 4),
            session("code.exe", 16, 30),
            session("slack.exe", 46, 2),
        ];
        let mut shuffled = sessions.clone();
        shuffled.reverse();
        assert_eq!(segment_focus_sessions(&sessions), segment_focus_sessions(&sessions));
        assert_eq!(segment_focus_sessions(&sessions), segment_focus_sessions(&shuffled));
    }

    #[test]
    fn test_empty_input() {
        assert!(segment_focus_sessions(&[]).is_empty());
    }
}
