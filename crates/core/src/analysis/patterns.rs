//! Usage-pattern mining over a closed set of app sessions
//!
//! Every detector returns an empty list when nothing qualifies.

use std::collections::BTreeMap;

use ahash::AHashMap;
use chrono::{FixedOffset, Timelike};
use deskpulse_domain::constants::{
    APP_SEQUENCE_MIN_OCCURRENCES, CONTEXT_SWITCH_MIN_PER_HOUR, FREQUENT_APP_MIN_SESSIONS,
    FREQUENT_APP_MIN_SHARE, LONG_SESSION_MIN_MINUTES, PEAK_HOUR_FACTOR,
};
use deskpulse_domain::{AppSession, UsagePattern, UsagePatternType};

use super::hourly::hourly_distribution;

/// Run every detector. Sessions are ordered by start time first.
pub fn detect_patterns(sessions: &[AppSession], offset: FixedOffset) -> Vec<UsagePattern> {
    let mut ordered = sessions.to_vec();
    ordered.sort_by_key(|s| s.start_time);

    let mut patterns = frequent_apps(&ordered);
    patterns.extend(peak_hours(&ordered, offset));
    patterns.extend(app_sequences(&ordered));
    patterns.extend(context_switches(&ordered, offset));
    patterns.extend(long_sessions(&ordered));
    patterns
}

/// Apps holding at least the minimum share of all sessions.
pub fn frequent_apps(sessions: &[AppSession]) -> Vec<UsagePattern> {
    if sessions.is_empty() {
        return Vec::new();
    }
    let mut per_app: BTreeMap<&str, (u32, i64)> = BTreeMap::new();
    for session in sessions {
        let entry = per_app.entry(session.process_name.as_str()).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += session.duration_secs;
    }

    let total = sessions.len() as f64;
    per_app
        .into_iter()
        .filter_map(|(process, (count, secs))| {
            let share = f64::from(count) / total;
            (share >= FREQUENT_APP_MIN_SHARE && count >= FREQUENT_APP_MIN_SESSIONS).then(|| {
                UsagePattern::new(UsagePatternType::FrequentApp, count, share)
                    .with_process(process)
                    .with_duration(secs)
            })
        })
        .collect()
}

/// Hours whose activity reaches the peak factor times the mean active hour.
pub fn peak_hours(sessions: &[AppSession], offset: FixedOffset) -> Vec<UsagePattern> {
    let distribution = hourly_distribution(sessions, offset);
    let active: Vec<_> = distribution.iter().filter(|h| h.minutes > 0.0).collect();
    if active.is_empty() {
        return Vec::new();
    }
    let mean = active.iter().map(|h| h.minutes).sum::<f64>() / active.len() as f64;

    let mut starts = [0u32; 24];
    for session in sessions {
        starts[session.start_time.with_timezone(&offset).hour() as usize] += 1;
    }

    active
        .into_iter()
        .filter(|h| h.minutes >= mean * PEAK_HOUR_FACTOR)
        .map(|h| {
            UsagePattern::new(UsagePatternType::PeakHour, starts[h.hour as usize], h.intensity / 100.0)
                .with_hour(h.hour)
                .with_duration((h.minutes * 60.0).round() as i64)
        })
        .collect()
}

/// A→B→A→B alternations, counted over the switch sequence.
pub fn app_sequences(sessions: &[AppSession]) -> Vec<UsagePattern> {
    let mut sequence: Vec<&str> = Vec::new();
    for session in sessions {
        if sequence.last() != Some(&session.process_name.as_str()) {
            sequence.push(session.process_name.as_str());
        }
    }
    if sequence.len() < 4 {
        return Vec::new();
    }

    let windows = sequence.len() - 3;
    let mut counts: BTreeMap<(&str, &str), u32> = BTreeMap::new();
    for w in sequence.windows(4) {
        if w[0] == w[2] && w[1] == w[3] && w[0] != w[1] {
            *counts.entry((w[0], w[1])).or_insert(0) += 1;
        }
    }

    counts
        .into_iter()
        .filter(|(_, occurrences)| *occurrences >= APP_SEQUENCE_MIN_OCCURRENCES)
        .map(|((a, b), occurrences)| {
            UsagePattern::new(UsagePatternType::AppSequence, occurrences, f64::from(occurrences) / windows as f64)
                .with_process(format!("{a} -> {b}"))
        })
        .collect()
}

/// Hours with at least the minimum number of app switches.
///
/// Confidence saturates at twice the threshold.
pub fn context_switches(sessions: &[AppSession], offset: FixedOffset) -> Vec<UsagePattern> {
    let mut per_hour: AHashMap<u32, u32> = AHashMap::new();
    for pair in sessions.windows(2) {
        if pair[0].process_name != pair[1].process_name {
            let hour = pair[1].start_time.with_timezone(&offset).hour();
            *per_hour.entry(hour).or_insert(0) += 1;
        }
    }

    let mut hours: Vec<(u32, u32)> =
        per_hour.into_iter().filter(|(_, switches)| *switches >= CONTEXT_SWITCH_MIN_PER_HOUR).collect();
    hours.sort_unstable();
    hours
        .into_iter()
        .map(|(hour, switches)| {
            let confidence = f64::from(switches) / f64::from(CONTEXT_SWITCH_MIN_PER_HOUR * 2);
            UsagePattern::new(UsagePatternType::ContextSwitch, switches, confidence).with_hour(hour)
        })
        .collect()
}

/// Apps with single sessions of at least the long-session length, one pattern per app.
pub fn long_sessions(sessions: &[AppSession]) -> Vec<UsagePattern> {
    let mut per_app: BTreeMap<&str, (u32, i64)> = BTreeMap::new();
    for session in sessions.iter().filter(|s| s.duration_minutes() >= LONG_SESSION_MIN_MINUTES) {
        let entry = per_app.entry(session.process_name.as_str()).or_insert((0, 0));
        entry.0 += 1;
        entry.1 = entry.1.max(session.duration_secs);
    }

    per_app
        .into_iter()
        .map(|(process, (count, longest_secs))| {
            let confidence = longest_secs as f64 / 60.0 / (LONG_SESSION_MIN_MINUTES * 2.0);
            UsagePattern::new(UsagePatternType::LongSession, count, confidence)
                .with_process(process)
                .with_duration(longest_secs)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use deskpulse_domain::{Classification, ResolvedApp};

    use super::*;

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 2, 9, 0, 0).unwrap()
    }

    fn session(process: &str, start_min: i64, len_min: i64) -> AppSession {
        let start = base() + Duration::minutes(start_min);
        let mut s = AppSession::open(&ResolvedApp::named(process, ""), &Classification::default(), start);
        s.close(start + Duration::minutes(len_min));
        s
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn test_no_sessions_no_patterns() {
        assert!(detect_patterns(&[], utc()).is_empty());
    }

    #[test]
    fn test_frequent_app() {
        let sessions = [
            session("code.exe", 0, 10),
            session("chrome.exe", 10, 5),
            session("code.exe", 15, 10),
            session("slack.exe", 25, 5),
            session("code.exe", 30, 10),
        ];
        let patterns = frequent_apps(&sessions);
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].process_name.as_deref(), Some("code.exe"));
        assert_eq!(patterns[0].frequency, 3);
        assert!((patterns[0].confidence - 0.6).abs() < 1e-9);
        assert_eq!(patterns[0].total_duration_secs, 1_800);
    }

    #[test]
    fn test_app_sequence_alternation() {
        let sessions: Vec<_> = (0..6)
            .map(|i| session(if i % 2 == 0 { "word.exe" } else { "chrome.exe" }, i * 3, 3))
            .collect();
        let patterns = app_sequences(&sessions);
        // windows: W C W C | C W C W | W C W C, only W -> C repeats
        assert_eq!(patterns.len(), 1);
        let forward = patterns.iter().find(|p| p.process_name.as_deref() == Some("word.exe -> chrome.exe"));
        assert_eq!(forward.map(|p| p.frequency), Some(2));
    }

    #[test]
    fn test_context_switch_hour() {
        let sessions: Vec<_> = (0..14)
            .map(|i| session(if i % 2 == 0 { "a.exe" } else { "b.exe" }, i * 4, 4))
            .collect();
        let patterns = context_switches(&sessions, utc());
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].hour, Some(9));
        assert_eq!(patterns[0].frequency, 13);
    }

    #[test]
    fn test_long_session_and_peak_hour() {
        let sessions = [
            session("code.exe", 0, 70),    // 09:00, 70 min
            session("slack.exe", 120, 10), // 11:00
            session("mail.exe", 240, 10),  // 13:00
        ];
        let long = long_sessions(&sessions);
        assert_eq!(long.len(), 1);
        assert_eq!(long[0].total_duration_secs, 4_200);

        let peaks = peak_hours(&sessions, utc());
        assert_eq!(peaks.len(), 1);
        assert_eq!(peaks[0].hour, Some(9));
        assert!((peaks[0].confidence - 1.0).abs() < 1e-9);
    }
}
