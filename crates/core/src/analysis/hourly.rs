//! Hour-of-day distribution and peak hours

use chrono::{FixedOffset, Timelike};
use deskpulse_domain::{AppSession, HourlyUsage};

/// Minutes per hour of day (24 entries), bucketed by session start hour.
///
/// `intensity` is normalised against the busiest hour on a 0-100 scale.
pub fn hourly_distribution(sessions: &[AppSession], offset: FixedOffset) -> Vec<HourlyUsage> {
    let mut minutes = [0.0_f64; 24];
    for session in sessions {
        let hour = session.start_time.with_timezone(&offset).hour() as usize;
        minutes[hour] += session.duration_minutes();
    }
    let max = minutes.iter().copied().fold(0.0_f64, f64::max);

    minutes
        .iter()
        .enumerate()
        .map(|(hour, &m)| HourlyUsage {
            hour: hour as u32,
            minutes: m,
            intensity: if max > 0.0 { m / max * 100.0 } else { 0.0 },
        })
        .collect()
}

/// The `count` busiest hours by raw duration; ties go to the earlier hour.
pub fn peak_hours(distribution: &[HourlyUsage], count: usize) -> Vec<u32> {
    let mut active: Vec<&HourlyUsage> = distribution.iter().filter(|h| h.minutes > 0.0).collect();
    active.sort_by(|a, b| b.minutes.total_cmp(&a.minutes).then_with(|| a.hour.cmp(&b.hour)));
    active.into_iter().take(count).map(|h| h.hour).collect()
}
