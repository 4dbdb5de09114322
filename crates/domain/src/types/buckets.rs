//! Hourly keyboard and mouse buckets plus the records embedded in them

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};

use super::input::ScreenPoint;

/// (date, hour) key of an hourly bucket, in the configured local offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BucketKey {
    pub date: NaiveDate,
    pub hour: u32,
}

impl BucketKey {
    pub const fn new(date: NaiveDate, hour: u32) -> Self {
        Self { date, hour }
    }

    /// Bucket containing `timestamp` when viewed at `offset`.
    pub fn containing(timestamp: DateTime<Utc>, offset: FixedOffset) -> Self {
        let local = timestamp.with_timezone(&offset);
        Self { date: local.date_naive(), hour: local.hour() }
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:02}:00", self.date, self.hour)
    }
}

/// Contiguous run of keystrokes in one process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingBurst {
    pub start_time: DateTime<Utc>,
    pub duration_ms: i64,
    pub key_count: u32,
    /// Process that owned the foreground while typing.
    pub context: String,
}

/// A recognised modifier+key chord
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortcutUsage {
    pub shortcut: String,
    pub process_name: String,
    pub timestamp: DateTime<Utc>,
}

/// Several clicks landing close together in space and time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClickCluster {
    pub center_x: f64,
    pub center_y: f64,
    pub click_count: u32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// One sampled mouse position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrailPoint {
    pub position: ScreenPoint,
    pub timestamp: DateTime<Utc>,
}

/// Sampled path of a continuous mouse movement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MouseTrail {
    pub points: Vec<TrailPoint>,
    /// Distance over the sampled points, in pixels.
    pub distance: f64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Keyboard activity for one (date, hour)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyboardSession {
    pub date: NaiveDate,
    pub hour: u32,
    pub total_key_presses: u64,
    pub key_frequency: BTreeMap<String, u64>,
    pub shortcuts: Vec<ShortcutUsage>,
    pub typing_bursts: Vec<TypingBurst>,
}

impl KeyboardSession {
    pub fn empty(key: BucketKey) -> Self {
        Self {
            date: key.date,
            hour: key.hour,
            total_key_presses: 0,
            key_frequency: BTreeMap::new(),
            shortcuts: Vec::new(),
            typing_bursts: Vec::new(),
        }
    }

    pub fn key(&self) -> BucketKey {
        BucketKey::new(self.date, self.hour)
    }

    pub fn is_empty(&self) -> bool {
        self.total_key_presses == 0 && self.shortcuts.is_empty() && self.typing_bursts.is_empty()
    }

    /// Most pressed keys, highest count first, ties by name.
    pub fn top_keys(&self, limit: usize) -> Vec<(String, u64)> {
        let mut keys: Vec<_> = self.key_frequency.iter().map(|(k, v)| (k.clone(), *v)).collect();
        keys.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        keys.truncate(limit);
        keys
    }
}

/// Mouse activity for one (date, hour)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MouseSession {
    pub date: NaiveDate,
    pub hour: u32,
    pub left_clicks: u64,
    pub right_clicks: u64,
    pub middle_clicks: u64,
    pub scroll_count: u64,
    pub total_move_distance: f64,
    pub click_clusters: Vec<ClickCluster>,
    pub trails: Vec<MouseTrail>,
}

impl MouseSession {
    pub fn empty(key: BucketKey) -> Self {
        Self {
            date: key.date,
            hour: key.hour,
            left_clicks: 0,
            right_clicks: 0,
            middle_clicks: 0,
            scroll_count: 0,
            total_move_distance: 0.0,
            click_clusters: Vec::new(),
            trails: Vec::new(),
        }
    }

    pub fn key(&self) -> BucketKey {
        BucketKey::new(self.date, self.hour)
    }

    pub fn total_clicks(&self) -> u64 {
        self.left_clicks + self.right_clicks + self.middle_clicks
    }

    pub fn is_empty(&self) -> bool {
        self.total_clicks() == 0
            && self.scroll_count == 0
            && self.total_move_distance == 0.0
            && self.click_clusters.is_empty()
            && self.trails.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_bucket_key_uses_offset() {
        let ts = Utc.with_ymd_and_hms(2024, 6, 1, 23, 30, 0).unwrap();
        let utc = BucketKey::containing(ts, FixedOffset::east_opt(0).unwrap());
        assert_eq!(utc.hour, 23);

        let plus_two = BucketKey::containing(ts, FixedOffset::east_opt(7_200).unwrap());
        assert_eq!(plus_two.date, NaiveDate::from_ymd_opt(2024, 6, 2).unwrap());
        assert_eq!(plus_two.hour, 1);
    }

    #[test]
    fn test_top_keys_ordering() {
        let key = BucketKey::new(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(), 9);
        let mut session = KeyboardSession::empty(key);
        session.key_frequency.insert("E".into(), 4);
        session.key_frequency.insert("A".into(), 4);
        session.key_frequency.insert("Space".into(), 9);

        let top = session.top_keys(2);
        assert_eq!(top, vec![("Space".to_string(), 9), ("A".to_string(), 4)]);
    }
}
