//! Hourly keyboard and mouse bucket aggregation
//!
//! One bucket pair is open at a time, keyed by the (date, hour) of the most
//! recent event. Moving to a later hour flushes the open pair; a flushed hour
//! is never reopened. Events stamped earlier than the open hour are counted in
//! the open bucket and reported as late.

use chrono::{DateTime, FixedOffset, Utc};
use deskpulse_domain::{BucketKey, KeyboardSession, MouseSession};

/// Bucket pair for the current hour
#[derive(Debug, Clone, PartialEq)]
pub struct OpenBuckets {
    pub key: BucketKey,
    pub keyboard: KeyboardSession,
    pub mouse: MouseSession,
}

impl OpenBuckets {
    fn new(key: BucketKey) -> Self {
        Self { key, keyboard: KeyboardSession::empty(key), mouse: MouseSession::empty(key) }
    }

    /// Split into the non-empty sessions.
    fn into_flushed(self) -> FlushedBuckets {
        FlushedBuckets {
            key: self.key,
            keyboard: (!self.keyboard.is_empty()).then_some(self.keyboard),
            mouse: (!self.mouse.is_empty()).then_some(self.mouse),
        }
    }
}

/// Buckets handed to storage when their hour ends
#[derive(Debug, Clone, PartialEq)]
pub struct FlushedBuckets {
    pub key: BucketKey,
    pub keyboard: Option<KeyboardSession>,
    pub mouse: Option<MouseSession>,
}

impl FlushedBuckets {
    pub fn is_empty(&self) -> bool {
        self.keyboard.is_none() && self.mouse.is_none()
    }
}

/// Effect of routing one event timestamp
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BucketAdvance {
    pub flushed: Option<FlushedBuckets>,
    pub late: bool,
}

#[derive(Debug)]
pub struct BucketAggregator {
    offset: FixedOffset,
    open: Option<OpenBuckets>,
}

impl BucketAggregator {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset, open: None }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Route an event stamped `at`, opening or rolling the bucket pair as needed.
    pub fn advance(&mut self, at: DateTime<Utc>) -> BucketAdvance {
        let key = BucketKey::containing(at, self.offset);
        match self.open.as_ref().map(|open| open.key) {
            None => {
                self.open = Some(OpenBuckets::new(key));
                BucketAdvance::default()
            }
            Some(current) if key > current => {
                let flushed = self.open.replace(OpenBuckets::new(key)).map(OpenBuckets::into_flushed);
                BucketAdvance { flushed, late: false }
            }
            Some(current) => BucketAdvance { flushed: None, late: key < current },
        }
    }

    /// Flush the open pair if wall time `now` has moved past its hour.
    ///
    /// The hour of `now` becomes the open pair, so events still queued for the
    /// flushed hour are counted late instead of reopening it.
    pub fn roll(&mut self, now: DateTime<Utc>) -> Option<FlushedBuckets> {
        let key = BucketKey::containing(now, self.offset);
        if self.open.as_ref().is_some_and(|open| key > open.key) {
            self.open.replace(OpenBuckets::new(key)).map(OpenBuckets::into_flushed)
        } else {
            None
        }
    }

    /// Bucket pair for records derived at `at` (bursts, trails, clusters).
    ///
    /// Uses the open pair when one exists, otherwise opens the hour of `at`.
    pub fn open_at(&mut self, at: DateTime<Utc>) -> &mut OpenBuckets {
        let key = BucketKey::containing(at, self.offset);
        self.open.get_or_insert_with(|| OpenBuckets::new(key))
    }

    pub fn current(&self) -> Option<&OpenBuckets> {
        self.open.as_ref()
    }

    /// Flush the open pair unconditionally.
    pub fn flush(&mut self) -> Option<FlushedBuckets> {
        self.open.take().map(OpenBuckets::into_flushed)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 2, h, m, 0).unwrap()
    }

    #[test]
    fn test_hour_boundary_starts_new_bucket() {
        let mut aggregator = BucketAggregator::new(utc());
        aggregator.advance(at(9, 59));
        aggregator.open_at(at(9, 59)).keyboard.total_key_presses += 3;

        let advance = aggregator.advance(at(10, 0));
        let flushed = advance.flushed.expect("hour rolled");
        assert_eq!(flushed.key.hour, 9);
        assert_eq!(flushed.keyboard.map(|k| k.total_key_presses), Some(3));
        assert!(flushed.mouse.is_none(), "empty mouse bucket is not flushed");
        assert_eq!(aggregator.current().map(|o| o.key.hour), Some(10));
    }

    #[test]
    fn test_late_event_routes_to_current_hour() {
        let mut aggregator = BucketAggregator::new(utc());
        aggregator.advance(at(10, 5));
        let advance = aggregator.advance(at(9, 58));
        assert!(advance.late);
        assert!(advance.flushed.is_none());
        assert_eq!(aggregator.current().map(|o| o.key.hour), Some(10));
    }

    #[test]
    fn test_roll_flushes_elapsed_hour_once() {
        let mut aggregator = BucketAggregator::new(utc());
        aggregator.advance(at(10, 30));
        aggregator.open_at(at(10, 30)).mouse.left_clicks += 1;

        assert!(aggregator.roll(at(10, 59)).is_none());
        let flushed = aggregator.roll(at(11, 0) + Duration::seconds(1));
        assert_eq!(flushed.and_then(|f| f.mouse).map(|m| m.left_clicks), Some(1));
        assert!(aggregator.roll(at(11, 1)).is_none());
        assert_eq!(aggregator.current().map(|o| o.key.hour), Some(11));

        // an event still stamped 10:59 does not reopen the flushed hour
        assert!(aggregator.advance(at(10, 59)).late);
        assert_eq!(aggregator.current().map(|o| o.key.hour), Some(11));
    }
}
