//! Mouse trail sampling and click clustering

use chrono::{DateTime, Duration, Utc};
use deskpulse_domain::constants::{
    CLUSTER_MIN_CLICKS, CLUSTER_RADIUS_PX, CLUSTER_WINDOW_MS, TRAIL_IDLE_GAP_MS, TRAIL_MAX_POINTS,
    TRAIL_MIN_POINTS, TRAIL_SAMPLE_INTERVAL_MS,
};
use deskpulse_domain::{ClickCluster, MouseTrail, ScreenPoint, TrailPoint};

/// Thresholds for trail sampling and click clustering
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseConfig {
    pub sample_interval: Duration,
    pub trail_idle_gap: Duration,
    pub trail_max_points: usize,
    pub trail_min_points: usize,
    pub cluster_radius_px: f64,
    pub cluster_window: Duration,
    pub cluster_min_clicks: u32,
}

impl Default for MouseConfig {
    fn default() -> Self {
        Self {
            sample_interval: Duration::milliseconds(TRAIL_SAMPLE_INTERVAL_MS),
            trail_idle_gap: Duration::milliseconds(TRAIL_IDLE_GAP_MS),
            trail_max_points: TRAIL_MAX_POINTS,
            trail_min_points: TRAIL_MIN_POINTS,
            cluster_radius_px: CLUSTER_RADIUS_PX,
            cluster_window: Duration::milliseconds(CLUSTER_WINDOW_MS),
            cluster_min_clicks: CLUSTER_MIN_CLICKS,
        }
    }
}

/// Result of one raw move
#[derive(Debug, Clone, PartialEq)]
pub struct MoveOutcome {
    /// Pixels travelled since the previous raw move.
    pub distance: f64,
    /// Trail closed by this move (idle gap or point limit).
    pub closed: Option<MouseTrail>,
}

/// Throttled sampler producing [`MouseTrail`]s
#[derive(Debug, Default)]
pub struct TrailSampler {
    config: MouseConfig,
    points: Vec<TrailPoint>,
    last_raw: Option<ScreenPoint>,
    last_move_at: Option<DateTime<Utc>>,
}

impl TrailSampler {
    pub fn new(config: MouseConfig) -> Self {
        Self { config, points: Vec::new(), last_raw: None, last_move_at: None }
    }

    pub fn on_move(&mut self, position: ScreenPoint, at: DateTime<Utc>) -> MoveOutcome {
        let distance = self.last_raw.map_or(0.0, |prev| prev.distance_to(position));
        self.last_raw = Some(position);

        let mut closed = None;
        if self.last_move_at.is_some_and(|last| at - last > self.config.trail_idle_gap) {
            closed = self.close();
        }
        self.last_move_at = Some(at);

        let due = self
            .points
            .last()
            .map_or(true, |last| at - last.timestamp >= self.config.sample_interval);
        if due {
            self.points.push(TrailPoint { position, timestamp: at });
        }
        if self.points.len() >= self.config.trail_max_points {
            closed = self.close();
        }

        MoveOutcome { distance, closed }
    }

    /// Close the trail once the pointer has rested longer than the idle gap.
    pub fn check_idle(&mut self, now: DateTime<Utc>) -> Option<MouseTrail> {
        if self.last_move_at.is_some_and(|last| now - last > self.config.trail_idle_gap) {
            self.close()
        } else {
            None
        }
    }

    /// Close the current trail; kept only with enough sampled points.
    pub fn close(&mut self) -> Option<MouseTrail> {
        let points = std::mem::take(&mut self.points);
        if points.len() < self.config.trail_min_points {
            return None;
        }
        let (first, last) = (points.first()?, points.last()?);
        let distance = points.windows(2).map(|w| w[0].position.distance_to(w[1].position)).sum();
        Some(MouseTrail {
            start_time: first.timestamp,
            end_time: last.timestamp,
            distance,
            points,
        })
    }

    pub fn sampled_points(&self) -> usize {
        self.points.len()
    }
}

#[derive(Debug, Clone)]
struct OpenCluster {
    sum_x: f64,
    sum_y: f64,
    count: u32,
    start: DateTime<Utc>,
    last: DateTime<Utc>,
}

impl OpenCluster {
    fn centroid(&self) -> (f64, f64) {
        let n = f64::from(self.count);
        (self.sum_x / n, self.sum_y / n)
    }
}

/// Groups clicks that land close together in space and time
#[derive(Debug, Default)]
pub struct ClickClusterer {
    config: MouseConfig,
    current: Option<OpenCluster>,
}

impl ClickClusterer {
    pub fn new(config: MouseConfig) -> Self {
        Self { config, current: None }
    }

    pub fn on_click(&mut self, position: ScreenPoint, at: DateTime<Utc>) -> Option<ClickCluster> {
        let (x, y) = (f64::from(position.x), f64::from(position.y));
        let joins = self.current.as_ref().is_some_and(|open| {
            let (cx, cy) = open.centroid();
            (x - cx).hypot(y - cy) <= self.config.cluster_radius_px
                && at - open.last <= self.config.cluster_window
        });

        if joins {
            if let Some(open) = self.current.as_mut() {
                open.sum_x += x;
                open.sum_y += y;
                open.count += 1;
                open.last = open.last.max(at);
            }
            return None;
        }

        let closed = self.close();
        self.current = Some(OpenCluster { sum_x: x, sum_y: y, count: 1, start: at, last: at });
        closed
    }

    pub fn check_idle(&mut self, now: DateTime<Utc>) -> Option<ClickCluster> {
        if self.current.as_ref().is_some_and(|open| now - open.last > self.config.cluster_window) {
            self.close()
        } else {
            None
        }
    }

    pub fn close(&mut self) -> Option<ClickCluster> {
        let open = self.current.take()?;
        if open.count < self.config.cluster_min_clicks {
            return None;
        }
        let (center_x, center_y) = open.centroid();
        Some(ClickCluster {
            center_x,
            center_y,
            click_count: open.count,
            start_time: open.start,
            end_time: open.last,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 2, 10, 0, 0).unwrap() + Duration::milliseconds(ms)
    }

    #[test]
    fn test_sampling_is_throttled_but_distance_is_not() {
        let mut sampler = TrailSampler::default();
        let mut travelled = 0.0;
        for i in 0..10 {
            // one raw move every 10ms, 3px each
            travelled += sampler.on_move(ScreenPoint::new(i * 3, 0), at(i64::from(i) * 10)).distance;
        }
        assert!((travelled - 27.0).abs() < 1e-9);
        // samples at 0ms and 50ms
        assert_eq!(sampler.sampled_points(), 2);

        let trail = sampler.close().expect("two points form a trail");
        assert_eq!(trail.points.len(), 2);
        assert!((trail.distance - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_idle_gap_closes_trail() {
        let mut sampler = TrailSampler::default();
        sampler.on_move(ScreenPoint::new(0, 0), at(0));
        sampler.on_move(ScreenPoint::new(10, 0), at(60));

        let outcome = sampler.on_move(ScreenPoint::new(20, 0), at(1_200));
        let trail = outcome.closed.expect("idle gap closes previous trail");
        assert_eq!(trail.end_time, at(60));
        assert_eq!(sampler.sampled_points(), 1);

        assert!(sampler.check_idle(at(2_300)).is_none(), "single point trail is discarded");
    }

    #[test]
    fn test_point_limit_closes_trail() {
        let config = MouseConfig { trail_max_points: 3, ..MouseConfig::default() };
        let mut sampler = TrailSampler::new(config);
        sampler.on_move(ScreenPoint::new(0, 0), at(0));
        sampler.on_move(ScreenPoint::new(1, 0), at(50));
        let outcome = sampler.on_move(ScreenPoint::new(2, 0), at(100));
        assert_eq!(outcome.closed.map(|t| t.points.len()), Some(3));
        assert_eq!(sampler.sampled_points(), 0);
    }

    #[test]
    fn test_click_cluster_emitted_at_three_clicks() {
        let mut clusterer = ClickClusterer::default();
        assert!(clusterer.on_click(ScreenPoint::new(100, 100), at(0)).is_none());
        assert!(clusterer.on_click(ScreenPoint::new(110, 95), at(400)).is_none());
        assert!(clusterer.on_click(ScreenPoint::new(105, 105), at(900)).is_none());

        let cluster = clusterer.check_idle(at(2_500)).expect("cluster closes after window");
        assert_eq!(cluster.click_count, 3);
        assert!((cluster.center_x - 105.0).abs() < 1e-9);
        assert_eq!(cluster.end_time, at(900));
    }

    #[test]
    fn test_distant_click_starts_new_cluster() {
        let mut clusterer = ClickClusterer::default();
        clusterer.on_click(ScreenPoint::new(0, 0), at(0));
        clusterer.on_click(ScreenPoint::new(5, 5), at(100));
        // far away: the pair is discarded, below the minimum
        assert!(clusterer.on_click(ScreenPoint::new(500, 500), at(200)).is_none());
        assert!(clusterer.close().is_none());
    }
}
