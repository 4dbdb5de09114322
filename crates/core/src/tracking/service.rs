//! Activity tracking service - core business logic
//!
//! Sole writer of the capture-side session state. Consumes [`CaptureEvent`]s
//! in arrival order, drives the detectors and aggregators, hands closed
//! aggregates to the [`SessionRepository`] and republishes notable
//! transitions as [`TrackingEvent`]s.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use deskpulse_domain::constants::UNKNOWN_PROCESS;
use deskpulse_domain::{
    AppSession, BucketKey, CaptureEvent, ClickCluster, KeyCode, MouseButton, MouseTrail,
    RawInputEvent, RawInputKind, ResolvedApp, ScreenPoint, ShortcutUsage, TypingBurst,
    WindowHandle,
};
use tokio::sync::broadcast;
use tracing::{debug, warn};
use uuid::Uuid;

use super::app_session::{AppSessionTracker, ForegroundTransition};
use super::buckets::{BucketAggregator, FlushedBuckets, OpenBuckets};
use super::burst::{BurstConfig, BurstDetector};
use super::mouse::{ClickClusterer, MouseConfig, TrailSampler};
use super::ports::{AppResolver, CaptureObserver, NoopCaptureObserver, SessionRepository};
use super::shortcut::{KeyRoute, ShortcutDetector, ShortcutTable};
use crate::classification::CategoryClassifier;

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Notifications published by the tracking service
#[derive(Debug, Clone, PartialEq)]
pub enum TrackingEvent {
    AppSessionOpened(AppSession),
    AppSessionClosed(AppSession),
    WindowTitleChanged {
        session_id: Uuid,
        process_name: String,
        previous: String,
        current: String,
        timestamp: DateTime<Utc>,
    },
    TypingBurst(TypingBurst),
    Shortcut(ShortcutUsage),
    BucketFlushed { key: BucketKey, keyboard: bool, mouse: bool },
}

/// Detector thresholds and bucketing offset
#[derive(Debug, Clone)]
pub struct TrackingConfig {
    pub burst: BurstConfig,
    pub mouse: MouseConfig,
    pub shortcuts: ShortcutTable,
    pub utc_offset: FixedOffset,
}

impl TrackingConfig {
    pub fn with_offset(utc_offset: FixedOffset) -> Self {
        Self {
            burst: BurstConfig::default(),
            mouse: MouseConfig::default(),
            shortcuts: ShortcutTable::default(),
            utc_offset,
        }
    }
}

/// Activity tracking service
pub struct TrackingService {
    resolver: Arc<dyn AppResolver>,
    repository: Arc<dyn SessionRepository>,
    classifier: Arc<CategoryClassifier>,
    observer: Arc<dyn CaptureObserver>,
    shortcuts: ShortcutDetector,
    bursts: BurstDetector,
    trails: TrailSampler,
    clusters: ClickClusterer,
    apps: AppSessionTracker,
    buckets: BucketAggregator,
    events: broadcast::Sender<TrackingEvent>,
}

impl TrackingService {
    /// Create a new tracking service
    pub fn new(
        resolver: Arc<dyn AppResolver>,
        repository: Arc<dyn SessionRepository>,
        classifier: Arc<CategoryClassifier>,
        config: TrackingConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            resolver,
            repository,
            classifier,
            observer: Arc::new(NoopCaptureObserver),
            shortcuts: ShortcutDetector::new(config.shortcuts),
            bursts: BurstDetector::new(config.burst),
            trails: TrailSampler::new(config.mouse),
            clusters: ClickClusterer::new(config.mouse),
            apps: AppSessionTracker::new(),
            buckets: BucketAggregator::new(config.utc_offset),
            events,
        }
    }

    /// Report pipeline counters to `observer`
    pub fn with_observer(mut self, observer: Arc<dyn CaptureObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TrackingEvent> {
        self.events.subscribe()
    }

    /// Sender half of the notification channel, for subscribing after the
    /// service has been moved into a consumer task.
    pub fn event_sender(&self) -> broadcast::Sender<TrackingEvent> {
        self.events.clone()
    }

    pub fn current_app_session(&self) -> Option<&AppSession> {
        self.apps.current()
    }

    pub fn open_buckets(&self) -> Option<&OpenBuckets> {
        self.buckets.current()
    }

    /// Keys counted in the typing burst currently in progress.
    pub fn open_burst_keys(&self) -> u32 {
        self.bursts.open_key_count()
    }

    /// Apply one captured event.
    pub async fn handle(&mut self, event: CaptureEvent) {
        self.observer.event_processed();
        match event {
            CaptureEvent::ForegroundChanged { window, timestamp } => {
                self.on_foreground(window, timestamp).await;
            }
            CaptureEvent::Input(input) => self.on_input(input).await,
        }
    }

    /// Periodic idle check: closes stale bursts, trails and click clusters,
    /// then flushes the bucket pair once its hour has elapsed.
    pub async fn tick(&mut self, now: DateTime<Utc>) {
        if let Some(burst) = self.bursts.check_idle(now) {
            self.file_burst(burst, now);
        }
        if let Some(trail) = self.trails.check_idle(now) {
            self.file_trail(trail, now);
        }
        if let Some(cluster) = self.clusters.check_idle(now) {
            self.file_cluster(cluster, now);
        }
        if let Some(flushed) = self.buckets.roll(now) {
            self.persist_buckets(flushed).await;
        }
    }

    /// Force-close every open aggregate at `now`.
    pub async fn shutdown(&mut self, now: DateTime<Utc>) {
        if let Some(burst) = self.bursts.close() {
            self.file_burst(burst, now);
        }
        if let Some(trail) = self.trails.close() {
            self.file_trail(trail, now);
        }
        if let Some(cluster) = self.clusters.close() {
            self.file_cluster(cluster, now);
        }
        if let Some(session) = self.apps.close(now) {
            self.close_app_session(session).await;
        }
        if let Some(flushed) = self.buckets.flush() {
            self.persist_buckets(flushed).await;
        }
        debug!("tracking state closed");
    }

    async fn on_foreground(&mut self, window: WindowHandle, at: DateTime<Utc>) {
        let app = self.resolve(window).await;
        self.observer.foreground_changed();
        let classification = self.classifier.classify_app(&app);

        match self.apps.on_foreground(&app, &classification, at) {
            ForegroundTransition::Opened(opened) => {
                debug!(process = %opened.process_name, category = %opened.category, "app session opened");
                self.publish(TrackingEvent::AppSessionOpened(opened));
            }
            ForegroundTransition::Switched { closed, opened } => {
                if let Some(burst) = self.bursts.close() {
                    self.file_burst(burst, at);
                }
                self.close_app_session(closed).await;
                debug!(process = %opened.process_name, category = %opened.category, "app session opened");
                self.publish(TrackingEvent::AppSessionOpened(opened));
            }
            ForegroundTransition::TitleChanged { session_id, process_name, previous, current } => {
                self.publish(TrackingEvent::WindowTitleChanged {
                    session_id,
                    process_name,
                    previous,
                    current,
                    timestamp: at,
                });
            }
            ForegroundTransition::Unchanged => {}
        }
    }

    async fn resolve(&self, window: WindowHandle) -> ResolvedApp {
        let resolver = Arc::clone(&self.resolver);
        let app = match tokio::task::spawn_blocking(move || resolver.resolve(window)).await {
            Ok(app) => app,
            Err(err) => {
                warn!(error = %err, "app resolution task failed");
                ResolvedApp::unknown()
            }
        };
        if app.process_name == UNKNOWN_PROCESS || app.executable_path.is_empty() {
            self.observer.resolution_degraded();
        }
        app
    }

    async fn on_input(&mut self, input: RawInputEvent) {
        let at = input.timestamp;
        match input.kind {
            RawInputKind::KeyDown { key } => self.on_key_down(key, at).await,
            RawInputKind::KeyUp { key } => self.shortcuts.key_up(key),
            RawInputKind::MouseMove { position } => self.on_mouse_move(position, at).await,
            RawInputKind::MouseClick { button, position } => {
                self.on_click(button, position, at).await;
            }
            RawInputKind::MouseScroll { .. } => {
                self.route(at).await;
                self.buckets.open_at(at).mouse.scroll_count += 1;
            }
        }
    }

    async fn on_key_down(&mut self, key: KeyCode, at: DateTime<Utc>) {
        self.route(at).await;
        {
            let keyboard = &mut self.buckets.open_at(at).keyboard;
            keyboard.total_key_presses += 1;
            *keyboard.key_frequency.entry(key.name()).or_insert(0) += 1;
        }

        let process = self.current_process();
        match self.shortcuts.key_down(key) {
            KeyRoute::Modifier => {}
            KeyRoute::Shortcut(chord) => {
                let usage = ShortcutDetector::usage(chord, &process, at);
                self.buckets.open_at(at).keyboard.shortcuts.push(usage.clone());
                self.publish(TrackingEvent::Shortcut(usage));
            }
            KeyRoute::Typing => {
                if let Some(burst) = self.bursts.record_key(&process, at) {
                    self.file_burst(burst, at);
                }
            }
        }
    }

    async fn on_mouse_move(&mut self, position: ScreenPoint, at: DateTime<Utc>) {
        self.route(at).await;
        let outcome = self.trails.on_move(position, at);
        self.buckets.open_at(at).mouse.total_move_distance += outcome.distance;
        if let Some(trail) = outcome.closed {
            self.file_trail(trail, at);
        }
    }

    async fn on_click(&mut self, button: MouseButton, position: ScreenPoint, at: DateTime<Utc>) {
        self.route(at).await;
        {
            let mouse = &mut self.buckets.open_at(at).mouse;
            match button {
                MouseButton::Left => mouse.left_clicks += 1,
                MouseButton::Right => mouse.right_clicks += 1,
                MouseButton::Middle => mouse.middle_clicks += 1,
            }
        }
        if let Some(trail) = self.trails.close() {
            self.file_trail(trail, at);
        }
        if let Some(cluster) = self.clusters.on_click(position, at) {
            self.file_cluster(cluster, at);
        }
    }

    /// Route an event timestamp to the bucket pair, persisting any flushed hour.
    async fn route(&mut self, at: DateTime<Utc>) {
        let advance = self.buckets.advance(at);
        if advance.late {
            self.observer.late_event_rerouted();
            debug!(timestamp = %at, "late event counted in current bucket");
        }
        if let Some(flushed) = advance.flushed {
            self.persist_buckets(flushed).await;
        }
    }

    fn current_process(&self) -> String {
        self.apps.current_process().unwrap_or(UNKNOWN_PROCESS).to_string()
    }

    fn file_burst(&mut self, burst: TypingBurst, at: DateTime<Utc>) {
        self.buckets.open_at(at).keyboard.typing_bursts.push(burst.clone());
        self.publish(TrackingEvent::TypingBurst(burst));
    }

    fn file_trail(&mut self, trail: MouseTrail, at: DateTime<Utc>) {
        self.buckets.open_at(at).mouse.trails.push(trail);
    }

    fn file_cluster(&mut self, cluster: ClickCluster, at: DateTime<Utc>) {
        self.buckets.open_at(at).mouse.click_clusters.push(cluster);
    }

    async fn close_app_session(&self, session: AppSession) {
        debug!(
            process = %session.process_name,
            duration_secs = session.duration_secs,
            "app session closed"
        );
        if let Err(err) = self.repository.save_app_session(session.clone()).await {
            self.observer.storage_failed();
            warn!(error = %err, session_id = %session.id, "failed to save app session");
        }
        self.publish(TrackingEvent::AppSessionClosed(session));
    }

    async fn persist_buckets(&self, flushed: FlushedBuckets) {
        if flushed.is_empty() {
            return;
        }
        let key = flushed.key;
        let event = TrackingEvent::BucketFlushed {
            key,
            keyboard: flushed.keyboard.is_some(),
            mouse: flushed.mouse.is_some(),
        };
        if let Some(keyboard) = flushed.keyboard {
            if let Err(err) = self.repository.upsert_keyboard_session(keyboard).await {
                self.observer.storage_failed();
                warn!(error = %err, bucket = %key, "failed to save keyboard bucket");
            }
        }
        if let Some(mouse) = flushed.mouse {
            if let Err(err) = self.repository.upsert_mouse_session(mouse).await {
                self.observer.storage_failed();
                warn!(error = %err, bucket = %key, "failed to save mouse bucket");
            }
        }
        self.publish(event);
    }

    fn publish(&self, event: TrackingEvent) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }
}
