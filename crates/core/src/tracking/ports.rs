//! Port interfaces for activity tracking
//!
//! These traits define the boundaries between core business logic
//! and infrastructure implementations.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use deskpulse_domain::{
    AppSession, CaptureEvent, KeyboardSession, MouseSession, ResolvedApp, Result, UsagePattern,
    UserGoal, WebSession, WindowHandle,
};
use tokio::sync::mpsc::UnboundedSender;

/// Enqueue-only handle given to an [`InputSource`].
///
/// `push` never blocks and never allocates beyond the queue node, so it is
/// safe to call from an OS hook callback.
#[derive(Debug, Clone)]
pub struct EventSink {
    sender: UnboundedSender<CaptureEvent>,
}

impl EventSink {
    pub fn new(sender: UnboundedSender<CaptureEvent>) -> Self {
        Self { sender }
    }

    /// Push an event. Returns `false` once the consumer is gone.
    #[inline]
    pub fn push(&self, event: CaptureEvent) -> bool {
        self.sender.send(event).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// OS-level source of keyboard, mouse and foreground-change events
pub trait InputSource: Send + Sync {
    /// Register hooks and start delivering events to `sink`.
    ///
    /// A registration failure returns `Err` and leaves the source stopped so
    /// the caller may retry.
    fn start(&self, sink: EventSink) -> Result<()>;

    /// Unregister hooks. Idempotent.
    fn stop(&self) -> Result<()>;

    fn is_running(&self) -> bool;
}

/// Resolves a window handle into process and window metadata.
///
/// Blocking; callers run it off the async executor. Never fails: any OS call
/// that errors leaves the corresponding field empty.
pub trait AppResolver: Send + Sync {
    fn resolve(&self, window: WindowHandle) -> ResolvedApp;
}

/// Storage collaborator for closed session aggregates
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn save_app_session(&self, session: AppSession) -> Result<()>;

    async fn save_web_session(&self, session: WebSession) -> Result<()>;

    /// Insert or replace the bucket keyed by (date, hour).
    async fn upsert_keyboard_session(&self, session: KeyboardSession) -> Result<()>;

    /// Insert or replace the bucket keyed by (date, hour).
    async fn upsert_mouse_session(&self, session: MouseSession) -> Result<()>;

    async fn save_usage_patterns(&self, date: NaiveDate, patterns: Vec<UsagePattern>)
        -> Result<()>;

    /// App sessions whose start time falls in `[start, end)`, ordered by start.
    async fn app_sessions_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<AppSession>>;

    /// Web sessions whose start time falls in `[start, end)`, ordered by start.
    async fn web_sessions_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<WebSession>>;

    /// Keyboard buckets with `from <= date <= to`, ordered by (date, hour).
    async fn keyboard_sessions_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<KeyboardSession>>;

    /// Mouse buckets with `from <= date <= to`, ordered by (date, hour).
    async fn mouse_sessions_between(&self, from: NaiveDate, to: NaiveDate)
        -> Result<Vec<MouseSession>>;
}

/// Read-only access to user goals
#[async_trait]
pub trait GoalRepository: Send + Sync {
    async fn active_goals(&self) -> Result<Vec<UserGoal>>;
}

/// Counters the tracking pipeline reports to.
///
/// Every method defaults to a no-op so adapters only override what they track.
pub trait CaptureObserver: Send + Sync {
    fn event_processed(&self) {}

    fn foreground_changed(&self) {}

    /// App resolution fell back to partial or placeholder data.
    fn resolution_degraded(&self) {}

    /// An event stamped before the open hourly bucket was counted in it.
    fn late_event_rerouted(&self) {}

    fn storage_failed(&self) {}
}

/// Observer that records nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCaptureObserver;

impl CaptureObserver for NoopCaptureObserver {}
