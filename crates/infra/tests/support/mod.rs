//! Shared helpers for infra integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use deskpulse_core::tracking::ports::{AppResolver, EventSink, InputSource, SessionRepository};
use deskpulse_domain::{
    AppSession, CaptureEvent, DeskPulseError, KeyCode, KeyboardSession, MouseSession,
    RawInputEvent, RawInputKind, ResolvedApp, Result as DomainResult, UsagePattern, WebSession,
    WindowHandle,
};
use parking_lot::Mutex;

/// Input source driven by the test: events are pushed by hand.
#[derive(Default)]
pub struct ScriptedInputSource {
    sink: Mutex<Option<EventSink>>,
    fail_start: AtomicBool,
    starts: AtomicUsize,
    stops: AtomicUsize,
}

impl ScriptedInputSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `start` calls fail like a hook registration error.
    pub fn fail_start(&self, fail: bool) {
        self.fail_start.store(fail, Ordering::SeqCst);
    }

    /// Push an event as a hook callback would. Returns false when stopped.
    pub fn push(&self, event: CaptureEvent) -> bool {
        self.sink.lock().as_ref().map_or(false, |sink| sink.push(event))
    }

    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl InputSource for ScriptedInputSource {
    fn start(&self, sink: EventSink) -> DomainResult<()> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(DeskPulseError::Platform("hook registration refused".into()));
        }
        *self.sink.lock() = Some(sink);
        Ok(())
    }

    fn stop(&self) -> DomainResult<()> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.sink.lock().take();
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.sink.lock().is_some()
    }
}

/// Resolver answering from a fixed handle → process table
#[derive(Default)]
pub struct TableResolver {
    windows: HashMap<isize, ResolvedApp>,
}

impl TableResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_window(mut self, window: isize, process: &str, title: &str) -> Self {
        let mut app = ResolvedApp::named(process, title);
        app.executable_path = format!("C:\\Apps\\{process}");
        self.windows.insert(window, app);
        self
    }
}

impl AppResolver for TableResolver {
    fn resolve(&self, window: WindowHandle) -> ResolvedApp {
        self.windows.get(&window.0).cloned().unwrap_or_else(ResolvedApp::unknown)
    }
}

/// Repository whose app-session writes never complete, like a hung backend.
#[derive(Default)]
pub struct StallingRepository {
    saves_attempted: AtomicUsize,
}

impl StallingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn saves_attempted(&self) -> usize {
        self.saves_attempted.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionRepository for StallingRepository {
    async fn save_app_session(&self, _session: AppSession) -> DomainResult<()> {
        self.saves_attempted.fetch_add(1, Ordering::SeqCst);
        std::future::pending().await
    }

    async fn save_web_session(&self, _session: WebSession) -> DomainResult<()> {
        Ok(())
    }

    async fn upsert_keyboard_session(&self, _session: KeyboardSession) -> DomainResult<()> {
        Ok(())
    }

    async fn upsert_mouse_session(&self, _session: MouseSession) -> DomainResult<()> {
        Ok(())
    }

    async fn save_usage_patterns(
        &self,
        _date: NaiveDate,
        _patterns: Vec<UsagePattern>,
    ) -> DomainResult<()> {
        Ok(())
    }

    async fn app_sessions_between(
        &self,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> DomainResult<Vec<AppSession>> {
        Ok(Vec::new())
    }

    async fn web_sessions_between(
        &self,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> DomainResult<Vec<WebSession>> {
        Ok(Vec::new())
    }

    async fn keyboard_sessions_between(
        &self,
        _from: NaiveDate,
        _to: NaiveDate,
    ) -> DomainResult<Vec<KeyboardSession>> {
        Ok(Vec::new())
    }

    async fn mouse_sessions_between(
        &self,
        _from: NaiveDate,
        _to: NaiveDate,
    ) -> DomainResult<Vec<MouseSession>> {
        Ok(Vec::new())
    }
}

pub fn foreground(window: isize, at: DateTime<Utc>) -> CaptureEvent {
    CaptureEvent::ForegroundChanged { window: WindowHandle(window), timestamp: at }
}

pub fn key_down(code: u32, at: DateTime<Utc>) -> CaptureEvent {
    CaptureEvent::Input(RawInputEvent::new(RawInputKind::KeyDown { key: KeyCode(code) }, at))
}

/// Poll `check` until it returns true or `timeout` elapses.
pub async fn eventually<F, Fut>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if check().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
