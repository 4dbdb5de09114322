//! Session fixtures and scripted collaborators

use std::collections::HashMap;

use chrono::{DateTime, Duration, TimeZone, Utc};
use deskpulse_core::tracking::ports::AppResolver;
use deskpulse_domain::{
    AppSession, CaptureEvent, Classification, ContextType, KeyCode, RawInputEvent, RawInputKind,
    ResolvedApp, WindowHandle,
};
use parking_lot::Mutex;

/// 2024-04-02 09:00:00 UTC
pub fn morning() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 4, 2, 9, 0, 0).unwrap()
}

pub fn at_ms(ms: i64) -> DateTime<Utc> {
    morning() + Duration::milliseconds(ms)
}

/// Closed app session starting `start_min` minutes after [`morning`].
pub fn app_session(process: &str, context: ContextType, start_min: i64, len_min: i64) -> AppSession {
    let start = morning() + Duration::minutes(start_min);
    let classification = Classification::new(context.to_string(), context);
    let mut session = AppSession::open(&ResolvedApp::named(process, "window"), &classification, start);
    session.close(start + Duration::minutes(len_min));
    session
}

pub fn key_down(code: u32, ms: i64) -> CaptureEvent {
    CaptureEvent::Input(RawInputEvent::new(RawInputKind::KeyDown { key: KeyCode(code) }, at_ms(ms)))
}

pub fn key_up(code: u32, ms: i64) -> CaptureEvent {
    CaptureEvent::Input(RawInputEvent::new(RawInputKind::KeyUp { key: KeyCode(code) }, at_ms(ms)))
}

pub fn foreground(window: isize, ms: i64) -> CaptureEvent {
    CaptureEvent::ForegroundChanged { window: WindowHandle(window), timestamp: at_ms(ms) }
}

/// Resolver answering from a fixed window table; unknown handles resolve to
/// the placeholder app.
#[derive(Default)]
pub struct ScriptedResolver {
    windows: Mutex<HashMap<isize, ResolvedApp>>,
}

impl ScriptedResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_window(self, window: isize, process: &str, title: &str) -> Self {
        let mut app = ResolvedApp::named(process, title);
        app.executable_path = format!("C:\\Program Files\\{process}");
        self.windows.lock().insert(window, app);
        self
    }

    /// Change what a window resolves to, e.g. a new title.
    pub fn set_title(&self, window: isize, title: &str) {
        if let Some(app) = self.windows.lock().get_mut(&window) {
            app.window_title = title.to_string();
        }
    }
}

impl AppResolver for ScriptedResolver {
    fn resolve(&self, window: WindowHandle) -> ResolvedApp {
        self.windows.lock().get(&window.0).cloned().unwrap_or_else(ResolvedApp::unknown)
    }
}
