//! Foreground app session state machine
//!
//! Closed → Open on the first foreground change. While open, a change to a
//! different process closes the session and opens the next one; a change
//! within the same process only reports a title change.

use chrono::{DateTime, Utc};
use deskpulse_domain::{AppSession, Classification, ResolvedApp};
use uuid::Uuid;

/// Transition produced by one foreground change
#[derive(Debug, Clone, PartialEq)]
pub enum ForegroundTransition {
    Opened(AppSession),
    Switched { closed: AppSession, opened: AppSession },
    TitleChanged { session_id: Uuid, process_name: String, previous: String, current: String },
    /// Same process and title as before.
    Unchanged,
}

#[derive(Debug, Default)]
pub struct AppSessionTracker {
    current: Option<AppSession>,
    /// Last title reported for the open session.
    last_title: String,
}

impl AppSessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_foreground(
        &mut self,
        app: &ResolvedApp,
        classification: &Classification,
        at: DateTime<Utc>,
    ) -> ForegroundTransition {
        let Some(current) = self.current.as_ref() else {
            let opened = self.open(app, classification, at);
            return ForegroundTransition::Opened(opened);
        };

        if !current.process_name.eq_ignore_ascii_case(&app.process_name) {
            let mut closed = current.clone();
            closed.close(at);
            let opened = self.open(app, classification, at);
            return ForegroundTransition::Switched { closed, opened };
        }

        if self.last_title == app.window_title {
            return ForegroundTransition::Unchanged;
        }

        let previous = std::mem::replace(&mut self.last_title, app.window_title.clone());
        ForegroundTransition::TitleChanged {
            session_id: current.id,
            process_name: current.process_name.clone(),
            previous,
            current: app.window_title.clone(),
        }
    }

    /// Close the open session at `at`, leaving the tracker in the closed state.
    pub fn close(&mut self, at: DateTime<Utc>) -> Option<AppSession> {
        let mut session = self.current.take()?;
        self.last_title.clear();
        session.close(at);
        Some(session)
    }

    pub fn current(&self) -> Option<&AppSession> {
        self.current.as_ref()
    }

    pub fn current_process(&self) -> Option<&str> {
        self.current.as_ref().map(|s| s.process_name.as_str())
    }

    fn open(&mut self, app: &ResolvedApp, classification: &Classification, at: DateTime<Utc>) -> AppSession {
        let session = AppSession::open(app, classification, at);
        self.last_title = app.window_title.clone();
        self.current = Some(session.clone());
        session
    }
}
