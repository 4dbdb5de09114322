//! Foreground application types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::classification::{Classification, ContextType};
use crate::constants::UNKNOWN_PROCESS;

/// Window rectangle in screen coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WindowBounds {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

/// Window geometry recorded with an app session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WindowGeometry {
    pub bounds: WindowBounds,
    pub is_maximized: bool,
}

/// Process and window metadata for the foreground window.
///
/// Resolution never fails as a whole: unreadable fields stay empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedApp {
    pub process_name: String,
    pub executable_path: String,
    pub app_name: String,
    pub version: Option<String>,
    pub publisher: Option<String>,
    pub window_title: String,
    pub window_class: String,
    pub window_bounds: WindowBounds,
    pub is_maximized: bool,
}

impl ResolvedApp {
    /// Placeholder used when the owning process cannot be determined.
    pub fn unknown() -> Self {
        Self {
            process_name: UNKNOWN_PROCESS.to_string(),
            executable_path: String::new(),
            app_name: UNKNOWN_PROCESS.to_string(),
            version: None,
            publisher: None,
            window_title: String::new(),
            window_class: String::new(),
            window_bounds: WindowBounds::default(),
            is_maximized: false,
        }
    }

    /// Minimal record for a process name and title.
    pub fn named(process_name: &str, window_title: &str) -> Self {
        Self {
            process_name: process_name.to_string(),
            app_name: process_name.to_string(),
            window_title: window_title.to_string(),
            ..Self::unknown()
        }
    }

    pub fn geometry(&self) -> WindowGeometry {
        WindowGeometry { bounds: self.window_bounds, is_maximized: self.is_maximized }
    }
}

/// A bounded period during which one process owned the foreground
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSession {
    pub id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_secs: i64,
    pub process_name: String,
    pub window_title: String,
    pub category: String,
    pub context: ContextType,
    pub window_geometry: WindowGeometry,
}

impl AppSession {
    /// Open a new session for a resolved app.
    pub fn open(app: &ResolvedApp, classification: &Classification, at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            start_time: at,
            end_time: None,
            duration_secs: 0,
            process_name: app.process_name.clone(),
            window_title: app.window_title.clone(),
            category: classification.category.clone(),
            context: classification.context,
            window_geometry: app.geometry(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }

    /// Close at `at`; an `at` earlier than the start clamps the duration to zero.
    pub fn close(&mut self, at: DateTime<Utc>) {
        let end = at.max(self.start_time);
        self.end_time = Some(end);
        self.duration_secs = (end - self.start_time).num_seconds();
    }

    /// End time, or the start time for a session that was never closed.
    pub fn effective_end(&self) -> DateTime<Utc> {
        self.end_time.unwrap_or(self.start_time)
    }

    pub fn duration_minutes(&self) -> f64 {
        self.duration_secs as f64 / 60.0
    }
}
