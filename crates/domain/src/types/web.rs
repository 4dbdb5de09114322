//! Browser activity types reported by the external browser agent

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::classification::{Classification, ContextType};

/// Identifier assigned to each accepted ingestion connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClientId(pub u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client-{}", self.0)
    }
}

/// Composite key correlating web sessions: one per (client, tab)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WebSessionKey {
    pub client_id: ClientId,
    pub tab_id: i64,
}

impl WebSessionKey {
    pub const fn new(client_id: ClientId, tab_id: i64) -> Self {
        Self { client_id, tab_id }
    }
}

/// Time spent on one page in one browser tab
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebSession {
    pub id: Uuid,
    pub url: String,
    pub title: String,
    pub domain: String,
    pub browser: String,
    pub tab_id: i64,
    pub client_id: ClientId,
    pub category: String,
    pub context: ContextType,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_secs: i64,
}

/// Fields needed to open a web session
#[derive(Debug, Clone, PartialEq)]
pub struct WebSessionParams {
    pub key: WebSessionKey,
    pub url: String,
    pub title: String,
    pub domain: String,
    pub browser: String,
    pub classification: Classification,
    pub start_time: DateTime<Utc>,
}

impl WebSession {
    pub fn open(params: WebSessionParams) -> Self {
        Self {
            id: Uuid::now_v7(),
            url: params.url,
            title: params.title,
            domain: params.domain,
            browser: params.browser,
            tab_id: params.key.tab_id,
            client_id: params.key.client_id,
            category: params.classification.category,
            context: params.classification.context,
            start_time: params.start_time,
            end_time: None,
            duration_secs: 0,
        }
    }

    pub fn key(&self) -> WebSessionKey {
        WebSessionKey::new(self.client_id, self.tab_id)
    }

    pub fn close(&mut self, at: DateTime<Utc>) {
        let end = at.max(self.start_time);
        self.end_time = Some(end);
        self.duration_secs = (end - self.start_time).num_seconds();
    }
}

/// What happened in the browser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WebActivityKind {
    PageView,
    TabActivate,
    PageClose,
    TabClose,
    Scroll { percentage: f64 },
    Click { element: Option<String>, x: Option<f64>, y: Option<f64> },
    FormSubmit { element: Option<String> },
    Search { query: String, engine: Option<String> },
    Navigation,
}

/// Typed web activity republished by the ingestion service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebActivityEvent {
    pub key: WebSessionKey,
    pub kind: WebActivityKind,
    pub url: String,
    pub domain: String,
    pub title: String,
    pub browser: String,
    pub category: String,
    pub context: ContextType,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    #[test]
    fn test_session_key_round_trip() {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 14, 0, 0).unwrap();
        let key = WebSessionKey::new(ClientId(7), 3);
        let mut session = WebSession::open(WebSessionParams {
            key,
            url: "https://docs.rs/tokio".into(),
            title: "tokio - Rust".into(),
            domain: "docs.rs".into(),
            browser: "chrome".into(),
            classification: Classification::new("Documentation", ContextType::Documentation),
            start_time: start,
        });

        assert_eq!(session.key(), key);
        session.close(start + Duration::seconds(90));
        assert_eq!(session.duration_secs, 90);
    }

    #[test]
    fn test_client_id_display() {
        assert_eq!(ClientId(12).to_string(), "client-12");
    }
}
