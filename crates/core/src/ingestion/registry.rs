//! Concurrent web session registry
//!
//! Open web sessions are keyed by (client, tab) in a sharded concurrent map so
//! connection handler tasks can mutate their own tabs without a global lock.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use deskpulse_domain::{ClientId, WebSession, WebSessionKey};

#[derive(Debug)]
pub struct WebSessionRegistry {
    sessions: DashMap<WebSessionKey, WebSession>,
    browsers: DashMap<ClientId, String>,
    next_client: AtomicU64,
}

impl Default for WebSessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl WebSessionRegistry {
    pub fn new() -> Self {
        Self { sessions: DashMap::new(), browsers: DashMap::new(), next_client: AtomicU64::new(1) }
    }

    /// Allocate a fresh client id. Ids are never reused.
    pub fn register_client(&self) -> ClientId {
        ClientId(self.next_client.fetch_add(1, Ordering::Relaxed))
    }

    pub fn set_browser(&self, client_id: ClientId, browser: &str) {
        self.browsers.insert(client_id, browser.to_string());
    }

    pub fn browser(&self, client_id: ClientId) -> Option<String> {
        self.browsers.get(&client_id).map(|b| b.value().clone())
    }

    /// Open `session`, returning the session it superseded on the same key,
    /// closed at the new session's start.
    pub fn open(&self, session: WebSession) -> Option<WebSession> {
        let at = session.start_time;
        self.sessions.insert(session.key(), session).map(|mut previous| {
            previous.close(at);
            previous
        })
    }

    /// Remove and close the session for `key`.
    pub fn close(&self, key: WebSessionKey, at: DateTime<Utc>) -> Option<WebSession> {
        self.sessions.remove(&key).map(|(_, mut session)| {
            session.close(at);
            session
        })
    }

    /// Remove every session of `client_id`, closed at `at`, ordered by tab.
    pub fn purge_client(&self, client_id: ClientId, at: DateTime<Utc>) -> Vec<WebSession> {
        let keys: Vec<WebSessionKey> = self
            .sessions
            .iter()
            .filter(|entry| entry.key().client_id == client_id)
            .map(|entry| *entry.key())
            .collect();
        self.browsers.remove(&client_id);

        let mut closed: Vec<WebSession> = keys.into_iter().filter_map(|key| self.close(key, at)).collect();
        closed.sort_by_key(|s| (s.tab_id, s.start_time));
        closed
    }

    pub fn get(&self, key: WebSessionKey) -> Option<WebSession> {
        self.sessions.get(&key).map(|s| s.value().clone())
    }

    pub fn open_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn open_for_client(&self, client_id: ClientId) -> usize {
        self.sessions.iter().filter(|entry| entry.key().client_id == client_id).count()
    }
}
