//! In-memory session store
//!
//! Implements both storage ports over ordered maps. Saves are idempotent:
//! sessions are keyed by (start time, id) and buckets by (date, hour), so a
//! retried write replaces rather than duplicates.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use deskpulse_core::tracking::ports::{GoalRepository, SessionRepository};
use deskpulse_domain::{
    AppSession, BucketKey, KeyboardSession, MouseSession, Result, UsagePattern, UserGoal,
    WebSession,
};
use parking_lot::RwLock;
use tracing::debug;
use uuid::Uuid;

type SessionKey = (DateTime<Utc>, Uuid);

/// Process-local store for closed sessions, buckets, patterns and goals
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    app_sessions: RwLock<BTreeMap<SessionKey, AppSession>>,
    web_sessions: RwLock<BTreeMap<SessionKey, WebSession>>,
    keyboard: RwLock<BTreeMap<BucketKey, KeyboardSession>>,
    mouse: RwLock<BTreeMap<BucketKey, MouseSession>>,
    patterns: RwLock<BTreeMap<NaiveDate, Vec<UsagePattern>>>,
    goals: RwLock<Vec<UserGoal>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a goal (matched by id).
    pub fn add_goal(&self, goal: UserGoal) {
        let mut goals = self.goals.write();
        goals.retain(|existing| existing.id != goal.id);
        goals.push(goal);
    }

    /// Patterns stored for `date`, if detection has run for it.
    pub fn patterns_for(&self, date: NaiveDate) -> Option<Vec<UsagePattern>> {
        self.patterns.read().get(&date).cloned()
    }

    pub fn app_session_count(&self) -> usize {
        self.app_sessions.read().len()
    }

    pub fn web_session_count(&self) -> usize {
        self.web_sessions.read().len()
    }

    /// Number of stored (keyboard, mouse) buckets.
    pub fn bucket_counts(&self) -> (usize, usize) {
        (self.keyboard.read().len(), self.mouse.read().len())
    }
}

fn in_range<T: Clone>(
    map: &BTreeMap<SessionKey, T>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<T> {
    if start >= end {
        return Vec::new();
    }
    map.range((start, Uuid::nil())..(end, Uuid::nil())).map(|(_, value)| value.clone()).collect()
}

fn buckets_between<T: Clone>(map: &BTreeMap<BucketKey, T>, from: NaiveDate, to: NaiveDate) -> Vec<T> {
    if from > to {
        return Vec::new();
    }
    map.range(BucketKey::new(from, 0)..=BucketKey::new(to, 23)).map(|(_, value)| value.clone()).collect()
}

#[async_trait]
impl SessionRepository for InMemorySessionStore {
    async fn save_app_session(&self, session: AppSession) -> Result<()> {
        debug!(session_id = %session.id, process = %session.process_name, "storing app session");
        self.app_sessions.write().insert((session.start_time, session.id), session);
        Ok(())
    }

    async fn save_web_session(&self, session: WebSession) -> Result<()> {
        debug!(session_id = %session.id, domain = %session.domain, "storing web session");
        self.web_sessions.write().insert((session.start_time, session.id), session);
        Ok(())
    }

    async fn upsert_keyboard_session(&self, session: KeyboardSession) -> Result<()> {
        self.keyboard.write().insert(session.key(), session);
        Ok(())
    }

    async fn upsert_mouse_session(&self, session: MouseSession) -> Result<()> {
        self.mouse.write().insert(session.key(), session);
        Ok(())
    }

    async fn save_usage_patterns(&self, date: NaiveDate, patterns: Vec<UsagePattern>) -> Result<()> {
        debug!(%date, count = patterns.len(), "storing usage patterns");
        self.patterns.write().insert(date, patterns);
        Ok(())
    }

    async fn app_sessions_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<AppSession>> {
        Ok(in_range(&self.app_sessions.read(), start, end))
    }

    async fn web_sessions_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<WebSession>> {
        Ok(in_range(&self.web_sessions.read(), start, end))
    }

    async fn keyboard_sessions_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<KeyboardSession>> {
        Ok(buckets_between(&self.keyboard.read(), from, to))
    }

    async fn mouse_sessions_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<MouseSession>> {
        Ok(buckets_between(&self.mouse.read(), from, to))
    }
}

#[async_trait]
impl GoalRepository for InMemorySessionStore {
    async fn active_goals(&self) -> Result<Vec<UserGoal>> {
        Ok(self.goals.read().iter().filter(|goal| goal.is_active).cloned().collect())
    }
}
