//! Mock repository implementations for testing
//!
//! In-memory mocks for the storage and goal ports, enabling deterministic
//! tests without a storage engine.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use deskpulse_core::tracking::ports::{GoalRepository, SessionRepository};
use deskpulse_domain::{
    AppSession, BucketKey, DeskPulseError, KeyboardSession, MouseSession, Result as DomainResult,
    UsagePattern, UserGoal, WebSession,
};
use parking_lot::Mutex;

/// In-memory mock for `SessionRepository`.
///
/// Buckets are keyed by (date, hour) so upserts replace.
#[derive(Default)]
pub struct MockSessionRepository {
    app_sessions: Mutex<Vec<AppSession>>,
    web_sessions: Mutex<Vec<WebSession>>,
    keyboard: Mutex<BTreeMap<BucketKey, KeyboardSession>>,
    mouse: Mutex<BTreeMap<BucketKey, MouseSession>>,
    patterns: Mutex<BTreeMap<NaiveDate, Vec<UsagePattern>>>,
    fail_writes: AtomicBool,
}

impl MockSessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with closed app sessions.
    pub fn with_app_sessions(sessions: Vec<AppSession>) -> Self {
        let repo = Self::default();
        *repo.app_sessions.lock() = sessions;
        repo
    }

    /// Make every write return a storage error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn app_sessions(&self) -> Vec<AppSession> {
        self.app_sessions.lock().clone()
    }

    pub fn web_sessions(&self) -> Vec<WebSession> {
        self.web_sessions.lock().clone()
    }

    pub fn keyboard_buckets(&self) -> Vec<KeyboardSession> {
        self.keyboard.lock().values().cloned().collect()
    }

    pub fn mouse_buckets(&self) -> Vec<MouseSession> {
        self.mouse.lock().values().cloned().collect()
    }

    pub fn patterns_for(&self, date: NaiveDate) -> Option<Vec<UsagePattern>> {
        self.patterns.lock().get(&date).cloned()
    }

    pub fn insert_keyboard(&self, session: KeyboardSession) {
        self.keyboard.lock().insert(session.key(), session);
    }

    pub fn insert_mouse(&self, session: MouseSession) {
        self.mouse.lock().insert(session.key(), session);
    }

    fn check_write(&self) -> DomainResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DeskPulseError::Storage("mock write failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl SessionRepository for MockSessionRepository {
    async fn save_app_session(&self, session: AppSession) -> DomainResult<()> {
        self.check_write()?;
        self.app_sessions.lock().push(session);
        Ok(())
    }

    async fn save_web_session(&self, session: WebSession) -> DomainResult<()> {
        self.check_write()?;
        self.web_sessions.lock().push(session);
        Ok(())
    }

    async fn upsert_keyboard_session(&self, session: KeyboardSession) -> DomainResult<()> {
        self.check_write()?;
        self.insert_keyboard(session);
        Ok(())
    }

    async fn upsert_mouse_session(&self, session: MouseSession) -> DomainResult<()> {
        self.check_write()?;
        self.insert_mouse(session);
        Ok(())
    }

    async fn save_usage_patterns(
        &self,
        date: NaiveDate,
        patterns: Vec<UsagePattern>,
    ) -> DomainResult<()> {
        self.check_write()?;
        self.patterns.lock().insert(date, patterns);
        Ok(())
    }

    async fn app_sessions_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DomainResult<Vec<AppSession>> {
        let mut sessions: Vec<_> = self
            .app_sessions
            .lock()
            .iter()
            .filter(|s| s.start_time >= start && s.start_time < end)
            .cloned()
            .collect();
        sessions.sort_by_key(|s| s.start_time);
        Ok(sessions)
    }

    async fn web_sessions_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DomainResult<Vec<WebSession>> {
        let mut sessions: Vec<_> = self
            .web_sessions
            .lock()
            .iter()
            .filter(|s| s.start_time >= start && s.start_time < end)
            .cloned()
            .collect();
        sessions.sort_by_key(|s| s.start_time);
        Ok(sessions)
    }

    async fn keyboard_sessions_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DomainResult<Vec<KeyboardSession>> {
        Ok(self
            .keyboard
            .lock()
            .values()
            .filter(|k| k.date >= from && k.date <= to)
            .cloned()
            .collect())
    }

    async fn mouse_sessions_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DomainResult<Vec<MouseSession>> {
        Ok(self
            .mouse
            .lock()
            .values()
            .filter(|m| m.date >= from && m.date <= to)
            .cloned()
            .collect())
    }
}

/// In-memory mock for `GoalRepository`.
#[derive(Default)]
pub struct MockGoalRepository {
    goals: Mutex<Vec<UserGoal>>,
    fail: AtomicBool,
}

impl MockGoalRepository {
    pub fn new(goals: Vec<UserGoal>) -> Self {
        Self { goals: Mutex::new(goals), fail: AtomicBool::new(false) }
    }

    /// A goal store whose lookups always fail.
    pub fn failing() -> Self {
        Self { goals: Mutex::new(Vec::new()), fail: AtomicBool::new(true) }
    }
}

#[async_trait]
impl GoalRepository for MockGoalRepository {
    async fn active_goals(&self) -> DomainResult<Vec<UserGoal>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(DeskPulseError::Storage("goal store unavailable".into()));
        }
        Ok(self.goals.lock().iter().filter(|g| g.is_active).cloned().collect())
    }
}
