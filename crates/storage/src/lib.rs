//! Session storage for in-flight conversations.
//!
//! Sessions live in process memory only and expire after a fixed TTL; a
//! restart starts every conversation over.

use std::collections::HashMap;

use anyhow::Result;
use chrono::{Duration, Utc};
use parking_lot::RwLock;

use wayfarer_core::models::PlannerSession;

pub const SESSION_TTL_HOURS: i64 = 24;

pub trait SessionRepository: Send + Sync {
    fn load_session(
        &self,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<PlannerSession>>> + Send;

    fn upsert_session(
        &self,
        session: PlannerSession,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    fn purge_expired(&self) -> impl std::future::Future<Output = Result<usize>> + Send;
}

#[derive(Default)]
pub struct MemoryStore {
    sessions: RwLock<HashMap<String, PlannerSession>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }
}

impl SessionRepository for MemoryStore {
    async fn load_session(&self, session_id: &str) -> Result<Option<PlannerSession>> {
        let sessions = self.sessions.read();
        Ok(sessions
            .get(session_id)
            .filter(|session| session.expires_at > Utc::now())
            .cloned())
    }

    async fn upsert_session(&self, session: PlannerSession) -> Result<()> {
        self.sessions
            .write()
            .insert(session.session_id.clone(), session);
        Ok(())
    }

    async fn purge_expired(&self) -> Result<usize> {
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        let now = Utc::now();
        sessions.retain(|_, session| session.expires_at > now);
        Ok(before - sessions.len())
    }
}

/// TTL applied to every fresh or touched session.
pub fn session_deadline() -> chrono::DateTime<Utc> {
    Utc::now() + Duration::hours(SESSION_TTL_HOURS)
}
