use super::stats::SessionStats;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Registry entry for one live session
#[derive(Debug, Clone)]
pub struct RegisteredSession {
    /// Cancelling this ends the session and aborts any in-flight inference
    pub cancel: CancellationToken,

    /// Latest statistics published by the session controller
    pub stats: watch::Receiver<SessionStats>,
}

/// Process-wide map of active sessions (session_id → session)
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<String, RegisteredSession>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, session_id: String, session: RegisteredSession) {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session_id, session);
        info!("Session registered ({} active)", sessions.len());
    }

    pub async fn remove(&self, session_id: &str) -> Option<RegisteredSession> {
        let mut sessions = self.sessions.write().await;
        let removed = sessions.remove(session_id);
        if removed.is_some() {
            info!("Session {} removed ({} active)", session_id, sessions.len());
        }
        removed
    }

    /// Snapshot of one session's statistics
    pub async fn get(&self, session_id: &str) -> Option<SessionStats> {
        let sessions = self.sessions.read().await;
        sessions
            .get(session_id)
            .map(|session| session.stats.borrow().clone())
    }

    /// Snapshots of all active sessions, oldest first
    pub async fn list(&self) -> Vec<SessionStats> {
        let sessions = self.sessions.read().await;
        let mut all: Vec<SessionStats> = sessions
            .values()
            .map(|session| session.stats.borrow().clone())
            .collect();
        all.sort_by_key(|stats| stats.connected_at);
        all
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Cancel one session. Returns false if it is not registered.
    pub async fn close(&self, session_id: &str) -> bool {
        let sessions = self.sessions.read().await;
        match sessions.get(session_id) {
            Some(session) => {
                session.cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel every registered session (graceful shutdown)
    pub async fn close_all(&self) {
        let sessions = self.sessions.read().await;
        info!("Closing {} active sessions", sessions.len());
        for session in sessions.values() {
            session.cancel.cancel();
        }
    }
}
