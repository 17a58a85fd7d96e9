//! services/api/src/adapters/session_store.rs
//!
//! In-process implementation of the `SessionStore` port. Each login gets its
//! own entry; nothing is shared between sessions.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use paid_survey_core::domain::{AuthSession, Role};
use paid_survey_core::ports::{PortError, PortResult, SessionStore};
use paid_survey_core::questionnaire::FormGate;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, AuthSession>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions currently held, expired or not.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create_session(
        &self,
        username: &str,
        role: Role,
        expires_at: DateTime<Utc>,
    ) -> PortResult<AuthSession> {
        let session = AuthSession {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            role,
            form_gate: FormGate::default(),
            expires_at,
        };

        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(now));
        if sessions.len() < before {
            debug!("Evicted {} expired sessions", before - sessions.len());
        }
        sessions.insert(session.id.clone(), session.clone());
        Ok(session)
    }

    async fn get_session(&self, session_id: &str) -> PortResult<AuthSession> {
        let now = Utc::now();
        {
            let sessions = self.sessions.read().await;
            match sessions.get(session_id) {
                Some(session) if !session.is_expired(now) => return Ok(session.clone()),
                Some(_) => {}
                None => {
                    return Err(PortError::NotFound(format!(
                        "Session {} not found",
                        session_id
                    )))
                }
            }
        }

        // Expired: evict it.
        self.sessions.write().await.remove(session_id);
        debug!("Evicted expired session {}", session_id);
        Err(PortError::NotFound(format!(
            "Session {} has expired",
            session_id
        )))
    }

    async fn update_form_gate(
        &self,
        session_id: &str,
        update: &mut (dyn for<'a> FnMut(&'a mut FormGate) + Send),
    ) -> PortResult<()> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(session_id)
            .filter(|s| !s.is_expired(now))
            .ok_or_else(|| PortError::NotFound(format!("Session {} not found", session_id)))?;
        update(&mut session.form_gate);
        Ok(())
    }

    async fn delete_session(&self, session_id: &str) -> PortResult<()> {
        self.sessions
            .write()
            .await
            .remove(session_id)
            .map(|_| ())
            .ok_or_else(|| PortError::NotFound(format!("Session {} not found", session_id)))
    }
}
