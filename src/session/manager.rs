// Session manager: issues, reads, mutates and reaps session records

use super::storage::{MemorySessionStorage, SessionStorage};
use super::types::{IdentityUpdate, NewSession, SessionConfig, SessionRecord};
use crate::errors::{SessionError, SessionResult};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Session manager for handling session lifecycle and operations
pub struct SessionManager {
    storage: Arc<dyn SessionStorage>,
    config: SessionConfig,
}

impl SessionManager {
    /// Create a new session manager
    pub fn new(storage: Arc<dyn SessionStorage>, config: SessionConfig) -> Self {
        Self { storage, config }
    }

    /// Manager backed by the in-memory store
    pub fn in_memory(config: SessionConfig) -> Self {
        Self::new(Arc::new(MemorySessionStorage::new()), config)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Issue a new session for the supplied identity
    pub async fn create_session(
        &self,
        request: NewSession,
        origin_ip: &str,
    ) -> SessionResult<SessionRecord> {
        let missing = request.missing_fields();
        let identity = match request.into_identity() {
            Some(identity) => identity,
            None => {
                warn!("Rejected login with missing fields: {:?}", missing);
                return Err(SessionError::Validation(format!(
                    "Missing required fields: {}",
                    missing.join(", ")
                )));
            }
        };

        let record = SessionRecord::new(identity, origin_ip.to_string(), Utc::now());
        self.storage.insert(record.clone()).await?;

        info!(
            "Created session {} for {} from {}",
            record.session_id, record.identity.email, record.origin_ip
        );

        Ok(record)
    }

    /// Look up a session without refreshing it
    pub async fn get_session(&self, session_id: &str) -> SessionResult<SessionRecord> {
        self.storage
            .get(session_id)
            .await?
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))
    }

    /// Apply a partial identity update and refresh `last_accessed_at`
    pub async fn update_session(
        &self,
        session_id: &str,
        update: IdentityUpdate,
    ) -> SessionResult<SessionRecord> {
        let update = update.normalized();
        let record = self
            .storage
            .apply_update(session_id, &update, Utc::now())
            .await?
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;

        info!("Session {} updated", session_id);
        Ok(record)
    }

    /// Refresh `last_accessed_at` without touching the identity
    pub async fn touch_session(&self, session_id: &str) -> SessionResult<SessionRecord> {
        self.storage
            .touch(session_id, Utc::now())
            .await?
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))
    }

    /// Delete a session. A second call for the same id fails with `NotFound`.
    pub async fn remove_session(&self, session_id: &str) -> SessionResult<()> {
        match self.storage.remove(session_id).await? {
            Some(_) => {
                info!("Session {} removed", session_id);
                Ok(())
            }
            None => Err(SessionError::NotFound(session_id.to_string())),
        }
    }

    /// Snapshot of all live sessions
    pub async fn list_sessions(&self) -> SessionResult<Vec<SessionRecord>> {
        self.storage.list().await
    }

    pub async fn session_count(&self) -> SessionResult<usize> {
        self.storage.count().await
    }

    /// Evict every session expired at `now`
    pub async fn reap_expired_at(&self, now: DateTime<Utc>) -> SessionResult<usize> {
        let evicted = self.storage.remove_expired(now, &self.config).await?;
        for session_id in &evicted {
            debug!("Reaped session {}", session_id);
        }
        if !evicted.is_empty() {
            info!(
                "Reaped {} expired sessions ({:?} basis, ttl {}s)",
                evicted.len(),
                self.config.expiry_basis,
                self.config.ttl_secs
            );
        }
        Ok(evicted.len())
    }

    /// Cleanup expired sessions (run periodically by the reaper)
    pub async fn reap_expired(&self) -> SessionResult<usize> {
        self.reap_expired_at(Utc::now()).await
    }
}

/// Session manager state for use in Axum handlers
#[derive(Clone)]
pub struct SessionManagerState {
    pub manager: Arc<SessionManager>,
}

impl SessionManagerState {
    pub fn new(storage: Arc<dyn SessionStorage>, config: SessionConfig) -> Self {
        Self {
            manager: Arc::new(SessionManager::new(storage, config)),
        }
    }
}
