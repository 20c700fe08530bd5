// Session storage backends

use super::types::{IdentityUpdate, SessionConfig, SessionRecord};
use crate::errors::{SessionError, SessionResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Trait for session storage backends.
///
/// Each method is one atomic step: implementations must not let another
/// mutation interleave with a read-modify-write.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// Store a new record; fails if the id is already taken
    async fn insert(&self, record: SessionRecord) -> SessionResult<()>;

    /// Get a record by id
    async fn get(&self, session_id: &str) -> SessionResult<Option<SessionRecord>>;

    /// Apply a partial identity update and advance `last_accessed_at`
    async fn apply_update(
        &self,
        session_id: &str,
        update: &IdentityUpdate,
        now: DateTime<Utc>,
    ) -> SessionResult<Option<SessionRecord>>;

    /// Advance `last_accessed_at` only
    async fn touch(
        &self,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> SessionResult<Option<SessionRecord>>;

    /// Delete a record, returning it if it existed
    async fn remove(&self, session_id: &str) -> SessionResult<Option<SessionRecord>>;

    /// Snapshot of every live record
    async fn list(&self) -> SessionResult<Vec<SessionRecord>>;

    /// Evict records expired at `now`, returning the evicted ids
    async fn remove_expired(
        &self,
        now: DateTime<Utc>,
        config: &SessionConfig,
    ) -> SessionResult<Vec<String>>;

    /// Number of live records
    async fn count(&self) -> SessionResult<usize>;
}

/// In-memory session storage implementation
pub struct MemorySessionStorage {
    sessions: Arc<RwLock<HashMap<String, SessionRecord>>>,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for MemorySessionStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStorage for MemorySessionStorage {
    async fn insert(&self, record: SessionRecord) -> SessionResult<()> {
        let mut sessions = self.sessions.write().await;
        match sessions.entry(record.session_id.clone()) {
            Entry::Occupied(_) => Err(SessionError::Internal(format!(
                "Session id collision on {}",
                record.session_id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }

    async fn get(&self, session_id: &str) -> SessionResult<Option<SessionRecord>> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(session_id).cloned())
    }

    async fn apply_update(
        &self,
        session_id: &str,
        update: &IdentityUpdate,
        now: DateTime<Utc>,
    ) -> SessionResult<Option<SessionRecord>> {
        let mut sessions = self.sessions.write().await;
        Ok(sessions.get_mut(session_id).map(|record| {
            record.apply_update(update, now);
            record.clone()
        }))
    }

    async fn touch(
        &self,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> SessionResult<Option<SessionRecord>> {
        let mut sessions = self.sessions.write().await;
        Ok(sessions.get_mut(session_id).map(|record| {
            record.touch_at(now);
            record.clone()
        }))
    }

    async fn remove(&self, session_id: &str) -> SessionResult<Option<SessionRecord>> {
        let mut sessions = self.sessions.write().await;
        Ok(sessions.remove(session_id))
    }

    async fn list(&self) -> SessionResult<Vec<SessionRecord>> {
        let sessions = self.sessions.read().await;
        Ok(sessions.values().cloned().collect())
    }

    async fn remove_expired(
        &self,
        now: DateTime<Utc>,
        config: &SessionConfig,
    ) -> SessionResult<Vec<String>> {
        let mut sessions = self.sessions.write().await;
        let mut evicted = Vec::new();

        sessions.retain(|id, record| {
            if record.is_expired_at(now, config) {
                evicted.push(id.clone());
                false
            } else {
                true
            }
        });

        if !evicted.is_empty() {
            debug!(
                "Evicted {} expired sessions, {} remaining",
                evicted.len(),
                sessions.len()
            );
        }

        Ok(evicted)
    }

    async fn count(&self) -> SessionResult<usize> {
        Ok(self.sessions.read().await.len())
    }
}
