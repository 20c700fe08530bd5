// Background sweep that evicts expired sessions

use super::manager::SessionManager;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Handle to the running reaper task.
///
/// The task lives until `shutdown` is awaited or the handle is dropped.
pub struct Reaper {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl Reaper {
    /// Start sweeping `manager` every `period`. The first sweep happens one
    /// full period after start.
    pub fn start(manager: Arc<SessionManager>, period: Duration) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            info!("Session reaper started (interval={:?})", period);

            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // interval() fires immediately on the first tick
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        info!("Session reaper stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        debug!("Running session sweep");
                        match manager.reap_expired().await {
                            Ok(0) => {}
                            Ok(n) => debug!("Sweep evicted {} sessions", n),
                            Err(e) => error!("Session sweep failed: {}", e),
                        }
                    }
                }
            }
        });

        Self {
            cancel,
            handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop the sweep and wait for the task to exit
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take()
            && let Err(e) = handle.await
        {
            error!("Session reaper task ended abnormally: {}", e);
        }
    }
}

impl Drop for Reaper {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::types::{ExpiryBasis, NewSession, SessionConfig};

    fn short_lived_manager() -> Arc<SessionManager> {
        Arc::new(SessionManager::in_memory(SessionConfig {
            ttl_secs: 1,
            reaper_interval_secs: 1,
            expiry_basis: ExpiryBasis::Created,
        }))
    }

    #[tokio::test]
    async fn test_reaper_evicts_expired_sessions() {
        let manager = short_lived_manager();
        manager
            .create_session(NewSession::new("a@x.com", "a", "AA:BB"), "10.0.0.7")
            .await
            .unwrap();

        let reaper = Reaper::start(Arc::clone(&manager), Duration::from_millis(100));
        assert!(reaper.is_running());

        // Still live well before the ttl
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(manager.session_count().await.unwrap(), 1);

        tokio::time::sleep(Duration::from_millis(1200)).await;
        assert_eq!(manager.session_count().await.unwrap(), 0);

        reaper.shutdown().await;
    }

    #[tokio::test]
    async fn test_reaper_survives_out_of_range_ttl() {
        let manager = Arc::new(SessionManager::in_memory(SessionConfig {
            ttl_secs: i64::MAX,
            reaper_interval_secs: 1,
            expiry_basis: ExpiryBasis::Created,
        }));
        manager
            .create_session(NewSession::new("a@x.com", "a", "AA:BB"), "10.0.0.7")
            .await
            .unwrap();

        let reaper = Reaper::start(Arc::clone(&manager), Duration::from_millis(50));
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(reaper.is_running());
        assert_eq!(manager.session_count().await.unwrap(), 1);
        reaper.shutdown().await;
    }

    #[tokio::test]
    async fn test_reaper_shutdown_stops_task() {
        let manager = short_lived_manager();
        let reaper = Reaper::start(Arc::clone(&manager), Duration::from_secs(60));

        reaper.shutdown().await;

        // Registry stays usable without the reaper
        let created = manager
            .create_session(NewSession::new("a@x.com", "a", "AA:BB"), "10.0.0.7")
            .await
            .unwrap();
        assert!(manager.get_session(&created.session_id).await.is_ok());
    }
}
