//! Session and configuration lifecycle events.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::service::CachingAuthorizationService;
use super::AuthorizationCacheConfig;
use crate::authz::UserId;
use crate::error::Result;

/// A signal from the session or configuration subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LifecycleEvent {
    SessionStarted { user_id: UserId },
    SessionRefreshed { user_id: UserId },
    SessionEnded { user_id: UserId },
    ConfigurationReloaded { config: AuthorizationCacheConfig },
}

impl<T: Send + Sync + 'static> CachingAuthorizationService<T> {
    /// Dispatch one lifecycle event to the matching handler.
    pub async fn handle_event(&self, event: LifecycleEvent) -> Result<()> {
        match event {
            LifecycleEvent::SessionStarted { user_id } => self.on_identity_session_start(&user_id).await,
            LifecycleEvent::SessionRefreshed { user_id } => self.on_identity_session_refresh(&user_id).await,
            LifecycleEvent::SessionEnded { user_id } => {
                self.on_identity_session_end(&user_id).await;
                Ok(())
            }
            LifecycleEvent::ConfigurationReloaded { config } => self.on_configuration_reload(config).await,
        }
    }
}

/// Drive `service` from a broadcast stream of lifecycle events.
///
/// Handler errors are logged and the listener keeps going. If the receiver
/// lags, every entry is invalidated since missed session-end events could
/// otherwise leave stale grants behind. The task ends when the channel closes.
pub fn spawn_lifecycle_listener<T>(
    service: Arc<CachingAuthorizationService<T>>,
    mut events: broadcast::Receiver<LifecycleEvent>,
) -> JoinHandle<()>
where
    T: Send + Sync + 'static,
{
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    debug!(?event, "Lifecycle event received");
                    if let Err(error) = service.handle_event(event).await {
                        error.log();
                    }
                }
                Err(RecvError::Lagged(missed)) => {
                    warn!(missed, "Lifecycle listener lagged; invalidating all authorization snapshots");
                    service.invalidate_all().await;
                }
                Err(RecvError::Closed) => {
                    debug!("Lifecycle channel closed; listener stopping");
                    break;
                }
            }
        }
    })
}
