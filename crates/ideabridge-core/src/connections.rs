//! Registry of open live-notification channels.
//!
//! One instance is created at startup and handed by reference to the
//! notification dispatcher and the transport layer -- never a bare global.
//! Pushes are a non-blocking queue handoff: the transport task drains the
//! receiver and writes to the socket, so a slow or dead connection can never
//! block the request that triggered the notification.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Payload delivered over a live channel.
#[derive(Debug, Clone, Serialize)]
pub struct PushPayload {
    pub notification_id: Uuid,
    pub title: String,
    pub message: String,
}

/// Queue depth per connection.  A user with this many undelivered pushes is
/// not keeping up; further pushes are dropped (the persisted notification row
/// remains the durable copy).
const CHANNEL_CAPACITY: usize = 64;

/// Process-wide map from user id to that user's open live channel.
#[derive(Clone)]
pub struct ConnectionManager {
    channels: Arc<RwLock<HashMap<Uuid, mpsc::Sender<PushPayload>>>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a live connection for a user.  Returns the receiver the
    /// transport task drains.  A second registration for the same user
    /// replaces the previous channel (old receiver closes).
    pub async fn register(&self, user_id: Uuid) -> mpsc::Receiver<PushPayload> {
        let (tx, rx) = mpsc::channel::<PushPayload>(CHANNEL_CAPACITY);

        let previous = self.channels.write().await.insert(user_id, tx);
        if previous.is_some() {
            info!(user = %user_id, "replaced existing live connection");
        } else {
            info!(user = %user_id, "live connection registered");
        }

        rx
    }

    /// Remove a user's live connection, if present.
    pub async fn unregister(&self, user_id: Uuid) {
        if self.channels.write().await.remove(&user_id).is_some() {
            info!(user = %user_id, "live connection unregistered");
        }
    }

    pub async fn is_connected(&self, user_id: Uuid) -> bool {
        self.channels.read().await.contains_key(&user_id)
    }

    /// Best-effort push.  Returns `true` when the payload was handed to the
    /// user's channel.  A missing, full, or closed channel is logged and
    /// swallowed -- the caller never sees a push failure.
    pub async fn push(&self, user_id: Uuid, payload: PushPayload) -> bool {
        let channels = self.channels.read().await;

        let Some(tx) = channels.get(&user_id) else {
            debug!(user = %user_id, "no live connection, skipping push");
            return false;
        };

        match tx.try_send(payload) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(user = %user_id, "live channel full, dropping push");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!(user = %user_id, "live channel closed, dropping push");
                false
            }
        }
    }

    pub async fn connection_count(&self) -> usize {
        self.channels.read().await.len()
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(title: &str) -> PushPayload {
        PushPayload {
            notification_id: Uuid::new_v4(),
            title: title.to_string(),
            message: "m".to_string(),
        }
    }

    #[tokio::test]
    async fn register_push_unregister() {
        let manager = ConnectionManager::new();
        let user = Uuid::new_v4();

        assert!(!manager.is_connected(user).await);
        let mut rx = manager.register(user).await;
        assert!(manager.is_connected(user).await);

        assert!(manager.push(user, payload("hi")).await);
        let received = rx.try_recv().unwrap();
        assert_eq!(received.title, "hi");

        manager.unregister(user).await;
        assert!(!manager.is_connected(user).await);
        assert_eq!(manager.connection_count().await, 0);
    }

    #[tokio::test]
    async fn push_to_unknown_user_is_swallowed() {
        let manager = ConnectionManager::new();
        assert!(!manager.push(Uuid::new_v4(), payload("lost")).await);
    }

    #[tokio::test]
    async fn push_to_dropped_receiver_is_swallowed() {
        let manager = ConnectionManager::new();
        let user = Uuid::new_v4();

        let rx = manager.register(user).await;
        drop(rx);

        assert!(!manager.push(user, payload("gone")).await);
    }

    #[tokio::test]
    async fn re_register_replaces_channel() {
        let manager = ConnectionManager::new();
        let user = Uuid::new_v4();

        let mut old_rx = manager.register(user).await;
        let mut new_rx = manager.register(user).await;

        assert!(manager.push(user, payload("fresh")).await);
        assert!(old_rx.try_recv().is_err());
        assert_eq!(new_rx.try_recv().unwrap().title, "fresh");
        assert_eq!(manager.connection_count().await, 1);
    }
}
