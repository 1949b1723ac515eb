//! Notification dispatcher.
//!
//! Persistence always comes first: the notification row is committed before
//! any push is attempted, and a push failure has zero effect on the returned
//! result.  Undelivered pushes are recoverable only through the persisted
//! row, never retried over the live channel.

use chrono::Utc;
use ideabridge_store::Notification;
use tracing::debug;
use uuid::Uuid;

use crate::connections::{ConnectionManager, PushPayload};
use crate::error::Result;
use crate::SharedDb;

#[derive(Clone)]
pub struct NotificationDispatcher {
    db: SharedDb,
    connections: ConnectionManager,
}

impl NotificationDispatcher {
    pub fn new(db: SharedDb, connections: ConnectionManager) -> Self {
        Self { db, connections }
    }

    /// Persist a notification for a user, then best-effort push it to the
    /// user's live connection.
    pub async fn notify(&self, user_id: Uuid, title: &str, message: &str) -> Result<Notification> {
        let notification = Notification {
            id: Uuid::new_v4(),
            user_id,
            title: title.to_string(),
            message: message.to_string(),
            is_read: false,
            created_at: Utc::now(),
        };

        self.db.lock().await.insert_notification(&notification)?;

        let delivered = self
            .connections
            .push(
                user_id,
                PushPayload {
                    notification_id: notification.id,
                    title: notification.title.clone(),
                    message: notification.message.clone(),
                },
            )
            .await;

        debug!(
            user = %user_id,
            notification = %notification.id,
            delivered,
            "notification dispatched"
        );

        Ok(notification)
    }

    /// Mark a notification read.  `NotFound` when the id does not exist or
    /// belongs to a different user.
    pub async fn mark_read(&self, notification_id: Uuid, user_id: Uuid) -> Result<Notification> {
        let updated = self
            .db
            .lock()
            .await
            .mark_notification_read(notification_id, user_id)?;
        Ok(updated)
    }

    /// A user's notifications, newest first.
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Notification>> {
        let list = self.db.lock().await.notifications_for_user(user_id)?;
        Ok(list)
    }
}
