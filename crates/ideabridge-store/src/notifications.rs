use rusqlite::params;
use uuid::Uuid;

use crate::database::{column_timestamp, column_uuid, not_found, Database};
use crate::error::{Result, StoreError};
use crate::models::Notification;

impl Database {
    pub fn insert_notification(&self, notification: &Notification) -> Result<()> {
        self.conn().execute(
            "INSERT INTO notifications (id, user_id, title, message, is_read, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                notification.id.to_string(),
                notification.user_id.to_string(),
                notification.title,
                notification.message,
                notification.is_read,
                notification.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// All notifications for a user, newest first.
    pub fn notifications_for_user(&self, user_id: Uuid) -> Result<Vec<Notification>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, user_id, title, message, is_read, created_at
             FROM notifications
             WHERE user_id = ?1
             ORDER BY created_at DESC",
        )?;

        let rows = stmt.query_map(params![user_id.to_string()], row_to_notification)?;

        let mut notifications = Vec::new();
        for row in rows {
            notifications.push(row?);
        }
        Ok(notifications)
    }

    /// Flip `is_read` to true, but only if the notification belongs to
    /// `user_id`.  A missing id or a different owner is `NotFound`.
    pub fn mark_notification_read(
        &self,
        notification_id: Uuid,
        user_id: Uuid,
    ) -> Result<Notification> {
        let affected = self.conn().execute(
            "UPDATE notifications SET is_read = 1 WHERE id = ?1 AND user_id = ?2",
            params![notification_id.to_string(), user_id.to_string()],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }

        self.conn()
            .query_row(
                "SELECT id, user_id, title, message, is_read, created_at
                 FROM notifications WHERE id = ?1",
                params![notification_id.to_string()],
                row_to_notification,
            )
            .map_err(not_found)
    }
}

fn row_to_notification(row: &rusqlite::Row<'_>) -> rusqlite::Result<Notification> {
    let id_str: String = row.get(0)?;
    let user_str: String = row.get(1)?;
    let ts_str: String = row.get(5)?;

    Ok(Notification {
        id: column_uuid(0, &id_str)?,
        user_id: column_uuid(1, &user_str)?,
        title: row.get(2)?,
        message: row.get(3)?,
        is_read: row.get(4)?,
        created_at: column_timestamp(5, &ts_str)?,
    })
}
