//! The append-only points ledger and the atomic award operation.
//!
//! [`Database::apply_award`] is the only way an action-triggered award reaches
//! a user's balance.  The balance increment is a relative SQL update and it
//! commits in the same transaction as the ledger append, so concurrent awards
//! serialized on the connection can never lose an increment or leave the
//! ledger out of step with the balances.

use chrono::Utc;
use rusqlite::params;
use uuid::Uuid;

use crate::database::{column_timestamp, column_uuid, Database};
use crate::error::Result;
use crate::models::PointsLogEntry;

impl Database {
    /// Atomically add `points`/`coins` to a user's balances and append one
    /// ledger row recording the exact deltas.
    ///
    /// Returns `Ok(false)` without any mutation when the user does not exist;
    /// the reward engine treats that as a soft no-op.
    pub fn apply_award(
        &mut self,
        user_id: Uuid,
        action_key: &str,
        points: i64,
        coins: i64,
    ) -> Result<bool> {
        let tx = self.conn_mut().transaction()?;

        let affected = tx.execute(
            "UPDATE users SET points = points + ?2, coins = coins + ?3 WHERE id = ?1",
            params![user_id.to_string(), points, coins],
        )?;
        if affected == 0 {
            // Unknown user: the implicit rollback leaves nothing behind.
            return Ok(false);
        }

        tx.execute(
            "INSERT INTO points_log (id, user_id, action_key, points, coins, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                Uuid::new_v4().to_string(),
                user_id.to_string(),
                action_key,
                points,
                coins,
                Utc::now().to_rfc3339(),
            ],
        )?;

        tx.commit()?;
        Ok(true)
    }

    /// A user's ledger entries, newest first.
    pub fn points_log_for_user(&self, user_id: Uuid) -> Result<Vec<PointsLogEntry>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, user_id, action_key, points, coins, created_at
             FROM points_log
             WHERE user_id = ?1
             ORDER BY created_at DESC",
        )?;

        let rows = stmt.query_map(params![user_id.to_string()], |row| {
            let id_str: String = row.get(0)?;
            let user_str: String = row.get(1)?;
            let ts_str: String = row.get(5)?;

            Ok(PointsLogEntry {
                id: column_uuid(0, &id_str)?,
                user_id: column_uuid(1, &user_str)?,
                action_key: row.get(2)?,
                points: row.get(3)?,
                coins: row.get(4)?,
                created_at: column_timestamp(5, &ts_str)?,
            })
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Role, User};

    fn test_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("test.db")).unwrap();
        (dir, db)
    }

    fn insert_user(db: &Database) -> Uuid {
        let id = Uuid::new_v4();
        db.insert_user(&User {
            id,
            full_name: "U".into(),
            email: format!("{id}@example.com"),
            role: Role::User,
            points: 0,
            coins: 0,
            department: None,
            created_at: Utc::now(),
        })
        .unwrap();
        id
    }

    #[test]
    fn award_updates_balance_and_appends_ledger() {
        let (_dir, mut db) = test_db();
        let user = insert_user(&db);

        assert!(db.apply_award(user, "vote", 5, 1).unwrap());
        assert!(db.apply_award(user, "vote", 5, 1).unwrap());

        let loaded = db.get_user(user).unwrap();
        assert_eq!(loaded.points, 10);
        assert_eq!(loaded.coins, 2);

        let log = db.points_log_for_user(user).unwrap();
        assert_eq!(log.len(), 2);
        assert!(log.iter().all(|e| e.action_key == "vote" && e.points == 5));
    }

    #[test]
    fn award_to_unknown_user_is_a_no_op() {
        let (_dir, mut db) = test_db();
        let ghost = Uuid::new_v4();

        assert!(!db.apply_award(ghost, "vote", 5, 1).unwrap());
        assert!(db.points_log_for_user(ghost).unwrap().is_empty());
    }
}
