//! Achievement configuration and grants.
//!
//! [`Database::grant_achievement`] is the only writer of `user_achievements`
//! rows.  The grant insert and the reward balance bump commit in one
//! transaction, and the composite primary key makes a second grant of the
//! same achievement impossible.

use chrono::{DateTime, Utc};
use rusqlite::params;
use uuid::Uuid;

use crate::database::{column_timestamp, column_uuid, Database};
use crate::error::{Result, StoreError};
use crate::models::Achievement;

impl Database {
    pub fn insert_achievement(&self, achievement: &Achievement) -> Result<()> {
        self.conn().execute(
            "INSERT INTO achievements (id, name, description, condition_key, reward_points, reward_coins, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                achievement.id.to_string(),
                achievement.name,
                achievement.description,
                achievement.condition_key,
                achievement.reward_points,
                achievement.reward_coins,
                achievement.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Achievement configured for an evaluator condition, if any.  The
    /// evaluator skips conditions with no configured achievement.
    pub fn achievement_for_condition(&self, condition_key: &str) -> Result<Option<Achievement>> {
        let result = self.conn().query_row(
            "SELECT id, name, description, condition_key, reward_points, reward_coins, created_at
             FROM achievements WHERE condition_key = ?1",
            params![condition_key],
            row_to_achievement,
        );

        match result {
            Ok(achievement) => Ok(Some(achievement)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::Sqlite(e)),
        }
    }

    /// Whether a user already holds a grant for an achievement.
    pub fn has_achievement(&self, user_id: Uuid, achievement_id: Uuid) -> Result<bool> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM user_achievements WHERE user_id = ?1 AND achievement_id = ?2",
            params![user_id.to_string(), achievement_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Grant an achievement: insert the grant row and, when the achievement
    /// carries a reward, bump the user's balances -- both in one transaction.
    ///
    /// Callers must check [`has_achievement`] first; a duplicate grant
    /// violates the primary key and surfaces as a SQLite error.
    ///
    /// [`has_achievement`]: Database::has_achievement
    pub fn grant_achievement(&mut self, user_id: Uuid, achievement: &Achievement) -> Result<()> {
        let tx = self.conn_mut().transaction()?;

        tx.execute(
            "INSERT INTO user_achievements (user_id, achievement_id, received_at)
             VALUES (?1, ?2, ?3)",
            params![
                user_id.to_string(),
                achievement.id.to_string(),
                Utc::now().to_rfc3339(),
            ],
        )?;

        if achievement.reward_points != 0 || achievement.reward_coins != 0 {
            tx.execute(
                "UPDATE users SET points = points + ?2, coins = coins + ?3 WHERE id = ?1",
                params![
                    user_id.to_string(),
                    achievement.reward_points,
                    achievement.reward_coins,
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// All achievements a user holds, with the grant timestamp, newest first.
    pub fn achievements_for_user(&self, user_id: Uuid) -> Result<Vec<(Achievement, DateTime<Utc>)>> {
        let mut stmt = self.conn().prepare(
            "SELECT a.id, a.name, a.description, a.condition_key, a.reward_points, a.reward_coins,
                    a.created_at, ua.received_at
             FROM achievements a
             JOIN user_achievements ua ON ua.achievement_id = a.id
             WHERE ua.user_id = ?1
             ORDER BY ua.received_at DESC",
        )?;

        let rows = stmt.query_map(params![user_id.to_string()], |row| {
            let achievement = row_to_achievement(row)?;
            let received_str: String = row.get(7)?;
            Ok((achievement, column_timestamp(7, &received_str)?))
        })?;

        let mut achievements = Vec::new();
        for row in rows {
            achievements.push(row?);
        }
        Ok(achievements)
    }
}

fn row_to_achievement(row: &rusqlite::Row<'_>) -> rusqlite::Result<Achievement> {
    let id_str: String = row.get(0)?;
    let ts_str: String = row.get(6)?;

    Ok(Achievement {
        id: column_uuid(0, &id_str)?,
        name: row.get(1)?,
        description: row.get(2)?,
        condition_key: row.get(3)?,
        reward_points: row.get(4)?,
        reward_coins: row.get(5)?,
        created_at: column_timestamp(6, &ts_str)?,
    })
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
    fn grant_bumps_balance_once() {
        let (_dir, mut db) = test_db();
        let user = insert_user(&db);
        let achievement = db.achievement_for_condition("first_idea").unwrap().unwrap();

        assert!(!db.has_achievement(user, achievement.id).unwrap());
        db.grant_achievement(user, &achievement).unwrap();
        assert!(db.has_achievement(user, achievement.id).unwrap());

        let loaded = db.get_user(user).unwrap();
        assert_eq!(loaded.points, achievement.reward_points);
        assert_eq!(loaded.coins, achievement.reward_coins);

        // A second grant of the same achievement violates the primary key.
        assert!(db.grant_achievement(user, &achievement).is_err());
    }

    #[test]
    fn unconfigured_condition_is_none() {
        let (_dir, db) = test_db();
        assert!(db
            .achievement_for_condition("no_such_condition")
            .unwrap()
            .is_none());
    }

    #[test]
    fn achievements_for_user_lists_grants() {
        let (_dir, mut db) = test_db();
        let user = insert_user(&db);
        let first = db.achievement_for_condition("first_idea").unwrap().unwrap();
        db.grant_achievement(user, &first).unwrap();

        let held = db.achievements_for_user(user).unwrap();
        assert_eq!(held.len(), 1);
        assert_eq!(held[0].0.condition_key, "first_idea");
    }
}
