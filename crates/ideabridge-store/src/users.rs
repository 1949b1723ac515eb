use rusqlite::params;
use uuid::Uuid;

use crate::database::{column_timestamp, column_uuid, not_found, Database};
use crate::error::Result;
use crate::models::{Role, User};

impl Database {
    pub fn insert_user(&self, user: &User) -> Result<()> {
        self.conn().execute(
            "INSERT INTO users (id, full_name, email, role, points, coins, department, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                user.id.to_string(),
                user.full_name,
                user.email,
                user.role.as_str(),
                user.points,
                user.coins,
                user.department,
                user.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn get_user(&self, id: Uuid) -> Result<User> {
        self.conn()
            .query_row(
                "SELECT id, full_name, email, role, points, coins, department, created_at
                 FROM users WHERE id = ?1",
                params![id.to_string()],
                row_to_user,
            )
            .map_err(not_found)
    }

    /// Like [`get_user`], but absent users are `None` instead of an error.
    /// Used by the reward engine, which soft-fails on unknown user ids.
    ///
    /// [`get_user`]: Database::get_user
    pub fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        use crate::error::StoreError;
        match self.get_user(id) {
            Ok(user) => Ok(Some(user)),
            Err(StoreError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let id_str: String = row.get(0)?;
    let role_str: String = row.get(3)?;
    let ts_str: String = row.get(7)?;

    Ok(User {
        id: column_uuid(0, &id_str)?,
        full_name: row.get(1)?,
        email: row.get(2)?,
        role: Role::from_str_lossy(&role_str),
        points: row.get(4)?,
        coins: row.get(5)?,
        department: row.get(6)?,
        created_at: column_timestamp(7, &ts_str)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use chrono::Utc;

    fn test_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("test.db")).unwrap();
        (dir, db)
    }

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            full_name: "Ada Lovelace".into(),
            email: format!("{}@example.com", Uuid::new_v4()),
            role: Role::User,
            points: 0,
            coins: 0,
            department: Some("R&D".into()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn insert_and_get() {
        let (_dir, db) = test_db();
        let user = sample_user();
        db.insert_user(&user).unwrap();

        let loaded = db.get_user(user.id).unwrap();
        assert_eq!(loaded.email, user.email);
        assert_eq!(loaded.role, Role::User);
        assert_eq!(loaded.points, 0);
    }

    #[test]
    fn missing_user_is_not_found() {
        let (_dir, db) = test_db();
        let err = db.get_user(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
        assert!(db.find_user(Uuid::new_v4()).unwrap().is_none());
    }
}
