use rusqlite::params;
use uuid::Uuid;

use crate::database::{column_timestamp, column_uuid, Database};
use crate::error::{Result, StoreError};
use crate::models::Vote;

impl Database {
    pub fn insert_vote(&self, vote: &Vote) -> Result<()> {
        self.conn().execute(
            "INSERT INTO votes (id, idea_id, voter_id, positive, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                vote.id.to_string(),
                vote.idea_id.to_string(),
                vote.voter_id.to_string(),
                vote.positive,
                vote.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Existing vote by a voter on an idea, if any.  The (idea, voter) pair
    /// is unique so at most one row can match.
    pub fn find_vote(&self, idea_id: Uuid, voter_id: Uuid) -> Result<Option<Vote>> {
        let result = self.conn().query_row(
            "SELECT id, idea_id, voter_id, positive, created_at
             FROM votes WHERE idea_id = ?1 AND voter_id = ?2",
            params![idea_id.to_string(), voter_id.to_string()],
            row_to_vote,
        );

        match result {
            Ok(vote) => Ok(Some(vote)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::Sqlite(e)),
        }
    }

    pub fn delete_vote(&self, id: Uuid) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM votes WHERE id = ?1", params![id.to_string()])?;
        Ok(affected > 0)
    }

    /// Count of positive votes received across all ideas authored by a user.
    /// Condition source for the `hundred_likes` achievement.
    pub fn count_likes_received(&self, author_id: Uuid) -> Result<i64> {
        let count = self.conn().query_row(
            "SELECT COUNT(*)
             FROM votes v
             JOIN ideas i ON i.id = v.idea_id
             WHERE i.author_id = ?1 AND v.positive = 1",
            params![author_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

fn row_to_vote(row: &rusqlite::Row<'_>) -> rusqlite::Result<Vote> {
    let id_str: String = row.get(0)?;
    let idea_str: String = row.get(1)?;
    let voter_str: String = row.get(2)?;
    let ts_str: String = row.get(4)?;

    Ok(Vote {
        id: column_uuid(0, &id_str)?,
        idea_id: column_uuid(1, &idea_str)?,
        voter_id: column_uuid(2, &voter_str)?,
        positive: row.get(3)?,
        created_at: column_timestamp(4, &ts_str)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Idea, Role, User};
    use chrono::Utc;

    fn test_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("test.db")).unwrap();
        (dir, db)
    }

    fn insert_user(db: &Database) -> Uuid {
        let id = Uuid::new_v4();
        db.insert_user(&User {
            id,
            full_name: "Voter".into(),
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

    fn insert_idea(db: &Database, author_id: Uuid) -> Uuid {
        let id = Uuid::new_v4();
        db.insert_idea(&Idea {
            id,
            title: "t".into(),
            description: "d".into(),
            author_id,
            status: "new".into(),
            created_at: Utc::now(),
        })
        .unwrap();
        id
    }

    #[test]
    fn duplicate_vote_rejected() {
        let (_dir, db) = test_db();
        let author = insert_user(&db);
        let voter = insert_user(&db);
        let idea = insert_idea(&db, author);

        let vote = Vote {
            id: Uuid::new_v4(),
            idea_id: idea,
            voter_id: voter,
            positive: true,
            created_at: Utc::now(),
        };
        db.insert_vote(&vote).unwrap();

        let dup = Vote {
            id: Uuid::new_v4(),
            ..vote.clone()
        };
        assert!(db.insert_vote(&dup).is_err());
    }

    #[test]
    fn likes_received_counts_only_positive_votes_on_own_ideas() {
        let (_dir, db) = test_db();
        let author = insert_user(&db);
        let other = insert_user(&db);
        let v1 = insert_user(&db);
        let v2 = insert_user(&db);

        let mine = insert_idea(&db, author);
        let theirs = insert_idea(&db, other);

        for (voter, idea, positive) in [(v1, mine, true), (v2, mine, false), (v1, theirs, true)] {
            db.insert_vote(&Vote {
                id: Uuid::new_v4(),
                idea_id: idea,
                voter_id: voter,
                positive,
                created_at: Utc::now(),
            })
            .unwrap();
        }

        assert_eq!(db.count_likes_received(author).unwrap(), 1);
        assert_eq!(db.count_likes_received(other).unwrap(), 1);
    }

    #[test]
    fn find_and_delete() {
        let (_dir, db) = test_db();
        let author = insert_user(&db);
        let voter = insert_user(&db);
        let idea = insert_idea(&db, author);

        assert!(db.find_vote(idea, voter).unwrap().is_none());

        let vote = Vote {
            id: Uuid::new_v4(),
            idea_id: idea,
            voter_id: voter,
            positive: true,
            created_at: Utc::now(),
        };
        db.insert_vote(&vote).unwrap();

        let found = db.find_vote(idea, voter).unwrap().unwrap();
        assert_eq!(found.id, vote.id);
        assert!(db.delete_vote(vote.id).unwrap());
        assert!(db.find_vote(idea, voter).unwrap().is_none());
    }
}
