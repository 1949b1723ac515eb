use rusqlite::params;
use uuid::Uuid;

use crate::database::{column_timestamp, column_uuid, not_found, Database};
use crate::error::Result;
use crate::models::{Idea, IdeaStatusChange};

impl Database {
    pub fn insert_idea(&self, idea: &Idea) -> Result<()> {
        self.conn().execute(
            "INSERT INTO ideas (id, title, description, author_id, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                idea.id.to_string(),
                idea.title,
                idea.description,
                idea.author_id.to_string(),
                idea.status,
                idea.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn get_idea(&self, id: Uuid) -> Result<Idea> {
        self.conn()
            .query_row(
                "SELECT id, title, description, author_id, status, created_at
                 FROM ideas WHERE id = ?1",
                params![id.to_string()],
                row_to_idea,
            )
            .map_err(not_found)
    }

    /// Count of ideas authored by a user.  Condition source for the
    /// `first_idea` and `ten_ideas` achievements.
    pub fn count_ideas_by_author(&self, author_id: Uuid) -> Result<i64> {
        let count = self.conn().query_row(
            "SELECT COUNT(*) FROM ideas WHERE author_id = ?1",
            params![author_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn set_idea_status(&self, id: Uuid, status: &str) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE ideas SET status = ?2 WHERE id = ?1",
            params![id.to_string(), status],
        )?;
        Ok(affected > 0)
    }

    /// Append one row to an idea's review history.
    pub fn insert_status_change(&self, change: &IdeaStatusChange) -> Result<()> {
        self.conn().execute(
            "INSERT INTO idea_status_changes (id, idea_id, expert_id, status, comment, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                change.id.to_string(),
                change.idea_id.to_string(),
                change.expert_id.to_string(),
                change.status,
                change.comment,
                change.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn status_history(&self, idea_id: Uuid) -> Result<Vec<IdeaStatusChange>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, idea_id, expert_id, status, comment, created_at
             FROM idea_status_changes
             WHERE idea_id = ?1
             ORDER BY created_at DESC",
        )?;

        let rows = stmt.query_map(params![idea_id.to_string()], |row| {
            let id_str: String = row.get(0)?;
            let idea_str: String = row.get(1)?;
            let expert_str: String = row.get(2)?;
            let ts_str: String = row.get(5)?;

            Ok(IdeaStatusChange {
                id: column_uuid(0, &id_str)?,
                idea_id: column_uuid(1, &idea_str)?,
                expert_id: column_uuid(2, &expert_str)?,
                status: row.get(3)?,
                comment: row.get(4)?,
                created_at: column_timestamp(5, &ts_str)?,
            })
        })?;

        let mut changes = Vec::new();
        for row in rows {
            changes.push(row?);
        }
        Ok(changes)
    }

    /// Associate a team member with an idea.  Duplicate pairs are ignored.
    pub fn add_team_member(&self, idea_id: Uuid, user_id: Uuid) -> Result<()> {
        self.conn().execute(
            "INSERT OR IGNORE INTO idea_team_members (idea_id, user_id, is_primary)
             VALUES (?1, ?2, 0)",
            params![idea_id.to_string(), user_id.to_string()],
        )?;
        Ok(())
    }
}

fn row_to_idea(row: &rusqlite::Row<'_>) -> rusqlite::Result<Idea> {
    let id_str: String = row.get(0)?;
    let author_str: String = row.get(3)?;
    let ts_str: String = row.get(5)?;

    Ok(Idea {
        id: column_uuid(0, &id_str)?,
        title: row.get(1)?,
        description: row.get(2)?,
        author_id: column_uuid(3, &author_str)?,
        status: row.get(4)?,
        created_at: column_timestamp(5, &ts_str)?,
    })
}
