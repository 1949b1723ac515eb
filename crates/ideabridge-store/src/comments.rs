use rusqlite::params;
use uuid::Uuid;

use crate::database::{column_timestamp, column_uuid, Database};
use crate::error::Result;
use crate::models::Comment;

impl Database {
    pub fn insert_comment(&self, comment: &Comment) -> Result<()> {
        self.conn().execute(
            "INSERT INTO comments (id, idea_id, author_id, text, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                comment.id.to_string(),
                comment.idea_id.to_string(),
                comment.author_id.to_string(),
                comment.text,
                comment.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn comments_for_idea(&self, idea_id: Uuid) -> Result<Vec<Comment>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, idea_id, author_id, text, created_at
             FROM comments
             WHERE idea_id = ?1
             ORDER BY created_at ASC",
        )?;

        let rows = stmt.query_map(params![idea_id.to_string()], row_to_comment)?;

        let mut comments = Vec::new();
        for row in rows {
            comments.push(row?);
        }
        Ok(comments)
    }

    /// Count of comments authored by a user.  Condition source for the
    /// `five_comments` achievement.
    pub fn count_comments_by_author(&self, author_id: Uuid) -> Result<i64> {
        let count = self.conn().query_row(
            "SELECT COUNT(*) FROM comments WHERE author_id = ?1",
            params![author_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

fn row_to_comment(row: &rusqlite::Row<'_>) -> rusqlite::Result<Comment> {
    let id_str: String = row.get(0)?;
    let idea_str: String = row.get(1)?;
    let author_str: String = row.get(2)?;
    let ts_str: String = row.get(4)?;

    Ok(Comment {
        id: column_uuid(0, &id_str)?,
        idea_id: column_uuid(1, &idea_str)?,
        author_id: column_uuid(2, &author_str)?,
        text: row.get(3)?,
        created_at: column_timestamp(4, &ts_str)?,
    })
}
