use chrono::Utc;
use rusqlite::params;

use crate::database::{column_timestamp, Database};
use crate::error::{Result, StoreError};
use crate::models::PointsRule;

impl Database {
    /// Rule for an action key.  Absence is `None`, not an error: an action
    /// without a configured rule simply awards nothing.
    pub fn get_rule(&self, action_key: &str) -> Result<Option<PointsRule>> {
        let result = self.conn().query_row(
            "SELECT action_key, points_amount, coins_amount, updated_at
             FROM points_rules WHERE action_key = ?1",
            params![action_key],
            row_to_rule,
        );

        match result {
            Ok(rule) => Ok(Some(rule)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::Sqlite(e)),
        }
    }

    /// Change the amounts of an existing rule.  Rules are seeded, not created
    /// through this path, so a missing key is `NotFound`.
    pub fn update_rule(&self, action_key: &str, points: i64, coins: i64) -> Result<PointsRule> {
        let now = Utc::now();
        let affected = self.conn().execute(
            "UPDATE points_rules
             SET points_amount = ?2, coins_amount = ?3, updated_at = ?4
             WHERE action_key = ?1",
            params![action_key, points, coins, now.to_rfc3339()],
        )?;

        if affected == 0 {
            return Err(StoreError::NotFound);
        }

        Ok(PointsRule {
            action_key: action_key.to_string(),
            points_amount: points,
            coins_amount: coins,
            updated_at: now,
        })
    }

    pub fn list_rules(&self) -> Result<Vec<PointsRule>> {
        let mut stmt = self.conn().prepare(
            "SELECT action_key, points_amount, coins_amount, updated_at
             FROM points_rules ORDER BY action_key ASC",
        )?;

        let rows = stmt.query_map([], row_to_rule)?;

        let mut rules = Vec::new();
        for row in rows {
            rules.push(row?);
        }
        Ok(rules)
    }
}

fn row_to_rule(row: &rusqlite::Row<'_>) -> rusqlite::Result<PointsRule> {
    let ts_str: String = row.get(3)?;

    Ok(PointsRule {
        action_key: row.get(0)?,
        points_amount: row.get(1)?,
        coins_amount: row.get(2)?,
        updated_at: column_timestamp(3, &ts_str)?,
    })
}
