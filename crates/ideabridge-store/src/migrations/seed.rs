//! Seed data for points rules and achievements.
//!
//! Rules are seeded, never created through the admin API, so every action key
//! the platform emits must be listed here.  Amounts are defaults and can be
//! changed by an administrator at runtime.

use chrono::Utc;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::error::Result;

/// (action_key, points, coins) defaults for every reward-triggering event.
const DEFAULT_RULES: &[(&str, i64, i64)] = &[
    ("create_idea", 20, 5),
    ("comment_add", 5, 1),
    ("comment_received", 3, 0),
    ("vote", 5, 1),
    ("idea_like", 2, 0),
    ("idea_submit", 10, 2),
    ("idea_approved", 100, 25),
];

/// (condition_key, name, description, reward_points, reward_coins).
const DEFAULT_ACHIEVEMENTS: &[(&str, &str, &str, i64, i64)] = &[
    (
        "first_idea",
        "First Idea",
        "Submitted your first idea",
        50,
        10,
    ),
    (
        "ten_ideas",
        "Idea Machine",
        "Submitted ten ideas",
        200,
        50,
    ),
    (
        "five_comments",
        "Conversationalist",
        "Left five comments",
        30,
        5,
    ),
    (
        "hundred_likes",
        "Crowd Favourite",
        "Collected one hundred likes across your ideas",
        500,
        100,
    ),
];

/// Insert any missing default rules and achievements.  Safe to call on every
/// open; existing rows (including admin-edited amounts) are left untouched.
pub fn ensure_defaults(conn: &Connection) -> Result<()> {
    let now = Utc::now().to_rfc3339();

    for (action_key, points, coins) in DEFAULT_RULES {
        conn.execute(
            "INSERT OR IGNORE INTO points_rules (action_key, points_amount, coins_amount, updated_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![action_key, points, coins, now],
        )?;
    }

    for (condition_key, name, description, reward_points, reward_coins) in DEFAULT_ACHIEVEMENTS {
        let inserted = conn.execute(
            "INSERT INTO achievements (id, name, description, condition_key, reward_points, reward_coins, created_at)
             SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7
             WHERE NOT EXISTS (SELECT 1 FROM achievements WHERE condition_key = ?4)",
            params![
                Uuid::new_v4().to_string(),
                name,
                description,
                condition_key,
                reward_points,
                reward_coins,
                now,
            ],
        )?;
        if inserted > 0 {
            tracing::debug!(condition_key, "seeded achievement");
        }
    }

    Ok(())
}
