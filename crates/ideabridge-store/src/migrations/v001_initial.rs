//! v001 -- Initial schema creation.
//!
//! Creates the full platform schema: users, ideas, review history, team
//! members, comments, votes, points rules, the points ledger, achievements,
//! grants, and notifications.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id         TEXT PRIMARY KEY NOT NULL,   -- UUID v4
    full_name  TEXT NOT NULL,
    email      TEXT NOT NULL UNIQUE,
    role       TEXT NOT NULL DEFAULT 'user',
    points     INTEGER NOT NULL DEFAULT 0,
    coins      INTEGER NOT NULL DEFAULT 0,
    department TEXT,
    created_at TEXT NOT NULL                -- ISO-8601 / RFC-3339
);

-- ----------------------------------------------------------------
-- Ideas
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS ideas (
    id          TEXT PRIMARY KEY NOT NULL,  -- UUID v4
    title       TEXT NOT NULL,
    description TEXT NOT NULL,
    author_id   TEXT NOT NULL,              -- FK -> users(id)
    status      TEXT NOT NULL DEFAULT 'new',
    created_at  TEXT NOT NULL,

    FOREIGN KEY (author_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_ideas_author ON ideas(author_id);

-- ----------------------------------------------------------------
-- Idea review history (appended by experts/admins)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS idea_status_changes (
    id         TEXT PRIMARY KEY NOT NULL,   -- UUID v4
    idea_id    TEXT NOT NULL,               -- FK -> ideas(id)
    expert_id  TEXT NOT NULL,               -- FK -> users(id)
    status     TEXT NOT NULL,
    comment    TEXT,
    created_at TEXT NOT NULL,

    FOREIGN KEY (idea_id) REFERENCES ideas(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_status_changes_idea
    ON idea_status_changes(idea_id, created_at DESC);

-- ----------------------------------------------------------------
-- Idea team members (optional feature, gated by server config)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS idea_team_members (
    idea_id    TEXT NOT NULL,               -- FK -> ideas(id)
    user_id    TEXT NOT NULL,               -- FK -> users(id)
    is_primary INTEGER NOT NULL DEFAULT 0,  -- boolean 0/1

    PRIMARY KEY (idea_id, user_id),
    FOREIGN KEY (idea_id) REFERENCES ideas(id) ON DELETE CASCADE,
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

-- ----------------------------------------------------------------
-- Comments
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS comments (
    id         TEXT PRIMARY KEY NOT NULL,   -- UUID v4
    idea_id    TEXT NOT NULL,               -- FK -> ideas(id)
    author_id  TEXT NOT NULL,               -- FK -> users(id)
    text       TEXT NOT NULL,
    created_at TEXT NOT NULL,

    FOREIGN KEY (idea_id) REFERENCES ideas(id) ON DELETE CASCADE,
    FOREIGN KEY (author_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_comments_author ON comments(author_id);

-- ----------------------------------------------------------------
-- Votes (one per user per idea)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS votes (
    id         TEXT PRIMARY KEY NOT NULL,   -- UUID v4
    idea_id    TEXT NOT NULL,               -- FK -> ideas(id)
    voter_id   TEXT NOT NULL,               -- FK -> users(id)
    positive   INTEGER NOT NULL DEFAULT 1,  -- boolean 0/1
    created_at TEXT NOT NULL,

    UNIQUE (idea_id, voter_id),
    FOREIGN KEY (idea_id) REFERENCES ideas(id) ON DELETE CASCADE,
    FOREIGN KEY (voter_id) REFERENCES users(id) ON DELETE CASCADE
);

-- ----------------------------------------------------------------
-- Points rules (seeded, then administrator-editable)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS points_rules (
    action_key    TEXT PRIMARY KEY NOT NULL,
    points_amount INTEGER NOT NULL DEFAULT 0,
    coins_amount  INTEGER NOT NULL DEFAULT 0,
    updated_at    TEXT NOT NULL
);

-- ----------------------------------------------------------------
-- Points ledger (append-only)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS points_log (
    id         TEXT PRIMARY KEY NOT NULL,   -- UUID v4
    user_id    TEXT NOT NULL,               -- FK -> users(id)
    action_key TEXT NOT NULL,
    points     INTEGER NOT NULL DEFAULT 0,
    coins      INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,

    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_points_log_user
    ON points_log(user_id, created_at DESC);

-- ----------------------------------------------------------------
-- Achievements
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS achievements (
    id            TEXT PRIMARY KEY NOT NULL, -- UUID v4
    name          TEXT NOT NULL,
    description   TEXT,
    condition_key TEXT NOT NULL UNIQUE,
    reward_points INTEGER NOT NULL DEFAULT 0,
    reward_coins  INTEGER NOT NULL DEFAULT 0,
    created_at    TEXT NOT NULL
);

-- ----------------------------------------------------------------
-- Achievement grants (at most one per user per achievement, ever)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS user_achievements (
    user_id        TEXT NOT NULL,           -- FK -> users(id)
    achievement_id TEXT NOT NULL,           -- FK -> achievements(id)
    received_at    TEXT NOT NULL,

    PRIMARY KEY (user_id, achievement_id),
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
    FOREIGN KEY (achievement_id) REFERENCES achievements(id) ON DELETE CASCADE
);

-- ----------------------------------------------------------------
-- Notifications
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS notifications (
    id         TEXT PRIMARY KEY NOT NULL,   -- UUID v4
    user_id    TEXT NOT NULL,               -- FK -> users(id)
    title      TEXT NOT NULL,
    message    TEXT NOT NULL,
    is_read    INTEGER NOT NULL DEFAULT 0,  -- boolean 0/1
    created_at TEXT NOT NULL,

    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_notifications_user
    ON notifications(user_id, created_at DESC);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
