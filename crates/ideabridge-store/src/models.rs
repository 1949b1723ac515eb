//! Domain model structs persisted in the SQLite database.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be handed
//! directly to the HTTP layer as JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// Platform role of a user account.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Expert,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Expert => "expert",
            Role::Admin => "admin",
        }
    }

    /// Parse a role stored as text.  Unknown values degrade to `User` so a
    /// bad row never makes an account unreadable.
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "admin" => Role::Admin,
            "expert" => Role::Expert,
            _ => Role::User,
        }
    }

    /// Whether this role may change idea statuses.
    pub fn can_review(&self) -> bool {
        matches!(self, Role::Expert | Role::Admin)
    }
}

/// A registered user.  Points and coins are mutated exclusively through the
/// reward engine's store helpers ([`Database::apply_award`] and
/// [`Database::grant_achievement`]).
///
/// [`Database::apply_award`]: crate::database::Database::apply_award
/// [`Database::grant_achievement`]: crate::database::Database::grant_achievement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// Unique user identifier.
    pub id: Uuid,
    pub full_name: String,
    /// Unique e-mail address.
    pub email: String,
    pub role: Role,
    /// Rating points balance (never negative).
    pub points: i64,
    /// Spendable coin balance (never negative).
    pub coins: i64,
    pub department: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Idea
// ---------------------------------------------------------------------------

/// A submitted idea.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Idea {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    /// The user who submitted the idea.
    pub author_id: Uuid,
    /// Current workflow status (e.g. "new", "submitted", "approved").
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// One entry in an idea's review history, appended by an expert or admin.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdeaStatusChange {
    pub id: Uuid,
    pub idea_id: Uuid,
    /// The reviewer who made the change.
    pub expert_id: Uuid,
    pub status: String,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Comment
// ---------------------------------------------------------------------------

/// A comment on an idea.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Comment {
    pub id: Uuid,
    pub idea_id: Uuid,
    pub author_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Vote
// ---------------------------------------------------------------------------

/// A vote cast on an idea.  At most one vote per (idea, voter) pair; casting
/// again removes the existing vote.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Vote {
    pub id: Uuid,
    pub idea_id: Uuid,
    pub voter_id: Uuid,
    /// `true` for an upvote ("like").
    pub positive: bool,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Points rules & ledger
// ---------------------------------------------------------------------------

/// An administrator-editable rule mapping an action key to award amounts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PointsRule {
    /// Unique action key, e.g. "create_idea" or "vote".
    pub action_key: String,
    pub points_amount: i64,
    pub coins_amount: i64,
    pub updated_at: DateTime<Utc>,
}

/// One append-only ledger row recording a single award.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PointsLogEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub action_key: String,
    /// Exact points delta applied by this award.
    pub points: i64,
    /// Exact coins delta applied by this award.
    pub coins: i64,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Achievements
// ---------------------------------------------------------------------------

/// A configured achievement.  `condition_key` names exactly one evaluable
/// predicate in the achievement evaluator's registry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Achievement {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Unique key tying this achievement to an evaluator condition.
    pub condition_key: String,
    pub reward_points: i64,
    pub reward_coins: i64,
    pub created_at: DateTime<Utc>,
}

/// A permanent record that a user holds an achievement.  The (user,
/// achievement) pair is the primary key: at most one grant, ever.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserAchievement {
    pub user_id: Uuid,
    pub achievement_id: Uuid,
    pub received_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Notification
// ---------------------------------------------------------------------------

/// A persisted notification.  Created by the notification dispatcher only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    /// Flips false -> true once via `mark_read`.
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}
