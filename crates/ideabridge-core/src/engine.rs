//! The reward engine.
//!
//! Given a user and an action key, looks up the configured rule, applies the
//! balance deltas together with the ledger append in one store transaction,
//! then runs achievement evaluation for that user.  Missing rule or unknown
//! user are deliberate soft no-ops, not errors.
//!
//! There is no duplicate suppression: awarding the same logical event twice
//! grants twice.  Preventing that is the caller's responsibility.

use tracing::debug;
use uuid::Uuid;

use crate::achievements::AchievementEvaluator;
use crate::error::Result;
use crate::SharedDb;

/// Well-known action keys emitted by the platform's domain events.
pub mod actions {
    pub const CREATE_IDEA: &str = "create_idea";
    pub const COMMENT_ADD: &str = "comment_add";
    pub const COMMENT_RECEIVED: &str = "comment_received";
    pub const VOTE: &str = "vote";
    pub const IDEA_LIKE: &str = "idea_like";
    pub const IDEA_SUBMIT: &str = "idea_submit";
    pub const IDEA_APPROVED: &str = "idea_approved";
}

/// The deltas applied by a successful award.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Award {
    pub points: i64,
    pub coins: i64,
}

#[derive(Clone)]
pub struct RewardEngine {
    db: SharedDb,
    evaluator: AchievementEvaluator,
}

impl RewardEngine {
    pub fn new(db: SharedDb, evaluator: AchievementEvaluator) -> Self {
        Self { db, evaluator }
    }

    /// Award a user for an action.
    ///
    /// Returns `Ok(None)` without any mutation when no rule is configured for
    /// `action_key` or the user does not exist.  Otherwise the user's
    /// balances and the ledger are updated atomically, achievements are
    /// re-evaluated, and the applied deltas are returned.
    pub async fn award_action(&self, user_id: Uuid, action_key: &str) -> Result<Option<Award>> {
        let applied = {
            let mut db = self.db.lock().await;

            let Some(rule) = db.get_rule(action_key)? else {
                debug!(action = action_key, "no rule configured, skipping award");
                return Ok(None);
            };

            if !db.apply_award(user_id, action_key, rule.points_amount, rule.coins_amount)? {
                debug!(user = %user_id, action = action_key, "unknown user, skipping award");
                return Ok(None);
            }

            Award {
                points: rule.points_amount,
                coins: rule.coins_amount,
            }
        };

        // Ledger append happens-before achievement evaluation.
        self.evaluator.evaluate(user_id).await?;

        Ok(Some(applied))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;
    use ideabridge_store::Role;

    fn engine(db: &SharedDb) -> RewardEngine {
        let (dispatcher, _connections) = testutil::dispatcher(db);
        let evaluator = AchievementEvaluator::new(db.clone(), dispatcher);
        RewardEngine::new(db.clone(), evaluator)
    }

    #[tokio::test]
    async fn award_applies_rule_deltas_exactly_once() {
        let (_dir, db) = testutil::open_db();
        let engine = engine(&db);

        let user = testutil::insert_user(&*db.lock().await, Role::User);
        db.lock().await.update_rule("vote", 5, 1).unwrap();

        let award = engine.award_action(user, "vote").await.unwrap().unwrap();
        assert_eq!(award, Award { points: 5, coins: 1 });

        let guard = db.lock().await;
        let loaded = guard.get_user(user).unwrap();
        assert_eq!(loaded.points, 5);
        assert_eq!(loaded.coins, 1);

        let log = guard.points_log_for_user(user).unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].action_key, "vote");
        assert_eq!(log[0].points, 5);
        assert_eq!(log[0].coins, 1);
    }

    #[tokio::test]
    async fn unconfigured_action_mutates_nothing() {
        let (_dir, db) = testutil::open_db();
        let engine = engine(&db);
        let user = testutil::insert_user(&*db.lock().await, Role::User);

        let award = engine.award_action(user, "no_such_action").await.unwrap();
        assert!(award.is_none());

        let guard = db.lock().await;
        assert_eq!(guard.get_user(user).unwrap().points, 0);
        assert!(guard.points_log_for_user(user).unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_user_is_a_soft_no_op() {
        let (_dir, db) = testutil::open_db();
        let engine = engine(&db);

        let award = engine
            .award_action(uuid::Uuid::new_v4(), "vote")
            .await
            .unwrap();
        assert!(award.is_none());
    }

    #[tokio::test]
    async fn double_award_grants_twice() {
        // No built-in dedup; two calls for the same logical event both land.
        let (_dir, db) = testutil::open_db();
        let engine = engine(&db);

        let user = testutil::insert_user(&*db.lock().await, Role::User);
        db.lock().await.update_rule("vote", 5, 1).unwrap();

        engine.award_action(user, "vote").await.unwrap();
        engine.award_action(user, "vote").await.unwrap();

        let guard = db.lock().await;
        assert_eq!(guard.get_user(user).unwrap().points, 10);
        assert_eq!(guard.points_log_for_user(user).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn award_triggers_achievement_evaluation() {
        let (_dir, db) = testutil::open_db();
        let engine = engine(&db);

        let (user, first_idea) = {
            let guard = db.lock().await;
            let user = testutil::insert_user(&guard, Role::User);
            testutil::insert_idea(&guard, user);
            let achievement = guard
                .achievement_for_condition("first_idea")
                .unwrap()
                .unwrap();
            (user, achievement)
        };
        db.lock().await.update_rule("create_idea", 20, 5).unwrap();

        engine.award_action(user, "create_idea").await.unwrap();

        let guard = db.lock().await;
        assert!(guard.has_achievement(user, first_idea.id).unwrap());
        // Action deltas plus the achievement's own reward, in one request.
        let loaded = guard.get_user(user).unwrap();
        assert_eq!(loaded.points, 20 + first_idea.reward_points);
        assert_eq!(loaded.coins, 5 + first_idea.reward_coins);
    }
}
