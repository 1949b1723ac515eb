//! Achievement evaluation.
//!
//! Conditions are recomputed from persisted counts on every call -- no cached
//! counters, correctness over efficiency.  The evaluator is idempotent by
//! construction: the existing-grant check short-circuits each condition, so
//! re-running it after every award never accumulates duplicate grants.

use ideabridge_store::Achievement;
use tracing::{debug, info};
use uuid::Uuid;

use crate::dispatch::NotificationDispatcher;
use crate::error::Result;
use crate::SharedDb;

/// Per-user activity counts the conditions are evaluated against.
#[derive(Debug, Clone, Copy)]
pub struct ActivitySnapshot {
    pub ideas_authored: i64,
    pub comments_authored: i64,
    pub likes_received: i64,
}

/// The fixed registry of milestone conditions.  Each condition key maps to
/// exactly one predicate; an Achievement row with a matching `condition_key`
/// must exist for a grant to happen, otherwise the condition is skipped as
/// not configured yet.
pub const CONDITIONS: &[(&str, fn(&ActivitySnapshot) -> bool)] = &[
    ("first_idea", |a| a.ideas_authored >= 1),
    ("ten_ideas", |a| a.ideas_authored >= 10),
    ("five_comments", |a| a.comments_authored >= 5),
    ("hundred_likes", |a| a.likes_received >= 100),
];

#[derive(Clone)]
pub struct AchievementEvaluator {
    db: SharedDb,
    dispatcher: NotificationDispatcher,
}

impl AchievementEvaluator {
    pub fn new(db: SharedDb, dispatcher: NotificationDispatcher) -> Self {
        Self { db, dispatcher }
    }

    /// Re-evaluate every condition for a user and grant any achievement whose
    /// condition newly holds.  Returns the achievements granted by this call.
    ///
    /// Grants (grant row plus reward balance bump) commit before their
    /// notifications are dispatched.
    pub async fn evaluate(&self, user_id: Uuid) -> Result<Vec<Achievement>> {
        let granted = {
            let mut db = self.db.lock().await;

            if db.find_user(user_id)?.is_none() {
                debug!(user = %user_id, "evaluate skipped, unknown user");
                return Ok(Vec::new());
            }

            let snapshot = ActivitySnapshot {
                ideas_authored: db.count_ideas_by_author(user_id)?,
                comments_authored: db.count_comments_by_author(user_id)?,
                likes_received: db.count_likes_received(user_id)?,
            };

            let mut granted = Vec::new();
            for (condition_key, condition) in CONDITIONS {
                if !condition(&snapshot) {
                    continue;
                }

                // No Achievement row for a true condition: not configured
                // yet, skip silently.
                let Some(achievement) = db.achievement_for_condition(condition_key)? else {
                    continue;
                };

                if db.has_achievement(user_id, achievement.id)? {
                    continue;
                }

                db.grant_achievement(user_id, &achievement)?;
                info!(
                    user = %user_id,
                    achievement = %achievement.name,
                    condition = condition_key,
                    "achievement granted"
                );
                granted.push(achievement);
            }
            granted
        };

        for achievement in &granted {
            self.dispatcher
                .notify(
                    user_id,
                    "New achievement!",
                    &format!(
                        "Congratulations! You earned the \"{}\" achievement.",
                        achievement.name
                    ),
                )
                .await?;
        }

        Ok(granted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;
    use chrono::Utc;
    use ideabridge_store::{Role, Vote};

    fn evaluator(db: &SharedDb) -> AchievementEvaluator {
        let (dispatcher, _connections) = testutil::dispatcher(db);
        AchievementEvaluator::new(db.clone(), dispatcher)
    }

    #[tokio::test]
    async fn first_idea_granted_once() {
        let (_dir, db) = testutil::open_db();
        let evaluator = evaluator(&db);

        let user = {
            let guard = db.lock().await;
            let user = testutil::insert_user(&guard, Role::User);
            testutil::insert_idea(&guard, user);
            user
        };

        let granted = evaluator.evaluate(user).await.unwrap();
        assert_eq!(granted.len(), 1);
        assert_eq!(granted[0].condition_key, "first_idea");

        // Idempotent: nothing changed, so the second pass grants nothing.
        let again = evaluator.evaluate(user).await.unwrap();
        assert!(again.is_empty());
    }

    #[tokio::test]
    async fn ten_ideas_grants_both_milestones_in_one_pass() {
        let (_dir, db) = testutil::open_db();
        let evaluator = evaluator(&db);

        let user = {
            let guard = db.lock().await;
            let user = testutil::insert_user(&guard, Role::User);
            for _ in 0..10 {
                testutil::insert_idea(&guard, user);
            }
            user
        };

        let granted = evaluator.evaluate(user).await.unwrap();
        let mut keys: Vec<_> = granted.iter().map(|a| a.condition_key.clone()).collect();
        keys.sort();
        assert_eq!(keys, vec!["first_idea", "ten_ideas"]);

        assert!(evaluator.evaluate(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn grant_adds_reward_to_balance() {
        let (_dir, db) = testutil::open_db();
        let evaluator = evaluator(&db);

        let (user, reward_points, reward_coins) = {
            let guard = db.lock().await;
            let user = testutil::insert_user(&guard, Role::User);
            testutil::insert_idea(&guard, user);
            let achievement = guard
                .achievement_for_condition("first_idea")
                .unwrap()
                .unwrap();
            (user, achievement.reward_points, achievement.reward_coins)
        };

        evaluator.evaluate(user).await.unwrap();

        let loaded = db.lock().await.get_user(user).unwrap();
        assert_eq!(loaded.points, reward_points);
        assert_eq!(loaded.coins, reward_coins);
    }

    #[tokio::test]
    async fn grant_dispatches_notification() {
        let (_dir, db) = testutil::open_db();
        let evaluator = evaluator(&db);

        let user = {
            let guard = db.lock().await;
            let user = testutil::insert_user(&guard, Role::User);
            testutil::insert_idea(&guard, user);
            user
        };

        evaluator.evaluate(user).await.unwrap();

        let notifications = db.lock().await.notifications_for_user(user).unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].title, "New achievement!");
    }

    #[tokio::test]
    async fn hundred_likes_threshold() {
        let (_dir, db) = testutil::open_db();
        let evaluator = evaluator(&db);

        let user = {
            let guard = db.lock().await;
            let author = testutil::insert_user(&guard, Role::User);
            let idea = testutil::insert_idea(&guard, author);
            for _ in 0..100 {
                let voter = testutil::insert_user(&guard, Role::User);
                guard
                    .insert_vote(&Vote {
                        id: uuid::Uuid::new_v4(),
                        idea_id: idea.id,
                        voter_id: voter,
                        positive: true,
                        created_at: Utc::now(),
                    })
                    .unwrap();
            }
            author
        };

        let granted = evaluator.evaluate(user).await.unwrap();
        let keys: Vec<_> = granted.iter().map(|a| a.condition_key.as_str()).collect();
        assert!(keys.contains(&"hundred_likes"));
    }

    #[tokio::test]
    async fn unknown_user_grants_nothing() {
        let (_dir, db) = testutil::open_db();
        let evaluator = evaluator(&db);

        let granted = evaluator.evaluate(uuid::Uuid::new_v4()).await.unwrap();
        assert!(granted.is_empty());
    }
}
