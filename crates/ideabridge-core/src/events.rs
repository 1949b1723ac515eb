//! Domain events that drive the reward engine.
//!
//! Each event persists its own record first, then hands the reward engine the
//! matching action keys and lets the notification dispatcher fan out to the
//! affected users.  The whole chain runs synchronously inside the triggering
//! request; a failure partway aborts the remaining effects.

use chrono::Utc;
use ideabridge_store::{Comment, Idea, IdeaStatusChange, StoreError, Vote};
use tracing::{debug, error};
use uuid::Uuid;

use crate::dispatch::NotificationDispatcher;
use crate::engine::{actions, RewardEngine};
use crate::error::{CoreError, Result};
use crate::SharedDb;

/// Outcome of a vote event.  Voting on an idea the user has already voted on
/// removes the vote instead (toggle semantics), which awards nothing.
#[derive(Debug, Clone)]
pub enum VoteOutcome {
    Cast(Vote),
    Removed,
}

#[derive(Clone)]
pub struct EventService {
    db: SharedDb,
    engine: RewardEngine,
    dispatcher: NotificationDispatcher,
    /// Whether idea team-member associations are recorded.  When disabled the
    /// inserts are skipped as "feature not enabled"; when enabled, an insert
    /// failure is a real error and propagates.
    team_assignments_enabled: bool,
}

impl EventService {
    pub fn new(
        db: SharedDb,
        engine: RewardEngine,
        dispatcher: NotificationDispatcher,
        team_assignments_enabled: bool,
    ) -> Self {
        Self {
            db,
            engine,
            dispatcher,
            team_assignments_enabled,
        }
    }

    /// A user submitted a new idea.
    pub async fn idea_created(
        &self,
        author_id: Uuid,
        title: &str,
        description: &str,
        team_member_ids: &[Uuid],
    ) -> Result<Idea> {
        let idea = Idea {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: description.to_string(),
            author_id,
            status: "new".to_string(),
            created_at: Utc::now(),
        };

        {
            let db = self.db.lock().await;
            db.insert_idea(&idea)?;

            if self.team_assignments_enabled {
                for member_id in team_member_ids {
                    db.add_team_member(idea.id, *member_id).map_err(|e| {
                        error!(idea = %idea.id, member = %member_id, error = %e,
                               "team member insert failed");
                        e
                    })?;
                }
            } else if !team_member_ids.is_empty() {
                debug!(idea = %idea.id, "team assignments disabled, skipping members");
            }
        }

        self.engine
            .award_action(author_id, actions::CREATE_IDEA)
            .await?;

        self.dispatcher
            .notify(
                author_id,
                "Idea created",
                &format!("Your idea \"{}\" has been submitted for review", idea.title),
            )
            .await?;

        Ok(idea)
    }

    /// A user commented on an idea.
    pub async fn comment_added(
        &self,
        idea_id: Uuid,
        author_id: Uuid,
        text: &str,
    ) -> Result<Comment> {
        let comment = Comment {
            id: Uuid::new_v4(),
            idea_id,
            author_id,
            text: text.to_string(),
            created_at: Utc::now(),
        };

        let idea = {
            let db = self.db.lock().await;
            let idea = get_idea(&db, idea_id)?;
            db.insert_comment(&comment)?;
            idea
        };

        // The idea's author earns a bonus for comments from other users.
        if idea.author_id != author_id {
            self.engine
                .award_action(idea.author_id, actions::COMMENT_RECEIVED)
                .await?;
        }
        self.engine
            .award_action(author_id, actions::COMMENT_ADD)
            .await?;

        if idea.author_id != author_id {
            self.dispatcher
                .notify(
                    idea.author_id,
                    "New comment on your idea",
                    &format!("Someone commented on your idea \"{}\"", idea.title),
                )
                .await?;
        }

        Ok(comment)
    }

    /// A user voted on an idea, or removed their existing vote.
    pub async fn vote_cast(&self, idea_id: Uuid, voter_id: Uuid) -> Result<VoteOutcome> {
        let (idea, vote) = {
            let db = self.db.lock().await;
            let idea = get_idea(&db, idea_id)?;

            if let Some(existing) = db.find_vote(idea_id, voter_id)? {
                db.delete_vote(existing.id)?;
                return Ok(VoteOutcome::Removed);
            }

            let vote = Vote {
                id: Uuid::new_v4(),
                idea_id,
                voter_id,
                positive: true,
                created_at: Utc::now(),
            };
            db.insert_vote(&vote)?;
            (idea, vote)
        };

        if idea.author_id != voter_id {
            self.engine
                .award_action(idea.author_id, actions::IDEA_LIKE)
                .await?;
        }
        self.engine.award_action(voter_id, actions::VOTE).await?;

        if idea.author_id != voter_id {
            self.dispatcher
                .notify(
                    idea.author_id,
                    "Your idea was liked",
                    &format!("Someone voted for your idea \"{}\"", idea.title),
                )
                .await?;
        }

        Ok(VoteOutcome::Cast(vote))
    }

    /// An expert or admin changed an idea's status.
    pub async fn status_changed(
        &self,
        idea_id: Uuid,
        expert_id: Uuid,
        new_status: &str,
        comment: Option<String>,
    ) -> Result<IdeaStatusChange> {
        let change = IdeaStatusChange {
            id: Uuid::new_v4(),
            idea_id,
            expert_id,
            status: new_status.to_string(),
            comment,
            created_at: Utc::now(),
        };

        let idea = {
            let db = self.db.lock().await;

            let reviewer = db.get_user(expert_id)?;
            if !reviewer.role.can_review() {
                return Err(CoreError::Forbidden);
            }

            let idea = get_idea(&db, idea_id)?;
            db.insert_status_change(&change)?;
            db.set_idea_status(idea_id, new_status)?;
            idea
        };

        self.dispatcher
            .notify(
                idea.author_id,
                "Idea status changed",
                &format!("Your idea \"{}\" is now: {}", idea.title, new_status),
            )
            .await?;

        match new_status.to_ascii_lowercase().as_str() {
            "submitted" => {
                self.engine
                    .award_action(idea.author_id, actions::IDEA_SUBMIT)
                    .await?;
            }
            "approved" | "implemented" => {
                self.engine
                    .award_action(idea.author_id, actions::IDEA_APPROVED)
                    .await?;
            }
            _ => {}
        }

        Ok(change)
    }
}

fn get_idea(db: &ideabridge_store::Database, idea_id: Uuid) -> Result<Idea> {
    db.get_idea(idea_id).map_err(|e| match e {
        StoreError::NotFound => CoreError::IdeaNotFound(idea_id),
        other => CoreError::Store(other),
    })
}
