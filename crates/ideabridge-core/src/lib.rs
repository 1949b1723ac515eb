//! # ideabridge-core
//!
//! The reward engine of the IdeaBridge platform and the services around it:
//!
//! - [`engine::RewardEngine`] -- rule-driven point/coin awarding with an
//!   append-only ledger, the system's transactional core
//! - [`achievements::AchievementEvaluator`] -- milestone conditions recomputed
//!   from persisted facts, granting each achievement at most once per user
//! - [`dispatch::NotificationDispatcher`] -- durable notification rows with a
//!   best-effort push over a live connection
//! - [`connections::ConnectionManager`] -- the synchronized registry of open
//!   live channels, keyed by user id
//! - [`events::EventService`] -- the domain events (idea created, comment
//!   posted, vote cast, status changed) that drive the engine
//!
//! All services share one [`Database`] handle behind a `tokio::sync::Mutex`;
//! balance mutations execute as relative updates inside store transactions,
//! so awards are never lost to interleaving.

pub mod achievements;
pub mod connections;
pub mod dispatch;
pub mod engine;
pub mod events;

mod error;

use std::sync::Arc;

use ideabridge_store::Database;
use tokio::sync::Mutex;

pub use error::CoreError;

/// The store handle shared by every core service.
pub type SharedDb = Arc<Mutex<Database>>;

/// Wrap an open [`Database`] for sharing across services and tasks.
pub fn shared_db(db: Database) -> SharedDb {
    Arc::new(Mutex::new(db))
}

#[cfg(test)]
pub(crate) mod testutil {
    use chrono::Utc;
    use ideabridge_store::{Database, Idea, Role, User};
    use uuid::Uuid;

    use crate::connections::ConnectionManager;
    use crate::dispatch::NotificationDispatcher;
    use crate::SharedDb;

    pub fn open_db() -> (tempfile::TempDir, SharedDb) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("test.db")).unwrap();
        (dir, crate::shared_db(db))
    }

    pub fn dispatcher(db: &SharedDb) -> (NotificationDispatcher, ConnectionManager) {
        let connections = ConnectionManager::new();
        (
            NotificationDispatcher::new(db.clone(), connections.clone()),
            connections,
        )
    }

    pub fn insert_user(db: &Database, role: Role) -> Uuid {
        let id = Uuid::new_v4();
        db.insert_user(&User {
            id,
            full_name: "Test User".into(),
            email: format!("{id}@example.com"),
            role,
            points: 0,
            coins: 0,
            department: None,
            created_at: Utc::now(),
        })
        .unwrap();
        id
    }

    pub fn insert_idea(db: &Database, author_id: Uuid) -> Idea {
        let idea = Idea {
            id: Uuid::new_v4(),
            title: "Test Idea".into(),
            description: "A test idea".into(),
            author_id,
            status: "new".into(),
            created_at: Utc::now(),
        };
        db.insert_idea(&idea).unwrap();
        idea
    }
}
