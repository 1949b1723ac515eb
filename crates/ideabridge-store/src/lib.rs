//! # ideabridge-store
//!
//! Relational storage for the IdeaBridge platform, backed by SQLite.
//!
//! The crate exposes a synchronous [`Database`] handle that wraps a
//! `rusqlite::Connection` and provides typed CRUD helpers for every domain
//! model.  Balance mutations are always relative SQL updates executed inside
//! a transaction together with their ledger append, so a `Database` shared
//! behind a lock never loses increments under concurrent awards.

pub mod achievements;
pub mod comments;
pub mod database;
pub mod ideas;
pub mod ledger;
pub mod migrations;
pub mod models;
pub mod notifications;
pub mod rules;
pub mod users;
pub mod votes;

mod error;

pub use database::Database;
pub use error::StoreError;
pub use models::*;
