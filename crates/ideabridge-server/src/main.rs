//! # ideabridge-server
//!
//! HTTP server for the IdeaBridge idea-submission platform.
//!
//! This binary provides:
//! - **Domain event endpoints** (ideas, comments, votes, status changes) that
//!   drive the reward engine
//! - **Notification API** backed by durable rows plus a WebSocket channel for
//!   live pushes
//! - **Admin API** for editing points rules, guarded by a bearer token

mod api;
mod config;
mod error;
mod ws;

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use ideabridge_core::achievements::AchievementEvaluator;
use ideabridge_core::connections::ConnectionManager;
use ideabridge_core::dispatch::NotificationDispatcher;
use ideabridge_core::engine::RewardEngine;
use ideabridge_core::events::EventService;
use ideabridge_store::Database;

use crate::api::AppState;
use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,ideabridge_server=debug")),
        )
        .init();

    info!("Starting IdeaBridge server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");
    info!(
        instance = %config.instance_name,
        admin_enabled = config.admin_token.is_some(),
        team_assignments = config.team_assignments_enabled,
        "Instance settings"
    );

    // -----------------------------------------------------------------------
    // 3. Open the store (runs migrations and seeds default rules)
    // -----------------------------------------------------------------------
    let database = match &config.database_path {
        Some(path) => Database::open_at(path)?,
        None => Database::new()?,
    };
    let db = ideabridge_core::shared_db(database);

    // -----------------------------------------------------------------------
    // 4. Wire the core services
    // -----------------------------------------------------------------------
    let connections = ConnectionManager::new();
    let dispatcher = NotificationDispatcher::new(db.clone(), connections.clone());
    let evaluator = AchievementEvaluator::new(db.clone(), dispatcher.clone());
    let engine = RewardEngine::new(db.clone(), evaluator);
    let events = EventService::new(
        db.clone(),
        engine,
        dispatcher.clone(),
        config.team_assignments_enabled,
    );

    let state = AppState {
        db,
        events,
        dispatcher,
        connections,
        config: Arc::new(config.clone()),
    };

    // -----------------------------------------------------------------------
    // 5. Serve
    // -----------------------------------------------------------------------
    let router = api::build_router(state);
    let listener = tokio::net::TcpListener::bind(config.http_addr).await?;
    info!(addr = %config.http_addr, "HTTP server listening");

    axum::serve(listener, router).await?;

    Ok(())
}
