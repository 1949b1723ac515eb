use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, Method},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use ideabridge_core::connections::ConnectionManager;
use ideabridge_core::dispatch::NotificationDispatcher;
use ideabridge_core::events::{EventService, VoteOutcome};
use ideabridge_core::SharedDb;
use ideabridge_store::{
    Achievement, Comment, Idea, IdeaStatusChange, Notification, PointsLogEntry, PointsRule, Role,
    User,
};

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::ws;

#[derive(Clone)]
pub struct AppState {
    pub db: SharedDb,
    pub events: EventService,
    pub dispatcher: NotificationDispatcher,
    pub connections: ConnectionManager,
    pub config: Arc<ServerConfig>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/info", get(server_info))
        .route("/users", post(create_user))
        .route("/ideas", post(create_idea))
        .route("/ideas/:id/comments", get(list_comments).post(add_comment))
        .route("/ideas/:id/vote", post(cast_vote))
        .route("/ideas/:id/status", post(change_status))
        .route("/ideas/:id/history", get(idea_history))
        .route("/notifications", get(list_notifications))
        .route("/notifications/:id/read", post(mark_notification_read))
        .route("/achievements/my", get(my_achievements))
        .route("/points/log", get(my_points_log))
        .route("/admin/rules", get(admin_list_rules))
        .route("/admin/rules/:action", put(admin_update_rule))
        .route("/ws/notifications", get(ws::notifications_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request / response payloads
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct ServerInfoResponse {
    name: String,
    version: &'static str,
    live_connections: usize,
}

#[derive(Deserialize)]
struct CreateUserRequest {
    full_name: String,
    email: String,
    #[serde(default)]
    role: Option<Role>,
    #[serde(default)]
    department: Option<String>,
}

#[derive(Deserialize)]
struct CreateIdeaRequest {
    title: String,
    description: String,
    #[serde(default)]
    team_member_ids: Vec<Uuid>,
}

#[derive(Deserialize)]
struct AddCommentRequest {
    text: String,
}

#[derive(Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
enum VoteResponse {
    Cast { vote_id: Uuid },
    Removed,
}

#[derive(Deserialize)]
struct ChangeStatusRequest {
    status: String,
    #[serde(default)]
    comment: Option<String>,
}

#[derive(Serialize)]
struct HeldAchievement {
    #[serde(flatten)]
    achievement: Achievement,
    received_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct UpdateRuleRequest {
    points: i64,
    coins: i64,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn server_info(State(state): State<AppState>) -> Json<ServerInfoResponse> {
    Json(ServerInfoResponse {
        name: state.config.instance_name.clone(),
        version: env!("CARGO_PKG_VERSION"),
        live_connections: state.connections.connection_count().await,
    })
}

async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<Json<User>, ServerError> {
    if request.email.is_empty() || request.full_name.is_empty() {
        return Err(ServerError::BadRequest(
            "full_name and email are required".to_string(),
        ));
    }

    let user = User {
        id: Uuid::new_v4(),
        full_name: request.full_name,
        email: request.email,
        role: request.role.unwrap_or(Role::User),
        points: 0,
        coins: 0,
        department: request.department,
        created_at: Utc::now(),
    };

    state
        .db
        .lock()
        .await
        .insert_user(&user)
        .map_err(|e| ServerError::BadRequest(format!("could not create user: {e}")))?;

    info!(user = %user.id, "user created");
    Ok(Json(user))
}

async fn create_idea(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateIdeaRequest>,
) -> Result<Json<Idea>, ServerError> {
    let author = require_user(&headers)?;
    let idea = state
        .events
        .idea_created(
            author,
            &request.title,
            &request.description,
            &request.team_member_ids,
        )
        .await?;
    Ok(Json(idea))
}

async fn add_comment(
    State(state): State<AppState>,
    Path(idea_id): Path<Uuid>,
    headers: HeaderMap,
    Json(request): Json<AddCommentRequest>,
) -> Result<Json<Comment>, ServerError> {
    let author = require_user(&headers)?;
    let comment = state
        .events
        .comment_added(idea_id, author, &request.text)
        .await?;
    Ok(Json(comment))
}

async fn cast_vote(
    State(state): State<AppState>,
    Path(idea_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<VoteResponse>, ServerError> {
    let voter = require_user(&headers)?;
    let outcome = state.events.vote_cast(idea_id, voter).await?;
    Ok(Json(match outcome {
        VoteOutcome::Cast(vote) => VoteResponse::Cast { vote_id: vote.id },
        VoteOutcome::Removed => VoteResponse::Removed,
    }))
}

async fn change_status(
    State(state): State<AppState>,
    Path(idea_id): Path<Uuid>,
    headers: HeaderMap,
    Json(request): Json<ChangeStatusRequest>,
) -> Result<Json<IdeaStatusChange>, ServerError> {
    let expert = require_user(&headers)?;
    let change = state
        .events
        .status_changed(idea_id, expert, &request.status, request.comment)
        .await?;
    Ok(Json(change))
}

async fn list_comments(
    State(state): State<AppState>,
    Path(idea_id): Path<Uuid>,
) -> Result<Json<Vec<Comment>>, ServerError> {
    let comments = state.db.lock().await.comments_for_idea(idea_id)?;
    Ok(Json(comments))
}

async fn idea_history(
    State(state): State<AppState>,
    Path(idea_id): Path<Uuid>,
) -> Result<Json<Vec<IdeaStatusChange>>, ServerError> {
    let history = state.db.lock().await.status_history(idea_id)?;
    Ok(Json(history))
}

async fn list_notifications(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Notification>>, ServerError> {
    let user = require_user(&headers)?;
    let notifications = state.dispatcher.list_for_user(user).await?;
    Ok(Json(notifications))
}

async fn mark_notification_read(
    State(state): State<AppState>,
    Path(notification_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<Notification>, ServerError> {
    let user = require_user(&headers)?;
    let updated = state.dispatcher.mark_read(notification_id, user).await?;
    Ok(Json(updated))
}

async fn my_achievements(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<HeldAchievement>>, ServerError> {
    let user = require_user(&headers)?;
    let held = state.db.lock().await.achievements_for_user(user)?;
    Ok(Json(
        held.into_iter()
            .map(|(achievement, received_at)| HeldAchievement {
                achievement,
                received_at,
            })
            .collect(),
    ))
}

async fn my_points_log(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<PointsLogEntry>>, ServerError> {
    let user = require_user(&headers)?;
    let log = state.db.lock().await.points_log_for_user(user)?;
    Ok(Json(log))
}

async fn admin_list_rules(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<PointsRule>>, ServerError> {
    verify_admin_token(&headers, &state.config)?;
    let rules = state.db.lock().await.list_rules()?;
    Ok(Json(rules))
}

async fn admin_update_rule(
    State(state): State<AppState>,
    Path(action_key): Path<String>,
    headers: HeaderMap,
    Json(request): Json<UpdateRuleRequest>,
) -> Result<Json<PointsRule>, ServerError> {
    verify_admin_token(&headers, &state.config)?;
    let updated = state
        .db
        .lock()
        .await
        .update_rule(&action_key, request.points, request.coins)?;
    info!(action = %action_key, points = request.points, coins = request.coins, "rule updated");
    Ok(Json(updated))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Authenticated user id, as established by the external identity service.
/// The core trusts it without re-validating credentials.
fn require_user(headers: &HeaderMap) -> Result<Uuid, ServerError> {
    let value = headers
        .get("x-user-id")
        .ok_or_else(|| ServerError::BadRequest("missing x-user-id header".to_string()))?;

    let text = value
        .to_str()
        .map_err(|_| ServerError::BadRequest("invalid x-user-id header".to_string()))?;

    Uuid::parse_str(text)
        .map_err(|_| ServerError::BadRequest("x-user-id is not a valid UUID".to_string()))
}

fn verify_admin_token(headers: &HeaderMap, config: &ServerConfig) -> Result<(), ServerError> {
    let Some(ref expected) = config.admin_token else {
        return Err(ServerError::Forbidden("admin API disabled".to_string()));
    };

    let provided = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| ServerError::Forbidden("missing admin token".to_string()))?;

    if provided != expected {
        return Err(ServerError::Forbidden("invalid admin token".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn require_user_parses_header() {
        let mut headers = HeaderMap::new();
        let id = Uuid::new_v4();
        headers.insert("x-user-id", HeaderValue::from_str(&id.to_string()).unwrap());
        assert_eq!(require_user(&headers).unwrap(), id);
    }

    #[test]
    fn require_user_rejects_garbage() {
        let mut headers = HeaderMap::new();
        headers.insert("x-user-id", HeaderValue::from_static("not-a-uuid"));
        assert!(require_user(&headers).is_err());
        assert!(require_user(&HeaderMap::new()).is_err());
    }

    #[test]
    fn admin_token_checks() {
        let config = ServerConfig {
            admin_token: Some("secret".to_string()),
            ..ServerConfig::default()
        };

        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer secret"));
        assert!(verify_admin_token(&headers, &config).is_ok());

        headers.insert("authorization", HeaderValue::from_static("Bearer wrong"));
        assert!(verify_admin_token(&headers, &config).is_err());

        let disabled = ServerConfig::default();
        assert!(verify_admin_token(&headers, &disabled).is_err());
    }
}
