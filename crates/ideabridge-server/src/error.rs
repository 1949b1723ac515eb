use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ideabridge_core::CoreError;
use ideabridge_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ServerError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ServerError::Forbidden(_) => (StatusCode::FORBIDDEN, self.to_string()),
            ServerError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = serde_json::json!({
            "error": message,
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<CoreError> for ServerError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::Store(StoreError::NotFound) => {
                ServerError::NotFound("record not found".to_string())
            }
            CoreError::IdeaNotFound(id) => ServerError::NotFound(format!("idea {id}")),
            CoreError::Forbidden => {
                ServerError::Forbidden("requires expert or admin role".to_string())
            }
            CoreError::Store(other) => ServerError::Internal(other.to_string()),
        }
    }
}

impl From<StoreError> for ServerError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => ServerError::NotFound("record not found".to_string()),
            other => ServerError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn core_not_found_maps_to_404() {
        let err: ServerError = CoreError::IdeaNotFound(Uuid::new_v4()).into();
        assert!(matches!(err, ServerError::NotFound(_)));

        let err: ServerError = CoreError::Store(StoreError::NotFound).into();
        assert!(matches!(err, ServerError::NotFound(_)));
    }

    #[test]
    fn forbidden_maps_to_forbidden() {
        let err: ServerError = CoreError::Forbidden.into();
        assert!(matches!(err, ServerError::Forbidden(_)));
    }
}
