use thiserror::Error;
use uuid::Uuid;

/// Errors produced by the core services.
///
/// Soft-fail cases (no rule for an action, unknown user in an award) are not
/// errors; they surface as `None`/empty results instead.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Persistence failure, including typed `NotFound` signals.
    #[error("Store error: {0}")]
    Store(#[from] ideabridge_store::StoreError),

    /// A domain event referenced an idea that does not exist.
    #[error("Idea not found: {0}")]
    IdeaNotFound(Uuid),

    /// The caller's role does not permit the operation.
    #[error("Operation requires expert or admin role")]
    Forbidden,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CoreError>;
