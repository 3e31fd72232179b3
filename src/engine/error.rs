use ulid::Ulid;

use super::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("conflict with booking: {0}")]
    Conflict(Ulid),
    #[error("not found: {0}")]
    NotFound(Ulid),
    #[error("phone does not match booking: {0}")]
    Forbidden(Ulid),
    #[error("booking {0} has already started and can no longer be cancelled")]
    TooLate(Ulid),
    #[error("privileged access required")]
    Unauthorized,
    #[error("limit exceeded: {0}")]
    LimitExceeded(&'static str),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EngineError {
    /// Stable short code for the service layer and metrics labels.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Validation(_) => "missing_fields",
            EngineError::Conflict(_) => "conflict",
            EngineError::NotFound(_) => "not_found",
            EngineError::Forbidden(_) => "phone_mismatch",
            EngineError::TooLate(_) => "too_late",
            EngineError::Unauthorized => "unauthorized",
            EngineError::LimitExceeded(_) => "limit_exceeded",
            EngineError::Store(_) => "store_error",
        }
    }
}
