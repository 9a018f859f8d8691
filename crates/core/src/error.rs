use crate::types::DbId;

/// Domain-level errors shared by the store, pipeline and API crates.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    /// Caller-supplied input is malformed.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The record is not in a state that allows the requested operation
    /// (e.g. regenerating a campaign that never finished research).
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// The operation collides with work already in progress.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for a missing campaign record.
    pub fn campaign_not_found(id: DbId) -> Self {
        Self::NotFound {
            entity: "Campaign",
            id,
        }
    }
}
