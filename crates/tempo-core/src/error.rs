use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use crate::recurrence::RuleValidationError;

#[derive(Error, Debug)]
pub enum CoreError {
    /// The store could not be reached or failed the operation.
    #[error("Store unavailable: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("IO error")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid recurrence settings: {0}")]
    InvalidRule(#[from] RuleValidationError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The store rejected an insert because `(template_id, date)` is taken.
    #[error("An instance of template {template_id} already exists on {date}")]
    DuplicateInstance { template_id: Uuid, date: NaiveDate },

    /// A rule stopped moving the generation cursor forward.
    #[error("Recurrence of template {template_id} stopped advancing at {cursor}")]
    SafetyLoopAbort { template_id: Uuid, cursor: NaiveDate },
}

impl CoreError {
    /// Returns true for I/O level failures that the caller may retry.
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, CoreError::Database(_) | CoreError::Io(_))
    }

    /// Returns true for errors raised before any I/O took place.
    pub fn is_validation(&self) -> bool {
        matches!(self, CoreError::InvalidRule(_) | CoreError::InvalidInput(_))
    }
}
