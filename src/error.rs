use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("technician {0} not found")]
    UnknownTechnician(Uuid),

    #[error("job {0} not found")]
    UnknownJob(Uuid),

    #[error("suggestion {0} not found")]
    UnknownSuggestion(Uuid),

    #[error("internal error: {0}")]
    Internal(String),
}
