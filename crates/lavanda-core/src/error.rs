use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackError {
    #[error("no next state from '{from}'")]
    NoNextState { from: String },

    #[error("no prior state to return to")]
    NoPriorState,

    #[error("invalid state for this operation: expected '{expected}', found '{actual}'")]
    InvalidState { expected: String, actual: String },

    #[error("verification code does not match")]
    CodeMismatch,

    #[error("order not found: {0}")]
    OrderNotFound(String),

    #[error("tracking record not found: {0}")]
    TrackingNotFound(String),

    #[error("tracking record already exists: {0}")]
    TrackingExists(String),

    #[error("invalid state name: {0}")]
    InvalidStateName(String),

    #[error("config not found at {0}")]
    ConfigNotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, TrackError>;
