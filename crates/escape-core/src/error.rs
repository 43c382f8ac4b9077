//! Unified Error Model
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EscapeError {
    #[error("SERIALIZE/{0}")]
    Serialize(String),

    #[error("CONFLICT/expected version {expected}, found {found}")]
    Conflict { expected: u64, found: u64 },

    #[error("STORE/{0}")]
    Store(String),
}

impl From<serde_json::Error> for EscapeError {
    fn from(err: serde_json::Error) -> Self {
        EscapeError::Serialize(err.to_string())
    }
}
