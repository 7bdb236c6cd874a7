use recur_domain::{ItemError, RuleError};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Recurring item not found: {0}")]
    ItemNotFound(Uuid),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Transaction sink error: {0}")]
    Sink(String),
    #[error("Serialization error: {0}")]
    Serde(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ItemError> for CoreError {
    fn from(err: ItemError) -> Self {
        CoreError::Validation(err.to_string())
    }
}

impl From<RuleError> for CoreError {
    fn from(err: RuleError) -> Self {
        CoreError::Validation(err.to_string())
    }
}
