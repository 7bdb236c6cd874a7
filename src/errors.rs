use recur_config::ConfigError;
use recur_core::CoreError;
use thiserror::Error;

/// Error surface of the engine facade.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Invalid input: {0}")]
    Invalid(String),
}

impl EngineError {
    /// True when the error names an item that does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, EngineError::Core(CoreError::ItemNotFound(_)))
    }
}
