//! Error types for ReelForge

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum RfError {
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(u8),

    #[error("Invalid parameter: {0}")]
    InvalidParam(String),

    #[error("Codec error: {0}")]
    Codec(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("State error: {0}")]
    State(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RfError {
    /// Shorthand for [`RfError::InvalidParam`]
    pub fn invalid_param(msg: impl Into<String>) -> Self {
        Self::InvalidParam(msg.into())
    }

    /// True for errors that only invalidate a single generation attempt
    pub fn is_task_local(&self) -> bool {
        matches!(self, Self::InvalidSymbol(_) | Self::Generation(_))
    }
}

/// Result type alias
pub type RfResult<T> = Result<T, RfError>;
