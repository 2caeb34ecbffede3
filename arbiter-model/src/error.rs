use std::fmt::{self, Display};

/// Errors produced by model constructors and validation routines.
#[derive(Debug)]
pub enum ModelError {
    InvalidConfiguration(String),
    InvalidDecision(String),
}

impl Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::InvalidConfiguration(msg) => write!(f, "invalid configuration: {msg}"),
            ModelError::InvalidDecision(msg) => write!(f, "invalid scheduling decision: {msg}"),
        }
    }
}

impl std::error::Error for ModelError {}

/// Convenience alias for model-level fallible constructors.
pub type Result<T> = std::result::Result<T, ModelError>;
