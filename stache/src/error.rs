//! Error types for rendering

use stache_parser::ParseError;
use thiserror::Error;

/// Errors raised while rendering a template
#[derive(Debug, Error)]
pub enum RenderError {
    /// `{{> name}}` named a partial that is not registered
    #[error("The partial {name} could not be found")]
    PartialNotFound { name: String },

    /// A partial registered as source failed to compile on first use
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A helper reported a failure
    #[error("helper `{name}` failed: {message}")]
    Helper { name: String, message: String },

    /// The render context could not be converted to a value
    #[error("failed to convert context: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl RenderError {
    pub fn helper(name: impl Into<String>, message: impl Into<String>) -> Self {
        RenderError::Helper {
            name: name.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RenderError>;
