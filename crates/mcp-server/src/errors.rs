//! Maps [`CoreError`] onto the structured MCP error shape (spec §7:
//! "a stable machine-readable code and a human-readable message").

use serde::Serialize;
use shared::error::CoreError;

#[derive(Debug, Serialize)]
pub struct McpError {
    pub code: &'static str,
    pub message: String,
}

impl From<CoreError> for McpError {
    fn from(err: CoreError) -> Self {
        Self {
            code: err.code(),
            message: err.message(),
        }
    }
}

pub fn invalid_argument(message: impl Into<String>) -> CoreError {
    CoreError::InvalidArgument(message.into())
}
