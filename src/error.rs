//! Error types for Prata.

use thiserror::Error;

use crate::gateway::GatewayError;

/// Library-level error type for Prata operations.
///
/// Tool-level failures (unknown tool, bad arguments, timeout, execution
/// failure) are not represented here: the dispatcher converts them into
/// failed [`crate::tools::ToolResult`]s that flow back to the model as
/// data instead of terminating the loop.
#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Tool already registered: {0}")]
    DuplicateTool(String),

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Agent exceeded maximum iterations ({0})")]
    MaxIterationsExceeded(usize),

    #[error("Turn timed out after {0} seconds")]
    TurnTimeout(u64),

    #[error("Run cancelled")]
    Cancelled,

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Session store error: {0}")]
    SessionStore(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Result type alias for Prata operations.
pub type Result<T> = std::result::Result<T, AssistantError>;
