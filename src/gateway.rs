//! LLM gateway abstraction.
//!
//! The gateway turns the current conversation plus the available tool
//! schemas into either a final answer or a batch of tool-call requests.
//! Concrete backends (Ollama, OpenAI-compatible servers) live outside
//! this crate and only need to implement [`LlmGateway`].

use async_trait::async_trait;
use thiserror::Error;

use crate::memory::ConversationMemory;
use crate::message::ToolCallRequest;
use crate::tools::ToolSchema;

/// Gateway failure, classified for retry handling.
///
/// Transient errors (network failures, backend timeouts, rate limits)
/// are retried by the agent loop up to a configured bound; permanent
/// errors (malformed responses, auth failures) fail the turn
/// immediately.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("transient backend error: {0}")]
    Transient(String),

    #[error("permanent backend error: {0}")]
    Permanent(String),
}

impl GatewayError {
    pub fn is_transient(&self) -> bool {
        matches!(self, GatewayError::Transient(_))
    }
}

/// Result of one inference call.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The model produced its final answer.
    FinalAnswer(String),
    /// The model wants tools run before answering. `content` carries any
    /// partial assistant text alongside the calls (often empty).
    ToolCalls {
        content: String,
        requests: Vec<ToolCallRequest>,
    },
}

/// Capability interface for a language-model backend.
///
/// The shared reference to memory makes the no-mutation contract
/// structural: the gateway can only read the conversation it is given.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    async fn complete(
        &self,
        memory: &ConversationMemory,
        tools: &[ToolSchema],
    ) -> std::result::Result<Outcome, GatewayError>;
}
