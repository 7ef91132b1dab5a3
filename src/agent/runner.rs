//! Agent runner with tool calling loop.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::Settings;
use crate::error::{AssistantError, Result};
use crate::gateway::{LlmGateway, Outcome};
use crate::memory::ConversationMemory;
use crate::tools::{ToolDispatcher, ToolResult};

/// Default system prompt for the agent.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are a helpful assistant with access to a set of tools.

Think step-by-step about what information you need, then use the appropriate tools.
When a tool fails, read its error message and either retry with corrected arguments or explain the problem.
When you have gathered enough information, provide your final answer directly.
Keep answers concise and cite tool results where relevant."#;

const FALLBACK_ANSWER: &str = "I don't have a response.";

/// Orchestrates one conversation: gateway calls, tool dispatch, and the
/// append-only memory that ties them together.
///
/// A single `Agent` runs one turn at a time; the memory it owns is never
/// mutated concurrently. On a failed turn the memory keeps everything
/// committed before the failure point, so callers can inspect partial
/// progress through [`Agent::memory`].
pub struct Agent {
    gateway: Arc<dyn LlmGateway>,
    dispatcher: ToolDispatcher,
    memory: ConversationMemory,
    max_iterations: usize,
    gateway_retries: usize,
    retry_backoff: Duration,
    turn_timeout: Option<Duration>,
    cancel: CancellationToken,
}

impl Agent {
    /// Create a new agent with default loop bounds.
    pub fn new(gateway: Arc<dyn LlmGateway>, dispatcher: ToolDispatcher) -> Self {
        let mut memory = ConversationMemory::new();
        memory.set_system_prompt(DEFAULT_SYSTEM_PROMPT);

        Self {
            gateway,
            dispatcher,
            memory,
            max_iterations: 10,
            gateway_retries: 3,
            retry_backoff: Duration::from_millis(500),
            turn_timeout: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Create an agent configured from settings.
    pub fn from_settings(
        gateway: Arc<dyn LlmGateway>,
        dispatcher: ToolDispatcher,
        settings: &Settings,
    ) -> Self {
        Self::new(gateway, dispatcher)
            .with_max_iterations(settings.agent.max_iterations)
            .with_gateway_retries(settings.agent.gateway_retries, settings.agent.retry_backoff())
            .with_turn_timeout(settings.agent.turn_timeout())
    }

    /// Set maximum model ⇄ tool cycles per turn.
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    /// Set retry bound and base backoff for transient gateway errors.
    pub fn with_gateway_retries(mut self, retries: usize, backoff: Duration) -> Self {
        self.gateway_retries = retries;
        self.retry_backoff = backoff;
        self
    }

    /// Set an optional wall-clock limit for a whole turn.
    pub fn with_turn_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.turn_timeout = timeout;
        self
    }

    /// Set a custom system prompt.
    pub fn with_system_prompt(mut self, prompt: &str) -> Self {
        self.memory.set_system_prompt(prompt);
        self
    }

    /// Token for cooperative cancellation. Cancelling takes effect at
    /// the next suspension point (gateway call or tool dispatch) and
    /// leaves memory in its last committed state.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Process a user message and return the agent's final answer.
    pub async fn run(&mut self, user_message: &str) -> Result<AgentResponse> {
        match self.turn_timeout {
            Some(limit) => match tokio::time::timeout(limit, self.run_turn(user_message)).await {
                Ok(result) => result,
                Err(_) => Err(AssistantError::TurnTimeout(limit.as_secs())),
            },
            None => self.run_turn(user_message).await,
        }
    }

    async fn run_turn(&mut self, user_message: &str) -> Result<AgentResponse> {
        self.memory.push_user(user_message);

        let mut tool_calls_made = Vec::new();
        let mut iterations = 0;

        loop {
            iterations += 1;
            if iterations > self.max_iterations {
                warn!("Max iterations ({}) reached", self.max_iterations);
                return Err(AssistantError::MaxIterationsExceeded(self.max_iterations));
            }

            debug!("Agent loop iteration {}", iterations);

            match self.complete_with_retry().await? {
                Outcome::FinalAnswer(content) => {
                    let content = if content.is_empty() {
                        FALLBACK_ANSWER.to_string()
                    } else {
                        content
                    };
                    self.memory.push_assistant(content.clone());

                    return Ok(AgentResponse {
                        content,
                        tool_calls_made,
                        iterations,
                    });
                }

                Outcome::ToolCalls { content, requests } => {
                    // The assistant message carrying the calls is
                    // committed before any result, so the tool_call_id
                    // back-references always land after their request.
                    self.memory.push_assistant_with_calls(content, requests.clone());

                    for request in &requests {
                        info!("Agent calling tool: {} (call id {})", request.name, request.id);
                    }

                    let results = tokio::select! {
                        _ = self.cancel.cancelled() => None,
                        results = self.dispatcher.dispatch_all(&requests) => Some(results),
                    };

                    // Cancellation mid-dispatch still answers every
                    // pending call: the committed assistant message must
                    // not leave dangling tool_calls in memory.
                    let Some(results) = results else {
                        for request in &requests {
                            self.memory.push_tool_result(
                                ToolResult::fail("cancelled", Duration::ZERO).to_message(),
                                request.id.clone(),
                            );
                        }
                        return Err(AssistantError::Cancelled);
                    };

                    for (request, result) in requests.iter().zip(&results) {
                        tool_calls_made.push(request.name.clone());
                        self.memory
                            .push_tool_result(result.to_message(), request.id.clone());
                    }
                }
            }
        }
    }

    /// Call the gateway, retrying transient errors with exponential
    /// backoff up to the configured bound.
    async fn complete_with_retry(&self) -> Result<Outcome> {
        let schemas = self.dispatcher.schemas();
        let mut attempt = 0;

        loop {
            if self.cancel.is_cancelled() {
                return Err(AssistantError::Cancelled);
            }

            let result = tokio::select! {
                _ = self.cancel.cancelled() => return Err(AssistantError::Cancelled),
                result = self.gateway.complete(&self.memory, &schemas) => result,
            };

            match result {
                Ok(outcome) => return Ok(outcome),
                Err(err) if err.is_transient() && attempt < self.gateway_retries => {
                    attempt += 1;
                    let backoff = retry_delay(self.retry_backoff, attempt);
                    warn!(
                        "Transient gateway error (attempt {}/{}): {}; retrying in {:?}",
                        attempt, self.gateway_retries, err, backoff
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(err) => {
                    error!("Gateway error: {}", err);
                    return Err(err.into());
                }
            }
        }
    }

    /// Clear conversation memory. Keeps the system prompt.
    pub fn clear_memory(&mut self) {
        self.memory.clear();
    }

    /// Get the conversation memory.
    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    /// Replace the conversation memory (e.g., after loading a session).
    /// Installs the default system prompt when the loaded memory has
    /// none.
    pub fn set_memory(&mut self, memory: ConversationMemory) {
        self.memory = memory;
        if self.memory.system_prompt().is_none() {
            self.memory.set_system_prompt(DEFAULT_SYSTEM_PROMPT);
        }
    }
}

/// Exponential backoff for the given retry attempt (1-based). The
/// exponent is capped: the retry bound is user configuration, so large
/// values must not overflow the multiplier.
fn retry_delay(base: Duration, attempt: usize) -> Duration {
    let exponent = attempt.saturating_sub(1).min(16) as u32;
    base.saturating_mul(2u32.saturating_pow(exponent))
}

/// Response from a completed agent turn.
#[derive(Debug)]
pub struct AgentResponse {
    /// The final answer text from the model.
    pub content: String,
    /// Names of the tools called during the turn, in call order.
    pub tool_calls_made: Vec<String>,
    /// Number of gateway calls (loop iterations) used.
    pub iterations: usize,
}
