//! Agent loop: the think → act → observe cycle.
//!
//! The [`Agent`] owns a conversation memory, sends it to the LLM gateway
//! together with the registered tool schemas, dispatches any tool calls
//! the model requests, feeds the results back, and repeats until the
//! model produces a final answer or a loop bound trips.

mod runner;

pub use runner::{Agent, AgentResponse, DEFAULT_SYSTEM_PROMPT};
