//! Prata - Tool-Calling Agent Core
//!
//! The agent loop and tool-dispatch subsystem of a conversational
//! assistant. Prata sends conversation state to a language-model
//! backend, interprets structured tool-call requests in the response,
//! executes the requested tools with validated arguments, feeds the
//! results back into the conversation, and repeats until the model
//! produces a final answer.
//!
//! The name "Prata" comes from the Norwegian/Scandinavian word for
//! "talk."
//!
//! # Architecture
//!
//! - `message` - Conversation message data model
//! - `memory` - Append-only conversation log
//! - `tools` - Tool trait, schemas, registry, and dispatcher
//! - `gateway` - LLM backend abstraction
//! - `agent` - The agent loop state machine
//! - `session` - Persistent session store
//! - `config` - Configuration management
//!
//! Concrete tools and model backends live outside this crate; they plug
//! in through the [`tools::Tool`] and [`gateway::LlmGateway`] traits.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use prata::agent::Agent;
//! use prata::config::Settings;
//! use prata::gateway::LlmGateway;
//! use prata::tools::{ToolDispatcher, ToolRegistry};
//!
//! # async fn example(backend: Arc<dyn LlmGateway>) -> prata::Result<()> {
//! let settings = Settings::load()?;
//! let registry = Arc::new(ToolRegistry::new());
//! let dispatcher = ToolDispatcher::new(registry).with_timeout(settings.tools.timeout());
//!
//! let mut agent = Agent::from_settings(backend, dispatcher, &settings);
//! let response = agent.run("What's 15% of 250?").await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod config;
pub mod error;
pub mod gateway;
pub mod memory;
pub mod message;
pub mod session;
pub mod tools;

pub use error::{AssistantError, Result};
