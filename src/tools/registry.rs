//! Registry of available tools, keyed by schema name.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::{Tool, ToolSchema};
use crate::error::{AssistantError, Result};

/// Holds the set of available tools in registration order.
///
/// Registration happens once at process start; after the agent loop
/// starts the registry is read-only and safe to share behind an `Arc`
/// without locking.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under its declared schema name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let name = tool.schema().name;
        if self.index.contains_key(&name) {
            return Err(AssistantError::DuplicateTool(name));
        }
        debug!("Registered tool: {}", name);
        self.index.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Result<Arc<dyn Tool>> {
        self.index
            .get(name)
            .map(|&i| Arc::clone(&self.tools[i]))
            .ok_or_else(|| AssistantError::ToolNotFound(name.to_string()))
    }

    /// All schemas, in registration order. This exact order and set is
    /// handed to the gateway on every call.
    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.tools.iter().map(|t| t.schema()).collect()
    }

    /// Registered tool names, in registration order.
    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.schema().name).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
