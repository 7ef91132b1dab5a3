//! In-memory conversation history.
//!
//! `ConversationMemory` is the single source of truth handed to the
//! gateway on every inference call. It is mutated only by appends from
//! the agent loop during a turn and serialized wholesale by the session
//! store.

use serde::{Deserialize, Serialize};

use crate::message::{Message, Role, ToolCallRequest};

/// Default cap on retained messages, preventing unbounded growth.
pub const DEFAULT_MAX_MESSAGES: usize = 100;

fn default_max_messages() -> usize {
    DEFAULT_MAX_MESSAGES
}

/// Ordered, append-only log of conversation turns for one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMemory {
    #[serde(default)]
    system_prompt: Option<String>,
    #[serde(default)]
    messages: Vec<Message>,
    #[serde(default = "default_max_messages")]
    max_messages: usize,
}

impl Default for ConversationMemory {
    fn default() -> Self {
        Self {
            system_prompt: None,
            messages: Vec::new(),
            max_messages: DEFAULT_MAX_MESSAGES,
        }
    }
}

impl ConversationMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the system prompt for the conversation.
    pub fn set_system_prompt(&mut self, prompt: impl Into<String>) {
        self.system_prompt = Some(prompt.into());
    }

    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref()
    }

    /// Append a user message.
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.push(Message::user(content));
    }

    /// Append a plain assistant message.
    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.push(Message::assistant(content));
    }

    /// Append an assistant message carrying tool-call requests.
    pub fn push_assistant_with_calls(
        &mut self,
        content: impl Into<String>,
        tool_calls: Vec<ToolCallRequest>,
    ) {
        self.push(Message::assistant_with_calls(content, tool_calls));
    }

    /// Append a tool-result message answering the given call id.
    pub fn push_tool_result(
        &mut self,
        content: impl Into<String>,
        tool_call_id: impl Into<String>,
    ) {
        self.push(Message::tool_result(content, tool_call_id));
    }

    /// Append a message, trimming the oldest if the cap is exceeded.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
        if self.messages.len() > self.max_messages {
            let excess = self.messages.len() - self.max_messages;
            self.messages.drain(..excess);
        }
    }

    /// Read-only snapshot of the ordered message sequence.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// First user message, used by the session store to derive a title.
    pub fn first_user_content(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }

    /// Clear all messages. Keeps the system prompt.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_appends_preserve_order() {
        let mut memory = ConversationMemory::new();
        memory.push_user("question");
        memory.push_assistant("answer");
        memory.push_tool_result("37.5", "call_1");

        let roles: Vec<Role> = memory.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::Tool]);
    }

    #[test]
    fn test_trim_drops_oldest_beyond_cap() {
        let mut memory = ConversationMemory {
            max_messages: 3,
            ..Default::default()
        };
        for i in 0..5 {
            memory.push_user(format!("message {i}"));
        }

        assert_eq!(memory.len(), 3);
        assert_eq!(memory.messages()[0].content, "message 2");
        assert_eq!(memory.last_message().unwrap().content, "message 4");
    }

    #[test]
    fn test_clear_keeps_system_prompt() {
        let mut memory = ConversationMemory::new();
        memory.set_system_prompt("be helpful");
        memory.push_user("hi");
        memory.clear();

        assert!(memory.is_empty());
        assert_eq!(memory.system_prompt(), Some("be helpful"));
    }

    #[test]
    fn test_serde_roundtrip_identical_sequence() {
        let mut memory = ConversationMemory::new();
        memory.set_system_prompt("be helpful");
        memory.push_user("What's 15% of 250?");
        memory.push_assistant_with_calls(
            "",
            vec![crate::message::ToolCallRequest::with_id(
                "call_1",
                "calculator",
                serde_json::Map::new(),
            )],
        );
        memory.push_tool_result("37.5", "call_1");
        memory.push_assistant("The result is 37.5");

        let encoded = serde_json::to_string(&memory).unwrap();
        let decoded: ConversationMemory = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.messages(), memory.messages());
        assert_eq!(decoded.system_prompt(), memory.system_prompt());
    }
}
