//! Tool capability interface: schemas, results, registry, and dispatch.
//!
//! A tool exposes a declarative [`ToolSchema`] and an async `execute`
//! capability. Concrete tool implementations (math evaluation, file
//! listing, HTTP lookups) live outside this crate and only need to
//! satisfy the [`Tool`] trait.

mod dispatcher;
mod registry;

pub use dispatcher::ToolDispatcher;
pub use registry::ToolRegistry;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Primitive type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    String,
    Integer,
    Number,
    Boolean,
}

impl ParamKind {
    /// Check a JSON value against this primitive type.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ParamKind::String => value.is_string(),
            ParamKind::Integer => value.is_i64() || value.is_u64(),
            ParamKind::Number => value.is_number(),
            ParamKind::Boolean => value.is_boolean(),
        }
    }

    fn json_type(&self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Integer => "integer",
            ParamKind::Number => "number",
            ParamKind::Boolean => "boolean",
        }
    }
}

impl std::fmt::Display for ParamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.json_type())
    }
}

/// One named parameter in a tool's schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    pub kind: ParamKind,
    pub description: String,
    pub required: bool,
}

impl ParameterSpec {
    pub fn required(name: impl Into<String>, kind: ParamKind, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            description: description.into(),
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>, kind: ParamKind, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            description: description.into(),
            required: false,
        }
    }
}

/// Declarative description of a tool, registered once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ParameterSpec>,
}

impl ToolSchema {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Vec<ParameterSpec>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    /// Render the function-call JSON shape handed to the model backend.
    pub fn to_wire(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for param in &self.parameters {
            properties.insert(
                param.name.clone(),
                json!({
                    "type": param.kind.json_type(),
                    "description": param.description,
                }),
            );
            if param.required {
                required.push(Value::String(param.name.clone()));
            }
        }

        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": {
                    "type": "object",
                    "properties": properties,
                    "required": required,
                },
            },
        })
    }
}

/// Outcome of executing one tool-call request.
///
/// Exactly one result exists per request, even on timeout or panic; the
/// dispatcher never drops a request silently.
#[derive(Debug, Clone)]
pub struct ToolResult {
    pub success: bool,
    pub data: Option<String>,
    pub error: Option<String>,
    pub duration: Duration,
}

impl ToolResult {
    pub fn ok(data: impl Into<String>, duration: Duration) -> Self {
        Self {
            success: true,
            data: Some(data.into()),
            error: None,
            duration,
        }
    }

    pub fn fail(error: impl Into<String>, duration: Duration) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            duration,
        }
    }

    /// Render the result as the message content fed back to the model.
    pub fn to_message(&self) -> String {
        if self.success {
            match &self.data {
                Some(data) => data.clone(),
                None => "Operation completed successfully.".to_string(),
            }
        } else {
            format!("Error: {}", self.error.as_deref().unwrap_or("unknown"))
        }
    }
}

/// Capability interface implemented by every tool.
///
/// `execute` must be safe to call concurrently with other tools'
/// `execute`; the dispatcher runs independent calls in parallel.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Declarative schema for this tool.
    fn schema(&self) -> ToolSchema;

    /// Run the tool with validated arguments. Errors are converted into
    /// failed [`ToolResult`]s by the dispatcher, never propagated.
    async fn execute(&self, arguments: &Map<String, Value>) -> crate::Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_kind_matching() {
        assert!(ParamKind::String.matches(&json!("abc")));
        assert!(!ParamKind::String.matches(&json!(42)));
        assert!(ParamKind::Integer.matches(&json!(42)));
        assert!(!ParamKind::Integer.matches(&json!(4.2)));
        assert!(ParamKind::Number.matches(&json!(4.2)));
        assert!(ParamKind::Number.matches(&json!(42)));
        assert!(ParamKind::Boolean.matches(&json!(true)));
    }

    #[test]
    fn test_wire_format_shape() {
        let schema = ToolSchema::new(
            "calculator",
            "Evaluate arithmetic expressions",
            vec![
                ParameterSpec::required("expression", ParamKind::String, "Expression to evaluate"),
                ParameterSpec::optional("precision", ParamKind::Integer, "Decimal places"),
            ],
        );

        let wire = schema.to_wire();
        assert_eq!(wire["type"], "function");
        assert_eq!(wire["function"]["name"], "calculator");
        assert_eq!(
            wire["function"]["parameters"]["properties"]["expression"]["type"],
            "string"
        );
        assert_eq!(
            wire["function"]["parameters"]["required"],
            json!(["expression"])
        );
    }

    #[test]
    fn test_result_to_message() {
        let ok = ToolResult::ok("37.5", Duration::from_millis(3));
        assert_eq!(ok.to_message(), "37.5");

        let fail = ToolResult::fail("timeout", Duration::from_secs(5));
        assert_eq!(fail.to_message(), "Error: timeout");
    }
}
