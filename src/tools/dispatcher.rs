//! Tool dispatcher: validation, bounded execution, result envelopes.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::{ToolRegistry, ToolResult, ToolSchema};
use crate::message::ToolCallRequest;

/// Default time budget for a single tool execution.
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(5);

/// Routes tool-call requests to registered tools.
///
/// Every failure mode (unknown tool, invalid arguments, timeout, tool
/// error, panic) is converted into a failed [`ToolResult`]; dispatch
/// never lets a tool failure escape into the agent loop.
#[derive(Clone)]
pub struct ToolDispatcher {
    registry: Arc<ToolRegistry>,
    timeout: Duration,
}

impl ToolDispatcher {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }

    /// Set the per-tool execution time budget.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// All tool schemas in registration order, for the gateway.
    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.registry.schemas()
    }

    /// Execute one tool-call request and return its result envelope.
    pub async fn dispatch(&self, request: &ToolCallRequest) -> ToolResult {
        let started = Instant::now();

        let tool = match self.registry.get(&request.name) {
            Ok(tool) => tool,
            Err(_) => {
                warn!("Unknown tool requested: {}", request.name);
                return ToolResult::fail("unknown tool", started.elapsed());
            }
        };

        let schema = tool.schema();
        if let Err(message) = validate_arguments(&schema, &request.arguments) {
            debug!("Argument validation failed for {}: {}", request.name, message);
            return ToolResult::fail(message, started.elapsed());
        }

        debug!("Executing tool: {} (call id {})", request.name, request.id);

        // Run the tool body on its own task so a panic is contained as a
        // JoinError instead of unwinding through the loop.
        let arguments = request.arguments.clone();
        let mut task = AbortOnDrop(tokio::spawn(async move { tool.execute(&arguments).await }));

        let result = match tokio::time::timeout(self.timeout, &mut task.0).await {
            Err(_) => {
                // Stop the body too: a timed-out tool must not keep
                // performing side effects after its result is reported.
                task.0.abort();
                ToolResult::fail("timeout", started.elapsed())
            }
            Ok(Err(join_err)) => {
                warn!("Tool {} panicked: {}", request.name, join_err);
                ToolResult::fail(format!("tool panicked: {join_err}"), started.elapsed())
            }
            Ok(Ok(Err(tool_err))) => ToolResult::fail(tool_err.to_string(), started.elapsed()),
            Ok(Ok(Ok(data))) => ToolResult::ok(data, started.elapsed()),
        };

        debug!(
            "Tool {} finished: success={} in {:?}",
            request.name, result.success, result.duration
        );
        result
    }

    /// Execute many requests concurrently, returning results in request
    /// order regardless of completion order.
    pub async fn dispatch_all(&self, requests: &[ToolCallRequest]) -> Vec<ToolResult> {
        join_all(requests.iter().map(|request| self.dispatch(request))).await
    }
}

/// Aborts the spawned tool task when dropped, so a dispatch future that
/// is itself dropped (e.g. on cancellation) does not leave the tool body
/// running detached.
struct AbortOnDrop<T>(tokio::task::JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Check an argument mapping against a schema: required keys present,
/// declared types matched. Extra keys are passed through untouched.
fn validate_arguments(
    schema: &ToolSchema,
    arguments: &Map<String, Value>,
) -> std::result::Result<(), String> {
    for param in &schema.parameters {
        match arguments.get(&param.name) {
            None if param.required => {
                return Err(format!("missing required argument '{}'", param.name));
            }
            None => {}
            Some(value) => {
                if !param.kind.matches(value) {
                    return Err(format!(
                        "argument '{}' must be a {}, got {}",
                        param.name, param.kind, value
                    ));
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{ParamKind, ParameterSpec, Tool};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct EchoTool {
        invocations: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Tool for EchoTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema::new(
                "echo",
                "Echo the input back",
                vec![ParameterSpec::required(
                    "text",
                    ParamKind::String,
                    "Text to echo",
                )],
            )
        }

        async fn execute(&self, arguments: &Map<String, Value>) -> crate::Result<String> {
            self.invocations.fetch_add(1, Ordering::SeqCst);
            Ok(arguments["text"].as_str().unwrap_or_default().to_string())
        }
    }

    /// Sleeps for a configurable delay before answering, for ordering
    /// tests.
    struct SleepTool {
        name: &'static str,
        delay: Duration,
    }

    #[async_trait]
    impl Tool for SleepTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema::new(self.name, "Sleep then answer", vec![])
        }

        async fn execute(&self, _arguments: &Map<String, Value>) -> crate::Result<String> {
            tokio::time::sleep(self.delay).await;
            Ok(self.name.to_string())
        }
    }

    struct FailingTool;

    #[async_trait]
    impl Tool for FailingTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema::new("broken", "Always fails", vec![])
        }

        async fn execute(&self, _arguments: &Map<String, Value>) -> crate::Result<String> {
            Err(crate::AssistantError::Config("disk on fire".to_string()))
        }
    }

    fn dispatcher_with(tools: Vec<Arc<dyn Tool>>) -> ToolDispatcher {
        let mut registry = ToolRegistry::new();
        for tool in tools {
            registry.register(tool).unwrap();
        }
        ToolDispatcher::new(Arc::new(registry))
    }

    fn args(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_unknown_tool_yields_failed_result() {
        let dispatcher = dispatcher_with(vec![]);
        let request = ToolCallRequest::new("missing", Map::new());

        let result = dispatcher.dispatch(&request).await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("unknown tool"));
    }

    #[tokio::test]
    async fn test_missing_required_argument_skips_tool_body() {
        let invocations = Arc::new(AtomicUsize::new(0));
        let dispatcher = dispatcher_with(vec![Arc::new(EchoTool {
            invocations: Arc::clone(&invocations),
        })]);

        let request = ToolCallRequest::new("echo", Map::new());
        let result = dispatcher.dispatch(&request).await;

        assert!(!result.success);
        assert!(result.error.unwrap().contains("missing required argument"));
        assert_eq!(invocations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_type_mismatch_skips_tool_body() {
        let invocations = Arc::new(AtomicUsize::new(0));
        let dispatcher = dispatcher_with(vec![Arc::new(EchoTool {
            invocations: Arc::clone(&invocations),
        })]);

        let request = ToolCallRequest::new("echo", args(&[("text", json!(42))]));
        let result = dispatcher.dispatch(&request).await;

        assert!(!result.success);
        assert!(result.error.unwrap().contains("must be a string"));
        assert_eq!(invocations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_successful_dispatch() {
        let dispatcher = dispatcher_with(vec![Arc::new(EchoTool {
            invocations: Arc::new(AtomicUsize::new(0)),
        })]);

        let request = ToolCallRequest::new("echo", args(&[("text", json!("hello"))]));
        let result = dispatcher.dispatch(&request).await;

        assert!(result.success);
        assert_eq!(result.data.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn test_tool_error_becomes_failed_result() {
        let dispatcher = dispatcher_with(vec![Arc::new(FailingTool)]);

        let request = ToolCallRequest::new("broken", Map::new());
        let result = dispatcher.dispatch(&request).await;

        assert!(!result.success);
        assert!(result.error.unwrap().contains("disk on fire"));
    }

    #[tokio::test]
    async fn test_timeout_yields_timeout_error() {
        let dispatcher = dispatcher_with(vec![Arc::new(SleepTool {
            name: "slow",
            delay: Duration::from_secs(60),
        })])
        .with_timeout(Duration::from_millis(20));

        let request = ToolCallRequest::new("slow", Map::new());
        let result = dispatcher.dispatch(&request).await;

        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("timeout"));
    }

    #[tokio::test]
    async fn test_timeout_aborts_tool_body() {
        struct LingeringTool {
            completed: Arc<AtomicBool>,
        }

        #[async_trait]
        impl Tool for LingeringTool {
            fn schema(&self) -> ToolSchema {
                ToolSchema::new("lingering", "Sleeps past its budget", vec![])
            }

            async fn execute(&self, _arguments: &Map<String, Value>) -> crate::Result<String> {
                tokio::time::sleep(Duration::from_millis(100)).await;
                self.completed.store(true, Ordering::SeqCst);
                Ok("too late".to_string())
            }
        }

        let completed = Arc::new(AtomicBool::new(false));
        let dispatcher = dispatcher_with(vec![Arc::new(LingeringTool {
            completed: Arc::clone(&completed),
        })])
        .with_timeout(Duration::from_millis(10));

        let request = ToolCallRequest::new("lingering", Map::new());
        let result = dispatcher.dispatch(&request).await;

        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("timeout"));

        // The body was aborted along with the task; it must not finish
        // its work after the result was reported.
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(!completed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_results_keep_request_order_with_slow_tool_first() {
        let dispatcher = dispatcher_with(vec![
            Arc::new(SleepTool {
                name: "slow",
                delay: Duration::from_millis(80),
            }),
            Arc::new(SleepTool {
                name: "fast",
                delay: Duration::from_millis(1),
            }),
        ]);

        let requests = vec![
            ToolCallRequest::new("slow", Map::new()),
            ToolCallRequest::new("fast", Map::new()),
        ];
        let results = dispatcher.dispatch_all(&requests).await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].data.as_deref(), Some("slow"));
        assert_eq!(results[1].data.as_deref(), Some("fast"));
    }
}
