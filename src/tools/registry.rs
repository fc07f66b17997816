//! Register tools by name; name, description, JSON schema, execute(args) -> ToolResult.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, RwLock};

use serde_json::Value;

use crate::tools::result::ToolResult;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A single tool: name, description, JSON schema for args, and execute.
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters(&self) -> Value;
    fn execute<'a>(&'a self, args: &'a Value) -> BoxFuture<'a, ToolResult>;
}

/// Protocol-facing tool descriptor (name, description, input schema).
#[inline]
pub fn tool_to_spec(tool: &dyn Tool) -> Value {
    serde_json::json!({
        "name": tool.name(),
        "description": tool.description(),
        "inputSchema": tool.parameters(),
    })
}

/// Registry of tools by name. Thread-safe; populated once at startup.
#[derive(Default)]
pub struct ToolRegistry {
    inner: RwLock<HashMap<String, Arc<dyn Tool + Send + Sync>>>,
}

impl ToolRegistry {
    #[inline]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// Register a tool by its name. Overwrites if name already exists.
    pub fn register<T: Tool + Send + Sync + 'static>(&self, tool: T) {
        let name = tool.name().to_string();
        self.inner
            .write()
            .expect("registry lock")
            .insert(name, Arc::new(tool));
    }

    /// Execute tool by name. Returns error result if not found; any tool
    /// failure arrives here as an error result, never a panic.
    pub async fn execute(&self, name: &str, args: &Value) -> ToolResult {
        let tool = {
            let guard = self.inner.read().expect("registry lock");
            guard.get(name).cloned()
        };

        if let Some(tool) = tool {
            tool.execute(args).await
        } else {
            ToolResult::error(format!("tool '{name}' not found"))
        }
    }

    /// All tool descriptors for the protocol catalog, sorted by name.
    pub fn to_specs(&self) -> Vec<Value> {
        let guard = self.inner.read().expect("registry lock");
        let mut tools: Vec<(&String, &Arc<dyn Tool + Send + Sync>)> = guard.iter().collect();
        tools.sort_by_key(|(name, _)| name.as_str());
        tools
            .into_iter()
            .map(|(_, t)| tool_to_spec(t.as_ref()))
            .collect()
    }

    /// Sorted list of tool names.
    pub fn list(&self) -> Vec<String> {
        let guard = self.inner.read().expect("registry lock");
        let mut names: Vec<String> = guard.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTool;

    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echo the 'text' argument."
        }
        fn parameters(&self) -> Value {
            serde_json::json!({
                "type": "object",
                "properties": { "text": { "type": "string" } },
                "required": ["text"]
            })
        }
        fn execute<'a>(&'a self, args: &'a Value) -> BoxFuture<'a, ToolResult> {
            Box::pin(async move {
                match args.get("text").and_then(Value::as_str) {
                    Some(t) => ToolResult::ok(t.to_string()),
                    None => ToolResult::error("missing or invalid 'text'"),
                }
            })
        }
    }

    #[tokio::test]
    async fn registry_register_execute_to_specs() {
        let reg = ToolRegistry::new();
        reg.register(EchoTool);
        assert_eq!(reg.list(), vec!["echo".to_string()]);

        let specs = reg.to_specs();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0]["name"], "echo");
        assert_eq!(specs[0]["inputSchema"]["required"][0], "text");

        let res = reg.execute("echo", &serde_json::json!({ "text": "hi" })).await;
        assert!(!res.is_error);
        assert_eq!(res.text, "hi");

        let res = reg.execute("unknown", &serde_json::json!({})).await;
        assert!(res.is_error);
        assert!(res.text.contains("not found"));
    }
}
