//! Tool trait and registry
//!
//! Tools are described with a JSON schema and can be exported as
//! OpenAI-style function definitions. Picking which tool to call is left to
//! whoever holds the registry.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

use super::context::MissionContext;
use crate::error::{Error, Result};

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    /// JSON schema of the arguments object
    fn parameters(&self) -> Value;

    async fn call(&self, ctx: &MissionContext, args: Value) -> Result<Value>;
}

/// Name-addressable set of tools, kept in registration order
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        if self.get(tool.name()).is_some() {
            return Err(Error::InvalidInput(format!(
                "Tool '{}' is already registered",
                tool.name()
            )));
        }
        self.tools.push(tool);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// `{"type": "function", "function": {...}}` entry per tool
    pub fn definitions(&self) -> Vec<Value> {
        self.tools
            .iter()
            .map(|tool| {
                json!({
                    "type": "function",
                    "function": {
                        "name": tool.name(),
                        "description": tool.description(),
                        "parameters": tool.parameters(),
                    }
                })
            })
            .collect()
    }

    pub async fn invoke(&self, name: &str, ctx: &MissionContext, args: Value) -> Result<Value> {
        let tool = self
            .get(name)
            .ok_or_else(|| Error::ToolNotFound(name.to_string()))?;

        debug!(tool = %name, mission = %ctx.mission_id, "Invoking tool");
        tool.call(ctx, args).await
    }
}

/// Decode a tool's arguments; `null` is read as an empty object
pub(crate) fn parse_args<T: DeserializeOwned>(tool: &str, args: Value) -> Result<T> {
    let args = if args.is_null() { json!({}) } else { args };
    serde_json::from_value(args)
        .map_err(|e| Error::ToolFailed(tool.to_string(), format!("invalid arguments: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl Tool for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Return the arguments"
        }

        fn parameters(&self) -> Value {
            json!({"type": "object", "properties": {}})
        }

        async fn call(&self, _ctx: &MissionContext, args: Value) -> Result<Value> {
            Ok(args)
        }
    }

    #[tokio::test]
    async fn test_invoke_known_tool() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Echo)).unwrap();

        let out = registry
            .invoke("echo", &MissionContext::default(), json!({"x": 1}))
            .await
            .unwrap();
        assert_eq!(out, json!({"x": 1}));
    }

    #[tokio::test]
    async fn test_invoke_unknown_tool() {
        let registry = ToolRegistry::new();
        let err = registry
            .invoke("missing", &MissionContext::default(), Value::Null)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ToolNotFound(name) if name == "missing"));
    }

    #[test]
    fn test_duplicate_registration() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Echo)).unwrap();
        assert!(registry.register(Arc::new(Echo)).is_err());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_definitions_shape() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Echo)).unwrap();

        let defs = registry.definitions();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0]["type"], "function");
        assert_eq!(defs[0]["function"]["name"], "echo");
        assert_eq!(defs[0]["function"]["parameters"]["type"], "object");
    }

    #[test]
    fn test_parse_args_null_is_empty_object() {
        #[derive(serde::Deserialize)]
        struct Args {
            #[serde(default)]
            k: Option<usize>,
        }
        let args: Args = parse_args("t", Value::Null).unwrap();
        assert!(args.k.is_none());

        let err = parse_args::<Args>("t", json!({"k": "three"})).err().unwrap();
        assert!(matches!(err, Error::ToolFailed(..)));
    }
}
