use async_trait::async_trait;
use serde_json::Value;

use crate::errors::{AgentError, AgentResult};
use crate::models::tool::Tool;

/// A named, schema-described function the model may ask to have invoked.
///
/// Implementations own their argument validation: `call` receives the raw
/// argument object as the model produced it and must return
/// `InvalidParameters` rather than panic when it is not to its liking.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// The definition advertised to the model
    fn definition(&self) -> &Tool;

    /// Validate the arguments and run the tool
    async fn call(&self, arguments: Value) -> AgentResult<Value>;
}

/// Maps tool names to their handlers. Built once at startup and shared
/// read-only across turns, so concurrent sessions never contend on it.
#[derive(Default)]
pub struct ToolRegistry {
    handlers: Vec<Box<dyn ToolHandler>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Add a handler. Registering a second handler under a name that is
    /// already taken is rejected, so a typo cannot silently shadow a tool.
    pub fn register(&mut self, handler: Box<dyn ToolHandler>) -> AgentResult<()> {
        let name = &handler.definition().name;
        if self.resolve(name).is_some() {
            return Err(AgentError::Internal(format!(
                "duplicate tool registration: {}",
                name
            )));
        }
        self.handlers.push(handler);
        Ok(())
    }

    /// Look up a handler by exact name match
    pub fn resolve(&self, name: &str) -> Option<&dyn ToolHandler> {
        self.handlers
            .iter()
            .find(|handler| handler.definition().name == name)
            .map(|handler| handler.as_ref())
    }

    /// The definitions of every registered tool, in registration order
    pub fn tools(&self) -> Vec<Tool> {
        self.handlers
            .iter()
            .map(|handler| handler.definition().clone())
            .collect()
    }
}
