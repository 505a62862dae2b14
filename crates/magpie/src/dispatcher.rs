use serde_json::{json, Value};
use std::sync::Arc;

use crate::errors::{AgentError, AgentResult};
use crate::models::message::ToolRequest;
use crate::registry::ToolRegistry;

/// Identifier used when the model omitted one, e.g. for synthetically
/// constructed calls.
pub const FALLBACK_CALL_ID: &str = "synthetic-call";

/// One result per tool call request, correlated by the request id. The
/// payload is the handler's return value or an `{"error": ...}` object.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutcome {
    pub id: String,
    pub payload: Value,
}

/// Resolves and invokes a batch of tool call requests.
///
/// Invariant: `dispatch` is infallible. Every failure mode a request can hit
/// -- arguments that never parsed, a name no handler answers to, a handler
/// that errors out -- is folded into that request's payload, and the
/// remaining requests in the batch still run.
pub struct ToolDispatcher {
    registry: Arc<ToolRegistry>,
}

impl ToolDispatcher {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    /// Run every request in the batch, concurrently, and collect one outcome
    /// per request in input order. Side-effect ordering across tools within
    /// a batch is unspecified.
    pub async fn dispatch(&self, requests: &[ToolRequest]) -> Vec<ToolOutcome> {
        let futures: Vec<_> = requests.iter().map(|request| self.run(request)).collect();
        futures::future::join_all(futures).await
    }

    async fn run(&self, request: &ToolRequest) -> ToolOutcome {
        let id = if request.id.is_empty() {
            FALLBACK_CALL_ID.to_string()
        } else {
            request.id.clone()
        };

        let payload = match self.invoke(request).await {
            Ok(value) => value,
            Err(e) => {
                tracing::info!(call_id = %id, error = %e, "tool call failed");
                json!({"error": e.to_string()})
            }
        };

        ToolOutcome { id, payload }
    }

    async fn invoke(&self, request: &ToolRequest) -> AgentResult<Value> {
        let call = request.tool_call.clone()?;
        let handler = self
            .registry
            .resolve(&call.name)
            .ok_or_else(|| AgentError::ToolNotFound(call.name.clone()))?;
        handler.call(call.arguments).await
    }
}
