//! The two built-in tools the persona agent offers the model: one to record
//! a visitor's contact details, one to log a question the persona could not
//! answer. Both report through a NotificationSink and answer with
//! `{"recorded": "ok"}`.

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::Arc;

use crate::errors::{AgentError, AgentResult};
use crate::models::tool::Tool;
use crate::notify::NotificationSink;
use crate::registry::ToolHandler;

/// Validate-then-invoke helpers. The schemas advertise
/// `additionalProperties: false`, and the handlers enforce it.
fn expect_object<'a>(arguments: &'a Value, allowed: &[&str]) -> AgentResult<&'a Map<String, Value>> {
    let map = arguments.as_object().ok_or_else(|| {
        AgentError::InvalidParameters("arguments must be a JSON object".to_string())
    })?;

    for key in map.keys() {
        if !allowed.contains(&key.as_str()) {
            return Err(AgentError::InvalidParameters(format!(
                "unexpected parameter '{}'",
                key
            )));
        }
    }

    Ok(map)
}

fn required_str<'a>(map: &'a Map<String, Value>, key: &str) -> AgentResult<&'a str> {
    map.get(key)
        .ok_or_else(|| AgentError::InvalidParameters(format!("missing required '{}'", key)))?
        .as_str()
        .ok_or_else(|| AgentError::InvalidParameters(format!("'{}' must be a string", key)))
}

fn optional_str<'a>(map: &'a Map<String, Value>, key: &str) -> AgentResult<Option<&'a str>> {
    match map.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_str()
            .map(Some)
            .ok_or_else(|| AgentError::InvalidParameters(format!("'{}' must be a string", key))),
    }
}

/// Records a visitor's interest along with their email address.
pub struct RecordUserDetails {
    tool: Tool,
    sink: Arc<dyn NotificationSink>,
}

impl RecordUserDetails {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        let tool = Tool::new(
            "record_user_details",
            "Record a user's interest using their email and optional details.",
            json!({
                "type": "object",
                "properties": {
                    "email": {"type": "string", "description": "User's email address"},
                    "name": {"type": "string", "description": "User's name"},
                    "notes": {"type": "string", "description": "Additional context or comments"},
                },
                "required": ["email"],
                "additionalProperties": false,
            }),
        );
        Self { tool, sink }
    }
}

#[async_trait]
impl ToolHandler for RecordUserDetails {
    fn definition(&self) -> &Tool {
        &self.tool
    }

    async fn call(&self, arguments: Value) -> AgentResult<Value> {
        let args = expect_object(&arguments, &["email", "name", "notes"])?;
        let email = required_str(args, "email")?;
        let name = optional_str(args, "name")?.unwrap_or("Name not provided");
        let notes = optional_str(args, "notes")?.unwrap_or("notes not provided");

        self.sink
            .send(
                "user record",
                &format!("[User Interest] {} {} | Notes: {}", name, email, notes),
            )
            .await;

        Ok(json!({"recorded": "ok"}))
    }
}

/// Logs a question the assistant could not answer.
pub struct RecordUnknownQuestion {
    tool: Tool,
    sink: Arc<dyn NotificationSink>,
}

impl RecordUnknownQuestion {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        let tool = Tool::new(
            "record_unknown_question",
            "Log a question that the assistant couldn't answer.",
            json!({
                "type": "object",
                "properties": {
                    "question": {"type": "string", "description": "The unanswerable question"},
                },
                "required": ["question"],
                "additionalProperties": false,
            }),
        );
        Self { tool, sink }
    }
}

#[async_trait]
impl ToolHandler for RecordUnknownQuestion {
    fn definition(&self) -> &Tool {
        &self.tool
    }

    async fn call(&self, arguments: Value) -> AgentResult<Value> {
        let args = expect_object(&arguments, &["question"])?;
        let question = required_str(args, "question")?;

        self.sink
            .send("unknown question", &format!("[Unknown Question] {}", question))
            .await;

        Ok(json!({"recorded": "ok"}))
    }
}
