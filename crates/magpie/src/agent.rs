use anyhow::Result;
use std::sync::Arc;

use crate::dispatcher::ToolDispatcher;
use crate::models::message::{Message, ToolRequest};
use crate::providers::base::Provider;
use crate::registry::ToolRegistry;

/// Runs one chat turn against the completion endpoint, executing at most one
/// round of tool calls in between.
///
/// A turn makes one completion call with the registry's tools on offer. If
/// the model answers in text, that is the result. If it requests tool calls,
/// the whole batch is dispatched, the outcomes are appended to the working
/// sequence, and a second, answer-only completion call produces the result.
/// The second call offers no tools; any tool requests it returns are not
/// executed. Capping tool use to one round keeps a turn at two remote calls.
pub struct Agent {
    provider: Box<dyn Provider>,
    registry: Arc<ToolRegistry>,
    dispatcher: ToolDispatcher,
    system_prompt: String,
}

impl Agent {
    pub fn new(
        provider: Box<dyn Provider>,
        registry: Arc<ToolRegistry>,
        system_prompt: String,
    ) -> Self {
        let dispatcher = ToolDispatcher::new(registry.clone());
        Self {
            provider,
            registry,
            dispatcher,
            system_prompt,
        }
    }

    /// Execute one turn. `history` is read, never mutated; the caller owns
    /// it and decides what to append after the turn. A completion failure in
    /// either phase fails the turn, but tool side effects that already
    /// happened are not rolled back.
    pub async fn reply(&self, user_message: &str, history: &[Message]) -> Result<String> {
        let mut messages = history.to_vec();
        messages.push(Message::user().with_text(user_message));

        let tools = self.registry.tools();
        let (response, usage) = self
            .provider
            .complete(&self.system_prompt, &messages, &tools)
            .await?;
        tracing::debug!(
            input_tokens = ?usage.input_tokens,
            output_tokens = ?usage.output_tokens,
            "first completion finished"
        );

        let tool_requests: Vec<ToolRequest> = response
            .tool_requests()
            .into_iter()
            .cloned()
            .collect();

        if tool_requests.is_empty() {
            return Ok(response.text());
        }

        let outcomes = self.dispatcher.dispatch(&tool_requests).await;

        // The assistant message keeps its tool-call metadata so the endpoint
        // can correlate the outcomes that follow it.
        let mut tool_message = Message::user();
        for outcome in outcomes {
            tool_message = tool_message.with_tool_response(outcome.id, outcome.payload);
        }
        messages.push(response);
        messages.push(tool_message);

        let (followup, usage) = self
            .provider
            .complete(&self.system_prompt, &messages, &[])
            .await?;
        tracing::debug!(
            input_tokens = ?usage.input_tokens,
            output_tokens = ?usage.output_tokens,
            "second completion finished"
        );

        if !followup.tool_requests().is_empty() {
            // Single round of tool use per turn: requests past the first
            // round are dropped.
            tracing::warn!("model requested tools on the answer-only call, ignoring");
        }

        Ok(followup.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concierge::{RecordUnknownQuestion, RecordUserDetails};
    use crate::models::message::MessageContent;
    use crate::models::tool::{Tool, ToolCall};
    use crate::notify::NotificationSink;
    use crate::providers::base::Usage;
    use crate::providers::mock::MockProvider;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Records every notification instead of delivering it.
    struct RecordingSink {
        sent: Mutex<Vec<(String, String)>>,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
            }
        }

        fn sent(&self) -> Vec<(String, String)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl NotificationSink for RecordingSink {
        async fn send(&self, title: &str, message: &str) -> String {
            self.sent
                .lock()
                .unwrap()
                .push((title.to_string(), message.to_string()));
            "Notification sent!".to_string()
        }
    }

    /// Fails every completion call after an optional scripted prefix.
    struct FailingProvider {
        responses: Mutex<Vec<Message>>,
    }

    impl FailingProvider {
        fn new(responses: Vec<Message>) -> Self {
            Self {
                responses: Mutex::new(responses),
            }
        }
    }

    #[async_trait]
    impl Provider for FailingProvider {
        async fn complete(
            &self,
            _system: &str,
            _messages: &[Message],
            _tools: &[Tool],
        ) -> Result<(Message, Usage)> {
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                Err(anyhow!("completion endpoint unreachable"))
            } else {
                Ok((responses.remove(0), Usage::default()))
            }
        }
    }

    fn concierge_registry(sink: Arc<RecordingSink>) -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        registry
            .register(Box::new(RecordUserDetails::new(sink.clone())))
            .unwrap();
        registry
            .register(Box::new(RecordUnknownQuestion::new(sink)))
            .unwrap();
        Arc::new(registry)
    }

    #[tokio::test]
    async fn test_simple_response_single_call() -> Result<()> {
        let sink = Arc::new(RecordingSink::new());
        let provider = MockProvider::new(vec![Message::assistant().with_text("Hello!")]);
        let call_log = provider.call_log();

        let agent = Agent::new(
            Box::new(provider),
            concierge_registry(sink.clone()),
            "system".to_string(),
        );

        let answer = agent.reply("Hi", &[]).await?;

        assert_eq!(answer, "Hello!");
        assert_eq!(call_log.lock().unwrap().len(), 1);
        assert!(sink.sent().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_tool_round_two_calls() -> Result<()> {
        let sink = Arc::new(RecordingSink::new());
        let provider = MockProvider::new(vec![
            Message::assistant().with_tool_request(
                "call-1",
                Ok(ToolCall::new(
                    "record_unknown_question",
                    json!({"question": "What is the meaning of life?"}),
                )),
            ),
            Message::assistant().with_text("I noted that one down."),
        ]);
        let call_log = provider.call_log();

        let agent = Agent::new(
            Box::new(provider),
            concierge_registry(sink.clone()),
            "system".to_string(),
        );

        let answer = agent.reply("What is the meaning of life?", &[]).await?;
        assert_eq!(answer, "I noted that one down.");

        let calls = call_log.lock().unwrap().clone();
        assert_eq!(calls.len(), 2);
        // First call offers both tools, the answer-only call offers none.
        assert_eq!(calls[0].tools.len(), 2);
        assert!(calls[1].tools.is_empty());

        // The second call's sequence ends with the assistant's tool-calling
        // message followed by the correlated tool response.
        let appended = &calls[1].messages;
        let assistant = &appended[appended.len() - 2];
        assert_eq!(assistant.tool_requests()[0].id, "call-1");
        let tool_response = appended[appended.len() - 1].content[0]
            .as_tool_response()
            .unwrap();
        assert_eq!(tool_response.id, "call-1");
        assert_eq!(tool_response.tool_result, json!({"recorded": "ok"}));

        let sent = sink.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].1.contains("What is the meaning of life?"));
        Ok(())
    }

    #[tokio::test]
    async fn test_multiple_tool_calls_batched() -> Result<()> {
        let sink = Arc::new(RecordingSink::new());
        let provider = MockProvider::new(vec![
            Message::assistant()
                .with_tool_request(
                    "call-1",
                    Ok(ToolCall::new(
                        "record_user_details",
                        json!({"email": "visitor@example.com", "name": "Visitor"}),
                    )),
                )
                .with_tool_request(
                    "call-2",
                    Ok(ToolCall::new(
                        "record_unknown_question",
                        json!({"question": "Do you like jazz?"}),
                    )),
                ),
            Message::assistant().with_text("All recorded!"),
        ]);
        let call_log = provider.call_log();

        let agent = Agent::new(
            Box::new(provider),
            concierge_registry(sink.clone()),
            "system".to_string(),
        );

        let answer = agent.reply("Here you go", &[]).await?;
        assert_eq!(answer, "All recorded!");

        let calls = call_log.lock().unwrap().clone();
        assert_eq!(calls.len(), 2);

        // Both outcomes land in one tool message, correlated by id.
        let tool_message = calls[1].messages.last().unwrap();
        let ids: Vec<&str> = tool_message
            .content
            .iter()
            .filter_map(|c| c.as_tool_response())
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(ids, vec!["call-1", "call-2"]);

        assert_eq!(sink.sent().len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_tool_becomes_error_payload() -> Result<()> {
        let sink = Arc::new(RecordingSink::new());
        let provider = MockProvider::new(vec![
            Message::assistant().with_tool_request(
                "call-1",
                Ok(ToolCall::new("non_existent_tool", json!({}))),
            ),
            Message::assistant().with_text("Something went sideways."),
        ]);
        let call_log = provider.call_log();

        let agent = Agent::new(
            Box::new(provider),
            concierge_registry(sink.clone()),
            "system".to_string(),
        );

        let answer = agent.reply("Try it", &[]).await?;
        assert_eq!(answer, "Something went sideways.");

        let calls = call_log.lock().unwrap().clone();
        let tool_response = calls[1].messages.last().unwrap().content[0]
            .as_tool_response()
            .unwrap();
        assert_eq!(
            tool_response.tool_result,
            json!({"error": "unknown tool non_existent_tool"})
        );
        assert!(sink.sent().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_first_call_failure_no_dispatch() {
        let sink = Arc::new(RecordingSink::new());
        let agent = Agent::new(
            Box::new(FailingProvider::new(vec![])),
            concierge_registry(sink.clone()),
            "system".to_string(),
        );

        let result = agent.reply("Hi", &[]).await;
        assert!(result.is_err());
        assert!(sink.sent().is_empty());
    }

    #[tokio::test]
    async fn test_second_call_failure_keeps_side_effects() {
        let sink = Arc::new(RecordingSink::new());
        let agent = Agent::new(
            Box::new(FailingProvider::new(vec![Message::assistant()
                .with_tool_request(
                    "call-1",
                    Ok(ToolCall::new(
                        "record_unknown_question",
                        json!({"question": "Hmm?"}),
                    )),
                )])),
            concierge_registry(sink.clone()),
            "system".to_string(),
        );

        let result = agent.reply("Hmm?", &[]).await;
        assert!(result.is_err());
        // The notification already went out; the failed turn does not undo it.
        assert_eq!(sink.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_second_round_tool_requests_ignored() -> Result<()> {
        let sink = Arc::new(RecordingSink::new());
        let provider = MockProvider::new(vec![
            Message::assistant().with_tool_request(
                "call-1",
                Ok(ToolCall::new(
                    "record_unknown_question",
                    json!({"question": "One?"}),
                )),
            ),
            Message::assistant()
                .with_text("Done.")
                .with_tool_request(
                    "call-2",
                    Ok(ToolCall::new(
                        "record_unknown_question",
                        json!({"question": "Two?"}),
                    )),
                ),
        ]);
        let call_log = provider.call_log();

        let agent = Agent::new(
            Box::new(provider),
            concierge_registry(sink.clone()),
            "system".to_string(),
        );

        let answer = agent.reply("One?", &[]).await?;
        assert_eq!(answer, "Done.");

        // Exactly two completion calls and one executed tool call: the
        // request on the answer-only response was dropped.
        assert_eq!(call_log.lock().unwrap().len(), 2);
        assert_eq!(sink.sent().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_history_is_not_mutated() -> Result<()> {
        let sink = Arc::new(RecordingSink::new());
        let provider = MockProvider::new(vec![Message::assistant().with_text("Again!")]);

        let agent = Agent::new(
            Box::new(provider),
            concierge_registry(sink),
            "system".to_string(),
        );

        let history = vec![
            Message::user().with_text("First"),
            Message::assistant().with_text("Reply"),
        ];
        let before = history.clone();

        agent.reply("Second", &history).await?;
        assert_eq!(history, before);
        Ok(())
    }

    #[tokio::test]
    async fn test_history_precedes_new_user_message() -> Result<()> {
        let sink = Arc::new(RecordingSink::new());
        let provider = MockProvider::new(vec![Message::assistant().with_text("Sure")]);
        let call_log = provider.call_log();

        let agent = Agent::new(
            Box::new(provider),
            concierge_registry(sink),
            "system".to_string(),
        );

        let history = vec![Message::user().with_text("Earlier")];
        agent.reply("Now", &history).await?;

        let calls = call_log.lock().unwrap().clone();
        let sent = &calls[0].messages;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].text(), "Earlier");
        assert_eq!(sent[1].text(), "Now");
        assert!(matches!(
            sent[1].content[0],
            MessageContent::Text(_)
        ));
        Ok(())
    }
}
