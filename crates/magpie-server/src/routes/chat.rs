use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use magpie::models::message::Message;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::state::AppState;

// Types matching the incoming JSON structure
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    message: String,
    #[serde(default)]
    history: Vec<IncomingMessage>,
}

#[derive(Debug, Deserialize)]
pub struct IncomingMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    reply: String,
}

/// Convert incoming history to the internal Message type. Tool rounds are
/// intra-turn and never appear in client history, so only plain user and
/// assistant text survives the conversion.
fn convert_messages(incoming: &[IncomingMessage]) -> Vec<Message> {
    let mut messages = Vec::new();

    for msg in incoming {
        match msg.role.as_str() {
            "user" => {
                messages.push(Message::user().with_text(&msg.content));
            }
            "assistant" => {
                messages.push(Message::assistant().with_text(&msg.content));
            }
            other => {
                tracing::warn!("Unknown role in history: {}", other);
            }
        }
    }

    messages
}

async fn chat_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatReply>, (StatusCode, Json<Value>)> {
    let history = convert_messages(&request.history);

    match state.agent.reply(&request.message, &history).await {
        Ok(reply) => Ok(Json(ChatReply { reply })),
        Err(e) => {
            tracing::error!("turn failed: {:#}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": e.to_string()})),
            ))
        }
    }
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/chat", post(chat_handler))
        .with_state(state)
}
