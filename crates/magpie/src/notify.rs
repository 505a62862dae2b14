use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::env;
use std::time::Duration;

pub const PUSHOVER_URL: &str = "https://api.pushover.net/1/messages.json";

const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Delivers a title/message pair to a push-notification service.
///
/// `send` is fire-and-forget: it always returns a status string and never an
/// error, so a flaky notification service can degrade a tool's report but
/// never fail a turn.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, title: &str, message: &str) -> String;
}

/// Pushover-backed sink.
pub struct PushoverSink {
    client: Client,
    url: String,
    token: String,
    user: String,
}

impl PushoverSink {
    pub fn new(url: String, token: String, user: String) -> Result<Self> {
        let client = Client::builder().timeout(DELIVERY_TIMEOUT).build()?;
        Ok(Self {
            client,
            url,
            token,
            user,
        })
    }

    /// Credentials from PUSHOVER_TOKEN / PUSHOVER_USER.
    pub fn from_env() -> Result<Self> {
        let token = env::var("PUSHOVER_TOKEN").context("PUSHOVER_TOKEN must be set")?;
        let user = env::var("PUSHOVER_USER").context("PUSHOVER_USER must be set")?;
        Self::new(PUSHOVER_URL.to_string(), token, user)
    }
}

#[async_trait]
impl NotificationSink for PushoverSink {
    async fn send(&self, title: &str, message: &str) -> String {
        let params = [
            ("token", self.token.as_str()),
            ("user", self.user.as_str()),
            ("title", title),
            ("message", message),
        ];

        let status = match self.client.post(&self.url).form(&params).send().await {
            Ok(response) if response.status() == StatusCode::OK => {
                "Notification sent!".to_string()
            }
            Ok(response) => {
                let body = response.text().await.unwrap_or_default();
                format!("Failed to send: {}", body)
            }
            Err(e) => format!("Failed to send: {}", e),
        };

        tracing::info!(%title, %status, "notification delivery");
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn sink_for(server: &MockServer) -> PushoverSink {
        PushoverSink::new(
            format!("{}/1/messages.json", server.uri()),
            "test-token".to_string(),
            "test-user".to_string(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_send_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/1/messages.json"))
            .and(body_string_contains("token=test-token"))
            .and(body_string_contains("title=greeting"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let status = sink_for(&server).await.send("greeting", "hello").await;
        assert_eq!(status, "Notification sent!");
    }

    #[tokio::test]
    async fn test_send_failure_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/1/messages.json"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad token"))
            .mount(&server)
            .await;

        let status = sink_for(&server).await.send("greeting", "hello").await;
        assert_eq!(status, "Failed to send: bad token");
    }

    #[tokio::test]
    async fn test_send_unreachable_reports_status() {
        // Port is closed: the request itself errors, and that still comes
        // back as a status string.
        let sink = PushoverSink::new(
            "http://127.0.0.1:1/1/messages.json".to_string(),
            "t".to_string(),
            "u".to_string(),
        )
        .unwrap();

        let status = sink.send("greeting", "hello").await;
        assert!(status.starts_with("Failed to send:"));
    }
}
