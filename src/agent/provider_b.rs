//! Adapter for remote provider B.
//!
//! Speaks a plain-prompt protocol: `POST {base_url}/chat` with
//! `{prompt, model}`, response carries the text in `response` or `text`.

use super::{map_send_error, upstream_error, with_cancel, AgentError, GenerateAgent};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub struct ProviderBAgent {
    base_url: String,
    client: Client,
    timeout: Duration,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    prompt: &'a str,
    model: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

impl ProviderBAgent {
    pub fn new(base_url: String, client: Client, timeout: Duration) -> Self {
        Self {
            base_url,
            client,
            timeout,
        }
    }
}

#[async_trait]
impl GenerateAgent for ProviderBAgent {
    fn provider_name(&self) -> &'static str {
        "provider-b"
    }

    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<String, AgentError> {
        let url = format!("{}/chat", self.base_url);
        let body = ChatRequest { prompt, model };

        with_cancel(cancel, async {
            let response = self
                .client
                .post(&url)
                .json(&body)
                .timeout(self.timeout)
                .send()
                .await
                .map_err(|e| map_send_error(e, self.timeout))?;

            if !response.status().is_success() {
                return Err(upstream_error(response).await);
            }

            let parsed: ChatResponse = response.json().await.map_err(|e| {
                AgentError::InvalidResponse(format!("Failed to parse chat response: {}", e))
            })?;

            parsed.response.or(parsed.text).ok_or_else(|| {
                AgentError::InvalidResponse(
                    "Chat response missing both 'response' and 'text'".to_string(),
                )
            })
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn agent(base_url: String) -> ProviderBAgent {
        ProviderBAgent::new(base_url, Client::new(), Duration::from_secs(30))
    }

    #[tokio::test]
    async fn generate_sends_prompt_shape() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/chat")
            .match_body(Matcher::Json(serde_json::json!({
                "prompt": "summarize",
                "model": "b-small"
            })))
            .with_status(200)
            .with_body(r#"{"text":"a summary"}"#)
            .create_async()
            .await;

        let text = agent(server.url())
            .generate("b-small", "summarize", &CancellationToken::new())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(text, "a summary");
    }

    #[tokio::test]
    async fn generate_reads_response_field_first() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat")
            .with_status(200)
            .with_body(r#"{"response":"primary","text":"secondary"}"#)
            .create_async()
            .await;

        let text = agent(server.url())
            .generate("b-large", "hi", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(text, "primary");
    }

    #[tokio::test]
    async fn generate_upstream_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat")
            .with_status(503)
            .with_body("overloaded")
            .create_async()
            .await;

        let result = agent(server.url())
            .generate("b-small", "hi", &CancellationToken::new())
            .await;
        assert!(matches!(
            result,
            Err(AgentError::Upstream { status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn generate_missing_fields_is_invalid() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat")
            .with_status(200)
            .with_body(r#"{"ok":true}"#)
            .create_async()
            .await;

        let result = agent(server.url())
            .generate("b-small", "hi", &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(AgentError::InvalidResponse(_))));
    }
}
