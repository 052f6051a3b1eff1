//! Adapter for remote provider A.
//!
//! Speaks a chat-messages protocol: `POST {base_url}/chat` with
//! `{messages: [{role, content}], model, temperature}`, response carries
//! the text in `response` or `message.content`.

use super::{map_send_error, upstream_error, with_cancel, AgentError, GenerateAgent};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const TEMPERATURE: f64 = 0.7;

pub struct ProviderAAgent {
    base_url: String,
    client: Client,
    timeout: Duration,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: Vec<ChatMessage<'a>>,
    model: &'a str,
    temperature: f64,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    message: Option<ResponseMessage>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

impl ProviderAAgent {
    pub fn new(base_url: String, client: Client, timeout: Duration) -> Self {
        Self {
            base_url,
            client,
            timeout,
        }
    }
}

#[async_trait]
impl GenerateAgent for ProviderAAgent {
    fn provider_name(&self) -> &'static str {
        "provider-a"
    }

    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<String, AgentError> {
        let url = format!("{}/chat", self.base_url);
        let body = ChatRequest {
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            model,
            temperature: TEMPERATURE,
        };

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

            parsed
                .response
                .or(parsed.message.map(|m| m.content))
                .ok_or_else(|| {
                    AgentError::InvalidResponse(
                        "Chat response missing both 'response' and 'message.content'".to_string(),
                    )
                })
        })
        .await
    }
}
