//! Adapter for the free local backend.
//!
//! Speaks the local generate protocol:
//! `POST {base_url}/generate` with `{prompt, model, stream: false}`,
//! response carries the text in either `response` or `text`.

use super::{map_send_error, upstream_error, with_cancel, AgentError, GenerateAgent};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub struct LocalAgent {
    base_url: String,
    client: Client,
    timeout: Duration,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    prompt: &'a str,
    model: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

impl LocalAgent {
    pub fn new(base_url: String, client: Client, timeout: Duration) -> Self {
        Self {
            base_url,
            client,
            timeout,
        }
    }
}

#[async_trait]
impl GenerateAgent for LocalAgent {
    fn provider_name(&self) -> &'static str {
        "local"
    }

    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<String, AgentError> {
        let url = format!("{}/generate", self.base_url);
        let body = GenerateRequest {
            prompt,
            model,
            stream: false,
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

            let parsed: GenerateResponse = response.json().await.map_err(|e| {
                AgentError::InvalidResponse(format!("Failed to parse generate response: {}", e))
            })?;

            parsed
                .response
                .or(parsed.text)
                .ok_or_else(|| {
                    AgentError::InvalidResponse(
                        "Generate response missing both 'response' and 'text'".to_string(),
                    )
                })
        })
        .await
    }
}
