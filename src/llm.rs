//! Client for the local text-generation backend.
//!
//! Speaks the Ollama generate API: a single non-streaming POST carrying the
//! fully rendered prompt, returning the completion in the `response` field.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::ChatConfig;
use crate::downstream::ensure_slash;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

/// The only field of the backend's reply the relay cares about.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Calls the generation backend with a rendered prompt.
///
/// Owns the HTTP client and the backend coordinates; all of it comes from
/// configuration so tests can point the relay at a mock server. As with the
/// image forwarder, no request timeout is set.
#[derive(Debug, Clone)]
pub struct CompletionClient {
    client: reqwest::Client,
    base_url: Url,
    model: String,
    temperature: f32,
}

impl CompletionClient {
    pub fn new(config: &ChatConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.url.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
        }
    }

    /// Send a fully rendered prompt and return the generated text.
    pub async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        let url = ensure_slash(&self.base_url)
            .join("api/generate")
            .map_err(|e| anyhow::anyhow!("failed to construct backend URL: {e}"))?;

        let payload = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: self.temperature,
            },
        };

        let response = self.client.post(url).json(&payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("generation backend returned HTTP {status}: {body}");
        }

        let reply: GenerateResponse = response.json().await?;
        Ok(reply.response)
    }
}
