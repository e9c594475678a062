use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use switchyard_core::Category;

use crate::config::OpenAiConfig;
use crate::{IntentModel, ModelError};

const SYSTEM_PROMPT: &str = "You route user requests. Answer with exactly one word: RAG for questions that need factual information, MATH for calculations or arithmetic in digits or words, POEM for poems or other creative writing. If a request mixes calculation with anything else, answer MATH. If it mixes a poem with a question, answer POEM.";

/// Intent model backed by the OpenAI Responses API.
#[derive(Clone)]
pub struct OpenAiIntentModel {
    http_client: Client,
    config: OpenAiConfig,
}

impl OpenAiIntentModel {
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let http_client = Client::builder()
            .connect_timeout(Duration::from_secs(6))
            .timeout(Duration::from_secs(20))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http_client,
            config,
        })
    }

    async fn request_label(&self, text: &str) -> Result<Category, ModelError> {
        let payload = serde_json::json!({
            "model": self.config.model,
            "input": [
                {
                    "role": "system",
                    "content": [
                        { "type": "input_text", "text": SYSTEM_PROMPT }
                    ]
                },
                {
                    "role": "user",
                    "content": [
                        { "type": "input_text", "text": text }
                    ]
                }
            ],
            "max_output_tokens": 16
        });

        let response = self
            .http_client
            .post(self.config.url.as_str())
            .bearer_auth(self.config.api_key.as_str())
            .json(&payload)
            .send()
            .await
            .map_err(|error| ModelError::Transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|error| ModelError::Transport(format!("response parse failed: {error}")))?;
        let output = extract_output_text(&body)
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| ModelError::InvalidLabel(String::new()))?;

        Category::find_label(&output).ok_or(ModelError::InvalidLabel(output))
    }
}

#[async_trait]
impl IntentModel for OpenAiIntentModel {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn classify(&self, text: &str) -> Result<Category, ModelError> {
        self.request_label(text).await
    }
}

fn extract_output_text(payload: &serde_json::Value) -> Option<String> {
    if let Some(value) = payload.get("output_text").and_then(|value| value.as_str()) {
        return Some(value.to_string());
    }
    let output = payload.get("output")?.as_array()?;
    let mut chunks = Vec::new();
    for item in output {
        if let Some(content) = item.get("content").and_then(|value| value.as_array()) {
            for content_item in content {
                if content_item
                    .get("type")
                    .and_then(|value| value.as_str())
                    .map(|value| value == "output_text")
                    .unwrap_or(false)
                {
                    if let Some(text) = content_item.get("text").and_then(|value| value.as_str()) {
                        chunks.push(text.to_string());
                    }
                }
            }
        }
    }
    if chunks.is_empty() {
        None
    } else {
        Some(chunks.join("\n"))
    }
}
