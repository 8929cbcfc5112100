use crate::domain::model::{CompletionChoice, CompletionResponse};
use crate::domain::ports::{CompletionService, ConfigProvider};
use crate::utils::error::{FlashgenError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    r#type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionEnvelope {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    error: Option<ProviderError>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    #[serde(default)]
    message: Option<String>,
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
pub struct ChatCompletionClient<C: ConfigProvider> {
    config: C,
    client: Client,
}

impl<C: ConfigProvider> ChatCompletionClient<C> {
    pub fn new(config: C) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    pub fn config(&self) -> &C {
        &self.config
    }
}

#[async_trait]
impl<C: ConfigProvider> CompletionService for ChatCompletionClient<C> {
    async fn complete(
        &self,
        system_instruction: &str,
        user_message: &str,
    ) -> Result<CompletionResponse> {
        let body = ChatCompletionRequest {
            model: self.config.model(),
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_instruction,
                },
                ChatMessage {
                    role: "user",
                    content: user_message,
                },
            ],
            // 僅為提示，模型不一定遵守
            response_format: self.config.json_mode().then_some(ResponseFormat {
                r#type: "json_object",
            }),
        };

        let endpoint = self.config.completion_endpoint();
        tracing::debug!("Making completion request to: {}", endpoint);

        let mut request = self
            .client
            .post(endpoint)
            .timeout(Duration::from_secs(self.config.timeout_seconds()))
            .json(&body);

        if let Some(api_key) = self.config.api_key() {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("Completion response status: {}", status);

        let text = response.text().await?;

        if !status.is_success() {
            return Err(FlashgenError::UpstreamStatus {
                status: status.as_u16(),
                message: text,
            });
        }

        if text.trim().is_empty() {
            return Err(FlashgenError::UpstreamEmptyBody);
        }

        let envelope: ChatCompletionEnvelope =
            serde_json::from_str(&text).map_err(|e| FlashgenError::UpstreamDecode {
                message: e.to_string(),
            })?;

        if let Some(error) = envelope.error {
            return Err(FlashgenError::UpstreamRejected {
                message: error
                    .message
                    .unwrap_or_else(|| "unspecified provider error".to_string()),
            });
        }

        Ok(CompletionResponse {
            choices: envelope
                .choices
                .into_iter()
                .map(|choice| CompletionChoice {
                    content: choice.message.and_then(|m| m.content),
                })
                .collect(),
        })
    }
}
