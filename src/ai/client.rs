use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use super::session::ChatTurn;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("malformed completion payload")]
    Malformed,
}

#[derive(Debug, Clone)]
pub struct CompletionOptions {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            model: crate::constants::defaults::DEFAULT_COMPLETION_MODEL.to_string(),
            max_tokens: crate::constants::defaults::DEFAULT_COMPLETION_MAX_TOKENS,
            temperature: crate::constants::defaults::DEFAULT_COMPLETION_TEMPERATURE,
        }
    }
}

/// The conversational backend, abstracted so the core never knows which
/// vendor sits behind it.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(
        &self,
        history: &[ChatTurn],
        options: &CompletionOptions,
    ) -> Result<String, ServiceError>;
}

/// OpenAI-compatible `/chat/completions` client.
pub struct HttpCompletionService {
    http: reqwest::Client,
    url: String,
    api_key: String,
}

impl HttpCompletionService {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
            api_key: api_key.into(),
        }
    }
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[async_trait]
impl CompletionService for HttpCompletionService {
    async fn complete(
        &self,
        history: &[ChatTurn],
        options: &CompletionOptions,
    ) -> Result<String, ServiceError> {
        let body = serde_json::json!({
            "model": options.model,
            "messages": history,
            "max_tokens": options.max_tokens,
            "temperature": options.temperature,
        });

        let response = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ServiceError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let payload: CompletionResponse = response.json().await?;
        payload
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(ServiceError::Malformed)
    }
}
