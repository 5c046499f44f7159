//! OpenAI API integration.
//!
//! Implements the `TextGenerator` trait against the chat-completions
//! endpoint, and provides the lightweight credential check used by the
//! settings flow before a key is persisted.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use super::credentials::{CredentialChain, SecretValue};
use super::prompt::SYSTEM_INSTRUCTION;
use super::{SuggestionError, TextGenerator};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Output budget for a drafting suggestion.
const SUGGESTION_MAX_TOKENS: u32 = 300;
const SUGGESTION_TEMPERATURE: f32 = 0.7;
const SUGGESTION_TIMEOUT: Duration = Duration::from_secs(30);

/// A credential check sends a minimal prompt with a tiny output budget.
const CHECK_MAX_TOKENS: u32 = 10;
const CHECK_TIMEOUT: Duration = Duration::from_secs(10);

/// Chat-completions client for the text-generation collaborator.
pub struct GenerationClient {
    client: Client,
    credentials: CredentialChain,
    model: String,
    base_url: String,
}

impl GenerationClient {
    /// Create a client with the default model and endpoint, resolving the
    /// credential through the standard chain on each request.
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            credentials: CredentialChain::generation(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Use a specific model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Use a custom base URL (for compatible APIs and test servers).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Validate a candidate credential with a minimal request, before the
    /// settings flow persists it.
    pub async fn check_credential(&self, candidate: &SecretValue) -> bool {
        self.request_completion(candidate, "Hello", CHECK_MAX_TOKENS, CHECK_TIMEOUT)
            .await
            .is_ok()
    }

    async fn request_completion(
        &self,
        api_key: &SecretValue,
        user_message: &str,
        max_tokens: u32,
        timeout: Duration,
    ) -> Result<String, SuggestionError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage { role: "system".to_string(), content: SYSTEM_INSTRUCTION.to_string() },
                ChatMessage { role: "user".to_string(), content: user_message.to_string() },
            ],
            max_tokens: Some(max_tokens),
            temperature: Some(SUGGESTION_TEMPERATURE),
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", api_key.expose()))
            .header("Content-Type", "application/json")
            .timeout(timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SuggestionError::Timeout
                } else {
                    SuggestionError::Network
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_status(status, &body));
        }

        let response: ChatResponse =
            response.json().await.map_err(|_| SuggestionError::MalformedResponse)?;

        let text = response
            .choices
            .first()
            .map(|c| c.message.content.trim().to_string())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(SuggestionError::MalformedResponse);
        }
        Ok(text)
    }
}

impl Default for GenerationClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextGenerator for GenerationClient {
    async fn generate(&self, prompt: &str) -> Result<String, SuggestionError> {
        let api_key =
            self.credentials.resolve().map_err(|_| SuggestionError::MissingCredential)?;

        self.request_completion(&api_key, prompt, SUGGESTION_MAX_TOKENS, SUGGESTION_TIMEOUT).await
    }
}

fn map_status(status: StatusCode, body: &str) -> SuggestionError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SuggestionError::Unauthorized,
        StatusCode::TOO_MANY_REQUESTS => SuggestionError::RateLimited,
        s if s.is_server_error() => SuggestionError::Server,
        s => {
            // surface the service's own message when the body carries one
            let message = serde_json::from_str::<ErrorBody>(body)
                .ok()
                .map(|b| b.error.message)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| format!("API error ({}). Please try again.", s.as_u16()));
            SuggestionError::Api(message)
        }
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(map_status(StatusCode::UNAUTHORIZED, ""), SuggestionError::Unauthorized);
        assert_eq!(map_status(StatusCode::FORBIDDEN, ""), SuggestionError::Unauthorized);
        assert_eq!(map_status(StatusCode::TOO_MANY_REQUESTS, ""), SuggestionError::RateLimited);
        assert_eq!(map_status(StatusCode::INTERNAL_SERVER_ERROR, ""), SuggestionError::Server);
        assert_eq!(map_status(StatusCode::BAD_GATEWAY, ""), SuggestionError::Server);
    }

    #[test]
    fn test_status_mapping_uses_service_message_when_present() {
        let body = r#"{"error": {"message": "model not found"}}"#;
        assert_eq!(
            map_status(StatusCode::NOT_FOUND, body),
            SuggestionError::Api("model not found".to_string())
        );
    }

    #[test]
    fn test_status_mapping_falls_back_to_generic_message() {
        assert_eq!(
            map_status(StatusCode::BAD_REQUEST, "not json"),
            SuggestionError::Api("API error (400). Please try again.".to_string())
        );
    }

    #[test]
    fn test_builder_overrides() {
        let client = GenerationClient::new()
            .with_model("gpt-4o-mini")
            .with_base_url("http://localhost:9000/v1");
        assert_eq!(client.model, "gpt-4o-mini");
        assert_eq!(client.base_url, "http://localhost:9000/v1");
    }
}
