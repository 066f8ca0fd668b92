//! OpenAI-compatible chat completions client.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use cvassist_shared::{CvAssistError, LlmConfig, Result};

use crate::{ChatRequest, GenerativeService};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: [WireMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl<'a> CompletionRequest<'a> {
    fn from_chat(request: &'a ChatRequest) -> Self {
        Self {
            model: &request.model,
            temperature: request.temperature,
            messages: [
                WireMessage {
                    role: "system",
                    content: &request.system,
                },
                WireMessage {
                    role: "user",
                    content: &request.task,
                },
            ],
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Blocking client for `POST {base_url}/chat/completions`.
pub struct OpenAiService {
    client: reqwest::blocking::Client,
    endpoint: String,
    api_key: String,
}

impl OpenAiService {
    /// Build a client for `base_url` with a bearer token and request timeout.
    pub fn new(base_url: &str, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("cvassist/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| CvAssistError::Service(format!("client build: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key: api_key.into(),
        })
    }

    /// Build a client from the `[llm]` config, reading the key from its env var.
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            CvAssistError::config(format!(
                "API key not found. Set the {} environment variable.",
                config.api_key_env
            ))
        })?;
        Self::new(
            &config.base_url,
            api_key,
            Duration::from_secs(config.timeout_secs),
        )
    }
}

impl GenerativeService for OpenAiService {
    #[instrument(skip_all, fields(model = %request.model, temperature = request.temperature))]
    fn invoke(&self, request: &ChatRequest) -> Result<String> {
        let body = CompletionRequest::from_chat(request);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| CvAssistError::Service(format!("{}: {e}", self.endpoint)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            let snippet: String = text.chars().take(500).collect();
            return Err(CvAssistError::Service(format!("HTTP {status}: {snippet}")));
        }

        let parsed: CompletionResponse = response
            .json()
            .map_err(|e| CvAssistError::Service(format!("invalid response body: {e}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| CvAssistError::Service("response contained no message content".into()))?;

        debug!(chars = content.len(), "generative service replied");
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn chat() -> ChatRequest {
        ChatRequest {
            system: "You are an expert.".into(),
            task: "# Task: do it".into(),
            model: "gpt-4o".into(),
            temperature: 0.3,
        }
    }

    fn invoke_blocking(base_url: String, request: ChatRequest) -> Result<String> {
        let service = OpenAiService::new(&base_url, "test-key", Duration::from_secs(5))?;
        service.invoke(&request)
    }

    #[test]
    fn request_serializes_two_messages() {
        let request = chat();
        let json = serde_json::to_value(CompletionRequest::from_chat(&request)).unwrap();
        assert_eq!(json["model"], "gpt-4o");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][0]["content"], "You are an expert.");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "# Task: do it");
    }

    #[test]
    fn response_without_choices_deserializes() {
        let parsed: CompletionResponse = serde_json::from_str(r#"{"id":"x"}"#).unwrap();
        assert!(parsed.choices.is_empty());
    }

    #[tokio::test]
    async fn invoke_returns_first_choice() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({"model": "gpt-4o"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "# Jane Smith"}}]
            })))
            .mount(&server)
            .await;

        let base = format!("{}/v1", server.uri());
        let text = tokio::task::spawn_blocking(move || invoke_blocking(base, chat()))
            .await
            .unwrap()
            .expect("invoke");
        assert_eq!(text, "# Jane Smith");
    }

    #[tokio::test]
    async fn invoke_surfaces_http_errors() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .expect(1)
            .mount(&server)
            .await;

        let base = server.uri();
        let err = tokio::task::spawn_blocking(move || invoke_blocking(base, chat()))
            .await
            .unwrap()
            .unwrap_err();
        assert!(matches!(err, CvAssistError::Service(_)));
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("rate limited"));
    }

    #[tokio::test]
    async fn invoke_rejects_empty_choices() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})),
            )
            .mount(&server)
            .await;

        let base = server.uri();
        let err = tokio::task::spawn_blocking(move || invoke_blocking(base, chat()))
            .await
            .unwrap()
            .unwrap_err();
        assert!(err.to_string().contains("no message content"));
    }

    #[test]
    fn from_config_requires_key() {
        let config = LlmConfig {
            api_key_env: "CVA_TEST_MISSING_OPENAI_KEY_987".into(),
            ..LlmConfig::default()
        };
        let err = OpenAiService::from_config(&config).err().expect("missing key");
        assert!(err.to_string().contains("CVA_TEST_MISSING_OPENAI_KEY_987"));
    }
}
