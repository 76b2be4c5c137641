//! LLM backend (spec §4.8): a chat-completion adapter for an
//! OpenAI-chat-compatible gateway — `complete`/`generate` for a whole
//! response, `generate_stream` for token-by-token delivery over a
//! channel. Retries transient upstream failures with exponential
//! backoff; a partial stream that fails mid-flight ends with a single
//! terminal error rather than silently truncating.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use txrag_config::LlmConfig;

use crate::prompt::{Message, Role};
use crate::LlmError;

const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF: Duration = Duration::from_millis(200);

/// Mild repetition discouragement (spec §4.8): frequency and presence
/// penalty both around 0.3.
const FREQUENCY_PENALTY: f32 = 0.3;
const PRESENCE_PENALTY: f32 = 0.3;
const TOP_P: f32 = 0.9;

#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub text: String,
    pub tokens: usize,
    pub time_to_first_token_ms: u64,
    pub total_time_ms: u64,
    pub tokens_per_second: f32,
    pub finish_reason: FinishReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    Cancelled,
}

/// Seam implemented by every chat-completion provider the engine talks
/// to. The default `estimate_tokens` is shared with the prompt
/// assembler's own heuristic so a caller can budget without a live call.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    async fn generate(&self, messages: &[Message]) -> Result<GenerationResult, LlmError>;

    async fn generate_stream(
        &self,
        messages: &[Message],
        tx: mpsc::Sender<String>,
    ) -> Result<GenerationResult, LlmError>;

    async fn is_available(&self) -> bool;

    fn model_name(&self) -> &str;

    fn estimate_tokens(&self, text: &str) -> usize {
        crate::prompt::estimate_tokens(text)
    }
}

/// Chat-completion backend for any OpenAI-compatible gateway: OpenAI
/// itself, Azure OpenAI, or a self-hosted server exposing the same
/// `/chat/completions` schema.
pub struct OpenAiBackend {
    config: LlmConfig,
    client: Client,
}

impl OpenAiBackend {
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| LlmError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    fn build_headers(&self) -> reqwest::header::HeaderMap {
        use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};

        let mut headers = reqwest::header::HeaderMap::new();
        if !self.config.api_key.is_empty() {
            let auth_value = format!("Bearer {}", self.config.api_key);
            if let Ok(val) = HeaderValue::from_str(&auth_value) {
                headers.insert(AUTHORIZATION, val);
            }
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }

    fn request_for(&self, messages: &[Message], stream: bool) -> ChatRequest {
        ChatRequest {
            model: self.config.model.clone(),
            messages: messages.iter().map(ChatMessage::from).collect(),
            max_tokens: Some(self.config.max_tokens),
            temperature: Some(self.config.temperature),
            top_p: Some(TOP_P),
            frequency_penalty: Some(FREQUENCY_PENALTY),
            presence_penalty: Some(PRESENCE_PENALTY),
            stream: Some(stream),
        }
    }

    async fn execute(&self, request: &ChatRequest) -> Result<ChatResponse, LlmError> {
        let response = self
            .client
            .post(self.chat_url())
            .headers(self.build_headers())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status.is_server_error() {
                return Err(LlmError::Network(format!("upstream {status}: {body}")));
            }
            return Err(LlmError::Api(format!("upstream {status}: {body}")));
        }

        response.json().await.map_err(|e| LlmError::InvalidResponse(e.to_string()))
    }

    fn is_retryable(error: &LlmError) -> bool {
        matches!(error, LlmError::Network(_) | LlmError::Timeout)
    }

    async fn generate_with_retry(&self, request: &ChatRequest) -> Result<ChatResponse, LlmError> {
        let mut backoff = INITIAL_BACKOFF;
        let mut last_error = None;

        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                tracing::warn!(attempt, ?backoff, "llm request failed, retrying");
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }

            match self.execute(request).await {
                Ok(response) => return Ok(response),
                Err(e) if Self::is_retryable(&e) => last_error = Some(e),
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| LlmError::Network("max retries exceeded".to_string())))
    }
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
    async fn generate(&self, messages: &[Message]) -> Result<GenerationResult, LlmError> {
        let start = std::time::Instant::now();
        let request = self.request_for(messages, false);
        let response = self.generate_with_retry(&request).await?;

        let choice = response
            .choices
            .first()
            .ok_or_else(|| LlmError::InvalidResponse("no choices in response".to_string()))?;

        let total_time_ms = start.elapsed().as_millis() as u64;
        let tokens = response.usage.map(|u| u.completion_tokens).unwrap_or(0);

        Ok(GenerationResult {
            text: choice.message.content.clone(),
            tokens,
            time_to_first_token_ms: total_time_ms,
            total_time_ms,
            tokens_per_second: if total_time_ms > 0 {
                tokens as f32 / (total_time_ms as f32 / 1000.0)
            } else {
                0.0
            },
            finish_reason: match choice.finish_reason.as_deref() {
                Some("length") => FinishReason::Length,
                _ => FinishReason::Stop,
            },
        })
    }

    async fn generate_stream(
        &self,
        messages: &[Message],
        tx: mpsc::Sender<String>,
    ) -> Result<GenerationResult, LlmError> {
        use futures::StreamExt;

        let start = std::time::Instant::now();
        let request = self.request_for(messages, true);

        let response = self
            .client
            .post(self.chat_url())
            .headers(self.build_headers())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("upstream {status}: {body}")));
        }

        let mut first_token_time: Option<u64> = None;
        let mut full_text = String::new();
        let mut token_count = 0;
        let mut buffer = String::new();
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| LlmError::Network(e.to_string()))?;
            buffer.push_str(&String::from_utf8_lossy(&chunk));

            while let Some(line_end) = buffer.find('\n') {
                let line = buffer[..line_end].trim().to_string();
                buffer = buffer[line_end + 1..].to_string();

                if line.is_empty() || line == "data: [DONE]" {
                    continue;
                }

                let Some(json_str) = line.strip_prefix("data: ") else {
                    continue;
                };

                let parsed: StreamChunk = match serde_json::from_str(json_str) {
                    Ok(c) => c,
                    Err(_) => continue,
                };

                let Some(choice) = parsed.choices.first() else { continue };
                let Some(content) = choice.delta.as_ref().and_then(|d| d.content.as_ref()) else {
                    continue;
                };

                if first_token_time.is_none() {
                    first_token_time = Some(start.elapsed().as_millis() as u64);
                }
                full_text.push_str(content);
                token_count += 1;

                if tx.send(content.clone()).await.is_err() {
                    return Ok(GenerationResult {
                        text: full_text,
                        tokens: token_count,
                        time_to_first_token_ms: first_token_time.unwrap_or(0),
                        total_time_ms: start.elapsed().as_millis() as u64,
                        tokens_per_second: 0.0,
                        finish_reason: FinishReason::Cancelled,
                    });
                }
            }
        }

        let total_time_ms = start.elapsed().as_millis() as u64;
        Ok(GenerationResult {
            text: full_text,
            tokens: token_count,
            time_to_first_token_ms: first_token_time.unwrap_or(total_time_ms),
            total_time_ms,
            tokens_per_second: if total_time_ms > 0 {
                token_count as f32 / (total_time_ms as f32 / 1000.0)
            } else {
                0.0
            },
            finish_reason: FinishReason::Stop,
        })
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/models", self.config.base_url.trim_end_matches('/'));
        self.client
            .get(&url)
            .headers(self.build_headers())
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frequency_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    presence_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

impl From<&Message> for ChatMessage {
    fn from(msg: &Message) -> Self {
        let role = match msg.role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        Self { role: role.to_string(), content: msg.content.clone() }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    completion_tokens: usize,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: Option<Delta>,
}

#[derive(Debug, Deserialize)]
struct Delta {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: &str, api_key: &str) -> LlmConfig {
        LlmConfig {
            api_key: api_key.to_string(),
            base_url: base_url.to_string(),
            model: "gpt-4".to_string(),
            temperature: 0.7,
            max_tokens: 3000,
            timeout_seconds: 30,
        }
    }

    #[test]
    fn chat_url_joins_base_and_path() {
        let backend = OpenAiBackend::new(config("https://api.openai.com/v1", "sk-test")).unwrap();
        assert_eq!(backend.chat_url(), "https://api.openai.com/v1/chat/completions");
    }

    #[test]
    fn chat_url_trims_trailing_slash() {
        let backend = OpenAiBackend::new(config("https://api.openai.com/v1/", "sk-test")).unwrap();
        assert_eq!(backend.chat_url(), "https://api.openai.com/v1/chat/completions");
    }

    #[test]
    fn request_carries_spec_mandated_parameters() {
        let backend = OpenAiBackend::new(config("https://api.openai.com/v1", "sk-test")).unwrap();
        let request = backend.request_for(&[Message::user("hi")], false);
        assert_eq!(request.top_p, Some(TOP_P));
        assert_eq!(request.frequency_penalty, Some(FREQUENCY_PENALTY));
        assert_eq!(request.presence_penalty, Some(PRESENCE_PENALTY));
    }

    #[test]
    fn message_role_maps_to_lowercase_strings() {
        let msg = ChatMessage::from(&Message::system("be helpful"));
        assert_eq!(msg.role, "system");
    }

    #[test]
    fn model_name_reflects_config() {
        let backend = OpenAiBackend::new(config("https://api.openai.com/v1", "sk-test")).unwrap();
        assert_eq!(backend.model_name(), "gpt-4");
    }
}
