use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub text: String,
    pub usage: Option<Usage>,
}

/// Failures from one request, each class surfaced distinctly so the loop can
/// tell the user what actually went wrong. No automatic retry anywhere.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("authentication rejected (status {status}): {detail}")]
    Auth { status: u16, detail: String },
    #[error("rate limit or quota exhausted: {0}")]
    RateLimited(String),
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),
    #[error("API returned status {status}: {detail}")]
    Api { status: u16, detail: String },
    #[error("could not parse API response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Anthropic,
    OpenAi,
    Custom,
}

impl Provider {
    pub fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "claude" | "anthropic" => Provider::Anthropic,
            "openai" => Provider::OpenAi,
            _ => Provider::Custom,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// Synchronous (one request per round) client for hosted text-generation
/// endpoints. Anthropic gets its native wire format; everything else goes
/// through the OpenAI-compatible `/chat/completions` shape.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    pub provider: Provider,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl ApiClient {
    pub fn new(
        provider: &str,
        endpoint: &str,
        api_key: &str,
        model: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .user_agent("codeloom/0.1")
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            provider: Provider::parse(provider),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            temperature,
            max_tokens,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn send_message(&self, history: &[ChatMessage]) -> Result<ApiResponse, ApiError> {
        match self.provider {
            Provider::Anthropic => self.send_anthropic(history).await,
            Provider::OpenAi | Provider::Custom => self.send_chat_completions(history).await,
        }
    }

    async fn send_anthropic(&self, history: &[ChatMessage]) -> Result<ApiResponse, ApiError> {
        // The Anthropic API takes system text as a top-level field, not a
        // message role.
        let system: Vec<&str> = history
            .iter()
            .filter(|m| m.role == "system")
            .map(|m| m.content.as_str())
            .collect();
        let messages: Vec<Value> = history
            .iter()
            .filter(|m| m.role != "system")
            .map(|m| json!({ "role": m.role, "content": m.content }))
            .collect();

        let mut body = json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
            "messages": messages,
        });
        if !system.is_empty() {
            body["system"] = json!(system.join("\n\n"));
        }

        let response = self
            .client
            .post(format!("{}/v1/messages", self.endpoint))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&body)
            .send()
            .await
            .map_err(ApiError::Network)?;

        let value: Value = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ApiError::MalformedResponse(e.to_string()))?;

        let text = value["content"]
            .as_array()
            .and_then(|blocks| blocks.iter().find_map(|block| block["text"].as_str()))
            .ok_or_else(|| {
                ApiError::MalformedResponse("no text block in response content".to_string())
            })?
            .to_string();

        let usage = value.get("usage").and_then(|u| {
            let prompt = u["input_tokens"].as_u64()? as u32;
            let completion = u["output_tokens"].as_u64()? as u32;
            Some(Usage {
                prompt_tokens: prompt,
                completion_tokens: completion,
                total_tokens: prompt + completion,
            })
        });

        Ok(ApiResponse { text, usage })
    }

    async fn send_chat_completions(&self, history: &[ChatMessage]) -> Result<ApiResponse, ApiError> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: history,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let mut builder = self
            .client
            .post(format!("{}/chat/completions", self.endpoint))
            .json(&request);
        if !self.api_key.is_empty() {
            builder = builder.header("Authorization", format!("Bearer {}", self.api_key));
        }

        let response = builder.send().await.map_err(ApiError::Network)?;
        let parsed: ChatCompletionResponse = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ApiError::MalformedResponse(e.to_string()))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::MalformedResponse("no choices in response".to_string()))?;

        Ok(ApiResponse {
            text: choice.message.content,
            usage: parsed.usage,
        })
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let detail = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown error".to_string());
        Err(match status.as_u16() {
            401 | 403 => ApiError::Auth {
                status: status.as_u16(),
                detail,
            },
            429 => ApiError::RateLimited(detail),
            other => ApiError::Api {
                status: other,
                detail,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_names_parse_case_insensitively() {
        assert_eq!(Provider::parse("Anthropic"), Provider::Anthropic);
        assert_eq!(Provider::parse("claude"), Provider::Anthropic);
        assert_eq!(Provider::parse("OpenAI"), Provider::OpenAi);
        assert_eq!(Provider::parse("llama-server"), Provider::Custom);
    }

    #[test]
    fn error_display_names_the_failure_class() {
        let auth = ApiError::Auth {
            status: 401,
            detail: "bad key".to_string(),
        };
        assert!(auth.to_string().contains("authentication"));

        let quota = ApiError::RateLimited("slow down".to_string());
        assert!(quota.to_string().contains("rate limit"));
    }
}
