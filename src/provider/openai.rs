//! OpenAI 互換 Chat Completions API クライアント
//!
//! # 責務
//!
//! - `POST {api_base}/chat/completions` を呼び出し、[`ProviderClient`] を実装する
//! - HTTP ステータスを [`ProviderError`] へ対応付ける
//! - OpenAI / OpenRouter の両方で同じ実装を使う（ベースURLとモデル名のみ異なる）
//!
//! # レスポンス形式
//!
//! ```json
//! {
//!   "model": "gpt-4o-mini",
//!   "choices": [{"message": {"content": "..."}, "finish_reason": "stop"}],
//!   "usage": {"prompt_tokens": 10, "completion_tokens": 5}
//! }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{LlmSettings, Provider};
use crate::error::ProviderError;
use super::model_tier::resolve_model;
use super::traits::{CompletionRequest, ProviderClient, ProviderResponse, StopReason, TokenUsage};

/// Chat Completions API クライアント
#[derive(Debug, Clone)]
pub struct OpenAIClient {
    client: reqwest::Client,
    provider: Provider,
    api_base: String,
    api_key: String,
    /// 設定されている場合はティアからの解決より優先する
    model_override: Option<String>,
}

impl OpenAIClient {
    /// APIキーとベースURLを指定してクライアントを生成
    pub fn new(
        provider: Provider,
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Config(format!("HTTP クライアントを生成できません: {e}")))?;

        Ok(Self {
            client,
            provider,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model_override: None,
        })
    }

    /// 設定から生成（APIキーは呼び出し側が環境変数から解決して渡す）
    pub fn from_settings(settings: &LlmSettings, api_key: impl Into<String>) -> Result<Self, ProviderError> {
        let mut client = Self::new(settings.provider, &settings.api_base, api_key, settings.timeout)?;
        client.model_override = settings.model.clone();
        Ok(client)
    }

    /// モデル名を固定する
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model_override = Some(model.into());
        self
    }

    fn model_for(&self, request: &CompletionRequest) -> String {
        self.model_override
            .clone()
            .unwrap_or_else(|| resolve_model(&self.provider, &request.model_tier).to_string())
    }

    fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.api_base)
    }

    /// ステータスコードからエラーを判定
    fn error_for_status(status: u16, body: String) -> ProviderError {
        match status {
            401 | 403 => ProviderError::AuthenticationError(body),
            408 | 504 => ProviderError::Timeout(body),
            429 => ProviderError::RateLimitExceeded,
            _ => ProviderError::ApiError { status, message: body },
        }
    }

    /// レスポンス本文をパースして [`ProviderResponse`] に変換
    fn parse_response(&self, body: &str, requested_model: &str) -> Result<ProviderResponse, ProviderError> {
        let parsed: ChatResponse = serde_json::from_str(body)
            .map_err(|e| ProviderError::InvalidResponse(format!("JSON parse error: {e}")))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::InvalidResponse("choices が空です".to_string()))?;

        let content = choice.message.content.unwrap_or_default();
        let token_usage = parsed
            .usage
            .map(|u| TokenUsage {
                input_tokens: u.prompt_tokens.unwrap_or(0),
                output_tokens: u.completion_tokens.unwrap_or(0),
            })
            .unwrap_or_default();

        Ok(ProviderResponse {
            content: content.trim().to_string(),
            token_usage,
            stop_reason: StopReason::from_finish_reason(choice.finish_reason.as_deref()),
            model: parsed.model.unwrap_or_else(|| requested_model.to_string()),
        })
    }
}

#[async_trait]
impl ProviderClient for OpenAIClient {
    async fn execute(&self, request: &CompletionRequest) -> Result<ProviderResponse, ProviderError> {
        let model = self.model_for(request);
        let body = ChatRequest {
            model: &model,
            messages: vec![
                ChatMessage { role: "system", content: &request.system_prompt },
                ChatMessage { role: "user", content: &request.user_input },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };
        let payload = serde_json::to_string(&body)
            .map_err(|e| ProviderError::InvalidResponse(format!("リクエストを生成できません: {e}")))?;

        debug!(model = %model, input_chars = request.user_input.len(), "chat completion request");

        let response = self
            .client
            .post(self.chat_url())
            .bearer_auth(&self.api_key)
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(e.to_string())
                } else {
                    ProviderError::Http(e)
                }
            })?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(Self::error_for_status(status.as_u16(), text));
        }

        self.parse_response(&text, &model)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: Option<u32>,
    #[serde(default)]
    completion_tokens: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelTier;

    fn client() -> OpenAIClient {
        OpenAIClient::new(Provider::OpenAI, "https://api.example.test/v1/", "sk-test", Duration::from_secs(5))
            .unwrap()
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        assert_eq!(client().chat_url(), "https://api.example.test/v1/chat/completions");
    }

    #[test]
    fn test_model_resolution() {
        let request = CompletionRequest::new("s", "u", ModelTier::Light);
        assert_eq!(client().model_for(&request), "gpt-4o-mini");
        assert_eq!(client().with_model("gpt-4.1").model_for(&request), "gpt-4.1");
    }

    #[test]
    fn test_parse_response_success() {
        let body = r#"{"model":"gpt-4o-mini","choices":[{"message":{"content":"  web \n"},"finish_reason":"stop"}],"usage":{"prompt_tokens":12,"completion_tokens":1}}"#;
        let response = client().parse_response(body, "fallback").unwrap();

        assert_eq!(response.content, "web");
        assert_eq!(response.model, "gpt-4o-mini");
        assert_eq!(response.token_usage.total(), 13);
        assert_eq!(response.stop_reason, StopReason::EndTurn);
    }

    #[test]
    fn test_parse_response_without_choices() {
        let result = client().parse_response(r#"{"choices":[]}"#, "m");
        assert!(matches!(result, Err(ProviderError::InvalidResponse(_))));
    }

    #[test]
    fn test_parse_response_invalid_json() {
        let result = client().parse_response("not json", "m");
        assert!(matches!(result, Err(ProviderError::InvalidResponse(_))));
    }

    #[test]
    fn test_error_for_status() {
        assert!(matches!(
            OpenAIClient::error_for_status(401, String::new()),
            ProviderError::AuthenticationError(_)
        ));
        assert!(matches!(
            OpenAIClient::error_for_status(429, String::new()),
            ProviderError::RateLimitExceeded
        ));
        assert!(matches!(
            OpenAIClient::error_for_status(500, "boom".into()),
            ProviderError::ApiError { status: 500, .. }
        ));
    }
}
