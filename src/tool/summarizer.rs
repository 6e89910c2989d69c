//! LLM による要約

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, warn};

use crate::config::ModelTier;
use crate::error::ToolError;
use crate::provider::{CompletionRequest, ProviderClient, StopReason};
use super::traits::{optional_str, payload, truncate_chars, Payload, Tool, ToolKind};

const SYSTEM_PROMPT: &str = "You are a regulatory analyst writing for a bank's compliance team. \
Summarize the source text according to the objective. Do not invent facts that are not in the text.";

/// 抽出テキストを目的に沿って要約するツール
///
/// 入力は `extracted_text` + `url` の組、または `text` + `source_url` の組を受け付けます。
/// `objective` が空でなければ既定の目的の代わりに使います。
pub struct LlmSummarizer {
    client: Arc<dyn ProviderClient>,
    tier: ModelTier,
    default_objective: String,
    max_input_chars: usize,
}

impl LlmSummarizer {
    pub fn new(
        client: Arc<dyn ProviderClient>,
        tier: ModelTier,
        default_objective: impl Into<String>,
        max_input_chars: usize,
    ) -> Self {
        Self {
            client,
            tier,
            default_objective: default_objective.into(),
            max_input_chars,
        }
    }

    fn missing(&self, key: &str) -> ToolError {
        ToolError::MissingInput {
            tool: self.name().to_string(),
            key: key.to_string(),
        }
    }
}

#[async_trait]
impl Tool for LlmSummarizer {
    fn name(&self) -> &str {
        "summarizer"
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Summarizer
    }

    async fn run(&self, inputs: &Payload) -> Result<Payload, ToolError> {
        let text = inputs
            .get("extracted_text")
            .or_else(|| inputs.get("text"))
            .and_then(|v| v.as_str())
            .ok_or_else(|| self.missing("extracted_text"))?;
        let url = inputs
            .get("url")
            .or_else(|| inputs.get("source_url"))
            .and_then(|v| v.as_str())
            .ok_or_else(|| self.missing("url"))?;
        let objective = optional_str(inputs, "objective").unwrap_or(self.default_objective.as_str());

        let request = CompletionRequest::new(
            SYSTEM_PROMPT,
            format!(
                "Objective: {objective}\nSource: {url}\n\nText:\n{}",
                truncate_chars(text, self.max_input_chars)
            ),
            self.tier,
        );

        let response = self.client.execute(&request).await?;
        debug!(url, tokens = response.token_usage.total(), "要約を生成しました");
        if response.stop_reason == StopReason::MaxTokens {
            warn!(url, "要約がトークン上限で打ち切られました");
        }

        Ok(payload([
            ("source_url", json!(url)),
            ("summary", json!(response.content.trim())),
        ]))
    }
}
