//! LLM による規制アップデートの抽出
//!
//! # 責務
//!
//! - ページテキストから `{date, topic, context, regulator, link}` のレコード配列を得る
//! - 応答に説明文が混ざっていても最初の `[` から最後の `]` までを JSON として読む
//! - 相対リンクをページ URL 基準で絶対化する
//!
//! 空配列は正常な結果として扱います。

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Url;
use serde_json::json;
use tracing::debug;

use crate::config::ModelTier;
use crate::error::ToolError;
use crate::model::UpdateRecord;
use crate::provider::{CompletionRequest, ProviderClient};
use super::traits::{json_span, payload, require_str, truncate_chars, Payload, Tool, ToolKind};

const SYSTEM_PROMPT: &str = "You extract regulatory updates from the text of a regulator's \
web page. Return only a JSON array. Each element is an object with the keys \
\"date\", \"topic\", \"context\", \"regulator\" and \"link\". Use null for unknown values. \
Return [] if the page lists no updates.";

/// LLM によるレコード抽出ツール
pub struct LlmRecordExtractor {
    client: Arc<dyn ProviderClient>,
    tier: ModelTier,
    max_input_chars: usize,
}

impl LlmRecordExtractor {
    pub fn new(client: Arc<dyn ProviderClient>, tier: ModelTier, max_input_chars: usize) -> Self {
        Self {
            client,
            tier,
            max_input_chars,
        }
    }

    fn parse_records(&self, url: &str, reply: &str) -> Result<Vec<UpdateRecord>, ToolError> {
        let span = json_span(reply, '[', ']').ok_or_else(|| ToolError::InvalidOutput {
            tool: self.name().to_string(),
            reason: "応答に JSON 配列がありません".to_string(),
        })?;

        let mut records: Vec<UpdateRecord> =
            serde_json::from_str(span).map_err(|e| ToolError::InvalidOutput {
                tool: self.name().to_string(),
                reason: e.to_string(),
            })?;

        let base = Url::parse(url).ok();
        for record in &mut records {
            if let (Some(base), Some(link)) = (&base, &record.link)
                && let Ok(absolute) = base.join(link.trim())
            {
                record.link = Some(absolute.to_string());
            }
        }
        Ok(records)
    }
}

#[async_trait]
impl Tool for LlmRecordExtractor {
    fn name(&self) -> &str {
        "record_extractor"
    }

    fn kind(&self) -> ToolKind {
        ToolKind::RecordExtractor
    }

    async fn run(&self, inputs: &Payload) -> Result<Payload, ToolError> {
        let url = require_str(self.name(), inputs, "url")?;
        let text = require_str(self.name(), inputs, "extracted_text")?;

        let request = CompletionRequest::new(
            SYSTEM_PROMPT,
            format!(
                "Page URL: {url}\n\nPage text:\n{}",
                truncate_chars(text, self.max_input_chars)
            ),
            self.tier,
        )
        .with_temperature(0.0);

        let response = self.client.execute(&request).await?;
        let records = self.parse_records(url, &response.content)?;
        debug!(url, count = records.len(), "レコードを抽出しました");

        let records = serde_json::to_value(records).map_err(|e| ToolError::InvalidOutput {
            tool: self.name().to_string(),
            reason: e.to_string(),
        })?;
        Ok(payload([("url", json!(url)), ("extracted_records", records)]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::mock::MockProviderClient;

    fn extractor(reply: &str) -> LlmRecordExtractor {
        LlmRecordExtractor::new(Arc::new(MockProviderClient::new(vec![reply])), ModelTier::Light, 100)
    }

    fn inputs() -> Payload {
        payload([
            ("url", json!("https://www.bis.org/press/index.htm")),
            ("extracted_text", json!("12 May 2025 Basel Committee consults (/press/p1.htm)")),
        ])
    }

    #[tokio::test]
    async fn test_records_parsed_from_prose() {
        let reply = r#"Sure! Here are the updates:
[{"date": "12 May 2025", "topic": "Basel Committee consults", "context": null,
  "regulator": "BCBS", "link": "/press/p1.htm"}]
Let me know if you need more."#;
        let out = extractor(reply).run(&inputs()).await.unwrap();

        let records: Vec<UpdateRecord> = serde_json::from_value(out["extracted_records"].clone()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].regulator.as_deref(), Some("BCBS"));
        assert_eq!(records[0].link.as_deref(), Some("https://www.bis.org/press/p1.htm"));
        assert_eq!(out["url"], json!("https://www.bis.org/press/index.htm"));
    }

    #[tokio::test]
    async fn test_empty_array_is_valid() {
        let out = extractor("[]").run(&inputs()).await.unwrap();
        assert_eq!(out["extracted_records"], json!([]));
    }

    #[tokio::test]
    async fn test_reply_without_array_is_invalid() {
        let err = extractor("No updates found.").run(&inputs()).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidOutput { .. }));
    }

    #[tokio::test]
    async fn test_input_is_truncated() {
        let mock = MockProviderClient::new(vec!["[]"]);
        let extractor = LlmRecordExtractor::new(Arc::new(mock.clone()), ModelTier::Light, 10);
        let inputs = payload([("url", json!("https://x.test")), ("extracted_text", json!("x".repeat(50)))]);
        extractor.run(&inputs).await.unwrap();

        let requests = mock.requests.lock().unwrap();
        assert!(requests[0].user_input.ends_with(&"x".repeat(10)));
        assert!(!requests[0].user_input.contains(&"x".repeat(11)));
    }
}
