//! LLM による除外判定
//!
//! # 責務
//!
//! 抽出済みレコードを1件ずつ LLM に評価させ、`recommendation`（`Include` / `Exclude`）と
//! `reason` を付与します。
//!
//! # 失敗時の扱い
//!
//! 1件の評価に失敗してもツール全体は失敗させず、そのレコードを `Exclude` とし、
//! 理由にエラー内容を記録します。

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::config::ModelTier;
use crate::error::ToolError;
use crate::model::UpdateRecord;
use crate::provider::{CompletionRequest, ProviderClient};
use super::traits::{json_span, payload, require_str, truncate_chars, Payload, Tool, ToolKind};

/// プロンプトに含めるトピックの最大文字数
pub const MAX_TOPIC_CHARS: usize = 300;
/// プロンプトに含める文脈の最大文字数
pub const MAX_CONTEXT_CHARS: usize = 1000;

const INCLUDE: &str = "Include";
const EXCLUDE: &str = "Exclude";

const SYSTEM_PROMPT: &str = "You review regulatory updates for a large global bank. \
Exclude items that are irrelevant to banking regulation, such as speeches without policy \
content, staff appointments, events or generic news. Respond only with JSON of the form \
{\"recommendation\": \"Include\" or \"Exclude\", \"reason\": \"<one sentence>\"}.";

#[derive(Debug, Deserialize)]
struct Verdict {
    recommendation: String,
    #[serde(default)]
    reason: String,
}

/// LLM による除外判定ツール
pub struct LlmExclusionFilter {
    client: Arc<dyn ProviderClient>,
    tier: ModelTier,
    drop_excluded: bool,
}

impl LlmExclusionFilter {
    pub fn new(client: Arc<dyn ProviderClient>, tier: ModelTier) -> Self {
        Self {
            client,
            tier,
            drop_excluded: false,
        }
    }

    /// `Exclude` 判定のレコードを出力から取り除くか
    pub fn with_drop_excluded(mut self, drop_excluded: bool) -> Self {
        self.drop_excluded = drop_excluded;
        self
    }

    async fn review(&self, record: &UpdateRecord) -> Result<Verdict, ToolError> {
        let topic = truncate_chars(record.topic.as_deref().unwrap_or_default(), MAX_TOPIC_CHARS);
        let context = truncate_chars(record.context.as_deref().unwrap_or_default(), MAX_CONTEXT_CHARS);
        let regulator = record.regulator.as_deref().unwrap_or("unknown");

        let request = CompletionRequest::new(
            SYSTEM_PROMPT,
            format!("Regulator: {regulator}\nTopic: {topic}\nContext: {context}"),
            self.tier,
        )
        .with_temperature(0.0);

        let response = self.client.execute(&request).await?;
        let span = json_span(&response.content, '{', '}').ok_or_else(|| ToolError::InvalidOutput {
            tool: self.name().to_string(),
            reason: "応答に JSON オブジェクトがありません".to_string(),
        })?;
        serde_json::from_str(span).map_err(|e| ToolError::InvalidOutput {
            tool: self.name().to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl Tool for LlmExclusionFilter {
    fn name(&self) -> &str {
        "exclusion"
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Exclusion
    }

    async fn run(&self, inputs: &Payload) -> Result<Payload, ToolError> {
        let url = require_str(self.name(), inputs, "url")?;
        let records = inputs
            .get("extracted_records")
            .cloned()
            .ok_or_else(|| ToolError::MissingInput {
                tool: self.name().to_string(),
                key: "extracted_records".to_string(),
            })?;
        let records: Vec<UpdateRecord> =
            serde_json::from_value(records).map_err(|e| ToolError::InvalidOutput {
                tool: self.name().to_string(),
                reason: format!("extracted_records を解釈できません: {e}"),
            })?;

        let mut reviewed = Vec::with_capacity(records.len());
        for mut record in records {
            match self.review(&record).await {
                Ok(verdict) => {
                    let include = verdict.recommendation.trim().eq_ignore_ascii_case(INCLUDE);
                    record.recommendation = Some(if include { INCLUDE } else { EXCLUDE }.to_string());
                    record.reason = Some(verdict.reason.trim().to_string());
                }
                Err(e) => {
                    warn!(topic = ?record.topic, error = %e, "除外判定に失敗したため Exclude とします");
                    record.recommendation = Some(EXCLUDE.to_string());
                    record.reason = Some(format!("LLM error: {e}"));
                }
            }
            reviewed.push(record);
        }

        let total = reviewed.len();
        if self.drop_excluded {
            reviewed.retain(|record| !record.is_excluded());
        }
        info!(url, total, kept = reviewed.len(), "除外判定が完了しました");

        let filtered = serde_json::to_value(reviewed).map_err(|e| ToolError::InvalidOutput {
            tool: self.name().to_string(),
            reason: e.to_string(),
        })?;
        Ok(payload([("url", json!(url)), ("filtered_records", filtered)]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::mock::MockProviderClient;

    fn records() -> Payload {
        payload([
            ("url", json!("https://www.fca.org.uk/news")),
            (
                "extracted_records",
                json!([
                    {"topic": "Capital requirements consultation", "regulator": "PRA"},
                    {"topic": "New board member appointed", "regulator": "FCA"},
                    {"topic": "Liquidity reporting", "context": "x".repeat(5000)},
                ]),
            ),
        ])
    }

    #[tokio::test]
    async fn test_annotates_every_record() {
        let mock = MockProviderClient::scripted(vec![
            Ok(r#"{"recommendation": "Include", "reason": "Capital rules"}"#.into()),
            Ok(r#"Verdict: {"recommendation": "exclude", "reason": "Staffing news"}"#.into()),
            Err("rate limited".into()),
        ]);
        let filter = LlmExclusionFilter::new(Arc::new(mock.clone()), ModelTier::Light);
        let out = filter.run(&records()).await.unwrap();

        let reviewed: Vec<UpdateRecord> = serde_json::from_value(out["filtered_records"].clone()).unwrap();
        assert_eq!(reviewed.len(), 3);
        assert_eq!(reviewed[0].recommendation.as_deref(), Some("Include"));
        assert_eq!(reviewed[1].recommendation.as_deref(), Some("Exclude"));
        assert_eq!(reviewed[1].reason.as_deref(), Some("Staffing news"));
        assert_eq!(reviewed[2].recommendation.as_deref(), Some("Exclude"));
        assert!(reviewed[2].reason.as_deref().unwrap().starts_with("LLM error:"));

        let requests = mock.requests.lock().unwrap();
        assert!(requests[2].user_input.len() < 1100);
    }

    #[tokio::test]
    async fn test_drop_excluded() {
        let mock = MockProviderClient::new(vec![
            r#"{"recommendation": "Include", "reason": "a"}"#,
            r#"{"recommendation": "Exclude", "reason": "b"}"#,
            "not json",
        ]);
        let filter = LlmExclusionFilter::new(Arc::new(mock), ModelTier::Light).with_drop_excluded(true);
        let out = filter.run(&records()).await.unwrap();

        let kept = out["filtered_records"].as_array().unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0]["topic"], json!("Capital requirements consultation"));
    }

    #[tokio::test]
    async fn test_non_array_records_rejected() {
        let filter = LlmExclusionFilter::new(Arc::new(MockProviderClient::default()), ModelTier::Light);
        let inputs = payload([("url", json!("u")), ("extracted_records", json!("oops"))]);
        let err = filter.run(&inputs).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidOutput { .. }));
    }
}
