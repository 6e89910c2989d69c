//! LLM によるルート分類

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::config::ModelTier;
use crate::error::ToolError;
use crate::provider::{CompletionRequest, ProviderClient};
use super::traits::{payload, require_str, Payload, Tool, ToolKind};

const SYSTEM_PROMPT: &str = "You classify regulatory publication URLs. \
Answer with exactly one word: 'rss' if the content is an RSS or Atom feed, \
otherwise 'web'.";

/// URL とプレビューから `web` / `rss` を判定するツール
///
/// 応答に `rss` が含まれていれば `rss`、それ以外はすべて `web` を出力します。
pub struct LlmRouteClassifier {
    client: Arc<dyn ProviderClient>,
    tier: ModelTier,
}

impl LlmRouteClassifier {
    pub fn new(client: Arc<dyn ProviderClient>, tier: ModelTier) -> Self {
        Self { client, tier }
    }
}

#[async_trait]
impl Tool for LlmRouteClassifier {
    fn name(&self) -> &str {
        "route_classifier"
    }

    fn kind(&self) -> ToolKind {
        ToolKind::RouteClassifier
    }

    async fn run(&self, inputs: &Payload) -> Result<Payload, ToolError> {
        let url = require_str(self.name(), inputs, "url")?;
        let preview = require_str(self.name(), inputs, "preview")?;

        let request = CompletionRequest::new(
            SYSTEM_PROMPT,
            format!("URL: {url}\nContent preview:\n{preview}\n\nWhich is it: web or rss?"),
            self.tier,
        )
        .with_temperature(0.0)
        .with_max_tokens(5);

        let response = self.client.execute(&request).await?;
        let route = if response.content.to_lowercase().contains("rss") {
            "rss"
        } else {
            "web"
        };
        Ok(payload([("route", json!(route))]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::mock::MockProviderClient;

    fn inputs() -> Payload {
        payload([("url", json!("https://www.fca.org.uk/news")), ("preview", json!("<html>"))])
    }

    #[tokio::test]
    async fn test_reply_mapping() {
        for (reply, expected) in [("RSS", "rss"), ("It is an rss feed.", "rss"), ("web", "web"), ("unsure", "web")] {
            let classifier = LlmRouteClassifier::new(Arc::new(MockProviderClient::new(vec![reply])), ModelTier::Light);
            let out = classifier.run(&inputs()).await.unwrap();
            assert_eq!(out["route"], json!(expected), "{reply:?}");
        }
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        let mock = MockProviderClient::scripted(vec![Err("boom".into())]);
        let classifier = LlmRouteClassifier::new(Arc::new(mock), ModelTier::Light);
        let err = classifier.run(&inputs()).await.unwrap_err();
        assert!(matches!(err, ToolError::Provider(_)));
    }
}
