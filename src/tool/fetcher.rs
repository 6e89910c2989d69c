//! HTTP によるページ取得
//!
//! # 責務
//!
//! - `url` のページ本文を取得し `raw_content` として返す
//! - タイムアウトを [`ToolError::Timeout`] として区別する
//!
//! 成功以外の HTTP ステータスは [`ToolError::Status`] になります。

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::config::FetchSettings;
use crate::error::ToolError;
use super::traits::{payload, require_str, Payload, Tool, ToolKind};

/// reqwest によるページ取得ツール
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// 取得設定（タイムアウト・User-Agent）からクライアントを生成
    pub fn new(settings: &FetchSettings) -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .user_agent(settings.user_agent.as_str())
            .build()?;
        Ok(Self { client })
    }

    /// ページ本文をテキストとして取得する
    pub async fn fetch_text(&self, url: &str) -> Result<String, ToolError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| classify(url, e))?;
        debug!(url, bytes = body.len(), "ページを取得しました");
        Ok(body)
    }
}

fn classify(url: &str, error: reqwest::Error) -> ToolError {
    if error.is_timeout() {
        ToolError::Timeout(url.to_string())
    } else {
        ToolError::Http(error)
    }
}

#[async_trait]
impl Tool for HttpFetcher {
    fn name(&self) -> &str {
        "fetcher"
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Fetcher
    }

    async fn run(&self, inputs: &Payload) -> Result<Payload, ToolError> {
        let url = require_str(self.name(), inputs, "url")?;
        let raw_content = self.fetch_text(url).await?;
        Ok(payload([("url", json!(url)), ("raw_content", json!(raw_content))]))
    }
}
