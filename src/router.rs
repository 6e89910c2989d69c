//! URL のルーティング
//!
//! # 責務
//!
//! 入力 URL を `web` / `rss` のいずれかに分類します。
//!
//! # 処理フロー
//!
//! 1. URL が `.xml` で終わるか `rss` を含む（大文字小文字無視）なら、外部呼び出しなしで `rss`
//! 2. それ以外はページのプレビューを取得（失敗時は空のプレビュー）
//! 3. ルート分類器に問い合わせる（失敗時・未知のラベルは `web`）
//!
//! ルーティングの失敗は呼び出し元へ伝播させず、既定ルート `web` に回復します。

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::tool::{payload, truncate_chars, Tool};

/// ルートラベル
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    Web,
    Rss,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Route::Web => "web",
            Route::Rss => "rss",
        }
    }

    /// ラベル文字列を解釈する（未知のラベルは `None`）
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "web" => Some(Route::Web),
            "rss" => Some(Route::Rss),
            _ => None,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// URL だけでフィードと判定できるか
pub fn looks_like_feed(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    lower.ends_with(".xml") || lower.contains("rss")
}

/// ルーター
pub struct Router {
    fetcher: Arc<dyn Tool>,
    classifier: Arc<dyn Tool>,
    preview_chars: usize,
}

impl Router {
    pub fn new(fetcher: Arc<dyn Tool>, classifier: Arc<dyn Tool>, preview_chars: usize) -> Self {
        Self {
            fetcher,
            classifier,
            preview_chars,
        }
    }

    /// URL のルートを決める（失敗しない）
    pub async fn route(&self, url: &str) -> Route {
        if looks_like_feed(url) {
            debug!(url, "URL の形式から rss と判定しました");
            return Route::Rss;
        }

        let preview = self.preview(url).await;
        let inputs = payload([("url", json!(url)), ("preview", json!(preview))]);

        match self.classifier.run(&inputs).await {
            Ok(output) => {
                let label = output.get("route").and_then(|v| v.as_str()).unwrap_or_default();
                Route::from_label(label).unwrap_or_else(|| {
                    warn!(url, label, "未知のルートラベルのため web とします");
                    Route::Web
                })
            }
            Err(e) => {
                warn!(url, error = %e, "ルート分類に失敗したため web とします");
                Route::Web
            }
        }
    }

    async fn preview(&self, url: &str) -> String {
        match self.fetcher.run(&payload([("url", json!(url))])).await {
            Ok(output) => output
                .get("raw_content")
                .and_then(|v| v.as_str())
                .map(|body| truncate_chars(body, self.preview_chars).to_string())
                .unwrap_or_default(),
            Err(e) => {
                warn!(url, error = %e, "プレビューを取得できないため空のプレビューで分類します");
                String::new()
            }
        }
    }
}
