//! HTML のノイズ除去

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde_json::json;

use crate::error::ToolError;
use super::traits::{payload, require_str, Payload, Tool, ToolKind};

/// 要素ごと取り除くタグ
const STRIPPED_TAGS: [&str; 7] = ["script", "style", "noscript", "svg", "header", "footer", "nav"];

static BLOCK_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    STRIPPED_TAGS
        .iter()
        .map(|tag| {
            Regex::new(&format!(r"(?is)<{tag}\b[^>]*>.*?</{tag}\s*>"))
                .expect("valid block regex")
        })
        .collect()
});

static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid comment regex"));

static BLANK_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t\r]*(?:\n[ \t\r]*)+").expect("valid blank run regex"));

/// 正規表現による HTML クリーナー
///
/// スクリプト・スタイル・ナビゲーション等のブロックとコメントを取り除き、
/// 連続する空行を1行にまとめます。
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlCleaner;

impl HtmlCleaner {
    pub fn clean(&self, html: &str) -> String {
        let mut cleaned = COMMENT_RE.replace_all(html, "").into_owned();
        for re in BLOCK_RES.iter() {
            cleaned = re.replace_all(&cleaned, "").into_owned();
        }
        BLANK_RUN_RE.replace_all(cleaned.trim(), "\n").into_owned()
    }
}

#[async_trait]
impl Tool for HtmlCleaner {
    fn name(&self) -> &str {
        "cleaner"
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Cleaner
    }

    async fn run(&self, inputs: &Payload) -> Result<Payload, ToolError> {
        let url = require_str(self.name(), inputs, "url")?;
        let raw = require_str(self.name(), inputs, "raw_content")?;
        Ok(payload([
            ("url", json!(url)),
            ("cleaned_content", json!(self.clean(raw))),
        ]))
    }
}
