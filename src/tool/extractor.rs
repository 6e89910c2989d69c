//! クリーニング済み HTML からのテキスト抽出
//!
//! # 責務
//!
//! - タグを除去して読みやすいテキストに変換する
//! - リンクは `テキスト (絶対URL)` の形で本文中に残す
//!
//! リンク先を本文に残すのは、後段のレコード抽出器が
//! 各アップデートの `link` を復元できるようにするためです。

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::{Captures, Regex};
use reqwest::Url;
use serde_json::json;

use crate::error::ToolError;
use super::traits::{payload, require_str, Payload, Tool, ToolKind};

static ANCHOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a\b[^>]*?\bhref\s*=\s*["']([^"']*)["'][^>]*>(.*?)</a\s*>"#)
        .expect("valid anchor regex")
});

static BREAK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</?(?:p|div|li|ul|ol|tr|table|section|article|h[1-6])\b[^>]*>")
        .expect("valid break regex")
});

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]+>").expect("valid tag regex"));

static SPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t\u{a0}]+").expect("valid space regex"));

/// HTML からテキストを抽出するツール
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlTextExtractor;

impl HtmlTextExtractor {
    /// `base_url` を基準に相対リンクを解決しながらテキストを抽出する
    pub fn extract(&self, base_url: &str, html: &str) -> String {
        let base = Url::parse(base_url).ok();

        let with_links = ANCHOR_RE.replace_all(html, |caps: &Captures| {
            let href = caps[1].trim();
            let label = TAG_RE.replace_all(&caps[2], " ");
            let label = label.split_whitespace().collect::<Vec<_>>().join(" ");
            let target = resolve(base.as_ref(), href);
            match (label.is_empty(), target.is_empty()) {
                (_, true) => label,
                (true, false) => format!("({target})"),
                (false, false) => format!("{label} ({target})"),
            }
        });

        let with_breaks = BREAK_RE.replace_all(&with_links, "\n");
        let plain = TAG_RE.replace_all(&with_breaks, "");
        let decoded = decode_entities(&plain);

        decoded
            .lines()
            .map(|line| SPACE_RE.replace_all(line.trim(), " ").into_owned())
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn resolve(base: Option<&Url>, href: &str) -> String {
    if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
        return String::new();
    }
    match base.and_then(|b| b.join(href).ok()) {
        Some(url) => url.to_string(),
        None => href.to_string(),
    }
}

/// よく使われる文字参照のみを復号する
fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&rsquo;", "'")
        .replace("&ndash;", "-")
        .replace("&amp;", "&")
}

#[async_trait]
impl Tool for HtmlTextExtractor {
    fn name(&self) -> &str {
        "extractor"
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Extractor
    }

    async fn run(&self, inputs: &Payload) -> Result<Payload, ToolError> {
        let url = require_str(self.name(), inputs, "url")?;
        let cleaned = require_str(self.name(), inputs, "cleaned_content")?;
        Ok(payload([
            ("url", json!(url)),
            ("extracted_text", json!(self.extract(url, cleaned))),
        ]))
    }
}
