//! 外部コラボレーター（ツール）の共通インターフェース
//!
//! # 責務
//!
//! - 全コラボレーターが実装する [`Tool`] トレイトを定義
//! - 入出力ペイロード [`Payload`] と入力キー取得の補助関数を提供
//!
//! # 入出力キー
//!
//! | ツール | 必須入力 | 出力 |
//! |--------|----------|------|
//! | Fetcher | `url` | `url`, `raw_content` |
//! | Cleaner | `url`, `raw_content` | `url`, `cleaned_content` |
//! | Extractor | `url`, `cleaned_content` | `url`, `extracted_text` |
//! | RecordExtractor | `url`, `extracted_text` | `url`, `extracted_records` |
//! | Exclusion | `url`, `extracted_records` | `url`, `filtered_records` |
//! | RouteClassifier | `url`, `preview` | `route` |
//! | Summarizer | `extracted_text`, `url`, `objective?` | `source_url`, `summary` |

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::error::ToolError;

/// ツールの入出力（JSON オブジェクト）
pub type Payload = serde_json::Map<String, Value>;

/// ツールの種別（ログ出力用）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    Fetcher,
    Cleaner,
    Extractor,
    RecordExtractor,
    Exclusion,
    RouteClassifier,
    Summarizer,
}

/// 外部コラボレーターの共通インターフェース
///
/// 呼び出し側は各呼び出しの完了を待ってから次へ進みます。
/// ツール自身はリトライしません。
#[async_trait]
pub trait Tool: Send + Sync {
    /// ツール名
    fn name(&self) -> &str;

    /// ツール種別
    fn kind(&self) -> ToolKind;

    /// 入力ペイロードを処理して出力ペイロードを返す
    ///
    /// # エラー
    ///
    /// - [`ToolError::MissingInput`] - 必須入力キーが欠落
    /// - その他 - 各ツール固有の失敗
    async fn run(&self, inputs: &Payload) -> Result<Payload, ToolError>;
}

/// 必須の文字列入力を取得する
pub fn require_str<'a>(tool: &str, inputs: &'a Payload, key: &str) -> Result<&'a str, ToolError> {
    inputs
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::MissingInput {
            tool: tool.to_string(),
            key: key.to_string(),
        })
}

/// 任意の文字列入力を取得する（空白のみは `None`）
pub fn optional_str<'a>(inputs: &'a Payload, key: &str) -> Option<&'a str> {
    inputs
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.trim().is_empty())
}

/// キーと値の組からペイロードを作る
pub fn payload<const N: usize>(entries: [(&str, Value); N]) -> Payload {
    entries
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

/// 先頭から最大 `max_chars` 文字を返す（文字境界を保つ）
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

/// 最初の `open` から最後の `close` までを切り出す
///
/// LLM の応答に前後の説明文が付いていても JSON 部分だけを取り出すために使います。
///
/// ```rust
/// use reg_horizon::tool::json_span;
///
/// let reply = "Here you go:\n{\"recommendation\": \"Include\"}\nThanks";
/// assert_eq!(json_span(reply, '{', '}'), Some("{\"recommendation\": \"Include\"}"));
/// assert_eq!(json_span("no json", '[', ']'), None);
/// ```
pub fn json_span(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_require_str_missing_key() {
        let inputs = payload([("url", json!("https://x.test"))]);
        assert_eq!(require_str("fetcher", &inputs, "url").unwrap(), "https://x.test");

        let err = require_str("cleaner", &inputs, "raw_content").unwrap_err();
        assert!(matches!(
            err,
            ToolError::MissingInput { ref tool, ref key } if tool == "cleaner" && key == "raw_content"
        ));
    }

    #[test]
    fn test_optional_str_ignores_blank() {
        let inputs = payload([("objective", json!("   ")), ("n", json!(1))]);
        assert_eq!(optional_str(&inputs, "objective"), None);
        assert_eq!(optional_str(&inputs, "n"), None);
        assert_eq!(optional_str(&inputs, "missing"), None);
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("規制アップデート", 2), "規制");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[test]
    fn test_json_span_reversed_brackets() {
        assert_eq!(json_span("] then [", '[', ']'), None);
        assert_eq!(json_span("x [1, [2]] y", '[', ']'), Some("[1, [2]]"));
    }
}
