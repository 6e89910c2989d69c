//! 行出力の状態とセンチネル文字列
//!
//! # センチネル一覧
//!
//! | 文字列 | 状態 | 再処理 |
//! |--------|------|--------|
//! | 空文字（空白のみを含む） | [`RowOutput::Empty`] | する |
//! | `⏭️ Skipped` / `skipped`（いずれも大小文字無視） | [`RowOutput::Skipped`] | する |
//! | `❌ Error: ...` | [`RowOutput::Error`] | しない |
//! | その他の文字列 | [`RowOutput::Success`] | しない |
//!
//! 要約器が空文字を返した場合は [`SUCCESS_EMPTY`] を成功値として記録します。

use std::fmt;

use serde::Serialize;

/// スキップを表すセンチネル
pub const SKIPPED: &str = "⏭️ Skipped";
/// 旧形式のスキップ表記（読み込み時のみ受理）
const SKIPPED_PLAIN: &str = "skipped";
/// エラーを表すセンチネルの接頭辞
pub const ERROR_PREFIX: &str = "❌ Error:";
/// 成功したが要約が空だった場合の値
pub const SUCCESS_EMPTY: &str = "✅ Success but empty";

/// 行の出力状態
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RowOutput {
    /// 未処理
    Empty,
    /// 意図的に処理しなかった
    Skipped,
    /// 処理に成功した（要約テキスト）
    Success(String),
    /// 処理に失敗した（エラーメッセージ）
    Error(String),
}

impl RowOutput {
    /// セル文字列から出力状態を判定する
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return RowOutput::Empty;
        }
        let lower = trimmed.to_lowercase();
        if lower == SKIPPED.to_lowercase() || lower == SKIPPED_PLAIN {
            return RowOutput::Skipped;
        }
        if let Some(message) = trimmed.strip_prefix(ERROR_PREFIX) {
            return RowOutput::Error(message.trim().to_string());
        }
        RowOutput::Success(raw.to_string())
    }

    /// 要約テキストから成功値を作る（空なら [`SUCCESS_EMPTY`]）
    pub fn success(summary: impl Into<String>) -> Self {
        let summary = summary.into();
        if summary.trim().is_empty() {
            RowOutput::Success(SUCCESS_EMPTY.to_string())
        } else {
            RowOutput::Success(summary)
        }
    }

    /// 再処理の対象となる状態か（未処理またはスキップ）
    pub fn needs_processing(&self) -> bool {
        matches!(self, RowOutput::Empty | RowOutput::Skipped)
    }

    /// 確定済みの状態か
    pub fn is_terminal(&self) -> bool {
        !self.needs_processing()
    }
}

impl fmt::Display for RowOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowOutput::Empty => Ok(()),
            RowOutput::Skipped => f.write_str(SKIPPED),
            RowOutput::Success(text) => f.write_str(text),
            RowOutput::Error(message) => write!(f, "{ERROR_PREFIX} {message}"),
        }
    }
}
