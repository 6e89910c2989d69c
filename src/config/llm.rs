//! LLM 呼び出しに関する設定値の列挙型
//!
//! # 責務
//!
//! LLM を利用するコラボレーター（ルート分類・レコード抽出・除外判定・要約）が
//! 共通で参照する [`Provider`] と [`ModelTier`] を提供する。

use serde::{Deserialize, Serialize};

/// モデルのティア（Heavy/Medium/Light）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    /// 長文の要約など負荷の高いタスク用
    Heavy,
    /// 一般的なタスク用
    Medium,
    /// 分類など短い応答で足りるタスク用
    Light,
}

/// AI プロバイダー
///
/// どちらも OpenAI 互換の Chat Completions API を話します。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// OpenAI 本家 API
    OpenAI,
    /// OpenRouter（モデル名に `openai/` などのベンダー接頭辞が付く）
    OpenRouter,
}

impl Provider {
    /// プロバイダー既定の API ベース URL
    pub fn default_api_base(&self) -> &'static str {
        match self {
            Provider::OpenAI => "https://api.openai.com/v1",
            Provider::OpenRouter => "https://openrouter.ai/api/v1",
        }
    }

    /// プロバイダー既定の APIキー環境変数名
    pub fn default_api_key_env(&self) -> &'static str {
        match self {
            Provider::OpenAI => "OPENAI_API_KEY",
            Provider::OpenRouter => "OPENROUTER_API_KEY",
        }
    }
}
