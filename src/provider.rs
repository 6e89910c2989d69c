//! LLMプロバイダー抽象化レイヤー
//!
//! # 責務
//!
//! - LLM を使うコラボレーターに統一的なインターフェース [`ProviderClient`] を提供
//! - 設定に応じた適切なクライアントを生成するファクトリー機能
//! - モデルティア（Heavy/Medium/Light）から実際のモデル名へのマッピング
//!
//! # モジュール構成
//!
//! - `traits` - 共通インターフェース（[`ProviderClient`]トレイト等）
//! - `model_tier` - モデルティアマッピング
//! - `openai` - OpenAI 互換 Chat Completions API クライアント

#[cfg(test)]
pub(crate) mod mock;
pub mod model_tier;
pub mod openai;
pub mod traits;

use std::sync::Arc;

pub use traits::{CompletionRequest, ProviderClient, ProviderResponse, StopReason, TokenUsage};

use crate::config::LlmSettings;
use crate::error::{ConfigError, Error};

/// 設定からプロバイダークライアントを生成するファクトリー関数
///
/// APIキーは `settings.api_key_env` で指定された環境変数から読み込みます。
///
/// # エラー
///
/// - [`ConfigError::MissingApiKey`] - 環境変数が未設定または空
/// - [`ProviderError::Config`](crate::error::ProviderError::Config) - HTTP クライアントの生成に失敗
pub fn create_provider(settings: &LlmSettings) -> Result<Arc<dyn ProviderClient>, Error> {
    let api_key = std::env::var(&settings.api_key_env)
        .ok()
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingApiKey(settings.api_key_env.clone()))?;

    let client = openai::OpenAIClient::from_settings(settings, api_key)?;
    Ok(Arc::new(client))
}
