//! LLMプロバイダーの共通インターフェース定義
//!
//! # 責務
//!
//! - LLMプロバイダーの共通トレイト [`ProviderClient`] を定義
//! - プロバイダー非依存のリクエスト型 [`CompletionRequest`] とレスポンス型 [`ProviderResponse`] を提供
//! - トークン使用量 [`TokenUsage`] と停止理由 [`StopReason`] の型を定義
//!
//! # 使用例
//!
//! ```rust,no_run
//! use reg_horizon::provider::{CompletionRequest, ProviderClient};
//! use reg_horizon::config::ModelTier;
//!
//! async fn example(client: &dyn ProviderClient) {
//!     let request = CompletionRequest::new(
//!         "Classify the type of URL.",
//!         "https://example.com/feed",
//!         ModelTier::Light,
//!     )
//!     .with_temperature(0.0);
//!
//!     let response = client.execute(&request).await.unwrap();
//!     println!("Response: {}", response.content);
//! }
//! ```

use async_trait::async_trait;
use serde::Serialize;

use crate::config::ModelTier;
use crate::error::ProviderError;

/// LLMプロバイダーの共通インターフェース
///
/// LLM を使うコラボレーターはこのトレイト越しにのみプロバイダーへ触れるため、
/// テストではモック実装に差し替えられます。
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// LLMに対してプロンプトを実行し、レスポンスを取得する
    ///
    /// # エラー
    ///
    /// - [`ProviderError::AuthenticationError`] - 認証失敗
    /// - [`ProviderError::RateLimitExceeded`] - レート制限超過
    /// - [`ProviderError::Timeout`] - タイムアウト
    /// - [`ProviderError::InvalidResponse`] - 不正なレスポンス
    async fn execute(&self, request: &CompletionRequest) -> Result<ProviderResponse, ProviderError>;
}

/// LLM への1回分の問い合わせ
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// システムプロンプト（LLMの役割・制約を定義）
    pub system_prompt: String,
    /// ユーザー入力（処理対象のテキスト）
    pub user_input: String,
    /// モデルティア
    pub model_tier: ModelTier,
    /// サンプリング温度
    pub temperature: f32,
    /// 生成トークン数の上限
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    /// 温度 0.2・上限なしのリクエストを生成
    pub fn new(
        system_prompt: impl Into<String>,
        user_input: impl Into<String>,
        model_tier: ModelTier,
    ) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_input: user_input.into(),
            model_tier,
            temperature: 0.2,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// LLMプロバイダーからのレスポンス
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    /// LLMが生成したテキスト
    pub content: String,

    /// トークン使用量
    pub token_usage: TokenUsage,

    /// 生成停止理由
    pub stop_reason: StopReason,

    /// 使用されたモデル名
    pub model: String,
}

/// トークン使用量
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TokenUsage {
    /// 入力トークン数（プロンプト）
    pub input_tokens: u32,

    /// 出力トークン数（LLM生成テキスト）
    pub output_tokens: u32,
}

impl TokenUsage {
    /// 入出力の合計（上限で飽和）
    pub fn total(&self) -> u32 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

/// LLMの生成停止理由
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// 自然な終了
    EndTurn,

    /// 最大トークン数到達
    MaxTokens,

    /// コンテンツフィルター発動
    ContentFilter,

    /// 不明な理由
    Unknown,
}

impl StopReason {
    /// Chat Completions API の `finish_reason` から変換
    pub fn from_finish_reason(reason: Option<&str>) -> Self {
        match reason {
            Some("stop") => StopReason::EndTurn,
            Some("length") => StopReason::MaxTokens,
            Some("content_filter") => StopReason::ContentFilter,
            _ => StopReason::Unknown,
        }
    }
}
