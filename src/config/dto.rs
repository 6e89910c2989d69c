//! TOML デシリアライズ用の DTO (Data Transfer Object)
//!
//! # 責務
//!
//! このモジュールは、TOML ファイルからのデータ読み込み専用の構造体を提供します。
//! DTO はバリデーション前の「生データ」を表現し、ドメインモデルとは分離されています。
//! すべてのセクション・フィールドは省略可能で、既定値の補完は
//! [`Settings`](super::settings::Settings) 側で行います。
//!
//! ## 変換フロー
//!
//! ```text
//! TOML ファイル
//!   ↓ (デシリアライズ)
//! SettingsDto
//!   ↓ (TryFrom でバリデーション)
//! Settings (ドメインモデル)
//! ```

use serde::{Deserialize, Serialize};

use super::llm::{ModelTier, Provider};

/// 設定ファイル全体の DTO
#[derive(Debug, Default, Serialize, Deserialize)]
pub(super) struct SettingsDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(super) llm: Option<LlmDto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(super) fetch: Option<FetchDto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(super) output: Option<OutputDto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(super) summarizer: Option<SummarizerDto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(super) exclusion: Option<ExclusionDto>,
}

/// `[llm]` セクション
#[derive(Debug, Default, Serialize, Deserialize)]
pub(super) struct LlmDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(super) provider: Option<Provider>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(super) model_tier: Option<ModelTier>,
    /// ティアから解決せず、モデル名を直接指定する場合
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(super) model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(super) api_base: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(super) api_key_env: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(super) timeout_secs: Option<u64>,
}

/// `[fetch]` セクション
#[derive(Debug, Default, Serialize, Deserialize)]
pub(super) struct FetchDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(super) timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(super) user_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(super) preview_chars: Option<usize>,
}

/// `[output]` セクション
#[derive(Debug, Default, Serialize, Deserialize)]
pub(super) struct OutputDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(super) dir: Option<String>,
}

/// `[summarizer]` セクション
#[derive(Debug, Default, Serialize, Deserialize)]
pub(super) struct SummarizerDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(super) objective: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(super) max_input_chars: Option<usize>,
}

/// `[exclusion]` セクション
#[derive(Debug, Default, Serialize, Deserialize)]
pub(super) struct ExclusionDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(super) drop_excluded: Option<bool>,
}
