//! 実行設定
//!
//! - `dto` - TOML デシリアライズ専用の内部型
//! - [`settings`] - バリデーション済みの設定（ドメインモデル）
//! - [`llm`] - プロバイダーとモデルティア

mod dto;
pub mod llm;
pub mod settings;

pub use llm::{ModelTier, Provider};
pub use settings::{
    ExclusionSettings, FetchSettings, LlmSettings, OutputSettings, Settings, SummarizerSettings,
};
