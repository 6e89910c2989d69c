//! 実行設定の読み込みと管理を行うモジュール
//!
//! # 責務
//!
//! LLM・取得・出力先などの実行設定を TOML 形式で定義し、
//! それを Rust の型として扱うための機能を提供します。
//!
//! ## 使用例
//!
//! ```toml
//! [llm]
//! provider = "openai"
//! model_tier = "light"
//!
//! [fetch]
//! timeout_secs = 30
//! preview_chars = 2000
//!
//! [output]
//! dir = "regulatory_outputs"
//! ```
//!
//! セクションを省略した場合は [`Settings::default`] の値が使われます。

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use super::dto::{
    ExclusionDto, FetchDto, LlmDto, OutputDto, SettingsDto, SummarizerDto,
};
use super::llm::{ModelTier, Provider};

/// 要約の既定の目的
pub const DEFAULT_OBJECTIVE: &str = "Summarize the regulatory update with a focus on its \
impact on large global banks: key developments or announcements, implications for \
large banks and their peers, and any new obligations, risk areas or disclosures. \
Respond in 2-4 precise, compliance-focused sentences.";

/// ルーター用プレビューの既定文字数
pub const DEFAULT_PREVIEW_CHARS: usize = 2000;

/// 実行設定（ドメインモデル）
///
/// バリデーション済みの状態を保証します。
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub llm: LlmSettings,
    pub fetch: FetchSettings,
    pub output: OutputSettings,
    pub summarizer: SummarizerSettings,
    pub exclusion: ExclusionSettings,
}

/// LLM 接続設定
#[derive(Debug, Clone, PartialEq)]
pub struct LlmSettings {
    pub provider: Provider,
    pub model_tier: ModelTier,
    pub model: Option<String>,
    pub api_base: String,
    pub api_key_env: String,
    pub timeout: Duration,
}

/// ページ取得設定
#[derive(Debug, Clone, PartialEq)]
pub struct FetchSettings {
    pub timeout: Duration,
    pub user_agent: String,
    /// ルーターが分類器に渡すプレビューの最大文字数
    pub preview_chars: usize,
}

/// 成果物の出力先
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSettings {
    /// `None` の場合、パイプラインは成果物を書き出さない
    pub dir: Option<PathBuf>,
}

/// 要約設定
#[derive(Debug, Clone, PartialEq)]
pub struct SummarizerSettings {
    pub objective: String,
    pub max_input_chars: usize,
}

/// 除外判定設定
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExclusionSettings {
    /// `Exclude` 判定のレコードを結果から取り除くか
    pub drop_excluded: bool,
}

impl Default for Settings {
    fn default() -> Self {
        let provider = Provider::OpenAI;
        Self {
            llm: LlmSettings {
                provider,
                model_tier: ModelTier::Light,
                model: None,
                api_base: provider.default_api_base().to_string(),
                api_key_env: provider.default_api_key_env().to_string(),
                timeout: Duration::from_secs(60),
            },
            fetch: FetchSettings {
                timeout: Duration::from_secs(30),
                user_agent: concat!("reg-horizon/", env!("CARGO_PKG_VERSION")).to_string(),
                preview_chars: DEFAULT_PREVIEW_CHARS,
            },
            output: OutputSettings {
                dir: Some(PathBuf::from("regulatory_outputs")),
            },
            summarizer: SummarizerSettings {
                objective: DEFAULT_OBJECTIVE.to_string(),
                max_input_chars: 12_000,
            },
            exclusion: ExclusionSettings::default(),
        }
    }
}

impl Settings {
    /// TOML ファイルから設定を読み込む
    ///
    /// # 処理フロー
    ///
    /// 1. ファイル読み込み
    /// 2. TOML デシリアライズ → [`SettingsDto`]
    /// 3. バリデーション & 変換 → [`Settings`]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// TOML 文字列から設定を読み込む
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let dto: SettingsDto = toml::from_str(toml)?;
        Self::try_from(dto)
    }

    /// 設定を TOML 文字列に変換
    ///
    /// 省略された項目も既定値で書き出すため、出力は常に完全な設定になります。
    pub fn to_string(&self) -> Result<String, ConfigError> {
        let dto = SettingsDto::from(self);
        Ok(toml::to_string_pretty(&dto)?)
    }

    /// 設定を TOML ファイルに保存
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let content = self.to_string()?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

fn non_empty(field: &str, value: String) -> Result<String, ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} が空です")));
    }
    Ok(value)
}

fn positive_secs(field: &str, secs: u64) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::Validation(format!("{field} は 1 以上である必要があります")));
    }
    Ok(Duration::from_secs(secs))
}

/// DTO からドメインモデルへの変換（読み込み方向）
///
/// 省略値を既定値で補完し、不正なデータの場合は [`ConfigError::Validation`] を返します。
impl TryFrom<SettingsDto> for Settings {
    type Error = ConfigError;

    fn try_from(dto: SettingsDto) -> Result<Self, Self::Error> {
        let defaults = Settings::default();

        let llm_dto = dto.llm.unwrap_or_default();
        let provider = llm_dto.provider.unwrap_or(defaults.llm.provider);
        let llm = LlmSettings {
            provider,
            model_tier: llm_dto.model_tier.unwrap_or(defaults.llm.model_tier),
            model: llm_dto.model.map(|m| non_empty("llm.model", m)).transpose()?,
            // ベースURLとキー名はプロバイダーに追従させる
            api_base: non_empty(
                "llm.api_base",
                llm_dto.api_base.unwrap_or_else(|| provider.default_api_base().to_string()),
            )?,
            api_key_env: non_empty(
                "llm.api_key_env",
                llm_dto.api_key_env.unwrap_or_else(|| provider.default_api_key_env().to_string()),
            )?,
            timeout: match llm_dto.timeout_secs {
                Some(secs) => positive_secs("llm.timeout_secs", secs)?,
                None => defaults.llm.timeout,
            },
        };

        let fetch_dto = dto.fetch.unwrap_or_default();
        let preview_chars = fetch_dto.preview_chars.unwrap_or(defaults.fetch.preview_chars);
        if preview_chars == 0 {
            return Err(ConfigError::Validation(
                "fetch.preview_chars は 1 以上である必要があります".to_string(),
            ));
        }
        let fetch = FetchSettings {
            timeout: match fetch_dto.timeout_secs {
                Some(secs) => positive_secs("fetch.timeout_secs", secs)?,
                None => defaults.fetch.timeout,
            },
            user_agent: non_empty(
                "fetch.user_agent",
                fetch_dto.user_agent.unwrap_or(defaults.fetch.user_agent),
            )?,
            preview_chars,
        };

        // 空文字の出力先は「書き出さない」と解釈する
        let output = match dto.output.and_then(|o| o.dir) {
            Some(dir) if dir.trim().is_empty() => OutputSettings { dir: None },
            Some(dir) => OutputSettings { dir: Some(PathBuf::from(dir)) },
            None => defaults.output,
        };

        let summarizer_dto = dto.summarizer.unwrap_or_default();
        let max_input_chars = summarizer_dto
            .max_input_chars
            .unwrap_or(defaults.summarizer.max_input_chars);
        if max_input_chars == 0 {
            return Err(ConfigError::Validation(
                "summarizer.max_input_chars は 1 以上である必要があります".to_string(),
            ));
        }
        let summarizer = SummarizerSettings {
            objective: non_empty(
                "summarizer.objective",
                summarizer_dto.objective.unwrap_or(defaults.summarizer.objective),
            )?,
            max_input_chars,
        };

        let exclusion = ExclusionSettings {
            drop_excluded: dto
                .exclusion
                .and_then(|e| e.drop_excluded)
                .unwrap_or(defaults.exclusion.drop_excluded),
        };

        Ok(Settings { llm, fetch, output, summarizer, exclusion })
    }
}

/// ドメインモデルから DTO への変換（書き込み方向）
impl From<&Settings> for SettingsDto {
    fn from(settings: &Settings) -> Self {
        SettingsDto {
            llm: Some(LlmDto {
                provider: Some(settings.llm.provider),
                model_tier: Some(settings.llm.model_tier),
                model: settings.llm.model.clone(),
                api_base: Some(settings.llm.api_base.clone()),
                api_key_env: Some(settings.llm.api_key_env.clone()),
                timeout_secs: Some(settings.llm.timeout.as_secs()),
            }),
            fetch: Some(FetchDto {
                timeout_secs: Some(settings.fetch.timeout.as_secs()),
                user_agent: Some(settings.fetch.user_agent.clone()),
                preview_chars: Some(settings.fetch.preview_chars),
            }),
            output: Some(OutputDto {
                dir: Some(
                    settings
                        .output
                        .dir
                        .as_ref()
                        .map(|d| d.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                ),
            }),
            summarizer: Some(SummarizerDto {
                objective: Some(settings.summarizer.objective.clone()),
                max_input_chars: Some(settings.summarizer.max_input_chars),
            }),
            exclusion: Some(ExclusionDto {
                drop_excluded: Some(settings.exclusion.drop_excluded),
            }),
        }
    }
}
