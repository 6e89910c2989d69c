//! 外部コラボレーター（ツール）
//!
//! # 責務
//!
//! - 取得・クリーニング・抽出・分類・要約を [`Tool`] トレイトの背後に隠す
//! - 設定から全ツールを組み立てる [`Toolkit`] を提供
//!
//! # モジュール構成
//!
//! - `traits` - 共通インターフェース（[`Tool`]トレイト等）
//! - `fetcher` - HTTP 取得
//! - `cleaner` - HTML ノイズ除去
//! - `extractor` - テキスト抽出
//! - `records` - LLM によるレコード抽出
//! - `exclusion` - LLM による除外判定
//! - `classifier` - LLM によるルート分類
//! - `summarizer` - LLM による要約

pub mod classifier;
pub mod cleaner;
pub mod exclusion;
pub mod extractor;
pub mod fetcher;
pub mod records;
pub mod summarizer;
#[cfg(test)]
pub(crate) mod testing;
pub mod traits;

use std::sync::Arc;

pub use classifier::LlmRouteClassifier;
pub use cleaner::HtmlCleaner;
pub use exclusion::LlmExclusionFilter;
pub use extractor::HtmlTextExtractor;
pub use fetcher::HttpFetcher;
pub use records::LlmRecordExtractor;
pub use summarizer::LlmSummarizer;
pub use traits::{json_span, optional_str, payload, require_str, truncate_chars, Payload, Tool, ToolKind};

use crate::config::Settings;
use crate::error::ToolError;
use crate::provider::ProviderClient;

/// パイプラインとディスパッチャーが使うツール一式
#[derive(Clone)]
pub struct Toolkit {
    pub fetcher: Arc<dyn Tool>,
    pub cleaner: Arc<dyn Tool>,
    pub extractor: Arc<dyn Tool>,
    pub record_extractor: Arc<dyn Tool>,
    pub exclusion: Arc<dyn Tool>,
    pub route_classifier: Arc<dyn Tool>,
    pub summarizer: Arc<dyn Tool>,
}

impl Toolkit {
    /// 設定と LLM クライアントから全ツールを生成する
    pub fn from_settings(settings: &Settings, client: Arc<dyn ProviderClient>) -> Result<Self, ToolError> {
        let tier = settings.llm.model_tier;
        let max_chars = settings.summarizer.max_input_chars;

        Ok(Self {
            fetcher: Arc::new(HttpFetcher::new(&settings.fetch)?),
            cleaner: Arc::new(HtmlCleaner),
            extractor: Arc::new(HtmlTextExtractor),
            record_extractor: Arc::new(LlmRecordExtractor::new(client.clone(), tier, max_chars)),
            exclusion: Arc::new(
                LlmExclusionFilter::new(client.clone(), tier)
                    .with_drop_excluded(settings.exclusion.drop_excluded),
            ),
            route_classifier: Arc::new(LlmRouteClassifier::new(client.clone(), tier)),
            summarizer: Arc::new(LlmSummarizer::new(
                client,
                tier,
                settings.summarizer.objective.clone(),
                max_chars,
            )),
        })
    }
}
