//! モデルティアマッピング
//!
//! | Tier   | OpenAI       | OpenRouter          |
//! |--------|--------------|---------------------|
//! | Heavy  | gpt-4o       | openai/gpt-4o       |
//! | Medium | gpt-4.1-mini | openai/gpt-4.1-mini |
//! | Light  | gpt-4o-mini  | openai/gpt-4o-mini  |
//!
//! ```rust
//! use reg_horizon::provider::model_tier::resolve_model;
//! use reg_horizon::config::{ModelTier, Provider};
//!
//! assert_eq!(resolve_model(&Provider::OpenAI, &ModelTier::Light), "gpt-4o-mini");
//! ```

use crate::config::{ModelTier, Provider};

const OPENAI_HEAVY: &str = "gpt-4o";
const OPENAI_MEDIUM: &str = "gpt-4.1-mini";
const OPENAI_LIGHT: &str = "gpt-4o-mini";

const OPENROUTER_HEAVY: &str = "openai/gpt-4o";
const OPENROUTER_MEDIUM: &str = "openai/gpt-4.1-mini";
const OPENROUTER_LIGHT: &str = "openai/gpt-4o-mini";

/// モデルティアとプロバイダーから実際のモデル名を解決する
pub fn resolve_model(provider: &Provider, tier: &ModelTier) -> &'static str {
    match (provider, tier) {
        (Provider::OpenAI, ModelTier::Heavy) => OPENAI_HEAVY,
        (Provider::OpenAI, ModelTier::Medium) => OPENAI_MEDIUM,
        (Provider::OpenAI, ModelTier::Light) => OPENAI_LIGHT,

        (Provider::OpenRouter, ModelTier::Heavy) => OPENROUTER_HEAVY,
        (Provider::OpenRouter, ModelTier::Medium) => OPENROUTER_MEDIUM,
        (Provider::OpenRouter, ModelTier::Light) => OPENROUTER_LIGHT,
    }
}
