use std::time::Duration;

use reg_horizon::config::{ModelTier, Provider, Settings};

#[test]
fn test_load_example_settings() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/horizon.toml");
    let settings = Settings::from_file(path).expect("Failed to load settings");

    assert_eq!(settings.llm.provider, Provider::OpenAI);
    assert_eq!(settings.llm.model_tier, ModelTier::Light);
    assert_eq!(settings.llm.api_key_env, "OPENAI_API_KEY");
    assert_eq!(settings.llm.api_base, "https://api.openai.com/v1");
    assert_eq!(settings.fetch.timeout, Duration::from_secs(30));
    assert_eq!(settings.fetch.preview_chars, 2000);
    assert_eq!(
        settings.output.dir.as_deref(),
        Some(std::path::Path::new("regulatory_outputs"))
    );
    assert_eq!(settings.summarizer.max_input_chars, 12000);
    assert!(!settings.exclusion.drop_excluded);
}

#[test]
fn test_settings_roundtrip_with_real_file() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/horizon.toml");

    // Load settings from file
    let original = Settings::from_file(path).expect("Failed to load settings");

    // Save to a temporary file and load it back
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let copy = dir.path().join("horizon.toml");
    original.to_file(&copy).expect("Failed to save settings");
    let restored = Settings::from_file(&copy).expect("Failed to parse");

    assert_eq!(restored, original);
}

#[test]
fn test_missing_file_is_an_error() {
    let result = Settings::from_file("/nonexistent/horizon.toml");
    assert!(result.is_err());
}
