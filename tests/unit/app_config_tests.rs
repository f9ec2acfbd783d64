/*!
 * Tests for application configuration functionality
 */

use anyhow::Result;
use std::fs;

use polysum::app_config::{Config, LogLevel, ModelProvider, ProviderConfig, SUM_MAX_LENGTH_RANGE, SUM_MIN_LENGTH_FLOOR};
use polysum::prompts::{DEFAULT_SUMMARY_PROMPT, DEFAULT_TRANSLATION_PROMPT};
use crate::common::create_temp_dir;

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.summarization.input_max_length, 1024);
    assert_eq!(config.summarization.sum_max_length, 200);
    assert_eq!(config.summarization.sum_min_length, 20);
    assert_eq!(config.summarization.num_beams, 2);
    assert_eq!(config.languages.supported, vec!["en", "ca", "es", "fr", "it", "pt", "ro"]);
    assert_eq!(config.models.provider, ModelProvider::Ollama);
    assert_eq!(config.models.common.retry_count, 3);
    assert_eq!(config.models.common.stage_timeout_secs, 120);
    assert_eq!(config.server.bind_address(), "127.0.0.1:5000");
    assert_eq!(config.log_level, LogLevel::Info);

    let ollama_config = config
        .models
        .get_provider_config(&ModelProvider::Ollama)
        .expect("Ollama provider config should exist");
    assert_eq!(ollama_config.endpoint, "http://localhost:11434");
    assert_eq!(ollama_config.max_chars_per_request, 4000);
}

#[test]
fn test_default_config_shouldValidate() {
    assert!(Config::default().validate().is_ok());
}

#[test]
fn test_validate_withInvalidLengths_shouldFail() {
    let mut config = Config::default();
    config.summarization.input_max_length = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.summarization.sum_min_length = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.summarization.sum_max_length = 20;
    config.summarization.sum_min_length = 20;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.summarization.num_beams = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withLengthsOutsideApiRange_shouldFail() {
    let mut config = Config::default();
    config.summarization.sum_min_length = SUM_MIN_LENGTH_FLOOR - 1;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.summarization.sum_max_length = SUM_MAX_LENGTH_RANGE[1] + 1;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.summarization.sum_min_length = SUM_MIN_LENGTH_FLOOR;
    config.summarization.sum_max_length = SUM_MAX_LENGTH_RANGE[1];
    assert!(config.validate().is_ok());
}

#[test]
fn test_default_prompts_shouldMatchEngineDefaults() {
    let config = Config::default();
    assert_eq!(config.models.common.translation_prompt, DEFAULT_TRANSLATION_PROMPT);
    assert_eq!(config.models.common.summary_prompt, DEFAULT_SUMMARY_PROMPT);
}

#[test]
fn test_validate_withLanguageProblems_shouldFail() {
    let mut config = Config::default();
    config.languages.supported = vec!["fr".to_string(), "es".to_string()];
    let error = config.validate().unwrap_err();
    assert!(error.to_string().contains("'en'"));

    let mut config = Config::default();
    config.languages.supported.push("xyz".to_string());
    assert!(config.validate().is_err());

    // German is a valid ISO code but has no translation route
    let mut config = Config::default();
    config.languages.supported.push("de".to_string());
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.languages.min_confidence = 1.5;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withThreeLetterCodes_shouldAccept() {
    let mut config = Config::default();
    config.languages.supported = vec!["eng".to_string(), "fra".to_string(), "spa".to_string()];
    assert!(config.validate().is_ok());

    let policy = config.languages.policy().unwrap();
    assert_eq!(policy.supported_codes(), vec!["en", "es", "fr"]);
}

#[test]
fn test_validate_withApiKeyProviders_shouldRequireKey() {
    for provider in [ModelProvider::OpenAI, ModelProvider::Anthropic] {
        let mut config = Config::default();
        config.models.provider = provider;
        assert!(config.validate().is_err(), "{} without key should fail", provider);

        config.models.active_provider_config_mut().api_key = "secret".to_string();
        assert!(config.validate().is_ok());
    }

    // Local servers need no key
    let mut config = Config::default();
    config.models.provider = ModelProvider::LMStudio;
    assert!(config.validate().is_ok());
}

#[test]
fn test_model_config_getters_withMissingProviderEntry_shouldFallBackToDefaults() {
    let mut config = Config::default();
    config.models.available_providers.clear();
    config.models.provider = ModelProvider::OpenAI;

    assert_eq!(config.models.get_model(), "gpt-4o-mini");
    assert_eq!(config.models.get_endpoint(), "https://api.openai.com/v1");
    assert_eq!(config.models.get_timeout_secs(), 60);
    assert!(config.models.get_api_key().is_empty());
}

#[test]
fn test_active_provider_config_mut_withMissingEntry_shouldCreateIt() {
    let mut config = Config::default();
    config.models.available_providers.clear();
    config.models.provider = ModelProvider::Anthropic;

    config.models.active_provider_config_mut().model = "claude-test".to_string();

    assert_eq!(config.models.available_providers.len(), 1);
    assert_eq!(config.models.get_model(), "claude-test");
    assert_eq!(config.models.get_max_chars_per_request(), 8000);
}

#[test]
fn test_provider_from_str_withKnownNames_shouldParse() {
    assert_eq!("ollama".parse::<ModelProvider>().unwrap(), ModelProvider::Ollama);
    assert_eq!("OpenAI".parse::<ModelProvider>().unwrap(), ModelProvider::OpenAI);
    assert_eq!("lmstudio".parse::<ModelProvider>().unwrap(), ModelProvider::LMStudio);
    assert!("bard".parse::<ModelProvider>().is_err());
    assert_eq!(ModelProvider::LMStudio.display_name(), "LM Studio");
}

#[test]
fn test_config_deserialize_withPartialJson_shouldFillDefaults() -> Result<()> {
    let json = r#"{
        "summarization": { "sum_max_length": 120 },
        "models": {
            "provider": "openai",
            "available_providers": [{ "type": "openai", "api_key": "sk-1", "model": "gpt-4o" }]
        },
        "log_level": "debug"
    }"#;
    let config: Config = serde_json::from_str(json)?;

    assert_eq!(config.summarization.sum_max_length, 120);
    assert_eq!(config.summarization.sum_min_length, 20);
    assert_eq!(config.models.get_model(), "gpt-4o");
    assert_eq!(config.models.get_endpoint(), "https://api.openai.com/v1");
    assert_eq!(config.log_level, LogLevel::Debug);
    assert_eq!(config.languages.supported.len(), 7);
    config.validate()?;
    Ok(())
}

#[test]
fn test_load_or_create_withMissingFile_shouldWriteDefaults() -> Result<()> {
    let temp_dir = create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");

    let config = Config::load_or_create(&path)?;
    assert!(path.exists());
    assert_eq!(config.summarization.input_max_length, 1024);

    let mut edited = config.clone();
    edited.server.port = 8080;
    edited.save(&path)?;
    assert_eq!(Config::load_or_create(&path)?.server.port, 8080);
    Ok(())
}

#[test]
fn test_from_file_withInvalidJson_shouldFail() -> Result<()> {
    let temp_dir = create_temp_dir()?;
    let path = temp_dir.path().join("broken.json");
    fs::write(&path, "{ not json")?;

    assert!(Config::from_file(&path).is_err());
    Ok(())
}

#[test]
fn test_provider_config_new_shouldUseProviderDefaults() {
    let anthropic = ProviderConfig::new(ModelProvider::Anthropic);
    assert_eq!(anthropic.provider_type, "anthropic");
    assert_eq!(anthropic.timeout_secs, 90);

    let lmstudio = ProviderConfig::new(ModelProvider::LMStudio);
    assert_eq!(lmstudio.endpoint, "http://localhost:1234/v1");
}
