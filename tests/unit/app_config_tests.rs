/*!
 * Tests for application configuration functionality
 */

use doctran::app_config::{Config, LogLevel, ProviderConfig};
use doctran::providers::ProviderGateway;

/// Test default configuration values
#[test]
fn test_defaultConfig_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 8000);
    assert_eq!(config.providers.default_provider, "deepseek");
    assert_eq!(config.providers.request_timeout_secs, 60);
    assert_eq!(config.providers.max_concurrent_requests, None);
    assert_eq!(config.defaults.target_language, "中文");
    assert_eq!(config.log_level, LogLevel::Info);

    let names: Vec<&str> = config
        .providers
        .available_providers
        .iter()
        .map(|p| p.name.as_str())
        .collect();
    assert_eq!(names, vec!["deepseek", "qwen"]);
}

#[test]
fn test_config_fromPartialJson_shouldKeepExplicitValues() {
    let config: Config = serde_json::from_str(
        r#"{
            "log_level": "debug",
            "server": { "port": 9100 },
            "providers": {
                "default_provider": "local",
                "available_providers": [
                    { "name": "local", "endpoint": "http://localhost:1234/v1", "model": "qwen2.5" }
                ],
                "max_concurrent_requests": 2
            }
        }"#,
    )
    .unwrap();

    assert_eq!(config.log_level, LogLevel::Debug);
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 9100);
    assert_eq!(config.providers.max_concurrent_requests, Some(2));
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_validate_withInvalidEndpoint_shouldFail() {
    let mut config = Config::default();
    config.providers.available_providers[0].endpoint = "not a url".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_config_validate_withZeroPort_shouldFail() {
    let mut config = Config::default();
    config.server.port = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_gateway_withUnknownProvider_shouldFallBackToDefault() {
    let mut config = Config::default();
    config.providers.default_provider = "qwen".to_string();
    let gateway = ProviderGateway::new(&config.providers);

    let resolved = gateway.resolve("does-not-exist");

    assert_eq!(resolved.name, "qwen");
    assert_eq!(resolved.model, ProviderConfig::qwen().model);
}

#[test]
fn test_gateway_withKnownProviderInOtherCase_shouldResolveIt() {
    let gateway = ProviderGateway::new(&Config::default().providers);
    let resolved = gateway.resolve("DeepSeek");
    assert_eq!(resolved.name, "deepseek");
    assert_eq!(resolved.endpoint, "https://api.deepseek.com/v1");
}

#[test]
fn test_logLevel_toLevelFilter_shouldMatch() {
    assert_eq!(LogLevel::Warn.to_level_filter(), log::LevelFilter::Warn);
    assert_eq!(LogLevel::Trace.to_level_filter(), log::LevelFilter::Trace);
}
