/*!
 * Tests for configuration loading and validation
 */

use anyhow::Result;
use std::fs;
use std::time::Duration;
use xmltl::app_config::{Config, LogLevel};

use crate::common;

/// Test that a missing config file is created with defaults
#[test]
fn test_loadOrCreate_withMissingFile_shouldWriteDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("xmltl.json");

    let config = Config::load_or_create(&path)?;

    assert!(path.exists());
    assert_eq!(config, Config::default());
    assert_eq!(Config::load_or_create(&path)?, config);
    Ok(())
}

/// Test that a partial config file falls back to defaults for omitted sections
#[test]
fn test_loadOrCreate_withPartialFile_shouldFillDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "xmltl.json",
        r#"{
            "source_language": "en",
            "target_language": "pt-BR",
            "translation": { "retry_count": null, "proxies": ["http://10.0.0.1:3128"] },
            "log_level": "debug"
        }"#,
    )?;

    let config = Config::load_or_create(&path)?;

    assert_eq!(config.target_language, "pt-BR");
    assert_eq!(config.batch.char_limit, 5000);
    assert_eq!(config.translation.retry_count, None);
    assert_eq!(config.translation.proxies.len(), 1);
    assert_eq!(config.log_level, LogLevel::Debug);
    assert!(config.validate().is_ok());
    Ok(())
}

/// Test that an unparseable config file is an error rather than silently replaced
#[test]
fn test_loadOrCreate_withInvalidJson_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "xmltl.json", "{ not json")?;

    assert!(Config::load_or_create(&path).is_err());
    assert_eq!(fs::read_to_string(&path)?, "{ not json");
    Ok(())
}

/// Test the validation rules one field at a time
#[test]
fn test_validate_withBrokenFields_shouldFail() {
    let broken: [fn(&mut Config); 9] = [
        |c| c.target_language = "xx".to_string(),
        |c| c.target_language = c.source_language.to_uppercase(),
        |c| c.batch.char_limit = 0,
        |c| c.batch.placeholder_pattern = "{[0-9".to_string(),
        |c| c.translation.endpoint = "localhost:1188".to_string(),
        |c| c.translation.proxies = vec!["ftp://proxy:21".to_string()],
        |c| c.translation.min_delay_ms = c.translation.max_delay_ms + 1,
        |c| c.translation.retry_count = Some(0),
        |c| c.translation.stall_after = 0,
    ];

    for (i, breaker) in broken.iter().enumerate() {
        let mut config = Config::default();
        breaker(&mut config);
        assert!(config.validate().is_err(), "case {} should be rejected", i);
    }
}

/// Test that client options carry the configured retry policy
#[test]
fn test_clientOptions_shouldMirrorTranslationSection() {
    let mut config = Config::default();
    config.translation.retry_count = None;
    config.translation.retry_backoff_ms = 250;
    config.translation.min_delay_ms = 0;
    config.translation.max_delay_ms = 0;

    let options = config.client_options();

    assert_eq!(options.retry.max_consecutive_failures, None);
    assert_eq!(options.retry.backoff_base, Duration::from_millis(250));
    assert_eq!(options.min_delay, Duration::ZERO);
    assert_eq!(options.local_egress_interval, Duration::from_secs(720));
    assert_eq!(config.pipeline_config().char_limit, 5000);
}
