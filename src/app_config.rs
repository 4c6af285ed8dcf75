use anyhow::{anyhow, Context, Result};
use log::{warn, LevelFilter};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;
use url::Url;

use crate::document::DocumentSchema;
use crate::language_utils;
use crate::translation::client::{ClientOptions, RetryPolicy};
use crate::translation::pipeline::PipelineConfig;
use crate::translation::tokenizer;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Source language code
    pub source_language: String,

    /// Target language code
    pub target_language: String,

    /// Batching config
    #[serde(default)]
    pub batch: BatchConfig,

    /// Translation service config
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Element and attribute names of the string table
    #[serde(default)]
    pub document: DocumentSchema,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// How records are grouped into requests
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BatchConfig {
    // @field: Max characters per batch
    #[serde(default = "default_char_limit")]
    pub char_limit: usize,

    // @field: Regex of inline placeholders kept out of translation
    #[serde(default = "default_placeholder_pattern")]
    pub placeholder_pattern: String,

    // @field: Retry a misaligned batch record by record
    #[serde(default = "default_true")]
    pub per_record_fallback: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            char_limit: default_char_limit(),
            placeholder_pattern: default_placeholder_pattern(),
            per_record_fallback: true,
        }
    }
}

/// Translation service and request pacing
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TranslationConfig {
    // @field: DeepLX-compatible translate endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    // @field: Lower bound of the wait before each request
    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: u64,

    // @field: Upper bound of the wait before each request
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Consecutive failures before a batch gives up; `null` retries forever
    #[serde(default = "default_retry_count")]
    pub retry_count: Option<u32>,

    /// Base backoff time, doubled on each retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Backoff ceiling
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// Consecutive failures after which the run is reported as stalled
    #[serde(default = "default_stall_after")]
    pub stall_after: u32,

    /// Seconds after which proxy rotation falls back to direct egress
    #[serde(default = "default_local_egress_interval_secs")]
    pub local_egress_interval_secs: u64,

    /// Proxy URLs to rotate through; empty means direct egress only
    #[serde(default)]
    pub proxies: Vec<String>,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
            min_delay_ms: default_min_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            stall_after: default_stall_after(),
            local_egress_interval_secs: default_local_egress_interval_secs(),
            proxies: Vec::new(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            Self::Error => LevelFilter::Error,
            Self::Warn => LevelFilter::Warn,
            Self::Info => LevelFilter::Info,
            Self::Debug => LevelFilter::Debug,
            Self::Trace => LevelFilter::Trace,
        }
    }
}

fn default_char_limit() -> usize {
    5000
}

fn default_placeholder_pattern() -> String {
    tokenizer::PLACEHOLDER_PATTERN.to_string()
}

fn default_true() -> bool {
    true
}

fn default_endpoint() -> String {
    "http://localhost:1188/translate".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_min_delay_ms() -> u64 {
    5000
}

fn default_max_delay_ms() -> u64 {
    10000
}

fn default_retry_count() -> Option<u32> {
    Some(20)
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

fn default_max_backoff_ms() -> u64 {
    60_000
}

fn default_stall_after() -> u32 {
    5
}

fn default_local_egress_interval_secs() -> u64 {
    720
}

impl Config {
    /// Load the config at `path`, writing a default one if it does not exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let file = File::open(path).with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let config = serde_json::from_reader(BufReader::new(file))
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            return Ok(config);
        }

        warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        config.save(path)?;
        Ok(config)
    }

    /// Write the config as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?;
        std::fs::write(path, json).with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        language_utils::validate_language_code(&self.source_language)
            .context("Invalid source language")?;
        language_utils::validate_language_code(&self.target_language)
            .context("Invalid target language")?;
        if self.source_language.trim().eq_ignore_ascii_case(self.target_language.trim()) {
            return Err(anyhow!("Source and target language are both '{}'", self.source_language));
        }

        if self.batch.char_limit == 0 {
            return Err(anyhow!("batch.char_limit must be greater than 0"));
        }
        tokenizer::record_pattern(&self.batch.placeholder_pattern)
            .with_context(|| format!("Invalid placeholder pattern: {}", self.batch.placeholder_pattern))?;

        let t = &self.translation;
        validate_http_url("translation.endpoint", &t.endpoint)?;
        for proxy in &t.proxies {
            validate_http_url("translation.proxies", proxy)?;
        }
        if t.min_delay_ms > t.max_delay_ms {
            return Err(anyhow!(
                "translation.min_delay_ms ({}) exceeds max_delay_ms ({})",
                t.min_delay_ms,
                t.max_delay_ms
            ));
        }
        if t.retry_count == Some(0) {
            return Err(anyhow!("translation.retry_count must be at least 1, or null for unlimited"));
        }
        if t.stall_after == 0 {
            return Err(anyhow!("translation.stall_after must be greater than 0"));
        }
        if t.timeout_secs == 0 {
            return Err(anyhow!("translation.timeout_secs must be greater than 0"));
        }

        Ok(())
    }

    /// Options for the translation client
    pub fn client_options(&self) -> ClientOptions {
        let t = &self.translation;
        ClientOptions {
            min_delay: Duration::from_millis(t.min_delay_ms),
            max_delay: Duration::from_millis(t.max_delay_ms),
            local_egress_interval: Duration::from_secs(t.local_egress_interval_secs),
            retry: RetryPolicy {
                max_consecutive_failures: t.retry_count,
                backoff_base: Duration::from_millis(t.retry_backoff_ms),
                backoff_max: Duration::from_millis(t.max_backoff_ms),
                stall_after: t.stall_after,
            },
        }
    }

    /// Settings for the pipeline
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig::new(&self.source_language, &self.target_language)
            .with_char_limit(self.batch.char_limit)
            .with_placeholder_pattern(&self.batch.placeholder_pattern)
            .with_schema(self.document.clone())
            .with_per_record_fallback(self.batch.per_record_fallback)
    }
}

fn validate_http_url(field: &str, value: &str) -> Result<()> {
    let url = Url::parse(value).with_context(|| format!("{} is not a valid URL: {}", field, value))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(anyhow!("{} has unsupported scheme '{}': {}", field, other, value)),
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: "en".to_string(),
            target_language: "de".to_string(),
            batch: BatchConfig::default(),
            translation: TranslationConfig::default(),
            document: DocumentSchema::default(),
            log_level: LogLevel::default(),
        }
    }
}
