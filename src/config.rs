//! Runtime settings resolved from CLI flags, environment and an optional file.
//!
//! Precedence, highest first: command-line flag, environment variable (both
//! handled by `clap`), YAML config file, built-in default.

use crate::cli::Cli;
use crate::error::ConfigError;
use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::{info, instrument};
use url::Url;

pub const DEFAULT_BIND: &str = "127.0.0.1:5000";
pub const DEFAULT_INDEX_URL: &str = "https://indianexpress.com/todays-paper/";
pub const DEFAULT_ARTICLE_MARKER: &str = "https://indianexpress.com/article";
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.aimlapi.com";
pub const DEFAULT_MODEL: &str = "meta-llama/Meta-Llama-3.1-70B-Instruct-Turbo";
/// Upper bound on question/answer pairs per article.
pub const MAX_QUESTIONS: usize = 5;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
/// Completions for long articles routinely take longer than a page download.
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_MAX_RETRIES: usize = 3;
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 1000;

/// Settings as they may appear in the YAML config file.
///
/// ```yaml
/// bind: 0.0.0.0:8080
/// index_url: https://indianexpress.com/todays-paper/
/// llm_api_key: ...
/// model: meta-llama/Meta-Llama-3.1-70B-Instruct-Turbo
/// max_questions: 5
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub bind: Option<String>,
    pub index_url: Option<String>,
    pub article_marker: Option<String>,
    pub llm_api_key: Option<String>,
    pub llm_base_url: Option<String>,
    pub model: Option<String>,
    pub max_questions: Option<usize>,
    pub request_timeout_secs: Option<u64>,
    pub llm_timeout_secs: Option<u64>,
    pub max_retries: Option<usize>,
    pub retry_base_delay_ms: Option<u64>,
}

impl FileConfig {
    pub fn from_yaml_str(path: &str, yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    pub async fn load(path: &str) -> Result<Self, ConfigError> {
        let yaml = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_string(),
                source,
            })?;
        Self::from_yaml_str(path, &yaml)
    }
}

/// Connection details for the LLM provider.
#[derive(Clone)]
pub struct LlmSettings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_retries: usize,
    pub retry_base_delay: Duration,
    /// Per-request timeout for completion calls, separate from the scrapers'.
    pub timeout: Duration,
}

// Keeps the key out of logs.
impl std::fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmSettings")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_retries", &self.max_retries)
            .field("retry_base_delay", &self.retry_base_delay)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Fully resolved and validated settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub bind: SocketAddr,
    pub index_url: String,
    pub article_marker: String,
    pub max_questions: usize,
    pub request_timeout: Duration,
    pub llm: LlmSettings,
}

impl Settings {
    /// Load the optional config file named by `--config` and resolve.
    #[instrument(level = "info", skip_all)]
    pub async fn resolve(cli: Cli) -> Result<Self, ConfigError> {
        let file = match cli.config.as_deref() {
            Some(path) => {
                let file = FileConfig::load(path).await?;
                info!(path, "Loaded configuration file");
                file
            }
            None => FileConfig::default(),
        };
        Self::from_layers(cli, file)
    }

    /// Merge CLI/env values over file values over defaults, then validate.
    pub fn from_layers(cli: Cli, file: FileConfig) -> Result<Self, ConfigError> {
        let bind = cli
            .bind
            .or(file.bind)
            .unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind: SocketAddr = bind.parse().map_err(|e| ConfigError::Invalid {
            field: "bind",
            reason: format!("{bind:?}: {e}"),
        })?;

        let index_url = cli
            .index_url
            .or(file.index_url)
            .unwrap_or_else(|| DEFAULT_INDEX_URL.to_string());
        validate_url("index_url", &index_url)?;

        let article_marker = cli
            .article_marker
            .or(file.article_marker)
            .unwrap_or_else(|| DEFAULT_ARTICLE_MARKER.to_string());
        if article_marker.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "article_marker",
                reason: "must not be empty".to_string(),
            });
        }

        let api_key = cli
            .llm_api_key
            .or(file.llm_api_key)
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::Missing("llm_api_key"))?;

        let base_url = cli
            .llm_base_url
            .or(file.llm_base_url)
            .unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_string());
        validate_url("llm_base_url", &base_url)?;

        let model = cli
            .model
            .or(file.model)
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let max_questions = cli
            .max_questions
            .or(file.max_questions)
            .unwrap_or(MAX_QUESTIONS);
        if !(1..=MAX_QUESTIONS).contains(&max_questions) {
            return Err(ConfigError::Invalid {
                field: "max_questions",
                reason: format!("{max_questions} is outside 1..={MAX_QUESTIONS}"),
            });
        }

        let timeout_secs = positive_secs(
            "request_timeout_secs",
            cli.request_timeout_secs.or(file.request_timeout_secs),
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?;
        let llm_timeout_secs = positive_secs(
            "llm_timeout_secs",
            cli.llm_timeout_secs.or(file.llm_timeout_secs),
            DEFAULT_LLM_TIMEOUT_SECS,
        )?;

        let max_retries = cli
            .max_retries
            .or(file.max_retries)
            .unwrap_or(DEFAULT_MAX_RETRIES);
        let retry_base_delay_ms = cli
            .retry_base_delay_ms
            .or(file.retry_base_delay_ms)
            .unwrap_or(DEFAULT_RETRY_BASE_DELAY_MS);

        Ok(Self {
            bind,
            index_url,
            article_marker,
            max_questions,
            request_timeout: Duration::from_secs(timeout_secs),
            llm: LlmSettings {
                api_key,
                base_url: base_url.trim_end_matches('/').to_string(),
                model,
                max_retries,
                retry_base_delay: Duration::from_millis(retry_base_delay_ms),
                timeout: Duration::from_secs(llm_timeout_secs),
            },
        })
    }
}

fn positive_secs(field: &'static str, value: Option<u64>, default: u64) -> Result<u64, ConfigError> {
    match value.unwrap_or(default) {
        0 => Err(ConfigError::Invalid {
            field,
            reason: "must be at least 1".to_string(),
        }),
        secs => Ok(secs),
    }
}

fn validate_url(field: &'static str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value).map_err(|e| ConfigError::Invalid {
        field,
        reason: format!("{value:?}: {e}"),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::Invalid {
            field,
            reason: format!("unsupported scheme {other:?}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["news_quiz"];
        argv.extend_from_slice(args);
        Cli::parse_from(argv)
    }

    fn file_with_key() -> FileConfig {
        FileConfig {
            llm_api_key: Some("from-file".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_apply() {
        let settings = Settings::from_layers(cli(&["--llm-api-key", "k"]), FileConfig::default())
            .unwrap();
        assert_eq!(settings.bind, DEFAULT_BIND.parse::<SocketAddr>().unwrap());
        assert_eq!(settings.index_url, DEFAULT_INDEX_URL);
        assert_eq!(settings.article_marker, DEFAULT_ARTICLE_MARKER);
        assert_eq!(settings.max_questions, 5);
        assert_eq!(settings.request_timeout, Duration::from_secs(30));
        assert_eq!(settings.llm.base_url, DEFAULT_LLM_BASE_URL);
        assert_eq!(settings.llm.model, DEFAULT_MODEL);
        assert_eq!(settings.llm.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(settings.llm.timeout, Duration::from_secs(DEFAULT_LLM_TIMEOUT_SECS));
    }

    #[test]
    fn test_llm_timeout_is_independent_of_request_timeout() {
        let settings = Settings::from_layers(
            cli(&["--request-timeout-secs", "10"]),
            FileConfig {
                llm_timeout_secs: Some(900),
                ..file_with_key()
            },
        )
        .unwrap();
        assert_eq!(settings.request_timeout, Duration::from_secs(10));
        assert_eq!(settings.llm.timeout, Duration::from_secs(900));

        let settings = Settings::from_layers(cli(&["--llm-timeout-secs", "45"]), file_with_key())
            .unwrap();
        assert_eq!(settings.request_timeout, Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS));
        assert_eq!(settings.llm.timeout, Duration::from_secs(45));

        for field in ["--request-timeout-secs", "--llm-timeout-secs"] {
            let err = Settings::from_layers(cli(&[field, "0"]), file_with_key()).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { .. }));
        }
    }

    #[test]
    fn test_cli_overrides_file() {
        let file = FileConfig {
            model: Some("file-model".to_string()),
            max_questions: Some(2),
            ..file_with_key()
        };
        let settings = Settings::from_layers(cli(&["--model", "cli-model"]), file).unwrap();
        assert_eq!(settings.llm.model, "cli-model");
        assert_eq!(settings.max_questions, 2);
        assert_eq!(settings.llm.api_key, "from-file");
    }

    #[test]
    fn test_missing_api_key_is_rejected() {
        let err = Settings::from_layers(cli(&[]), FileConfig::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("llm_api_key")));

        let blank = FileConfig {
            llm_api_key: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(Settings::from_layers(cli(&[]), blank).is_err());
    }

    #[test]
    fn test_max_questions_bounds() {
        for bad in ["0", "6"] {
            let err = Settings::from_layers(cli(&["--max-questions", bad]), file_with_key())
                .unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { field: "max_questions", .. }));
        }
    }

    #[test]
    fn test_invalid_urls_are_rejected() {
        let err = Settings::from_layers(cli(&["--index-url", "not a url"]), file_with_key())
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "index_url", .. }));

        let err = Settings::from_layers(cli(&["--llm-base-url", "ftp://llm.example"]), file_with_key())
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "llm_base_url", .. }));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let settings = Settings::from_layers(
            cli(&["--llm-base-url", "https://llm.example/v1/"]),
            file_with_key(),
        )
        .unwrap();
        assert_eq!(settings.llm.base_url, "https://llm.example/v1");
    }

    #[test]
    fn test_yaml_file_parsing() {
        let yaml = "bind: 0.0.0.0:8080\nllm_api_key: abc\nmax_retries: 7\n";
        let file = FileConfig::from_yaml_str("test.yaml", yaml).unwrap();
        assert_eq!(file.bind.as_deref(), Some("0.0.0.0:8080"));
        assert_eq!(file.max_retries, Some(7));

        let unknown = FileConfig::from_yaml_str("test.yaml", "colour: blue\n");
        assert!(matches!(unknown, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let settings = Settings::from_layers(cli(&["--llm-api-key", "super-secret"]), FileConfig::default())
            .unwrap();
        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
