//! Command-line interface definitions for News Quiz.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Most arguments can also be provided via environment variables, and all of
//! the optional ones may come from a YAML file passed with `--config`.
//! Defaults are applied later, in [`crate::config::Settings::resolve`], so
//! that a file value is only used when neither flag nor variable is set.

use clap::Parser;

/// Command-line arguments for the News Quiz server.
///
/// # Examples
///
/// ```sh
/// # Minimal: the API key is the only required setting
/// LLM_API_KEY=... news_quiz
///
/// # Different source site and port
/// news_quiz --bind 0.0.0.0:8080 \
///     --index-url https://example.com/today/ \
///     --article-marker https://example.com/story
///
/// # Everything from a file
/// news_quiz --config ./news_quiz.yaml
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML config file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Address to listen on [default: 127.0.0.1:5000]
    #[arg(short, long, env = "NEWS_QUIZ_BIND")]
    pub bind: Option<String>,

    /// Index page listing today's articles
    #[arg(long, env = "NEWS_QUIZ_INDEX_URL")]
    pub index_url: Option<String>,

    /// Substring that identifies article links on the index page
    #[arg(long, env = "NEWS_QUIZ_ARTICLE_MARKER")]
    pub article_marker: Option<String>,

    /// API key for the OpenAI-compatible LLM provider
    #[arg(long, env = "LLM_API_KEY", hide_env_values = true)]
    pub llm_api_key: Option<String>,

    /// Base URL of the LLM provider (`/chat/completions` is appended)
    #[arg(long, env = "LLM_BASE_URL")]
    pub llm_base_url: Option<String>,

    /// Model identifier sent with every completion request
    #[arg(short, long, env = "LLM_MODEL")]
    pub model: Option<String>,

    /// Maximum number of question/answer pairs per article (1-5)
    #[arg(long)]
    pub max_questions: Option<usize>,

    /// Timeout for index and article downloads, in seconds
    #[arg(long)]
    pub request_timeout_secs: Option<u64>,

    /// Timeout for a single LLM completion request, in seconds
    #[arg(long)]
    pub llm_timeout_secs: Option<u64>,

    /// How many times a rate-limited or failed LLM call is retried
    #[arg(long)]
    pub max_retries: Option<usize>,

    /// Initial delay between LLM retries, in milliseconds (doubles each attempt)
    #[arg(long)]
    pub retry_base_delay_ms: Option<u64>,
}
