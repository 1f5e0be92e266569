//! Scrapers for discovering and reading newspaper articles.
//!
//! Scraping follows a two-phase pattern:
//!
//! 1. **Indexing**: Discover article URLs from the source's index page ([`links`])
//! 2. **Fetching**: Download one article and extract its readable text ([`article`])
//!
//! Both phases share one `reqwest::Client`, so connection pooling, the user
//! agent and the request timeout are configured once. The LLM client has its
//! own, with a longer timeout.
//!
//! Failures never abort a request: the pipeline logs them and falls back
//! to "no links" or "skip this article".

pub mod article;
pub mod links;

use reqwest::Client;
use std::time::Duration;

/// User agent sent with every outgoing request.
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Build the HTTP client shared by the scrapers.
pub fn http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
}
