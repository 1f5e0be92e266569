//! Article page scraper.
//!
//! Downloads a single article and extracts its headline and readable body
//! with a Readability port (`dom_smoothie`), which strips navigation, ads
//! and other boilerplate. When Readability cannot find an article body the
//! page title is still returned with an empty body.

use crate::error::PipelineError;
use crate::models::ArticleContent;
use crate::utils::normalize_text;
use async_trait::async_trait;
use dom_smoothie::{Config, Readability};
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{info, instrument, warn};

static TITLE_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [r#"meta[property="og:title"]"#, "h1", "title"]
        .iter()
        .map(|s| Selector::parse(s).expect("valid title selector"))
        .collect()
});

/// Something that can turn an article URL into its title and text.
#[async_trait]
pub trait ArticleSource: Send + Sync {
    /// Download and parse the article at `url`.
    async fn fetch_article(&self, url: &str) -> Result<ArticleContent, PipelineError>;
}

/// [`ArticleSource`] that downloads pages over HTTP and runs Readability on them.
#[derive(Debug, Clone)]
pub struct ReadabilityFetcher {
    http: Client,
}

impl ReadabilityFetcher {
    pub fn new(http: Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ArticleSource for ReadabilityFetcher {
    #[instrument(level = "info", skip(self))]
    async fn fetch_article(&self, url: &str) -> Result<ArticleContent, PipelineError> {
        let extraction_error = |reason: String| PipelineError::Extraction {
            url: url.to_string(),
            reason,
        };

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| extraction_error(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(extraction_error(format!("status {status}")));
        }
        let html = response
            .text()
            .await
            .map_err(|e| extraction_error(e.to_string()))?;

        let article = extract_article(&html, url)?;
        info!(
            title = %article.title,
            bytes = article.body.len(),
            "Parsed article"
        );
        Ok(article)
    }
}

/// Extract title and body from an article page.
///
/// Falls back to the page's `og:title`, `<h1>` or `<title>` with an empty
/// body when Readability fails, and errors only when no title is found
/// either.
pub fn extract_article(html: &str, url: &str) -> Result<ArticleContent, PipelineError> {
    match readable(html, url) {
        Ok(content) if !content.title.is_empty() || !content.body.is_empty() => Ok(content),
        Ok(_) => title_only(html, url, "readability found no content".to_string()),
        Err(reason) => title_only(html, url, reason),
    }
}

fn readable(html: &str, url: &str) -> Result<ArticleContent, String> {
    let cfg = Config {
        max_elements_to_parse: 9000,
        ..Default::default()
    };
    let mut readability = Readability::new(html, Some(url), Some(cfg)).map_err(|e| e.to_string())?;
    let article = readability.parse().map_err(|e| e.to_string())?;
    Ok(ArticleContent {
        title: article.title.trim().to_string(),
        body: normalize_text(&article.text_content.to_string()),
    })
}

fn title_only(html: &str, url: &str, reason: String) -> Result<ArticleContent, PipelineError> {
    match fallback_title(html) {
        Some(title) => {
            warn!(%url, %reason, "Readability failed; keeping title with empty body");
            Ok(ArticleContent {
                title,
                body: String::new(),
            })
        }
        None => Err(PipelineError::Extraction {
            url: url.to_string(),
            reason,
        }),
    }
}

/// The first non-empty of `og:title`, `<h1>` and `<title>`.
pub fn fallback_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    TITLE_SELECTORS.iter().find_map(|selector| {
        document.select(selector).find_map(|element| {
            let text = match element.value().attr("content") {
                Some(content) => content.to_string(),
                None => element.text().collect::<Vec<_>>().join(" "),
            };
            let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
            (!text.is_empty()).then_some(text)
        })
    })
}
