//! Index page scraper.
//!
//! Downloads the newspaper's index page (by default the Indian Express
//! "today's paper" page) and collects links to individual articles. An
//! anchor is considered an article link when its resolved `href` contains
//! the configured article marker, e.g. `https://indianexpress.com/article`.
//!
//! Links are deduplicated and kept in the order they first appear in the
//! document, so "the first article" is stable between runs.
//!
//! The marker is matched against the href after it has been resolved with
//! [`Url::join`], not against the raw attribute. Resolution normalizes the
//! scheme and host to lowercase, so `HTTPS://IndianExpress.com/article/x`
//! matches and is returned as `https://indianexpress.com/article/x`. The
//! path keeps its case.

use crate::error::PipelineError;
use itertools::Itertools;
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, error, info, instrument};
use url::Url;

static ANCHOR_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("valid anchor selector"));

/// Extracts article links from an index page.
#[derive(Debug, Clone)]
pub struct LinkExtractor {
    http: Client,
    marker: String,
}

impl LinkExtractor {
    pub fn new(http: Client, marker: impl Into<String>) -> Self {
        Self {
            http,
            marker: marker.into(),
        }
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Index the page at `index_url` and return its article links.
    ///
    /// Network failures and error statuses are logged and produce an empty
    /// list rather than an error. The pipeline calls
    /// [`try_extract_links`](Self::try_extract_links) instead so it can
    /// record the failure.
    #[allow(dead_code)]
    #[instrument(level = "info", skip(self))]
    pub async fn extract_links(&self, index_url: &str) -> Vec<String> {
        match self.try_extract_links(index_url).await {
            Ok(links) => links,
            Err(e) => {
                error!(error = %e, "Failed to retrieve the index page");
                Vec::new()
            }
        }
    }

    /// Like [`extract_links`](Self::extract_links) but reports the failure.
    #[instrument(level = "info", skip(self))]
    pub async fn try_extract_links(&self, index_url: &str) -> Result<Vec<String>, PipelineError> {
        let fetch_error = |reason: String| PipelineError::Fetch {
            url: index_url.to_string(),
            reason,
        };

        let response = self
            .http
            .get(index_url)
            .send()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(fetch_error(format!("status {status}")));
        }
        let html = response
            .text()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;

        let base = Url::parse(index_url).ok();
        let links = article_links(&html, base.as_ref(), &self.marker);

        info!(count = links.len(), source = index_url, "Indexed article URLs");
        debug!(urls = ?links, "Article URLs");
        Ok(links)
    }
}

/// Collect the unique `href`s in `html` that contain `marker`.
///
/// Relative links are resolved against `base` when one is given; an `href`
/// that cannot be resolved is compared as written. Returned links are the
/// resolved form, which may differ from what the page wrote.
pub fn article_links(html: &str, base: Option<&Url>, marker: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(&ANCHOR_SELECTOR)
        .filter_map(|element| element.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(|href| resolve(base, href))
        .filter(|href| href.contains(marker))
        .unique()
        .collect()
}

fn resolve(base: Option<&Url>, href: &str) -> String {
    match base.map(|base| base.join(href)) {
        Some(Ok(resolved)) => resolved.to_string(),
        _ => href.to_string(),
    }
}
