//! The article pipeline: index → fetch → summarize → report.
//!
//! [`Pipeline::build_report`] runs the stages strictly in sequence for one
//! request. Only the first article link (in document order) is processed.
//! Stage failures are absorbed: a missing index or article produces an
//! empty report list, a failed summary produces a report with an empty
//! summary. Each absorbed failure is recorded as a [`PipelineIssue`].

use crate::models::{ArticleReport, PipelineIssue, PipelineOutcome};
use crate::scrapers::article::ArticleSource;
use crate::scrapers::links::LinkExtractor;
use crate::summarizer::Summarizer;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, instrument, warn};

/// The assembled pipeline, shared by all requests.
#[derive(Clone)]
pub struct Pipeline {
    links: LinkExtractor,
    articles: Arc<dyn ArticleSource>,
    summarizer: Summarizer,
}

impl Pipeline {
    pub fn new(
        links: LinkExtractor,
        articles: Arc<dyn ArticleSource>,
        summarizer: Summarizer,
    ) -> Self {
        Self {
            links,
            articles,
            summarizer,
        }
    }

    /// Produce the report for the index page at `index_url`.
    #[instrument(level = "info", skip(self))]
    pub async fn build_report(&self, index_url: &str) -> PipelineOutcome {
        let t0 = Instant::now();
        let mut outcome = PipelineOutcome::default();

        let links = match self.links.try_extract_links(index_url).await {
            Ok(links) => links,
            Err(e) => {
                error!(error = %e, "Failed to retrieve the index page");
                outcome.issues.push(PipelineIssue::IndexUnavailable);
                return outcome;
            }
        };

        let Some(link) = links.into_iter().next() else {
            info!(marker = self.links.marker(), "No article links found");
            return outcome;
        };

        info!(%link, "Processing link");
        let content = match self.articles.fetch_article(&link).await {
            Ok(content) => content,
            Err(e) => {
                warn!(%link, error = %e, "Skipping article");
                outcome.issues.push(PipelineIssue::ArticleUnavailable);
                return outcome;
            }
        };

        let summary = match self.summarizer.try_summarize(&content.body).await {
            Ok(summary) => summary,
            Err(e) => {
                error!(%link, error = %e, "Summarization failed; returning empty summary");
                outcome.issues.push(PipelineIssue::SummaryUnavailable);
                Default::default()
            }
        };

        outcome.reports.push(ArticleReport::new(content, summary));
        info!(
            elapsed_ms = t0.elapsed().as_millis() as u64,
            reports = outcome.reports.len(),
            "Pipeline complete"
        );
        outcome
    }
}
