//! Data models for fetched articles and their summarized representations.
//!
//! This module defines the core data structures passed along the pipeline:
//! - [`ArticleContent`]: Title and body text extracted from an article page
//! - [`SummaryResult`]: LLM-produced summary with question/answer pairs
//! - [`ArticleReport`]: The unit returned to API clients
//! - [`PipelineOutcome`]: Reports plus any stage failures that were absorbed
//!
//! Field names of [`ArticleReport`] are part of the HTTP contract
//! (`title`, `full_text`, `summary`, `mcq`).

use serde::{Deserialize, Serialize};

/// An article as extracted from its page, before summarization.
///
/// The `body` may be empty when only the title could be recovered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleContent {
    /// The article headline.
    pub title: String,
    /// The readable body text with boilerplate removed.
    pub body: String,
}

/// A single exam-style question with its answer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct QnaPair {
    pub question: String,
    pub answer: String,
}

/// The structured answer expected from the LLM.
///
/// Both keys are required when deserializing; a response missing either is
/// treated as malformed. [`Default`] is the empty fallback used whenever
/// summarization fails.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SummaryResult {
    /// A concise summary of the article.
    pub summary: String,
    /// Up to the configured maximum of question/answer pairs.
    pub qna: Vec<QnaPair>,
}

/// A summarized article as returned by `GET /api/articles`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ArticleReport {
    pub title: String,
    pub full_text: String,
    pub summary: String,
    pub mcq: Vec<QnaPair>,
}

impl ArticleReport {
    /// Combine extracted content with its summary.
    pub fn new(content: ArticleContent, summary: SummaryResult) -> Self {
        Self {
            title: content.title,
            full_text: content.body,
            summary: summary.summary,
            mcq: summary.qna,
        }
    }
}

/// A pipeline stage that failed and was replaced by its fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineIssue {
    /// The index page could not be fetched; no links were available.
    IndexUnavailable,
    /// The selected article could not be downloaded or parsed.
    ArticleUnavailable,
    /// The LLM call or its response failed; the summary is empty.
    SummaryUnavailable,
}

impl PipelineIssue {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineIssue::IndexUnavailable => "index-unavailable",
            PipelineIssue::ArticleUnavailable => "article-unavailable",
            PipelineIssue::SummaryUnavailable => "summary-unavailable",
        }
    }
}

/// Everything one pipeline run produced.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PipelineOutcome {
    /// Zero or one report.
    pub reports: Vec<ArticleReport>,
    /// Stage failures absorbed along the way, in the order they occurred.
    pub issues: Vec<PipelineIssue>,
}

impl PipelineOutcome {
    /// Issues rendered as a comma-separated list, or `None` when clean.
    pub fn issues_header(&self) -> Option<String> {
        if self.issues.is_empty() {
            None
        } else {
            Some(self.issues.iter().map(PipelineIssue::as_str).collect::<Vec<_>>().join(","))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_serialization_uses_contract_keys() {
        let report = ArticleReport::new(
            ArticleContent {
                title: "T".to_string(),
                body: "B".to_string(),
            },
            SummaryResult {
                summary: "S".to_string(),
                qna: vec![QnaPair {
                    question: "Q1".to_string(),
                    answer: "A1".to_string(),
                }],
            },
        );

        let json = serde_json::to_string(&report).unwrap();
        assert_eq!(
            json,
            r#"{"title":"T","full_text":"B","summary":"S","mcq":[{"question":"Q1","answer":"A1"}]}"#
        );
    }

    #[test]
    fn test_summary_result_requires_both_keys() {
        let missing_qna = serde_json::from_str::<SummaryResult>(r#"{"summary":"S"}"#);
        assert!(missing_qna.is_err());

        let missing_summary = serde_json::from_str::<SummaryResult>(r#"{"qna":[]}"#);
        assert!(missing_summary.is_err());
    }

    #[test]
    fn test_summary_result_default_is_empty() {
        let empty = SummaryResult::default();
        assert_eq!(empty.summary, "");
        assert!(empty.qna.is_empty());
    }

    #[test]
    fn test_issues_header() {
        let clean = PipelineOutcome::default();
        assert_eq!(clean.issues_header(), None);

        let outcome = PipelineOutcome {
            reports: vec![],
            issues: vec![PipelineIssue::ArticleUnavailable, PipelineIssue::SummaryUnavailable],
        };
        assert_eq!(
            outcome.issues_header().as_deref(),
            Some("article-unavailable,summary-unavailable")
        );
    }
}
