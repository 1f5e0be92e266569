//! Article summarization and question generation.
//!
//! The [`Summarizer`] sends article text to the LLM with a fixed two-message
//! prompt and parses the JSON object it answers with into a
//! [`SummaryResult`]. The model is asked for a summary plus up to
//! `max_questions` exam-style (UPSC prelims) questions grounded in the
//! article.
//!
//! Failures never reach the caller of [`Summarizer::summarize`]: they are
//! logged and replaced by the empty [`SummaryResult`].

use crate::api::{AskAsync, ChatMessage};
use crate::error::PipelineError;
use crate::models::SummaryResult;
use crate::utils::{looks_truncated, strip_code_fences, truncate_for_log};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

const SYSTEM_PROMPT: &str = "You are an AI assistant who can summarize text.";

/// Build the prompt sent for one article.
pub fn build_messages(text: &str, max_questions: usize) -> Vec<ChatMessage> {
    let instructions = format!(
        "After summarizing the text, create questions along with their answers. \
         The questions should be relevant to the UPSC prelims exam; use the UPSC prelims \
         syllabus and previous year question papers as reference. Create questions only if \
         they can be answered from facts stated in the article. Create a maximum of \
         {max_questions} questions. Respond with a single JSON object with the key \"summary\" \
         holding the summary text and the key \"qna\" holding an array of objects with \
         \"question\" and \"answer\" keys. Return only the JSON object and nothing else."
    );
    vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(format!("{text}\n\n{instructions}")),
    ]
}

/// Parse an LLM answer into a [`SummaryResult`].
///
/// Strips a wrapping code fence first. The Q&A list is cut to
/// `max_questions` entries.
pub fn parse_summary(raw: &str, max_questions: usize) -> Result<SummaryResult, serde_json::Error> {
    let mut result: SummaryResult = serde_json::from_str(strip_code_fences(raw))?;
    result.qna.truncate(max_questions);
    Ok(result)
}

/// Summarizes article text through an LLM.
#[derive(Clone)]
pub struct Summarizer {
    llm: Arc<dyn AskAsync>,
    max_questions: usize,
}

impl Summarizer {
    pub fn new(llm: Arc<dyn AskAsync>, max_questions: usize) -> Self {
        Self { llm, max_questions }
    }

    /// Summarize `text`, falling back to an empty result on any failure.
    ///
    /// The pipeline uses [`try_summarize`](Self::try_summarize) so it can
    /// record the failure.
    #[allow(dead_code)]
    pub async fn summarize(&self, text: &str) -> SummaryResult {
        match self.try_summarize(text).await {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "Summarization failed; returning empty summary");
                SummaryResult::default()
            }
        }
    }

    /// Summarize `text`, reporting why it failed.
    ///
    /// Empty (or whitespace-only) text returns the empty result without
    /// calling the LLM. A response that is cut off mid-JSON is asked for
    /// once more.
    #[instrument(level = "info", skip_all, fields(bytes = text.len()))]
    pub async fn try_summarize(&self, text: &str) -> Result<SummaryResult, PipelineError> {
        if text.trim().is_empty() {
            info!("No article text; skipping summarization");
            return Ok(SummaryResult::default());
        }

        let messages = build_messages(text, self.max_questions);
        let response = self.llm.ask(&messages).await?;
        debug!(response = %truncate_for_log(&response, 300), "Received summary from API");

        let parsed = match parse_summary(&response, self.max_questions) {
            Err(e) if looks_truncated(&e) => {
                warn!(error = %e, "EOF while parsing; re-asking once");
                let retry = self.llm.ask(&messages).await?;
                parse_summary(&retry, self.max_questions).map_err(|e| (e, retry))
            }
            other => other.map_err(|e| (e, response)),
        };

        match parsed {
            Ok(result) => {
                info!(questions = result.qna.len(), "Summarized article");
                Ok(result)
            }
            Err((e, raw)) => {
                warn!(
                    error = %e,
                    response_preview = %truncate_for_log(&raw, 300),
                    "Model returned non-conforming JSON"
                );
                Err(PipelineError::MalformedResponse(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fakes::{ScriptedAsk, status_error};
    use crate::models::QnaPair;

    fn summarizer(fake: &Arc<ScriptedAsk>) -> Summarizer {
        Summarizer::new(fake.clone(), 5)
    }

    #[tokio::test]
    async fn test_empty_text_skips_the_api() {
        let fake = Arc::new(ScriptedAsk::answering(r#"{"summary":"S","qna":[]}"#));
        let result = summarizer(&fake).summarize("").await;
        assert_eq!(result, SummaryResult::default());

        let result = summarizer(&fake).summarize("  \n\t ").await;
        assert_eq!(result, SummaryResult::default());
        assert_eq!(fake.calls(), 0);
    }

    #[tokio::test]
    async fn test_parses_plain_json() {
        let fake = Arc::new(ScriptedAsk::answering(
            r#"{"summary":"S","qna":[{"question":"Q1","answer":"A1"}]}"#,
        ));
        let result = summarizer(&fake).summarize("Article body").await;
        assert_eq!(result.summary, "S");
        assert_eq!(
            result.qna,
            vec![QnaPair {
                question: "Q1".to_string(),
                answer: "A1".to_string()
            }]
        );
        assert_eq!(fake.calls(), 1);
    }

    #[tokio::test]
    async fn test_strips_code_fences() {
        let fake = Arc::new(ScriptedAsk::answering(
            "```json\n{\"summary\": \"Fenced\", \"qna\": []}\n```",
        ));
        let result = summarizer(&fake).summarize("Article body").await;
        assert_eq!(result.summary, "Fenced");
    }

    #[tokio::test]
    async fn test_malformed_response_falls_back() {
        let fake = Arc::new(ScriptedAsk::answering("Sure! Here is a summary of the article."));
        let result = summarizer(&fake).summarize("Article body").await;
        assert_eq!(result, SummaryResult::default());
        assert_eq!(fake.calls(), 1);
    }

    #[tokio::test]
    async fn test_missing_keys_are_malformed() {
        let fake = Arc::new(ScriptedAsk::answering(r#"{"summary":"S"}"#));
        let err = summarizer(&fake).try_summarize("Article body").await.unwrap_err();
        assert!(matches!(err, PipelineError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_api_failure_falls_back() {
        let fake = Arc::new(ScriptedAsk::new(vec![Err(status_error(401))]));
        let err = summarizer(&fake).try_summarize("Article body").await.unwrap_err();
        assert!(matches!(err, PipelineError::Summarization(_)));

        let fake = Arc::new(ScriptedAsk::new(vec![Err(status_error(500))]));
        assert_eq!(
            summarizer(&fake).summarize("Article body").await,
            SummaryResult::default()
        );
    }

    #[tokio::test]
    async fn test_truncated_json_is_asked_again_once() {
        let fake = Arc::new(ScriptedAsk::new(vec![
            Ok(r#"{"summary":"S","qna":[{"question":"#.to_string()),
            Ok(r#"{"summary":"Second try","qna":[]}"#.to_string()),
        ]));
        let result = summarizer(&fake).summarize("Article body").await;
        assert_eq!(result.summary, "Second try");
        assert_eq!(fake.calls(), 2);
    }

    #[tokio::test]
    async fn test_qna_is_capped() {
        let qna: Vec<_> = (1..=8)
            .map(|i| serde_json::json!({"question": format!("Q{i}"), "answer": format!("A{i}")}))
            .collect();
        let body = serde_json::json!({"summary": "S", "qna": qna}).to_string();
        let fake = Arc::new(ScriptedAsk::answering(&body));

        let result = Summarizer::new(fake.clone(), 3).summarize("Article body").await;
        assert_eq!(result.qna.len(), 3);
        assert_eq!(result.qna[2].question, "Q3");
    }

    #[tokio::test]
    async fn test_prompt_contains_article_and_instructions() {
        let fake = Arc::new(ScriptedAsk::answering(r#"{"summary":"S","qna":[]}"#));
        summarizer(&fake).summarize("The RBI kept the repo rate unchanged.").await;

        let prompts = fake.prompts();
        assert_eq!(prompts.len(), 1);
        let messages = &prompts[0];
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].role, "user");
        assert!(messages[1].content.starts_with("The RBI kept the repo rate unchanged."));
        assert!(messages[1].content.contains("maximum of 5 questions"));
        assert!(messages[1].content.contains("\"qna\""));
    }
}
