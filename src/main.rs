//! # News Quiz
//!
//! A small HTTP service that reads today's newspaper index page, picks the
//! first article, extracts its text, and asks an OpenAI-compatible LLM for a
//! summary plus exam-preparation questions and answers.
//!
//! ## Usage
//!
//! ```sh
//! LLM_API_KEY=... news_quiz --bind 127.0.0.1:5000
//! curl http://127.0.0.1:5000/api/articles
//! ```
//!
//! ## Architecture
//!
//! Each request runs a linear pipeline:
//! 1. **Indexing**: Discover article URLs on the index page
//! 2. **Fetching**: Download the first article and extract its readable text
//! 3. **Summarizing**: Send the text to the LLM for a summary and Q&A
//! 4. **Responding**: Return the report as JSON
//!
//! Stage failures are logged and absorbed; the endpoint always answers 200.

use clap::Parser;
use std::error::Error;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod error;
mod models;
mod pipeline;
mod scrapers;
mod server;
mod summarizer;
mod utils;

use api::{AskAsync, ChatClient, RetryAsk};
use cli::Cli;
use config::Settings;
use pipeline::Pipeline;
use scrapers::article::ReadabilityFetcher;
use scrapers::links::LinkExtractor;
use server::AppState;
use summarizer::Summarizer;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "news_quiz starting up");

    let args = Cli::parse();
    debug!(?args.config, "Parsed CLI arguments");

    let settings = Settings::resolve(args).await?;
    info!(
        bind = %settings.bind,
        index_url = %settings.index_url,
        article_marker = %settings.article_marker,
        max_questions = settings.max_questions,
        llm = ?settings.llm,
        "Loaded configuration"
    );

    let http = scrapers::http_client(settings.request_timeout)?;

    let chat = ChatClient::from_settings(&settings.llm)?;
    info!(model = chat.model(), "LLM client ready");
    let llm: Arc<dyn AskAsync> = Arc::new(RetryAsk::new(
        chat,
        settings.llm.max_retries,
        settings.llm.retry_base_delay,
    ));

    let pipeline = Pipeline::new(
        LinkExtractor::new(http.clone(), settings.article_marker.clone()),
        Arc::new(ReadabilityFetcher::new(http)),
        Summarizer::new(llm, settings.max_questions),
    );

    let app = server::router(AppState {
        pipeline,
        index_url: settings.index_url.clone(),
    });

    let listener = tokio::net::TcpListener::bind(settings.bind).await?;
    info!(addr = %listener.local_addr()?, "Listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
