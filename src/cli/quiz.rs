use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use crate::domain::quiz::DEFAULT_QUESTIONS;
use crate::domain::{ExtractionResult, QuizRequest};
use crate::state::AppState;

#[derive(Args, Clone)]
pub struct QuizArgs {
    /// Quiz topic
    #[arg(long)]
    pub topic: Option<String>,

    /// Content summary to base the questions on
    #[arg(long)]
    pub content: Option<String>,

    /// Extraction result (JSON from `extract`) to base the questions on
    #[arg(long, conflicts_with = "content")]
    pub from_result: Option<PathBuf>,

    /// Number of questions, 1-20
    #[arg(long, default_value_t = DEFAULT_QUESTIONS)]
    pub count: usize,
}

pub async fn run(state: &AppState, args: QuizArgs) -> anyhow::Result<()> {
    let request = build_request(args).await?;
    let questions = state.quiz.generate(&request).await;

    println!("{}", serde_json::to_string_pretty(&questions)?);
    Ok(())
}

async fn build_request(args: QuizArgs) -> anyhow::Result<QuizRequest> {
    let request = match &args.from_result {
        Some(path) => {
            let raw = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let result: ExtractionResult =
                serde_json::from_str(&raw).context("Not an extraction result")?;
            QuizRequest::from_extraction(args.topic, &result, args.count)?
        }
        None => QuizRequest::new(args.topic, args.content, args.count)?,
    };

    Ok(request)
}
