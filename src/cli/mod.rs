//! Command-line interface
//!
//! Each subcommand drives one pipeline and prints its result:
//! - `extract`: structured metadata for a document, image or video
//! - `quiz`: validated multiple-choice questions
//! - `chat`: a tutor reply, optionally streamed
//! - `embed`: an embedding vector

pub mod chat;
pub mod embed;
pub mod extract;
pub mod quiz;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;
use crate::state::AppState;

/// Mentor AI - reliable LLM pipelines for study material
#[derive(Parser)]
#[command(name = "mentor-ai")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Extra configuration file layered over config/default and config/local
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Extract title, summary, key points, concepts and topics from a file
    Extract(extract::ExtractArgs),

    /// Generate a multiple-choice quiz
    Quiz(quiz::QuizArgs),

    /// Ask the tutor a question
    Chat(chat::ChatArgs),

    /// Print the embedding vector for a text
    Embed(embed::EmbedArgs),
}

/// Load configuration, install logging and dispatch the subcommand
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load_from(cli.config.as_deref())?;
    logging::init_logging(&config.logging);

    let state = AppState::from_config(config).await?;

    match cli.command {
        Command::Extract(args) => extract::run(&state, args).await,
        Command::Quiz(args) => quiz::run(&state, args).await,
        Command::Chat(args) => chat::run(&state, args).await,
        Command::Embed(args) => embed::run(&state, args).await,
    }
}
