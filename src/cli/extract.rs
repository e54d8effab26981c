use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use crate::domain::{ContentInput, Medium, Payload};
use crate::state::AppState;

#[derive(Args, Clone)]
pub struct ExtractArgs {
    /// File to analyze
    pub file: PathBuf,

    /// Content type (pdf, text, image/png, video...); guessed from the extension when omitted
    #[arg(long)]
    pub medium: Option<String>,
}

pub async fn run(state: &AppState, args: ExtractArgs) -> anyhow::Result<()> {
    let input = read_input(&args).await?;
    let result = state.content.process(&input).await;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn read_input(args: &ExtractArgs) -> anyhow::Result<ContentInput> {
    let filename = args
        .file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let medium = match &args.medium {
        Some(medium) => medium.parse::<Medium>()?,
        None => Medium::from_filename(&filename)
            .with_context(|| format!("Cannot tell the content type of '{}'; pass --medium", filename))?,
    };

    let bytes = tokio::fs::read(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    Ok(ContentInput::new(Payload::from(bytes), medium, filename))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_input_guesses_medium() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lecture.txt");
        std::fs::write(&path, "Mitochondria produce energy.").unwrap();

        let input = read_input(&ExtractArgs {
            file: path,
            medium: None,
        })
        .await
        .unwrap();

        assert_eq!(input.medium, Medium::Text);
        assert_eq!(input.filename, "lecture.txt");
        assert_eq!(input.payload.decode_text(), "Mitochondria produce energy.");
    }

    #[tokio::test]
    async fn test_explicit_medium_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.bin");
        std::fs::write(&path, [0xFF, 0xD8, 0xFF]).unwrap();

        let input = read_input(&ExtractArgs {
            file: path,
            medium: Some("image/jpeg".to_string()),
        })
        .await
        .unwrap();

        assert_eq!(input.medium, Medium::Image);
    }

    #[tokio::test]
    async fn test_unknown_extension_needs_medium() {
        let args = ExtractArgs {
            file: PathBuf::from("archive.zip"),
            medium: None,
        };

        tokio_test::assert_err!(read_input(&args).await);
    }
}
