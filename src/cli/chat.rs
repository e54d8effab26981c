use clap::Args;
use futures::StreamExt;
use tokio::io::AsyncWriteExt;

use crate::pipeline::ChatRequest;
use crate::state::AppState;

#[derive(Args, Clone)]
pub struct ChatArgs {
    /// Question or message for the tutor
    pub message: String,

    /// Content snippet the tutor may draw on (repeatable)
    #[arg(long)]
    pub context: Vec<String>,

    /// Print the reply as it arrives
    #[arg(long)]
    pub stream: bool,
}

pub async fn run(state: &AppState, args: ChatArgs) -> anyhow::Result<()> {
    let request = ChatRequest::new(args.message).with_context(args.context);

    if !args.stream {
        println!("{}", state.chat.reply(&request).await);
        return Ok(());
    }

    let mut stdout = tokio::io::stdout();
    let mut deltas = state.chat.reply_stream(&request).await;
    while let Some(delta) = deltas.next().await {
        stdout.write_all(delta?.as_bytes()).await?;
        stdout.flush().await?;
    }
    stdout.write_all(b"\n").await?;

    Ok(())
}
