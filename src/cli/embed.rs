use clap::Args;

use crate::domain::ErrorReport;
use crate::state::AppState;

#[derive(Args, Clone)]
pub struct EmbedArgs {
    /// Text to embed
    pub text: String,
}

pub async fn run(state: &AppState, args: EmbedArgs) -> anyhow::Result<()> {
    match state.gateway.embed(&args.text).await {
        Ok(embedding) => {
            println!("{}", serde_json::to_string(&embedding)?);
            Ok(())
        }
        Err(e) => {
            let report = ErrorReport::from_error(&e);
            report.log();
            println!("{}", report.to_json());
            anyhow::bail!(report.user_message)
        }
    }
}
