//! Agent prompt loading from a directory of JSON files

use std::path::Path;

use tracing::{info, warn};

use crate::domain::{AgentKind, AgentPrompt, DomainError, PromptCatalog};

/// Load `<dir>/{TutorAgent,QuizAgent,ContentAgent}.json`
///
/// A missing, unreadable or invalid file leaves that agent out of the catalog.
pub async fn load_prompt_catalog(dir: &Path) -> PromptCatalog {
    let mut catalog = PromptCatalog::empty();

    for kind in AgentKind::ALL {
        let path = dir.join(format!("{}.json", kind.file_stem()));
        match load_prompt(&path).await {
            Ok(prompt) => {
                if !catalog.insert(kind, prompt) {
                    warn!(path = %path.display(), "Agent prompt is missing required fields");
                }
            }
            Err(e) => warn!(path = %path.display(), "Could not load agent prompt: {}", e),
        }
    }

    info!(count = catalog.len(), dir = %dir.display(), "Loaded agent prompts");
    catalog
}

async fn load_prompt(path: &Path) -> Result<AgentPrompt, DomainError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| DomainError::configuration(format!("Failed to read prompt file: {}", e)))?;

    serde_json::from_str(&raw)
        .map_err(|e| DomainError::configuration(format!("Invalid prompt file: {}", e)))
}

/// Prompts from `dir` when given, built-in prompts otherwise
pub async fn resolve_prompt_catalog(dir: Option<&Path>) -> PromptCatalog {
    match dir {
        Some(dir) => load_prompt_catalog(dir).await,
        None => PromptCatalog::builtin(),
    }
}
