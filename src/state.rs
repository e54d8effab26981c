//! Constructed-once wiring shared by every command

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::config::AppConfig;
use crate::domain::{
    AgentKind, DocumentChunker, FrameSampler, PromptCatalog, RetryPolicy,
};
use crate::infrastructure::{FfmpegFrameExtractor, ModelGateway, resolve_prompt_catalog};
use crate::pipeline::{ChatPipeline, ContentPipeline, QuizPipeline};

/// Gateway, prompts and pipelines built from one configuration
pub struct AppState {
    pub config: AppConfig,
    pub gateway: Arc<ModelGateway>,
    pub prompts: Arc<PromptCatalog>,
    pub content: ContentPipeline,
    pub quiz: QuizPipeline,
    pub chat: ChatPipeline,
}

impl AppState {
    pub async fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let gateway = Arc::new(ModelGateway::from_config(&config.ai)?);
        let prompts = Arc::new(
            resolve_prompt_catalog(config.pipeline.prompts_dir.as_deref().map(Path::new)).await,
        );
        let extractor = FfmpegFrameExtractor::detect(config.pipeline.frame_quality).await;

        Self::assemble(config, gateway, prompts, Arc::new(extractor))
    }

    /// Wire pipelines around an existing gateway and prompt catalog
    pub fn assemble(
        config: AppConfig,
        gateway: Arc<ModelGateway>,
        prompts: Arc<PromptCatalog>,
        frames: Arc<dyn crate::domain::FrameExtractor>,
    ) -> anyhow::Result<Self> {
        let retry = RetryPolicy::try_from(&config.ai.retry)?;
        let chunker = DocumentChunker::new(config.pipeline.max_chunk_chars)?;
        let sampler = FrameSampler::new(
            config.pipeline.max_frames,
            config.pipeline.min_frame_interval,
        )?;

        let agent = |kind: AgentKind| prompts.get(kind).cloned();

        let content = ContentPipeline::new(
            gateway.clone(),
            agent(AgentKind::Content),
            retry.clone(),
            chunker,
            sampler,
        )
        .with_frame_extractor(frames);
        let quiz = QuizPipeline::new(gateway.clone(), agent(AgentKind::Quiz), retry.clone())
            .with_max_attempts(config.pipeline.quiz_max_attempts);
        let chat = ChatPipeline::new(gateway.clone(), agent(AgentKind::Tutor), retry)
            .with_history_limit(config.pipeline.history_limit);

        info!(
            fallback_mode = gateway.is_fallback_mode(),
            agents = prompts.len(),
            "Application state ready"
        );

        Ok(Self {
            config,
            gateway,
            prompts,
            content,
            quiz,
            chat,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelsConfig;
    use crate::domain::video::MockFrameExtractor;

    #[tokio::test]
    async fn test_default_config_runs_in_fallback_mode() {
        let state = AppState::from_config(AppConfig::default()).await.unwrap();

        assert!(state.gateway.is_fallback_mode());
        assert_eq!(state.prompts.len(), AgentKind::ALL.len());
    }

    #[test]
    fn test_invalid_retry_config_rejected() {
        let mut config = AppConfig::default();
        config.ai.retry.max_attempts = 0;

        let result = AppState::assemble(
            config,
            Arc::new(ModelGateway::fallback(ModelsConfig::default())),
            Arc::new(PromptCatalog::builtin()),
            Arc::new(MockFrameExtractor::new()),
        );

        assert!(result.is_err());
    }
}
