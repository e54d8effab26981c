use std::path::Path;

use serde::Deserialize;

use crate::domain::RetryConfig;

pub const DEFAULT_BASE_URL: &str = "https://api.tokenfactory.nebius.com/v1/";
pub const API_KEY_ENV: &str = "AI_API_KEY";

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

/// Model backend settings
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub models: ModelsConfig,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            timeout: default_timeout(),
            retry: RetryConfig::default(),
            models: ModelsConfig::default(),
        }
    }
}

impl AiConfig {
    /// A blank key counts as no key
    pub fn has_api_key(&self) -> bool {
        self.api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }
}

/// Purpose a model is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelRole {
    Tutor,
    Quiz,
    Content,
    Vision,
    Embedding,
}

impl ModelRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tutor => "tutor",
            Self::Quiz => "quiz",
            Self::Content => "content",
            Self::Vision => "vision",
            Self::Embedding => "embedding",
        }
    }
}

/// Per-role model parameters
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelSettings {
    pub model_id: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default)]
    pub fallback_model_id: Option<String>,
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    2048
}

fn default_top_p() -> f32 {
    1.0
}

impl ModelSettings {
    pub fn new(model_id: impl Into<String>, temperature: f32, max_tokens: u32) -> Self {
        Self {
            model_id: model_id.into(),
            temperature,
            max_tokens,
            top_p: default_top_p(),
            fallback_model_id: None,
        }
    }

    pub fn with_fallback(mut self, model_id: impl Into<String>) -> Self {
        self.fallback_model_id = Some(model_id.into());
        self
    }

    pub fn tutor() -> Self {
        Self::new("openai/gpt-oss-120b", 0.7, 2048).with_fallback("deepseek-ai/DeepSeek-V3")
    }

    pub fn quiz() -> Self {
        Self::new("openai/gpt-oss-120b", 0.3, 4096).with_fallback("deepseek-ai/DeepSeek-V3")
    }

    pub fn content() -> Self {
        Self::new("openai/gpt-oss-120b", 0.5, 4096).with_fallback("deepseek-ai/DeepSeek-V3")
    }

    pub fn vision() -> Self {
        Self::new("google/gemma-3-27b-it-fast", 0.5, 2048).with_fallback("google/gemma-3-27b-it")
    }

    pub fn embedding() -> Self {
        Self::new("intfloat/e5-mistral-7b-instruct", 0.7, 2048).with_fallback("BAAI/bge-en-icl")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelsConfig {
    #[serde(default = "ModelSettings::tutor")]
    pub tutor: ModelSettings,
    #[serde(default = "ModelSettings::quiz")]
    pub quiz: ModelSettings,
    #[serde(default = "ModelSettings::content")]
    pub content: ModelSettings,
    #[serde(default = "ModelSettings::vision")]
    pub vision: ModelSettings,
    #[serde(default = "ModelSettings::embedding")]
    pub embedding: ModelSettings,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            tutor: ModelSettings::tutor(),
            quiz: ModelSettings::quiz(),
            content: ModelSettings::content(),
            vision: ModelSettings::vision(),
            embedding: ModelSettings::embedding(),
        }
    }
}

impl ModelsConfig {
    pub fn get(&self, role: ModelRole) -> &ModelSettings {
        match role {
            ModelRole::Tutor => &self.tutor,
            ModelRole::Quiz => &self.quiz,
            ModelRole::Content => &self.content,
            ModelRole::Vision => &self.vision,
            ModelRole::Embedding => &self.embedding,
        }
    }
}

/// Pipeline tuning
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub max_chunk_chars: usize,
    pub max_frames: usize,
    /// Minimum seconds between sampled video frames
    pub min_frame_interval: f64,
    /// JPEG quality of extracted frames, 1-100
    pub frame_quality: u8,
    pub quiz_max_attempts: u32,
    pub history_limit: usize,
    /// Directory holding `<Agent>.json` prompt files; built-in prompts when unset
    pub prompts_dir: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_chunk_chars: crate::domain::chunking::DEFAULT_MAX_CHUNK_CHARS,
            max_frames: crate::domain::video::DEFAULT_MAX_FRAMES,
            min_frame_interval: crate::domain::video::DEFAULT_MIN_FRAME_INTERVAL,
            frame_quality: 85,
            quiz_max_attempts: 3,
            history_limit: 20,
            prompts_dir: None,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(None)
    }

    /// Layered load: defaults, `config/default`, `config/local`, an explicit
    /// file, then `APP__*` environment variables. `AI_API_KEY` wins over all.
    pub fn load_from(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false));

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("APP")
                .separator("__")
                .try_parsing(true),
        );

        if let Ok(key) = std::env::var(API_KEY_ENV) {
            builder = builder.set_override("ai.api_key", key)?;
        }

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.ai.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.ai.timeout, 30);
        assert_eq!(config.ai.retry.max_attempts, 3);
        assert_eq!(config.ai.models.quiz.temperature, 0.3);
        assert_eq!(config.ai.models.content.max_tokens, 4096);
        assert_eq!(config.pipeline.max_chunk_chars, 12000);
        assert_eq!(config.pipeline.history_limit, 20);
        assert!(!config.ai.has_api_key());
    }

    #[test]
    fn test_blank_api_key_is_absent() {
        let mut ai = AiConfig::default();
        ai.api_key = Some("   ".to_string());
        assert!(!ai.has_api_key());

        ai.api_key = Some("sk-123".to_string());
        assert!(ai.has_api_key());
    }

    #[test]
    fn test_model_lookup_by_role() {
        let models = ModelsConfig::default();

        assert_eq!(models.get(ModelRole::Vision).model_id, "google/gemma-3-27b-it-fast");
        assert_eq!(
            models.get(ModelRole::Tutor).fallback_model_id.as_deref(),
            Some("deepseek-ai/DeepSeek-V3")
        );
    }

    #[test]
    fn test_load_from_explicit_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{
                "logging": {{ "level": "debug", "format": "json" }},
                "ai": {{
                    "base_url": "http://localhost:9000/v1",
                    "models": {{ "quiz": {{ "model_id": "small-quiz" }} }}
                }},
                "pipeline": {{ "max_frames": 3 }}
            }}"#
        )
        .unwrap();

        let config = AppConfig::load_from(Some(file.path())).unwrap();

        assert_eq!(config.logging.level, "debug");
        assert!(matches!(config.logging.format, LogFormat::Json));
        assert_eq!(config.ai.base_url, "http://localhost:9000/v1");
        assert_eq!(config.ai.models.quiz.model_id, "small-quiz");
        assert_eq!(config.ai.models.quiz.temperature, 0.7);
        assert!(config.ai.models.quiz.fallback_model_id.is_none());
        assert_eq!(config.ai.models.tutor, ModelSettings::tutor());
        assert_eq!(config.pipeline.max_frames, 3);
        assert_eq!(config.pipeline.quiz_max_attempts, 3);
    }
}
