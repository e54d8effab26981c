mod app_config;

pub use app_config::{
    AiConfig, AppConfig, LogFormat, LoggingConfig, ModelRole, ModelSettings, ModelsConfig,
    PipelineConfig, API_KEY_ENV, DEFAULT_BASE_URL,
};
