//! Infrastructure layer - Model backend, prompt files, media decoding, logging

pub mod document;
pub mod llm;
pub mod logging;
pub mod prompts;
pub mod video;

pub use document::extract_text;
pub use llm::{HttpClient, HttpClientTrait, ModelGateway, OpenAiProvider};
pub use prompts::{load_prompt_catalog, resolve_prompt_catalog};
pub use video::FfmpegFrameExtractor;
