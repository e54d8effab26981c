//! Content extraction: documents, images and video

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::config::ModelRole;
use crate::domain::{
    AgentKind, AgentPrompt, ContentInput, DocumentChunker, DomainError, ErrorReport,
    ExtractionResult, FrameExtractor, FrameSampler, Medium, Message, ResultAggregator,
    RetryPolicy,
};
use crate::infrastructure::{ModelGateway, extract_text};

const EXTRACTION_FORMAT: &str = r#"{
    "title": "A descriptive title for the content",
    "summary": "A comprehensive summary of the content",
    "key_points": ["Key point 1", "Key point 2", "Key point 3"],
    "concepts": [
        {"term": "Concept name", "definition": "Definition of the concept"}
    ],
    "topics": ["Topic 1", "Topic 2"]
}"#;

const FRAME_FORMAT: &str = r#"{
    "title": "A descriptive title for what this frame shows",
    "summary": "A description of what is shown in this frame",
    "key_points": ["Key observation 1", "Key observation 2"],
    "concepts": [
        {"term": "Concept name", "definition": "Definition if visible"}
    ],
    "topics": ["Topic 1", "Topic 2"]
}"#;

/// Turns one upload into an [`ExtractionResult`]
///
/// Never returns an error: failures become a `failed` result with a
/// caller-safe message.
pub struct ContentPipeline {
    gateway: Arc<ModelGateway>,
    agent: Option<AgentPrompt>,
    retry: RetryPolicy,
    chunker: DocumentChunker,
    sampler: FrameSampler,
    frames: Option<Arc<dyn FrameExtractor>>,
}

impl ContentPipeline {
    pub fn new(
        gateway: Arc<ModelGateway>,
        agent: Option<AgentPrompt>,
        retry: RetryPolicy,
        chunker: DocumentChunker,
        sampler: FrameSampler,
    ) -> Self {
        Self {
            gateway,
            agent,
            retry,
            chunker,
            sampler,
            frames: None,
        }
    }

    pub fn with_frame_extractor(mut self, extractor: Arc<dyn FrameExtractor>) -> Self {
        self.frames = Some(extractor);
        self
    }

    pub async fn process(&self, input: &ContentInput) -> ExtractionResult {
        let Some(agent) = &self.agent else {
            warn!(agent = %AgentKind::Content, "Agent prompt not loaded");
            return ExtractionResult::failed(input.medium, "Content analysis is not available.");
        };

        if self.gateway.is_fallback_mode() {
            return ExtractionResult::fallback(input.medium, &input.filename);
        }

        info!(medium = %input.medium, filename = %input.filename, "Processing content");

        match input.medium {
            Medium::Image => self.process_image(agent, input).await,
            Medium::Video => self.process_video(agent, input).await,
            Medium::Text | Medium::Pdf => self.process_document(agent, input).await,
        }
    }

    async fn process_image(&self, agent: &AgentPrompt, input: &ContentInput) -> ExtractionResult {
        let image = match input.payload.binary() {
            Ok(image) => image,
            Err(e) => return failure(Medium::Image, &e),
        };

        let prompt = vision_prompt(agent, &input.filename);
        match self.analyze_image(&prompt, &image).await {
            Ok(text) => ExtractionResult::from_model_text(&text, Medium::Image, &input.filename),
            Err(e) => failure(Medium::Image, &e),
        }
    }

    async fn process_video(&self, agent: &AgentPrompt, input: &ContentInput) -> ExtractionResult {
        let Some(extractor) = self.frames.as_ref().filter(|e| e.is_available()) else {
            warn!("Video processing unavailable: no frame extractor");
            return ExtractionResult::failed(Medium::Video, "Video processing is not available.");
        };

        let video = match input.payload.binary() {
            Ok(video) => video,
            Err(e) => return failure(Medium::Video, &e),
        };

        let metadata = match extractor.probe(video.clone()).await {
            Ok(metadata) => metadata,
            Err(e) => return failure(Medium::Video, &e),
        };

        let positions = self.sampler.sample(
            metadata.total_frames,
            metadata.fps,
            metadata.duration_seconds,
        );
        let frames = match extractor.extract(video, positions, metadata.fps).await {
            Ok(frames) if !frames.is_empty() => frames,
            Ok(_) => {
                return ExtractionResult::failed(
                    Medium::Video,
                    "Failed to extract frames from video.",
                );
            }
            Err(e) => return failure(Medium::Video, &e),
        };

        info!(count = frames.len(), filename = %input.filename, "Analyzing video frames");

        let total = frames.len();
        let mut analyses = Vec::with_capacity(total);
        for (i, frame) in frames.iter().enumerate() {
            let prompt = frame_prompt(agent, &input.filename, frame.timestamp_seconds, i + 1, total);
            match self.analyze_image(&prompt, &frame.image_bytes).await {
                Ok(text) => {
                    let result =
                        ExtractionResult::from_model_text(&text, Medium::Video, &input.filename);
                    if !result.is_failed() {
                        analyses.push(result);
                    }
                }
                Err(e) => warn!(frame = i + 1, "Failed to analyze frame: {}", e),
            }
        }

        if analyses.is_empty() {
            return ExtractionResult::failed(
                Medium::Video,
                "Failed to analyze any frames from the video.",
            );
        }

        ResultAggregator::for_frames().combine(&analyses, Medium::Video, &input.filename)
    }

    async fn process_document(
        &self,
        agent: &AgentPrompt,
        input: &ContentInput,
    ) -> ExtractionResult {
        let medium = input.medium;
        let text = match extract_text(&input.payload) {
            Ok(text) => text,
            Err(e) => return failure(medium, &e),
        };

        if !self.chunker.needs_chunking(&text) {
            return match self.analyze_text(agent, &text, medium, &input.filename).await {
                Ok(reply) => ExtractionResult::from_model_text(&reply, medium, &input.filename),
                Err(e) => failure(medium, &e),
            };
        }

        let chunks = self.chunker.chunk(&text);
        info!(chunks = chunks.len(), filename = %input.filename, "Processing large document");

        let mut results = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            let label = chunk.label(&input.filename);
            debug!(part = chunk.index + 1, total = chunk.total, "Processing chunk");

            match self.analyze_text(agent, &chunk.content, medium, &label).await {
                Ok(reply) => {
                    let result = ExtractionResult::from_model_text(&reply, medium, &label);
                    if !result.is_failed() {
                        results.push(result);
                    }
                }
                Err(e) => warn!(part = chunk.index + 1, "Failed to process chunk: {}", e),
            }
        }

        if results.is_empty() {
            return ExtractionResult::failed(
                medium,
                "Failed to process any chunks of the document.",
            );
        }

        ResultAggregator::for_chunks().combine(&results, medium, &input.filename)
    }

    async fn analyze_image(&self, prompt: &str, image: &Bytes) -> Result<String, DomainError> {
        self.retry
            .execute(|| self.gateway.vision(prompt, image))
            .await
    }

    async fn analyze_text(
        &self,
        agent: &AgentPrompt,
        text: &str,
        medium: Medium,
        filename: &str,
    ) -> Result<String, DomainError> {
        let messages = content_messages(agent, text, medium, filename);
        self.retry
            .execute(|| self.gateway.chat(ModelRole::Content, messages.clone()))
            .await
    }
}

fn failure(medium: Medium, error: &DomainError) -> ExtractionResult {
    let report = ErrorReport::from_error(error);
    report.log();
    ExtractionResult::failed(medium, report.user_message)
}

fn vision_prompt(agent: &AgentPrompt, filename: &str) -> String {
    format!(
        "{}\n\n\
         Analyze this image and extract educational content. \
         Provide your response in the following JSON format:\n\
         {}\n\n\
         Filename: {}\n\n\
         Analyze the image thoroughly and extract all educational information visible.",
        agent.system_prompt, EXTRACTION_FORMAT, filename
    )
}

fn frame_prompt(
    agent: &AgentPrompt,
    filename: &str,
    timestamp: f64,
    index: usize,
    total: usize,
) -> String {
    format!(
        "{}\n\n\
         You are analyzing frame {} of {} from a video file.\n\
         This frame is from approximately {:.1} seconds into the video.\n\n\
         Analyze this video frame and extract educational content. \
         Provide your response in the following JSON format:\n\
         {}\n\n\
         Video filename: {}\n\
         Frame timestamp: {:.1}s\n\n\
         Analyze the frame thoroughly and extract all educational information visible.",
        agent.system_prompt, index, total, timestamp, FRAME_FORMAT, filename, timestamp
    )
}

fn content_messages(
    agent: &AgentPrompt,
    text: &str,
    medium: Medium,
    filename: &str,
) -> Vec<Message> {
    let system = format!(
        "{}\n\n\
         IMPORTANT: You MUST respond with ONLY valid JSON. \
         Do not include any text before or after the JSON.\n\n\
         Respond in this exact JSON format:\n\
         {}\n\n\
         Rules:\n\
         - title: A clear, descriptive title\n\
         - summary: A comprehensive summary (2-4 sentences)\n\
         - key_points: At least 3 key points, each as a complete sentence\n\
         - concepts: Important terms with their definitions\n\
         - topics: Main topics covered in the content",
        agent.system_prompt, EXTRACTION_FORMAT
    );

    let user = format!(
        "Content Type: {}\n\
         Filename: {}\n\n\
         Content to analyze:\n\
         {}\n\n\
         Extract the key information from this content and respond with ONLY the JSON object.",
        medium, filename, text
    );

    vec![Message::system(system), Message::user(user)]
}
