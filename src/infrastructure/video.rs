//! Frame extraction backed by the `ffprobe` / `ffmpeg` command-line tools

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::domain::{DomainError, FrameExtractor, VideoFrameSample, VideoMetadata};

#[derive(Debug, Clone)]
pub struct FfmpegFrameExtractor {
    available: bool,
    qscale: u8,
}

impl FfmpegFrameExtractor {
    /// Probe for `ffmpeg` on the PATH; `quality` is a JPEG quality in 1..=100
    pub async fn detect(quality: u8) -> Self {
        let available = Command::new("ffmpeg")
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|status| status.success())
            .unwrap_or(false);

        if available {
            info!("ffmpeg found, video frame extraction enabled");
        } else {
            warn!("ffmpeg not available. Video frame extraction will be disabled");
        }

        Self::with_availability(available, quality)
    }

    pub fn with_availability(available: bool, quality: u8) -> Self {
        Self {
            available,
            qscale: qscale_for_quality(quality),
        }
    }

    async fn stage(video: &Bytes) -> Result<NamedTempFile, DomainError> {
        let file = NamedTempFile::new()
            .map_err(|e| DomainError::internal(format!("Failed to create temp file: {}", e)))?;
        tokio::fs::write(file.path(), video)
            .await
            .map_err(|e| DomainError::internal(format!("Failed to write temp video: {}", e)))?;
        Ok(file)
    }

    async fn extract_one(&self, path: &Path, timestamp: f64) -> Result<Bytes, DomainError> {
        let output = Command::new("ffmpeg")
            .args(["-v", "error", "-ss"])
            .arg(format!("{:.3}", timestamp))
            .arg("-i")
            .arg(path)
            .args(["-frames:v", "1", "-q:v"])
            .arg(self.qscale.to_string())
            .args(["-f", "image2pipe", "-vcodec", "mjpeg", "-"])
            .output()
            .await
            .map_err(|e| DomainError::internal(format!("Failed to run ffmpeg: {}", e)))?;

        if !output.status.success() || output.stdout.is_empty() {
            return Err(DomainError::internal(format!(
                "ffmpeg produced no frame at {:.3}s: {}",
                timestamp,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(Bytes::from(output.stdout))
    }
}

/// Map JPEG quality (1-100, higher is better) onto ffmpeg's 2-31 scale (lower is better)
fn qscale_for_quality(quality: u8) -> u8 {
    let quality = quality.clamp(1, 100) as u32;
    (2 + (100 - quality) * 29 / 99) as u8
}

#[async_trait]
impl FrameExtractor for FfmpegFrameExtractor {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn probe(&self, video: Bytes) -> Result<VideoMetadata, DomainError> {
        let file = Self::stage(&video).await?;

        let output = Command::new("ffprobe")
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-count_packets",
                "-show_entries",
                "stream=nb_read_packets,r_frame_rate,duration:format=duration",
                "-of",
                "json",
            ])
            .arg(file.path())
            .output()
            .await
            .map_err(|e| DomainError::internal(format!("Failed to run ffprobe: {}", e)))?;

        if !output.status.success() {
            return Err(DomainError::validation(format!(
                "Could not open video file: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        parse_probe_output(&output.stdout)
    }

    async fn extract(
        &self,
        video: Bytes,
        positions: Vec<u64>,
        fps: f64,
    ) -> Result<Vec<VideoFrameSample>, DomainError> {
        if !self.available {
            return Err(DomainError::configuration("ffmpeg is not available"));
        }

        let file = Self::stage(&video).await?;
        let mut frames = Vec::with_capacity(positions.len());

        for frame_number in positions {
            let timestamp_seconds = if fps > 0.0 {
                frame_number as f64 / fps
            } else {
                0.0
            };

            match self.extract_one(file.path(), timestamp_seconds).await {
                Ok(image_bytes) => {
                    debug!(frame_number, timestamp_seconds, "Extracted frame");
                    frames.push(VideoFrameSample {
                        frame_number,
                        timestamp_seconds,
                        image_bytes,
                    });
                }
                Err(e) => warn!(frame_number, "Failed to read frame: {}", e),
            }
        }

        info!(count = frames.len(), "Extracted video frames");
        Ok(frames)
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    nb_read_packets: Option<String>,
    r_frame_rate: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

fn parse_probe_output(raw: &[u8]) -> Result<VideoMetadata, DomainError> {
    let probe: ProbeOutput = serde_json::from_slice(raw)
        .map_err(|e| DomainError::response(format!("Unreadable ffprobe output: {}", e)))?;

    let stream = probe
        .streams
        .into_iter()
        .next()
        .ok_or_else(|| DomainError::validation("Video has no video stream"))?;

    let total_frames = stream
        .nb_read_packets
        .as_deref()
        .and_then(|n| n.parse::<u64>().ok())
        .unwrap_or(0);
    let fps = stream
        .r_frame_rate
        .as_deref()
        .and_then(parse_rate)
        .unwrap_or(0.0);
    let duration_seconds = stream
        .duration
        .or(probe.format.and_then(|f| f.duration))
        .and_then(|d| d.parse::<f64>().ok())
        .unwrap_or(0.0);

    if total_frames == 0 || fps <= 0.0 {
        return Err(DomainError::validation(format!(
            "Invalid video properties: frames={}, fps={}",
            total_frames, fps
        )));
    }

    Ok(VideoMetadata {
        total_frames,
        fps,
        duration_seconds,
    })
}

/// `30000/1001` or `25`
fn parse_rate(rate: &str) -> Option<f64> {
    match rate.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            (den != 0.0).then_some(num / den)
        }
        None => rate.trim().parse().ok(),
    }
}
