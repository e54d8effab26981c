//! Video frame sampling and the frame-extraction seam

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::DomainError;

#[cfg(test)]
use mockall::automock;

pub const DEFAULT_MAX_FRAMES: usize = 5;
pub const DEFAULT_MIN_FRAME_INTERVAL: f64 = 2.0;

/// Leading and trailing share of the video skipped when sampling
const WINDOW_START: f64 = 0.05;
const WINDOW_END: f64 = 0.95;

/// Basic properties of a video stream
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub total_frames: u64,
    pub fps: f64,
    pub duration_seconds: f64,
}

/// One decoded frame, JPEG encoded
#[derive(Debug, Clone, PartialEq)]
pub struct VideoFrameSample {
    pub frame_number: u64,
    pub timestamp_seconds: f64,
    pub image_bytes: Bytes,
}

/// Picks evenly spaced frame positions inside a trimmed window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSampler {
    max_frames: usize,
    min_interval: f64,
}

impl Default for FrameSampler {
    fn default() -> Self {
        Self {
            max_frames: DEFAULT_MAX_FRAMES,
            min_interval: DEFAULT_MIN_FRAME_INTERVAL,
        }
    }
}

impl FrameSampler {
    pub fn new(max_frames: usize, min_interval: f64) -> Result<Self, DomainError> {
        if max_frames == 0 {
            return Err(DomainError::configuration("max_frames must be >= 1"));
        }
        if !(min_interval.is_finite() && min_interval > 0.0) {
            return Err(DomainError::configuration("min_frame_interval must be > 0"));
        }
        Ok(Self {
            max_frames,
            min_interval,
        })
    }

    pub fn max_frames(&self) -> usize {
        self.max_frames
    }

    /// Ordered, non-decreasing frame indices in `0..total_frames`
    ///
    /// Returns at most `max_frames` positions, and a single middle frame
    /// when the duration only supports one sample. An unusable duration is
    /// recomputed from `total_frames / fps`.
    pub fn sample(&self, total_frames: u64, fps: f64, duration: f64) -> Vec<u64> {
        if total_frames == 0 {
            return Vec::new();
        }

        let duration = if duration.is_finite() && duration > 0.0 {
            duration
        } else if fps.is_finite() && fps > 0.0 {
            total_frames as f64 / fps
        } else {
            0.0
        };

        let supported = (duration / self.min_interval).clamp(0.0, self.max_frames as f64);
        let max_possible = (supported as u64).saturating_add(1);
        let count = (self.max_frames as u64).min(max_possible).min(total_frames);

        if count <= 1 {
            return vec![total_frames / 2];
        }

        let mut start = (total_frames as f64 * WINDOW_START) as u64;
        let mut end = (total_frames as f64 * WINDOW_END) as u64;
        if end <= start {
            start = 0;
            end = total_frames - 1;
        }
        let range = end - start;

        (0..count)
            .map(|i| {
                let offset = (range as f64 * i as f64 / (count - 1) as f64) as u64;
                (start + offset).min(total_frames - 1)
            })
            .collect()
    }
}

/// Decodes frames from raw video bytes
#[cfg_attr(test, automock)]
#[async_trait]
pub trait FrameExtractor: Send + Sync {
    /// Whether the underlying decoder can run in this environment
    fn is_available(&self) -> bool;

    /// Read frame count, frame rate and duration
    async fn probe(&self, video: Bytes) -> Result<VideoMetadata, DomainError>;

    /// Decode the given frame positions as JPEG images
    async fn extract(
        &self,
        video: Bytes,
        positions: Vec<u64>,
        fps: f64,
    ) -> Result<Vec<VideoFrameSample>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_sampler_rejected() {
        assert!(FrameSampler::new(0, 2.0).is_err());
        assert!(FrameSampler::new(5, 0.0).is_err());
        assert!(FrameSampler::new(5, f64::NAN).is_err());
    }

    #[test]
    fn test_ten_second_clip() {
        // 300 frames at 30fps, 10s: window 15..285
        let positions = FrameSampler::default().sample(300, 30.0, 10.0);
        assert_eq!(positions, vec![15, 82, 150, 217, 285]);
    }

    #[test]
    fn test_short_clip_limited_by_interval() {
        // 3s supports int(3 / 2) + 1 = 2 samples
        let positions = FrameSampler::default().sample(90, 30.0, 3.0);
        assert_eq!(positions, vec![4, 85]);
    }

    #[test]
    fn test_single_frame_uses_middle() {
        assert_eq!(FrameSampler::default().sample(1, 30.0, 0.03), vec![0]);
        assert_eq!(FrameSampler::default().sample(40, 30.0, 1.3), vec![20]);
    }

    #[test]
    fn test_tiny_window_spans_whole_video() {
        let sampler = FrameSampler::new(5, 0.1).unwrap();
        // 5% and 95% of 3 frames truncate to 0 and 2
        assert_eq!(sampler.sample(3, 1.0, 3.0), vec![0, 1, 2]);
        // 5% and 95% of 2 frames truncate to 0 and 1
        assert_eq!(sampler.sample(2, 1.0, 2.0), vec![0, 1]);
    }

    #[test]
    fn test_zero_frames_is_empty() {
        assert!(FrameSampler::default().sample(0, 30.0, 10.0).is_empty());
    }

    #[test]
    fn test_missing_duration_derived_from_fps() {
        let positions = FrameSampler::default().sample(300, 30.0, 0.0);
        assert_eq!(positions.len(), 5);
    }

    #[test]
    fn test_bounds_hold_across_inputs() {
        let sampler = FrameSampler::default();
        for total in [1u64, 2, 3, 7, 10, 59, 60, 61, 1000, 123_457] {
            for fps in [0.5, 1.0, 23.976, 30.0, 120.0] {
                let positions = sampler.sample(total, fps, total as f64 / fps);

                assert!(!positions.is_empty());
                assert!(positions.len() <= sampler.max_frames());
                assert!(positions.iter().all(|p| *p < total));
                assert!(positions.windows(2).all(|w| w[0] <= w[1]));
            }
        }
    }

    #[test]
    fn test_extreme_durations_stay_bounded() {
        let sampler = FrameSampler::default();
        let cases = [
            (1000u64, 30.0, 1e20),
            (1000, 30.0, f64::MAX),
            (1000, 1e-17, 0.0),
            (1, 1e-300, f64::NAN),
            (u64::MAX, 30.0, 1e30),
        ];

        for (total, fps, duration) in cases {
            let positions = sampler.sample(total, fps, duration);

            assert!(!positions.is_empty());
            assert!(positions.len() <= sampler.max_frames());
            assert!(positions.iter().all(|p| *p < total));
            assert!(positions.windows(2).all(|w| w[0] <= w[1]));
        }

        assert_eq!(sampler.sample(1000, 30.0, 1e20).len(), sampler.max_frames());
    }
}
