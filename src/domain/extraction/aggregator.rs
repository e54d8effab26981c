use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::content::Medium;

use super::result::{
    ExtractionResult, ProcessingStatus, is_filler_key_point, is_placeholder, unique_concepts,
    unique_strings,
};

static PART_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*\(part\s+\d+\s*/\s*\d+\)").expect("valid part regex"));

/// Merges per-chunk or per-frame results into a single result
///
/// Lists are unioned in input order, deduplicated case-insensitively and
/// capped. Failed inputs are ignored; the output fails only when every input
/// failed.
#[derive(Debug, Clone, Default)]
pub struct ResultAggregator {
    /// Prefix each summary with "[Frame i]"
    label_frames: bool,
}

impl ResultAggregator {
    /// Aggregator for document chunks
    pub fn for_chunks() -> Self {
        Self {
            label_frames: false,
        }
    }

    /// Aggregator for sampled video frames
    pub fn for_frames() -> Self {
        Self { label_frames: true }
    }

    pub fn combine(
        &self,
        results: &[ExtractionResult],
        source_type: Medium,
        filename: &str,
    ) -> ExtractionResult {
        let succeeded: Vec<(usize, &ExtractionResult)> = results
            .iter()
            .enumerate()
            .filter(|(_, r)| r.status != ProcessingStatus::Failed)
            .collect();

        if succeeded.is_empty() {
            return ExtractionResult::failed(source_type, "No part of the content could be analyzed.");
        }

        let title = succeeded
            .iter()
            .map(|(_, r)| strip_part_marker(&r.title))
            .find(|t| !t.is_empty() && !is_placeholder(t))
            .unwrap_or_else(|| file_stem(filename));

        let summaries: Vec<String> = succeeded
            .iter()
            .filter(|(_, r)| !r.summary.trim().is_empty() && !is_placeholder(&r.summary))
            .map(|(i, r)| {
                if self.label_frames {
                    format!("[Frame {}] {}", i + 1, r.summary.trim())
                } else {
                    r.summary.trim().to_string()
                }
            })
            .collect();

        let summary = if !summaries.is_empty() {
            summaries.join(" ")
        } else if self.label_frames {
            format!("Video analysis of {}", filename)
        } else {
            "No summary available.".to_string()
        };

        let key_points = unique_strings(
            succeeded
                .iter()
                .flat_map(|(_, r)| r.key_points.iter())
                .filter(|p| !is_placeholder(p) && !is_filler_key_point(p))
                .cloned(),
        );
        let concepts = unique_concepts(
            succeeded
                .iter()
                .flat_map(|(_, r)| r.concepts.iter())
                .filter(|c| !is_placeholder(&c.term))
                .cloned(),
        );
        let topics = unique_strings(
            succeeded
                .iter()
                .flat_map(|(_, r)| r.topics.iter())
                .filter(|t| !is_placeholder(t))
                .cloned(),
        );

        ExtractionResult {
            title,
            summary,
            key_points,
            concepts,
            topics,
            source_type,
            status: ProcessingStatus::Complete,
            error_message: None,
        }
    }
}

fn strip_part_marker(title: &str) -> String {
    PART_MARKER.replace_all(title, "").trim().to_string()
}

fn file_stem(filename: &str) -> String {
    let stem = match filename.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => filename,
    };

    if stem.trim().is_empty() {
        "Extracted Content".to_string()
    } else {
        stem.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::extraction::Concept;

    fn partial(title: &str, summary: &str, key_points: &[&str]) -> ExtractionResult {
        ExtractionResult {
            title: title.to_string(),
            summary: summary.to_string(),
            key_points: key_points.iter().map(|s| s.to_string()).collect(),
            concepts: Vec::new(),
            topics: Vec::new(),
            source_type: Medium::Text,
            status: ProcessingStatus::Partial,
            error_message: None,
        }
    }

    #[test]
    fn test_dedup_across_results() {
        let a = partial("Doc", "First.", &["Same Point"]);
        let b = partial("Doc", "Second.", &["same point "]);

        let combined = ResultAggregator::for_chunks().combine(&[a, b], Medium::Text, "doc.txt");

        assert_eq!(combined.key_points, vec!["Same Point"]);
        assert_eq!(combined.summary, "First. Second.");
        assert_eq!(combined.status, ProcessingStatus::Complete);
    }

    #[test]
    fn test_part_marker_stripped() {
        let a = partial("notes.txt (part 1/3)", "S", &[]);
        let combined = ResultAggregator::for_chunks().combine(&[a], Medium::Text, "notes.txt");
        assert_eq!(combined.title, "notes.txt");
    }

    #[test]
    fn test_placeholder_title_skipped() {
        let a = partial("[Frame unreadable]", "[blank]", &["[Fallback] nothing"]);
        let b = partial("Lecture on Optics", "Lens diagram.", &["Refraction bends light"]);

        let combined = ResultAggregator::for_frames().combine(&[a, b], Medium::Video, "optics.mp4");

        assert_eq!(combined.title, "Lecture on Optics");
        assert_eq!(combined.summary, "[Frame 2] Lens diagram.");
        assert_eq!(combined.key_points, vec!["Refraction bends light"]);
    }

    #[test]
    fn test_title_falls_back_to_file_stem() {
        let a = partial("", "", &[]);
        let combined = ResultAggregator::for_frames().combine(&[a], Medium::Video, "lecture.mp4");

        assert_eq!(combined.title, "lecture");
        assert_eq!(combined.summary, "Video analysis of lecture.mp4");
    }

    #[test]
    fn test_lists_capped() {
        let results: Vec<ExtractionResult> = (0..4)
            .map(|i| {
                let points: Vec<String> = (0..5).map(|j| format!("Point {}-{}", i, j)).collect();
                let refs: Vec<&str> = points.iter().map(|s| s.as_str()).collect();
                partial("T", "S", &refs)
            })
            .collect();

        let combined = ResultAggregator::for_chunks().combine(&results, Medium::Text, "t");
        assert_eq!(combined.key_points.len(), 10);
        assert_eq!(combined.key_points[0], "Point 0-0");
        assert_eq!(combined.key_points[9], "Point 1-4");
    }

    #[test]
    fn test_concepts_keyed_by_term() {
        let mut a = partial("T", "S", &[]);
        a.concepts = vec![Concept {
            term: "Entropy".to_string(),
            definition: "Disorder".to_string(),
        }];
        let mut b = partial("T", "S", &[]);
        b.concepts = vec![Concept {
            term: " entropy".to_string(),
            definition: "Other".to_string(),
        }];

        let combined = ResultAggregator::for_chunks().combine(&[a, b], Medium::Text, "t");
        assert_eq!(combined.concepts.len(), 1);
        assert_eq!(combined.concepts[0].definition, "Disorder");
    }

    #[test]
    fn test_degraded_filler_points_dropped() {
        let unstructured =
            ExtractionResult::from_model_text("Chapter 3\nPlain prose only.", Medium::Text, "t");
        let empty_points =
            ExtractionResult::from_model_text(r#"{"title": "Chapter 4"}"#, Medium::Text, "t");
        let real = partial("Chapter 5", "S", &["Energy is conserved"]);

        let combined = ResultAggregator::for_chunks().combine(
            &[unstructured, empty_points, real],
            Medium::Text,
            "t",
        );

        assert_eq!(combined.key_points, vec!["Energy is conserved"]);
    }

    #[test]
    fn test_all_failed_is_failed() {
        let failed = ExtractionResult::failed(Medium::Text, "boom");
        let combined =
            ResultAggregator::for_chunks().combine(&[failed.clone(), failed], Medium::Text, "t");
        assert_eq!(combined.status, ProcessingStatus::Failed);

        let empty = ResultAggregator::for_chunks().combine(&[], Medium::Text, "t");
        assert!(empty.is_failed());
    }

    #[test]
    fn test_failed_inputs_ignored() {
        let ok = partial("Good", "Fine.", &["K"]);
        let failed = ExtractionResult::failed(Medium::Text, "boom");

        let combined = ResultAggregator::for_chunks().combine(&[failed, ok], Medium::Text, "t");
        assert_eq!(combined.title, "Good");
        assert_eq!(combined.status, ProcessingStatus::Complete);
    }
}
