//! Paragraph/sentence-aware splitting of oversized documents

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use super::DomainError;

/// Default chunk size for text sent to the content model
pub const DEFAULT_MAX_CHUNK_CHARS: usize = 12_000;

const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Sentence terminator followed by whitespace
static SENTENCE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]\s+").expect("valid sentence regex"));

/// A bounded slice of a larger document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub content: String,
    /// Zero-based position of this chunk
    pub index: usize,
    pub total: usize,
}

impl Chunk {
    /// Filename marker used when the chunk is sent to the model
    pub fn label(&self, filename: &str) -> String {
        format!("{} (part {}/{})", filename, self.index + 1, self.total)
    }
}

/// Splits text into chunks of at most `max_chars` characters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentChunker {
    max_chars: usize,
}

impl Default for DocumentChunker {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CHUNK_CHARS,
        }
    }
}

impl DocumentChunker {
    pub fn new(max_chars: usize) -> Result<Self, DomainError> {
        if max_chars == 0 {
            return Err(DomainError::configuration("max_chunk_chars must be > 0"));
        }
        Ok(Self { max_chars })
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Whether `text` is too long to send in one call
    pub fn needs_chunking(&self, text: &str) -> bool {
        char_len(text) > self.max_chars
    }

    /// Split into non-empty pieces, preferring paragraph then sentence boundaries
    ///
    /// Non-empty input always yields at least one piece.
    pub fn split(&self, text: &str) -> Vec<String> {
        let mut acc = Accumulator::new(self.max_chars);

        for paragraph in text.split(PARAGRAPH_SEPARATOR) {
            let paragraph_len = char_len(paragraph);

            if acc.fits(paragraph_len, PARAGRAPH_SEPARATOR) {
                acc.append(paragraph, PARAGRAPH_SEPARATOR);
                continue;
            }

            acc.flush();

            if paragraph_len > self.max_chars {
                for sentence in split_sentences(paragraph) {
                    self.push_sentence(&mut acc, sentence);
                }
            } else {
                acc.append(paragraph, PARAGRAPH_SEPARATOR);
            }
        }

        acc.flush();

        let mut chunks = acc.chunks;
        if chunks.is_empty() && !text.trim().is_empty() {
            chunks.push(text.chars().take(self.max_chars).collect());
        }
        chunks
    }

    /// Split and attach index/total to each piece
    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        let pieces = self.split(text);
        let total = pieces.len();

        pieces
            .into_iter()
            .enumerate()
            .map(|(index, content)| Chunk {
                content,
                index,
                total,
            })
            .collect()
    }

    fn push_sentence(&self, acc: &mut Accumulator, sentence: &str) {
        let sentence_len = char_len(sentence);

        if acc.fits(sentence_len, " ") {
            acc.append(sentence, " ");
            return;
        }

        acc.flush();

        if sentence_len <= self.max_chars {
            acc.append(sentence, " ");
            return;
        }

        let mut slices = hard_slice(sentence, self.max_chars);
        let last = slices.pop();
        for slice in slices {
            acc.push_chunk(slice);
        }
        if let Some(last) = last {
            acc.append(&last, " ");
        }
    }
}

/// Greedy builder for the running chunk
struct Accumulator {
    max_chars: usize,
    current: String,
    current_len: usize,
    chunks: Vec<String>,
}

impl Accumulator {
    fn new(max_chars: usize) -> Self {
        Self {
            max_chars,
            current: String::new(),
            current_len: 0,
            chunks: Vec::new(),
        }
    }

    fn fits(&self, piece_len: usize, separator: &str) -> bool {
        self.current_len + piece_len + char_len(separator) <= self.max_chars
    }

    fn append(&mut self, piece: &str, separator: &str) {
        self.current.push_str(piece);
        self.current.push_str(separator);
        self.current_len += char_len(piece) + char_len(separator);
    }

    fn push_chunk(&mut self, piece: String) {
        let trimmed = piece.trim();
        if !trimmed.is_empty() {
            self.chunks.push(trimmed.to_string());
        }
    }

    fn flush(&mut self) {
        let current = std::mem::take(&mut self.current);
        self.current_len = 0;
        self.push_chunk(current);
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Split after `.`, `!` or `?` when followed by whitespace
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;

    for m in SENTENCE_BREAK.find_iter(text) {
        // Terminators are single-byte ASCII
        let end = m.start() + 1;
        sentences.push(&text[start..end]);
        start = m.end();
    }

    if start < text.len() {
        sentences.push(&text[start..]);
    }

    sentences
}

/// Fixed-width slices that never cut through a grapheme cluster
fn hard_slice(text: &str, width: usize) -> Vec<String> {
    let mut slices = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for grapheme in text.graphemes(true) {
        let len = char_len(grapheme);
        if current_len + len > width && !current.is_empty() {
            slices.push(std::mem::take(&mut current));
            current_len = 0;
        }
        current.push_str(grapheme);
        current_len += len;
    }

    if !current.is_empty() {
        slices.push(current);
    }

    slices
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunker(max: usize) -> DocumentChunker {
        DocumentChunker::new(max).unwrap()
    }

    #[test]
    fn test_zero_max_rejected() {
        assert!(DocumentChunker::new(0).is_err());
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunks = chunker(1000).split("A short note.");
        assert_eq!(chunks, vec!["A short note.".to_string()]);
    }

    #[test]
    fn test_empty_text() {
        assert!(chunker(100).split("").is_empty());
        assert!(chunker(100).split("   \n\n  ").is_empty());
    }

    #[test]
    fn test_paragraph_accumulation() {
        let text = "aaaa\n\nbbbb\n\ncccc";
        // Each paragraph costs 4 + 2 separator chars
        let chunks = chunker(12).split(text);
        assert_eq!(chunks, vec!["aaaa\n\nbbbb".to_string(), "cccc".to_string()]);
    }

    #[test]
    fn test_long_paragraph_split_by_sentence() {
        let text = "First sentence here. Second sentence here! Third one?";
        let chunks = chunker(25).split(text);

        assert_eq!(
            chunks,
            vec![
                "First sentence here.".to_string(),
                "Second sentence here!".to_string(),
                "Third one?".to_string(),
            ]
        );
    }

    #[test]
    fn test_oversized_sentence_hard_sliced() {
        let text = "x".repeat(25);
        let chunks = chunker(10).split(&text);

        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| char_len(c) <= 10));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_multibyte_text_counts_chars() {
        let text = "é".repeat(30);
        let chunks = chunker(10).split(&text);

        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| char_len(c) == 10));
    }

    #[test]
    fn test_coverage_and_bounds() {
        let paragraph = "Photosynthesis converts light into chemical energy. \
                         Chlorophyll absorbs mostly blue and red light! \
                         Why are leaves green? Because green light is reflected.";
        let text = vec![paragraph; 40].join("\n\n");
        let max = 300;

        let chunks = chunker(max).split(&text);
        assert!(!chunks.is_empty());
        assert!(chunks.iter().all(|c| !c.trim().is_empty()));
        assert!(chunks.iter().all(|c| char_len(c) <= max));

        let covered: usize = chunks.iter().map(|c| char_len(c)).sum();
        assert!(covered * 10 >= char_len(&text) * 9);
    }

    #[test]
    fn test_twenty_five_thousand_chars_three_chunks() {
        let mut paragraphs = vec!["p".repeat(998); 24];
        paragraphs.push("q".repeat(1000));
        let text = paragraphs.join("\n\n");
        assert_eq!(char_len(&text), 25_000);

        let chunks = DocumentChunker::default().chunk(&text);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].index, 0);
        assert!(chunks.iter().all(|c| c.total == 3));
        assert!(chunks.iter().all(|c| char_len(&c.content) <= 12_000));
    }

    #[test]
    fn test_chunk_label() {
        let chunks = chunker(5).chunk("abcde\n\nfghij");
        assert_eq!(chunks[1].label("notes.txt"), "notes.txt (part 2/2)");
    }

    #[test]
    fn test_split_sentences_keeps_terminators() {
        assert_eq!(
            split_sentences("One. Two!  Three"),
            vec!["One.", "Two!", "Three"]
        );
    }
}
