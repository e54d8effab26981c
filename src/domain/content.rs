//! Content inputs: medium, payload and filename

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::DomainError;

const IMAGE_HINTS: &[&str] = &["image", "png", "jpg", "jpeg", "gif", "webp", "bmp"];
const VIDEO_HINTS: &[&str] = &["video", "mp4", "avi", "mov", "mkv", "webm"];
const TEXT_HINTS: &[&str] = &["text", "txt", "markdown", "md", "plain"];

/// Kind of uploaded content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Medium {
    Text,
    Pdf,
    Image,
    Video,
}

impl Medium {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Pdf => "pdf",
            Self::Image => "image",
            Self::Video => "video",
        }
    }

    /// Guess the medium from a filename's extension
    pub fn from_filename(filename: &str) -> Option<Self> {
        use mime_guess::mime;

        let guess = mime_guess::from_path(filename).first()?;

        if guess.type_() == mime::IMAGE {
            Some(Self::Image)
        } else if guess.type_() == mime::VIDEO {
            Some(Self::Video)
        } else if guess.subtype() == mime::PDF {
            Some(Self::Pdf)
        } else if guess.type_() == mime::TEXT {
            Some(Self::Text)
        } else {
            None
        }
    }
}

impl fmt::Display for Medium {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Medium {
    type Err = DomainError;

    /// Accepts plain names ("pdf"), MIME types ("image/png") and extensions
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim().to_lowercase();

        if value.contains("pdf") {
            Ok(Self::Pdf)
        } else if IMAGE_HINTS.iter().any(|h| value.contains(h)) {
            Ok(Self::Image)
        } else if VIDEO_HINTS.iter().any(|h| value.contains(h)) {
            Ok(Self::Video)
        } else if TEXT_HINTS.iter().any(|h| value.contains(h)) {
            Ok(Self::Text)
        } else {
            Err(DomainError::validation(format!(
                "Unsupported content type: {}",
                value
            )))
        }
    }
}

/// Raw uploaded data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Bytes(Bytes),
    Utf8Text(String),
}

impl Payload {
    /// Text view of the payload: UTF-8, falling back to Latin-1
    pub fn decode_text(&self) -> String {
        match self {
            Self::Utf8Text(text) => text.clone(),
            Self::Bytes(bytes) => match std::str::from_utf8(bytes) {
                Ok(text) => text.to_string(),
                Err(_) => bytes.iter().map(|b| char::from(*b)).collect(),
            },
        }
    }

    /// Binary view of the payload; text is read as base64, optionally a data URI
    pub fn binary(&self) -> Result<Bytes, DomainError> {
        match self {
            Self::Bytes(bytes) => Ok(bytes.clone()),
            Self::Utf8Text(text) => {
                let encoded = match text.split_once(";base64,") {
                    Some((_, data)) => data,
                    None => text.as_str(),
                };
                BASE64
                    .decode(encoded.trim())
                    .map(Bytes::from)
                    .map_err(|e| DomainError::validation(format!("Invalid base64 payload: {}", e)))
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Bytes(bytes) => bytes.is_empty(),
            Self::Utf8Text(text) => text.trim().is_empty(),
        }
    }

    /// PDF magic number check
    pub fn looks_like_pdf(&self) -> bool {
        match self {
            Self::Bytes(bytes) => bytes.starts_with(b"%PDF"),
            Self::Utf8Text(_) => false,
        }
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(bytes))
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Self::Utf8Text(text)
    }
}

/// One upload handed to the content pipeline
#[derive(Debug, Clone)]
pub struct ContentInput {
    pub payload: Payload,
    pub medium: Medium,
    pub filename: String,
}

impl ContentInput {
    pub fn new(payload: impl Into<Payload>, medium: Medium, filename: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            medium,
            filename: filename.into(),
        }
    }
}
