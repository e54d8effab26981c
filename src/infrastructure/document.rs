//! Plain-text view of uploaded documents

use tracing::{debug, warn};

use crate::domain::{DomainError, Payload};

/// Text of a text or PDF payload
///
/// PDF bytes (by magic number) go through `pdf-extract`; everything else is
/// decoded as UTF-8 with a Latin-1 fallback.
pub fn extract_text(payload: &Payload) -> Result<String, DomainError> {
    match payload {
        Payload::Bytes(bytes) if payload.looks_like_pdf() => {
            let text = pdf_extract::extract_text_from_mem(bytes).map_err(|e| {
                warn!("PDF text extraction failed: {}", e);
                DomainError::validation(format!("Could not read PDF: {}", e))
            })?;
            debug!(chars = text.chars().count(), "Extracted PDF text");
            Ok(text)
        }
        _ => Ok(payload.decode_text()),
    }
}
