//! PDF page loading for attendance sheets.

mod extractor;

pub use extractor::PdfExtractor;

use crate::error::PdfError;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// One page of an attendance PDF, ready for OCR or direct parsing.
#[derive(Debug, Clone, Default)]
pub struct PdfPage {
    /// Page number (1-indexed).
    pub number: u32,
    /// Embedded text layer, empty for scanned pages.
    pub text: String,
    /// First embedded scan of the page, re-encoded as PNG.
    pub image: Option<Vec<u8>>,
}

impl PdfPage {
    /// Whether the embedded text is long enough to skip OCR.
    pub fn has_text_layer(&self, min_text_length: usize) -> bool {
        self.text.trim().chars().count() >= min_text_length
    }
}
