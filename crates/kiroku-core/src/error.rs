//! Error types for the kiroku-core library.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the kiroku library.
#[derive(Error, Debug)]
pub enum KirokuError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// OCR provider error.
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Document extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Image processing error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// Failed to extract images from PDF.
    #[error("failed to extract images: {0}")]
    ImageExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Failures of a single provider call.
///
/// These never reach the caller of the orchestrator: they are folded into a
/// failed `ProviderResult` and the next provider is tried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The provider slot is not configured.
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    /// The provider did not answer before its deadline.
    #[error("{provider} timed out after {after:?}")]
    Timeout { provider: String, after: Duration },

    /// The backend reported a failure.
    #[error("backend failure: {0}")]
    Backend(String),

    /// The backend could not decode the image it was given.
    #[error("invalid image: {0}")]
    InvalidImage(String),
}

/// Terminal extraction failures surfaced to callers as structured results.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ExtractionError {
    /// Every provider and fallback step failed.
    #[error("no provider succeeded")]
    NoProviderSucceeded,

    /// The input could not be decoded, or no valid attendance row was found.
    #[error("malformed document: {0}")]
    MalformedDocument(String),

    /// The overall deadline elapsed before any result was produced.
    #[error("processing timed out")]
    Timeout,

    /// The caller cancelled the request.
    #[error("processing cancelled")]
    Cancelled,
}

/// Result type for the kiroku library.
pub type Result<T> = std::result::Result<T, KirokuError>;
