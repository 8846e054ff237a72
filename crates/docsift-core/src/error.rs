//! Error types for the docsift-core library.
//!
//! Heuristic mismatches (a field that did not match, a table that was not
//! found, a document that could not be classified) are encoded in the
//! extraction result and never show up here. Only failures of the
//! environment - missing files, unreadable PDFs, OCR backends - are errors.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the docsift library.
#[derive(Error, Debug)]
pub enum DocsiftError {
    /// The source document does not exist.
    #[error("source document not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// No OCR provider can handle this kind of file.
    #[error("unsupported document format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Malformed word-box transcript.
    #[error("transcript error: {0}")]
    Transcript(#[from] csv::Error),

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

/// Errors related to the OCR collaborator.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// The page has nothing an OCR engine could read.
    #[error("no page image for page {page} of {}", .path.display())]
    NoPageImage { path: PathBuf, page: u32 },
}

/// Result type for the docsift library.
pub type Result<T> = std::result::Result<T, DocsiftError>;
