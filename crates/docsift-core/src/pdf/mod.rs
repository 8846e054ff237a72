//! PDF processing: text layer and embedded page images.

mod extractor;

pub use extractor::PdfExtractor;

use crate::error::PdfError;
use image::DynamicImage;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Trait for PDF processing implementations.
pub trait PdfProcessor {
    /// Load a PDF from bytes.
    fn load(&mut self, data: &[u8]) -> Result<()>;

    /// Number of pages of the loaded document.
    fn page_count(&self) -> u32;

    /// Text layer of the entire document.
    fn extract_text(&self) -> Result<String>;

    /// Images embedded on a page (1-indexed).
    fn extract_images(&self, page: u32) -> Result<Vec<DynamicImage>>;

    /// Text layer, if it holds at least `min_length` non-whitespace characters.
    fn usable_text(&self, min_length: usize) -> Option<String> {
        let text = self.extract_text().ok()?;
        let length = text.chars().filter(|c| !c.is_whitespace()).count();
        (length >= min_length).then_some(text)
    }
}
