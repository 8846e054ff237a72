//! OCR collaborators and word-box layout reconstruction.
//!
//! The pipeline never talks to an OCR engine directly. It goes through
//! [`OcrProvider`], which hands back plain text for a document and the
//! positioned words of a page.

mod layout;
#[cfg(feature = "native")]
mod pure_engine;
mod transcript;

pub use layout::LayoutReconstructor;
#[cfg(feature = "native")]
pub use pure_engine::PureOcrProvider;
pub use transcript::TranscriptProvider;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A recognized word and the top-left corner of its box, in pixels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognizedWord {
    pub text: String,
    pub left: i32,
    pub top: i32,
}

impl RecognizedWord {
    pub fn new(text: impl Into<String>, left: i32, top: i32) -> Self {
        Self {
            text: text.into(),
            left,
            top,
        }
    }
}

/// Source of text and word boxes for a document.
pub trait OcrProvider {
    /// Full text of the document, lines separated by `\n`.
    fn get_text(&self, document: &Path) -> Result<String>;

    /// Words recognized on `page` (1-indexed).
    fn get_word_boxes(&self, document: &Path, page: u32) -> Result<Vec<RecognizedWord>>;
}
