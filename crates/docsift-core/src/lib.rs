//! Core library for OCR document understanding.
//!
//! This crate provides:
//! - Document classification (invoice, receipt, bank statement)
//! - Line reconstruction from positioned OCR words
//! - Table and transaction extraction from unstructured text
//! - Rule-based header field extraction with fallback chains
//! - OCR providers for transcripts and images/PDFs (`native` feature)

pub mod classifier;
pub mod error;
pub mod models;
pub mod ocr;
pub mod parsers;
pub mod pdf;
pub mod pipeline;
pub mod rules;
pub mod table;

pub use classifier::{Classification, DocumentClassifier, Evidence};
pub use error::{DocsiftError, Result};
pub use models::{
    DocsiftConfig, DocumentType, FieldValue, HeaderRecord, Metadata, OutputDocument, Record,
    RowRecord, NOT_AVAILABLE,
};
pub use ocr::{LayoutReconstructor, OcrProvider, RecognizedWord, TranscriptProvider};
#[cfg(feature = "native")]
pub use ocr::PureOcrProvider;
pub use parsers::{
    BankStatementParser, DocumentParser, InvoiceParser, ParsedDocument, ReceiptParser,
};
pub use pipeline::DocumentPipeline;
pub use table::{TableExtractor, TableSpec};
