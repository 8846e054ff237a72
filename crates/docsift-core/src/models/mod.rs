//! Data models and configuration.

pub mod config;
pub mod document;

pub use config::DocsiftConfig;
pub use document::{
    DocumentType, FieldValue, HeaderRecord, Metadata, OutputDocument, Record, RowRecord,
    NOT_AVAILABLE,
};
