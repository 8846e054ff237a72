//! Document parsers: one field table and one table extractor per type.

mod bank;
mod invoice;
mod receipt;

pub use bank::BankStatementParser;
pub use invoice::InvoiceParser;
pub use receipt::ReceiptParser;

use crate::models::{DocumentType, HeaderRecord, RowRecord};
use crate::ocr::RecognizedWord;

/// Header fields and line items of one document.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDocument {
    pub document_type: DocumentType,
    pub fields: HeaderRecord,
    pub transactions: Vec<RowRecord>,
}

/// Turns OCR text into a header record and rows for one document type.
///
/// Parsers are immutable after construction and may be shared across
/// threads.
pub trait DocumentParser: Send + Sync {
    fn document_type(&self) -> DocumentType;

    /// Header record with every vocabulary field present.
    fn parse_fields(&self, text: &str) -> HeaderRecord;

    /// Line items; `words` are the positioned words of the first page, when
    /// the OCR collaborator supplied them.
    fn parse_transactions(&self, text: &str, words: Option<&[RecognizedWord]>) -> Vec<RowRecord>;

    fn parse(&self, text: &str, words: Option<&[RecognizedWord]>) -> ParsedDocument {
        ParsedDocument {
            document_type: self.document_type(),
            fields: self.parse_fields(text),
            transactions: self.parse_transactions(text, words),
        }
    }
}
