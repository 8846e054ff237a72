//! End-to-end document processing: classify, dispatch, assemble output.

use std::path::Path;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::classifier::DocumentClassifier;
use crate::error::{DocsiftError, Result};
use crate::models::config::DocsiftConfig;
use crate::models::{DocumentType, OutputDocument, Record};
use crate::ocr::{OcrProvider, RecognizedWord};
use crate::parsers::{BankStatementParser, DocumentParser, InvoiceParser, ReceiptParser};

/// Classifier plus one parser per known document type.
///
/// Immutable after construction; one pipeline can serve many documents,
/// including from several threads.
#[derive(Debug, Clone)]
pub struct DocumentPipeline {
    classifier: DocumentClassifier,
    invoice: InvoiceParser,
    receipt: ReceiptParser,
    bank_statement: BankStatementParser,
    use_layout: bool,
}

impl DocumentPipeline {
    pub fn new() -> Self {
        Self::from_config(&DocsiftConfig::default())
    }

    pub fn from_config(config: &DocsiftConfig) -> Self {
        Self {
            classifier: DocumentClassifier::new(),
            invoice: InvoiceParser::from_config(config),
            receipt: ReceiptParser::from_config(config),
            bank_statement: BankStatementParser::from_config(config),
            use_layout: true,
        }
    }

    /// Whether invoices request word boxes for layout-aware line items.
    pub fn with_layout(mut self, use_layout: bool) -> Self {
        self.use_layout = use_layout;
        self
    }

    pub fn classifier(&self) -> &DocumentClassifier {
        &self.classifier
    }

    /// Parser for a document type, `None` for [`DocumentType::Unknown`].
    pub fn parser(&self, document_type: DocumentType) -> Option<&dyn DocumentParser> {
        match document_type {
            DocumentType::Invoice => Some(&self.invoice),
            DocumentType::Receipt => Some(&self.receipt),
            DocumentType::BankStatement => Some(&self.bank_statement),
            DocumentType::Unknown => None,
        }
    }

    /// Build the output for already recognized text.
    ///
    /// Unknown documents get an empty field map and no transactions.
    pub fn process_text(
        &self,
        source_file: &str,
        text: &str,
        words: Option<&[RecognizedWord]>,
    ) -> OutputDocument {
        let document_type = self.classifier.classify(text);
        self.process_classified(source_file, text, words, document_type)
    }

    fn process_classified(
        &self,
        source_file: &str,
        text: &str,
        words: Option<&[RecognizedWord]>,
        document_type: DocumentType,
    ) -> OutputDocument {
        let Some(parser) = self.parser(document_type) else {
            info!("{}: document type not recognized", source_file);
            return OutputDocument::new(document_type, source_file, Record::default(), Vec::new());
        };

        let parsed = parser.parse(text, words);
        info!(
            "{}: {} with {}/{} fields and {} transactions",
            source_file,
            document_type,
            parsed.fields.resolved_count(),
            parsed.fields.len(),
            parsed.transactions.len()
        );

        OutputDocument::new(document_type, source_file, parsed.fields, parsed.transactions)
    }

    /// Recognize and process a document on disk.
    pub fn process_path(&self, provider: &dyn OcrProvider, path: &Path) -> Result<OutputDocument> {
        if !path.exists() {
            return Err(DocsiftError::SourceNotFound(path.to_path_buf()));
        }

        let start = Instant::now();
        let text = provider.get_text(path)?;
        debug!("{}: {} characters of text", path.display(), text.len());

        let output = self.process_recognized(provider, path, &text);
        debug!("{}: processed in {}ms", path.display(), start.elapsed().as_millis());
        Ok(output)
    }

    /// Process text already obtained from `provider` for `path`.
    ///
    /// Word boxes of the first page are requested for invoices only; if the
    /// provider fails to supply them, plain-line extraction is used instead.
    pub fn process_recognized(
        &self,
        provider: &dyn OcrProvider,
        path: &Path,
        text: &str,
    ) -> OutputDocument {
        let document_type = self.classifier.classify(text);
        let words = if document_type == DocumentType::Invoice && self.use_layout {
            match provider.get_word_boxes(path, 1) {
                Ok(words) => Some(words),
                Err(e) => {
                    warn!("{}: word boxes unavailable, using plain lines: {}", path.display(), e);
                    None
                }
            }
        } else {
            None
        };

        let source_file = path.to_string_lossy();
        self.process_classified(&source_file, text, words.as_deref(), document_type)
    }
}

impl Default for DocumentPipeline {
    fn default() -> Self {
        Self::new()
    }
}
