//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::DocsiftError;

/// Main configuration for the docsift pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocsiftConfig {
    /// Word-box line reconstruction.
    pub layout: LayoutConfig,

    /// Table/transaction extraction thresholds.
    pub table: TableConfig,

    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// OCR model configuration.
    pub ocr: OcrConfig,
}

/// Layout reconstruction configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Maximum vertical distance (pixels) between a word and a line key.
    pub line_tolerance: u32,

    /// Separator placed between words of one line. Table extraction splits
    /// columns on runs of two or more whitespace characters, so this must
    /// contain at least two.
    pub column_separator: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            line_tolerance: 8,
            column_separator: "  ".to_string(),
        }
    }
}

/// Table extraction configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Rows splitting into fewer columns are dropped.
    pub min_columns: usize,

    /// Number of consecutive lines a header may be spread over.
    pub header_window: usize,

    /// Distinct header keywords needed to accept a header.
    pub min_header_matches: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            min_columns: 3,
            header_window: 3,
            min_header_matches: 3,
        }
    }
}

/// PDF processing configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Try to use the embedded text layer before falling back to OCR.
    pub prefer_embedded_text: bool,

    /// Minimum text length to consider the text layer usable.
    pub min_text_length: usize,

    /// Maximum pages to OCR (0 = unlimited).
    pub max_pages: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            prefer_embedded_text: true,
            min_text_length: 50,
            max_pages: 10,
        }
    }
}

/// OCR model files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Directory containing model files.
    pub model_dir: PathBuf,

    /// Text detection model file name.
    pub detection_model: String,

    /// Text recognition model file name.
    pub recognition_model: String,

    /// Character dictionary file name.
    pub dictionary: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            detection_model: "det.onnx".to_string(),
            recognition_model: "latin_rec.onnx".to_string(),
            dictionary: "latin_dict.txt".to_string(),
        }
    }
}

impl OcrConfig {
    /// Full paths of the detection model, recognition model and dictionary.
    pub fn model_paths(&self) -> (PathBuf, PathBuf, PathBuf) {
        (
            self.model_dir.join(&self.detection_model),
            self.model_dir.join(&self.recognition_model),
            self.model_dir.join(&self.dictionary),
        )
    }

    /// Whether every model file is present on disk.
    pub fn models_available(&self) -> bool {
        let (det, rec, dict) = self.model_paths();
        det.exists() && rec.exists() && dict.exists()
    }
}

impl DocsiftConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }

    /// Reject settings the extractors cannot work with.
    pub fn validate(&self) -> crate::error::Result<()> {
        let separator_spaces = self
            .layout
            .column_separator
            .chars()
            .filter(|c| c.is_whitespace())
            .count();
        if separator_spaces < 2 {
            return Err(DocsiftError::Config(format!(
                "layout.column_separator must contain at least two whitespace characters, got {:?}",
                self.layout.column_separator
            )));
        }
        if self.table.min_columns == 0 {
            return Err(DocsiftError::Config("table.min_columns must be at least 1".to_string()));
        }
        if self.table.min_header_matches == 0 {
            return Err(DocsiftError::Config(
                "table.min_header_matches must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
