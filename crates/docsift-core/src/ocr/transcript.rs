//! Provider reading pre-computed OCR transcripts.
//!
//! A plain `.txt` file supplies the text. Word boxes come from a Tesseract
//! TSV file (`tesseract page.png page tsv`): either the document itself when
//! it is a `.tsv`, or a sibling sharing its stem.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use super::{OcrProvider, RecognizedWord};
use crate::error::Result;

/// Tesseract's level for a single word.
const WORD_LEVEL: u32 = 5;

#[derive(Debug, Deserialize)]
struct TsvRow {
    level: u32,
    page_num: u32,
    block_num: u32,
    par_num: u32,
    line_num: u32,
    left: i32,
    top: i32,
    #[serde(default)]
    text: Option<String>,
}

impl TsvRow {
    fn word(&self) -> Option<&str> {
        if self.level != WORD_LEVEL {
            return None;
        }
        self.text.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}

/// Reads `.txt` and Tesseract `.tsv` transcripts from disk.
#[derive(Debug, Clone, Default)]
pub struct TranscriptProvider;

impl TranscriptProvider {
    pub fn new() -> Self {
        Self
    }

    fn is_tsv(path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("tsv"))
    }

    /// TSV file holding the word boxes of `document`.
    pub fn word_box_path(document: &Path) -> PathBuf {
        if Self::is_tsv(document) {
            document.to_path_buf()
        } else {
            document.with_extension("tsv")
        }
    }

    fn read_rows(path: &Path) -> Result<Vec<TsvRow>> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .quoting(false)
            .flexible(true)
            .has_headers(true)
            .from_path(path)?;

        let mut rows = Vec::new();
        for row in reader.deserialize() {
            rows.push(row?);
        }
        Ok(rows)
    }
}

impl OcrProvider for TranscriptProvider {
    fn get_text(&self, document: &Path) -> Result<String> {
        if !Self::is_tsv(document) {
            return Ok(fs::read_to_string(document)?);
        }

        // Lines keyed by Tesseract's (page, block, paragraph, line) numbering.
        let mut lines: BTreeMap<(u32, u32, u32, u32), Vec<String>> = BTreeMap::new();
        for row in Self::read_rows(document)? {
            if let Some(word) = row.word() {
                lines
                    .entry((row.page_num, row.block_num, row.par_num, row.line_num))
                    .or_default()
                    .push(word.to_string());
            }
        }

        Ok(lines
            .into_values()
            .map(|words| words.join(" "))
            .collect::<Vec<_>>()
            .join("\n"))
    }

    fn get_word_boxes(&self, document: &Path, page: u32) -> Result<Vec<RecognizedWord>> {
        let path = Self::word_box_path(document);
        if !path.exists() {
            debug!("no word-box transcript at {}", path.display());
            return Ok(Vec::new());
        }

        let words: Vec<RecognizedWord> = Self::read_rows(&path)?
            .into_iter()
            .filter(|row| row.page_num == page)
            .filter_map(|row| {
                row.word()
                    .map(|text| RecognizedWord::new(text, row.left, row.top))
            })
            .collect();

        debug!("read {} words for page {} from {}", words.len(), page, path.display());
        Ok(words)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    const TSV: &str = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext
1\t1\t0\t0\t0\t0\t0\t0\t800\t600\t-1\t
4\t1\t1\t1\t1\t0\t10\t10\t300\t12\t-1\t
5\t1\t1\t1\t1\t1\t10\t10\t40\t12\t96.1\tItem
5\t1\t1\t1\t1\t2\t200\t11\t30\t12\t95.0\tQty
5\t1\t1\t1\t2\t1\t10\t40\t60\t12\t91.3\tWidget
5\t1\t1\t1\t2\t2\t200\t41\t10\t12\t90.0\t2
5\t2\t1\t1\t1\t1\t10\t10\t60\t12\t90.0\tPage2
";

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_text_from_txt() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "scan.txt", "RECEIPT #1\nTotal: 5.00\n");

        let text = TranscriptProvider::new().get_text(&path).unwrap();
        assert_eq!(text, "RECEIPT #1\nTotal: 5.00\n");
    }

    #[test]
    fn test_text_from_tsv() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "scan.tsv", TSV);

        let text = TranscriptProvider::new().get_text(&path).unwrap();
        assert_eq!(text, "Item Qty\nWidget 2\nPage2");
    }

    #[test]
    fn test_word_boxes_from_sibling_tsv() {
        let dir = tempfile::tempdir().unwrap();
        let txt = write(dir.path(), "scan.txt", "Item Qty\nWidget 2\n");
        write(dir.path(), "scan.tsv", TSV);

        let words = TranscriptProvider::new().get_word_boxes(&txt, 1).unwrap();
        assert_eq!(words.len(), 4);
        assert_eq!(words[0], RecognizedWord::new("Item", 10, 10));
        assert_eq!(words[3], RecognizedWord::new("2", 200, 41));
    }

    #[test]
    fn test_missing_sidecar_yields_no_words() {
        let dir = tempfile::tempdir().unwrap();
        let txt = write(dir.path(), "scan.txt", "hello");

        let words = TranscriptProvider::new().get_word_boxes(&txt, 1).unwrap();
        assert!(words.is_empty());
    }

    #[test]
    fn test_missing_text_file_is_io_error() {
        let result = TranscriptProvider::new().get_text(Path::new("/nonexistent/scan.txt"));
        assert!(matches!(result, Err(crate::error::DocsiftError::Io(_))));
    }
}
