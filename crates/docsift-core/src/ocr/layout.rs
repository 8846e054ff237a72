//! Line reconstruction from positioned words.
//!
//! Words whose `top` lies within the tolerance of an existing line key join
//! that line; otherwise they open a new line keyed by their own `top`. Lines
//! are emitted top to bottom with words ordered left to right, so the result
//! does not depend on the order the OCR engine reported the words in.

use tracing::trace;

use super::RecognizedWord;
use crate::models::config::LayoutConfig;

/// Rebuilds text lines from word boxes.
#[derive(Debug, Clone)]
pub struct LayoutReconstructor {
    tolerance: u32,
    separator: String,
}

impl LayoutReconstructor {
    /// Reconstructor with an 8 px tolerance and a double-space separator.
    pub fn new() -> Self {
        Self::from_config(&LayoutConfig::default())
    }

    pub fn from_config(config: &LayoutConfig) -> Self {
        Self {
            tolerance: config.line_tolerance,
            separator: config.column_separator.clone(),
        }
    }

    pub fn with_tolerance(mut self, tolerance: u32) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn tolerance(&self) -> u32 {
        self.tolerance
    }

    /// Group words into lines, sorted by line key, words by `left`.
    ///
    /// A word joins the first existing key strictly closer than the
    /// tolerance. Blank words are dropped.
    pub fn group_lines<'a>(&self, words: &'a [RecognizedWord]) -> Vec<(i32, Vec<&'a RecognizedWord>)> {
        let mut lines: Vec<(i32, Vec<&RecognizedWord>)> = Vec::new();

        for word in words.iter().filter(|w| !w.text.trim().is_empty()) {
            let slot = lines
                .iter_mut()
                .find(|(key, _)| key.abs_diff(word.top) < self.tolerance);

            match slot {
                Some((_, members)) => members.push(word),
                None => lines.push((word.top, vec![word])),
            }
        }

        lines.sort_by_key(|(key, _)| *key);
        for (_, members) in &mut lines {
            members.sort_by_key(|w| w.left);
        }

        trace!("grouped {} words into {} lines", words.len(), lines.len());
        lines
    }

    /// Lines of text, words joined by the separator.
    pub fn reconstruct(&self, words: &[RecognizedWord]) -> Vec<String> {
        self.group_lines(words)
            .into_iter()
            .map(|(_, members)| {
                members
                    .iter()
                    .map(|w| w.text.trim())
                    .collect::<Vec<_>>()
                    .join(&self.separator)
            })
            .collect()
    }

    /// Reconstructed lines joined with `\n`.
    pub fn reconstruct_text(&self, words: &[RecognizedWord]) -> String {
        self.reconstruct(words).join("\n")
    }
}

impl Default for LayoutReconstructor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn words() -> Vec<RecognizedWord> {
        vec![
            RecognizedWord::new("Qty", 200, 12),
            RecognizedWord::new("Item", 10, 10),
            RecognizedWord::new("Price", 300, 9),
            RecognizedWord::new("Widget", 10, 40),
            RecognizedWord::new("2", 200, 43),
            RecognizedWord::new("10.00", 300, 38),
        ]
    }

    #[test]
    fn test_reconstruct() {
        let lines = LayoutReconstructor::new().reconstruct(&words());
        assert_eq!(lines, vec!["Item  Qty  Price", "Widget  2  10.00"]);
    }

    #[test]
    fn test_reversed_input_same_lines() {
        let reconstructor = LayoutReconstructor::new();
        let mut reversed = words();
        reversed.reverse();

        assert_eq!(reconstructor.reconstruct(&reversed), reconstructor.reconstruct(&words()));
    }

    #[test]
    fn test_tolerance_is_strict() {
        let words = vec![RecognizedWord::new("a", 0, 0), RecognizedWord::new("b", 10, 8)];

        let lines = LayoutReconstructor::new().reconstruct(&words);
        assert_eq!(lines, vec!["a", "b"]);

        let lines = LayoutReconstructor::new().with_tolerance(9).reconstruct(&words);
        assert_eq!(lines, vec!["a  b"]);
    }

    #[test]
    fn test_blank_words_and_empty_input() {
        let reconstructor = LayoutReconstructor::new().with_separator(" | ");
        assert!(reconstructor.reconstruct(&[]).is_empty());

        let words = vec![
            RecognizedWord::new("  ", 0, 0),
            RecognizedWord::new("x", 5, 1),
            RecognizedWord::new("y", 20, 2),
        ];
        assert_eq!(reconstructor.reconstruct_text(&words), "x | y");
    }
}
