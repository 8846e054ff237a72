//! Subcommand implementations and helpers shared between them.

pub mod batch;
pub mod config;
pub mod process;

use std::path::{Path, PathBuf};

use tracing::debug;

use docsift_core::models::config::DocsiftConfig;
use docsift_core::{OcrProvider, PureOcrProvider, TranscriptProvider};

/// Extensions that can be turned into text.
pub const SUPPORTED_EXTENSIONS: &[&str] =
    &["txt", "tsv", "pdf", "png", "jpg", "jpeg", "tif", "tiff", "bmp"];

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

pub fn is_supported(path: &Path) -> bool {
    SUPPORTED_EXTENSIONS.contains(&extension(path).as_str())
}

/// Default location of the user configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("docsift")
        .join("config.json")
}

/// Explicit `--config` file, else the user file if present, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<DocsiftConfig> {
    let user_path = default_config_path();
    let config = match config_path {
        Some(path) => DocsiftConfig::from_file(Path::new(path))?,
        None if user_path.exists() => {
            debug!("Using configuration from {}", user_path.display());
            DocsiftConfig::from_file(&user_path)?
        }
        None => DocsiftConfig::default(),
    };

    config.validate()?;
    Ok(config)
}

/// Pick the OCR provider able to read `path`.
///
/// Transcripts are read as-is; PDFs and images go through the ONNX engine.
pub fn provider_for(
    path: &Path,
    config: &DocsiftConfig,
    text_only: bool,
) -> anyhow::Result<Box<dyn OcrProvider>> {
    match extension(path).as_str() {
        "txt" | "tsv" => Ok(Box::new(TranscriptProvider::new())),
        "pdf" | "png" | "jpg" | "jpeg" | "tif" | "tiff" | "bmp" => {
            Ok(Box::new(PureOcrProvider::from_config(config, text_only)?))
        }
        other => anyhow::bail!("Unsupported file format: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_extensions() {
        assert!(is_supported(Path::new("scan.PNG")));
        assert!(is_supported(Path::new("receipt.txt")));
        assert!(!is_supported(Path::new("notes.docx")));
        assert!(!is_supported(Path::new("README")));
    }

    #[test]
    fn test_provider_for_unsupported() {
        let result = provider_for(Path::new("notes.docx"), &DocsiftConfig::default(), true);
        assert!(result.is_err());
    }
}
