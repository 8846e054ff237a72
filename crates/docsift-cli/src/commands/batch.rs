//! Batch processing command for multiple documents.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use docsift_core::models::config::DocsiftConfig;
use docsift_core::{DocumentPipeline, OcrProvider, OutputDocument, PureOcrProvider, TranscriptProvider};

use super::process::{format_document, OutputFormat};
use super::{is_supported, load_config};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Skip OCR and use only PDF text layers
    #[arg(long)]
    text_only: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of processing a single file.
struct ProcessResult {
    path: PathBuf,
    document: Option<OutputDocument>,
    error: Option<String>,
    processing_time_ms: u64,
}

/// Providers shared across the batch; the OCR engine is loaded on first use.
struct Providers<'a> {
    config: &'a DocsiftConfig,
    text_only: bool,
    transcript: TranscriptProvider,
    ocr: Option<PureOcrProvider>,
}

impl<'a> Providers<'a> {
    fn new(config: &'a DocsiftConfig, text_only: bool) -> Self {
        Self {
            config,
            text_only,
            transcript: TranscriptProvider::new(),
            ocr: None,
        }
    }

    fn for_path(&mut self, path: &Path) -> anyhow::Result<&dyn OcrProvider> {
        let is_transcript = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("txt") || e.eq_ignore_ascii_case("tsv"));

        if is_transcript {
            return Ok(&self.transcript);
        }

        if self.ocr.is_none() {
            self.ocr = Some(PureOcrProvider::from_config(self.config, self.text_only)?);
        }
        match &self.ocr {
            Some(ocr) => Ok(ocr),
            None => anyhow::bail!("OCR provider unavailable"),
        }
    }
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file() && is_supported(p))
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    eprintln!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")
            .unwrap()
            .progress_chars("=>-"),
    );

    let pipeline = DocumentPipeline::from_config(&config);
    let mut providers = Providers::new(&config, args.text_only);
    let mut results = Vec::with_capacity(files.len());

    for path in files {
        let file_start = Instant::now();
        let result = providers
            .for_path(&path)
            .and_then(|provider| pipeline.process_path(provider, &path).map_err(Into::into));
        let processing_time_ms = file_start.elapsed().as_millis() as u64;

        match result {
            Ok(document) => {
                results.push(ProcessResult {
                    path,
                    document: Some(document),
                    error: None,
                    processing_time_ms,
                });
            }
            Err(e) => {
                let error_msg = e.to_string();
                if args.continue_on_error {
                    warn!("Failed to process {}: {}", path.display(), error_msg);
                    results.push(ProcessResult {
                        path,
                        document: None,
                        error: Some(error_msg),
                        processing_time_ms,
                    });
                } else {
                    pb.abandon();
                    error!("Failed to process {}: {}", path.display(), error_msg);
                    anyhow::bail!("Processing failed: {}", error_msg);
                }
            }
        }

        pb.inc(1);
    }

    pb.finish_with_message("Complete");

    let successful: Vec<_> = results.iter().filter(|r| r.document.is_some()).collect();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    for result in &successful {
        let Some(document) = &result.document else {
            continue;
        };
        let content = format_document(document, args.format)?;

        match &args.output_dir {
            Some(output_dir) => {
                let output_name = result
                    .path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("document");
                let output_path =
                    output_dir.join(format!("{}.{}", output_name, args.format.extension()));

                fs::write(&output_path, content)?;
                debug!("Wrote output to {}", output_path.display());
            }
            None => println!("{}", content),
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        eprintln!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    eprintln!();
    eprintln!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    eprintln!(
        "   {} successful, {} failed",
        style(successful.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        eprintln!();
        eprintln!("{}", style("Failed files:").red());
        for result in &failed {
            eprintln!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn write_summary(path: &Path, results: &[ProcessResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "document_type",
        "resolved_fields",
        "transactions",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        if let Some(document) = &result.document {
            wtr.write_record([
                filename,
                "success",
                document.document_type().as_str(),
                &format!(
                    "{}/{}",
                    document.fields().resolved_count(),
                    document.fields().len()
                ),
                &document.transactions().len().to_string(),
                &result.processing_time_ms.to_string(),
                "",
            ])?;
        } else {
            wtr.write_record([
                filename,
                "error",
                "",
                "",
                "",
                &result.processing_time_ms.to_string(),
                result.error.as_deref().unwrap_or(""),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
