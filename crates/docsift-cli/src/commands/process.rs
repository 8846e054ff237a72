//! Process command - extract data from a single document.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use docsift_core::{DocumentPipeline, DocumentType, OutputDocument};

use super::{load_config, provider_for};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (transcript, PDF or image)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file or directory (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Skip OCR and use only PDF text layers
    #[arg(long)]
    text_only: bool,

    /// Print the recognized text to stderr
    #[arg(long)]
    show_text: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV of the transactions
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap(),
    );
    pb.enable_steady_tick(Duration::from_millis(100));

    pb.set_message("Recognizing text...");
    let provider = provider_for(&args.input, &config, args.text_only)?;
    let text = provider.get_text(&args.input)?;

    if args.show_text {
        pb.suspend(|| {
            eprintln!("{}", style("Recognized text:").bold());
            eprintln!("{}", text);
            eprintln!();
        });
    }

    pb.set_message("Extracting fields...");
    let pipeline = DocumentPipeline::from_config(&config);
    let document = pipeline.process_recognized(provider.as_ref(), &args.input, &text);

    pb.finish_and_clear();

    if document.document_type() == DocumentType::Unknown {
        warn!(
            "Could not determine the document type of {}",
            args.input.display()
        );
    }

    let output = format_document(&document, args.format)?;

    if let Some(output_path) = &args.output {
        let output_path = resolve_output_path(output_path, &document, args.format);
        fs::write(&output_path, &output)?;
        eprintln!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// A directory gets the document's default file name.
fn resolve_output_path(output: &Path, document: &OutputDocument, format: OutputFormat) -> PathBuf {
    if output.is_dir() {
        output
            .join(document.default_file_name())
            .with_extension(format.extension())
    } else {
        output.to_path_buf()
    }
}

pub fn format_document(document: &OutputDocument, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(document)?),
        OutputFormat::Csv => format_csv(document),
        OutputFormat::Text => Ok(format_text(document)),
    }
}

/// One CSV row per transaction, columns in vocabulary order.
fn format_csv(document: &OutputDocument) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    let columns = document.document_type().columns();

    if !columns.is_empty() {
        wtr.write_record(columns)?;
    }

    for row in document.transactions() {
        wtr.write_record(
            columns
                .iter()
                .map(|column| row.get(column).map(ToString::to_string).unwrap_or_default()),
        )?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(document: &OutputDocument) -> String {
    let mut output = String::new();
    let metadata = document.metadata();

    output.push_str(&format!("Document: {}\n", document.document_type()));
    output.push_str(&format!("Source: {}\n", metadata.source_file));
    output.push_str(&format!(
        "Extracted on: {}\n",
        metadata.extracted_on.format("%Y-%m-%d %H:%M:%S")
    ));

    if !document.fields().is_empty() {
        output.push_str("\nFields:\n");
        for (name, value) in document.fields().iter() {
            output.push_str(&format!("  {}: {}\n", name, value));
        }
    }

    output.push_str(&format!("\nTransactions: {}\n", document.transactions().len()));
    for (i, row) in document.transactions().iter().enumerate() {
        let cells: Vec<String> = row
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect();
        output.push_str(&format!("  {}. {}\n", i + 1, cells.join(", ")));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn receipt() -> OutputDocument {
        DocumentPipeline::new().process_text(
            "receipt.txt",
            "RECEIPT #12\nDate: 07/06/2024\nItem  Qty  Price  Total\nTea  2  1.50  3.00\nTotal Paid: 3.00",
            None,
        )
    }

    #[test]
    fn test_csv_has_column_header() {
        let csv = format_csv(&receipt()).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("label,quantity,unit_price,total_ht,tax_percent,discount")
        );
        assert_eq!(lines.next(), Some("Tea,2,1.50,3.00,N/A,N/A"));
    }

    #[test]
    fn test_text_summary() {
        let text = format_text(&receipt());
        assert!(text.starts_with("Document: receipt\n"));
        assert!(text.contains("  receipt_number: 12\n"));
        assert!(text.contains("Transactions: 1\n"));
    }

    #[test]
    fn test_output_directory_gets_default_name() {
        let dir = tempfile::tempdir().unwrap();
        let document = receipt();
        let path = resolve_output_path(dir.path(), &document, OutputFormat::Csv);

        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("receipt_output_"));
        assert!(name.ends_with(".csv"));
    }
}
