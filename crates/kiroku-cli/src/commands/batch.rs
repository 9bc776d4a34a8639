//! Batch processing command for multiple document images.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use kiroku_core::{DocumentType, ExtractionResult, Orchestrator, Strategy};

use super::process::{format_result_text, OutputFormat};
use super::{cancel_on_ctrl_c, load_config, DocumentKind, StrategyArg};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tif", "tiff", "bmp", "webp"];

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Document type shared by every input
    #[arg(short = 't', long = "type", value_enum)]
    document_type: DocumentKind,

    /// Provider strategy (default: from config)
    #[arg(short, long, value_enum)]
    strategy: Option<StrategyArg>,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of processing a single file.
struct FileOutcome {
    path: PathBuf,
    result: Option<ExtractionResult>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| is_image(p))
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
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

    let document_type = DocumentType::from(args.document_type);
    let strategy = args
        .strategy
        .map(Strategy::from)
        .unwrap_or(config.orchestrator.default_strategy);
    let orchestrator = Orchestrator::from_config(&config);
    let cancel = cancel_on_ctrl_c();

    let mut outcomes = Vec::with_capacity(files.len());

    for path in files {
        if cancel.is_cancelled() {
            warn!("Batch interrupted, {} files processed", outcomes.len());
            break;
        }

        let file_start = Instant::now();
        let outcome = match fs::read(&path) {
            Ok(image) => {
                let result = orchestrator
                    .process_document_with_cancel(&image, document_type, strategy, &cancel)
                    .await;
                match &result.failure {
                    Some(failure) => Err(failure.to_string()),
                    None => Ok(result),
                }
            }
            Err(e) => Err(e.to_string()),
        };
        let processing_time_ms = file_start.elapsed().as_millis() as u64;

        match outcome {
            Ok(result) => outcomes.push(FileOutcome {
                path,
                result: Some(result),
                error: None,
                processing_time_ms,
            }),
            Err(error_msg) => {
                if args.continue_on_error {
                    warn!("Failed to process {}: {}", path.display(), error_msg);
                    outcomes.push(FileOutcome {
                        path,
                        result: None,
                        error: Some(error_msg),
                        processing_time_ms,
                    });
                } else {
                    error!("Failed to process {}: {}", path.display(), error_msg);
                    pb.abandon();
                    anyhow::bail!("Processing failed: {}", error_msg);
                }
            }
        }

        pb.inc(1);
    }

    pb.finish_with_message("Complete");

    let successful: Vec<_> = outcomes.iter().filter(|o| o.result.is_some()).collect();
    let failed: Vec<_> = outcomes.iter().filter(|o| o.error.is_some()).collect();

    if let Some(output_dir) = &args.output_dir {
        for outcome in &successful {
            if let Some(result) = &outcome.result {
                let output_path = output_path_for(output_dir, &outcome.path, args.format);
                let content = match args.format {
                    OutputFormat::Json => serde_json::to_string_pretty(result)?,
                    OutputFormat::Text => format_result_text(result, false),
                };
                fs::write(&output_path, content)?;
                debug!("Wrote output to {}", output_path.display());
            }
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, document_type, &outcomes)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        outcomes.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(successful.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for outcome in &failed {
            println!(
                "  - {}: {}",
                outcome.path.display(),
                outcome.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn output_path_for(output_dir: &Path, input: &Path, format: OutputFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document");
    let extension = match format {
        OutputFormat::Json => "json",
        OutputFormat::Text => "txt",
    };
    output_dir.join(format!("{}.{}", stem, extension))
}

/// One summary row per file, with a column for each field the type can carry.
fn write_summary(
    path: &Path,
    document_type: DocumentType,
    outcomes: &[FileOutcome],
) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    let fields = document_type.known_fields();

    let mut header = vec!["filename", "status", "method", "confidence"];
    header.extend_from_slice(fields);
    header.extend_from_slice(&["processing_time_ms", "error"]);
    wtr.write_record(&header)?;

    for outcome in outcomes {
        let filename = outcome
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_string();

        let mut row = vec![filename];
        match &outcome.result {
            Some(result) => {
                row.push("success".to_string());
                row.push(result.method_used.as_str().to_string());
                row.push(format!("{:.2}", result.confidence));
                for field in fields {
                    row.push(result.field(field).unwrap_or_default().to_string());
                }
            }
            None => {
                row.push("error".to_string());
                row.push(String::new());
                row.push(String::new());
                row.extend(fields.iter().map(|_| String::new()));
            }
        }
        row.push(outcome.processing_time_ms.to_string());
        row.push(outcome.error.clone().unwrap_or_default());

        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}
