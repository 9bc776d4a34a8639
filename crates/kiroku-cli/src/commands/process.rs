//! Process command - recognize a single document image.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use kiroku_core::{DocumentType, ExtractionResult, Orchestrator, Strategy};

use super::{cancel_on_ctrl_c, load_config, DocumentKind, StrategyArg};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input image (JPEG, PNG, TIFF, ...)
    #[arg(required = true)]
    input: PathBuf,

    /// Document type
    #[arg(short = 't', long = "type", value_enum)]
    document_type: DocumentKind,

    /// Provider strategy (default: from config)
    #[arg(short, long, value_enum)]
    strategy: Option<StrategyArg>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Include the raw recognized text in text output
    #[arg(long)]
    show_text: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Plain text summary
    Text,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let image = fs::read(&args.input)?;
    let document_type = DocumentType::from(args.document_type);
    let strategy = args
        .strategy
        .map(Strategy::from)
        .unwrap_or(config.orchestrator.default_strategy);

    info!(
        "Processing {} as {} with {:?}",
        args.input.display(),
        document_type,
        strategy
    );

    let orchestrator = Orchestrator::from_config(&config);
    if orchestrator.providers().is_empty() {
        warn!("No recognition provider is configured; see 'kiroku config show'");
    }
    debug!("Providers: {:?}", orchestrator.providers());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap(),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Recognizing {}...", document_type));

    let cancel = cancel_on_ctrl_c();
    let result = orchestrator
        .process_document_with_cancel(&image, document_type, strategy, &cancel)
        .await;

    pb.finish_and_clear();

    let output = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&result)?,
        OutputFormat::Text => format_result_text(&result, args.show_text),
    };

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if !result.success {
        let reason = result
            .failure
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "unknown failure".to_string());
        anyhow::bail!("Recognition failed: {}", reason);
    }

    eprintln!(
        "{} {} via {} (confidence {:.2}) in {:?}",
        style("ℹ").blue(),
        document_type,
        result.method_used.as_str(),
        result.confidence,
        start.elapsed()
    );

    Ok(())
}

pub fn format_result_text(result: &ExtractionResult, show_text: bool) -> String {
    let mut lines = Vec::new();

    lines.push(format!(
        "Status:     {}",
        if result.success { "success" } else { "failed" }
    ));
    lines.push(format!("Method:     {}", result.method_used.as_str()));
    lines.push(format!("Confidence: {:.2}", result.confidence));
    if let Some(failure) = &result.failure {
        lines.push(format!("Failure:    {}", failure));
    }

    if !result.fields.is_empty() {
        lines.push(String::new());
        lines.push("Fields:".to_string());
        let width = result.fields.keys().map(|k| k.len()).max().unwrap_or(0);
        for (name, value) in &result.fields {
            lines.push(format!("  {:<width$}  {}", name, value, width = width));
        }
    }

    if show_text && !result.raw_text.is_empty() {
        lines.push(String::new());
        lines.push("Text:".to_string());
        for line in result.raw_text.lines() {
            lines.push(format!("  {}", line));
        }
    }

    lines.join("\n")
}
