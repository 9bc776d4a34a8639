//! Attendance command - read daily records from a timer card PDF.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use kiroku_core::{AttendanceReport, IdentityResolver, InMemoryRoster, Orchestrator};

use super::{cancel_on_ctrl_c, load_config};

/// Arguments for the attendance command.
#[derive(Args)]
pub struct AttendanceArgs {
    /// Input PDF
    #[arg(required = true)]
    input: PathBuf,

    /// Organizational unit used to narrow roster matching
    #[arg(long)]
    org_unit: Option<String>,

    /// Roster JSON file for name matching
    #[arg(short, long)]
    roster: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: AttendanceFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum AttendanceFormat {
    /// JSON report
    Json,
    /// One CSV row per day
    Csv,
}

pub async fn run(args: AttendanceArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let pdf = fs::read(&args.input)?;

    let mut orchestrator = Orchestrator::from_config(&config);
    if let Some(roster_path) = &args.roster {
        let roster = InMemoryRoster::from_file(roster_path)?;
        info!("Loaded {} roster entries", roster.len());
        orchestrator = orchestrator.with_identity(IdentityResolver::new(roster, &config.identity));
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap(),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("Reading timer card...");

    let cancel = cancel_on_ctrl_c();
    let report = orchestrator
        .extract_attendance_with_cancel(&pdf, args.org_unit.as_deref(), &cancel)
        .await;

    pb.finish_and_clear();
    let report = report?;

    let output = match args.format {
        AttendanceFormat::Json => serde_json::to_string_pretty(&report)?,
        AttendanceFormat::Csv => format_report_csv(&report)?,
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

    eprintln!(
        "{} {} pages, {} records in {:?}",
        style("ℹ").blue(),
        report.pages_processed,
        report.records.len(),
        start.elapsed()
    );

    if !report.processing_errors.is_empty() {
        eprintln!("{}", style("Page errors:").yellow());
        for page in &report.processing_errors {
            eprintln!("  - page {}: {}", page.page, page.error);
        }
    }

    Ok(())
}

pub fn format_report_csv(report: &AttendanceReport) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "work_date",
        "clock_in",
        "clock_out",
        "break_minutes",
        "worked_minutes",
        "night_shift",
        "employee_id",
        "employee_name",
        "match_confidence",
        "validation_errors",
    ])?;

    for record in &report.records {
        let (employee_id, employee_name, match_confidence) = match &record.employee_match {
            Some(m) if m.is_match() => (
                m.candidate_id.map(|id| id.to_string()).unwrap_or_default(),
                m.matched_name.clone(),
                format!("{:.2}", m.confidence),
            ),
            _ => (String::new(), String::new(), String::new()),
        };

        wtr.write_record([
            record.work_date.to_string(),
            record.clock_in.format("%H:%M").to_string(),
            record.clock_out.format("%H:%M").to_string(),
            record.break_minutes.to_string(),
            record.worked_minutes().to_string(),
            record.is_night_shift.to_string(),
            employee_id,
            employee_name,
            match_confidence,
            record.validation_errors.join("; "),
        ])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiroku_core::{DailyRecord, EmployeeMatch};

    #[test]
    fn test_csv_has_one_row_per_record() {
        let record = DailyRecord {
            work_date: "2025-10-01".parse().unwrap(),
            clock_in: "22:00:00".parse().unwrap(),
            clock_out: "06:00:00".parse().unwrap(),
            break_minutes: 60,
            is_night_shift: true,
            validation_errors: Vec::new(),
            employee_match: Some(EmployeeMatch {
                candidate_id: Some(7),
                matched_name: "田中太郎".to_string(),
                confidence: 0.9,
            }),
        };
        let report = AttendanceReport {
            pages_processed: 1,
            records: vec![record],
            processing_errors: Vec::new(),
        };

        let csv = format_report_csv(&report).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[1],
            "2025-10-01,22:00,06:00,60,420,true,7,田中太郎,0.90,"
        );
    }
}
