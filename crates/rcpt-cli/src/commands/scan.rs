//! Scan command: enumerate inputs, extract every receipt, write the logs.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use rcpt_core::models::config::parse_tolerance;
use rcpt_core::output::{write_csv_summary, write_items_csv, write_json_log};
use rcpt_core::{
    AzureReceiptClient, BatchReport, BatchRunner, Credentials, ScanConfig, ValidationStatus,
    VendorSource, enumerate_inputs,
};

use super::config::load_config;

/// Arguments for a scan run.
#[derive(Args)]
pub struct ScanArgs {
    /// Receipt file or directory of receipts
    #[arg(short, long)]
    input: PathBuf,

    /// JSON log output path
    #[arg(long)]
    json: Option<PathBuf>,

    /// CSV summary output path
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Also write one CSV row per line item
    #[arg(long)]
    items_csv: Option<PathBuf>,

    /// Number of parallel workers
    #[arg(short = 'j', long)]
    jobs: Option<usize>,

    /// Absolute tolerance for the totals check
    #[arg(long)]
    tolerance: Option<String>,

    /// Disable the progress bar
    #[arg(long)]
    no_progress: bool,
}

pub async fn run(args: ScanArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    apply_overrides(&mut config, &args)?;

    // Credentials first: nothing is sent or written without them
    let credentials = Arc::new(Credentials::from_env()?);
    info!("Using endpoint {}", credentials.endpoint());

    let files = enumerate_inputs(&args.input)?;
    if files.is_empty() {
        println!(
            "{} No supported receipts found in {}",
            style("ℹ").blue(),
            args.input.display()
        );
    } else {
        println!(
            "{} Found {} receipt(s) to process",
            style("ℹ").blue(),
            files.len()
        );
    }

    let client = AzureReceiptClient::new(credentials, &config.service)?;
    let runner = BatchRunner::from_config(Arc::new(client), &config);

    let progress = progress_bar(files.len() as u64, args.no_progress)?;
    let report = runner
        .run(files, |record| {
            progress.set_message(record.file_name().to_string());
            if let Some(error) = &record.error {
                progress.println(format!(
                    "{} {}: {}",
                    style("✗").red(),
                    record.file_name(),
                    error
                ));
            }
            progress.inc(1);
        })
        .await;
    progress.finish_and_clear();

    let report = report.context("Batch aborted, no output written")?;

    write_outputs(&config, &report)?;
    print_summary(&config, &report);

    Ok(())
}

fn apply_overrides(config: &mut ScanConfig, args: &ScanArgs) -> anyhow::Result<()> {
    if let Some(jobs) = args.jobs {
        if jobs == 0 {
            anyhow::bail!("--jobs must be at least 1");
        }
        config.batch.workers = jobs;
    }
    if let Some(tolerance) = &args.tolerance {
        config.validation.tolerance = parse_tolerance(tolerance)?;
    }
    if let Some(json) = &args.json {
        config.output.json_path = json.clone();
    }
    if let Some(csv) = &args.csv {
        config.output.csv_path = csv.clone();
    }
    if let Some(items) = &args.items_csv {
        config.output.items_csv_path = Some(items.clone());
    }
    Ok(())
}

fn progress_bar(len: u64, disabled: bool) -> anyhow::Result<ProgressBar> {
    if disabled || len == 0 {
        return Ok(ProgressBar::hidden());
    }

    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {wide_msg}")?
            .progress_chars("=>-"),
    );
    Ok(pb)
}

fn write_outputs(config: &ScanConfig, report: &BatchReport) -> anyhow::Result<()> {
    let output = &config.output;

    write_json_log(&output.json_path, &report.records)
        .with_context(|| format!("Failed to write {}", output.json_path.display()))?;
    write_csv_summary(&output.csv_path, &report.records)
        .with_context(|| format!("Failed to write {}", output.csv_path.display()))?;

    if let Some(items_path) = &output.items_csv_path {
        write_items_csv(items_path, &report.records)
            .with_context(|| format!("Failed to write {}", items_path.display()))?;
    }

    Ok(())
}

fn print_summary(config: &ScanConfig, report: &BatchReport) {
    println!();
    println!(
        "{} Processed {} receipt(s) in {:.1?}",
        style("✓").green(),
        report.records.len(),
        report.elapsed
    );
    println!(
        "   {} successful, {} failed",
        style(report.succeeded()).green(),
        style(report.failed()).red()
    );
    println!(
        "   validation: {} OK, {} mismatch, {} insufficient data",
        style(report.count_status(ValidationStatus::Ok)).green(),
        style(report.count_status(ValidationStatus::Mismatch)).yellow(),
        report.count_status(ValidationStatus::InsufficientData)
    );

    let guessed = report
        .records
        .iter()
        .filter(|r| r.vendor_source == VendorSource::Heuristic)
        .count();
    if guessed > 0 {
        println!("   vendor guessed from text for {} receipt(s)", guessed);
    }

    let mismatched: Vec<_> = report
        .records
        .iter()
        .filter(|r| r.is_success() && r.validation_status == ValidationStatus::Mismatch)
        .collect();
    if !mismatched.is_empty() {
        warn!("{} receipt(s) failed the totals check", mismatched.len());
        println!();
        println!("{}", style("Totals mismatch:").yellow());
        for record in mismatched {
            println!(
                "  - {}: total {}, calculated {}",
                record.file_name(),
                display_amount(record.total),
                display_amount(record.calculated_total)
            );
        }
    }

    let failed: Vec<_> = report.records.iter().filter(|r| !r.is_success()).collect();
    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for record in failed {
            println!(
                "  - {}: {}",
                record.file_path,
                record.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    println!();
    print_written(&config.output.json_path);
    print_written(&config.output.csv_path);
    if let Some(items) = &config.output.items_csv_path {
        print_written(items);
    }
}

fn print_written(path: &Path) {
    println!("{} Wrote {}", style("✓").green(), path.display());
}

fn display_amount<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        scan: ScanArgs,
    }

    fn parse(args: &[&str]) -> ScanArgs {
        TestCli::parse_from(std::iter::once("rcpt").chain(args.iter().copied())).scan
    }

    #[test]
    fn test_overrides_apply() {
        let args = parse(&[
            "-i", "receipts", "--json", "out/log.json", "--items-csv", "items.csv", "-j", "8",
            "--tolerance", "0.05",
        ]);
        let mut config = ScanConfig::default();
        apply_overrides(&mut config, &args).unwrap();

        assert_eq!(config.batch.workers, 8);
        assert_eq!(config.validation.tolerance.to_string(), "0.05");
        assert_eq!(config.output.json_path, PathBuf::from("out/log.json"));
        assert_eq!(config.output.csv_path, PathBuf::from("extraction_log.csv"));
        assert_eq!(config.output.items_csv_path, Some(PathBuf::from("items.csv")));
    }

    #[test]
    fn test_invalid_overrides_rejected() {
        let mut config = ScanConfig::default();
        assert!(apply_overrides(&mut config, &parse(&["-i", "x", "-j", "0"])).is_err());
        assert!(apply_overrides(&mut config, &parse(&["-i", "x", "--tolerance=-1"])).is_err());
        assert!(apply_overrides(&mut config, &parse(&["-i", "x", "--tolerance", "abc"])).is_err());
    }
}
