// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unredact — command-line entry point.
//
// Rebuilds one PDF, or every PDF in a folder, without its black raster
// redaction boxes and with the hidden text layer drawn on top.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use unredact_core::config::EngineConfig;
use unredact_core::error::{Result, UnredactError};
use unredact_core::human_errors::{Severity, humanize_error};
use unredact_core::types::{BatchReport, FileStatus};
use unredact_document::{BatchRunner, Unredactor};

#[derive(Parser, Debug)]
#[command(name = "unredact")]
#[command(version)]
#[command(about = "Remove black redaction boxes from PDFs and reveal the text underneath", long_about = None)]
struct Cli {
    /// Input PDF file or folder of PDFs (prompted for when omitted)
    #[arg(short, long, value_name = "PATH")]
    input: Option<PathBuf>,

    /// Output folder, created if missing (prompted for when omitted)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Custom output file name (single file only)
    #[arg(short = 'n', long, value_name = "NAME")]
    name: Option<String>,

    /// 1 = remove black boxes, 0 = keep every image
    #[arg(short = 'b', long = "bbox", value_name = "0|1",
          value_parser = clap::value_parser!(u8).range(0..=1))]
    bbox: Option<u8>,

    /// 1 = recovered text in red, 0 = in black
    #[arg(long = "highlight", visible_alias = "hl", value_name = "0|1",
          value_parser = clap::value_parser!(u8).range(0..=1))]
    highlight: Option<u8>,

    /// Mean brightness (0-255) at or below which an image is a redaction box
    #[arg(long, value_name = "LEVEL")]
    threshold: Option<f64>,

    /// Image placements this tall or shorter are dropped
    #[arg(long = "min-height", value_name = "UNITS")]
    min_height: Option<f64>,

    /// JSON engine configuration; flags override its values
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the run report as JSON on stdout
    #[arg(long)]
    json: bool,
}

impl Cli {
    /// Configuration file (or defaults) with command-line overrides applied.
    fn engine_config(&self) -> Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::load(path)?,
            None => EngineConfig::default(),
        };
        if let Some(bbox) = self.bbox {
            config.remove_boxes = bbox == 1;
        }
        if let Some(highlight) = self.highlight {
            config.highlight_text = highlight == 1;
        }
        if let Some(threshold) = self.threshold {
            config.brightness_threshold = threshold;
        }
        if let Some(min_height) = self.min_height {
            config.min_placement_height = min_height;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(report) if report.has_failures() || report.cancelled => ExitCode::FAILURE,
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            let human = humanize_error(&err);
            error!(%err, "Run aborted");
            eprintln!("Error: {}", human.message);
            eprintln!("  {}", human.suggestion);
            match human.severity {
                Severity::Fatal => ExitCode::from(2),
                Severity::FileFailed | Severity::Skipped => ExitCode::FAILURE,
            }
        }
    }
}

fn run(cli: &Cli) -> Result<BatchReport> {
    let config = cli.engine_config()?;

    let input = match &cli.input {
        Some(path) => path.clone(),
        None => prompt_path("Input (File or Folder): ")?,
    };
    let output = match &cli.output {
        Some(path) => path.clone(),
        None => prompt_path("Output Folder: ")?,
    };

    info!(
        input = %input.display(),
        output = %output.display(),
        remove_boxes = config.remove_boxes,
        highlight = config.highlight_text,
        "Unredact starting"
    );

    let runner = BatchRunner::new(Unredactor::new(config));
    let report = runner.run(&input, &output, cli.name.as_deref())?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }
    Ok(report)
}

/// Read a path from stdin, tolerating quotes pasted from a file manager.
fn prompt_path(label: &str) -> Result<PathBuf> {
    let mut stdout = io::stdout();
    write!(stdout, "{}", label)?;
    stdout.flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let cleaned = line.trim().replace('"', "");
    if cleaned.is_empty() {
        return Err(UnredactError::Config(format!(
            "no path given for '{}'",
            label.trim_end_matches([':', ' '])
        )));
    }
    Ok(PathBuf::from(cleaned))
}

fn print_summary(report: &BatchReport) {
    for outcome in &report.outcomes {
        match &outcome.status {
            FileStatus::Written { output, report } => {
                println!(
                    "Saved {} ({} box(es) removed, {} image(s) kept, {} text span(s))",
                    output.display(),
                    report.removed_count(),
                    report.kept_count(),
                    report.text_span_count()
                );
                for page in &report.pages {
                    for removed in &page.images_removed {
                        println!(
                            "  page {}: removed {} at {}",
                            page.page_number, removed.resource, removed.rect
                        );
                    }
                    for warning in &page.warnings {
                        println!(
                            "  page {}: {}: {}",
                            page.page_number, warning.resource, warning.message
                        );
                    }
                }
            }
            FileStatus::Failed { error, hint } => {
                println!("Failed {}: {}", outcome.input.display(), error);
                println!("  {}", hint);
            }
        }
    }
    if report.cancelled {
        println!("Stopped early; remaining files were not processed.");
    }
}
