use std::env;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use pipecsv_core::parser::{SchemaError, TableReader};
use pipecsv_core::{
    default_output_dir, run_batch, BatchHost, BatchReport, BatchState, FileSummary,
    MismatchDecision,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Summarize pipeline inspection CSVs per operator", long_about = None)]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate, aggregate and write a summary CSV for each input file
    Process(ProcessArgs),
    /// Only check that each file carries the expected import headings
    Check(CheckArgs),
}

#[derive(Args, Debug)]
struct ProcessArgs {
    /// Input CSV files, processed in the order given
    #[arg(required = true)]
    files: Vec<PathBuf>,
    /// Output directory (defaults to PIPECSV_OUTPUT_DIR, then the last input's directory)
    #[arg(long)]
    out_dir: Option<PathBuf>,
    /// What to do with a file whose headings do not match (defaults to PIPECSV_ON_MISMATCH, then ask)
    #[arg(long, value_enum)]
    on_mismatch: Option<OnMismatch>,
    /// Write the batch report as JSON to this path
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct CheckArgs {
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OnMismatch {
    /// Prompt on the terminal: yes drops the file, no or cancel aborts
    Ask,
    /// Drop the file and keep going
    Skip,
    /// Stop the batch
    Abort,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match cli.command {
        Command::Process(args) => handle_process(args),
        Command::Check(args) => handle_check(args),
    }
}

fn init_tracing(json: bool) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn handle_process(args: ProcessArgs) -> Result<()> {
    dotenvy::dotenv().ok();

    let output_dir = match args.out_dir {
        Some(dir) => dir,
        None => env::var("PIPECSV_OUTPUT_DIR")
            .map(PathBuf::from)
            .ok()
            .or_else(|| default_output_dir(&args.files))
            .context("could not determine an output directory; pass --out-dir")?,
    };
    let policy = match args.on_mismatch {
        Some(policy) => policy,
        None => match env::var("PIPECSV_ON_MISMATCH") {
            Ok(value) => OnMismatch::from_str(&value, true)
                .map_err(|err| anyhow::anyhow!("invalid PIPECSV_ON_MISMATCH: {err}"))?,
            Err(_) => OnMismatch::Ask,
        },
    };

    fs::create_dir_all(&output_dir)
        .with_context(|| format!("failed to create output directory {}", output_dir.display()))?;
    info!(output_dir = %output_dir.display(), files = args.files.len(), ?policy, "starting batch");

    let state = BatchState::new(output_dir).with_files(args.files);
    let mut host = TerminalHost { policy };
    let report = run_batch(state, &mut host)?;

    if let Some(path) = args.report {
        write_report(&report, &path)?;
    }

    Ok(())
}

fn write_report(report: &BatchReport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("failed to encode batch report")?;
    fs::write(path, json)
        .with_context(|| format!("failed to write batch report {}", path.display()))
}

fn handle_check(args: CheckArgs) -> Result<()> {
    let failures = check_files(&args.files, &mut io::stdout().lock())?;
    if failures > 0 {
        bail!("{failures} of {} file(s) have unexpected headings", args.files.len());
    }
    Ok(())
}

/// Writes one verdict per file to `out` and returns how many mismatched.
fn check_files<W: Write>(files: &[PathBuf], out: &mut W) -> Result<usize> {
    let mut failures = 0;
    for path in files {
        let reader = TableReader::open(path)?;
        match reader.validate() {
            Ok(()) => writeln!(out, "ok       {}", path.display())?,
            Err(err) => {
                failures += 1;
                writeln!(out, "mismatch {}", path.display())?;
                if !err.missing.is_empty() {
                    writeln!(out, "  missing:    {}", err.missing.join(", "))?;
                }
                if !err.unexpected.is_empty() {
                    writeln!(out, "  unexpected: {}", err.unexpected.join(", "))?;
                }
            }
        }
    }
    Ok(failures)
}

/// Terminal stand-in for the batch's human operator.
struct TerminalHost {
    policy: OnMismatch,
}

impl BatchHost for TerminalHost {
    fn resolve_mismatch(&mut self, error: &SchemaError) -> MismatchDecision {
        match self.policy {
            OnMismatch::Skip => MismatchDecision::DropAndContinue,
            OnMismatch::Abort => MismatchDecision::Abort,
            OnMismatch::Ask => ask(error, &mut io::stdin().lock(), &mut io::stderr()),
        }
    }

    fn file_processed(&mut self, summary: &FileSummary) {
        println!(
            "{} -> {} ({} operators)",
            summary.input.display(),
            summary.output.display(),
            summary.operators_written
        );
    }

    fn batch_complete(&mut self, report: &BatchReport) {
        if report.aborted {
            println!("Batch aborted after {} file(s)", report.processed.len());
        } else {
            println!("Calculations completed");
        }
    }
}

/// Reads answers from `input` until one is recognised. EOF counts as cancel.
fn ask<R, W>(error: &SchemaError, input: &mut R, output: &mut W) -> MismatchDecision
where
    R: BufRead,
    W: Write,
{
    let _ = writeln!(output, "{}", error.prompt());

    loop {
        let _ = write!(output, "[y]es / [n]o / [c]ancel: ");
        let _ = output.flush();

        let mut line = String::new();
        match input.read_line(&mut line) {
            Ok(0) | Err(_) => {
                warn!("no answer on stdin; aborting batch");
                return MismatchDecision::Abort;
            }
            Ok(_) => {}
        }

        match line.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => return MismatchDecision::DropAndContinue,
            "n" | "no" | "c" | "cancel" => return MismatchDecision::Abort,
            _ => continue,
        }
    }
}
