use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::debug;
use serde::Serialize;
use tcdecode_core::{
    BatchOptions, BatchReport, CAPTURE_EXTENSION, CaptureFiles, DecodeOptions, ExportOptions,
    FailurePolicy, FileOutcome, FileStatus, RowRange, inspect_capture, run_batch,
    summarize_csv_file,
};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (commit ",
    env!("TCDECODE_BUILD_COMMIT"),
    ", ",
    env!("TCDECODE_BUILD_DATE"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "tcdecode")]
#[command(version, long_version = LONG_VERSION)]
#[command(
    about = "Decoder for .TC measurement capture files.",
    long_about = None,
    after_help = "Examples:\n  tcdecode decode input -o output\n  tcdecode decode 'captures/*.TC' --fail-fast\n  tcdecode inspect input/run1.TC --pretty\n  tcdecode summary output/run1.csv --from 10 --to 200"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode capture files and export each one as CSV.
    Decode {
        /// Directory, single .TC file, or glob pattern
        #[arg(default_value = "input")]
        input: PathBuf,

        /// Directory receiving one CSV per capture
        #[arg(short = 'o', long, default_value = "output")]
        output_dir: PathBuf,

        /// Capture file extension used when scanning a directory
        #[arg(long, default_value = CAPTURE_EXTENSION)]
        ext: String,

        /// CSV field delimiter
        #[arg(long, default_value_t = ',')]
        delimiter: char,

        #[command(flatten)]
        decode: DecodeFlags,

        /// Stop at the first file that fails to decode
        #[arg(long)]
        fail_fast: bool,

        /// Write a JSON report of per-file outcomes
        #[arg(long)]
        report: Option<PathBuf>,

        /// Suppress non-error output
        #[arg(long)]
        quiet: bool,
    },
    /// Decode one capture and print its section layout and contents as JSON.
    Inspect {
        /// Path to a .TC file
        input: PathBuf,

        #[command(flatten)]
        decode: DecodeFlags,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Summarise numeric columns of an exported CSV over a row range.
    Summary {
        /// Path to an exported CSV file
        input: PathBuf,

        /// First row to include (0-based)
        #[arg(long, default_value_t = 0)]
        from: usize,

        /// Last row to include (0-based, inclusive; defaults to the last row)
        #[arg(long)]
        to: Option<usize>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },
}

#[derive(clap::Args, Debug)]
struct DecodeFlags {
    /// Fail on an incomplete trailing measurement record instead of dropping it
    #[arg(long)]
    strict_trailing: bool,

    /// Fail when a section marker is missing instead of treating it as empty
    #[arg(long)]
    require_sections: bool,
}

impl DecodeFlags {
    fn options(&self) -> DecodeOptions {
        DecodeOptions {
            strict_trailing: self.strict_trailing,
            require_all_sections: self.require_sections,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(matches!(cli.command, Commands::Decode { quiet: true, .. }));

    let result = match cli.command {
        Commands::Decode {
            input,
            output_dir,
            ext,
            delimiter,
            decode,
            fail_fast,
            report,
            quiet,
        } => cmd_decode(DecodeArgs {
            input,
            output_dir,
            ext,
            delimiter,
            decode: decode.options(),
            fail_fast,
            report,
            quiet,
        }),
        Commands::Inspect {
            input,
            decode,
            pretty,
        } => cmd_inspect(&input, &decode.options(), pretty),
        Commands::Summary {
            input,
            from,
            to,
            pretty,
        } => cmd_summary(&input, RowRange { start: from, end: to }, pretty),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

fn init_logging(quiet: bool) {
    let default_filter = if quiet { "error" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{err:#}"), None)
    }
}

struct DecodeArgs {
    input: PathBuf,
    output_dir: PathBuf,
    ext: String,
    delimiter: char,
    decode: DecodeOptions,
    fail_fast: bool,
    report: Option<PathBuf>,
    quiet: bool,
}

fn cmd_decode(args: DecodeArgs) -> Result<(), CliError> {
    let delimiter = parse_delimiter(args.delimiter)?;
    if args.output_dir.is_file() {
        return Err(CliError::new(
            format!("output path is a file: {}", args.output_dir.display()),
            Some("pass a directory to -o/--output-dir".to_string()),
        ));
    }

    let files = resolve_captures(&args.input, &args.ext)?;
    debug!("{} capture files to decode", files.len());

    let options = BatchOptions {
        decode: args.decode,
        export: ExportOptions { delimiter },
        policy: if args.fail_fast {
            FailurePolicy::Abort
        } else {
            FailurePolicy::Continue
        },
    };
    let quiet = args.quiet;
    let report = run_batch(files, &args.output_dir, &options, |outcome| {
        print_outcome(outcome, quiet)
    })
    .context("capture decoding stopped")?;

    if let Some(report_path) = args.report.as_ref() {
        write_json(report_path, &report)?;
        if !quiet {
            eprintln!("OK: report written -> {}", report_path.display());
        }
    }

    check_batch(&report)
}

fn print_outcome(outcome: &FileOutcome, quiet: bool) {
    match &outcome.status {
        FileStatus::Exported { output, rows, .. } => {
            if !quiet {
                eprintln!(
                    "OK: {} -> {} ({} rows)",
                    outcome.input.display(),
                    output.display(),
                    rows
                );
            }
        }
        FileStatus::Failed { error } => {
            eprintln!("error: {}: {}", outcome.input.display(), error);
        }
    }
}

fn check_batch(report: &BatchReport) -> Result<(), CliError> {
    let failed = report.failed();
    if failed == 0 {
        return Ok(());
    }
    let hint = if report.aborted {
        "batch stopped at the first failure; drop --fail-fast to continue past it"
    } else {
        "set RUST_LOG=debug for per-stage details"
    };
    Err(CliError::new(
        format!(
            "{} of {} capture files failed to decode",
            failed,
            report.files.len()
        ),
        Some(hint.to_string()),
    ))
}

fn cmd_inspect(input: &Path, options: &DecodeOptions, pretty: bool) -> Result<(), CliError> {
    validate_capture_file(input, CAPTURE_EXTENSION)?;
    let bytes = fs::read(input)
        .with_context(|| format!("Failed to read input file: {}", input.display()))?;
    let inspection = inspect_capture(&bytes, options)
        .with_context(|| format!("Failed to decode {}", input.display()))?;
    println!("{}", serialize_json(&inspection, pretty)?);
    Ok(())
}

fn cmd_summary(input: &Path, range: RowRange, pretty: bool) -> Result<(), CliError> {
    if !input.is_file() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("pass a CSV written by `tcdecode decode`".to_string()),
        ));
    }
    let summary = summarize_csv_file(input, range)
        .with_context(|| format!("Failed to summarise {}", input.display()))?;
    println!("{}", serialize_json(&summary, pretty)?);
    Ok(())
}

fn serialize_json<T: Serialize>(value: &T, pretty: bool) -> Result<String, CliError> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    json.context("JSON serialization failed").map_err(Into::into)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), CliError> {
    let json = serialize_json(value, true)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory: {}", parent.display())
            })?;
        }
    }
    fs::write(path, json).with_context(|| format!("Failed to write report: {}", path.display()))?;
    Ok(())
}

fn parse_delimiter(delimiter: char) -> Result<u8, CliError> {
    u8::try_from(delimiter)
        .ok()
        .filter(|byte| byte.is_ascii() && !matches!(*byte, b'"' | b'\n' | b'\r'))
        .ok_or_else(|| {
            CliError::new(
                format!("unsupported delimiter '{}'", delimiter),
                Some("use a single ASCII character such as ',' or ';'".to_string()),
            )
        })
}

fn resolve_captures(input: &Path, ext: &str) -> Result<CaptureFiles, CliError> {
    let pattern = input.to_string_lossy();
    let files = if is_glob_pattern(&pattern) {
        CaptureFiles::from_pattern(&pattern).map_err(|err| {
            CliError::new(
                format!("invalid input pattern '{}'", pattern),
                Some(err.to_string()),
            )
        })?
    } else if input.is_dir() {
        CaptureFiles::from_dir(input, ext)
            .with_context(|| format!("Failed to list input directory: {}", input.display()))?
    } else {
        validate_capture_file(input, ext)?;
        CaptureFiles::from_paths(vec![input.to_path_buf()])
    };

    if files.is_empty() {
        return Err(CliError::new(
            format!("no capture files found in '{}'", pattern),
            Some(format!(
                "expected files with the .{} extension; use --ext to change it",
                ext
            )),
        ));
    }
    Ok(files)
}

fn validate_capture_file(input: &Path, ext: &str) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input not found: {}", input.display()),
            Some(format!(
                "pass a .{} file, a directory, or a quoted glob pattern",
                ext
            )),
        ));
    }
    let matches = input
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext));
    if !input.is_file() || !matches {
        return Err(CliError::new(
            format!("unsupported input '{}'", input.display()),
            Some(format!("expected a .{} capture file", ext)),
        ));
    }
    Ok(())
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}
