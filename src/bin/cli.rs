use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;
use thiserror::Error;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::EnvFilter;

use ramattra::options::OptionsError;
use ramattra::{CompileError, Options};

// ── CLI argument parsing ─────────────────────────────────────────

#[derive(Parser)]
#[command(name = "ramattra", about = "Compile Ramattra scripts to workshop rules", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Compiler options file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print errors as JSON objects
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the syntax tree as JSON
    Parse {
        /// Source file, or `-` for stdin
        file: PathBuf,
    },
    /// Print the analyzed IR as JSON
    Analyze {
        file: PathBuf,
        /// Skip constant folding
        #[arg(long)]
        no_optimize: bool,
    },
    /// Compile to workshop text
    Compile {
        file: PathBuf,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Skip constant folding
        #[arg(long)]
        no_optimize: bool,
    },
    /// Print the JSON Schema of the options file
    ConfigSchema,
}

// ── Errors ───────────────────────────────────────────────────────

#[derive(Debug, Error)]
enum CliError {
    #[error("I/O error on {path}: {source}")]
    Io { path: String, source: io::Error },
    #[error("Options error: {0}")]
    Options(#[from] OptionsError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// A compile error together with the source it points into.
    #[error("{}", .error.format_with_source(.text))]
    Compile { error: CompileError, text: String },
}

#[derive(Serialize)]
struct JsonError<'a> {
    kind: &'a str,
    message: &'a str,
    line: Option<usize>,
    column: Option<usize>,
}

impl CliError {
    fn io(path: &Path, source: io::Error) -> Self {
        CliError::Io {
            path: path.display().to_string(),
            source,
        }
    }

    fn report(&self, json: bool) {
        if !json {
            eprintln!("{self}");
            return;
        }
        let message = self.to_string();
        let report = match self {
            CliError::Compile { error, text } => {
                let (line, column) = error.line_col(text);
                JsonError {
                    kind: error.kind.label(),
                    message: &error.message,
                    line: Some(line),
                    column: Some(column),
                }
            }
            _ => JsonError {
                kind: "cli",
                message: &message,
                line: None,
                column: None,
            },
        };
        match serde_json::to_string(&report) {
            Ok(text) => eprintln!("{text}"),
            Err(_) => eprintln!("{self}"),
        }
    }
}

// ── Logging ──────────────────────────────────────────────────────

struct NoTimestamp;

impl FormatTime for NoTimestamp {
    fn format_time(&self, _w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        Ok(())
    }
}

/// Log to stderr when `RAMATTRA_LOG` is set, e.g. `RAMATTRA_LOG=ramattra=trace`.
fn init_tracing() {
    if let Ok(filter) = EnvFilter::try_from_env("RAMATTRA_LOG") {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_timer(NoTimestamp)
            .with_writer(io::stderr)
            .init();
    }
}

// ── Commands ─────────────────────────────────────────────────────

fn read_source(file: &Path) -> Result<String, CliError> {
    if file == Path::new("-") {
        let mut source = String::new();
        io::stdin()
            .read_to_string(&mut source)
            .map_err(|e| CliError::io(file, e))?;
        return Ok(source);
    }
    fs::read_to_string(file).map_err(|e| CliError::io(file, e))
}

fn compile_error(source: &str) -> impl FnOnce(CompileError) -> CliError + '_ {
    move |error| CliError::Compile {
        error,
        text: source.to_string(),
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let mut options = match &cli.config {
        Some(path) => Options::load(path)?,
        None => Options::default(),
    };

    match cli.command {
        Commands::Parse { file } => {
            let source = read_source(&file)?;
            let program = ramattra::parse(&source).map_err(compile_error(&source))?;
            println!("{}", serde_json::to_string_pretty(&program)?);
        }
        Commands::Analyze { file, no_optimize } => {
            let source = read_source(&file)?;
            let mut events =
                ramattra::analyze_with(&source, &options).map_err(compile_error(&source))?;
            if options.optimize && !no_optimize {
                events = ramattra::optimize(events);
            }
            println!("{}", serde_json::to_string_pretty(&events)?);
        }
        Commands::Compile { file, output, no_optimize } => {
            if no_optimize {
                options.optimize = false;
            }
            let source = read_source(&file)?;
            let text =
                ramattra::assemble_with(&source, &options).map_err(compile_error(&source))?;
            match output {
                Some(path) => fs::write(&path, text).map_err(|e| CliError::io(&path, e))?,
                None => print!("{text}"),
            }
        }
        Commands::ConfigSchema => {
            let schema = schemars::schema_for!(Options);
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
    }
    Ok(())
}

// ── Main ─────────────────────────────────────────────────────────

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    let json = cli.json;
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            e.report(json);
            ExitCode::FAILURE
        }
    }
}
