//! Coach CLI - Command-line interface for the execution coach
//!
//! Commands:
//! - report: Analyze a week of activities and render the full report
//! - validate: Check entries or daily log files without scoring
//! - score: Print only the Execution Score and verdict
//! - config: Print the effective configuration

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use execution_coach::normalizer::RecordNormalizer;
use execution_coach::schema::{LogAdapter, WeekLog};
use execution_coach::types::RawEntry;
use execution_coach::{
    AnalysisOutcome, AuditError, CliOverrides, EngineConfig, ExecutionEngine, ReportFormat,
    ReportRenderer, WeeklyAnalysis, COACH_VERSION,
};
use tracing_subscriber::EnvFilter;

/// Coach - execution-vs-consumption audit for weekly activity logs
#[derive(Parser)]
#[command(name = "coach")]
#[command(version = COACH_VERSION)]
#[command(about = "Score a week of logged activities by what they actually produced", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a week and render the report
    Report {
        #[command(flatten)]
        input: InputArgs,

        /// Report format
        #[arg(long, default_value = "markdown")]
        format: ReportFormat,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        #[command(flatten)]
        engine: EngineArgs,
    },

    /// Validate entries or daily logs without scoring
    Validate {
        #[command(flatten)]
        input: InputArgs,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print only the Execution Score and verdict
    Score {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        engine: EngineArgs,
    },

    /// Print the effective configuration
    Config {
        /// TOML configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON instead of TOML
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Input path: a file, a directory of daily logs, or - for stdin
    #[arg(short, long)]
    input: PathBuf,

    /// Input format
    #[arg(long, default_value = "json")]
    input_format: InputFormat,
}

#[derive(Args)]
struct EngineArgs {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Minutes after which a research session counts as idle
    #[arg(long)]
    idle_threshold: Option<u32>,

    /// Lowest score that is still approved
    #[arg(long)]
    approved_floor: Option<f64>,

    /// Lowest score that is still at risk
    #[arg(long)]
    at_risk_floor: Option<f64>,

    /// Consumption cap quoted in the mandatory rules (0-1)
    #[arg(long)]
    max_consumption: Option<f64>,
}

impl EngineArgs {
    fn engine(&self) -> Result<ExecutionEngine, CoachCliError> {
        let overrides = CliOverrides {
            idle_threshold_minutes: self.idle_threshold,
            approved_score_floor: self.approved_floor,
            at_risk_score_floor: self.at_risk_floor,
            max_consumption_ratio: self.max_consumption,
        };
        let config = EngineConfig::load(self.config.as_deref(), Some(&overrides))?;
        Ok(ExecutionEngine::new(config)?)
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum InputFormat {
    /// JSON array of entries
    Json,
    /// Newline-delimited JSON (one entry per line)
    Ndjson,
    /// Daily log file or a directory of daily log files
    Logs,
}

/// Parsed input, before analysis
enum LoadedInput {
    Entries(Vec<RawEntry>),
    Week(WeekLog),
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("execution_coach=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), CoachCliError> {
    match cli.command {
        Commands::Report {
            input,
            format,
            output,
            engine,
        } => cmd_report(&input, format, &output, &engine),
        Commands::Validate { input, json } => cmd_validate(&input, json),
        Commands::Score { input, engine } => cmd_score(&input, &engine),
        Commands::Config { config, json } => cmd_config(config.as_deref(), json),
    }
}

fn cmd_report(
    input: &InputArgs,
    format: ReportFormat,
    output: &Path,
    engine_args: &EngineArgs,
) -> Result<(), CoachCliError> {
    let engine = engine_args.engine()?;
    let analysis = analyze(&engine, load_input(input)?)?;
    let document = ReportRenderer::render(&analysis, format)?;

    if output.to_string_lossy() == "-" {
        println!("{}", document.trim_end());
    } else {
        fs::write(output, document)?;
    }
    Ok(())
}

fn cmd_score(input: &InputArgs, engine_args: &EngineArgs) -> Result<(), CoachCliError> {
    let engine = engine_args.engine()?;
    let analysis = analyze(&engine, load_input(input)?)?;

    match &analysis.outcome {
        AnalysisOutcome::Scored { aggregate, plan, .. } => {
            println!(
                "Execution Score: {:.1}/100 ({})",
                aggregate.execution_score,
                plan.verdict.label()
            );
            Ok(())
        }
        AnalysisOutcome::InsufficientData { reason } => {
            Err(CoachCliError::InsufficientData(reason.clone()))
        }
    }
}

fn cmd_validate(input: &InputArgs, json: bool) -> Result<(), CoachCliError> {
    let mut errors = Vec::new();

    let entries = match load_input(input)? {
        LoadedInput::Entries(entries) => entries,
        LoadedInput::Week(week) => {
            for issue in week.rejected_files() {
                errors.push(ValidationErrorDetail {
                    item: issue.path.display().to_string(),
                    error: issue.error.clone(),
                });
            }
            week.to_entries()
        }
    };

    for (index, entry) in entries.iter().enumerate() {
        if let Err(e) = RecordNormalizer::normalize(index, entry) {
            errors.push(ValidationErrorDetail {
                item: format!("entry {}", index + 1),
                error: e.to_string(),
            });
        }
    }

    let report = ValidationReport {
        total_entries: entries.len(),
        invalid_items: errors.len(),
        errors,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total entries:  {}", report.total_entries);
        println!("Invalid items:  {}", report.invalid_items);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!("  - {}: {}", err.item, err.error);
            }
        }
    }

    if report.invalid_items > 0 {
        Err(CoachCliError::ValidationFailed(report.invalid_items))
    } else {
        Ok(())
    }
}

fn cmd_config(path: Option<&Path>, json: bool) -> Result<(), CoachCliError> {
    let config = EngineConfig::load(path, None)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        let rendered = toml::to_string_pretty(&config)
            .map_err(|e| CoachCliError::Audit(AuditError::RenderError(e.to_string())))?;
        print!("{rendered}");
    }
    Ok(())
}

// Helper functions

fn analyze(engine: &ExecutionEngine, input: LoadedInput) -> Result<WeeklyAnalysis, CoachCliError> {
    match input {
        LoadedInput::Entries(entries) => Ok(engine.analyze(&entries)),
        LoadedInput::Week(week) => Ok(engine.analyze_week(&week)),
    }
}

fn load_input(args: &InputArgs) -> Result<LoadedInput, CoachCliError> {
    let path = args.input.as_path();
    let from_stdin = path.to_string_lossy() == "-";

    if let InputFormat::Logs = args.input_format {
        if !from_stdin {
            let week = if path.is_dir() {
                LogAdapter::load_dir(path)?
            } else {
                LogAdapter::load_file(path)?
            };
            return Ok(LoadedInput::Week(week));
        }
    }

    let data = if from_stdin {
        read_stdin()?
    } else {
        fs::read_to_string(path)?
    };

    let loaded = match args.input_format {
        InputFormat::Json => LoadedInput::Entries(LogAdapter::parse_array(&data)?),
        InputFormat::Ndjson => LoadedInput::Entries(LogAdapter::parse_ndjson(&data)?),
        InputFormat::Logs => LoadedInput::Week(LogAdapter::daily_log_week(&data, path)?),
    };
    Ok(loaded)
}

fn read_stdin() -> Result<String, CoachCliError> {
    if atty::is(atty::Stream::Stdin) {
        return Err(CoachCliError::InteractiveStdin);
    }
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    Ok(buffer)
}

// Error types

#[derive(Debug)]
enum CoachCliError {
    Io(io::Error),
    Audit(AuditError),
    Json(serde_json::Error),
    InsufficientData(String),
    ValidationFailed(usize),
    InteractiveStdin,
}

impl From<io::Error> for CoachCliError {
    fn from(e: io::Error) -> Self {
        CoachCliError::Io(e)
    }
}

impl From<AuditError> for CoachCliError {
    fn from(e: AuditError) -> Self {
        CoachCliError::Audit(e)
    }
}

impl From<serde_json::Error> for CoachCliError {
    fn from(e: serde_json::Error) -> Self {
        CoachCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<CoachCliError> for CliError {
    fn from(e: CoachCliError) -> Self {
        match e {
            CoachCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            CoachCliError::Audit(e) => {
                let (code, hint) = match &e {
                    AuditError::ConfigurationError(_) => {
                        ("CONFIG_ERROR", "Run 'coach config' to inspect the effective configuration")
                    }
                    AuditError::InvalidLog(_) => {
                        ("INVALID_LOG", "Run 'coach validate --input-format logs' for details")
                    }
                    AuditError::JsonError(_) => ("JSON_ERROR", "Check JSON syntax"),
                    AuditError::RenderError(_) => ("RENDER_ERROR", "Retry with --format json"),
                    _ => ("PARSE_ERROR", "Ensure input matches the entry or daily log format"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            CoachCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            CoachCliError::InsufficientData(reason) => CliError {
                code: "INSUFFICIENT_DATA".to_string(),
                message: format!("No Execution Score: {}", reason),
                hint: Some("Run 'coach validate' to see rejected entries".to_string()),
            },
            CoachCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} items failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            CoachCliError::InteractiveStdin => CliError {
                code: "INTERACTIVE_STDIN".to_string(),
                message: "Refusing to read activities from an interactive terminal".to_string(),
                hint: Some("Pipe a file into stdin or pass --input <path>".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_entries: usize,
    invalid_items: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    item: String,
    error: String,
}
