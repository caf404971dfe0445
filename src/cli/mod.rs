//! CLI argument parsing and command orchestration.
//!
//! This module is the entry point for the `rfp` binary. It parses command-line
//! arguments via `clap`, loads the layered configuration, produces or loads
//! an analysis result, invokes the configured reporter, and runs the export
//! actions.
//!
//! # Exit codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0    | Success |
//! | 1    | Report produced, but an export action (copy/download) failed |
//! | 2    | Error (bad input, config parse failure, Drive failure, etc.) |

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Local;
use clap::{Parser, Subcommand};

use crate::analysis::{AnalysisBackend, AnalysisRequest, SampleBackend};
use crate::config::{self, CliOverrides, RfpConfig};
use crate::drive::{DriveSession, ReqwestTransport};
use crate::export::{download_filename, ReportExporter, SystemClipboard};
use crate::models::{AnalysisResult, Clock, CustomerContext, FixedClock};
use crate::reporting::html::{self, RenderOptions};
use crate::reporting::reporter_for;
use crate::RfpError;

// ---------------------------------------------------------------------------
// Exit codes
// ---------------------------------------------------------------------------

const EXIT_OK: i32 = 0;
const EXIT_EXPORT_FAILED: i32 = 1;
const EXIT_ERROR: i32 = 2;

// ---------------------------------------------------------------------------
// Clap argument definitions
// ---------------------------------------------------------------------------

/// rfp - Render and export RFP competitive analysis reports
#[derive(Parser)]
#[command(
    name = "rfp",
    version,
    about = "Render and export RFP competitive analysis reports"
)]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render an analysis result JSON file
    Render {
        /// Analysis result JSON file
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Analyze an RFP document and render the result
    Analyze(AnalyzeArgs),
    /// Google Drive operations
    Drive {
        #[command(subcommand)]
        command: DriveCommand,
    },
    /// Create a default config file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Parser, Clone)]
struct OutputArgs {
    /// Output format [html|json|terminal]
    #[arg(short, long, value_name = "FORMAT")]
    format: Option<String>,

    /// Include full response text in terminal output
    #[arg(short, long)]
    verbose: bool,

    /// Show only headline counts in terminal output
    #[arg(short, long)]
    quiet: bool,

    /// Write report to file instead of stdout
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Copy the HTML report to the clipboard
    #[arg(long)]
    copy: bool,

    /// Save a timestamped HTML copy (to DIR, or the configured download dir)
    #[arg(long, value_name = "DIR", num_args = 0..=1)]
    download: Option<Option<PathBuf>>,

    /// Interpolate report text as raw HTML (trusted content only)
    #[arg(long)]
    trusted_html: bool,
}

#[derive(Parser, Clone)]
struct AnalyzeArgs {
    /// RFP document (.pdf, .xlsx, .xls, .pptx, .ppt)
    #[arg(long, value_name = "PATH")]
    document: PathBuf,

    /// Customer's current ERP system
    #[arg(long, value_name = "NAME")]
    erp: String,

    /// Customer industry
    #[arg(long)]
    industry: String,

    /// Customer region
    #[arg(long)]
    region: String,

    /// Known pain points
    #[arg(long, default_value = "")]
    pain_points: String,

    /// Company size
    #[arg(long, default_value = "")]
    company_size: String,

    /// Any additional context
    #[arg(long = "context", default_value = "")]
    additional_context: String,

    /// Write the raw analysis JSON here as well
    #[arg(long, value_name = "PATH")]
    save_json: Option<PathBuf>,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Subcommand, Clone)]
enum DriveCommand {
    /// Show the account the access token belongs to
    Whoami,
    /// Render an analysis result and save the HTML report to Drive
    Save {
        /// Analysis result JSON file
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Drive file name [default: rfp-analysis-<ms>.html]
        #[arg(long)]
        name: Option<String>,

        /// Interpolate report text as raw HTML (trusted content only)
        #[arg(long)]
        trusted_html: bool,
    },
    /// Upload a local file into the configured folder
    Upload {
        #[arg(value_name = "FILE")]
        path: PathBuf,
    },
    /// Create a folder
    Mkdir {
        name: String,

        /// Parent folder id [default: configured folder]
        #[arg(long)]
        parent: Option<String>,
    },
}

impl OutputArgs {
    /// Convert parsed CLI arguments into a `CliOverrides` struct.
    fn to_overrides(&self) -> Result<CliOverrides, String> {
        let format = match &self.format {
            Some(f) => Some(config::parse_format(f).map_err(|e| e.to_string())?),
            None => None,
        };

        let (download, download_dir) = match &self.download {
            Some(Some(dir)) => (true, Some(dir.clone())),
            Some(None) => (true, None),
            None => (false, None),
        };

        Ok(CliOverrides {
            format,
            verbose: self.verbose,
            quiet: self.quiet,
            escape_html: if self.trusted_html { Some(false) } else { None },
            output: self.output.clone(),
            copy: self.copy,
            download,
            download_dir,
        })
    }
}

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Parse CLI arguments and run the appropriate command. Returns an exit code.
pub fn run() -> i32 {
    let cli = Cli::parse();
    init_logging(cli.debug);

    match cli.command {
        Command::Init { force } => run_init(force),
        Command::Render { input, output } => run_render(&input, &output),
        Command::Analyze(args) => run_analyze(args),
        Command::Drive { command } => run_drive(command),
    }
}

fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .try_init();
}

// ---------------------------------------------------------------------------
// Init command
// ---------------------------------------------------------------------------

fn run_init(force: bool) -> i32 {
    match config::write_default_config(force) {
        Ok(path) => {
            println!("Config written to {}", path.display());
            EXIT_OK
        }
        Err(e) => fail(e),
    }
}

// ---------------------------------------------------------------------------
// Render / analyze
// ---------------------------------------------------------------------------

fn run_render(input: &Path, args: &OutputArgs) -> i32 {
    let config = match load_config(args) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    let result = match AnalysisResult::from_path(input) {
        Ok(r) => r,
        Err(e) => return fail(e),
    };
    emit(&result, &config)
}

fn run_analyze(args: AnalyzeArgs) -> i32 {
    let config = match load_config(&args.output) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };

    let context = CustomerContext {
        current_erp: args.erp,
        industry: args.industry,
        region: args.region,
        pain_points: args.pain_points,
        company_size: args.company_size,
        additional_context: args.additional_context,
    };

    let result = match analyze(&args.document, context, &SampleBackend) {
        Ok(r) => r,
        Err(e) => return fail(e),
    };
    eprintln!("\u{2713} Analysis complete: your RFP response pack has been generated");

    if let Some(path) = &args.save_json {
        let saved = serde_json::to_string_pretty(&result)
            .map_err(|e| RfpError::Report(e.to_string()))
            .and_then(|json| crate::reporting::write_to_file(path, json.as_bytes()));
        if let Err(e) = saved {
            return fail(e);
        }
    }

    emit(&result, &config)
}

fn analyze(
    document: &Path,
    context: CustomerContext,
    backend: &dyn AnalysisBackend,
) -> Result<AnalysisResult, RfpError> {
    let request = AnalysisRequest::from_path(document, context)?;
    log::debug!("running {} backend", backend.name());
    Ok(backend.analyze(&request)?)
}

fn load_config(args: &OutputArgs) -> Result<RfpConfig, RfpError> {
    let overrides = args.to_overrides().map_err(RfpError::Config)?;
    let mut config = RfpConfig::load()?;
    config.apply_overrides(&overrides);
    Ok(config)
}

/// Reports the result, then runs the requested export actions.
fn emit(result: &AnalysisResult, config: &RfpConfig) -> i32 {
    // One instant for the report and its exports so dates and file names agree.
    let clock = FixedClock(Local::now());

    let reporter = reporter_for(config.report.format);
    log::debug!("reporting with {} reporter", reporter.format_name());
    if let Err(e) = reporter.report(result, &config.report, &clock) {
        return fail(e);
    }

    if !config.export.copy && !config.export.download {
        return EXIT_OK;
    }

    let html = html::render(result, &RenderOptions::from(&config.report), clock.now());
    let exporter = ReportExporter::new(html);
    let mut code = EXIT_OK;

    if config.export.copy {
        let notice = exporter.copy(&mut SystemClipboard::new());
        eprintln!("{notice}");
        if !notice.is_success() {
            code = EXIT_EXPORT_FAILED;
        }
    }
    if config.export.download {
        let notice = exporter.download(&config.export.download_dir, &clock);
        eprintln!("{notice}");
        if !notice.is_success() {
            code = EXIT_EXPORT_FAILED;
        }
    }
    code
}

// ---------------------------------------------------------------------------
// Drive
// ---------------------------------------------------------------------------

fn run_drive(command: DriveCommand) -> i32 {
    match drive_command(command) {
        Ok(()) => EXIT_OK,
        Err(e) => fail(e),
    }
}

fn drive_command(command: DriveCommand) -> Result<(), RfpError> {
    let config = RfpConfig::load()?;
    let transport = ReqwestTransport::new(Duration::from_secs(config.drive.timeout_secs))?;
    let session = DriveSession::initialize(&config.drive, transport)?;

    match command {
        DriveCommand::Whoami => {
            let p = session.profile();
            println!("{} <{}> (id {})", p.display_name, p.email, p.id);
        }
        DriveCommand::Save {
            input,
            name,
            trusted_html,
        } => {
            let result = AnalysisResult::from_path(&input)?;
            let options = RenderOptions {
                escape_html: config.report.escape_html && !trusted_html,
            };
            let now = Local::now();
            let html = html::render(&result, &options, now);
            let name = name.unwrap_or_else(|| download_filename(now.timestamp_millis()));
            let id = session.save_text_file(&html, &name, "text/html")?;
            eprintln!("\u{2713} Report saved to Drive: {name}");
            println!("{id}");
        }
        DriveCommand::Upload { path } => {
            let id = session.upload_file(&path)?;
            eprintln!("\u{2713} Uploaded {}", path.display());
            println!("{id}");
        }
        DriveCommand::Mkdir { name, parent } => {
            let id = session.create_folder(&name, parent.as_deref())?;
            println!("{id}");
        }
    }

    session.sign_out();
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn fail(e: RfpError) -> i32 {
    eprintln!("rfp error: {e}");
    EXIT_ERROR
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
