use std::path::{Path, PathBuf};
use std::{env, fs};

use serde::Deserialize;

use crate::RfpError;

// ─── Platform helpers ─────────────────────────────────────────────────────────

/// Returns the user's home directory from `$HOME`, with a `.` fallback.
fn home_dir() -> PathBuf {
    env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Returns the user-level config file path.
/// Respects `$XDG_CONFIG_HOME`; falls back to `~/.config`.
pub fn user_config_path() -> PathBuf {
    let config_home = env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"));
    config_home.join("rfp-report/config.toml")
}

/// Project-level config file, resolved against the working directory.
pub const PROJECT_CONFIG_FILE: &str = ".rfp-report.toml";

// ─── Public config types ──────────────────────────────────────────────────────

/// Top-level configuration container.
#[derive(Debug, Clone, Default)]
pub struct RfpConfig {
    pub report: ReportConfig,
    pub export: ExportConfig,
    pub drive: DriveConfig,
}

#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub format: ReportFormat, // default: Html
    pub verbosity: Verbosity, // default: Normal
    pub escape_html: bool,    // default: true
    pub output_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub download_dir: PathBuf, // default: ~/Downloads, or cwd when absent
    pub copy: bool,            // default: false
    pub download: bool,        // default: false
}

#[derive(Debug, Clone)]
pub struct DriveConfig {
    pub folder_id: String, // default: "root"
    pub api_base: String,
    pub upload_base: String,
    pub timeout_secs: u64, // default: 30
    /// OAuth bearer token. Read from `RFP_DRIVE_ACCESS_TOKEN` only, never from files.
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Html,
    Json,
    Terminal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}

/// CLI-provided values that override any config layer. Applied last.
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub format: Option<ReportFormat>,
    pub verbose: bool,
    pub quiet: bool,
    pub escape_html: Option<bool>,
    pub output: Option<PathBuf>,
    pub copy: bool,
    pub download: bool,
    pub download_dir: Option<PathBuf>,
}

// ─── Default implementations ──────────────────────────────────────────────────

impl Default for ReportConfig {
    fn default() -> Self {
        ReportConfig {
            format: ReportFormat::Html,
            verbosity: Verbosity::Normal,
            escape_html: true,
            output_path: None,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            download_dir: default_download_dir(&home_dir()),
            copy: false,
            download: false,
        }
    }
}

impl Default for DriveConfig {
    fn default() -> Self {
        DriveConfig {
            folder_id: "root".to_string(),
            api_base: "https://www.googleapis.com/drive/v3".to_string(),
            upload_base: "https://www.googleapis.com/upload/drive/v3".to_string(),
            timeout_secs: 30,
            access_token: None,
        }
    }
}

fn default_download_dir(home: &Path) -> PathBuf {
    let downloads = home.join("Downloads");
    if downloads.is_dir() {
        downloads
    } else {
        PathBuf::from(".")
    }
}

// ─── Config loading ───────────────────────────────────────────────────────────

impl RfpConfig {
    /// Load config with full layered resolution:
    /// built-in defaults → user config → project config → env vars
    ///
    /// CLI overrides are applied separately via `apply_overrides()`.
    pub fn load() -> Result<Self, RfpError> {
        let mut config = RfpConfig::default();

        let user_path = user_config_path();
        if user_path.exists() {
            log::debug!("loading user config {}", user_path.display());
            let toml_config = load_toml_file(&user_path)?;
            merge_toml(&mut config, toml_config)?;
        }

        let project_path = PathBuf::from(PROJECT_CONFIG_FILE);
        if project_path.exists() {
            log::debug!("loading project config {}", project_path.display());
            let toml_config = load_toml_file(&project_path)?;
            merge_toml(&mut config, toml_config)?;
        }

        apply_env_vars(&mut config);

        Ok(config)
    }

    /// Apply CLI-flag overrides (highest priority, called after `load()`).
    pub fn apply_overrides(&mut self, overrides: &CliOverrides) {
        if let Some(fmt) = overrides.format {
            self.report.format = fmt;
        }
        if overrides.verbose {
            self.report.verbosity = Verbosity::Verbose;
        }
        if overrides.quiet {
            self.report.verbosity = Verbosity::Quiet;
        }
        if let Some(escape) = overrides.escape_html {
            self.report.escape_html = escape;
        }
        if let Some(output) = &overrides.output {
            self.report.output_path = Some(output.clone());
        }
        if overrides.copy {
            self.export.copy = true;
        }
        if overrides.download {
            self.export.download = true;
        }
        if let Some(dir) = &overrides.download_dir {
            self.export.download = true;
            self.export.download_dir = dir.clone();
        }
    }
}

// ─── TOML deserialization structs ─────────────────────────────────────────────
// All fields are optional so that a partial file merges over the defaults.

#[derive(Debug, Deserialize, Default)]
struct TomlConfig {
    #[serde(default)]
    report: TomlReportConfig,
    #[serde(default)]
    export: TomlExportConfig,
    #[serde(default)]
    drive: TomlDriveConfig,
}

#[derive(Debug, Deserialize, Default)]
struct TomlReportConfig {
    format: Option<String>,
    verbosity: Option<String>,
    escape_html: Option<bool>,
    output_path: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlExportConfig {
    download_dir: Option<String>,
    copy: Option<bool>,
    download: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlDriveConfig {
    folder_id: Option<String>,
    api_base: Option<String>,
    upload_base: Option<String>,
    timeout_secs: Option<u64>,
}

// ─── TOML loading and merging ─────────────────────────────────────────────────

fn load_toml_file(path: &Path) -> Result<TomlConfig, RfpError> {
    let content = fs::read_to_string(path).map_err(|e| {
        RfpError::Config(format!("Cannot read config file {}: {}", path.display(), e))
    })?;
    toml::from_str(&content)
        .map_err(|e| RfpError::Config(format!("Malformed config file {}: {}", path.display(), e)))
}

fn merge_toml(config: &mut RfpConfig, toml: TomlConfig) -> Result<(), RfpError> {
    let r = &toml.report;
    if let Some(v) = &r.format {
        config.report.format = parse_format(v)?;
    }
    if let Some(v) = &r.verbosity {
        config.report.verbosity = parse_verbosity(v)?;
    }
    if let Some(v) = r.escape_html {
        config.report.escape_html = v;
    }
    if let Some(v) = &r.output_path {
        if !v.is_empty() {
            config.report.output_path = Some(tilde_expand(v));
        }
    }

    let e = &toml.export;
    if let Some(v) = &e.download_dir {
        if !v.is_empty() {
            config.export.download_dir = tilde_expand(v);
        }
    }
    if let Some(v) = e.copy {
        config.export.copy = v;
    }
    if let Some(v) = e.download {
        config.export.download = v;
    }

    let d = toml.drive;
    if let Some(v) = d.folder_id {
        if v.trim().is_empty() {
            return Err(RfpError::Config("drive.folder_id must not be empty".into()));
        }
        config.drive.folder_id = v;
    }
    if let Some(v) = d.api_base {
        config.drive.api_base = v.trim_end_matches('/').to_string();
    }
    if let Some(v) = d.upload_base {
        config.drive.upload_base = v.trim_end_matches('/').to_string();
    }
    if let Some(v) = d.timeout_secs {
        if v == 0 {
            return Err(RfpError::Config("drive.timeout_secs must be at least 1".into()));
        }
        config.drive.timeout_secs = v;
    }

    Ok(())
}

// ─── Environment variable overrides ──────────────────────────────────────────

fn apply_env_vars(config: &mut RfpConfig) {
    apply_env_from(config, |key| env::var(key).ok());
}

/// Applies the `RFP_*` layer using `lookup` to resolve each variable.
fn apply_env_from(config: &mut RfpConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("RFP_FORMAT") {
        match parse_format(&v) {
            Ok(fmt) => config.report.format = fmt,
            Err(e) => log::warn!("ignoring RFP_FORMAT: {e}"),
        }
    }
    if let Some(v) = lookup("RFP_ESCAPE_HTML") {
        match parse_bool(&v) {
            Some(b) => config.report.escape_html = b,
            None => log::warn!("ignoring RFP_ESCAPE_HTML={v:?}: expected true or false"),
        }
    }
    if let Some(v) = lookup("RFP_DOWNLOAD_DIR") {
        if !v.is_empty() {
            config.export.download_dir = tilde_expand(&v);
        }
    }
    if let Some(v) = lookup("RFP_DRIVE_FOLDER_ID") {
        if !v.trim().is_empty() {
            config.drive.folder_id = v;
        }
    }
    if let Some(v) = lookup("RFP_DRIVE_ACCESS_TOKEN") {
        if !v.trim().is_empty() {
            config.drive.access_token = Some(v.trim().to_string());
        }
    }
}

// ─── Helper functions ─────────────────────────────────────────────────────────

/// Expands a leading `~` to the user's home directory.
pub fn tilde_expand(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        home_dir().join(rest)
    } else if path == "~" {
        home_dir()
    } else {
        PathBuf::from(path)
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

pub fn parse_format(s: &str) -> Result<ReportFormat, RfpError> {
    match s.to_lowercase().as_str() {
        "html" => Ok(ReportFormat::Html),
        "json" => Ok(ReportFormat::Json),
        "terminal" => Ok(ReportFormat::Terminal),
        other => Err(RfpError::Config(format!(
            "Unknown format '{}': expected html, json, or terminal",
            other
        ))),
    }
}

fn parse_verbosity(s: &str) -> Result<Verbosity, RfpError> {
    match s.to_lowercase().as_str() {
        "quiet" => Ok(Verbosity::Quiet),
        "normal" => Ok(Verbosity::Normal),
        "verbose" => Ok(Verbosity::Verbose),
        other => Err(RfpError::Config(format!(
            "Unknown verbosity '{}': expected quiet, normal, or verbose",
            other
        ))),
    }
}

// ─── rfp init ─────────────────────────────────────────────────────────────────

/// Generate a commented default `config.toml` as a String.
pub fn generate_default_config() -> String {
    r#"# rfp-report configuration file
# All fields are optional. Uncomment and modify as needed.
# Values shown are the built-in defaults.

[report]
# format = "html"           # Output format: html | json | terminal
# verbosity = "normal"      # Terminal verbosity: quiet | normal | verbose
# escape_html = true        # Escape report text; false trusts it as raw HTML
# output_path = ""          # Write report to this file (empty = stdout)

[export]
# download_dir = "~/Downloads"  # Where rfp-analysis-<ms>.html files are saved
# copy = false              # Always copy the HTML report to the clipboard
# download = false          # Always save a timestamped copy to download_dir

[drive]
# folder_id = "root"        # Default parent folder for uploads
# timeout_secs = 30         # Per-request timeout
# The access token is read from RFP_DRIVE_ACCESS_TOKEN only.
"#
    .to_string()
}

/// Write the default config file to the user config path.
///
/// Returns the path written. Errors if the file already exists and `force` is false.
pub fn write_default_config(force: bool) -> Result<PathBuf, RfpError> {
    write_default_config_to(&user_config_path(), force)
}

fn write_default_config_to(path: &Path, force: bool) -> Result<PathBuf, RfpError> {
    if path.exists() && !force {
        return Err(RfpError::Config(format!(
            "Config file already exists at {}. Use --force to overwrite.",
            path.display()
        )));
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            RfpError::Config(format!(
                "Cannot create config directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }
    fs::write(path, generate_default_config()).map_err(|e| {
        RfpError::Config(format!("Cannot write config file {}: {}", path.display(), e))
    })?;
    Ok(path.to_path_buf())
}

// ─── Tests ────────────────────────────────────────────────────────────────────
