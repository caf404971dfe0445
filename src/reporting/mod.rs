//! Output reporters: HTML (shareable), JSON (machine), and terminal (human).
//!
//! All implement the [`Reporter`](crate::models::Reporter) trait. The HTML
//! reporter is the default and produces the standalone document that the
//! export actions copy and download.

use std::fs;
use std::io::Write;
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

use crate::config::ReportFormat;
use crate::models::Reporter;
use crate::RfpError;

pub mod html;
pub mod json;
pub mod terminal;

pub use html::HtmlReporter;
pub use json::JsonReporter;
pub use terminal::TerminalReporter;

/// Returns the reporter for a configured format.
pub fn reporter_for(format: ReportFormat) -> Box<dyn Reporter> {
    match format {
        ReportFormat::Html => Box::new(HtmlReporter),
        ReportFormat::Json => Box::new(JsonReporter),
        ReportFormat::Terminal => Box::new(TerminalReporter),
    }
}

/// Writes bytes to a file with restrictive permissions (0600 on Unix),
/// replacing any existing content.
pub(crate) fn write_to_file(path: &Path, data: &[u8]) -> Result<(), RfpError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    #[cfg(unix)]
    let file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path);

    #[cfg(not(unix))]
    let file = fs::File::create(path);

    let mut file = file?;
    file.write_all(data)?;
    Ok(())
}
