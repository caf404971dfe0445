//! File download export.

use std::fs;
use std::io::{self, Write};
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use super::ExportError;

/// `rfp-analysis-<unix-ms>.html`
pub fn download_filename(unix_ms: i64) -> String {
    format!("rfp-analysis-{unix_ms}.html")
}

/// Saves `html` into `dir` under a timestamped name and returns the path.
///
/// The file is created exclusively, so a name collision fails instead of
/// overwriting an earlier download. The handle is closed before returning.
pub fn download(html: &str, dir: &Path, unix_ms: i64) -> Result<PathBuf, ExportError> {
    let path = dir.join(download_filename(unix_ms));
    let wrap = |source| ExportError::Write {
        path: path.clone(),
        source,
    };

    fs::create_dir_all(dir).map_err(wrap)?;

    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);

    let file = options.open(&path).map_err(wrap)?;
    fill(file, &path, html.as_bytes()).map_err(wrap)?;

    log::debug!("downloaded report to {}", path.display());
    Ok(path)
}

/// Writes `data` into the newly created file at `path`. A partial file is
/// removed when the write fails.
fn fill(mut file: impl Write, path: &Path, data: &[u8]) -> io::Result<()> {
    let written = file.write_all(data).and_then(|()| file.flush());
    drop(file);
    if written.is_err() {
        if let Err(e) = fs::remove_file(path) {
            log::warn!("could not remove partial download {}: {e}", path.display());
        }
    }
    written
}
