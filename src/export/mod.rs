//! Export actions over a rendered report: copy to clipboard and download.
//!
//! Both actions report their outcome as a [`Notice`] instead of failing the
//! caller. [`ReportExporter`] holds one in-flight guard per action so a second
//! trigger while the first is still running is refused rather than doubled.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;

use crate::models::Clock;

pub mod clipboard;
pub mod download;

pub use clipboard::{copy_to_clipboard, ClipboardSink, SystemClipboard};
pub use download::{download, download_filename};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("clipboard unavailable: {0}")]
    ClipboardUnavailable(String),

    #[error("clipboard write failed: {0}")]
    ClipboardWrite(String),

    #[error("{0} already in progress")]
    InProgress(ExportAction),

    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Notice
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Failure,
}

/// User-visible outcome of an export action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub description: String,
}

impl Notice {
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Notice {
            kind: NoticeKind::Success,
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn failure(title: impl Into<String>, description: impl Into<String>) -> Self {
        Notice {
            kind: NoticeKind::Failure,
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.kind == NoticeKind::Success
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = match self.kind {
            NoticeKind::Success => '\u{2713}',
            NoticeKind::Failure => '\u{2717}',
        };
        write!(f, "{mark} {}: {}", self.title, self.description)
    }
}

// ---------------------------------------------------------------------------
// In-flight guard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportAction {
    Copy,
    Download,
}

impl fmt::Display for ExportAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportAction::Copy => f.write_str("copy"),
            ExportAction::Download => f.write_str("download"),
        }
    }
}

/// Marks one action on one artifact as running.
#[derive(Debug)]
pub struct ActionGuard {
    action: ExportAction,
    in_flight: AtomicBool,
}

/// Held while an action runs; releases the guard on drop.
#[derive(Debug)]
pub struct InFlight<'a> {
    guard: &'a ActionGuard,
}

impl ActionGuard {
    pub fn new(action: ExportAction) -> Self {
        ActionGuard {
            action,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Claims the guard, or fails when a previous invocation is outstanding.
    pub fn try_begin(&self) -> Result<InFlight<'_>, ExportError> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| InFlight { guard: self })
            .map_err(|_| ExportError::InProgress(self.action))
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.guard.in_flight.store(false, Ordering::Release);
    }
}

// ---------------------------------------------------------------------------
// ReportExporter
// ---------------------------------------------------------------------------

/// Export actions bound to one rendered HTML document.
pub struct ReportExporter {
    html: String,
    copy_guard: ActionGuard,
    download_guard: ActionGuard,
}

impl ReportExporter {
    pub fn new(html: String) -> Self {
        ReportExporter {
            html,
            copy_guard: ActionGuard::new(ExportAction::Copy),
            download_guard: ActionGuard::new(ExportAction::Download),
        }
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn guard(&self, action: ExportAction) -> &ActionGuard {
        match action {
            ExportAction::Copy => &self.copy_guard,
            ExportAction::Download => &self.download_guard,
        }
    }

    /// Copies the HTML source to `sink`.
    pub fn copy(&self, sink: &mut dyn ClipboardSink) -> Notice {
        let _token = match self.copy_guard.try_begin() {
            Ok(t) => t,
            Err(e) => return Notice::failure("Copy failed", e.to_string()),
        };
        copy_to_clipboard(sink, &self.html)
    }

    /// Saves the HTML as `rfp-analysis-<ms>.html` in `dir`.
    pub fn download(&self, dir: &Path, clock: &dyn Clock) -> Notice {
        let _token = match self.download_guard.try_begin() {
            Ok(t) => t,
            Err(e) => return Notice::failure("Download failed", e.to_string()),
        };
        match download(&self.html, dir, clock.now().timestamp_millis()) {
            Ok(path) => Notice::success(
                "HTML Downloaded",
                format!("Complete HTML report saved to {}", path.display()),
            ),
            Err(e) => {
                log::warn!("download failed: {e}");
                Notice::failure("Download failed", e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FixedClock;
    use chrono::{Local, TimeZone};

    struct MemoryClipboard(Option<String>);

    impl ClipboardSink for MemoryClipboard {
        fn set_text(&mut self, text: &str) -> Result<(), ExportError> {
            self.0 = Some(text.to_string());
            Ok(())
        }
    }

    fn clock() -> FixedClock {
        FixedClock(Local.with_ymd_and_hms(2024, 3, 7, 9, 0, 0).unwrap())
    }

    #[test]
    fn guard_refuses_second_claim_until_released() {
        let guard = ActionGuard::new(ExportAction::Download);
        let first = guard.try_begin().unwrap();
        assert!(guard.is_busy());
        let err = guard.try_begin().unwrap_err();
        assert_eq!(err.to_string(), "download already in progress");
        drop(first);
        assert!(!guard.is_busy());
        assert!(guard.try_begin().is_ok());
    }

    #[test]
    fn download_refused_while_outstanding() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = ReportExporter::new("<html></html>".into());
        let _held = exporter.guard(ExportAction::Download).try_begin().unwrap();

        let notice = exporter.download(dir.path(), &clock());
        assert!(!notice.is_success());
        assert!(notice.description.contains("already in progress"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn download_success_releases_guard() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = ReportExporter::new("<html></html>".into());
        let notice = exporter.download(dir.path(), &clock());
        assert!(notice.is_success(), "{notice}");
        assert!(!exporter.guard(ExportAction::Download).is_busy());

        let expected = download_filename(clock().0.timestamp_millis());
        assert!(dir.path().join(expected).exists());
    }

    #[test]
    fn copy_writes_html_source() {
        let exporter = ReportExporter::new("<p>report</p>".into());
        let mut sink = MemoryClipboard(None);
        let notice = exporter.copy(&mut sink);
        assert!(notice.is_success());
        assert_eq!(sink.0.as_deref(), Some("<p>report</p>"));
        assert!(!exporter.guard(ExportAction::Copy).is_busy());
    }

    #[test]
    fn notice_display_marks_outcome() {
        assert_eq!(Notice::success("Copied", "ok").to_string(), "\u{2713} Copied: ok");
        assert_eq!(Notice::failure("Copy failed", "no").to_string(), "\u{2717} Copy failed: no");
    }
}
