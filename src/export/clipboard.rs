//! Clipboard export.

use super::{ExportError, Notice};

/// Destination for copied text. The system clipboard in production.
pub trait ClipboardSink {
    fn set_text(&mut self, text: &str) -> Result<(), ExportError>;
}

/// The platform clipboard via `arboard`.
///
/// The handle is opened on first use so that constructing it never fails.
/// On X11 the copied text is served by this process; it stays available
/// after exit only when a clipboard manager takes ownership.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClipboardSink for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ExportError> {
        if self.inner.is_none() {
            let cb = arboard::Clipboard::new()
                .map_err(|e| ExportError::ClipboardUnavailable(e.to_string()))?;
            self.inner = Some(cb);
        }
        match self.inner.as_mut() {
            Some(cb) => cb
                .set_text(text)
                .map_err(|e| ExportError::ClipboardWrite(e.to_string())),
            None => Err(ExportError::ClipboardUnavailable("not initialised".into())),
        }
    }
}

/// Writes the HTML source (not a rendered view) to `sink`.
///
/// Never fails: permission or platform errors come back as a failure notice.
pub fn copy_to_clipboard(sink: &mut dyn ClipboardSink, html: &str) -> Notice {
    match sink.set_text(html) {
        Ok(()) => {
            log::debug!("copied {} bytes to clipboard", html.len());
            Notice::success("Copied to clipboard", "Complete HTML has been copied")
        }
        Err(e) => {
            log::warn!("clipboard copy failed: {e}");
            Notice::failure("Copy failed", e.to_string())
        }
    }
}
