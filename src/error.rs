//! Error types for the article-pdf library.
//!
//! Two error types mirror the two sides of the renderer boundary:
//!
//! * [`PrintPdfError`] — **Fatal**: the print action cannot complete
//!   (configuration could not be derived, the renderer failed, the output is
//!   not a PDF). Returned from every top-level entry point. A failure
//!   anywhere aborts the whole action; no partial PDF is ever handed out.
//!
//! * [`RenderError`] — raised by a [`crate::pipeline::render::PdfRenderer`]
//!   implementation. It is wrapped unchanged in [`PrintPdfError::Render`] so
//!   callers can still match on the renderer's own failure mode.
//!
//! The normalizer has no error type: every pass is a total function over
//! strings and unmatched patterns simply pass through.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the article-pdf library.
#[derive(Debug, Error)]
pub enum PrintPdfError {
    // ── Configuration errors ──────────────────────────────────────────────
    /// The render configuration could not be derived, usually because no
    /// request context (and therefore no base URL) was available.
    #[error("Render configuration could not be initialised: {reason}")]
    Initialization { reason: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A base URL handed in by the host could not be parsed.
    #[error("Invalid request URL '{input}': expected scheme://host[/path]")]
    InvalidRequest { input: String },

    // ── Renderer errors ───────────────────────────────────────────────────
    /// The PDF renderer failed.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// The renderer returned bytes that do not start with `%PDF`.
    #[error("Renderer output is not a PDF\nFirst bytes: {magic:?}")]
    NotAPdf { magic: Vec<u8> },

    /// The caller-imposed render timeout elapsed.
    #[error("PDF rendering timed out after {secs}s")]
    RenderTimeout { secs: u64 },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output PDF file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failure raised at the PDF renderer boundary.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The external renderer program could not be started.
    #[error("Failed to start PDF renderer '{program}': {source}\nIs it installed and on PATH?")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The renderer ran but reported failure.
    #[error("PDF renderer '{program}' exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    /// Reading or writing the renderer's scratch files failed.
    #[error("Renderer I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The renderer finished without producing any bytes.
    #[error("PDF renderer produced no output")]
    EmptyOutput,

    /// Any other failure reported by an embedded renderer.
    #[error("PDF rendering failed: {0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialization_display() {
        let e = PrintPdfError::Initialization {
            reason: "no request context".into(),
        };
        assert!(e.to_string().contains("no request context"));
    }

    #[test]
    fn render_error_is_transparent() {
        let e: PrintPdfError = RenderError::Failed {
            program: "wkhtmltopdf".into(),
            status: "exit status: 1".into(),
            stderr: "boom".into(),
        }
        .into();
        let msg = e.to_string();
        assert!(msg.starts_with("PDF renderer 'wkhtmltopdf'"), "got: {msg}");
        assert!(msg.contains("boom"));
        assert!(matches!(e, PrintPdfError::Render(RenderError::Failed { .. })));
    }

    #[test]
    fn not_a_pdf_display() {
        let e = PrintPdfError::NotAPdf {
            magic: b"<htm".to_vec(),
        };
        assert!(e.to_string().contains("not a PDF"));
    }

    #[test]
    fn timeout_display() {
        let e = PrintPdfError::RenderTimeout { secs: 30 };
        assert!(e.to_string().contains("30s"));
    }
}
