//! Values produced by a print action: the renderer metadata and the
//! finished download.

use crate::error::PrintPdfError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::debug;

/// MIME type of every download produced by this crate.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Per-request document information handed to the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: String,
    /// Same as the title for article prints.
    pub subject: String,
    pub keywords: String,
    /// Two-letter language code, e.g. `de`.
    pub language_code: String,
    pub character_set: String,
    /// Author URL (`scheme://host`).
    pub author: String,
    pub creator: String,
    pub direction: TextDirection,
    /// Localised word for "page".
    pub page_word: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextDirection {
    #[default]
    Ltr,
    Rtl,
}

impl TextDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextDirection::Ltr => "ltr",
            TextDirection::Rtl => "rtl",
        }
    }
}

/// A generated PDF ready to be sent as a forced download.
///
/// This is the terminal value of a print action: once the caller has it,
/// it finishes the response and does no further page processing.
#[derive(Clone, PartialEq, Eq)]
pub struct PdfDownload {
    /// Filesystem-safe name ending in `.pdf`.
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for PdfDownload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PdfDownload")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .finish()
    }
}

impl PdfDownload {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: PDF_CONTENT_TYPE,
            bytes,
        }
    }

    /// `Content-Disposition` header value forcing a download.
    pub fn content_disposition(&self) -> String {
        let escaped = self.filename.replace('\\', "\\\\").replace('"', "\\\"");
        format!("attachment; filename=\"{escaped}\"")
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Write the PDF to `path`.
    ///
    /// Uses atomic write (temp file + rename) to prevent partial files.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<(), PrintPdfError> {
        let path = path.as_ref();
        let write_failed = |source| PrintPdfError::OutputWriteFailed {
            path: path.to_path_buf(),
            source,
        };

        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent).map_err(write_failed)?;

        let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(write_failed)?;
        std::io::Write::write_all(&mut tmp, &self.bytes).map_err(write_failed)?;
        tmp.persist(path).map_err(|e| write_failed(e.error))?;

        debug!(path = %path.display(), bytes = self.bytes.len(), "PDF written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_disposition_quotes_filename() {
        let d = PdfDownload::new("foo-bar.pdf", b"%PDF-1.4".to_vec());
        assert_eq!(d.content_type, "application/pdf");
        assert_eq!(d.content_disposition(), "attachment; filename=\"foo-bar.pdf\"");

        let odd = PdfDownload::new("a\"b.pdf", Vec::new());
        assert_eq!(odd.content_disposition(), "attachment; filename=\"a\\\"b.pdf\"");
        assert!(odd.is_empty());
    }

    #[test]
    fn debug_hides_bytes() {
        let d = PdfDownload::new("x.pdf", vec![0u8; 2048]);
        let s = format!("{d:?}");
        assert!(s.contains("<2048 bytes>"));
    }

    #[test]
    fn write_to_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/article.pdf");
        let d = PdfDownload::new("article.pdf", b"%PDF-1.7\n".to_vec());
        d.write_to(&path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.7\n");
    }

    #[test]
    fn direction_serialises_lowercase() {
        let json = serde_json::to_string(&TextDirection::Ltr).unwrap();
        assert_eq!(json, "\"ltr\"");
    }
}
