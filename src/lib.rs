//! # article-pdf
//!
//! Print CMS articles as PDF downloads.
//!
//! ## Why this crate?
//!
//! Article HTML is written for browsers. HTML-to-PDF renderers trip over
//! URL-encoded image paths, ignore newlines in `<pre>` blocks, drop inline
//! CSS underlines and happily render "print as PDF" links into the PDF.
//! This crate normalises the markup with a fixed sequence of regex passes,
//! assembles the renderer configuration once per process, hands both to a
//! pluggable renderer and returns the result as a ready-to-send download.
//!
//! ## Pipeline Overview
//!
//! ```text
//! print event (article HTML + module title/keywords)
//!  │
//!  ├─ 1. Normalize  8 regex passes (image paths, <pre>, underline, breaks, links)
//!  ├─ 2. Config     RenderConfig derived once from the first request
//!  ├─ 3. Metadata   title, keywords, language code, author URL
//!  ├─ 4. Render     external renderer (wkhtmltopdf by default)
//!  └─ 5. Deliver    PdfDownload { filename, application/pdf, bytes }
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use article_pdf::{
//!     CommandRenderer, ModuleDescriptor, PrintArticleListener, RenderConfig,
//!     RenderConfigCell, RequestContext,
//! };
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let profile = RenderConfig::builder().root_dir("/var/www/site").build()?;
//! let listener = PrintArticleListener::new(
//!     Arc::new(CommandRenderer::default()),
//!     Arc::new(RenderConfigCell::new(profile)),
//! );
//!
//! let request = RequestContext::from_base_url("https://example.com/")?.with_language("de");
//! let module = ModuleDescriptor::new("Foo &amp; Bar", "news");
//! let download = listener.on_print_article_as_pdf("<p>Hello</p>", &module, Some(&request))?;
//! assert_eq!(download.filename, "foo-bar.pdf");
//! # Ok(())
//! # }
//! ```
//!
//! Only the normaliser is needed? [`normalize`] is a plain function:
//!
//! ```rust
//! let html = article_pdf::normalize("<pre>a\nb</pre>\n<p>c</p>");
//! assert_eq!(html, "<pre>a<br>b</pre> <p>c</p>");
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `article2pdf` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod listener;
pub mod output;
pub mod pipeline;
pub mod request;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    FontSpec, Margins, Orientation, PageFormat, RenderConfig, RenderConfigBuilder,
    RenderConfigCell, RenderPaths, Unit,
};
pub use error::{PrintPdfError, RenderError};
pub use listener::PrintArticleListener;
pub use output::{DocumentMetadata, PdfDownload, TextDirection, PDF_CONTENT_TYPE};
pub use pipeline::filename::{pdf_filename, standardize};
pub use pipeline::metadata::ModuleDescriptor;
pub use pipeline::normalize::normalize;
pub use pipeline::render::{CommandRenderer, PdfRenderer, RenderJob};
pub use request::RequestContext;
