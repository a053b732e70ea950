//! The PDF renderer boundary.
//!
//! Layout, fonts and page breaking belong to the renderer, not to this
//! crate. A [`RenderJob`] carries the complete renderer input (normalised
//! HTML, document metadata, render configuration) and any
//! [`PdfRenderer`] turns it into PDF bytes.
//!
//! [`CommandRenderer`] drives an external HTML-to-PDF program
//! (`wkhtmltopdf` by default). Renderers are synchronous and may be slow;
//! [`crate::listener::PrintArticleListener::print_async`] moves them onto the
//! blocking thread pool.

use crate::config::RenderConfig;
use crate::error::RenderError;
use crate::output::DocumentMetadata;
use std::ffi::OsString;
use std::io::Write;
use std::path::Path;
use std::process::Command;
use tracing::{debug, info};

/// Everything the renderer gets to see, and nothing more.
#[derive(Debug, Clone)]
pub struct RenderJob {
    /// Normalised article HTML fragment.
    pub html: String,
    pub metadata: DocumentMetadata,
    pub config: RenderConfig,
}

/// Turns a [`RenderJob`] into PDF bytes.
///
/// Implementations must be `Send + Sync`: one renderer is shared by all
/// requests. Closures with the matching signature implement the trait,
/// which keeps test doubles short.
pub trait PdfRenderer: Send + Sync {
    fn render(&self, job: &RenderJob) -> Result<Vec<u8>, RenderError>;
}

impl<F> PdfRenderer for F
where
    F: Fn(&RenderJob) -> Result<Vec<u8>, RenderError> + Send + Sync,
{
    fn render(&self, job: &RenderJob) -> Result<Vec<u8>, RenderError> {
        self(job)
    }
}

// ── Standalone document ──────────────────────────────────────────────────

/// Wrap the article fragment in a complete HTML document carrying the
/// metadata and a stylesheet derived from the render configuration.
pub fn document_html(job: &RenderJob) -> String {
    let meta = &job.metadata;
    let c = &job.config;
    let main = c.main_font.size;

    let mut doc = String::with_capacity(job.html.len() + 1024);
    doc.push_str("<!DOCTYPE html>\n");
    doc.push_str(&format!(
        "<html lang=\"{}\" dir=\"{}\">\n<head>\n",
        escape_html(&meta.language_code),
        meta.direction.as_str()
    ));
    doc.push_str(&format!(
        "<meta charset=\"{}\">\n",
        escape_html(&meta.character_set)
    ));
    if !c.base_url.is_empty() {
        doc.push_str(&format!("<base href=\"{}\">\n", escape_html(&c.base_url)));
    }
    doc.push_str(&format!("<title>{}</title>\n", escape_html(&meta.title)));
    for (name, value) in [
        ("author", &meta.author),
        ("keywords", &meta.keywords),
        ("description", &meta.subject),
        ("generator", &meta.creator),
    ] {
        if !value.is_empty() {
            doc.push_str(&format!(
                "<meta name=\"{name}\" content=\"{}\">\n",
                escape_html(value)
            ));
        }
    }

    doc.push_str("<style>\n");
    doc.push_str(&format!(
        "body {{ font-family: \"{}\", serif; font-size: {}pt; line-height: {}; }}\n",
        c.main_font.family, main, c.cell_height_ratio
    ));
    doc.push_str(&format!(
        "table {{ font-family: \"{}\", serif; font-size: {}pt; }}\n",
        c.data_font.family, c.data_font.size
    ));
    doc.push_str(&format!(
        "pre, code, kbd, samp, tt {{ font-family: \"{}\", monospace; font-size: {}pt; }}\n",
        c.monospaced_font.family, c.monospaced_font.size
    ));
    doc.push_str(&format!(
        "h1 {{ font-size: {:.2}pt; }}\nh2, h3, h4, h5, h6 {{ font-size: {:.2}pt; }}\n",
        main * c.title_magnification,
        main * c.head_magnification
    ));
    doc.push_str(&format!(
        "small, sub, sup {{ font-size: {:.0}%; }}\n",
        c.small_ratio * 100.0
    ));
    doc.push_str(&format!(
        "img {{ zoom: {:.4}; max-width: 100%; }}\n",
        1.0 / c.image_scale_ratio
    ));
    doc.push_str("</style>\n</head>\n<body>\n");
    doc.push_str(&job.html);
    doc.push_str("\n</body>\n</html>\n");
    doc
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

// ── External program renderer ────────────────────────────────────────────

/// Renders by running an external HTML-to-PDF program.
///
/// The document is written to a temp file, the program is asked to write
/// the PDF to a second temp file, and that file is read back. Both files
/// are removed when rendering returns.
#[derive(Debug, Clone)]
pub struct CommandRenderer {
    program: String,
    extra_args: Vec<String>,
}

impl Default for CommandRenderer {
    fn default() -> Self {
        Self::new("wkhtmltopdf")
    }
}

impl CommandRenderer {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            extra_args: Vec::new(),
        }
    }

    /// Append an argument passed before the input and output paths.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Command-line arguments for one job.
    pub fn command_args(&self, job: &RenderJob, input: &Path, output: &Path) -> Vec<OsString> {
        let c = &job.config;
        let unit = c.unit.suffix();
        let mut args: Vec<OsString> = vec![
            "--quiet".into(),
            "--encoding".into(),
            job.metadata.character_set.clone().into(),
            "--page-size".into(),
            c.page_format.as_str().into(),
            "--orientation".into(),
            c.orientation.as_str().into(),
            "--margin-top".into(),
            format!("{}{unit}", c.margins.top).into(),
            "--margin-bottom".into(),
            format!("{}{unit}", c.page_break_margin()).into(),
            "--margin-left".into(),
            format!("{}{unit}", c.margins.left).into(),
            "--margin-right".into(),
            format!("{}{unit}", c.margins.right).into(),
            "--title".into(),
            job.metadata.title.clone().into(),
            "--cache-dir".into(),
            c.paths.cache.clone().into_os_string(),
            "--enable-local-file-access".into(),
        ];
        if c.print_header {
            args.push("--header-center".into());
            args.push(job.metadata.title.clone().into());
        }
        if c.print_footer {
            args.push("--footer-right".into());
            args.push(format!("{} [page]", job.metadata.page_word).into());
        }
        args.extend(self.extra_args.iter().map(OsString::from));
        args.push(input.as_os_str().to_owned());
        args.push(output.as_os_str().to_owned());
        args
    }
}

impl PdfRenderer for CommandRenderer {
    fn render(&self, job: &RenderJob) -> Result<Vec<u8>, RenderError> {
        let mut input = tempfile::Builder::new()
            .prefix("article-")
            .suffix(".html")
            .tempfile()?;
        input.write_all(document_html(job).as_bytes())?;
        input.flush()?;

        let output = tempfile::Builder::new()
            .prefix("article-")
            .suffix(".pdf")
            .tempfile()?;

        let args = self.command_args(job, input.path(), output.path());
        debug!(program = %self.program, ?args, "Running PDF renderer");

        let result = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|source| RenderError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !result.status.success() {
            return Err(RenderError::Failed {
                program: self.program.clone(),
                status: result.status.to_string(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }

        let bytes = std::fs::read(output.path())?;
        if bytes.is_empty() {
            return Err(RenderError::EmptyOutput);
        }

        info!(
            program = %self.program,
            title = %job.metadata.title,
            size_kb = bytes.len() / 1024,
            "PDF rendered"
        );
        Ok(bytes)
    }
}
