//! The "print article as PDF" event handler.
//!
//! ## Flow
//!
//! ```text
//! article HTML ──▶ normalize ──▶ ensure config ──▶ metadata ──▶ render ──▶ PdfDownload
//!                  (8 passes)    (once per cell)               (renderer)   (%PDF checked)
//! ```
//!
//! The handler returns the finished [`PdfDownload`] instead of writing to
//! the response and terminating; the caller sends it and stops processing
//! the page. Any error aborts the whole action, so a caller never receives
//! a partial PDF.

use crate::config::RenderConfigCell;
use crate::error::PrintPdfError;
use crate::output::PdfDownload;
use crate::pipeline::filename::pdf_filename;
use crate::pipeline::metadata::{document_metadata, ModuleDescriptor};
use crate::pipeline::normalize::normalize;
use crate::pipeline::render::{PdfRenderer, RenderJob};
use crate::request::RequestContext;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const PDF_MAGIC: &[u8] = b"%PDF";

/// Handles print-as-PDF events for one site.
///
/// Cloning is cheap: the renderer and the configuration cell are shared.
#[derive(Clone)]
pub struct PrintArticleListener {
    renderer: Arc<dyn PdfRenderer>,
    config: Arc<RenderConfigCell>,
    timeout: Option<Duration>,
}

impl std::fmt::Debug for PrintArticleListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrintArticleListener")
            .field("renderer", &"<dyn PdfRenderer>")
            .field("config", &self.config)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl PrintArticleListener {
    pub fn new(renderer: Arc<dyn PdfRenderer>, config: Arc<RenderConfigCell>) -> Self {
        Self {
            renderer,
            config,
            timeout: None,
        }
    }

    /// Abort [`print_async`](Self::print_async) when rendering takes longer
    /// than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn config_cell(&self) -> &RenderConfigCell {
        &self.config
    }

    /// Render `article` as a PDF download.
    ///
    /// `request` is only needed until the configuration cell has been
    /// initialised; afterwards `None` is fine.
    ///
    /// # Errors
    /// - [`PrintPdfError::Initialization`] when the configuration is not yet
    ///   initialised and `request` cannot provide a base URL
    /// - [`PrintPdfError::Render`] when the renderer fails
    /// - [`PrintPdfError::NotAPdf`] when the renderer output lacks the PDF header
    pub fn on_print_article_as_pdf(
        &self,
        article: &str,
        module: &ModuleDescriptor,
        request: Option<&RequestContext>,
    ) -> Result<PdfDownload, PrintPdfError> {
        let job = self.prepare(article, module, request)?;
        let filename = pdf_filename(&job.metadata.title);
        let bytes = render_checked(self.renderer.as_ref(), &job)?;
        Ok(PdfDownload::new(filename, bytes))
    }

    /// Async variant: rendering runs on the blocking thread pool, bounded by
    /// the optional timeout.
    pub async fn print_async(
        &self,
        article: &str,
        module: &ModuleDescriptor,
        request: Option<&RequestContext>,
    ) -> Result<PdfDownload, PrintPdfError> {
        let job = self.prepare(article, module, request)?;
        let filename = pdf_filename(&job.metadata.title);

        let renderer = Arc::clone(&self.renderer);
        let task = tokio::task::spawn_blocking(move || render_checked(renderer.as_ref(), &job));

        let joined = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, task).await.map_err(|_| {
                warn!(secs = limit.as_secs(), "PDF rendering timed out");
                PrintPdfError::RenderTimeout {
                    secs: limit.as_secs(),
                }
            })?,
            None => task.await,
        };

        let bytes = joined
            .map_err(|e| PrintPdfError::Internal(format!("Render task panicked: {e}")))??;
        Ok(PdfDownload::new(filename, bytes))
    }

    /// Normalise the article and assemble the renderer input.
    pub fn prepare(
        &self,
        article: &str,
        module: &ModuleDescriptor,
        request: Option<&RequestContext>,
    ) -> Result<RenderJob, PrintPdfError> {
        info!(title = %module.title, "Printing article as PDF");

        let html = normalize(article);
        debug!(
            input_bytes = article.len(),
            output_bytes = html.len(),
            "Article markup normalised"
        );

        let config = self.config.ensure_initialized(request)?.clone();
        let default_request;
        let request = match request {
            Some(r) => r,
            None => {
                default_request = RequestContext::default();
                &default_request
            }
        };
        let metadata = document_metadata(module, request, &config);

        Ok(RenderJob {
            html,
            metadata,
            config,
        })
    }
}

/// Run the renderer and reject anything that is not a PDF.
fn render_checked(renderer: &dyn PdfRenderer, job: &RenderJob) -> Result<Vec<u8>, PrintPdfError> {
    let start = Instant::now();
    let bytes = renderer.render(job)?;

    if !bytes.starts_with(PDF_MAGIC) {
        let magic = bytes.iter().take(8).copied().collect();
        warn!("Renderer returned {} bytes without a PDF header", bytes.len());
        return Err(PrintPdfError::NotAPdf { magic });
    }

    info!(
        bytes = bytes.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Article PDF ready"
    );
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RenderError;
    use std::sync::Mutex;

    fn request() -> RequestContext {
        RequestContext::new("https", "example.com").with_language("de")
    }

    fn fake_pdf() -> Arc<dyn PdfRenderer> {
        Arc::new(|_: &RenderJob| -> Result<Vec<u8>, RenderError> { Ok(b"%PDF-1.4 fake".to_vec()) })
    }

    #[test]
    fn produces_download() {
        let listener = PrintArticleListener::new(fake_pdf(), Arc::new(RenderConfigCell::default()));
        let module = ModuleDescriptor::new("Foo &amp; Bar", "");
        let download = listener
            .on_print_article_as_pdf("<p>x</p>", &module, Some(&request()))
            .unwrap();
        assert_eq!(download.filename, "foo-bar.pdf");
        assert_eq!(download.content_type, "application/pdf");
        assert!(download.bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn renderer_sees_normalised_html_and_metadata() {
        let seen: Arc<Mutex<Option<RenderJob>>> = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        let renderer = Arc::new(move |job: &RenderJob| -> Result<Vec<u8>, RenderError> {
            *sink.lock().unwrap() = Some(job.clone());
            Ok(b"%PDF-1.7".to_vec())
        });
        let listener = PrintArticleListener::new(renderer, Arc::new(RenderConfigCell::default()));

        listener
            .on_print_article_as_pdf(
                "<pre>a\nb</pre>\n<img src=\"x%20y.png\">",
                &ModuleDescriptor::new("Title", "k1, k2"),
                Some(&request()),
            )
            .unwrap();

        let job = seen.lock().unwrap().take().unwrap();
        assert_eq!(job.html, "<pre>a<br>b</pre> <br><img src=\"x y.png\">");
        assert_eq!(job.metadata.language_code, "de");
        assert_eq!(job.metadata.keywords, "k1, k2");
        assert_eq!(job.config.base_url, "https://example.com/");
    }

    #[test]
    fn missing_request_aborts() {
        let listener = PrintArticleListener::new(fake_pdf(), Arc::new(RenderConfigCell::default()));
        let err = listener
            .on_print_article_as_pdf("<p>x</p>", &ModuleDescriptor::default(), None)
            .unwrap_err();
        assert!(matches!(err, PrintPdfError::Initialization { .. }));
        assert!(!listener.config_cell().is_initialized());
    }

    #[test]
    fn initialised_cell_no_longer_needs_request() {
        let listener = PrintArticleListener::new(fake_pdf(), Arc::new(RenderConfigCell::default()));
        let module = ModuleDescriptor::new("A", "");
        listener
            .on_print_article_as_pdf("<p>1</p>", &module, Some(&request()))
            .unwrap();
        let second = listener.on_print_article_as_pdf("<p>2</p>", &module, None);
        assert!(second.is_ok());
    }

    #[test]
    fn non_pdf_output_is_rejected() {
        let renderer = Arc::new(|_: &RenderJob| -> Result<Vec<u8>, RenderError> {
            Ok(b"<html>oops</html>".to_vec())
        });
        let listener = PrintArticleListener::new(renderer, Arc::new(RenderConfigCell::default()));
        let err = listener
            .on_print_article_as_pdf("<p>x</p>", &ModuleDescriptor::default(), Some(&request()))
            .unwrap_err();
        match err {
            PrintPdfError::NotAPdf { magic } => assert_eq!(magic, b"<html>oo"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn renderer_error_propagates_unchanged() {
        let renderer = Arc::new(|_: &RenderJob| -> Result<Vec<u8>, RenderError> {
            Err(RenderError::Other("font missing".into()))
        });
        let listener = PrintArticleListener::new(renderer, Arc::new(RenderConfigCell::default()));
        let err = listener
            .on_print_article_as_pdf("<p>x</p>", &ModuleDescriptor::default(), Some(&request()))
            .unwrap_err();
        assert!(matches!(err, PrintPdfError::Render(RenderError::Other(ref m)) if m == "font missing"));
    }

    #[tokio::test]
    async fn async_print_matches_sync() {
        let listener = PrintArticleListener::new(fake_pdf(), Arc::new(RenderConfigCell::default()));
        let module = ModuleDescriptor::new("Async Title", "");
        let download = listener
            .print_async("<p>x</p>", &module, Some(&request()))
            .await
            .unwrap();
        assert_eq!(download.filename, "async-title.pdf");
    }

    #[tokio::test]
    async fn async_print_times_out() {
        let renderer = Arc::new(|_: &RenderJob| -> Result<Vec<u8>, RenderError> {
            std::thread::sleep(Duration::from_millis(500));
            Ok(b"%PDF".to_vec())
        });
        let listener = PrintArticleListener::new(renderer, Arc::new(RenderConfigCell::default()))
            .with_timeout(Duration::from_millis(20));
        let err = listener
            .print_async("<p>x</p>", &ModuleDescriptor::default(), Some(&request()))
            .await
            .unwrap_err();
        assert!(matches!(err, PrintPdfError::RenderTimeout { .. }));
    }
}
