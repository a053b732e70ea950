//! CLI binary for article-pdf.
//!
//! A thin shim over the library crate that maps CLI flags to a
//! `RenderConfig`, a `RequestContext` and a `PrintArticleListener`, then
//! writes the resulting download to disk.

use anyhow::{Context, Result};
use article_pdf::{
    normalize, CommandRenderer, ModuleDescriptor, Orientation, PageFormat, PrintArticleListener,
    RenderConfig, RenderConfigCell, RequestContext,
};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Print an exported article (writes ./<title>.pdf)
  article2pdf article.html --title "Foo & Bar" --base-url https://example.com/

  # Explicit output file, German metadata, landscape
  article2pdf article.html -o out.pdf --language de --orientation landscape \
      --base-url https://example.com/site/

  # Only show the normalised HTML the renderer would receive
  article2pdf --normalize-only article.html

  # Read from stdin, use a different renderer binary
  cat article.html | article2pdf - --renderer /opt/wkhtmltox/bin/wkhtmltopdf \
      --base-url https://example.com/

ENVIRONMENT VARIABLES:
  ARTICLE_PDF_BASE_URL    Base URL of the site (required unless --normalize-only)
  ARTICLE_PDF_RENDERER    HTML-to-PDF program (default: wkhtmltopdf)
  ARTICLE_PDF_ROOT_DIR    Installation root for font/cache/image directories
  RUST_LOG                Overrides --verbose / --quiet log filtering
"#;

/// Print CMS article HTML as a PDF.
#[derive(Parser, Debug)]
#[command(
    name = "article2pdf",
    version,
    about = "Normalise article HTML and render it to a PDF download",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Article HTML file, or `-` to read stdin.
    input: String,

    /// Write the PDF to this file instead of ./<standardized-title>.pdf.
    #[arg(short, long, env = "ARTICLE_PDF_OUTPUT")]
    output: Option<PathBuf>,

    /// Document title. Default: input file stem.
    #[arg(short, long, env = "ARTICLE_PDF_TITLE")]
    title: Option<String>,

    /// Document keywords.
    #[arg(long, env = "ARTICLE_PDF_KEYWORDS", default_value = "")]
    keywords: String,

    /// Site base URL, e.g. https://example.com/site/.
    #[arg(long, env = "ARTICLE_PDF_BASE_URL")]
    base_url: Option<String>,

    /// Page language; only the first two characters are used.
    #[arg(long, env = "ARTICLE_PDF_LANGUAGE", default_value = "en")]
    language: String,

    /// Character set of the article.
    #[arg(long, env = "ARTICLE_PDF_CHARSET", default_value = "utf-8")]
    charset: String,

    /// Installation root used for font, cache and image directories.
    #[arg(long, env = "ARTICLE_PDF_ROOT_DIR", default_value = ".")]
    root_dir: PathBuf,

    /// HTML-to-PDF program.
    #[arg(long, env = "ARTICLE_PDF_RENDERER", default_value = "wkhtmltopdf")]
    renderer: String,

    /// Extra argument for the renderer (repeatable).
    #[arg(long = "renderer-arg", allow_hyphen_values = true)]
    renderer_args: Vec<String>,

    /// Page format.
    #[arg(long, value_enum, default_value = "a4")]
    format: FormatArg,

    /// Page orientation.
    #[arg(long, value_enum, default_value = "portrait")]
    orientation: OrientationArg,

    /// Render timeout in seconds (0 disables it).
    #[arg(long, env = "ARTICLE_PDF_TIMEOUT", default_value_t = 120)]
    timeout: u64,

    /// Print the normalised HTML to stdout and exit.
    #[arg(long)]
    normalize_only: bool,

    /// Print the effective render configuration as JSON and exit.
    #[arg(long)]
    print_config: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "ARTICLE_PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "ARTICLE_PDF_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum FormatArg {
    A3,
    A4,
    A5,
    Letter,
    Legal,
}

impl From<FormatArg> for PageFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::A3 => PageFormat::A3,
            FormatArg::A4 => PageFormat::A4,
            FormatArg::A5 => PageFormat::A5,
            FormatArg::Letter => PageFormat::Letter,
            FormatArg::Legal => PageFormat::Legal,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum OrientationArg {
    Portrait,
    Landscape,
}

impl From<OrientationArg> for Orientation {
    fn from(v: OrientationArg) -> Self {
        match v {
            OrientationArg::Portrait => Orientation::Portrait,
            OrientationArg::Landscape => Orientation::Landscape,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let article = read_input(&cli.input).await?;

    // ── Normalise-only mode ──────────────────────────────────────────────
    if cli.normalize_only {
        let html = normalize(&article);
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(html.as_bytes())
            .context("Failed to write to stdout")?;
        handle.write_all(b"\n").ok();
        return Ok(());
    }

    // ── Build config and listener ────────────────────────────────────────
    let request = match cli.base_url.as_deref() {
        Some(url) => Some(
            RequestContext::from_base_url(url)
                .context("Invalid --base-url")?
                .with_language(cli.language.clone())
                .with_character_set(cli.charset.clone()),
        ),
        None => None,
    };

    let profile = RenderConfig::builder()
        .root_dir(&cli.root_dir)
        .page_format(cli.format.clone().into())
        .orientation(cli.orientation.clone().into())
        .build()
        .context("Invalid configuration")?;
    let cell = Arc::new(RenderConfigCell::new(profile));

    if cli.print_config {
        let config = cell
            .ensure_initialized(request.as_ref())
            .context("Cannot derive render configuration (pass --base-url)")?;
        println!(
            "{}",
            serde_json::to_string_pretty(config).context("Failed to serialise configuration")?
        );
        return Ok(());
    }

    let renderer = cli
        .renderer_args
        .iter()
        .fold(CommandRenderer::new(cli.renderer.clone()), |r, a| r.arg(a.clone()));
    let mut listener = PrintArticleListener::new(Arc::new(renderer), cell);
    if cli.timeout > 0 {
        listener = listener.with_timeout(Duration::from_secs(cli.timeout));
    }

    let title = cli.title.clone().unwrap_or_else(|| default_title(&cli.input));
    let module = ModuleDescriptor::new(title, cli.keywords.clone());

    // ── Render ───────────────────────────────────────────────────────────
    let spinner = (!cli.quiet).then(|| {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Rendering");
        bar.set_message(module.title.clone());
        bar.enable_steady_tick(Duration::from_millis(80));
        bar
    });

    let start = Instant::now();
    let result = listener
        .print_async(&article, &module, request.as_ref())
        .await;
    if let Some(bar) = &spinner {
        bar.finish_and_clear();
    }
    let download = result.context("Printing the article failed")?;

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&download.filename));
    download
        .write_to(&output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    if !cli.quiet {
        eprintln!(
            "{}  {}  {}  →  {}",
            green("✔"),
            dim(&format!("{} bytes", download.len())),
            dim(&format!("{}ms", start.elapsed().as_millis())),
            bold(&output.display().to_string()),
        );
    }

    Ok(())
}

/// Read the article from a file or stdin.
async fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read article from stdin")?;
        Ok(buf)
    } else {
        tokio::fs::read_to_string(input)
            .await
            .with_context(|| format!("Failed to read article from {input:?}"))
    }
}

/// Title fallback: the input file stem.
fn default_title(input: &str) -> String {
    if input == "-" {
        return "article".to_string();
    }
    Path::new(input)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("article")
        .to_string()
}
