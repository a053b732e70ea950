//! Render configuration: page geometry, fonts, ratios and paths handed to
//! the PDF renderer.
//!
//! Every knob lives in one [`RenderConfig`] value. It is assembled from a
//! static default profile plus two request-derived URLs, and is fixed for
//! the rest of the process once [`RenderConfigCell::ensure_initialized`] has
//! succeeded. Callers receive the config by reference rather than reading
//! ambient globals, so a host can inject a different profile in tests.
//!
//! # Example
//! ```rust
//! use article_pdf::{Orientation, RenderConfig, RenderConfigCell, RequestContext};
//!
//! let profile = RenderConfig::builder()
//!     .root_dir("/var/www/site")
//!     .orientation(Orientation::Landscape)
//!     .build()
//!     .unwrap();
//! let cell = RenderConfigCell::new(profile);
//!
//! let request = RequestContext::new("https", "example.com");
//! let config = cell.ensure_initialized(Some(&request)).unwrap();
//! assert_eq!(config.base_url, "https://example.com/");
//! ```

use crate::error::PrintPdfError;
use crate::request::RequestContext;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Complete renderer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Paper format. Default: A4.
    pub page_format: PageFormat,
    /// Default: portrait.
    pub orientation: Orientation,
    /// Unit of every length below. Default: millimetres.
    pub unit: Unit,
    pub margins: Margins,

    /// Body font. Default: `freeserif` 12.
    pub main_font: FontSpec,
    /// Font for tabular data. Default: `freeserif` 12.
    pub data_font: FontSpec,
    /// Font for `<pre>`, `<code>` and friends. Default: `freemono` 10.
    pub monospaced_font: FontSpec,

    /// Ratio between image pixels and user units. Default: 1.25.
    ///
    /// Larger values shrink embedded images.
    pub image_scale_ratio: f32,
    /// Heading scale relative to the main font. Default: 1.1.
    pub head_magnification: f32,
    /// Line height relative to the font size. Default: 1.25.
    pub cell_height_ratio: f32,
    /// Title scale relative to the main font. Default: 1.3.
    pub title_magnification: f32,
    /// Reduction applied to `<small>`, `<sub>` and `<sup>`. Default: 2/3.
    pub small_ratio: f32,

    /// Subsetting embeds only the glyphs in use. Off by default: it is very
    /// slow and article PDFs are short-lived.
    pub font_subsetting: bool,
    pub print_header: bool,
    pub print_footer: bool,
    /// Break pages automatically at the bottom margin. Default: true.
    pub auto_page_break: bool,

    /// Creator string embedded in the PDF.
    pub creator: String,
    /// Author URL (`scheme://host`), set from the request.
    pub author: String,
    /// Base URL (`scheme://host/base/`) used to resolve relative links and
    /// images, set from the request.
    pub base_url: String,

    pub paths: RenderPaths,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            page_format: PageFormat::default(),
            orientation: Orientation::default(),
            unit: Unit::default(),
            margins: Margins::default(),
            main_font: FontSpec::new("freeserif", 12.0),
            data_font: FontSpec::new("freeserif", 12.0),
            monospaced_font: FontSpec::new("freemono", 10.0),
            image_scale_ratio: 1.25,
            head_magnification: 1.1,
            cell_height_ratio: 1.25,
            title_magnification: 1.3,
            small_ratio: 2.0 / 3.0,
            font_subsetting: false,
            print_header: false,
            print_footer: false,
            auto_page_break: true,
            creator: DEFAULT_CREATOR.to_string(),
            author: String::new(),
            base_url: String::new(),
            paths: RenderPaths::under(Path::new(".")),
        }
    }
}

/// Creator string of the default profile.
pub const DEFAULT_CREATOR: &str = "Contao Open Source CMS";

impl RenderConfig {
    /// Create a new builder starting from the default profile.
    pub fn builder() -> RenderConfigBuilder {
        RenderConfigBuilder {
            config: Self::default(),
        }
    }

    /// Bottom margin used for automatic page breaks.
    pub fn page_break_margin(&self) -> f32 {
        self.margins.bottom
    }

    /// True once the request-derived URLs have been filled in.
    pub fn has_request_urls(&self) -> bool {
        !self.base_url.is_empty() && !self.author.is_empty()
    }

    fn apply_request(&mut self, request: &RequestContext) {
        self.author = request.url();
        self.base_url = request.base_url();
    }
}

/// Builder for [`RenderConfig`].
#[derive(Debug)]
pub struct RenderConfigBuilder {
    config: RenderConfig,
}

impl RenderConfigBuilder {
    pub fn page_format(mut self, format: PageFormat) -> Self {
        self.config.page_format = format;
        self
    }

    pub fn orientation(mut self, orientation: Orientation) -> Self {
        self.config.orientation = orientation;
        self
    }

    pub fn margins(mut self, margins: Margins) -> Self {
        self.config.margins = margins;
        self
    }

    pub fn main_font(mut self, family: impl Into<String>, size: f32) -> Self {
        self.config.main_font = FontSpec::new(family, size);
        self
    }

    pub fn data_font(mut self, family: impl Into<String>, size: f32) -> Self {
        self.config.data_font = FontSpec::new(family, size);
        self
    }

    pub fn monospaced_font(mut self, family: impl Into<String>, size: f32) -> Self {
        self.config.monospaced_font = FontSpec::new(family, size);
        self
    }

    pub fn image_scale_ratio(mut self, ratio: f32) -> Self {
        self.config.image_scale_ratio = ratio;
        self
    }

    pub fn font_subsetting(mut self, v: bool) -> Self {
        self.config.font_subsetting = v;
        self
    }

    pub fn creator(mut self, creator: impl Into<String>) -> Self {
        self.config.creator = creator.into();
        self
    }

    /// Derive font, cache and image directories from an installation root.
    pub fn root_dir(mut self, root: impl AsRef<Path>) -> Self {
        self.config.paths = RenderPaths::under(root.as_ref());
        self
    }

    pub fn paths(mut self, paths: RenderPaths) -> Self {
        self.config.paths = paths;
        self
    }

    /// Fill in the request-derived URLs directly, bypassing a
    /// [`RenderConfigCell`].
    pub fn request(mut self, request: &RequestContext) -> Self {
        self.config.apply_request(request);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RenderConfig, PrintPdfError> {
        let c = &self.config;
        for font in [&c.main_font, &c.data_font, &c.monospaced_font] {
            if font.family.trim().is_empty() {
                return Err(PrintPdfError::InvalidConfig(
                    "Font family must not be empty".into(),
                ));
            }
            if font.family.chars().any(|ch| {
                ch.is_control() || matches!(ch, '"' | '\'' | '\\' | '<' | '>' | ';' | '{' | '}')
            }) {
                return Err(PrintPdfError::InvalidConfig(format!(
                    "Font family {:?} contains characters not allowed in a stylesheet",
                    font.family
                )));
            }
            if !(font.size > 0.0) {
                return Err(PrintPdfError::InvalidConfig(format!(
                    "Font size must be > 0, got {} for '{}'",
                    font.size, font.family
                )));
            }
        }
        if !(c.image_scale_ratio > 0.0) {
            return Err(PrintPdfError::InvalidConfig(format!(
                "Image scale ratio must be > 0, got {}",
                c.image_scale_ratio
            )));
        }
        let m = &c.margins;
        if [m.top, m.bottom, m.left, m.right, m.header, m.footer]
            .iter()
            .any(|v| !(*v >= 0.0))
        {
            return Err(PrintPdfError::InvalidConfig(format!(
                "Margins must be ≥ 0, got {m:?}"
            )));
        }
        Ok(self.config)
    }
}

// ── Value types ──────────────────────────────────────────────────────────

/// Paper format understood by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageFormat {
    A3,
    #[default]
    A4,
    A5,
    Letter,
    Legal,
}

impl PageFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageFormat::A3 => "A3",
            PageFormat::A4 => "A4",
            PageFormat::A5 => "A5",
            PageFormat::Letter => "Letter",
            PageFormat::Legal => "Legal",
        }
    }
}

impl fmt::Display for PageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Portrait => "Portrait",
            Orientation::Landscape => "Landscape",
        }
    }
}

/// Length unit of margins and page geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Unit {
    Pt,
    #[default]
    Mm,
    Cm,
    In,
}

impl Unit {
    /// CSS / command-line suffix.
    pub fn suffix(&self) -> &'static str {
        match self {
            Unit::Pt => "pt",
            Unit::Mm => "mm",
            Unit::Cm => "cm",
            Unit::In => "in",
        }
    }
}

/// Page margins in [`RenderConfig::unit`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub top: f32,
    pub bottom: f32,
    pub left: f32,
    pub right: f32,
    /// Distance of the (disabled) header from the top edge.
    pub header: f32,
    /// Distance of the (disabled) footer from the bottom edge.
    pub footer: f32,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: 10.0,
            bottom: 10.0,
            left: 15.0,
            right: 15.0,
            header: 0.0,
            footer: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    pub family: String,
    /// Size in points.
    pub size: f32,
}

impl FontSpec {
    pub fn new(family: impl Into<String>, size: f32) -> Self {
        Self {
            family: family.into(),
            size,
        }
    }
}

/// Filesystem locations owned and interpreted by the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderPaths {
    pub fonts: PathBuf,
    pub cache: PathBuf,
    pub images: PathBuf,
}

impl RenderPaths {
    /// Standard layout below an installation root.
    pub fn under(root: &Path) -> Self {
        Self {
            fonts: root.join("vendor/tecnickcom/tcpdf/fonts"),
            cache: root.join("system/tmp"),
            images: root.join("files"),
        }
    }
}

// ── Once-only initialisation ─────────────────────────────────────────────

/// Holds the render configuration once it has been derived.
///
/// The first successful [`ensure_initialized`](Self::ensure_initialized)
/// fixes the value; every later call returns it unchanged, whatever request
/// it is given. Concurrent first calls run exactly one initialiser and the
/// others block until it has finished, so no caller ever sees a partially
/// built config. A failed initialisation leaves the cell empty.
#[derive(Debug)]
pub struct RenderConfigCell {
    profile: RenderConfig,
    cell: OnceCell<RenderConfig>,
}

impl Default for RenderConfigCell {
    fn default() -> Self {
        Self::new(RenderConfig::default())
    }
}

impl RenderConfigCell {
    /// Cell whose static values come from `profile`.
    pub fn new(profile: RenderConfig) -> Self {
        Self {
            profile,
            cell: OnceCell::new(),
        }
    }

    /// Return the configuration, deriving it from `request` on first use.
    ///
    /// # Errors
    /// [`PrintPdfError::Initialization`] when the cell is still empty and
    /// `request` is `None` or has no host.
    pub fn ensure_initialized(
        &self,
        request: Option<&RequestContext>,
    ) -> Result<&RenderConfig, PrintPdfError> {
        if let Some(config) = self.cell.get() {
            debug!("Render configuration already initialised");
            return Ok(config);
        }

        self.cell.get_or_try_init(|| {
            let request = request.ok_or_else(|| PrintPdfError::Initialization {
                reason: "no request context available to derive the base URL".into(),
            })?;
            if request.host.trim().is_empty() {
                return Err(PrintPdfError::Initialization {
                    reason: "request context has no host".into(),
                });
            }

            let mut config = self.profile.clone();
            config.apply_request(request);
            info!(
                base_url = %config.base_url,
                format = %config.page_format,
                "Render configuration initialised"
            );
            Ok(config)
        })
    }

    /// The configuration, if it has been initialised.
    pub fn get(&self) -> Option<&RenderConfig> {
        self.cell.get()
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};
    use std::thread;

    fn request(host: &str) -> RequestContext {
        RequestContext::new("https", host).with_base_path("/cms")
    }

    #[test]
    fn default_profile_constants() {
        let c = RenderConfig::default();
        assert_eq!(c.page_format, PageFormat::A4);
        assert_eq!(c.orientation, Orientation::Portrait);
        assert_eq!(c.unit, Unit::Mm);
        assert_eq!(c.margins.top, 10.0);
        assert_eq!(c.margins.bottom, 10.0);
        assert_eq!(c.margins.left, 15.0);
        assert_eq!(c.margins.right, 15.0);
        assert_eq!(c.main_font, FontSpec::new("freeserif", 12.0));
        assert_eq!(c.monospaced_font, FontSpec::new("freemono", 10.0));
        assert_eq!(c.image_scale_ratio, 1.25);
        assert!(!c.font_subsetting);
        assert!(c.auto_page_break);
        assert_eq!(c.page_break_margin(), 10.0);
        assert!(!c.has_request_urls());
    }

    #[test]
    fn root_dir_derives_paths() {
        let c = RenderConfig::builder().root_dir("/srv/site").build().unwrap();
        assert_eq!(c.paths.cache, PathBuf::from("/srv/site/system/tmp"));
        assert_eq!(
            c.paths.fonts,
            PathBuf::from("/srv/site/vendor/tecnickcom/tcpdf/fonts")
        );
    }

    #[test]
    fn builder_rejects_bad_values() {
        assert!(matches!(
            RenderConfig::builder().main_font("freeserif", 0.0).build(),
            Err(PrintPdfError::InvalidConfig(_))
        ));
        assert!(RenderConfig::builder().image_scale_ratio(-1.0).build().is_err());
        assert!(RenderConfig::builder()
            .margins(Margins {
                left: f32::NAN,
                ..Margins::default()
            })
            .build()
            .is_err());
        assert!(RenderConfig::builder().monospaced_font(" ", 10.0).build().is_err());
    }

    #[test]
    fn builder_rejects_font_family_that_breaks_stylesheet() {
        for family in [r#"x", serif; } body { color: red"#, "free</style><script>", "a\nb"] {
            let result = RenderConfig::builder().data_font(family, 10.0).build();
            assert!(
                matches!(result, Err(PrintPdfError::InvalidConfig(ref m)) if m.contains("stylesheet")),
                "accepted {family:?}"
            );
        }
        let ok = RenderConfig::builder()
            .main_font("DejaVu Serif", 11.0)
            .build()
            .unwrap();
        assert_eq!(ok.main_font.family, "DejaVu Serif");
    }

    #[test]
    fn ensure_initialized_derives_urls() {
        let cell = RenderConfigCell::default();
        let config = cell.ensure_initialized(Some(&request("example.com"))).unwrap();
        assert_eq!(config.author, "https://example.com");
        assert_eq!(config.base_url, "https://example.com/cms/");
        assert!(config.has_request_urls());
    }

    #[test]
    fn first_initialisation_wins() {
        let cell = RenderConfigCell::default();
        cell.ensure_initialized(Some(&request("first.example")))
            .unwrap();
        let again = cell
            .ensure_initialized(Some(&request("second.example")))
            .unwrap();
        assert_eq!(again.author, "https://first.example");

        // Later calls no longer need a request at all.
        let without = cell.ensure_initialized(None).unwrap();
        assert_eq!(without.author, "https://first.example");
    }

    #[test]
    fn missing_request_fails_and_stays_retryable() {
        let cell = RenderConfigCell::default();
        let err = cell.ensure_initialized(None).unwrap_err();
        assert!(matches!(err, PrintPdfError::Initialization { .. }));
        assert!(!cell.is_initialized());

        let err = cell
            .ensure_initialized(Some(&RequestContext::default()))
            .unwrap_err();
        assert!(matches!(err, PrintPdfError::Initialization { .. }));
        assert!(cell.get().is_none());

        assert!(cell.ensure_initialized(Some(&request("example.com"))).is_ok());
        assert!(cell.is_initialized());
    }

    #[test]
    fn concurrent_first_use_initialises_once() {
        let cell = Arc::new(RenderConfigCell::default());
        let threads = 16;
        let barrier = Arc::new(Barrier::new(threads));

        let handles: Vec<_> = (0..threads)
            .map(|i| {
                let cell = Arc::clone(&cell);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    let host = format!("host{i}.example");
                    let config = cell.ensure_initialized(Some(&request(&host))).unwrap();
                    (config as *const RenderConfig as usize, config.base_url.clone())
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let (first_ptr, first_url) = results[0].clone();
        for (ptr, url) in &results {
            assert_eq!(*ptr, first_ptr, "every caller must see the same config");
            assert_eq!(url, &first_url);
        }
        assert!(first_url.starts_with("https://host"));
        assert!(first_url.ends_with(".example/cms/"));
    }
}
