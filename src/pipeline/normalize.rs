//! Article markup normalisation: rewrite CMS article HTML into markup the
//! PDF renderer handles well.
//!
//! ## Why rewrite at all?
//!
//! The article HTML is produced for browsers. Several constructs that look
//! fine on screen come out wrong in an HTML-to-PDF renderer:
//!
//! - image paths are URL-encoded for the browser, the renderer wants them
//!   decoded to find the file
//! - newlines inside `<pre>` are not honoured, so code listings collapse
//!   into one line
//! - underlines expressed as inline CSS on a `<span>` are ignored
//! - images and block-level `<div>`s do not start a new line
//! - "print as PDF" links would show up inside the PDF itself
//!
//! Each fix is one regex pass. The passes are pure `&str → String`
//! functions with no shared state and are listed in [`PASSES`] in the
//! order they must run.
//!
//! ## Pass Order
//!
//! Newlines inside `<pre>` must become `<br>` tags before whitespace
//! collapsing erases them, and the `<br>` inserted before block divs must
//! exist before the redundant-break cleanup can remove it again next to
//! article containers.
//!
//! None of the passes can fail. Malformed HTML just does not match and is
//! passed through unchanged.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Line-break tag inserted by the passes.
pub const LINE_BREAK: &str = "<br>";

/// A single rewrite pass.
pub type Pass = fn(&str) -> String;

/// Every pass, in execution order.
pub const PASSES: [(&str, Pass); 8] = [
    ("decode_image_sources", decode_image_sources),
    ("preformatted_line_breaks", preformatted_line_breaks),
    ("underline_spans", underline_spans),
    ("break_before_images", break_before_images),
    ("break_before_block_divs", break_before_block_divs),
    ("collapse_whitespace", collapse_whitespace),
    ("remove_redundant_breaks", remove_redundant_breaks),
    ("strip_pdf_links", strip_pdf_links),
];

/// Apply all passes to the raw article HTML.
///
/// Passes (applied in order):
/// 1. Percent-decode `src="…"` attributes
/// 2. Turn newlines inside `<pre>` blocks into `<br>`
/// 3. Replace underline `<span>`s with `<u>`
/// 4. Put a `<br>` in front of every `<img>`
/// 5. Put a `<br>` in front of every `<div>` mentioning `block`
/// 6. Collapse runs of newlines, carriage returns and tabs to one space
/// 7. Drop the `<br>` directly in front of `<div class="mod_article…`
/// 8. Remove `pdf=N` parameters from `href`s
///
/// Input that matches none of the patterns (and has no newlines or tabs)
/// is returned unchanged. The function is *not* idempotent in general:
/// running it again adds another `<br>` in front of each image.
pub fn normalize(html: &str) -> String {
    PASSES
        .iter()
        .fold(html.to_string(), |acc, (_, pass)| pass(&acc))
}

// ── Pass 1: Decode image sources ─────────────────────────────────────────────

static RE_SRC_ATTR: Lazy<Regex> = Lazy::new(|| Regex::new(r#"src="[^"]+""#).unwrap());

/// Percent-decode every `src="…"` occurrence.
///
/// `+` stays a plus sign and malformed escapes are kept verbatim. Bytes that
/// do not decode to UTF-8 are replaced with U+FFFD.
pub fn decode_image_sources(input: &str) -> String {
    RE_SRC_ATTR
        .replace_all(input, |caps: &Captures<'_>| percent_decode(&caps[0]))
        .into_owned()
}

fn percent_decode(raw: &str) -> String {
    String::from_utf8_lossy(&urlencoding::decode_binary(raw.as_bytes())).into_owned()
}

// ── Pass 2: Line breaks in preformatted text ─────────────────────────────────

// Shortest span from `<pre` to the next `</pre>`, across lines.
static RE_PRE_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<pre.*?</pre>").unwrap());

pub fn preformatted_line_breaks(input: &str) -> String {
    RE_PRE_BLOCK
        .replace_all(input, |caps: &Captures<'_>| caps[0].replace('\n', LINE_BREAK))
        .into_owned()
}

// ── Pass 3: Underline spans ──────────────────────────────────────────────────

static RE_UNDERLINE_SPAN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<span style="text-decoration: ?underline;?">(.*?)</span>"#).unwrap()
});

pub fn underline_spans(input: &str) -> String {
    RE_UNDERLINE_SPAN
        .replace_all(input, "<u>${1}</u>")
        .into_owned()
}

// ── Pass 4: Images on their own line ─────────────────────────────────────────

static RE_IMG_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<img[^>]+>").unwrap());

pub fn break_before_images(input: &str) -> String {
    RE_IMG_TAG.replace_all(input, "<br>${0}").into_owned()
}

// ── Pass 5: Block divs on their own line ─────────────────────────────────────
//
// "block" anywhere inside the tag counts, so `class="unblock"` or
// `data-x="blockquote"` match too. Real HTML/CSS parsing is out of scope;
// the substring test is what the article templates rely on.

static RE_BLOCK_DIV: Lazy<Regex> = Lazy::new(|| Regex::new(r"<div[^>]+block[^>]+>").unwrap());

pub fn break_before_block_divs(input: &str) -> String {
    RE_BLOCK_DIV.replace_all(input, "<br>${0}").into_owned()
}

// ── Pass 6: Collapse whitespace ──────────────────────────────────────────────

static RE_LINE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\n\r\t]+").unwrap());

pub fn collapse_whitespace(input: &str) -> String {
    RE_LINE_WHITESPACE.replace_all(input, " ").into_owned()
}

// ── Pass 7: Redundant breaks before article containers ───────────────────────

static RE_BREAK_BEFORE_ARTICLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<br( /)?><div class="mod_article"#).unwrap());

pub fn remove_redundant_breaks(input: &str) -> String {
    RE_BREAK_BEFORE_ARTICLE
        .replace_all(input, r#"<div class="mod_article"#)
        .into_owned()
}

// ── Pass 8: Strip "print as PDF" parameters from links ───────────────────────
//
// The prefix is greedy, so with several `pdf=` parameters in one href the
// last one is removed. `&amp;` is tried before `&` so the entity form is
// removed whole.

static RE_PDF_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"href="([^"]+)pdf=[0-9]*(?:&amp;|&)?([^"]*)""#).unwrap()
});

pub fn strip_pdf_links(input: &str) -> String {
    RE_PDF_LINK
        .replace_all(input, r#"href="${1}${2}""#)
        .into_owned()
}

// ── Tests ────────────────────────────────────────────────────────────────────
