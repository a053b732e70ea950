//! Download filename derivation.
//!
//! Article titles are free text with HTML entities, punctuation and
//! sometimes CMS insert tags. [`standardize`] turns one into a lowercase,
//! hyphen-separated name that is safe on every filesystem and in a
//! `Content-Disposition` header.

use once_cell::sync::Lazy;
use regex::Regex;

/// Name used when a title standardizes to nothing.
pub const FALLBACK_BASENAME: &str = "article";

static RE_AMPERSAND: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)&(?:amp;)?").unwrap());

/// `<standardized title>.pdf`.
///
/// ```rust
/// use article_pdf::pipeline::filename::pdf_filename;
///
/// assert_eq!(pdf_filename("Foo &amp; Bar"), "foo-bar.pdf");
/// ```
pub fn pdf_filename(title: &str) -> String {
    let title = RE_AMPERSAND.replace_all(title, "&");
    let base = standardize(&title);
    if base.is_empty() {
        format!("{FALLBACK_BASENAME}.pdf")
    } else {
        format!("{base}.pdf")
    }
}

static RE_INSERT_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{[^{}]*\}\}").unwrap());
static RE_DISALLOWED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\p{N}\p{L} .&/_-]+").unwrap());
static RE_SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ .&/-]+").unwrap());

/// Turn free text into a lowercase, hyphen-separated identifier.
///
/// Rules, in order:
/// 1. Decode HTML entities (every named entity plus numeric references)
/// 2. Strip insert tags (`{{…}}`)
/// 3. Drop everything except letters, digits, space, `.`, `&`, `/`, `_`, `-`
/// 4. Replace each run of space, `.`, `&`, `/`, `-` with one `-`
/// 5. Prefix `id-` when the result starts with a digit
/// 6. Lowercase and trim `-` from both ends
pub fn standardize(input: &str) -> String {
    let s = html_escape::decode_html_entities(input);
    let s = RE_INSERT_TAG.replace_all(&s, "");
    let s = RE_DISALLOWED.replace_all(&s, "");
    let s = RE_SEPARATORS.replace_all(&s, "-");

    let s = if s.starts_with(|c: char| c.is_ascii_digit()) {
        format!("id-{s}")
    } else {
        s.into_owned()
    };

    s.to_lowercase().trim_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_ampersand_title() {
        assert_eq!(pdf_filename("Foo &amp; Bar"), "foo-bar.pdf");
        assert_eq!(pdf_filename("Foo & Bar"), "foo-bar.pdf");
        assert_eq!(pdf_filename("Tom &AMP; Jerry"), "tom-jerry.pdf");
    }

    #[test]
    fn test_unicode_letters_survive() {
        assert_eq!(
            standardize("Über uns: 2024 Rückblick!"),
            "über-uns-2024-rückblick"
        );
    }

    #[test]
    fn test_leading_digit_gets_prefix() {
        assert_eq!(standardize("2024 Report"), "id-2024-report");
    }

    #[test]
    fn test_insert_tags_removed() {
        assert_eq!(standardize("{{link::12}}Hello World"), "hello-world");
    }

    #[test]
    fn test_separators_collapse_and_trim() {
        assert_eq!(standardize("  --Hi. / there--  "), "hi-there");
        assert_eq!(standardize("snake_case stays"), "snake_case-stays");
        assert_eq!(standardize("C++ & C#"), "c-c");
    }

    #[test]
    fn test_numeric_entities() {
        assert_eq!(standardize("caf&#233; &#x41;"), "café-a");
        assert_eq!(standardize("a &lt;b&gt; c"), "a-b-c");
    }

    #[test]
    fn test_named_entities_decode_to_letters() {
        assert_eq!(standardize("Caf&eacute;"), "café");
        assert_eq!(
            pdf_filename("Gr&uuml;&szlig;e &amp; Tsch&uuml;ss"),
            "grüße-tschüss.pdf"
        );
        assert_eq!(standardize("Preis 5&euro;"), "preis-5");
    }

    #[test]
    fn test_empty_title_falls_back() {
        assert_eq!(pdf_filename(""), "article.pdf");
        assert_eq!(pdf_filename("!!!"), "article.pdf");
    }
}
