//! The slice of the current HTTP request the print action depends on.
//!
//! Only two render constants come from the request (the base URL and the
//! author URL); the language and character set feed the document metadata.
//! Hosts build a [`RequestContext`] from whatever request abstraction they
//! use; the CLI parses one from `--base-url`.

use crate::error::PrintPdfError;
use serde::{Deserialize, Serialize};

/// Request-scoped values used to derive configuration and metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    /// `http` or `https`.
    pub scheme: String,
    /// Host name, optionally with port.
    pub host: String,
    /// Installation base path without trailing slash (`""` for the web root).
    pub base_path: String,
    /// Current page language, e.g. `de` or `en-GB`.
    pub language: String,
    /// Output character set.
    pub character_set: String,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self {
            scheme: "https".to_string(),
            host: String::new(),
            base_path: String::new(),
            language: "en".to_string(),
            character_set: "utf-8".to_string(),
        }
    }
}

impl RequestContext {
    /// Context for `scheme://host` at the web root.
    pub fn new(scheme: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
            ..Self::default()
        }
    }

    pub fn with_base_path(mut self, path: impl Into<String>) -> Self {
        self.base_path = normalise_base_path(&path.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_character_set(mut self, charset: impl Into<String>) -> Self {
        self.character_set = charset.into();
        self
    }

    /// Parse `scheme://host[:port][/base/path]` into a context.
    ///
    /// Query strings and fragments are ignored.
    pub fn from_base_url(url: &str) -> Result<Self, PrintPdfError> {
        let invalid = || PrintPdfError::InvalidRequest {
            input: url.to_string(),
        };

        let (scheme, rest) = url.trim().split_once("://").ok_or_else(invalid)?;
        let scheme_ok = !scheme.is_empty()
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
        if !scheme_ok {
            return Err(invalid());
        }

        let rest = rest.split(['?', '#']).next().unwrap_or_default();
        let (host, path) = match rest.find('/') {
            Some(i) => (&rest[..i], &rest[i..]),
            None => (rest, ""),
        };
        if host.is_empty() {
            return Err(invalid());
        }

        Ok(Self::new(scheme.to_ascii_lowercase(), host).with_base_path(path))
    }

    /// `scheme://host`, the document author URL.
    pub fn url(&self) -> String {
        format!("{}://{}", self.scheme, self.host)
    }

    /// `scheme://host/base/path/`, always with a trailing slash.
    pub fn base_url(&self) -> String {
        format!("{}{}/", self.url(), self.base_path)
    }

    /// First two characters of the page language.
    pub fn language_code(&self) -> String {
        self.language.chars().take(2).collect()
    }
}

fn normalise_base_path(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_at_web_root() {
        let ctx = RequestContext::new("https", "example.com");
        assert_eq!(ctx.url(), "https://example.com");
        assert_eq!(ctx.base_url(), "https://example.com/");
    }

    #[test]
    fn base_url_with_path() {
        let ctx = RequestContext::new("http", "localhost:8000").with_base_path("site/");
        assert_eq!(ctx.base_url(), "http://localhost:8000/site/");
    }

    #[test]
    fn parse_base_url() {
        let ctx = RequestContext::from_base_url("HTTPS://example.org/sub/dir/?x=1").unwrap();
        assert_eq!(ctx.scheme, "https");
        assert_eq!(ctx.host, "example.org");
        assert_eq!(ctx.base_path, "/sub/dir");
        assert_eq!(ctx.base_url(), "https://example.org/sub/dir/");
    }

    #[test]
    fn parse_rejects_missing_host() {
        assert!(matches!(
            RequestContext::from_base_url("https:///path"),
            Err(PrintPdfError::InvalidRequest { .. })
        ));
        assert!(RequestContext::from_base_url("example.com").is_err());
    }

    #[test]
    fn language_code_takes_two_chars() {
        let ctx = RequestContext::default().with_language("de-CH");
        assert_eq!(ctx.language_code(), "de");
        let ctx = RequestContext::default().with_language("x");
        assert_eq!(ctx.language_code(), "x");
    }
}
