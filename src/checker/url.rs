// src/checker/url.rs
// =============================================================================
// This module turns raw link text into URLs we are willing to check.
//
// Two steps:
// - resolve_absolute: turn "/about" into "https://example.com/about"
// - validate: accept only absolute http/https URLs
//
// validate() is used for the root URL of a job as well as for every link
// we pull out of the page.
// =============================================================================

use thiserror::Error;
use url::{ParseError, Url};

/// Why a candidate URL was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    /// Could not be parsed at all
    #[error("\"{0}\" is not a valid url")]
    InvalidUrl(String),
    /// Missing a scheme or a host
    #[error("\"{0}\" must be an absolute url")]
    NotAbsolute(String),
    /// Scheme other than http or https
    #[error("\"{0}\" must use http or https")]
    UnsupportedScheme(String),
}

// Resolves a possibly-relative link against a base URL
//
// Returns None when either side does not parse, never a half-built URL.
//
// Examples:
//   base = "https://example.com/page"
//   link = "/about"            -> Some("https://example.com/about")
//   link = "https://other.com" -> Some("https://other.com/")
pub fn resolve_absolute(link: &str, base: &str) -> Option<String> {
    let base = Url::parse(base).ok()?;
    // A link with its own scheme but no "//" ("http:foo") is already absolute
    // as far as resolution goes; hand it back untouched so validate() can
    // reject it instead of letting join() invent a host
    let trimmed = trim_url(link);
    if scheme_of(trimmed).is_some() && !has_authority(trimmed) {
        return Some(trimmed.to_string());
    }
    base.join(link).ok().map(String::from)
}

// Validates a candidate URL
//
// Checks run in this order:
// 1. it parses                      (InvalidUrl)
// 2. it has both a scheme and host  (NotAbsolute)
// 3. the scheme is http or https    (UnsupportedScheme)
pub fn validate(candidate: &str) -> Result<Url, UrlError> {
    let url = match Url::parse(candidate) {
        Ok(url) => url,
        // No scheme at all ("example.com/x", "//host", "") or an empty
        // authority ("http://") means the input is not absolute
        Err(ParseError::RelativeUrlWithoutBase | ParseError::EmptyHost) => {
            return Err(UrlError::NotAbsolute(candidate.to_string()))
        }
        Err(_) => return Err(UrlError::InvalidUrl(candidate.to_string())),
    };

    // The url crate is lenient: "http:example.com" and "https:/example.com"
    // parse with a host, but the input itself never named one
    if url.host_str().map_or(true, str::is_empty) || !has_authority(trim_url(candidate)) {
        return Err(UrlError::NotAbsolute(candidate.to_string()));
    }

    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(UrlError::UnsupportedScheme(candidate.to_string())),
    }
}

// Url::parse ignores leading and trailing spaces and control characters
fn trim_url(input: &str) -> &str {
    input.trim_matches(|c: char| c <= ' ')
}

// Splits off "<scheme>:" when the input starts with a syntactically valid scheme
fn scheme_of(input: &str) -> Option<(&str, &str)> {
    let (scheme, rest) = input.split_once(':')?;
    let mut chars = scheme.chars();
    let starts_alpha = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    let valid = starts_alpha
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then_some((scheme, rest))
}

// True when the input is "<scheme>://..." (backslashes count for http/https,
// the same as the url crate treats them)
fn has_authority(input: &str) -> bool {
    match scheme_of(input) {
        Some((scheme, rest)) => {
            let special = scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https");
            let mut slashes = rest.chars().take(2);
            let is_slash = |c: Option<char>| matches!(c, Some('/')) || (special && matches!(c, Some('\\')));
            is_slash(slashes.next()) && is_slash(slashes.next())
        }
        None => false,
    }
}
