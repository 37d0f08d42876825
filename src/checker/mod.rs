// src/checker/mod.rs
// =============================================================================
// This module contains the link checking building blocks.
//
// Submodules:
// - url: resolves relative links and decides which URLs are checkable
// - html: pulls href values out of an HTML stream
// - http: checks a single URL and classifies the outcome
//
// The job worker (src/job/worker.rs) wires these together.
// =============================================================================

mod html;
mod http;
mod url;

pub use self::html::HrefExtractor;
pub use self::http::{build_client, verify, BlockingBody, LinkResult};
pub use self::url::{resolve_absolute, validate, UrlError};
