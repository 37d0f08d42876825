// src/checker/http.rs
// =============================================================================
// This module checks if URLs are alive by making HTTP requests.
//
// Key functionality:
// - Builds one HTTP client per job, configured with the job's timeout
// - Makes a single GET per URL (no retries)
// - Classifies the outcome: 2xx is fine, everything else is a LinkResult
// - Lets blocking code stream a response body (BlockingBody)
// =============================================================================

use bytes::Bytes;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::io::{self, Read};
use std::time::Duration;
use tokio::runtime::Handle;

// Same redirect budget a browser-ish client would use
const MAX_REDIRECTS: usize = 10;

/// A failed link check.
///
/// Only failures are ever recorded; a 2xx response produces no LinkResult.
/// At most one of `status` and `timeout` is set. A transport error that was
/// not a timeout (DNS, connection refused, TLS) leaves both empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkResult {
    /// The URL that was checked
    pub url: String,
    /// Status code of a completed non-2xx response
    #[serde(rename = "http_status", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// The request did not complete within the job's timeout
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub timeout: bool,
}

impl LinkResult {
    fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            status: None,
            timeout: false,
        }
    }
}

// Creates the HTTP client shared by every check of one job
//
// The timeout covers the whole request: connect, headers and body.
pub fn build_client(timeout: Duration) -> reqwest::Result<Client> {
    Client::builder()
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .build()
}

// Checks a single URL with one GET request
//
// Returns:
//   Ok(response)  for any 2xx status; the body has not been read yet
//   Err(result)   for anything else, describing why the link failed
pub async fn verify(client: &Client, url: &str) -> Result<Response, LinkResult> {
    match client.get(url).send().await {
        Ok(response) if response.status().is_success() => Ok(response),
        Ok(response) => Err(LinkResult {
            status: Some(response.status().as_u16()),
            ..LinkResult::new(url)
        }),
        Err(e) => Err(LinkResult {
            timeout: e.is_timeout(),
            ..LinkResult::new(url)
        }),
    }
}

/// Blocking `Read` over a live response body.
///
/// Each refill blocks the current thread on the next body chunk through the
/// runtime handle, so this must only be used from a blocking thread
/// (`tokio::task::spawn_blocking`), never from inside an async task.
pub struct BlockingBody {
    response: Response,
    runtime: Handle,
    chunk: Bytes,
}

impl BlockingBody {
    pub fn new(response: Response, runtime: Handle) -> Self {
        Self {
            response,
            runtime,
            chunk: Bytes::new(),
        }
    }
}

impl Read for BlockingBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while self.chunk.is_empty() {
            match self.runtime.block_on(self.response.chunk()) {
                Ok(Some(chunk)) => self.chunk = chunk,
                Ok(None) => return Ok(0),
                Err(e) => return Err(io::Error::new(io::ErrorKind::Other, e)),
            }
        }

        let n = buf.len().min(self.chunk.len());
        let rest = self.chunk.split_off(n);
        buf[..n].copy_from_slice(&self.chunk);
        self.chunk = rest;
        Ok(n)
    }
}
