// src/job/mod.rs
// =============================================================================
// A job is one "check every link on this page" request.
//
// This file turns an incoming request into a validated Job:
// - the root URL must be an absolute http/https URL
// - the per-request timeout is clamped to 1..=20 seconds (default 5)
// - every job gets a fresh UUID and its own HTTP client
//
// The actual work happens in worker.rs.
// =============================================================================

mod worker;

pub use worker::run_job;

use crate::checker::{self, UrlError};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use url::Url;
use uuid::Uuid;

/// Seconds each request may take when the caller gives no usable value
pub const DEFAULT_LINK_TIMEOUT: u64 = 5;
/// Largest per-request timeout a caller may ask for
pub const MAX_LINK_TIMEOUT: u64 = 20;

/// Body of a job-creation request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobRequest {
    #[serde(default)]
    pub url: String,
    /// Per-request timeout in seconds; absent, null or out-of-range values
    /// fall back to the default
    #[serde(default)]
    pub link_timeout: Option<i64>,
}

#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Url(#[from] UrlError),
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// A validated job, immutable once created
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    #[serde(rename = "job_id")]
    pub id: String,
    /// The root URL exactly as submitted; it is echoed back and used as the
    /// failure record's url if the root fetch fails
    pub url: String,
    pub link_timeout: u64,

    // scheme://host[:port] of the root; relative links resolve against this
    #[serde(skip)]
    origin: String,
    #[serde(skip)]
    client: Client,
}

impl Job {
    pub fn new(request: JobRequest) -> Result<Self, JobError> {
        let root: Url = checker::validate(&request.url)?;
        let link_timeout = clamp_timeout(request.link_timeout);
        let client = checker::build_client(Duration::from_secs(link_timeout))?;

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            origin: root.origin().ascii_serialization(),
            url: request.url,
            link_timeout,
            client,
        })
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

fn clamp_timeout(requested: Option<i64>) -> u64 {
    match requested.map(u64::try_from) {
        Some(Ok(secs @ 1..=MAX_LINK_TIMEOUT)) => secs,
        _ => DEFAULT_LINK_TIMEOUT,
    }
}
