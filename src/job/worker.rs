// src/job/worker.rs
// =============================================================================
// This module runs one job from start to finish.
//
// Stages:
// 1. Fetching    - GET the root page; any failure is recorded and we stop
// 2. Extracting  - stream the body through the href extractor, resolve every
//                  value against the root's origin, drop anything invalid
// 3. Verifying   - one task per link, all sharing the job's HTTP client
// 4. Draining    - failures arrive on a channel and are appended to the
//                  store one by one, in whatever order the checks finish
// 5. Done
//
// Nothing here can fail the process: every problem is scoped to this job or
// to a single link.
// =============================================================================

use super::Job;
use crate::checker::{self, BlockingBody, HrefExtractor, LinkResult};
use crate::store::{JobStore, StoreError};
use reqwest::Response;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Fetching,
    Extracting,
    Verifying,
    Draining,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Fetching => "fetching",
            Stage::Extracting => "extracting",
            Stage::Verifying => "verifying",
            Stage::Draining => "draining",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Processes a job to completion, appending every failed link to `store`.
///
/// `max_concurrent_checks` caps how many links of *this* job are checked at
/// once. `None` starts every check immediately.
pub async fn run_job(job: Job, store: Arc<dyn JobStore>, max_concurrent_checks: Option<NonZeroUsize>) {
    debug!(job_id = %job.id, stage = %Stage::Fetching, url = %job.url, "fetching root page");
    let response = match checker::verify(job.client(), job.url.as_str()).await {
        Ok(response) => response,
        Err(failure) => {
            info!(job_id = %job.id, url = %failure.url, status = ?failure.status, timeout = failure.timeout, "root page failed, skipping link checks");
            record(store.as_ref(), &job.id, failure).await;
            debug!(job_id = %job.id, stage = %Stage::Done, "job finished");
            return;
        }
    };

    debug!(job_id = %job.id, stage = %Stage::Extracting, "extracting links");
    let links = extract_links(response, job.origin()).await;

    debug!(job_id = %job.id, stage = %Stage::Verifying, links = links.len(), "checking links");
    let failures = check_links(&job, links, max_concurrent_checks);

    debug!(job_id = %job.id, stage = %Stage::Draining, "collecting failures");
    let recorded = drain(store.as_ref(), &job.id, failures).await;

    info!(job_id = %job.id, stage = %Stage::Done, failures = recorded, "job finished");
}

// Streams the root body through the extractor and keeps the links worth
// checking, in document order (duplicates included).
//
// The tokenizer is synchronous, so this runs on a blocking thread that pulls
// body chunks back through the runtime handle as it needs them.
async fn extract_links(response: Response, origin: &str) -> Vec<Url> {
    let origin = origin.to_string();
    let runtime = Handle::current();

    let extraction = tokio::task::spawn_blocking(move || {
        HrefExtractor::new(BlockingBody::new(response, runtime))
            .filter_map(|href| checker::resolve_absolute(&href, &origin))
            .filter_map(|candidate| checker::validate(&candidate).ok())
            .collect::<Vec<_>>()
    });

    match extraction.await {
        Ok(links) => links,
        Err(e) => {
            warn!(error = %e, "link extraction task failed");
            Vec::new()
        }
    }
}

// Starts one check per link and returns the receiving end of their failures.
//
// The channel closes once the supervisor has seen every check finish.
fn check_links(
    job: &Job,
    links: Vec<Url>,
    max_concurrent_checks: Option<NonZeroUsize>,
) -> mpsc::Receiver<LinkResult> {
    // Every link can fail at most once, so sends never wait.
    // mpsc::channel panics on zero capacity.
    let (tx, rx) = mpsc::channel(links.len().max(1));
    let permits = max_concurrent_checks.map(|n| Arc::new(Semaphore::new(n.get())));

    let mut checks = JoinSet::new();
    for link in links {
        let client = job.client().clone();
        let tx = tx.clone();
        let permits = permits.clone();

        checks.spawn(async move {
            let _permit = match permits {
                Some(permits) => permits.acquire_owned().await.ok(),
                None => None,
            };
            if let Err(failure) = checker::verify(&client, link.as_str()).await {
                let _ = tx.send(failure).await;
            }
        });
    }

    // Supervisor: waits for every check, then drops the last sender
    let job_id = job.id.clone();
    tokio::spawn(async move {
        while let Some(joined) = checks.join_next().await {
            if let Err(e) = joined {
                warn!(job_id = %job_id, error = %e, "link check task failed");
            }
        }
        drop(tx);
    });

    rx
}

// Appends failures as they arrive; returns how many made it into the store
async fn drain(store: &dyn JobStore, job_id: &str, mut failures: mpsc::Receiver<LinkResult>) -> usize {
    let mut recorded = 0;
    while let Some(failure) = failures.recv().await {
        if record(store, job_id, failure).await {
            recorded += 1;
        }
    }
    recorded
}

async fn record(store: &dyn JobStore, job_id: &str, failure: LinkResult) -> bool {
    match store.append_failure(job_id, failure).await {
        Ok(()) => true,
        // Deleted while checks were in flight; nobody is left to read it
        Err(StoreError::Removed(_)) => {
            debug!(job_id, "job was removed, dropping link result");
            false
        }
        Err(e) => {
            warn!(job_id, error = %e, "failed to store link result");
            false
        }
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why is concurrency unbounded by default?
//    - One task per link keeps the job as fast as its slowest link
//    - Pages with thousands of links will open thousands of connections;
//      --max-concurrent-checks puts a per-job ceiling on that
//
// 2. Why a channel instead of collecting JoinSet results?
//    - Failures are written to the store as soon as each check finishes, so
//      a client polling the job sees results trickle in
//
// 3. What happens if the job is deleted mid-flight?
//    - Nothing is cancelled; checks finish, their appends come back as
//      StoreError::Removed and are dropped
// -----------------------------------------------------------------------------
