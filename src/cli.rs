// src/cli.rs
// =============================================================================
// This file defines the service's command-line flags using the `clap` crate.
//
// Every flag can also be set through an environment variable, which is
// handy when the service runs in a container.
// =============================================================================

use clap::Parser;
use std::net::SocketAddr;
use std::num::NonZeroUsize;

#[derive(Parser, Debug)]
#[command(
    name = "link-sentinel",
    version,
    about = "An HTTP service that checks every link on a web page",
    long_about = "link-sentinel accepts a page URL over HTTP, checks every link on that page \
                  concurrently in the background, and keeps the broken ones for you to poll."
)]
pub struct Cli {
    /// Address the HTTP API listens on
    #[arg(long, env = "LINK_SENTINEL_LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Maximum number of links checked at once within a single job
    ///
    /// Without this flag every link of a job is checked at the same time.
    #[arg(long, env = "LINK_SENTINEL_MAX_CONCURRENT_CHECKS")]
    pub max_concurrent_checks: Option<NonZeroUsize>,

    /// Write logs as JSON lines instead of human-readable text
    #[arg(long, env = "LINK_SENTINEL_LOG_JSON")]
    pub log_json: bool,
}
