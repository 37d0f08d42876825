// src/store/mod.rs
// =============================================================================
// Keyed storage of per-job link failures.
//
// The worker only needs four operations, so that is all the trait has.
// Any backing works (memory, disk, a remote service) as long as the error
// semantics below hold.
// =============================================================================

mod memory;

pub use memory::MemoryStore;

use crate::checker::LinkResult;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No job with this id is registered
    #[error("no job exists with id {0}")]
    NotFound(String),
    /// A job with this id is already registered
    #[error("a job already exists with id {0}")]
    AlreadyExists(String),
    /// The job existed but has been removed; only returned by append_failure
    #[error("job {0} has been removed")]
    Removed(String),
}

#[async_trait]
pub trait JobStore: Send + Sync {
    /// Registers an empty result set for `job_id`.
    async fn create(&self, job_id: &str) -> Result<(), StoreError>;

    /// Drops the job and everything recorded against it.
    async fn remove(&self, job_id: &str) -> Result<(), StoreError>;

    /// Records one failed link. Fails with [`StoreError::Removed`] when the
    /// job was deleted while checks were still in flight.
    async fn append_failure(&self, job_id: &str, failure: LinkResult) -> Result<(), StoreError>;

    /// Everything appended so far, in append order.
    async fn list_failures(&self, job_id: &str) -> Result<Vec<LinkResult>, StoreError>;
}
