//! Backing-store trait.
//!
//! The pipeline consumes the store through this trait and treats every
//! call as a single suspension point, whether the implementation is an
//! in-memory map (synchronous under the hood) or a document database.
//! Stores are constructed once at process start and injected by handle;
//! there is no global store singleton.
//!
//! Implementations must hand out deep copies: callers may mutate the
//! records they receive without corrupting stored state. Conflicting
//! writes to the same resource are serialized by the store itself.

use crate::error::ApiError;
use crate::record::Record;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// A boxed future, the return type of store operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Failures the backing store can report.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No record with the given id exists in the resource.
    #[error("{resource} record {id} does not exist")]
    NotFound {
        /// The resource name.
        resource: String,
        /// The id that was addressed.
        id: u64,
    },

    /// The storage backend failed.
    #[error("store backend failure")]
    Backend(#[from] anyhow::Error),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { resource, id } => Self::RecordNotFound {
                resource,
                id: id.to_string(),
            },
            StoreError::Backend(source) => Self::Internal {
                source: Some(source),
            },
        }
    }
}

/// CRUD interface of the backing store.
///
/// Records carry their id under [`crate::ID_KEY`]; `insert` assigns a
/// fresh one and returns it.
pub trait ResourceStore: Send + Sync {
    /// Returns all records of a resource, in insertion order.
    fn find<'a>(&'a self, resource: &'a str) -> BoxFuture<'a, StoreResult<Vec<Record>>>;

    /// Returns the record with the given id, or `None`.
    fn find_by_id<'a>(
        &'a self,
        resource: &'a str,
        id: u64,
    ) -> BoxFuture<'a, StoreResult<Option<Record>>>;

    /// Inserts a record, assigning and returning a fresh id.
    fn insert<'a>(&'a self, resource: &'a str, record: Record) -> BoxFuture<'a, StoreResult<u64>>;

    /// Replaces the record with the given id wholesale.
    fn replace<'a>(
        &'a self,
        resource: &'a str,
        id: u64,
        record: Record,
    ) -> BoxFuture<'a, StoreResult<()>>;

    /// Removes the record with the given id.
    fn remove<'a>(&'a self, resource: &'a str, id: u64) -> BoxFuture<'a, StoreResult<()>>;
}
