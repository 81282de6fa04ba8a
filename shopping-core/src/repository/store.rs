//! Document Store Abstraction
//!
//! The remote collaborator: a schemaless collection of key -> document
//! records with get/add/set/update/delete and a snapshot subscription.

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::domain::DomainError;

/// Document body; the id is never one of its fields
pub type Fields = Map<String, Value>;

/// A stored document with its store-assigned key
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self { id: id.into(), fields }
    }
}

/// Store-level failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Transport or connectivity failure
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("document not found: {0}")]
    NotFound(String),
    /// The store answered with an error status
    #[error("request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
    /// Payload could not be decoded
    #[error("malformed payload: {0}")]
    Malformed(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Full-collection snapshots, one per change
pub type SnapshotReceiver = mpsc::UnboundedReceiver<StoreResult<Vec<Document>>>;

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => DomainError::NotFound(id),
            StoreError::Malformed(msg) => DomainError::Parse(msg),
            other => DomainError::Store(other.to_string()),
        }
    }
}

/// Remote document collection operations
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read every document in the collection
    async fn get_all(&self, collection: &str) -> StoreResult<Vec<Document>>;

    /// Insert a document; returns the id the store assigned
    async fn add(&self, collection: &str, fields: Fields) -> StoreResult<String>;

    /// Overwrite the whole document at `id`
    async fn set(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<()>;

    /// Overwrite only the given fields of an existing document
    async fn update(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<()>;

    /// Delete the document at `id` (deleting a missing id succeeds)
    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()>;

    /// Subscribe to snapshots. The current snapshot is delivered first.
    /// Must be called from within a tokio runtime.
    fn subscribe(&self, collection: &str) -> SnapshotReceiver;
}
