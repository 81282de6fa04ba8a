//! Repository Layer - Core Traits
//!
//! Defines the abstract interfaces for data access.
//! Implementations sit on top of any `DocumentStore`.

use async_trait::async_trait;
use tokio::task::JoinHandle;

use crate::domain::{DomainResult, Entity, ShoppingItem, SwipeColor};

/// Receives the full current collection on every change
pub type SnapshotCallback<T> = Box<dyn Fn(Vec<T>) + Send + Sync>;

/// Live subscription; dropping it stops delivery
#[derive(Debug)]
pub struct Subscription {
    task: JoinHandle<()>,
}

impl Subscription {
    pub fn new(task: JoinHandle<()>) -> Self {
        Self { task }
    }

    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Core repository trait for list synchronization
///
/// Generic over any Entity type.
/// Failures are logged where they happen and returned to the caller.
#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    /// One-shot read of the whole collection
    async fn fetch_all(&self) -> DomainResult<Vec<T>>;

    /// Register a long-lived snapshot subscription
    fn observe(&self, callback: SnapshotCallback<T>) -> Subscription;

    /// Insert a new entity; the store assigns the id, which is not returned
    async fn add(&self, entity: &T) -> DomainResult<()>;

    /// Delete by id (no-op without one)
    async fn remove(&self, entity: &T) -> DomainResult<()>;

    /// Full overwrite at id (no-op without one)
    async fn save(&self, entity: &T) -> DomainResult<()>;
}

/// Extension for repositories that can persist a color without a full overwrite
#[async_trait]
pub trait RecolorRepository: Repository<ShoppingItem> {
    /// Partial update of the swipe color (no-op without an id)
    async fn save_color(&self, item: &ShoppingItem, color: &SwipeColor) -> DomainResult<()>;
}
