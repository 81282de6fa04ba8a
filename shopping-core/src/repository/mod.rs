//! Repository Layer
//!
//! Data access abstractions and implementations.

mod traits;
mod store;
mod memory;
mod firestore;
mod item_repo;

#[cfg(test)]
mod tests;

pub use traits::{Repository, RecolorRepository, SnapshotCallback, Subscription};
pub use store::{Document, DocumentStore, Fields, SnapshotReceiver, StoreError, StoreResult};
pub use memory::MemoryStore;
pub use firestore::FirestoreStore;
pub use item_repo::{ShoppingListRepository, item_to_fields, document_to_item};
