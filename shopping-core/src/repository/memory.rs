//! In-Memory Document Store
//!
//! Process-local collection with push-style snapshot delivery. Used as the
//! default backend and as the store double in tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::store::{Document, DocumentStore, Fields, SnapshotReceiver, StoreError, StoreResult};

type SnapshotSender = mpsc::UnboundedSender<StoreResult<Vec<Document>>>;

#[derive(Default)]
struct Collection {
    /// Insertion order is the delivery order
    docs: Vec<Document>,
    subscribers: Vec<SnapshotSender>,
}

impl Collection {
    fn notify(&mut self) {
        let snapshot = self.docs.clone();
        self.subscribers.retain(|tx| tx.send(Ok(snapshot.clone())).is_ok());
    }
}

#[derive(Default)]
struct MemoryInner {
    collections: HashMap<String, Collection>,
    offline: bool,
    queued_ids: VecDeque<String>,
    writes: usize,
}

/// Shared in-memory store; clones see the same data
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Simulate losing (or regaining) connectivity
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Ids handed out by the next `add` calls, before random ones
    pub fn queue_ids<I, S>(&self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lock().queued_ids.extend(ids.into_iter().map(Into::into));
    }

    /// Seed a document directly, notifying subscribers
    pub fn insert(&self, collection: &str, id: &str, fields: Fields) {
        let mut inner = self.lock();
        let coll = inner.collections.entry(collection.to_string()).or_default();
        match coll.docs.iter_mut().find(|d| d.id == id) {
            Some(doc) => doc.fields = fields,
            None => coll.docs.push(Document::new(id, fields)),
        }
        coll.notify();
    }

    /// Current document at `id`, bypassing the offline switch
    pub fn document(&self, collection: &str, id: &str) -> Option<Document> {
        self.lock()
            .collections
            .get(collection)
            .and_then(|c| c.docs.iter().find(|d| d.id == id).cloned())
    }

    /// Number of add/set/update/delete calls that reached the store
    pub fn write_count(&self) -> usize {
        self.lock().writes
    }

    /// Push an error to every subscriber of the collection
    pub fn fail_subscribers(&self, collection: &str, error: StoreError) {
        let mut inner = self.lock();
        if let Some(coll) = inner.collections.get_mut(collection) {
            coll.subscribers.retain(|tx| tx.send(Err(error.clone())).is_ok());
        }
    }

    fn check_online(inner: &MemoryInner) -> StoreResult<()> {
        if inner.offline {
            Err(StoreError::Unavailable("network is unreachable".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_all(&self, collection: &str) -> StoreResult<Vec<Document>> {
        let inner = self.lock();
        Self::check_online(&inner)?;
        Ok(inner
            .collections
            .get(collection)
            .map(|c| c.docs.clone())
            .unwrap_or_default())
    }

    async fn add(&self, collection: &str, fields: Fields) -> StoreResult<String> {
        let mut inner = self.lock();
        Self::check_online(&inner)?;
        inner.writes += 1;

        let id = inner
            .queued_ids
            .pop_front()
            .unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string());
        let coll = inner.collections.entry(collection.to_string()).or_default();
        coll.docs.push(Document::new(id.clone(), fields));
        coll.notify();
        Ok(id)
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<()> {
        let mut inner = self.lock();
        Self::check_online(&inner)?;
        inner.writes += 1;

        let coll = inner.collections.entry(collection.to_string()).or_default();
        match coll.docs.iter_mut().find(|d| d.id == id) {
            Some(doc) => doc.fields = fields,
            None => coll.docs.push(Document::new(id, fields)),
        }
        coll.notify();
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<()> {
        let mut inner = self.lock();
        Self::check_online(&inner)?;
        inner.writes += 1;

        let coll = inner
            .collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let doc = coll
            .docs
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        doc.fields.extend(fields);
        coll.notify();
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        let mut inner = self.lock();
        Self::check_online(&inner)?;
        inner.writes += 1;

        if let Some(coll) = inner.collections.get_mut(collection) {
            let before = coll.docs.len();
            coll.docs.retain(|d| d.id != id);
            if coll.docs.len() != before {
                coll.notify();
            }
        }
        Ok(())
    }

    fn subscribe(&self, collection: &str) -> SnapshotReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.lock();
        let coll = inner.collections.entry(collection.to_string()).or_default();
        if tx.send(Ok(coll.docs.clone())).is_ok() {
            coll.subscribers.push(tx);
        }
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(name: &str) -> Fields {
        json!({ "name": name }).as_object().cloned().unwrap_or_default()
    }

    #[tokio::test]
    async fn test_add_assigns_queued_then_random_ids() {
        let store = MemoryStore::new();
        store.queue_ids(["A1"]);

        let first = store.add("items", fields("Milk")).await.unwrap();
        let second = store.add("items", fields("Eggs")).await.unwrap();
        assert_eq!(first, "A1");
        assert_ne!(second, "A1");
        assert!(!second.is_empty());

        let docs = store.get_all("items").await.unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].id, "A1");
    }

    #[tokio::test]
    async fn test_subscribe_gets_initial_and_change_snapshots() {
        let store = MemoryStore::new();
        let mut rx = store.subscribe("items");

        let initial = rx.recv().await.unwrap().unwrap();
        assert!(initial.is_empty());

        store.add("items", fields("Milk")).await.unwrap();
        let next = rx.recv().await.unwrap().unwrap();
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].fields["name"], "Milk");
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let store = MemoryStore::new();
        store.insert("items", "A1", json!({ "name": "Milk", "quantity": 2 }).as_object().cloned().unwrap());

        let patch = json!({ "quantity": 3 }).as_object().cloned().unwrap();
        store.update("items", "A1", patch).await.unwrap();

        let doc = store.document("items", "A1").unwrap();
        assert_eq!(doc.fields["name"], "Milk");
        assert_eq!(doc.fields["quantity"], 3);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let store = MemoryStore::new();
        let err = store.update("items", "nope", Fields::new()).await.unwrap_err();
        assert_eq!(err, StoreError::NotFound("nope".to_string()));
    }

    #[tokio::test]
    async fn test_offline_rejects_calls() {
        let store = MemoryStore::new();
        store.set_offline(true);
        assert!(matches!(store.get_all("items").await, Err(StoreError::Unavailable(_))));
        assert!(store.add("items", fields("Milk")).await.is_err());
        assert_eq!(store.write_count(), 0);

        store.set_offline(false);
        assert!(store.add("items", fields("Milk")).await.is_ok());
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_delete_missing_succeeds() {
        let store = MemoryStore::new();
        assert!(store.delete("items", "ghost").await.is_ok());
    }
}
