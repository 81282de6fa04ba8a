//! Repository Integration Tests
//!
//! Tests for ShoppingListRepository against the in-memory store.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::mpsc;

use crate::domain::{ShoppingItem, SwipeColor};
use crate::repository::{
    document_to_item, item_to_fields, Document, MemoryStore, RecolorRepository, Repository,
    ShoppingListRepository, StoreError,
};

const COLLECTION: &str = "shopping_items";

fn setup_repo() -> (MemoryStore, ShoppingListRepository) {
    let store = MemoryStore::new();
    let repo = ShoppingListRepository::new(Arc::new(store.clone()), COLLECTION);
    (store, repo)
}

async fn next_snapshot(rx: &mut mpsc::UnboundedReceiver<Vec<ShoppingItem>>) -> Vec<ShoppingItem> {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("snapshot timed out")
        .expect("subscription closed")
}

#[tokio::test]
async fn test_add_then_fetch() {
    let (store, repo) = setup_repo();
    store.queue_ids(["A1"]);

    let draft = ShoppingItem::new("Milk", 2);
    repo.add(&draft).await.expect("Failed to add");

    let items = repo.fetch_all().await.expect("Fetch failed");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0], ShoppingItem::new("Milk", 2).with_id("A1"));
    assert_eq!(items[0].swipe_color.as_str(), "#B7E0FF");
    assert!(!items[0].is_selected);
}

#[tokio::test]
async fn test_add_does_not_populate_id() {
    let (_store, repo) = setup_repo();
    let draft = ShoppingItem::new("Bread", 1);
    repo.add(&draft).await.unwrap();
    assert!(draft.id.is_none());
}

#[tokio::test]
async fn test_document_shape() {
    let (store, repo) = setup_repo();
    store.queue_ids(["A1"]);
    repo.add(&ShoppingItem::new("Milk", 2)).await.unwrap();

    let doc = store.document(COLLECTION, "A1").unwrap();
    assert_eq!(
        serde_json::Value::Object(doc.fields),
        json!({ "name": "Milk", "quantity": 2, "swipeColorHex": "#B7E0FF", "isSelected": false })
    );
}

#[tokio::test]
async fn test_remove_by_id() {
    let (store, repo) = setup_repo();
    store.queue_ids(["A1", "B2"]);
    repo.add(&ShoppingItem::new("Milk", 1)).await.unwrap();
    repo.add(&ShoppingItem::new("Eggs", 6)).await.unwrap();

    repo.remove(&ShoppingItem::new("Milk", 1).with_id("A1")).await.expect("Remove failed");

    let ids: Vec<_> = repo.fetch_all().await.unwrap().into_iter().filter_map(|i| i.id).collect();
    assert_eq!(ids, vec!["B2".to_string()]);
}

#[tokio::test]
async fn test_remove_and_save_without_id_skip_store() {
    let (store, repo) = setup_repo();
    let unsaved = ShoppingItem::new("Ghost", 1);

    repo.remove(&unsaved).await.unwrap();
    repo.save(&unsaved).await.unwrap();
    repo.save_color(&unsaved, &SwipeColor::from_rgb(1, 2, 3)).await.unwrap();

    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn test_save_overwrites_document() {
    let (store, repo) = setup_repo();
    store.queue_ids(["A1"]);
    repo.add(&ShoppingItem::new("Milk", 1)).await.unwrap();

    let toggled = ShoppingItem::new("Milk", 1).with_id("A1").toggled();
    repo.save(&toggled).await.expect("Save failed");

    let found = repo.fetch_all().await.unwrap();
    assert_eq!(found, vec![toggled]);
}

#[tokio::test]
async fn test_save_color_updates_only_color() {
    let (store, repo) = setup_repo();
    store.queue_ids(["A1"]);
    repo.add(&ShoppingItem::new("Milk", 4)).await.unwrap();

    let item = ShoppingItem::new("Milk", 4).with_id("A1");
    let color = SwipeColor::parse("#C8F7C5").unwrap();
    repo.save_color(&item, &color).await.expect("Recolor failed");

    let doc = store.document(COLLECTION, "A1").unwrap();
    assert_eq!(doc.fields["swipeColorHex"], "#C8F7C5");
    assert_eq!(doc.fields["quantity"], 4);
}

#[tokio::test]
async fn test_save_color_missing_document_is_error() {
    let (_store, repo) = setup_repo();
    let item = ShoppingItem::new("Milk", 1).with_id("gone");
    let result = repo.save_color(&item, &SwipeColor::default()).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_fetch_failure_is_reported() {
    let (store, repo) = setup_repo();
    store.set_offline(true);
    assert!(repo.fetch_all().await.is_err());
    assert!(repo.add(&ShoppingItem::new("Milk", 1)).await.is_err());
}

#[tokio::test]
async fn test_fetch_skips_unreadable_documents() {
    let (store, repo) = setup_repo();
    store.insert(COLLECTION, "A1", item_to_fields(&ShoppingItem::new("Milk", 2)).unwrap());
    store.insert(COLLECTION, "bad", json!({ "name": 42 }).as_object().cloned().unwrap());
    store.insert(COLLECTION, "C3", json!({ "name": "Tea", "quantity": 1.5 }).as_object().cloned().unwrap());

    let items = repo.fetch_all().await.unwrap();
    let ids: Vec<_> = items.iter().filter_map(|i| i.id.as_deref()).collect();
    assert_eq!(ids, vec!["A1"]);
}

#[tokio::test]
async fn test_observe_skips_unreadable_documents() {
    let (store, repo) = setup_repo();
    store.insert(COLLECTION, "bad", json!({ "isSelected": "yes" }).as_object().cloned().unwrap());
    store.insert(COLLECTION, "A1", item_to_fields(&ShoppingItem::new("Milk", 2)).unwrap());

    let (tx, mut rx) = mpsc::unbounded_channel();
    let _sub = repo.observe(Box::new(move |items| {
        let _ = tx.send(items);
    }));

    let snapshot = next_snapshot(&mut rx).await;
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].id.as_deref(), Some("A1"));
}

#[tokio::test]
async fn test_observe_delivers_full_snapshots() {
    let (_store, repo) = setup_repo();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let _sub = repo.observe(Box::new(move |items| {
        let _ = tx.send(items);
    }));

    assert!(next_snapshot(&mut rx).await.is_empty());

    repo.add(&ShoppingItem::new("Milk", 1)).await.unwrap();
    assert_eq!(next_snapshot(&mut rx).await.len(), 1);

    repo.add(&ShoppingItem::new("Eggs", 12)).await.unwrap();
    let snapshot = next_snapshot(&mut rx).await;
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot[0].name, "Milk");
    assert_eq!(snapshot[1].name, "Eggs");
}

#[tokio::test]
async fn test_observe_errors_deliver_nothing() {
    let (store, repo) = setup_repo();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let _sub = repo.observe(Box::new(move |items| {
        let _ = tx.send(items);
    }));
    assert!(next_snapshot(&mut rx).await.is_empty());

    store.fail_subscribers(COLLECTION, StoreError::Unavailable("offline".to_string()));
    let nothing = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await;
    assert!(nothing.is_err());
}

#[tokio::test]
async fn test_dropping_subscription_stops_delivery() {
    let (store, repo) = setup_repo();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let sub = repo.observe(Box::new(move |items| {
        let _ = tx.send(items);
    }));
    next_snapshot(&mut rx).await;
    assert!(sub.is_active());

    drop(sub);
    repo.add(&ShoppingItem::new("Milk", 1)).await.unwrap();

    // The callback (and its sender) is dropped with the task
    let closed = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await;
    assert_eq!(closed.expect("channel should close"), None);
    assert_eq!(store.write_count(), 1);
}

#[test]
fn test_document_defaults() {
    let doc = Document::new("A1", json!({ "name": "Tea" }).as_object().cloned().unwrap());
    let item = document_to_item(&doc).unwrap();
    assert_eq!(item.id.as_deref(), Some("A1"));
    assert_eq!(item.quantity, 1);
    assert_eq!(item.swipe_color, SwipeColor::default());
    assert!(!item.is_selected);
}

#[test]
fn test_document_non_positive_quantity_reads_as_one() {
    let doc = Document::new("A1", json!({ "name": "Tea", "quantity": 0 }).as_object().cloned().unwrap());
    assert_eq!(document_to_item(&doc).unwrap().quantity, 1);
}

#[test]
fn test_fields_never_contain_id() {
    let fields = item_to_fields(&ShoppingItem::new("Tea", 1).with_id("A1")).unwrap();
    assert!(!fields.contains_key("id"));
    assert_eq!(fields.len(), 4);
}
