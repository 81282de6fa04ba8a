//! Shopping List Repository
//!
//! Document-store implementation of Repository<ShoppingItem>.
//! Translates between store documents and ShoppingItem.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::store::{Document, DocumentStore, Fields};
use super::traits::{RecolorRepository, Repository, SnapshotCallback, Subscription};
use crate::domain::{DomainError, DomainResult, ShoppingItem, SwipeColor, DEFAULT_QUANTITY};

const SWIPE_COLOR_FIELD: &str = "swipeColorHex";

/// Stored document shape. `id` is the document key, never a field.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemDocument {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    quantity: Option<i64>,
    #[serde(default)]
    swipe_color_hex: Option<SwipeColor>,
    #[serde(default)]
    is_selected: Option<bool>,
}

/// Serialize an item into document fields
pub fn item_to_fields(item: &ShoppingItem) -> DomainResult<Fields> {
    let doc = ItemDocument {
        name: Some(item.name.clone()),
        quantity: Some(i64::from(item.quantity)),
        swipe_color_hex: Some(item.swipe_color.clone()),
        is_selected: Some(item.is_selected),
    };
    match serde_json::to_value(doc).map_err(|e| DomainError::Internal(e.to_string()))? {
        Value::Object(fields) => Ok(fields),
        other => Err(DomainError::Internal(format!("item serialized to {}", other))),
    }
}

/// Convert a store document to ShoppingItem
pub fn document_to_item(doc: &Document) -> DomainResult<ShoppingItem> {
    let parsed: ItemDocument = serde_json::from_value(Value::Object(doc.fields.clone()))
        .map_err(|e| DomainError::Parse(format!("document {}: {}", doc.id, e)))?;

    let quantity = parsed
        .quantity
        .and_then(|q| u32::try_from(q).ok())
        .filter(|q| *q > 0)
        .unwrap_or(DEFAULT_QUANTITY);

    Ok(ShoppingItem {
        id: Some(doc.id.clone()),
        name: parsed.name.unwrap_or_default(),
        quantity,
        swipe_color: parsed.swipe_color_hex.unwrap_or_default(),
        is_selected: parsed.is_selected.unwrap_or(false),
    })
}

/// Readable documents in order; a stray record is skipped, not fatal
fn documents_to_items(collection: &str, docs: &[Document]) -> Vec<ShoppingItem> {
    docs.iter()
        .filter_map(|doc| match document_to_item(doc) {
            Ok(item) => Some(item),
            Err(e) => {
                log::warn!("Skipping unreadable document in {}: {}", collection, e);
                None
            }
        })
        .collect()
}

/// Shopping list access over any document store
#[derive(Clone)]
pub struct ShoppingListRepository {
    store: Arc<dyn DocumentStore>,
    collection: String,
}

impl ShoppingListRepository {
    pub fn new(store: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }
}

#[async_trait]
impl Repository<ShoppingItem> for ShoppingListRepository {
    async fn fetch_all(&self) -> DomainResult<Vec<ShoppingItem>> {
        let docs = self.store.get_all(&self.collection).await.map_err(|e| {
            log::error!("Error fetching items: {}", e);
            DomainError::from(e)
        })?;

        Ok(documents_to_items(&self.collection, &docs))
    }

    fn observe(&self, callback: SnapshotCallback<ShoppingItem>) -> Subscription {
        let mut rx = self.store.subscribe(&self.collection);
        let collection = self.collection.clone();

        let task = tokio::spawn(async move {
            while let Some(batch) = rx.recv().await {
                match batch {
                    Ok(docs) => callback(documents_to_items(&collection, &docs)),
                    Err(e) => log::warn!("Error observing {}: {}", collection, e),
                }
            }
            log::debug!("Subscription to {} ended", collection);
        });

        Subscription::new(task)
    }

    async fn add(&self, entity: &ShoppingItem) -> DomainResult<()> {
        let fields = item_to_fields(entity)?;
        let id = self.store.add(&self.collection, fields).await.map_err(|e| {
            log::error!("Error adding item: {}", e);
            DomainError::from(e)
        })?;
        log::debug!("Added item {:?} as {}", entity.name, id);
        Ok(())
    }

    async fn remove(&self, entity: &ShoppingItem) -> DomainResult<()> {
        let Some(id) = entity.id.as_deref() else {
            return Ok(());
        };
        self.store.delete(&self.collection, id).await.map_err(|e| {
            log::error!("Error removing item: {}", e);
            DomainError::from(e)
        })
    }

    async fn save(&self, entity: &ShoppingItem) -> DomainResult<()> {
        let Some(id) = entity.id.as_deref() else {
            return Ok(());
        };
        let fields = item_to_fields(entity)?;
        self.store.set(&self.collection, id, fields).await.map_err(|e| {
            log::error!("Error saving item: {}", e);
            DomainError::from(e)
        })
    }
}

#[async_trait]
impl RecolorRepository for ShoppingListRepository {
    async fn save_color(&self, item: &ShoppingItem, color: &SwipeColor) -> DomainResult<()> {
        let Some(id) = item.id.as_deref() else {
            return Ok(());
        };
        let mut fields = Fields::new();
        fields.insert(SWIPE_COLOR_FIELD.to_string(), Value::String(color.to_string()));

        self.store.update(&self.collection, id, fields).await.map_err(|e| {
            log::error!("Error updating swipe color: {}", e);
            DomainError::from(e)
        })
    }
}
