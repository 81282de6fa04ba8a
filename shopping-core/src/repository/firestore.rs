//! Firestore REST Document Store
//!
//! Talks to the Firestore v1 REST API (or the emulator). The REST surface
//! has no push channel, so `subscribe` polls the collection and forwards a
//! snapshot whenever it differs from the previous one.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::sync::mpsc;

use super::store::{Document, DocumentStore, Fields, SnapshotReceiver, StoreError, StoreResult};
use crate::config::FirestoreConfig;

const PAGE_SIZE: u32 = 300;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<RestDocument>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RestDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

/// Firestore-backed store
#[derive(Clone)]
pub struct FirestoreStore {
    client: Client,
    base_url: String,
    project_id: String,
    database: String,
    api_key: Option<String>,
    poll_interval: Duration,
}

impl FirestoreStore {
    pub fn new(config: &FirestoreConfig) -> StoreResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| StoreError::Unavailable(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            project_id: config.project_id.clone(),
            database: config.database.clone(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            poll_interval: Duration::from_millis(config.poll_interval_ms.max(100)),
        })
    }

    fn collection_url(&self, collection: &str) -> String {
        format!(
            "{}/projects/{}/databases/{}/documents/{}",
            self.base_url, self.project_id, self.database, collection
        )
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}", self.collection_url(collection), id)
    }

    fn with_key(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.query(&[("key", key.as_str())]),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> StoreResult<reqwest::Response> {
        let response = self
            .with_key(request)
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        if status == StatusCode::NOT_FOUND {
            Err(StoreError::NotFound(message))
        } else {
            Err(StoreError::Rejected {
                status: status.as_u16(),
                message,
            })
        }
    }

    async fn list_page(&self, collection: &str, page_token: Option<&str>) -> StoreResult<ListDocumentsResponse> {
        let mut request = self
            .client
            .get(self.collection_url(collection))
            .query(&[("pageSize", PAGE_SIZE.to_string())]);
        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        self.send(request)
            .await?
            .json::<ListDocumentsResponse>()
            .await
            .map_err(|e| StoreError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn get_all(&self, collection: &str) -> StoreResult<Vec<Document>> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = match self.list_page(collection, page_token.as_deref()).await {
                Ok(page) => page,
                // Listing a collection that was never written is not an error
                Err(StoreError::NotFound(_)) if documents.is_empty() => return Ok(documents),
                Err(e) => return Err(e),
            };
            for doc in page.documents {
                documents.push(decode_document(doc)?);
            }
            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }
        Ok(documents)
    }

    async fn add(&self, collection: &str, fields: Fields) -> StoreResult<String> {
        let request = self
            .client
            .post(self.collection_url(collection))
            .json(&json!({ "fields": encode_fields(&fields) }));

        let created = self
            .send(request)
            .await?
            .json::<RestDocument>()
            .await
            .map_err(|e| StoreError::Malformed(e.to_string()))?;
        Ok(document_id(&created.name).to_string())
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<()> {
        let request = self
            .client
            .patch(self.document_url(collection, id))
            .json(&json!({ "fields": encode_fields(&fields) }));
        self.send(request).await.map(|_| ())
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<()> {
        let mut query: Vec<(&str, &str)> = fields
            .keys()
            .map(|k| ("updateMask.fieldPaths", k.as_str()))
            .collect();
        query.push(("currentDocument.exists", "true"));

        let request = self
            .client
            .patch(self.document_url(collection, id))
            .query(&query)
            .json(&json!({ "fields": encode_fields(&fields) }));
        self.send(request).await.map(|_| ())
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        let request = self.client.delete(self.document_url(collection, id));
        self.send(request).await.map(|_| ())
    }

    fn subscribe(&self, collection: &str) -> SnapshotReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        let store = self.clone();
        let collection = collection.to_string();

        tokio::spawn(async move {
            let mut last: Option<Vec<Document>> = None;
            let mut failing = false;

            loop {
                match store.get_all(&collection).await {
                    Ok(docs) => {
                        failing = false;
                        if last.as_ref() != Some(&docs) {
                            if tx.send(Ok(docs.clone())).is_err() {
                                break;
                            }
                            last = Some(docs);
                        }
                    }
                    Err(e) => {
                        // Report the first failure of a streak only
                        if !failing && tx.send(Err(e)).is_err() {
                            break;
                        }
                        failing = true;
                    }
                }

                tokio::select! {
                    _ = tokio::time::sleep(store.poll_interval) => {}
                    _ = tx.closed() => break,
                }
            }
            log::debug!("Firestore poller for {} stopped", collection);
        });

        rx
    }
}

/// Last path segment of `projects/.../documents/<collection>/<id>`
fn document_id(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

fn decode_document(doc: RestDocument) -> StoreResult<Document> {
    let mut fields = Fields::new();
    for (key, value) in &doc.fields {
        fields.insert(key.clone(), decode_value(value)?);
    }
    Ok(Document::new(document_id(&doc.name), fields))
}

/// Plain JSON -> Firestore typed value map
pub(crate) fn encode_fields(fields: &Fields) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|(k, v)| (k.clone(), encode_value(v)))
            .collect(),
    )
}

fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match (n.as_i64(), n.as_u64()) {
            (Some(i), _) => json!({ "integerValue": i.to_string() }),
            (None, Some(u)) => json!({ "integerValue": u.to_string() }),
            _ => json!({ "doubleValue": n.as_f64().unwrap_or(0.0) }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => json!({
            "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() }
        }),
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

/// Firestore typed value -> plain JSON
pub(crate) fn decode_value(value: &Value) -> StoreResult<Value> {
    let map = value
        .as_object()
        .ok_or_else(|| StoreError::Malformed(format!("expected typed value, got {}", value)))?;
    let (kind, inner) = map
        .iter()
        .next()
        .ok_or_else(|| StoreError::Malformed("empty typed value".to_string()))?;

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => inner
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| StoreError::Malformed(format!("bad booleanValue: {}", inner))),
        "integerValue" => {
            let parsed = match inner {
                Value::String(s) => s.parse::<i64>().ok(),
                Value::Number(n) => n.as_i64(),
                _ => None,
            };
            parsed
                .map(Value::from)
                .ok_or_else(|| StoreError::Malformed(format!("bad integerValue: {}", inner)))
        }
        "doubleValue" => inner
            .as_f64()
            .map(Value::from)
            .ok_or_else(|| StoreError::Malformed(format!("bad doubleValue: {}", inner))),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner
            .as_str()
            .map(|s| Value::String(s.to_string()))
            .ok_or_else(|| StoreError::Malformed(format!("bad {}: {}", kind, inner))),
        "arrayValue" => {
            let values = match inner.get("values") {
                Some(Value::Array(values)) => values.iter().map(decode_value).collect::<StoreResult<Vec<_>>>()?,
                _ => Vec::new(),
            };
            Ok(Value::Array(values))
        }
        "mapValue" => {
            let mut out = Map::new();
            if let Some(Value::Object(fields)) = inner.get("fields") {
                for (k, v) in fields {
                    out.insert(k.clone(), decode_value(v)?);
                }
            }
            Ok(Value::Object(out))
        }
        other => Err(StoreError::Malformed(format!("unsupported value type: {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item_fields() -> Fields {
        json!({
            "name": "Milk",
            "quantity": 2,
            "swipeColorHex": "#B7E0FF",
            "isSelected": false
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    #[test]
    fn test_encode_item_fields() {
        let encoded = encode_fields(&item_fields());
        assert_eq!(encoded["name"], json!({ "stringValue": "Milk" }));
        assert_eq!(encoded["quantity"], json!({ "integerValue": "2" }));
        assert_eq!(encoded["swipeColorHex"], json!({ "stringValue": "#B7E0FF" }));
        assert_eq!(encoded["isSelected"], json!({ "booleanValue": false }));
    }

    #[test]
    fn test_decode_rest_document() {
        let raw: RestDocument = serde_json::from_value(json!({
            "name": "projects/p/databases/(default)/documents/shopping_items/A1",
            "fields": encode_fields(&item_fields()),
            "createTime": "2024-01-01T00:00:00Z"
        }))
        .unwrap();

        let doc = decode_document(raw).unwrap();
        assert_eq!(doc.id, "A1");
        assert_eq!(doc.fields, item_fields());
    }

    #[test]
    fn test_nested_values() {
        let value = json!({ "tags": ["a", 1.5, null], "meta": { "k": true } });
        let encoded = encode_value(&value);
        assert_eq!(decode_value(&encoded).unwrap(), value);
    }

    #[test]
    fn test_decode_rejects_unknown_types() {
        assert!(decode_value(&json!({ "geoPointValue": {} })).is_err());
        assert!(decode_value(&json!("plain")).is_err());
        assert!(decode_value(&json!({ "integerValue": "two" })).is_err());
    }

    #[test]
    fn test_urls() {
        let store = FirestoreStore::new(&FirestoreConfig {
            project_id: "shop".to_string(),
            base_url: "http://localhost:8080/v1/".to_string(),
            ..FirestoreConfig::default()
        })
        .unwrap();
        assert_eq!(
            store.document_url("shopping_items", "A1"),
            "http://localhost:8080/v1/projects/shop/databases/(default)/documents/shopping_items/A1"
        );
    }

    #[test]
    fn test_list_response_without_documents() {
        let page: ListDocumentsResponse = serde_json::from_value(json!({})).unwrap();
        assert!(page.documents.is_empty());
        assert!(page.next_page_token.is_none());
    }
}
