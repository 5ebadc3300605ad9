//! Durable document store: named collections persisted as one JSON snapshot.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use chrono::Utc;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::StoreError;

/// A single stored record: generated `id`, user fields, timestamp metadata.
pub type Document = Map<String, Value>;

type Collections = BTreeMap<String, Vec<Document>>;

/// Keys managed by the store itself. Caller-supplied values for them are
/// ignored, keeping `id` and `created_at` immutable after insert.
const RESERVED_FIELDS: [&str; 3] = ["id", "created_at", "updated_at"];

/// A mapping from collection name to an ordered list of documents.
///
/// The whole mapping is the unit of durability: every successful mutation
/// rewrites the backing file before returning. One instance owns its file
/// exclusively, and an internal mutex linearizes the read-modify-persist
/// sequences, so within one instance there is at most one writer at a time.
pub struct DocumentStore {
    path: PathBuf,
    collections: Mutex<Collections>,
}

impl DocumentStore {
    /// Open the store at `path`. An existing snapshot is loaded; otherwise
    /// the store starts empty and the empty snapshot is written immediately,
    /// so the file always exists after startup.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let collections: Collections = serde_json::from_slice(&bytes)?;
                tracing::debug!(path = %path.display(), collections = collections.len(), "snapshot loaded");
                Ok(Self {
                    collections: Mutex::new(collections),
                    path,
                })
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                let store = Self {
                    collections: Mutex::new(Collections::new()),
                    path,
                };
                let collections = store.collections.lock().await;
                store.write_snapshot(&collections).await?;
                drop(collections);
                Ok(store)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Documents of `collection` in insertion order, as a snapshot rather
    /// than a live view. With a non-empty `filter`, a document is kept when
    /// any filter field's value contains that filter's text,
    /// case-insensitively. Unknown collections are empty.
    pub async fn select(&self, collection: &str, filter: &HashMap<String, String>) -> Vec<Document> {
        let collections = self.collections.lock().await;
        let documents = match collections.get(collection) {
            Some(documents) => documents,
            None => return Vec::new(),
        };
        if filter.is_empty() {
            return documents.clone();
        }
        documents
            .iter()
            .filter(|document| matches_filter(document, filter))
            .cloned()
            .collect()
    }

    /// Store `fields` as a new document: fresh id, `created_at` stamped,
    /// `updated_at` null. The collection is created on first insert. Returns
    /// the document as stored.
    pub async fn insert(&self, collection: &str, fields: Document) -> Result<Document, StoreError> {
        let mut document = strip_reserved(fields);
        document.insert("id".into(), Value::String(Uuid::new_v4().to_string()));
        document.insert("created_at".into(), Value::String(Utc::now().to_rfc3339()));
        document.insert("updated_at".into(), Value::Null);

        let mut collections = self.collections.lock().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .push(document.clone());
        self.write_snapshot(&collections).await?;
        tracing::debug!(collection, id = ?document.get("id"), "insert");
        Ok(document)
    }

    /// Merge the present `fields` onto the document with `id` and stamp
    /// `updated_at`. Fields the caller omitted stay untouched. `None` when
    /// the collection or id is unknown.
    pub async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Document,
    ) -> Result<Option<Document>, StoreError> {
        let mut collections = self.collections.lock().await;
        let document = match collections
            .get_mut(collection)
            .and_then(|documents| documents.iter_mut().find(|document| doc_id(document) == Some(id)))
        {
            Some(document) => document,
            None => return Ok(None),
        };
        for (key, value) in strip_reserved(fields) {
            document.insert(key, value);
        }
        document.insert("updated_at".into(), Value::String(Utc::now().to_rfc3339()));
        let updated = document.clone();
        self.write_snapshot(&collections).await?;
        tracing::debug!(collection, id, "update");
        Ok(Some(updated))
    }

    /// Remove the document with `id`. `false` when the collection or id is
    /// unknown.
    pub async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        let mut collections = self.collections.lock().await;
        let documents = match collections.get_mut(collection) {
            Some(documents) => documents,
            None => return Ok(false),
        };
        let index = match documents.iter().position(|document| doc_id(document) == Some(id)) {
            Some(index) => index,
            None => return Ok(false),
        };
        documents.remove(index);
        self.write_snapshot(&collections).await?;
        tracing::debug!(collection, id, "delete");
        Ok(true)
    }

    /// Serialize the whole store and overwrite the backing file.
    async fn write_snapshot(&self, collections: &Collections) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(collections)?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }
}

fn doc_id(document: &Document) -> Option<&str> {
    document.get("id").and_then(Value::as_str)
}

fn strip_reserved(mut fields: Document) -> Document {
    for key in RESERVED_FIELDS {
        fields.remove(key);
    }
    fields
}

/// OR across filter fields; non-string values are matched on their JSON
/// rendering, so filtering `{id: exactId}` works by containment.
fn matches_filter(document: &Document, filter: &HashMap<String, String>) -> bool {
    filter.iter().any(|(field, needle)| {
        document
            .get(field)
            .map(|value| {
                let haystack = match value {
                    Value::String(text) => text.to_lowercase(),
                    other => other.to_string().to_lowercase(),
                };
                haystack.contains(&needle.to_lowercase())
            })
            .unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("fields must be an object"),
        }
    }

    async fn temp_store() -> (tempfile::TempDir, DocumentStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::open(dir.path().join("db.json")).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn open_writes_empty_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        let _store = DocumentStore::open(&path).await.unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert_eq!(raw, "{}");
    }

    #[tokio::test]
    async fn insert_generates_id_and_timestamps() {
        let (_dir, store) = temp_store().await;
        let task = store
            .insert("tasks", fields(json!({"title": "a", "description": "b"})))
            .await
            .unwrap();

        let id = task.get("id").and_then(Value::as_str).unwrap();
        assert!(!id.is_empty());
        assert!(task.get("created_at").and_then(Value::as_str).is_some());
        assert_eq!(task.get("updated_at"), Some(&Value::Null));
        assert_eq!(task.get("title"), Some(&json!("a")));
        assert_eq!(task.get("description"), Some(&json!("b")));

        let all = store.select("tasks", &HashMap::new()).await;
        assert_eq!(all, vec![task]);
    }

    #[tokio::test]
    async fn insert_ignores_reserved_fields() {
        let (_dir, store) = temp_store().await;
        let task = store
            .insert("tasks", fields(json!({"id": "forced", "created_at": "then", "title": "a"})))
            .await
            .unwrap();
        assert_ne!(task.get("id"), Some(&json!("forced")));
        assert_ne!(task.get("created_at"), Some(&json!("then")));
    }

    #[tokio::test]
    async fn ids_are_unique() {
        let (_dir, store) = temp_store().await;
        let a = store.insert("tasks", Document::new()).await.unwrap();
        let b = store.insert("tasks", Document::new()).await.unwrap();
        assert_ne!(a.get("id"), b.get("id"));
    }

    #[tokio::test]
    async fn select_preserves_insertion_order() {
        let (_dir, store) = temp_store().await;
        for title in ["first", "second", "third"] {
            store
                .insert("tasks", fields(json!({"title": title})))
                .await
                .unwrap();
        }
        let titles: Vec<_> = store
            .select("tasks", &HashMap::new())
            .await
            .iter()
            .map(|document| document.get("title").cloned().unwrap())
            .collect();
        assert_eq!(titles, vec![json!("first"), json!("second"), json!("third")]);
    }

    #[tokio::test]
    async fn select_unknown_collection_is_empty() {
        let (_dir, store) = temp_store().await;
        assert!(store.select("nothing", &HashMap::new()).await.is_empty());
    }

    #[tokio::test]
    async fn filter_is_case_insensitive_substring() {
        let (_dir, store) = temp_store().await;
        store
            .insert("tasks", fields(json!({"title": "Absolute", "description": "x"})))
            .await
            .unwrap();
        store
            .insert("tasks", fields(json!({"title": "other", "description": "y"})))
            .await
            .unwrap();

        let filter = HashMap::from([("title".to_string(), "ab".to_string())]);
        let found = store.select("tasks", &filter).await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].get("title"), Some(&json!("Absolute")));
    }

    #[tokio::test]
    async fn filter_is_or_across_fields() {
        let (_dir, store) = temp_store().await;
        store
            .insert("tasks", fields(json!({"title": "groceries", "description": "milk"})))
            .await
            .unwrap();
        store
            .insert("tasks", fields(json!({"title": "report", "description": "groceries budget"})))
            .await
            .unwrap();

        let filter = HashMap::from([
            ("title".to_string(), "groceries".to_string()),
            ("description".to_string(), "groceries".to_string()),
        ]);
        assert_eq!(store.select("tasks", &filter).await.len(), 2);
    }

    #[tokio::test]
    async fn filter_by_exact_id() {
        let (_dir, store) = temp_store().await;
        let task = store.insert("tasks", fields(json!({"title": "a"}))).await.unwrap();
        store.insert("tasks", fields(json!({"title": "b"}))).await.unwrap();

        let id = task.get("id").and_then(Value::as_str).unwrap();
        let filter = HashMap::from([("id".to_string(), id.to_string())]);
        let found = store.select("tasks", &filter).await;
        assert_eq!(found, vec![task]);
    }

    #[tokio::test]
    async fn update_merges_present_fields_only() {
        let (_dir, store) = temp_store().await;
        let task = store
            .insert("tasks", fields(json!({"title": "a", "description": "b"})))
            .await
            .unwrap();
        let id = task.get("id").and_then(Value::as_str).unwrap().to_string();

        let updated = store
            .update("tasks", &id, fields(json!({"title": "changed"})))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.get("title"), Some(&json!("changed")));
        assert_eq!(updated.get("description"), Some(&json!("b")));
        assert_eq!(updated.get("id"), Some(&json!(id.clone())));
        assert_eq!(updated.get("created_at"), task.get("created_at"));
        assert!(updated.get("updated_at").and_then(Value::as_str).is_some());
    }

    #[tokio::test]
    async fn update_unknown_id_or_collection_is_none() {
        let (_dir, store) = temp_store().await;
        store.insert("tasks", fields(json!({"title": "a"}))).await.unwrap();
        assert!(store
            .update("tasks", "missing", Document::new())
            .await
            .unwrap()
            .is_none());
        assert!(store
            .update("nothing", "missing", Document::new())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn delete_removes_permanently() {
        let (_dir, store) = temp_store().await;
        let task = store.insert("tasks", fields(json!({"title": "a"}))).await.unwrap();
        let id = task.get("id").and_then(Value::as_str).unwrap().to_string();

        assert!(store.delete("tasks", &id).await.unwrap());
        let filter = HashMap::from([("id".to_string(), id.clone())]);
        assert!(store.select("tasks", &filter).await.is_empty());
        assert!(!store.delete("tasks", &id).await.unwrap());
        assert!(!store.delete("nothing", &id).await.unwrap());
    }

    #[tokio::test]
    async fn snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");

        let store = DocumentStore::open(&path).await.unwrap();
        store
            .insert("tasks", fields(json!({"title": "a", "description": "b"})))
            .await
            .unwrap();
        store.insert("users", fields(json!({"name": "ada"}))).await.unwrap();
        let tasks_before = store.select("tasks", &HashMap::new()).await;
        let users_before = store.select("users", &HashMap::new()).await;
        drop(store);

        let reopened = DocumentStore::open(&path).await.unwrap();
        assert_eq!(reopened.select("tasks", &HashMap::new()).await, tasks_before);
        assert_eq!(reopened.select("users", &HashMap::new()).await, users_before);
    }

    #[tokio::test]
    async fn mutations_rewrite_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        let store = DocumentStore::open(&path).await.unwrap();

        let task = store.insert("tasks", fields(json!({"title": "a"}))).await.unwrap();
        let id = task.get("id").and_then(Value::as_str).unwrap().to_string();
        let on_disk: Collections =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(on_disk.get("tasks").map(Vec::len), Some(1));

        store.delete("tasks", &id).await.unwrap();
        let on_disk: Collections =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(on_disk.get("tasks").map(Vec::len), Some(0));
    }
}
