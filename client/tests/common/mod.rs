//! In-memory remote store for integration tests.
//!
//! Implements the document and file store traits over plain maps, with
//! switches to simulate outages on the write path, the read path, or file
//! deletion, and call counters to observe cache behavior.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};

use glimmer_client::config::CollectionsConfig;
use glimmer_client::remote::{
    DocumentList, DocumentStore, FileStore, Query, ShareCapability, ShareError, ShareRequest,
    Store, StoreError,
};
use glimmer_client::remote::StoredFile;
use glimmer_client::Client;

pub struct MemoryStore {
    collections: Mutex<HashMap<String, Vec<Value>>>,
    account: Value,
    created_seq: AtomicI64,
    file_seq: AtomicUsize,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
    pub fail_file_delete: AtomicBool,
    pub get_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
    pub uploads: AtomicUsize,
    pub deleted_files: Mutex<Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            collections: Mutex::new(HashMap::new()),
            account: json!({ "$id": "acct-1" }),
            created_seq: AtomicI64::new(0),
            file_seq: AtomicUsize::new(0),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            fail_file_delete: AtomicBool::new(false),
            get_calls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
            uploads: AtomicUsize::new(0),
            deleted_files: Mutex::new(Vec::new()),
        })
    }

    pub fn insert(&self, collection: &str, doc: Value) {
        let mut guard = self.collections.lock().unwrap();
        guard.entry(collection.to_string()).or_default().push(doc);
    }

    /// Current copy of one document, for assertions
    pub fn document(&self, collection: &str, id: &str) -> Option<Value> {
        let guard = self.collections.lock().unwrap();
        guard.get(collection).and_then(|docs| {
            docs.iter()
                .find(|doc| doc.get("$id").and_then(Value::as_str) == Some(id))
                .cloned()
        })
    }

    pub fn collection_len(&self, collection: &str) -> usize {
        let guard = self.collections.lock().unwrap();
        guard.get(collection).map(Vec::len).unwrap_or(0)
    }

    fn check_read(&self) -> Result<(), StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            Err(StoreError::Network("simulated outage".to_string()))
        } else {
            Ok(())
        }
    }

    fn check_write(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(StoreError::Network("simulated outage".to_string()))
        } else {
            Ok(())
        }
    }
}

fn reference_matches(value: Option<&Value>, wanted: &str) -> bool {
    match value {
        Some(Value::String(id)) => id == wanted,
        Some(Value::Object(map)) => map.get("$id").and_then(Value::as_str) == Some(wanted),
        _ => false,
    }
}

fn sort_key(doc: &Value, attr: &str) -> String {
    doc.get(attr)
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string()
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list_documents(
        &self,
        collection: &str,
        queries: &[Query],
    ) -> Result<DocumentList, StoreError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.check_read()?;

        let mut docs: Vec<Value> = {
            let guard = self.collections.lock().unwrap();
            guard.get(collection).cloned().unwrap_or_default()
        };

        let mut limit = None;
        let mut cursor = None;
        for query in queries {
            match query {
                Query::Equal(attr, wanted) => {
                    docs.retain(|doc| reference_matches(doc.get(*attr), wanted))
                }
                Query::Search(attr, term) => {
                    let needle = term.to_lowercase();
                    docs.retain(|doc| {
                        doc.get(*attr)
                            .and_then(Value::as_str)
                            .map(|text| text.to_lowercase().contains(&needle))
                            .unwrap_or(false)
                    });
                }
                Query::OrderAsc(attr) => {
                    docs.sort_by(|a, b| sort_key(a, attr).cmp(&sort_key(b, attr)))
                }
                Query::OrderDesc(attr) => {
                    docs.sort_by(|a, b| sort_key(b, attr).cmp(&sort_key(a, attr)))
                }
                Query::Limit(n) => limit = Some(*n),
                Query::CursorAfter(id) => cursor = Some(id.clone()),
            }
        }

        if let Some(id) = cursor {
            match docs
                .iter()
                .position(|doc| doc.get("$id").and_then(Value::as_str) == Some(id.as_str()))
            {
                Some(pos) => {
                    docs.drain(..=pos);
                }
                None => docs.clear(),
            }
        }
        if let Some(n) = limit {
            docs.truncate(n);
        }

        Ok(DocumentList {
            total: docs.len() as u64,
            documents: docs,
        })
    }

    async fn get_document(&self, collection: &str, id: &str) -> Result<Value, StoreError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.check_read()?;
        self.document(collection, id)
            .ok_or_else(|| StoreError::NotFound(format!("{}/{}", collection, id)))
    }

    async fn create_document(
        &self,
        collection: &str,
        id: &str,
        data: Value,
    ) -> Result<Value, StoreError> {
        self.check_write()?;
        if self.document(collection, id).is_some() {
            return Err(StoreError::Conflict(format!("{}/{}", collection, id)));
        }

        let seq = self.created_seq.fetch_add(1, Ordering::SeqCst);
        let created_at = Utc
            .timestamp_opt(1_756_900_000 + seq * 60, 0)
            .unwrap()
            .to_rfc3339();
        let mut doc = data;
        doc["$id"] = json!(id);
        doc["$createdAt"] = json!(created_at);

        self.insert(collection, doc.clone());
        Ok(doc)
    }

    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        data: Value,
    ) -> Result<Value, StoreError> {
        self.check_write()?;
        let mut guard = self.collections.lock().unwrap();
        let docs = guard
            .get_mut(collection)
            .ok_or_else(|| StoreError::NotFound(collection.to_string()))?;
        let doc = docs
            .iter_mut()
            .find(|doc| doc.get("$id").and_then(Value::as_str) == Some(id))
            .ok_or_else(|| StoreError::NotFound(format!("{}/{}", collection, id)))?;

        if let (Some(target), Some(fields)) = (doc.as_object_mut(), data.as_object()) {
            for (key, value) in fields {
                target.insert(key.clone(), value.clone());
            }
        }
        Ok(doc.clone())
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.check_write()?;
        let mut guard = self.collections.lock().unwrap();
        let docs = guard
            .get_mut(collection)
            .ok_or_else(|| StoreError::NotFound(collection.to_string()))?;
        let before = docs.len();
        docs.retain(|doc| doc.get("$id").and_then(Value::as_str) != Some(id));
        if docs.len() == before {
            return Err(StoreError::NotFound(format!("{}/{}", collection, id)));
        }
        Ok(())
    }

    async fn increment_field(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        by: i64,
    ) -> Result<Value, StoreError> {
        self.check_write()?;
        let mut guard = self.collections.lock().unwrap();
        let docs = guard
            .get_mut(collection)
            .ok_or_else(|| StoreError::NotFound(collection.to_string()))?;
        let doc = docs
            .iter_mut()
            .find(|doc| doc.get("$id").and_then(Value::as_str) == Some(id))
            .ok_or_else(|| StoreError::NotFound(format!("{}/{}", collection, id)))?;

        let current = doc.get(field).and_then(Value::as_i64).unwrap_or(0);
        doc[field] = json!(current + by);
        Ok(doc.clone())
    }

    async fn current_account(&self) -> Result<Value, StoreError> {
        self.check_read()?;
        Ok(self.account.clone())
    }
}

#[async_trait]
impl FileStore for MemoryStore {
    async fn upload(&self, _bytes: Vec<u8>, _filename: &str) -> Result<StoredFile, StoreError> {
        let n = self.uploads.fetch_add(1, Ordering::SeqCst);
        let id = format!("file-{}", n);
        let url = format!("mem://files/{}/view", id);
        Ok(StoredFile { id, url })
    }

    async fn delete(&self, file_id: &str) -> Result<(), StoreError> {
        if self.fail_file_delete.load(Ordering::SeqCst) {
            return Err(StoreError::Network("simulated outage".to_string()));
        }
        self.deleted_files
            .lock()
            .unwrap()
            .push(file_id.to_string());
        Ok(())
    }

    fn file_url(&self, file_id: &str) -> String {
        format!("mem://files/{}/view", file_id)
    }
}

/// Share capability that records every request and always succeeds
#[derive(Default)]
pub struct RecordingShare {
    pub requests: Mutex<Vec<ShareRequest>>,
}

#[async_trait]
impl ShareCapability for RecordingShare {
    async fn share(&self, request: ShareRequest) -> Result<(), ShareError> {
        self.requests.lock().unwrap().push(request);
        Ok(())
    }
}

/// Share capability that exists but fails every attempt
pub struct FailingShare;

#[async_trait]
impl ShareCapability for FailingShare {
    async fn share(&self, _request: ShareRequest) -> Result<(), ShareError> {
        Err(ShareError::Failed("dialog dismissed by the system".to_string()))
    }
}

pub fn collections() -> CollectionsConfig {
    CollectionsConfig {
        users: "users".to_string(),
        posts: "posts".to_string(),
        saves: "saves".to_string(),
    }
}

pub fn client_with(store: Arc<MemoryStore>) -> Client {
    Client::with_store(Store::from_parts(store.clone(), store, collections()))
}

/// Deterministic creation timestamp for seeded documents; higher `i` is newer
pub fn seeded_at(i: i64) -> String {
    Utc.timestamp_opt(1_756_000_000 + i * 60, 0)
        .unwrap()
        .to_rfc3339()
}

pub fn post_doc(id: &str, creator: &str, caption: &str, created_at: &str) -> Value {
    json!({
        "$id": id,
        "$createdAt": created_at,
        "creator": creator,
        "caption": caption,
        "tags": [],
        "imageUrl": format!("mem://files/{}-media/view", id),
        "imageId": format!("{}-media", id),
        "likes": [],
    })
}

pub fn user_doc(id: &str, account_id: &str, name: &str) -> Value {
    json!({
        "$id": id,
        "$createdAt": seeded_at(0),
        "accountId": account_id,
        "name": name,
        "username": name.to_lowercase(),
        "email": format!("{}@example.com", name.to_lowercase()),
        "imageUrl": "mem://files/avatar/view",
        "save": [],
    })
}
