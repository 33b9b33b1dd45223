//! HTTP implementation of the remote store traits
//!
//! Speaks the store's REST dialect: document collections under
//! `/databases/{db}/collections/{collection}/documents`, file storage under
//! `/storage/buckets/{bucket}/files`, and the session account under
//! `/account`. Every request carries the project header; typed query terms
//! are serialized to the store's JSON query format.

use async_trait::async_trait;
use reqwest::{multipart, Response, StatusCode};
use serde_json::{json, Value};
use tracing::debug;

use crate::config::Config;
use crate::remote::{DocumentList, DocumentStore, FileStore, Query, StoreError, StoredFile};

/// Project identification header sent with every request
const PROJECT_HEADER: &str = "X-Appwrite-Project";

pub struct HttpRemoteStore {
    http: reqwest::Client,
    endpoint: String,
    project_id: String,
    database_id: String,
    bucket_id: String,
}

impl HttpRemoteStore {
    pub fn new(config: &Config) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|err| StoreError::Network(err.to_string()))?;

        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            project_id: config.project_id.clone(),
            database_id: config.database_id.clone(),
            bucket_id: config.storage_bucket_id.clone(),
        })
    }

    fn documents_url(&self, collection: &str) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.endpoint, self.database_id, collection
        )
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}", self.documents_url(collection), id)
    }

    fn files_url(&self) -> String {
        format!("{}/storage/buckets/{}/files", self.endpoint, self.bucket_id)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Response, StoreError> {
        request
            .header(PROJECT_HEADER, &self.project_id)
            .send()
            .await
            .map_err(|err| StoreError::Network(err.to_string()))
    }

    /// Map a non-success response to the store error taxonomy
    async fn check(response: Response) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = match response.json::<Value>().await {
            Ok(body) => body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("no error message")
                .to_string(),
            Err(_) => "unreadable error body".to_string(),
        };

        Err(match status {
            StatusCode::NOT_FOUND => StoreError::NotFound(message),
            StatusCode::CONFLICT => StoreError::Conflict(message),
            _ => StoreError::Server {
                status: status.as_u16(),
                message,
            },
        })
    }

    async fn json_body(response: Response) -> Result<Value, StoreError> {
        response
            .json::<Value>()
            .await
            .map_err(|err| StoreError::Decode(err.to_string()))
    }
}

/// Serialize a query term to the store's wire format
fn query_to_wire(query: &Query) -> String {
    let value = match query {
        Query::Equal(attribute, value) => json!({
            "method": "equal",
            "attribute": attribute,
            "values": [value],
        }),
        Query::Search(attribute, term) => json!({
            "method": "search",
            "attribute": attribute,
            "values": [term],
        }),
        Query::OrderAsc(attribute) => json!({
            "method": "orderAsc",
            "attribute": attribute,
        }),
        Query::OrderDesc(attribute) => json!({
            "method": "orderDesc",
            "attribute": attribute,
        }),
        Query::Limit(count) => json!({
            "method": "limit",
            "values": [count],
        }),
        Query::CursorAfter(id) => json!({
            "method": "cursorAfter",
            "values": [id],
        }),
    };
    value.to_string()
}

fn queries_to_params(queries: &[Query]) -> String {
    queries
        .iter()
        .map(|query| format!("queries[]={}", urlencoding::encode(&query_to_wire(query))))
        .collect::<Vec<_>>()
        .join("&")
}

#[async_trait]
impl DocumentStore for HttpRemoteStore {
    async fn list_documents(
        &self,
        collection: &str,
        queries: &[Query],
    ) -> Result<DocumentList, StoreError> {
        let mut url = self.documents_url(collection);
        if !queries.is_empty() {
            url = format!("{}?{}", url, queries_to_params(queries));
        }
        debug!(collection = %collection, "list documents");

        let response = Self::check(self.send(self.http.get(&url)).await?).await?;
        let body = Self::json_body(response).await?;

        let documents = match body.get("documents") {
            Some(Value::Array(items)) => items.clone(),
            _ => return Err(StoreError::Decode("missing 'documents' array".to_string())),
        };
        let total = body.get("total").and_then(Value::as_u64).unwrap_or(0);

        Ok(DocumentList { total, documents })
    }

    async fn get_document(&self, collection: &str, id: &str) -> Result<Value, StoreError> {
        let url = self.document_url(collection, id);
        let response = Self::check(self.send(self.http.get(&url)).await?).await?;
        Self::json_body(response).await
    }

    async fn create_document(
        &self,
        collection: &str,
        id: &str,
        data: Value,
    ) -> Result<Value, StoreError> {
        let url = self.documents_url(collection);
        debug!(collection = %collection, id = %id, "create document");

        let body = json!({ "documentId": id, "data": data });
        let response = Self::check(self.send(self.http.post(&url).json(&body)).await?).await?;
        Self::json_body(response).await
    }

    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        data: Value,
    ) -> Result<Value, StoreError> {
        let url = self.document_url(collection, id);
        debug!(collection = %collection, id = %id, "update document");

        let body = json!({ "data": data });
        let response = Self::check(self.send(self.http.patch(&url).json(&body)).await?).await?;
        Self::json_body(response).await
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let url = self.document_url(collection, id);
        debug!(collection = %collection, id = %id, "delete document");

        Self::check(self.send(self.http.delete(&url)).await?).await?;
        Ok(())
    }

    async fn increment_field(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        by: i64,
    ) -> Result<Value, StoreError> {
        // The store applies the increment atomically server-side.
        let mut increments = serde_json::Map::new();
        increments.insert(field.to_string(), json!(by));
        self.update_document(collection, id, json!({ "$inc": increments }))
            .await
    }

    async fn current_account(&self) -> Result<Value, StoreError> {
        let url = format!("{}/account", self.endpoint);
        let response = Self::check(self.send(self.http.get(&url)).await?).await?;
        Self::json_body(response).await
    }
}

#[async_trait]
impl FileStore for HttpRemoteStore {
    async fn upload(&self, bytes: Vec<u8>, filename: &str) -> Result<StoredFile, StoreError> {
        let file_id = uuid::Uuid::new_v4().to_string();
        debug!(file_id = %file_id, filename = %filename, "upload file");

        let part = multipart::Part::bytes(bytes).file_name(filename.to_string());
        let form = multipart::Form::new()
            .text("fileId", file_id.clone())
            .part("file", part);

        let request = self.http.post(self.files_url()).multipart(form);
        let response = Self::check(self.send(request).await?).await?;
        let body = Self::json_body(response).await?;

        let id = body
            .get("$id")
            .and_then(Value::as_str)
            .unwrap_or(&file_id)
            .to_string();
        let url = self.file_url(&id);
        Ok(StoredFile { id, url })
    }

    async fn delete(&self, file_id: &str) -> Result<(), StoreError> {
        let url = format!("{}/{}", self.files_url(), file_id);
        debug!(file_id = %file_id, "delete file");

        Self::check(self.send(self.http.delete(&url)).await?).await?;
        Ok(())
    }

    fn file_url(&self, file_id: &str) -> String {
        format!(
            "{}/{}/view?project={}",
            self.files_url(),
            file_id,
            self.project_id
        )
    }
}
