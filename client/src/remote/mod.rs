//! Remote store client surface
//!
//! The remote store is an external collaborator: a document database, file
//! store, and session-auth provider reached over HTTPS. This module defines
//! the traits the rest of the crate consumes plus the typed query terms; the
//! HTTP implementation lives in [`http`]. Tests inject in-memory fakes.

pub mod http;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::config::{CollectionsConfig, Config};

/// Errors at the remote store transport boundary
#[derive(Error, Debug)]
pub enum StoreError {
    /// Transport failure: the store was unreachable
    #[error("network failure: {0}")]
    Network(String),

    /// The store answered with a non-success status
    #[error("server error {status}: {message}")]
    Server { status: u16, message: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    /// The response body could not be decoded
    #[error("decode failure: {0}")]
    Decode(String),
}

/// Typed filter/sort/pagination terms for document listing
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Equal(&'static str, String),
    Search(&'static str, String),
    OrderAsc(&'static str),
    OrderDesc(&'static str),
    Limit(usize),
    /// Cursor-based pagination: return documents after the one with this id
    CursorAfter(String),
}

/// A listing response: matching documents plus the store's total count
#[derive(Debug, Clone, Default)]
pub struct DocumentList {
    pub total: u64,
    pub documents: Vec<Value>,
}

/// A stored file: stable identifier plus public view URL
#[derive(Debug, Clone, PartialEq)]
pub struct StoredFile {
    pub id: String,
    pub url: String,
}

/// Document-collection CRUD plus session auth
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn list_documents(
        &self,
        collection: &str,
        queries: &[Query],
    ) -> Result<DocumentList, StoreError>;

    async fn get_document(&self, collection: &str, id: &str) -> Result<Value, StoreError>;

    async fn create_document(
        &self,
        collection: &str,
        id: &str,
        data: Value,
    ) -> Result<Value, StoreError>;

    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        data: Value,
    ) -> Result<Value, StoreError>;

    async fn delete_document(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// Server-side atomic field increment; the client never computes the new
    /// counter value
    async fn increment_field(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        by: i64,
    ) -> Result<Value, StoreError>;

    /// The account document for the current session
    async fn current_account(&self) -> Result<Value, StoreError>;
}

/// File upload/delete returning stable identifiers and URLs
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn upload(&self, bytes: Vec<u8>, filename: &str) -> Result<StoredFile, StoreError>;

    async fn delete(&self, file_id: &str) -> Result<(), StoreError>;

    fn file_url(&self, file_id: &str) -> String;
}

/// Platform share capability. Not a store mutation: stateless, no cache
/// interaction.
#[async_trait]
pub trait ShareCapability: Send + Sync {
    async fn share(&self, request: ShareRequest) -> Result<(), ShareError>;
}

#[derive(Debug, Clone)]
pub struct ShareRequest {
    pub title: String,
    pub text: String,
    pub url: String,
}

#[derive(Error, Debug)]
pub enum ShareError {
    #[error("sharing is not supported on this platform")]
    Unsupported,

    #[error("share failed: {0}")]
    Failed(String),
}

/// Platform without a share capability; every request reports unsupported
pub struct NoShareCapability;

#[async_trait]
impl ShareCapability for NoShareCapability {
    async fn share(&self, _request: ShareRequest) -> Result<(), ShareError> {
        Err(ShareError::Unsupported)
    }
}

/// Handle bundling the remote store surfaces with the collection identifiers
/// the data-access functions address
#[derive(Clone)]
pub struct Store {
    pub documents: Arc<dyn DocumentStore>,
    pub files: Arc<dyn FileStore>,
    pub collections: CollectionsConfig,
}

impl Store {
    /// Build the HTTP-backed store from configuration
    pub fn connect(config: &Config) -> Result<Self, StoreError> {
        let remote = Arc::new(http::HttpRemoteStore::new(config)?);
        Ok(Store {
            documents: remote.clone(),
            files: remote,
            collections: config.collections.clone(),
        })
    }

    /// Assemble a store from explicit parts (dependency injection for tests)
    pub fn from_parts(
        documents: Arc<dyn DocumentStore>,
        files: Arc<dyn FileStore>,
        collections: CollectionsConfig,
    ) -> Self {
        Store {
            documents,
            files,
            collections,
        }
    }
}
