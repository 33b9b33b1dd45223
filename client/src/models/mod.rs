//! Data models for the client data layer
//!
//! Authoritative copies of these entities live in the remote store; the
//! structs here are the client-side representations held in the query cache.
//! Remote documents arrive as dynamic JSON and are coerced into these shapes
//! at the data-access boundary so downstream code never touches raw
//! documents. Identity and content fields are required; interaction counters
//! coerce an absent field to zero (the store omits counters that were never
//! incremented). Reference fields accept either a bare identifier or an
//! embedded document carrying `$id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::error::{AppError, Result};

/// A post document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Post {
    pub id: String,
    pub creator_id: String,
    pub caption: String,
    pub tags: Vec<String>,
    pub image_url: String,
    pub image_id: String,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Identifiers of users who liked this post; no duplicates
    pub likes: Vec<String>,
    pub reposts: u64,
    pub views: u64,
}

impl Post {
    pub fn from_document(doc: &Value) -> Result<Self> {
        Ok(Post {
            id: str_field(doc, "$id")?,
            creator_id: reference_id(doc.get("creator"), "creator")?,
            caption: str_field(doc, "caption")?,
            tags: opt_str_list(doc, "tags"),
            image_url: str_field(doc, "imageUrl")?,
            image_id: str_field(doc, "imageId")?,
            location: opt_str_field(doc, "location"),
            created_at: timestamp_field(doc, "$createdAt")?,
            likes: id_list(doc.get("likes")),
            reposts: counter_field(doc, "reposts"),
            views: counter_field(doc, "views"),
        })
    }

    pub fn is_liked_by(&self, user_id: &str) -> bool {
        self.likes.iter().any(|id| id == user_id)
    }
}

/// A user document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    pub account_id: String,
    pub name: String,
    pub username: String,
    pub email: String,
    pub bio: Option<String>,
    pub image_url: String,
    /// Identifiers of posts this user has liked
    pub liked: Vec<String>,
    /// Live save records owned by this user
    pub saves: Vec<SaveRecord>,
}

impl User {
    pub fn from_document(doc: &Value) -> Result<Self> {
        let saves = match doc.get("save") {
            Some(Value::Array(items)) => items
                .iter()
                .map(SaveRecord::from_document)
                .collect::<Result<Vec<_>>>()?,
            _ => Vec::new(),
        };

        Ok(User {
            id: str_field(doc, "$id")?,
            account_id: str_field(doc, "accountId")?,
            name: str_field(doc, "name")?,
            username: str_field(doc, "username")?,
            email: str_field(doc, "email")?,
            bio: opt_str_field(doc, "bio"),
            image_url: str_field(doc, "imageUrl")?,
            liked: id_list(doc.get("liked")),
            saves,
        })
    }

    /// The live save record for a post, if any
    pub fn save_record_for(&self, post_id: &str) -> Option<&SaveRecord> {
        self.saves.iter().find(|record| record.post_id == post_id)
    }
}

/// A save record: one user bookmarking one post.
/// At most one live record exists per (user, post) pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SaveRecord {
    pub id: String,
    pub user_id: String,
    pub post_id: String,
}

impl SaveRecord {
    pub fn from_document(doc: &Value) -> Result<Self> {
        Ok(SaveRecord {
            id: str_field(doc, "$id")?,
            user_id: reference_id(doc.get("user"), "user")?,
            post_id: reference_id(doc.get("post"), "post")?,
        })
    }
}

/// One page of the paginated feed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedPage {
    pub documents: Vec<Post>,
    /// Identifier of the last document in this page; `None` means no further
    /// pages
    pub next_cursor: Option<String>,
}

/// Uploaded media content for a new or updated post
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub bytes: Vec<u8>,
    pub filename: String,
}

/// Input for creating a post
#[derive(Debug, Clone, Validate)]
pub struct NewPost {
    pub creator_id: String,
    #[validate(length(min = 1, max = 2200))]
    pub caption: String,
    #[validate(length(max = 30))]
    pub tags: Vec<String>,
    pub location: Option<String>,
    pub media: MediaUpload,
}

/// Input for updating a post
#[derive(Debug, Clone, Validate)]
pub struct UpdatePost {
    pub post_id: String,
    #[validate(length(min = 1, max = 2200))]
    pub caption: String,
    #[validate(length(max = 30))]
    pub tags: Vec<String>,
    pub location: Option<String>,
    /// Current media identifiers, kept when no new media is attached
    pub image_url: String,
    pub image_id: String,
    pub media: Option<MediaUpload>,
}

/// Input for updating a user profile
#[derive(Debug, Clone, Validate)]
pub struct UpdateUser {
    pub user_id: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 500))]
    pub bio: Option<String>,
    /// Current avatar identifiers, kept when no new media is attached
    pub image_url: String,
    pub image_id: String,
    pub media: Option<MediaUpload>,
}

// ============= Document field coercion =============

fn str_field(doc: &Value, field: &str) -> Result<String> {
    match doc.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(AppError::Document(format!(
            "field '{}' is not a string: {}",
            field, other
        ))),
        None => Err(AppError::Document(format!("missing field '{}'", field))),
    }
}

fn opt_str_field(doc: &Value, field: &str) -> Option<String> {
    match doc.get(field) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn opt_str_list(doc: &Value, field: &str) -> Vec<String> {
    match doc.get(field) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

fn counter_field(doc: &Value, field: &str) -> u64 {
    doc.get(field).and_then(Value::as_u64).unwrap_or(0)
}

fn timestamp_field(doc: &Value, field: &str) -> Result<DateTime<Utc>> {
    let raw = str_field(doc, field)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|err| {
            AppError::Document(format!("field '{}' is not a timestamp: {}", field, err))
        })
}

/// Extract the identifier from a reference that is either a bare id string or
/// an embedded document
fn reference_id(value: Option<&Value>, field: &str) -> Result<String> {
    match value {
        Some(Value::String(id)) => Ok(id.clone()),
        Some(doc @ Value::Object(_)) => str_field(doc, "$id")
            .map_err(|_| AppError::Document(format!("reference '{}' has no '$id'", field))),
        _ => Err(AppError::Document(format!(
            "missing reference field '{}'",
            field
        ))),
    }
}

/// Collect reference ids from an array of bare ids or embedded documents,
/// de-duplicating while preserving order
fn id_list(value: Option<&Value>) -> Vec<String> {
    let mut ids = Vec::new();
    if let Some(Value::Array(items)) = value {
        for item in items {
            let id = match item {
                Value::String(id) => Some(id.clone()),
                Value::Object(map) => map
                    .get("$id")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                _ => None,
            };
            if let Some(id) = id {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }
    }
    ids
}
