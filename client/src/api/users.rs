//! User data access

use serde_json::{json, Value};
use validator::Validate;

use crate::error::{AppError, Result};
use crate::models::{UpdateUser, User};
use crate::remote::{Query, Store, StoredFile};

/// Resolve the session account to its user document
pub async fn fetch_current_user(store: &Store) -> Result<User> {
    let account = store.documents.current_account().await?;
    let account_id = account
        .get("$id")
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::Document("account document has no '$id'".to_string()))?;

    let list = store
        .documents
        .list_documents(
            &store.collections.users,
            &[
                Query::Equal("accountId", account_id.to_string()),
                Query::Limit(1),
            ],
        )
        .await?;

    match list.documents.first() {
        Some(doc) => User::from_document(doc),
        None => Err(AppError::NotFound(format!(
            "no user document for account {}",
            account_id
        ))),
    }
}

pub async fn fetch_user_by_id(store: &Store, user_id: &str) -> Result<User> {
    let doc = store
        .documents
        .get_document(&store.collections.users, user_id)
        .await?;
    User::from_document(&doc)
}

pub async fn fetch_users(store: &Store, limit: Option<usize>) -> Result<Vec<User>> {
    let mut queries = vec![Query::OrderDesc("$createdAt")];
    if let Some(limit) = limit {
        queries.push(Query::Limit(limit));
    }

    let list = store
        .documents
        .list_documents(&store.collections.users, &queries)
        .await?;
    list.documents.iter().map(User::from_document).collect()
}

/// Update a profile. A new avatar, when attached, is uploaded first; the
/// replaced file is removed after a successful update.
pub async fn update_user(store: &Store, input: &UpdateUser) -> Result<User> {
    input.validate()?;

    let uploaded: Option<StoredFile> = match &input.media {
        Some(media) => Some(store.files.upload(media.bytes.clone(), &media.filename).await?),
        None => None,
    };
    let (image_url, image_id) = match &uploaded {
        Some(file) => (file.url.clone(), file.id.clone()),
        None => (input.image_url.clone(), input.image_id.clone()),
    };

    let data = json!({
        "name": input.name,
        "bio": input.bio,
        "imageUrl": image_url,
        "imageId": image_id,
    });

    match store
        .documents
        .update_document(&store.collections.users, &input.user_id, data)
        .await
    {
        Ok(doc) => {
            if uploaded.is_some() && !input.image_id.is_empty() {
                if let Err(err) = store.files.delete(&input.image_id).await {
                    tracing::warn!(file_id = %input.image_id, error = %err, "best-effort avatar cleanup failed");
                }
            }
            User::from_document(&doc)
        }
        Err(err) => {
            if let Some(file) = &uploaded {
                if let Err(cleanup) = store.files.delete(&file.id).await {
                    tracing::warn!(file_id = %file.id, error = %cleanup, "best-effort avatar cleanup failed");
                }
            }
            Err(err.into())
        }
    }
}
