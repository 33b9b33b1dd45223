//! Save record data access

use serde_json::json;
use uuid::Uuid;

use crate::error::Result;
use crate::models::SaveRecord;
use crate::remote::{Query, Store};

pub async fn create_save_record(store: &Store, user_id: &str, post_id: &str) -> Result<SaveRecord> {
    let id = Uuid::new_v4().to_string();
    let doc = store
        .documents
        .create_document(
            &store.collections.saves,
            &id,
            json!({ "user": user_id, "post": post_id }),
        )
        .await?;
    SaveRecord::from_document(&doc)
}

/// Delete by record id only, never by (user, post) composite
pub async fn delete_save_record(store: &Store, record_id: &str) -> Result<()> {
    store
        .documents
        .delete_document(&store.collections.saves, record_id)
        .await?;
    Ok(())
}

/// Look up the live save record for a (user, post) pair, if any
pub async fn find_save_record(
    store: &Store,
    user_id: &str,
    post_id: &str,
) -> Result<Option<SaveRecord>> {
    let list = store
        .documents
        .list_documents(
            &store.collections.saves,
            &[
                Query::Equal("user", user_id.to_string()),
                Query::Equal("post", post_id.to_string()),
                Query::Limit(1),
            ],
        )
        .await?;

    list.documents
        .first()
        .map(SaveRecord::from_document)
        .transpose()
}
