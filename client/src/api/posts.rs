//! Post data access

use serde_json::{json, Value};
use tracing::warn;
use uuid::Uuid;
use validator::Validate;

use crate::error::Result;
use crate::models::{FeedPage, NewPost, Post, UpdatePost};
use crate::remote::{Query, Store, StoredFile};

/// How many posts the recent-posts view requests
pub const RECENT_POSTS_LIMIT: usize = 20;

/// Page size for the cursor-paginated feed
pub const FEED_PAGE_SIZE: usize = 10;

fn decode_posts(documents: &[Value]) -> Result<Vec<Post>> {
    documents.iter().map(Post::from_document).collect()
}

/// Most recent posts, newest first, no pagination
pub async fn fetch_recent_posts(store: &Store) -> Result<Vec<Post>> {
    let list = store
        .documents
        .list_documents(
            &store.collections.posts,
            &[
                Query::OrderDesc("$createdAt"),
                Query::Limit(RECENT_POSTS_LIMIT),
            ],
        )
        .await?;
    decode_posts(&list.documents)
}

/// One page of the feed. The cursor is the id of the last document of the
/// previous page; an empty page yields `next_cursor = None` (end of
/// pagination).
pub async fn fetch_feed_page(store: &Store, cursor: Option<&str>) -> Result<FeedPage> {
    let mut queries = vec![Query::OrderDesc("$createdAt"), Query::Limit(FEED_PAGE_SIZE)];
    if let Some(cursor) = cursor {
        queries.push(Query::CursorAfter(cursor.to_string()));
    }

    let list = store
        .documents
        .list_documents(&store.collections.posts, &queries)
        .await?;
    let documents = decode_posts(&list.documents)?;
    let next_cursor = documents.last().map(|post| post.id.clone());

    Ok(FeedPage {
        documents,
        next_cursor,
    })
}

pub async fn fetch_post_by_id(store: &Store, post_id: &str) -> Result<Post> {
    let doc = store
        .documents
        .get_document(&store.collections.posts, post_id)
        .await?;
    Post::from_document(&doc)
}

pub async fn search_posts(store: &Store, term: &str) -> Result<Vec<Post>> {
    let list = store
        .documents
        .list_documents(
            &store.collections.posts,
            &[Query::Search("caption", term.to_string())],
        )
        .await?;
    decode_posts(&list.documents)
}

pub async fn fetch_user_posts(store: &Store, user_id: &str) -> Result<Vec<Post>> {
    let list = store
        .documents
        .list_documents(
            &store.collections.posts,
            &[
                Query::Equal("creator", user_id.to_string()),
                Query::OrderDesc("$createdAt"),
            ],
        )
        .await?;
    decode_posts(&list.documents)
}

/// Create a post: upload media first, then the document. If document creation
/// fails the uploaded file is removed again (best-effort).
pub async fn create_post(store: &Store, input: &NewPost) -> Result<Post> {
    input.validate()?;

    let file = store
        .files
        .upload(input.media.bytes.clone(), &input.media.filename)
        .await?;

    let data = json!({
        "creator": input.creator_id,
        "caption": input.caption,
        "tags": input.tags,
        "imageUrl": file.url,
        "imageId": file.id,
        "location": input.location,
        "likes": [],
    });

    let id = Uuid::new_v4().to_string();
    match store
        .documents
        .create_document(&store.collections.posts, &id, data)
        .await
    {
        Ok(doc) => Post::from_document(&doc),
        Err(err) => {
            cleanup_file(store, &file.id).await;
            Err(err.into())
        }
    }
}

/// Update a post. New media, when attached, is uploaded first; the replaced
/// file is removed after a successful update, and the new upload is removed
/// when the update fails.
pub async fn update_post(store: &Store, input: &UpdatePost) -> Result<Post> {
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
        "caption": input.caption,
        "tags": input.tags,
        "imageUrl": image_url,
        "imageId": image_id,
        "location": input.location,
    });

    match store
        .documents
        .update_document(&store.collections.posts, &input.post_id, data)
        .await
    {
        Ok(doc) => {
            if uploaded.is_some() {
                cleanup_file(store, &input.image_id).await;
            }
            Post::from_document(&doc)
        }
        Err(err) => {
            if let Some(file) = &uploaded {
                cleanup_file(store, &file.id).await;
            }
            Err(err.into())
        }
    }
}

/// Delete a post and request deletion of its media. The media deletion is
/// best-effort: a failure is logged and never surfaced.
pub async fn delete_post(store: &Store, post_id: &str, media_id: &str) -> Result<()> {
    store
        .documents
        .delete_document(&store.collections.posts, post_id)
        .await?;
    cleanup_file(store, media_id).await;
    Ok(())
}

/// Replace the full likes set server-side. The caller computes the entire
/// sequence client-side; the store does not toggle.
pub async fn set_likes(store: &Store, post_id: &str, liker_ids: &[String]) -> Result<Post> {
    let doc = store
        .documents
        .update_document(
            &store.collections.posts,
            post_id,
            json!({ "likes": liker_ids }),
        )
        .await?;
    Post::from_document(&doc)
}

/// Atomic server-side view counter increment
pub async fn increment_view_count(store: &Store, post_id: &str) -> Result<()> {
    store
        .documents
        .increment_field(&store.collections.posts, post_id, "views", 1)
        .await?;
    Ok(())
}

/// Atomic server-side repost counter increment
pub async fn increment_repost_count(store: &Store, post_id: &str) -> Result<()> {
    store
        .documents
        .increment_field(&store.collections.posts, post_id, "reposts", 1)
        .await?;
    Ok(())
}

async fn cleanup_file(store: &Store, file_id: &str) {
    if let Err(err) = store.files.delete(file_id).await {
        warn!(file_id = %file_id, error = %err, "best-effort media cleanup failed");
    }
}
