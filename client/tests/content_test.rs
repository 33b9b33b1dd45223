//! Content mutations: create/update/delete post, profile update, share

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use common::{client_with, post_doc, seeded_at, user_doc, FailingShare, MemoryStore, RecordingShare};
use glimmer_client::models::{MediaUpload, NewPost, UpdatePost, UpdateUser};
use glimmer_client::AppError;

fn new_post(creator: &str, caption: &str) -> NewPost {
    NewPost {
        creator_id: creator.to_string(),
        caption: caption.to_string(),
        tags: vec!["test".to_string()],
        location: None,
        media: MediaUpload {
            bytes: vec![0xFF, 0xD8],
            filename: "shot.jpg".to_string(),
        },
    }
}

#[tokio::test]
async fn test_create_post_stores_document_and_media() {
    let store = MemoryStore::new();
    let client = client_with(store.clone());

    let post = client.create_post(&new_post("u1", "first light")).await.unwrap();
    assert_eq!(post.creator_id, "u1");
    assert_eq!(post.image_id, "file-0");
    assert!(store.document("posts", &post.id).is_some());
    assert_eq!(store.uploads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_create_post_invalidates_listings() {
    let store = MemoryStore::new();
    store.insert("posts", post_doc("p1", "u1", "older", &seeded_at(1)));
    let client = client_with(store.clone());

    client.recent_posts().await.unwrap();
    let created = client.create_post(&new_post("u1", "fresh")).await.unwrap();

    let read = client.recent_posts().await.unwrap();
    assert_eq!(store.list_calls.load(Ordering::SeqCst), 2);
    assert_eq!(read.value[0].id, created.id);
}

#[tokio::test]
async fn test_create_post_validation_fails_before_any_upload() {
    let store = MemoryStore::new();
    let client = client_with(store.clone());

    let err = client.create_post(&new_post("u1", "")).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(store.uploads.load(Ordering::SeqCst), 0);
    assert_eq!(store.collection_len("posts"), 0);
}

#[tokio::test]
async fn test_create_post_failure_removes_the_uploaded_file() {
    let store = MemoryStore::new();
    let client = client_with(store.clone());
    store.fail_writes.store(true, Ordering::SeqCst);

    let err = client.create_post(&new_post("u1", "doomed")).await.unwrap_err();
    assert!(err.is_remote());
    assert_eq!(store.uploads.load(Ordering::SeqCst), 1);
    assert_eq!(
        store.deleted_files.lock().unwrap().as_slice(),
        ["file-0".to_string()]
    );
}

#[tokio::test]
async fn test_update_post_with_new_media_replaces_the_old_file() {
    let store = MemoryStore::new();
    store.insert("posts", post_doc("p1", "u1", "old caption", &seeded_at(1)));
    let client = client_with(store.clone());

    let input = UpdatePost {
        post_id: "p1".to_string(),
        caption: "new caption".to_string(),
        tags: Vec::new(),
        location: Some("Lisbon".to_string()),
        image_url: "mem://files/p1-media/view".to_string(),
        image_id: "p1-media".to_string(),
        media: Some(MediaUpload {
            bytes: vec![0xFF, 0xD8],
            filename: "new.jpg".to_string(),
        }),
    };
    let post = client.update_post(&input).await.unwrap();
    assert_eq!(post.caption, "new caption");
    assert_eq!(post.image_id, "file-0");
    assert_eq!(
        store.deleted_files.lock().unwrap().as_slice(),
        ["p1-media".to_string()]
    );
}

#[tokio::test]
async fn test_delete_post_survives_a_failed_media_cleanup() {
    let store = MemoryStore::new();
    store.insert("posts", post_doc("p1", "u1", "caption", &seeded_at(1)));
    let client = client_with(store.clone());
    store.fail_file_delete.store(true, Ordering::SeqCst);

    // Media cleanup is best-effort; the failure is not surfaced.
    client.delete_post("p1", "p1-media").await.unwrap();
    assert!(store.document("posts", "p1").is_none());
    assert!(store.deleted_files.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_update_profile_invalidates_the_user_entries() {
    let store = MemoryStore::new();
    store.insert("users", user_doc("u1", "acct-1", "Ada"));
    let client = client_with(store.clone());
    client.current_user().await.unwrap();

    let input = UpdateUser {
        user_id: "u1".to_string(),
        name: "Ada L.".to_string(),
        bio: Some("mathematician".to_string()),
        image_url: "mem://files/avatar/view".to_string(),
        image_id: String::new(),
        media: None,
    };
    let updated = client.update_profile(&input).await.unwrap();
    assert_eq!(updated.name, "Ada L.");

    let read = client.current_user().await.unwrap();
    assert_eq!(read.value.name, "Ada L.");
    assert_eq!(read.value.bio.as_deref(), Some("mathematician"));
}

#[tokio::test]
async fn test_share_without_a_capability_is_unsupported() {
    let store = MemoryStore::new();
    let client = client_with(store);

    let err = client
        .share_post("Glimmer", "look at this", "https://glimmer.app/p/p1")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unsupported(_)));
}

#[tokio::test]
async fn test_share_failure_with_a_capability_is_a_remote_error() {
    let store = MemoryStore::new();
    let client = client_with(store).with_share(Arc::new(FailingShare));

    // The capability exists; a failed attempt is a runtime failure, not a
    // missing capability.
    let err = client
        .share_post("Glimmer", "look at this", "https://glimmer.app/p/p1")
        .await
        .unwrap_err();
    assert!(err.is_remote());
}

#[tokio::test]
async fn test_share_delegates_to_the_platform_capability() {
    let store = MemoryStore::new();
    let share = Arc::new(RecordingShare::default());
    let client = client_with(store).with_share(share.clone());

    client
        .share_post("Glimmer", "look at this", "https://glimmer.app/p/p1")
        .await
        .unwrap();

    let requests = share.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url, "https://glimmer.app/p/p1");
}
