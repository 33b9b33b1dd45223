//! Content mutations: create/update/delete post, update profile
//!
//! These carry no optimistic stage (there is no prior local state to
//! transition), so they return the reconciled value directly and rely on
//! invalidation for every other view of the data.

use crate::api;
use crate::error::Result;
use crate::keys;
use crate::models::{NewPost, Post, UpdatePost, UpdateUser, User};
use crate::Client;

impl Client {
    pub async fn create_post(&self, input: &NewPost) -> Result<Post> {
        let post = api::posts::create_post(&self.store, input).await?;
        self.cache.invalidate_op(keys::ops::RECENT_POSTS).await;
        self.cache.invalidate_op(keys::ops::FEED_PAGE).await;
        self.cache
            .invalidate(&keys::user_posts(&input.creator_id))
            .await;
        Ok(post)
    }

    pub async fn update_post(&self, input: &UpdatePost) -> Result<Post> {
        let post = api::posts::update_post(&self.store, input).await?;
        self.cache.invalidate(&keys::post_by_id(&input.post_id)).await;
        self.cache.invalidate_op(keys::ops::RECENT_POSTS).await;
        self.cache.invalidate_op(keys::ops::FEED_PAGE).await;
        Ok(post)
    }

    /// Delete a post; its media is removed best-effort (failure logged, not
    /// surfaced)
    pub async fn delete_post(&self, post_id: &str, media_id: &str) -> Result<()> {
        api::posts::delete_post(&self.store, post_id, media_id).await?;
        self.cache.invalidate(&keys::post_by_id(post_id)).await;
        self.cache.invalidate_op(keys::ops::RECENT_POSTS).await;
        self.cache.invalidate_op(keys::ops::FEED_PAGE).await;
        Ok(())
    }

    pub async fn update_profile(&self, input: &UpdateUser) -> Result<User> {
        let user = api::users::update_user(&self.store, input).await?;
        self.cache.invalidate(&keys::current_user()).await;
        self.cache.invalidate(&keys::user_by_id(&input.user_id)).await;
        self.cache.invalidate_op(keys::ops::USERS).await;
        Ok(user)
    }
}
