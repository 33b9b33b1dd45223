//! Read-through queries
//!
//! Each query reads through the cache: a fresh entry is served without a
//! network call, concurrent readers of one key share a single fetch, and a
//! failed refresh serves last-known-good data flagged stale. Presentation
//! code re-renders on cache events instead of polling.

use query_cache::CacheRead;

use crate::api;
use crate::error::Result;
use crate::keys;
use crate::models::{FeedPage, Post, User};
use crate::Client;

impl Client {
    pub async fn recent_posts(&self) -> Result<CacheRead<Vec<Post>>> {
        let store = self.store.clone();
        let read = self
            .cache
            .read(&keys::recent_posts(), move || async move {
                api::posts::fetch_recent_posts(&store)
                    .await
                    .map_err(anyhow::Error::from)
            })
            .await?;
        Ok(read)
    }

    /// One feed page per cursor. A remote failure on an uncached page is
    /// surfaced as an error the caller treats as a terminal page.
    pub async fn feed_page(&self, cursor: Option<&str>) -> Result<CacheRead<FeedPage>> {
        let store = self.store.clone();
        let owned_cursor = cursor.map(str::to_string);
        let read = self
            .cache
            .read(&keys::feed_page(cursor), move || async move {
                api::posts::fetch_feed_page(&store, owned_cursor.as_deref())
                    .await
                    .map_err(anyhow::Error::from)
            })
            .await?;
        Ok(read)
    }

    pub async fn post_by_id(&self, post_id: &str) -> Result<CacheRead<Post>> {
        let store = self.store.clone();
        let owned_id = post_id.to_string();
        let read = self
            .cache
            .read(&keys::post_by_id(post_id), move || async move {
                api::posts::fetch_post_by_id(&store, &owned_id)
                    .await
                    .map_err(anyhow::Error::from)
            })
            .await?;
        Ok(read)
    }

    pub async fn user_posts(&self, user_id: &str) -> Result<CacheRead<Vec<Post>>> {
        let store = self.store.clone();
        let owned_id = user_id.to_string();
        let read = self
            .cache
            .read(&keys::user_posts(user_id), move || async move {
                api::posts::fetch_user_posts(&store, &owned_id)
                    .await
                    .map_err(anyhow::Error::from)
            })
            .await?;
        Ok(read)
    }

    pub async fn search_posts(&self, term: &str) -> Result<CacheRead<Vec<Post>>> {
        let store = self.store.clone();
        let owned_term = term.to_string();
        let read = self
            .cache
            .read(&keys::search_posts(term), move || async move {
                api::posts::search_posts(&store, &owned_term)
                    .await
                    .map_err(anyhow::Error::from)
            })
            .await?;
        Ok(read)
    }

    pub async fn current_user(&self) -> Result<CacheRead<User>> {
        let store = self.store.clone();
        let read = self
            .cache
            .read(&keys::current_user(), move || async move {
                api::users::fetch_current_user(&store)
                    .await
                    .map_err(anyhow::Error::from)
            })
            .await?;
        Ok(read)
    }

    pub async fn user_by_id(&self, user_id: &str) -> Result<CacheRead<User>> {
        let store = self.store.clone();
        let owned_id = user_id.to_string();
        let read = self
            .cache
            .read(&keys::user_by_id(user_id), move || async move {
                api::users::fetch_user_by_id(&store, &owned_id)
                    .await
                    .map_err(anyhow::Error::from)
            })
            .await?;
        Ok(read)
    }

    pub async fn users(&self, limit: Option<usize>) -> Result<CacheRead<Vec<User>>> {
        let store = self.store.clone();
        let read = self
            .cache
            .read(&keys::users(limit), move || async move {
                api::users::fetch_users(&store, limit)
                    .await
                    .map_err(anyhow::Error::from)
            })
            .await?;
        Ok(read)
    }
}
