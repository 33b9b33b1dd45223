//! Post interaction mutations: like, save, repost, view
//!
//! The optimistic toggle for likes computes the full likes sequence
//! client-side and resends it whole; the store does not toggle. Counters go
//! the other way: the client never computes the new count, it requests an
//! atomic server-side increment and applies a local +1 only as the
//! optimistic proposal.

use tracing::debug;

use crate::api;
use crate::error::{AppError, Result};
use crate::keys;
use crate::models::{Post, SaveRecord, User};
use crate::mutations::MutationOutcome;
use crate::Client;

/// Result of a like toggle: the full optimistic likes sequence and the
/// direction the toggle took
#[derive(Debug, Clone, PartialEq)]
pub struct LikeDelta {
    pub post_id: String,
    pub likes: Vec<String>,
    /// True when this toggle added the user, false when it removed them
    pub liked: bool,
}

impl Client {
    /// Toggle the acting user's membership in the post's likes set.
    ///
    /// Idempotent per toggle pair: two toggles by the same user restore the
    /// original membership. The toggle is computed against the latest cached
    /// state under the cache lock, so racing toggles never work from a stale
    /// snapshot.
    pub async fn toggle_like(
        &self,
        post_id: &str,
        user_id: &str,
    ) -> Result<MutationOutcome<LikeDelta>> {
        let key = keys::post_by_id(post_id);
        self.ensure_post_cached(post_id).await?;

        // Optimistic transition: Idle -> Pending.
        let mut added = false;
        let updated = self
            .cache
            .update::<Post, _>(&key, |post| {
                if let Some(pos) = post.likes.iter().position(|id| id == user_id) {
                    post.likes.remove(pos);
                } else {
                    post.likes.push(user_id.to_string());
                    added = true;
                }
            })
            .await?;
        let Some(post) = updated else {
            return Err(AppError::Conflict(format!(
                "post {} disappeared from cache before the toggle applied",
                post_id
            )));
        };

        let delta = LikeDelta {
            post_id: post_id.to_string(),
            likes: post.likes.clone(),
            liked: added,
        };
        debug!(post_id = %post_id, user_id = %user_id, liked = added, "optimistic like toggle");

        match api::posts::set_likes(&self.store, post_id, &delta.likes).await {
            Ok(_) => {
                self.invalidate_after_interaction(post_id).await;
                Ok(MutationOutcome::succeeded(delta))
            }
            Err(err) => {
                // Roll back this toggle's own delta against the current
                // state; a racing toggle may already have moved it on.
                let _ = self
                    .cache
                    .update::<Post, _>(&key, |post| {
                        if added {
                            post.likes.retain(|id| id != user_id);
                        } else if !post.is_liked_by(user_id) {
                            post.likes.push(user_id.to_string());
                        }
                    })
                    .await;
                Ok(MutationOutcome::failed(delta, err))
            }
        }
    }

    /// Save a post for the user: create-if-absent.
    ///
    /// An existing live record makes this a no-op success; otherwise a new
    /// record is created and the affected keys invalidated.
    pub async fn save_post(
        &self,
        user_id: &str,
        post_id: &str,
    ) -> Result<MutationOutcome<SaveRecord>> {
        let user_key = keys::current_user();

        // Existence check: cached current user first, then the store.
        let cached_user: Option<User> = self.cache.peek(&user_key).await?;
        if let Some(record) = cached_user
            .as_ref()
            .and_then(|user| user.save_record_for(post_id))
        {
            return Ok(MutationOutcome::succeeded(record.clone()));
        }
        if cached_user.is_none() {
            if let Some(record) =
                api::saves::find_save_record(&self.store, user_id, post_id).await?
            {
                return Ok(MutationOutcome::succeeded(record));
            }
        }

        // Optimistic placeholder until the store assigns the record id.
        let placeholder = SaveRecord {
            id: format!("pending-{}", post_id),
            user_id: user_id.to_string(),
            post_id: post_id.to_string(),
        };
        let placeholder_for_cache = placeholder.clone();
        let applied = self
            .cache
            .update::<User, _>(&user_key, |user| user.saves.push(placeholder_for_cache))
            .await?
            .is_some();

        match api::saves::create_save_record(&self.store, user_id, post_id).await {
            Ok(record) => {
                // Swap the placeholder for the store-assigned record so a
                // following unsave deletes by a live id.
                if applied {
                    let placeholder_id = placeholder.id.clone();
                    let real = record.clone();
                    let _ = self
                        .cache
                        .update::<User, _>(&user_key, |user| {
                            if let Some(slot) =
                                user.saves.iter_mut().find(|r| r.id == placeholder_id)
                            {
                                *slot = real;
                            }
                        })
                        .await;
                }
                self.invalidate_after_interaction(post_id).await;
                Ok(MutationOutcome::succeeded(record))
            }
            Err(err) => {
                if applied {
                    let placeholder_id = placeholder.id.clone();
                    let _ = self
                        .cache
                        .update::<User, _>(&user_key, |user| {
                            user.saves.retain(|record| record.id != placeholder_id)
                        })
                        .await;
                }
                Ok(MutationOutcome::failed(placeholder, err))
            }
        }
    }

    /// Remove the user's save record for a post.
    ///
    /// Deletion is by record id only. When no record id is known, or the
    /// store no longer has the record, this fails closed with a conflict and
    /// leaves the cached saved-state untouched; it never guesses by
    /// (user, post).
    pub async fn unsave_post(
        &self,
        user_id: &str,
        post_id: &str,
    ) -> Result<MutationOutcome<SaveRecord>> {
        let user_key = keys::current_user();

        let cached_record = match self.cache.peek::<User>(&user_key).await? {
            Some(user) => user.save_record_for(post_id).cloned(),
            None => None,
        };
        let record = match cached_record {
            Some(record) => record,
            None => api::saves::find_save_record(&self.store, user_id, post_id)
                .await?
                .ok_or_else(|| {
                    AppError::Conflict(format!("no save record known for post {}", post_id))
                })?,
        };

        // Optimistic removal.
        let record_id = record.id.clone();
        let applied = self
            .cache
            .update::<User, _>(&user_key, |user| {
                user.saves.retain(|r| r.id != record_id)
            })
            .await?
            .is_some();

        match api::saves::delete_save_record(&self.store, &record.id).await {
            Ok(()) => {
                self.invalidate_after_interaction(post_id).await;
                Ok(MutationOutcome::succeeded(record))
            }
            Err(AppError::NotFound(_)) => {
                // Stale record identifier: restore the cached state and fail
                // closed rather than pretend the unsave happened.
                if applied {
                    self.restore_save_record(&user_key, &record).await;
                }
                Err(AppError::Conflict(format!(
                    "save record {} no longer exists",
                    record.id
                )))
            }
            Err(err) => {
                if applied {
                    self.restore_save_record(&user_key, &record).await;
                }
                Ok(MutationOutcome::failed(record, err))
            }
        }
    }

    /// Repost: optimistic local +1, atomic server-side increment. Counters
    /// are irreversible; there is no decrement operation.
    pub async fn repost(&self, post_id: &str) -> Result<MutationOutcome<u64>> {
        let key = keys::post_by_id(post_id);
        self.ensure_post_cached(post_id).await?;

        let updated = self
            .cache
            .update::<Post, _>(&key, |post| post.reposts += 1)
            .await?;
        let Some(post) = updated else {
            return Err(AppError::Conflict(format!(
                "post {} disappeared from cache before the repost applied",
                post_id
            )));
        };
        let optimistic = post.reposts;

        match api::posts::increment_repost_count(&self.store, post_id).await {
            Ok(()) => {
                self.invalidate_after_interaction(post_id).await;
                Ok(MutationOutcome::succeeded(optimistic))
            }
            Err(err) => {
                let _ = self
                    .cache
                    .update::<Post, _>(&key, |post| {
                        post.reposts = post.reposts.saturating_sub(1)
                    })
                    .await;
                Ok(MutationOutcome::failed(optimistic, err))
            }
        }
    }

    /// Record a view: optimistic local +1, atomic server-side increment.
    /// Views are display-only; success does not invalidate anything.
    pub async fn record_view(&self, post_id: &str) -> Result<MutationOutcome<u64>> {
        let key = keys::post_by_id(post_id);
        self.ensure_post_cached(post_id).await?;

        let updated = self
            .cache
            .update::<Post, _>(&key, |post| post.views += 1)
            .await?;
        let Some(post) = updated else {
            return Err(AppError::Conflict(format!(
                "post {} disappeared from cache before the view applied",
                post_id
            )));
        };
        let optimistic = post.views;

        match api::posts::increment_view_count(&self.store, post_id).await {
            Ok(()) => Ok(MutationOutcome::succeeded(optimistic)),
            Err(err) => {
                let _ = self
                    .cache
                    .update::<Post, _>(&key, |post| {
                        post.views = post.views.saturating_sub(1)
                    })
                    .await;
                Ok(MutationOutcome::failed(optimistic, err))
            }
        }
    }

    /// Populate the post entry when it is not cached yet, so optimistic
    /// updates always have the latest known state to work against
    async fn ensure_post_cached(&self, post_id: &str) -> Result<()> {
        let key = keys::post_by_id(post_id);
        if self.cache.peek::<Post>(&key).await?.is_none() {
            let post = api::posts::fetch_post_by_id(&self.store, post_id).await?;
            self.cache.write(&key, &post).await?;
        }
        Ok(())
    }

    /// Keys affected by a post interaction; applied before the mutation's
    /// completion is observable to its caller
    async fn invalidate_after_interaction(&self, post_id: &str) {
        self.cache.invalidate(&keys::post_by_id(post_id)).await;
        self.cache.invalidate_op(keys::ops::RECENT_POSTS).await;
        self.cache.invalidate_op(keys::ops::FEED_PAGE).await;
        self.cache.invalidate(&keys::current_user()).await;
    }

    async fn restore_save_record(&self, user_key: &query_cache::QueryKey, record: &SaveRecord) {
        let restored = record.clone();
        let _ = self
            .cache
            .update::<User, _>(user_key, |user| {
                if !user.saves.iter().any(|r| r.id == restored.id) {
                    user.saves.push(restored);
                }
            })
            .await;
    }
}
