//! Cache key builders
//!
//! All cache consumers go through these constructors so mutation
//! invalidation and read-through population agree on key identity.

use query_cache::QueryKey;

/// Operation names (the prefix component of every key)
pub mod ops {
    pub const RECENT_POSTS: &str = "recent_posts";
    pub const FEED_PAGE: &str = "feed_page";
    pub const POST_BY_ID: &str = "post_by_id";
    pub const USER_POSTS: &str = "user_posts";
    pub const SEARCH_POSTS: &str = "search_posts";
    pub const CURRENT_USER: &str = "current_user";
    pub const USER_BY_ID: &str = "user_by_id";
    pub const USERS: &str = "users";
}

pub fn recent_posts() -> QueryKey {
    QueryKey::new(ops::RECENT_POSTS)
}

/// Feed page key; the first page (no cursor) uses a fixed marker argument
pub fn feed_page(cursor: Option<&str>) -> QueryKey {
    QueryKey::new(ops::FEED_PAGE).arg(cursor.unwrap_or("start"))
}

pub fn post_by_id(post_id: &str) -> QueryKey {
    QueryKey::new(ops::POST_BY_ID).arg(post_id)
}

pub fn user_posts(user_id: &str) -> QueryKey {
    QueryKey::new(ops::USER_POSTS).arg(user_id)
}

pub fn search_posts(term: &str) -> QueryKey {
    QueryKey::new(ops::SEARCH_POSTS).arg(term)
}

pub fn current_user() -> QueryKey {
    QueryKey::new(ops::CURRENT_USER)
}

pub fn user_by_id(user_id: &str) -> QueryKey {
    QueryKey::new(ops::USER_BY_ID).arg(user_id)
}

pub fn users(limit: Option<usize>) -> QueryKey {
    match limit {
        Some(limit) => QueryKey::new(ops::USERS).arg(limit.to_string()),
        None => QueryKey::new(ops::USERS).arg("all"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_keys_share_one_operation() {
        assert!(feed_page(None).matches_op(ops::FEED_PAGE));
        assert!(feed_page(Some("P100")).matches_op(ops::FEED_PAGE));
        assert_ne!(feed_page(None), feed_page(Some("P100")));
    }

    #[test]
    fn test_post_key_identity() {
        assert_eq!(post_by_id("p1"), post_by_id("p1"));
        assert_ne!(post_by_id("p1"), post_by_id("p2"));
    }
}
