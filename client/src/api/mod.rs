//! Data access functions
//!
//! Thin request/response mapping between domain operations and the remote
//! store: no caching, no retry policy. Each function issues its calls exactly
//! once and returns typed models decoded at this boundary.

pub mod posts;
pub mod saves;
pub mod users;
