//! Configuration for the client data layer
//!
//! All remote store identifiers come from environment variables and all of
//! them are required: there are no baked-in fallback credentials. A missing
//! variable is a hard configuration error naming the variable.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Remote store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the remote store API
    pub endpoint: String,
    /// Project identifier sent with every request
    pub project_id: String,
    /// Document database identifier
    pub database_id: String,
    /// File storage bucket identifier
    pub storage_bucket_id: String,
    /// Collection identifiers
    pub collections: CollectionsConfig,
}

/// Per-collection identifiers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionsConfig {
    pub users: String,
    pub posts: String,
    pub saves: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let endpoint = require("GLIMMER_ENDPOINT")?;
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(ConfigError::Invalid {
                name: "GLIMMER_ENDPOINT",
                value: endpoint,
            });
        }

        Ok(Config {
            endpoint,
            project_id: require("GLIMMER_PROJECT_ID")?,
            database_id: require("GLIMMER_DATABASE_ID")?,
            storage_bucket_id: require("GLIMMER_STORAGE_BUCKET_ID")?,
            collections: CollectionsConfig {
                users: require("GLIMMER_USER_COLLECTION_ID")?,
                posts: require("GLIMMER_POST_COLLECTION_ID")?,
                saves: require("GLIMMER_SAVES_COLLECTION_ID")?,
            },
        })
    }
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(name)),
    }
}
