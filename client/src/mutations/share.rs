//! Share: delegation to the platform share capability
//!
//! Not a store mutation. Stateless, no cache interaction; a platform
//! without the capability reports unsupported to the caller.

use crate::error::{AppError, Result};
use crate::remote::{ShareError, ShareRequest};
use crate::Client;

impl Client {
    pub async fn share_post(&self, title: &str, text: &str, url: &str) -> Result<()> {
        let request = ShareRequest {
            title: title.to_string(),
            text: text.to_string(),
            url: url.to_string(),
        };

        self.share.share(request).await.map_err(|err| match err {
            ShareError::Unsupported => {
                AppError::Unsupported("platform has no share capability".to_string())
            }
            // The capability exists but the attempt failed; retryable by a
            // new user action like any other runtime failure.
            ShareError::Failed(message) => {
                AppError::Remote(format!("platform share failed: {}", message))
            }
        })
    }
}
