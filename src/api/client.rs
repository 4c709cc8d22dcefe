use anyhow::{Context, Result};
use std::time::Duration;
use tracing::debug;

use crate::core::error::FetchError;
use crate::models::user::UserRecord;

/// Client for the upstream user directory API
pub struct ApiClient {
    client: reqwest::Client,
    endpoint: String,
}

impl ApiClient {
    pub fn new(endpoint: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fetch the full user list. The list is all-or-nothing: one malformed
    /// record fails the whole response.
    pub async fn fetch_users(&self) -> Result<Vec<UserRecord>, FetchError> {
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
            });
        }

        let users = response
            .json::<Vec<UserRecord>>()
            .await
            .map_err(|e| {
                if e.is_decode() {
                    FetchError::Parse(e.to_string())
                } else {
                    FetchError::Network(e.to_string())
                }
            })?;

        debug!(users = users.len(), "User list received");

        Ok(users)
    }
}
