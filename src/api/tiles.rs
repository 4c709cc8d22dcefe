use anyhow::{Context, Result};
use axum::body::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::maps::tiles::{TileCoord, TileProvider};

/// A tile body and whether it is the transparent fallback
pub struct TileBody {
    pub bytes: Bytes,
    pub fallback: bool,
}

/// Fetches raster tiles from the provider, substituting the fallback tile on
/// any failure
pub struct TileClient {
    client: reqwest::Client,
    provider: Arc<TileProvider>,
}

impl TileClient {
    pub fn new(provider: Arc<TileProvider>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("user-directory/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create tile HTTP client")?;

        Ok(Self { client, provider })
    }

    pub fn provider(&self) -> &TileProvider {
        &self.provider
    }

    /// Load one tile. Never fails: errors are logged and answered with the
    /// fallback tile. There is no failover to another provider.
    pub async fn fetch_tile(&self, coord: TileCoord) -> TileBody {
        let url = self.provider.upstream_url(coord);

        match self.load(&url).await {
            Ok(bytes) => TileBody {
                bytes,
                fallback: false,
            },
            Err(e) => {
                warn!(url = %url, error = %e, "Tile load failed, serving fallback tile");
                self.fallback()
            }
        }
    }

    pub fn fallback(&self) -> TileBody {
        TileBody {
            bytes: Bytes::copy_from_slice(self.provider.error_tile()),
            fallback: true,
        }
    }

    async fn load(&self, url: &str) -> Result<Bytes> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to reach tile provider")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Tile provider returned error status: {}", status);
        }

        response.bytes().await.context("Failed to read tile body")
    }
}
