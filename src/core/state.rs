// Application state (AppState)

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::api::client::ApiClient;
use crate::api::tiles::TileClient;
use crate::core::config::Config;
use crate::maps::layout::Size;
use crate::maps::tiles::TileProvider;
use crate::maps::widget::{MapEngine, TileMapEngine};
use crate::stores::document::Document;
use crate::stores::map_registry::MapRegistry;

/// Shared application state
///
/// One instance per page session. All fields are wrapped in Arc so spawned
/// timers and handlers can hold their own clone.
#[derive(Clone)]
pub struct AppState {
    /// The rendered page
    pub document: Arc<RwLock<Document>>,

    /// Live map widgets
    pub maps: Arc<MapRegistry>,

    /// Builds map widgets
    pub engine: Arc<dyn MapEngine>,

    /// Upstream user list
    pub api_client: Arc<ApiClient>,

    /// Tile proxy client
    pub tiles: Arc<TileClient>,

    /// Configuration
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let provider = Arc::new(TileProvider::from_config(&config.map)?);
        let engine: Arc<dyn MapEngine> = Arc::new(TileMapEngine::new(Arc::clone(&provider)));
        Self::build(config, engine, provider)
    }

    /// Build state around a specific map engine
    pub fn with_engine(config: Config, engine: Arc<dyn MapEngine>) -> Result<Self> {
        let provider = Arc::new(TileProvider::from_config(&config.map)?);
        Self::build(config, engine, provider)
    }

    fn build(config: Config, engine: Arc<dyn MapEngine>, provider: Arc<TileProvider>) -> Result<Self> {
        let timeout = Duration::from_secs(config.source.timeout_secs);

        let api_client = ApiClient::new(config.source.users_endpoint.clone(), timeout)?;
        let tiles = TileClient::new(provider, timeout)?;

        let viewport = Size::new(config.layout.viewport_width, config.layout.viewport_height);

        Ok(Self {
            document: Arc::new(RwLock::new(Document::new(viewport))),
            maps: Arc::new(MapRegistry::with_capacity(config.map.max_live_maps)),
            engine,
            api_client: Arc::new(api_client),
            tiles: Arc::new(tiles),
            config: Arc::new(config),
        })
    }
}
