use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;

use crate::resources::constants::DEFAULT_TILE_SERVER;
use crate::tile_system::types::{TileError, TileId};

/// Source of raw tile bytes.
///
/// Implementations report failures through `anyhow`; a [`TileError`] inside the
/// chain is kept as the slot's failure reason, anything else becomes
/// [`TileError::Transport`].
#[async_trait]
pub trait TileFetcher: Send + Sync + 'static {
    async fn fetch(&self, tile: TileId) -> anyhow::Result<Vec<u8>>;
}

/// Reduce a fetch failure to the reason recorded on the slot
pub fn classify_error(err: &anyhow::Error) -> TileError {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<TileError>().cloned())
        .unwrap_or_else(|| TileError::Transport(format!("{err:#}")))
}

/// Fetches tiles from a slippy-map server
pub struct HttpTileFetcher {
    /// HTTP client for making requests
    client: Client,
    /// URL with `{z}`, `{x}` and `{y}` placeholders
    url_template: String,
}

impl HttpTileFetcher {
    pub fn new(url_template: impl Into<String>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .user_agent(concat!("aerial-map/", env!("CARGO_PKG_VERSION")))
            .pool_max_idle_per_host(8)
            .build()
            .context("building HTTP client")?;

        Ok(Self {
            client,
            url_template: url_template.into(),
        })
    }

    /// Fetcher for the public OpenStreetMap tile server
    pub fn openstreetmap() -> anyhow::Result<Self> {
        Self::new(DEFAULT_TILE_SERVER)
    }

    pub fn tile_url(&self, tile: TileId) -> String {
        self.url_template
            .replace("{z}", &tile.zoom.to_string())
            .replace("{x}", &tile.x.to_string())
            .replace("{y}", &tile.y.to_string())
    }
}

#[async_trait]
impl TileFetcher for HttpTileFetcher {
    async fn fetch(&self, tile: TileId) -> anyhow::Result<Vec<u8>> {
        let url = self.tile_url(tile);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("requesting {url}"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TileError::HttpStatus(status.as_u16()).into());
        }

        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("reading body of {url}"))?;
        if bytes.is_empty() {
            return Err(TileError::EmptyPayload.into());
        }
        Ok(bytes.to_vec())
    }
}
