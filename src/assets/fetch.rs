// Network access for the asset worker.
// The `Fetch` trait is the seam between the cache and the network.

use async_trait::async_trait;
use reqwest::{Client, Url, header::CONTENT_TYPE};

use crate::error::{PanelError, Result};

use super::AssetResponse;

/// Fetches a URL from the network.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<AssetResponse>;
}

/// `Fetch` implementation over HTTP.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("schockpanel/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(PanelError::Http)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<AssetResponse> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?.to_vec();

        Ok(AssetResponse {
            status,
            content_type,
            body,
        })
    }
}
