//! eBird API 2.0 client.
//!
//! Requests are authenticated with the `X-eBirdApiToken` header. Each call
//! is a single request: a non-2xx status or an unparseable body becomes a
//! [`SourceError`] for the caller to record.

use std::time::Duration;

use async_trait::async_trait;
use hotspot_map_hotspot_models::RegionCode;
use hotspot_map_source_models::{RegionInfo, UpstreamHotspot};
use serde::de::DeserializeOwned;

use crate::{HotspotSource, SourceError};

/// Default API root.
pub const DEFAULT_BASE_URL: &str = "https://api.ebird.org/v2";

/// Environment variable holding the API token.
pub const API_KEY_ENV: &str = "EBIRD_API_KEY";

const TOKEN_HEADER: &str = "X-eBirdApiToken";

/// Maximum length of the response body preview kept in errors.
const BODY_PREVIEW_LEN: usize = 300;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// HTTP client for the eBird reference endpoints.
#[derive(Debug, Clone)]
pub struct EbirdClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl EbirdClient {
    /// Creates a client against [`DEFAULT_BASE_URL`].
    ///
    /// # Errors
    ///
    /// * If the HTTP client cannot be built
    pub fn new(api_key: impl Into<String>) -> Result<Self, SourceError> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Creates a client against a custom API root.
    ///
    /// # Errors
    ///
    /// * If the HTTP client cannot be built
    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    /// URL of a region's hotspot listing.
    #[must_use]
    pub fn hotspots_url(&self, region: &RegionCode) -> String {
        format!("{}/ref/hotspot/{region}?fmt=json", self.base_url)
    }

    /// URL of a region's info lookup.
    #[must_use]
    pub fn region_info_url(&self, region: &RegionCode) -> String {
        format!("{}/ref/region/info/{region}", self.base_url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, SourceError> {
        log::debug!("GET {url}");

        let response = self
            .client
            .get(url)
            .header(TOKEN_HEADER, &self.api_key)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(SourceError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body: text.chars().take(BODY_PREVIEW_LEN).collect(),
            });
        }

        serde_json::from_str(&text).map_err(|e| {
            log::warn!(
                "Unparseable response from {url} ({} bytes): {e}",
                text.len()
            );
            SourceError::Json(e)
        })
    }
}

#[async_trait]
impl HotspotSource for EbirdClient {
    async fn region_info(&self, region: &RegionCode) -> Result<RegionInfo, SourceError> {
        self.get_json(&self.region_info_url(region)).await
    }

    async fn hotspots(&self, region: &RegionCode) -> Result<Vec<UpstreamHotspot>, SourceError> {
        let hotspots: Vec<UpstreamHotspot> = self.get_json(&self.hotspots_url(region)).await?;
        log::info!("{region}: fetched {} hotspots", hotspots.len());
        Ok(hotspots)
    }
}
