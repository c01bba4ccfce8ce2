//! Upstream GIS API client
//!
//! Thin HTTP client for the municipal places API. One attempt per call, no
//! retries and no caching; the caller decides what to do with a failure.
//!
//! - `GET {base}/places/?name=&type=` - list (any of the shapes the normalizer accepts)
//! - `GET {base}/places/{id}/` - single feature

use std::time::Duration;

use async_trait::async_trait;
use place_types::{Place, PlaceList, PlaceQuery};
use reqwest::{header::ACCEPT, Client, StatusCode};
use serde_json::Value;
use url::Url;

use crate::error::{GatewayError, UpstreamError};
use crate::normalize::{normalize, normalize_feature};

/// Source of places consumed by the catalog and cache layer
///
/// Implementations must be Send + Sync; fetches run inside shared futures.
#[async_trait]
pub trait PlaceSource: Send + Sync {
    /// Fetch and normalize the list endpoint
    async fn list_places(&self, query: &PlaceQuery) -> Result<PlaceList, UpstreamError>;

    /// Fetch and normalize a single place
    async fn get_place(&self, id: i64) -> Result<Place, GatewayError>;
}

/// Connection settings for the upstream API
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub base_url: Url,
    pub timeout: Duration,
}

/// HTTP client for the upstream places API
#[derive(Debug, Clone)]
pub struct UpstreamGateway {
    http: Client,
    base_url: Url,
}

impl UpstreamGateway {
    pub fn new(config: &GatewayConfig) -> Result<Self, UpstreamError> {
        if config.base_url.cannot_be_a_base() {
            return Err(UpstreamError::transport(format!(
                "Upstream URL {} cannot be used as a base",
                config.base_url
            )));
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| UpstreamError::transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Forward a raw list query string (without `?`) and return the body untouched
    pub async fn forward_list(&self, raw_query: Option<&str>) -> Result<Value, UpstreamError> {
        let mut url = self.endpoint(&["places", ""]);
        url.set_query(raw_query.filter(|q| !q.is_empty()));
        self.fetch_json(url).await
    }

    /// Forward a detail lookup and return the body untouched
    pub async fn forward_detail(&self, id: &str) -> Result<Value, UpstreamError> {
        let url = self.endpoint(&["places", id, ""]);
        self.fetch_json(url).await
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // cannot_be_a_base was rejected in new()
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn fetch_json(&self, url: Url) -> Result<Value, UpstreamError> {
        tracing::debug!(%url, "Upstream request");

        let response = self
            .http
            .get(url.clone())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(%url, error = %e, "Upstream request failed");
                UpstreamError::transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%url, status = status.as_u16(), "Upstream returned error status");
            return Err(UpstreamError::status(status.as_u16()));
        }

        response.json::<Value>().await.map_err(|e| {
            tracing::warn!(%url, error = %e, "Upstream body is not JSON");
            UpstreamError::transport(format!("Invalid JSON from upstream: {}", e))
        })
    }
}

#[async_trait]
impl PlaceSource for UpstreamGateway {
    async fn list_places(&self, query: &PlaceQuery) -> Result<PlaceList, UpstreamError> {
        let mut url = self.endpoint(&["places", ""]);
        let pairs = query.pairs();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }

        let raw = self.fetch_json(url).await?;
        let places = normalize(&raw);
        tracing::debug!(count = places.len(), ?query, "Places fetched");
        Ok(places)
    }

    async fn get_place(&self, id: i64) -> Result<Place, GatewayError> {
        let url = self.endpoint(&["places", &id.to_string(), ""]);

        let raw = match self.fetch_json(url).await {
            Ok(raw) => raw,
            Err(e) if e.status == Some(StatusCode::NOT_FOUND.as_u16()) => {
                return Err(GatewayError::NotFound(id))
            }
            Err(e) => return Err(e.into()),
        };

        normalize_feature(&raw).map_err(|warning| {
            UpstreamError::transport(format!("Malformed place {}: {}", id, warning.reason)).into()
        })
    }
}
