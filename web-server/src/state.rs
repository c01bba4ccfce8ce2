//! Shared application state
//!
//! One upstream gateway and one cached catalog per process. Every request
//! handler sees the same caches, so concurrent page loads share fetches.

use std::sync::Arc;

use places_map::{PlaceCatalog, UpstreamError, UpstreamGateway, ViewerConfig};

#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<UpstreamGateway>,
    pub catalog: PlaceCatalog<UpstreamGateway>,
    pub config: Arc<ViewerConfig>,
}

impl AppState {
    pub fn new(config: ViewerConfig) -> Result<Self, UpstreamError> {
        let gateway = Arc::new(UpstreamGateway::new(&config.gateway_config())?);
        let catalog = PlaceCatalog::new(Arc::clone(&gateway), config.staleness.clone());
        Ok(Self {
            gateway,
            catalog,
            config: Arc::new(config),
        })
    }
}
