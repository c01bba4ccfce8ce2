//! Places Map
//!
//! Back-end and view-model library for the municipal places map.
//!
//! ```text
//! UpstreamGateway -> normalize -> QueryCache (PlaceCatalog) -> filter -> MapSynchronizer -> widget
//!                                                                 ^            |
//!                                                                 +- ViewShell <- MapEvent
//! ```
//!
//! Network calls happen only in the gateway. Normalization, filtering and
//! marker reconciliation are synchronous.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod filter;
pub mod gateway;
pub mod map;
pub mod normalize;
pub mod stats;
pub mod view;

pub use cache::{CacheStatus, Fingerprint, QueryCache, StalenessPolicy};
pub use catalog::PlaceCatalog;
pub use config::{Theme, ViewerConfig};
pub use error::{
    ConfigError, GatewayError, NormalizationWarning, UpstreamError, ValidationWarning,
    WidgetInitError,
};
pub use filter::{filter_places, FilterResult};
pub use gateway::{GatewayConfig, PlaceSource, UpstreamGateway};
pub use normalize::{normalize, normalize_report, NormalizeReport};
pub use stats::PlaceStats;
pub use view::{ViewOutcome, ViewShell, ViewSummary};

pub use place_types;
