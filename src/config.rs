//! Viewer configuration
//!
//! Sources, lowest precedence first:
//! 1. built-in defaults
//! 2. optional YAML file named by `PLACES_CONFIG`
//! 3. environment variables
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `PLACES_API_URL` | upstream GIS API base | `https://santjosepgis.chroma.agency` |
//! | `PLACES_THEME` | `qc` or anything else | quantum |
//! | `PLACES_HTTP_TIMEOUT_SECS` | upstream request timeout | 30 |
//! | `SERVER_PORT` | listen port | 3000 |
//! | `STATIC_DIR` | static assets | `static` |
//!
//! Read once at startup; there is no runtime reconfiguration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use place_types::LatLng;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::cache::StalenessPolicy;
use crate::error::ConfigError;
use crate::gateway::GatewayConfig;
use crate::map::widget::{MapOptions, TileLayer};

pub const DEFAULT_API_URL: &str = "https://santjosepgis.chroma.agency";

/// Sant Josep de sa Talaia
pub const DEFAULT_CENTER: LatLng = LatLng {
    lat: 38.9368719,
    lng: 1.2610344,
};
pub const DEFAULT_ZOOM: u8 = 12;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_PORT: u16 = 3000;

/// Deployment theme; only changes the map attribution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Quantum,
    Qc,
}

impl Theme {
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("qc") {
            Theme::Qc
        } else {
            Theme::Quantum
        }
    }

    pub fn attribution(&self) -> &'static str {
        match self {
            Theme::Qc => r#"<a href="https://n8.com/attributions">N8 Maps</a>"#,
            Theme::Quantum => r#"<a href="https://quantum.com/attributions">Quantum Maps</a>"#,
        }
    }
}

// ============================================================================
// YAML FILE
// ============================================================================

/// Shape of the optional `PLACES_CONFIG` YAML file. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub upstream: UpstreamSection,
    pub theme: Option<Theme>,
    pub map: MapSection,
    pub cache: CacheSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpstreamSection {
    pub url: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MapSection {
    /// `[lat, lng]`
    pub center: Option<[f64; 2]>,
    pub zoom: Option<u8>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CacheSection {
    pub default_stale_secs: Option<u64>,
    /// Extra or overriding per-prefix windows
    pub stale_rules: Vec<StaleRule>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StaleRule {
    pub prefix: String,
    pub stale_secs: u64,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&content, path)
    }

    fn from_yaml(content: &str, path: &Path) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(|source| ConfigError::Yaml {
            path: path.display().to_string(),
            source,
        })
    }
}

// ============================================================================
// RESOLVED CONFIG
// ============================================================================

#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub upstream_url: Url,
    pub timeout: Duration,
    pub theme: Theme,
    pub center: LatLng,
    pub zoom: u8,
    pub staleness: StalenessPolicy,
    pub server_port: u16,
    pub static_dir: PathBuf,
}

impl ViewerConfig {
    /// Built-in defaults, before file and environment overrides
    pub fn defaults() -> Result<Self, ConfigError> {
        Ok(Self {
            upstream_url: parse_url(DEFAULT_API_URL)?,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            theme: Theme::default(),
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            staleness: StalenessPolicy::default(),
            server_port: DEFAULT_PORT,
            static_dir: PathBuf::from("static"),
        })
    }

    /// Load from the process environment (and `PLACES_CONFIG` when set)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::defaults()?;

        if let Some(path) = lookup("PLACES_CONFIG").filter(|p| !p.trim().is_empty()) {
            let file = FileConfig::from_file(Path::new(&path))?;
            tracing::info!(path = %path, "Loaded viewer config file");
            config.apply_file(file)?;
        }

        if let Some(url) = lookup("PLACES_API_URL") {
            config.upstream_url = parse_url(&url)?;
        }
        if let Some(theme) = lookup("PLACES_THEME") {
            config.theme = Theme::parse(&theme);
        }
        if let Some(secs) = lookup("PLACES_HTTP_TIMEOUT_SECS") {
            config.timeout = Duration::from_secs(parse_number("PLACES_HTTP_TIMEOUT_SECS", &secs)?);
        }
        if let Some(port) = lookup("SERVER_PORT") {
            config.server_port = parse_number("SERVER_PORT", &port)?;
        }
        if let Some(dir) = lookup("STATIC_DIR") {
            config.static_dir = PathBuf::from(dir);
        }

        Ok(config)
    }

    pub fn apply_file(&mut self, file: FileConfig) -> Result<(), ConfigError> {
        if let Some(url) = file.upstream.url {
            self.upstream_url = parse_url(&url)?;
        }
        if let Some(secs) = file.upstream.timeout_secs {
            self.timeout = Duration::from_secs(secs);
        }
        if let Some(theme) = file.theme {
            self.theme = theme;
        }
        if let Some([lat, lng]) = file.map.center {
            self.center = LatLng::new(lat, lng);
        }
        if let Some(zoom) = file.map.zoom {
            self.zoom = zoom;
        }

        let mut staleness = self.staleness.clone();
        if let Some(secs) = file.cache.default_stale_secs {
            staleness = staleness.with_default(Duration::from_secs(secs));
        }
        for rule in file.cache.stale_rules {
            staleness = staleness.with_rule(rule.prefix, Duration::from_secs(rule.stale_secs));
        }
        self.staleness = staleness;

        Ok(())
    }

    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            base_url: self.upstream_url.clone(),
            timeout: self.timeout,
        }
    }

    pub fn map_options(&self) -> MapOptions {
        MapOptions {
            center: self.center,
            zoom: self.zoom,
            tiles: TileLayer::for_theme(self.theme),
        }
    }
}

fn parse_url(value: &str) -> Result<Url, ConfigError> {
    Url::parse(value.trim()).map_err(|source| ConfigError::InvalidUrl {
        url: value.to_string(),
        source,
    })
}

fn parse_number<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}
