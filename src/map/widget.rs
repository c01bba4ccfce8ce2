//! Mapping widget seam
//!
//! The synchronizer drives any widget through [`MapWidget`]; the widget
//! hands back opaque [`LayerId`]s that never leave the synchronizer.

use place_types::{DrawnGeometry, LatLng};
use serde::Serialize;

use crate::config::Theme;
use crate::error::WidgetInitError;
use crate::map::style::{MarkerStyle, ShapeStyle};

/// Opaque handle to a layer living inside a widget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct LayerId(pub u64);

/// Base map tiles
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileLayer {
    pub url_template: &'static str,
    pub attribution: &'static str,
    pub subdomains: &'static str,
    pub max_zoom: u8,
}

impl TileLayer {
    pub fn for_theme(theme: Theme) -> Self {
        Self {
            url_template: "https://{s}.basemaps.cartocdn.com/dark_all/{z}/{x}/{y}{r}.png",
            attribution: theme.attribution(),
            subdomains: "abcd",
            max_zoom: 19,
        }
    }
}

/// Initial widget configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapOptions {
    pub center: LatLng,
    pub zoom: u8,
    pub tiles: TileLayer,
}

/// Everything a widget needs to draw one marker
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerSpec {
    /// `None` for markers the user drew
    pub place_id: Option<i64>,
    pub position: LatLng,
    pub style: MarkerStyle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub popup_html: Option<String>,
}

/// An externally implemented mapping widget
///
/// Calls referring to an unknown layer are ignored by implementations.
pub trait MapWidget: Send {
    fn add_tile_layer(&mut self, tiles: &TileLayer);

    fn set_view(&mut self, center: LatLng, zoom: u8);

    fn add_marker(&mut self, marker: &MarkerSpec) -> LayerId;

    /// Restyle and/or move an existing marker
    fn update_marker(&mut self, layer: LayerId, marker: &MarkerSpec);

    /// Non-point drawn geometry
    fn add_shape(&mut self, geometry: &DrawnGeometry, style: &ShapeStyle) -> LayerId;

    fn update_shape(&mut self, layer: LayerId, geometry: &DrawnGeometry);

    fn remove_layer(&mut self, layer: LayerId);

    /// Membership in the editable group used by the drawing tools
    fn set_editable(&mut self, layer: LayerId, editable: bool);

    /// Show or hide the drawing toolbar; `start_marker` opens the marker tool
    fn set_draw_controls(&mut self, visible: bool, start_marker: bool);

    fn open_popup(&mut self, layer: LayerId);

    fn close_popup(&mut self);

    /// Release the widget; no further calls follow
    fn destroy(&mut self);

    /// Serializable view of the current scene, when the widget can produce one
    fn snapshot(&self) -> Option<crate::map::scene::SceneSnapshot> {
        None
    }
}

/// Creates widgets; construction may fail (missing container, renderer error)
pub trait WidgetFactory {
    fn create(&self, options: &MapOptions) -> Result<Box<dyn MapWidget>, WidgetInitError>;
}
