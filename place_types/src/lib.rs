//! Place Types - Level 1 Foundation Types
//!
//! Pure data structures shared by the places map library and the web server.
//! Nothing in here talks to the network, the cache or the map widget.
//!
//! ## Contents
//!
//! - Location categories (`LocationType`) and the type filter sentinel
//! - The canonical `Place` record and `PlaceList`
//! - Filter state driven by the view
//! - Upstream list query parameters
//! - Drawing payloads and map events emitted by the synchronizer
//!
//! ## Rules
//!
//! 1. **NO BUSINESS LOGIC** - constructors, accessors and parsing only
//! 2. **NO WORKSPACE DEPENDENCIES**
//! 3. **SERIALIZABLE** - every type supports serde

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// LOCATION TYPES
// ============================================================================

/// Category of a place as published by the municipal GIS API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationType {
    WaterWell,
    Office,
    Store,
    Warehouse,
    Bar,
    Restaurant,
    Hotel,
    Sport,
    #[serde(other)]
    Other,
}

impl LocationType {
    /// Every category, in declaration order
    pub const ALL: [LocationType; 9] = [
        LocationType::WaterWell,
        LocationType::Office,
        LocationType::Store,
        LocationType::Warehouse,
        LocationType::Bar,
        LocationType::Restaurant,
        LocationType::Hotel,
        LocationType::Sport,
        LocationType::Other,
    ];

    /// Parse an upstream type string. Total: unknown values become `Other`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "water_well" => LocationType::WaterWell,
            "office" => LocationType::Office,
            "store" => LocationType::Store,
            "warehouse" => LocationType::Warehouse,
            "bar" => LocationType::Bar,
            "restaurant" => LocationType::Restaurant,
            "hotel" => LocationType::Hotel,
            "sport" => LocationType::Sport,
            _ => LocationType::Other,
        }
    }

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationType::WaterWell => "water_well",
            LocationType::Office => "office",
            LocationType::Store => "store",
            LocationType::Warehouse => "warehouse",
            LocationType::Bar => "bar",
            LocationType::Restaurant => "restaurant",
            LocationType::Hotel => "hotel",
            LocationType::Sport => "sport",
            LocationType::Other => "other",
        }
    }

    /// Display label for filter dropdowns ("Water well", "Bar", ...)
    pub fn label(&self) -> &'static str {
        match self {
            LocationType::WaterWell => "Water well",
            LocationType::Office => "Office",
            LocationType::Store => "Store",
            LocationType::Warehouse => "Warehouse",
            LocationType::Bar => "Bar",
            LocationType::Restaurant => "Restaurant",
            LocationType::Hotel => "Hotel",
            LocationType::Sport => "Sport",
            LocationType::Other => "Other",
        }
    }
}

impl fmt::Display for LocationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type filter: a single category or the `all` sentinel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TypeFilter {
    #[default]
    All,
    Only(LocationType),
}

impl TypeFilter {
    /// Sentinel string accepted for "no type filter"
    pub const ALL_SENTINEL: &'static str = "all";

    /// Parse a filter value. Empty and `all` mean no filter.
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(Self::ALL_SENTINEL) {
            TypeFilter::All
        } else {
            TypeFilter::Only(LocationType::parse(trimmed))
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TypeFilter::All => Self::ALL_SENTINEL,
            TypeFilter::Only(t) => t.as_str(),
        }
    }

    /// Whether a place of the given type passes this filter
    pub fn matches(&self, place_type: LocationType) -> bool {
        match self {
            TypeFilter::All => true,
            TypeFilter::Only(t) => *t == place_type,
        }
    }
}

impl From<String> for TypeFilter {
    fn from(value: String) -> Self {
        TypeFilter::parse(&value)
    }
}

impl From<TypeFilter> for String {
    fn from(value: TypeFilter) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for TypeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// PLACES
// ============================================================================

/// Geographic position in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Canonical point-of-interest record
///
/// Produced by the normalizer and never mutated afterwards; a re-fetch
/// produces a new snapshot. Identity is `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub id: i64,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub place_type: LocationType,
    pub lat: f64,
    pub lng: f64,
    /// Upstream `properties` object, kept verbatim
    #[serde(default)]
    pub raw_properties: serde_json::Map<String, serde_json::Value>,
}

impl Place {
    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }

    /// Upstream type string as published, if any.
    ///
    /// Differs from `place_type.as_str()` when the upstream value was not a
    /// known category and the record fell back to `Other`.
    pub fn raw_type(&self) -> Option<&str> {
        self.raw_properties
            .get("type")
            .and_then(serde_json::Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Ordered places from one fetch cycle (upstream order)
pub type PlaceList = Vec<Place>;

// ============================================================================
// FILTERS AND QUERIES
// ============================================================================

/// Search and type filter owned by the view
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilterState {
    #[serde(default)]
    pub search_term: String,
    #[serde(default)]
    pub type_filter: TypeFilter,
}

impl FilterState {
    pub fn new(search_term: impl Into<String>, type_filter: TypeFilter) -> Self {
        Self {
            search_term: search_term.into(),
            type_filter,
        }
    }

    /// Search term with surrounding whitespace removed
    pub fn trimmed_term(&self) -> &str {
        self.search_term.trim()
    }

    pub fn is_active(&self) -> bool {
        !self.trimmed_term().is_empty() || self.type_filter != TypeFilter::All
    }
}

/// Query parameters of the upstream list endpoint
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlaceQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub place_type: Option<String>,
}

impl PlaceQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            place_type: None,
        }
    }

    pub fn by_type(place_type: impl Into<String>) -> Self {
        Self {
            name: None,
            place_type: Some(place_type.into()),
        }
    }

    /// Non-empty parameters in wire order (`name`, then `type`)
    pub fn pairs(&self) -> Vec<(&'static str, &str)> {
        let mut pairs = Vec::with_capacity(2);
        if let Some(name) = self.name.as_deref().filter(|v| !v.is_empty()) {
            pairs.push(("name", name));
        }
        if let Some(t) = self.place_type.as_deref().filter(|v| !v.is_empty()) {
            pairs.push(("type", t));
        }
        pairs
    }
}

// ============================================================================
// DRAWING AND MAP EVENTS
// ============================================================================

/// Kind of user-drawn shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    Point,
    Line,
    Polygon,
    Circle,
    Rectangle,
}

/// Invalid drawn geometry
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error("{kind:?} needs at least {min} vertices, got {got}")]
    TooFewVertices { kind: ShapeKind, min: usize, got: usize },
    #[error("circle radius must be positive, got {0}")]
    InvalidRadius(f64),
}

/// Geometry produced by the drawing tools
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DrawnGeometry {
    Point { position: LatLng },
    Line { vertices: Vec<LatLng> },
    Polygon { vertices: Vec<LatLng> },
    Circle { center: LatLng, radius_m: f64 },
    Rectangle { south_west: LatLng, north_east: LatLng },
}

impl DrawnGeometry {
    pub fn point(position: LatLng) -> Self {
        DrawnGeometry::Point { position }
    }

    pub fn line(vertices: Vec<LatLng>) -> Result<Self, GeometryError> {
        if vertices.len() < 2 {
            return Err(GeometryError::TooFewVertices {
                kind: ShapeKind::Line,
                min: 2,
                got: vertices.len(),
            });
        }
        Ok(DrawnGeometry::Line { vertices })
    }

    pub fn polygon(vertices: Vec<LatLng>) -> Result<Self, GeometryError> {
        if vertices.len() < 3 {
            return Err(GeometryError::TooFewVertices {
                kind: ShapeKind::Polygon,
                min: 3,
                got: vertices.len(),
            });
        }
        Ok(DrawnGeometry::Polygon { vertices })
    }

    pub fn circle(center: LatLng, radius_m: f64) -> Result<Self, GeometryError> {
        if radius_m.is_nan() || radius_m <= 0.0 {
            return Err(GeometryError::InvalidRadius(radius_m));
        }
        Ok(DrawnGeometry::Circle { center, radius_m })
    }

    pub fn rectangle(south_west: LatLng, north_east: LatLng) -> Self {
        DrawnGeometry::Rectangle {
            south_west,
            north_east,
        }
    }

    pub fn kind(&self) -> ShapeKind {
        match self {
            DrawnGeometry::Point { .. } => ShapeKind::Point,
            DrawnGeometry::Line { .. } => ShapeKind::Line,
            DrawnGeometry::Polygon { .. } => ShapeKind::Polygon,
            DrawnGeometry::Circle { .. } => ShapeKind::Circle,
            DrawnGeometry::Rectangle { .. } => ShapeKind::Rectangle,
        }
    }

    /// Representative position: the point itself, the circle center, the
    /// first vertex of a line/polygon, the rectangle center.
    pub fn anchor(&self) -> Option<LatLng> {
        match self {
            DrawnGeometry::Point { position } => Some(*position),
            DrawnGeometry::Circle { center, .. } => Some(*center),
            DrawnGeometry::Line { vertices } | DrawnGeometry::Polygon { vertices } => {
                vertices.first().copied()
            }
            DrawnGeometry::Rectangle {
                south_west,
                north_east,
            } => Some(LatLng::new(
                (south_west.lat + north_east.lat) / 2.0,
                (south_west.lng + north_east.lng) / 2.0,
            )),
        }
    }
}

/// Identifier of a drafted place that has not been persisted yet.
/// Serializes as `"unsaved"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftId {
    #[default]
    Unsaved,
}

/// Place-like record emitted when the user drops a new point on the map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftPlace {
    pub id: DraftId,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub place_type: LocationType,
    pub position: LatLng,
}

impl DraftPlace {
    /// Fresh draft at a position; new points start out as water wells
    pub fn at(position: LatLng) -> Self {
        Self {
            id: DraftId::Unsaved,
            name: String::new(),
            description: String::new(),
            place_type: LocationType::WaterWell,
            position,
        }
    }
}

/// Coordinates/type of an existing place after the user edited its marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceEdit {
    pub id: i64,
    pub position: LatLng,
    #[serde(rename = "type")]
    pub place_type: LocationType,
}

/// Events emitted by the map synchronizer to its owner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MapEvent {
    PlaceSelected { id: i64 },
    SelectionCleared,
    PlaceDrafted(DraftPlace),
    PlaceEdited(PlaceEdit),
    ShapeDrawn { kind: ShapeKind },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_location_type_parse_is_total() {
        assert_eq!(LocationType::parse("bar"), LocationType::Bar);
        assert_eq!(LocationType::parse("  Hotel "), LocationType::Hotel);
        assert_eq!(LocationType::parse("WATER_WELL"), LocationType::WaterWell);
        assert_eq!(LocationType::parse("nightclub"), LocationType::Other);
        assert_eq!(LocationType::parse(""), LocationType::Other);
    }

    #[test]
    fn test_location_type_round_trips_wire_name() {
        for t in LocationType::ALL {
            assert_eq!(LocationType::parse(t.as_str()), t);
        }
    }

    #[test]
    fn test_location_type_unknown_deserializes_to_other() {
        let t: LocationType = serde_json::from_str("\"castle\"").unwrap();
        assert_eq!(t, LocationType::Other);
    }

    #[test]
    fn test_type_filter_parse() {
        assert_eq!(TypeFilter::parse("all"), TypeFilter::All);
        assert_eq!(TypeFilter::parse("ALL"), TypeFilter::All);
        assert_eq!(TypeFilter::parse(""), TypeFilter::All);
        assert_eq!(
            TypeFilter::parse("hotel"),
            TypeFilter::Only(LocationType::Hotel)
        );
    }

    #[test]
    fn test_type_filter_serializes_as_string() {
        let json = serde_json::to_string(&TypeFilter::Only(LocationType::Sport)).unwrap();
        assert_eq!(json, "\"sport\"");
        let back: TypeFilter = serde_json::from_str("\"all\"").unwrap();
        assert_eq!(back, TypeFilter::All);
    }

    #[test]
    fn test_filter_state_is_active() {
        assert!(!FilterState::default().is_active());
        assert!(!FilterState::new("   ", TypeFilter::All).is_active());
        assert!(FilterState::new("bar", TypeFilter::All).is_active());
        assert!(FilterState::new("", TypeFilter::Only(LocationType::Bar)).is_active());
    }

    #[test]
    fn test_place_query_pairs_skip_empty() {
        assert!(PlaceQuery::all().pairs().is_empty());
        assert_eq!(PlaceQuery::by_name("pozo").pairs(), vec![("name", "pozo")]);
        let q = PlaceQuery {
            name: Some(String::new()),
            place_type: Some("bar".into()),
        };
        assert_eq!(q.pairs(), vec![("type", "bar")]);
    }

    #[test]
    fn test_place_raw_type() {
        let mut props = serde_json::Map::new();
        props.insert("type".into(), serde_json::json!("castle"));
        let place = Place {
            id: 1,
            name: "Castell".into(),
            description: String::new(),
            place_type: LocationType::Other,
            lat: 38.9,
            lng: 1.2,
            raw_properties: props,
        };
        assert_eq!(place.raw_type(), Some("castle"));
        assert_eq!(place.position(), LatLng::new(38.9, 1.2));
    }

    #[test]
    fn test_geometry_validation() {
        let a = LatLng::new(0.0, 0.0);
        let b = LatLng::new(1.0, 1.0);
        assert!(DrawnGeometry::line(vec![a]).is_err());
        assert!(DrawnGeometry::line(vec![a, b]).is_ok());
        assert!(DrawnGeometry::polygon(vec![a, b]).is_err());
        assert!(DrawnGeometry::circle(a, 0.0).is_err());
        assert!(DrawnGeometry::circle(a, f64::NAN).is_err());
    }

    #[test]
    fn test_geometry_anchor() {
        let rect = DrawnGeometry::rectangle(LatLng::new(0.0, 0.0), LatLng::new(2.0, 4.0));
        assert_eq!(rect.anchor(), Some(LatLng::new(1.0, 2.0)));
        assert_eq!(rect.kind(), ShapeKind::Rectangle);
    }

    #[test]
    fn test_draft_place_serializes_unsaved_id() {
        let draft = DraftPlace::at(LatLng::new(38.93, 1.26));
        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json["id"], "unsaved");
        assert_eq!(json["type"], "water_well");
    }

    #[test]
    fn test_map_event_tagging() {
        let json = serde_json::to_value(MapEvent::PlaceSelected { id: 4 }).unwrap();
        assert_eq!(json, serde_json::json!({"event": "place_selected", "id": 4}));
    }
}
