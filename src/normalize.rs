//! Upstream payload normalization
//!
//! The GIS API has historically answered the list endpoint in three shapes:
//!
//! 1. a GeoJSON `FeatureCollection`
//! 2. a bare array of features
//! 3. a paginated wrapper `{ "count": .., "results": [...] }`, where `results`
//!    may itself be a `FeatureCollection`
//!
//! They are tried in that order. Anything else yields an empty list. Each
//! feature is then mapped into a [`Place`]; malformed features are dropped
//! individually so that one bad record never blanks the map.

use place_types::{LocationType, Place, PlaceList};
use serde_json::{Map, Value};

use crate::error::{NormalizationWarning, ValidationWarning};

/// Name given to places published without one
pub const DEFAULT_NAME: &str = "Sin nombre";

/// Places plus everything that was dropped or defaulted on the way
#[derive(Debug, Clone, Default)]
pub struct NormalizeReport {
    pub places: PlaceList,
    pub dropped: Vec<NormalizationWarning>,
    pub defaulted: Vec<ValidationWarning>,
}

/// Normalize any accepted upstream shape into a `PlaceList`. Never fails.
pub fn normalize(raw: &Value) -> PlaceList {
    normalize_report(raw).places
}

/// Same as [`normalize`], keeping the per-record warnings
pub fn normalize_report(raw: &Value) -> NormalizeReport {
    let mut report = NormalizeReport::default();

    let Some(features) = feature_sequence(raw) else {
        tracing::debug!("Upstream payload matched no known shape, returning no places");
        return report;
    };

    report.places.reserve(features.len());
    for (index, feature) in features.iter().enumerate() {
        match map_feature(index, feature, &mut report.defaulted) {
            Ok(place) => report.places.push(place),
            Err(warning) => {
                tracing::warn!(
                    index = warning.index,
                    id = ?warning.id,
                    reason = %warning.reason,
                    "Dropping malformed place record"
                );
                report.dropped.push(warning);
            }
        }
    }

    for warning in &report.defaulted {
        tracing::debug!(
            id = warning.id,
            field = warning.field,
            default = warning.default,
            "Place field defaulted"
        );
    }

    report
}

/// Normalize a single feature, as returned by the detail endpoint
pub fn normalize_feature(feature: &Value) -> Result<Place, NormalizationWarning> {
    let mut defaulted = Vec::new();
    map_feature(0, feature, &mut defaulted)
}

/// Locate the feature array, trying the accepted shapes in priority order
fn feature_sequence(raw: &Value) -> Option<&Vec<Value>> {
    if let Some(features) = feature_collection(raw) {
        return Some(features);
    }
    if let Value::Array(items) = raw {
        return Some(items);
    }
    match raw.get("results") {
        Some(Value::Array(items)) => Some(items),
        Some(inner) => feature_collection(inner),
        None => None,
    }
}

fn feature_collection(value: &Value) -> Option<&Vec<Value>> {
    if value.get("type").and_then(Value::as_str) != Some("FeatureCollection") {
        return None;
    }
    value.get("features").and_then(Value::as_array)
}

fn map_feature(
    index: usize,
    feature: &Value,
    defaulted: &mut Vec<ValidationWarning>,
) -> Result<Place, NormalizationWarning> {
    let reject = |id: Option<i64>, reason: &str| NormalizationWarning {
        index,
        id,
        reason: reason.to_string(),
    };

    let properties = feature.get("properties").and_then(Value::as_object);
    let id = feature
        .get("id")
        .and_then(as_id)
        .or_else(|| properties.and_then(|p| p.get("id")).and_then(as_id));

    let Some(properties) = properties else {
        return Err(reject(id, "missing properties"));
    };
    let Some(id) = id else {
        return Err(reject(None, "missing id"));
    };

    let coordinates = feature
        .get("geometry")
        .and_then(|g| g.get("coordinates"))
        .and_then(Value::as_array);
    let Some(coordinates) = coordinates else {
        return Err(reject(Some(id), "missing geometry.coordinates"));
    };
    if coordinates.len() < 2 {
        return Err(reject(Some(id), "geometry.coordinates has fewer than 2 elements"));
    }
    // GeoJSON positions are [lng, lat]
    let (Some(lng), Some(lat)) = (coordinates[0].as_f64(), coordinates[1].as_f64()) else {
        return Err(reject(Some(id), "geometry.coordinates are not numeric"));
    };

    let name = text_field(properties, "name").unwrap_or_else(|| {
        defaulted.push(ValidationWarning {
            id,
            field: "name",
            default: DEFAULT_NAME,
        });
        DEFAULT_NAME.to_string()
    });
    let description = text_field(properties, "description").unwrap_or_else(|| {
        defaulted.push(ValidationWarning {
            id,
            field: "description",
            default: "",
        });
        String::new()
    });
    let place_type = properties
        .get("type")
        .and_then(Value::as_str)
        .map(LocationType::parse)
        .unwrap_or(LocationType::Other);

    Ok(Place {
        id,
        name,
        description,
        place_type,
        lat,
        lng,
        raw_properties: properties.clone(),
    })
}

/// Integer ids, also accepting integer-valued strings ("12")
fn as_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn text_field(properties: &Map<String, Value>, key: &str) -> Option<String> {
    properties
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn features() -> Value {
        json!([
            {
                "type": "Feature",
                "id": 1,
                "geometry": {"type": "Point", "coordinates": [1.26, 38.93]},
                "properties": {"id": 1, "name": "Pou des Lleó", "description": "Pozo antiguo", "type": "water_well"}
            },
            {
                "type": "Feature",
                "id": 2,
                "geometry": {"type": "Point", "coordinates": [1.30, 38.90]},
                "properties": {"id": 2, "name": "Bar Costa", "description": "Terraza", "type": "bar"}
            }
        ])
    }

    #[test]
    fn test_shape_invariance() {
        let bare = features();
        let collection = json!({"type": "FeatureCollection", "features": bare.clone()});
        let paginated = json!({"count": 2, "next": null, "results": bare.clone()});
        let paginated_geojson = json!({"count": 2, "results": collection.clone()});

        let expected = normalize(&bare);
        assert_eq!(expected.len(), 2);
        assert_eq!(normalize(&collection), expected);
        assert_eq!(normalize(&paginated), expected);
        assert_eq!(normalize(&paginated_geojson), expected);
    }

    #[test]
    fn test_unknown_shapes_yield_empty_list() {
        for raw in [
            json!(null),
            json!(42),
            json!("places"),
            json!({"type": "Feature"}),
            json!({"type": "FeatureCollection"}),
            json!({"results": "nope"}),
            json!({"data": []}),
        ] {
            assert!(normalize(&raw).is_empty(), "expected empty for {}", raw);
        }
    }

    #[test]
    fn test_coordinate_axes_are_inverted() {
        let places = normalize(&features());
        assert_eq!(places[0].lat, 38.93);
        assert_eq!(places[0].lng, 1.26);
    }

    #[test]
    fn test_upstream_order_is_preserved() {
        let ids: Vec<i64> = normalize(&features()).iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_malformed_records_are_dropped_individually() {
        let raw = json!([
            {"id": 1, "geometry": {"coordinates": [1.0]}, "properties": {"name": "short"}},
            {"id": 2, "geometry": {"coordinates": [1.0, 2.0]}},
            {"id": 3, "properties": {"name": "no geometry"}},
            {"id": 4, "geometry": {"coordinates": ["a", "b"]}, "properties": {}},
            {"geometry": {"coordinates": [1.0, 2.0]}, "properties": {"name": "no id"}},
            {"id": 6, "geometry": {"coordinates": [1.5, 2.5]}, "properties": {"name": "ok"}}
        ]);
        let report = normalize_report(&raw);
        assert_eq!(report.places.len(), 1);
        assert_eq!(report.places[0].id, 6);
        assert_eq!(report.dropped.len(), 5);
        assert_eq!(report.dropped[0].index, 0);
        assert_eq!(report.dropped[1].reason, "missing properties");
        assert_eq!(report.dropped[4].id, None);
    }

    #[test]
    fn test_missing_display_fields_are_defaulted() {
        let raw = json!([
            {"id": 7, "geometry": {"coordinates": [1.0, 2.0]}, "properties": {"name": "  ", "type": "castle"}}
        ]);
        let report = normalize_report(&raw);
        let place = &report.places[0];
        assert_eq!(place.name, DEFAULT_NAME);
        assert_eq!(place.description, "");
        assert_eq!(place.place_type, LocationType::Other);
        assert_eq!(place.raw_type(), Some("castle"));
        let fields: Vec<&str> = report.defaulted.iter().map(|w| w.field).collect();
        assert_eq!(fields, vec!["name", "description"]);
    }

    #[test]
    fn test_id_falls_back_to_properties() {
        let raw = json!([
            {"geometry": {"coordinates": [1.0, 2.0]}, "properties": {"id": "12", "name": "x"}}
        ]);
        assert_eq!(normalize(&raw)[0].id, 12);
    }

    #[test]
    fn test_extra_coordinates_are_ignored() {
        let raw = json!([
            {"id": 1, "geometry": {"coordinates": [1.0, 2.0, 150.0]}, "properties": {"name": "x"}}
        ]);
        let place = &normalize(&raw)[0];
        assert_eq!((place.lat, place.lng), (2.0, 1.0));
    }

    #[test]
    fn test_normalize_single_feature() {
        let feature = &features()[1];
        let place = normalize_feature(feature).unwrap();
        assert_eq!(place.id, 2);
        assert_eq!(place.place_type, LocationType::Bar);
        assert_eq!(place.raw_properties["name"], "Bar Costa");

        assert!(normalize_feature(&json!({"detail": "Not found."})).is_err());
    }
}
