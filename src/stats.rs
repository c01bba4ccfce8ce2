//! Place statistics for the list header: total and most common types.

use place_types::Place;
use serde::Serialize;

/// Label used for places published without a type
pub const UNTYPED_LABEL: &str = "Sin tipo";

/// How many types the view header shows
pub const TOP_TYPES_SHOWN: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeCount {
    #[serde(rename = "type")]
    pub place_type: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PlaceStats {
    pub total: usize,
    /// Counts keyed by the upstream type string, in first-seen order
    pub by_type: Vec<TypeCount>,
}

impl PlaceStats {
    pub fn from_places(places: &[Place]) -> Self {
        let mut by_type: Vec<TypeCount> = Vec::new();
        for place in places {
            let key = place.raw_type().unwrap_or(UNTYPED_LABEL);
            match by_type.iter_mut().find(|c| c.place_type == key) {
                Some(count) => count.count += 1,
                None => by_type.push(TypeCount {
                    place_type: key.to_string(),
                    count: 1,
                }),
            }
        }
        Self {
            total: places.len(),
            by_type,
        }
    }

    /// The `n` most common types; ties keep first-seen order
    pub fn top_types(&self, n: usize) -> Vec<TypeCount> {
        let mut sorted = self.by_type.clone();
        // stable sort keeps first-seen order among equal counts
        sorted.sort_by(|a, b| b.count.cmp(&a.count));
        sorted.truncate(n);
        sorted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use place_types::LocationType;
    use serde_json::json;

    fn typed(id: i64, raw_type: Option<&str>) -> Place {
        let mut props = serde_json::Map::new();
        if let Some(t) = raw_type {
            props.insert("type".into(), json!(t));
        }
        Place {
            id,
            name: format!("place {}", id),
            description: String::new(),
            place_type: raw_type.map_or(LocationType::Other, LocationType::parse),
            lat: 0.0,
            lng: 0.0,
            raw_properties: props,
        }
    }

    #[test]
    fn test_counts_by_raw_type() {
        let places = vec![
            typed(1, Some("bar")),
            typed(2, Some("hotel")),
            typed(3, Some("bar")),
            typed(4, None),
            typed(5, Some("castle")),
            typed(6, Some("  ")),
        ];
        let stats = PlaceStats::from_places(&places);
        assert_eq!(stats.total, 6);
        let keys: Vec<(&str, usize)> = stats
            .by_type
            .iter()
            .map(|c| (c.place_type.as_str(), c.count))
            .collect();
        assert_eq!(
            keys,
            vec![("bar", 2), ("hotel", 1), (UNTYPED_LABEL, 2), ("castle", 1)]
        );
    }

    #[test]
    fn test_top_types_ties_keep_first_seen_order() {
        let places = vec![
            typed(1, Some("hotel")),
            typed(2, Some("sport")),
            typed(3, Some("bar")),
            typed(4, Some("bar")),
            typed(5, Some("office")),
        ];
        let top: Vec<String> = PlaceStats::from_places(&places)
            .top_types(TOP_TYPES_SHOWN)
            .into_iter()
            .map(|c| c.place_type)
            .collect();
        assert_eq!(top, vec!["bar", "hotel", "sport"]);
    }

    #[test]
    fn test_empty_list() {
        let stats = PlaceStats::from_places(&[]);
        assert_eq!(stats.total, 0);
        assert!(stats.top_types(3).is_empty());
    }
}
