//! Filter Engine
//!
//! Visible subset of a place list under a [`FilterState`]. Pure and
//! synchronous: same inputs, same output, input order preserved.

use place_types::{FilterState, Place, PlaceList};
use serde::Serialize;

/// Places passing both the search term and the type filter
pub fn filter_places(places: &[Place], state: &FilterState) -> PlaceList {
    let needle = state.trimmed_term().to_lowercase();
    places
        .iter()
        .filter(|place| matches_search(place, &needle))
        .filter(|place| state.type_filter.matches(place.place_type))
        .cloned()
        .collect()
}

/// Case-insensitive substring match on name or description.
/// `needle` must already be trimmed and lowercased; empty matches everything.
fn matches_search(place: &Place, needle: &str) -> bool {
    needle.is_empty()
        || place.name.to_lowercase().contains(needle)
        || place.description.to_lowercase().contains(needle)
}

/// Filtered places plus the counts for the "N of M places" header
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterResult {
    pub places: PlaceList,
    pub total: usize,
    pub filtered: usize,
}

pub fn apply(places: &[Place], state: &FilterState) -> FilterResult {
    let visible = filter_places(places, state);
    FilterResult {
        total: places.len(),
        filtered: visible.len(),
        places: visible,
    }
}
