//! Place Catalog
//!
//! Named queries over a [`PlaceSource`], each backed by the query cache:
//!
//! | Query | Fingerprint | Enabled |
//! |-------|-------------|---------|
//! | `places()` | `places:list` | always |
//! | `search(term)` | `places:list?name=<term>` | trimmed term longer than 2 chars |
//! | `by_category(type)` | `places:list?type=<type>` | non-empty type |
//! | `place(id)` | `places:detail:<id>` | always |
//! | `place_types()` | `places:types` | always |
//!
//! A disabled query returns `None` without touching the cache or the network.

use std::sync::Arc;

use place_types::{LocationType, Place, PlaceList, PlaceQuery};

use crate::cache::{Fingerprint, QueryCache, StalenessPolicy};
use crate::error::{GatewayError, UpstreamError};
use crate::gateway::PlaceSource;

pub const LIST_ENDPOINT: &str = "places:list";
pub const DETAIL_ENDPOINT: &str = "places:detail";
pub const TYPES_ENDPOINT: &str = "places:types";

/// Prefix shared by every catalog fingerprint
pub const PLACES_PREFIX: &str = "places";

/// Searches shorter than this (after trimming) are not sent upstream
pub const MIN_SEARCH_CHARS: usize = 3;

/// Fingerprint of an upstream list query
pub fn list_fingerprint(query: &PlaceQuery) -> Fingerprint {
    Fingerprint::new(LIST_ENDPOINT, &query.pairs())
}

pub fn detail_fingerprint(id: i64) -> Fingerprint {
    Fingerprint::new(&format!("{}:{}", DETAIL_ENDPOINT, id), &[])
}

/// Cached place queries over one source
pub struct PlaceCatalog<S> {
    source: Arc<S>,
    lists: QueryCache<Arc<PlaceList>>,
    details: QueryCache<Place>,
    types: QueryCache<Arc<Vec<LocationType>>>,
}

impl<S> Clone for PlaceCatalog<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            lists: self.lists.clone(),
            details: self.details.clone(),
            types: self.types.clone(),
        }
    }
}

impl<S: PlaceSource + 'static> PlaceCatalog<S> {
    pub fn new(source: Arc<S>, policy: StalenessPolicy) -> Self {
        Self {
            source,
            lists: QueryCache::new(policy.clone()),
            details: QueryCache::new(policy.clone()),
            types: QueryCache::new(policy),
        }
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    /// Full, unfiltered list
    pub async fn places(&self) -> Result<Arc<PlaceList>, UpstreamError> {
        self.list(PlaceQuery::all()).await
    }

    /// Server-side name search
    pub async fn search(&self, term: &str) -> Option<Result<Arc<PlaceList>, UpstreamError>> {
        let term = term.trim();
        if term.chars().count() < MIN_SEARCH_CHARS {
            tracing::trace!(term, "Search disabled for short term");
            return None;
        }
        Some(self.list(PlaceQuery::by_name(term)).await)
    }

    /// Server-side category listing
    pub async fn by_category(
        &self,
        place_type: &str,
    ) -> Option<Result<Arc<PlaceList>, UpstreamError>> {
        let place_type = place_type.trim();
        if place_type.is_empty() {
            return None;
        }
        Some(self.list(PlaceQuery::by_type(place_type)).await)
    }

    /// Any list query, cached under its fingerprint
    pub async fn list(&self, query: PlaceQuery) -> Result<Arc<PlaceList>, UpstreamError> {
        let fingerprint = list_fingerprint(&query);
        let source = Arc::clone(&self.source);
        self.lists
            .get_or_fetch(&fingerprint, move || async move {
                source.list_places(&query).await.map(Arc::new)
            })
            .await
    }

    /// Single place through the detail endpoint
    pub async fn place(&self, id: i64) -> Result<Place, GatewayError> {
        let source = Arc::clone(&self.source);
        let result = self
            .details
            .get_or_fetch(&detail_fingerprint(id), move || async move {
                source.get_place(id).await.map_err(|e| match e {
                    GatewayError::NotFound(_) => UpstreamError::status(404),
                    GatewayError::Upstream(e) => e,
                })
            })
            .await;

        match result {
            Err(e) if e.status == Some(404) => Err(GatewayError::NotFound(id)),
            other => other.map_err(GatewayError::from),
        }
    }

    /// Distinct categories of the full list, in first-seen order
    pub async fn place_types(&self) -> Result<Arc<Vec<LocationType>>, UpstreamError> {
        let source = Arc::clone(&self.source);
        self.types
            .get_or_fetch(&Fingerprint::new(TYPES_ENDPOINT, &[]), move || async move {
                let places = source.list_places(&PlaceQuery::all()).await?;
                Ok(Arc::new(distinct_types(&places)))
            })
            .await
    }

    /// Cached list for a query without fetching (fresh or stale)
    pub fn peek_list(&self, query: &PlaceQuery) -> Option<Arc<PlaceList>> {
        self.lists.peek(&list_fingerprint(query))
    }

    pub fn list_cache(&self) -> &QueryCache<Arc<PlaceList>> {
        &self.lists
    }

    /// Drop every cached place query. Returns the number of entries removed.
    pub fn invalidate_places(&self) -> usize {
        let removed = self.lists.invalidate_prefix(PLACES_PREFIX)
            + self.details.invalidate_prefix(PLACES_PREFIX)
            + self.types.invalidate_prefix(PLACES_PREFIX);
        tracing::info!(removed, "Place queries invalidated");
        removed
    }
}

fn distinct_types(places: &[Place]) -> Vec<LocationType> {
    let mut seen = Vec::new();
    for place in places {
        if !seen.contains(&place.place_type) {
            seen.push(place.place_type);
        }
    }
    seen
}
