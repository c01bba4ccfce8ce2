//! View Shell
//!
//! Owns the filter state, the selection and the last load outcome, and
//! pushes the visible list into the mounted map after every change.
//! Loads are ticketed: only the result of the latest `begin_load` is
//! applied, and nothing is applied after `unmount`.

use std::sync::Arc;

use place_types::{FilterState, MapEvent, Place, PlaceList, TypeFilter};
use serde::Serialize;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::catalog::PlaceCatalog;
use crate::error::{UpstreamError, WidgetInitError};
use crate::filter::{apply, FilterResult};
use crate::gateway::PlaceSource;
use crate::map::scene::SceneSnapshot;
use crate::map::sync::{MapSynchronizer, SyncReport};
use crate::map::widget::{MapOptions, WidgetFactory};
use crate::stats::{PlaceStats, TypeCount, TOP_TYPES_SHOWN};

/// What the place panel shows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ViewOutcome {
    Loading,
    Failed { message: String },
    /// Loaded, upstream has no places
    Empty,
    Ready,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MapStatus {
    Unmounted,
    Ready,
    Failed { reason: String },
}

/// Proof of which load a result belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChipKind {
    Search,
    Type,
}

/// Removable indicator of an active filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterChip {
    pub kind: ChipKind,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectedPlace {
    pub id: i64,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub place_type: String,
    /// `lat, lng` with six decimals
    pub coordinates: String,
}

impl SelectedPlace {
    fn from_place(place: &Place) -> Self {
        Self {
            id: place.id,
            name: place.name.clone(),
            description: place.description.clone(),
            place_type: place
                .raw_type()
                .unwrap_or(place.place_type.as_str())
                .to_string(),
            coordinates: format!("{:.6}, {:.6}", place.lat, place.lng),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSummary {
    pub total: usize,
    pub top_types: Vec<TypeCount>,
}

/// Everything a renderer needs to draw the page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewSummary {
    pub outcome: ViewOutcome,
    pub filter: FilterState,
    pub total: usize,
    pub filtered: usize,
    pub chips: Vec<FilterChip>,
    pub stats: StatsSummary,
    pub places: PlaceList,
    pub selected: Option<SelectedPlace>,
    pub map: MapStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scene: Option<SceneSnapshot>,
}

pub struct ViewShell {
    filter: FilterState,
    selected_id: Option<i64>,
    places: Arc<PlaceList>,
    outcome: ViewOutcome,
    load_generation: u64,
    active: bool,
    map: Option<MapSynchronizer>,
    map_status: MapStatus,
    events_tx: UnboundedSender<MapEvent>,
    events_rx: UnboundedReceiver<MapEvent>,
}

impl Default for ViewShell {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewShell {
    pub fn new() -> Self {
        let (events_tx, events_rx) = unbounded_channel();
        Self {
            filter: FilterState::default(),
            selected_id: None,
            places: Arc::new(Vec::new()),
            outcome: ViewOutcome::Loading,
            load_generation: 0,
            active: true,
            map: None,
            map_status: MapStatus::Unmounted,
            events_tx,
            events_rx,
        }
    }

    // ========================================================================
    // FILTER INPUTS
    // ========================================================================

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.filter.search_term = term.into();
        self.push_to_map();
    }

    pub fn set_type_filter(&mut self, type_filter: TypeFilter) {
        self.filter.type_filter = type_filter;
        self.push_to_map();
    }

    pub fn set_filter(&mut self, filter: FilterState) {
        self.filter = filter;
        self.push_to_map();
    }

    pub fn clear_search(&mut self) {
        self.set_search_term(String::new());
    }

    pub fn clear_type_filter(&mut self) {
        self.set_type_filter(TypeFilter::All);
    }

    pub fn clear_filters(&mut self) {
        self.set_filter(FilterState::default());
    }

    // ========================================================================
    // SELECTION
    // ========================================================================

    /// Current selection. A mounted map is authoritative: marker clicks land
    /// there before their events are drained.
    pub fn selected_id(&self) -> Option<i64> {
        self.map
            .as_ref()
            .map_or(self.selected_id, MapSynchronizer::selected)
    }

    pub fn select(&mut self, id: Option<i64>) {
        self.selected_id = id;
        if let Some(map) = self.map.as_mut() {
            map.select(id);
        }
    }

    /// Apply pending map events to the view and hand them to the caller
    pub fn drain_map_events(&mut self) -> Vec<MapEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events_rx.try_recv() {
            match &event {
                MapEvent::PlaceSelected { id } => self.selected_id = Some(*id),
                MapEvent::SelectionCleared => self.selected_id = None,
                MapEvent::PlaceDrafted(_) | MapEvent::PlaceEdited(_) | MapEvent::ShapeDrawn { .. } => {}
            }
            events.push(event);
        }
        events
    }

    // ========================================================================
    // LOADING
    // ========================================================================

    pub fn outcome(&self) -> &ViewOutcome {
        &self.outcome
    }

    /// Start a load; previous tickets become stale
    pub fn begin_load(&mut self) -> LoadTicket {
        self.load_generation += 1;
        // keep showing loaded data while refetching
        if !matches!(self.outcome, ViewOutcome::Ready | ViewOutcome::Empty) {
            self.outcome = ViewOutcome::Loading;
        }
        LoadTicket(self.load_generation)
    }

    /// Apply a load result. Returns false when it was discarded.
    pub fn apply_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Arc<PlaceList>, UpstreamError>,
    ) -> bool {
        if !self.active {
            tracing::debug!("Load finished after unmount, discarded");
            return false;
        }
        if ticket.0 != self.load_generation {
            tracing::debug!(
                ticket = ticket.0,
                latest = self.load_generation,
                "Stale load discarded"
            );
            return false;
        }

        match result {
            Ok(places) => {
                self.outcome = if places.is_empty() {
                    ViewOutcome::Empty
                } else {
                    ViewOutcome::Ready
                };
                self.places = places;
            }
            Err(e) => {
                tracing::warn!(error = %e, status = ?e.status, "Places failed to load");
                self.outcome = ViewOutcome::Failed { message: e.message };
            }
        }
        self.push_to_map();
        true
    }

    /// Fetch the full list through the catalog and apply it
    pub async fn load<S: PlaceSource + 'static>(&mut self, catalog: &PlaceCatalog<S>) -> bool {
        let ticket = self.begin_load();
        let result = catalog.places().await;
        self.apply_load(ticket, result)
    }

    /// User-triggered retry after a failure
    pub async fn retry<S: PlaceSource + 'static>(&mut self, catalog: &PlaceCatalog<S>) -> bool {
        self.load(catalog).await
    }

    pub fn places(&self) -> &Arc<PlaceList> {
        &self.places
    }

    pub fn visible(&self) -> FilterResult {
        apply(&self.places, &self.filter)
    }

    // ========================================================================
    // MAP
    // ========================================================================

    pub fn mount_map(
        &mut self,
        factory: &dyn WidgetFactory,
        options: &MapOptions,
    ) -> Result<(), WidgetInitError> {
        if self.map.is_some() {
            return Ok(());
        }
        match MapSynchronizer::mount(factory, options, self.events_tx.clone()) {
            Ok(mut map) => {
                map.select(self.selected_id);
                self.map = Some(map);
                self.map_status = MapStatus::Ready;
                self.push_to_map();
                Ok(())
            }
            Err(e) => {
                self.map_status = MapStatus::Failed {
                    reason: e.reason.clone(),
                };
                Err(e)
            }
        }
    }

    pub fn map(&self) -> Option<&MapSynchronizer> {
        self.map.as_ref()
    }

    pub fn map_mut(&mut self) -> Option<&mut MapSynchronizer> {
        self.map.as_mut()
    }

    pub fn map_status(&self) -> &MapStatus {
        &self.map_status
    }

    /// Tear the map down and stop accepting load results
    pub fn unmount(&mut self) {
        self.active = false;
        self.selected_id = self.selected_id();
        if let Some(map) = self.map.take() {
            map.teardown();
        }
        self.map_status = MapStatus::Unmounted;
    }

    fn push_to_map(&mut self) -> Option<SyncReport> {
        self.selected_id = self.selected_id();
        let visible = apply(&self.places, &self.filter).places;
        let map = self.map.as_mut()?;
        let report = map.sync(&visible);
        map.select(self.selected_id);
        Some(report)
    }

    // ========================================================================
    // SUMMARY
    // ========================================================================

    pub fn summary(&self) -> ViewSummary {
        let visible = self.visible();
        let stats = PlaceStats::from_places(&self.places);
        let selected = self
            .selected_id()
            .and_then(|id| self.places.iter().find(|p| p.id == id))
            .map(SelectedPlace::from_place);

        ViewSummary {
            outcome: self.outcome.clone(),
            filter: self.filter.clone(),
            total: visible.total,
            filtered: visible.filtered,
            chips: self.chips(),
            stats: StatsSummary {
                total: stats.total,
                top_types: stats.top_types(TOP_TYPES_SHOWN),
            },
            places: visible.places,
            selected,
            map: self.map_status.clone(),
            scene: self.map.as_ref().and_then(MapSynchronizer::snapshot),
        }
    }

    fn chips(&self) -> Vec<FilterChip> {
        let mut chips = Vec::new();
        let term = self.filter.trimmed_term();
        if !term.is_empty() {
            chips.push(FilterChip {
                kind: ChipKind::Search,
                label: format!("Búsqueda: \"{}\"", term),
            });
        }
        if let TypeFilter::Only(t) = self.filter.type_filter {
            chips.push(FilterChip {
                kind: ChipKind::Type,
                label: format!("Tipo: {}", t),
            });
        }
        chips
    }
}
