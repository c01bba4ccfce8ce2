//! Map Synchronizer
//!
//! Owns one widget and keeps its marker layers equal to the visible place
//! list. Markers are keyed by place id: a pass creates what is missing,
//! removes what left, restyles or moves what changed, and leaves every
//! other layer untouched.
//!
//! Lifecycle: `mount` (Initializing -> Ready) hands back an owned
//! synchronizer; `teardown` or drop removes every layer and destroys the
//! widget. A failed mount is logged and not retried.
//!
//! Selection persists across passes. Selecting a visible place recenters on
//! it once and opens its popup; selecting a place that is not visible keeps
//! the selection and focuses it as soon as a pass makes it visible.

use std::collections::{BTreeMap, HashMap, HashSet};

use place_types::{DraftPlace, DrawnGeometry, LatLng, MapEvent, Place, PlaceEdit};
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

use crate::error::WidgetInitError;
use crate::map::scene::{popup_html, SceneSnapshot};
use crate::map::style::{marker_style, marker_style_for, shape_style};
use crate::map::widget::{LayerId, MapOptions, MapWidget, MarkerSpec, WidgetFactory};

/// Zoom used when focusing a selected place
pub const SELECTION_ZOOM: u8 = 15;

/// Drawing mode options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrawOptions {
    /// Existing place markers join the editable group
    pub edit_existing: bool,
    /// Open the marker tool right away
    pub start_adding: bool,
}

/// Outcome of one reconciliation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SyncReport {
    pub added: usize,
    pub removed: usize,
    pub restyled: usize,
}

impl SyncReport {
    pub fn is_noop(&self) -> bool {
        self.added == 0 && self.removed == 0 && self.restyled == 0
    }
}

struct LiveMarker {
    layer: LayerId,
    place: Place,
    selected: bool,
}

pub struct MapSynchronizer {
    widget: Option<Box<dyn MapWidget>>,
    markers: HashMap<i64, LiveMarker>,
    place_by_layer: HashMap<LayerId, i64>,
    drafts: HashMap<LayerId, DrawnGeometry>,
    selected: Option<i64>,
    focus_pending: bool,
    drawing: Option<DrawOptions>,
    events: UnboundedSender<MapEvent>,
}

impl MapSynchronizer {
    /// Create the widget, add the base tiles and set the initial view
    pub fn mount(
        factory: &dyn WidgetFactory,
        options: &MapOptions,
        events: UnboundedSender<MapEvent>,
    ) -> Result<Self, WidgetInitError> {
        tracing::debug!(center = ?options.center, zoom = options.zoom, "Map initializing");

        let mut widget = factory.create(options).map_err(|e| {
            tracing::error!(reason = %e.reason, "Map widget failed to initialize");
            e
        })?;
        widget.add_tile_layer(&options.tiles);
        widget.set_view(options.center, options.zoom);

        tracing::info!("Map ready");
        Ok(Self {
            widget: Some(widget),
            markers: HashMap::new(),
            place_by_layer: HashMap::new(),
            drafts: HashMap::new(),
            selected: None,
            focus_pending: false,
            drawing: None,
            events,
        })
    }

    // ========================================================================
    // RECONCILIATION
    // ========================================================================

    /// Reconcile marker layers with the visible places
    pub fn sync(&mut self, visible: &[Place]) -> SyncReport {
        let mut report = SyncReport::default();
        let Some(widget) = self.widget.as_mut() else {
            return report;
        };

        let visible_ids: HashSet<i64> = visible.iter().map(|p| p.id).collect();
        let departed: Vec<i64> = self
            .markers
            .keys()
            .filter(|id| !visible_ids.contains(id))
            .copied()
            .collect();
        for id in departed {
            if let Some(marker) = self.markers.remove(&id) {
                widget.remove_layer(marker.layer);
                self.place_by_layer.remove(&marker.layer);
                report.removed += 1;
            }
        }

        let editable = self.drawing.map_or(false, |d| d.edit_existing);
        let mut seen = HashSet::with_capacity(visible.len());
        for place in visible {
            if !seen.insert(place.id) {
                tracing::debug!(id = place.id, "Duplicate place id in visible list, keeping first");
                continue;
            }
            let selected = self.selected == Some(place.id);

            match self.markers.get_mut(&place.id) {
                Some(live) if live.place == *place && live.selected == selected => {}
                Some(live) => {
                    widget.update_marker(live.layer, &marker_spec(place, selected));
                    live.place = place.clone();
                    live.selected = selected;
                    report.restyled += 1;
                }
                None => {
                    let layer = widget.add_marker(&marker_spec(place, selected));
                    if editable {
                        widget.set_editable(layer, true);
                    }
                    self.place_by_layer.insert(layer, place.id);
                    self.markers.insert(
                        place.id,
                        LiveMarker {
                            layer,
                            place: place.clone(),
                            selected,
                        },
                    );
                    report.added += 1;
                }
            }
        }

        self.apply_focus();

        if !report.is_noop() {
            tracing::debug!(
                added = report.added,
                removed = report.removed,
                restyled = report.restyled,
                live = self.markers.len(),
                "Map markers synchronized"
            );
        }
        report
    }

    // ========================================================================
    // SELECTION
    // ========================================================================

    /// Set or clear the selection. `None` closes the popup without moving the view.
    pub fn select(&mut self, id: Option<i64>) {
        if self.selected == id {
            return;
        }
        let previous = std::mem::replace(&mut self.selected, id);
        self.restyle(previous, false);
        self.restyle(id, true);

        match id {
            Some(_) => {
                self.focus_pending = true;
                self.apply_focus();
            }
            None => {
                self.focus_pending = false;
                if let Some(widget) = self.widget.as_mut() {
                    widget.close_popup();
                }
            }
        }
    }

    pub fn selected(&self) -> Option<i64> {
        self.selected
    }

    /// Marker click. Returns the place id when the layer is a place marker.
    pub fn handle_click(&mut self, layer: LayerId) -> Option<i64> {
        let id = *self.place_by_layer.get(&layer)?;
        self.select(Some(id));
        self.emit(MapEvent::PlaceSelected { id });
        Some(id)
    }

    /// Click on empty map
    pub fn handle_background_click(&mut self) {
        if self.selected.is_some() {
            self.select(None);
            self.emit(MapEvent::SelectionCleared);
        }
    }

    fn restyle(&mut self, id: Option<i64>, selected: bool) {
        let (Some(id), Some(widget)) = (id, self.widget.as_mut()) else {
            return;
        };
        if let Some(live) = self.markers.get_mut(&id) {
            if live.selected != selected {
                widget.update_marker(live.layer, &marker_spec(&live.place, selected));
                live.selected = selected;
            }
        }
    }

    fn apply_focus(&mut self) {
        if !self.focus_pending {
            return;
        }
        let (Some(id), Some(widget)) = (self.selected, self.widget.as_mut()) else {
            return;
        };
        let Some(live) = self.markers.get(&id) else {
            tracing::debug!(id, "Selected place not visible, focus deferred");
            return;
        };
        widget.set_view(live.place.position(), SELECTION_ZOOM);
        widget.open_popup(live.layer);
        self.focus_pending = false;
    }

    // ========================================================================
    // DRAWING
    // ========================================================================

    pub fn enable_drawing(&mut self, options: DrawOptions) {
        let Some(widget) = self.widget.as_mut() else {
            return;
        };
        widget.set_draw_controls(true, options.start_adding);
        for live in self.markers.values() {
            widget.set_editable(live.layer, options.edit_existing);
        }
        self.drawing = Some(options);
        tracing::debug!(edit_existing = options.edit_existing, "Drawing enabled");
    }

    /// Hide the toolbar. Drawn shapes stay on the map.
    pub fn disable_drawing(&mut self) {
        let Some(widget) = self.widget.as_mut() else {
            return;
        };
        widget.set_draw_controls(false, false);
        for live in self.markers.values() {
            widget.set_editable(live.layer, false);
        }
        self.drawing = None;
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing.is_some()
    }

    /// A shape finished drawing. Returns its layer, or `None` outside drawing mode.
    pub fn handle_draw_created(&mut self, geometry: DrawnGeometry) -> Option<LayerId> {
        if self.drawing.is_none() {
            tracing::warn!(kind = ?geometry.kind(), "Draw event outside drawing mode ignored");
            return None;
        }
        let widget = self.widget.as_mut()?;

        let layer = match &geometry {
            DrawnGeometry::Point { position } => widget.add_marker(&MarkerSpec {
                place_id: None,
                position: *position,
                style: marker_style_for("", false),
                popup_html: None,
            }),
            other => widget.add_shape(other, &shape_style(other.kind())),
        };
        widget.set_editable(layer, true);

        let event = drawn_event(&geometry);
        self.drafts.insert(layer, geometry);
        self.emit(event);
        Some(layer)
    }

    /// Layers edited with the drawing tools. Returns the number of events emitted.
    pub fn handle_draw_edited(&mut self, edits: &[(LayerId, DrawnGeometry)]) -> usize {
        let mut emitted = 0;
        for (layer, geometry) in edits {
            if let Some(id) = self.place_by_layer.get(layer).copied() {
                let (Some(position), Some(live)) =
                    (point_position(geometry), self.markers.get_mut(&id))
                else {
                    tracing::warn!(id, "Place marker edited into a non-point shape, ignored");
                    continue;
                };
                // Held until the next pass restores the published position
                live.place.lat = position.lat;
                live.place.lng = position.lng;
                let place_type = live.place.place_type;
                let spec = marker_spec(&live.place, live.selected);
                if let Some(widget) = self.widget.as_mut() {
                    widget.update_marker(*layer, &spec);
                }
                self.emit(MapEvent::PlaceEdited(PlaceEdit {
                    id,
                    position,
                    place_type,
                }));
                emitted += 1;
            } else if self.drafts.contains_key(layer) {
                if let Some(widget) = self.widget.as_mut() {
                    match point_position(geometry) {
                        Some(position) => widget.update_marker(
                            *layer,
                            &MarkerSpec {
                                place_id: None,
                                position,
                                style: marker_style_for("", false),
                                popup_html: None,
                            },
                        ),
                        None => widget.update_shape(*layer, geometry),
                    }
                }
                self.emit(drawn_event(geometry));
                self.drafts.insert(*layer, geometry.clone());
                emitted += 1;
            } else {
                tracing::warn!(layer = layer.0, "Edit for unknown layer ignored");
            }
        }
        emitted
    }

    /// Drawn layers deleted with the drawing tools. Place markers are not deletable.
    pub fn handle_draw_deleted(&mut self, layers: &[LayerId]) -> usize {
        let mut removed = 0;
        for layer in layers {
            if self.drafts.remove(layer).is_some() {
                if let Some(widget) = self.widget.as_mut() {
                    widget.remove_layer(*layer);
                }
                removed += 1;
            }
        }
        removed
    }

    /// Geometries drawn in this session, by layer
    pub fn drafts(&self) -> BTreeMap<LayerId, DrawnGeometry> {
        self.drafts
            .iter()
            .map(|(layer, geometry)| (*layer, geometry.clone()))
            .collect()
    }

    // ========================================================================
    // INTROSPECTION AND TEARDOWN
    // ========================================================================

    /// Place id to marker layer, for every live marker
    pub fn live_layers(&self) -> BTreeMap<i64, LayerId> {
        self.markers
            .iter()
            .map(|(id, live)| (*id, live.layer))
            .collect()
    }

    pub fn snapshot(&self) -> Option<SceneSnapshot> {
        self.widget.as_ref().and_then(|w| w.snapshot())
    }

    /// Remove every layer and destroy the widget
    pub fn teardown(mut self) {
        self.release();
    }

    fn release(&mut self) {
        let Some(mut widget) = self.widget.take() else {
            return;
        };
        for live in self.markers.values() {
            widget.remove_layer(live.layer);
        }
        for layer in self.drafts.keys() {
            widget.remove_layer(*layer);
        }
        widget.destroy();
        self.markers.clear();
        self.place_by_layer.clear();
        self.drafts.clear();
        tracing::debug!("Map torn down");
    }

    fn emit(&self, event: MapEvent) {
        if self.events.send(event).is_err() {
            tracing::debug!("Map event receiver dropped");
        }
    }
}

impl Drop for MapSynchronizer {
    fn drop(&mut self) {
        self.release();
    }
}

fn marker_spec(place: &Place, selected: bool) -> MarkerSpec {
    MarkerSpec {
        place_id: Some(place.id),
        position: place.position(),
        style: marker_style(place.place_type, selected),
        popup_html: Some(popup_html(place)),
    }
}

fn point_position(geometry: &DrawnGeometry) -> Option<LatLng> {
    match geometry {
        DrawnGeometry::Point { position } => Some(*position),
        _ => None,
    }
}

fn drawn_event(geometry: &DrawnGeometry) -> MapEvent {
    match geometry {
        DrawnGeometry::Point { position } => MapEvent::PlaceDrafted(DraftPlace::at(*position)),
        other => MapEvent::ShapeDrawn { kind: other.kind() },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Theme;
    use crate::map::scene::SceneFactory;
    use crate::map::widget::TileLayer;
    use place_types::{LocationType, ShapeKind};
    use pretty_assertions::assert_eq;
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

    fn options() -> MapOptions {
        MapOptions {
            center: LatLng::new(38.9368719, 1.2610344),
            zoom: 12,
            tiles: TileLayer::for_theme(Theme::Quantum),
        }
    }

    fn place(id: i64, place_type: LocationType) -> Place {
        Place {
            id,
            name: format!("Place {}", id),
            description: String::new(),
            place_type,
            lat: 38.9 + id as f64 / 100.0,
            lng: 1.2,
            raw_properties: serde_json::Map::new(),
        }
    }

    fn places(ids: &[i64]) -> Vec<Place> {
        ids.iter().map(|id| place(*id, LocationType::Bar)).collect()
    }

    fn mounted() -> (MapSynchronizer, SceneFactory, UnboundedReceiver<MapEvent>) {
        let factory = SceneFactory::new();
        let (tx, rx) = unbounded_channel();
        let sync = MapSynchronizer::mount(&factory, &options(), tx).unwrap();
        (sync, factory, rx)
    }

    fn drain(rx: &mut UnboundedReceiver<MapEvent>) -> Vec<MapEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    /// Live markers must be exactly the visible places
    fn assert_consistent(sync: &MapSynchronizer, factory: &SceneFactory, visible: &[Place]) {
        let expected: Vec<i64> = {
            let mut ids: Vec<i64> = visible.iter().map(|p| p.id).collect();
            ids.sort();
            ids.dedup();
            ids
        };
        let live: Vec<i64> = sync.live_layers().keys().copied().collect();
        assert_eq!(live, expected);

        let snap = factory.last_scene().unwrap().snapshot();
        let mut on_map: Vec<i64> = snap.markers.iter().filter_map(|m| m.spec.place_id).collect();
        on_map.sort();
        assert_eq!(on_map, expected);
    }

    #[test]
    fn test_mount_sets_tiles_and_view() {
        let (_sync, factory, _rx) = mounted();
        let snap = factory.last_scene().unwrap().snapshot();
        assert!(snap.tiles.is_some());
        assert_eq!(snap.view.zoom, 12);
        assert_eq!(snap.view.center, options().center);
    }

    #[test]
    fn test_mount_failure_is_reported() {
        let (tx, _rx) = unbounded_channel();
        let result = MapSynchronizer::mount(&SceneFactory::failing("no container"), &options(), tx);
        assert_eq!(result.err().map(|e| e.reason), Some("no container".to_string()));
    }

    #[test]
    fn test_shrinking_keeps_surviving_handles() {
        let (mut sync, factory, _rx) = mounted();
        let all = places(&[1, 2, 3]);

        assert_eq!(
            sync.sync(&all),
            SyncReport {
                added: 3,
                removed: 0,
                restyled: 0
            }
        );
        let before = sync.live_layers();

        let subset = places(&[1, 3]);
        let report = sync.sync(&subset);
        assert_eq!((report.added, report.removed, report.restyled), (0, 1, 0));
        let after = sync.live_layers();
        assert_eq!(after.get(&1), before.get(&1));
        assert_eq!(after.get(&3), before.get(&3));
        assert_consistent(&sync, &factory, &subset);
    }

    #[test]
    fn test_identical_pass_touches_nothing() {
        let (mut sync, factory, _rx) = mounted();
        let all = places(&[1, 2]);
        sync.sync(&all);
        let revision = factory.last_scene().unwrap().snapshot().revision;

        assert!(sync.sync(&all).is_noop());
        assert_eq!(factory.last_scene().unwrap().snapshot().revision, revision);
    }

    #[test]
    fn test_changed_place_is_updated_in_place() {
        let (mut sync, factory, _rx) = mounted();
        sync.sync(&places(&[1]));
        let layer = sync.live_layers()[&1];

        let mut moved = place(1, LocationType::Hotel);
        moved.lat = 39.5;
        let report = sync.sync(&[moved]);
        assert_eq!(report.restyled, 1);
        assert_eq!(sync.live_layers()[&1], layer);

        let snap = factory.last_scene().unwrap().snapshot();
        let marker = snap.marker(layer).unwrap();
        assert_eq!(marker.spec.position.lat, 39.5);
        assert_eq!(marker.spec.style.color, "#22c55e");
    }

    #[test]
    fn test_empty_list_removes_everything() {
        let (mut sync, factory, _rx) = mounted();
        sync.sync(&places(&[1, 2, 3]));
        assert_eq!(sync.sync(&[]).removed, 3);
        assert_consistent(&sync, &factory, &[]);
    }

    #[test]
    fn test_duplicate_ids_produce_one_marker() {
        let (mut sync, factory, _rx) = mounted();
        let list = places(&[4, 4, 5]);
        assert_eq!(sync.sync(&list).added, 2);
        assert_consistent(&sync, &factory, &list);
    }

    #[test]
    fn test_selection_recenters_and_opens_popup() {
        let (mut sync, factory, _rx) = mounted();
        sync.sync(&places(&[1, 2]));
        sync.select(Some(2));

        let snap = factory.last_scene().unwrap().snapshot();
        let layer = sync.live_layers()[&2];
        assert_eq!(snap.view.zoom, SELECTION_ZOOM);
        assert_eq!(snap.view.center, place(2, LocationType::Bar).position());
        assert_eq!(snap.open_popup, Some(layer));
        assert_eq!(snap.marker(layer).unwrap().spec.style.size, 35);
    }

    #[test]
    fn test_clearing_selection_does_not_recenter() {
        let (mut sync, factory, _rx) = mounted();
        sync.sync(&places(&[1, 2]));
        sync.select(Some(1));
        let focused = factory.last_scene().unwrap().snapshot().view;

        sync.select(None);
        let snap = factory.last_scene().unwrap().snapshot();
        assert_eq!(snap.view, focused);
        assert_eq!(snap.open_popup, None);
        let layer = sync.live_layers()[&1];
        assert_eq!(snap.marker(layer).unwrap().spec.style.size, 30);
    }

    #[test]
    fn test_selection_persists_and_applies_when_visible() {
        let (mut sync, factory, _rx) = mounted();
        sync.sync(&places(&[1]));
        sync.select(Some(7));
        assert_eq!(factory.last_scene().unwrap().snapshot().view.zoom, 12);

        sync.sync(&places(&[1, 7]));
        let snap = factory.last_scene().unwrap().snapshot();
        assert_eq!(sync.selected(), Some(7));
        assert_eq!(snap.view.zoom, SELECTION_ZOOM);
        assert_eq!(snap.open_popup, Some(sync.live_layers()[&7]));

        // later passes do not fight the user's viewport
        let revision = snap.revision;
        sync.sync(&places(&[1, 7]));
        assert_eq!(factory.last_scene().unwrap().snapshot().revision, revision);
    }

    #[test]
    fn test_click_selects_and_emits() {
        let (mut sync, _factory, mut rx) = mounted();
        sync.sync(&places(&[1, 2]));
        let layer = sync.live_layers()[&2];

        assert_eq!(sync.handle_click(layer), Some(2));
        assert_eq!(sync.handle_click(LayerId(999)), None);
        sync.handle_background_click();

        assert_eq!(
            drain(&mut rx),
            vec![MapEvent::PlaceSelected { id: 2 }, MapEvent::SelectionCleared]
        );
        assert_eq!(sync.selected(), None);
    }

    #[test]
    fn test_draw_point_emits_draft_and_keeps_places() {
        let (mut sync, factory, mut rx) = mounted();
        let visible = places(&[1]);
        sync.sync(&visible);

        let position = LatLng::new(38.95, 1.3);
        assert_eq!(sync.handle_draw_created(DrawnGeometry::point(position)), None);

        sync.enable_drawing(DrawOptions::default());
        let layer = sync.handle_draw_created(DrawnGeometry::point(position)).unwrap();
        let polygon = DrawnGeometry::polygon(vec![
            LatLng::new(0.0, 0.0),
            LatLng::new(0.0, 1.0),
            LatLng::new(1.0, 1.0),
        ])
        .unwrap();
        sync.handle_draw_created(polygon).unwrap();

        assert_eq!(
            drain(&mut rx),
            vec![
                MapEvent::PlaceDrafted(DraftPlace::at(position)),
                MapEvent::ShapeDrawn {
                    kind: ShapeKind::Polygon
                },
            ]
        );
        let snap = factory.last_scene().unwrap().snapshot();
        assert!(snap.editable.contains(&layer));
        assert_eq!(snap.shapes.len(), 1);
        // drawing never adds places
        assert_eq!(sync.live_layers().len(), 1);
        assert_eq!(sync.drafts().len(), 2);
    }

    #[test]
    fn test_edit_existing_markers() {
        let (mut sync, factory, mut rx) = mounted();
        sync.enable_drawing(DrawOptions {
            edit_existing: true,
            start_adding: false,
        });
        sync.sync(&[place(3, LocationType::Sport)]);
        let layer = sync.live_layers()[&3];
        assert!(factory
            .last_scene()
            .unwrap()
            .snapshot()
            .editable
            .contains(&layer));

        let moved = LatLng::new(38.99, 1.11);
        let emitted = sync.handle_draw_edited(&[
            (layer, DrawnGeometry::point(moved)),
            (LayerId(404), DrawnGeometry::point(moved)),
        ]);
        assert_eq!(emitted, 1);
        assert_eq!(
            drain(&mut rx),
            vec![MapEvent::PlaceEdited(PlaceEdit {
                id: 3,
                position: moved,
                place_type: LocationType::Sport,
            })]
        );

        sync.disable_drawing();
        assert!(factory.last_scene().unwrap().snapshot().editable.is_empty());
    }

    #[test]
    fn test_edited_marker_position_until_next_pass() {
        let (mut sync, factory, _rx) = mounted();
        let visible = vec![place(3, LocationType::Bar)];
        sync.sync(&visible);
        sync.enable_drawing(DrawOptions {
            edit_existing: true,
            start_adding: false,
        });
        let layer = sync.live_layers()[&3];
        let position_on_map = |factory: &SceneFactory| {
            factory
                .last_scene()
                .unwrap()
                .snapshot()
                .marker(layer)
                .unwrap()
                .spec
                .position
        };

        let moved = LatLng::new(38.99, 1.11);
        sync.handle_draw_edited(&[(layer, DrawnGeometry::point(moved))]);
        assert_eq!(position_on_map(&factory), moved);

        // restyling for selection keeps the edited position
        sync.select(Some(3));
        assert_eq!(position_on_map(&factory), moved);

        // a pass over the published list puts the marker back on the data
        let report = sync.sync(&visible);
        assert_eq!(report.restyled, 1);
        assert_eq!(sync.live_layers()[&3], layer);
        assert_eq!(position_on_map(&factory), visible[0].position());
        assert!(sync.sync(&visible).is_noop());
    }

    #[test]
    fn test_edit_and_delete_drafts() {
        let (mut sync, _factory, mut rx) = mounted();
        sync.enable_drawing(DrawOptions::default());
        let layer = sync
            .handle_draw_created(DrawnGeometry::point(LatLng::new(1.0, 1.0)))
            .unwrap();
        drain(&mut rx);

        let moved = LatLng::new(2.0, 2.0);
        assert_eq!(sync.handle_draw_edited(&[(layer, DrawnGeometry::point(moved))]), 1);
        assert_eq!(drain(&mut rx), vec![MapEvent::PlaceDrafted(DraftPlace::at(moved))]);

        assert_eq!(sync.handle_draw_deleted(&[layer]), 1);
        assert!(sync.drafts().is_empty());
    }

    #[test]
    fn test_teardown_destroys_widget() {
        let (mut sync, factory, _rx) = mounted();
        sync.sync(&places(&[1, 2]));
        sync.teardown();

        let handle = factory.last_scene().unwrap();
        assert!(handle.is_destroyed());
        assert!(handle.snapshot().markers.is_empty());
    }

    #[test]
    fn test_drop_releases_widget() {
        let (mut sync, factory, _rx) = mounted();
        sync.sync(&places(&[1]));
        drop(sync);
        assert!(factory.last_scene().unwrap().is_destroyed());
    }
}
