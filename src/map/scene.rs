//! Retained in-memory map scene
//!
//! `SceneWidget` keeps every layer, the viewport, the open popup and the
//! drawing toolbar state, and serializes it as a [`SceneSnapshot`] for a
//! browser renderer to draw. The scene lives behind a shared handle so the
//! owner of the factory can inspect it after the widget has been boxed.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};

use place_types::{DrawnGeometry, LatLng, Place};
use serde::Serialize;

use crate::error::WidgetInitError;
use crate::map::style::ShapeStyle;
use crate::map::widget::{LayerId, MapOptions, MapWidget, MarkerSpec, TileLayer, WidgetFactory};

/// Popup markup for a place. Name and description are escaped.
pub fn popup_html(place: &Place) -> String {
    format!(
        "<div class=\"place-popup\" id=\"popup-{}\"><h3>{}</h3><p>{}</p></div>",
        place.id,
        escape_html(&place.name),
        escape_html(&place.description)
    )
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

// ============================================================================
// SNAPSHOT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub center: LatLng,
    pub zoom: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DrawControls {
    pub visible: bool,
    pub marker_tool_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneMarker {
    pub layer: LayerId,
    #[serde(flatten)]
    pub spec: MarkerSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneShape {
    pub layer: LayerId,
    pub geometry: DrawnGeometry,
    pub style: ShapeStyle,
}

/// Serializable state of a scene, layers ordered by creation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneSnapshot {
    pub tiles: Option<TileLayer>,
    pub view: Viewport,
    pub markers: Vec<SceneMarker>,
    pub shapes: Vec<SceneShape>,
    pub editable: Vec<LayerId>,
    pub open_popup: Option<LayerId>,
    pub draw_controls: DrawControls,
    /// Bumped on every mutation
    pub revision: u64,
    pub destroyed: bool,
}

impl SceneSnapshot {
    pub fn marker(&self, layer: LayerId) -> Option<&SceneMarker> {
        self.markers.iter().find(|m| m.layer == layer)
    }

    pub fn marker_for_place(&self, place_id: i64) -> Option<&SceneMarker> {
        self.markers.iter().find(|m| m.spec.place_id == Some(place_id))
    }
}

// ============================================================================
// SCENE
// ============================================================================

#[derive(Debug)]
struct Scene {
    next_layer: u64,
    tiles: Option<TileLayer>,
    view: Viewport,
    markers: BTreeMap<LayerId, MarkerSpec>,
    shapes: BTreeMap<LayerId, (DrawnGeometry, ShapeStyle)>,
    editable: BTreeSet<LayerId>,
    open_popup: Option<LayerId>,
    draw_controls: DrawControls,
    revision: u64,
    destroyed: bool,
}

impl Scene {
    fn new(options: &MapOptions) -> Self {
        Self {
            next_layer: 0,
            tiles: None,
            view: Viewport {
                center: options.center,
                zoom: options.zoom,
            },
            markers: BTreeMap::new(),
            shapes: BTreeMap::new(),
            editable: BTreeSet::new(),
            open_popup: None,
            draw_controls: DrawControls::default(),
            revision: 0,
            destroyed: false,
        }
    }

    fn next_layer(&mut self) -> LayerId {
        self.next_layer += 1;
        LayerId(self.next_layer)
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    fn snapshot(&self) -> SceneSnapshot {
        SceneSnapshot {
            tiles: self.tiles.clone(),
            view: self.view,
            markers: self
                .markers
                .iter()
                .map(|(layer, spec)| SceneMarker {
                    layer: *layer,
                    spec: spec.clone(),
                })
                .collect(),
            shapes: self
                .shapes
                .iter()
                .map(|(layer, (geometry, style))| SceneShape {
                    layer: *layer,
                    geometry: geometry.clone(),
                    style: style.clone(),
                })
                .collect(),
            editable: self.editable.iter().copied().collect(),
            open_popup: self.open_popup,
            draw_controls: self.draw_controls,
            revision: self.revision,
            destroyed: self.destroyed,
        }
    }
}

fn lock(scene: &Mutex<Scene>) -> MutexGuard<'_, Scene> {
    scene.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Read access to a scene owned by a boxed widget
#[derive(Debug, Clone)]
pub struct SceneHandle(Arc<Mutex<Scene>>);

impl SceneHandle {
    pub fn snapshot(&self) -> SceneSnapshot {
        lock(&self.0).snapshot()
    }

    pub fn is_destroyed(&self) -> bool {
        lock(&self.0).destroyed
    }
}

/// In-memory [`MapWidget`]
#[derive(Debug)]
pub struct SceneWidget {
    scene: Arc<Mutex<Scene>>,
}

impl SceneWidget {
    pub fn new(options: &MapOptions) -> Self {
        Self {
            scene: Arc::new(Mutex::new(Scene::new(options))),
        }
    }

    pub fn handle(&self) -> SceneHandle {
        SceneHandle(Arc::clone(&self.scene))
    }

    /// Run a mutation unless the widget was destroyed
    fn mutate<R>(&self, f: impl FnOnce(&mut Scene) -> R) -> Option<R> {
        let mut scene = lock(&self.scene);
        if scene.destroyed {
            return None;
        }
        let result = f(&mut scene);
        scene.touch();
        Some(result)
    }
}

impl MapWidget for SceneWidget {
    fn add_tile_layer(&mut self, tiles: &TileLayer) {
        self.mutate(|scene| scene.tiles = Some(tiles.clone()));
    }

    fn set_view(&mut self, center: LatLng, zoom: u8) {
        self.mutate(|scene| scene.view = Viewport { center, zoom });
    }

    fn add_marker(&mut self, marker: &MarkerSpec) -> LayerId {
        self.mutate(|scene| {
            let layer = scene.next_layer();
            scene.markers.insert(layer, marker.clone());
            layer
        })
        .unwrap_or(LayerId(0))
    }

    fn update_marker(&mut self, layer: LayerId, marker: &MarkerSpec) {
        self.mutate(|scene| {
            if let Some(existing) = scene.markers.get_mut(&layer) {
                *existing = marker.clone();
            }
        });
    }

    fn add_shape(&mut self, geometry: &DrawnGeometry, style: &ShapeStyle) -> LayerId {
        self.mutate(|scene| {
            let layer = scene.next_layer();
            scene.shapes.insert(layer, (geometry.clone(), style.clone()));
            layer
        })
        .unwrap_or(LayerId(0))
    }

    fn update_shape(&mut self, layer: LayerId, geometry: &DrawnGeometry) {
        self.mutate(|scene| {
            if let Some((existing, _)) = scene.shapes.get_mut(&layer) {
                *existing = geometry.clone();
            }
        });
    }

    fn remove_layer(&mut self, layer: LayerId) {
        self.mutate(|scene| {
            scene.markers.remove(&layer);
            scene.shapes.remove(&layer);
            scene.editable.remove(&layer);
            if scene.open_popup == Some(layer) {
                scene.open_popup = None;
            }
        });
    }

    fn set_editable(&mut self, layer: LayerId, editable: bool) {
        self.mutate(|scene| {
            let known = scene.markers.contains_key(&layer) || scene.shapes.contains_key(&layer);
            if editable && known {
                scene.editable.insert(layer);
            } else {
                scene.editable.remove(&layer);
            }
        });
    }

    fn set_draw_controls(&mut self, visible: bool, start_marker: bool) {
        self.mutate(|scene| {
            scene.draw_controls = DrawControls {
                visible,
                marker_tool_active: visible && start_marker,
            }
        });
    }

    fn open_popup(&mut self, layer: LayerId) {
        self.mutate(|scene| {
            let has_popup = scene
                .markers
                .get(&layer)
                .map_or(false, |m| m.popup_html.is_some());
            if has_popup {
                scene.open_popup = Some(layer);
            }
        });
    }

    fn close_popup(&mut self) {
        self.mutate(|scene| scene.open_popup = None);
    }

    fn destroy(&mut self) {
        let mut scene = lock(&self.scene);
        scene.markers.clear();
        scene.shapes.clear();
        scene.editable.clear();
        scene.open_popup = None;
        scene.destroyed = true;
        scene.touch();
    }

    fn snapshot(&self) -> Option<SceneSnapshot> {
        Some(lock(&self.scene).snapshot())
    }
}

/// Builds [`SceneWidget`]s and remembers the last scene it created
#[derive(Debug, Default)]
pub struct SceneFactory {
    fail_with: Option<String>,
    last: Mutex<Option<SceneHandle>>,
}

impl SceneFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// A factory whose every `create` fails with `reason`
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            fail_with: Some(reason.into()),
            last: Mutex::new(None),
        }
    }

    pub fn last_scene(&self) -> Option<SceneHandle> {
        self.last
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl WidgetFactory for SceneFactory {
    fn create(&self, options: &MapOptions) -> Result<Box<dyn MapWidget>, WidgetInitError> {
        if let Some(reason) = &self.fail_with {
            return Err(WidgetInitError::new(reason.clone()));
        }
        let widget = SceneWidget::new(options);
        *self
            .last
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(widget.handle());
        Ok(Box::new(widget))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Theme;
    use crate::map::style::{marker_style, shape_style};
    use place_types::{LocationType, ShapeKind};

    fn options() -> MapOptions {
        MapOptions {
            center: LatLng::new(38.9, 1.26),
            zoom: 12,
            tiles: TileLayer::for_theme(Theme::Quantum),
        }
    }

    fn spec(place_id: i64) -> MarkerSpec {
        MarkerSpec {
            place_id: Some(place_id),
            position: LatLng::new(38.9, 1.2),
            style: marker_style(LocationType::Bar, false),
            popup_html: Some("<p>x</p>".into()),
        }
    }

    #[test]
    fn test_popup_html_escapes_user_text() {
        let place = Place {
            id: 3,
            name: "<script>alert(1)</script>".into(),
            description: "Fish & \"chips\"".into(),
            place_type: LocationType::Restaurant,
            lat: 0.0,
            lng: 0.0,
            raw_properties: serde_json::Map::new(),
        };
        let html = popup_html(&place);
        assert!(html.contains("id=\"popup-3\""));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("Fish &amp; &quot;chips&quot;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_layers_popup_and_removal() {
        let mut widget = SceneWidget::new(&options());
        let a = widget.add_marker(&spec(1));
        let b = widget.add_marker(&spec(2));
        assert_ne!(a, b);

        widget.open_popup(b);
        widget.set_editable(b, true);
        assert_eq!(widget.snapshot().unwrap().open_popup, Some(b));

        widget.remove_layer(b);
        let snap = widget.snapshot().unwrap();
        assert_eq!(snap.markers.len(), 1);
        assert_eq!(snap.open_popup, None);
        assert!(snap.editable.is_empty());
        assert_eq!(snap.marker_for_place(1).map(|m| m.layer), Some(a));
    }

    #[test]
    fn test_shapes_and_draw_controls() {
        let mut widget = SceneWidget::new(&options());
        let geometry = DrawnGeometry::circle(LatLng::new(38.9, 1.2), 50.0).unwrap();
        let layer = widget.add_shape(&geometry, &shape_style(ShapeKind::Circle));
        widget.set_draw_controls(true, true);

        let snap = widget.snapshot().unwrap();
        assert_eq!(snap.shapes[0].layer, layer);
        assert_eq!(snap.shapes[0].style.color, "#662d91");
        assert!(snap.draw_controls.marker_tool_active);

        // popups only open on markers that carry one
        widget.open_popup(layer);
        assert_eq!(widget.snapshot().unwrap().open_popup, None);
    }

    #[test]
    fn test_destroy_clears_and_freezes_scene() {
        let factory = SceneFactory::new();
        let mut widget = factory.create(&options()).unwrap();
        widget.add_tile_layer(&options().tiles);
        widget.add_marker(&spec(1));
        widget.destroy();
        widget.add_marker(&spec(2));

        let handle = factory.last_scene().unwrap();
        assert!(handle.is_destroyed());
        assert!(handle.snapshot().markers.is_empty());
    }

    #[test]
    fn test_failing_factory() {
        let factory = SceneFactory::failing("no container");
        let err = factory.create(&options()).err().unwrap();
        assert_eq!(err.reason, "no container");
        assert!(factory.last_scene().is_none());
    }

    #[test]
    fn test_snapshot_serializes_flat_markers() {
        let mut widget = SceneWidget::new(&options());
        widget.add_marker(&spec(9));
        let json = serde_json::to_value(widget.snapshot().unwrap()).unwrap();
        assert_eq!(json["markers"][0]["layer"], 1);
        assert_eq!(json["markers"][0]["place_id"], 9);
        assert_eq!(json["markers"][0]["style"]["size"], 30);
    }
}
