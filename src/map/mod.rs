//! Map layer: marker styling, the widget seam, an in-memory scene widget
//! and the synchronizer that keeps widget layers equal to the visible places.

pub mod scene;
pub mod style;
pub mod sync;
pub mod widget;

pub use scene::{SceneFactory, SceneHandle, SceneSnapshot, SceneWidget};
pub use style::{marker_style, marker_style_for, MarkerStyle};
pub use sync::{DrawOptions, MapSynchronizer, SyncReport, SELECTION_ZOOM};
pub use widget::{LayerId, MapOptions, MapWidget, TileLayer, WidgetFactory};
