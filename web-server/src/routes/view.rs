//! View-model endpoint
//!
//! Runs one page render server-side: cached load, filters, an in-memory
//! map scene, selection. Load failures are reported in the summary's
//! `outcome` with a 200, the same way the page would show them.

use axum::{
    extract::{Query, State},
    response::Json,
};
use place_types::{FilterState, TypeFilter};
use places_map::map::SceneFactory;
use places_map::{ViewShell, ViewSummary};
use serde::Deserialize;

use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ViewParams {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default, rename = "type")]
    pub place_type: Option<String>,
    #[serde(default)]
    pub selected: Option<i64>,
}

/// GET /api/view?search=&type=&selected=
pub async fn view_model(
    State(state): State<AppState>,
    Query(params): Query<ViewParams>,
) -> Json<ViewSummary> {
    let mut view = ViewShell::new();
    view.set_filter(FilterState::new(
        params.search.unwrap_or_default(),
        TypeFilter::parse(params.place_type.as_deref().unwrap_or_default()),
    ));

    view.load(&state.catalog).await;

    if let Err(e) = view.mount_map(&SceneFactory::new(), &state.config.map_options()) {
        tracing::warn!(reason = %e.reason, "View rendered without map");
    }
    view.select(params.selected);

    let summary = view.summary();
    view.unmount();
    Json(summary)
}
