//! Same-origin API
//!
//! `/api/places` and `/api/places/:id` relay the upstream GIS API verbatim:
//! same status on upstream errors, 500 when the upstream could not be reached.

use axum::{
    extract::{Path, RawQuery, State},
    http::StatusCode,
    response::Json,
};
use places_map::UpstreamError;
use serde_json::{json, Value};

use crate::state::AppState;

type ApiResult = Result<Json<Value>, (StatusCode, Json<Value>)>;

fn upstream_failure(e: UpstreamError) -> (StatusCode, Json<Value>) {
    let status = e
        .status
        .and_then(|s| StatusCode::from_u16(s).ok())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(json!({ "error": e.to_string() })))
}

/// GET /api/places?name=&type=
pub async fn list_places(State(state): State<AppState>, RawQuery(query): RawQuery) -> ApiResult {
    state
        .gateway
        .forward_list(query.as_deref())
        .await
        .map(Json)
        .map_err(upstream_failure)
}

/// GET /api/places/:id
pub async fn get_place(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    state
        .gateway
        .forward_detail(&id)
        .await
        .map(Json)
        .map_err(upstream_failure)
}

/// GET /api/places/types
pub async fn place_types(State(state): State<AppState>) -> ApiResult {
    let types = state.catalog.place_types().await.map_err(upstream_failure)?;
    let types: Vec<Value> = types
        .iter()
        .map(|t| json!({ "value": t.as_str(), "label": t.label() }))
        .collect();
    Ok(Json(json!({ "types": types })))
}

/// POST /api/cache/invalidate
pub async fn invalidate_cache(State(state): State<AppState>) -> Json<Value> {
    let invalidated = state.catalog.invalidate_places();
    Json(json!({ "invalidated": invalidated }))
}

/// GET /api/health
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "places-web-server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
